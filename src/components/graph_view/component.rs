use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{Element, MouseEvent, WheelEvent, Window};

use super::measure::CanvasMeasurer;
use super::render::SvgLayers;
use super::state::{GraphViewState, logged};
use crate::visualization::geometry::Vector;
use crate::visualization::model::GraphData;
use crate::visualization::render::Patch;
use crate::visualization::style::GraphStyle;
use crate::visualization::{Visualization, VisualizationConfig};

/// Controller state and the DOM it draws into, once mounted.
struct Mounted {
	state: GraphViewState,
	layers: SvgLayers,
	/// An animation frame is requested and has not run yet.
	frame_pending: bool,
}

impl Mounted {
	fn apply(&mut self, patches: &[Patch]) {
		if let Err(err) = self.layers.apply(patches) {
			warn!("cannot apply {} patches: {err:?}", patches.len());
		}
	}

	fn sync_transform(&self) {
		if let Err(err) = self.layers.set_transform(self.state.vis.viewport().transform) {
			warn!("cannot move the view: {err:?}");
		}
	}

	fn resize(&mut self, width: f64, height: f64) {
		if let Err(err) = self.layers.resize(width, height) {
			warn!("cannot resize the view to {width}x{height}: {err:?}");
		}
		self.state.vis.resize(true, width, height);
		self.sync_transform();
	}

	/// Restarts the frame loop after it went idle on a settled layout.
	fn wake(&mut self, frame_loop: &FrameLoop) {
		if self.state.animation_running && !self.frame_pending {
			self.frame_pending = true;
			request_frame(frame_loop);
		}
	}
}

type Shared = Rc<RefCell<Option<Mounted>>>;
type FrameLoop = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

#[component]
pub fn GraphView(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(optional)] config: VisualizationConfig,
	#[prop(optional, into)] grass: Option<String>,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let mounted: Shared = Rc::new(RefCell::new(None));
	let animate: FrameLoop = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (mounted_init, animate_init, resize_cb_init) =
		(mounted.clone(), animate.clone(), resize_cb.clone());
	let fullscreen = config.is_fullscreen;

	Effect::new(move |_| {
		let graph = data.get();
		let Some(container) = container_ref.get() else {
			return;
		};
		let container: Element = container.into();
		let needs_mount = mounted_init.borrow().is_none();
		if needs_mount {
			let window: Window = web_sys::window().unwrap();
			let (w, h) = if fullscreen {
				window_size(&window)
			} else {
				(
					width.unwrap_or_else(|| {
						container
							.parent_element()
							.map(|p| p.client_width() as f64)
							.unwrap_or(800.0)
					}),
					height.unwrap_or_else(|| {
						container
							.parent_element()
							.map(|p| p.client_height() as f64)
							.unwrap_or(600.0)
					}),
				)
			};

			let layers = match SvgLayers::mount(window.document().unwrap(), &container) {
				Ok(layers) => layers,
				Err(err) => {
					warn!("cannot create the graph view: {err:?}");
					return;
				}
			};
			if let Err(err) = layers.resize(w, h) {
				warn!("cannot size the view to {w}x{h}: {err:?}");
			}
			let mut vis = Visualization::new(config.clone(), GraphStyle::default());
			if let Some(measurer) = CanvasMeasurer::new() {
				vis = vis.with_text_measurer(Box::new(measurer));
			}
			vis.resize(fullscreen, w, h);
			if let Some(text) = &grass {
				if vis.set_grass(text).is_none() {
					warn!("keeping the default style");
				}
			}
			*mounted_init.borrow_mut() = Some(Mounted {
				state: GraphViewState::new(vis),
				layers,
				frame_pending: false,
			});

			if fullscreen {
				let mounted_resize = mounted_init.clone();
				*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
					let (nw, nh) = window_size(&web_sys::window().unwrap());
					if let Some(view) = mounted_resize.borrow_mut().as_mut() {
						view.resize(nw, nh);
					}
				}));
				if let Some(ref cb) = *resize_cb_init.borrow() {
					if let Err(err) =
						window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref())
					{
						warn!("cannot follow window resizes: {err:?}");
					}
				}
			}

			let (mounted_anim, animate_inner) = (mounted_init.clone(), animate_init.clone());
			*animate_init.borrow_mut() = Some(Closure::new(move || {
				let keep_going = match mounted_anim.borrow_mut().as_mut() {
					Some(view) => {
						let (patches, running) = view.state.frame();
						view.apply(&patches);
						view.sync_transform();
						view.frame_pending = running;
						running
					}
					None => false,
				};
				if keep_going {
					request_frame(&animate_inner);
				}
			}));
		}

		if let Some(view) = mounted_init.borrow_mut().as_mut() {
			let patches = logged(view.state.vis.set_graph(&graph));
			view.apply(&patches);
			view.state.animation_running = true;
			view.sync_transform();
			view.wake(&animate_init);
		}
	});

	let mounted_md = mounted.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let (x, y) = pointer(container_ref, &ev);
		if let Some(view) = mounted_md.borrow_mut().as_mut() {
			view.state.press(x, y);
		}
	};

	let (mounted_mm, animate_mm) = (mounted.clone(), animate.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let (x, y) = pointer(container_ref, &ev);
		let relationship = relationship_under(&ev);
		if let Some(view) = mounted_mm.borrow_mut().as_mut() {
			let patches = view.state.move_to(x, y, relationship.as_deref());
			view.apply(&patches);
			view.sync_transform();
			view.wake(&animate_mm);
		}
	};

	let mounted_mu = mounted.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let relationship = relationship_under(&ev);
		if let Some(view) = mounted_mu.borrow_mut().as_mut() {
			let patches = view.state.release(relationship.as_deref());
			view.apply(&patches);
		}
	};

	let mounted_ml = mounted.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(view) = mounted_ml.borrow_mut().as_mut() {
			let patches = view.state.leave();
			view.apply(&patches);
		}
	};

	let (mounted_dc, animate_dc) = (mounted.clone(), animate.clone());
	let on_dblclick = move |ev: MouseEvent| {
		let (x, y) = pointer(container_ref, &ev);
		if let Some(view) = mounted_dc.borrow_mut().as_mut() {
			let patches = view.state.double_click(x, y);
			view.apply(&patches);
			view.wake(&animate_dc);
		}
	};

	let mounted_wh = mounted.clone();
	let on_wheel = move |ev: WheelEvent| {
		let (x, y) = pointer(container_ref, &ev);
		let modifier = ev.ctrl_key() || ev.meta_key() || ev.shift_key();
		if let Some(view) = mounted_wh.borrow_mut().as_mut() {
			if view.state.vis.wheel(Vector::new(x, y), ev.delta_y(), modifier) {
				ev.prevent_default();
				view.sync_transform();
			}
		}
	};

	let on_zoom_in = zoom_handler(mounted.clone(), |vis| {
		vis.zoom_in();
	});
	let on_zoom_out = zoom_handler(mounted.clone(), |vis| {
		vis.zoom_out();
	});
	let on_fit = zoom_handler(mounted.clone(), |vis| {
		vis.zoom_to_fit();
	});

	view! {
		<div
			node_ref=container_ref
			class="graph-view-container"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:dblclick=on_dblclick
			on:wheel=on_wheel
			style="position: relative; width: 100%; height: 100%;"
		>
			<div
				class="graph-controls"
				style="position: absolute; right: 1rem; bottom: 1rem; z-index: 1;"
				on:mousedown=|ev: MouseEvent| ev.stop_propagation()
			>
				<button class="zoom-in" on:click=on_zoom_in>"+"</button>
				<button class="zoom-out" on:click=on_zoom_out>"\u{2212}"</button>
				<button class="zoom-fit" on:click=on_fit>"Fit"</button>
			</div>
		</div>
	}
}

fn zoom_handler(shared: Shared, action: fn(&mut Visualization)) -> impl Fn(MouseEvent) + 'static {
	move |ev: MouseEvent| {
		ev.stop_propagation();
		if let Some(view) = shared.borrow_mut().as_mut() {
			action(&mut view.state.vis);
			view.sync_transform();
		}
	}
}

fn request_frame(frame_loop: &FrameLoop) {
	if let Some(cb) = frame_loop.borrow().as_ref() {
		if let Err(err) = web_sys::window()
			.unwrap()
			.request_animation_frame(cb.as_ref().unchecked_ref())
		{
			warn!("cannot schedule a frame: {err:?}");
		}
	}
}

fn window_size(window: &Window) -> (f64, f64) {
	(
		window.inner_width().unwrap().as_f64().unwrap(),
		window.inner_height().unwrap().as_f64().unwrap(),
	)
}

/// Event position relative to the view.
fn pointer(container_ref: NodeRef<leptos::html::Div>, ev: &MouseEvent) -> (f64, f64) {
	let container: Element = container_ref.get().unwrap().into();
	let rect = container.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// Id of the relationship element the event happened on.
fn relationship_under(ev: &MouseEvent) -> Option<String> {
	let target: Element = ev.target()?.dyn_into().ok()?;
	target.closest(".relationship").ok()??.get_attribute("data-id")
}
