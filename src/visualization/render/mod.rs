//! Incremental rendering: a pure diff from graph state to patch lists, the
//! viewport transform and a full SVG export.

mod reconcile;
mod scene;
mod svg;
mod viewport;

pub use reconcile::{Patch, RenderState, UpdateScope, reconcile};
pub use scene::{NodeView, RelationshipView, Scene, bounding_box};
pub use svg::render_svg;
pub use viewport::{
	FIT_PADDING, ViewTransform, Viewport, ZOOM_FACTOR, ZOOM_MAX_SCALE, ZOOM_MIN_SCALE, ZoomLimits,
};
