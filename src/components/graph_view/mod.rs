//! Leptos view over the visualization core: an SVG subtree kept in sync by
//! applying the controller's patch lists once per animation frame.

mod component;
mod measure;
mod render;
mod state;

pub use component::GraphView;
pub use measure::CanvasMeasurer;
