//! Canvas 2D rendering module
//!
//! `shapes` turns a simulation frame into screen-space primitives; the
//! canvas backend draws them on the browser.

#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod shapes;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasRenderer;
pub use shapes::{Rgba, Shape, build_scene, css_color};
