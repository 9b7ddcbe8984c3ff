#![forbid(unsafe_code)]

mod rendering;

pub use rendering::{group_color, init_tracing, render_composition_to_png, RenderConfig};
