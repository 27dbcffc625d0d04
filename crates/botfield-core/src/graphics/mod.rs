//! Graphics device contract.
//!
//! The runtime never rasterizes anything itself. It talks to a
//! [`GraphicsDevice`] that tracks transforms, materials, lights, textures and
//! render states and accepts primitive lists. [`HeadlessDevice`] implements
//! the whole contract in memory for the harness and the tests.
//! [`run_render_loop`] is the render thread's side of the frame gate.

mod device;
mod headless;
mod renderer;

pub use device::*;
pub use headless::HeadlessDevice;
pub use renderer::{draw_snapshot, run_render_loop};
