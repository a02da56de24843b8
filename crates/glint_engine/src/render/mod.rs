//! Rendering-facing core: graphics-context seam and shader lifecycle
//!
//! The engine's rendering surface is deliberately thin: a
//! [`GraphicsDevice`] trait standing in for the GPU context, the
//! [`ShaderProgram`] lifecycle driven against it, and a software
//! [`HeadlessDevice`] for running all of it without a GPU. Geometry,
//! pipelines, and windowing belong to the backend behind the seam.

mod device;
mod headless;
pub mod shader;

pub use device::{GraphicsDevice, ProgramHandle, StageHandle, UniformValue};
pub use headless::HeadlessDevice;
pub use shader::{ShaderError, ShaderProgram, StageKind};
