//! # Glint Engine
//!
//! A small real-time 3D engine core built around two subsystems:
//!
//! - **Scene composition**: entities are bags of typed behaviors keyed by
//!   their static type, with at most one behavior of each type per entity
//!   and generation-checked weak handles for observation.
//! - **Shader lifecycle**: compile/attach/link/validate/use management for
//!   GPU shader programs, including atomic hot-reload and by-name uniform
//!   binding, expressed against an abstract [`render::GraphicsDevice`].
//!
//! The host loop, windowing, input, and the actual GPU bindings live
//! outside this crate; everything here runs synchronously on the thread
//! that owns the graphics context. None of the types in this crate are
//! thread-safe by design — see the module docs on [`render::shader`].
//!
//! ## Quick Start
//!
//! ```rust
//! use glint_engine::prelude::*;
//!
//! #[derive(Default)]
//! struct Spinner {
//!     angle: f32,
//! }
//!
//! impl Behavior for Spinner {
//!     fn tick(&mut self, delta_time: f32) {
//!         self.angle += delta_time;
//!     }
//! }
//!
//! let mut clock = Clock::new();
//! let mut scene = Scene::new();
//! let id = scene.spawn();
//! scene.entity_mut(id).unwrap().add_behavior::<Spinner>();
//!
//! // Once per frame:
//! clock.update();
//! scene.tick(clock.delta_time() as f32);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod assets;
pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{FsLoader, MemoryLoader, SourceLoader},
        config::AppConfig,
        foundation::time::Clock,
        render::{
            GraphicsDevice, HeadlessDevice, ProgramHandle, ShaderError, ShaderProgram,
            StageKind, UniformValue,
        },
        scene::{Behavior, BehaviorHandle, BehaviorKey, Entity, EntityId, Scene},
    };
}
