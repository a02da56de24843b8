//! Graphics-context abstraction
//!
//! The engine core never talks to a GPU API directly. Everything it needs
//! from the context — program/shader object allocation, compilation,
//! linking, validation, uniform lookup and upload, plus the status and
//! diagnostic-log queries that go with them — is expressed by
//! [`GraphicsDevice`]. A real backend binds these to its API on the thread
//! owning the context; [`HeadlessDevice`](super::HeadlessDevice) provides a
//! pure-software implementation for tests and tooling.
//!
//! All handle-returning operations use `0` as the invalid sentinel, so a
//! failed allocation is observable without a panic.

use nalgebra::{Matrix3, Matrix4, Vector2, Vector3, Vector4};

use super::shader::StageKind;

/// Identity of a GPU program object. `0` is the invalid sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

impl ProgramHandle {
    /// The sentinel handle returned before creation or after a failed
    /// allocation.
    pub const INVALID: Self = Self(0);

    /// Whether the handle names a live program object.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

/// Identity of a GPU shader object for a single pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageHandle(pub u32);

impl StageHandle {
    /// The sentinel handle for a failed shader allocation.
    pub const INVALID: Self = Self(0);

    /// Whether the handle names a live shader object.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

/// A typed value destined for a named uniform in a linked program.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// 32-bit signed integer (also used for sampler bindings)
    Int(i32),
    /// Single float scalar
    Float(f32),
    /// Two-component float vector
    Vec2(Vector2<f32>),
    /// Three-component float vector
    Vec3(Vector3<f32>),
    /// Four-component float vector
    Vec4(Vector4<f32>),
    /// 3x3 float matrix, column-major
    Mat3(Matrix3<f32>),
    /// 4x4 float matrix, column-major
    Mat4(Matrix4<f32>),
    /// Array of three-component float vectors (light positions and the like)
    Vec3Array(Vec<Vector3<f32>>),
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<Vector2<f32>> for UniformValue {
    fn from(value: Vector2<f32>) -> Self {
        Self::Vec2(value)
    }
}

impl From<Vector3<f32>> for UniformValue {
    fn from(value: Vector3<f32>) -> Self {
        Self::Vec3(value)
    }
}

impl From<Vector4<f32>> for UniformValue {
    fn from(value: Vector4<f32>) -> Self {
        Self::Vec4(value)
    }
}

impl From<Matrix3<f32>> for UniformValue {
    fn from(value: Matrix3<f32>) -> Self {
        Self::Mat3(value)
    }
}

impl From<Matrix4<f32>> for UniformValue {
    fn from(value: Matrix4<f32>) -> Self {
        Self::Mat4(value)
    }
}

impl From<Vec<Vector3<f32>>> for UniformValue {
    fn from(value: Vec<Vector3<f32>>) -> Self {
        Self::Vec3Array(value)
    }
}

/// Opaque, handle-returning operations of the graphics context.
///
/// The context is single-thread-affine: every method must be called from
/// the thread that owns it, which under the engine's cooperative frame
/// loop is the only thread touching it. Methods take `&self` because the
/// underlying APIs are stateful context handles, not Rust-visible state;
/// implementations use interior mutability where they keep book.
///
/// Status-returning methods (`compile_shader`, `link_program`,
/// `validate_program`) pair with the corresponding log query so callers
/// can always retrieve the full diagnostic text, not just a flag.
pub trait GraphicsDevice {
    /// Allocate a program object. Returns [`ProgramHandle::INVALID`] on
    /// failure.
    fn create_program(&self) -> ProgramHandle;

    /// Release a program object.
    fn delete_program(&self, program: ProgramHandle);

    /// Allocate a shader object for one pipeline stage. Returns
    /// [`StageHandle::INVALID`] on failure.
    fn create_shader(&self, kind: StageKind) -> StageHandle;

    /// Replace the source text of a shader object.
    fn shader_source(&self, shader: StageHandle, source: &str);

    /// Compile a shader object; returns the compile status.
    fn compile_shader(&self, shader: StageHandle) -> bool;

    /// Full compiler diagnostic log for a shader object.
    fn shader_log(&self, shader: StageHandle) -> String;

    /// Release a shader object.
    fn delete_shader(&self, shader: StageHandle);

    /// Attach a shader object to a program for the next link.
    fn attach_shader(&self, program: ProgramHandle, shader: StageHandle);

    /// Detach a shader object from a program.
    fn detach_shader(&self, program: ProgramHandle, shader: StageHandle);

    /// Query the set of shader objects currently attached to a program.
    ///
    /// This is the authoritative attachment list; cleanup paths consult it
    /// instead of any internally cached bookkeeping.
    fn attached_shaders(&self, program: ProgramHandle) -> Vec<StageHandle>;

    /// Link a program from its attached stages; returns the link status.
    fn link_program(&self, program: ProgramHandle) -> bool;

    /// Run the context's validation pass on a linked program; returns the
    /// validation status.
    fn validate_program(&self, program: ProgramHandle) -> bool;

    /// Full link/validation diagnostic log for a program object.
    fn program_log(&self, program: ProgramHandle) -> String;

    /// Make a program the current rendering program.
    fn use_program(&self, program: ProgramHandle);

    /// Bind a vertex attribute index to a named input, effective at the
    /// next link.
    fn bind_attrib_location(&self, program: ProgramHandle, index: u32, name: &str);

    /// Bind a fragment output color number to a named output, effective at
    /// the next link.
    fn bind_frag_data_location(&self, program: ProgramHandle, color_number: u32, name: &str);

    /// Resolve a uniform name to a location in a linked program.
    ///
    /// Returns `-1` when the name does not exist in the program; callers
    /// treat that as a normal no-op, not an error.
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> i32;

    /// Upload a typed value to a uniform location of the current program.
    fn upload_uniform(&self, location: i32, value: &UniformValue);
}
