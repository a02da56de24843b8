//! Shader program lifecycle
//!
//! A [`ShaderProgram`] owns one GPU program object and drives it through
//! the `unlinked -> compile/attach -> linked -> use/set-uniform` state
//! machine, with [`ShaderProgram::reload`] providing atomic hot-reload:
//! from the caller's perspective a reload either fully replaces the
//! program or leaves the last good one untouched.
//!
//! Every failure is recovered locally: errors are logged and returned as
//! [`ShaderError`] values carrying the full diagnostic text, and the
//! program is left in the best available valid state. Nothing here may
//! terminate the process.
//!
//! Like the [`GraphicsDevice`] it drives, a program must stay on the
//! thread that owns the graphics context.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::assets::SourceLoader;

use super::device::{GraphicsDevice, ProgramHandle, UniformValue};

/// Pipeline stage a shader object is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Per-vertex processing
    Vertex,
    /// Per-fragment shading
    Fragment,
    /// Primitive-level geometry amplification
    Geometry,
    /// Tessellation control (patch output sizing)
    TessControl,
    /// Tessellation evaluation
    TessEvaluation,
    /// Compute dispatch
    Compute,
}

impl StageKind {
    /// Infer the stage kind from a source file extension.
    ///
    /// Recognizes the usual GLSL suffixes: `.vs`/`.vert`, `.fs`/`.frag`,
    /// `.gs`/`.geom`, `.tcs`, `.tes`, `.cs`/`.comp`.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext {
            "vs" | "vert" => Some(Self::Vertex),
            "fs" | "frag" => Some(Self::Fragment),
            "gs" | "geom" => Some(Self::Geometry),
            "tcs" => Some(Self::TessControl),
            "tes" => Some(Self::TessEvaluation),
            "cs" | "comp" => Some(Self::Compute),
            _ => None,
        }
    }
}

/// Errors reported by the shader program lifecycle.
///
/// Lookup misses are deliberately absent: a uniform name that does not
/// exist in the linked program is a normal silent no-op, not an error.
#[derive(Debug, Error)]
pub enum ShaderError {
    /// The context could not allocate a program object. Fatal to this
    /// asset, never to the process.
    #[error("graphics context failed to allocate a program object")]
    ProgramCreation,

    /// The context could not allocate a shader object for a stage.
    #[error("graphics context failed to allocate a {kind:?} shader object")]
    StageCreation {
        /// Stage that was being allocated
        kind: StageKind,
    },

    /// A stage's source file could not be read; only that stage's compile
    /// is aborted.
    #[error("failed to read shader source {path:?}: {source}")]
    SourceRead {
        /// Path that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A stage failed to compile; carries the full compiler log.
    #[error("failed to compile {path:?}:\n{log}")]
    Compile {
        /// Source path of the failing stage
        path: PathBuf,
        /// Full compiler diagnostic log
        log: String,
    },

    /// The program failed to link; carries the full link log.
    #[error("failed to link program:\n{log}")]
    Link {
        /// Full link diagnostic log
        log: String,
    },

    /// The program failed the context's validation pass.
    #[error("program failed validation:\n{log}")]
    Validation {
        /// Full validation diagnostic log
        log: String,
    },

    /// A caller invoked an operation that requires a linked program.
    #[error("{operation} requires a linked program")]
    NotLinked {
        /// The operation that was attempted
        operation: &'static str,
    },

    /// A caller invoked a pre-link-only operation after linking.
    #[error("{operation} must happen before the program is linked")]
    AlreadyLinked {
        /// The operation that was attempted
        operation: &'static str,
    },

    /// No stage kind could be inferred from a source path extension.
    #[error("cannot infer shader stage from {path:?}")]
    UnknownStage {
        /// Path with the unrecognized extension
        path: PathBuf,
    },
}

/// A GPU shader program: compiled stages, link state, uniform binding.
///
/// The program object itself is allocated lazily on the first compile.
/// `stages` records the source path and kind of every successfully
/// compiled stage so that [`ShaderProgram::reload`] can rebuild the whole
/// program from disk.
///
/// Uniform locations are re-queried from the context on every
/// [`ShaderProgram::set_uniform`] call rather than cached: a reload swaps
/// the underlying program object, and stale cached locations must never be
/// reused against the new one.
pub struct ShaderProgram<D: GraphicsDevice> {
    device: D,
    handle: ProgramHandle,
    stages: BTreeMap<PathBuf, StageKind>,
    linked: bool,
}

impl<D: GraphicsDevice> ShaderProgram<D> {
    /// Create an unlinked program with no stages. No GPU object is
    /// allocated until the first compile.
    pub fn new(device: D) -> Self {
        Self {
            device,
            handle: ProgramHandle::INVALID,
            stages: BTreeMap::new(),
            linked: false,
        }
    }

    /// Raw handle of the underlying program object;
    /// [`ProgramHandle::INVALID`] before creation.
    #[must_use]
    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// Whether the program has linked successfully.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    /// The recorded source stages: path -> stage kind, in path order.
    pub fn stages(&self) -> impl Iterator<Item = (&Path, StageKind)> {
        self.stages.iter().map(|(path, kind)| (path.as_path(), *kind))
    }

    fn ensure_created(&mut self) -> Result<(), ShaderError> {
        if self.handle.is_valid() {
            return Ok(());
        }
        self.handle = self.device.create_program();
        if self.handle.is_valid() {
            Ok(())
        } else {
            log::error!("graphics context failed to allocate a program object");
            Err(ShaderError::ProgramCreation)
        }
    }

    /// Read, compile, and attach one stage from `path`.
    ///
    /// On compile failure the shader object is released immediately (no
    /// GPU handle leaks), the attached-stage set is left unchanged, and
    /// the full compiler log is returned in the error.
    pub fn compile_stage<L: SourceLoader>(
        &mut self,
        loader: &L,
        path: impl AsRef<Path>,
        kind: StageKind,
    ) -> Result<(), ShaderError> {
        let path = path.as_ref();
        self.ensure_created()?;
        compile_and_attach(&self.device, self.handle, loader, path, kind)?;
        self.stages.insert(path.to_path_buf(), kind);
        Ok(())
    }

    /// [`ShaderProgram::compile_stage`] with the stage kind inferred from
    /// the file extension.
    pub fn compile_stage_auto<L: SourceLoader>(
        &mut self,
        loader: &L,
        path: impl AsRef<Path>,
    ) -> Result<(), ShaderError> {
        let path = path.as_ref();
        let kind = StageKind::from_path(path).ok_or_else(|| {
            log::error!("cannot infer shader stage from {}", path.display());
            ShaderError::UnknownStage {
                path: path.to_path_buf(),
            }
        })?;
        self.compile_stage(loader, path, kind)
    }

    /// Link the program from its attached stages.
    ///
    /// A second link on an already-linked program is a no-op. Whatever the
    /// link outcome, every attached shader object is detached and released
    /// afterwards; they are not needed once the program binary exists, and
    /// the attachment set is queried back from the context rather than
    /// trusted from local bookkeeping.
    pub fn link(&mut self) -> Result<(), ShaderError> {
        if self.linked {
            log::debug!("program {:?} already linked; ignoring link request", self.handle);
            return Ok(());
        }
        if !self.handle.is_valid() {
            let log = "no program object: compile at least one stage before linking".to_string();
            log::error!("failed to link: {log}");
            return Err(ShaderError::Link { log });
        }

        let status = self.device.link_program(self.handle);
        let log = if status {
            String::new()
        } else {
            self.device.program_log(self.handle)
        };

        release_attached(&self.device, self.handle);

        if status {
            self.linked = true;
            log::debug!("program {:?} linked", self.handle);
            Ok(())
        } else {
            log::error!("failed to link program {:?}:\n{log}", self.handle);
            Err(ShaderError::Link { log })
        }
    }

    /// Run the context's validation pass. Only meaningful after a
    /// successful link; does not change the linked state.
    pub fn validate(&self) -> Result<(), ShaderError> {
        if !self.linked {
            log::error!("validate requires a linked program");
            return Err(ShaderError::NotLinked {
                operation: "validate",
            });
        }
        if self.device.validate_program(self.handle) {
            Ok(())
        } else {
            let log = self.device.program_log(self.handle);
            log::error!("program {:?} failed validation:\n{log}", self.handle);
            Err(ShaderError::Validation { log })
        }
    }

    /// Make this program the current rendering program.
    ///
    /// Usage error (reported, not a crash) before a successful link.
    pub fn bind(&self) -> Result<(), ShaderError> {
        if !self.linked || !self.handle.is_valid() {
            log::error!("use requires a linked program");
            return Err(ShaderError::NotLinked { operation: "use" });
        }
        self.device.use_program(self.handle);
        Ok(())
    }

    /// Upload a typed value to the uniform named `name`.
    ///
    /// The location is resolved through the context on every call. A name
    /// absent from the linked program resolves to `-1` and the call
    /// becomes a silent no-op; not every program uses every optional
    /// uniform, so this is normal and unreported.
    pub fn set_uniform(
        &self,
        name: &str,
        value: impl Into<UniformValue>,
    ) -> Result<(), ShaderError> {
        if !self.linked {
            log::error!("set_uniform({name}) requires a linked program");
            return Err(ShaderError::NotLinked {
                operation: "set_uniform",
            });
        }
        let location = self.device.uniform_location(self.handle, name);
        if location < 0 {
            log::trace!("uniform {name} not present in program {:?}; skipping", self.handle);
            return Ok(());
        }
        self.device.upload_uniform(location, &value.into());
        Ok(())
    }

    /// Bind a vertex attribute index to a named input. Must happen before
    /// linking.
    pub fn bind_attrib_location(&mut self, index: u32, name: &str) -> Result<(), ShaderError> {
        if self.linked {
            log::error!("bind_attrib_location({name}) on an already linked program");
            return Err(ShaderError::AlreadyLinked {
                operation: "bind_attrib_location",
            });
        }
        self.ensure_created()?;
        self.device.bind_attrib_location(self.handle, index, name);
        Ok(())
    }

    /// Bind a fragment output color number to a named output. Must happen
    /// before linking.
    pub fn bind_frag_data_location(
        &mut self,
        color_number: u32,
        name: &str,
    ) -> Result<(), ShaderError> {
        if self.linked {
            log::error!("bind_frag_data_location({name}) on an already linked program");
            return Err(ShaderError::AlreadyLinked {
                operation: "bind_frag_data_location",
            });
        }
        self.ensure_created()?;
        self.device
            .bind_frag_data_location(self.handle, color_number, name);
        Ok(())
    }

    /// Recompile every recorded stage from its source and re-link,
    /// atomically.
    ///
    /// The replacement is built as a separate program object; only once
    /// every stage has compiled and the link has succeeded does it replace
    /// the old one, which is then released. On any failure the partial
    /// replacement is released and the program keeps its last good state.
    pub fn reload<L: SourceLoader>(&mut self, loader: &L) -> Result<(), ShaderError> {
        if self.stages.is_empty() {
            log::debug!("reload requested with no recorded stages; nothing to do");
            return Ok(());
        }

        let fresh = self.device.create_program();
        if !fresh.is_valid() {
            log::error!("reload: graphics context failed to allocate a program object");
            return Err(ShaderError::ProgramCreation);
        }

        for (path, kind) in &self.stages {
            if let Err(err) = compile_and_attach(&self.device, fresh, loader, path, *kind) {
                release_attached(&self.device, fresh);
                self.device.delete_program(fresh);
                log::error!("reload aborted; keeping previous program {:?}", self.handle);
                return Err(err);
            }
        }

        let status = self.device.link_program(fresh);
        let log = if status {
            String::new()
        } else {
            self.device.program_log(fresh)
        };
        release_attached(&self.device, fresh);

        if !status {
            self.device.delete_program(fresh);
            log::error!("reload link failed; keeping previous program {:?}:\n{log}", self.handle);
            return Err(ShaderError::Link { log });
        }

        if self.handle.is_valid() {
            release_attached(&self.device, self.handle);
            self.device.delete_program(self.handle);
        }
        self.handle = fresh;
        self.linked = true;
        log::debug!("program reloaded as {:?}", self.handle);
        Ok(())
    }
}

/// Compile `path` as a `kind` stage and attach it to `program`.
///
/// Free function so both the incremental compile path and the reload path
/// share it without borrowing the whole `ShaderProgram`.
fn compile_and_attach<D: GraphicsDevice, L: SourceLoader>(
    device: &D,
    program: ProgramHandle,
    loader: &L,
    path: &Path,
    kind: StageKind,
) -> Result<(), ShaderError> {
    let source = loader.read_text(path).map_err(|source| {
        log::error!("failed to read shader source {}: {source}", path.display());
        ShaderError::SourceRead {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let shader = device.create_shader(kind);
    if !shader.is_valid() {
        log::error!("graphics context failed to allocate a {kind:?} shader object");
        return Err(ShaderError::StageCreation { kind });
    }

    device.shader_source(shader, &source);
    if device.compile_shader(shader) {
        device.attach_shader(program, shader);
        Ok(())
    } else {
        let log = device.shader_log(shader);
        device.delete_shader(shader);
        log::error!("failed to compile {}:\n{log}", path.display());
        Err(ShaderError::Compile {
            path: path.to_path_buf(),
            log,
        })
    }
}

/// Detach and release every shader object currently attached to `program`,
/// per the context's own attachment query.
fn release_attached<D: GraphicsDevice>(device: &D, program: ProgramHandle) {
    for shader in device.attached_shaders(program) {
        device.detach_shader(program, shader);
        device.delete_shader(shader);
    }
}

impl<D: GraphicsDevice> Drop for ShaderProgram<D> {
    fn drop(&mut self) {
        if !self.handle.is_valid() {
            return;
        }
        release_attached(&self.device, self.handle);
        self.device.delete_program(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryLoader;
    use crate::render::HeadlessDevice;

    const VERT: &str = "uniform mat4 viewProjection;\nvoid main() { gl_Position = vec4(0.0); }\n";
    const FRAG: &str = "uniform vec3 cameraPos;\nvoid main() { }\n";

    fn loader() -> MemoryLoader {
        let mut loader = MemoryLoader::new();
        loader.insert("basic.vert", VERT);
        loader.insert("basic.frag", FRAG);
        loader
    }

    #[test]
    fn test_stage_kind_from_path() {
        assert_eq!(
            StageKind::from_path(Path::new("a/brdf.vert")),
            Some(StageKind::Vertex)
        );
        assert_eq!(
            StageKind::from_path(Path::new("brdf.fs")),
            Some(StageKind::Fragment)
        );
        assert_eq!(
            StageKind::from_path(Path::new("hull.tcs")),
            Some(StageKind::TessControl)
        );
        assert_eq!(StageKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(StageKind::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn test_compile_then_link_then_use() {
        let device = HeadlessDevice::new();
        let loader = loader();
        let mut program = ShaderProgram::new(device.clone());

        program
            .compile_stage(&loader, "basic.vert", StageKind::Vertex)
            .unwrap();
        program
            .compile_stage(&loader, "basic.frag", StageKind::Fragment)
            .unwrap();
        assert!(!program.is_linked());

        program.link().unwrap();
        assert!(program.is_linked());
        program.validate().unwrap();
        program.bind().unwrap();
        assert_eq!(device.bound_program(), program.handle());
    }

    #[test]
    fn test_compile_failure_reports_log_and_leaves_state() {
        let device = HeadlessDevice::new();
        let mut loader = loader();
        loader.insert("broken.frag", "this is not glsl");
        let mut program = ShaderProgram::new(device.clone());

        program
            .compile_stage(&loader, "basic.vert", StageKind::Vertex)
            .unwrap();
        let err = program
            .compile_stage(&loader, "broken.frag", StageKind::Fragment)
            .unwrap_err();
        match err {
            ShaderError::Compile { log, .. } => assert!(!log.is_empty()),
            other => panic!("expected compile failure, got {other:?}"),
        }

        assert!(!program.is_linked());
        // Failed stage is not recorded; failed shader object is released.
        assert_eq!(program.stages().count(), 1);
        assert_eq!(device.live_shader_count(), 1);
    }

    #[test]
    fn test_missing_source_aborts_only_that_stage() {
        let device = HeadlessDevice::new();
        let loader = loader();
        let mut program = ShaderProgram::new(device);

        let err = program
            .compile_stage(&loader, "missing.vert", StageKind::Vertex)
            .unwrap_err();
        assert!(matches!(err, ShaderError::SourceRead { .. }));
        assert_eq!(program.stages().count(), 0);

        program
            .compile_stage(&loader, "basic.vert", StageKind::Vertex)
            .unwrap();
        assert_eq!(program.stages().count(), 1);
    }

    #[test]
    fn test_use_and_set_uniform_before_link_are_usage_errors() {
        let device = HeadlessDevice::new();
        let program: ShaderProgram<_> = ShaderProgram::new(device);
        assert!(matches!(
            program.bind(),
            Err(ShaderError::NotLinked { operation: "use" })
        ));
        assert!(matches!(
            program.set_uniform("viewProjection", 1.0f32),
            Err(ShaderError::NotLinked { .. })
        ));
        assert!(matches!(
            program.validate(),
            Err(ShaderError::NotLinked { .. })
        ));
    }

    #[test]
    fn test_double_link_is_noop() {
        let device = HeadlessDevice::new();
        let loader = loader();
        let mut program = ShaderProgram::new(device);
        program.compile_stage_auto(&loader, "basic.vert").unwrap();
        program.compile_stage_auto(&loader, "basic.frag").unwrap();
        program.link().unwrap();
        program.link().unwrap();
        assert!(program.is_linked());
    }

    #[test]
    fn test_unknown_uniform_is_silent_noop() {
        let device = HeadlessDevice::new();
        let loader = loader();
        let mut program = ShaderProgram::new(device.clone());
        program.compile_stage_auto(&loader, "basic.vert").unwrap();
        program.compile_stage_auto(&loader, "basic.frag").unwrap();
        program.link().unwrap();

        let before = device.uniform_upload_count();
        program
            .set_uniform("viewProjection", nalgebra::Matrix4::<f32>::identity())
            .unwrap();
        assert_eq!(device.uniform_upload_count(), before + 1);

        program.set_uniform("doesNotExist", 0.5f32).unwrap();
        assert_eq!(device.uniform_upload_count(), before + 1);
    }

    #[test]
    fn test_attrib_binding_rejected_after_link() {
        let device = HeadlessDevice::new();
        let loader = loader();
        let mut program = ShaderProgram::new(device);
        program.bind_attrib_location(0, "position").unwrap();
        program.compile_stage_auto(&loader, "basic.vert").unwrap();
        program.compile_stage_auto(&loader, "basic.frag").unwrap();
        program.link().unwrap();
        assert!(matches!(
            program.bind_attrib_location(1, "normal"),
            Err(ShaderError::AlreadyLinked { .. })
        ));
    }

    #[test]
    fn test_link_without_program_object_reports() {
        let device = HeadlessDevice::new();
        let mut program: ShaderProgram<_> = ShaderProgram::new(device);
        assert!(matches!(program.link(), Err(ShaderError::Link { .. })));
        assert!(!program.is_linked());
    }

    #[test]
    fn test_program_allocation_failure_is_reported() {
        let device = HeadlessDevice::new();
        device.fail_next_program_allocation();
        let loader = loader();
        let mut program = ShaderProgram::new(device);
        let err = program
            .compile_stage(&loader, "basic.vert", StageKind::Vertex)
            .unwrap_err();
        assert!(matches!(err, ShaderError::ProgramCreation));
        assert!(!program.handle().is_valid());

        // Allocation is retried on the next compile.
        program
            .compile_stage(&loader, "basic.vert", StageKind::Vertex)
            .unwrap();
        assert!(program.handle().is_valid());
    }
}
