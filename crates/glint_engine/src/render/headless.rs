//! Software graphics device
//!
//! [`HeadlessDevice`] implements [`GraphicsDevice`] entirely on the CPU:
//! handles are allocated from a counter, "compilation" is a lexical check
//! for a `main` entry point, and linking collects `uniform` declarations
//! from the attached sources so that by-name location lookup behaves like
//! a real context. It exists for tests, CI, and tooling that exercise the
//! shader lifecycle without a GPU; it also keeps allocation/release
//! counters so resource-cleanup invariants can be asserted exactly.
//!
//! Clones share one underlying context, the same way a real context handle
//! is cloned into each object that needs it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::device::{GraphicsDevice, ProgramHandle, StageHandle, UniformValue};
use super::shader::StageKind;

#[derive(Debug)]
struct ShaderObject {
    kind: StageKind,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<u32>,
    linked: bool,
    log: String,
    uniforms: HashMap<String, i32>,
    attribs: HashMap<String, u32>,
    frag_data: HashMap<String, u32>,
}

#[derive(Debug, Default)]
struct State {
    next_handle: u32,
    shaders: HashMap<u32, ShaderObject>,
    programs: HashMap<u32, ProgramObject>,
    bound: u32,
    fail_next_program: bool,
    programs_created: u64,
    programs_deleted: u64,
    shaders_created: u64,
    shaders_deleted: u64,
    redundant_deletes: u64,
    uniform_uploads: u64,
}

impl State {
    fn allocate(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

/// A pure-software [`GraphicsDevice`].
#[derive(Debug, Clone, Default)]
pub struct HeadlessDevice {
    state: Rc<RefCell<State>>,
}

impl HeadlessDevice {
    /// Create a fresh device with no live objects.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `create_program` call fail, returning the invalid
    /// sentinel. Used to exercise allocation-failure paths.
    pub fn fail_next_program_allocation(&self) {
        self.state.borrow_mut().fail_next_program = true;
    }

    /// Number of shader objects currently alive.
    #[must_use]
    pub fn live_shader_count(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    /// Number of program objects currently alive.
    #[must_use]
    pub fn live_program_count(&self) -> usize {
        self.state.borrow().programs.len()
    }

    /// Total shader objects ever created.
    #[must_use]
    pub fn shaders_created(&self) -> u64 {
        self.state.borrow().shaders_created
    }

    /// Total shader objects released.
    #[must_use]
    pub fn shaders_deleted(&self) -> u64 {
        self.state.borrow().shaders_deleted
    }

    /// Total program objects ever created.
    #[must_use]
    pub fn programs_created(&self) -> u64 {
        self.state.borrow().programs_created
    }

    /// Total program objects released.
    #[must_use]
    pub fn programs_deleted(&self) -> u64 {
        self.state.borrow().programs_deleted
    }

    /// Delete calls that named an object that was not alive. A correct
    /// caller never produces these; tests assert the count stays zero.
    #[must_use]
    pub fn redundant_delete_count(&self) -> u64 {
        self.state.borrow().redundant_deletes
    }

    /// Number of uniform uploads actually issued (location >= 0).
    #[must_use]
    pub fn uniform_upload_count(&self) -> u64 {
        self.state.borrow().uniform_uploads
    }

    /// The currently bound program.
    #[must_use]
    pub fn bound_program(&self) -> ProgramHandle {
        ProgramHandle(self.state.borrow().bound)
    }
}

/// Collect `uniform <type> <name>;` declarations from a source text.
fn scan_uniforms(source: &str, names: &mut Vec<String>) {
    for line in source.lines() {
        let Some(decl) = line.trim().strip_prefix("uniform ") else {
            continue;
        };
        let decl = decl.trim_end_matches(';').trim_end();
        if let Some(token) = decl.split_whitespace().last() {
            // Strip any array suffix: "lights[4]" declares "lights".
            let name = token.split('[').next().unwrap_or(token);
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
}

/// Lexical stand-in for a stage compiler: any source with a `main` entry
/// point compiles; anything else yields a non-empty diagnostic log.
fn check_source(source: &str) -> Result<(), String> {
    if source.trim().is_empty() {
        return Err("0:0(0): error: empty shader source".to_string());
    }
    if !source.contains("void main") {
        return Err("0:1(1): error: no entry point 'main' defined".to_string());
    }
    Ok(())
}

impl GraphicsDevice for HeadlessDevice {
    fn create_program(&self) -> ProgramHandle {
        let mut state = self.state.borrow_mut();
        if state.fail_next_program {
            state.fail_next_program = false;
            return ProgramHandle::INVALID;
        }
        let handle = state.allocate();
        state.programs.insert(handle, ProgramObject::default());
        state.programs_created += 1;
        ProgramHandle(handle)
    }

    fn delete_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        if state.programs.remove(&program.0).is_some() {
            state.programs_deleted += 1;
            if state.bound == program.0 {
                state.bound = 0;
            }
        } else {
            state.redundant_deletes += 1;
        }
    }

    fn create_shader(&self, kind: StageKind) -> StageHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.allocate();
        state.shaders.insert(
            handle,
            ShaderObject {
                kind,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        state.shaders_created += 1;
        StageHandle(handle)
    }

    fn shader_source(&self, shader: StageHandle, source: &str) {
        if let Some(object) = self.state.borrow_mut().shaders.get_mut(&shader.0) {
            object.source = source.to_string();
            object.compiled = false;
        }
    }

    fn compile_shader(&self, shader: StageHandle) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(object) = state.shaders.get_mut(&shader.0) else {
            return false;
        };
        match check_source(&object.source) {
            Ok(()) => {
                object.compiled = true;
                object.log.clear();
            }
            Err(log) => {
                object.compiled = false;
                object.log = log;
            }
        }
        object.compiled
    }

    fn shader_log(&self, shader: StageHandle) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader.0)
            .map(|object| object.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: StageHandle) {
        let mut state = self.state.borrow_mut();
        if state.shaders.remove(&shader.0).is_some() {
            state.shaders_deleted += 1;
        } else {
            state.redundant_deletes += 1;
        }
    }

    fn attach_shader(&self, program: ProgramHandle, shader: StageHandle) {
        let mut state = self.state.borrow_mut();
        if !state.shaders.contains_key(&shader.0) {
            return;
        }
        if let Some(object) = state.programs.get_mut(&program.0) {
            if !object.attached.contains(&shader.0) {
                object.attached.push(shader.0);
            }
        }
    }

    fn detach_shader(&self, program: ProgramHandle, shader: StageHandle) {
        if let Some(object) = self.state.borrow_mut().programs.get_mut(&program.0) {
            object.attached.retain(|&handle| handle != shader.0);
        }
    }

    fn attached_shaders(&self, program: ProgramHandle) -> Vec<StageHandle> {
        self.state
            .borrow()
            .programs
            .get(&program.0)
            .map(|object| object.attached.iter().copied().map(StageHandle).collect())
            .unwrap_or_default()
    }

    fn link_program(&self, program: ProgramHandle) -> bool {
        let mut state = self.state.borrow_mut();

        let attached = match state.programs.get(&program.0) {
            Some(object) => object.attached.clone(),
            None => return false,
        };

        let mut names = Vec::new();
        let mut all_compiled = true;
        for handle in &attached {
            match state.shaders.get(handle) {
                Some(shader) if shader.compiled => scan_uniforms(&shader.source, &mut names),
                _ => all_compiled = false,
            }
        }

        let Some(object) = state.programs.get_mut(&program.0) else {
            return false;
        };
        if attached.is_empty() {
            object.linked = false;
            object.log = "link failed: no shader objects attached".to_string();
        } else if all_compiled {
            object.linked = true;
            object.log.clear();
            object.uniforms = names
                .into_iter()
                .enumerate()
                .map(|(location, name)| (name, i32::try_from(location).unwrap_or(i32::MAX)))
                .collect();
        } else {
            object.linked = false;
            object.log = "link failed: attached shader object is not compiled".to_string();
        }
        object.linked
    }

    fn validate_program(&self, program: ProgramHandle) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(object) = state.programs.get_mut(&program.0) else {
            return false;
        };
        if object.linked {
            true
        } else {
            object.log = "validation failed: program is not linked".to_string();
            false
        }
    }

    fn program_log(&self, program: ProgramHandle) -> String {
        self.state
            .borrow()
            .programs
            .get(&program.0)
            .map(|object| object.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        if state
            .programs
            .get(&program.0)
            .is_some_and(|object| object.linked)
        {
            state.bound = program.0;
        }
    }

    fn bind_attrib_location(&self, program: ProgramHandle, index: u32, name: &str) {
        if let Some(object) = self.state.borrow_mut().programs.get_mut(&program.0) {
            object.attribs.insert(name.to_string(), index);
        }
    }

    fn bind_frag_data_location(&self, program: ProgramHandle, color_number: u32, name: &str) {
        if let Some(object) = self.state.borrow_mut().programs.get_mut(&program.0) {
            object.frag_data.insert(name.to_string(), color_number);
        }
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> i32 {
        self.state
            .borrow()
            .programs
            .get(&program.0)
            .filter(|object| object.linked)
            .and_then(|object| object.uniforms.get(name).copied())
            .unwrap_or(-1)
    }

    fn upload_uniform(&self, location: i32, _value: &UniformValue) {
        if location >= 0 {
            self.state.borrow_mut().uniform_uploads += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_start_valid_and_unique() {
        let device = HeadlessDevice::new();
        let program = device.create_program();
        let shader = device.create_shader(StageKind::Vertex);
        assert!(program.is_valid());
        assert!(shader.is_valid());
        assert_ne!(program.0, shader.0);
    }

    #[test]
    fn test_compile_requires_entry_point() {
        let device = HeadlessDevice::new();
        let shader = device.create_shader(StageKind::Fragment);
        device.shader_source(shader, "float x;");
        assert!(!device.compile_shader(shader));
        assert!(!device.shader_log(shader).is_empty());

        device.shader_source(shader, "void main() {}");
        assert!(device.compile_shader(shader));
        assert!(device.shader_log(shader).is_empty());
    }

    #[test]
    fn test_link_collects_uniform_locations() {
        let device = HeadlessDevice::new();
        let program = device.create_program();
        let shader = device.create_shader(StageKind::Vertex);
        device.shader_source(
            shader,
            "uniform mat4 viewProjection;\nuniform vec3 lights[4];\nvoid main() {}",
        );
        assert!(device.compile_shader(shader));
        device.attach_shader(program, shader);
        assert!(device.link_program(program));

        assert!(device.uniform_location(program, "viewProjection") >= 0);
        assert!(device.uniform_location(program, "lights") >= 0);
        assert_eq!(device.uniform_location(program, "missing"), -1);
    }

    #[test]
    fn test_link_fails_with_nothing_attached() {
        let device = HeadlessDevice::new();
        let program = device.create_program();
        assert!(!device.link_program(program));
        assert!(!device.program_log(program).is_empty());
    }

    #[test]
    fn test_delete_accounting() {
        let device = HeadlessDevice::new();
        let shader = device.create_shader(StageKind::Vertex);
        device.delete_shader(shader);
        assert_eq!(device.shaders_deleted(), 1);
        assert_eq!(device.live_shader_count(), 0);

        device.delete_shader(shader);
        assert_eq!(device.redundant_delete_count(), 1);
    }
}
