// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `glshaders`.
//
// `glshaders` is free software: you can redistribute it and/or modify it under the
// terms of either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
//   version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `glshaders` is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE. See the GNU Lesser General Public License or the Mozilla Public License for more
// details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `glshaders`. If not, see <https://www.gnu.org/licenses/>.

//! A software driver that emulates the parts of OpenGL that programs rely on.
//!
//! Sources are scanned for top level `uniform` declarations and for vertex `in` and
//! `attribute` declarations. A line starting with `#error` fails compilation, as does
//! `#pragma fail_silently` without writing a log. A function prototype that is never defined
//! in any attached shader fails linking.

#![allow(dead_code)]

use ahash::RandomState;
use hashbrown::HashMap;

use glshaders::{
    ActiveVariable, AttributeLayout, Context, Driver, DriverInfo, Location, Program, ShaderKind,
    TypeTag, UniformWrite, UnitKind, Units, Value, VariableKind, Version,
};

use std::cell::{Cell, RefCell};
use std::fmt;

pub const VERTEX: &str = "\
#version 330 core
in vec3 position;
in vec2 uv;
uniform mat4 transform;
uniform float scale;
out vec2 frag_uv;
void main() {
    frag_uv = uv;
    gl_Position = transform * vec4(position * scale, 1.0);
}
";

pub const FRAGMENT: &str = "\
#version 330 core
uniform vec4 color;
uniform float scale;
in vec2 frag_uv;
out vec4 frag;
void main() {
    frag = color * scale;
}
";

/// A fragment shader with one uniform of every supported type.
pub const EVERY_TYPE: &str = "\
#version 400 core
uniform float f;
uniform vec2 v2;
uniform vec3 v3;
uniform vec4 v4;
uniform int i;
uniform ivec2 iv2;
uniform ivec3 iv3;
uniform ivec4 iv4;
uniform mat2 m2;
uniform mat3 m3;
uniform mat4 m4;
uniform mat2x3 m23;
uniform mat2x4 m24;
uniform mat3x2 m32;
uniform mat3x4 m34;
uniform mat4x2 m42;
uniform mat4x3 m43;
uniform float floats[3];
uniform vec3 vecs[2];
uniform mat2 mats[2];
uniform mat2x3 rects[2];
uniform sampler2D tex;
uniform uint u;
uniform uvec2 uv2;
uniform uvec3 uv3;
uniform uvec4 uv4;
uniform double d;
uniform dvec2 dv2;
uniform dvec3 dv3;
uniform dvec4 dv4;
uniform dmat2 dm2;
uniform dmat3 dm3;
uniform dmat4 dm4;
uniform dmat2x3 dm23;
uniform dmat2x4 dm24;
uniform dmat3x2 dm32;
uniform dmat3x4 dm34;
uniform dmat4x2 dm42;
uniform dmat4x3 dm43;
out vec4 frag;
void main() {
    frag = vec4(f);
}
";

/// A fragment shader whose compilation fails without writing a log.
pub const SILENT_FAILURE: &str = "\
#version 330 core
#pragma fail_silently
out vec4 frag;
void main() {
}
";

/// A fragment shader that calls a function no shader defines.
pub const UNRESOLVED: &str = "\
#version 330 core
uniform vec4 color;
out vec4 frag;
vec4 secret_method(vec4 c);
void main() {
    frag = secret_method(color);
}
";

/// A context around a fresh software driver.
pub fn context() -> Context<SoftwareDriver> {
    init_tracing();
    Context::new(SoftwareDriver::new())
}

/// Compile and link a program, panicking with the log on failure.
pub fn program(
    context: &Context<SoftwareDriver>,
    vertex: &str,
    fragment: &str,
) -> Program<SoftwareDriver> {
    glshaders::from_sources(context, [vertex], [fragment]).unwrap_or_else(|e| panic!("{e}"))
}

/// Rows of `rows` by `cols` counting up from one.
pub fn counting_matrix<T>(rows: usize, cols: usize) -> Value
where
    T: From<u16> + Into<Value>,
{
    Value::from(
        (0..rows)
            .map(|r| {
                (0..cols)
                    .map(|c| T::from((r * cols + c + 1) as u16))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>(),
    )
}

/// Install a subscriber that prints through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// An error from the software driver.
#[derive(Debug)]
pub struct SoftwareError(String);

impl fmt::Display for SoftwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "software driver error: {}", self.0)
    }
}

impl std::error::Error for SoftwareError {}

#[derive(Debug)]
struct ShaderObject {
    kind: ShaderKind,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Clone)]
struct Var {
    /// The name as the driver reports it.
    name: String,
    tag: TypeTag,
    size: usize,
    location: i32,
}

impl Var {
    fn base_name(&self) -> &str {
        self.name.strip_suffix("[0]").unwrap_or(&self.name)
    }
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<u32>,
    linked: bool,
    log: String,
    uniforms: Vec<Var>,
    attributes: Vec<Var>,
    values: Vec<(i32, Units)>,
}

impl ProgramObject {
    fn value_mut(&mut self, location: i32) -> Option<&mut Units> {
        self.values
            .iter_mut()
            .find(|(loc, _)| *loc == location)
            .map(|(_, units)| units)
    }

    fn value(&self, location: i32) -> Option<&Units> {
        self.values
            .iter()
            .find(|(loc, _)| *loc == location)
            .map(|(_, units)| units)
    }

    fn uniform_at(&self, location: i32) -> Option<&Var> {
        self.uniforms
            .iter()
            .find(|var| var.location <= location && location < var.location + var.size as i32)
    }
}

struct State {
    next_id: u32,
    freed: Vec<u32>,
    shaders: HashMap<u32, ShaderObject, RandomState>,
    programs: HashMap<u32, ProgramObject, RandomState>,
    current: Option<u32>,
    enabled: Vec<u32>,
    pointers: Vec<(u32, AttributeLayout)>,
    errors: Vec<String>,
    writes: usize,
}

/// A driver that keeps every object in memory.
pub struct SoftwareDriver {
    state: RefCell<State>,
    info: DriverInfo,
    fail_creation: Cell<bool>,
    reuse_ids: Cell<bool>,
}

impl Default for SoftwareDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareDriver {
    /// A driver for OpenGL 4.6 with double precision support.
    pub fn new() -> Self {
        Self::with_info(DriverInfo::new(
            Version::new(4, 6),
            Version::new(4, 60),
            ["GL_ARB_gpu_shader_fp64".to_string()],
            [
                UnitKind::Float,
                UnitKind::Int,
                UnitKind::UInt,
                UnitKind::Double,
            ],
        ))
    }

    /// A driver that reports the given capabilities.
    pub fn with_info(info: DriverInfo) -> Self {
        Self {
            state: RefCell::new(State {
                next_id: 1,
                freed: Vec::new(),
                shaders: HashMap::with_hasher(RandomState::new()),
                programs: HashMap::with_hasher(RandomState::new()),
                current: None,
                enabled: Vec::new(),
                pointers: Vec::new(),
                errors: Vec::new(),
                writes: 0,
            }),
            info,
            fail_creation: Cell::new(false),
            reuse_ids: Cell::new(false),
        }
    }

    /// Make object creation fail.
    pub fn set_fail_creation(&self, fail: bool) {
        self.fail_creation.set(fail);
    }

    /// Hand out the ids of deleted objects again, most recent first, as GL may.
    pub fn set_reuse_ids(&self, reuse: bool) {
        self.reuse_ids.set(reuse);
    }

    /// Take every error the driver has recorded.
    pub fn take_errors(&self) -> Vec<String> {
        std::mem::take(&mut self.state.borrow_mut().errors)
    }

    /// The number of uniform writes that reached storage.
    pub fn writes(&self) -> usize {
        self.state.borrow().writes
    }

    /// The number of live shader objects.
    pub fn shader_count(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    /// The number of live program objects.
    pub fn program_count(&self) -> usize {
        self.state.borrow().programs.len()
    }

    /// The ids of the shaders attached to a program.
    pub fn attached(&self, program: u32) -> Vec<u32> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.attached.clone())
            .unwrap_or_default()
    }

    /// The raw storage of the uniform at `location`.
    pub fn stored(&self, program: u32, location: Location) -> Option<Units> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .and_then(|p| p.value(location.0))
            .cloned()
    }

    /// Whether the attribute array at `index` is enabled.
    pub fn is_enabled(&self, index: u32) -> bool {
        self.state.borrow().enabled.contains(&index)
    }

    /// The layout the attribute at `index` was last pointed at.
    pub fn pointer(&self, index: u32) -> Option<AttributeLayout> {
        self.state
            .borrow()
            .pointers
            .iter()
            .rev()
            .find(|(i, _)| *i == index)
            .map(|(_, layout)| *layout)
    }

    fn next_id(&self) -> Result<u32, SoftwareError> {
        if self.fail_creation.get() {
            return Err(SoftwareError("out of object names".into()));
        }

        let mut state = self.state.borrow_mut();
        if self.reuse_ids.get() {
            if let Some(id) = state.freed.pop() {
                return Ok(id);
            }
        }

        let id = state.next_id;
        state.next_id += 1;
        Ok(id)
    }

    fn error(&self, message: String) {
        self.state.borrow_mut().errors.push(message);
    }
}

/// The tag of a GLSL type name.
fn parse_type(name: &str) -> Option<TypeTag> {
    Some(match name {
        "float" => TypeTag::FLOAT,
        "vec2" => TypeTag::FLOAT_VEC2,
        "vec3" => TypeTag::FLOAT_VEC3,
        "vec4" => TypeTag::FLOAT_VEC4,
        "int" => TypeTag::INT,
        "ivec2" => TypeTag::INT_VEC2,
        "ivec3" => TypeTag::INT_VEC3,
        "ivec4" => TypeTag::INT_VEC4,
        "uint" => TypeTag::UNSIGNED_INT,
        "uvec2" => TypeTag::UNSIGNED_INT_VEC2,
        "uvec3" => TypeTag::UNSIGNED_INT_VEC3,
        "uvec4" => TypeTag::UNSIGNED_INT_VEC4,
        "double" => TypeTag::DOUBLE,
        "dvec2" => TypeTag::DOUBLE_VEC2,
        "dvec3" => TypeTag::DOUBLE_VEC3,
        "dvec4" => TypeTag::DOUBLE_VEC4,
        "bool" => TypeTag::BOOL,
        "sampler2D" => TypeTag::SAMPLER_2D,
        "mat2" | "mat2x2" => TypeTag::FLOAT_MAT2,
        "mat3" | "mat3x3" => TypeTag::FLOAT_MAT3,
        "mat4" | "mat4x4" => TypeTag::FLOAT_MAT4,
        "mat2x3" => TypeTag::FLOAT_MAT2X3,
        "mat2x4" => TypeTag::FLOAT_MAT2X4,
        "mat3x2" => TypeTag::FLOAT_MAT3X2,
        "mat3x4" => TypeTag::FLOAT_MAT3X4,
        "mat4x2" => TypeTag::FLOAT_MAT4X2,
        "mat4x3" => TypeTag::FLOAT_MAT4X3,
        "dmat2" | "dmat2x2" => TypeTag::DOUBLE_MAT2,
        "dmat3" | "dmat3x3" => TypeTag::DOUBLE_MAT3,
        "dmat4" | "dmat4x4" => TypeTag::DOUBLE_MAT4,
        "dmat2x3" => TypeTag::DOUBLE_MAT2X3,
        "dmat2x4" => TypeTag::DOUBLE_MAT2X4,
        "dmat3x2" => TypeTag::DOUBLE_MAT3X2,
        "dmat3x4" => TypeTag::DOUBLE_MAT3X4,
        "dmat4x2" => TypeTag::DOUBLE_MAT4X2,
        "dmat4x3" => TypeTag::DOUBLE_MAT4X3,
        _ => return None,
    })
}

/// The unit kind and unit count of one value of a type, plus the matrix shape as
/// (columns, rows) in GL terms.
fn storage(tag: TypeTag) -> (UnitKind, usize, Option<(usize, usize)>) {
    let double = (TypeTag::DOUBLE_MAT2.0..=TypeTag::DOUBLE_VEC4.0).contains(&tag.0)
        || tag == TypeTag::DOUBLE;
    let float = if double {
        UnitKind::Double
    } else {
        UnitKind::Float
    };

    let matrix = |cols, rows| (float, cols * rows, Some((cols, rows)));

    match tag {
        TypeTag::FLOAT | TypeTag::DOUBLE => (float, 1, None),
        TypeTag::FLOAT_VEC2 | TypeTag::DOUBLE_VEC2 => (float, 2, None),
        TypeTag::FLOAT_VEC3 | TypeTag::DOUBLE_VEC3 => (float, 3, None),
        TypeTag::FLOAT_VEC4 | TypeTag::DOUBLE_VEC4 => (float, 4, None),
        TypeTag::INT_VEC2 => (UnitKind::Int, 2, None),
        TypeTag::INT_VEC3 => (UnitKind::Int, 3, None),
        TypeTag::INT_VEC4 => (UnitKind::Int, 4, None),
        TypeTag::UNSIGNED_INT => (UnitKind::UInt, 1, None),
        TypeTag::UNSIGNED_INT_VEC2 => (UnitKind::UInt, 2, None),
        TypeTag::UNSIGNED_INT_VEC3 => (UnitKind::UInt, 3, None),
        TypeTag::UNSIGNED_INT_VEC4 => (UnitKind::UInt, 4, None),
        TypeTag::FLOAT_MAT2 | TypeTag::DOUBLE_MAT2 => matrix(2, 2),
        TypeTag::FLOAT_MAT3 | TypeTag::DOUBLE_MAT3 => matrix(3, 3),
        TypeTag::FLOAT_MAT4 | TypeTag::DOUBLE_MAT4 => matrix(4, 4),
        TypeTag::FLOAT_MAT2X3 | TypeTag::DOUBLE_MAT2X3 => matrix(2, 3),
        TypeTag::FLOAT_MAT2X4 | TypeTag::DOUBLE_MAT2X4 => matrix(2, 4),
        TypeTag::FLOAT_MAT3X2 | TypeTag::DOUBLE_MAT3X2 => matrix(3, 2),
        TypeTag::FLOAT_MAT3X4 | TypeTag::DOUBLE_MAT3X4 => matrix(3, 4),
        TypeTag::FLOAT_MAT4X2 | TypeTag::DOUBLE_MAT4X2 => matrix(4, 2),
        TypeTag::FLOAT_MAT4X3 | TypeTag::DOUBLE_MAT4X3 => matrix(4, 3),
        // Ints, bools and samplers.
        _ => (UnitKind::Int, 1, None),
    }
}

/// Parse `<type> <name>[N];` into the tag, name and array size.
fn parse_declaration(rest: &str) -> Option<(TypeTag, String, usize)> {
    let rest = rest.trim().trim_end_matches(';').trim();
    let mut words = rest
        .split_whitespace()
        .filter(|w| !matches!(*w, "lowp" | "mediump" | "highp" | "flat"));

    let tag = parse_type(words.next()?)?;
    let declarator = words.next()?;

    match declarator.split_once('[') {
        Some((name, size)) => {
            let size = size.trim_end_matches(']').parse().ok()?;
            Some((tag, name.to_string(), size))
        }
        None => Some((tag, declarator.to_string(), 1)),
    }
}

/// The lines of a source that are outside of any braces.
fn top_level_lines(source: &str) -> Vec<&str> {
    let mut depth = 0i32;
    let mut lines = Vec::new();

    for line in source.lines() {
        if depth == 0 {
            lines.push(line.trim());
        }

        depth += line.matches('{').count() as i32;
        depth -= line.matches('}').count() as i32;
    }

    lines
}

fn compile(source: &str) -> (bool, String) {
    if source
        .lines()
        .any(|line| line.trim() == "#pragma fail_silently")
    {
        return (false, String::new());
    }

    let log = source
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            line.trim()
                .strip_prefix("#error")
                .map(|msg| format!("ERROR: 0:{}: '{}'\n", i + 1, msg.trim()))
        })
        .collect::<String>();

    (log.is_empty(), log)
}

/// Prototypes and definitions of functions, by name.
fn functions(source: &str) -> (Vec<String>, Vec<String>) {
    let mut prototypes = Vec::new();
    let mut definitions = Vec::new();

    for line in top_level_lines(source) {
        let open = match line.find('(') {
            Some(open) => open,
            None => continue,
        };
        if line.starts_with('#') || line.starts_with("layout") {
            continue;
        }

        let name = match line[..open].split_whitespace().last() {
            Some(name) => name.to_string(),
            None => continue,
        };

        if line.ends_with(");") {
            prototypes.push(name);
        } else {
            definitions.push(name);
        }
    }

    (prototypes, definitions)
}

fn copy_units<T: Copy>(out: &mut [T], stored: &[T]) {
    let n = out.len().min(stored.len());
    out[..n].copy_from_slice(&stored[..n]);
}

fn transpose<T: Copy>(input: &[T], gl_rows: usize, gl_cols: usize) -> Vec<T> {
    let mut out = input.to_vec();
    for r in 0..gl_rows {
        for c in 0..gl_cols {
            out[c * gl_rows + r] = input[r * gl_cols + c];
        }
    }
    out
}

impl Driver for SoftwareDriver {
    type Error = SoftwareError;

    fn info(&self) -> DriverInfo {
        self.info.clone()
    }

    fn create_shader(&self, kind: ShaderKind) -> Result<u32, Self::Error> {
        let id = self.next_id()?;
        self.state.borrow_mut().shaders.insert(
            id,
            ShaderObject {
                kind,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        Ok(id)
    }

    fn delete_shader(&self, shader: u32) {
        let mut state = self.state.borrow_mut();
        if state.shaders.remove(&shader).is_none() {
            state.errors.push(format!("deleted missing shader {shader}"));
        } else {
            state.freed.push(shader);
        }
    }

    fn is_shader(&self, shader: u32) -> bool {
        self.state.borrow().shaders.contains_key(&shader)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        if let Some(obj) = self.state.borrow_mut().shaders.get_mut(&shader) {
            obj.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: u32) -> bool {
        let mut state = self.state.borrow_mut();
        match state.shaders.get_mut(&shader) {
            Some(obj) => {
                let (ok, log) = compile(&obj.source);
                obj.compiled = ok;
                obj.log = log;
                ok
            }
            None => false,
        }
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map_or(false, |obj| obj.compiled)
    }

    fn shader_log(&self, shader: u32) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|obj| obj.log.clone())
            .unwrap_or_default()
    }

    fn create_program(&self) -> Result<u32, Self::Error> {
        let id = self.next_id()?;
        self.state
            .borrow_mut()
            .programs
            .insert(id, ProgramObject::default());
        Ok(id)
    }

    fn delete_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        if state.programs.remove(&program).is_none() {
            state.errors.push(format!("deleted missing program {program}"));
        } else {
            state.freed.push(program);
        }
        if state.current == Some(program) {
            state.current = None;
        }
    }

    fn is_program(&self, program: u32) -> bool {
        self.state.borrow().programs.contains_key(&program)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.borrow_mut();
        if !state.shaders.contains_key(&shader) {
            state.errors.push(format!("attached missing shader {shader}"));
            return;
        }

        match state.programs.get_mut(&program) {
            Some(obj) if !obj.attached.contains(&shader) => obj.attached.push(shader),
            Some(_) => {}
            None => state.errors.push(format!("attached to missing program {program}")),
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        if let Some(obj) = self.state.borrow_mut().programs.get_mut(&program) {
            obj.attached.retain(|&id| id != shader);
        }
    }

    fn link_program(&self, program: u32) -> bool {
        let mut state = self.state.borrow_mut();
        let state = &mut *state;

        let obj = match state.programs.get_mut(&program) {
            Some(obj) => obj,
            None => return false,
        };

        let shaders = obj
            .attached
            .iter()
            .filter_map(|id| state.shaders.get(id))
            .collect::<Vec<_>>();

        let mut log = String::new();
        if shaders.iter().any(|s| !s.compiled) {
            log.push_str("Link called with uncompiled shaders\n");
        }

        let mut prototypes = Vec::new();
        let mut definitions = Vec::new();
        for shader in &shaders {
            let (p, d) = functions(&shader.source);
            prototypes.extend(p);
            definitions.extend(d);
        }
        for name in prototypes {
            if !definitions.contains(&name) {
                log.push_str(&format!("Function: {name}( is not implemented\n"));
            }
        }

        if !log.is_empty() {
            obj.linked = false;
            obj.log = log;
            return false;
        }

        let mut uniforms: Vec<Var> = Vec::new();
        let mut attributes: Vec<Var> = Vec::new();
        let mut next_uniform = 0;
        let mut next_attribute = 0;

        for shader in &shaders {
            for line in top_level_lines(&shader.source) {
                if let Some(rest) = line.strip_prefix("uniform ") {
                    let (tag, name, size) = match parse_declaration(rest) {
                        Some(decl) => decl,
                        None => continue,
                    };

                    if uniforms.iter().any(|u| u.base_name() == name) {
                        continue;
                    }

                    let name = if size > 1 { format!("{name}[0]") } else { name };
                    uniforms.push(Var {
                        name,
                        tag,
                        size,
                        location: next_uniform,
                    });
                    next_uniform += size as i32;
                } else if shader.kind == ShaderKind::Vertex {
                    let rest = match line
                        .strip_prefix("in ")
                        .or_else(|| line.strip_prefix("attribute "))
                    {
                        Some(rest) => rest,
                        None => continue,
                    };

                    if let Some((tag, name, size)) = parse_declaration(rest) {
                        attributes.push(Var {
                            name,
                            tag,
                            size,
                            location: next_attribute,
                        });
                        next_attribute += 1;
                    }
                }
            }
        }

        obj.values = uniforms
            .iter()
            .flat_map(|var| {
                let (kind, len, _) = storage(var.tag);
                (0..var.size as i32).map(move |i| (var.location + i, Units::zeroed(kind, len)))
            })
            .collect();
        obj.uniforms = uniforms;
        obj.attributes = attributes;
        obj.linked = true;
        obj.log.clear();

        true
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map_or(false, |obj| obj.linked)
    }

    fn program_log(&self, program: u32) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|obj| obj.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: Option<u32>) {
        let mut state = self.state.borrow_mut();
        match program {
            Some(id) if !state.programs.get(&id).map_or(false, |p| p.linked) => {
                state.errors.push(format!("used unlinked program {id}"));
            }
            program => state.current = program,
        }
    }

    fn current_program(&self) -> Option<u32> {
        self.state.borrow().current
    }

    fn active_count(&self, program: u32, kind: VariableKind) -> u32 {
        let state = self.state.borrow();
        let obj = match state.programs.get(&program) {
            Some(obj) => obj,
            None => return 0,
        };

        match kind {
            VariableKind::Uniform => obj.uniforms.len() as u32,
            VariableKind::Attribute => obj.attributes.len() as u32,
        }
    }

    fn active_variable(
        &self,
        program: u32,
        kind: VariableKind,
        index: u32,
    ) -> Option<ActiveVariable> {
        let state = self.state.borrow();
        let obj = state.programs.get(&program)?;
        let vars = match kind {
            VariableKind::Uniform => &obj.uniforms,
            VariableKind::Attribute => &obj.attributes,
        };

        vars.get(index as usize).map(|var| ActiveVariable {
            name: var.name.clone(),
            tag: var.tag,
            size: var.size,
        })
    }

    fn location(&self, program: u32, kind: VariableKind, name: &str) -> Option<Location> {
        let state = self.state.borrow();
        let obj = state.programs.get(&program)?;
        let vars = match kind {
            VariableKind::Uniform => &obj.uniforms,
            VariableKind::Attribute => &obj.attributes,
        };

        let (base, index) = match name.split_once('[') {
            Some((base, index)) => (base, index.trim_end_matches(']').parse::<i32>().ok()?),
            None => (name, 0),
        };

        vars.iter()
            .find(|var| var.base_name() == base && index < var.size as i32)
            .map(|var| Location(var.location + index))
    }

    fn read_uniform(&self, program: u32, location: Location, units: &mut Units) {
        let stored = self
            .state
            .borrow()
            .programs
            .get(&program)
            .and_then(|p| p.value(location.0))
            .cloned();

        let stored = match stored {
            Some(stored) => stored,
            None => {
                self.error(format!("read of missing uniform {location:?}"));
                return;
            }
        };

        match (units, stored) {
            (Units::Float(out), Units::Float(v)) => copy_units(out, &v),
            (Units::Int(out), Units::Int(v)) => copy_units(out, &v),
            (Units::UInt(out), Units::UInt(v)) => copy_units(out, &v),
            (Units::Double(out), Units::Double(v)) => copy_units(out, &v),
            (out, stored) => self.error(format!(
                "read {:?} units from {:?} storage",
                out.kind(),
                stored.kind()
            )),
        }
    }

    fn write_uniform(&self, write: UniformWrite<'_>) {
        let mut state = self.state.borrow_mut();
        let state = &mut *state;

        let current = match state.current {
            Some(current) => current,
            None => {
                state.errors.push("uniform written with no program in use".into());
                return;
            }
        };

        let program = match state.programs.get_mut(&current) {
            Some(program) => program,
            None => return,
        };

        let var_tag = match program.uniform_at(write.location.0) {
            Some(var) => var.tag,
            None => {
                state
                    .errors
                    .push(format!("no uniform at {:?}", write.location));
                return;
            }
        };

        if var_tag != write.tag {
            state
                .errors
                .push(format!("wrote {} into a {} uniform", write.tag, var_tag));
            return;
        }

        let (kind, len, matrix) = storage(var_tag);
        if write.units.kind() != kind || write.units.len() != len {
            state.errors.push(format!(
                "wrote {} {:?} units into {}",
                write.units.len(),
                write.units.kind(),
                var_tag
            ));
            return;
        }

        let units = match (matrix, write.transpose) {
            (Some((gl_cols, gl_rows)), true) => match write.units {
                Units::Float(v) => Units::Float(transpose(v, gl_rows, gl_cols)),
                Units::Double(v) => Units::Double(transpose(v, gl_rows, gl_cols)),
                other => other.clone(),
            },
            _ => write.units.clone(),
        };

        if let Some(slot) = program.value_mut(write.location.0) {
            *slot = units;
            state.writes += 1;
        }
    }

    fn enable_attribute(&self, index: u32) {
        let mut state = self.state.borrow_mut();
        if !state.enabled.contains(&index) {
            state.enabled.push(index);
        }
    }

    fn disable_attribute(&self, index: u32) {
        self.state.borrow_mut().enabled.retain(|&i| i != index);
    }

    fn attribute_pointer(&self, index: u32, layout: &AttributeLayout) {
        self.state.borrow_mut().pointers.push((index, *layout));
    }
}
