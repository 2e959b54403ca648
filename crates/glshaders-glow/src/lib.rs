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

//! A [`glshaders`] driver that uses the [`glow`] crate.
//!
//! [`glow`]: https://crates.io/crates/glow

use glow::{HasContext, NativeProgram, NativeShader, NativeUniformLocation};

use glshaders::{
    ActiveVariable, AttributeLayout, Driver, DriverInfo, Location, ShaderKind, TypeTag,
    UniformWrite, UnitKind, Units, VariableKind, Version,
};

use std::fmt;
use std::num::NonZeroU32;

/// A [`glshaders`] driver around a [`glow`] context.
///
/// The native object types of the context must be the ones used by desktop and ES OpenGL,
/// which is the case for [`glow::Context`].
pub struct GlowDriver<H: ?Sized> {
    /// The underlying context.
    context: H,
}

impl<H: ?Sized> fmt::Debug for GlowDriver<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowDriver").finish_non_exhaustive()
    }
}

impl<H> GlowDriver<H> {
    /// Create a new driver from a [`glow`] context.
    ///
    /// # Safety
    ///
    /// The context must be current whenever a method of the driver is called, including
    /// when the shaders and programs created through it are dropped.
    pub unsafe fn new(context: H) -> Self {
        Self { context }
    }

    /// Get the underlying context back.
    pub fn into_inner(self) -> H {
        self.context
    }
}

impl<H: ?Sized> GlowDriver<H> {
    /// Get a reference to the underlying [`glow`] context.
    pub fn get_ref(&self) -> &H {
        &self.context
    }
}

/// An error from the OpenGL driver.
#[derive(Debug)]
pub struct GlError(String);

impl From<String> for GlError {
    fn from(s: String) -> Self {
        GlError(s)
    }
}

impl fmt::Display for GlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gl error: {}", self.0)
    }
}

impl std::error::Error for GlError {}

fn shader(id: u32) -> Option<NativeShader> {
    NonZeroU32::new(id).map(NativeShader)
}

fn program(id: u32) -> Option<NativeProgram> {
    NonZeroU32::new(id).map(NativeProgram)
}

fn uniform_location(location: Location) -> NativeUniformLocation {
    NativeUniformLocation(location.0 as u32)
}

fn shader_type(kind: ShaderKind) -> u32 {
    match kind {
        ShaderKind::Vertex => glow::VERTEX_SHADER,
        ShaderKind::Fragment => glow::FRAGMENT_SHADER,
    }
}

impl<H> Driver for GlowDriver<H>
where
    H: HasContext<
            Shader = NativeShader,
            Program = NativeProgram,
            UniformLocation = NativeUniformLocation,
        > + ?Sized,
{
    type Error = GlError;

    fn info(&self) -> DriverInfo {
        let version = self.context.version();
        let glsl = unsafe {
            self.context
                .get_parameter_string(glow::SHADING_LANGUAGE_VERSION)
        };

        let glsl_version = Version::parse(&glsl).unwrap_or_else(|| {
            tracing::warn!("unable to parse shading language version: {glsl}");
            Version::new(1, 0)
        });

        DriverInfo::new(
            Version::new(version.major, version.minor),
            glsl_version,
            self.context.supported_extensions().iter().cloned(),
            [UnitKind::Float, UnitKind::Int, UnitKind::UInt],
        )
    }

    fn create_shader(&self, kind: ShaderKind) -> Result<u32, Self::Error> {
        let shader = unsafe { self.context.create_shader(shader_type(kind))? };
        Ok(shader.0.get())
    }

    fn delete_shader(&self, id: u32) {
        if let Some(shader) = shader(id) {
            unsafe {
                self.context.delete_shader(shader);
            }
            gl_error(&self.context);
        }
    }

    fn is_shader(&self, id: u32) -> bool {
        shader(id).map_or(false, |shader| unsafe { self.context.is_shader(shader) })
    }

    fn shader_source(&self, id: u32, source: &str) {
        if let Some(shader) = shader(id) {
            unsafe {
                self.context.shader_source(shader, source);
            }
        }
    }

    fn compile_shader(&self, id: u32) -> bool {
        let shader = match shader(id) {
            Some(shader) => shader,
            None => return false,
        };

        unsafe {
            self.context.compile_shader(shader);
            self.context.get_shader_compile_status(shader)
        }
    }

    fn shader_compile_status(&self, id: u32) -> bool {
        shader(id).map_or(false, |shader| unsafe {
            self.context.get_shader_compile_status(shader)
        })
    }

    fn shader_log(&self, id: u32) -> String {
        shader(id)
            .map(|shader| unsafe { self.context.get_shader_info_log(shader) })
            .unwrap_or_default()
    }

    fn create_program(&self) -> Result<u32, Self::Error> {
        let program = unsafe { self.context.create_program()? };
        Ok(program.0.get())
    }

    fn delete_program(&self, id: u32) {
        if let Some(program) = program(id) {
            unsafe {
                self.context.delete_program(program);
            }
            gl_error(&self.context);
        }
    }

    fn is_program(&self, id: u32) -> bool {
        program(id).map_or(false, |program| unsafe { self.context.is_program(program) })
    }

    fn attach_shader(&self, program_id: u32, shader_id: u32) {
        if let (Some(program), Some(shader)) = (program(program_id), shader(shader_id)) {
            unsafe {
                self.context.attach_shader(program, shader);
            }
            gl_error(&self.context);
        }
    }

    fn detach_shader(&self, program_id: u32, shader_id: u32) {
        if let (Some(program), Some(shader)) = (program(program_id), shader(shader_id)) {
            unsafe {
                self.context.detach_shader(program, shader);
            }
            gl_error(&self.context);
        }
    }

    fn link_program(&self, id: u32) -> bool {
        let program = match program(id) {
            Some(program) => program,
            None => return false,
        };

        unsafe {
            self.context.link_program(program);
            self.context.get_program_link_status(program)
        }
    }

    fn program_link_status(&self, id: u32) -> bool {
        program(id).map_or(false, |program| unsafe {
            self.context.get_program_link_status(program)
        })
    }

    fn program_log(&self, id: u32) -> String {
        program(id)
            .map(|program| unsafe { self.context.get_program_info_log(program) })
            .unwrap_or_default()
    }

    fn use_program(&self, id: Option<u32>) {
        unsafe {
            self.context.use_program(id.and_then(program));
        }
        gl_error(&self.context);
    }

    fn current_program(&self) -> Option<u32> {
        let id = unsafe { self.context.get_parameter_i32(glow::CURRENT_PROGRAM) };
        match id {
            0 => None,
            id => Some(id as u32),
        }
    }

    fn active_count(&self, id: u32, kind: VariableKind) -> u32 {
        let program = match program(id) {
            Some(program) => program,
            None => return 0,
        };

        unsafe {
            match kind {
                VariableKind::Uniform => self.context.get_active_uniforms(program),
                VariableKind::Attribute => self.context.get_active_attributes(program),
            }
        }
    }

    fn active_variable(&self, id: u32, kind: VariableKind, index: u32) -> Option<ActiveVariable> {
        let program = program(id)?;

        let (name, tag, size) = unsafe {
            match kind {
                VariableKind::Uniform => {
                    let active = self.context.get_active_uniform(program, index)?;
                    (active.name, active.utype, active.size)
                }
                VariableKind::Attribute => {
                    let active = self.context.get_active_attribute(program, index)?;
                    (active.name, active.atype, active.size)
                }
            }
        };

        Some(ActiveVariable {
            name,
            tag: TypeTag(tag),
            size: size.max(1) as usize,
        })
    }

    fn location(&self, id: u32, kind: VariableKind, name: &str) -> Option<Location> {
        let program = program(id)?;

        unsafe {
            match kind {
                VariableKind::Uniform => self
                    .context
                    .get_uniform_location(program, name)
                    .map(|location| Location(location.0 as i32)),
                VariableKind::Attribute => self
                    .context
                    .get_attrib_location(program, name)
                    .map(|location| Location(location as i32)),
            }
        }
    }

    fn read_uniform(&self, id: u32, location: Location, units: &mut Units) {
        let program = match program(id) {
            Some(program) => program,
            None => return,
        };
        let location = uniform_location(location);

        unsafe {
            match units {
                Units::Float(buf) => self.context.get_uniform_f32(program, &location, buf),
                Units::Int(buf) => self.context.get_uniform_i32(program, &location, buf),
                Units::UInt(buf) => {
                    // Unsigned values come back bit for bit through the signed getter.
                    let buf: &mut [i32] = bytemuck::cast_slice_mut(buf.as_mut_slice());
                    self.context.get_uniform_i32(program, &location, buf);
                }
                Units::Double(_) => {
                    tracing::warn!("glow cannot read double precision uniforms");
                    return;
                }
            }
        }

        gl_error(&self.context);
    }

    fn write_uniform(&self, write: UniformWrite<'_>) {
        let UniformWrite {
            location,
            tag,
            info,
            transpose,
            units,
        } = write;
        let location = uniform_location(location);
        let loc = Some(&location);

        tracing::trace!("uniform {tag} at {loc:?}: {units:?}");

        unsafe {
            match (units, info.matrix) {
                (Units::Float(v), Some(shape)) => match (shape.rows, shape.cols) {
                    (2, 2) => self.context.uniform_matrix_2_f32_slice(loc, transpose, v),
                    (3, 3) => self.context.uniform_matrix_3_f32_slice(loc, transpose, v),
                    (4, 4) => self.context.uniform_matrix_4_f32_slice(loc, transpose, v),
                    (2, 3) => self.context.uniform_matrix_2x3_f32_slice(loc, transpose, v),
                    (2, 4) => self.context.uniform_matrix_2x4_f32_slice(loc, transpose, v),
                    (3, 2) => self.context.uniform_matrix_3x2_f32_slice(loc, transpose, v),
                    (3, 4) => self.context.uniform_matrix_3x4_f32_slice(loc, transpose, v),
                    (4, 2) => self.context.uniform_matrix_4x2_f32_slice(loc, transpose, v),
                    (4, 3) => self.context.uniform_matrix_4x3_f32_slice(loc, transpose, v),
                    (rows, cols) => {
                        tracing::warn!("no matrix uniform function for {rows}x{cols}");
                        return;
                    }
                },
                (Units::Float(v), None) => match v.len() {
                    1 => self.context.uniform_1_f32_slice(loc, v),
                    2 => self.context.uniform_2_f32_slice(loc, v),
                    3 => self.context.uniform_3_f32_slice(loc, v),
                    4 => self.context.uniform_4_f32_slice(loc, v),
                    n => return unsupported_width(tag, n),
                },
                (Units::Int(v), _) => match v.len() {
                    1 => self.context.uniform_1_i32_slice(loc, v),
                    2 => self.context.uniform_2_i32_slice(loc, v),
                    3 => self.context.uniform_3_i32_slice(loc, v),
                    4 => self.context.uniform_4_i32_slice(loc, v),
                    n => return unsupported_width(tag, n),
                },
                (Units::UInt(v), _) => match v.len() {
                    1 => self.context.uniform_1_u32_slice(loc, v),
                    2 => self.context.uniform_2_u32_slice(loc, v),
                    3 => self.context.uniform_3_u32_slice(loc, v),
                    4 => self.context.uniform_4_u32_slice(loc, v),
                    n => return unsupported_width(tag, n),
                },
                (Units::Double(_), _) => {
                    tracing::warn!("glow cannot write double precision uniform {tag}");
                    return;
                }
            }
        }

        gl_error(&self.context);
    }

    fn enable_attribute(&self, index: u32) {
        unsafe {
            self.context.enable_vertex_attrib_array(index);
        }
        gl_error(&self.context);
    }

    fn disable_attribute(&self, index: u32) {
        unsafe {
            self.context.disable_vertex_attrib_array(index);
        }
        gl_error(&self.context);
    }

    fn attribute_pointer(&self, index: u32, layout: &AttributeLayout) {
        unsafe {
            self.context.vertex_attrib_pointer_f32(
                index,
                layout.size,
                layout.data_type.0,
                layout.normalized,
                layout.stride,
                layout.offset,
            );
        }
        gl_error(&self.context);
    }
}

fn unsupported_width(tag: TypeTag, width: usize) {
    tracing::warn!("no uniform function for {width} units of {tag}");
}

fn gl_error(h: &(impl HasContext + ?Sized)) {
    let err = unsafe { h.get_error() };

    if err != glow::NO_ERROR {
        let error_str = match err {
            glow::INVALID_ENUM => "GL_INVALID_ENUM",
            glow::INVALID_VALUE => "GL_INVALID_VALUE",
            glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
            glow::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
            glow::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
            glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
            glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
            glow::CONTEXT_LOST => "GL_CONTEXT_LOST",
            _ => "Unknown GL error",
        };

        tracing::error!("GL error: {}", error_str)
    }
}
