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

//! Defines the driver backend for glshaders.

use crate::registry::TypeInfo;
use crate::types::{TypeTag, UnitKind, Units};

use ahash::RandomState;
use arrayvec::ArrayVec;
use hashbrown::HashSet;

use std::error::Error;

/// The backend that shader and program objects are created through.
///
/// Every method is a synchronous round trip to a single graphics context. Implementations
/// are not expected to be reentrant across threads.
pub trait Driver {
    /// The error type associated with this driver.
    type Error: Error + 'static;

    /// Describe the versions and capabilities of this driver.
    fn info(&self) -> DriverInfo;

    /// Create a new shader object of the given stage.
    fn create_shader(&self, kind: ShaderKind) -> Result<u32, Self::Error>;

    /// Delete a shader object.
    fn delete_shader(&self, shader: u32);

    /// Whether `shader` names a live shader object.
    fn is_shader(&self, shader: u32) -> bool;

    /// Replace the source code of a shader.
    fn shader_source(&self, shader: u32, source: &str);

    /// Compile a shader, returning whether compilation succeeded.
    fn compile_shader(&self, shader: u32) -> bool;

    /// Whether the last compilation of a shader succeeded.
    fn shader_compile_status(&self, shader: u32) -> bool;

    /// The compilation log of a shader.
    fn shader_log(&self, shader: u32) -> String;

    /// Create a new program object.
    fn create_program(&self) -> Result<u32, Self::Error>;

    /// Delete a program object.
    fn delete_program(&self, program: u32);

    /// Whether `program` names a live program object.
    fn is_program(&self, program: u32) -> bool;

    /// Attach a shader to a program.
    fn attach_shader(&self, program: u32, shader: u32);

    /// Detach a shader from a program.
    fn detach_shader(&self, program: u32, shader: u32);

    /// Link a program, returning whether linking succeeded.
    fn link_program(&self, program: u32) -> bool;

    /// Whether the last link of a program succeeded.
    fn program_link_status(&self, program: u32) -> bool;

    /// The link log of a program.
    fn program_log(&self, program: u32) -> String;

    /// Make a program current, or clear the current program.
    fn use_program(&self, program: Option<u32>);

    /// The program that is currently in use.
    fn current_program(&self) -> Option<u32>;

    /// The number of active uniforms or attributes in a linked program.
    fn active_count(&self, program: u32, kind: VariableKind) -> u32;

    /// Describe the active uniform or attribute at `index`.
    fn active_variable(
        &self,
        program: u32,
        kind: VariableKind,
        index: u32,
    ) -> Option<ActiveVariable>;

    /// Get the location of a uniform or attribute by name.
    fn location(&self, program: u32, kind: VariableKind, name: &str) -> Option<Location>;

    /// Read the value at `location` into `units`.
    ///
    /// The kind and length of `units` describe how many units of which type to read.
    fn read_uniform(&self, program: u32, location: Location, units: &mut Units);

    /// Write one value into the uniform at `location` of the current program.
    fn write_uniform(&self, write: UniformWrite<'_>);

    /// Enable the vertex attribute array at `index`.
    fn enable_attribute(&self, index: u32);

    /// Disable the vertex attribute array at `index`.
    fn disable_attribute(&self, index: u32);

    /// Describe where the vertex attribute at `index` reads its data from.
    fn attribute_pointer(&self, index: u32, layout: &AttributeLayout);
}

/// The stage of a shader object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

/// The kind of variable to reflect over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Uniform,
    Attribute,
}

/// An opaque location token handed out by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location(pub i32);

impl Location {
    /// The location of the `index`th element of an array starting at this location.
    pub fn offset(self, index: usize) -> Location {
        Location(self.0 + index as i32)
    }
}

/// An active variable, as reported by the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveVariable {
    /// The raw name, which includes a `[0]` suffix for some arrays.
    pub name: String,

    /// The element type.
    pub tag: TypeTag,

    /// The declared array size, or 1.
    pub size: usize,
}

/// The data necessary to write a value into a uniform.
#[derive(Debug)]
pub struct UniformWrite<'a> {
    /// The location to write to.
    pub location: Location,

    /// The type tag of the uniform.
    pub tag: TypeTag,

    /// The registry row for the uniform's type.
    pub info: &'a TypeInfo,

    /// Whether matrices are supplied row-major and must be transposed.
    pub transpose: bool,

    /// The units of exactly one value.
    pub units: &'a Units,
}

/// How a vertex attribute reads from the bound buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeLayout {
    /// The type of each component in the buffer, such as [`TypeTag::FLOAT`].
    pub data_type: TypeTag,

    /// The number of components per vertex, between 1 and 4.
    pub size: i32,

    /// Whether fixed point data is normalized.
    pub normalized: bool,

    /// The byte offset between consecutive vertices.
    pub stride: i32,

    /// The byte offset of the first component.
    pub offset: i32,
}

impl AttributeLayout {
    /// A tightly packed, unnormalized layout starting at the beginning of the buffer.
    pub fn new(data_type: TypeTag, size: i32) -> Self {
        Self {
            data_type,
            size,
            normalized: false,
            stride: 0,
            offset: 0,
        }
    }

    /// Set the byte offset of the first component.
    pub fn offset(mut self, offset: i32) -> Self {
        self.offset = offset;
        self
    }

    /// Set the byte offset between consecutive vertices.
    pub fn stride(mut self, stride: i32) -> Self {
        self.stride = stride;
        self
    }

    /// Set whether fixed point data is normalized.
    pub fn normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }
}

/// A `major.minor` version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse the first `major.minor` number out of a driver version string.
    ///
    /// Handles strings like `"4.60 NVIDIA"` and `"OpenGL ES GLSL ES 3.00"`.
    pub fn parse(s: &str) -> Option<Self> {
        let start = s.find(|c: char| c.is_ascii_digit())?;
        let number = s[start..]
            .split(|c: char| !(c.is_ascii_digit() || c == '.'))
            .next()?;

        let parts = number
            .split('.')
            .take(2)
            .map(|part| part.parse::<u32>().ok())
            .collect::<Option<ArrayVec<u32, 2>>>()?;

        Some(Self {
            major: *parts.first()?,
            minor: parts.get(1).copied().unwrap_or(0),
        })
    }
}

/// The versions and capabilities of a driver.
#[derive(Debug, Clone)]
pub struct DriverInfo {
    /// The graphics API version.
    pub api_version: Version,

    /// The shading language version.
    pub glsl_version: Version,

    /// The names of the supported API extensions.
    pub extensions: HashSet<String, RandomState>,

    /// The unit kinds the driver can read and write.
    pub unit_kinds: ArrayVec<UnitKind, 4>,
}

impl DriverInfo {
    /// Describe a driver.
    pub fn new(
        api_version: Version,
        glsl_version: Version,
        extensions: impl IntoIterator<Item = String>,
        unit_kinds: impl IntoIterator<Item = UnitKind>,
    ) -> Self {
        let mut kinds = ArrayVec::new();
        for kind in unit_kinds {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }

        let mut set = HashSet::with_hasher(RandomState::new());
        set.extend(extensions);

        Self {
            api_version,
            glsl_version,
            extensions: set,
            unit_kinds: kinds,
        }
    }

    /// Whether the API and shading language are at least the given versions.
    pub fn has_version(&self, api: Version, glsl: Version) -> bool {
        self.api_version >= api && self.glsl_version >= glsl
    }

    /// Whether the driver reports the named API extension.
    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    /// Whether the driver can marshal units of this kind.
    pub fn supports(&self, kind: UnitKind) -> bool {
        self.unit_kinds.contains(&kind)
    }
}
