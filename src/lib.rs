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

//! Named access to the uniforms and vertex attributes of GPU shader programs.
//!
//! Instead of looking up numeric locations and packing binary buffers by hand, a linked
//! [`Program`] reflects over its active uniforms and attributes and exposes them by name.
//! Values are read and written as [`Value`] trees: vectors are lists of scalars, matrices
//! are lists of rows and arrays are lists of elements.
//!
//! To use, implement the [`Driver`] trait on a type that represents an active graphics
//! context, or use the `glshaders-glow` crate. Wrap it in a [`Context`], and then create
//! shaders and programs from there:
//!
//! ```no_run
//! # fn run<D: glshaders::Driver>(driver: D) -> Result<(), glshaders::Error> {
//! let context = glshaders::Context::new(driver);
//! let program = glshaders::from_sources(&context, [VERTEX], [FRAGMENT])?;
//!
//! program.use_program();
//! program.uniforms().set("color", [1.0f32, 0.5, 0.0, 1.0])?;
//! # Ok(())
//! # }
//! # const VERTEX: &str = "";
//! # const FRAGMENT: &str = "";
//! ```
//!
//! The set of uniform types is open. Types beyond the core float and int types are added
//! through [`Extension`]s, such as the built-in `uint_uniforms` and `double_uniforms`.
//!
//! Note that this crate uses thread-unsafe primitives throughout, as a graphics context is
//! bound to a single thread anyways.

#![forbid(unsafe_code, rust_2018_idioms)]

mod accessor;
mod context;
mod driver;
mod error;
mod extensions;
mod loader;
mod program;
mod reflection;
mod registry;
mod shader;
mod types;

pub use self::accessor::Accessor;
pub use self::context::Context;
pub use self::driver::{
    ActiveVariable, AttributeLayout, Driver, DriverInfo, Location, ShaderKind, UniformWrite,
    VariableKind, Version,
};
pub use self::error::Error;
pub use self::extensions::{find as find_extension, DoubleUniforms, Extension, UintUniforms};
pub use self::loader::{from_paths, from_readers, from_sources};
pub use self::program::Program;
pub use self::reflection::{Attribute, Attributes, Uniform, Uniforms};
pub use self::registry::{MatrixShape, RegistryExtension, TypeInfo, TypeRegistry};
pub use self::shader::Shader;
pub use self::types::{Scalar, TypeTag, UnitKind, Units, Value};
