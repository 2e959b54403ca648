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

//! Registry extensions that add uniform types beyond the core set.

use crate::driver::{DriverInfo, Version};
use crate::registry::{RegistryExtension, TypeInfo};
use crate::types::{TypeTag, UnitKind};
use crate::Error;

/// A bundle of types that can be added to a [`TypeRegistry`].
///
/// [`TypeRegistry`]: crate::TypeRegistry
pub trait Extension {
    /// The name the extension is loaded by.
    fn name(&self) -> &str;

    /// Whether the driver can handle the types this extension adds.
    fn supported(&self, info: &DriverInfo) -> bool;

    /// Register the extension's types.
    fn load(&self, registry: &mut RegistryExtension<'_>) -> Result<(), Error>;
}

/// Find a built-in extension by name.
pub fn find(name: &str) -> Result<&'static dyn Extension, Error> {
    match name {
        UintUniforms::NAME => Ok(&UintUniforms),
        DoubleUniforms::NAME => Ok(&DoubleUniforms),
        _ => Err(Error::ExtensionUnavailable(name.to_string())),
    }
}

/// Unsigned integer scalars and vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct UintUniforms;

impl UintUniforms {
    pub const NAME: &'static str = "uint_uniforms";
}

impl Extension for UintUniforms {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn supported(&self, info: &DriverInfo) -> bool {
        info.has_version(Version::new(3, 0), Version::new(1, 30)) && info.supports(UnitKind::UInt)
    }

    fn load(&self, registry: &mut RegistryExtension<'_>) -> Result<(), Error> {
        registry.register_getter_kind(UnitKind::UInt);

        registry.register_type(TypeTag::UNSIGNED_INT, TypeInfo::scalar(UnitKind::UInt))?;
        for (tag, n) in [
            (TypeTag::UNSIGNED_INT_VEC2, 2),
            (TypeTag::UNSIGNED_INT_VEC3, 3),
            (TypeTag::UNSIGNED_INT_VEC4, 4),
        ] {
            registry.register_type(tag, TypeInfo::vector(UnitKind::UInt, n))?;
        }

        Ok(())
    }
}

/// Double precision scalars, vectors and matrices.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleUniforms;

impl DoubleUniforms {
    pub const NAME: &'static str = "double_uniforms";
    pub const GL_EXTENSION: &'static str = "GL_ARB_gpu_shader_fp64";
}

impl Extension for DoubleUniforms {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn supported(&self, info: &DriverInfo) -> bool {
        info.has_version(Version::new(3, 2), Version::new(1, 50))
            && info.has_extension(Self::GL_EXTENSION)
            && info.supports(UnitKind::Double)
    }

    fn load(&self, registry: &mut RegistryExtension<'_>) -> Result<(), Error> {
        registry.register_getter_kind(UnitKind::Double);

        registry.register_type(TypeTag::DOUBLE, TypeInfo::scalar(UnitKind::Double))?;
        for (tag, n) in [
            (TypeTag::DOUBLE_VEC2, 2),
            (TypeTag::DOUBLE_VEC3, 3),
            (TypeTag::DOUBLE_VEC4, 4),
        ] {
            registry.register_type(tag, TypeInfo::vector(UnitKind::Double, n))?;
        }

        for (tag, rows, cols) in [
            (TypeTag::DOUBLE_MAT2, 2, 2),
            (TypeTag::DOUBLE_MAT3, 3, 3),
            (TypeTag::DOUBLE_MAT4, 4, 4),
            (TypeTag::DOUBLE_MAT2X3, 2, 3),
            (TypeTag::DOUBLE_MAT2X4, 2, 4),
            (TypeTag::DOUBLE_MAT3X2, 3, 2),
            (TypeTag::DOUBLE_MAT3X4, 3, 4),
            (TypeTag::DOUBLE_MAT4X2, 4, 2),
            (TypeTag::DOUBLE_MAT4X3, 4, 3),
        ] {
            registry.register_type(tag, TypeInfo::matrix(UnitKind::Double, rows, cols))?;
        }

        Ok(())
    }
}
