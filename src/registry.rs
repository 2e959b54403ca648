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

//! The open table mapping type tags to their unit layout.

use crate::extensions::Extension;
use crate::driver::DriverInfo;
use crate::types::{TypeTag, UnitKind};
use crate::Error;

use ahash::RandomState;
use hashbrown::{HashMap, HashSet};

/// The shape of a matrix type, as presented to callers.
///
/// `GL_FLOAT_MATnxm` is presented as `n` rows of `m` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatrixShape {
    pub rows: usize,
    pub cols: usize,
}

/// The layout of one value of a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// The kind of unit the value is made of.
    pub kind: UnitKind,

    /// The number of units in one value.
    pub components: usize,

    /// The matrix shape, if this is a matrix type.
    pub matrix: Option<MatrixShape>,
}

impl TypeInfo {
    /// A single unit.
    pub const fn scalar(kind: UnitKind) -> Self {
        Self::vector(kind, 1)
    }

    /// A vector of `components` units.
    pub const fn vector(kind: UnitKind, components: usize) -> Self {
        Self {
            kind,
            components,
            matrix: None,
        }
    }

    /// A matrix of `rows` rows and `cols` values per row.
    pub const fn matrix(kind: UnitKind, rows: usize, cols: usize) -> Self {
        Self {
            kind,
            components: rows * cols,
            matrix: Some(MatrixShape { rows, cols }),
        }
    }

    /// Whether values of this type are written as a sequence, one nesting level deep.
    pub fn needs_unpack(&self) -> bool {
        self.components > 1
    }
}

/// The table of known uniform types.
///
/// Uniforms whose type tag is missing from the registry are still reflected, but reading
/// them yields nothing and writing them does nothing.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    /// The layout of every known type.
    types: HashMap<TypeTag, TypeInfo, RandomState>,

    /// The unit kinds that can be read back from the driver.
    getter_kinds: HashSet<UnitKind, RandomState>,

    /// The names of the extensions that have been loaded.
    extensions: HashSet<String, RandomState>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::core()
    }
}

impl TypeRegistry {
    /// A registry with no types and no getters.
    pub fn empty() -> Self {
        Self {
            types: HashMap::with_hasher(RandomState::new()),
            getter_kinds: HashSet::with_hasher(RandomState::new()),
            extensions: HashSet::with_hasher(RandomState::new()),
        }
    }

    /// The registry of types every driver supports: float and int scalars, vectors and
    /// float matrices.
    pub fn core() -> Self {
        let mut registry = Self::empty();
        registry.getter_kinds.insert(UnitKind::Float);
        registry.getter_kinds.insert(UnitKind::Int);

        let rows = [
            (TypeTag::FLOAT, TypeInfo::scalar(UnitKind::Float)),
            (TypeTag::FLOAT_VEC2, TypeInfo::vector(UnitKind::Float, 2)),
            (TypeTag::FLOAT_VEC3, TypeInfo::vector(UnitKind::Float, 3)),
            (TypeTag::FLOAT_VEC4, TypeInfo::vector(UnitKind::Float, 4)),
            (TypeTag::INT, TypeInfo::scalar(UnitKind::Int)),
            (TypeTag::INT_VEC2, TypeInfo::vector(UnitKind::Int, 2)),
            (TypeTag::INT_VEC3, TypeInfo::vector(UnitKind::Int, 3)),
            (TypeTag::INT_VEC4, TypeInfo::vector(UnitKind::Int, 4)),
            (TypeTag::FLOAT_MAT2, TypeInfo::matrix(UnitKind::Float, 2, 2)),
            (TypeTag::FLOAT_MAT3, TypeInfo::matrix(UnitKind::Float, 3, 3)),
            (TypeTag::FLOAT_MAT4, TypeInfo::matrix(UnitKind::Float, 4, 4)),
            (TypeTag::FLOAT_MAT2X3, TypeInfo::matrix(UnitKind::Float, 2, 3)),
            (TypeTag::FLOAT_MAT2X4, TypeInfo::matrix(UnitKind::Float, 2, 4)),
            (TypeTag::FLOAT_MAT3X2, TypeInfo::matrix(UnitKind::Float, 3, 2)),
            (TypeTag::FLOAT_MAT3X4, TypeInfo::matrix(UnitKind::Float, 3, 4)),
            (TypeTag::FLOAT_MAT4X2, TypeInfo::matrix(UnitKind::Float, 4, 2)),
            (TypeTag::FLOAT_MAT4X3, TypeInfo::matrix(UnitKind::Float, 4, 3)),
        ];
        registry.types.extend(rows);

        registry
    }

    /// Declare that units of `kind` can be read back from the driver.
    pub fn register_getter_kind(&mut self, kind: UnitKind) {
        self.getter_kinds.insert(kind);
    }

    /// Whether units of `kind` can be read back from the driver.
    pub fn has_getter_kind(&self, kind: UnitKind) -> bool {
        self.getter_kinds.contains(&kind)
    }

    /// Register the layout of a type, replacing and returning any previous layout.
    pub fn register_type(
        &mut self,
        tag: TypeTag,
        info: TypeInfo,
    ) -> Result<Option<TypeInfo>, Error> {
        if !self.has_getter_kind(info.kind) {
            return Err(Error::UnregisteredUnitKind(info.kind));
        }

        Ok(self.types.insert(tag, info))
    }

    /// Look up the layout of a type.
    pub fn lookup(&self, tag: TypeTag) -> Option<&TypeInfo> {
        self.types.get(&tag)
    }

    /// Whether values of this type are written as a sequence rather than a bare scalar.
    ///
    /// Unknown types never need unpacking.
    pub fn needs_unpack(&self, tag: TypeTag) -> bool {
        self.lookup(tag).map_or(false, TypeInfo::needs_unpack)
    }

    /// The number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Whether the extension named `name` has been loaded into this registry.
    pub fn extension_loaded(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    /// Load an extension into this registry.
    ///
    /// Either every row the extension registers is added, or the registry is left
    /// untouched.
    pub fn load_extension(
        &mut self,
        extension: &dyn Extension,
        info: &DriverInfo,
    ) -> Result<(), Error> {
        let name = extension.name();

        if self.extension_loaded(name) {
            return Err(Error::ExtensionAlreadyLoaded(name.to_string()));
        }

        if !extension.supported(info) {
            return Err(Error::ExtensionUnsupported(name.to_string()));
        }

        let mut staged = RegistryExtension {
            registry: self,
            getter_kinds: Vec::new(),
            types: Vec::new(),
        };
        extension.load(&mut staged)?;

        let RegistryExtension {
            getter_kinds,
            types,
            ..
        } = staged;

        self.getter_kinds.extend(getter_kinds);
        self.types.extend(types);
        self.extensions.insert(name.to_string());

        tracing::debug!("loaded uniform extension {name}");

        Ok(())
    }
}

/// The rows an extension is about to add to a registry.
///
/// Unlike [`TypeRegistry::register_type`], registering a type that already exists is an
/// error here.
#[derive(Debug)]
pub struct RegistryExtension<'a> {
    registry: &'a TypeRegistry,
    getter_kinds: Vec<UnitKind>,
    types: Vec<(TypeTag, TypeInfo)>,
}

impl RegistryExtension<'_> {
    /// Declare that units of `kind` can be read back from the driver.
    pub fn register_getter_kind(&mut self, kind: UnitKind) {
        if !self.has_getter_kind(kind) {
            self.getter_kinds.push(kind);
        }
    }

    /// Add the layout of a new type.
    pub fn register_type(&mut self, tag: TypeTag, info: TypeInfo) -> Result<(), Error> {
        if !self.has_getter_kind(info.kind) {
            return Err(Error::UnregisteredUnitKind(info.kind));
        }

        let staged = self.types.iter().any(|(t, _)| *t == tag);
        if staged || self.registry.lookup(tag).is_some() {
            return Err(Error::TypeConflict(tag));
        }

        self.types.push((tag, info));
        Ok(())
    }

    fn has_getter_kind(&self, kind: UnitKind) -> bool {
        self.registry.has_getter_kind(kind) || self.getter_kinds.contains(&kind)
    }
}
