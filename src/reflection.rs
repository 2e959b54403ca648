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

//! Caches of a program's active uniforms and attributes.

use crate::accessor::Accessor;
use crate::driver::{AttributeLayout, Driver, Location, VariableKind};
use crate::program::ProgramInner;
use crate::registry::TypeRegistry;
use crate::types::{TypeTag, Value};
use crate::Error;

use ahash::RandomState;
use hashbrown::HashMap;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// An active uniform of a linked program.
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    location: Location,
    tag: TypeTag,
    size: usize,
    name: String,
    is_array: bool,
    accessor: Accessor,
    generation: u64,
}

impl Uniform {
    /// The uniform's location.
    pub fn location(&self) -> Location {
        self.location
    }

    /// The uniform's element type.
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// The number of array elements, or 1.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The uniform's name, without any array suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the uniform was declared as an array.
    pub fn is_array(&self) -> bool {
        self.is_array
    }

    /// How the uniform's value is read and written.
    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }
}

/// An active vertex attribute of a linked program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    location: u32,
    tag: TypeTag,
    size: usize,
    name: String,
    generation: u64,
}

impl Attribute {
    /// The attribute's location.
    pub fn location(&self) -> u32 {
        self.location
    }

    /// The attribute's type.
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// The number of array elements, or 1.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The attribute's name, without any array suffix.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A variable as reported by the driver, before it becomes a cache entry.
pub(crate) struct Reflected {
    name: String,
    is_array: bool,
    tag: TypeTag,
    size: usize,
    location: Location,
    generation: u64,
}

pub(crate) trait Entry: Sized {
    const KIND: VariableKind;

    fn build(reflected: Reflected, registry: &TypeRegistry) -> Self;
    fn name(&self) -> &str;
    fn generation(&self) -> u64;
}

impl Entry for Uniform {
    const KIND: VariableKind = VariableKind::Uniform;

    fn build(r: Reflected, registry: &TypeRegistry) -> Self {
        let accessor = Accessor::new(registry.lookup(r.tag), r.size, r.is_array);
        if accessor.is_inert() {
            tracing::warn!("uniform {} has unsupported type {}", r.name, r.tag);
        }

        Self {
            location: r.location,
            tag: r.tag,
            size: r.size,
            name: r.name,
            is_array: r.is_array,
            accessor,
            generation: r.generation,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}

impl Entry for Attribute {
    const KIND: VariableKind = VariableKind::Attribute;

    fn build(r: Reflected, _: &TypeRegistry) -> Self {
        Self {
            location: r.location.0 as u32,
            tag: r.tag,
            size: r.size,
            name: r.name,
            generation: r.generation,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}

/// Split a driver reported name into the logical name and whether it names an array.
///
/// Drivers report arrays either with or without a `[0]` suffix, so a variable is an array
/// if it has the suffix or more than one element.
fn logical_name(raw: &str, size: usize) -> (String, bool) {
    match raw.strip_suffix("[0]") {
        Some(name) => (name.to_string(), true),
        None => (raw.to_string(), size > 1),
    }
}

/// A table of entries, replaced wholesale on every rebuild.
pub(crate) struct Cache<T> {
    entries: RefCell<HashMap<String, Rc<T>, RandomState>>,
}

impl<T: Entry> Cache<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::with_hasher(RandomState::new())),
        }
    }

    /// Query the driver for every active variable and replace the table.
    pub(crate) fn rebuild<D: Driver>(&self, program: &ProgramInner<D>) {
        let driver = &program.driver;
        let generation = program.next_generation();
        let count = driver.active_count(program.id, T::KIND);

        let mut entries = HashMap::with_capacity_and_hasher(count as usize, RandomState::new());

        for index in 0..count {
            let var = match driver.active_variable(program.id, T::KIND, index) {
                Some(var) => var,
                None => continue,
            };

            // Built-in inputs and block members have no location.
            let location = match driver.location(program.id, T::KIND, &var.name) {
                Some(location) => location,
                None => {
                    tracing::trace!("skipping {} without a location", var.name);
                    continue;
                }
            };

            let (name, is_array) = logical_name(&var.name, var.size);
            let entry = T::build(
                Reflected {
                    name,
                    is_array,
                    tag: var.tag,
                    size: var.size,
                    location,
                    generation,
                },
                &program.registry,
            );

            entries.insert(entry.name().to_string(), Rc::new(entry));
        }

        tracing::debug!(
            "reflected {} {:?} entries of program {}",
            entries.len(),
            T::KIND,
            program.id
        );

        *self.entries.borrow_mut() = entries;
    }

    pub(crate) fn get(&self, name: &str) -> Option<Rc<T>> {
        self.entries.borrow().get(name).cloned()
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.borrow().contains_key(name)
    }

    fn contains_entry(&self, entry: &T) -> bool {
        self.entries
            .borrow()
            .get(entry.name())
            .map_or(false, |current| current.generation() == entry.generation())
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    fn names(&self) -> Vec<String> {
        let mut names = self.entries.borrow().keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }

    /// Every entry, sorted by name.
    pub(crate) fn entries(&self) -> Vec<Rc<T>> {
        let mut entries = self.entries.borrow().values().cloned().collect::<Vec<_>>();
        entries.sort_by(|a, b| a.name().cmp(b.name()));
        entries
    }
}

macro_rules! cache_view {
    ($view:ident, $entry:ty, $field:ident, $what:literal) => {
        impl<D: Driver> $view<D> {
            pub(crate) fn new(program: Weak<ProgramInner<D>>) -> Self {
                Self { program }
            }

            fn upgrade(&self) -> Result<Rc<ProgramInner<D>>, Error> {
                self.program.upgrade().ok_or(Error::ProgramReleased)
            }

            #[doc = concat!("Rebuild the ", $what, " cache from the driver.")]
            pub fn reload(&self) -> Result<(), Error> {
                let program = self.upgrade()?;
                program.$field.rebuild(&*program);
                Ok(())
            }

            #[doc = concat!("Get the ", $what, " named `name`.")]
            pub fn entry(&self, name: &str) -> Result<Rc<$entry>, Error> {
                self.upgrade()?
                    .$field
                    .get(name)
                    .ok_or_else(|| Error::NotFound(name.to_string()))
            }

            #[doc = concat!("Whether a ", $what, " named `name` exists.")]
            pub fn contains(&self, name: &str) -> Result<bool, Error> {
                Ok(self.upgrade()?.$field.contains(name))
            }

            /// Whether `entry` belongs to the current cache.
            ///
            /// Entries from before the last rebuild never match.
            pub fn contains_entry(&self, entry: &$entry) -> Result<bool, Error> {
                Ok(self.upgrade()?.$field.contains_entry(entry))
            }

            #[doc = concat!("The number of active ", $what, "s.")]
            pub fn len(&self) -> Result<usize, Error> {
                Ok(self.upgrade()?.$field.len())
            }

            #[doc = concat!("Whether the program has no active ", $what, "s.")]
            pub fn is_empty(&self) -> Result<bool, Error> {
                Ok(self.len()? == 0)
            }

            #[doc = concat!("The names of the active ", $what, "s, sorted.")]
            pub fn names(&self) -> Result<Vec<String>, Error> {
                Ok(self.upgrade()?.$field.names())
            }

            #[doc = concat!("Every active ", $what, ", sorted by name.")]
            pub fn entries(&self) -> Result<Vec<Rc<$entry>>, Error> {
                Ok(self.upgrade()?.$field.entries())
            }
        }

        impl<D: Driver> Clone for $view<D> {
            fn clone(&self) -> Self {
                Self {
                    program: self.program.clone(),
                }
            }
        }

        impl<D: Driver> fmt::Debug for $view<D> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.names() {
                    Ok(names) => f.debug_tuple(stringify!($view)).field(&names).finish(),
                    Err(_) => f.write_str(concat!(stringify!($view), "(<released>)")),
                }
            }
        }
    };
}

/// A view of the active uniforms of a [`Program`].
///
/// The view does not keep the program alive. Once the program is dropped, every operation
/// fails with [`Error::ProgramReleased`].
///
/// [`Program`]: crate::Program
pub struct Uniforms<D: Driver> {
    program: Weak<ProgramInner<D>>,
}

cache_view!(Uniforms, Uniform, uniforms, "uniform");

impl<D: Driver> Uniforms<D> {
    /// Read the current value of the uniform named `name`.
    ///
    /// Returns `None` if the uniform's type is not registered.
    pub fn get(&self, name: &str) -> Result<Option<Value>, Error> {
        let program = self.upgrade()?;
        let entry = program
            .uniforms
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        Ok(entry
            .accessor
            .get(&*program.driver, program.id, entry.location))
    }

    /// Write `value` into the uniform named `name`.
    ///
    /// The program must be the current one. Omitted units are written as zero.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), Error> {
        let program = self.upgrade()?;
        let entry = program
            .uniforms
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        entry.accessor.set(
            &*program.driver,
            entry.location,
            entry.tag,
            program.transpose,
            &value.into(),
        )
    }
}

/// A view of the active vertex attributes of a [`Program`].
///
/// The view does not keep the program alive. Once the program is dropped, every operation
/// fails with [`Error::ProgramReleased`].
///
/// [`Program`]: crate::Program
pub struct Attributes<D: Driver> {
    program: Weak<ProgramInner<D>>,
}

cache_view!(Attributes, Attribute, attributes, "attribute");

impl<D: Driver> Attributes<D> {
    /// Enable the array of the attribute named `name`.
    pub fn enable(&self, name: &str) -> Result<(), Error> {
        let program = self.upgrade()?;
        let location = self.entry(name)?.location;
        program.driver.enable_attribute(location);
        Ok(())
    }

    /// Disable the array of the attribute named `name`.
    pub fn disable(&self, name: &str) -> Result<(), Error> {
        let program = self.upgrade()?;
        let location = self.entry(name)?.location;
        program.driver.disable_attribute(location);
        Ok(())
    }

    /// Point the attribute named `name` at data in the bound buffer.
    pub fn point_to(&self, name: &str, layout: AttributeLayout) -> Result<(), Error> {
        let program = self.upgrade()?;
        let location = self.entry(name)?.location;
        program.driver.attribute_pointer(location, &layout);
        Ok(())
    }
}
