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

//! Shader program handles.

use crate::driver::Driver;
use crate::error::ResultExt;
use crate::reflection::{Attribute, Attributes, Cache, Uniform, Uniforms};
use crate::registry::TypeRegistry;
use crate::shader::Shader;
use crate::Error;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache generations are unique across every program, so entries never match another
/// program's cache.
static GENERATION: AtomicU64 = AtomicU64::new(1);

/// The state shared between a [`Program`] and its uniform and attribute views.
pub(crate) struct ProgramInner<D: Driver> {
    /// The driver that created the program.
    pub(crate) driver: Rc<D>,

    /// The driver's id for the program.
    pub(crate) id: u32,

    /// Whether dropping the program deletes it.
    owned: Cell<bool>,

    /// The registry the program's accessors are built from.
    pub(crate) registry: Rc<TypeRegistry>,

    /// Whether matrices are supplied row-major.
    pub(crate) transpose: bool,

    /// The active uniforms, as of the last successful link or reload.
    pub(crate) uniforms: Cache<Uniform>,

    /// The active attributes, as of the last successful link or reload.
    pub(crate) attributes: Cache<Attribute>,

    /// The ids of the shaders attached through this handle.
    attached: RefCell<Vec<u32>>,
}

impl<D: Driver> ProgramInner<D> {
    /// Get a generation number that no cache entry has been built with yet.
    pub(crate) fn next_generation(&self) -> u64 {
        GENERATION.fetch_add(1, Ordering::Relaxed)
    }
}

/// A handle to a shader program.
///
/// A program owns the shaders attached to it. When an owning program is dropped, it detaches
/// and deletes every attached shader and then deletes itself.
pub struct Program<D: Driver> {
    inner: Rc<ProgramInner<D>>,
}

impl<D: Driver> fmt::Debug for Program<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("id", &self.inner.id)
            .field("owned", &self.inner.owned.get())
            .finish()
    }
}

impl<D: Driver> PartialEq for Program<D> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<D: Driver> Eq for Program<D> {}

impl<D: Driver> Program<D> {
    /// Allocate a new, empty program.
    pub(crate) fn new(
        driver: Rc<D>,
        registry: Rc<TypeRegistry>,
        transpose: bool,
    ) -> Result<Self, Error> {
        let id = driver.create_program().driver_err()?;
        tracing::trace!("created program {id}");

        Ok(Self::wrap(driver, registry, transpose, id, true))
    }

    /// Wrap a program that was created elsewhere.
    ///
    /// The caches start out empty; call [`reload`](Self::reload) to fill them.
    pub(crate) fn wrap(
        driver: Rc<D>,
        registry: Rc<TypeRegistry>,
        transpose: bool,
        id: u32,
        owned: bool,
    ) -> Self {
        Self {
            inner: Rc::new(ProgramInner {
                driver,
                id,
                owned: Cell::new(owned),
                registry,
                transpose,
                uniforms: Cache::new(),
                attributes: Cache::new(),
                attached: RefCell::new(Vec::new()),
            }),
        }
    }

    /// The driver's id for this program.
    pub fn id(&self) -> u32 {
        self.inner.id
    }

    /// Whether dropping this handle deletes the program.
    pub fn is_owned(&self) -> bool {
        self.inner.owned.get()
    }

    /// Whether matrices written through this program are supplied row-major.
    pub fn transpose_matrices(&self) -> bool {
        self.inner.transpose
    }

    /// The registry this program's accessors are built from.
    pub fn registry(&self) -> &TypeRegistry {
        &self.inner.registry
    }

    /// Whether the id still names a live program object.
    pub fn valid(&self) -> bool {
        self.inner.driver.is_program(self.inner.id)
    }

    /// Attach shaders to this program, moving their ownership to it.
    ///
    /// The caches are not rebuilt until the program is linked.
    pub fn attach(&self, shaders: &[&Shader<D>]) {
        let mut attached = self.inner.attached.borrow_mut();

        for shader in shaders {
            self.inner.driver.attach_shader(self.inner.id, shader.id());
            if !attached.contains(&shader.id()) {
                attached.push(shader.id());
            }

            shader.set_owned(false);
        }
    }

    /// Detach shaders from this program.
    ///
    /// If `delete` is true, the shader handles take ownership back and delete the shaders
    /// when they are dropped.
    pub fn detach(&self, shaders: &[&Shader<D>], delete: bool) {
        let mut attached = self.inner.attached.borrow_mut();

        for shader in shaders {
            self.inner.driver.detach_shader(self.inner.id, shader.id());
            attached.retain(|&id| id != shader.id());
            shader.set_owned(delete);
        }
    }

    /// Non-owning handles to the shaders attached through this program.
    pub fn attached_shaders(&self) -> Vec<Shader<D>> {
        self.inner
            .attached
            .borrow()
            .iter()
            .map(|&id| Shader::wrap(self.inner.driver.clone(), id, false))
            .collect()
    }

    /// Link the program, returning whether linking succeeded.
    ///
    /// On success, the uniform and attribute caches are rebuilt. On failure they keep their
    /// previous contents and [`log`](Self::log) holds the linker's diagnostics.
    pub fn link(&self) -> bool {
        let ok = self.inner.driver.link_program(self.inner.id);
        tracing::debug!("linked program {}: {}", self.inner.id, ok);

        if ok {
            self.rebuild();
        }

        ok
    }

    /// Whether the last link succeeded.
    pub fn link_status(&self) -> bool {
        self.inner.driver.program_link_status(self.inner.id)
    }

    /// The linker's log for this program.
    pub fn log(&self) -> String {
        self.inner.driver.program_log(self.inner.id)
    }

    /// Rebuild the uniform and attribute caches from the driver.
    pub fn reload(&self) {
        self.rebuild();
    }

    fn rebuild(&self) {
        self.inner.uniforms.rebuild(&*self.inner);
        self.inner.attributes.rebuild(&*self.inner);
    }

    /// Make this program the current one.
    pub fn use_program(&self) {
        self.inner.driver.use_program(Some(self.inner.id));
    }

    /// Clear the current program.
    pub fn clear(&self) {
        self.inner.driver.use_program(None);
    }

    /// Whether this program is the current one.
    pub fn is_current(&self) -> bool {
        self.inner.driver.current_program() == Some(self.inner.id)
    }

    /// A view of the program's active uniforms.
    pub fn uniforms(&self) -> Uniforms<D> {
        Uniforms::new(Rc::downgrade(&self.inner))
    }

    /// A view of the program's active vertex attributes.
    pub fn attributes(&self) -> Attributes<D> {
        Attributes::new(Rc::downgrade(&self.inner))
    }

    /// Enable the arrays of every active attribute.
    pub fn enable_all_attributes(&self) {
        for attr in self.inner.attributes.entries() {
            self.inner.driver.enable_attribute(attr.location());
        }
    }

    /// Disable the arrays of every active attribute.
    pub fn disable_all_attributes(&self) {
        for attr in self.inner.attributes.entries() {
            self.inner.driver.disable_attribute(attr.location());
        }
    }

    /// Destroy the program.
    ///
    /// If this handle owns the program, every attached shader is detached and deleted and
    /// then the program itself is deleted. Views of the program report
    /// [`Error::ProgramReleased`] afterwards.
    pub fn destroy(self) {
        drop(self);
    }
}

impl<D: Driver> Drop for Program<D> {
    fn drop(&mut self) {
        let inner = &self.inner;
        if !inner.owned.get() || !self.valid() {
            return;
        }

        for &shader in inner.attached.borrow().iter() {
            inner.driver.detach_shader(inner.id, shader);
            if inner.driver.is_shader(shader) {
                inner.driver.delete_shader(shader);
            }
        }

        tracing::trace!("deleting program {}", inner.id);
        inner.driver.delete_program(inner.id);
    }
}
