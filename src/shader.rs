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

//! Shader object handles.

use crate::driver::{Driver, ShaderKind};
use crate::error::ResultExt;
use crate::Error;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// A handle to a shader object.
///
/// The handle deletes the shader object when dropped, as long as it still owns it. Attaching
/// the shader to a [`Program`] moves ownership to the program.
///
/// [`Program`]: crate::Program
pub struct Shader<D: Driver> {
    /// The driver that created the shader.
    driver: Rc<D>,

    /// The driver's id for the shader.
    id: u32,

    /// The stage, if this handle allocated the shader.
    kind: Option<ShaderKind>,

    /// Whether dropping this handle deletes the shader.
    owned: Cell<bool>,
}

impl<D: Driver> fmt::Debug for Shader<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shader")
            .field("id", &self.id)
            .field("owned", &self.owned.get())
            .finish()
    }
}

impl<D: Driver> PartialEq for Shader<D> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<D: Driver> Eq for Shader<D> {}

impl<D: Driver> Shader<D> {
    /// Allocate a new shader object of the given stage.
    pub fn new(driver: Rc<D>, kind: ShaderKind) -> Result<Self, Error> {
        let id = driver.create_shader(kind).driver_err()?;
        tracing::trace!("created {kind:?} shader {id}");

        Ok(Self {
            driver,
            id,
            kind: Some(kind),
            owned: Cell::new(true),
        })
    }

    /// Allocate a new vertex shader.
    pub fn vertex(driver: Rc<D>) -> Result<Self, Error> {
        Self::new(driver, ShaderKind::Vertex)
    }

    /// Allocate a new fragment shader.
    pub fn fragment(driver: Rc<D>) -> Result<Self, Error> {
        Self::new(driver, ShaderKind::Fragment)
    }

    /// Wrap a shader object that was created elsewhere.
    pub fn wrap(driver: Rc<D>, id: u32, owned: bool) -> Self {
        Self {
            driver,
            id,
            kind: None,
            owned: Cell::new(owned),
        }
    }

    /// The driver's id for this shader.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The stage of this shader, if this handle allocated it.
    pub fn kind(&self) -> Option<ShaderKind> {
        self.kind
    }

    /// Whether dropping this handle deletes the shader object.
    pub fn is_owned(&self) -> bool {
        self.owned.get()
    }

    pub(crate) fn set_owned(&self, owned: bool) {
        self.owned.set(owned);
    }

    /// Whether the id still names a live shader object.
    pub fn valid(&self) -> bool {
        self.driver.is_shader(self.id)
    }

    /// Replace the source code of the shader.
    pub fn set_source(&self, source: &str) {
        self.driver.shader_source(self.id, source);
    }

    /// Compile the shader, returning whether compilation succeeded.
    ///
    /// On failure, [`log`](Self::log) holds the compiler's diagnostics.
    pub fn compile(&self) -> bool {
        let ok = self.driver.compile_shader(self.id);
        if !ok {
            tracing::debug!("shader {} failed to compile", self.id);
        }
        ok
    }

    /// Whether the last compilation succeeded.
    pub fn compiled(&self) -> bool {
        self.driver.shader_compile_status(self.id)
    }

    /// The compiler's log for this shader.
    pub fn log(&self) -> String {
        self.driver.shader_log(self.id)
    }

    /// Delete the shader object if this handle owns it and it is still alive.
    ///
    /// Deleting invalidates the id for every other handle wrapping it.
    pub fn destroy(&self) {
        if self.owned.get() && self.valid() {
            tracing::trace!("deleting shader {}", self.id);
            self.driver.delete_shader(self.id);
            self.owned.set(false);
        }
    }
}

impl<D: Driver> Drop for Shader<D> {
    fn drop(&mut self) {
        self.destroy();
    }
}
