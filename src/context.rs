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

//! The entry point for creating shaders and programs.

use crate::driver::{Driver, DriverInfo, ShaderKind};
use crate::extensions::{self, Extension};
use crate::program::Program;
use crate::registry::TypeRegistry;
use crate::shader::Shader;
use crate::Error;

use std::fmt;
use std::rc::Rc;

/// Shared configuration for every shader and program created from one driver.
///
/// Programs take a snapshot of the type registry and the transpose setting when they are
/// created; later changes only affect programs created afterwards.
pub struct Context<D: Driver> {
    /// The driver.
    driver: Rc<D>,

    /// The known uniform types.
    registry: Rc<TypeRegistry>,

    /// Whether matrices are supplied row-major and must be transposed.
    transpose_matrices: bool,
}

impl<D: Driver> fmt::Debug for Context<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("registry", &self.registry)
            .field("transpose_matrices", &self.transpose_matrices)
            .finish_non_exhaustive()
    }
}

impl<D: Driver> Context<D> {
    /// Create a new context with the core type registry.
    pub fn new(driver: D) -> Self {
        Self::from_rc(Rc::new(driver))
    }

    /// Create a new context around a shared driver.
    pub fn from_rc(driver: Rc<D>) -> Self {
        Self {
            driver,
            registry: Rc::new(TypeRegistry::core()),
            transpose_matrices: true,
        }
    }

    /// Get a reference to the driver.
    pub fn driver(&self) -> &Rc<D> {
        &self.driver
    }

    /// Describe the driver's versions and capabilities.
    pub fn info(&self) -> DriverInfo {
        self.driver.info()
    }

    /// Get the type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Get a mutable reference to the type registry.
    ///
    /// Programs that already exist keep the registry they were created with.
    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        Rc::make_mut(&mut self.registry)
    }

    /// Whether matrices are supplied row-major and transposed on write.
    pub fn transpose_matrices(&self) -> bool {
        self.transpose_matrices
    }

    /// Set whether matrices are supplied row-major and transposed on write.
    pub fn set_transpose_matrices(&mut self, transpose: bool) {
        self.transpose_matrices = transpose;
    }

    /// Load the built-in extension named `name` into the registry.
    pub fn load_extension(&mut self, name: &str) -> Result<(), Error> {
        let extension = extensions::find(name)?;
        self.load_custom_extension(extension)
    }

    /// Load an extension into the registry.
    pub fn load_custom_extension(&mut self, extension: &dyn Extension) -> Result<(), Error> {
        let info = self.driver.info();

        let mut registry = TypeRegistry::clone(&self.registry);
        registry.load_extension(extension, &info)?;
        self.registry = Rc::new(registry);

        Ok(())
    }

    /// Whether the built-in extension named `name` is supported by the driver.
    pub fn check_extension(&self, name: &str) -> Result<bool, Error> {
        let extension = extensions::find(name)?;
        Ok(extension.supported(&self.driver.info()))
    }

    /// Whether the extension named `name` has been loaded.
    pub fn extension_loaded(&self, name: &str) -> bool {
        self.registry.extension_loaded(name)
    }

    /// Allocate a new shader object.
    pub fn create_shader(&self, kind: ShaderKind) -> Result<Shader<D>, Error> {
        Shader::new(self.driver.clone(), kind)
    }

    /// Allocate a new vertex shader.
    pub fn vertex_shader(&self) -> Result<Shader<D>, Error> {
        Shader::vertex(self.driver.clone())
    }

    /// Allocate a new fragment shader.
    pub fn fragment_shader(&self) -> Result<Shader<D>, Error> {
        Shader::fragment(self.driver.clone())
    }

    /// Wrap a shader object that was created elsewhere.
    pub fn wrap_shader(&self, id: u32, owned: bool) -> Shader<D> {
        Shader::wrap(self.driver.clone(), id, owned)
    }

    /// Allocate a new, empty program.
    pub fn create_program(&self) -> Result<Program<D>, Error> {
        Program::new(
            self.driver.clone(),
            self.registry.clone(),
            self.transpose_matrices,
        )
    }

    /// Wrap a program object that was created elsewhere.
    ///
    /// The program's caches start out empty; call [`Program::reload`] to fill them.
    pub fn wrap_program(&self, id: u32, owned: bool) -> Program<D> {
        Program::wrap(
            self.driver.clone(),
            self.registry.clone(),
            self.transpose_matrices,
            id,
            owned,
        )
    }

    /// A non-owning handle to the current program, if there is one.
    pub fn current_program(&self) -> Option<Program<D>> {
        let id = self.driver.current_program()?;
        let program = self.wrap_program(id, false);
        program.reload();
        Some(program)
    }

    /// Clear the current program.
    pub fn clear_program(&self) {
        self.driver.use_program(None);
    }
}
