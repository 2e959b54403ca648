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

//! The error type for this crate.

use crate::types::{TypeTag, UnitKind};

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// An error that can occur while building or driving a shader program.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// One or more shader stages failed to compile, or the program failed to link.
    Compilation {
        /// Every failing stage's log, or the program's log if linking failed.
        log: String,
    },

    /// More units were supplied than the uniform can hold.
    ShapeMismatch {
        /// The number of units the uniform holds.
        expected: usize,

        /// The number of units that were supplied.
        found: usize,
    },

    /// A value's unit kind does not match the uniform's unit kind.
    KindMismatch {
        expected: UnitKind,
        found: UnitKind,
    },

    /// A value is nested more deeply than the uniform's shape allows.
    UnexpectedNesting,

    /// No uniform or attribute with this name exists in the current cache.
    NotFound(String),

    /// The program behind a uniform or attribute cache has been destroyed.
    ProgramReleased,

    /// No extension with this name exists.
    ExtensionUnavailable(String),

    /// The extension exists, but the driver does not meet its requirements.
    ExtensionUnsupported(String),

    /// The extension has already been loaded.
    ExtensionAlreadyLoaded(String),

    /// An extension tried to replace a type that is already registered.
    TypeConflict(TypeTag),

    /// A type was registered with a unit kind that cannot be read back.
    UnregisteredUnitKind(UnitKind),

    /// The driver failed to create an object.
    Driver(Box<dyn StdError + 'static>),

    /// Shader sources could not be read.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Compilation { log } => write!(f, "shader errors:\n\n{log}"),
            Error::ShapeMismatch { expected, found } => write!(
                f,
                "uniform holds {expected} units but {found} were supplied"
            ),
            Error::KindMismatch { expected, found } => {
                write!(f, "expected {expected} units, found {found}")
            }
            Error::UnexpectedNesting => f.write_str("value is nested too deeply for its uniform"),
            Error::NotFound(name) => write!(f, "no uniform or attribute named \"{name}\" found"),
            Error::ProgramReleased => f.write_str("shader program was released"),
            Error::ExtensionUnavailable(name) => write!(f, "no extension named \"{name}\" found"),
            Error::ExtensionUnsupported(name) => {
                write!(f, "extension \"{name}\" is not supported")
            }
            Error::ExtensionAlreadyLoaded(name) => {
                write!(f, "extension \"{name}\" is already loaded")
            }
            Error::TypeConflict(tag) => write!(f, "type {tag} is already registered"),
            Error::UnregisteredUnitKind(kind) => {
                write!(f, "no getter is registered for {kind} units")
            }
            Error::Driver(err) => write!(f, "driver error: {err}"),
            Error::Io(err) => write!(f, "failed to read shader source: {err}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Driver(err) => Some(&**err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

pub(crate) trait ResultExt<T, E> {
    fn driver_err(self) -> Result<T, Error>;
}

impl<T, E: StdError + 'static> ResultExt<T, E> for Result<T, E> {
    fn driver_err(self) -> Result<T, Error> {
        self.map_err(|e| Error::Driver(Box::new(e)))
    }
}
