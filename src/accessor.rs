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

//! Reading and writing uniform values through the driver.

use crate::driver::{Driver, Location, UniformWrite};
use crate::registry::{MatrixShape, TypeInfo};
use crate::types::{Scalar, TypeTag, Units, Value};
use crate::Error;

/// How the value of a uniform is read and written.
///
/// The variant is chosen once, when the uniform is reflected, from its registry row and its
/// declared array size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    /// The uniform's type is not registered. Reads yield nothing and writes do nothing.
    Inert,

    /// A scalar or vector.
    Single { info: TypeInfo },

    /// A matrix.
    Matrix { info: TypeInfo, shape: MatrixShape },

    /// An array of scalars or vectors.
    Array { info: TypeInfo, count: usize },

    /// An array of matrices.
    MatrixArray {
        info: TypeInfo,
        shape: MatrixShape,
        count: usize,
    },
}

impl Accessor {
    /// Select the accessor for a uniform with the given registry row and array size.
    pub fn new(info: Option<&TypeInfo>, count: usize, is_array: bool) -> Self {
        let info = match info {
            Some(info) => *info,
            None => return Accessor::Inert,
        };

        match (info.matrix, is_array) {
            (None, false) => Accessor::Single { info },
            (Some(shape), false) => Accessor::Matrix { info, shape },
            (None, true) => Accessor::Array { info, count },
            (Some(shape), true) => Accessor::MatrixArray { info, shape, count },
        }
    }

    /// Whether this accessor ignores reads and writes.
    pub fn is_inert(&self) -> bool {
        matches!(self, Accessor::Inert)
    }

    fn info(&self) -> Option<&TypeInfo> {
        match self {
            Accessor::Inert => None,
            Accessor::Single { info }
            | Accessor::Matrix { info, .. }
            | Accessor::Array { info, .. }
            | Accessor::MatrixArray { info, .. } => Some(info),
        }
    }

    /// The number of values written per call, and how deeply the input may nest.
    fn layout(&self) -> (usize, usize) {
        match self {
            Accessor::Inert => (0, 0),
            Accessor::Single { .. } => (1, 0),
            Accessor::Matrix { .. } => (1, 1),
            Accessor::Array { info, count } => (*count, usize::from(info.needs_unpack())),
            Accessor::MatrixArray { count, .. } => (*count, 2),
        }
    }

    /// Read the current value of the uniform at `location` in `program`.
    pub fn get<D: Driver + ?Sized>(
        &self,
        driver: &D,
        program: u32,
        location: Location,
    ) -> Option<Value> {
        let info = match self.info() {
            Some(info) => info,
            None => {
                tracing::warn!("uniform at {location:?} has an unknown type and cannot be read");
                return None;
            }
        };

        let read = |location: Location| {
            let mut units = Units::zeroed(info.kind, info.components);
            driver.read_uniform(program, location, &mut units);
            units.to_scalars()
        };

        Some(match self {
            Accessor::Inert => return None,
            Accessor::Single { .. } => as_single(read(location)),
            Accessor::Matrix { shape, .. } => as_matrix(read(location), *shape),
            Accessor::Array { count, .. } => Value::List(
                (0..*count)
                    .map(|i| as_single(read(location.offset(i))))
                    .collect(),
            ),
            Accessor::MatrixArray { shape, count, .. } => Value::List(
                (0..*count)
                    .map(|i| as_matrix(read(location.offset(i)), *shape))
                    .collect(),
            ),
        })
    }

    /// Write `value` into the uniform at `location` of the current program.
    pub fn set<D: Driver + ?Sized>(
        &self,
        driver: &D,
        location: Location,
        tag: TypeTag,
        transpose: bool,
        value: &Value,
    ) -> Result<(), Error> {
        let info = match self.info() {
            Some(info) => info,
            None => {
                tracing::warn!("uniform of type {tag} at {location:?} is not registered, ignoring write");
                return Ok(());
            }
        };

        let (count, depth) = self.layout();

        // Pack every element before the first write, so that a kind mismatch writes nothing.
        let elements = match element_wise(self, value) {
            Some(items) => {
                let groups = items
                    .iter()
                    .map(|item| -> Result<Vec<Scalar>, Error> {
                        let mut scalars = Vec::new();
                        flatten(item, depth - 1, &mut scalars)?;
                        check_excess(info.components, scalars.len())?;
                        Ok(scalars)
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                if groups.len() > count {
                    return Err(Error::ShapeMismatch {
                        expected: info.components * count,
                        found: groups.iter().map(Vec::len).sum(),
                    });
                }

                (0..count)
                    .map(|i| {
                        let scalars = groups.get(i).map_or(&[][..], Vec::as_slice);
                        Units::pack(info.kind, scalars, info.components)
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut scalars = Vec::new();
                flatten(value, depth, &mut scalars)?;
                check_excess(info.components * count, scalars.len())?;

                (0..count)
                    .map(|i| {
                        let start = (i * info.components).min(scalars.len());
                        let end = ((i + 1) * info.components).min(scalars.len());
                        Units::pack(info.kind, &scalars[start..end], info.components)
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let expected = info.components * count;
        tracing::trace!(
            "writing {} {} units into {tag} at {location:?}",
            expected,
            info.kind
        );

        let transpose = transpose && info.matrix.is_some();
        for (i, units) in elements.iter().enumerate() {
            driver.write_uniform(UniformWrite {
                location: location.offset(i),
                tag,
                info,
                transpose,
                units,
            });
        }

        Ok(())
    }
}

/// The per-element items of an array write, if the caller grouped units by element.
///
/// A list holding a single run of units is the flat form and is chunked by the declaration.
fn element_wise<'a>(accessor: &Accessor, value: &'a Value) -> Option<&'a [Value]> {
    let nested = match accessor {
        Accessor::Array { info, .. } => info.needs_unpack(),
        Accessor::MatrixArray { .. } => true,
        _ => false,
    };

    match value {
        Value::List(items) if nested && items.len() > 1 => items
            .iter()
            .any(|item| matches!(item, Value::List(_)))
            .then_some(items.as_slice()),
        _ => None,
    }
}

fn check_excess(expected: usize, found: usize) -> Result<(), Error> {
    if found > expected {
        return Err(Error::ShapeMismatch { expected, found });
    }

    Ok(())
}

/// Flatten `value` into `out`, descending at most `depth` list levels below the outermost.
///
/// A bare scalar stands in for a one element list at any level.
fn flatten(value: &Value, depth: usize, out: &mut Vec<Scalar>) -> Result<(), Error> {
    let items = match value {
        Value::Scalar(s) => {
            out.push(*s);
            return Ok(());
        }
        Value::List(items) => items,
    };

    for item in items {
        match item {
            Value::Scalar(s) => out.push(*s),
            Value::List(_) if depth > 0 => flatten(item, depth - 1, out)?,
            Value::List(_) => return Err(Error::UnexpectedNesting),
        }
    }

    Ok(())
}

fn as_single(scalars: Vec<Scalar>) -> Value {
    match scalars.as_slice() {
        [scalar] => Value::Scalar(*scalar),
        _ => Value::List(scalars.into_iter().map(Value::Scalar).collect()),
    }
}

/// Reshape a matrix as stored by the driver into the rows presented to callers.
fn as_matrix(scalars: Vec<Scalar>, shape: MatrixShape) -> Value {
    let MatrixShape { rows, cols } = shape;
    let mut out = vec![Vec::with_capacity(cols); rows];

    if rows == cols {
        for (i, scalar) in scalars.into_iter().enumerate() {
            out[i % rows].push(Value::Scalar(scalar));
        }
    } else {
        let mut chunks = vec![Vec::with_capacity(rows); cols];
        for (i, scalar) in scalars.into_iter().enumerate() {
            chunks[i % cols].push(scalar);
        }

        for (j, scalar) in chunks.into_iter().flatten().enumerate() {
            out[j / cols].push(Value::Scalar(scalar));
        }
    }

    Value::List(out.into_iter().map(Value::List).collect())
}
