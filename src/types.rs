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

//! Type tags, scalar values and the flat unit buffers exchanged with the driver.

use crate::Error;

use std::fmt;

/// The driver's encoding of a variable's element type.
///
/// The values are the OpenGL enumerants reported by `glGetActiveUniform` and
/// `glGetActiveAttrib`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(pub u32);

macro_rules! type_tags {
    ($($name:ident = $value:literal),* $(,)?) => {
        impl TypeTag {
            $(
                #[doc = concat!("`GL_", stringify!($name), "`")]
                pub const $name: TypeTag = TypeTag($value);
            )*

            /// The OpenGL name of this tag, if it is a known one.
            pub fn name(self) -> Option<&'static str> {
                match self {
                    $(TypeTag::$name => Some(concat!("GL_", stringify!($name))),)*
                    _ => None,
                }
            }
        }
    };
}

type_tags! {
    INT = 0x1404,
    UNSIGNED_INT = 0x1405,
    FLOAT = 0x1406,
    DOUBLE = 0x140A,
    FLOAT_VEC2 = 0x8B50,
    FLOAT_VEC3 = 0x8B51,
    FLOAT_VEC4 = 0x8B52,
    INT_VEC2 = 0x8B53,
    INT_VEC3 = 0x8B54,
    INT_VEC4 = 0x8B55,
    BOOL = 0x8B56,
    FLOAT_MAT2 = 0x8B5A,
    FLOAT_MAT3 = 0x8B5B,
    FLOAT_MAT4 = 0x8B5C,
    SAMPLER_2D = 0x8B5E,
    FLOAT_MAT2X3 = 0x8B65,
    FLOAT_MAT2X4 = 0x8B66,
    FLOAT_MAT3X2 = 0x8B67,
    FLOAT_MAT3X4 = 0x8B68,
    FLOAT_MAT4X2 = 0x8B69,
    FLOAT_MAT4X3 = 0x8B6A,
    UNSIGNED_INT_VEC2 = 0x8DC6,
    UNSIGNED_INT_VEC3 = 0x8DC7,
    UNSIGNED_INT_VEC4 = 0x8DC8,
    DOUBLE_MAT2 = 0x8F46,
    DOUBLE_MAT3 = 0x8F47,
    DOUBLE_MAT4 = 0x8F48,
    DOUBLE_MAT2X3 = 0x8F49,
    DOUBLE_MAT2X4 = 0x8F4A,
    DOUBLE_MAT3X2 = 0x8F4B,
    DOUBLE_MAT3X4 = 0x8F4C,
    DOUBLE_MAT4X2 = 0x8F4D,
    DOUBLE_MAT4X3 = 0x8F4E,
    DOUBLE_VEC2 = 0x8FFC,
    DOUBLE_VEC3 = 0x8FFD,
    DOUBLE_VEC4 = 0x8FFE,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#06X}", self.0),
        }
    }
}

/// The binary unit a value is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// 32-bit floating point.
    Float,

    /// 32-bit signed integer.
    Int,

    /// 32-bit unsigned integer.
    UInt,

    /// 64-bit floating point.
    Double,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnitKind::Float => "float",
            UnitKind::Int => "int",
            UnitKind::UInt => "uint",
            UnitKind::Double => "double",
        })
    }
}

/// A single unit of a uniform value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Float(f32),
    Int(i32),
    UInt(u32),
    Double(f64),
}

impl Scalar {
    /// The kind of unit this scalar holds.
    pub fn kind(self) -> UnitKind {
        match self {
            Scalar::Float(_) => UnitKind::Float,
            Scalar::Int(_) => UnitKind::Int,
            Scalar::UInt(_) => UnitKind::UInt,
            Scalar::Double(_) => UnitKind::Double,
        }
    }

    /// Widen this scalar into an `f64`, whatever its kind.
    pub fn to_f64(self) -> f64 {
        match self {
            Scalar::Float(v) => v as f64,
            Scalar::Int(v) => v as f64,
            Scalar::UInt(v) => v as f64,
            Scalar::Double(v) => v,
        }
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident),*) => {
        $(
            impl From<$ty> for Scalar {
                fn from(v: $ty) -> Self {
                    Scalar::$variant(v)
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Scalar(Scalar::$variant(v))
                }
            }
        )*
    };
}

scalar_from!(f32 => Float, i32 => Int, u32 => UInt, f64 => Double);

/// A uniform value as seen by the caller.
///
/// Vectors are lists of scalars, matrices are lists of rows and arrays are lists of
/// elements. A bare scalar is accepted wherever a one element list is.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    List(Vec<Value>),
}

impl Value {
    /// An empty list, which zeroes whatever uniform it is written to.
    pub fn empty() -> Self {
        Value::List(Vec::new())
    }

    /// Get the scalar, if this is one.
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Value::Scalar(s) => Some(*s),
            Value::List(_) => None,
        }
    }

    /// Get the list elements, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::Scalar(_) => None,
            Value::List(list) => Some(list),
        }
    }

    /// Every scalar in this value, depth first.
    pub fn scalars(&self) -> Vec<Scalar> {
        let mut out = Vec::new();
        self.collect_scalars(&mut out);
        out
    }

    fn collect_scalars(&self, out: &mut Vec<Scalar>) {
        match self {
            Value::Scalar(s) => out.push(*s),
            Value::List(list) => list.iter().for_each(|v| v.collect_scalars(out)),
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(items: [T; N]) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// A flat, typed buffer of units, in the layout the driver reads and writes.
#[derive(Debug, Clone, PartialEq)]
pub enum Units {
    Float(Vec<f32>),
    Int(Vec<i32>),
    UInt(Vec<u32>),
    Double(Vec<f64>),
}

macro_rules! pack_units {
    ($variant:ident, $kind:expr, $scalars:expr, $len:expr) => {{
        let mut buf = Vec::with_capacity($len);
        for scalar in $scalars {
            match scalar {
                Scalar::$variant(v) => buf.push(*v),
                other => {
                    return Err(Error::KindMismatch {
                        expected: $kind,
                        found: other.kind(),
                    })
                }
            }
        }

        // Omitted units are zero.
        buf.resize($len, Default::default());
        Units::$variant(buf)
    }};
}

impl Units {
    /// A buffer of `len` zero units.
    pub fn zeroed(kind: UnitKind, len: usize) -> Self {
        match kind {
            UnitKind::Float => Units::Float(vec![0.0; len]),
            UnitKind::Int => Units::Int(vec![0; len]),
            UnitKind::UInt => Units::UInt(vec![0; len]),
            UnitKind::Double => Units::Double(vec![0.0; len]),
        }
    }

    /// Pack `scalars` into a buffer of exactly `len` units of `kind`.
    ///
    /// The caller has already rejected inputs longer than `len`.
    pub(crate) fn pack(kind: UnitKind, scalars: &[Scalar], len: usize) -> Result<Self, Error> {
        debug_assert!(scalars.len() <= len);

        Ok(match kind {
            UnitKind::Float => pack_units!(Float, kind, scalars, len),
            UnitKind::Int => pack_units!(Int, kind, scalars, len),
            UnitKind::UInt => pack_units!(UInt, kind, scalars, len),
            UnitKind::Double => pack_units!(Double, kind, scalars, len),
        })
    }

    /// The kind of units in this buffer.
    pub fn kind(&self) -> UnitKind {
        match self {
            Units::Float(_) => UnitKind::Float,
            Units::Int(_) => UnitKind::Int,
            Units::UInt(_) => UnitKind::UInt,
            Units::Double(_) => UnitKind::Double,
        }
    }

    /// The number of units in this buffer.
    pub fn len(&self) -> usize {
        match self {
            Units::Float(v) => v.len(),
            Units::Int(v) => v.len(),
            Units::UInt(v) => v.len(),
            Units::Double(v) => v.len(),
        }
    }

    /// Whether this buffer has no units.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the unit at `index`.
    pub fn get(&self, index: usize) -> Option<Scalar> {
        match self {
            Units::Float(v) => v.get(index).copied().map(Scalar::Float),
            Units::Int(v) => v.get(index).copied().map(Scalar::Int),
            Units::UInt(v) => v.get(index).copied().map(Scalar::UInt),
            Units::Double(v) => v.get(index).copied().map(Scalar::Double),
        }
    }

    /// Unpack this buffer into scalars.
    pub fn to_scalars(&self) -> Vec<Scalar> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }
}
