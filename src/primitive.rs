//! Sealed traits describing the closed set of storable primitive types.

use std::fmt::Debug;

mod sealed {
    pub trait Sealed {}
}

/// A machine-word-sized primitive type storable in the containers.
///
/// The trait is sealed: the containers are designed for a closed set of
/// primitive types, not for generic object storage. It is implemented for
/// the built-in integer types, `f32`, `f64`, `bool`, and `char`.
pub trait Primitive: Copy + PartialEq + Debug + Send + Sync + 'static + sealed::Sealed {}

/// A [`Primitive`] usable as a hash map key.
///
/// Key types additionally need total equality, which rules out the floating
/// point types.
pub trait PrimitiveKey: Primitive + Eq {
    /// Returns the raw 64-bit image of the key.
    ///
    /// Signed values are sign-extended so that distinct keys keep distinct
    /// images. The image feeds the bucket-distribution function of the map.
    fn to_bits(self) -> u64;
}

macro_rules! impl_primitive {
    ($($ty:ty),*) => {
        $(
            impl sealed::Sealed for $ty {}
            impl Primitive for $ty {}
        )*
    };
}

macro_rules! impl_primitive_key {
    ($($ty:ty),*) => {
        $(
            impl PrimitiveKey for $ty {
                #[inline]
                fn to_bits(self) -> u64 {
                    self as u64
                }
            }
        )*
    };
}

impl_primitive!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, char);
impl_primitive_key!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl PrimitiveKey for bool {
    #[inline]
    fn to_bits(self) -> u64 {
        u64::from(self)
    }
}

impl PrimitiveKey for char {
    #[inline]
    fn to_bits(self) -> u64 {
        u64::from(u32::from(self))
    }
}
