//! Containers specialized for machine-word primitive types.
//!
//! # primcoll::HashMap
//! A separately chained hash map over primitive keys and values that grows by
//! doubling its power-of-two bucket array.
//!
//! # primcoll::CowList
//! A copy-on-write list whose readers never synchronize and whose iterators
//! observe an immutable snapshot.

pub mod cow_list;
pub mod hash_map;

mod error;
mod primitive;

// primcoll::HashMap
pub use hash_map::Cursor;
pub use hash_map::HashMap;

// primcoll::CowList
pub use cow_list::CowList;
pub use cow_list::SubList;

pub use error::Error;
pub use primitive::Primitive;
pub use primitive::PrimitiveKey;

#[cfg(feature = "serde")]
mod serde;
