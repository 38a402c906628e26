//! Memory Manager - object heap and garbage collector
//!
//! This component provides:
//! - A fixed-size node heap with a free list
//! - A compacting vector heap for variable-size payloads
//! - Stop-the-world mark-sweep collection over both heaps
//! - The protection stack and its scoped guards
//! - Symbol interning, attributes and object copying
//!
//! # Examples
//!
//! ```
//! use core_types::SexpType;
//! use memory_manager::{Heap, MemoryConfig};
//!
//! let mut heap = Heap::new(MemoryConfig::default()).unwrap();
//! let v = heap.alloc_vector(SexpType::Integer, 3).unwrap();
//! let _v = heap.protect(v).unwrap();
//! heap.integer_mut(v).unwrap().copy_from_slice(&[1, 2, 3]);
//!
//! heap.collect();
//! assert_eq!(heap.integer(v).unwrap(), &[1, 2, 3]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod access;
mod attrib;
pub mod config;
pub mod gc;
pub mod heap;
pub mod node_heap;
pub mod object;
pub mod protect;
pub mod symbols;
pub mod vector_heap;

pub use config::MemoryConfig;
pub use gc::GcStats;
pub use heap::Heap;
pub use object::SexpRec;
pub use protect::{Protected, ProtectionStack};
pub use vector_heap::{vector_units, VectorData};
