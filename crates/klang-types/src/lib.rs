//! Pure data types for klang — values, bindings, resource keys.
//!
//! This crate is a leaf dependency with no parser and no I/O. It exists so
//! that embedders can work with klang's value model without pulling in the
//! kernel's lexer, interpreter, and cluster plumbing.

pub mod resource;
pub mod value;

pub use resource::{ResourceKey, ResourceKeyError};
pub use value::{Binding, DataType, Value};
