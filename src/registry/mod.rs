//! Operator registry.
//!
//! One [`OperatorRegistry`] per problem family maps stable string keys to
//! [`OperatorDescriptor`]s in four pools: constructive, local search,
//! perturbation and repair. Registries are built once through a
//! [`RegistryBuilder`] and are read-only afterwards; they are passed by
//! reference to the generator, the grammar and the interpreter.

mod table;
mod types;

pub use table::{OperatorRegistry, RegistryBuilder, RegistryError};
pub use types::{OpParams, Operator, OperatorDescriptor, OperatorFamily, OperatorFault};
