//! Program generator.
//!
//! Samples random well-typed programs under depth and size caps, repairs
//! fixable grammar errors and retries otherwise. Programs are fully
//! determined by the generator configuration, the registry key sets and
//! the seed.

mod config;
mod repair;
mod runner;

pub use config::{GeneratorConfig, Strategy};
pub use repair::repair_arena;
pub use runner::{GenError, Generator};
