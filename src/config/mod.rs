//! Configuration types for pyramid and assembler components.
//!
//! Settings are plain structs grouped by concern; components take the
//! struct they need rather than loose parameters.

mod defaults;
mod settings;

pub use defaults::*;
pub use settings::{AssemblerSettings, PyramidSettings, RetrySettings};
