//! Image stack loading.
//!
//! This module reads coronagraph image stacks out of NetCDF files and
//! describes the variables a file offers.

mod reader;
mod variable_data;

pub use reader::{list_variables, read_stack, VariableInfo};
