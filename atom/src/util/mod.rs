//! Utilities to help with inspecting and comparing node trees.
mod outline;
mod value;

pub use value::{Data, Value};
