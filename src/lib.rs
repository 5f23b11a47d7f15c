//! Styled QR code generation.
//!
//! This crate re-exports the data model from [`qrstamp_core`] and the encode, render and
//! composition pipeline from [`qrstamp_encode`].

pub use qrstamp_core as core;
pub use qrstamp_encode as encode;

pub use qrstamp_core::{Color, Ecl, GeneratorConfig, ModuleGrid, Symbol, SymbolSpec, Version};
pub use qrstamp_encode::{Error, Generated, Generator, OutputFormat, OutputTarget};
