//! caravela-print - canonical text for the Caravela IR
//!
//! Turns arena-owned expressions, functions and modules into the
//! parenthesized text form consumed by downstream tooling (reference
//! interpreter included). Output is byte-for-byte stable; the ANSI
//! highlight channel is optional and strips to nothing.
//!
//! # Example
//!
//! ```rust
//! use caravela_ir::{Arena, Literal};
//! use caravela_print::Printer;
//!
//! let mut arena = Arena::new();
//! let half = arena.alloc_const(Literal::F64(0.5));
//! let printer = Printer::new(&arena);
//! assert_eq!(printer.expr_to_string(half), "(f64.const 0.5)");
//! ```

pub mod color;
pub mod printer;

pub use color::{Style, RESET};
pub use printer::{
    binary_mnemonic, convert_mnemonic, host_mnemonic, relational_mnemonic, unary_mnemonic,
    PrintConfig, Printer, MEMORY_SIZE_BYTES,
};
