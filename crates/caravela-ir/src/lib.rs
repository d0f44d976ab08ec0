//! caravela-ir - WebAssembly intermediate representation
//!
//! The in-memory data model shared by every Caravela tool:
//! - A closed expression taxonomy with per-node output types
//! - Arena ownership: one allocator per tree, bulk teardown, opaque handles
//! - Container entities (functions, imports, exports, table, module)
//!
//! # Architecture
//!
//! ```text
//! front end (external)
//!         ↓  builds via Arena::alloc_*
//!       Arena ── owns ──► Node / Function / FunctionType
//!         ▲                     ▲
//!         │ handles             │ handles
//!       Module ── signatures / imports / exports / table / functions
//!         ↓
//! caravela-walk (rewrite) · caravela-print (canonical text)
//! ```
//!
//! Everything is single-threaded: an arena and the module built from it
//! form one single-writer resource for their whole lifetime.

pub mod arena;
pub mod error;
pub mod module;
pub mod node;
pub mod types;

pub use arena::{Arena, ExprRef, FuncRef, SigRef, DEFAULT_CHUNK_CAPACITY};
pub use error::IrError;
pub use module::{Export, Function, FunctionType, Import, Module, Table};
pub use node::{
    BinaryOp, ConvertOp, HostOp, Node, NodeKind, RelationalOp, SwitchCase, UnaryOp,
};
pub use types::{write_float_text, Literal, Name, ValueType};
