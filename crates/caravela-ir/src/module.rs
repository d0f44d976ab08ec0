//! Container entities: function types, functions, imports, exports, the
//! indirect-call table and the module itself.
//!
//! A `Module` never owns node memory; it holds handles into the arena the
//! tree was built from, plus by-value metadata (imports, exports, table).
//! Maps are ordered so that printing a module is deterministic.

use std::collections::BTreeMap;

use crate::arena::{ExprRef, FuncRef, SigRef};
use crate::types::{Name, ValueType};

/// A declared function signature.
///
/// Equality covers the name as well as the result and parameter sequence,
/// conflating nominal and structural identity; use
/// [`matches_shape`](Self::matches_shape) for the purely structural
/// comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionType {
    pub name: Name,
    pub result: ValueType,
    pub params: Vec<ValueType>,
}

impl FunctionType {
    pub fn new(name: Name, result: ValueType, params: Vec<ValueType>) -> Self {
        Self {
            name,
            result,
            params,
        }
    }

    /// Structural comparison: result and parameter sequence, name ignored.
    pub fn matches_shape(&self, other: &FunctionType) -> bool {
        self.result == other.result && self.params == other.params
    }
}

/// A function: signature parts, named locals, and one owned body.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Name,
    pub result: ValueType,
    /// Ordered named parameters.
    pub params: Vec<(Name, ValueType)>,
    /// Ordered named locals, declared after the parameters.
    pub locals: Vec<(Name, ValueType)>,
    pub body: ExprRef,
}

impl Function {
    pub fn new(name: Name, result: ValueType, body: ExprRef) -> Self {
        Self {
            name,
            result,
            params: Vec::new(),
            locals: Vec::new(),
            body,
        }
    }

    pub fn add_param(&mut self, name: Name, ty: ValueType) {
        self.params.push((name, ty));
    }

    pub fn add_local(&mut self, name: Name, ty: ValueType) {
        self.locals.push((name, ty));
    }
}

/// A host import: `name` stands for `module.base` inside this module.
#[derive(Debug, Clone)]
pub struct Import {
    pub name: Name,
    pub module: Name,
    pub base: Name,
    pub signature: FunctionType,
}

impl Import {
    pub fn new(name: Name, module: Name, base: Name, signature: FunctionType) -> Self {
        Self {
            name,
            module,
            base,
            signature,
        }
    }
}

/// An exported name and the internal value it refers to.
#[derive(Debug, Clone)]
pub struct Export {
    pub name: Name,
    pub value: Name,
}

impl Export {
    pub fn new(name: Name, value: Name) -> Self {
        Self { name, value }
    }
}

/// Indirect-call dispatch table; a function's index is its position.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub names: Vec<Name>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A complete module: declared signatures, imports, exports, the table and
/// the functions, all referring into one arena.
#[derive(Debug, Default)]
pub struct Module {
    pub signatures: BTreeMap<Name, SigRef>,
    pub imports: BTreeMap<Name, Import>,
    pub exports: Vec<Export>,
    pub table: Table,
    pub functions: Vec<FuncRef>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a signature under its name.
    pub fn add_signature(&mut self, name: Name, signature: SigRef) {
        self.signatures.insert(name, signature);
    }

    pub fn get_signature(&self, name: &Name) -> Option<SigRef> {
        self.signatures.get(name).copied()
    }

    pub fn add_import(&mut self, import: Import) {
        self.imports.insert(import.name.clone(), import);
    }

    pub fn get_import(&self, name: &Name) -> Option<&Import> {
        self.imports.get(name)
    }

    pub fn add_export(&mut self, export: Export) {
        self.exports.push(export);
    }

    pub fn add_function(&mut self, function: FuncRef) {
        self.functions.push(function);
    }
}
