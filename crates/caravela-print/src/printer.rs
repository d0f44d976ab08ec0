//! Canonical s-expression printing.
//!
//! Output is deterministic and indentation-structured: composites open with
//! their keyword, place each child on its own line one level deeper, and
//! close with a `)` aligned to the depth at entry. The optional color
//! channel wraps tokens in ANSI escapes that strip to nothing.

use std::fmt::{self, Write};

use caravela_ir::{
    Arena, BinaryOp, ConvertOp, Export, ExprRef, FuncRef, FunctionType, HostOp, Import, IrError,
    Literal, Module, NodeKind, RelationalOp, Table, UnaryOp, ValueType,
};

use crate::color::{Style, RESET};

/// Linear memory size emitted in the module header, until modules model
/// their own memories.
pub const MEMORY_SIZE_BYTES: u32 = 16_777_216;

/// Textual form of a unary operator. Only the operators the current text
/// grammar defines are mapped; the rest are the unmapped-operator fatal
/// path.
pub fn unary_mnemonic(op: UnaryOp) -> Result<&'static str, IrError> {
    match op {
        UnaryOp::Clz => Ok("clz"),
        UnaryOp::Neg => Ok("neg"),
        UnaryOp::Floor => Ok("floor"),
        other => Err(IrError::unmapped_operator(format!(
            "unary operator {:?} has no text form",
            other
        ))),
    }
}

/// Textual form of a binary operator; the table is total.
pub fn binary_mnemonic(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "add",
        BinaryOp::Sub => "sub",
        BinaryOp::Mul => "mul",
        BinaryOp::DivS => "div_s",
        BinaryOp::DivU => "div_u",
        BinaryOp::RemS => "rem_s",
        BinaryOp::RemU => "rem_u",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
        BinaryOp::Xor => "xor",
        BinaryOp::Shl => "shl",
        BinaryOp::ShrU => "shr_u",
        BinaryOp::ShrS => "shr_s",
        BinaryOp::Div => "div",
        BinaryOp::CopySign => "copysign",
        BinaryOp::Min => "min",
        BinaryOp::Max => "max",
    }
}

/// Textual form of a comparison operator; the table is total.
pub fn relational_mnemonic(op: RelationalOp) -> &'static str {
    match op {
        RelationalOp::Eq => "eq",
        RelationalOp::Ne => "ne",
        RelationalOp::LtS => "lt_s",
        RelationalOp::LtU => "lt_u",
        RelationalOp::LeS => "le_s",
        RelationalOp::LeU => "le_u",
        RelationalOp::GtS => "gt_s",
        RelationalOp::GtU => "gt_u",
        RelationalOp::GeS => "ge_s",
        RelationalOp::GeU => "ge_u",
        RelationalOp::Lt => "lt",
        RelationalOp::Le => "le",
        RelationalOp::Gt => "gt",
        RelationalOp::Ge => "ge",
    }
}

/// Full textual form of a conversion operator, including both types.
/// Only the conversions the current text grammar defines are mapped.
pub fn convert_mnemonic(op: ConvertOp) -> Result<&'static str, IrError> {
    match op {
        ConvertOp::ConvertUInt32 => Ok("f64.convert_u/i32"),
        ConvertOp::ConvertSInt32 => Ok("f64.convert_s/i32"),
        ConvertOp::TruncSFloat64 => Ok("i32.trunc_s/f64"),
        other => Err(IrError::unmapped_operator(format!(
            "conversion operator {:?} has no text form",
            other
        ))),
    }
}

/// Textual form of a host operator; the table is total.
pub fn host_mnemonic(op: HostOp) -> &'static str {
    match op {
        HostOp::PageSize => "page_size",
        HostOp::MemorySize => "memory_size",
        HostOp::GrowMemory => "grow_memory",
        HostOp::HasFeature => "has_feature",
    }
}

/// Formatting configuration, threaded explicitly through every call.
#[derive(Debug, Clone, Copy)]
pub struct PrintConfig {
    /// Emit the ANSI highlight channel.
    pub colors: bool,
    /// Spaces per indentation level.
    pub indent: usize,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            colors: false,
            indent: 2,
        }
    }
}

/// Read-only canonical printer over one arena.
pub struct Printer<'m> {
    arena: &'m Arena,
    config: PrintConfig,
}

impl<'m> Printer<'m> {
    pub fn new(arena: &'m Arena) -> Self {
        Self::with_config(arena, PrintConfig::default())
    }

    pub fn with_config(arena: &'m Arena, config: PrintConfig) -> Self {
        Self { arena, config }
    }

    // -- sink helpers ----------------------------------------------------

    fn begin_style(&self, out: &mut impl Write, style: Style) -> fmt::Result {
        if self.config.colors {
            out.write_str(style.code())?;
        }
        Ok(())
    }

    fn end_style(&self, out: &mut impl Write) -> fmt::Result {
        if self.config.colors {
            out.write_str(RESET)?;
        }
        Ok(())
    }

    /// `(keyword` with the keyword highlighted.
    fn open(&self, out: &mut impl Write, style: Style, keyword: &str) -> fmt::Result {
        out.write_char('(')?;
        self.begin_style(out, style)?;
        out.write_str(keyword)?;
        self.end_style(out)
    }

    fn quoted(&self, out: &mut impl Write, text: &str) -> fmt::Result {
        out.write_char('"')?;
        self.begin_style(out, Style::Quoted)?;
        out.write_str(text)?;
        self.end_style(out)?;
        out.write_char('"')
    }

    fn do_indent(&self, out: &mut impl Write, depth: usize) -> fmt::Result {
        for _ in 0..depth * self.config.indent {
            out.write_char(' ')?;
        }
        Ok(())
    }

    /// One child on its own line, one level deeper than `depth`.
    fn full_line(&self, out: &mut impl Write, expr: ExprRef, depth: usize) -> fmt::Result {
        self.do_indent(out, depth + 1)?;
        self.print_expr(out, expr, depth + 1)?;
        out.write_char('\n')
    }

    /// The terminating delimiter, aligned to the depth at entry.
    fn close(&self, out: &mut impl Write, depth: usize) -> fmt::Result {
        self.do_indent(out, depth)?;
        out.write_char(')')
    }

    fn literal(&self, out: &mut impl Write, value: Literal) -> fmt::Result {
        out.write_char('(')?;
        self.begin_style(out, Style::Minor)?;
        write!(out, "{}.const {}", value.value_type(), value)?;
        self.end_style(out)?;
        out.write_char(')')
    }

    // -- expressions -----------------------------------------------------

    /// Renders the expression at `expr`; `depth` is the indentation level
    /// the node starts on.
    pub fn print_expr(&self, out: &mut impl Write, expr: ExprRef, depth: usize) -> fmt::Result {
        let node = self.arena.expr(expr);
        match &node.kind {
            NodeKind::Nop => {
                self.open(out, Style::Minor, "nop")?;
                out.write_char(')')
            }
            NodeKind::Block { label, items } => {
                self.open(out, Style::Keyword, "block")?;
                if let Some(label) = label {
                    write!(out, " {}", label)?;
                }
                out.write_char('\n')?;
                for item in items {
                    self.full_line(out, *item, depth)?;
                }
                self.close(out, depth)
            }
            NodeKind::If {
                condition,
                if_true,
                if_false,
            } => {
                self.open(out, Style::Keyword, "if")?;
                out.write_char('\n')?;
                self.full_line(out, *condition, depth)?;
                self.full_line(out, *if_true, depth)?;
                if let Some(if_false) = if_false {
                    self.full_line(out, *if_false, depth)?;
                }
                self.close(out, depth)
            }
            NodeKind::Loop { outer, inner, body } => {
                self.open(out, Style::Keyword, "loop")?;
                if let Some(outer) = outer {
                    write!(out, " {}", outer)?;
                    if let Some(inner) = inner {
                        write!(out, " {}", inner)?;
                    }
                }
                out.write_char('\n')?;
                self.full_line(out, *body, depth)?;
                self.close(out, depth)
            }
            NodeKind::Label { name } => {
                self.open(out, Style::Keyword, "label")?;
                write!(out, " {})", name)
            }
            NodeKind::Break {
                label,
                condition,
                value,
            } => {
                self.open(out, Style::Keyword, "break")?;
                write!(out, " {}", label)?;
                out.write_char('\n')?;
                if let Some(condition) = condition {
                    self.full_line(out, *condition, depth)?;
                }
                if let Some(value) = value {
                    self.full_line(out, *value, depth)?;
                }
                self.close(out, depth)
            }
            NodeKind::Switch {
                label,
                scrutinee,
                cases,
                default,
            } => {
                self.open(out, Style::Keyword, "switch")?;
                write!(out, " {}", label)?;
                out.write_char('\n')?;
                self.full_line(out, *scrutinee, depth)?;
                for case in cases {
                    self.do_indent(out, depth + 1)?;
                    self.open(out, Style::Keyword, "case")?;
                    out.write_char(' ')?;
                    self.literal(out, case.value)?;
                    out.write_char('\n')?;
                    if let Some(body) = case.body {
                        self.full_line(out, body, depth + 1)?;
                    }
                    if case.fallthrough {
                        self.do_indent(out, depth + 2)?;
                        self.open(out, Style::Minor, "fallthrough")?;
                        out.write_str(")\n")?;
                    }
                    self.close(out, depth + 1)?;
                    out.write_char('\n')?;
                }
                if let Some(default) = default {
                    self.do_indent(out, depth + 1)?;
                    self.open(out, Style::Keyword, "default")?;
                    out.write_char('\n')?;
                    self.full_line(out, *default, depth + 1)?;
                    self.close(out, depth + 1)?;
                    out.write_char('\n')?;
                }
                self.close(out, depth)
            }
            NodeKind::Call { target, operands } => {
                self.open(out, Style::Keyword, "call")?;
                write!(out, " {}", target)?;
                self.call_operands(out, operands, depth)
            }
            NodeKind::CallImport { target, operands } => {
                self.open(out, Style::Keyword, "call_import")?;
                write!(out, " {}", target)?;
                self.call_operands(out, operands, depth)
            }
            NodeKind::CallIndirect {
                signature,
                target,
                operands,
            } => {
                self.open(out, Style::Keyword, "call_indirect")?;
                write!(out, " {}", self.arena.signature(*signature).name)?;
                out.write_char('\n')?;
                self.full_line(out, *target, depth)?;
                for operand in operands {
                    self.full_line(out, *operand, depth)?;
                }
                self.close(out, depth)
            }
            NodeKind::GetLocal { id } => {
                self.open(out, Style::Keyword, "get_local")?;
                write!(out, " {})", id)
            }
            NodeKind::SetLocal { id, value } => {
                self.open(out, Style::Keyword, "set_local")?;
                write!(out, " {}", id)?;
                out.write_char('\n')?;
                self.full_line(out, *value, depth)?;
                self.close(out, depth)
            }
            NodeKind::Load {
                bytes,
                signed,
                float,
                offset,
                align,
                ptr,
            } => {
                if *offset != 0 {
                    panic!(
                        "{}",
                        IrError::invalid_type("nonzero load offsets are not supported")
                    );
                }
                let ty = ValueType::from_memory_access(*bytes, *float);
                out.write_char('(')?;
                self.begin_style(out, Style::Keyword)?;
                write!(out, "{}.load{}", ty, access_width_marker(*bytes))?;
                if *bytes < 4 {
                    out.write_str(if *signed { "_s" } else { "_u" })?;
                }
                self.end_style(out)?;
                write!(out, " align={}", align)?;
                out.write_char('\n')?;
                self.full_line(out, *ptr, depth)?;
                self.close(out, depth)
            }
            NodeKind::Store {
                bytes,
                float,
                offset,
                align,
                ptr,
                value,
            } => {
                if *offset != 0 {
                    panic!(
                        "{}",
                        IrError::invalid_type("nonzero store offsets are not supported")
                    );
                }
                let ty = ValueType::from_memory_access(*bytes, *float);
                out.write_char('(')?;
                self.begin_style(out, Style::Keyword)?;
                // stores never carry a signedness suffix
                write!(out, "{}.store{}", ty, access_width_marker(*bytes))?;
                self.end_style(out)?;
                write!(out, " align={}", align)?;
                out.write_char('\n')?;
                self.full_line(out, *ptr, depth)?;
                self.full_line(out, *value, depth)?;
                self.close(out, depth)
            }
            NodeKind::Const { value } => self.literal(out, *value),
            NodeKind::Unary { op, value } => {
                let mnemonic = unary_mnemonic(*op).unwrap_or_else(|e| panic!("{}", e));
                out.write_char('(')?;
                self.begin_style(out, Style::Keyword)?;
                write!(out, "{}.{}", node.ty, mnemonic)?;
                self.end_style(out)?;
                out.write_char('\n')?;
                self.full_line(out, *value, depth)?;
                self.close(out, depth)
            }
            NodeKind::Binary { op, left, right } => {
                out.write_char('(')?;
                self.begin_style(out, Style::Keyword)?;
                write!(out, "{}.{}", node.ty, binary_mnemonic(*op))?;
                self.end_style(out)?;
                out.write_char('\n')?;
                self.full_line(out, *left, depth)?;
                self.full_line(out, *right, depth)?;
                self.close(out, depth)
            }
            NodeKind::Compare {
                op,
                input_ty,
                left,
                right,
            } => {
                // the mnemonic is prefixed with the input type; the
                // expression's own output type is always i32
                out.write_char('(')?;
                self.begin_style(out, Style::Keyword)?;
                write!(out, "{}.{}", input_ty, relational_mnemonic(*op))?;
                self.end_style(out)?;
                out.write_char('\n')?;
                self.full_line(out, *left, depth)?;
                self.full_line(out, *right, depth)?;
                self.close(out, depth)
            }
            NodeKind::Convert { op, value } => {
                let mnemonic = convert_mnemonic(*op).unwrap_or_else(|e| panic!("{}", e));
                out.write_char('(')?;
                self.begin_style(out, Style::Keyword)?;
                out.write_str(mnemonic)?;
                self.end_style(out)?;
                out.write_char('\n')?;
                self.full_line(out, *value, depth)?;
                self.close(out, depth)
            }
            NodeKind::Host { op, operands } => {
                self.open(out, Style::Keyword, host_mnemonic(*op))?;
                self.call_operands(out, operands, depth)
            }
        }
    }

    /// Operand list shared by the call forms: inline close when empty.
    fn call_operands(&self, out: &mut impl Write, operands: &[ExprRef], depth: usize) -> fmt::Result {
        if operands.is_empty() {
            return out.write_char(')');
        }
        out.write_char('\n')?;
        for operand in operands {
            self.full_line(out, *operand, depth)?;
        }
        self.close(out, depth)
    }

    // -- containers ------------------------------------------------------

    /// Renders a signature. Inline form contributes ` (param …)` and
    /// ` (result …)` to the current line; the full form wraps them in
    /// `(type $name (func …))`.
    pub fn print_signature(
        &self,
        out: &mut impl Write,
        signature: &FunctionType,
        full: bool,
    ) -> fmt::Result {
        if full {
            self.open(out, Style::Keyword, "type")?;
            write!(out, " {} (func", signature.name)?;
        }
        if !signature.params.is_empty() {
            out.write_char(' ')?;
            self.open(out, Style::Minor, "param")?;
            for param in &signature.params {
                write!(out, " {}", param)?;
            }
            out.write_char(')')?;
        }
        if signature.result != ValueType::None {
            out.write_char(' ')?;
            self.open(out, Style::Minor, "result ")?;
            write!(out, "{})", signature.result)?;
        }
        if full {
            out.write_str("))")?;
        }
        Ok(())
    }

    pub fn print_import(&self, out: &mut impl Write, import: &Import) -> fmt::Result {
        self.open(out, Style::Keyword, "import")?;
        write!(out, " {} ", import.name)?;
        self.quoted(out, import.module.as_str())?;
        out.write_char(' ')?;
        self.quoted(out, import.base.as_str())?;
        self.print_signature(out, &import.signature, false)?;
        out.write_char(')')
    }

    pub fn print_export(&self, out: &mut impl Write, export: &Export) -> fmt::Result {
        self.open(out, Style::Keyword, "export")?;
        out.write_char(' ')?;
        self.quoted(out, export.name.as_str())?;
        write!(out, " {})", export.value)
    }

    pub fn print_table(&self, out: &mut impl Write, table: &Table) -> fmt::Result {
        self.open(out, Style::Keyword, "table")?;
        for name in &table.names {
            write!(out, " {}", name)?;
        }
        out.write_char(')')
    }

    /// Renders a function: signature parts, local declarations, then the
    /// body.
    pub fn print_function(&self, out: &mut impl Write, func: FuncRef, depth: usize) -> fmt::Result {
        let function = self.arena.function(func);
        self.open(out, Style::Major, "func")?;
        write!(out, " {}", function.name)?;
        for (name, ty) in &function.params {
            out.write_char(' ')?;
            self.open(out, Style::Minor, "param ")?;
            write!(out, "{} {})", name, ty)?;
        }
        if function.result != ValueType::None {
            out.write_char(' ')?;
            self.open(out, Style::Minor, "result ")?;
            write!(out, "{})", function.result)?;
        }
        out.write_char('\n')?;
        for (name, ty) in &function.locals {
            self.do_indent(out, depth + 1)?;
            self.open(out, Style::Minor, "local ")?;
            write!(out, "{} {})", name, ty)?;
            out.write_char('\n')?;
        }
        self.full_line(out, function.body, depth)?;
        self.close(out, depth)
    }

    /// Renders a whole module: memory, declared types, exports, table
    /// (when non-empty), then functions. Imports are tracked by the module
    /// but deliberately not re-emitted.
    pub fn print_module(&self, out: &mut impl Write, module: &Module) -> fmt::Result {
        self.open(out, Style::Major, "module")?;
        out.write_char('\n')?;

        self.do_indent(out, 1)?;
        self.open(out, Style::Keyword, "memory")?;
        writeln!(out, " {})", MEMORY_SIZE_BYTES)?;

        for signature in module.signatures.values() {
            self.do_indent(out, 1)?;
            self.print_signature(out, self.arena.signature(*signature), true)?;
            out.write_char('\n')?;
        }
        for export in &module.exports {
            self.do_indent(out, 1)?;
            self.print_export(out, export)?;
            out.write_char('\n')?;
        }
        if !module.table.is_empty() {
            self.do_indent(out, 1)?;
            self.print_table(out, &module.table)?;
            out.write_char('\n')?;
        }
        for func in &module.functions {
            self.do_indent(out, 1)?;
            self.print_function(out, *func, 1)?;
            out.write_char('\n')?;
        }
        out.write_str(")\n")
    }

    // -- string conveniences ---------------------------------------------

    pub fn expr_to_string(&self, expr: ExprRef) -> String {
        let mut out = String::new();
        self.print_expr(&mut out, expr, 0)
            .expect("writing to a String cannot fail");
        out
    }

    pub fn function_to_string(&self, func: FuncRef) -> String {
        let mut out = String::new();
        self.print_function(&mut out, func, 0)
            .expect("writing to a String cannot fail");
        out
    }

    pub fn module_to_string(&self, module: &Module) -> String {
        let mut out = String::new();
        self.print_module(&mut out, module)
            .expect("writing to a String cannot fail");
        out
    }
}

/// Sub-word width marker appended to load/store mnemonics.
fn access_width_marker(bytes: u32) -> &'static str {
    match bytes {
        1 => "8",
        2 => "16",
        _ => "",
    }
}
