//! The closed expression taxonomy.
//!
//! Every IR expression is a [`Node`]: an output value type plus one variant
//! of [`NodeKind`]. The set of variants is closed; the walker and the
//! printer match on it exhaustively, so a new variant fails to compile
//! until every traversal handles it.

use crate::arena::{ExprRef, SigRef};
use crate::types::{Literal, Name, ValueType};

/// Unary operators. The first three apply to integers, the rest to floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Clz,
    Ctz,
    Popcnt,
    Neg,
    Abs,
    Ceil,
    Floor,
    Trunc,
    Nearest,
    Sqrt,
}

/// Binary operators, integer-only, float-only, or shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    DivS,
    DivU,
    RemS,
    RemU,
    And,
    Or,
    Xor,
    Shl,
    ShrU,
    ShrS,
    Div,
    CopySign,
    Min,
    Max,
}

/// Comparison operators. The output of a comparison is always `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalOp {
    Eq,
    Ne,
    LtS,
    LtU,
    LeS,
    LeU,
    GtS,
    GtU,
    GeS,
    GeU,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Numeric conversion operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertOp {
    ExtendSInt32,
    ExtendUInt32,
    WrapInt64,
    TruncSFloat32,
    TruncUFloat32,
    TruncSFloat64,
    TruncUFloat64,
    ReinterpretFloat,
    ConvertSInt32,
    ConvertUInt32,
    ConvertSInt64,
    ConvertUInt64,
    PromoteFloat32,
    DemoteFloat64,
    ReinterpretInt,
}

/// Environment-introspection and memory-growth operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOp {
    PageSize,
    MemorySize,
    GrowMemory,
    HasFeature,
}

/// One arm of a `Switch`.
#[derive(Debug, Clone)]
pub struct SwitchCase {
    /// Value matched against the scrutinee.
    pub value: Literal,
    /// Arm body; may be absent for a bare fallthrough arm.
    pub body: Option<ExprRef>,
    /// Whether control continues into the next arm.
    pub fallthrough: bool,
}

/// An IR expression node.
#[derive(Debug, Clone)]
pub struct Node {
    /// The type of the expression: its output, not necessarily its inputs.
    pub ty: ValueType,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(ty: ValueType, kind: NodeKind) -> Self {
        Node { ty, kind }
    }
}

/// The closed set of expression variants.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Does nothing.
    Nop,

    /// Sequence of statements, optionally labeled.
    Block {
        label: Option<Name>,
        items: Vec<ExprRef>,
    },

    /// Two- or three-way conditional.
    If {
        condition: ExprRef,
        if_true: ExprRef,
        if_false: Option<ExprRef>,
    },

    /// Loop with optional outer (break) and inner (continue) labels.
    Loop {
        outer: Option<Name>,
        inner: Option<Name>,
        body: ExprRef,
    },

    /// Structural marker referenced by `Break`.
    Label { name: Name },

    /// Branch to a label, optionally guarded, optionally carrying a value.
    Break {
        label: Name,
        condition: Option<ExprRef>,
        value: Option<ExprRef>,
    },

    /// Multi-way dispatch on a scrutinee value.
    Switch {
        label: Name,
        scrutinee: ExprRef,
        cases: Vec<SwitchCase>,
        default: Option<ExprRef>,
    },

    /// Direct call to a function defined in the module.
    Call {
        target: Name,
        operands: Vec<ExprRef>,
    },

    /// Call to a host import. Same shape as `Call`, distinct category.
    CallImport {
        target: Name,
        operands: Vec<ExprRef>,
    },

    /// Call dispatched through the table by runtime index.
    CallIndirect {
        signature: SigRef,
        target: ExprRef,
        operands: Vec<ExprRef>,
    },

    /// Reads a local.
    GetLocal { id: Name },

    /// Writes a local.
    SetLocal { id: Name, value: ExprRef },

    /// Memory load. `signed` only matters for sub-word widths.
    Load {
        bytes: u32,
        signed: bool,
        float: bool,
        offset: u32,
        align: u32,
        ptr: ExprRef,
    },

    /// Memory store. Never carries a signedness flag.
    Store {
        bytes: u32,
        float: bool,
        offset: u32,
        align: u32,
        ptr: ExprRef,
        value: ExprRef,
    },

    /// Constant literal.
    Const { value: Literal },

    /// Unary arithmetic.
    Unary { op: UnaryOp, value: ExprRef },

    /// Binary arithmetic.
    Binary {
        op: BinaryOp,
        left: ExprRef,
        right: ExprRef,
    },

    /// Comparison. `input_ty` is the operand type; the output is `i32`.
    Compare {
        op: RelationalOp,
        input_ty: ValueType,
        left: ExprRef,
        right: ExprRef,
    },

    /// Numeric conversion.
    Convert { op: ConvertOp, value: ExprRef },

    /// Host environment operation.
    Host { op: HostOp, operands: Vec<ExprRef> },
}
