//! Arena - bulk storage for IR nodes, functions and signatures.
//!
//! All memory for a tree lives in one [`Arena`] and dies with it; there is
//! no per-node free. Nodes are stored in fixed-capacity chunks, so growth
//! appends a chunk and never moves settled nodes. Handles are opaque
//! (arena id, index) pairs: every dereference checks the id, so using a
//! handle against the wrong arena fails fast instead of reading garbage.
//! Arena ids are process-unique and never reused.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::IrError;
use crate::module::{Function, FunctionType};
use crate::node::{
    BinaryOp, ConvertOp, HostOp, Node, NodeKind, RelationalOp, SwitchCase, UnaryOp,
};
use crate::types::{Literal, Name, ValueType};

/// Nodes per chunk unless overridden with
/// [`Arena::with_chunk_capacity`].
pub const DEFAULT_CHUNK_CAPACITY: usize = 1024;

static NEXT_ARENA_ID: AtomicU32 = AtomicU32::new(0);

/// Handle to an arena-owned expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprRef {
    arena: u32,
    index: u32,
}

/// Handle to an arena-owned function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncRef {
    arena: u32,
    index: u32,
}

/// Handle to an arena-owned function type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SigRef {
    arena: u32,
    index: u32,
}

/// Bulk allocator owning every node, function and signature of one tree.
pub struct Arena {
    id: u32,
    chunk_capacity: usize,
    chunks: Vec<Vec<Node>>,
    functions: Vec<Function>,
    signatures: Vec<FunctionType>,
}

impl Arena {
    pub fn new() -> Self {
        Self::with_chunk_capacity(DEFAULT_CHUNK_CAPACITY)
    }

    /// Creates an arena whose node chunks hold `nodes` entries each.
    /// A chunk must hold at least one node; zero is fatal.
    pub fn with_chunk_capacity(nodes: usize) -> Self {
        Self::try_with_chunk_capacity(nodes).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Validating twin of [`with_chunk_capacity`](Self::with_chunk_capacity).
    pub fn try_with_chunk_capacity(nodes: usize) -> Result<Self, IrError> {
        if nodes == 0 {
            return Err(IrError::capacity(
                "a chunk of 0 nodes cannot hold any allocation",
            ));
        }
        Ok(Arena {
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
            chunk_capacity: nodes,
            chunks: Vec::new(),
            functions: Vec::new(),
            signatures: Vec::new(),
        })
    }

    /// Number of nodes allocated so far.
    pub fn len(&self) -> usize {
        match self.chunks.split_last() {
            Some((last, settled)) => settled.len() * self.chunk_capacity + last.len(),
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Reserves a slot for `node` and returns its handle.
    pub fn alloc(&mut self, node: Node) -> ExprRef {
        let needs_chunk = self
            .chunks
            .last()
            .map_or(true, |chunk| chunk.len() == self.chunk_capacity);
        if needs_chunk {
            self.chunks.push(Vec::with_capacity(self.chunk_capacity));
            tracing::trace!(
                chunks = self.chunks.len(),
                capacity = self.chunk_capacity,
                "arena appended a node chunk"
            );
        }
        let index = self.len() as u32;
        self.chunks.last_mut().unwrap().push(node);
        ExprRef {
            arena: self.id,
            index,
        }
    }

    pub fn expr(&self, r: ExprRef) -> &Node {
        self.check_owner(r.arena, "expression");
        let i = r.index as usize;
        &self.chunks[i / self.chunk_capacity][i % self.chunk_capacity]
    }

    pub fn expr_mut(&mut self, r: ExprRef) -> &mut Node {
        self.check_owner(r.arena, "expression");
        let i = r.index as usize;
        &mut self.chunks[i / self.chunk_capacity][i % self.chunk_capacity]
    }

    pub fn alloc_function(&mut self, function: Function) -> FuncRef {
        let index = self.functions.len() as u32;
        self.functions.push(function);
        FuncRef {
            arena: self.id,
            index,
        }
    }

    pub fn function(&self, r: FuncRef) -> &Function {
        self.check_owner(r.arena, "function");
        &self.functions[r.index as usize]
    }

    pub fn function_mut(&mut self, r: FuncRef) -> &mut Function {
        self.check_owner(r.arena, "function");
        &mut self.functions[r.index as usize]
    }

    pub fn alloc_signature(&mut self, signature: FunctionType) -> SigRef {
        let index = self.signatures.len() as u32;
        self.signatures.push(signature);
        SigRef {
            arena: self.id,
            index,
        }
    }

    pub fn signature(&self, r: SigRef) -> &FunctionType {
        self.check_owner(r.arena, "signature");
        &self.signatures[r.index as usize]
    }

    pub fn signature_mut(&mut self, r: SigRef) -> &mut FunctionType {
        self.check_owner(r.arena, "signature");
        &mut self.signatures[r.index as usize]
    }

    fn check_owner(&self, arena: u32, what: &str) {
        assert!(
            arena == self.id,
            "{} handle used against a different arena",
            what
        );
    }

    // Typed constructors. Each computes the node's output type where the
    // variant determines it and takes it from the builder otherwise.

    pub fn alloc_nop(&mut self) -> ExprRef {
        self.alloc(Node::new(ValueType::None, NodeKind::Nop))
    }

    pub fn alloc_block(&mut self, label: Option<Name>, items: Vec<ExprRef>) -> ExprRef {
        self.alloc(Node::new(ValueType::None, NodeKind::Block { label, items }))
    }

    pub fn alloc_if(
        &mut self,
        condition: ExprRef,
        if_true: ExprRef,
        if_false: Option<ExprRef>,
    ) -> ExprRef {
        self.alloc(Node::new(
            ValueType::None,
            NodeKind::If {
                condition,
                if_true,
                if_false,
            },
        ))
    }

    pub fn alloc_loop(
        &mut self,
        outer: Option<Name>,
        inner: Option<Name>,
        body: ExprRef,
    ) -> ExprRef {
        self.alloc(Node::new(
            ValueType::None,
            NodeKind::Loop { outer, inner, body },
        ))
    }

    pub fn alloc_label(&mut self, name: Name) -> ExprRef {
        self.alloc(Node::new(ValueType::None, NodeKind::Label { name }))
    }

    pub fn alloc_break(
        &mut self,
        label: Name,
        condition: Option<ExprRef>,
        value: Option<ExprRef>,
    ) -> ExprRef {
        self.alloc(Node::new(
            ValueType::None,
            NodeKind::Break {
                label,
                condition,
                value,
            },
        ))
    }

    pub fn alloc_switch(
        &mut self,
        label: Name,
        scrutinee: ExprRef,
        cases: Vec<SwitchCase>,
        default: Option<ExprRef>,
    ) -> ExprRef {
        self.alloc(Node::new(
            ValueType::None,
            NodeKind::Switch {
                label,
                scrutinee,
                cases,
                default,
            },
        ))
    }

    /// `result` comes from the callee's declared signature.
    pub fn alloc_call(
        &mut self,
        target: Name,
        operands: Vec<ExprRef>,
        result: ValueType,
    ) -> ExprRef {
        self.alloc(Node::new(result, NodeKind::Call { target, operands }))
    }

    pub fn alloc_call_import(
        &mut self,
        target: Name,
        operands: Vec<ExprRef>,
        result: ValueType,
    ) -> ExprRef {
        self.alloc(Node::new(result, NodeKind::CallImport { target, operands }))
    }

    /// The output type is the signature's declared result.
    pub fn alloc_call_indirect(
        &mut self,
        signature: SigRef,
        target: ExprRef,
        operands: Vec<ExprRef>,
    ) -> ExprRef {
        let result = self.signature(signature).result;
        self.alloc(Node::new(
            result,
            NodeKind::CallIndirect {
                signature,
                target,
                operands,
            },
        ))
    }

    pub fn alloc_get_local(&mut self, id: Name, ty: ValueType) -> ExprRef {
        self.alloc(Node::new(ty, NodeKind::GetLocal { id }))
    }

    /// The output type follows the stored value.
    pub fn alloc_set_local(&mut self, id: Name, value: ExprRef) -> ExprRef {
        let ty = self.expr(value).ty;
        self.alloc(Node::new(ty, NodeKind::SetLocal { id, value }))
    }

    /// The output type is inferred from the access width and float flag;
    /// narrow loads widen to `i32`.
    pub fn alloc_load(
        &mut self,
        bytes: u32,
        signed: bool,
        float: bool,
        offset: u32,
        align: u32,
        ptr: ExprRef,
    ) -> ExprRef {
        let ty = ValueType::from_memory_access(bytes, float);
        self.alloc(Node::new(
            ty,
            NodeKind::Load {
                bytes,
                signed,
                float,
                offset,
                align,
                ptr,
            },
        ))
    }

    pub fn alloc_store(
        &mut self,
        bytes: u32,
        float: bool,
        offset: u32,
        align: u32,
        ptr: ExprRef,
        value: ExprRef,
    ) -> ExprRef {
        let ty = ValueType::from_memory_access(bytes, float);
        self.alloc(Node::new(
            ty,
            NodeKind::Store {
                bytes,
                float,
                offset,
                align,
                ptr,
                value,
            },
        ))
    }

    pub fn alloc_const(&mut self, value: Literal) -> ExprRef {
        self.alloc(Node::new(value.value_type(), NodeKind::Const { value }))
    }

    /// Unary operators preserve their operand's type.
    pub fn alloc_unary(&mut self, op: UnaryOp, value: ExprRef) -> ExprRef {
        let ty = self.expr(value).ty;
        self.alloc(Node::new(ty, NodeKind::Unary { op, value }))
    }

    /// Binary operators produce their operands' type.
    pub fn alloc_binary(&mut self, op: BinaryOp, left: ExprRef, right: ExprRef) -> ExprRef {
        let ty = self.expr(left).ty;
        self.alloc(Node::new(ty, NodeKind::Binary { op, left, right }))
    }

    /// The input type is recorded from the left operand; the output of a
    /// comparison is always `i32`.
    pub fn alloc_compare(&mut self, op: RelationalOp, left: ExprRef, right: ExprRef) -> ExprRef {
        let input_ty = self.expr(left).ty;
        self.alloc(Node::new(
            ValueType::I32,
            NodeKind::Compare {
                op,
                input_ty,
                left,
                right,
            },
        ))
    }

    /// The operator alone does not fix the target width for every
    /// conversion, so the builder supplies the output type.
    pub fn alloc_convert(&mut self, op: ConvertOp, value: ExprRef, ty: ValueType) -> ExprRef {
        self.alloc(Node::new(ty, NodeKind::Convert { op, value }))
    }

    /// Host operations all yield `i32`.
    pub fn alloc_host(&mut self, op: HostOp, operands: Vec<ExprRef>) -> ExprRef {
        self.alloc(Node::new(ValueType::I32, NodeKind::Host { op, operands }))
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_read_back() {
        let mut arena = Arena::new();
        let c = arena.alloc_const(Literal::I32(42));
        let node = arena.expr(c);
        assert_eq!(node.ty, ValueType::I32);
        assert!(matches!(
            node.kind,
            NodeKind::Const {
                value: Literal::I32(42)
            }
        ));
    }

    #[test]
    fn test_chunk_growth_keeps_handles_valid() {
        let mut arena = Arena::with_chunk_capacity(2);
        let first = arena.alloc_const(Literal::I32(0));
        let mut rest = Vec::new();
        for i in 1..7 {
            rest.push(arena.alloc_const(Literal::I32(i)));
        }
        assert_eq!(arena.len(), 7);
        // handles issued before the growth still resolve
        assert!(matches!(
            arena.expr(first).kind,
            NodeKind::Const {
                value: Literal::I32(0)
            }
        ));
        for (i, r) in rest.iter().enumerate() {
            let expected = i as i32 + 1;
            match &arena.expr(*r).kind {
                NodeKind::Const {
                    value: Literal::I32(v),
                } => assert_eq!(*v, expected),
                other => panic!("expected a const, found {:?}", other),
            }
        }
    }

    #[test]
    #[should_panic(expected = "arena capacity violation")]
    fn test_zero_chunk_capacity_is_fatal() {
        Arena::with_chunk_capacity(0);
    }

    #[test]
    fn test_zero_chunk_capacity_typed_error() {
        assert!(matches!(
            Arena::try_with_chunk_capacity(0),
            Err(IrError::Capacity(_))
        ));
    }

    #[test]
    #[should_panic(expected = "different arena")]
    fn test_foreign_handle_is_rejected() {
        let mut a = Arena::new();
        let mut b = Arena::new();
        let r = a.alloc_nop();
        b.alloc_nop();
        b.expr(r);
    }

    #[test]
    fn test_in_place_mutation() {
        let mut arena = Arena::new();
        let c = arena.alloc_const(Literal::I32(1));
        if let NodeKind::Const { value } = &mut arena.expr_mut(c).kind {
            *value = Literal::I32(2);
        }
        assert!(matches!(
            arena.expr(c).kind,
            NodeKind::Const {
                value: Literal::I32(2)
            }
        ));
    }

    #[test]
    fn test_computed_output_types() {
        let mut arena = Arena::new();
        let one = arena.alloc_const(Literal::F64(1.5));
        let two = arena.alloc_const(Literal::F64(2.5));

        let neg = arena.alloc_unary(UnaryOp::Neg, one);
        assert_eq!(arena.expr(neg).ty, ValueType::F64);

        let max = arena.alloc_binary(BinaryOp::Max, one, two);
        assert_eq!(arena.expr(max).ty, ValueType::F64);

        let cmp = arena.alloc_compare(RelationalOp::Lt, one, two);
        assert_eq!(arena.expr(cmp).ty, ValueType::I32);
        assert!(matches!(
            arena.expr(cmp).kind,
            NodeKind::Compare {
                input_ty: ValueType::F64,
                ..
            }
        ));

        let set = arena.alloc_set_local(Name::new("x"), one);
        assert_eq!(arena.expr(set).ty, ValueType::F64);
    }

    #[test]
    fn test_load_type_inference() {
        let mut arena = Arena::new();
        let addr = arena.alloc_const(Literal::I32(0));
        let narrow = arena.alloc_load(1, true, false, 0, 1, addr);
        assert_eq!(arena.expr(narrow).ty, ValueType::I32);
        let wide = arena.alloc_load(8, false, true, 0, 8, addr);
        assert_eq!(arena.expr(wide).ty, ValueType::F64);
    }

    #[test]
    fn test_call_indirect_takes_signature_result() {
        let mut arena = Arena::new();
        let sig = arena.alloc_signature(FunctionType::new(
            Name::new("ii"),
            ValueType::I64,
            vec![ValueType::I32],
        ));
        let index = arena.alloc_const(Literal::I32(0));
        let operand = arena.alloc_const(Literal::I32(7));
        let call = arena.alloc_call_indirect(sig, index, vec![operand]);
        assert_eq!(arena.expr(call).ty, ValueType::I64);
    }
}
