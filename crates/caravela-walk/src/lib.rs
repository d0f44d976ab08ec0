//! caravela-walk - generic tree rewriting for the Caravela IR
//!
//! The single traversal mechanism every transformation is built on. A
//! [`Walker`] has one hook per node variant; each hook receives a node
//! whose children have already been rewritten and returns the handle that
//! must occupy the node's slot afterward: the same handle to keep it, a
//! different one to replace it. All hooks default to the identity, so a
//! transformation overrides only the variants it cares about.
//!
//! Traversal is children-first (post-order): the driver rewrites every
//! child slot with the child's walk result before the parent's hook runs,
//! and it is always the driver, never a node, that writes replacement
//! handles into parent slots. Replacement subtrees must come from the same
//! arena the tree was built from.

use caravela_ir::{Arena, ExprRef, FuncRef, NodeKind};

/// A tree transformation over arena-owned expressions.
///
/// Implementors override the hooks for the variants they rewrite; the
/// provided [`walk`](Walker::walk) drives the traversal. Dispatch is one
/// exhaustive match over the closed taxonomy, so an unhandled node shape
/// cannot exist.
pub trait Walker {
    fn visit_nop(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_block(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_if(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_loop(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_label(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_break(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_switch(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_call(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_call_import(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_call_indirect(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_get_local(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_set_local(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_load(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_store(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_const(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_unary(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_binary(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_compare(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_convert(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }
    fn visit_host(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
        expr
    }

    /// Walks an optional child; an absent child passes through unchanged.
    fn walk_opt(&mut self, arena: &mut Arena, child: Option<ExprRef>) -> Option<ExprRef> {
        child.map(|c| self.walk(arena, c))
    }

    /// Rewrites the subtree at `expr`, children first, and returns the
    /// handle that must take its place.
    fn walk(&mut self, arena: &mut Arena, expr: ExprRef) -> ExprRef {
        // Take the variant out so children can be walked against the same
        // arena, then restore it before the hook observes the node.
        let kind = std::mem::replace(&mut arena.expr_mut(expr).kind, NodeKind::Nop);
        match kind {
            NodeKind::Nop => {
                arena.expr_mut(expr).kind = NodeKind::Nop;
                self.visit_nop(arena, expr)
            }
            NodeKind::Block { label, mut items } => {
                for slot in items.iter_mut() {
                    *slot = self.walk(arena, *slot);
                }
                arena.expr_mut(expr).kind = NodeKind::Block { label, items };
                self.visit_block(arena, expr)
            }
            NodeKind::If {
                mut condition,
                mut if_true,
                if_false,
            } => {
                condition = self.walk(arena, condition);
                if_true = self.walk(arena, if_true);
                let if_false = self.walk_opt(arena, if_false);
                arena.expr_mut(expr).kind = NodeKind::If {
                    condition,
                    if_true,
                    if_false,
                };
                self.visit_if(arena, expr)
            }
            NodeKind::Loop {
                outer,
                inner,
                mut body,
            } => {
                body = self.walk(arena, body);
                arena.expr_mut(expr).kind = NodeKind::Loop { outer, inner, body };
                self.visit_loop(arena, expr)
            }
            NodeKind::Label { name } => {
                arena.expr_mut(expr).kind = NodeKind::Label { name };
                self.visit_label(arena, expr)
            }
            NodeKind::Break {
                label,
                condition,
                value,
            } => {
                let condition = self.walk_opt(arena, condition);
                let value = self.walk_opt(arena, value);
                arena.expr_mut(expr).kind = NodeKind::Break {
                    label,
                    condition,
                    value,
                };
                self.visit_break(arena, expr)
            }
            NodeKind::Switch {
                label,
                mut scrutinee,
                mut cases,
                default,
            } => {
                scrutinee = self.walk(arena, scrutinee);
                for case in cases.iter_mut() {
                    case.body = self.walk_opt(arena, case.body);
                }
                let default = self.walk_opt(arena, default);
                arena.expr_mut(expr).kind = NodeKind::Switch {
                    label,
                    scrutinee,
                    cases,
                    default,
                };
                self.visit_switch(arena, expr)
            }
            NodeKind::Call {
                target,
                mut operands,
            } => {
                for slot in operands.iter_mut() {
                    *slot = self.walk(arena, *slot);
                }
                arena.expr_mut(expr).kind = NodeKind::Call { target, operands };
                self.visit_call(arena, expr)
            }
            NodeKind::CallImport {
                target,
                mut operands,
            } => {
                for slot in operands.iter_mut() {
                    *slot = self.walk(arena, *slot);
                }
                arena.expr_mut(expr).kind = NodeKind::CallImport { target, operands };
                self.visit_call_import(arena, expr)
            }
            NodeKind::CallIndirect {
                signature,
                mut target,
                mut operands,
            } => {
                target = self.walk(arena, target);
                for slot in operands.iter_mut() {
                    *slot = self.walk(arena, *slot);
                }
                arena.expr_mut(expr).kind = NodeKind::CallIndirect {
                    signature,
                    target,
                    operands,
                };
                self.visit_call_indirect(arena, expr)
            }
            NodeKind::GetLocal { id } => {
                arena.expr_mut(expr).kind = NodeKind::GetLocal { id };
                self.visit_get_local(arena, expr)
            }
            NodeKind::SetLocal { id, mut value } => {
                value = self.walk(arena, value);
                arena.expr_mut(expr).kind = NodeKind::SetLocal { id, value };
                self.visit_set_local(arena, expr)
            }
            NodeKind::Load {
                bytes,
                signed,
                float,
                offset,
                align,
                mut ptr,
            } => {
                ptr = self.walk(arena, ptr);
                arena.expr_mut(expr).kind = NodeKind::Load {
                    bytes,
                    signed,
                    float,
                    offset,
                    align,
                    ptr,
                };
                self.visit_load(arena, expr)
            }
            NodeKind::Store {
                bytes,
                float,
                offset,
                align,
                mut ptr,
                mut value,
            } => {
                ptr = self.walk(arena, ptr);
                value = self.walk(arena, value);
                arena.expr_mut(expr).kind = NodeKind::Store {
                    bytes,
                    float,
                    offset,
                    align,
                    ptr,
                    value,
                };
                self.visit_store(arena, expr)
            }
            NodeKind::Const { value } => {
                arena.expr_mut(expr).kind = NodeKind::Const { value };
                self.visit_const(arena, expr)
            }
            NodeKind::Unary { op, mut value } => {
                value = self.walk(arena, value);
                arena.expr_mut(expr).kind = NodeKind::Unary { op, value };
                self.visit_unary(arena, expr)
            }
            NodeKind::Binary {
                op,
                mut left,
                mut right,
            } => {
                left = self.walk(arena, left);
                right = self.walk(arena, right);
                arena.expr_mut(expr).kind = NodeKind::Binary { op, left, right };
                self.visit_binary(arena, expr)
            }
            NodeKind::Compare {
                op,
                input_ty,
                mut left,
                mut right,
            } => {
                left = self.walk(arena, left);
                right = self.walk(arena, right);
                arena.expr_mut(expr).kind = NodeKind::Compare {
                    op,
                    input_ty,
                    left,
                    right,
                };
                self.visit_compare(arena, expr)
            }
            NodeKind::Convert { op, mut value } => {
                value = self.walk(arena, value);
                arena.expr_mut(expr).kind = NodeKind::Convert { op, value };
                self.visit_convert(arena, expr)
            }
            NodeKind::Host { op, mut operands } => {
                for slot in operands.iter_mut() {
                    *slot = self.walk(arena, *slot);
                }
                arena.expr_mut(expr).kind = NodeKind::Host { op, operands };
                self.visit_host(arena, expr)
            }
        }
    }

    /// Rewrites a function's body and stores the result back.
    fn start_walk(&mut self, arena: &mut Arena, func: FuncRef) {
        tracing::debug!(
            function = %arena.function(func).name,
            "rewriting function body"
        );
        let body = arena.function(func).body;
        let body = self.walk(arena, body);
        arena.function_mut(func).body = body;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caravela_ir::{Function, Literal, Name, NodeKind, UnaryOp, ValueType};

    /// Records the order hooks fire in.
    #[derive(Default)]
    struct OrderWalker {
        events: Vec<String>,
    }

    impl Walker for OrderWalker {
        fn visit_const(&mut self, arena: &mut Arena, expr: ExprRef) -> ExprRef {
            if let NodeKind::Const { value } = &arena.expr(expr).kind {
                self.events.push(format!("const {}", value));
            }
            expr
        }

        fn visit_unary(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
            self.events.push("unary".to_string());
            expr
        }

        fn visit_binary(&mut self, _arena: &mut Arena, expr: ExprRef) -> ExprRef {
            self.events.push("binary".to_string());
            expr
        }
    }

    #[test]
    fn test_children_first_order() {
        let mut arena = Arena::new();
        let one = arena.alloc_const(Literal::I32(1));
        let two = arena.alloc_const(Literal::I32(2));
        let neg = arena.alloc_unary(UnaryOp::Neg, two);
        let root = arena.alloc_binary(caravela_ir::BinaryOp::Add, one, neg);

        let mut walker = OrderWalker::default();
        let result = walker.walk(&mut arena, root);

        assert_eq!(result, root);
        assert_eq!(walker.events, ["const 1", "const 2", "unary", "binary"]);
    }

    /// Leaves every hook at the default.
    struct IdentityWalker;
    impl Walker for IdentityWalker {}

    #[test]
    fn test_identity_walk_leaves_tree_unchanged() {
        let mut arena = Arena::new();
        let cond = arena.alloc_const(Literal::I32(1));
        let then = arena.alloc_nop();
        let root = arena.alloc_if(cond, then, None);

        let before = format!("{:?}", arena.expr(root));
        let result = IdentityWalker.walk(&mut arena, root);
        assert_eq!(result, root);
        assert_eq!(format!("{:?}", arena.expr(root)), before);
    }

    /// Increments every integer constant in place.
    struct IncrementConsts;
    impl Walker for IncrementConsts {
        fn visit_const(&mut self, arena: &mut Arena, expr: ExprRef) -> ExprRef {
            if let NodeKind::Const {
                value: Literal::I32(v),
            } = &mut arena.expr_mut(expr).kind
            {
                *v += 1;
            }
            expr
        }
    }

    #[test]
    fn test_const_hook_rewrites_in_place() {
        let mut arena = Arena::new();
        let a = arena.alloc_const(Literal::I32(10));
        let b = arena.alloc_const(Literal::I32(20));
        let root = arena.alloc_binary(caravela_ir::BinaryOp::Sub, a, b);

        IncrementConsts.walk(&mut arena, root);

        assert!(matches!(
            arena.expr(a).kind,
            NodeKind::Const {
                value: Literal::I32(11)
            }
        ));
        assert!(matches!(
            arena.expr(b).kind,
            NodeKind::Const {
                value: Literal::I32(21)
            }
        ));
        // the parent keeps its shape and its slots
        assert!(matches!(
            arena.expr(root).kind,
            NodeKind::Binary { left, right, .. } if left == a && right == b
        ));
    }

    /// Replaces every nop with `(i32.const 7)`, allocating from the same
    /// arena.
    struct NopToConst;
    impl Walker for NopToConst {
        fn visit_nop(&mut self, arena: &mut Arena, _expr: ExprRef) -> ExprRef {
            arena.alloc_const(Literal::I32(7))
        }
    }

    #[test]
    fn test_driver_writes_replacement_into_parent_slot() {
        let mut arena = Arena::new();
        let nop = arena.alloc_nop();
        let root = arena.alloc_block(None, vec![nop]);

        let result = NopToConst.walk(&mut arena, root);
        assert_eq!(result, root);

        match &arena.expr(root).kind {
            NodeKind::Block { items, .. } => {
                assert_eq!(items.len(), 1);
                assert_ne!(items[0], nop);
                assert!(matches!(
                    arena.expr(items[0]).kind,
                    NodeKind::Const {
                        value: Literal::I32(7)
                    }
                ));
            }
            other => panic!("expected a block, found {:?}", other),
        }
    }

    #[test]
    fn test_start_walk_replaces_function_body() {
        let mut arena = Arena::new();
        let body = arena.alloc_nop();
        let func = arena.alloc_function(Function::new(Name::new("f"), ValueType::None, body));

        NopToConst.start_walk(&mut arena, func);

        let new_body = arena.function(func).body;
        assert_ne!(new_body, body);
        assert!(matches!(
            arena.expr(new_body).kind,
            NodeKind::Const {
                value: Literal::I32(7)
            }
        ));
    }

    #[test]
    fn test_absent_children_pass_through() {
        let mut arena = Arena::new();
        let brk = arena.alloc_break(Name::new("out"), None, None);
        let result = IdentityWalker.walk(&mut arena, brk);
        assert_eq!(result, brk);
        assert!(matches!(
            arena.expr(brk).kind,
            NodeKind::Break {
                condition: None,
                value: None,
                ..
            }
        ));
    }
}
