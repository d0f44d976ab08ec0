//! Integration tests for the Caravela IR toolkit
//!
//! This crate provides end-to-end coverage of the build → walk → print
//! pipeline: a hand-built module goes through rewriting walkers and the
//! canonical printer, and the output is checked for stability.

use caravela_ir::{
    Arena, BinaryOp, Export, Function, FunctionType, Import, Literal, Module, Name, RelationalOp,
    ValueType,
};
use caravela_print::{PrintConfig, Printer};

/// A module together with the arena that owns its tree.
pub struct BuiltModule {
    pub arena: Arena,
    pub module: Module,
}

/// Builds a module with one import, one export and one function whose body
/// exercises the block, if, loop, local, memory, const, binary and compare
/// forms.
pub fn sample_module() -> BuiltModule {
    let mut arena = Arena::new();
    let mut module = Module::new();

    module.add_import(Import::new(
        Name::new("print"),
        Name::new("env"),
        Name::new("print"),
        FunctionType::new(Name::new("print_t"), ValueType::None, vec![ValueType::I32]),
    ));
    module.add_export(Export::new(Name::new("main"), Name::new("main")));

    // (if (i32.lt_s (get_local $p) (i32.const 10))
    //     (set_local $t (i32.add (get_local $p) (i32.const 1))))
    let p = arena.alloc_get_local(Name::new("p"), ValueType::I32);
    let ten = arena.alloc_const(Literal::I32(10));
    let cond = arena.alloc_compare(RelationalOp::LtS, p, ten);
    let p_again = arena.alloc_get_local(Name::new("p"), ValueType::I32);
    let one = arena.alloc_const(Literal::I32(1));
    let sum = arena.alloc_binary(BinaryOp::Add, p_again, one);
    let assign = arena.alloc_set_local(Name::new("t"), sum);
    let branch = arena.alloc_if(cond, assign, None);

    // (loop $exit $cont (i32.store align=4 (i32.const 0) (get_local $t)))
    let addr = arena.alloc_const(Literal::I32(0));
    let t = arena.alloc_get_local(Name::new("t"), ValueType::I32);
    let store = arena.alloc_store(4, false, 0, 4, addr, t);
    let looped = arena.alloc_loop(Some(Name::new("exit")), Some(Name::new("cont")), store);

    // (i32.load8_u align=1 (i32.const 0))
    let addr_again = arena.alloc_const(Literal::I32(0));
    let reload = arena.alloc_load(1, false, false, 0, 1, addr_again);

    let body = arena.alloc_block(Some(Name::new("top")), vec![branch, looped, reload]);

    let mut function = Function::new(Name::new("main"), ValueType::I32, body);
    function.add_param(Name::new("p"), ValueType::I32);
    function.add_local(Name::new("t"), ValueType::I32);
    let func = arena.alloc_function(function);
    module.add_function(func);

    BuiltModule { arena, module }
}

/// Prints a module without the color channel.
pub fn print_plain(built: &BuiltModule) -> String {
    Printer::new(&built.arena).module_to_string(&built.module)
}

/// Prints a module with the color channel on.
pub fn print_colored(built: &BuiltModule) -> String {
    Printer::with_config(
        &built.arena,
        PrintConfig {
            colors: true,
            indent: 2,
        },
    )
    .module_to_string(&built.module)
}

/// Removes every ANSI escape sequence.
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for esc in chars.by_ref() {
                if esc == 'm' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use caravela_ir::{ExprRef, NodeKind};
    use caravela_walk::Walker;

    struct Identity;
    impl Walker for Identity {}

    /// Adds one to every i32 constant, in place.
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
    fn test_printing_twice_yields_identical_output() {
        let built = sample_module();
        let first = print_plain(&built);
        let second = print_plain(&built);
        assert_eq!(first, second);
    }

    #[test]
    fn test_module_sections_in_canonical_order() {
        let built = sample_module();
        let text = print_plain(&built);
        assert!(text.starts_with("(module\n  (memory 16777216)\n"));
        assert!(text.ends_with(")\n"));
        let export_at = text.find("(export \"main\" $main)").unwrap();
        let func_at = text.find("(func $main").unwrap();
        assert!(export_at < func_at);
        // the empty table is suppressed, and imports are never re-emitted
        assert!(!text.contains("(table"));
        assert!(!text.contains("import"));
    }

    #[test]
    fn test_body_exercises_expected_forms() {
        let built = sample_module();
        let text = print_plain(&built);
        for needle in [
            "(block $top",
            "(if",
            "(loop $exit $cont",
            "(get_local $p)",
            "(set_local $t",
            "(i32.load8_u align=1",
            "(i32.store align=4",
            "(i32.const 10)",
            "(i32.add",
            "(i32.lt_s",
        ] {
            assert!(text.contains(needle), "missing {:?} in:\n{}", needle, text);
        }
    }

    #[test]
    fn test_identity_walk_preserves_printed_form() {
        let mut built = sample_module();
        let before = print_plain(&built);
        let funcs: Vec<_> = built.module.functions.clone();
        for func in funcs {
            Identity.start_walk(&mut built.arena, func);
        }
        let after = print_plain(&built);
        assert_eq!(before, after);
    }

    #[test]
    fn test_const_rewrite_changes_only_literals() {
        let mut built = sample_module();
        let before = print_plain(&built);
        let funcs: Vec<_> = built.module.functions.clone();
        for func in funcs {
            IncrementConsts.start_walk(&mut built.arena, func);
        }
        let after = print_plain(&built);

        assert_ne!(before, after);
        assert!(after.contains("(i32.const 11)"));
        assert!(after.contains("(i32.const 2)"));
        assert!(after.contains("(i32.const 1)")); // was 0

        // every non-const line is untouched, so the shape is identical
        assert_eq!(before.lines().count(), after.lines().count());
        for (old, new) in before.lines().zip(after.lines()) {
            if old.contains(".const") {
                continue;
            }
            assert_eq!(old, new);
        }
    }

    #[test]
    fn test_color_output_strips_to_plain_grammar() {
        let built = sample_module();
        let plain = print_plain(&built);
        let colored = print_colored(&built);
        assert_ne!(plain, colored);
        assert_eq!(strip_ansi(&colored), plain);
    }

    #[test]
    fn test_rewrite_then_print_stays_arena_owned() {
        // a walker that allocates replacements still prints cleanly,
        // because replacements come from the same arena
        struct NopOutStores;
        impl Walker for NopOutStores {
            fn visit_store(&mut self, arena: &mut Arena, _expr: ExprRef) -> ExprRef {
                arena.alloc_nop()
            }
        }

        let mut built = sample_module();
        let funcs: Vec<_> = built.module.functions.clone();
        for func in funcs {
            NopOutStores.start_walk(&mut built.arena, func);
        }
        let text = print_plain(&built);
        assert!(!text.contains("store"));
        assert!(text.contains("(loop $exit $cont\n        (nop)\n      )"));
    }
}
