use super::Analyzer;
use crate::parser::ast::{AstKind, AstNode, FoldedValue, TYPE_ANY};
use crate::parser::parse;
use crate::reporter::{CompilerError, SemanticError};

/// 通用的准备函数：词法与语法分析必须完全正确，否则 panic。
fn setup(source: &str) -> AstNode {
    let (ast, errors) = parse(source);
    assert!(
        errors.is_empty(),
        "Test setup failed (parsing errors) for {:?}: {:?}",
        source,
        errors
    );
    ast
}

/// 辅助函数：用于测试应该通过分析的代码。
/// 分析失败会 panic；成功则返回标注后的 AST 和分析器本身，
/// 供测试检查符号表。
fn analyze_ok(source: &str) -> (AstNode, Analyzer) {
    let mut ast = setup(source);
    let mut analyzer = Analyzer::new();
    let result = analyzer.analyze(&mut ast);

    let errors = analyzer.take_errors();
    assert!(
        result && errors.is_empty(),
        "Analysis failed unexpectedly for {:?}: {:?}",
        source,
        errors
    );

    (ast, analyzer)
}

/// 辅助函数：用于测试应该产生语义错误的代码。
fn analyze_err(source: &str) -> Vec<CompilerError> {
    let mut ast = setup(source);
    let mut analyzer = Analyzer::new();
    let result = analyzer.analyze(&mut ast);

    let errors = analyzer.take_errors();
    assert!(
        !result && !errors.is_empty(),
        "Analysis succeeded unexpectedly for source:\n{}",
        source
    );

    errors
}

/// 沿 Program 的 cons 链取出第 index 条语句。
fn statement(program: &AstNode, index: usize) -> &AstNode {
    let mut node = program;
    for _ in 0..index {
        node = node.right.as_deref().expect("program chain ended early");
    }
    node.left.as_deref().expect("expected a statement")
}

mod declarations {
    use super::*;

    #[test]
    fn test_constant_declaration_records_an_initialized_symbol() {
        let (_ast, analyzer) = analyze_ok("let quizGrade: Int = 100\n");

        let symbol = analyzer
            .symbol_table()
            .lookup("quizGrade")
            .expect("symbol should exist");

        assert_eq!(symbol.type_name, "Int");
        assert!(symbol.has_initialized);
        assert!(!symbol.is_mutable);
        assert_eq!(symbol.value, Some(FoldedValue::Int(100)));
        assert_eq!(symbol.namespace, 0);
    }

    #[test]
    fn test_var_declaration_is_mutable() {
        let (_ast, analyzer) = analyze_ok("var counter: Int\n");

        let symbol = analyzer.symbol_table().lookup("counter").unwrap();
        assert!(symbol.is_mutable);
        assert!(!symbol.has_initialized);
    }

    #[test]
    fn test_redeclaration_in_the_same_namespace_is_rejected() {
        let errors = analyze_err("var a: Int\nvar a: Int\n");

        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            CompilerError::Semantic(SemanticError::RedeclaredSymbol { name, .. }) if name == "a"
        ));
    }

    #[test]
    fn test_shadowing_in_an_inner_namespace_is_allowed() {
        let source = "var x: Int = 1\nif x < 2 {\nvar x: Bool = true\n}\n";
        let (_ast, analyzer) = analyze_ok(source);

        // 内层的 x 随着作用域一起弹出，外层的 x 仍然是 Int
        let symbol = analyzer.symbol_table().lookup("x").unwrap();
        assert_eq!(symbol.type_name, "Int");
    }
}

mod assignments {
    use super::*;

    #[test]
    fn test_reassigning_a_variable_is_allowed() {
        let (_ast, analyzer) = analyze_ok("var n: Int = 1\nn = 2\n");

        let symbol = analyzer.symbol_table().lookup("n").unwrap();
        assert!(symbol.has_initialized);
    }

    #[test]
    fn test_reassigning_an_initialized_constant_is_rejected() {
        let errors = analyze_err("let x: Int = 1\nx = 2\n");

        assert_eq!(errors.len(), 1);
        if let CompilerError::Semantic(SemanticError::ImmutableModification { name, location, .. }) =
            &errors[0]
        {
            assert_eq!(name, "x");
            // 错误钉在第二次出现 x 的位置上
            assert_eq!(location.line, 2);
            assert_eq!(location.column, 1);
        } else {
            panic!("Expected ImmutableModification, got: {:?}", errors[0]);
        }
    }

    #[test]
    fn test_assigning_to_an_undeclared_symbol_is_rejected() {
        let errors = analyze_err("x = 2\n");

        assert!(matches!(
            &errors[0],
            CompilerError::Semantic(SemanticError::UndeclaredSymbol { name, .. }) if name == "x"
        ));
    }

    #[test]
    fn test_type_mismatch_leaves_the_symbol_uninitialized() {
        let mut ast = setup("var y: Int = 3.14\n");
        let mut analyzer = Analyzer::new();

        assert!(!analyzer.analyze(&mut ast));
        let errors = analyzer.take_errors();
        assert!(matches!(
            &errors[0],
            CompilerError::Semantic(SemanticError::OperationTypeMismatch { .. })
        ));

        // 符号已经声明，但错误使它保持未初始化
        let symbol = analyzer.symbol_table().lookup("y").unwrap();
        assert!(!symbol.has_initialized);
        assert_eq!(symbol.value, None);
    }

    #[test]
    fn test_foldable_right_hand_side_propagates_into_the_symbol() {
        let (_ast, analyzer) = analyze_ok("let three: Int = 1 + 2\n");

        let symbol = analyzer.symbol_table().lookup("three").unwrap();
        assert_eq!(symbol.value, Some(FoldedValue::Int(3)));
    }
}

mod expressions {
    use super::*;

    /// 取出 `let r: T = <expression>` 里右侧表达式的节点。
    fn initializer(ast: &AstNode) -> &AstNode {
        statement(ast, 0)
            .right
            .as_deref()
            .expect("expected an initializer")
    }

    #[test]
    fn test_precedence_folds_to_seven() {
        let source = "func seven() -> Int {\nreturn 1 + 2 * 3\n}\n";
        let (ast, _analyzer) = analyze_ok(source);

        let body = statement(&ast, 0).right.as_deref().unwrap();
        let value = body
            .left
            .as_deref()
            .unwrap()
            .left
            .as_deref()
            .expect("return should carry an expression");

        assert_eq!(value.inferred_type, "Int");
        assert!(value.is_foldable);
        assert_eq!(value.value, Some(FoldedValue::Int(7)));
    }

    #[test]
    fn test_float_contagion_is_commutative() {
        let (ast, _) = analyze_ok("let a: Float = 1 + 2.0\n");
        assert_eq!(initializer(&ast).inferred_type, "Float");

        let (ast, _) = analyze_ok("let b: Float = 2.0 + 1\n");
        assert_eq!(initializer(&ast).inferred_type, "Float");
    }

    #[test]
    fn test_logical_operators_fold_to_bool() {
        let (ast, _) = analyze_ok("let t: Bool = true && false\n");

        let value = initializer(&ast);
        assert_eq!(value.inferred_type, "Bool");
        assert_eq!(value.value, Some(FoldedValue::Bool(false)));
    }

    #[test]
    fn test_relational_operators_accept_mixed_numerics() {
        let (ast, _) = analyze_ok("let r: Bool = 1 < 2.0\n");

        let value = initializer(&ast);
        assert_eq!(value.inferred_type, "Bool");
        assert_eq!(value.value, Some(FoldedValue::Bool(true)));
    }

    #[test]
    fn test_equality_requires_identical_types() {
        let errors = analyze_err("let e: Bool = 1 == true\n");

        assert!(matches!(
            &errors[0],
            CompilerError::Semantic(SemanticError::OperationTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_arithmetic_rejects_boolean_operands() {
        let errors = analyze_err("let n: Int = 2 + true\n");

        assert!(matches!(
            &errors[0],
            CompilerError::Semantic(SemanticError::OperationTypeMismatch { operator, .. })
                if operator == "+"
        ));
    }

    #[test]
    fn test_prefix_not_requires_bool() {
        let errors = analyze_err("let n: Bool = !1\n");

        assert!(matches!(
            &errors[0],
            CompilerError::Semantic(SemanticError::OperationTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_unary_minus_preserves_the_operand_type() {
        let (ast, _) = analyze_ok("let f: Float = -(1.5)\n");

        let value = initializer(&ast);
        assert_eq!(value.inferred_type, "Float");
        assert_eq!(value.value, Some(FoldedValue::Float(-1.5)));
    }

    #[test]
    fn test_factorial_folds_iteratively() {
        let (ast, _) = analyze_ok("let f: Int = 5!\n");

        let value = initializer(&ast);
        assert_eq!(value.inferred_type, "Int");
        assert_eq!(value.value, Some(FoldedValue::Int(120)));
    }

    #[test]
    fn test_factorial_of_a_negative_constant_does_not_fold() {
        let (_ast, analyzer) = analyze_ok("let n: Int = -1\nlet g: Int = n!\n");

        // 折叠失败不是错误：g 正常初始化，只是没有编译期值
        let symbol = analyzer.symbol_table().lookup("g").unwrap();
        assert!(symbol.has_initialized);
        assert_eq!(symbol.value, None);
    }

    #[test]
    fn test_division_by_zero_is_a_silent_fold_failure() {
        let (ast, analyzer) = analyze_ok("let d: Int = 1 / 0\n");

        let value = initializer(&ast);
        assert_eq!(value.inferred_type, "Int");
        assert!(!value.is_foldable);
        assert_eq!(value.value, None);

        let symbol = analyzer.symbol_table().lookup("d").unwrap();
        assert!(symbol.has_initialized);
    }

    #[test]
    fn test_integer_overflow_refuses_to_fold_without_a_diagnostic() {
        let (ast, _) = analyze_ok("let o: Int = 9223372036854775807 + 1\n");
        assert!(!initializer(&ast).is_foldable);
    }

    #[test]
    fn test_constant_propagation_through_an_identifier() {
        let (_ast, analyzer) = analyze_ok("let base: Int = 10\nlet doubled: Int = base * 2\n");

        let symbol = analyzer.symbol_table().lookup("doubled").unwrap();
        assert_eq!(symbol.value, Some(FoldedValue::Int(20)));
    }

    #[test]
    fn test_mutable_variables_do_not_participate_in_folding() {
        let (_ast, analyzer) = analyze_ok("var base: Int = 10\nlet copy: Int = base * 2\n");

        let symbol = analyzer.symbol_table().lookup("copy").unwrap();
        assert_eq!(symbol.value, None);
    }

    #[test]
    fn test_string_literals_type_but_never_fold() {
        let (ast, _) = analyze_ok("let s: String = \"Hello Opus\"\n");

        let value = initializer(&ast);
        assert_eq!(value.inferred_type, "String");
        assert!(!value.is_foldable);
    }
}

mod statements {
    use super::*;

    #[test]
    fn test_condition_must_be_bool() {
        let errors = analyze_err("if 1 { }\n");

        assert!(matches!(
            &errors[0],
            CompilerError::Semantic(SemanticError::InvalidCondition { found, .. }) if found == "Int"
        ));
    }

    #[test]
    fn test_non_foldable_conditions_analyze_both_branches() {
        // 两个分支各自的错误都要浮出来
        let source = "var flag: Bool = true\nflag = false\nif flag { y = 1 } else { z = 1 }\n";
        let mut ast = setup(source);
        let mut analyzer = Analyzer::new();

        assert!(!analyzer.analyze(&mut ast));
        assert_eq!(analyzer.take_errors().len(), 2);
    }

    #[test]
    fn test_dead_else_branch_is_not_analyzed() {
        let source = "if true { var a: Int = 1 } else { var a: Int = 2 }\n";
        let (ast, analyzer) = analyze_ok(source);

        // else 分支仍然在树上，但没有被语义分析染指
        let body = statement(&ast, 0).right.as_deref().unwrap();
        let dead_block = body.right.as_deref().unwrap();
        let dead_assignment = dead_block.left.as_deref().unwrap();
        assert_eq!(dead_assignment.kind, AstKind::Assignment);
        assert_eq!(dead_assignment.inferred_type, TYPE_ANY);
        assert_eq!(
            dead_assignment.right.as_deref().unwrap().inferred_type,
            TYPE_ANY
        );

        // 分支作用域弹出后，符号表里不残留 a
        assert!(analyzer.symbol_table().lookup("a").is_none());
        assert!(analyzer.symbol_table().is_empty());
    }

    #[test]
    fn test_false_condition_analyzes_only_the_else_branch() {
        // if 分支里的错误是死代码，不应该被报告
        let source = "if false { x = 1 } else { var b: Int = 2 }\n";
        let (_ast, analyzer) = analyze_ok(source);

        assert!(analyzer.symbol_table().lookup("b").is_none());
    }

    #[test]
    fn test_block_scopes_pop_their_symbols() {
        // 条件是一次函数调用，不可折叠，所以分支真正被分析
        let source = "func ready() -> Bool\nif ready() { var inner: Int = 1 }\n";
        let (_ast, analyzer) = analyze_ok(source);

        assert!(analyzer.symbol_table().lookup("inner").is_none());
        assert!(analyzer.symbol_table().lookup("ready").is_some());
    }

    #[test]
    fn test_repeat_until_condition_must_be_bool() {
        let errors = analyze_err("repeat { } until 1\n");

        assert!(matches!(
            &errors[0],
            CompilerError::Semantic(SemanticError::InvalidCondition { .. })
        ));
    }

    #[test]
    fn test_repeat_until_body_is_analyzed() {
        let (_ast, analyzer) = analyze_ok("var done: Bool = false\nrepeat {\ndone = true\n} until done\n");

        let symbol = analyzer.symbol_table().lookup("done").unwrap();
        assert!(symbol.has_initialized);
    }

    #[test]
    fn test_for_in_variable_takes_the_iterable_type_and_pops() {
        let source = "var total: Int = 0\nfor step in total {\ntotal = total + step\n}\n";
        let (_ast, analyzer) = analyze_ok(source);

        // 循环变量随着循环结束弹出
        assert!(analyzer.symbol_table().lookup("step").is_none());
    }

    #[test]
    fn test_for_in_variable_is_immutable() {
        let errors = analyze_err("var total: Int = 0\nfor step in total {\nstep = 1\n}\n");

        assert!(matches!(
            &errors[0],
            CompilerError::Semantic(SemanticError::ImmutableModification { name, .. }) if name == "step"
        ));
    }
}

mod functions {
    use super::*;

    #[test]
    fn test_function_definition_records_its_return_type() {
        let (_ast, analyzer) = analyze_ok("func greeting() -> String\n");

        let symbol = analyzer.symbol_table().lookup("greeting").unwrap();
        assert_eq!(symbol.type_name, "String");
        assert!(symbol.has_initialized);
        assert!(!symbol.is_mutable);
    }

    #[test]
    fn test_call_infers_the_declared_return_type() {
        let source = "func roll() -> Int\nvar value: Int = roll()\n";
        let (_ast, analyzer) = analyze_ok(source);

        // 调用不参与折叠，所以 value 没有编译期值
        let symbol = analyzer.symbol_table().lookup("value").unwrap();
        assert!(symbol.has_initialized);
        assert_eq!(symbol.value, None);
    }

    #[test]
    fn test_calling_an_undeclared_function_is_rejected() {
        let errors = analyze_err("var v: Int = missing()\n");

        assert!(matches!(
            &errors[0],
            CompilerError::Semantic(SemanticError::UndeclaredSymbol { name, .. }) if name == "missing"
        ));
    }

    #[test]
    fn test_parameters_are_visible_inside_the_body() {
        let source = "func double(number: Int) -> Int {\nreturn number * 2\n}\n";
        let (_ast, analyzer) = analyze_ok(source);

        // 形参随函数体作用域弹出
        assert!(analyzer.symbol_table().lookup("number").is_none());
    }

    #[test]
    fn test_argument_expressions_are_analyzed() {
        let source = "func shout(message: String) -> String\nshout(message: missing)\n";
        let errors = analyze_err(source);

        assert!(matches!(
            &errors[0],
            CompilerError::Semantic(SemanticError::UndeclaredSymbol { name, .. }) if name == "missing"
        ));
    }
}

mod properties {
    use super::*;

    #[test]
    fn test_analysis_is_idempotent() {
        let source = "let base: Int = 2\nlet area: Int = base * base\nif base < 3 {\nvar tmp: Int = base\n}\n";

        let mut ast = setup(source);
        let mut analyzer = Analyzer::new();
        assert!(analyzer.analyze(&mut ast));

        let annotated = ast.clone();

        // 在已经标注过的树上重新运行，标注必须保持不变
        let mut second = Analyzer::new();
        assert!(second.analyze(&mut ast));
        assert_eq!(ast, annotated);
    }

    #[test]
    fn test_every_analyzed_expression_has_a_type() {
        let (ast, _) = analyze_ok("let n: Int = (1 + 2) * 3!\n");

        fn assert_typed(node: &AstNode) {
            assert!(!node.inferred_type.is_empty());
            if let Some(left) = node.left.as_deref() {
                assert_typed(left);
            }
            if let Some(right) = node.right.as_deref() {
                assert_typed(right);
            }
        }

        assert_typed(&ast);
    }

    #[test]
    fn test_newlines_inside_parentheses_still_fold() {
        let (_ast, analyzer) = analyze_ok("var z: Int = (\n1\n+\n2\n)\n");

        let symbol = analyzer.symbol_table().lookup("z").unwrap();
        assert_eq!(symbol.value, Some(FoldedValue::Int(3)));
    }
}
