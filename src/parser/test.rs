use super::ast::{AstKind, AstNode};
use super::*; // 导入父模块（parser）的公共项，主要是 `parse` 函数
use crate::reporter::{CompilerError, ParserError};

/// 辅助函数，用于测试成功解析的场景。
/// 出现任何词法或语法错误都会 panic，否则返回根 Program 节点。
fn parse_source_ok(source: &str) -> AstNode {
    let (ast, errors) = parse(source);
    assert!(
        errors.is_empty(),
        "Parser failed unexpectedly for source {:?}: {:?}",
        source,
        errors
    );
    ast
}

/// 辅助函数，用于测试解析失败的场景，返回收集到的所有错误。
fn parse_source_fail(source: &str) -> Vec<CompilerError> {
    let (_ast, errors) = parse(source);
    assert!(
        !errors.is_empty(),
        "Parsing succeeded unexpectedly for source {:?}",
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

// --- 成功路径测试 (Happy Path) ---

#[test]
fn test_declaration_with_assignment() {
    let ast = parse_source_ok("let quizGrade: Int = 100\n");

    let assignment = statement(&ast, 0);
    assert_eq!(assignment.kind, AstKind::Assignment);

    let declaration = assignment.left.as_deref().unwrap();
    assert_eq!(declaration.kind, AstKind::ConstantDeclaration);
    assert_eq!(
        declaration.left.as_deref().unwrap().token.lexeme,
        "quizGrade"
    );
    assert_eq!(declaration.right.as_deref().unwrap().token.lexeme, "Int");

    let value = assignment.right.as_deref().unwrap();
    assert_eq!(value.kind, AstKind::Literal);
    assert_eq!(value.token.lexeme, "100");
}

#[test]
fn test_variable_declaration_without_initializer() {
    let ast = parse_source_ok("var number: Float\n");

    let declaration = statement(&ast, 0);
    assert_eq!(declaration.kind, AstKind::VariableDeclaration);
    assert_eq!(declaration.token.lexeme, "var");
}

#[test]
fn test_operator_precedence() {
    // 乘法应当比加法结合得更紧
    let ast = parse_source_ok("1 + 2 * 3\n");

    let addition = statement(&ast, 0);
    assert_eq!(addition.kind, AstKind::Binary);
    assert_eq!(addition.token.lexeme, "+");
    assert_eq!(addition.left.as_deref().unwrap().token.lexeme, "1");

    let multiplication = addition.right.as_deref().unwrap();
    assert_eq!(multiplication.kind, AstKind::Binary);
    assert_eq!(multiplication.token.lexeme, "*");
    assert_eq!(multiplication.left.as_deref().unwrap().token.lexeme, "2");
    assert_eq!(multiplication.right.as_deref().unwrap().token.lexeme, "3");
}

#[test]
fn test_statements_stay_in_source_order() {
    let ast = parse_source_ok("var a: Int\nvar b: Int\nvar c: Int\n");

    assert_eq!(
        statement(&ast, 0).left.as_deref().unwrap().token.lexeme,
        "a"
    );
    assert_eq!(
        statement(&ast, 1).left.as_deref().unwrap().token.lexeme,
        "b"
    );
    assert_eq!(
        statement(&ast, 2).left.as_deref().unwrap().token.lexeme,
        "c"
    );
}

#[test]
fn test_bare_assignment_statement() {
    let ast = parse_source_ok("x = 2\n");

    let assignment = statement(&ast, 0);
    assert_eq!(assignment.kind, AstKind::Assignment);
    assert_eq!(assignment.left.as_deref().unwrap().kind, AstKind::Identifier);
    assert_eq!(assignment.left.as_deref().unwrap().token.lexeme, "x");
}

#[test]
fn test_function_definition_without_body() {
    let ast = parse_source_ok("func greeting() -> String\n");

    let definition = statement(&ast, 0);
    assert_eq!(definition.kind, AstKind::FunctionDefinition);
    assert_eq!(definition.left.as_deref().unwrap().token.lexeme, "greeting");

    let signature = definition.right.as_deref().unwrap();
    assert_eq!(signature.kind, AstKind::FunctionSignature);

    // 空参数表就是一个没有孩子的 cons 链尾
    let parameters = signature.left.as_deref().unwrap();
    assert_eq!(parameters.kind, AstKind::ParameterList);
    assert!(parameters.is_terminal());
    assert_eq!(
        signature.right.as_deref().unwrap().kind,
        AstKind::FunctionReturnType
    );
    assert_eq!(signature.right.as_deref().unwrap().token.lexeme, "String");
}

#[test]
fn test_function_implementation_with_parameters() {
    let source = "func add(a: Int, b: Int) -> Int {\nreturn a + b\n}\n";
    let ast = parse_source_ok(source);

    let implementation = statement(&ast, 0);
    assert_eq!(implementation.kind, AstKind::FunctionImplementation);

    let definition = implementation.left.as_deref().unwrap();
    assert_eq!(definition.kind, AstKind::FunctionDefinition);

    // 形参表是右倾的 cons 链：每节的左孩子是一个形参
    let parameters = definition
        .right
        .as_deref()
        .unwrap()
        .left
        .as_deref()
        .unwrap();
    assert_eq!(parameters.kind, AstKind::ParameterList);

    let first = parameters.left.as_deref().unwrap();
    assert_eq!(first.kind, AstKind::Parameter);
    assert_eq!(first.left.as_deref().unwrap().token.lexeme, "a");
    assert_eq!(first.right.as_deref().unwrap().token.lexeme, "Int");

    let rest = parameters.right.as_deref().unwrap();
    let second = rest.left.as_deref().unwrap();
    assert_eq!(second.left.as_deref().unwrap().token.lexeme, "b");

    // 函数体里有一条 return 语句
    let body = implementation.right.as_deref().unwrap();
    assert_eq!(body.kind, AstKind::CodeBlock);
    assert_eq!(
        body.left.as_deref().unwrap().kind,
        AstKind::ReturnStatement
    );
}

#[test]
fn test_conditional_with_else() {
    let ast = parse_source_ok("if true { } else { }\n");

    let conditional = statement(&ast, 0);
    assert_eq!(conditional.kind, AstKind::ConditionalStatement);
    assert_eq!(
        conditional.left.as_deref().unwrap().kind,
        AstKind::BooleanLiteral
    );

    let body = conditional.right.as_deref().unwrap();
    assert_eq!(body.kind, AstKind::ConditionalBody);
    assert_eq!(body.left.as_deref().unwrap().kind, AstKind::CodeBlock);
    assert_eq!(body.right.as_deref().unwrap().kind, AstKind::CodeBlock);
}

#[test]
fn test_else_if_chain_nests_a_conditional() {
    let ast = parse_source_ok("if a { } else if b { } else { }\n");

    let conditional = statement(&ast, 0);
    let body = conditional.right.as_deref().unwrap();

    let nested = body.right.as_deref().unwrap();
    assert_eq!(nested.kind, AstKind::ConditionalStatement);
    assert_eq!(nested.left.as_deref().unwrap().token.lexeme, "b");

    let nested_body = nested.right.as_deref().unwrap();
    assert_eq!(nested_body.right.as_deref().unwrap().kind, AstKind::CodeBlock);
}

#[test]
fn test_delimiters_between_block_and_else_are_skipped() {
    let ast = parse_source_ok("if a { }\nelse { }\n");

    let conditional = statement(&ast, 0);
    let body = conditional.right.as_deref().unwrap();
    assert!(body.right.is_some());
}

#[test]
fn test_repeat_until_statement() {
    let ast = parse_source_ok("repeat {\nx = x + 1\n} until done\n");

    let repeat = statement(&ast, 0);
    assert_eq!(repeat.kind, AstKind::RepeatUntilStatement);
    assert_eq!(repeat.left.as_deref().unwrap().kind, AstKind::Identifier);
    assert_eq!(repeat.right.as_deref().unwrap().kind, AstKind::CodeBlock);
}

#[test]
fn test_for_in_statement() {
    let ast = parse_source_ok("for number in numbers { }\n");

    let for_in = statement(&ast, 0);
    assert_eq!(for_in.kind, AstKind::ForInStatement);

    let context = for_in.left.as_deref().unwrap();
    assert_eq!(context.kind, AstKind::ForInContext);
    assert_eq!(context.left.as_deref().unwrap().token.lexeme, "number");
    assert_eq!(context.right.as_deref().unwrap().token.lexeme, "numbers");

    assert_eq!(for_in.right.as_deref().unwrap().kind, AstKind::CodeBlock);
}

#[test]
fn test_function_call_with_labeled_arguments() {
    let ast = parse_source_ok("getRandomInt(between: 1, and: 100)\n");

    let call = statement(&ast, 0);
    assert_eq!(call.kind, AstKind::FunctionCall);
    assert_eq!(call.left.as_deref().unwrap().token.lexeme, "getRandomInt");

    let arguments = call.right.as_deref().unwrap();
    assert_eq!(arguments.kind, AstKind::ArgumentList);

    let first = arguments.left.as_deref().unwrap();
    assert_eq!(first.kind, AstKind::Argument);
    assert_eq!(first.left.as_deref().unwrap().token.lexeme, "between");
    assert_eq!(first.right.as_deref().unwrap().token.lexeme, "1");

    let rest = arguments.right.as_deref().unwrap();
    let second = rest.left.as_deref().unwrap();
    assert_eq!(second.left.as_deref().unwrap().token.lexeme, "and");
}

#[test]
fn test_postfix_factorial_chains_on_a_primary() {
    let ast = parse_source_ok("5!\n");

    let postfix = statement(&ast, 0);
    assert_eq!(postfix.kind, AstKind::Postfix);
    assert_eq!(postfix.left.as_deref().unwrap().token.lexeme, "5");
}

#[test]
fn test_prefix_not_is_right_associative() {
    let ast = parse_source_ok("! !flag\n");

    let outer = statement(&ast, 0);
    assert_eq!(outer.kind, AstKind::Unary);

    let inner = outer.left.as_deref().unwrap();
    assert_eq!(inner.kind, AstKind::Unary);
    assert_eq!(inner.left.as_deref().unwrap().token.lexeme, "flag");
}

#[test]
fn test_parenthesized_condition_is_just_an_expression() {
    let ast = parse_source_ok("if (x < 3) { }\n");

    let conditional = statement(&ast, 0);
    let condition = conditional.left.as_deref().unwrap();
    assert_eq!(condition.kind, AstKind::Binary);
    assert_eq!(condition.token.lexeme, "<");
}

#[test]
fn test_newlines_inside_parentheses_do_not_split_the_statement() {
    let ast = parse_source_ok("var z: Int = (\n1\n+\n2\n)\n");

    let assignment = statement(&ast, 0);
    assert_eq!(assignment.kind, AstKind::Assignment);

    let value = assignment.right.as_deref().unwrap();
    assert_eq!(value.kind, AstKind::Binary);
    assert_eq!(value.token.lexeme, "+");
}

#[test]
fn test_missing_trailing_newline_still_parses() {
    let ast = parse_source_ok("var a: Int = 1");

    let assignment = statement(&ast, 0);
    assert_eq!(assignment.kind, AstKind::Assignment);
}

#[test]
fn test_orphan_delimiters_are_skipped() {
    let ast = parse_source_ok("\n\nvar a: Int\n\n\nvar b: Int\n");

    assert_eq!(
        statement(&ast, 0).left.as_deref().unwrap().token.lexeme,
        "a"
    );
    assert_eq!(
        statement(&ast, 1).left.as_deref().unwrap().token.lexeme,
        "b"
    );
}

#[test]
fn test_ast_dump_is_deterministic() {
    let source = "func add(a: Int, b: Int) -> Int {\nreturn a + b\n}\nvar total: Int = add(a: 1, b: 2)\n";
    let first = parse_source_ok(source).to_string();
    let second = parse_source_ok(source).to_string();
    assert_eq!(first, second);
}

// --- 失败路径测试 (Sad Path) ---

#[test]
fn test_missing_identifier_in_declaration() {
    let errors = parse_source_fail("var : Int\n");

    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        CompilerError::Parsing(ParserError::MissingIdentifier { after, .. }) if after == "var"
    ));
}

#[test]
fn test_missing_type_annotation() {
    let errors = parse_source_fail("var a Int\n");

    assert!(matches!(
        &errors[0],
        CompilerError::Parsing(ParserError::MissingTypeAnnotation { after, .. }) if after == "a"
    ));
}

#[test]
fn test_missing_delimiter_between_statements() {
    let errors = parse_source_fail("x = 1 var b: Int\n");

    assert!(matches!(
        &errors[0],
        CompilerError::Parsing(ParserError::MissingDelimiter { .. })
    ));
}

#[test]
fn test_missing_right_value_after_assign() {
    let errors = parse_source_fail("var a: Int =\n");

    assert!(matches!(
        &errors[0],
        CompilerError::Parsing(ParserError::MissingRightValue { after, .. }) if after == "="
    ));
}

#[test]
fn test_missing_until_after_repeat_block() {
    let errors = parse_source_fail("repeat { }\nx = 1\n");

    assert!(matches!(
        &errors[0],
        CompilerError::Parsing(ParserError::MissingUntilCondition { .. })
    ));
}

#[test]
fn test_missing_in_keyword_in_for_statement() {
    let errors = parse_source_fail("for number numbers { }\n");

    assert!(matches!(
        &errors[0],
        CompilerError::Parsing(ParserError::MissingInStatement { .. })
    ));
}

#[test]
fn test_unlabeled_argument_is_rejected() {
    let errors = parse_source_fail("getRandomInt(1)\n");

    assert!(matches!(
        &errors[0],
        CompilerError::Parsing(ParserError::MissingArgumentLabel { .. })
    ));
}

#[test]
fn test_unresolvable_token_at_statement_start() {
    let errors = parse_source_fail("else\n");

    assert!(matches!(
        &errors[0],
        CompilerError::Parsing(ParserError::Unresolvable { lexeme, .. }) if lexeme == "else"
    ));
}

#[test]
fn test_error_location_points_past_the_last_good_token() {
    let errors = parse_source_fail("var a Int\n");

    // 错误指向 'Int'（本应出现 ':' 的位置）
    if let CompilerError::Parsing(error) = &errors[0] {
        assert_eq!(error.location().line, 1);
        assert_eq!(error.location().column, 7);
    } else {
        panic!("Expected a parsing error, got: {:?}", errors[0]);
    }
}

#[test]
fn test_recovery_resumes_at_the_next_statement() {
    let source = "var : Int\nvar b: Int = 2\n";
    let (ast, errors) = parse(source);

    // 第一条语句换成了 Error 子树，第二条照常解析
    assert_eq!(errors.len(), 1);
    assert_eq!(statement(&ast, 0).kind, AstKind::Error);
    assert_eq!(statement(&ast, 1).kind, AstKind::Assignment);
}

#[test]
fn test_multiple_errors_in_one_file() {
    let errors = parse_source_fail("var : Int\nlet : Float\n");
    assert_eq!(errors.len(), 2);
}

#[test]
fn test_lexer_errors_flow_through_the_parser() {
    // 词法错误 Token 在表达式位置引出一个语法错误，两条都在流里
    let errors = parse_source_fail("var a: Int = 1.2.3\n");

    assert!(errors
        .iter()
        .any(|error| matches!(error, CompilerError::Lexical(_))));
    assert!(errors
        .iter()
        .any(|error| matches!(error, CompilerError::Parsing(_))));
}
