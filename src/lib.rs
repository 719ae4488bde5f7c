pub mod analyzer;
pub mod diagnostic;
pub mod lexer;
pub mod parser;
pub mod reporter;

use parser::ast::AstNode;
use reporter::CompilerError;

/// 编译一段 Opus 源代码：词法与语法分析之后做语义分析，
/// 返回标注完毕的 AST。
///
/// # Returns
/// * `Ok(AstNode)` 带类型标注与折叠值的根 Program 节点。
/// * `Err(Vec<CompilerError>)` 按出现顺序收集的所有编译错误。
pub fn compile(source: &str) -> Result<AstNode, Vec<CompilerError>> {
    // 1. 词法 + 语法分析。解析器按需驱动词法分析器，
    //    两个阶段的错误合在同一条流里返回。
    let (mut ast, errors) = parser::parse(source);

    // 出现过词法或语法错误时，语义分析没有意义，带着全部错误提前返回。
    if !errors.is_empty() {
        return Err(errors);
    }

    // 2. 语义分析。错误不会中止分析，所以统一从错误流里取结果。
    let mut analyzer = analyzer::Analyzer::new();
    analyzer.analyze(&mut ast);

    let errors = analyzer.take_errors();
    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ast)
}
