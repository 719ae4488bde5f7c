//! src/lexer/mod.rs
//!
//! 词法分析阶段的公共接口。Opus 的词法分析是上下文相关的，
//! 因此 `Lexer` 是一个携带状态、按需产出 Token 的拉取式分析器：
//! 解析器每要一个 Token，它才向前扫描一步。

mod main;
pub mod reader;
mod token;


pub use main::{BracketNesting, Lexer};
pub use token::{
    escape_lexeme, Keyword, Operator, Punctuation, Token, TokenError, TokenKind, LEXEME_LENGTH,
};

use crate::reporter::CompilerError;

/// 一次性对整段源代码做词法分析。
///
/// 返回完整的 Token 流（含 EOF）和收集到的所有词法错误。
/// 解析器并不经过这个函数——它直接驱动 `Lexer` 按需取 Token——
/// 这个入口是给 Token 转储和测试用的。
pub fn lex(source: &str) -> (Vec<Token>, Vec<CompilerError>) {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.scan_all_tokens();
    let errors = lexer.take_errors();

    (tokens, errors)
}
