//! src/parser/mod.rs
//!
//! 语法分析阶段的公共接口。解析器按需驱动词法分析器（拉取式），
//! 把 Token 流转换为一棵统一二叉形状的抽象语法树。
//! 语法错误不会中止解析：出错的产生式被一个 Error 子树替换，
//! 解析器在下一个语句终结符处恢复，继续分析后面的语句。

pub mod ast;
mod main;

#[cfg(test)]
mod test;

pub use main::{Parse, Parser};

use crate::reporter::CompilerError;
use ast::AstNode;

/// 这是 parser 模块唯一的公共入口函数。
///
/// 输入源代码，输出根 Program 节点和一条错误流；错误流里
/// 既有词法错误也有语法错误，按出现顺序排列。根节点总是被
/// 返回——即使有错误，树里对应的位置也只是换成了 Error 子树。
pub fn parse(source: &str) -> (AstNode, Vec<CompilerError>) {
    Parser::new(source).parse()
}
