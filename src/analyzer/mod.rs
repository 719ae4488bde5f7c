//! src/analyzer/mod.rs
//!
//! 语义分析阶段的公共接口。分析器深度优先（先左后右）地
//! 遍历解析器产出的 AST，维护一张带命名空间的符号表，
//! 为每个表达式节点写入推导类型与可折叠标记，并在条件
//! 可静态求值时只分析被选中的那个分支。
//!
//! 错误不会中止分析：记录之后继续处理兄弟节点，让一次
//! 运行尽可能多地暴露问题。

mod expression;
mod statement;
pub mod symbol;

#[cfg(test)]
mod test;

use crate::parser::ast::{AstKind, AstNode};
use crate::reporter::{CompilerError, SemanticError};
use symbol::SymbolTable;

/// 语义分析器，持有分析过程中的符号表与错误流。
pub struct Analyzer {
    /// 作用域与符号信息。分析结束后全局层级的符号仍然在表里，
    /// 供符号表转储观察。
    symbol_table: SymbolTable,
    /// 本阶段收集到的所有语义错误。
    errors: Vec<CompilerError>,
}

impl Analyzer {
    pub fn new() -> Self {
        Analyzer {
            symbol_table: SymbolTable::new(),
            errors: Vec::new(),
        }
    }

    /// 分析一个完整的程序。返回所有语句分析结果的逻辑与；
    /// 具体的错误通过 `take_errors` 取走。
    pub fn analyze(&mut self, node: &mut AstNode) -> bool {
        self.analyze_program(node)
    }

    /// 递归处理 Program 的 cons 链：左孩子是一条语句，
    /// 右孩子是余下的程序。
    fn analyze_program(&mut self, node: &mut AstNode) -> bool {
        let mut result = true;

        if node.kind == AstKind::Program {
            if let Some(statement) = node.left.as_deref_mut() {
                result &= self.analyze_statement(statement);
            }

            if let Some(rest) = node.right.as_deref_mut() {
                result &= self.analyze_program(rest);
            }
        }

        result
    }

    /// 取走本阶段收集到的所有语义错误。
    pub fn take_errors(&mut self) -> Vec<CompilerError> {
        std::mem::take(&mut self.errors)
    }

    /// 分析结束后的符号表（只剩下全局层级的符号）。
    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    fn report(&mut self, error: SemanticError) {
        self.errors.push(CompilerError::Semantic(error));
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer::new()
    }
}
