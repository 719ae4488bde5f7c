// 语句层面的语义分析。
// 每个 `analyze_*` 处理一种语句：声明、赋值、条件、循环、
// 函数定义与实现、return 与代码块。所有处理函数返回分析是否
// 成功；失败时错误已经记入分析器的错误流。

use super::Analyzer;
use crate::parser::ast::{AstKind, AstNode, FoldedValue, TYPE_BOOL};
use crate::reporter::SemanticError;

impl Analyzer {
    /// 语句分发。表达式单独成句时按表达式分析。
    pub(super) fn analyze_statement(&mut self, node: &mut AstNode) -> bool {
        match node.kind {
            AstKind::VariableDeclaration | AstKind::ConstantDeclaration => {
                self.analyze_declaration_statement(node)
            }
            AstKind::Assignment => self.analyze_assignment_statement(node),
            AstKind::ConditionalStatement => self.analyze_conditional_statement(node),
            AstKind::RepeatUntilStatement => self.analyze_repeat_until_statement(node),
            AstKind::ForInStatement => self.analyze_for_in_statement(node),
            AstKind::FunctionDefinition => self.analyze_function_definition(node),
            AstKind::FunctionImplementation => self.analyze_function_implementation(node),
            AstKind::ReturnStatement => self.analyze_return_statement(node),
            AstKind::CodeBlock => self.analyze_code_block(node),
            // 解析阶段已经报告过的错误子树，这里不再追究
            AstKind::Error => true,
            _ => self.analyze_expression(node),
        }
    }

    /// 声明：在当前命名空间查重，然后登记符号。
    /// `var` 声明的符号可变，`let` 声明的不可变。
    pub(super) fn analyze_declaration_statement(&mut self, node: &mut AstNode) -> bool {
        let Some(identifier) = node.left.as_deref() else {
            return false;
        };
        let Some(annotation) = node.right.as_deref() else {
            return false;
        };

        let name = identifier.token.lexeme.clone();
        let type_name = annotation.token.lexeme.clone();

        if self.symbol_table.lookup_in_current_namespace(&name).is_some() {
            self.report(SemanticError::RedeclaredSymbol {
                name,
                location: identifier.token.location,
                span: identifier.token.span,
            });
            return false;
        }

        self.symbol_table
            .add(&name, &type_name, node.token.location);

        if node.kind == AstKind::VariableDeclaration {
            if let Some(symbol) = self.symbol_table.latest_symbol_mut() {
                symbol.is_mutable = true;
            }
        }

        node.inferred_type = type_name;
        node.is_foldable = false;
        true
    }

    /// 赋值：左边是声明时先分析声明并以新符号为目标，
    /// 否则解析标识符。拒绝未声明的目标和已初始化的常量；
    /// 右侧表达式的类型必须与声明类型一致；可折叠的右值
    /// 把编译期值传播进符号。
    pub(super) fn analyze_assignment_statement(&mut self, node: &mut AstNode) -> bool {
        let Some(left) = node.left.as_deref_mut() else {
            return false;
        };

        let target_name = match left.kind {
            AstKind::VariableDeclaration | AstKind::ConstantDeclaration => {
                let name = left
                    .left
                    .as_deref()
                    .map(|identifier| identifier.token.lexeme.clone())
                    .unwrap_or_default();

                if !self.analyze_declaration_statement(left) {
                    return false;
                }

                name
            }

            AstKind::Identifier => {
                let name = left.token.lexeme.clone();

                let Some(symbol) = self.symbol_table.lookup(&name) else {
                    self.report(SemanticError::UndeclaredSymbol {
                        name,
                        location: left.token.location,
                        span: left.token.span,
                    });
                    return false;
                };

                if !symbol.is_mutable && symbol.has_initialized {
                    self.report(SemanticError::ImmutableModification {
                        name,
                        location: left.token.location,
                        span: left.token.span,
                    });
                    return false;
                }

                left.inferred_type = symbol.type_name.clone();
                name
            }

            _ => return false,
        };

        let Some(right) = node.right.as_deref_mut() else {
            return false;
        };
        if !self.analyze_expression(right) {
            return false;
        }

        let declared_type = self
            .symbol_table
            .lookup(&target_name)
            .map(|symbol| symbol.type_name.clone())
            .unwrap_or_default();

        if right.inferred_type != declared_type {
            self.report(SemanticError::OperationTypeMismatch {
                operator: "=".to_string(),
                expected: format!("'{}'", declared_type),
                found: format!("'{}'", right.inferred_type),
                location: node.token.location,
                span: node.token.span,
            });
            return false;
        }

        let folded = if right.is_foldable { right.value } else { None };

        if let Some(symbol) = self.symbol_table.lookup_mut(&target_name) {
            if folded.is_some() {
                symbol.value = folded;
            }
            symbol.has_initialized = true;
        }

        node.inferred_type = declared_type;
        node.is_foldable = false;
        true
    }

    /// 条件语句。条件必须是 'Bool'；条件可静态求值时只分析
    /// 被选中的分支，另一个分支保留在树上但不做语义分析。
    pub(super) fn analyze_conditional_statement(&mut self, node: &mut AstNode) -> bool {
        let Some(condition) = node.left.as_deref_mut() else {
            return false;
        };

        if !self.analyze_expression(condition) {
            return false;
        }

        if condition.inferred_type != TYPE_BOOL {
            self.report(SemanticError::InvalidCondition {
                found: condition.inferred_type.clone(),
                location: condition.token.location,
                span: condition.token.span,
            });
            return false;
        }

        let is_foldable = condition.is_foldable;
        let folded = condition.value;

        let Some(body) = node.right.as_deref_mut() else {
            return false;
        };

        // 静态死分支消除
        if is_foldable {
            if let Some(FoldedValue::Bool(which)) = folded {
                return if which {
                    body.left
                        .as_deref_mut()
                        .map_or(true, |block| self.analyze_code_block(block))
                } else {
                    body.right
                        .as_deref_mut()
                        .map_or(true, |branch| self.analyze_else_branch(branch))
                };
            }
        }

        let mut result = true;

        if let Some(block) = body.left.as_deref_mut() {
            result &= self.analyze_code_block(block);
        }

        if let Some(branch) = body.right.as_deref_mut() {
            result &= self.analyze_else_branch(branch);
        }

        result
    }

    /// else 分支或者是另一个条件语句（else if），或者是一个代码块。
    fn analyze_else_branch(&mut self, node: &mut AstNode) -> bool {
        if node.kind == AstKind::ConditionalStatement {
            self.analyze_conditional_statement(node)
        } else {
            self.analyze_code_block(node)
        }
    }

    /// repeat-until：循环体至少执行一次，因此先分析循环体，
    /// 再要求终止条件是 'Bool'。
    pub(super) fn analyze_repeat_until_statement(&mut self, node: &mut AstNode) -> bool {
        let mut result = true;

        if let Some(block) = node.right.as_deref_mut() {
            result &= self.analyze_code_block(block);
        }

        let Some(condition) = node.left.as_deref_mut() else {
            return false;
        };

        if !self.analyze_expression(condition) {
            return false;
        }

        if condition.inferred_type != TYPE_BOOL {
            self.report(SemanticError::InvalidCondition {
                found: condition.inferred_type.clone(),
                location: condition.token.location,
                span: condition.token.span,
            });
            return false;
        }

        result
    }

    /// for-in：循环变量活在包裹整个循环体的命名空间里，
    /// 类型取自被迭代表达式的推导类型，视为已初始化且不可变。
    pub(super) fn analyze_for_in_statement(&mut self, node: &mut AstNode) -> bool {
        let Some(context) = node.left.as_deref_mut() else {
            return false;
        };

        let Some(iterable) = context.right.as_deref_mut() else {
            return false;
        };
        if !self.analyze_expression(iterable) {
            return false;
        }
        let iterable_type = iterable.inferred_type.clone();

        let Some(variable) = context.left.as_deref_mut() else {
            return false;
        };
        variable.inferred_type = iterable_type.clone();

        let name = variable.token.lexeme.clone();
        let location = variable.token.location;

        self.symbol_table.enter_namespace();
        self.symbol_table.add(&name, &iterable_type, location);

        if let Some(symbol) = self.symbol_table.latest_symbol_mut() {
            symbol.has_initialized = true;
        }

        let result = node
            .right
            .as_deref_mut()
            .map_or(true, |block| self.analyze_code_block(block));

        self.symbol_table.exit_namespace();
        result
    }

    /// 函数定义：把函数名登记为当前命名空间的符号，
    /// 类型记为声明的返回类型；函数符号视为已初始化且不可变。
    pub(super) fn analyze_function_definition(&mut self, node: &mut AstNode) -> bool {
        let Some(name_node) = node.left.as_deref() else {
            return false;
        };
        let Some(signature) = node.right.as_deref() else {
            return false;
        };

        let name = name_node.token.lexeme.clone();
        let return_type = signature
            .right
            .as_deref()
            .map(|return_node| return_node.token.lexeme.clone())
            .unwrap_or_default();

        if self.symbol_table.lookup_in_current_namespace(&name).is_some() {
            self.report(SemanticError::RedeclaredSymbol {
                name,
                location: name_node.token.location,
                span: name_node.token.span,
            });
            return false;
        }

        self.symbol_table
            .add(&name, &return_type, node.token.location);

        if let Some(symbol) = self.symbol_table.latest_symbol_mut() {
            symbol.has_initialized = true;
        }

        node.inferred_type = return_type;
        node.is_foldable = false;
        true
    }

    /// 带函数体的函数定义：先登记函数符号，然后在一个
    /// 包裹函数体的命名空间里声明所有形参，再分析函数体。
    pub(super) fn analyze_function_implementation(&mut self, node: &mut AstNode) -> bool {
        let mut result = node
            .left
            .as_deref_mut()
            .map_or(false, |definition| self.analyze_function_definition(definition));

        self.symbol_table.enter_namespace();

        if let Some(definition) = node.left.as_deref() {
            if let Some(signature) = definition.right.as_deref() {
                if let Some(parameters) = signature.left.as_deref() {
                    result &= self.declare_parameters(parameters);
                }
            }
        }

        if let Some(body) = node.right.as_deref_mut() {
            result &= self.analyze_code_block(body);
        }

        self.symbol_table.exit_namespace();
        result
    }

    /// 沿形参表的 cons 链逐个登记形参符号。
    fn declare_parameters(&mut self, list: &AstNode) -> bool {
        if list.kind != AstKind::ParameterList {
            return true;
        }

        let mut result = true;

        if let Some(parameter) = list.left.as_deref() {
            let label = parameter.left.as_deref();
            let annotation = parameter.right.as_deref();

            if let (Some(label), Some(annotation)) = (label, annotation) {
                let name = label.token.lexeme.clone();
                let type_name = annotation.token.lexeme.clone();

                if self.symbol_table.lookup_in_current_namespace(&name).is_some() {
                    self.report(SemanticError::RedeclaredSymbol {
                        name,
                        location: label.token.location,
                        span: label.token.span,
                    });
                    result = false;
                } else {
                    self.symbol_table.add(&name, &type_name, label.token.location);

                    if let Some(symbol) = self.symbol_table.latest_symbol_mut() {
                        symbol.has_initialized = true;
                    }
                }
            }
        }

        if let Some(rest) = list.right.as_deref() {
            result &= self.declare_parameters(rest);
        }

        result
    }

    /// return 语句：分析返回值表达式（若有）。
    pub(super) fn analyze_return_statement(&mut self, node: &mut AstNode) -> bool {
        let Some(value) = node.left.as_deref_mut() else {
            return true;
        };

        if !self.analyze_expression(value) {
            return false;
        }

        node.inferred_type = value.inferred_type.clone();
        node.is_foldable = false;
        true
    }

    /// 代码块：进入一个新命名空间，分析块内的语句链，
    /// 离开时弹出本层级的所有符号。
    pub(super) fn analyze_code_block(&mut self, node: &mut AstNode) -> bool {
        self.symbol_table.enter_namespace();
        let result = self.analyze_block_chain(node);
        self.symbol_table.exit_namespace();
        result
    }

    /// 代码块内部的 cons 链与 Program 同构。
    fn analyze_block_chain(&mut self, node: &mut AstNode) -> bool {
        let mut result = true;

        if node.kind == AstKind::CodeBlock {
            if let Some(statement) = node.left.as_deref_mut() {
                result &= self.analyze_statement(statement);
            }

            if let Some(rest) = node.right.as_deref_mut() {
                result &= self.analyze_block_chain(rest);
            }
        }

        result
    }
}
