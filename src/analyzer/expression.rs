// 表达式层面的语义分析。
// 为每个表达式节点写入两项标注：推导类型 `inferred_type`，
// 以及可折叠标记与折叠值。折叠一律使用带检查的宿主运算：
// 任何求不出确定结果的情形（除零、溢出、越界的阶乘）都让
// 节点保持未折叠，不产生诊断——运行期行为不归前端管。

use super::Analyzer;
use crate::lexer::{Operator, TokenKind};
use crate::parser::ast::{AstKind, AstNode, FoldedValue, TYPE_BOOL, TYPE_FLOAT, TYPE_INT, TYPE_STRING};
use crate::reporter::SemanticError;

/// 可以折叠的阶乘操作数上限：20! 是 i64 能装下的最大阶乘。
const FACTORIAL_LIMIT: i64 = 20;

/// 该类型名是否是数值类型。
fn is_numeric(type_name: &str) -> bool {
    type_name == TYPE_INT || type_name == TYPE_FLOAT
}

impl Analyzer {
    /// 表达式分发。每个成功分析过的节点都带上非空的推导类型。
    pub(super) fn analyze_expression(&mut self, node: &mut AstNode) -> bool {
        match node.kind {
            AstKind::Literal => self.analyze_literal(node),
            AstKind::BooleanLiteral => self.analyze_boolean_literal(node),
            AstKind::Identifier => self.analyze_identifier(node),
            AstKind::Binary => self.analyze_binary_expression(node),
            AstKind::Unary => self.analyze_unary_expression(node),
            AstKind::Postfix => self.analyze_postfix_expression(node),
            AstKind::FunctionCall => self.analyze_function_call(node),
            // 表达式位置上的赋值（`x = ...` 作为语句解析出的形态）
            AstKind::Assignment => self.analyze_assignment_statement(node),
            AstKind::Error => true,
            _ => true,
        }
    }

    /// 数字与字符串字面量。带小数点的数字是 'Float'，否则是 'Int'；
    /// 词素在宿主语言里解析失败时不折叠。
    fn analyze_literal(&mut self, node: &mut AstNode) -> bool {
        match node.token.kind {
            TokenKind::Numeric => {
                if node.token.lexeme.contains('.') {
                    node.inferred_type = TYPE_FLOAT.to_string();
                    node.value = node.token.lexeme.parse::<f64>().ok().map(FoldedValue::Float);
                } else {
                    node.inferred_type = TYPE_INT.to_string();
                    node.value = node.token.lexeme.parse::<i64>().ok().map(FoldedValue::Int);
                }

                node.is_foldable = node.value.is_some();
            }

            TokenKind::StringLiteral => {
                node.inferred_type = TYPE_STRING.to_string();
                node.is_foldable = false;
                node.value = None;
            }

            _ => return false,
        }

        true
    }

    fn analyze_boolean_literal(&mut self, node: &mut AstNode) -> bool {
        node.inferred_type = TYPE_BOOL.to_string();
        node.value = Some(FoldedValue::Bool(node.token.lexeme == "true"));
        node.is_foldable = true;
        true
    }

    /// 标识符：类型取声明类型。已经有编译期值的不可变符号
    /// 把值传播到使用处（常量传播）；可变符号不参与折叠。
    fn analyze_identifier(&mut self, node: &mut AstNode) -> bool {
        let name = node.token.lexeme.clone();

        let Some(symbol) = self.symbol_table.lookup(&name) else {
            self.report(SemanticError::UndeclaredSymbol {
                name,
                location: node.token.location,
                span: node.token.span,
            });
            return false;
        };

        node.inferred_type = symbol.type_name.clone();

        if !symbol.is_mutable && symbol.has_initialized && symbol.value.is_some() {
            node.value = symbol.value;
            node.is_foldable = true;
        } else {
            node.value = None;
            node.is_foldable = false;
        }

        true
    }

    /// 二元表达式的类型规则：
    /// 算术运算要求两侧都是数值，任何一侧是 'Float' 结果就是 'Float'；
    /// 逻辑运算要求两侧都是 'Bool'；相等比较要求两侧类型一致；
    /// 大小比较要求两侧都是数值，结果一律是 'Bool'。
    fn analyze_binary_expression(&mut self, node: &mut AstNode) -> bool {
        let Some(left) = node.left.as_deref_mut() else {
            return false;
        };
        if !self.analyze_expression(left) {
            return false;
        }

        let Some(right) = node.right.as_deref_mut() else {
            return false;
        };
        if !self.analyze_expression(right) {
            return false;
        }

        let TokenKind::Operator(operator) = node.token.kind else {
            return false;
        };

        let left_type = node
            .left
            .as_deref()
            .map(|child| child.inferred_type.clone())
            .unwrap_or_default();
        let right_type = node
            .right
            .as_deref()
            .map(|child| child.inferred_type.clone())
            .unwrap_or_default();

        let inferred = match operator {
            Operator::Plus
            | Operator::Minus
            | Operator::Star
            | Operator::Slash
            | Operator::Percent => {
                if !is_numeric(&left_type) || !is_numeric(&right_type) {
                    self.report_operand_mismatch(node, "'Int' or 'Float'", &left_type, &right_type);
                    return false;
                }

                if left_type == TYPE_FLOAT || right_type == TYPE_FLOAT {
                    TYPE_FLOAT
                } else {
                    TYPE_INT
                }
            }

            Operator::AndAnd | Operator::OrOr => {
                if left_type != TYPE_BOOL || right_type != TYPE_BOOL {
                    self.report_operand_mismatch(node, "'Bool'", &left_type, &right_type);
                    return false;
                }
                TYPE_BOOL
            }

            Operator::Eq | Operator::NotEq => {
                if left_type != right_type {
                    self.report_operand_mismatch(node, "identical operand types", &left_type, &right_type);
                    return false;
                }
                TYPE_BOOL
            }

            Operator::Lt | Operator::Gt | Operator::LtEq | Operator::GtEq => {
                if !is_numeric(&left_type) || !is_numeric(&right_type) {
                    self.report_operand_mismatch(node, "'Int' or 'Float'", &left_type, &right_type);
                    return false;
                }
                TYPE_BOOL
            }

            _ => return false,
        };

        node.inferred_type = inferred.to_string();
        self.fold_binary_expression(node, operator);
        true
    }

    /// 两个操作数都可折叠时在编译期求值。
    fn fold_binary_expression(&mut self, node: &mut AstNode, operator: Operator) {
        let left = node.left.as_deref().filter(|child| child.is_foldable);
        let right = node.right.as_deref().filter(|child| child.is_foldable);

        let folded = match (left.and_then(|n| n.value), right.and_then(|n| n.value)) {
            (Some(left_value), Some(right_value)) => {
                evaluate_binary(operator, left_value, right_value)
            }
            _ => None,
        };

        node.value = folded;
        node.is_foldable = folded.is_some();
    }

    /// 前缀一元表达式：`-` 要求数值且保持类型，`!` 要求 'Bool'。
    fn analyze_unary_expression(&mut self, node: &mut AstNode) -> bool {
        let Some(operand) = node.left.as_deref_mut() else {
            return false;
        };
        if !self.analyze_expression(operand) {
            return false;
        }

        let operand_type = operand.inferred_type.clone();
        let operand_value = operand.is_foldable.then_some(operand.value).flatten();

        let TokenKind::Operator(operator) = node.token.kind else {
            return false;
        };

        match operator {
            Operator::Minus => {
                if !is_numeric(&operand_type) {
                    self.report_unary_mismatch(node, "'Int' or 'Float'", &operand_type);
                    return false;
                }

                node.inferred_type = operand_type;
                node.value = operand_value.and_then(|value| match value {
                    FoldedValue::Int(number) => number.checked_neg().map(FoldedValue::Int),
                    FoldedValue::Float(number) => Some(FoldedValue::Float(-number)),
                    FoldedValue::Bool(_) => None,
                });
            }

            Operator::Not => {
                if operand_type != TYPE_BOOL {
                    self.report_unary_mismatch(node, "'Bool'", &operand_type);
                    return false;
                }

                node.inferred_type = TYPE_BOOL.to_string();
                node.value = operand_value.and_then(|value| match value {
                    FoldedValue::Bool(truth) => Some(FoldedValue::Bool(!truth)),
                    _ => None,
                });
            }

            _ => return false,
        }

        node.is_foldable = node.value.is_some();
        true
    }

    /// 后缀阶乘：操作数必须是 'Int'，结果是 'Int'。
    /// 负数或大于 20 的操作数放弃折叠。
    fn analyze_postfix_expression(&mut self, node: &mut AstNode) -> bool {
        let Some(operand) = node.left.as_deref_mut() else {
            return false;
        };
        if !self.analyze_expression(operand) {
            return false;
        }

        let operand_type = operand.inferred_type.clone();
        let operand_value = operand.is_foldable.then_some(operand.value).flatten();

        if operand_type != TYPE_INT {
            self.report_unary_mismatch(node, "'Int'", &operand_type);
            return false;
        }

        node.inferred_type = TYPE_INT.to_string();
        node.value = operand_value.and_then(|value| match value {
            FoldedValue::Int(number) => evaluate_factorial(number).map(FoldedValue::Int),
            _ => None,
        });
        node.is_foldable = node.value.is_some();
        true
    }

    /// 函数调用：被调用的名字必须已经声明，调用的类型是
    /// 其符号上记录的返回类型；调用永远不参与折叠。
    fn analyze_function_call(&mut self, node: &mut AstNode) -> bool {
        let mut result = true;

        if let Some(callee) = node.left.as_deref_mut() {
            if callee.kind == AstKind::Identifier {
                let name = callee.token.lexeme.clone();

                match self.symbol_table.lookup(&name) {
                    Some(symbol) => {
                        let return_type = symbol.type_name.clone();
                        callee.inferred_type = return_type.clone();
                        node.inferred_type = return_type;
                    }
                    None => {
                        self.report(SemanticError::UndeclaredSymbol {
                            name,
                            location: callee.token.location,
                            span: callee.token.span,
                        });
                        result = false;
                    }
                }
            } else {
                result &= self.analyze_expression(callee);
            }
        }

        if let Some(arguments) = node.right.as_deref_mut() {
            result &= self.analyze_argument_list(arguments);
        }

        node.is_foldable = false;
        node.value = None;
        result
    }

    /// 沿实参表的 cons 链分析每个实参的表达式。
    fn analyze_argument_list(&mut self, list: &mut AstNode) -> bool {
        let mut result = true;

        if list.kind == AstKind::ArgumentList {
            if let Some(argument) = list.left.as_deref_mut() {
                if let Some(value) = argument.right.as_deref_mut() {
                    result &= self.analyze_expression(value);
                }
            }

            if let Some(rest) = list.right.as_deref_mut() {
                result &= self.analyze_argument_list(rest);
            }
        }

        result
    }

    // --- 错误报告辅助 ---

    fn report_operand_mismatch(&mut self, node: &AstNode, expected: &str, left: &str, right: &str) {
        self.report(SemanticError::OperationTypeMismatch {
            operator: node.token.lexeme.clone(),
            expected: expected.to_string(),
            found: format!("'{}' and '{}'", left, right),
            location: node.token.location,
            span: node.token.span,
        });
    }

    fn report_unary_mismatch(&mut self, node: &AstNode, expected: &str, found: &str) {
        self.report(SemanticError::OperationTypeMismatch {
            operator: node.token.lexeme.clone(),
            expected: expected.to_string(),
            found: format!("'{}'", found),
            location: node.token.location,
            span: node.token.span,
        });
    }
}

// --- 编译期求值 ---

/// 二元运算的编译期求值。整数用带检查的运算，除零和溢出
/// 都返回 `None`；混入浮点数时提升到 f64 再计算。
fn evaluate_binary(
    operator: Operator,
    left: FoldedValue,
    right: FoldedValue,
) -> Option<FoldedValue> {
    use FoldedValue::*;

    match operator {
        Operator::Plus | Operator::Minus | Operator::Star | Operator::Slash | Operator::Percent => {
            match (left, right) {
                (Int(l), Int(r)) => evaluate_integer_arithmetic(operator, l, r).map(Int),
                (l, r) => {
                    let l = as_float(l)?;
                    let r = as_float(r)?;
                    let value = match operator {
                        Operator::Plus => l + r,
                        Operator::Minus => l - r,
                        Operator::Star => l * r,
                        Operator::Slash => l / r,
                        Operator::Percent => l % r,
                        _ => return None,
                    };
                    Some(Float(value))
                }
            }
        }

        Operator::AndAnd => match (left, right) {
            (Bool(l), Bool(r)) => Some(Bool(l && r)),
            _ => None,
        },

        Operator::OrOr => match (left, right) {
            (Bool(l), Bool(r)) => Some(Bool(l || r)),
            _ => None,
        },

        Operator::Eq | Operator::NotEq => {
            let equal = match (left, right) {
                (Int(l), Int(r)) => l == r,
                (Float(l), Float(r)) => l == r,
                (Bool(l), Bool(r)) => l == r,
                _ => return None,
            };
            Some(Bool(if operator == Operator::Eq { equal } else { !equal }))
        }

        Operator::Lt | Operator::Gt | Operator::LtEq | Operator::GtEq => {
            let l = as_float(left)?;
            let r = as_float(right)?;
            let truth = match operator {
                Operator::Lt => l < r,
                Operator::Gt => l > r,
                Operator::LtEq => l <= r,
                Operator::GtEq => l >= r,
                _ => return None,
            };
            Some(Bool(truth))
        }

        _ => None,
    }
}

fn evaluate_integer_arithmetic(operator: Operator, left: i64, right: i64) -> Option<i64> {
    match operator {
        Operator::Plus => left.checked_add(right),
        Operator::Minus => left.checked_sub(right),
        Operator::Star => left.checked_mul(right),
        Operator::Slash => left.checked_div(right),
        Operator::Percent => left.checked_rem(right),
        _ => None,
    }
}

fn as_float(value: FoldedValue) -> Option<f64> {
    match value {
        FoldedValue::Int(number) => Some(number as f64),
        FoldedValue::Float(number) => Some(number),
        FoldedValue::Bool(_) => None,
    }
}

/// 迭代计算阶乘；只接受 0 到 20 之间的操作数。
fn evaluate_factorial(operand: i64) -> Option<i64> {
    if !(0..=FACTORIAL_LIMIT).contains(&operand) {
        return None;
    }

    let mut product: i64 = 1;
    for factor in 2..=operand {
        product *= factor;
    }

    Some(product)
}
