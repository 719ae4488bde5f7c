use crate::lexer::Token;
use std::fmt;

// --- 1. 类型名常量 ---

/// 语义分析尚未触及一个节点时的类型占位符。
pub const TYPE_ANY: &str = "Any";
pub const TYPE_INT: &str = "Int";
pub const TYPE_FLOAT: &str = "Float";
pub const TYPE_BOOL: &str = "Bool";
pub const TYPE_STRING: &str = "String";

// --- 2. 节点种类 ---

/// AST 节点种类，对应语言里的各种语法构造。
///
/// 所有序列（程序、代码块、参数表、实参表）都用同一种
/// 右倾的 cons 结构编码：左孩子是序列头部的元素，右孩子是
/// 同种类的下一节；一个没有孩子的同类节点充当序列结尾。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AstKind {
    /// 整个程序的根节点，也是语句序列的 cons 脊柱。
    Program,
    /// `{...}` 代码块，内部同样是语句的 cons 脊柱。
    CodeBlock,
    /// 解析失败后替换在原产生式位置上的错误子树。
    Error,
    /// 数字或字符串字面量。
    Literal,
    /// 布尔字面量（`true` / `false`）。
    BooleanLiteral,
    /// 标识符。
    Identifier,
    /// 类型标注（例如 `: Int` 里的 `Int`）。
    TypeAnnotation,
    /// `var` 变量声明：左为标识符，右为类型标注。
    VariableDeclaration,
    /// `let` 常量声明：左为标识符，右为类型标注。
    ConstantDeclaration,
    /// 赋值：左为声明或标识符，右为表达式。
    Assignment,
    /// 二元表达式：锚点 Token 是运算符。
    Binary,
    /// 前缀一元表达式（`-x`、`!flag`）：操作数在左。
    Unary,
    /// 后缀表达式（`5!`）：操作数在左。
    Postfix,
    /// 函数调用：左为被调用的标识符，右为实参表。
    FunctionCall,
    /// 一个带标签的实参：左为标签，右为表达式。
    Argument,
    /// 实参的标签。
    ArgumentLabel,
    /// 实参序列的 cons 脊柱。
    ArgumentList,
    /// 函数定义：左为函数名，右为签名。
    FunctionDefinition,
    /// 函数签名：左为参数表，右为返回类型。
    FunctionSignature,
    /// 带函数体的函数定义：左为定义，右为代码块。
    FunctionImplementation,
    /// 一个带标签的形参：左为标签，右为类型标注。
    Parameter,
    /// 形参的标签。
    ParameterLabel,
    /// 形参序列的 cons 脊柱。
    ParameterList,
    /// 函数返回类型。
    FunctionReturnType,
    /// `return` 语句：左为可选的返回值表达式。
    ReturnStatement,
    /// `if` 语句：左为条件，右为 ConditionalBody。
    ConditionalStatement,
    /// 条件语句的主体：左为 if 分支，右为 else 分支
    /// （另一个代码块，或嵌套的 ConditionalStatement）。
    ConditionalBody,
    /// `repeat-until` 语句：左为条件，右为代码块。
    RepeatUntilStatement,
    /// `for-in` 语句：左为 ForInContext，右为代码块。
    ForInStatement,
    /// for-in 的上下文：左为循环变量，右为被迭代的表达式。
    ForInContext,
}

impl AstKind {
    /// 该种类的节点在转储时是否把锚点 Token 的词素一并打印。
    fn shows_lexeme(&self) -> bool {
        !matches!(
            self,
            AstKind::Program
                | AstKind::CodeBlock
                | AstKind::ArgumentList
                | AstKind::Argument
                | AstKind::ParameterList
                | AstKind::Parameter
                | AstKind::FunctionSignature
                | AstKind::FunctionImplementation
                | AstKind::ConditionalBody
                | AstKind::ForInContext
        )
    }
}

impl fmt::Display for AstKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// --- 3. 折叠值 ---

/// 常量折叠得到的编译期值。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FoldedValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for FoldedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoldedValue::Int(value) => write!(f, "{}", value),
            FoldedValue::Float(value) => write!(f, "{}", value),
            FoldedValue::Bool(value) => write!(f, "{}", value),
        }
    }
}

// --- 4. AST 节点 ---

/// 统一形状的 AST 节点：种类、锚点 Token、两个孩子，
/// 外加语义分析写入的三个标注字段。
///
/// 锚点 Token 按值保存——Token 很小且词素有长度上限，
/// 这让整棵树不携带任何生命周期参数。
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub kind: AstKind,
    /// 与该节点关系最紧密的 Token，提供位置和（多数时候）词素。
    pub token: Token,
    pub left: Option<Box<AstNode>>,
    pub right: Option<Box<AstNode>>,
    /// 推导出的类型名；`"Any"` 表示尚未被分析。
    pub inferred_type: String,
    /// 该子树是否可以在编译期求值。
    pub is_foldable: bool,
    /// 折叠得到的值（仅当 `is_foldable` 成立时有意义）。
    pub value: Option<FoldedValue>,
}

impl AstNode {
    /// 创建一个没有孩子的新节点。
    pub fn new(kind: AstKind, token: Token) -> Self {
        AstNode {
            kind,
            token,
            left: None,
            right: None,
            inferred_type: TYPE_ANY.to_string(),
            is_foldable: true,
            value: None,
        }
    }

    pub fn with_left(mut self, left: AstNode) -> Self {
        self.left = Some(Box::new(left));
        self
    }

    pub fn with_right(mut self, right: AstNode) -> Self {
        self.right = Some(Box::new(right));
        self
    }

    /// 是否是一个序列结尾的空 cons 节点。
    pub fn is_terminal(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// 深度缩进的树形转储。左孩子进入下一层，
    /// 右侧的 cons 尾巴停留在同一层，因此序列在视觉上是平铺的。
    fn display(&self, f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
        for _ in 1..level {
            write!(f, "    ")?;
        }

        if level > 0 {
            write!(f, "├── ")?;
        }

        if self.kind.shows_lexeme() && !self.token.lexeme.is_empty() {
            writeln!(f, "{} ({})", self.kind, self.token.lexeme)?;
        } else {
            writeln!(f, "{}", self.kind)?;
        }

        if let Some(left) = &self.left {
            left.display(f, level + 1)?;
        }

        if let Some(right) = &self.right {
            right.display(f, level)?;
        }

        Ok(())
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display(f, 0)
    }
}
