//! 这个模块是整个编译器错误处理系统的核心。
//! 它使用 `thiserror` 定义所有结构化的诊断信息：每个变体的 `Display`
//! 输出就是用户最终在终端上看到的那一行（或两行）诊断文本。

use crate::diagnostic::{Location, Span};
use crate::lexer::{escape_lexeme, TokenError};
use thiserror::Error;

/// 顶层的编译器错误枚举。
/// 所有编译阶段（词法、语法、语义分析）的错误都会被包含在这里。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompilerError {
    /// 词法分析阶段的错误
    #[error(transparent)]
    Lexical(#[from] LexerError),

    /// 语法分析阶段的错误
    #[error(transparent)]
    Parsing(#[from] ParserError),

    /// 语义分析阶段的错误
    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

impl CompilerError {
    /// 该错误对应的源代码字节范围，用于渲染带上下文的报告。
    pub fn span(&self) -> Span {
        match self {
            CompilerError::Lexical(error) => error.span(),
            CompilerError::Parsing(error) => error.span(),
            CompilerError::Semantic(error) => error.span(),
        }
    }

    /// 该错误对应的行列位置。
    pub fn location(&self) -> Location {
        match self {
            CompilerError::Lexical(error) => error.location(),
            CompilerError::Parsing(error) => error.location(),
            CompilerError::Semantic(error) => error.location(),
        }
    }
}

/// 词法分析器可能产生的所有错误的集合。
///
/// Token 级别的错误（`InvalidToken`）在产生错误 Token 的同时被记录，
/// 这样语法分析器仍然可以拿着错误 Token 继续同步；
/// 流级别的错误（`UnclosedBracket`）只在到达文件末尾时检查一次。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexerError {
    /// 一个无法构成合法 Token 的字符序列。
    #[error("<ERROR:{}, Lexeme:\"{}\"> at location {}", .error, escape_lexeme(.lexeme), .location)]
    InvalidToken {
        error: TokenError,
        lexeme: String,
        location: Location,
        span: Span,
    },

    /// 文件结束时仍有未闭合的括号。
    #[error("<ERROR:UnclosedBracket, Lexeme:\"{bracket}\"> at location {location}")]
    UnclosedBracket {
        bracket: char,
        location: Location,
        span: Span,
    },
}

impl LexerError {
    pub fn span(&self) -> Span {
        match self {
            LexerError::InvalidToken { span, .. } => *span,
            LexerError::UnclosedBracket { span, .. } => *span,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            LexerError::InvalidToken { location, .. } => *location,
            LexerError::UnclosedBracket { location, .. } => *location,
        }
    }
}

/// 语法分析器可能产生的所有错误的集合。
///
/// 统一的定位规则：错误指向“本应出现合法延续”的那个 Token 的位置，
/// 而 `after` 字段携带前一个（最后一个正确的）Token 的词素，
/// 用于组成 “Expecting 'X' after 'Y'” 形式的消息。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParserError {
    #[error("Parsing Error at {location}\n[ERROR] Expecting an identifier after '{after}'")]
    MissingIdentifier {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting ':' after '{after}'")]
    MissingTypeAnnotation {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting a type name after '{after}'")]
    MissingTypeName {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting a new line after '{after}'")]
    MissingDelimiter {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting '=' or a new line after '{after}'")]
    DeclarationSyntax {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting an expression after '{after}'")]
    MissingRightValue {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting an argument label after '{after}'")]
    MissingArgumentLabel {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting a parameter label after '{after}'")]
    MissingParameterLabel {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting ':' after label '{after}'")]
    MissingColonAfterLabel {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting a function name after '{after}'")]
    MissingFunctionName {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting '(' after '{after}'")]
    MissingOpeningBracket {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting ')' after '{after}'")]
    MissingClosingBracket {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting '->' after '{after}'")]
    MissingRightArrow {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting a return type after '{after}'")]
    MissingReturnType {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting '{{' after '{after}'")]
    MissingOpeningCurlyBracket {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting 'until' after '{after}'")]
    MissingUntilCondition {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting 'in' after '{after}'")]
    MissingInStatement {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting a condition after '{after}'")]
    MissingCondition {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting an operand after '{after}'")]
    MissingOperand {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Expecting an argument after '{after}'")]
    MissingArgument {
        after: String,
        location: Location,
        span: Span,
    },

    #[error("Parsing Error at {location}\n[ERROR] Unresolvable token '{lexeme}'")]
    Unresolvable {
        lexeme: String,
        location: Location,
        span: Span,
    },
}

impl ParserError {
    pub fn span(&self) -> Span {
        match self {
            ParserError::MissingIdentifier { span, .. }
            | ParserError::MissingTypeAnnotation { span, .. }
            | ParserError::MissingTypeName { span, .. }
            | ParserError::MissingDelimiter { span, .. }
            | ParserError::DeclarationSyntax { span, .. }
            | ParserError::MissingRightValue { span, .. }
            | ParserError::MissingArgumentLabel { span, .. }
            | ParserError::MissingParameterLabel { span, .. }
            | ParserError::MissingColonAfterLabel { span, .. }
            | ParserError::MissingFunctionName { span, .. }
            | ParserError::MissingOpeningBracket { span, .. }
            | ParserError::MissingClosingBracket { span, .. }
            | ParserError::MissingRightArrow { span, .. }
            | ParserError::MissingReturnType { span, .. }
            | ParserError::MissingOpeningCurlyBracket { span, .. }
            | ParserError::MissingUntilCondition { span, .. }
            | ParserError::MissingInStatement { span, .. }
            | ParserError::MissingCondition { span, .. }
            | ParserError::MissingOperand { span, .. }
            | ParserError::MissingArgument { span, .. }
            | ParserError::Unresolvable { span, .. } => *span,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            ParserError::MissingIdentifier { location, .. }
            | ParserError::MissingTypeAnnotation { location, .. }
            | ParserError::MissingTypeName { location, .. }
            | ParserError::MissingDelimiter { location, .. }
            | ParserError::DeclarationSyntax { location, .. }
            | ParserError::MissingRightValue { location, .. }
            | ParserError::MissingArgumentLabel { location, .. }
            | ParserError::MissingParameterLabel { location, .. }
            | ParserError::MissingColonAfterLabel { location, .. }
            | ParserError::MissingFunctionName { location, .. }
            | ParserError::MissingOpeningBracket { location, .. }
            | ParserError::MissingClosingBracket { location, .. }
            | ParserError::MissingRightArrow { location, .. }
            | ParserError::MissingReturnType { location, .. }
            | ParserError::MissingOpeningCurlyBracket { location, .. }
            | ParserError::MissingUntilCondition { location, .. }
            | ParserError::MissingInStatement { location, .. }
            | ParserError::MissingCondition { location, .. }
            | ParserError::MissingOperand { location, .. }
            | ParserError::MissingArgument { location, .. }
            | ParserError::Unresolvable { location, .. } => *location,
        }
    }
}

/// 语义分析器可能产生的所有错误的集合。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SemanticError {
    /// 引用了一个从未声明过的符号。
    #[error("[ERROR] Undeclared symbol '{name}' at location {location}")]
    UndeclaredSymbol {
        name: String,
        location: Location,
        span: Span,
    },

    /// 在同一个命名空间里重复声明了同名符号。
    #[error("[ERROR] Redeclared symbol '{name}' at location {location}")]
    RedeclaredSymbol {
        name: String,
        location: Location,
        span: Span,
    },

    /// 对 `let` 声明的常量进行第二次赋值。
    #[error("[ERROR] Cannot modify immutable symbol '{name}' at location {location}")]
    ImmutableModification {
        name: String,
        location: Location,
        span: Span,
    },

    /// 操作符的操作数类型不满足类型规则。
    #[error("[ERROR] Operation type mismatch: operator '{operator}' expects {expected} but found {found} at location {location}")]
    OperationTypeMismatch {
        operator: String,
        expected: String,
        found: String,
        location: Location,
        span: Span,
    },

    /// 条件表达式的类型不是 'Bool'。
    #[error("[ERROR] Invalid condition: expected 'Bool' but found '{found}' at location {location}")]
    InvalidCondition {
        found: String,
        location: Location,
        span: Span,
    },
}

impl SemanticError {
    pub fn span(&self) -> Span {
        match self {
            SemanticError::UndeclaredSymbol { span, .. }
            | SemanticError::RedeclaredSymbol { span, .. }
            | SemanticError::ImmutableModification { span, .. }
            | SemanticError::OperationTypeMismatch { span, .. }
            | SemanticError::InvalidCondition { span, .. } => *span,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            SemanticError::UndeclaredSymbol { location, .. }
            | SemanticError::RedeclaredSymbol { location, .. }
            | SemanticError::ImmutableModification { location, .. }
            | SemanticError::OperationTypeMismatch { location, .. }
            | SemanticError::InvalidCondition { location, .. } => *location,
        }
    }
}
