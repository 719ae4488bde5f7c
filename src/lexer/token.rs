use crate::diagnostic::{Location, Span};
use std::fmt::{Display, Formatter, Result};

/// 词素的最大长度（以字节计）。超出这个长度的词素会被
/// 截断并产生一个 `TokenError::Overflow` 错误 Token。
pub const LEXEME_LENGTH: usize = 128;

/// 主体 Token 定义，包含其种类、词素和在源代码中的位置。
/// Token 是值对象：一旦由词法分析器产生就不再被修改。
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub location: Location,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, location: Location, span: Span) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            location,
            span,
        }
    }

    /// 是否是一个携带词法错误的 Token。
    pub fn is_error(&self) -> bool {
        matches!(self.kind, TokenKind::Error(_))
    }
}

// Token 的调试输出格式，也是 `--dump-tokens` 的逐行格式。
impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match &self.kind {
            TokenKind::Error(error) => write!(
                f,
                "<ERROR:{}, Lexeme:\"{}\"> at location {}",
                error,
                escape_lexeme(&self.lexeme),
                self.location
            ),
            kind => write!(
                f,
                "<Token:{}, Lexeme:\"{}\"> at location {}",
                kind,
                escape_lexeme(&self.lexeme),
                self.location
            ),
        }
    }
}

/// 将词素中的控制字符转义为可见形式（换行渲染为 `\n`）。
pub fn escape_lexeme(lexeme: &str) -> String {
    let mut escaped = String::with_capacity(lexeme.len());

    for character in lexeme.chars() {
        match character {
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }

    escaped
}

/// Opus 语言中所有可能的词法单元。
#[derive(Debug, PartialEq, Clone)]
pub enum TokenKind {
    /// 文件结束标志。
    Eof,

    /// 语句终结符：位于圆括号和方括号之外的换行。
    Delimiter,

    /// 数字字面量（整数或小数，词素原样保存）。
    Numeric,

    /// 字符串字面量（不含首尾引号）。
    StringLiteral,

    /// 布尔字面量（`true` 或 `false`）。
    BooleanLiteral,

    /// 标识符。
    Identifier,

    /// 关键字。
    Keyword(Keyword),

    /// 操作符。
    Operator(Operator),

    /// 分隔符与标点。
    Punctuation(Punctuation),

    /// 词法错误 Token，携带具体的错误种类。
    Error(TokenError),
}

impl TokenKind {
    /// 该种类的 Token 是否可以作为一个表达式的结尾。
    /// 词法分析器用它来区分负数字面量的减号和二元减号，
    /// 以及判断 `!` 应当是后缀阶乘还是前缀取反。
    pub fn can_end_expression(&self) -> bool {
        matches!(
            self,
            TokenKind::Numeric
                | TokenKind::StringLiteral
                | TokenKind::BooleanLiteral
                | TokenKind::Identifier
                | TokenKind::Operator(Operator::Factorial)
                | TokenKind::Punctuation(Punctuation::RightRound)
                | TokenKind::Punctuation(Punctuation::RightSquare)
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let name = match self {
            TokenKind::Eof => "EndOfFile",
            TokenKind::Delimiter => "Delimiter",
            TokenKind::Numeric => "Numeric",
            TokenKind::StringLiteral => "StringLiteral",
            TokenKind::BooleanLiteral => "BooleanLiteral",
            TokenKind::Identifier => "Identifier",
            TokenKind::Keyword(_) => "Keyword",
            TokenKind::Operator(_) => "Operator",
            TokenKind::Punctuation(_) => "Punctuation",
            TokenKind::Error(_) => "Error",
        };
        write!(f, "{}", name)
    }
}

/// Opus 语言中的关键字。
/// `true` 和 `false` 不在此列：它们在收集完标识符后被
/// 重新归类为 `BooleanLiteral`。
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Keyword {
    Var,
    Let,
    If,
    Else,
    Repeat,
    Until,
    For,
    In,
    Return,
    Func,
    Class,
    Struct,
}

impl Keyword {
    /// 尝试将一个字符串切片转换为一个关键字。
    pub fn lookup(text: &str) -> Option<Keyword> {
        match text {
            "var" => Some(Keyword::Var),
            "let" => Some(Keyword::Let),
            "if" => Some(Keyword::If),
            "else" => Some(Keyword::Else),
            "repeat" => Some(Keyword::Repeat),
            "until" => Some(Keyword::Until),
            "for" => Some(Keyword::For),
            "in" => Some(Keyword::In),
            "return" => Some(Keyword::Return),
            "func" => Some(Keyword::Func),
            "class" => Some(Keyword::Class),
            "struct" => Some(Keyword::Struct),
            _ => None,
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            Keyword::Var => "var",
            Keyword::Let => "let",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::Repeat => "repeat",
            Keyword::Until => "until",
            Keyword::For => "for",
            Keyword::In => "in",
            Keyword::Return => "return",
            Keyword::Func => "func",
            Keyword::Class => "class",
            Keyword::Struct => "struct",
        };
        write!(f, "{}", text)
    }
}

/// 运算符。
/// 同一个 `!` 字符按上下文拆成两个不同的运算符：
/// 跟在数字或标识符后面是后缀阶乘（`Factorial`），否则是前缀取反（`Not`）。
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Operator {
    // Arithmetic
    Plus,      // +
    Minus,     // -
    Star,      // *
    Slash,     // /
    Percent,   // %
    Factorial, // ! (postfix)

    // Logical
    Not,    // ! (prefix)
    AndAnd, // &&
    OrOr,   // ||

    // Comparison
    Eq,    // ==
    NotEq, // !=
    Lt,    // <
    Gt,    // >
    LtEq,  // <=
    GtEq,  // >=

    // Assignment & function signature
    Assign, // =
    Arrow,  // ->
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Percent => "%",
            Operator::Factorial => "!",
            Operator::Not => "!",
            Operator::AndAnd => "&&",
            Operator::OrOr => "||",
            Operator::Eq => "==",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::LtEq => "<=",
            Operator::GtEq => ">=",
            Operator::Assign => "=",
            Operator::Arrow => "->",
        };
        write!(f, "{}", text)
    }
}

/// 分隔符与标点。
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Punctuation {
    LeftRound,   // (
    RightRound,  // )
    LeftCurly,   // {
    RightCurly,  // }
    LeftSquare,  // [
    RightSquare, // ]
    Comma,       // ,
    Colon,       // :
}

impl Display for Punctuation {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            Punctuation::LeftRound => "(",
            Punctuation::RightRound => ")",
            Punctuation::LeftCurly => "{",
            Punctuation::RightCurly => "}",
            Punctuation::LeftSquare => "[",
            Punctuation::RightSquare => "]",
            Punctuation::Comma => ",",
            Punctuation::Colon => ":",
        };
        write!(f, "{}", text)
    }
}

/// Token 级别的词法错误种类。
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenError {
    /// 数字字面量格式错误（例如多个小数点或非法的终结字符）。
    MalformedNumeric,
    /// 一串无法识别的运算符字符（例如 `=!` 或孤立的 `&`）。
    UndefinedOperator,
    /// 词素超出了长度上限。
    Overflow,
    /// 孤立的下划线（`__` 是合法标识符，单个 `_` 不是）。
    OrphanUnderscore,
    /// 到文件末尾都没有闭合的字符串字面量。
    UnterminatedString,
    /// 无法归入任何 Token 种类的字符。
    Unrecognizable,
}

impl Display for TokenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let name = match self {
            TokenError::MalformedNumeric => "MalformedNumeric",
            TokenError::UndefinedOperator => "UndefinedOperator",
            TokenError::Overflow => "Overflow",
            TokenError::OrphanUnderscore => "OrphanUnderscore",
            TokenError::UnterminatedString => "UnterminatedString",
            TokenError::Unrecognizable => "Unrecognizable",
        };
        write!(f, "{}", name)
    }
}
