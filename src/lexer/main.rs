// 主词法分析器模块。
// 包含 Lexer 结构体和把源代码变成 Token 流的全部逻辑。
//
// Opus 的词法分析是上下文相关的：换行只有在圆括号和方括号
// 之外才是语句终结符，而 `!` 究竟是后缀阶乘还是前缀取反
// 取决于上一个产出的 Token。因此 Lexer 在多次调用之间携带
// 上一个 Token 的种类和一组括号嵌套计数器。

use super::reader::{SourceReader, EOF_CHAR};
use super::token::*;
use crate::diagnostic::{Location, Span};
use crate::reporter::{CompilerError, LexerError};

// --- 1. 括号嵌套计数 ---

/// 三类括号各自的嵌套深度。计数器在任何时刻都不为负：
/// 多余的闭括号不会使其下穿 0（语法错误留给解析器报告）。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BracketNesting {
    pub round: u32,
    pub curly: u32,
    pub square: u32,
}

impl BracketNesting {
    /// 换行是否应当被视为普通空白。
    /// 花括号内的语句仍然由换行终结，所以只看圆括号和方括号。
    fn suppresses_delimiter(&self) -> bool {
        self.round > 0 || self.square > 0
    }

    /// 三个计数器是否全部归零。
    pub fn is_balanced(&self) -> bool {
        self.round == 0 && self.curly == 0 && self.square == 0
    }
}

// --- 2. Lexer 定义 ---

/// 词法分析器。每次调用 `next_token` 返回恰好一个 Token；
/// 词法错误也以 Token 的形式产出（种类为 `TokenKind::Error`），
/// 同时记入自己的错误流，这样解析器可以拿着错误 Token 继续同步。
pub struct Lexer<'a> {
    /// 带位置追踪的字符读取器。
    reader: SourceReader<'a>,
    /// 上一个产出的 Token 的种类。
    previous_kind: TokenKind,
    /// 括号嵌套计数器。
    nesting: BracketNesting,
    /// 本阶段收集到的所有词法错误。
    errors: Vec<CompilerError>,
    /// 是否已经做过文件末尾的收尾检查（未闭合括号只报告一次）。
    finalized: bool,
}

impl<'a> Lexer<'a> {
    /// 创建一个新的 Lexer 实例。
    pub fn new(source: &'a str) -> Self {
        Lexer {
            reader: SourceReader::new(source),
            // 文件开头等同于一条语句的开头
            previous_kind: TokenKind::Delimiter,
            nesting: BracketNesting::default(),
            errors: Vec::new(),
            finalized: false,
        }
    }

    /// 读取下一个 Token。
    pub fn next_token(&mut self) -> Token {
        loop {
            self.reader.locate_start_of_next_token();

            let location = self.reader.location();
            let start = self.reader.offset();
            let character = self.reader.peek();

            if character == EOF_CHAR {
                return self.finalize(location, start);
            }

            // 换行：圆括号和方括号之外才是语句终结符
            if character == '\n' {
                self.reader.consume();

                if self.nesting.suppresses_delimiter() {
                    continue;
                }

                return self.emit(TokenKind::Delimiter, "\n", location, start);
            }

            if character.is_ascii_digit() {
                return self.scan_numeric(location, start);
            }

            // 负数字面量：减号直接贴着数字，且上一个 Token 不可能
            // 结束一个表达式（否则它是二元减号）
            if character == '-'
                && self.reader.peek_next().is_ascii_digit()
                && !self.previous_kind.can_end_expression()
            {
                return self.scan_numeric(location, start);
            }

            if character.is_alphabetic() || character == '_' {
                return self.scan_identifier(location, start);
            }

            if character == '"' {
                return self.scan_string(location, start);
            }

            return self.scan_operator(location, start);
        }
    }

    /// 驱动 `next_token` 直到文件末尾，返回完整的 Token 流
    /// （包括末尾的 EOF Token）。供 Token 转储与测试使用。
    pub fn scan_all_tokens(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        tokens
    }

    /// 取走本阶段收集到的所有词法错误。
    pub fn take_errors(&mut self) -> Vec<CompilerError> {
        std::mem::take(&mut self.errors)
    }

    /// 当前的括号嵌套计数。
    pub fn nesting(&self) -> BracketNesting {
        self.nesting
    }

    // --- 收尾与 Token 构造 ---

    /// 文件末尾的收尾：检查括号嵌套计数，每个非零计数器
    /// 报告一个未闭合括号错误；之后稳定地返回 EOF Token。
    fn finalize(&mut self, location: Location, start: usize) -> Token {
        if !self.finalized {
            self.finalized = true;

            let unclosed = [
                (self.nesting.round, '('),
                (self.nesting.curly, '{'),
                (self.nesting.square, '['),
            ];

            for (count, bracket) in unclosed {
                if count > 0 {
                    self.errors.push(
                        LexerError::UnclosedBracket {
                            bracket,
                            location,
                            span: Span::new(start, start),
                        }
                        .into(),
                    );
                }
            }
        }

        Token::new(TokenKind::Eof, "", location, Span::new(start, start))
    }

    /// 构造一个普通 Token 并更新上下文状态。
    fn emit(&mut self, kind: TokenKind, lexeme: impl Into<String>, location: Location, start: usize) -> Token {
        self.previous_kind = kind.clone();
        let span = Span::new(start, self.reader.offset());
        Token::new(kind, lexeme, location, span)
    }

    /// 构造一个错误 Token，并把对应的词法错误记入错误流。
    fn emit_error(&mut self, error: TokenError, lexeme: String, location: Location, start: usize) -> Token {
        let span = Span::new(start, self.reader.offset());

        self.errors.push(
            LexerError::InvalidToken {
                error,
                lexeme: lexeme.clone(),
                location,
                span,
            }
            .into(),
        );

        self.previous_kind = TokenKind::Error(error);
        Token::new(TokenKind::Error(error), lexeme, location, span)
    }
}

// --- 3. 各类 Token 的扫描逻辑 ---

/// 定义了按 Token 种类划分的扫描辅助函数。
trait TokenScanner {
    /// 扫描数字字面量（可带负号前缀，至多一个小数点）。
    fn scan_numeric(&mut self, location: Location, start: usize) -> Token;
    /// 扫描标识符，随后重新归类为关键字或布尔字面量。
    fn scan_identifier(&mut self, location: Location, start: usize) -> Token;
    /// 扫描字符串字面量（首尾引号不计入词素）。
    fn scan_string(&mut self, location: Location, start: usize) -> Token;
    /// 扫描运算符、标点与括号。
    fn scan_operator(&mut self, location: Location, start: usize) -> Token;
    /// 无法组合的运算符字符串：吞掉整串连续的运算符字符。
    fn undefined_operator(&mut self, lexeme: String, location: Location, start: usize) -> Token;
}

/// 该字符是否属于运算符字符集。
fn is_operator_character(character: char) -> bool {
    matches!(
        character,
        '+' | '-' | '*' | '/' | '%' | '=' | '<' | '>' | '!' | '&' | '|'
    )
}

impl<'a> Lexer<'a> {
    /// 数字字面量的合法终结字符：空白、换行、文件末尾、
    /// 任何运算符字符、任何闭括号或逗号。
    fn is_numeric_terminator(character: char) -> bool {
        character == EOF_CHAR
            || character == '\n'
            || SourceReader::is_whitespace(character)
            || is_operator_character(character)
            || matches!(character, ')' | ']' | '}' | ',')
    }

    /// 紧跟在一个完整运算符后面的字符是否构成非法的运算符串。
    /// 指向数字的减号除外：那是一个负数字面量的开头。
    fn begins_operator_run(&mut self) -> bool {
        let character = self.reader.peek();
        is_operator_character(character)
            && !(character == '-' && self.reader.peek_next().is_ascii_digit())
    }
}

impl<'a> TokenScanner for Lexer<'a> {
    fn scan_numeric(&mut self, location: Location, start: usize) -> Token {
        let mut lexeme = String::new();
        let mut dots = 0;

        if self.reader.peek() == '-' {
            lexeme.push(self.reader.consume());
        }

        loop {
            let character = self.reader.peek();

            if character.is_ascii_digit() {
                lexeme.push(self.reader.consume());
            } else if character == '.' {
                dots += 1;
                lexeme.push(self.reader.consume());

                // 第二个小数点：吞掉剩余部分直到终结字符
                if dots > 1 {
                    while !Self::is_numeric_terminator(self.reader.peek()) {
                        lexeme.push(self.reader.consume());
                    }
                    lexeme.truncate(LEXEME_LENGTH);
                    return self.emit_error(TokenError::MalformedNumeric, lexeme, location, start);
                }
            } else {
                break;
            }
        }

        // 数字必须终结在合法的边界上，否则按格式错误恢复
        if !Self::is_numeric_terminator(self.reader.peek()) {
            while !Self::is_numeric_terminator(self.reader.peek()) {
                lexeme.push(self.reader.consume());
            }
            lexeme.truncate(LEXEME_LENGTH);
            return self.emit_error(TokenError::MalformedNumeric, lexeme, location, start);
        }

        if lexeme.len() > LEXEME_LENGTH {
            lexeme.truncate(LEXEME_LENGTH);
            return self.emit_error(TokenError::Overflow, lexeme, location, start);
        }

        self.emit(TokenKind::Numeric, lexeme, location, start)
    }

    fn scan_identifier(&mut self, location: Location, start: usize) -> Token {
        let mut lexeme = String::new();

        while self.reader.peek().is_alphanumeric() || self.reader.peek() == '_' {
            lexeme.push(self.reader.consume());
        }

        if lexeme.len() > LEXEME_LENGTH {
            lexeme.truncate(LEXEME_LENGTH);
            return self.emit_error(TokenError::Overflow, lexeme, location, start);
        }

        // 单个下划线不是合法标识符（双下划线是）
        if lexeme == "_" {
            return self.emit_error(TokenError::OrphanUnderscore, lexeme, location, start);
        }

        // 先检查是否为布尔字面量，再查关键字表，最后才是普通标识符
        let kind = match lexeme.as_str() {
            "true" | "false" => TokenKind::BooleanLiteral,
            text => Keyword::lookup(text)
                .map(TokenKind::Keyword)
                .unwrap_or(TokenKind::Identifier),
        };

        self.emit(kind, lexeme, location, start)
    }

    fn scan_string(&mut self, location: Location, start: usize) -> Token {
        // 消费起始引号
        self.reader.consume();

        let mut lexeme = String::new();

        loop {
            let character = self.reader.peek();

            if character == EOF_CHAR {
                lexeme.truncate(LEXEME_LENGTH);
                return self.emit_error(TokenError::UnterminatedString, lexeme, location, start);
            }

            self.reader.consume();

            if character == '"' {
                break;
            }

            // 反斜杠保护下一个字符不被当作引号处理，两个字符都原样保存
            if character == '\\' {
                if self.reader.is_at_end() {
                    lexeme.push('\\');
                    lexeme.truncate(LEXEME_LENGTH);
                    return self.emit_error(TokenError::UnterminatedString, lexeme, location, start);
                }

                lexeme.push('\\');
                lexeme.push(self.reader.consume());
                continue;
            }

            lexeme.push(character);
        }

        if lexeme.len() > LEXEME_LENGTH {
            lexeme.truncate(LEXEME_LENGTH);
            return self.emit_error(TokenError::Overflow, lexeme, location, start);
        }

        self.emit(TokenKind::StringLiteral, lexeme, location, start)
    }

    fn scan_operator(&mut self, location: Location, start: usize) -> Token {
        let character = self.reader.consume();

        // 括号与标点：更新嵌套计数后直接产出，不参与运算符串检查
        match character {
            '(' => {
                self.nesting.round += 1;
                return self.emit(TokenKind::Punctuation(Punctuation::LeftRound), "(", location, start);
            }
            ')' => {
                self.nesting.round = self.nesting.round.saturating_sub(1);
                return self.emit(TokenKind::Punctuation(Punctuation::RightRound), ")", location, start);
            }
            '{' => {
                self.nesting.curly += 1;
                return self.emit(TokenKind::Punctuation(Punctuation::LeftCurly), "{", location, start);
            }
            '}' => {
                self.nesting.curly = self.nesting.curly.saturating_sub(1);
                return self.emit(TokenKind::Punctuation(Punctuation::RightCurly), "}", location, start);
            }
            '[' => {
                self.nesting.square += 1;
                return self.emit(TokenKind::Punctuation(Punctuation::LeftSquare), "[", location, start);
            }
            ']' => {
                self.nesting.square = self.nesting.square.saturating_sub(1);
                return self.emit(TokenKind::Punctuation(Punctuation::RightSquare), "]", location, start);
            }
            ',' => return self.emit(TokenKind::Punctuation(Punctuation::Comma), ",", location, start),
            ':' => return self.emit(TokenKind::Punctuation(Punctuation::Colon), ":", location, start),
            _ => {}
        }

        // 单字符或双字符运算符，通过一格前瞻组合
        let (operator, lexeme) = match character {
            '+' => (Operator::Plus, "+"),
            '*' => (Operator::Star, "*"),
            '/' => (Operator::Slash, "/"),
            '%' => (Operator::Percent, "%"),

            '-' => {
                if self.reader.peek() == '>' {
                    self.reader.consume();
                    (Operator::Arrow, "->")
                } else {
                    (Operator::Minus, "-")
                }
            }

            '=' => {
                if self.reader.peek() == '=' {
                    self.reader.consume();
                    (Operator::Eq, "==")
                } else {
                    (Operator::Assign, "=")
                }
            }

            '<' => {
                if self.reader.peek() == '=' {
                    self.reader.consume();
                    (Operator::LtEq, "<=")
                } else {
                    (Operator::Lt, "<")
                }
            }

            '>' => {
                if self.reader.peek() == '=' {
                    self.reader.consume();
                    (Operator::GtEq, ">=")
                } else {
                    (Operator::Gt, ">")
                }
            }

            // `!=` 优先；否则按上一个 Token 区分阶乘与取反
            '!' => {
                if self.reader.peek() == '=' {
                    self.reader.consume();
                    (Operator::NotEq, "!=")
                } else if matches!(self.previous_kind, TokenKind::Numeric | TokenKind::Identifier) {
                    (Operator::Factorial, "!")
                } else {
                    (Operator::Not, "!")
                }
            }

            // `&` 和 `|` 只能成对出现
            '&' => {
                if self.reader.peek() == '&' {
                    self.reader.consume();
                    (Operator::AndAnd, "&&")
                } else {
                    return self.undefined_operator("&".to_string(), location, start);
                }
            }

            '|' => {
                if self.reader.peek() == '|' {
                    self.reader.consume();
                    (Operator::OrOr, "||")
                } else {
                    return self.undefined_operator("|".to_string(), location, start);
                }
            }

            unknown => {
                return self.emit_error(TokenError::Unrecognizable, unknown.to_string(), location, start);
            }
        };

        // 完整运算符后面再贴一个运算符字符就是非法的运算符串
        if self.begins_operator_run() {
            return self.undefined_operator(lexeme.to_string(), location, start);
        }

        self.emit(TokenKind::Operator(operator), lexeme, location, start)
    }

    fn undefined_operator(&mut self, mut lexeme: String, location: Location, start: usize) -> Token {
        while self.begins_operator_run() {
            lexeme.push(self.reader.consume());
        }

        lexeme.truncate(LEXEME_LENGTH);
        self.emit_error(TokenError::UndefinedOperator, lexeme, location, start)
    }
}
