// 源代码读取器。
// 为词法分析器提供带行列追踪的单字符窥视与消费原语。

use crate::diagnostic::Location;
use std::iter::Peekable;
use std::str::Chars;

/// 表示文件末尾的哨兵字符。
pub const EOF_CHAR: char = '\0';

/// 源代码读取器，在字符流上维护行、列与字节偏移。
///
/// `peek` 与 `consume` 的分离是整个词法分析器的基石：
/// `peek` 绝不移动位置计数器，在下一次 `consume` 之前对同一个
/// 字符的任何次数的窥视都返回相同的结果。
pub struct SourceReader<'a> {
    /// 可窥视的字符迭代器。
    chars: Peekable<Chars<'a>>,
    /// 下一个待消费字符的行列位置（1 起始）。
    location: Location,
    /// 下一个待消费字符的字节偏移。
    offset: usize,
}

impl<'a> SourceReader<'a> {
    pub fn new(source: &'a str) -> Self {
        SourceReader {
            chars: source.chars().peekable(),
            location: Location::new(1, 1),
            offset: 0,
        }
    }

    /// 返回下一个字符但不消费它；到达末尾时返回 `EOF_CHAR`。
    pub fn peek(&mut self) -> char {
        self.chars.peek().copied().unwrap_or(EOF_CHAR)
    }

    /// 返回下下个字符（前瞻一格），不消费任何字符。
    pub fn peek_next(&mut self) -> char {
        let mut lookahead = self.chars.clone();
        lookahead.next();
        lookahead.next().unwrap_or(EOF_CHAR)
    }

    /// 消费并返回下一个字符，同时更新位置信息：
    /// 换行使行号加一、列号回到 1，其余字符使列号加一。
    pub fn consume(&mut self) -> char {
        let character = self.chars.next().unwrap_or(EOF_CHAR);

        if character != EOF_CHAR {
            self.offset += character.len_utf8();

            if character == '\n' {
                self.location.line += 1;
                self.location.column = 1;
            } else {
                self.location.column += 1;
            }
        }

        character
    }

    /// 是否已到达源代码末尾。
    pub fn is_at_end(&mut self) -> bool {
        self.peek() == EOF_CHAR
    }

    /// 下一个待消费字符的位置。
    pub fn location(&self) -> Location {
        self.location
    }

    /// 下一个待消费字符的字节偏移。
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 该字符是否是 Opus 的空白字符。
    /// 注意换行不是空白：它在括号之外是语句终结符。
    pub fn is_whitespace(character: char) -> bool {
        matches!(character, ' ' | '\t' | '\x0B' | '\r' | '\x0C')
    }

    /// 跳过空白与 `//` 单行注释，使读取器停在下一个 Token 的起始字符上。
    /// 注释只吞到行尾为止，换行本身留给词法分析器判定。
    pub fn locate_start_of_next_token(&mut self) {
        loop {
            let character = self.peek();

            if Self::is_whitespace(character) {
                self.consume();
            } else if character == '/' && self.peek_next() == '/' {
                while self.peek() != '\n' && !self.is_at_end() {
                    self.consume();
                }
            } else {
                break;
            }
        }
    }

    /// 跳到下一行的行首（消费到换行为止，包括换行本身）。
    pub fn locate_start_of_next_line(&mut self) {
        while !self.is_at_end() {
            if self.consume() == '\n' {
                break;
            }
        }
    }
}
