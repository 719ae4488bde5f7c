use ariadne::{Color, Label as AriadneLabel, Report, ReportKind, Source};

use crate::reporter::CompilerError;
use std::fmt;
use std::ops;

// --- 1. Location: 行列位置 ---

/// 源代码中的一个位置，行和列都从 1 开始计数。
/// 每个 Token 都携带一个 Location，并经由锚点 Token 传播到 AST 节点上。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// --- 2. Span: 字节范围 ---

/// 源代码中的一个字节范围，用于渲染带上下文的诊断报告。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn to(self, other: Span) -> Self {
        Self::new(self.start, other.end)
    }

    pub fn into_range(self) -> ops::Range<usize> {
        self.start..self.end
    }
}

// --- 3. DiagnosticBag: 错误收集器 ---

/// 按出现顺序收集整个编译过程中产生的所有错误。
/// 它持有一份源代码的拷贝，以便在渲染报告时提供上下文。
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    source: String,
    diagnostics: Vec<CompilerError>,
}

impl DiagnosticBag {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            diagnostics: Vec::new(),
        }
    }

    /// 记录一个编译错误。
    pub fn report(&mut self, error: CompilerError) {
        self.diagnostics.push(error);
    }

    /// 一次性并入某个编译阶段产生的整条错误流。
    pub fn extend(&mut self, errors: Vec<CompilerError>) {
        self.diagnostics.extend(errors);
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompilerError> {
        self.diagnostics.iter()
    }

    /// 将所有诊断以固定的单行格式打印到标准错误流。
    pub fn print(&self) {
        for diagnostic in &self.diagnostics {
            eprintln!("{diagnostic}");
        }
    }

    /// 将所有诊断渲染为带源代码上下文的报告（`--pretty` 模式）。
    pub fn print_pretty(&self, file_name: &str) {
        let cache = (file_name, Source::from(self.source.as_str()));

        for diagnostic in &self.diagnostics {
            let span = diagnostic.span();

            let report = Report::build(ReportKind::Error, (file_name, span.into_range()))
                .with_message(diagnostic.to_string())
                .with_label(
                    AriadneLabel::new((file_name, span.into_range()))
                        .with_message(format!("at location {}", diagnostic.location()))
                        .with_color(Color::Red),
                )
                .finish();

            // 渲染失败（如管道关闭）时退回到普通格式
            if report.eprint(cache.clone()).is_err() {
                eprintln!("{diagnostic}");
            }
        }
    }
}
