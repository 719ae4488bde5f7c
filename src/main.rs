// src/main.rs

use clap::Parser;
use opusc::analyzer::Analyzer;
use opusc::diagnostic::DiagnosticBag;
use opusc::lexer::Lexer;
use opusc::parser;
use std::env;
use std::fs;
use std::process;

/// Opus 源文件必须携带的扩展名。
const OPUS_FILE_EXTENSION: &str = ".opus";

// 各阶段失败时的退出码。
const EXIT_USAGE: i32 = 1;
const EXIT_SOURCE: i32 = 2;
const EXIT_PARSING: i32 = 3;
const EXIT_ANALYSIS: i32 = 4;

/// Opus 编程语言的编译器前端
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 需要编译的 Opus 源文件路径
    input_file: String,

    /// 打印词法分析得到的 Token 流
    #[arg(long)]
    dump_tokens: bool,

    /// 打印解析得到的抽象语法树
    #[arg(long)]
    dump_ast: bool,

    /// 打印语义分析结束后的符号表
    #[arg(long)]
    dump_symbols: bool,

    /// 将诊断渲染为带源代码上下文的报告
    #[arg(long)]
    pretty: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            // --help / --version 正常打印并成功退出
            if matches!(
                error.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) {
                print!("{error}");
                process::exit(0);
            }

            let program = env::args()
                .next()
                .unwrap_or_else(|| "opusc".to_string());
            eprintln!("Usage: {} <source_file{}>", program, OPUS_FILE_EXTENSION);
            process::exit(EXIT_USAGE);
        }
    };

    // 任何词法分析开始之前先把住文件扩展名这道门
    if !is_opus_source_code(&cli.input_file) {
        eprintln!(
            "Error: File '{}' is not the Opus source code. (Must be {} files)",
            cli.input_file, OPUS_FILE_EXTENSION
        );
        process::exit(EXIT_SOURCE);
    }

    let source = match fs::read_to_string(&cli.input_file) {
        Ok(source) => source,
        Err(_) => {
            eprintln!(
                "Error: Could not open the provided Opus source code '{}'.",
                cli.input_file
            );
            process::exit(EXIT_SOURCE);
        }
    };

    if cli.dump_tokens {
        let mut lexer = Lexer::new(&source);
        for token in lexer.scan_all_tokens() {
            println!("{token}");
        }
    }

    // --- 统一的编译管道 ---

    let mut diagnostics = DiagnosticBag::new(&source);

    // 1. 词法 + 语法分析
    let (mut ast, errors) = parser::parse(&source);

    if cli.dump_ast {
        print!("{ast}");
    }

    diagnostics.extend(errors);
    if diagnostics.has_errors() {
        report(&diagnostics, &cli);
        process::exit(EXIT_PARSING);
    }

    // 2. 语义分析
    let mut analyzer = Analyzer::new();
    analyzer.analyze(&mut ast);

    if cli.dump_symbols {
        println!("{}", analyzer.symbol_table());
    }

    diagnostics.extend(analyzer.take_errors());
    if diagnostics.has_errors() {
        report(&diagnostics, &cli);
        process::exit(EXIT_ANALYSIS);
    }
}

/// 按用户选择的格式打印收集到的诊断。
fn report(diagnostics: &DiagnosticBag, cli: &Cli) {
    if cli.pretty {
        diagnostics.print_pretty(&cli.input_file);
    } else {
        diagnostics.print();
    }
}

/// 检查给定的文件是否带有 '.opus' 扩展名。
fn is_opus_source_code(filename: &str) -> bool {
    filename.ends_with(OPUS_FILE_EXTENSION)
}
