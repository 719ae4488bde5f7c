//! src/diagnostic/mod.rs
//!
//! 诊断系统的公共接口：位置类型（`Location` 与 `Span`）以及
//! 收集各编译阶段错误的 `DiagnosticBag`。

mod main;

pub use main::{DiagnosticBag, Location, Span};
