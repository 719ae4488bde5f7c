// 符号表。
// 语义分析期间管理标识符与其声明信息之间的映射，
// 以及由整数层级表示的嵌套命名空间。

use crate::diagnostic::Location;
use crate::parser::ast::FoldedValue;
use std::fmt;

/// 符号表中的一条符号记录。
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// 变量、常量或函数的名字。
    pub identifier: String,
    /// 声明的类型名（对函数而言是返回类型名）。
    pub type_name: String,
    /// 符号所属的命名空间层级。
    pub namespace: u32,
    /// 是否已经被赋过值。常量的“只许赋值一次”规则靠它把关。
    pub has_initialized: bool,
    /// `var` 声明为可变，`let` 声明为不可变。
    pub is_mutable: bool,
    /// 符号被声明的位置。
    pub declaration_location: Location,
    /// 常量传播得到的编译期值（若有）。
    pub value: Option<FoldedValue>,
}

/// 符号表：一组按声明顺序存放的符号，配合一个当前命名空间计数器。
///
/// 查找总是从最近的声明往回走，所以内层声明自然遮蔽外层同名符号；
/// 退出命名空间时移除该层级的全部符号，于是“全局查找”本身就是
/// 可见性查找——已经弹出的内层符号不可能再被找到。
#[derive(Debug, Default)]
pub struct SymbolTable {
    /// 所有存活的符号，最近声明的在末尾。
    symbols: Vec<Symbol>,
    /// 当前命名空间层级，0 为全局。
    current_namespace: u32,
}

impl SymbolTable {
    /// 创建一个空的符号表，命名空间从 0（全局）开始。
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// 在当前命名空间里登记一个新符号。
    /// 新符号默认未初始化、不可变，由调用方按声明种类修正。
    pub fn add(&mut self, identifier: &str, type_name: &str, location: Location) {
        self.symbols.push(Symbol {
            identifier: identifier.to_string(),
            type_name: type_name.to_string(),
            namespace: self.current_namespace,
            has_initialized: false,
            is_mutable: false,
            declaration_location: location,
            value: None,
        });
    }

    /// 最近登记的那个符号，供刚插入之后的修正使用。
    pub fn latest_symbol_mut(&mut self) -> Option<&mut Symbol> {
        self.symbols.last_mut()
    }

    /// 从最近的声明开始查找一个符号（可见性查找）。
    pub fn lookup(&self, identifier: &str) -> Option<&Symbol> {
        self.symbols
            .iter()
            .rev()
            .find(|symbol| symbol.identifier == identifier)
    }

    /// `lookup` 的可变版本。
    pub fn lookup_mut(&mut self, identifier: &str) -> Option<&mut Symbol> {
        self.symbols
            .iter_mut()
            .rev()
            .find(|symbol| symbol.identifier == identifier)
    }

    /// 只在当前命名空间层级里查找（重复声明检测）。
    /// 可见性查找用 `lookup`：这两个是语义不同的两个操作。
    pub fn lookup_in_current_namespace(&self, identifier: &str) -> Option<&Symbol> {
        self.symbols
            .iter()
            .rev()
            .filter(|symbol| symbol.namespace == self.current_namespace)
            .find(|symbol| symbol.identifier == identifier)
    }

    /// 进入一个新的嵌套命名空间。
    pub fn enter_namespace(&mut self) {
        self.current_namespace += 1;
    }

    /// 退出当前命名空间：移除本层级的所有符号，
    /// 然后把计数器减一（但绝不降到全局层级以下）。
    pub fn exit_namespace(&mut self) {
        let current = self.current_namespace;
        self.symbols.retain(|symbol| symbol.namespace != current);

        if self.current_namespace > 0 {
            self.current_namespace -= 1;
        }
    }

    /// 当前命名空间层级。
    pub fn current_namespace(&self) -> u32 {
        self.current_namespace
    }

    /// 存活符号的数量。
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

// 固定列宽的符号表转储，按最近声明在前的顺序排列。
impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "---------------------------------- Symbol Table -----------------------------------"
        )?;
        writeln!(
            f,
            "{:<20} {:<20} {:<10} {:<12} {:<8} {}",
            "Identifier", "Type", "Namespace", "Initialized", "Mutable", "Location"
        )?;

        for symbol in self.symbols.iter().rev() {
            writeln!(
                f,
                "{:<20} {:<20} {:<10} {:<12} {:<8} {}",
                symbol.identifier,
                symbol.type_name,
                symbol.namespace,
                if symbol.has_initialized { "Yes" } else { "No" },
                if symbol.is_mutable { "Yes" } else { "No" },
                symbol.declaration_location,
            )?;
        }

        write!(
            f,
            "-----------------------------------------------------------------------------------"
        )
    }
}
