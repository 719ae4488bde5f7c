//! Opus 语言的解析器实现。
//! 采用自顶向下的递归下降技术把 Token 流转换为抽象语法树 (AST)，
//! 表达式部分是一组按优先级分层的解析函数，错误恢复使用
//! 恐慌模式：在下一个语句终结符处同步。

use super::ast::*;
use crate::lexer::*;
use crate::reporter::{CompilerError, ParserError};

/// 在当前位置记录一个语法错误。
/// 统一的定位规则：位置取当前 Token（本应出现合法延续的地方），
/// `after` 取前一个 Token 的词素。
macro_rules! syntax_error {
    ($parser:expr, $kind:ident) => {
        $parser.report(ParserError::$kind {
            after: $parser.diagnostic.lexeme.clone(),
            location: $parser.current.location,
            span: $parser.current.span,
        })
    };
}

// --- 1. 主解析器结构体 ---

/// 解析器，持有解析过程所需的全部状态。
pub struct Parser<'a> {
    /// 按需产出 Token 的词法分析器。
    lexer: Lexer<'a>,
    /// 当前待处理的 Token。
    current: Token,
    /// 前一个被消费的 Token，用于生成诊断信息。
    diagnostic: Token,
    /// 本阶段收集到的所有语法错误。
    errors: Vec<CompilerError>,
}

impl<'a> Parser<'a> {
    /// 创建一个新的解析器实例并预读第一个 Token。
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        let diagnostic = current.clone();

        Parser {
            lexer,
            current,
            diagnostic,
            errors: Vec::new(),
        }
    }
}

// --- 2. Trait 定义：用于组织解析逻辑 ---

/// `Parse` Trait 是解析器的总入口。
pub trait Parse {
    /// 消耗解析器并启动整个解析过程，返回根 Program 节点
    /// 和按出现顺序排列的错误流（词法错误在前）。
    fn parse(self) -> (AstNode, Vec<CompilerError>);
}

/// `StatementParser` Trait 负责解析各类语句。
trait StatementParser {
    /// 解析语句序列的 cons 脊柱（Program 节点链）。
    fn parse_program(&mut self) -> AstNode;
    /// 解析任意类型的语句（按第一个 Token 分发）。
    fn parse_statement(&mut self) -> Result<AstNode, ()>;
    /// 解析 `var` / `let` 声明，可能延续为一条带初始化的赋值语句。
    fn parse_declaration_statement(&mut self) -> Result<AstNode, ()>;
    /// 解析赋值语句。左值节点（声明或标识符）由调用方提供。
    fn parse_assignment_statement(&mut self, left_value: AstNode) -> Result<AstNode, ()>;
    /// 解析一条表达式语句。
    fn parse_expression_statement(&mut self) -> Result<AstNode, ()>;
    /// 解析函数定义，后随代码块时升级为函数实现。
    fn parse_function_definition(&mut self) -> Result<AstNode, ()>;
    /// 解析函数形参表（右倾 cons 结构）。
    fn parse_parameter_list(&mut self) -> Result<AstNode, ()>;
    /// 解析一个 `{...}` 代码块。
    fn parse_code_block(&mut self) -> Result<AstNode, ()>;
    /// 解析代码块内部的语句 cons 链（消费结尾的 `}`）。
    fn parse_block_chain(&mut self) -> AstNode;
    /// 解析 `return` 语句。
    fn parse_return_statement(&mut self) -> Result<AstNode, ()>;
    /// 解析 `if` 语句，包括 `else if` / `else` 链。
    fn parse_conditional_statement(&mut self) -> Result<AstNode, ()>;
    /// 解析 `repeat-until` 语句。
    fn parse_repeat_until_statement(&mut self) -> Result<AstNode, ()>;
    /// 解析 `for-in` 语句。
    fn parse_for_in_statement(&mut self) -> Result<AstNode, ()>;
}

/// `ExpressionParser` Trait 负责解析各类表达式。
/// 每个函数对应一个优先级层次，自低向高。
trait ExpressionParser {
    /// 表达式解析的主入口（最低优先级）。
    fn parse_expression(&mut self) -> Result<AstNode, ()>;
    /// 逻辑或（`||`），左结合。
    fn parse_logical_or(&mut self) -> Result<AstNode, ()>;
    /// 逻辑与（`&&`），左结合。
    fn parse_logical_and(&mut self) -> Result<AstNode, ()>;
    /// 比较运算（`< > <= >= == !=`），左结合。
    fn parse_comparison(&mut self) -> Result<AstNode, ()>;
    /// 加减运算，左结合。
    fn parse_addition(&mut self) -> Result<AstNode, ()>;
    /// 乘除模运算，左结合。
    fn parse_multiplication(&mut self) -> Result<AstNode, ()>;
    /// 前缀一元运算（`-`、`!`），右结合。
    fn parse_prefix(&mut self) -> Result<AstNode, ()>;
    /// 后缀运算（阶乘 `!` 与函数调用），左结合、可链式。
    fn parse_postfix(&mut self) -> Result<AstNode, ()>;
    /// 原子表达式：字面量、标识符、括号表达式、布尔关键字。
    fn parse_primary(&mut self) -> Result<AstNode, ()>;
    /// 解析函数调用（`(` 已经在望）。
    fn parse_function_call(&mut self, callee: AstNode) -> Result<AstNode, ()>;
    /// 解析带标签的实参表（右倾 cons 结构）。
    fn parse_argument_list(&mut self) -> Result<AstNode, ()>;
}

/// `Util` Trait 提供解析过程中常用的一系列辅助函数。
trait Util {
    /// 消费当前 Token 并返回它，同时预读下一个。
    fn advance(&mut self) -> Token;
    /// 检查当前 Token 是否是指定的种类。
    fn check(&self, kind: &TokenKind) -> bool;
    /// 如果当前 Token 是指定种类，则消费它并返回 `true`。
    fn match_token(&mut self, kind: &TokenKind) -> bool;
    /// 消费一个语句终结符；文件末尾也视为语句的合法结尾。
    fn expect_delimiter(&mut self) -> Result<(), ()>;
    /// 记录一个语法错误。
    fn report(&mut self, error: ParserError);
    /// 恐慌模式恢复：丢弃 Token 直到下一个语句终结符（并消费它）。
    fn escape_parse_error(&mut self);
    /// 在语句层包裹一次解析：失败时同步并替换为 Error 子树。
    fn recover_statement(&mut self) -> AstNode;
    /// 当前 Token 是否可以作为一个表达式的开头。
    fn is_expression_start(&self) -> bool;
}

// --- 3. 入口实现 ---

impl<'a> Parse for Parser<'a> {
    fn parse(mut self) -> (AstNode, Vec<CompilerError>) {
        let program = self.parse_program();

        // 词法错误在前，语法错误在后（与各自被发现的顺序一致）
        let mut errors = self.lexer.take_errors();
        errors.extend(self.errors);

        (program, errors)
    }
}

// --- 4. 语句解析 ---

impl<'a> StatementParser for Parser<'a> {
    /// Program 是一条右倾的 cons 链：左孩子是一条语句，
    /// 右孩子是余下的 Program；没有孩子的 Program 节点是链尾。
    /// 文件末尾缺少换行时，EOF 同样终结最后一条语句。
    fn parse_program(&mut self) -> AstNode {
        let mut program = AstNode::new(AstKind::Program, self.current.clone());

        // 跳过语句之间多余的终结符
        while self.check(&TokenKind::Delimiter) {
            self.advance();
        }

        if self.check(&TokenKind::Eof) {
            return program;
        }

        let statement = self.recover_statement();
        program.left = Some(Box::new(statement));
        program.right = Some(Box::new(self.parse_program()));

        program
    }

    fn parse_statement(&mut self) -> Result<AstNode, ()> {
        match self.current.kind {
            TokenKind::Keyword(Keyword::Var) | TokenKind::Keyword(Keyword::Let) => {
                self.parse_declaration_statement()
            }
            TokenKind::Keyword(Keyword::Func) => self.parse_function_definition(),
            TokenKind::Keyword(Keyword::Return) => self.parse_return_statement(),
            TokenKind::Keyword(Keyword::If) => self.parse_conditional_statement(),
            TokenKind::Keyword(Keyword::Repeat) => self.parse_repeat_until_statement(),
            TokenKind::Keyword(Keyword::For) => self.parse_for_in_statement(),
            _ if self.is_expression_start() => self.parse_expression_statement(),
            _ => {
                self.report(ParserError::Unresolvable {
                    lexeme: self.current.lexeme.clone(),
                    location: self.current.location,
                    span: self.current.span,
                });
                Err(())
            }
        }
    }

    /// Declaration -> ("var" | "let") Identifier ':' Identifier
    ///                (Delimiter | '=' Expression Delimiter)
    fn parse_declaration_statement(&mut self) -> Result<AstNode, ()> {
        let anchor = self.advance();
        let kind = if anchor.kind == TokenKind::Keyword(Keyword::Var) {
            AstKind::VariableDeclaration
        } else {
            AstKind::ConstantDeclaration
        };

        if !self.check(&TokenKind::Identifier) {
            syntax_error!(self, MissingIdentifier);
            return Err(());
        }
        let identifier = AstNode::new(AstKind::Identifier, self.advance());

        if !self.match_token(&TokenKind::Punctuation(Punctuation::Colon)) {
            syntax_error!(self, MissingTypeAnnotation);
            return Err(());
        }

        if !self.check(&TokenKind::Identifier) {
            syntax_error!(self, MissingTypeName);
            return Err(());
        }
        let annotation = AstNode::new(AstKind::TypeAnnotation, self.advance());

        let declaration = AstNode::new(kind, anchor)
            .with_left(identifier)
            .with_right(annotation);

        // 声明或者就此终结，或者延续为一条带初始化的赋值语句
        if self.check(&TokenKind::Operator(Operator::Assign)) {
            return self.parse_assignment_statement(declaration);
        }

        if self.check(&TokenKind::Delimiter)
            || self.check(&TokenKind::Eof)
            || self.check(&TokenKind::Punctuation(Punctuation::RightCurly))
        {
            self.match_token(&TokenKind::Delimiter);
            return Ok(declaration);
        }

        syntax_error!(self, DeclarationSyntax);
        Err(())
    }

    /// AssignmentStatement -> LeftValue '=' Expression Delimiter
    fn parse_assignment_statement(&mut self, left_value: AstNode) -> Result<AstNode, ()> {
        let anchor = self.advance();

        if !self.is_expression_start() {
            syntax_error!(self, MissingRightValue);
            return Err(());
        }

        let value = self.parse_expression()?;
        self.expect_delimiter()?;

        Ok(AstNode::new(AstKind::Assignment, anchor)
            .with_left(left_value)
            .with_right(value))
    }

    fn parse_expression_statement(&mut self) -> Result<AstNode, ()> {
        let expression = self.parse_expression()?;
        self.expect_delimiter()?;
        Ok(expression)
    }

    /// FunctionDefinition -> "func" Identifier '(' ParameterList? ')'
    ///                       "->" Identifier (CodeBlock)?
    ///
    /// 带代码块时，结果节点升级为 FunctionImplementation：
    /// 左孩子是函数定义子树，右孩子是函数体。
    fn parse_function_definition(&mut self) -> Result<AstNode, ()> {
        let anchor = self.advance();

        if !self.check(&TokenKind::Identifier) {
            syntax_error!(self, MissingFunctionName);
            return Err(());
        }
        let name = AstNode::new(AstKind::Identifier, self.advance());

        if !self.match_token(&TokenKind::Punctuation(Punctuation::LeftRound)) {
            syntax_error!(self, MissingOpeningBracket);
            return Err(());
        }

        let parameters = self.parse_parameter_list()?;

        if !self.match_token(&TokenKind::Punctuation(Punctuation::RightRound)) {
            syntax_error!(self, MissingClosingBracket);
            return Err(());
        }

        if !self.match_token(&TokenKind::Operator(Operator::Arrow)) {
            syntax_error!(self, MissingRightArrow);
            return Err(());
        }

        if !self.check(&TokenKind::Identifier) {
            syntax_error!(self, MissingReturnType);
            return Err(());
        }
        let return_type = AstNode::new(AstKind::FunctionReturnType, self.advance());

        let signature = AstNode::new(AstKind::FunctionSignature, anchor.clone())
            .with_left(parameters)
            .with_right(return_type);

        let definition = AstNode::new(AstKind::FunctionDefinition, anchor.clone())
            .with_left(name)
            .with_right(signature);

        // 可选的函数体
        if self.check(&TokenKind::Punctuation(Punctuation::LeftCurly)) {
            let body = self.parse_code_block()?;
            self.match_token(&TokenKind::Delimiter);

            return Ok(AstNode::new(AstKind::FunctionImplementation, anchor)
                .with_left(definition)
                .with_right(body));
        }

        self.expect_delimiter()?;
        Ok(definition)
    }

    /// ParameterList -> LabeledParameter (',' LabeledParameter)*
    /// LabeledParameter -> Identifier ':' Identifier
    fn parse_parameter_list(&mut self) -> Result<AstNode, ()> {
        let mut list = AstNode::new(AstKind::ParameterList, self.current.clone());

        // 空参数表，或序列结尾
        if self.check(&TokenKind::Punctuation(Punctuation::RightRound)) {
            return Ok(list);
        }

        if !self.check(&TokenKind::Identifier) {
            syntax_error!(self, MissingParameterLabel);
            return Err(());
        }
        let label = AstNode::new(AstKind::ParameterLabel, self.advance());

        if !self.match_token(&TokenKind::Punctuation(Punctuation::Colon)) {
            syntax_error!(self, MissingColonAfterLabel);
            return Err(());
        }

        if !self.check(&TokenKind::Identifier) {
            syntax_error!(self, MissingTypeName);
            return Err(());
        }
        let annotation = AstNode::new(AstKind::TypeAnnotation, self.advance());

        let parameter = AstNode::new(AstKind::Parameter, label.token.clone())
            .with_left(label)
            .with_right(annotation);
        list.left = Some(Box::new(parameter));

        if self.match_token(&TokenKind::Punctuation(Punctuation::Comma)) {
            // 逗号之后必须还有参数
            if self.check(&TokenKind::Punctuation(Punctuation::RightRound)) {
                syntax_error!(self, MissingParameterLabel);
                return Err(());
            }
            list.right = Some(Box::new(self.parse_parameter_list()?));
        } else {
            list.right = Some(Box::new(AstNode::new(
                AstKind::ParameterList,
                self.current.clone(),
            )));
        }

        Ok(list)
    }

    /// CodeBlock -> '{' Statement* '}'
    fn parse_code_block(&mut self) -> Result<AstNode, ()> {
        if !self.check(&TokenKind::Punctuation(Punctuation::LeftCurly)) {
            syntax_error!(self, MissingOpeningCurlyBracket);
            return Err(());
        }
        self.advance();

        Ok(self.parse_block_chain())
    }

    /// 代码块内部与 Program 同构：左孩子是语句，右孩子是余下的块。
    /// 链尾消费 `}`；如果先撞上了文件末尾，未闭合的花括号
    /// 已经由词法分析器在收尾时报告过了。
    fn parse_block_chain(&mut self) -> AstNode {
        let mut block = AstNode::new(AstKind::CodeBlock, self.current.clone());

        while self.check(&TokenKind::Delimiter) {
            self.advance();
        }

        if self.check(&TokenKind::Punctuation(Punctuation::RightCurly)) {
            self.advance();
            return block;
        }

        if self.check(&TokenKind::Eof) {
            return block;
        }

        let statement = self.recover_statement();
        block.left = Some(Box::new(statement));
        block.right = Some(Box::new(self.parse_block_chain()));

        block
    }

    /// ReturnStatement -> "return" Expression? Delimiter
    fn parse_return_statement(&mut self) -> Result<AstNode, ()> {
        let anchor = self.advance();

        if self.check(&TokenKind::Delimiter)
            || self.check(&TokenKind::Eof)
            || self.check(&TokenKind::Punctuation(Punctuation::RightCurly))
        {
            self.match_token(&TokenKind::Delimiter);
            return Ok(AstNode::new(AstKind::ReturnStatement, anchor));
        }

        if !self.is_expression_start() {
            syntax_error!(self, MissingDelimiter);
            return Err(());
        }

        let value = self.parse_expression()?;
        self.expect_delimiter()?;

        Ok(AstNode::new(AstKind::ReturnStatement, anchor).with_left(value))
    }

    /// ConditionalStatement -> "if" Expression CodeBlock
    ///                         ("else" (ConditionalStatement | CodeBlock))?
    ///
    /// 条件两侧的括号不是语法的一部分：带括号的条件只是一个
    /// 括号原子表达式。`}` 与 `else` 之间的语句终结符被跳过。
    fn parse_conditional_statement(&mut self) -> Result<AstNode, ()> {
        let anchor = self.advance();

        if !self.is_expression_start() {
            syntax_error!(self, MissingCondition);
            return Err(());
        }
        let condition = self.parse_expression()?;

        let then_block = self.parse_code_block()?;
        let mut body = AstNode::new(AstKind::ConditionalBody, anchor.clone()).with_left(then_block);

        while self.check(&TokenKind::Delimiter) {
            self.advance();
        }

        if self.match_token(&TokenKind::Keyword(Keyword::Else)) {
            let else_branch = if self.check(&TokenKind::Keyword(Keyword::If)) {
                self.parse_conditional_statement()?
            } else {
                self.parse_code_block()?
            };
            body.right = Some(Box::new(else_branch));
        }

        Ok(AstNode::new(AstKind::ConditionalStatement, anchor)
            .with_left(condition)
            .with_right(body))
    }

    /// RepeatUntilStatement -> "repeat" CodeBlock "until" Expression Delimiter
    fn parse_repeat_until_statement(&mut self) -> Result<AstNode, ()> {
        let anchor = self.advance();

        let block = self.parse_code_block()?;

        while self.check(&TokenKind::Delimiter) {
            self.advance();
        }

        if !self.match_token(&TokenKind::Keyword(Keyword::Until)) {
            syntax_error!(self, MissingUntilCondition);
            return Err(());
        }

        if !self.is_expression_start() {
            syntax_error!(self, MissingCondition);
            return Err(());
        }
        let condition = self.parse_expression()?;
        self.expect_delimiter()?;

        Ok(AstNode::new(AstKind::RepeatUntilStatement, anchor)
            .with_left(condition)
            .with_right(block))
    }

    /// ForInStatement -> "for" Identifier "in" Expression CodeBlock
    fn parse_for_in_statement(&mut self) -> Result<AstNode, ()> {
        let anchor = self.advance();

        if !self.check(&TokenKind::Identifier) {
            syntax_error!(self, MissingIdentifier);
            return Err(());
        }
        let variable = AstNode::new(AstKind::Identifier, self.advance());

        if !self.match_token(&TokenKind::Keyword(Keyword::In)) {
            syntax_error!(self, MissingInStatement);
            return Err(());
        }

        if !self.is_expression_start() {
            syntax_error!(self, MissingOperand);
            return Err(());
        }
        let iterable = self.parse_expression()?;

        let context = AstNode::new(AstKind::ForInContext, variable.token.clone())
            .with_left(variable)
            .with_right(iterable);

        let block = self.parse_code_block()?;
        self.match_token(&TokenKind::Delimiter);

        Ok(AstNode::new(AstKind::ForInStatement, anchor)
            .with_left(context)
            .with_right(block))
    }
}

// --- 5. 表达式解析 ---

impl<'a> ExpressionParser for Parser<'a> {
    fn parse_expression(&mut self) -> Result<AstNode, ()> {
        self.parse_logical_or()
    }

    /// LogicalOr -> LogicalAnd ("||" LogicalAnd)*
    fn parse_logical_or(&mut self) -> Result<AstNode, ()> {
        let mut left = self.parse_logical_and()?;

        while self.check(&TokenKind::Operator(Operator::OrOr)) {
            let operator = self.advance();

            if !self.is_expression_start() {
                syntax_error!(self, MissingOperand);
                return Err(());
            }

            let right = self.parse_logical_and()?;
            left = AstNode::new(AstKind::Binary, operator)
                .with_left(left)
                .with_right(right);
        }

        Ok(left)
    }

    /// LogicalAnd -> Comparison ("&&" Comparison)*
    fn parse_logical_and(&mut self) -> Result<AstNode, ()> {
        let mut left = self.parse_comparison()?;

        while self.check(&TokenKind::Operator(Operator::AndAnd)) {
            let operator = self.advance();

            if !self.is_expression_start() {
                syntax_error!(self, MissingOperand);
                return Err(());
            }

            let right = self.parse_comparison()?;
            left = AstNode::new(AstKind::Binary, operator)
                .with_left(left)
                .with_right(right);
        }

        Ok(left)
    }

    /// Comparison -> Addition (("<" | ">" | "<=" | ">=" | "==" | "!=") Addition)*
    fn parse_comparison(&mut self) -> Result<AstNode, ()> {
        let mut left = self.parse_addition()?;

        while matches!(
            self.current.kind,
            TokenKind::Operator(Operator::Lt)
                | TokenKind::Operator(Operator::Gt)
                | TokenKind::Operator(Operator::LtEq)
                | TokenKind::Operator(Operator::GtEq)
                | TokenKind::Operator(Operator::Eq)
                | TokenKind::Operator(Operator::NotEq)
        ) {
            let operator = self.advance();

            if !self.is_expression_start() {
                syntax_error!(self, MissingOperand);
                return Err(());
            }

            let right = self.parse_addition()?;
            left = AstNode::new(AstKind::Binary, operator)
                .with_left(left)
                .with_right(right);
        }

        Ok(left)
    }

    /// Addition -> Multiplication (("+" | "-") Multiplication)*
    fn parse_addition(&mut self) -> Result<AstNode, ()> {
        let mut left = self.parse_multiplication()?;

        while matches!(
            self.current.kind,
            TokenKind::Operator(Operator::Plus) | TokenKind::Operator(Operator::Minus)
        ) {
            let operator = self.advance();

            if !self.is_expression_start() {
                syntax_error!(self, MissingOperand);
                return Err(());
            }

            let right = self.parse_multiplication()?;
            left = AstNode::new(AstKind::Binary, operator)
                .with_left(left)
                .with_right(right);
        }

        Ok(left)
    }

    /// Multiplication -> Prefix (("*" | "/" | "%") Prefix)*
    fn parse_multiplication(&mut self) -> Result<AstNode, ()> {
        let mut left = self.parse_prefix()?;

        while matches!(
            self.current.kind,
            TokenKind::Operator(Operator::Star)
                | TokenKind::Operator(Operator::Slash)
                | TokenKind::Operator(Operator::Percent)
        ) {
            let operator = self.advance();

            if !self.is_expression_start() {
                syntax_error!(self, MissingOperand);
                return Err(());
            }

            let right = self.parse_prefix()?;
            left = AstNode::new(AstKind::Binary, operator)
                .with_left(left)
                .with_right(right);
        }

        Ok(left)
    }

    /// Prefix -> ("-" | "!") Prefix | Postfix
    fn parse_prefix(&mut self) -> Result<AstNode, ()> {
        if matches!(
            self.current.kind,
            TokenKind::Operator(Operator::Minus) | TokenKind::Operator(Operator::Not)
        ) {
            let operator = self.advance();

            if !self.is_expression_start() {
                syntax_error!(self, MissingOperand);
                return Err(());
            }

            // 右结合：直接在自身上递归
            let operand = self.parse_prefix()?;
            return Ok(AstNode::new(AstKind::Unary, operator).with_left(operand));
        }

        self.parse_postfix()
    }

    /// Postfix -> Primary ("!" | '(' ArgumentList? ')')*
    fn parse_postfix(&mut self) -> Result<AstNode, ()> {
        let mut node = self.parse_primary()?;

        loop {
            if self.check(&TokenKind::Operator(Operator::Factorial)) {
                let operator = self.advance();
                node = AstNode::new(AstKind::Postfix, operator).with_left(node);
                continue;
            }

            if self.check(&TokenKind::Punctuation(Punctuation::LeftRound)) {
                node = self.parse_function_call(node)?;
                continue;
            }

            break;
        }

        Ok(node)
    }

    /// Primary -> NUMERIC | STRING_LITERAL | BOOLEAN_LITERAL
    ///          | IDENTIFIER ('=' Expression)?
    ///          | '(' Expression ')'
    fn parse_primary(&mut self) -> Result<AstNode, ()> {
        match self.current.kind {
            TokenKind::Numeric | TokenKind::StringLiteral => {
                Ok(AstNode::new(AstKind::Literal, self.advance()))
            }

            TokenKind::BooleanLiteral => Ok(AstNode::new(AstKind::BooleanLiteral, self.advance())),

            TokenKind::Identifier => {
                let identifier = AstNode::new(AstKind::Identifier, self.advance());

                // 表达式位置上的裸标识符后跟 '=' 就是一次赋值
                if self.check(&TokenKind::Operator(Operator::Assign)) {
                    let operator = self.advance();

                    if !self.is_expression_start() {
                        syntax_error!(self, MissingRightValue);
                        return Err(());
                    }

                    let value = self.parse_expression()?;
                    return Ok(AstNode::new(AstKind::Assignment, operator)
                        .with_left(identifier)
                        .with_right(value));
                }

                Ok(identifier)
            }

            TokenKind::Punctuation(Punctuation::LeftRound) => {
                self.advance();
                let expression = self.parse_expression()?;

                if !self.match_token(&TokenKind::Punctuation(Punctuation::RightRound)) {
                    syntax_error!(self, MissingClosingBracket);
                    return Err(());
                }

                // 直接返回内部的表达式节点
                Ok(expression)
            }

            _ => {
                syntax_error!(self, MissingOperand);
                Err(())
            }
        }
    }

    /// FunctionCall -> Primary '(' ArgumentList? ')'
    fn parse_function_call(&mut self, callee: AstNode) -> Result<AstNode, ()> {
        self.advance();

        let arguments = self.parse_argument_list()?;

        if !self.match_token(&TokenKind::Punctuation(Punctuation::RightRound)) {
            syntax_error!(self, MissingClosingBracket);
            return Err(());
        }

        Ok(AstNode::new(AstKind::FunctionCall, callee.token.clone())
            .with_left(callee)
            .with_right(arguments))
    }

    /// ArgumentList -> LabeledArgument (',' LabeledArgument)*
    /// LabeledArgument -> Identifier ':' Expression
    fn parse_argument_list(&mut self) -> Result<AstNode, ()> {
        let mut list = AstNode::new(AstKind::ArgumentList, self.current.clone());

        // 空实参表，或序列结尾
        if self.check(&TokenKind::Punctuation(Punctuation::RightRound)) {
            return Ok(list);
        }

        if !self.check(&TokenKind::Identifier) {
            syntax_error!(self, MissingArgumentLabel);
            return Err(());
        }
        let label = AstNode::new(AstKind::ArgumentLabel, self.advance());

        if !self.match_token(&TokenKind::Punctuation(Punctuation::Colon)) {
            syntax_error!(self, MissingColonAfterLabel);
            return Err(());
        }

        if !self.is_expression_start() {
            syntax_error!(self, MissingArgument);
            return Err(());
        }
        let value = self.parse_expression()?;

        let argument = AstNode::new(AstKind::Argument, label.token.clone())
            .with_left(label)
            .with_right(value);
        list.left = Some(Box::new(argument));

        if self.match_token(&TokenKind::Punctuation(Punctuation::Comma)) {
            if self.check(&TokenKind::Punctuation(Punctuation::RightRound)) {
                syntax_error!(self, MissingArgumentLabel);
                return Err(());
            }
            list.right = Some(Box::new(self.parse_argument_list()?));
        } else {
            list.right = Some(Box::new(AstNode::new(
                AstKind::ArgumentList,
                self.current.clone(),
            )));
        }

        Ok(list)
    }
}

// --- 6. 辅助函数 ---

impl<'a> Util for Parser<'a> {
    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        let consumed = std::mem::replace(&mut self.current, next);
        self.diagnostic = consumed.clone();
        consumed
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// 语句终结符：一个 Delimiter；文件末尾（最后一行可以没有换行）
    /// 和紧随其后的 `}`（单行代码块）同样终结一条语句，但不被消费。
    fn expect_delimiter(&mut self) -> Result<(), ()> {
        if self.check(&TokenKind::Delimiter) {
            self.advance();
            return Ok(());
        }

        if self.check(&TokenKind::Eof)
            || self.check(&TokenKind::Punctuation(Punctuation::RightCurly))
        {
            return Ok(());
        }

        syntax_error!(self, MissingDelimiter);
        Err(())
    }

    fn report(&mut self, error: ParserError) {
        self.errors.push(CompilerError::Parsing(error));
    }

    fn escape_parse_error(&mut self) {
        while !self.check(&TokenKind::Delimiter) && !self.check(&TokenKind::Eof) {
            self.advance();
        }
        self.match_token(&TokenKind::Delimiter);
    }

    fn recover_statement(&mut self) -> AstNode {
        match self.parse_statement() {
            Ok(statement) => statement,
            Err(_) => {
                let anchor = self.current.clone();
                self.escape_parse_error();
                AstNode::new(AstKind::Error, anchor)
            }
        }
    }

    fn is_expression_start(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Identifier
                | TokenKind::Numeric
                | TokenKind::StringLiteral
                | TokenKind::BooleanLiteral
                | TokenKind::Operator(Operator::Minus)
                | TokenKind::Operator(Operator::Not)
                | TokenKind::Punctuation(Punctuation::LeftRound)
        )
    }
}
