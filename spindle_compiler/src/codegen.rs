use hashbrown::HashMap;
use tracing::debug;

use spindle_core::{CompiledNode, Instruction, Library, Program, SHUFFLE_OPTIONS, VARIADIC};
use spindle_sourcemap::LineMap;
use spindle_syn::ast;
use spindle_syn::Span;

use crate::{CompileError, StringTableBuilder};

/// Compiles a parsed and regrouped file into a program.
pub fn compile_file(
    file: &ast::File,
    source: &str,
    span_base: u32,
    library: &Library,
) -> Result<Program, CompileError> {
    let mut compiler = ProgramCompiler::new(library);
    compiler.add_file(file, source, span_base)?;
    Ok(compiler.finish())
}

/// Incrementally compiles nodes into a single program.
///
/// Nodes may come from different sources (the JSON loader parses every node
/// body separately), so each `add` call carries the source text its spans
/// refer to.
#[derive(Debug)]
pub struct ProgramCompiler<'lib> {
    library: &'lib Library,
    strings: StringTableBuilder,
    nodes: HashMap<String, CompiledNode>,
}

impl<'lib> ProgramCompiler<'lib> {
    pub fn new(library: &'lib Library) -> Self {
        ProgramCompiler {
            library,
            strings: StringTableBuilder::new(),
            nodes: HashMap::new(),
        }
    }

    pub fn add_file(
        &mut self,
        file: &ast::File,
        source: &str,
        span_base: u32,
    ) -> Result<(), CompileError> {
        let line_map = LineMap::new(source, span_base);

        for node in &file.nodes {
            self.add_node_with_map(node, source, span_base, &line_map)?;
        }

        Ok(())
    }

    pub fn add_node(
        &mut self,
        node: &ast::Node,
        source: &str,
        span_base: u32,
    ) -> Result<(), CompileError> {
        let line_map = LineMap::new(source, span_base);
        self.add_node_with_map(node, source, span_base, &line_map)
    }

    fn add_node_with_map(
        &mut self,
        node: &ast::Node,
        source: &str,
        span_base: u32,
        line_map: &LineMap,
    ) -> Result<(), CompileError> {
        let name = node.title().ok_or(CompileError::MissingTitle)?.to_string();

        if self.nodes.contains_key(&name) {
            return Err(CompileError::DuplicateNode { name });
        }

        let tags = node.tags().to_vec();

        let compiled = if node.is_raw_text() {
            // The body is interned verbatim instead of being compiled.
            let text = node
                .raw_body
                .map(|span| span.read(source, span_base))
                .unwrap_or("")
                .replace("\r\n", "\n");
            let text = text.trim_end_matches('\n');

            let line_number = node
                .raw_body
                .map(|span| line_map.span_location(span).line)
                .unwrap_or(1);

            let key = self
                .strings
                .register(text, &name, None, line_number, true)?;

            CompiledNode {
                name: name.clone(),
                tags,
                instructions: Vec::new(),
                labels: HashMap::new(),
                source_text_string_id: Some(key),
            }
        } else {
            let mut codegen = NodeCompiler {
                name: &name,
                source,
                span_base,
                line_map,
                library: self.library,
                strings: &mut self.strings,
                instructions: Vec::new(),
                labels: HashMap::new(),
                label_count: 0,
                pending_jumps: Vec::new(),
                ends_with_options: false,
                reset_shuffle_after_options: false,
            };

            codegen.compile_block(&node.body)?;
            codegen.emit_node_tail();

            let (instructions, labels) = codegen.finalize()?;

            CompiledNode {
                name: name.clone(),
                tags,
                instructions,
                labels,
                source_text_string_id: None,
            }
        };

        debug!(node = %name, instructions = compiled.instructions.len(), "compiled node");
        self.nodes.insert(name, compiled);
        Ok(())
    }

    pub fn finish(self) -> Program {
        let (strings, line_info) = self.strings.finish();

        Program {
            nodes: self.nodes,
            strings,
            line_info,
        }
    }
}

/// Per-node code generator. Owns the label counter and the deferred-jump
/// patch list; both reset for every node.
struct NodeCompiler<'a> {
    name: &'a str,
    source: &'a str,
    span_base: u32,
    line_map: &'a LineMap,
    library: &'a Library,
    strings: &'a mut StringTableBuilder,

    instructions: Vec<Instruction>,
    labels: HashMap<String, usize>,
    label_count: u32,
    /// Jumps emitted against labels that are not placed yet:
    /// (instruction index, label name).
    pending_jumps: Vec<(usize, String)>,

    /// Set when a jump-option `AddOption` is emitted, cleared by
    /// `ShowOptions`. Decides the node tail.
    ends_with_options: bool,
    /// Armed by `shuffleNextOptions`; the next `ShowOptions` is followed by
    /// resetting the shuffle variable.
    reset_shuffle_after_options: bool,
}

impl<'a> NodeCompiler<'a> {
    fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    fn register_label(&mut self, commentary: &str) -> String {
        let label = format!("L{}{}", self.label_count, commentary);
        self.label_count += 1;
        label
    }

    fn add_label(&mut self, name: &str) {
        self.labels.insert(name.to_string(), self.instructions.len());
        self.emit(Instruction::Label(name.to_string()));
    }

    fn emit_jump_to(&mut self, label: &str) {
        self.pending_jumps
            .push((self.instructions.len(), label.to_string()));
        self.emit(Instruction::JumpTo(usize::MAX));
    }

    fn emit_jump_if_false(&mut self, label: &str) {
        self.pending_jumps
            .push((self.instructions.len(), label.to_string()));
        self.emit(Instruction::JumpIfFalse(usize::MAX));
    }

    fn emit_node_tail(&mut self) {
        if self.ends_with_options {
            self.emit(Instruction::ShowOptions);
            self.emit_shuffle_reset();
            self.emit(Instruction::RunNode);
        } else {
            self.emit(Instruction::Stop);
        }
    }

    fn emit_shuffle_reset(&mut self) {
        if self.reset_shuffle_after_options {
            self.emit(Instruction::PushBool(false));
            self.emit(Instruction::StoreVariable(SHUFFLE_OPTIONS.to_string()));
            self.emit(Instruction::Pop);
            self.reset_shuffle_after_options = false;
        }
    }

    /// Resolves all deferred jumps to instruction indices.
    fn finalize(mut self) -> Result<(Vec<Instruction>, HashMap<String, usize>), CompileError> {
        let pending_jumps = std::mem::take(&mut self.pending_jumps);
        for (index, label) in pending_jumps {
            let target =
                *self
                    .labels
                    .get(&label)
                    .ok_or_else(|| CompileError::UnresolvedLabel {
                        label: label.clone(),
                        node: self.name.to_string(),
                    })?;

            match &mut self.instructions[index] {
                Instruction::JumpTo(slot) | Instruction::JumpIfFalse(slot) => *slot = target,
                other => {
                    return Err(CompileError::Internal(format!(
                        "jump patch target is not a jump: {}",
                        other
                    )))
                }
            }
        }

        Ok((self.instructions, self.labels))
    }

    fn line_number(&self, span: Span) -> u32 {
        self.line_map.span_location(span).line
    }

    /// First `line:<id>` hashtag, if any: pins the string-table key.
    fn line_id(&self, hashtags: &[ast::Hashtag]) -> Option<&'a str> {
        hashtags
            .iter()
            .find_map(|tag| tag.tag(self.source, self.span_base).strip_prefix("line:"))
            .filter(|id| !id.is_empty())
    }

    fn cooked(&self, body: &ast::StrBody) -> String {
        body.cooked(self.source, self.span_base)
    }

    fn compile_block(&mut self, block: &ast::Block) -> Result<(), CompileError> {
        for stmt in &block.stmts {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    fn compile_stmt(&mut self, stmt: &ast::Stmt) -> Result<(), CompileError> {
        match &stmt.body.kind {
            ast::StmtKind::Text(body) => {
                let text = self.cooked(body);
                let text = text.trim();
                if text.is_empty() {
                    return Ok(());
                }

                let line_id = self.line_id(&stmt.hashtags);
                let line_number = self.line_number(stmt.span);
                let key = self
                    .strings
                    .register(text, self.name, line_id, line_number, true)?;
                self.emit(Instruction::RunLine(key));
                Ok(())
            }
            ast::StmtKind::Command(command) => self.compile_command(command),
            ast::StmtKind::Flow(flow) => self.compile_flow(stmt, flow),
            ast::StmtKind::If(if_stmt) => self.compile_if(if_stmt),
            ast::StmtKind::Shortcuts(shortcuts) => self.compile_shortcuts(shortcuts),
            ast::StmtKind::Block(block) => self.compile_block(block),
            ast::StmtKind::ShortcutOption(_) => Err(CompileError::Internal(
                "shortcut option escaped regrouping".to_string(),
            )),
        }
    }

    fn compile_command(&mut self, command: &ast::Command) -> Result<(), CompileError> {
        match &command.kind {
            ast::CommandKind::Set(var, op, expr) => {
                if let Some(func) = op.func_name() {
                    self.emit(Instruction::PushVariable(var.name.clone()));
                    self.compile_expr(expr)?;
                    self.emit_operator(func)?;
                } else {
                    self.compile_expr(expr)?;
                }

                self.emit(Instruction::StoreVariable(var.name.clone()));
                self.emit(Instruction::Pop);
                Ok(())
            }
            ast::CommandKind::Expr(expr) => {
                self.compile_expr(expr)?;

                // Discard an unused call result so the stack stays balanced.
                if let ast::ExprKind::Call(name, _) = &expr.kind {
                    let returns_value = self
                        .library
                        .get(name)
                        .map(|function| function.returns_value())
                        .unwrap_or(false);
                    if returns_value {
                        self.emit(Instruction::Pop);
                    }
                } else {
                    self.emit(Instruction::Pop);
                }
                Ok(())
            }
            ast::CommandKind::Custom(span) => {
                let text = span.read(self.source, self.span_base).trim();

                match text {
                    "stop" => self.emit(Instruction::Stop),
                    "shuffleNextOptions" => {
                        self.emit(Instruction::PushBool(true));
                        self.emit(Instruction::StoreVariable(SHUFFLE_OPTIONS.to_string()));
                        self.emit(Instruction::Pop);
                        self.reset_shuffle_after_options = true;
                    }
                    _ => self.emit(Instruction::RunCommand(text.to_string())),
                }
                Ok(())
            }
            ast::CommandKind::If(_)
            | ast::CommandKind::ElseIf(_)
            | ast::CommandKind::Else
            | ast::CommandKind::EndIf => Err(CompileError::Internal(
                "raw if-command escaped regrouping".to_string(),
            )),
        }
    }

    fn compile_flow(&mut self, stmt: &ast::Stmt, flow: &ast::Flow) -> Result<(), CompileError> {
        match &flow.option_text {
            Some(body) => {
                let text = self.cooked(body);
                let line_id = self.line_id(&stmt.hashtags);
                let line_number = self.line_number(stmt.span);
                let key = self
                    .strings
                    .register(text.trim(), self.name, line_id, line_number, true)?;

                self.emit(Instruction::AddOption {
                    line: key,
                    destination: flow.target.name.clone(),
                });
                self.ends_with_options = true;
                Ok(())
            }
            None => {
                // `[[Target]]` jumps immediately.
                let line_number = self.line_number(stmt.span);
                let key = self.strings.register(
                    &flow.target.name,
                    self.name,
                    None,
                    line_number,
                    false,
                )?;

                self.emit(Instruction::PushString(key));
                self.emit(Instruction::RunNode);
                Ok(())
            }
        }
    }

    fn compile_if(&mut self, if_stmt: &ast::IfStmt) -> Result<(), CompileError> {
        let endif = self.register_label("endif");

        let else_clause = if_stmt.else_block.as_ref().map(|block| (None, block));
        let clauses = std::iter::once(&if_stmt.if_clause)
            .chain(if_stmt.else_if_clauses.iter())
            .map(|clause| (Some(&clause.condition), &clause.block))
            .chain(else_clause);

        for (condition, block) in clauses {
            let clause_end = condition.map(|condition| {
                let label = self.register_label("skipclause");
                // Leaves the tested value on the stack; popped below.
                self.compile_expr(condition).map(|()| {
                    self.emit_jump_if_false(&label);
                    label
                })
            });
            let clause_end = match clause_end {
                Some(result) => Some(result?),
                None => None,
            };

            self.compile_block(block)?;
            self.emit_jump_to(&endif);

            if let Some(label) = clause_end {
                self.add_label(&label);
                self.emit(Instruction::Pop);
            }
        }

        self.add_label(&endif);
        Ok(())
    }

    fn compile_shortcuts(&mut self, shortcuts: &ast::ShortcutsStmt) -> Result<(), CompileError> {
        let group_end = self.register_label("group_end");

        let mut destinations = Vec::with_capacity(shortcuts.options.len());

        for (index, clause) in shortcuts.options.iter().enumerate() {
            let destination = self.register_label(&format!("option_{}", index));

            let skip = match &clause.condition {
                Some(condition) => {
                    let label = self.register_label(&format!("conditional_{}", index));
                    self.compile_expr(condition)?;
                    self.emit_jump_if_false(&label);
                    Some(label)
                }
                None => None,
            };

            let text = self.cooked(&clause.option.text);
            let line_id = self.line_id(&clause.hashtags);
            let line_number = self.line_number(clause.span);
            let key = self
                .strings
                .register(text.trim(), self.name, line_id, line_number, true)?;

            self.emit(Instruction::AddOption {
                line: key,
                destination: destination.clone(),
            });
            self.ends_with_options = true;

            if let Some(label) = skip {
                self.add_label(&label);
                self.emit(Instruction::Pop);
            }

            destinations.push(destination);
        }

        self.emit(Instruction::ShowOptions);
        self.ends_with_options = false;
        self.emit_shuffle_reset();
        self.emit(Instruction::Jump);

        for (destination, clause) in destinations.iter().zip(&shortcuts.options) {
            self.add_label(destination);
            self.compile_block(&clause.block)?;
            self.emit_jump_to(&group_end);
        }

        self.add_label(&group_end);
        // Clears the destination label left by the peeking jump.
        self.emit(Instruction::Pop);

        Ok(())
    }

    fn compile_expr(&mut self, expr: &ast::Expr) -> Result<(), CompileError> {
        match &expr.kind {
            ast::ExprKind::Lit(lit) => self.compile_lit(lit, expr.span),
            ast::ExprKind::Var(var) => {
                self.emit(Instruction::PushVariable(var.name.clone()));
                Ok(())
            }
            ast::ExprKind::Unary(op, operand) => {
                self.compile_expr(operand)?;
                self.emit_operator(op.kind.func_name())
            }
            ast::ExprKind::Binary(op, left, right) => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                self.emit_operator(op.kind.func_name())
            }
            ast::ExprKind::Call(name, args) => {
                let function =
                    self.library
                        .get(name)
                        .ok_or_else(|| CompileError::UnknownFunction {
                            name: name.clone(),
                        })?;
                let param_count = function.param_count();

                for arg in args {
                    self.compile_expr(arg)?;
                }

                if param_count == VARIADIC {
                    // Variadic calling convention: argument count on top.
                    self.emit(Instruction::PushNumber(args.len() as f32));
                } else if param_count as usize != args.len() {
                    return Err(CompileError::ArityMismatch {
                        name: name.clone(),
                        expected: param_count,
                        found: args.len(),
                    });
                }

                self.emit(Instruction::CallFunc(name.clone()));
                Ok(())
            }
            ast::ExprKind::Err => Err(CompileError::Internal(
                "error expression survived parsing".to_string(),
            )),
        }
    }

    fn compile_lit(&mut self, lit: &ast::Lit, span: Span) -> Result<(), CompileError> {
        match &lit.kind {
            ast::LitKind::Number(value) => self.emit(Instruction::PushNumber(*value)),
            ast::LitKind::True => self.emit(Instruction::PushBool(true)),
            ast::LitKind::False => self.emit(Instruction::PushBool(false)),
            ast::LitKind::Null => self.emit(Instruction::PushNull),
            ast::LitKind::Str(body) => {
                let text = self.cooked(body);
                let line_number = self.line_number(span);
                let key = self
                    .strings
                    .register(&text, self.name, None, line_number, false)?;
                self.emit(Instruction::PushString(key));
            }
        }
        Ok(())
    }

    /// Emits a `CallFunc` for an operator, verifying the library provides it.
    fn emit_operator(&mut self, name: &'static str) -> Result<(), CompileError> {
        if !self.library.contains(name) {
            return Err(CompileError::UnknownFunction {
                name: name.to_string(),
            });
        }

        self.emit(Instruction::CallFunc(name.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use spindle_err::ErrorCtx;
    use spindle_syn::parse::Parse;
    use spindle_syn::refine;

    fn compile(source: &str) -> Program {
        let library = Library::standard_library();
        let mut file = ast::File::parse(source, 0).expect("source should parse");
        let errors = ErrorCtx::new();
        refine::refine(&errors, &mut file);
        assert!(errors.is_empty(), "refine should not error");
        compile_file(&file, source, 0, &library).expect("source should compile")
    }

    fn node<'p>(program: &'p Program, name: &str) -> &'p CompiledNode {
        program
            .nodes
            .get(name)
            .unwrap_or_else(|| panic!("node `{}` should exist", name))
    }

    #[test]
    fn lines_intern_and_run() {
        let program = compile(concat!(
            "title: Start\n",
            "---\n",
            "Hello\n",
            "World\n",
            "===\n",
        ));

        let start = node(&program, "Start");
        let keys: Vec<&String> = start
            .instructions
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::RunLine(key) => Some(key),
                _ => None,
            })
            .collect();

        assert_eq!(keys.len(), 2);
        assert_eq!(program.strings[keys[0]], "Hello");
        assert_eq!(program.strings[keys[1]], "World");
        assert_eq!(start.instructions.last(), Some(&Instruction::Stop));
    }

    #[test]
    fn line_tags_pin_string_keys() {
        let program = compile(concat!(
            "title: Start\n",
            "---\n",
            "Hello #line:greet\n",
            "===\n",
        ));

        assert_eq!(program.strings["greet"], "Hello");
        assert_eq!(program.line_info["greet"].node_name, "Start");
        assert_eq!(program.line_info["greet"].line_number, 3);
    }

    #[test]
    fn empty_body_compiles_to_stop_only() {
        let program = compile(concat!("title: Start\n", "---\n", "===\n"));

        assert_eq!(node(&program, "Start").instructions, vec![Instruction::Stop]);
    }

    #[test]
    fn jumps_reference_existing_labels() {
        let program = compile(concat!(
            "title: Start\n",
            "---\n",
            "<<if $a > 1>>\n",
            "A\n",
            "<<elseif $a>>\n",
            "B\n",
            "<<else>>\n",
            "C\n",
            "<<endif>>\n",
            "-> One\n",
            "    OneBody\n",
            "-> Two <<if $b>>\n",
            "===\n",
        ));

        let start = node(&program, "Start");
        for instruction in &start.instructions {
            match instruction {
                Instruction::JumpTo(target) | Instruction::JumpIfFalse(target) => {
                    assert!(
                        *target < start.instructions.len(),
                        "jump target {} out of range",
                        target
                    );
                    assert!(
                        start.labels.values().any(|index| index == target),
                        "jump target {} is not a label",
                        target
                    );
                }
                _ => {}
            }
        }

        for (label, index) in &start.labels {
            assert_eq!(
                start.instructions[*index],
                Instruction::Label(label.clone()),
                "label table should point at label instructions"
            );
        }
    }

    #[test]
    fn string_operands_reference_string_table() {
        let program = compile(concat!(
            "title: Start\n",
            "---\n",
            "Hello\n",
            "<<set $name to \"you\">>\n",
            "[[Leave|End]]\n",
            "===\n",
            "title: End\n",
            "---\n",
            "Bye\n",
            "===\n",
        ));

        for compiled in program.nodes.values() {
            for instruction in &compiled.instructions {
                match instruction {
                    Instruction::RunLine(key)
                    | Instruction::PushString(key)
                    | Instruction::AddOption { line: key, .. } => {
                        assert!(
                            program.strings.contains_key(key),
                            "key `{}` should be in the string table",
                            key
                        );
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn options_get_trailing_show_options_and_run_node() {
        let program = compile(concat!(
            "title: Start\n",
            "---\n",
            "[[Go east|East]]\n",
            "[[Go west|West]]\n",
            "===\n",
            "title: East\n",
            "---\n",
            "===\n",
            "title: West\n",
            "---\n",
            "===\n",
        ));

        let start = node(&program, "Start");
        let tail = &start.instructions[start.instructions.len() - 2..];
        assert_eq!(tail, &[Instruction::ShowOptions, Instruction::RunNode]);
    }

    #[test]
    fn bare_flow_jumps_directly() {
        let program = compile(concat!(
            "title: Start\n",
            "---\n",
            "[[End]]\n",
            "===\n",
            "title: End\n",
            "---\n",
            "===\n",
        ));

        let start = node(&program, "Start");
        assert!(matches!(
            start.instructions.as_slice(),
            [
                Instruction::PushString(_),
                Instruction::RunNode,
                Instruction::Stop
            ]
        ));
    }

    #[test]
    fn compound_assignment_reads_before_writing() {
        let program = compile(concat!(
            "title: Start\n",
            "---\n",
            "<<set $x += 2>>\n",
            "===\n",
        ));

        let start = node(&program, "Start");
        assert_eq!(
            start.instructions[..5],
            [
                Instruction::PushVariable("$x".to_string()),
                Instruction::PushNumber(2.0),
                Instruction::CallFunc("Add".to_string()),
                Instruction::StoreVariable("$x".to_string()),
                Instruction::Pop,
            ]
        );
    }

    #[test]
    fn shuffle_command_sets_and_resets_variable() {
        let program = compile(concat!(
            "title: Start\n",
            "---\n",
            "<<shuffleNextOptions>>\n",
            "-> A\n",
            "-> B\n",
            "===\n",
        ));

        let start = node(&program, "Start");
        let stores: Vec<usize> = start
            .instructions
            .iter()
            .enumerate()
            .filter_map(|(index, instruction)| match instruction {
                Instruction::StoreVariable(name) if name == SHUFFLE_OPTIONS => Some(index),
                _ => None,
            })
            .collect();
        assert_eq!(stores.len(), 2, "shuffle variable is set and reset");

        let show_options = start
            .instructions
            .iter()
            .position(|instruction| *instruction == Instruction::ShowOptions)
            .expect("group should show options");
        assert!(stores[0] < show_options && show_options < stores[1]);
    }

    #[test]
    fn raw_text_nodes_have_no_instructions() {
        let source = concat!(
            "title: Raw\n",
            "tags: rawText\n",
            "---\n",
            "first line\n",
            "second line\n",
            "===\n",
        );
        let program = compile(source);

        let raw = node(&program, "Raw");
        assert!(raw.instructions.is_empty());
        let key = raw
            .source_text_string_id
            .as_ref()
            .expect("raw nodes intern their body");
        assert_eq!(program.strings[key], "first line\nsecond line");
    }

    #[test]
    fn duplicate_nodes_are_rejected() {
        let library = Library::standard_library();
        let source = concat!(
            "title: Start\n",
            "---\n",
            "===\n",
            "title: Start\n",
            "---\n",
            "===\n",
        );
        let mut file = ast::File::parse(source, 0).expect("source should parse");
        let errors = ErrorCtx::new();
        refine::refine(&errors, &mut file);

        let err = compile_file(&file, source, 0, &library).unwrap_err();
        assert_eq!(
            err,
            CompileError::DuplicateNode {
                name: "Start".to_string()
            }
        );
    }

    #[test]
    fn arity_is_checked_against_the_library() {
        let library = Library::standard_library();
        let source = concat!(
            "title: Start\n",
            "---\n",
            "<<set $x to visited(\"A\", \"B\")>>\n",
            "===\n",
        );
        let mut file = ast::File::parse(source, 0).expect("source should parse");
        let errors = ErrorCtx::new();
        refine::refine(&errors, &mut file);

        let mut with_visited = Library::standard_library();
        with_visited.register("visited", 1, true, |_| Ok(spindle_core::Value::Bool(false)));

        let err = compile_file(&file, source, 0, &with_visited).unwrap_err();
        assert_eq!(
            err,
            CompileError::ArityMismatch {
                name: "visited".to_string(),
                expected: 1,
                found: 2,
            }
        );

        let err = compile_file(&file, source, 0, &library).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownFunction {
                name: "visited".to_string()
            }
        );
    }
}
