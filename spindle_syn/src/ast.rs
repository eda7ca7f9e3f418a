use crate::ptr::P;
use crate::token;
use crate::Span;

pub mod visit;

/// A variable identifier, including its `$` sigil.
#[derive(Clone, PartialEq, Debug)]
pub struct Var {
    /// The full name of the variable, `$` included. Variable storage is keyed
    /// by this exact string.
    pub name: String,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug)]
pub struct StrBody {
    pub segments: Vec<StrSegment>,
    pub span: Span,
}

impl StrBody {
    /// Returns `true` if the body contains no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Flattens the body into the authored text: escape sequences are
    /// resolved, and inline expressions are kept verbatim, braces included.
    pub fn cooked(&self, source: &str, span_base: u32) -> String {
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                StrSegment::Text(text) => out.push_str(text.span.read(source, span_base)),
                StrSegment::Escape(escape) => out.extend(escape.kind.chr()),
                StrSegment::Expr(span, _) => out.push_str(span.read(source, span_base)),
            }
        }

        out
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum StrSegment {
    Text(Text),
    Escape(Escape),
    /// Inline `Expr` interpolation (`{}`). The first element is the full span
    /// including delimiters.
    Expr(Span, P<Expr>),
}

impl StrSegment {
    /// Get the span of this segment.
    pub fn span(&self) -> Span {
        match self {
            StrSegment::Text(t) => t.span,
            StrSegment::Escape(t) => t.span,
            StrSegment::Expr(span, _) => *span,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Text {
    pub span: Span,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Escape {
    pub kind: token::EscapeChar,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl From<Var> for Expr {
    fn from(var: Var) -> Self {
        Expr {
            span: var.span,
            kind: ExprKind::Var(var),
        }
    }
}

impl From<Lit> for Expr {
    fn from(lit: Lit) -> Self {
        Expr {
            span: lit.span,
            kind: ExprKind::Lit(lit),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum ExprKind {
    Var(Var),
    /// A function call. The first element is the function name.
    Call(String, Vec<Expr>),
    Unary(UnOp, P<Expr>),
    Binary(BinOp, P<Expr>, P<Expr>),
    Lit(Lit),
    Err,
}

#[derive(Clone, PartialEq, Debug)]
pub struct UnOp {
    pub kind: UnOpKind,
    pub span: Span,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum UnOpKind {
    Neg,
    Not,
}

impl UnOpKind {
    /// The library function implementing this operator.
    pub fn func_name(self) -> &'static str {
        match self {
            UnOpKind::Neg => "UnaryMinus",
            UnOpKind::Not => "Not",
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct BinOp {
    pub kind: BinOpKind,
    pub span: Span,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BinOpKind {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,

    And,
    Or,
    Xor,

    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOpKind {
    /// The library function implementing this operator. These names double as
    /// `CallFunc` operands and must match the standard library exactly.
    pub fn func_name(self) -> &'static str {
        use BinOpKind as O;

        match self {
            O::Eq => "EqualTo",
            O::Neq => "NotEqualTo",
            O::Lt => "LessThan",
            O::Lte => "LessThanOrEqualTo",
            O::Gt => "GreaterThan",
            O::Gte => "GreaterThanOrEqualTo",
            O::And => "And",
            O::Or => "Or",
            O::Xor => "Xor",
            O::Add => "Add",
            O::Sub => "Minus",
            O::Mul => "Multiply",
            O::Div => "Divide",
            O::Mod => "Modulo",
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Lit {
    pub kind: LitKind,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug)]
pub enum LitKind {
    /// A literal number. The field is the parsed value; unparsable literals
    /// are reported at parse time.
    Number(f32),
    True,
    False,
    Null,
    Str(StrBody),
}

/// Compound assignment operators usable in a `set` command.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl AssignOp {
    /// The library function applied between the old and new value, if any.
    pub fn func_name(self) -> Option<&'static str> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some("Add"),
            AssignOp::Sub => Some("Minus"),
            AssignOp::Mul => Some("Multiply"),
            AssignOp::Div => Some("Divide"),
            AssignOp::Mod => Some("Modulo"),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Command {
    pub kind: CommandKind,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug)]
pub enum CommandKind {
    Set(Var, AssignOp, P<Expr>),

    /// The raw `if` command. This is different from the `If` statement, which
    /// is generated during block regrouping from raw commands. See the latter
    /// for the rationale of doing this.
    If(P<Expr>),
    /// The raw `elseif` command. See also `If`.
    ElseIf(P<Expr>),
    /// The raw `else` command. See also `If`.
    Else,
    /// The raw `endif` command. See also `If`.
    EndIf,

    /// A function-call command, e.g. `<<fadeOut(2)>>`.
    Expr(P<Expr>),
    /// A free-text client command. The span covers the command body between
    /// the delimiters.
    Custom(Span),
}

#[derive(Clone, PartialEq, Debug)]
pub struct Stmt {
    pub span: Span,
    pub body: StmtBody,
    /// A trailing `<<if …>>` condition. Only produced for shortcut options.
    pub decorator_command: Option<Command>,
    pub hashtags: Vec<Hashtag>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Hashtag {
    pub span: Span,
    pub text: Text,
}

impl Hashtag {
    /// Reads the tag text, without the leading `#` and surrounding whitespace.
    pub fn tag<'s>(&self, source: &'s str, span_base: u32) -> &'s str {
        self.text.span.read(source, span_base).trim()
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct StmtBody {
    pub span: Span,
    pub kind: StmtKind,
}

#[derive(Clone, PartialEq, Debug)]
pub enum StmtKind {
    Text(StrBody),
    Command(Command),
    Flow(Flow),
    ShortcutOption(ShortcutOption),
    Block(Block),

    /// The `if` statement. This is not parsed natively, but generated in the
    /// block regrouping transform.
    If(IfStmt),

    /// The "shortcut option group" statement. This is not parsed natively, but
    /// generated in the block regrouping transform.
    Shortcuts(ShortcutsStmt),
}

/// The `if` statement. This is not parsed natively, but generated in the block
/// regrouping step.
///
/// This is different from the raw `if`, `elseif` and `else` commands. Making
/// regrouping a separate step makes it easier to parse weirdly formatted code,
/// and recover from invalid ones when there are multiple nodes.
#[derive(Clone, PartialEq, Debug)]
pub struct IfStmt {
    pub span: Span,
    pub if_clause: IfClause,
    pub else_if_clauses: Vec<IfClause>,
    pub else_block: Option<Block>,

    /// Contains invalid clauses after else, before `endif`. Nested
    /// if-statements within are not regrouped, and remain raw commands.
    pub invalid: Option<Block>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct IfClause {
    pub span: Span,
    pub condition: P<Expr>,
    pub block: Block,
}

#[derive(Clone, PartialEq, Debug)]
pub struct ShortcutsStmt {
    pub span: Span,
    pub options: Vec<ShortcutOptionClause>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct ShortcutOptionClause {
    pub span: Span,
    pub option: ShortcutOption,
    /// Condition from a trailing `<<if …>>` on the option line.
    pub condition: Option<P<Expr>>,
    pub hashtags: Vec<Hashtag>,
    pub block: Block,
}

/// A jump option: `[[text|Target]]`, or `[[Target]]` without option text.
#[derive(Clone, PartialEq, Debug)]
pub struct Flow {
    pub span: Span,
    pub option_text: Option<StrBody>,
    pub target: FlowTarget,
}

#[derive(Clone, PartialEq, Debug)]
pub struct FlowTarget {
    pub name: String,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug)]
pub struct ShortcutOption {
    pub span: Span,
    pub text: StrBody,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Block {
    pub span: Span,
    pub stmts: Vec<Stmt>,
}

impl Block {
    /// Creates an empty block with a span.
    pub fn empty(span: Span) -> Self {
        Block {
            span,
            stmts: Vec::new(),
        }
    }

    /// Pushes a statement to this block, extending the span.
    pub fn push(&mut self, stmt: Stmt) {
        if self.span.is_nil() {
            self.span = stmt.span;
        } else if !stmt.span.is_nil() {
            self.span = self.span.union(stmt.span);
        }
        self.stmts.push(stmt);
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Node {
    pub span: Span,
    pub headers: Vec<NodeHeader>,
    pub body: Block,
    /// For nodes tagged `rawText`, the span of the unparsed body.
    pub raw_body: Option<Span>,
}

impl Node {
    /// Returns the node title, if a `title` header is present.
    pub fn title(&self) -> Option<&str> {
        self.headers.iter().find_map(|header| match header {
            NodeHeader::Title(name, _) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Returns the node's tags. Empty if there is no `tags` header.
    pub fn tags(&self) -> &[String] {
        self.headers
            .iter()
            .find_map(|header| match header {
                NodeHeader::Tags(tags, _) => Some(tags.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Returns `true` if the node carries the `rawText` tag.
    pub fn is_raw_text(&self) -> bool {
        self.tags().iter().any(|tag| tag == "rawText")
    }
}

/// A node header. The set of known keys is closed; anything else is kept as
/// `Custom` for the loader to warn about and skip.
#[derive(Clone, PartialEq, Debug)]
pub enum NodeHeader {
    Title(String, Span),
    Tags(Vec<String>, Span),
    ColorId(i32, Span),
    Position(f32, f32, Span),
    /// A custom header entry: key and raw value text.
    Custom(String, String, Span),
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct File {
    pub span: Span,
    pub nodes: Vec<Node>,
}
