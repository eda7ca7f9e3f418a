use std::collections::VecDeque;

use arrayvec::ArrayVec;
use thiserror::Error;

use crate::token::{self, KeywordClass, Token};
use crate::Span;

mod scan;

use self::scan::scan_token;

const MODE_STACK_CAPACITY: usize = 256;

/// Block-level modes used to modify lexer behavior.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(u8)]
#[doc(hidden)]
pub enum BlockMode {
    Header,
    Body,
}

/// Inline modes used to modify lexer behavior.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(u8)]
#[doc(hidden)]
pub enum InlineMode {
    /// After start of line and before any content.
    StartOfLine,
    /// Header key, before the `:` separator.
    HeaderKey,
    /// Header value after the `:` separator, until end of line.
    HeaderValue,
    /// Unspecified line body.
    FreeText,
    /// Hashtag
    Hashtag,
    /// Between `<<` and `>>`.
    Command,
    /// Right after `[[`, before `|`.
    OptionTextOrTarget,
    /// Between `[[` and `]]`, after `|`.
    OptionTarget,
    /// Between `{` and `}`.
    Expression,
    /// After an opening `"` and before a closing one.
    StringLiteral,
}

impl InlineMode {
    fn may_contain_text(self) -> bool {
        use InlineMode as I;

        match self {
            I::FreeText | I::Hashtag | I::OptionTextOrTarget | I::HeaderValue | I::StringLiteral => {
                true
            }
            _ => false,
        }
    }

    fn may_contain_escape(self) -> bool {
        self == InlineMode::StringLiteral
    }

    fn may_contain_commands(self) -> bool {
        use InlineMode as I;

        match self {
            I::StartOfLine | I::FreeText => true,
            _ => false,
        }
    }

    fn may_contain_whitespace(self) -> bool {
        !self.may_contain_text()
    }

    fn is_text_interrupting_symbol(self, c: char) -> bool {
        use InlineMode as I;

        match self {
            I::FreeText => match c {
                '/' | '[' | '{' | '#' | '<' => true,
                _ => false,
            },
            I::Hashtag => match c {
                '/' | '#' => true,
                _ => false,
            },
            I::OptionTextOrTarget => match c {
                '{' | '|' | ']' => true,
                _ => false,
            },
            I::HeaderValue => false,
            I::StringLiteral => match c {
                '\\' | '"' => true,
                _ => false,
            },
            _ => panic!("{:?} is not a textual mode", self),
        }
    }
}

impl KeywordClass {
    fn may_appear_in(self, block_mode: BlockMode, inline_mode: InlineMode) -> bool {
        match self {
            KeywordClass::Used => true,
            KeywordClass::HeaderKey => {
                block_mode == BlockMode::Header && inline_mode == InlineMode::StartOfLine
            }
        }
    }
}

/// A fatal lexing error.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("the inline mode stack is too deep, use less nested expressions")]
    StackTooDeep,
}

/// A spanned fatal lexing error.
#[derive(Debug, Error)]
#[error("error {kind} at {token:?}")]
pub struct Error {
    pub kind: ErrorKind,
    pub token: Token,
}

/// A lexing stream over a source string that can be consumed as an iterator.
#[derive(Clone, Debug)]
pub struct LexStream<'a> {
    src: &'a str,
    pos: u32,

    fatal: bool,
    eof_emitted: bool,

    block_mode: BlockMode,
    inline_stack: ArrayVec<[InlineMode; MODE_STACK_CAPACITY]>,

    indent_levels: Vec<u32>,
    current_line_indent: u32,

    delayed: VecDeque<Token>,
}

impl<'a> LexStream<'a> {
    /// Creates a new lexing stream.
    pub fn new(src: &'a str, pos: u32) -> Self {
        Self::with_modes(src, pos, BlockMode::Header, InlineMode::StartOfLine)
    }

    /// Creates a new lexing stream with given block and inline modes. This can cause
    /// surprising behavior outside very specific situations. Used for convenience methods
    /// in `Parse`.
    pub(crate) fn with_modes(
        src: &'a str,
        pos: u32,
        block_mode: BlockMode,
        inline_mode: InlineMode,
    ) -> Self {
        let mut inline_stack = ArrayVec::new();
        inline_stack.push(inline_mode);

        LexStream {
            src,
            pos,

            fatal: false,
            eof_emitted: false,

            block_mode,
            inline_stack,

            indent_levels: Vec::new(),
            current_line_indent: 0,

            delayed: VecDeque::new(),
        }
    }

    /// Returns the current position of this stream in bytes into the source string.
    pub fn pos(&self) -> u32 {
        self.pos
    }

    fn push_inline_mode(&mut self, mode: InlineMode) -> Result<(), ErrorKind> {
        if let Some(inline_mode) = self.inline_stack.last_mut() {
            if *inline_mode == InlineMode::StartOfLine {
                *inline_mode = InlineMode::FreeText;
            }
        }

        self.inline_stack
            .try_push(mode)
            .map_err(|_| ErrorKind::StackTooDeep)
    }

    /// Compares the indentation of the line just started against the indent
    /// stack. If the line is deeper, one `Indent` is produced; if it is
    /// shallower, one `UnIndent` per closed level is produced. The real token
    /// is queued behind them.
    fn indent_tokens(&mut self, current_token: Token) -> Option<Token> {
        let marker = Span::new(current_token.span.base, 0);
        let level = self.current_line_indent;
        let top = self.indent_levels.last().copied().unwrap_or(0);

        if level > top {
            self.indent_levels.push(level);
            self.delayed.push_back(current_token);
            return Some(Token::new(token::Kind::Indent, marker));
        }

        if level < top {
            let mut closed = 0;
            while self.indent_levels.last().copied().unwrap_or(0) > level {
                self.indent_levels.pop();
                closed += 1;
            }
            for _ in 1..closed {
                self.delayed
                    .push_back(Token::new(token::Kind::UnIndent, marker));
            }
            self.delayed.push_back(current_token);
            return Some(Token::new(token::Kind::UnIndent, marker));
        }

        None
    }
}

impl<'a> Iterator for LexStream<'a> {
    type Item = Result<Token, Error>;
    fn next(&mut self) -> Option<Result<Token, Error>> {
        use token::Delim as D;
        use token::Kind as T;

        #[derive(Copy, Clone, Debug)]
        enum ModeChange {
            Push(InlineMode),
            Replace(InlineMode),
            ReplaceBlock(BlockMode),
            Keep,
            Pop,
            EndLine,
        }

        if self.fatal {
            return None;
        }

        if let Some(delayed) = self.delayed.pop_front() {
            return Some(Ok(delayed));
        }

        if self.src.is_empty() {
            if self.indent_levels.pop().is_some() {
                return Some(Ok(Token::new(T::UnIndent, Span::new(self.pos, 0))));
            }
            if !self.eof_emitted {
                self.eof_emitted = true;
                return Some(Ok(Token::new(T::Eof, Span::new(self.pos, 0))));
            }
            return None;
        }

        let inline_mode = self
            .inline_stack
            .last()
            .copied()
            .expect("stack should not be empty");
        let token = scan_token(self.src, self.pos, self.block_mode, inline_mode);
        self.pos += token.span.len;
        self.src = &self.src[token.span.len as usize..];

        if let T::Eof = token.kind {
            return Some(Ok(token));
        }

        let mode_change: ModeChange = {
            use InlineMode as I;
            use ModeChange as C;

            match token.kind {
                T::LineBreak => C::EndLine,
                T::Text => {
                    if inline_mode == I::StartOfLine {
                        C::Replace(I::FreeText)
                    } else {
                        C::Keep
                    }
                }
                T::Hash => {
                    if inline_mode == I::StartOfLine || inline_mode == I::FreeText {
                        C::Replace(I::Hashtag)
                    } else {
                        C::Keep
                    }
                }
                T::TripleDash => C::ReplaceBlock(BlockMode::Body),
                T::TripleEq => C::ReplaceBlock(BlockMode::Header),

                // Comment-only lines must not leave `StartOfLine`; otherwise
                // they would take part in indentation tracking.
                T::Comment => C::Keep,

                T::OpenDelim(D::DoubleBracket) => C::Push(I::OptionTextOrTarget),
                T::OpenDelim(D::DoubleAngleBracket) => C::Push(I::Command),
                T::OpenDelim(D::Brace) => C::Push(I::Expression),
                T::OpenDelim(D::DoubleQuote) => C::Push(I::StringLiteral),

                T::CloseDelim(delim) => {
                    let pop_delim = match inline_mode {
                        I::OptionTextOrTarget => Some(D::DoubleBracket),
                        I::OptionTarget => Some(D::DoubleBracket),
                        I::Command => Some(D::DoubleAngleBracket),
                        I::Expression => Some(D::Brace),
                        I::StringLiteral => Some(D::DoubleQuote),
                        _ => None,
                    };

                    if pop_delim == Some(delim) {
                        C::Pop
                    } else {
                        C::Keep
                    }
                }

                T::Arrow => {
                    if inline_mode == I::StartOfLine {
                        C::Replace(I::FreeText)
                    } else {
                        C::Keep
                    }
                }

                T::Pipe => {
                    if inline_mode == I::OptionTextOrTarget {
                        C::Replace(I::OptionTarget)
                    } else {
                        C::Keep
                    }
                }

                T::Colon => {
                    if inline_mode == I::HeaderKey {
                        C::Replace(I::HeaderValue)
                    } else {
                        C::Keep
                    }
                }

                _ => match inline_mode {
                    I::StartOfLine => {
                        if let T::Whitespace = token.kind {
                            self.current_line_indent += token.span.len;
                            C::Keep
                        } else {
                            match self.block_mode {
                                BlockMode::Header => C::Replace(I::HeaderKey),
                                BlockMode::Body => C::Replace(I::FreeText),
                            }
                        }
                    }
                    _ => C::Keep,
                },
            }
        };

        let block_mode_before = self.block_mode;

        match mode_change {
            ModeChange::Push(mode) => {
                if let Err(kind) = self.push_inline_mode(mode) {
                    self.fatal = true;
                    return Some(Err(Error { kind, token }));
                }
            }
            ModeChange::Replace(mode) => {
                *self
                    .inline_stack
                    .last_mut()
                    .expect("stack should not be empty") = mode;
            }
            ModeChange::ReplaceBlock(mode) => self.block_mode = mode,
            ModeChange::Pop => {
                self.inline_stack.pop();
                if self.inline_stack.is_empty() {
                    self.inline_stack.push(InlineMode::FreeText);
                }
            }
            ModeChange::EndLine => {
                self.inline_stack.clear();
                self.inline_stack.push(InlineMode::StartOfLine);
                self.current_line_indent = 0;
            }
            ModeChange::Keep => {}
        }

        if inline_mode == InlineMode::StartOfLine && block_mode_before == BlockMode::Body {
            let left_start_of_line = self
                .inline_stack
                .last()
                .map(|mode| *mode != inline_mode)
                .unwrap_or(false);

            // Node sentinels stay in `StartOfLine` mode but still close any
            // open indentation levels.
            let is_sentinel = matches!(token.kind, T::TripleDash | T::TripleEq);

            if left_start_of_line || is_sentinel {
                if let Some(token) = self.indent_tokens(token) {
                    return Some(Ok(token));
                }
            }
        }

        Some(Ok(token))
    }
}
