use std::str::Chars;

use unicode_xid::UnicodeXID;

use super::{BlockMode, InlineMode, Span};
use crate::token::*;

pub(super) fn scan_token(
    input: &str,
    span_base: u32,
    block_mode: BlockMode,
    inline_mode: InlineMode,
) -> Token {
    let mut cursor = Cursor::new(input, block_mode, inline_mode);
    let mut kind = cursor.scan_kind();
    let len = cursor.len_consumed();

    if let Kind::Ident = kind {
        if let Some(keyword) = Keyword::identify(&input[..len]) {
            if keyword.class().may_appear_in(block_mode, inline_mode) {
                kind = Kind::Keyword(keyword);
            }
        }
    }

    Token::new(kind, Span::new(span_base, len as u32))
}

const EOF_CHAR: char = '\0';

#[derive(Clone, Debug)]
struct Cursor<'a> {
    chars: Chars<'a>,
    initial_len: usize,
    block_mode: BlockMode,
    inline_mode: InlineMode,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str, block_mode: BlockMode, inline_mode: InlineMode) -> Self {
        Cursor {
            chars: input.chars(),
            initial_len: input.len(),
            block_mode,
            inline_mode,
        }
    }

    fn nth_char(&self, n: usize) -> char {
        self.chars.clone().nth(n).unwrap_or(EOF_CHAR)
    }

    fn len_consumed(&self) -> usize {
        self.initial_len - self.chars.as_str().len()
    }

    fn bump(&mut self) -> char {
        self.chars.next().unwrap_or(EOF_CHAR)
    }

    fn consume(&mut self, x: usize) -> usize {
        for consumed in 0..x {
            if self.chars.next().is_none() {
                return consumed;
            }
        }

        x
    }

    fn parse_bin_op_eq(&mut self, bin_op: BinOp) -> Kind {
        if self.nth_char(0) == '=' {
            self.bump();
            Kind::BinOpEq(bin_op)
        } else {
            Kind::BinOp(bin_op)
        }
    }

    fn consume_number(&mut self) {
        let mut point_encountered = false;

        while {
            let peek = self.nth_char(0);
            if !point_encountered && peek == '.' && self.nth_char(1).is_ascii_digit() {
                point_encountered = true;
                true
            } else {
                peek.is_ascii_digit()
            }
        } {
            self.bump();
        }
    }

    fn consume_identifier(&mut self) {
        while self.nth_char(0).is_xid_continue() {
            self.bump();
        }
    }

    fn consume_until_line_break(&mut self) {
        while {
            let peek = self.nth_char(0);
            peek != '\n' && peek != EOF_CHAR
        } {
            self.bump();
        }
    }

    fn consume_comment(&mut self) -> Kind {
        self.consume_until_line_break();
        Kind::Comment
    }

    fn consume_escape(&mut self) -> Kind {
        let chr = self.bump();
        Kind::EscapeChar(EscapeChar::identify(chr))
    }

    fn scan_kind(&mut self) -> Kind {
        use BinOp as B;
        use Delim as D;
        use InlineMode as M;
        use Kind as T;

        let cur = self.bump();
        if cur == EOF_CHAR {
            return T::Eof;
        } else if cur == '\n' || cur == '\r' {
            return T::LineBreak;
        }

        let next = self.nth_char(0);

        if self.inline_mode.may_contain_whitespace() && cur.is_whitespace() {
            while {
                let next = self.nth_char(0);
                next != EOF_CHAR && next != '\n' && next != '\r' && next.is_whitespace()
            } {
                self.bump();
            }

            return T::Whitespace;
        }

        if self.inline_mode.may_contain_commands() {
            match cur {
                '<' => {
                    if next == '<' {
                        self.bump();
                        return T::OpenDelim(D::DoubleAngleBracket);
                    }
                }
                '[' => {
                    if next == '[' {
                        self.bump();
                        return T::OpenDelim(D::DoubleBracket);
                    }
                }
                _ => {}
            }
        }

        if self.inline_mode == M::StartOfLine {
            // Sentinels and shortcut arrows are only recognized at the very
            // start of a line.
            if cur == '-' {
                if next == '>' {
                    self.bump();
                    return T::Arrow;
                }
                if next == '-' && self.nth_char(1) == '-' {
                    self.consume(2);
                    return T::TripleDash;
                }
            }

            if cur == '=' && next == '=' && self.nth_char(1) == '=' {
                self.consume(2);
                return T::TripleEq;
            }

            if cur == '/' && next == '/' {
                self.bump();
                return self.consume_comment();
            }

            self.inline_mode = match self.block_mode {
                BlockMode::Header => M::HeaderKey,
                BlockMode::Body => M::FreeText,
            }
        }

        if self.inline_mode.may_contain_text() {
            if cur == '\\' && self.inline_mode.may_contain_escape() {
                return self.consume_escape();
            }

            match self.inline_mode {
                M::FreeText | M::Hashtag => match cur {
                    '#' => return T::Hash,
                    '{' => {
                        if self.inline_mode == M::FreeText {
                            return T::OpenDelim(D::Brace);
                        }
                    }
                    '/' => {
                        if next == '/' {
                            self.bump();
                            return self.consume_comment();
                        }
                    }
                    _ => {}
                },
                M::OptionTextOrTarget => match cur {
                    '|' => {
                        return T::Pipe;
                    }
                    '{' => {
                        return T::OpenDelim(D::Brace);
                    }
                    ']' => {
                        if next == ']' {
                            self.bump();
                            return T::CloseDelim(D::DoubleBracket);
                        }
                    }
                    _ => {}
                },
                M::HeaderValue => {}
                M::StringLiteral => {
                    if cur == '"' {
                        return T::CloseDelim(D::DoubleQuote);
                    }
                }
                _ => panic!("textual mode {:?} not covered", self.inline_mode),
            }

            while {
                let peek = self.nth_char(0);
                peek != EOF_CHAR
                    && peek != '\n'
                    && peek != '\r'
                    && !self.inline_mode.is_text_interrupting_symbol(peek)
            } {
                self.bump();
            }

            T::Text
        } else {
            match cur {
                ':' => T::Colon,
                '=' => {
                    if next == '=' {
                        self.bump();
                        T::EqEq
                    } else {
                        T::Eq
                    }
                }
                '+' => self.parse_bin_op_eq(B::Plus),
                '-' => match next {
                    '>' => {
                        self.bump();
                        T::Arrow
                    }
                    _ => self.parse_bin_op_eq(B::Minus),
                },
                '*' => self.parse_bin_op_eq(B::Star),
                '/' => match next {
                    '/' => {
                        self.bump();
                        self.consume_comment()
                    }
                    _ => self.parse_bin_op_eq(B::Slash),
                },
                '%' => self.parse_bin_op_eq(B::Percent),
                '|' => match next {
                    '|' => {
                        self.bump();
                        T::OrOr
                    }
                    _ => T::Pipe,
                },
                '&' => {
                    if next == '&' {
                        self.bump();
                        T::AndAnd
                    } else {
                        T::Unknown
                    }
                }
                '^' => T::Xor,
                '!' => {
                    if next == '=' {
                        self.bump();
                        T::Neq
                    } else {
                        T::Not
                    }
                }
                '>' => match next {
                    '>' => {
                        self.bump();
                        T::CloseDelim(D::DoubleAngleBracket)
                    }
                    '=' => {
                        self.bump();
                        T::Gte
                    }
                    _ => T::Gt,
                },
                '<' => match next {
                    '<' => {
                        self.bump();
                        T::OpenDelim(D::DoubleAngleBracket)
                    }
                    '=' => {
                        self.bump();
                        T::Lte
                    }
                    _ => T::Lt,
                },
                ',' => T::Comma,
                '[' => {
                    if next == '[' {
                        self.bump();
                        T::OpenDelim(D::DoubleBracket)
                    } else {
                        T::Unknown
                    }
                }
                ']' => {
                    if next == ']' {
                        self.bump();
                        T::CloseDelim(D::DoubleBracket)
                    } else {
                        T::Unknown
                    }
                }
                '{' => T::OpenDelim(D::Brace),
                '}' => T::CloseDelim(D::Brace),
                '"' => T::OpenDelim(D::DoubleQuote),
                '(' => T::OpenDelim(D::Paren),
                ')' => T::CloseDelim(D::Paren),
                '$' => T::Dollar,
                _ => {
                    if cur.is_ascii_digit() {
                        self.consume_number();
                        return T::Number;
                    }

                    // Keyword or identifier
                    if cur.is_xid_start() {
                        self.consume_identifier();
                        return T::Ident;
                    }

                    // Sequence of chars that can't be explained as a token
                    T::Unknown
                }
            }
        }
    }
}
