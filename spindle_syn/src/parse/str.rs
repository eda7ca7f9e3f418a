use crate::ast;
use crate::ptr::P;
use crate::token::{Delim, EscapeChar, Kind as T, Token};
use crate::Span;

use super::{PResult, Parser};

impl<'a, I> Parser<'a, I>
where
    I: Iterator<Item = Token>,
{
    /// Parses a `StrBody` until end of input. Used for `Parse` implementation.
    pub fn parse_str_body(&mut self) -> PResult<'a, ast::StrBody> {
        let (str_body, _): (_, Option<()>) =
            self.parse_str_body_with_terminator_parser(|_| None)?;
        Ok(str_body)
    }

    /// Parses a `StrBody` with the given terminator, consuming it.
    pub fn parse_str_body_with_terminator(&mut self, terminator: T) -> PResult<'a, ast::StrBody> {
        let (str_body, term) = self.parse_str_body_with_terminator_parser(|p| p.eat(terminator))?;

        if term.is_some() {
            Ok(str_body)
        } else {
            Err(self.expect(terminator))
        }
    }

    /// Parses a `StrBody` until `terminator` returns `Some`, or until the next
    /// token cannot be part of the body.
    pub fn parse_str_body_with_terminator_parser<F, U>(
        &mut self,
        mut terminator: F,
    ) -> PResult<'a, (ast::StrBody, Option<U>)>
    where
        F: FnMut(&mut Self) -> Option<U>,
    {
        let mut segments = Vec::new();
        let span = self.token.span;

        let mut term = None;

        while {
            if let Some(terminator) = terminator(self) {
                term = Some(terminator);
                false
            } else {
                match self.token.kind {
                    T::Text | T::EscapeChar(_) | T::OpenDelim(Delim::Brace) => true,
                    _ => false,
                }
            }
        } {
            segments.push(self.parse_str_segment()?);
        }

        let span = if let Some(last) = segments.last() {
            span.union(last.span())
        } else {
            span.empty()
        };

        Ok((ast::StrBody { segments, span }, term))
    }

    /// Parses the text body of a statement: everything up to a line break, a
    /// hashtag, or a trailing command.
    pub fn parse_stmt_text_body(&mut self) -> PResult<'a, ast::StrBody> {
        let (str_body, _): (_, Option<()>) =
            self.parse_str_body_with_terminator_parser(|p| match p.token.kind {
                T::LineBreak | T::OpenDelim(Delim::DoubleAngleBracket) | T::Hash => Some(()),
                _ => None,
            })?;

        Ok(str_body)
    }

    pub fn parse_str_segment(&mut self) -> PResult<'a, ast::StrSegment> {
        match self.token.kind {
            T::Text => self.parse_text().map(ast::StrSegment::Text),
            T::EscapeChar(esc_char) => self.parse_str_segment_escape(esc_char),
            T::OpenDelim(Delim::Brace) => self.parse_str_segment_expr(),
            _ => Err(self.expect_one_of(&[
                T::Text,
                T::EscapeChar(EscapeChar::Backslash),
                T::OpenDelim(Delim::Brace),
            ])),
        }
    }

    pub fn parse_text(&mut self) -> PResult<'a, ast::Text> {
        let mut span: Option<Span> = None;

        while let Some(token) = self.eat(T::Text) {
            let span = span.get_or_insert(token.span);
            *span = span.union(token.span);
        }

        match span {
            Some(span) => Ok(ast::Text { span }),
            None => Err(self.expect(T::Text)),
        }
    }

    fn parse_str_segment_escape(&mut self, esc_char: EscapeChar) -> PResult<'a, ast::StrSegment> {
        let token = self.bump();
        if esc_char == EscapeChar::Invalid {
            Err(self
                .ctx
                .errors
                .error("invalid escape sequence (only `\\\"` and `\\\\` are supported)")
                .span(token.span))
        } else {
            Ok(ast::StrSegment::Escape(ast::Escape {
                kind: esc_char,
                span: token.span,
            }))
        }
    }

    fn parse_str_segment_expr(&mut self) -> PResult<'a, ast::StrSegment> {
        let open = self
            .eat(T::OpenDelim(Delim::Brace))
            .ok_or_else(|| self.expect(T::OpenDelim(Delim::Brace)))?;

        let expr = self.parse_or_eat_till(T::CloseDelim(Delim::Brace), Self::parse_expr)?;

        let close = self
            .eat(T::CloseDelim(Delim::Brace))
            .ok_or_else(|| self.expect(T::CloseDelim(Delim::Brace)))?;

        Ok(ast::StrSegment::Expr(open.span.union(close.span), P(expr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::parse::test_utils::assert_parse_with;
    use crate::parse::Parse;

    #[test]
    fn can_parse_plain_text() {
        let source = "foo bar >v0 0v<";
        assert_parse_with(source, |body: ast::StrBody| {
            assert_eq!(body.cooked(source, 0), "foo bar >v0 0v<");
        });
    }

    #[test]
    fn inline_expressions_survive_verbatim() {
        let source = "gold: {$gold} coins";
        assert_parse_with(source, |body: ast::StrBody| {
            assert_eq!(body.segments.len(), 3);
            assert!(matches!(body.segments[1], ast::StrSegment::Expr(_, _)));
            assert_eq!(body.cooked(source, 0), "gold: {$gold} coins");
        });
    }
}
