use crate::ast;
use crate::token::{HeaderKey as H, Kind as T, Token};
use crate::Span;

use super::{PResult, Parser};

impl<'a, I> Parser<'a, I>
where
    I: Iterator<Item = Token>,
{
    /// Parse a file until EoF.
    pub fn parse_file(&mut self) -> PResult<'a, ast::File> {
        // Skip outermost indentations
        let _ = self.eat(T::Indent);

        let span = self.token.span;
        let mut nodes = Vec::new();

        loop {
            while self.eat(T::LineBreak).is_some() {}

            if self.is_almost_eof() {
                break;
            }

            nodes.extend(self.parse_node().ok());

            if let Some(err_span) = self.eat_lines_until(T::TripleEq) {
                self.expect(T::TripleEq).span(err_span);
            }

            if self.eat(T::TripleEq).is_some()
                && (!self.is_eof() && self.eat(T::LineBreak).is_none())
            {
                if let Some(err_span) = self.eat_until_end_of_line() {
                    self.expect(T::LineBreak).span(err_span);
                }
                let _ = self.eat(T::LineBreak);
            }
        }

        // Skip outermost indentations
        let _ = self.eat(T::UnIndent);

        if let Some(err_span) = self.eat_lines_until(T::Eof) {
            self.expect(T::Eof).span(err_span);
        }

        Ok(ast::File {
            span: union_or_nil(span, self.token.span.empty()),
            nodes,
        })
    }

    fn is_almost_eof(&mut self) -> bool {
        self.is_eof()
            || (self.token.kind == T::UnIndent && self.check_nth(0, T::Eof) == Some(true))
    }

    /// Parse a node until right before the terminator (`===` or EoF).
    pub fn parse_node(&mut self) -> PResult<'a, ast::Node> {
        let span = self.token.span;

        let mut headers = Vec::new();
        while !self.is_eof() && !self.check(T::TripleDash) {
            if self.eat(T::LineBreak).is_some() {
                continue;
            }

            headers.extend(
                self.parse_or_eat_till(T::LineBreak, Self::parse_node_header)
                    .ok(),
            );
            let _ = self.eat(T::LineBreak);
        }

        if self.eat(T::TripleDash).is_none() {
            return Err(self.expect(T::TripleDash));
        }

        if self.eat(T::LineBreak).is_none() {
            self.expect(T::LineBreak);
        }

        let is_raw_text = headers.iter().any(|header| match header {
            ast::NodeHeader::Tags(tags, _) => tags.iter().any(|tag| tag == "rawText"),
            _ => false,
        });

        let (body, raw_body) = if is_raw_text {
            (ast::Block::empty(self.token.span.empty()), self.skip_raw_body())
        } else {
            let body = match self.parse_block(T::TripleEq) {
                Ok(body) => body,
                Err(_) => ast::Block::empty(span.empty()),
            };
            (body, None)
        };

        Ok(ast::Node {
            span: union_or_nil(span, self.token.span.empty()),
            headers,
            body,
            raw_body,
        })
    }

    /// Consume a `rawText` body without statement-parsing it, returning the
    /// span of everything up to the `===` terminator.
    fn skip_raw_body(&mut self) -> Option<Span> {
        self.suppress_unknown = true;
        let span = self.eat_lines_until(T::TripleEq);
        self.suppress_unknown = false;
        span
    }

    pub fn parse_node_header(&mut self) -> PResult<'a, ast::NodeHeader> {
        let (key, key_span) = match self.token.kind {
            T::Keyword(crate::token::Keyword::HeaderKey(key)) => {
                let token = self.bump();
                (Some(key), token.span)
            }
            T::Ident => {
                let token = self.bump();
                (None, token.span)
            }
            _ => return Err(self.expect(T::Ident)),
        };

        if self.eat(T::Colon).is_none() {
            return Err(self.expect(T::Colon));
        }

        let value_span = self.eat(T::Text).map(|token| token.span);
        let value = value_span
            .map(|span| self.ctx.read_span(span))
            .unwrap_or("")
            .trim()
            .to_string();

        let span = match value_span {
            Some(value_span) => key_span.union(value_span),
            None => key_span,
        };

        match key {
            Some(H::Title) => {
                if value.is_empty() {
                    return Err(self.ctx.errors.error("expecting node title").span(span));
                }
                Ok(ast::NodeHeader::Title(value, span))
            }
            Some(H::Tags) => {
                let tags = value.split_whitespace().map(String::from).collect();
                Ok(ast::NodeHeader::Tags(tags, span))
            }
            Some(H::ColorId) => {
                let color_id = value.parse::<i32>().unwrap_or_else(|_| {
                    self.ctx
                        .errors
                        .error(format!("`{}` is not a valid colorID", value))
                        .span(span);
                    0
                });
                Ok(ast::NodeHeader::ColorId(color_id, span))
            }
            Some(H::Position) => {
                let mut coords = value.split(',').map(|part| part.trim().parse::<f32>());
                match (coords.next(), coords.next(), coords.next()) {
                    (Some(Ok(x)), Some(Ok(y)), None) => {
                        Ok(ast::NodeHeader::Position(x, y, span))
                    }
                    _ => {
                        self.ctx
                            .errors
                            .error(format!("`{}` is not a valid position (e.g. `100,50`)", value))
                            .span(span);
                        Ok(ast::NodeHeader::Position(0.0, 0.0, span))
                    }
                }
            }
            None => {
                let key = self.ctx.read_span(key_span).to_string();
                Ok(ast::NodeHeader::Custom(key, value, span))
            }
        }
    }
}

fn union_or_nil(a: Span, b: Span) -> Span {
    if a.is_nil() {
        b
    } else if b.is_nil() {
        a
    } else {
        a.union(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::parse::test_utils::{assert_parse, assert_parse_with};
    use crate::parse::Parse;

    #[test]
    fn can_parse_node_header() {
        assert_parse(
            "title: Start",
            ast::NodeHeader::Title("Start".to_string(), Span::new(0, 12)),
        );

        assert_parse(
            "tags: one two rawText",
            ast::NodeHeader::Tags(
                vec!["one".to_string(), "two".to_string(), "rawText".to_string()],
                Span::new(0, 21),
            ),
        );

        assert_parse("colorID: 3", ast::NodeHeader::ColorId(3, Span::new(0, 10)));

        assert_parse(
            "position: 120,44",
            ast::NodeHeader::Position(120.0, 44.0, Span::new(0, 16)),
        );

        assert_parse(
            "custom_key: wow such text",
            ast::NodeHeader::Custom(
                "custom_key".to_string(),
                "wow such text".to_string(),
                Span::new(0, 25),
            ),
        );
    }

    #[test]
    fn can_parse_node() {
        assert_parse_with(
            concat!("title: Start\n", "---\n", "Foo bar\n"),
            |node: ast::Node| {
                assert_eq!(node.title(), Some("Start"));
                assert_eq!(node.body.stmts.len(), 1);
                assert!(node.raw_body.is_none());
            },
        );
    }

    #[test]
    fn can_parse_file() {
        assert_parse_with(
            concat!(
                "title: A\n",
                "---\n",
                "Line one\n",
                "===\n",
                "title: B\n",
                "---\n",
                "Line two\n",
                "===\n",
            ),
            |file: ast::File| {
                assert_eq!(file.nodes.len(), 2);
                assert_eq!(file.nodes[0].title(), Some("A"));
                assert_eq!(file.nodes[1].title(), Some("B"));
            },
        );
    }

    #[test]
    fn raw_text_nodes_skip_statement_parsing() {
        assert_parse_with(
            concat!(
                "title: Raw\n",
                "tags: rawText\n",
                "---\n",
                "<<not a real command\n",
                "just text\n",
                "===\n",
            ),
            |file: ast::File| {
                let node = &file.nodes[0];
                assert!(node.is_raw_text());
                assert!(node.raw_body.is_some());
                assert!(node.body.stmts.is_empty());
            },
        );
    }
}
