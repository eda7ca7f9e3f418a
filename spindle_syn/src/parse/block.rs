use crate::ast;
use crate::ptr::P;
use crate::token::{BinOp, Delim, Keyword as K, Kind as T, Token};
use crate::Span;

use super::{PResult, Parser};

impl<'a, I> Parser<'a, I>
where
    I: Iterator<Item = Token>,
{
    /// Parse statements until EoF. Used for `Parse` implementation.
    pub fn parse_body(&mut self) -> PResult<'a, ast::Block> {
        self.parse_block(T::Eof)
    }

    /// Parse a block with a terminator without consuming it.
    pub fn parse_block(&mut self, term: T) -> PResult<'a, ast::Block> {
        let span = self.token.span.empty();

        let mut stmts = Vec::new();
        while !self.is_eof() && !self.check(term) {
            // Blank lines are skipped.
            if self.eat(T::LineBreak).is_some() {
                continue;
            }

            let at_block = match self.parse_or_eat_till(term, Self::parse_stmt) {
                Ok(stmt) => {
                    let at_block = matches!(stmt.body.kind, ast::StmtKind::Block(_));
                    stmts.push(stmt);
                    at_block
                }
                Err(_) => false,
            };

            // Indented blocks already consumed the line break that opened them.
            if at_block {
                let _ = self.eat(T::LineBreak);
                continue;
            }

            if !self.is_eof() && !self.check(term) && self.eat(T::LineBreak).is_none() {
                self.expect(T::LineBreak);
                let _ = self.eat_until_end_of_line();
                let _ = self.eat(T::LineBreak);
            }
        }

        Ok(ast::Block {
            span: union_spans(span, self.token.span.empty()),
            stmts,
        })
    }

    /// Parse a full statement, without consuming the line-break.
    pub fn parse_stmt(&mut self) -> PResult<'a, ast::Stmt> {
        let body = self.parse_stmt_body()?;
        let mut span = body.span;

        if let ast::StmtKind::Block(_) = body.kind {
            return Ok(ast::Stmt {
                span,
                body,
                decorator_command: None,
                hashtags: Vec::new(),
            });
        }

        // Only shortcut options take a trailing `<<if …>>` condition.
        let decorator_command = if let ast::StmtKind::ShortcutOption(_) = body.kind {
            self.eat(T::OpenDelim(Delim::DoubleAngleBracket))
                .and_then(|_| {
                    let command = self.parse_command().ok()?;
                    if self.eat(T::CloseDelim(Delim::DoubleAngleBracket)).is_none() {
                        self.expect(T::CloseDelim(Delim::DoubleAngleBracket));
                        return None;
                    }
                    Some(command)
                })
        } else {
            None
        };

        if let Some(command) = decorator_command.as_ref() {
            span = union_spans(span, command.span);
        }

        let mut hashtags = Vec::new();
        while self.check(T::Hash) {
            hashtags.extend(self.parse_hashtag().ok());
        }

        if let Some(hashtag) = hashtags.last() {
            span = union_spans(span, hashtag.span);
        }

        if !self.is_end_of_line() {
            let extra = self.eat_until_end_of_line();
            self.expect(T::LineBreak)
                .maybe_annotate_span(extra, "extra tokens in statement");
        }

        Ok(ast::Stmt {
            span,
            body,
            decorator_command,
            hashtags,
        })
    }

    pub fn parse_stmt_body(&mut self) -> PResult<'a, ast::StmtBody> {
        match self.token.kind {
            T::OpenDelim(Delim::DoubleAngleBracket) => {
                let span = self.bump().span;

                let command = self.parse_or_eat_till(
                    T::CloseDelim(Delim::DoubleAngleBracket),
                    Self::parse_command,
                )?;

                if let Some(delim) = self.eat(T::CloseDelim(Delim::DoubleAngleBracket)) {
                    Ok(ast::StmtBody {
                        span: span.union(delim.span),
                        kind: ast::StmtKind::Command(command),
                    })
                } else {
                    Err(self.expect(T::CloseDelim(Delim::DoubleAngleBracket)))
                }
            }
            T::OpenDelim(Delim::DoubleBracket) => {
                let span = self.bump().span;

                let flow =
                    self.parse_or_eat_till(T::CloseDelim(Delim::DoubleBracket), Self::parse_flow)?;

                if let Some(delim) = self.eat(T::CloseDelim(Delim::DoubleBracket)) {
                    Ok(ast::StmtBody {
                        span: span.union(delim.span),
                        kind: ast::StmtKind::Flow(flow),
                    })
                } else {
                    Err(self.expect(T::CloseDelim(Delim::DoubleBracket)))
                }
            }
            T::Arrow => {
                let shortcut_option = self.parse_shortcut_option()?;
                Ok(ast::StmtBody {
                    span: shortcut_option.span,
                    kind: ast::StmtKind::ShortcutOption(shortcut_option),
                })
            }
            T::Indent => {
                self.bump();
                let block = self.parse_block(T::UnIndent)?;
                if self.eat(T::UnIndent).is_none() {
                    self.expect(T::UnIndent);
                }
                Ok(ast::StmtBody {
                    span: block.span,
                    kind: ast::StmtKind::Block(block),
                })
            }
            _ => {
                let text = self.parse_stmt_text_body()?;

                Ok(ast::StmtBody {
                    span: text.span,
                    kind: ast::StmtKind::Text(text),
                })
            }
        }
    }

    pub fn parse_hashtag(&mut self) -> PResult<'a, ast::Hashtag> {
        let hash = self.eat(T::Hash).ok_or_else(|| self.expect(T::Hash))?;
        let text = self.parse_text()?;

        Ok(ast::Hashtag {
            span: hash.span.union(text.span),
            text,
        })
    }

    pub fn parse_shortcut_option(&mut self) -> PResult<'a, ast::ShortcutOption> {
        let span = self
            .eat(T::Arrow)
            .ok_or_else(|| self.expect(T::Arrow))?
            .span;

        let text = self.parse_stmt_text_body()?;
        let span = union_spans(span, text.span);

        Ok(ast::ShortcutOption { span, text })
    }

    pub fn parse_command(&mut self) -> PResult<'a, ast::Command> {
        let kind = self.token.kind;
        match kind {
            T::Keyword(K::Set) => self.parse_set_command(),
            T::Keyword(K::If) => self.parse_expr_command(ast::CommandKind::If),
            T::Keyword(K::ElseIf) => self.parse_expr_command(ast::CommandKind::ElseIf),
            T::Keyword(K::Else) => Ok(ast::Command {
                span: self.bump().span,
                kind: ast::CommandKind::Else,
            }),
            T::Keyword(K::EndIf) => Ok(ast::Command {
                span: self.bump().span,
                kind: ast::CommandKind::EndIf,
            }),
            T::Ident if self.check_nth(0, T::OpenDelim(Delim::Paren)) == Some(true) => {
                self.parse_call_command()
            }
            _ => self.parse_custom_command(),
        }
    }

    fn parse_set_command(&mut self) -> PResult<'a, ast::Command> {
        let span = self
            .eat(T::Keyword(K::Set))
            .ok_or_else(|| self.expect(T::Keyword(K::Set)))?
            .span;

        let var = self.parse_var()?;

        let op = match self.token.kind {
            T::Eq | T::Keyword(K::To) => ast::AssignOp::Assign,
            T::BinOpEq(BinOp::Plus) => ast::AssignOp::Add,
            T::BinOpEq(BinOp::Minus) => ast::AssignOp::Sub,
            T::BinOpEq(BinOp::Star) => ast::AssignOp::Mul,
            T::BinOpEq(BinOp::Slash) => ast::AssignOp::Div,
            T::BinOpEq(BinOp::Percent) => ast::AssignOp::Mod,
            _ => {
                return Err(self.expect_one_of(&[
                    T::Eq,
                    T::Keyword(K::To),
                    T::BinOpEq(BinOp::Plus),
                    T::BinOpEq(BinOp::Minus),
                    T::BinOpEq(BinOp::Star),
                    T::BinOpEq(BinOp::Slash),
                    T::BinOpEq(BinOp::Percent),
                ]))
            }
        };
        self.bump();

        let expr = self.parse_expr()?;

        Ok(ast::Command {
            span: span.union(expr.span),
            kind: ast::CommandKind::Set(var, op, P(expr)),
        })
    }

    fn parse_expr_command<F>(&mut self, ctor: F) -> PResult<'a, ast::Command>
    where
        F: FnOnce(P<ast::Expr>) -> ast::CommandKind,
    {
        let span = self.bump().span;

        let expr =
            self.parse_or_eat_till(T::CloseDelim(Delim::DoubleAngleBracket), Self::parse_expr)?;

        Ok(ast::Command {
            span: span.union(expr.span),
            kind: ctor(P(expr)),
        })
    }

    fn parse_call_command(&mut self) -> PResult<'a, ast::Command> {
        let expr = self.parse_expr()?;

        Ok(ast::Command {
            span: expr.span,
            kind: ast::CommandKind::Expr(P(expr)),
        })
    }

    fn parse_custom_command(&mut self) -> PResult<'a, ast::Command> {
        let (_, span) = self.eat_until_with_or_end_of_line(|p| {
            if p.check(T::CloseDelim(Delim::DoubleAngleBracket)) {
                Some(())
            } else {
                None
            }
        });

        let span = span.ok_or_else(|| {
            self.ctx
                .errors
                .error("expecting custom command body")
                .span(self.token.span)
        })?;

        Ok(ast::Command {
            span,
            kind: ast::CommandKind::Custom(span),
        })
    }

    pub fn parse_flow(&mut self) -> PResult<'a, ast::Flow> {
        #[derive(Copy, Clone, Eq, PartialEq, Debug)]
        enum Term {
            Pipe,
            Close,
        }

        let start = self.token.span;

        let (body, term) = self.parse_str_body_with_terminator_parser(|p| {
            if p.check(T::Pipe) {
                Some(Term::Pipe)
            } else if p.check(T::CloseDelim(Delim::DoubleBracket)) || p.is_end_of_line() {
                Some(Term::Close)
            } else {
                None
            }
        })?;

        match term {
            Some(Term::Pipe) => {
                self.bump();

                let (name, name_span) = match self.eat_name() {
                    Some(tup) => tup,
                    None => return Err(self.expect(T::Ident)),
                };

                Ok(ast::Flow {
                    span: union_spans(start, name_span),
                    option_text: Some(body),
                    target: ast::FlowTarget {
                        name,
                        span: name_span,
                    },
                })
            }
            Some(Term::Close) => {
                // `[[Target]]` without option text: the body is the target.
                let name = body
                    .cooked(self.ctx.source, self.ctx.span_base)
                    .trim()
                    .to_string();

                if name.is_empty() {
                    return Err(self
                        .ctx
                        .errors
                        .error("expecting option target")
                        .span(self.token.span));
                }

                Ok(ast::Flow {
                    span: union_spans(start, body.span),
                    option_text: None,
                    target: ast::FlowTarget {
                        name,
                        span: body.span,
                    },
                })
            }
            None => Err(self
                .ctx
                .errors
                .error("expecting `|` or `]]` in option")
                .span(self.token.span)),
        }
    }
}

fn union_spans(a: Span, b: Span) -> Span {
    if a.is_nil() {
        b
    } else if b.is_nil() {
        a
    } else {
        a.union(b)
    }
}
