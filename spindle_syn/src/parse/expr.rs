use crate::ast;
use crate::ptr::P;
use crate::token::{BinOp, Delim, Keyword, Kind as T, Token};
use crate::Span;

use super::{PResult, Parser};

impl<'a, I> Parser<'a, I>
where
    I: Iterator<Item = Token>,
{
    pub fn parse_expr(&mut self) -> PResult<'a, ast::Expr> {
        self.parse_expr_with_precedence(0)
    }

    pub fn parse_expr_with_precedence(&mut self, min_precedence: u32) -> PResult<'a, ast::Expr> {
        let mut left = self.parse_unary_expr_or_higher()?;

        while let Some(bin_op_kind) = self.peek_bin_op() {
            let precedence = binary_precedence(bin_op_kind);
            if precedence <= min_precedence {
                break;
            }

            let bin_op = ast::BinOp {
                kind: bin_op_kind,
                span: self.bump().span,
            };

            let right = self.parse_expr_with_precedence(precedence)?;

            left = ast::Expr {
                span: left.span.union(right.span),
                kind: ast::ExprKind::Binary(bin_op, P(left), P(right)),
            };
        }

        Ok(left)
    }

    fn peek_bin_op(&mut self) -> Option<ast::BinOpKind> {
        use ast::BinOpKind as O;

        match self.token.kind {
            T::EqEq | T::Keyword(Keyword::Is) | T::Keyword(Keyword::Eq) => Some(O::Eq),
            T::Neq | T::Keyword(Keyword::Neq) => Some(O::Neq),
            T::Lt | T::Keyword(Keyword::Lt) => Some(O::Lt),
            T::Lte | T::Keyword(Keyword::Lte) => Some(O::Lte),
            T::Gt | T::Keyword(Keyword::Gt) => Some(O::Gt),
            T::Gte | T::Keyword(Keyword::Gte) => Some(O::Gte),

            T::AndAnd | T::Keyword(Keyword::And) => Some(O::And),
            T::OrOr | T::Keyword(Keyword::Or) => Some(O::Or),
            T::Xor | T::Keyword(Keyword::Xor) => Some(O::Xor),

            T::BinOp(BinOp::Plus) => Some(O::Add),
            T::BinOp(BinOp::Minus) => Some(O::Sub),
            T::BinOp(BinOp::Star) => Some(O::Mul),
            T::BinOp(BinOp::Slash) => Some(O::Div),
            T::BinOp(BinOp::Percent) => Some(O::Mod),

            _ => None,
        }
    }

    pub fn parse_unary_expr_or_higher(&mut self) -> PResult<'a, ast::Expr> {
        let (kind, span) = match self.token.kind {
            T::BinOp(BinOp::Minus) => (ast::UnOpKind::Neg, self.bump().span),
            T::Not | T::Keyword(Keyword::Not) => (ast::UnOpKind::Not, self.bump().span),
            _ => return self.parse_call_expr_or_atom(),
        };

        let op = ast::UnOp { kind, span };
        let operand = self.parse_call_expr_or_atom()?;
        let span = op.span.union(operand.span);

        Ok(ast::Expr {
            kind: ast::ExprKind::Unary(op, P(operand)),
            span,
        })
    }

    pub fn parse_call_expr_or_atom(&mut self) -> PResult<'a, ast::Expr> {
        if self.token.kind == T::Ident
            && self.check_nth(0, T::OpenDelim(Delim::Paren)) == Some(true)
        {
            let ident = self.bump();
            let name = self.ctx.read_span(ident.span).to_string();

            let (args, span) = self
                .parse_call_arg_list()
                .expect("argument list presence is checked above");

            return Ok(ast::Expr {
                span: ident.span.union(span),
                kind: ast::ExprKind::Call(name, args),
            });
        }

        self.parse_atom()
    }

    pub fn parse_call_arg_list(&mut self) -> Option<(Vec<ast::Expr>, Span)> {
        self.eat(T::OpenDelim(Delim::Paren))?;

        Some(self.parse_list_with(
            true,
            super::list::parse_list_sep_with_term(true, T::Comma, T::CloseDelim(Delim::Paren)),
            |p, span| {
                p.expect_one_of(&[T::Comma, T::CloseDelim(Delim::Paren)])
                    .span(span);
            },
            |p| p.parse_expr().ok(),
        ))
    }

    pub fn parse_atom(&mut self) -> PResult<'a, ast::Expr> {
        match self.token.kind {
            T::OpenDelim(Delim::Paren) => {
                let span = self.bump().span;
                let mut expr = self.parse_expr()?;
                if let Some(paren) = self.eat(T::CloseDelim(Delim::Paren)) {
                    expr.span = span.union(paren.span);
                    Ok(expr)
                } else {
                    Err(self.expect(T::CloseDelim(Delim::Paren)))
                }
            }
            T::Number
            | T::Keyword(Keyword::True)
            | T::Keyword(Keyword::False)
            | T::Keyword(Keyword::Null)
            | T::OpenDelim(Delim::DoubleQuote) => {
                let lit = self.parse_lit()?;
                Ok(ast::Expr {
                    span: lit.span,
                    kind: ast::ExprKind::Lit(lit),
                })
            }
            T::Dollar => {
                let var = self.parse_var()?;
                Ok(ast::Expr {
                    span: var.span,
                    kind: ast::ExprKind::Var(var),
                })
            }
            _ => Err(self.expect_one_of(&[
                T::OpenDelim(Delim::Paren),
                T::Number,
                T::Keyword(Keyword::True),
                T::Keyword(Keyword::False),
                T::Keyword(Keyword::Null),
                T::OpenDelim(Delim::DoubleQuote),
                T::Dollar,
                T::Ident,
            ])),
        }
    }

    pub fn parse_var(&mut self) -> PResult<'a, ast::Var> {
        let dollar = self.eat(T::Dollar).ok_or_else(|| self.expect(T::Dollar))?;

        let ident_span = match self.token.kind {
            T::Ident | T::Keyword(_) => self.bump().span,
            _ => return Err(self.expect(T::Ident)),
        };

        Ok(ast::Var {
            name: format!("${}", self.ctx.read_span(ident_span)),
            span: dollar.span.union(ident_span),
        })
    }

    pub fn parse_lit(&mut self) -> PResult<'a, ast::Lit> {
        let (kind, span) = match self.token.kind {
            T::Number => {
                let token = self.bump();
                let text = self.ctx.read_span(token.span);
                let value = text.parse::<f32>().unwrap_or_else(|_| {
                    self.ctx
                        .errors
                        .error(format!("`{}` is not a valid number", text))
                        .span(token.span);
                    0.0
                });
                (ast::LitKind::Number(value), token.span)
            }
            T::Keyword(Keyword::True) => (ast::LitKind::True, self.bump().span),
            T::Keyword(Keyword::False) => (ast::LitKind::False, self.bump().span),
            T::Keyword(Keyword::Null) => (ast::LitKind::Null, self.bump().span),
            T::OpenDelim(Delim::DoubleQuote) => {
                let open = self.bump();
                let body =
                    self.parse_str_body_with_terminator(T::CloseDelim(Delim::DoubleQuote))?;
                let span = if body.span.is_nil() {
                    open.span
                } else {
                    open.span.union(body.span)
                };
                (ast::LitKind::Str(body), span)
            }
            _ => {
                return Err(self.expect_one_of(&[
                    T::Number,
                    T::Keyword(Keyword::True),
                    T::Keyword(Keyword::False),
                    T::Keyword(Keyword::Null),
                    T::OpenDelim(Delim::DoubleQuote),
                ]))
            }
        };

        Ok(ast::Lit { kind, span })
    }
}

fn binary_precedence(op: ast::BinOpKind) -> u32 {
    use ast::BinOpKind as O;
    match op {
        O::Mul => 8,
        O::Div => 8,
        O::Mod => 8,
        O::Add => 7,
        O::Sub => 7,
        O::Lt => 6,
        O::Lte => 6,
        O::Gt => 6,
        O::Gte => 6,
        O::Eq => 5,
        O::Neq => 5,
        O::And => 2,
        O::Or => 2,
        O::Xor => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::parse::test_utils::{assert_parse, assert_parse_with};
    use crate::parse::Parse;

    #[test]
    fn can_parse_lit() {
        assert_parse(
            "123",
            ast::Lit {
                kind: ast::LitKind::Number(123.0),
                span: Span::new(0, 3),
            },
        );

        assert_parse(
            "2.5",
            ast::Lit {
                kind: ast::LitKind::Number(2.5),
                span: Span::new(0, 3),
            },
        );

        assert_parse(
            "true",
            ast::Lit {
                kind: ast::LitKind::True,
                span: Span::new(0, 4),
            },
        );

        assert_parse(
            "false",
            ast::Lit {
                kind: ast::LitKind::False,
                span: Span::new(0, 5),
            },
        );

        assert_parse(
            "null",
            ast::Lit {
                kind: ast::LitKind::Null,
                span: Span::new(0, 4),
            },
        );
    }

    #[test]
    fn can_parse_string_lit() {
        assert_parse_with(r#""foo \"bar\"""#, |lit: ast::Lit| match lit.kind {
            ast::LitKind::Str(body) => {
                assert_eq!(body.cooked(r#""foo \"bar\"""#, 0), r#"foo "bar""#);
            }
            other => panic!("expected string literal, got {:?}", other),
        });
    }

    #[test]
    fn can_parse_var() {
        assert_parse(
            "$foo",
            ast::Var {
                name: "$foo".to_string(),
                span: Span::new(0, 4),
            },
        );
    }

    #[test]
    fn precedence_orders_mul_before_add() {
        assert_parse_with("1 + 2 * 3", |expr: ast::Expr| {
            match expr.kind {
                ast::ExprKind::Binary(op, left, right) => {
                    assert_eq!(op.kind, ast::BinOpKind::Add);
                    assert!(matches!(left.kind, ast::ExprKind::Lit(_)));
                    assert!(matches!(right.kind, ast::ExprKind::Binary(_, _, _)));
                }
                other => panic!("expected binary expr, got {:?}", other),
            }
        });

        assert_parse_with("(1 + 2) * 3", |expr: ast::Expr| {
            match expr.kind {
                ast::ExprKind::Binary(op, left, _) => {
                    assert_eq!(op.kind, ast::BinOpKind::Mul);
                    assert!(matches!(left.kind, ast::ExprKind::Binary(_, _, _)));
                }
                other => panic!("expected binary expr, got {:?}", other),
            }
        });
    }

    #[test]
    fn comparisons_bind_tighter_than_logic() {
        assert_parse_with("$a > 1 and $b < 2", |expr: ast::Expr| match expr.kind {
            ast::ExprKind::Binary(op, left, right) => {
                assert_eq!(op.kind, ast::BinOpKind::And);
                assert!(matches!(left.kind, ast::ExprKind::Binary(_, _, _)));
                assert!(matches!(right.kind, ast::ExprKind::Binary(_, _, _)));
            }
            other => panic!("expected binary expr, got {:?}", other),
        });
    }

    #[test]
    fn word_operators_alias_symbols() {
        for source in &["$x is 3", "$x == 3", "$x eq 3"] {
            assert_parse_with(*source, |expr: ast::Expr| match expr.kind {
                ast::ExprKind::Binary(op, _, _) => assert_eq!(op.kind, ast::BinOpKind::Eq),
                other => panic!("expected binary expr, got {:?}", other),
            });
        }
    }

    #[test]
    fn can_parse_calls_and_unary() {
        assert_parse_with("visitCount(\"Start\") + 1", |expr: ast::Expr| {
            match expr.kind {
                ast::ExprKind::Binary(op, left, _) => {
                    assert_eq!(op.kind, ast::BinOpKind::Add);
                    match &left.kind {
                        ast::ExprKind::Call(name, args) => {
                            assert_eq!(name, "visitCount");
                            assert_eq!(args.len(), 1);
                        }
                        other => panic!("expected call, got {:?}", other),
                    }
                }
                other => panic!("expected binary expr, got {:?}", other),
            }
        });

        assert_parse_with("-$x", |expr: ast::Expr| match expr.kind {
            ast::ExprKind::Unary(op, _) => assert_eq!(op.kind, ast::UnOpKind::Neg),
            other => panic!("expected unary expr, got {:?}", other),
        });

        assert_parse_with("not $done", |expr: ast::Expr| match expr.kind {
            ast::ExprKind::Unary(op, _) => assert_eq!(op.kind, ast::UnOpKind::Not),
            other => panic!("expected unary expr, got {:?}", other),
        });
    }
}
