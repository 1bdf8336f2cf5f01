//! PEST-based parser for configuration files
//!
//! Produces the [`crate::ast`] tree with span information for diagnostics.

use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use crate::ast::{
    AttributeStmt, BinaryOp, BlockStmt, Expr, File, Literal, LiteralKind, Span, Stmt,
};


/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "parser/syntax.pest"]
struct SyntaxParser;

/* ===================== Error Types ===================== */

#[derive(Debug, Error)]
pub enum ParseError {
    /// The source does not match the grammar.
    #[error("{0}")]
    Syntax(String, Option<Span>),
    /// The parse tree could not be turned into a syntax tree.
    #[error("{0}")]
    Build(String, Option<Span>),
}

impl ParseError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::Syntax(_, span) | ParseError::Build(_, span) => *span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ParseError::Syntax(msg, _) | ParseError::Build(msg, _) => msg,
        }
    }
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let (start, end) = match err.line_col {
            pest::error::LineColLocation::Pos((line, col)) => ((line, col), (line, col + 1)),
            pest::error::LineColLocation::Span(start, end) => (start, end),
        };
        let span = Span {
            start: 0,
            end: 0,
            start_line: start.0.saturating_sub(1),
            start_col: start.1.saturating_sub(1),
            end_line: end.0.saturating_sub(1),
            end_col: end.1.saturating_sub(1),
        };
        ParseError::Syntax(err.to_string(), Some(span))
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/* ===================== Span Helpers ===================== */

/// Convert a PEST pair's span to our Span type
fn pair_to_span(pair: &Pair<Rule>) -> Span {
    let pest_span = pair.as_span();
    let (start_line, start_col) = pest_span.start_pos().line_col();
    let (end_line, end_col) = pest_span.end_pos().line_col();

    Span::new(
        pest_span.start(),
        pest_span.end(),
        start_line - 1,
        start_col - 1,
        end_line - 1,
        end_col - 1,
    )
}

/// Take the next child pair, failing with a build error if the tree is
/// shorter than the grammar promises.
fn next_pair<'i>(pairs: &mut Pairs<'i, Rule>, span: Span, what: &str) -> ParseResult<Pair<'i, Rule>> {
    pairs
        .next()
        .ok_or_else(|| ParseError::Build(format!("Expected {}", what), Some(span)))
}

fn unexpected(pair: &Pair<Rule>, context: &str) -> ParseError {
    ParseError::Build(
        format!("Unexpected {} rule: {:?}", context, pair.as_rule()),
        Some(pair_to_span(pair)),
    )
}

/* ===================== Public API ===================== */

/// Parse a whole configuration file.
pub fn parse_file(source: &str) -> ParseResult<File> {
    let mut pairs = SyntaxParser::parse(Rule::file, source)?;
    let file = next_pair(&mut pairs, Span::default(), "file")?;
    let span = pair_to_span(&file);

    let mut inner = file.into_inner();
    let body = next_pair(&mut inner, span, "file body")?;
    Ok(File {
        body: build_body(body)?,
        span,
    })
}

/// Parse source containing exactly one block.
pub fn parse_block(source: &str) -> ParseResult<BlockStmt> {
    let mut pairs = SyntaxParser::parse(Rule::single_block, source)?;
    let root = next_pair(&mut pairs, Span::default(), "block")?;
    let span = pair_to_span(&root);

    let mut inner = root.into_inner();
    build_block(next_pair(&mut inner, span, "block")?)
}

/// Parse source containing exactly one expression.
pub fn parse_expression(source: &str) -> ParseResult<Expr> {
    let mut pairs = SyntaxParser::parse(Rule::single_expression, source)?;
    let root = next_pair(&mut pairs, Span::default(), "expression")?;
    let span = pair_to_span(&root);

    let mut inner = root.into_inner();
    build_expression(next_pair(&mut inner, span, "expression")?)
}

/* ===================== Statements ===================== */

fn build_body(pair: Pair<Rule>) -> ParseResult<Vec<Stmt>> {
    pair.into_inner().map(build_statement).collect()
}

fn build_statement(pair: Pair<Rule>) -> ParseResult<Stmt> {
    match pair.as_rule() {
        Rule::block => Ok(Stmt::Block(build_block(pair)?)),
        Rule::attribute => Ok(Stmt::Attribute(build_attribute(pair)?)),
        _ => Err(unexpected(&pair, "statement")),
    }
}

fn build_block(pair: Pair<Rule>) -> ParseResult<BlockStmt> {
    let span = pair_to_span(&pair);
    let mut block = BlockStmt {
        span,
        ..BlockStmt::default()
    };

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::block_name => {
                block.name = part
                    .into_inner()
                    .map(|segment| segment.as_str().to_string())
                    .collect();
            }
            Rule::string => block.label = Some(build_string(part)?),
            Rule::body => block.body = build_body(part)?,
            _ => return Err(unexpected(&part, "block")),
        }
    }

    Ok(block)
}

fn build_attribute(pair: Pair<Rule>) -> ParseResult<AttributeStmt> {
    let span = pair_to_span(&pair);
    let mut inner = pair.into_inner();
    let name = next_pair(&mut inner, span, "attribute name")?;
    let value = next_pair(&mut inner, span, "attribute value")?;

    Ok(AttributeStmt {
        name: name.as_str().to_string(),
        value: build_expression(value)?,
        span,
    })
}

/* ===================== Expressions ===================== */

fn build_expression(pair: Pair<Rule>) -> ParseResult<Expr> {
    let span = pair_to_span(&pair);

    match pair.as_rule() {
        Rule::expression => {
            let mut inner = pair.into_inner();
            build_expression(next_pair(&mut inner, span, "expression")?)
        }
        Rule::or_expr | Rule::and_expr | Rule::cmp_expr | Rule::add_expr | Rule::mul_expr => {
            build_binary_chain(pair)
        }
        Rule::pow_expr => build_pow_expr(pair),
        Rule::number => Ok(literal(LiteralKind::Number, pair.as_str(), span)),
        Rule::boolean => Ok(literal(LiteralKind::Bool, pair.as_str(), span)),
        Rule::null_lit => Ok(literal(LiteralKind::Null, pair.as_str(), span)),
        Rule::string => {
            let value = build_string(pair)?;
            Ok(literal(LiteralKind::String, &value, span))
        }
        Rule::reference => Ok(Expr::Identifier {
            name: pair.as_str().to_string(),
            span,
        }),
        Rule::array => {
            let elements = pair
                .into_inner()
                .map(build_expression)
                .collect::<ParseResult<Vec<_>>>()?;
            Ok(Expr::Array { elements, span })
        }
        Rule::object => {
            let fields = pair
                .into_inner()
                .map(build_object_field)
                .collect::<ParseResult<Vec<_>>>()?;
            Ok(Expr::Object { fields, span })
        }
        _ => Err(unexpected(&pair, "expression")),
    }
}

fn literal(kind: LiteralKind, value: &str, span: Span) -> Expr {
    Expr::Literal(Literal {
        kind,
        value: value.to_string(),
        span,
    })
}

/// Fold `a op b op c` left to right.
fn build_binary_chain(pair: Pair<Rule>) -> ParseResult<Expr> {
    let span = pair_to_span(&pair);
    let mut inner = pair.into_inner();
    let mut left = build_expression(next_pair(&mut inner, span, "operand")?)?;

    while let Some(op_pair) = inner.next() {
        let op = binary_op(&op_pair)?;
        let right = build_expression(next_pair(&mut inner, span, "right operand")?)?;
        let span = left.span().merge(&right.span());
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        };
    }

    Ok(left)
}

/// `^` binds right to left: `a ^ b ^ c` is `a ^ (b ^ c)`.
fn build_pow_expr(pair: Pair<Rule>) -> ParseResult<Expr> {
    let span = pair_to_span(&pair);
    let mut inner = pair.into_inner();
    let base = build_expression(next_pair(&mut inner, span, "operand")?)?;

    let Some(op_pair) = inner.next() else {
        return Ok(base);
    };
    let op = binary_op(&op_pair)?;
    let exponent = build_expression(next_pair(&mut inner, span, "exponent")?)?;

    Ok(Expr::Binary {
        op,
        left: Box::new(base),
        right: Box::new(exponent),
        span,
    })
}

fn binary_op(pair: &Pair<Rule>) -> ParseResult<BinaryOp> {
    let op = match pair.as_rule() {
        Rule::op_or => BinaryOp::Or,
        Rule::op_and => BinaryOp::And,
        Rule::op_eq => BinaryOp::Eq,
        Rule::op_neq => BinaryOp::Neq,
        Rule::op_lt => BinaryOp::Lt,
        Rule::op_lte => BinaryOp::Lte,
        Rule::op_gt => BinaryOp::Gt,
        Rule::op_gte => BinaryOp::Gte,
        Rule::op_add => BinaryOp::Add,
        Rule::op_sub => BinaryOp::Sub,
        Rule::op_mul => BinaryOp::Mul,
        Rule::op_div => BinaryOp::Div,
        Rule::op_mod => BinaryOp::Mod,
        Rule::op_pow => BinaryOp::Pow,
        _ => return Err(unexpected(pair, "operator")),
    };
    Ok(op)
}

fn build_object_field(pair: Pair<Rule>) -> ParseResult<(String, Expr)> {
    let span = pair_to_span(&pair);
    let mut inner = pair.into_inner();
    let key = next_pair(&mut inner, span, "object key")?;
    let key = match key.as_rule() {
        Rule::string => build_string(key)?,
        _ => key.as_str().to_string(),
    };
    let value = build_expression(next_pair(&mut inner, span, "object value")?)?;
    Ok((key, value))
}

/* ===================== Strings ===================== */

fn build_string(pair: Pair<Rule>) -> ParseResult<String> {
    let span = pair_to_span(&pair);
    let raw = pair
        .into_inner()
        .next()
        .map(|inner| inner.as_str())
        .unwrap_or_default();
    unescape(raw, span)
}

fn unescape(raw: &str, span: Span) -> ParseResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                return Err(ParseError::Build(
                    format!("Invalid escape sequence '\\{}'", other),
                    Some(span),
                ))
            }
            None => {
                return Err(ParseError::Build(
                    "Unterminated escape sequence".to_string(),
                    Some(span),
                ))
            }
        }
    }

    Ok(out)
}
