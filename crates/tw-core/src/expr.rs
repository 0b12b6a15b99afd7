//! Parser for relative-reference expressions.
//!
//! Built on `winnow` 0.7. An expression names another node's anchor plus or
//! minus a positive integer offset:
//!
//! ```text
//! $(ref) + 5          same attribute, offset +5
//! $(ref).top - 3      explicit attribute, offset -3
//! $(ref)              same attribute, no offset
//! $(ref).bottom       explicit attribute, no offset
//! 12                  bare numeric literal
//! ```
//!
//! `ref` is `self`, `superview`, or a base64-shaped node identifier.

use thiserror::Error;
use winnow::ascii::{alpha1, digit0};
use winnow::combinator::{delimited, opt, preceded};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

/// The bare literal (or offset) could not be read as a number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("expression {text:?} is neither a reference nor a number")]
    NotANumber { text: String },
}

/// A parsed expression: `(target, attribute, offset)`.
///
/// An empty `target` means the expression was a bare literal; an empty
/// `attribute` means "same attribute as the one being constrained".
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub target: String,
    pub attribute: String,
    pub offset: f64,
}

impl Expression {
    pub fn literal(value: f64) -> Self {
        Self {
            target: String::new(),
            attribute: String::new(),
            offset: value,
        }
    }

    /// True for bare numeric literals (no reference target).
    pub fn is_constant(&self) -> bool {
        self.target.is_empty()
    }

    /// The referenced node, if any.
    pub fn reference(&self) -> Option<Reference<'_>> {
        (!self.target.is_empty()).then(|| Reference::parse(&self.target))
    }

    /// The referenced attribute, defaulting to `own` when unspecified.
    pub fn attribute_or<'a>(&'a self, own: &'a str) -> &'a str {
        if self.attribute.is_empty() {
            own
        } else {
            &self.attribute
        }
    }
}

/// The target of a relative reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// The node being edited.
    SelfNode,
    /// The edited node's parent.
    Superview,
    /// Any other node, looked up by identifier.
    Id(&'a str),
}

impl<'a> Reference<'a> {
    pub fn parse(token: &'a str) -> Self {
        match token {
            "self" => Reference::SelfNode,
            "superview" => Reference::Superview,
            other => Reference::Id(other),
        }
    }
}

/// Parse an expression string.
///
/// Total over the four reference forms; anything else must be a bare
/// number.
pub fn parse_expression(input: &str) -> Result<Expression, ExprError> {
    if let Ok((target, attribute, offset)) = reference_expr.parse(input) {
        return Ok(Expression {
            target: target.to_string(),
            attribute: attribute.unwrap_or_default().to_string(),
            offset: offset.unwrap_or(0.0),
        });
    }

    parse_number(input).map(Expression::literal)
}

/// Read a bare numeric literal. Non-finite values are rejected.
pub fn parse_number(input: &str) -> Result<f64, ExprError> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ExprError::NotANumber {
            text: input.to_string(),
        })
}

// ─── Grammar ─────────────────────────────────────────────────────────────

type RefParts<'a> = (&'a str, Option<&'a str>, Option<f64>);

fn reference_expr<'a>(input: &mut &'a str) -> ModalResult<RefParts<'a>> {
    (target, opt(attribute), opt(offset)).parse_next(input)
}

fn target<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited("$(", reference_token, ')').parse_next(input)
}

/// `self`, `superview`, or `[A-Za-z0-9+/=]+`.
fn reference_token<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')
    })
    .parse_next(input)
}

fn attribute<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    preceded('.', alpha1).parse_next(input)
}

/// ` + 12` / ` - 3`. Zero and leading zeros are not offsets.
fn offset(input: &mut &str) -> ModalResult<f64> {
    let sign = preceded(' ', one_of(['+', '-'])).parse_next(input)?;
    let magnitude = preceded(' ', (one_of('1'..='9'), digit0).take())
        .try_map(str::parse::<f64>)
        .parse_next(input)?;
    Ok(if sign == '-' { -magnitude } else { magnitude })
}
