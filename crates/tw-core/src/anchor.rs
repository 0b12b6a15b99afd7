//! Anchor and relation vocabulary.
//!
//! Two closed, bidirectional symbol tables: geometric attributes
//! (`top`, `leading`, `width`, …) and relations (`<`, `=`, `>`). Config
//! documents may carry either the symbolic name or the raw integer code;
//! both resolve through the same tables.

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Name-or-code values ─────────────────────────────────────────────────

/// A loosely typed vocabulary value as it appears in config documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymbolOrCode {
    Code(i64),
    Name(String),
}

impl From<&str> for SymbolOrCode {
    fn from(s: &str) -> Self {
        SymbolOrCode::Name(s.to_string())
    }
}

impl From<i64> for SymbolOrCode {
    fn from(code: i64) -> Self {
        SymbolOrCode::Code(code)
    }
}

// ─── Attributes ──────────────────────────────────────────────────────────

/// Which axis an attribute lives on. Constraints may only relate anchors
/// on the same axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
    Dimension,
    None,
}

/// A named geometric attribute of a node, used as a constraint endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    NoAttribute,
    Left,
    Right,
    Top,
    Bottom,
    Leading,
    Trailing,
    Width,
    Height,
    CenterX,
    CenterY,
    LastBaseline,
    FirstBaseline,
    LeftMargin,
    RightMargin,
    TopMargin,
    BottomMargin,
    LeadingMargin,
    TrailingMargin,
    CenterXWithinMargins,
    CenterYWithinMargins,
}

/// Symbol table: (name, attribute, code). Order matches the codes.
const ATTRIBUTES: [(&str, Attribute); 21] = [
    ("noAttribute", Attribute::NoAttribute),
    ("left", Attribute::Left),
    ("right", Attribute::Right),
    ("top", Attribute::Top),
    ("bottom", Attribute::Bottom),
    ("leading", Attribute::Leading),
    ("trailing", Attribute::Trailing),
    ("width", Attribute::Width),
    ("height", Attribute::Height),
    ("centerX", Attribute::CenterX),
    ("centerY", Attribute::CenterY),
    ("lastBaseline", Attribute::LastBaseline),
    ("firstBaseline", Attribute::FirstBaseline),
    ("leftMargin", Attribute::LeftMargin),
    ("rightMargin", Attribute::RightMargin),
    ("topMargin", Attribute::TopMargin),
    ("bottomMargin", Attribute::BottomMargin),
    ("leadingMargin", Attribute::LeadingMargin),
    ("trailingMargin", Attribute::TrailingMargin),
    ("centerXWithinMargins", Attribute::CenterXWithinMargins),
    ("centerYWithinMargins", Attribute::CenterYWithinMargins),
];

impl Attribute {
    pub fn from_name(name: &str) -> Option<Self> {
        ATTRIBUTES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, attr)| *attr)
    }

    pub fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| ATTRIBUTES.get(i))
            .map(|(_, attr)| *attr)
    }

    /// Accept either representation; anything else is unresolved.
    pub fn resolve(value: &SymbolOrCode) -> Option<Self> {
        match value {
            SymbolOrCode::Name(name) => Self::from_name(name),
            SymbolOrCode::Code(code) => Self::from_code(*code),
        }
    }

    pub fn name(self) -> &'static str {
        ATTRIBUTES[self.code() as usize].0
    }

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn axis(self) -> Axis {
        use Attribute::*;
        match self {
            Left | Right | Leading | Trailing | CenterX | LeftMargin | RightMargin
            | LeadingMargin | TrailingMargin | CenterXWithinMargins => Axis::Horizontal,
            Top | Bottom | CenterY | LastBaseline | FirstBaseline | TopMargin | BottomMargin
            | CenterYWithinMargins => Axis::Vertical,
            Width | Height => Axis::Dimension,
            NoAttribute => Axis::None,
        }
    }

    pub fn is_dimension(self) -> bool {
        self.axis() == Axis::Dimension
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Relations ───────────────────────────────────────────────────────────

/// How the first anchor relates to the second: ≤, =, ≥.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Relation {
    LessThanOrEqual,
    #[default]
    Equal,
    GreaterThanOrEqual,
}

impl Relation {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(Relation::LessThanOrEqual),
            "=" => Some(Relation::Equal),
            ">" => Some(Relation::GreaterThanOrEqual),
            _ => None,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(Relation::LessThanOrEqual),
            0 => Some(Relation::Equal),
            1 => Some(Relation::GreaterThanOrEqual),
            _ => None,
        }
    }

    pub fn resolve(value: &SymbolOrCode) -> Option<Self> {
        match value {
            SymbolOrCode::Name(symbol) => Self::from_symbol(symbol),
            SymbolOrCode::Code(code) => Self::from_code(*code),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Relation::LessThanOrEqual => "<",
            Relation::Equal => "=",
            Relation::GreaterThanOrEqual => ">",
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Relation::LessThanOrEqual => -1,
            Relation::Equal => 0,
            Relation::GreaterThanOrEqual => 1,
        }
    }
}
