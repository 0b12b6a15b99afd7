//! Core data model for live nodes.
//!
//! A node is one visual element: an identifier, a kind (which carries the
//! capability-specific record for labels, buttons and image views), a
//! frame, generic view attributes, layer attributes, and the constraint
//! bookkeeping used by the patch engine. The tree that owns nodes lives in
//! [`crate::tree`].

use crate::id::NodeId;
use crate::tree::ConstraintId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const CLEAR: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const GREEN: Color = Color::rgba(0.0, 1.0, 0.0, 1.0);
    pub const BROWN: Color = Color::rgba(0.6, 0.4, 0.2, 1.0);
    pub const BLUE: Color = Color::rgba(0.0, 0.0, 1.0, 1.0);
    pub const RED: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Resolve a color string from a change document.
    ///
    /// `#` followed only by hex digits goes through [`Color::from_hex`];
    /// otherwise one of the named constants. Anything else is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        if let Some(hex) = value.strip_prefix('#') {
            if !hex.is_empty() && hex.bytes().all(|c| hex_val(c).is_some()) {
                return Some(Self::from_hex(hex));
            }
            return None;
        }
        Self::from_name(value)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "black" => Some(Self::BLACK),
            "white" => Some(Self::WHITE),
            "green" => Some(Self::GREEN),
            "brown" => Some(Self::BROWN),
            "blue" => Some(Self::BLUE),
            "red" => Some(Self::RED),
            _ => None,
        }
    }

    /// Decode `RGB`, `RRGGBB` or `AARRGGBB` hex digits (optional `#`).
    /// Any other length yields [`Color::CLEAR`].
    pub fn from_hex(hex: &str) -> Self {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let Some(int) = hex
            .bytes()
            .try_fold(0u32, |acc, c| Some(acc << 4 | hex_val(c)? as u32))
        else {
            return Self::CLEAR;
        };

        let (a, r, g, b) = match hex.len() {
            3 => (255, (int >> 8) * 17, (int >> 4 & 0xF) * 17, (int & 0xF) * 17),
            6 => (255, int >> 16, int >> 8 & 0xFF, int & 0xFF),
            8 => (int >> 24, int >> 16 & 0xFF, int >> 8 & 0xFF, int & 0xFF),
            _ => return Self::CLEAR,
        };
        Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Same color with a different alpha component.
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: alpha.clamp(0.0, 1.0),
            ..self
        }
    }
}

// ─── Fonts ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontWeight {
    UltraLight,
    Thin,
    Light,
    Regular,
    Medium,
    Semibold,
    Bold,
    Heavy,
    Black,
}

impl FontWeight {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "UltraLight" => FontWeight::UltraLight,
            "Thin" => FontWeight::Thin,
            "Light" => FontWeight::Light,
            "Regular" => FontWeight::Regular,
            "Medium" => FontWeight::Medium,
            "Semibold" => FontWeight::Semibold,
            "Bold" => FontWeight::Bold,
            "Heavy" => FontWeight::Heavy,
            "Black" => FontWeight::Black,
            _ => return None,
        })
    }
}

/// Semantic (dynamic type) text styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextStyle {
    Body,
    Caption1,
    Caption2,
    Footnote,
    Headline,
    Subheadline,
    Title1,
    Title2,
    Title3,
    Callout,
    LargeTitle,
}

impl TextStyle {
    /// Resolve a style name, honoring the platform level that introduced it.
    pub fn from_name(name: &str, platform_level: u32) -> Option<Self> {
        let (style, since) = match name {
            "Body" => (TextStyle::Body, 0),
            "Caption1" => (TextStyle::Caption1, 0),
            "Caption2" => (TextStyle::Caption2, 0),
            "Footnote" => (TextStyle::Footnote, 0),
            "Headline" => (TextStyle::Headline, 0),
            "Subheadline" => (TextStyle::Subheadline, 0),
            "Title1" => (TextStyle::Title1, 9),
            "Title2" => (TextStyle::Title2, 9),
            "Title3" => (TextStyle::Title3, 9),
            "Callout" => (TextStyle::Callout, 9),
            "LargeTitle" => (TextStyle::LargeTitle, 11),
            _ => return None,
        };
        (platform_level >= since).then_some(style)
    }
}

/// A resolved font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Font {
    System { size: f64, weight: FontWeight },
    SystemItalic { size: f64 },
    TextStyle(TextStyle),
    Named { name: String, size: f64 },
}

/// Font description as it arrives in property bags.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontDescriptor {
    pub family_name: Option<String>,
    pub font_style: Option<String>,
    pub point_size: Option<f64>,
    pub font_name: Option<String>,
}

impl FontDescriptor {
    /// Prefer a system-font description; fall back to family name + size.
    ///
    /// The system families (`System`, `System Italic`, `Text Style`) never
    /// fall back: if their style is unknown at this platform level there is
    /// no font.
    pub fn resolve(&self, platform_level: u32) -> Option<Font> {
        if let Some(font) = self.system_font(platform_level) {
            return Some(font);
        }
        match self.family_name.as_deref() {
            Some("System" | "System Italic" | "Text Style") => None,
            _ => Some(Font::Named {
                name: self.font_name.clone()?,
                size: self.point_size?,
            }),
        }
    }

    fn system_font(&self, platform_level: u32) -> Option<Font> {
        let family = self.family_name.as_deref()?;
        let style = self.font_style.as_deref()?;
        let size = self.point_size?;
        match family {
            "System" => FontWeight::from_name(style).map(|weight| Font::System { size, weight }),
            "System Italic" => Some(Font::SystemItalic { size }),
            "Text Style" => TextStyle::from_name(style, platform_level).map(Font::TextStyle),
            _ => None,
        }
    }
}

// ─── Text attributes ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlignment {
    Left,
    Center,
    Right,
    Justified,
    #[default]
    Natural,
}

impl TextAlignment {
    pub fn from_raw(raw: i64) -> Option<Self> {
        Some(match raw {
            0 => TextAlignment::Left,
            1 => TextAlignment::Center,
            2 => TextAlignment::Right,
            3 => TextAlignment::Justified,
            4 => TextAlignment::Natural,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineBreakMode {
    WordWrap,
    CharWrap,
    Clip,
    TruncateHead,
    #[default]
    TruncateTail,
    TruncateMiddle,
}

impl LineBreakMode {
    pub fn from_raw(raw: i64) -> Option<Self> {
        Some(match raw {
            0 => LineBreakMode::WordWrap,
            1 => LineBreakMode::CharWrap,
            2 => LineBreakMode::Clip,
            3 => LineBreakMode::TruncateHead,
            4 => LineBreakMode::TruncateTail,
            5 => LineBreakMode::TruncateMiddle,
            _ => return None,
        })
    }
}

/// Text content shared by labels and button titles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: Option<String>,
    pub color: Option<Color>,
    pub font: Option<Font>,
    pub number_of_lines: i64,
    pub alignment: TextAlignment,
    pub line_break: LineBreakMode,
}

impl Default for TextContent {
    fn default() -> Self {
        Self {
            text: None,
            color: None,
            font: None,
            number_of_lines: 1,
            alignment: TextAlignment::default(),
            line_break: LineBreakMode::default(),
        }
    }
}

// ─── Images ──────────────────────────────────────────────────────────────

/// Decoded image content, tagged with the locator it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageContent {
    pub src: String,
    pub data: Vec<u8>,
}

// ─── Geometry ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Read one of `x`, `y`, `width`, `height` by name.
    pub fn get(&self, field: &str) -> Option<f64> {
        match field {
            "x" => Some(self.x),
            "y" => Some(self.y),
            "width" => Some(self.width),
            "height" => Some(self.height),
            _ => None,
        }
    }

    /// Write one of `x`, `y`, `width`, `height` by name. Returns false for
    /// any other field.
    pub fn set(&mut self, field: &str, value: f64) -> bool {
        match field {
            "x" => self.x = value,
            "y" => self.y = value,
            "width" => self.width = value,
            "height" => self.height = value,
            _ => return false,
        }
        true
    }
}

// ─── Visual attributes ───────────────────────────────────────────────────

/// Attributes every node has, regardless of kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewAttributes {
    pub background_color: Option<Color>,
    pub tint_color: Option<Color>,
    pub alpha: f64,
    pub tag: i64,
    pub is_hidden: bool,
    pub clips_to_bounds: bool,
    pub is_user_interaction_enabled: bool,
    /// Raw content mode (0 = scaleToFill … 12 = bottomRight).
    pub content_mode: u8,
    /// Raw semantic content attribute (0 = unspecified … 4 = forceRightToLeft).
    pub semantic_content_attribute: u8,
}

impl Default for ViewAttributes {
    fn default() -> Self {
        Self {
            background_color: None,
            tint_color: None,
            alpha: 1.0,
            tag: 0,
            is_hidden: false,
            clips_to_bounds: false,
            is_user_interaction_enabled: true,
            content_mode: 0,
            semantic_content_attribute: 0,
        }
    }
}

pub const CONTENT_MODE_MAX: i64 = 12;
pub const SEMANTIC_CONTENT_ATTRIBUTE_MAX: i64 = 4;

/// The backing layer's attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerAttributes {
    pub background_color: Option<Color>,
    pub border_color: Option<Color>,
    pub shadow_color: Option<Color>,
    pub corner_radius: f64,
    pub border_width: f64,
    pub shadow_opacity: f64,
    pub shadow_radius: f64,
    pub opacity: f64,
    pub masks_to_bounds: bool,
}

impl Default for LayerAttributes {
    fn default() -> Self {
        Self {
            background_color: None,
            border_color: None,
            shadow_color: None,
            corner_radius: 0.0,
            border_width: 0.0,
            shadow_opacity: 0.0,
            shadow_radius: 3.0,
            opacity: 1.0,
            masks_to_bounds: false,
        }
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// Capability variants. The variant is fixed by the type tag at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Plain container view.
    View,

    /// Text label.
    Label(TextContent),

    /// Button with a title label addressed as `<id>_label`.
    Button { title_id: NodeId, title: TextContent },

    /// Image view.
    ImageView {
        image: Option<ImageContent>,
        highlighted_image: Option<ImageContent>,
    },
}

impl NodeKind {
    /// Node factory: map a type tag to a constructible kind.
    ///
    /// Accepts both bare (`Label`) and platform-prefixed (`UILabel`) tags.
    pub fn from_type_tag(tag: &str, id: NodeId) -> Option<Self> {
        Some(match Self::known_tag(tag)? {
            "View" => NodeKind::View,
            "Label" => NodeKind::Label(TextContent::default()),
            "Button" => NodeKind::Button {
                title_id: id.suffixed("label"),
                title: TextContent::default(),
            },
            "ImageView" => NodeKind::ImageView {
                image: None,
                highlighted_image: None,
            },
            _ => return None,
        })
    }

    /// The bare tag a constructible kind is known by, if `tag` names one.
    pub fn known_tag(tag: &str) -> Option<&'static str> {
        let tag = tag.strip_prefix("UI").unwrap_or(tag);
        ["View", "Label", "Button", "ImageView"]
            .into_iter()
            .find(|known| *known == tag)
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            NodeKind::View => "View",
            NodeKind::Label(_) => "Label",
            NodeKind::Button { .. } => "Button",
            NodeKind::ImageView { .. } => "ImageView",
        }
    }
}

/// A single live node.
#[derive(Debug, Clone)]
pub struct Node {
    /// Assigned at creation, never changed.
    pub id: NodeId,

    pub kind: NodeKind,

    pub frame: Frame,

    pub view: ViewAttributes,

    pub layer: LayerAttributes,

    /// Cleared once the node is positioned by constraints.
    pub translates_autoresizing_mask: bool,

    /// Constraints installed on this node (it is their nearest common
    /// ancestor). Maintained by the tree on activate/deactivate.
    pub installed: SmallVec<[ConstraintId; 4]>,

    /// Addressable constraint list captured when construction finished.
    /// Index-based updates address this list; appends never reorder it.
    pub constraints_state: Vec<ConstraintId>,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            frame: Frame::default(),
            view: ViewAttributes::default(),
            layer: LayerAttributes::default(),
            translates_autoresizing_mask: true,
            installed: SmallVec::new(),
            constraints_state: Vec::new(),
        }
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }

    /// Text content for labels and button titles.
    pub fn text(&self) -> Option<&TextContent> {
        match &self.kind {
            NodeKind::Label(text) => Some(text),
            NodeKind::Button { title, .. } => Some(title),
            _ => None,
        }
    }
}
