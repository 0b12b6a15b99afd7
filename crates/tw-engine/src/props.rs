//! Property and layer application.
//!
//! Each key of a property bag is offered to the capability handlers in a
//! fixed order (generic view, label, button, image view) and the first
//! one that recognizes it wins. Unclaimed keys fall back to a closed table
//! of typed attribute slots per node kind, with the value coerced by the
//! slot's type. A key that nothing accepts is skipped on its own; the rest
//! of the bag still applies.

use crate::config::EngineMode;
use crate::diagnostics::{ApplyReport, TweakError};
use crate::engine::LayoutEngine;
use crate::image::{ImageSlot, PendingImage, is_remote};
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use tw_core::model::{CONTENT_MODE_MAX, SEMANTIC_CONTENT_ATTRIBUTE_MAX};
use tw_core::{
    Color, Font, FontDescriptor, LayerAttributes, LineBreakMode, Node, NodeIndex, NodeKind,
    TextAlignment,
};

/// A typed, writable attribute.
enum Slot<'a> {
    Color(&'a mut Option<Color>),
    Number(&'a mut f64),
    Integer(&'a mut i64),
    Bool(&'a mut bool),
    Text(&'a mut Option<String>),
    Font(&'a mut Option<Font>),
}

impl LayoutEngine {
    pub(crate) fn apply_properties(
        &mut self,
        idx: NodeIndex,
        props: &Map<String, Value>,
        report: &mut ApplyReport,
    ) {
        let level = self.config.platform_level;
        for (key, value) in props {
            if self.apply_specific(idx, key, value, report) {
                continue;
            }
            let Some(node) = self.tree.node_mut(idx) else {
                return;
            };
            let claimed = view_slot(node, key).is_some_and(|slot| assign(slot, value, level));
            if !claimed {
                let node_id = node.id;
                report.record(Some(node_id), TweakError::unclaimed(key.as_str()));
            }
        }
    }

    pub(crate) fn apply_layer(
        &mut self,
        idx: NodeIndex,
        layer: &Map<String, Value>,
        report: &mut ApplyReport,
    ) {
        let level = self.config.platform_level;
        let Some(node) = self.tree.node_mut(idx) else {
            return;
        };
        for (key, value) in layer {
            let claimed =
                layer_slot(&mut node.layer, key).is_some_and(|slot| assign(slot, value, level));
            if !claimed {
                report.record(Some(node.id), TweakError::unclaimed(format!("layer.{key}")));
            }
        }
    }

    /// Capability handlers in precedence order.
    fn apply_specific(
        &mut self,
        idx: NodeIndex,
        key: &str,
        value: &Value,
        report: &mut ApplyReport,
    ) -> bool {
        let level = self.config.platform_level;
        if let Some(node) = self.tree.node_mut(idx)
            && (set_view_specific(node, key, value)
                || set_label_specific(node, key, value)
                || set_button_specific(node, key, value, level))
        {
            return true;
        }
        self.set_image_specific(idx, key, value, report)
    }

    fn set_image_specific(
        &mut self,
        idx: NodeIndex,
        key: &str,
        value: &Value,
        report: &mut ApplyReport,
    ) -> bool {
        let Some(slot) = ImageSlot::from_key(key) else {
            return false;
        };
        let Some(node) = self.tree.node(idx) else {
            return false;
        };
        if !matches!(node.kind, NodeKind::ImageView { .. }) {
            return false;
        }
        let Some(src) = value
            .get("src")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        else {
            return false;
        };
        let node_id = node.id;

        let resolved = if is_remote(src) {
            match self.config.mode {
                EngineMode::Development => self.images.fetch(src),
                EngineMode::Production => {
                    log::debug!("deferring fetch of {src} for {node_id}");
                    self.pending_images.push(PendingImage {
                        node: idx,
                        slot,
                        src: src.to_string(),
                    });
                    return true;
                }
            }
        } else {
            self.images
                .named(src)
                .ok_or_else(|| "no bundled asset with that name".to_string())
        };

        match resolved {
            Ok(mut content) => {
                content.src = src.to_string();
                self.store_image(idx, slot, content);
            }
            Err(reason) => report.record(
                Some(node_id),
                TweakError::ImageUnavailable {
                    src: src.to_string(),
                    reason,
                },
            ),
        }
        true
    }
}

// ─── Capability handlers ─────────────────────────────────────────────────

fn set_view_specific(node: &mut Node, key: &str, value: &Value) -> bool {
    let Some(raw) = value.as_i64() else {
        return false;
    };
    match key {
        "contentMode" if (0..=CONTENT_MODE_MAX).contains(&raw) => {
            node.view.content_mode = raw as u8;
            true
        }
        "semanticContentAttribute" if (0..=SEMANTIC_CONTENT_ATTRIBUTE_MAX).contains(&raw) => {
            node.view.semantic_content_attribute = raw as u8;
            true
        }
        _ => false,
    }
}

fn set_label_specific(node: &mut Node, key: &str, value: &Value) -> bool {
    let NodeKind::Label(text) = &mut node.kind else {
        return false;
    };
    let Some(raw) = value.as_i64() else {
        return false;
    };
    match key {
        "textAlignment" => TextAlignment::from_raw(raw)
            .map(|a| text.alignment = a)
            .is_some(),
        "lineBreakMode" => LineBreakMode::from_raw(raw)
            .map(|m| text.line_break = m)
            .is_some(),
        _ => false,
    }
}

/// `title: { text, textAlignment, textColor, font, lineBreakMode, numberOfLines }`
fn set_button_specific(node: &mut Node, key: &str, value: &Value, level: u32) -> bool {
    let NodeKind::Button { title, .. } = &mut node.kind else {
        return false;
    };
    if key != "title" {
        return false;
    }
    let Some(fields) = value.as_object() else {
        return false;
    };

    for (field, v) in fields {
        let applied = match field.as_str() {
            "text" => v.as_str().map(|s| title.text = Some(s.to_string())).is_some(),
            "textAlignment" => v
                .as_i64()
                .and_then(TextAlignment::from_raw)
                .map(|a| title.alignment = a)
                .is_some(),
            "textColor" => color_value(v).map(|c| title.color = Some(c)).is_some(),
            "font" => font_value(v, level).map(|f| title.font = Some(f)).is_some(),
            "lineBreakMode" => v
                .as_i64()
                .and_then(LineBreakMode::from_raw)
                .map(|m| title.line_break = m)
                .is_some(),
            "numberOfLines" => v.as_i64().map(|n| title.number_of_lines = n).is_some(),
            _ => false,
        };
        if !applied {
            log::debug!("{}: title.{field} ignored ({v})", node.id);
        }
    }
    true
}

// ─── Generic typed slots ─────────────────────────────────────────────────

fn view_slot<'a>(node: &'a mut Node, key: &str) -> Option<Slot<'a>> {
    if let NodeKind::Label(text) = &mut node.kind {
        let slot = match key {
            "text" => Some(Slot::Text(&mut text.text)),
            "textColor" => Some(Slot::Color(&mut text.color)),
            "font" => Some(Slot::Font(&mut text.font)),
            "numberOfLines" => Some(Slot::Integer(&mut text.number_of_lines)),
            _ => None,
        };
        if slot.is_some() {
            return slot;
        }
    }

    let view = &mut node.view;
    Some(match key {
        "backgroundColor" => Slot::Color(&mut view.background_color),
        "tintColor" => Slot::Color(&mut view.tint_color),
        "alpha" => Slot::Number(&mut view.alpha),
        "tag" => Slot::Integer(&mut view.tag),
        "isHidden" => Slot::Bool(&mut view.is_hidden),
        "clipsToBounds" => Slot::Bool(&mut view.clips_to_bounds),
        "isUserInteractionEnabled" => Slot::Bool(&mut view.is_user_interaction_enabled),
        _ => return None,
    })
}

fn layer_slot<'a>(layer: &'a mut LayerAttributes, key: &str) -> Option<Slot<'a>> {
    Some(match key {
        "backgroundColor" => Slot::Color(&mut layer.background_color),
        "borderColor" => Slot::Color(&mut layer.border_color),
        "shadowColor" => Slot::Color(&mut layer.shadow_color),
        "cornerRadius" => Slot::Number(&mut layer.corner_radius),
        "borderWidth" => Slot::Number(&mut layer.border_width),
        "shadowOpacity" => Slot::Number(&mut layer.shadow_opacity),
        "shadowRadius" => Slot::Number(&mut layer.shadow_radius),
        "opacity" => Slot::Number(&mut layer.opacity),
        "masksToBounds" => Slot::Bool(&mut layer.masks_to_bounds),
        _ => return None,
    })
}

/// Coerce `value` into the slot's type. False when the shapes don't fit.
fn assign(slot: Slot<'_>, value: &Value, level: u32) -> bool {
    match (slot, value) {
        (Slot::Color(dst), Value::String(_) | Value::Object(_)) => set_some(dst, color_value(value)),
        (Slot::Text(dst), Value::String(s)) => {
            *dst = Some(s.clone());
            true
        }
        (Slot::Number(dst), Value::Number(n)) => n.as_f64().map(|v| *dst = v).is_some(),
        (Slot::Integer(dst), Value::Number(n)) => integral(n).map(|v| *dst = v).is_some(),
        (Slot::Bool(dst), Value::Bool(b)) => {
            *dst = *b;
            true
        }
        (Slot::Font(dst), Value::Object(_)) => set_some(dst, font_value(value, level)),
        _ => false,
    }
}

fn set_some<T>(dst: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            *dst = Some(v);
            true
        }
        None => false,
    }
}

fn integral(n: &Number) -> Option<i64> {
    n.as_i64()
        .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
}

/// A color string, or `{ hexValue, alpha }`.
fn color_value(value: &Value) -> Option<Color> {
    match value {
        Value::String(s) => Color::parse(s),
        Value::Object(obj) => {
            let hex = obj.get("hexValue")?.as_str()?;
            let alpha = obj.get("alpha").and_then(Value::as_f64).unwrap_or(1.0);
            Color::parse(hex).map(|c| c.with_alpha(alpha as f32))
        }
        _ => None,
    }
}

fn font_value(value: &Value, level: u32) -> Option<Font> {
    FontDescriptor::deserialize(value).ok()?.resolve(level)
}
