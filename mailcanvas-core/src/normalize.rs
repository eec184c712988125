//! Normalization of loosely typed element objects.
//!
//! AI responses and hand-edited JSON may omit style fields, put style
//! properties at the top level, use strings for numbers or skip ids. Every
//! such object goes through [`normalize_element`] before it reaches a
//! [`Template`](crate::Template); the result always has a complete,
//! type-consistent payload.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::css::parse_px;
use crate::element::{
    DEFAULT_BUTTON_HREF, DEFAULT_BUTTON_TEXT, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE,
    DEFAULT_FONT_WEIGHT, DEFAULT_IMAGE_ALT, DEFAULT_IMAGE_SRC, DEFAULT_OBJECT_POSITION,
    DEFAULT_POSITION, DEFAULT_SHAPE_BACKGROUND, DEFAULT_SHAPE_BORDER_COLOR,
    DEFAULT_SHAPE_BORDER_WIDTH, DEFAULT_TEXT_COLOR, DEFAULT_TEXT_CONTENT,
};
use crate::{
    zorder, ButtonStyle, Element, ElementId, ElementKind, ElementType, ImageStyle, ObjectFit,
    Position, ShapeStyle, ShapeType, Size, TextAlign, TextStyle,
};

/// Normalize a list of raw element objects.
///
/// Objects without a recognizable `type` are dropped. Missing z-indices
/// default to the object's position in the list. Duplicate or empty ids are
/// replaced with fresh ones, and shared z-indices are renumbered so the
/// result has distinct stacking values.
#[must_use]
pub fn normalize_elements(raw: &[Value]) -> Vec<Element> {
    let mut seen = HashSet::new();
    let mut elements: Vec<Element> = raw
        .iter()
        .zip(0_i32..)
        .filter_map(|(value, index)| normalize_element(value, index))
        .map(|mut element| {
            if !seen.insert(element.id.clone()) {
                element.id = ElementId::new();
                seen.insert(element.id.clone());
            }
            element
        })
        .collect();

    if zorder::make_unique(&mut elements) {
        tracing::debug!(count = elements.len(), "Renumbered shared z-indices");
    }
    elements
}

/// Fill every missing field of a raw element object with its type default.
///
/// Returns `None` when the object has no recognizable `type`.
#[must_use]
pub fn normalize_element(raw: &Value, default_z: i32) -> Option<Element> {
    let object = raw.as_object()?;
    let Some(element_type) = object
        .get("type")
        .and_then(Value::as_str)
        .and_then(ElementType::parse)
    else {
        tracing::debug!(raw_type = ?object.get("type"), "Dropping element without a known type");
        return None;
    };

    let fields = Fields::new(object);
    let id = fields
        .top_str("id")
        .map_or_else(ElementId::new, ElementId::from_string);

    let kind = match element_type {
        ElementType::Text => text_kind(&fields),
        ElementType::Image => image_kind(&fields),
        ElementType::Shape => shape_kind(&fields),
        ElementType::Button => button_kind(&fields),
    };

    let default_size = element_type.default_size();
    let position = Position::new(
        fields.int_in("position", "x").unwrap_or(DEFAULT_POSITION.x),
        fields.int_in("position", "y").unwrap_or(DEFAULT_POSITION.y),
    );
    let size = Size::new(
        fields
            .positive_in("size", "width")
            .unwrap_or(default_size.width),
        fields
            .positive_in("size", "height")
            .unwrap_or(default_size.height),
    );
    let z_index = fields.top_int("zIndex").unwrap_or(default_z).max(0);

    Some(Element {
        id,
        position,
        size,
        z_index,
        kind,
    })
}

fn text_kind(fields: &Fields<'_>) -> ElementKind {
    ElementKind::Text {
        content: fields
            .top_str("content")
            .or_else(|| fields.top_str("text"))
            .unwrap_or(DEFAULT_TEXT_CONTENT)
            .to_string(),
        style: TextStyle {
            font_size: fields.positive("fontSize").unwrap_or(DEFAULT_FONT_SIZE),
            font_weight: fields
                .string("fontWeight")
                .unwrap_or_else(|| DEFAULT_FONT_WEIGHT.to_string()),
            color: fields
                .string("color")
                .unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string()),
            text_align: fields
                .str("textAlign")
                .and_then(TextAlign::parse)
                .unwrap_or_default(),
            font_family: Some(
                fields
                    .string("fontFamily")
                    .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
            ),
        },
    }
}

fn image_kind(fields: &Fields<'_>) -> ElementKind {
    ElementKind::Image {
        src: fields
            .top_str("src")
            .unwrap_or(DEFAULT_IMAGE_SRC)
            .to_string(),
        alt: fields
            .top_str("alt")
            .unwrap_or(DEFAULT_IMAGE_ALT)
            .to_string(),
        style: ImageStyle {
            object_fit: fields
                .str("objectFit")
                .and_then(ObjectFit::parse)
                .unwrap_or_default(),
            object_position: Some(
                fields
                    .string("objectPosition")
                    .unwrap_or_else(|| DEFAULT_OBJECT_POSITION.to_string()),
            ),
            border_radius: fields.non_negative("borderRadius").unwrap_or(0),
        },
    }
}

fn shape_kind(fields: &Fields<'_>) -> ElementKind {
    ElementKind::Shape {
        shape_type: fields
            .str("shapeType")
            .and_then(ShapeType::parse)
            .unwrap_or_default(),
        style: ShapeStyle {
            background_color: fields
                .string("backgroundColor")
                .unwrap_or_else(|| DEFAULT_SHAPE_BACKGROUND.to_string()),
            border_color: fields
                .string("borderColor")
                .unwrap_or_else(|| DEFAULT_SHAPE_BORDER_COLOR.to_string()),
            border_width: fields
                .non_negative("borderWidth")
                .unwrap_or(DEFAULT_SHAPE_BORDER_WIDTH),
            border_radius: fields.non_negative("borderRadius").unwrap_or(0),
        },
    }
}

fn button_kind(fields: &Fields<'_>) -> ElementKind {
    let defaults = ButtonStyle::default();
    ElementKind::Button {
        text: fields
            .top_str("text")
            .or_else(|| fields.top_str("content"))
            .unwrap_or(DEFAULT_BUTTON_TEXT)
            .to_string(),
        href: fields
            .top_str("href")
            .unwrap_or(DEFAULT_BUTTON_HREF)
            .to_string(),
        style: ButtonStyle {
            background_color: fields
                .string("backgroundColor")
                .unwrap_or(defaults.background_color),
            color: fields.string("color").unwrap_or(defaults.color),
            font_size: fields.positive("fontSize").unwrap_or(defaults.font_size),
            border_radius: fields
                .non_negative("borderRadius")
                .unwrap_or(defaults.border_radius),
            padding_x: fields
                .non_negative("paddingX")
                .unwrap_or(defaults.padding_x),
            padding_y: fields
                .non_negative("paddingY")
                .unwrap_or(defaults.padding_y),
        },
    }
}

/// Field lookup over a raw element: style properties are read from the
/// `style` object first, then from the top level.
struct Fields<'a> {
    top: &'a Map<String, Value>,
    style: Option<&'a Map<String, Value>>,
}

impl<'a> Fields<'a> {
    fn new(top: &'a Map<String, Value>) -> Self {
        Self {
            top,
            style: top.get("style").and_then(Value::as_object),
        }
    }

    fn lookup(&self, key: &str) -> Option<&'a Value> {
        self.style
            .and_then(|style| style.get(key))
            .or_else(|| self.top.get(key))
            .filter(|value| !value.is_null())
    }

    fn top_str(&self, key: &str) -> Option<&'a str> {
        self.top
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    fn top_int(&self, key: &str) -> Option<i32> {
        self.top.get(key).and_then(as_int)
    }

    fn str(&self, key: &str) -> Option<&'a str> {
        self.lookup(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Strings as-is, numbers stringified (`fontWeight: 700`).
    fn string(&self, key: &str) -> Option<String> {
        match self.lookup(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn positive(&self, key: &str) -> Option<u32> {
        self.non_negative(key).filter(|&v| v > 0)
    }

    fn non_negative(&self, key: &str) -> Option<u32> {
        self.lookup(key)
            .and_then(as_int)
            .and_then(|v| u32::try_from(v).ok())
    }

    /// `position.x`, or a top-level `x`.
    fn int_in(&self, group: &str, key: &str) -> Option<i32> {
        self.top
            .get(group)
            .and_then(|g| g.get(key))
            .or_else(|| self.top.get(key))
            .and_then(as_int)
    }

    fn positive_in(&self, group: &str, key: &str) -> Option<u32> {
        self.int_in(group, key)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|&v| v > 0)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn as_int(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(|v| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| f.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
            }),
        Value::String(s) => parse_px(s),
        _ => None,
    }
}
