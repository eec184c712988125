//! Canvas elements - the building blocks of an email template.
//!
//! An [`Element`] is one positioned, styled visual unit. The per-type payload
//! lives in the closed [`ElementKind`] union so generators and editors match
//! exhaustively instead of probing loose style bags.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position used for freshly created palette elements.
pub const DEFAULT_POSITION: Position = Position { x: 50, y: 50 };

/// Default text element content.
pub const DEFAULT_TEXT_CONTENT: &str = "Enter text here";
/// Default font size for text and buttons, in pixels.
pub const DEFAULT_FONT_SIZE: u32 = 16;
/// Default text font weight.
pub const DEFAULT_FONT_WEIGHT: &str = "400";
/// Default text color.
pub const DEFAULT_TEXT_COLOR: &str = "#000000";
/// Default font stack for text elements.
pub const DEFAULT_FONT_FAMILY: &str = "Inter, sans-serif";

/// Default image source.
pub const DEFAULT_IMAGE_SRC: &str = "https://via.placeholder.com/200x100";
/// Default image alt text.
pub const DEFAULT_IMAGE_ALT: &str = "Image";
/// Default image object position.
pub const DEFAULT_OBJECT_POSITION: &str = "center";

/// Default shape fill.
pub const DEFAULT_SHAPE_BACKGROUND: &str = "#e5e7eb";
/// Default shape border color.
pub const DEFAULT_SHAPE_BORDER_COLOR: &str = "#000000";
/// Default shape border width, in pixels.
pub const DEFAULT_SHAPE_BORDER_WIDTH: u32 = 2;

/// Default button label.
pub const DEFAULT_BUTTON_TEXT: &str = "Click me";
/// Default button link target.
pub const DEFAULT_BUTTON_HREF: &str = "https://example.com";
/// Default button fill.
pub const DEFAULT_BUTTON_BACKGROUND: &str = "#3b82f6";
/// Default button label color.
pub const DEFAULT_BUTTON_COLOR: &str = "#ffffff";
/// Default button corner radius, in pixels.
pub const DEFAULT_BUTTON_RADIUS: u32 = 8;
/// Default horizontal button padding, in pixels.
pub const DEFAULT_BUTTON_PADDING_X: u32 = 24;
/// Default vertical button padding, in pixels.
pub const DEFAULT_BUTTON_PADDING_Y: u32 = 12;

/// Unique identifier for an element.
///
/// Freshly created elements get a UUID v4, but any non-empty string read back
/// from a stored or AI-generated template is accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier string.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Top-left corner of an element, relative to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Pixels from the left edge.
    pub x: i32,
    /// Pixels from the top edge.
    pub y: i32,
}

impl Position {
    /// Create a position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset this position by the given deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Element dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Left aligned.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Right aligned.
    Right,
}

impl TextAlign {
    /// CSS keyword for this alignment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }

    /// Parse a CSS keyword, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            _ => None,
        }
    }
}

impl fmt::Display for TextAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an image fills its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectFit {
    /// Scale to fit, preserving aspect ratio.
    #[default]
    Contain,
    /// Scale to cover, cropping overflow.
    Cover,
    /// Stretch to the box.
    Fill,
}

impl ObjectFit {
    /// CSS keyword for this fit.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contain => "contain",
            Self::Cover => "cover",
            Self::Fill => "fill",
        }
    }

    /// Parse a CSS keyword, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "contain" => Some(Self::Contain),
            "cover" => Some(Self::Cover),
            "fill" => Some(Self::Fill),
            _ => None,
        }
    }
}

/// Geometry of a shape element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    /// Rectangle with optional rounded corners.
    #[default]
    Rectangle,
    /// Ellipse inscribed in the element box.
    Circle,
}

impl ShapeType {
    /// Parse a shape keyword, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rectangle" | "rect" | "square" => Some(Self::Rectangle),
            "circle" | "ellipse" | "oval" => Some(Self::Circle),
            _ => None,
        }
    }
}

/// Style of a text element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    /// Font size in pixels.
    pub font_size: u32,
    /// CSS font weight (`"400"`, `"bold"`, ...).
    pub font_weight: String,
    /// Text color.
    pub color: String,
    /// Horizontal alignment.
    pub text_align: TextAlign,
    /// Font stack; generators fall back to a mode-specific default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            font_weight: DEFAULT_FONT_WEIGHT.to_string(),
            color: DEFAULT_TEXT_COLOR.to_string(),
            text_align: TextAlign::Left,
            font_family: Some(DEFAULT_FONT_FAMILY.to_string()),
        }
    }
}

/// Style of an image element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStyle {
    /// How the image fills its box.
    pub object_fit: ObjectFit,
    /// CSS object position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_position: Option<String>,
    /// Corner radius in pixels.
    pub border_radius: u32,
}

impl Default for ImageStyle {
    fn default() -> Self {
        Self {
            object_fit: ObjectFit::Contain,
            object_position: None,
            border_radius: 0,
        }
    }
}

/// Style of a shape element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    /// Fill color.
    pub background_color: String,
    /// Border color.
    pub border_color: String,
    /// Border width in pixels.
    pub border_width: u32,
    /// Corner radius in pixels (ignored for circles).
    pub border_radius: u32,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            background_color: DEFAULT_SHAPE_BACKGROUND.to_string(),
            border_color: DEFAULT_SHAPE_BORDER_COLOR.to_string(),
            border_width: DEFAULT_SHAPE_BORDER_WIDTH,
            border_radius: 0,
        }
    }
}

/// Style of a button element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonStyle {
    /// Fill color.
    pub background_color: String,
    /// Label color.
    pub color: String,
    /// Label font size in pixels.
    pub font_size: u32,
    /// Corner radius in pixels.
    pub border_radius: u32,
    /// Horizontal padding in pixels.
    pub padding_x: u32,
    /// Vertical padding in pixels.
    pub padding_y: u32,
}

impl Default for ButtonStyle {
    fn default() -> Self {
        Self {
            background_color: DEFAULT_BUTTON_BACKGROUND.to_string(),
            color: DEFAULT_BUTTON_COLOR.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            border_radius: DEFAULT_BUTTON_RADIUS,
            padding_x: DEFAULT_BUTTON_PADDING_X,
            padding_y: DEFAULT_BUTTON_PADDING_Y,
        }
    }
}

/// Discriminant of [`ElementKind`], used by the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Text block.
    Text,
    /// Image.
    Image,
    /// Rectangle or circle.
    Shape,
    /// Link styled as a button.
    Button,
}

impl ElementType {
    /// Parse a type keyword, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "image" | "img" => Some(Self::Image),
            "shape" => Some(Self::Shape),
            "button" => Some(Self::Button),
            _ => None,
        }
    }

    /// Lowercase keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Shape => "shape",
            Self::Button => "button",
        }
    }

    /// Size given to a freshly created element of this type.
    #[must_use]
    pub const fn default_size(self) -> Size {
        match self {
            Self::Text => Size::new(200, 50),
            Self::Image | Self::Shape => Size::new(200, 100),
            Self::Button => Size::new(150, 40),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The type-specific content of an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A text block; `content` may embed `{{placeholder}}` tokens.
    Text {
        /// Text content.
        content: String,
        /// Text style.
        style: TextStyle,
    },

    /// An image.
    Image {
        /// Image URL.
        src: String,
        /// Alternative text.
        alt: String,
        /// Image style.
        style: ImageStyle,
    },

    /// A decorative rectangle or circle.
    Shape {
        /// Geometry.
        #[serde(rename = "shapeType")]
        shape_type: ShapeType,
        /// Shape style.
        style: ShapeStyle,
    },

    /// A link rendered as a button.
    Button {
        /// Button label.
        text: String,
        /// Link target.
        href: String,
        /// Button style.
        style: ButtonStyle,
    },
}

impl ElementKind {
    /// Default payload for the given element type.
    #[must_use]
    pub fn default_for(element_type: ElementType) -> Self {
        match element_type {
            ElementType::Text => Self::Text {
                content: DEFAULT_TEXT_CONTENT.to_string(),
                style: TextStyle::default(),
            },
            ElementType::Image => Self::Image {
                src: DEFAULT_IMAGE_SRC.to_string(),
                alt: DEFAULT_IMAGE_ALT.to_string(),
                style: ImageStyle::default(),
            },
            ElementType::Shape => Self::Shape {
                shape_type: ShapeType::Rectangle,
                style: ShapeStyle::default(),
            },
            ElementType::Button => Self::Button {
                text: DEFAULT_BUTTON_TEXT.to_string(),
                href: DEFAULT_BUTTON_HREF.to_string(),
                style: ButtonStyle::default(),
            },
        }
    }

    /// The discriminant of this payload.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        match self {
            Self::Text { .. } => ElementType::Text,
            Self::Image { .. } => ElementType::Image,
            Self::Shape { .. } => ElementType::Shape,
            Self::Button { .. } => ElementType::Button,
        }
    }
}

/// A canvas element with content, position, size and stacking order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Unique identifier.
    pub id: ElementId,
    /// Top-left corner.
    pub position: Position,
    /// Dimensions.
    pub size: Size,
    /// Paint order; higher is on top.
    pub z_index: i32,
    /// Type-specific content.
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    /// Create a new element with the given kind, a fresh ID and the type's default geometry.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        let size = kind.element_type().default_size();
        Self {
            id: ElementId::new(),
            position: DEFAULT_POSITION,
            size,
            z_index: 0,
            kind,
        }
    }

    /// Create a well-formed default element of the given type at `(50, 50)`.
    #[must_use]
    pub fn default_of(element_type: ElementType, z_index: i32) -> Self {
        Self::new(ElementKind::default_for(element_type)).with_z_index(z_index)
    }

    /// Set the position.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Set the size.
    #[must_use]
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    /// Set the z-index.
    #[must_use]
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// The discriminant of this element.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    /// Check if a point (in canvas coordinates) is within this element.
    #[must_use]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        let (x, y) = (i64::from(x), i64::from(y));
        let left = i64::from(self.position.x);
        let top = i64::from(self.position.y);
        x >= left
            && x <= left + i64::from(self.size.width)
            && y >= top
            && y <= top + i64::from(self.size.height)
    }

    /// Copy of this element with a fresh ID, shifted by the given offset.
    #[must_use]
    pub fn duplicate(&self, dx: i32, dy: i32) -> Self {
        Self {
            id: ElementId::new(),
            position: self.position.offset(dx, dy),
            ..self.clone()
        }
    }

    /// Apply a partial update; fields that do not apply to this element's type are ignored.
    pub fn apply(&mut self, patch: &ElementPatch) {
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(size) = patch.size {
            self.size = size;
        }

        match &mut self.kind {
            ElementKind::Text { content, style } => {
                set(content, patch.content.as_ref());
                set(&mut style.font_size, patch.font_size.as_ref());
                set(&mut style.font_weight, patch.font_weight.as_ref());
                set(&mut style.color, patch.color.as_ref());
                set(&mut style.text_align, patch.text_align.as_ref());
                if let Some(family) = &patch.font_family {
                    style.font_family = Some(family.clone());
                }
            }
            ElementKind::Image { src, alt, style } => {
                set(src, patch.src.as_ref());
                set(alt, patch.alt.as_ref());
                set(&mut style.object_fit, patch.object_fit.as_ref());
                set(&mut style.border_radius, patch.border_radius.as_ref());
                if let Some(object_position) = &patch.object_position {
                    style.object_position = Some(object_position.clone());
                }
            }
            ElementKind::Shape { shape_type, style } => {
                set(shape_type, patch.shape_type.as_ref());
                set(&mut style.background_color, patch.background_color.as_ref());
                set(&mut style.border_color, patch.border_color.as_ref());
                set(&mut style.border_width, patch.border_width.as_ref());
                set(&mut style.border_radius, patch.border_radius.as_ref());
            }
            ElementKind::Button { text, href, style } => {
                set(text, patch.content.as_ref());
                set(href, patch.href.as_ref());
                set(&mut style.background_color, patch.background_color.as_ref());
                set(&mut style.color, patch.color.as_ref());
                set(&mut style.font_size, patch.font_size.as_ref());
                set(&mut style.border_radius, patch.border_radius.as_ref());
                set(&mut style.padding_x, patch.padding_x.as_ref());
                set(&mut style.padding_y, patch.padding_y.as_ref());
            }
        }
    }
}

fn set<T: Clone>(target: &mut T, value: Option<&T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

/// A partial update to an element: only the named fields change.
///
/// `content` is the text of a text element or the label of a button. Paint
/// order is not patchable; it changes only through the z-order commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementPatch {
    /// New position.
    pub position: Option<Position>,
    /// New size.
    pub size: Option<Size>,
    /// Text content or button label.
    pub content: Option<String>,
    /// Image source.
    pub src: Option<String>,
    /// Image alt text.
    pub alt: Option<String>,
    /// Button link target.
    pub href: Option<String>,
    /// Shape geometry.
    pub shape_type: Option<ShapeType>,
    /// Font size (text, button).
    pub font_size: Option<u32>,
    /// Font weight (text).
    pub font_weight: Option<String>,
    /// Foreground color (text, button).
    pub color: Option<String>,
    /// Alignment (text).
    pub text_align: Option<TextAlign>,
    /// Font stack (text).
    pub font_family: Option<String>,
    /// Object fit (image).
    pub object_fit: Option<ObjectFit>,
    /// Object position (image).
    pub object_position: Option<String>,
    /// Corner radius (image, shape, button).
    pub border_radius: Option<u32>,
    /// Fill color (shape, button).
    pub background_color: Option<String>,
    /// Border color (shape).
    pub border_color: Option<String>,
    /// Border width (shape).
    pub border_width: Option<u32>,
    /// Horizontal padding (button).
    pub padding_x: Option<u32>,
    /// Vertical padding (button).
    pub padding_y: Option<u32>,
}

impl ElementPatch {
    /// Patch that only moves the element.
    #[must_use]
    pub fn moved_to(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// Patch that only resizes the element.
    #[must_use]
    pub fn resized_to(size: Size) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    /// True when the patch changes geometry (drag or resize).
    #[must_use]
    pub fn touches_geometry(&self) -> bool {
        self.position.is_some() || self.size.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_button_matches_palette() {
        let button = Element::default_of(ElementType::Button, 3);
        assert_eq!(button.position, Position::new(50, 50));
        assert_eq!(button.size, Size::new(150, 40));
        assert_eq!(button.z_index, 3);
        let ElementKind::Button { href, style, .. } = &button.kind else {
            panic!("expected button");
        };
        assert_eq!(href, "https://example.com");
        assert_eq!(style.border_radius, 8);
    }

    #[test]
    fn test_serde_uses_type_tag_and_camel_case() {
        let element = Element::default_of(ElementType::Shape, 1);
        let json = serde_json::to_value(&element).expect("serialize");
        assert_eq!(json["type"], "shape");
        assert_eq!(json["shapeType"], "rectangle");
        assert_eq!(json["zIndex"], 1);
        assert_eq!(json["style"]["backgroundColor"], "#e5e7eb");

        let back: Element = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, element);
    }

    #[test]
    fn test_deserialize_stored_text_element() {
        let json = r##"{
            "id": "text-1",
            "type": "text",
            "position": {"x": 10, "y": 20},
            "size": {"width": 300, "height": 40},
            "zIndex": 2,
            "content": "Hello {{first_name}}",
            "style": {"fontSize": 18, "fontWeight": "700", "color": "#111111", "textAlign": "center"}
        }"##;
        let element: Element = serde_json::from_str(json).expect("deserialize");
        assert_eq!(element.id.as_str(), "text-1");
        assert_eq!(element.element_type(), ElementType::Text);
        let ElementKind::Text { style, .. } = &element.kind else {
            panic!("expected text");
        };
        assert_eq!(style.text_align, TextAlign::Center);
        assert!(style.font_family.is_none());
    }

    #[test]
    fn test_contains_point() {
        let element = Element::default_of(ElementType::Text, 0);
        assert!(element.contains_point(60, 60));
        assert!(element.contains_point(250, 100));
        assert!(!element.contains_point(49, 60));
        assert!(!element.contains_point(60, 101));
    }

    #[test]
    fn test_patch_changes_only_named_fields() {
        let mut element = Element::default_of(ElementType::Button, 0);
        let before = element.clone();
        element.apply(&ElementPatch {
            content: Some("Buy now".to_string()),
            padding_x: Some(30),
            src: Some("ignored.png".to_string()),
            ..ElementPatch::default()
        });

        let ElementKind::Button { text, href, style } = &element.kind else {
            panic!("expected button");
        };
        assert_eq!(text, "Buy now");
        assert_eq!(href, "https://example.com");
        assert_eq!(style.padding_x, 30);
        assert_eq!(style.padding_y, DEFAULT_BUTTON_PADDING_Y);
        assert_eq!(element.position, before.position);
        assert_eq!(element.id, before.id);
    }

    #[test]
    fn test_duplicate_gets_new_id_and_offset() {
        let element = Element::default_of(ElementType::Image, 4);
        let copy = element.duplicate(20, 20);
        assert_ne!(copy.id, element.id);
        assert_eq!(copy.position, Position::new(70, 70));
        assert_eq!(copy.kind, element.kind);
    }
}
