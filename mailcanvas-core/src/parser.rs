//! Best-effort HTML import.
//!
//! Arbitrary markup is walked depth-first and each visual node is classified
//! by an ordered rule chain (image, button, shape, text). A matched node
//! yields one element and its subtree is not visited; an unmatched node is
//! traversed with a deeper indent. The result is a flat, lossy element list
//! meant for further editing on the canvas.
//!
//! Only inline `style` attributes are read.

use kuchiki::traits::TendrilSink;
use kuchiki::{NodeData, NodeRef};

use crate::css::InlineStyle;
use crate::element::{
    DEFAULT_BUTTON_BACKGROUND, DEFAULT_BUTTON_COLOR, DEFAULT_BUTTON_PADDING_X,
    DEFAULT_BUTTON_PADDING_Y, DEFAULT_BUTTON_RADIUS, DEFAULT_FONT_SIZE, DEFAULT_FONT_WEIGHT,
    DEFAULT_IMAGE_ALT, DEFAULT_SHAPE_BACKGROUND, DEFAULT_SHAPE_BORDER_COLOR, DEFAULT_TEXT_COLOR,
};
use crate::{
    ButtonStyle, CanvasError, CanvasResult, Element, ElementId, ElementKind, ElementType,
    ImageStyle, ObjectFit, Position, ShapeStyle, ShapeType, Size, TextAlign, TextStyle,
};

/// Tags that never produce elements and are not traversed.
const SKIPPED_TAGS: &[&str] = &["script", "style", "meta", "head", "title", "link", "noscript"];

/// Left edge of the auto-stacking cursor.
const START_X: i32 = 20;
/// Top of the auto-stacking cursor.
const START_Y: i32 = 20;
/// Extra indent per nesting level.
const INDENT: i32 = 10;
/// Vertical gap between auto-stacked elements.
const GAP: i32 = 20;
/// Imported buttons always get this size.
const BUTTON_SIZE: Size = Size::new(150, 40);
/// Cursor advance after an auto-stacked button.
const BUTTON_ADVANCE: i32 = 60;

/// Parse an HTML fragment or document into elements.
///
/// Empty or unrecognizable input yields an empty list.
#[must_use]
pub fn parse(html: &str) -> Vec<Element> {
    let document = kuchiki::parse_html().one(html);
    let mut ctx = ParseContext::new();

    let root = document
        .select_first("body")
        .map_or_else(|()| document.clone(), |body| body.as_node().clone());
    for child in root.children() {
        ctx.visit(&child, START_X);
    }

    tracing::debug!(elements = ctx.elements.len(), "Parsed HTML");
    ctx.elements
}

/// Parse HTML, treating an empty result as an error.
///
/// # Errors
///
/// Returns [`CanvasError::Validation`] for blank input and
/// [`CanvasError::NothingFound`] when no element could be recognized.
pub fn import(html: &str) -> CanvasResult<Vec<Element>> {
    if html.trim().is_empty() {
        return Err(CanvasError::Validation(
            "Please paste some HTML content".to_string(),
        ));
    }
    let elements = parse(html);
    if elements.is_empty() {
        return Err(CanvasError::NothingFound);
    }
    Ok(elements)
}

/// What a classification rule decided for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    /// Produce an element of this type; do not visit children.
    Produce(ElementType),
    /// Produce nothing and do not visit children.
    Skip,
}

type Rule = fn(&NodeView) -> Option<Match>;

/// Classification rules, first match wins.
const RULES: &[Rule] = &[image_rule, button_rule, shape_rule, text_rule];

/// Run the rule chain. `None` means "not visual, look at the children".
#[must_use]
pub fn classify(view: &NodeView) -> Option<Match> {
    RULES.iter().find_map(|rule| rule(view))
}

fn image_rule(view: &NodeView) -> Option<Match> {
    (view.tag == "img").then(|| {
        if view.attr("src").is_some() {
            Match::Produce(ElementType::Image)
        } else {
            Match::Skip
        }
    })
}

fn button_rule(view: &NodeView) -> Option<Match> {
    let is_button = view.tag == "button" || (view.tag == "a" && looks_like_button(view));
    is_button.then_some(Match::Produce(ElementType::Button))
}

fn shape_rule(view: &NodeView) -> Option<Match> {
    looks_like_shape(view).then_some(Match::Produce(ElementType::Shape))
}

fn text_rule(view: &NodeView) -> Option<Match> {
    (!view.direct_text.is_empty()).then_some(Match::Produce(ElementType::Text))
}

/// A colored anchor with padding or rounded corners and a short label.
#[must_use]
pub fn looks_like_button(view: &NodeView) -> bool {
    let has_background = view.style.background_color().is_some();
    let has_padding = view.style.padding_left().unwrap_or(0) > 10;
    let has_radius = view.style.px("border-radius").unwrap_or(0) > 0;
    let short_text = view.text.chars().count() < 50;
    has_background && (has_padding || has_radius) && short_text
}

/// A colored, explicitly sized block with little or no direct text.
///
/// Child markup does not matter: a sized background wrapper becomes one
/// shape and its content is not visited.
#[must_use]
pub fn looks_like_shape(view: &NodeView) -> bool {
    view.style.background_color().is_some()
        && view.direct_text.chars().count() < 10
        && view.style.positive_px("width").is_some()
        && view.style.positive_px("height").is_some()
}

/// The parts of a DOM element the classifier and builders look at.
#[derive(Debug, Clone)]
pub struct NodeView {
    /// Lower-cased tag name.
    pub tag: String,
    /// Parsed inline style.
    pub style: InlineStyle,
    /// Text of immediate child text nodes, whitespace-collapsed.
    pub direct_text: String,
    /// All descendant text, whitespace-collapsed.
    pub text: String,
    attrs: Vec<(String, String)>,
}

impl NodeView {
    /// Build a view of an element node; `None` for text, comments and the like.
    #[must_use]
    pub fn of(node: &NodeRef) -> Option<Self> {
        let NodeData::Element(element) = node.data() else {
            return None;
        };
        let attributes = element.attributes.borrow();
        let attrs: Vec<(String, String)> = attributes
            .map
            .iter()
            .map(|(name, attr)| (name.local.to_string(), attr.value.clone()))
            .collect();
        let style = attributes
            .get("style")
            .map(InlineStyle::parse)
            .unwrap_or_default();

        let direct: String = node
            .children()
            .filter_map(|child| child.as_text().map(|t| t.borrow().clone()))
            .collect::<Vec<_>>()
            .join(" ");

        Some(Self {
            tag: element.name.local.to_string().to_ascii_lowercase(),
            style,
            direct_text: collapse_whitespace(&direct),
            text: collapse_whitespace(&node.text_contents()),
            attrs,
        })
    }

    /// A non-blank attribute value.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn attr_px(&self, name: &str) -> Option<u32> {
        self.attr(name)
            .and_then(crate::css::parse_px)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|&v| v > 0)
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Per-call traversal state.
struct ParseContext {
    next_z: i32,
    y_offset: i32,
    elements: Vec<Element>,
}

impl ParseContext {
    fn new() -> Self {
        Self {
            next_z: 0,
            y_offset: START_Y,
            elements: Vec::new(),
        }
    }

    fn visit(&mut self, node: &NodeRef, x: i32) {
        let Some(view) = NodeView::of(node) else {
            return;
        };
        if SKIPPED_TAGS.contains(&view.tag.as_str()) {
            return;
        }

        match classify(&view) {
            Some(Match::Produce(element_type)) => {
                let element = self.build(element_type, &view, x);
                self.elements.push(element);
            }
            Some(Match::Skip) => {}
            None => {
                for child in node.children() {
                    self.visit(&child, x + INDENT);
                }
            }
        }
    }

    fn build(&mut self, element_type: ElementType, view: &NodeView, x: i32) -> Element {
        let (kind, size) = match element_type {
            ElementType::Text => text_element(view),
            ElementType::Image => image_element(view),
            ElementType::Shape => shape_element(view),
            ElementType::Button => button_element(view),
        };
        let advance = match element_type {
            ElementType::Button => BUTTON_ADVANCE,
            _ => i32::try_from(size.height)
                .unwrap_or(i32::MAX)
                .saturating_add(GAP),
        };
        let position = self.place(view, x, advance);
        let z_index = self.next_z;
        self.next_z += 1;

        Element {
            id: ElementId::new(),
            position,
            size,
            z_index,
            kind,
        }
    }

    /// Inline `left`/`top` win; otherwise use the cursor. The cursor only
    /// advances for nodes without an explicit `top`.
    fn place(&mut self, view: &NodeView, x: i32, advance: i32) -> Position {
        let left = view.style.px("left").unwrap_or(x);
        let top = view.style.px("top").unwrap_or(self.y_offset);
        if !view.style.has("top") {
            self.y_offset = self.y_offset.saturating_add(advance);
        }
        Position::new(left, top)
    }
}

fn text_element(view: &NodeView) -> (ElementKind, Size) {
    let content = view.text.clone();
    let family = view
        .style
        .first_font_family()
        .unwrap_or_else(|| "Inter".to_string());

    let chars = u32::try_from(content.chars().count()).unwrap_or(u32::MAX);
    let size = Size::new(
        view.style.positive_px("width").unwrap_or(250),
        view.style
            .positive_px("height")
            .unwrap_or_else(|| (chars.div_ceil(30).saturating_mul(20)).max(40)),
    );

    let kind = ElementKind::Text {
        content,
        style: TextStyle {
            font_size: view
                .style
                .positive_px("font-size")
                .unwrap_or(DEFAULT_FONT_SIZE),
            font_weight: view
                .style
                .get("font-weight")
                .unwrap_or(DEFAULT_FONT_WEIGHT)
                .to_string(),
            color: view
                .style
                .color()
                .unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string()),
            text_align: view
                .style
                .get("text-align")
                .and_then(TextAlign::parse)
                .unwrap_or_default(),
            font_family: Some(format!("{family}, sans-serif")),
        },
    };
    (kind, size)
}

fn image_element(view: &NodeView) -> (ElementKind, Size) {
    let size = Size::new(
        view.style
            .positive_px("width")
            .or_else(|| view.attr_px("width"))
            .unwrap_or(200),
        view.style
            .positive_px("height")
            .or_else(|| view.attr_px("height"))
            .unwrap_or(150),
    );
    let kind = ElementKind::Image {
        src: view.attr("src").unwrap_or_default().to_string(),
        alt: view.attr("alt").unwrap_or(DEFAULT_IMAGE_ALT).to_string(),
        style: ImageStyle {
            object_fit: view
                .style
                .get("object-fit")
                .and_then(ObjectFit::parse)
                .unwrap_or_default(),
            object_position: view.style.get("object-position").map(str::to_string),
            border_radius: non_negative(view.style.px("border-radius")).unwrap_or(0),
        },
    };
    (kind, size)
}

fn shape_element(view: &NodeView) -> (ElementKind, Size) {
    let size = Size::new(
        view.style.positive_px("width").unwrap_or(200),
        view.style.positive_px("height").unwrap_or(100),
    );
    let border_radius = non_negative(view.style.px("border-radius")).unwrap_or(0);
    let shape_type = if u64::from(border_radius) * 3 > u64::from(size.width) {
        ShapeType::Circle
    } else {
        ShapeType::Rectangle
    };

    let kind = ElementKind::Shape {
        shape_type,
        style: ShapeStyle {
            background_color: view
                .style
                .background_color()
                .unwrap_or_else(|| DEFAULT_SHAPE_BACKGROUND.to_string()),
            border_color: view
                .style
                .border_color()
                .unwrap_or_else(|| DEFAULT_SHAPE_BORDER_COLOR.to_string()),
            border_width: non_negative(view.style.border_width()).unwrap_or(0),
            border_radius,
        },
    };
    (kind, size)
}

fn button_element(view: &NodeView) -> (ElementKind, Size) {
    let text = if view.text.is_empty() {
        "Button".to_string()
    } else {
        view.text.clone()
    };

    let kind = ElementKind::Button {
        text,
        href: view.attr("href").unwrap_or("#").to_string(),
        style: ButtonStyle {
            background_color: view
                .style
                .background_color()
                .unwrap_or_else(|| DEFAULT_BUTTON_BACKGROUND.to_string()),
            color: view
                .style
                .color()
                .unwrap_or_else(|| DEFAULT_BUTTON_COLOR.to_string()),
            font_size: view
                .style
                .positive_px("font-size")
                .unwrap_or(DEFAULT_FONT_SIZE),
            border_radius: non_negative(view.style.px("border-radius"))
                .unwrap_or(DEFAULT_BUTTON_RADIUS),
            padding_x: non_negative(view.style.padding_left()).unwrap_or(DEFAULT_BUTTON_PADDING_X),
            padding_y: non_negative(view.style.padding_top()).unwrap_or(DEFAULT_BUTTON_PADDING_Y),
        },
    };
    (kind, BUTTON_SIZE)
}

fn non_negative(value: Option<i32>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}
