//! AI layout generation: prompt construction and response recovery.
//!
//! The HTTP call itself lives in the server crate; this module only knows
//! how to describe the canvas to a model and how to turn whatever the model
//! answered into normalized elements.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::normalize_elements;
use crate::{CanvasError, CanvasResult, CanvasSize, Element};

/// Model used when a request does not name one.
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

/// Sampling temperature sent with every generation request.
pub const TEMPERATURE: f32 = 0.7;

/// A request to lay out a template from a natural-language prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignRequest {
    /// What the user wants.
    pub prompt: String,
    /// Canvas the layout must fit.
    #[serde(default)]
    pub canvas_size: CanvasSize,
    /// Model override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl DesignRequest {
    /// Create a request for the given prompt and canvas.
    #[must_use]
    pub fn new(prompt: impl Into<String>, canvas_size: CanvasSize) -> Self {
        Self {
            prompt: prompt.into(),
            canvas_size,
            model: None,
        }
    }

    /// Use a specific model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Reject blank prompts before any network call.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] if the prompt is blank.
    pub fn validate(&self) -> CanvasResult<()> {
        if self.prompt.trim().is_empty() {
            return Err(CanvasError::Validation(
                "Please describe the design you want to create".to_string(),
            ));
        }
        Ok(())
    }

    /// The requested model, or `fallback` when none (or a blank one) was given.
    #[must_use]
    pub fn model_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
    }
}

/// Generated layout returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignResponse {
    /// Normalized elements.
    pub elements: Vec<Element>,
    /// Canvas the elements were laid out for.
    pub canvas_size: CanvasSize,
}

/// Rough device class implied by a canvas width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// Up to 375px.
    Mobile,
    /// Up to 768px.
    Tablet,
    /// Anything wider.
    Desktop,
}

impl DeviceClass {
    /// Classify a canvas width.
    #[must_use]
    pub const fn for_width(width: u32) -> Self {
        if width <= 375 {
            Self::Mobile
        } else if width <= 768 {
            Self::Tablet
        } else {
            Self::Desktop
        }
    }

    /// Lowercase name used in prompts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Desktop => "desktop",
        }
    }
}

/// System prompt describing the components and output format for a canvas.
#[must_use]
pub fn system_prompt(canvas_size: CanvasSize) -> String {
    let device = DeviceClass::for_width(canvas_size.width).as_str();
    format!(
        r#"You are an email template design assistant. Generate a JSON template for an email design based on the user's request.

CANVAS SIZE: {width}x{height}px ({device})

AVAILABLE COMPONENTS:
1. TEXT: Display text content
   - Properties: content (string), fontSize (number), fontWeight (string), color (hex), textAlign (left/center/right), fontFamily (optional)

2. IMAGE: Display images
   - Properties: src (URL string), alt (string), objectFit (contain/cover/fill), borderRadius (number)

3. SHAPE: Rectangles or circles for backgrounds/decoration
   - Properties: shapeType (rectangle/circle), backgroundColor (hex), borderColor (hex), borderWidth (number), borderRadius (number)

4. BUTTON: Clickable buttons with links
   - Properties: text (string), href (URL), backgroundColor (hex), color (hex), fontSize (number), borderRadius (number), paddingX (number), paddingY (number)

RULES:
- Position elements using x, y coordinates (in pixels from top-left)
- Size elements using width, height (in pixels)
- All elements have a zIndex (higher = on top)
- Colors must be hex format (#RRGGBB)
- Keep designs within canvas bounds
- Use appropriate spacing and alignment
- Consider mobile-first design for narrow canvases

Return ONLY valid JSON in this exact format:
{{
  "elements": [
    {{
      "id": "unique-id",
      "type": "text|image|shape|button",
      "position": {{ "x": 0, "y": 0 }},
      "size": {{ "width": 100, "height": 50 }},
      "zIndex": 1,
      "style": {{ ... type-specific style properties }}
    }}
  ]
}}"#,
        width = canvas_size.width,
        height = canvas_size.height,
    )
}

/// Recover normalized elements from raw model output.
///
/// Accepts a bare JSON document, one wrapped in a Markdown code fence, or one
/// surrounded by prose (the outermost `{...}` is extracted). The document may
/// be `{"elements": [...]}` or a bare array.
///
/// # Errors
///
/// Returns [`CanvasError::InvalidDesign`] if no JSON can be recovered or it has
/// no element list.
pub fn parse_design_response(content: &str) -> CanvasResult<Vec<Element>> {
    let value = recover_json(content).ok_or_else(|| {
        CanvasError::InvalidDesign("response is not valid JSON".to_string())
    })?;

    let raw = match &value {
        Value::Array(items) => items.as_slice(),
        Value::Object(object) => object
            .get("elements")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| CanvasError::InvalidDesign("missing \"elements\" array".to_string()))?,
        _ => {
            return Err(CanvasError::InvalidDesign(
                "expected an object with an \"elements\" array".to_string(),
            ))
        }
    };

    Ok(normalize_elements(raw))
}

fn recover_json(content: &str) -> Option<Value> {
    let trimmed = content.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let unfenced = strip_code_fence(trimmed);
    if let Ok(value) = serde_json::from_str(unfenced) {
        return Some(value);
    }

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&unfenced[start..=end]).ok()
}

/// Strip a surrounding Markdown code fence (with or without a language tag).
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}
