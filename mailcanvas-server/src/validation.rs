//! Input validation for untrusted data.
//!
//! All user-supplied input MUST be validated before use.
//! This module provides validators for request fields.

use mailcanvas_core::CanvasSize;
use thiserror::Error;

/// Maximum length for template ids (UUIDs are 36 chars).
pub const MAX_TEMPLATE_ID_LEN: usize = 64;
/// Maximum length for template names.
pub const MAX_NAME_LEN: usize = 200;
/// Maximum length for shortcodes.
pub const MAX_SHORTCODE_LEN: usize = 64;
/// Maximum HTML document size.
pub const MAX_HTML_LEN: usize = 2_097_152; // 2MB
/// Maximum AI prompt length.
pub const MAX_PROMPT_LEN: usize = 8192;
/// Maximum elements per template.
pub const MAX_ELEMENTS_PER_TEMPLATE: usize = 10_000;
/// Largest accepted canvas edge, in pixels.
pub const MAX_CANVAS_EDGE: u32 = 4096;

/// Validation error types.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Template id exceeds maximum length.
    #[error("template id too long (max {MAX_TEMPLATE_ID_LEN} chars)")]
    TemplateIdTooLong,
    /// Template id contains invalid characters.
    #[error("template id contains invalid characters")]
    TemplateIdInvalidChars,
    /// Template name is blank.
    #[error("Please enter a template name")]
    NameRequired,
    /// Template name exceeds maximum length.
    #[error("template name too long (max {MAX_NAME_LEN} chars)")]
    NameTooLong,
    /// Shortcode is blank where one is required.
    #[error("Please enter a shortcode")]
    ShortcodeRequired,
    /// Shortcode exceeds maximum length.
    #[error("shortcode too long (max {MAX_SHORTCODE_LEN} chars)")]
    ShortcodeTooLong,
    /// Shortcode contains invalid characters.
    #[error("shortcode may only contain letters, digits, '-' and '_'")]
    ShortcodeInvalidChars,
    /// HTML body is blank.
    #[error("Please add some content to your template")]
    HtmlRequired,
    /// HTML body exceeds maximum length.
    #[error("HTML too long (max {MAX_HTML_LEN} bytes)")]
    HtmlTooLong,
    /// Prompt exceeds maximum length.
    #[error("prompt too long (max {MAX_PROMPT_LEN} bytes)")]
    PromptTooLong,
    /// Too many elements in a template.
    #[error("too many elements (max {MAX_ELEMENTS_PER_TEMPLATE})")]
    TooManyElements,
    /// Canvas dimensions out of range.
    #[error("invalid canvas size: {0}")]
    InvalidCanvasSize(String),
}

impl ValidationError {
    /// Short label used for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TemplateIdTooLong | Self::TemplateIdInvalidChars => "template_id",
            Self::NameRequired | Self::NameTooLong => "name",
            Self::ShortcodeRequired | Self::ShortcodeTooLong | Self::ShortcodeInvalidChars => {
                "shortcode"
            }
            Self::HtmlRequired | Self::HtmlTooLong => "html",
            Self::PromptTooLong => "prompt",
            Self::TooManyElements => "element_count",
            Self::InvalidCanvasSize(_) => "canvas_size",
        }
    }
}

/// Check if a character is valid for ids and shortcodes.
fn is_valid_id_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

/// Validate a template id from a request path.
///
/// # Errors
///
/// Returns [`ValidationError::TemplateIdTooLong`] if the id exceeds 64 characters.
/// Returns [`ValidationError::TemplateIdInvalidChars`] if the id is empty or contains invalid characters.
pub fn validate_template_id(id: &str) -> Result<(), ValidationError> {
    if id.len() > MAX_TEMPLATE_ID_LEN {
        return Err(ValidationError::TemplateIdTooLong);
    }
    if id.is_empty() || !id.chars().all(is_valid_id_char) {
        return Err(ValidationError::TemplateIdInvalidChars);
    }
    Ok(())
}

/// Validate a template display name.
///
/// # Errors
///
/// Returns [`ValidationError::NameRequired`] for a blank name and
/// [`ValidationError::NameTooLong`] past the limit.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong);
    }
    Ok(())
}

/// Validate an optional shortcode. Blank counts as absent.
///
/// # Errors
///
/// Returns [`ValidationError::ShortcodeTooLong`] or
/// [`ValidationError::ShortcodeInvalidChars`] for a malformed value.
pub fn validate_shortcode(shortcode: Option<&str>) -> Result<(), ValidationError> {
    let Some(shortcode) = shortcode.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(());
    };
    if shortcode.len() > MAX_SHORTCODE_LEN {
        return Err(ValidationError::ShortcodeTooLong);
    }
    if !shortcode.chars().all(is_valid_id_char) {
        return Err(ValidationError::ShortcodeInvalidChars);
    }
    Ok(())
}

/// Validate a shortcode that must be present.
///
/// # Errors
///
/// Returns [`ValidationError::ShortcodeRequired`] when blank, otherwise as
/// [`validate_shortcode`].
pub fn require_shortcode(shortcode: Option<&str>) -> Result<(), ValidationError> {
    if shortcode.map(str::trim).filter(|s| !s.is_empty()).is_none() {
        return Err(ValidationError::ShortcodeRequired);
    }
    validate_shortcode(shortcode)
}

/// Validate a stored HTML body.
///
/// # Errors
///
/// Returns [`ValidationError::HtmlRequired`] when blank and
/// [`ValidationError::HtmlTooLong`] past 2MB.
pub fn validate_html(html: &str) -> Result<(), ValidationError> {
    if html.trim().is_empty() {
        return Err(ValidationError::HtmlRequired);
    }
    validate_html_len(html)
}

/// Validate only the size of an HTML document.
///
/// # Errors
///
/// Returns [`ValidationError::HtmlTooLong`] past 2MB.
pub fn validate_html_len(html: &str) -> Result<(), ValidationError> {
    if html.len() > MAX_HTML_LEN {
        return Err(ValidationError::HtmlTooLong);
    }
    Ok(())
}

/// Validate prompt length. Blank prompts are rejected by the design request itself.
///
/// # Errors
///
/// Returns [`ValidationError::PromptTooLong`] past the limit.
pub fn validate_prompt(prompt: &str) -> Result<(), ValidationError> {
    if prompt.len() > MAX_PROMPT_LEN {
        return Err(ValidationError::PromptTooLong);
    }
    Ok(())
}

/// Validate element count in a template.
///
/// # Errors
///
/// Returns [`ValidationError::TooManyElements`] past the limit.
pub fn validate_element_count(count: usize) -> Result<(), ValidationError> {
    if count > MAX_ELEMENTS_PER_TEMPLATE {
        return Err(ValidationError::TooManyElements);
    }
    Ok(())
}

/// Validate canvas dimensions.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidCanvasSize`] for a zero or oversized edge.
pub fn validate_canvas_size(size: CanvasSize) -> Result<(), ValidationError> {
    let in_range = |edge: u32| (1..=MAX_CANVAS_EDGE).contains(&edge);
    if !in_range(size.width) || !in_range(size.height) {
        return Err(ValidationError::InvalidCanvasSize(format!(
            "{}x{} (each edge must be 1-{MAX_CANVAS_EDGE}px)",
            size.width, size.height
        )));
    }
    Ok(())
}
