//! HTML generation from a [`Template`].
//!
//! Output is a complete document with every visual property inlined.
//! Elements are emitted in ascending z-index order so later markup paints on
//! top. Text and URLs are written verbatim (no escaping).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Element, ElementKind, ShapeType, Template};

/// Font stack used by table mode when a text element names none.
pub const WEB_SAFE_FONT_FAMILY: &str = "Arial, Helvetica, sans-serif";

/// Fallback font stack for absolute mode.
const ABSOLUTE_FONT_FAMILY: &str = "Inter, sans-serif";

/// How the document lays elements out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Absolutely positioned elements inside one sized container.
    #[default]
    Absolute,
    /// The same elements inside a centering table with Outlook fallbacks.
    Table,
}

impl LayoutMode {
    /// Parse a mode name, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "absolute" | "div" => Some(Self::Absolute),
            "table" => Some(Self::Table),
            _ => None,
        }
    }

    /// Lowercase mode name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::Table => "table",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render `template` as a standalone HTML document.
#[must_use]
pub fn generate(template: &Template, mode: LayoutMode) -> String {
    let body = template
        .paint_order()
        .into_iter()
        .map(|element| render_element(element, mode))
        .collect::<Vec<_>>();

    match mode {
        LayoutMode::Absolute => absolute_document(template, &body.join("\n    ")),
        LayoutMode::Table => table_document(template, &body.join("\n              ")),
    }
}

/// Render one element as positioned markup.
#[must_use]
pub fn render_element(element: &Element, mode: LayoutMode) -> String {
    let base = format!(
        "position: absolute; left: {}px; top: {}px; width: {}px; height: {}px;",
        element.position.x, element.position.y, element.size.width, element.size.height
    );

    match &element.kind {
        ElementKind::Text { content, style } => {
            let fallback = match mode {
                LayoutMode::Absolute => ABSOLUTE_FONT_FAMILY,
                LayoutMode::Table => WEB_SAFE_FONT_FAMILY,
            };
            let family = style
                .font_family
                .as_deref()
                .filter(|f| !f.trim().is_empty())
                .unwrap_or(fallback);
            format!(
                r#"<div style="{base} font-size: {}px; font-weight: {}; color: {}; text-align: {}; font-family: {family};">{content}</div>"#,
                style.font_size, style.font_weight, style.color, style.text_align
            )
        }
        ElementKind::Image { src, alt, style } => {
            let mut css = format!(
                "{base} object-fit: {}; border-radius: {}px;",
                style.object_fit.as_str(),
                style.border_radius
            );
            if let Some(object_position) = &style.object_position {
                css.push_str(&format!(" object-position: {object_position};"));
            }
            if mode == LayoutMode::Table {
                css.push_str(" max-width: 100%; display: block;");
            }
            format!(r#"<img src="{src}" alt="{alt}" style="{css}" />"#)
        }
        ElementKind::Shape { shape_type, style } => {
            let radius = match shape_type {
                ShapeType::Circle => "50%".to_string(),
                ShapeType::Rectangle => format!("{}px", style.border_radius),
            };
            format!(
                r#"<div style="{base} background-color: {}; border: {}px solid {}; border-radius: {radius};"></div>"#,
                style.background_color, style.border_width, style.border_color
            )
        }
        ElementKind::Button { text, href, style } => match mode {
            LayoutMode::Absolute => format!(
                r#"<a href="{href}" style="{base} display: flex; align-items: center; justify-content: center; background-color: {}; color: {}; font-size: {}px; border-radius: {}px; text-decoration: none; padding: {}px {}px;">{text}</a>"#,
                style.background_color,
                style.color,
                style.font_size,
                style.border_radius,
                style.padding_y,
                style.padding_x
            ),
            LayoutMode::Table => format!(
                r#"<div style="{base}"><a href="{href}" style="display: flex; align-items: center; justify-content: center; width: 100%; height: 100%; background-color: {}; color: {}; font-size: {}px; font-family: {WEB_SAFE_FONT_FAMILY}; border-radius: {}px; text-decoration: none; padding: {}px {}px; box-sizing: border-box;">{text}</a></div>"#,
                style.background_color,
                style.color,
                style.font_size,
                style.border_radius,
                style.padding_y,
                style.padding_x
            ),
        },
    }
}

fn absolute_document(template: &Template, body: &str) -> String {
    let width = template.canvas_size.width;
    let height = template.canvas_size.height;
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="margin: 0; padding: 0; background-color: #ffffff;">
  <div style="position: relative; width: {width}px; height: {height}px; margin: 0 auto;">
    {body}
  </div>
</body>
</html>"#
    )
}

fn table_document(template: &Template, body: &str) -> String {
    let width = template.canvas_size.width;
    let height = template.canvas_size.height;
    format!(
        r#"<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <meta http-equiv="X-UA-Compatible" content="IE=edge">
  <meta name="x-apple-disable-message-reformatting">
  <!--[if mso]>
  <style type="text/css">
    table {{border-collapse: collapse; mso-table-lspace: 0pt; mso-table-rspace: 0pt;}}
    td {{border-collapse: collapse;}}
  </style>
  <![endif]-->
</head>
<body style="margin: 0; padding: 0; background-color: #f4f4f4;">
  <table role="presentation" width="100%" cellspacing="0" cellpadding="0" border="0" style="background-color: #f4f4f4;">
    <tr>
      <td align="center" style="padding: 20px 0;">
        <table role="presentation" width="{width}" cellspacing="0" cellpadding="0" border="0" style="max-width: {width}px; background-color: #ffffff;">
          <tr>
            <td style="position: relative; width: {width}px; height: {height}px; padding: 0;">
              <!--[if mso]>
              <table role="presentation" width="{width}" cellspacing="0" cellpadding="0" border="0">
                <tr>
                  <td style="width: {width}px; height: {height}px;">
              <![endif]-->
              {body}
              <!--[if mso]>
                  </td>
                </tr>
              </table>
              <![endif]-->
            </td>
          </tr>
        </table>
      </td>
    </tr>
  </table>
</body>
</html>"#
    )
}
