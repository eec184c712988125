//! Structured (fixed-section) email templates.
//!
//! A structured template is not free-form: it always renders a header,
//! a hero, any number of text sections, a call to action and a footer.

use std::collections::HashMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::placeholder;
use crate::{CanvasError, CanvasResult, TextAlign};

/// Default name of a new structured template.
pub const DEFAULT_NAME: &str = "New Email Template";
/// Default brand primary color.
pub const DEFAULT_PRIMARY_COLOR: &str = "#7C3AED";
/// Default brand secondary color.
pub const DEFAULT_SECONDARY_COLOR: &str = "#6B7280";

/// Brand settings shared by every section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandSettings {
    /// Logo URL; no logo is rendered when blank.
    #[serde(default)]
    pub logo_url: String,
    /// Business name shown in the header and footer.
    pub business_name: String,
    /// Headline, border and default button color.
    pub primary_color: String,
    /// Subheadline color.
    pub secondary_color: String,
}

impl Default for BrandSettings {
    fn default() -> Self {
        Self {
            logo_url: String::new(),
            business_name: "Your Business".to_string(),
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            secondary_color: DEFAULT_SECONDARY_COLOR.to_string(),
        }
    }
}

/// Hero image and headline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroSection {
    /// Hero image URL; omitted when blank.
    #[serde(default)]
    pub image_url: String,
    /// Headline.
    pub headline: String,
    /// Optional subheadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subheadline: Option<String>,
}

impl Default for HeroSection {
    fn default() -> Self {
        Self {
            image_url: String::new(),
            headline: "Welcome!".to_string(),
            subheadline: None,
        }
    }
}

/// One paragraph of body copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSection {
    /// Stable section identifier.
    pub id: String,
    /// Paragraph text; may embed placeholders.
    pub content: String,
    /// Alignment, left when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<TextAlign>,
}

impl TextSection {
    /// A new, empty, left-aligned section.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: String::new(),
            alignment: Some(TextAlign::Left),
        }
    }
}

impl Default for TextSection {
    fn default() -> Self {
        Self::new()
    }
}

/// Call-to-action button with an optional lead-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtaSection {
    /// Button label.
    pub button_text: String,
    /// Button link.
    pub button_url: String,
    /// Button color; brand primary when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_color: Option<String>,
    /// Text above the button.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for CtaSection {
    fn default() -> Self {
        Self {
            button_text: "Learn More".to_string(),
            button_url: "https://example.com".to_string(),
            button_color: Some(DEFAULT_PRIMARY_COLOR.to_string()),
            description: None,
        }
    }
}

/// Direction for [`StructuredTemplate::move_text_section`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    /// Towards the top of the email.
    Up,
    /// Towards the bottom of the email.
    Down,
}

/// A fixed-shape email template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredTemplate {
    /// Display name (also the document title).
    pub name: String,
    /// Retrieval shortcode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_shortcode: Option<String>,
    /// Brand settings.
    pub brand: BrandSettings,
    /// Hero section.
    pub hero: HeroSection,
    /// Body paragraphs in display order.
    #[serde(default)]
    pub text_sections: Vec<TextSection>,
    /// Call to action.
    pub cta: CtaSection,
}

impl Default for StructuredTemplate {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            api_shortcode: None,
            brand: BrandSettings::default(),
            hero: HeroSection::default(),
            text_sections: Vec::new(),
            cta: CtaSection::default(),
        }
    }
}

impl StructuredTemplate {
    /// Append an empty section and return its id.
    pub fn add_text_section(&mut self) -> String {
        let section = TextSection::new();
        let id = section.id.clone();
        self.text_sections.push(section);
        id
    }

    /// Change a section's content and/or alignment.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no section has this id.
    pub fn update_text_section(
        &mut self,
        id: &str,
        content: Option<String>,
        alignment: Option<TextAlign>,
    ) -> CanvasResult<()> {
        let section = self
            .text_sections
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| CanvasError::ElementNotFound(id.to_string()))?;
        if let Some(content) = content {
            section.content = content;
        }
        if let Some(alignment) = alignment {
            section.alignment = Some(alignment);
        }
        Ok(())
    }

    /// Remove a section.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no section has this id.
    pub fn remove_text_section(&mut self, id: &str) -> CanvasResult<TextSection> {
        let index = self.section_index(id)?;
        Ok(self.text_sections.remove(index))
    }

    /// Swap a section with its neighbour. Returns `false` at either end.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no section has this id.
    pub fn move_text_section(&mut self, id: &str, direction: MoveDirection) -> CanvasResult<bool> {
        let index = self.section_index(id)?;
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => Some(index + 1).filter(|&t| t < self.text_sections.len()),
        };
        let Some(target) = target else {
            return Ok(false);
        };
        self.text_sections.swap(index, target);
        Ok(true)
    }

    fn section_index(&self, id: &str) -> CanvasResult<usize> {
        self.text_sections
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| CanvasError::ElementNotFound(id.to_string()))
    }

    /// Reject templates that cannot be saved.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] if the name is blank.
    pub fn validate(&self) -> CanvasResult<()> {
        if self.name.trim().is_empty() {
            return Err(CanvasError::Validation(
                "Please enter a template name".to_string(),
            ));
        }
        Ok(())
    }
}

/// Render a structured template, stamping the footer with the current year.
///
/// With `test_data`, `{{key}}` tokens whose key has a non-empty value are
/// substituted; all others stay verbatim.
#[must_use]
pub fn generate_structured(
    template: &StructuredTemplate,
    test_data: Option<&HashMap<String, String>>,
) -> String {
    generate_structured_for_year(template, test_data, chrono::Local::now().year())
}

/// [`generate_structured`] with an explicit footer year.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn generate_structured_for_year(
    template: &StructuredTemplate,
    test_data: Option<&HashMap<String, String>>,
    year: i32,
) -> String {
    let fill = |text: &str| match test_data {
        Some(data) => placeholder::substitute(text, data),
        None => text.to_string(),
    };
    let present = |text: &Option<String>| text.as_deref().filter(|t| !t.is_empty()).map(fill);

    let brand = &template.brand;
    let hero = &template.hero;
    let cta = &template.cta;
    let business_name = fill(&brand.business_name);
    let button_color = cta
        .button_color
        .as_deref()
        .filter(|c| !c.is_empty())
        .unwrap_or(&brand.primary_color);

    let logo = if brand.logo_url.is_empty() {
        String::new()
    } else {
        format!(
            r#"<img src="{}" alt="{business_name}" class="logo">"#,
            fill(&brand.logo_url)
        )
    };
    let hero_image = if hero.image_url.is_empty() {
        String::new()
    } else {
        format!(
            r#"<img src="{}" alt="Hero" class="hero-image">"#,
            fill(&hero.image_url)
        )
    };
    let subheadline = present(&hero.subheadline)
        .map(|text| format!(r#"<p class="hero-subheadline">{text}</p>"#))
        .unwrap_or_default();
    let sections: String = template
        .text_sections
        .iter()
        .map(|section| {
            format!(
                r#"
    <div class="content-section">
      <p class="content-text text-{}">{}</p>
    </div>
    "#,
                section.alignment.unwrap_or_default(),
                fill(&section.content)
            )
        })
        .collect();
    let description = present(&cta.description)
        .map(|text| format!(r#"<p class="cta-description">{text}</p>"#))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <style>
    body {{
      margin: 0;
      padding: 0;
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
      background-color: #f4f4f4;
    }}
    .email-container {{
      max-width: 600px;
      margin: 0 auto;
      background-color: #ffffff;
    }}
    .header {{
      padding: 30px 40px;
      background-color: #ffffff;
      border-bottom: 2px solid {primary};
    }}
    .logo-container {{
      display: flex;
      align-items: center;
      gap: 15px;
    }}
    .logo {{
      max-height: 50px;
      width: auto;
    }}
    .business-name {{
      font-size: 24px;
      font-weight: bold;
      color: {primary};
      margin: 0;
    }}
    .hero-section {{
      position: relative;
    }}
    .hero-image {{
      width: 100%;
      height: auto;
      display: block;
    }}
    .hero-text {{
      padding: 40px 40px 20px;
      text-align: center;
    }}
    .hero-headline {{
      font-size: 32px;
      font-weight: bold;
      color: {primary};
      margin: 0 0 15px 0;
      line-height: 1.2;
    }}
    .hero-subheadline {{
      font-size: 18px;
      color: {secondary};
      margin: 0;
      line-height: 1.5;
    }}
    .content-section {{
      padding: 20px 40px;
    }}
    .content-text {{
      font-size: 16px;
      color: #333333;
      line-height: 1.6;
      margin: 0 0 20px 0;
    }}
    .text-left {{ text-align: left; }}
    .text-center {{ text-align: center; }}
    .text-right {{ text-align: right; }}
    .cta-section {{
      padding: 30px 40px 40px;
      text-align: center;
    }}
    .cta-description {{
      font-size: 16px;
      color: #333333;
      margin: 0 0 20px 0;
    }}
    .cta-button {{
      display: inline-block;
      padding: 15px 40px;
      background-color: {button_color};
      color: #ffffff;
      text-decoration: none;
      border-radius: 8px;
      font-size: 18px;
      font-weight: bold;
      transition: opacity 0.3s;
    }}
    .cta-button:hover {{
      opacity: 0.9;
    }}
    .footer {{
      padding: 30px 40px;
      background-color: #f9f9f9;
      text-align: center;
      border-top: 1px solid #e0e0e0;
    }}
    .footer-text {{
      font-size: 14px;
      color: #666666;
      margin: 0;
    }}
  </style>
</head>
<body>
  <div class="email-container">
    <div class="header">
      <div class="logo-container">
        {logo}
        <h1 class="business-name">{business_name}</h1>
      </div>
    </div>

    <div class="hero-section">
      {hero_image}
    </div>

    <div class="hero-text">
      <h2 class="hero-headline">{headline}</h2>
      {subheadline}
    </div>
{sections}
    <div class="cta-section">
      {description}
      <a href="{button_url}" class="cta-button">{button_text}</a>
    </div>

    <div class="footer">
      <p class="footer-text">© {year} {business_name}. All rights reserved.</p>
    </div>
  </div>
</body>
</html>"#,
        title = fill(&template.name),
        primary = brand.primary_color,
        secondary = brand.secondary_color,
        headline = fill(&hero.headline),
        button_url = fill(&cta.button_url),
        button_text = fill(&cta.button_text),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let template = StructuredTemplate::default();
        assert_eq!(template.name, "New Email Template");
        assert_eq!(template.brand.primary_color, "#7C3AED");
        assert_eq!(template.hero.headline, "Welcome!");
        assert_eq!(template.cta.button_text, "Learn More");
        assert!(template.text_sections.is_empty());
    }

    #[test]
    fn test_section_lifecycle() {
        let mut template = StructuredTemplate::default();
        let first = template.add_text_section();
        let second = template.add_text_section();
        assert_eq!(template.text_sections[0].alignment, Some(TextAlign::Left));
        assert!(template.text_sections[0].content.is_empty());

        template
            .update_text_section(&second, Some("Second".to_string()), Some(TextAlign::Center))
            .expect("exists");
        assert!(template
            .move_text_section(&second, MoveDirection::Up)
            .expect("exists"));
        assert_eq!(template.text_sections[0].id, second);
        assert!(!template
            .move_text_section(&second, MoveDirection::Up)
            .expect("exists"));
        assert!(!template
            .move_text_section(&first, MoveDirection::Down)
            .expect("exists"));

        template.remove_text_section(&first).expect("exists");
        assert_eq!(template.text_sections.len(), 1);
        assert!(template.remove_text_section(&first).is_err());
    }

    #[test]
    fn test_generate_sections_and_footer() {
        let mut template = StructuredTemplate::default();
        template.brand.business_name = "Acme".to_string();
        template.cta.button_color = None;
        template.cta.description = Some(String::new());
        let id = template.add_text_section();
        template
            .update_text_section(&id, Some("Body copy".to_string()), Some(TextAlign::Right))
            .expect("exists");

        let html = generate_structured_for_year(&template, None, 2031);
        assert!(html.contains("<title>New Email Template</title>"));
        assert!(html.contains(r#"<p class="content-text text-right">Body copy</p>"#));
        assert!(html.contains("© 2031 Acme. All rights reserved."));
        assert!(html.contains("background-color: #7C3AED;"));
        assert!(!html.contains("class=\"logo\""));
        assert!(!html.contains("cta-description\">"));
        assert!(!html.contains("hero-subheadline\">"));
    }

    #[test]
    fn test_generate_with_test_data() {
        let mut template = StructuredTemplate::default();
        template.hero.headline = "Hi {{first_name}}".to_string();
        template.hero.subheadline = Some("Code {{code}}".to_string());

        let mut data = HashMap::new();
        data.insert("first_name".to_string(), "Ada".to_string());

        let html = generate_structured_for_year(&template, Some(&data), 2030);
        assert!(html.contains(r#"<h2 class="hero-headline">Hi Ada</h2>"#));
        assert!(html.contains(r#"<p class="hero-subheadline">Code {{code}}</p>"#));

        let raw = generate_structured_for_year(&template, None, 2030);
        assert!(raw.contains("Hi {{first_name}}"));
    }

    #[test]
    fn test_validate_requires_name() {
        let template = StructuredTemplate {
            name: " ".to_string(),
            ..StructuredTemplate::default()
        };
        assert!(template.validate().is_err());
    }
}
