//! Inline `style` attribute helpers used by the HTML importer.
//!
//! Only inline declarations are understood; there is no cascade and no
//! stylesheet resolution.

use std::collections::HashMap;

/// Parsed `style="..."` declarations, keyed by lower-cased property name.
///
/// Later declarations of the same property win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: HashMap<String, String>,
}

impl InlineStyle {
    /// Parse the contents of a `style` attribute.
    #[must_use]
    pub fn parse(attr: &str) -> Self {
        let declarations = attr
            .split(';')
            .filter_map(|decl| {
                let (name, value) = decl.split_once(':')?;
                let name = name.trim().to_ascii_lowercase();
                let value = value.trim();
                let value = value
                    .strip_suffix("!important")
                    .map_or(value, str::trim_end);
                if name.is_empty() || value.is_empty() {
                    None
                } else {
                    Some((name, value.to_string()))
                }
            })
            .collect();
        Self { declarations }
    }

    /// Raw value of a property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.declarations.get(name).map(String::as_str)
    }

    /// True when the property is declared.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    /// Leading integer of a property value (`"12.5px"` reads as 12).
    #[must_use]
    pub fn px(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(parse_px)
    }

    /// Like [`InlineStyle::px`] but only for strictly positive values.
    #[must_use]
    pub fn positive_px(&self, name: &str) -> Option<u32> {
        self.px(name)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|&v| v > 0)
    }

    /// Left padding, from `padding-left` or the `padding` shorthand.
    #[must_use]
    pub fn padding_left(&self) -> Option<i32> {
        self.px("padding-left")
            .or_else(|| self.box_side("padding", Side::Left))
    }

    /// Top padding, from `padding-top` or the `padding` shorthand.
    #[must_use]
    pub fn padding_top(&self) -> Option<i32> {
        self.px("padding-top")
            .or_else(|| self.box_side("padding", Side::Top))
    }

    /// Background color as `#rrggbb`; absent or fully transparent reads as `None`.
    ///
    /// Falls back to the first color token of the `background` shorthand.
    #[must_use]
    pub fn background_color(&self) -> Option<String> {
        match self.get("background-color") {
            Some(value) => color_to_hex(value),
            None => self
                .get("background")
                .and_then(first_color_token)
                .and_then(color_to_hex),
        }
    }

    /// Foreground color as `#rrggbb`.
    #[must_use]
    pub fn color(&self) -> Option<String> {
        self.get("color").and_then(color_to_hex)
    }

    /// Border width, from `border-width` or the `border` shorthand.
    #[must_use]
    pub fn border_width(&self) -> Option<i32> {
        self.px("border-width").or_else(|| {
            self.get("border")?
                .split_whitespace()
                .find_map(parse_px)
        })
    }

    /// Border color, from `border-color` or the `border` shorthand.
    #[must_use]
    pub fn border_color(&self) -> Option<String> {
        match self.get("border-color") {
            Some(value) => color_to_hex(value),
            None => self
                .get("border")
                .and_then(first_color_token)
                .and_then(color_to_hex),
        }
    }

    /// First family of `font-family`, with quotes removed.
    #[must_use]
    pub fn first_font_family(&self) -> Option<String> {
        let family = self
            .get("font-family")?
            .split(',')
            .next()?
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .trim();
        (!family.is_empty()).then(|| family.to_string())
    }

    fn box_side(&self, shorthand: &str, side: Side) -> Option<i32> {
        let values: Vec<&str> = self.get(shorthand)?.split_whitespace().collect();
        let token = match (side, values.len()) {
            (_, 0) => return None,
            (Side::Top, _) | (Side::Left, 1) => values[0],
            (Side::Left, 2 | 3) => values[1],
            (Side::Left, _) => values[3],
        };
        parse_px(token)
    }
}

#[derive(Clone, Copy)]
enum Side {
    Top,
    Left,
}

/// Leading (optionally signed) integer of a CSS length, like `parseInt`.
#[must_use]
pub fn parse_px(value: &str) -> Option<i32> {
    let value = value.trim();
    let (negative, digits) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude: i32 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Normalize a CSS color to `#rrggbb`.
///
/// `rgb()`/`rgba()` and short hex are converted; other hex values and named
/// colors pass through. Transparent and keyword values read as `None`.
#[must_use]
pub fn color_to_hex(value: &str) -> Option<String> {
    let value = value.trim();
    let lower = value.to_ascii_lowercase();
    match lower.as_str() {
        "" | "transparent" | "none" | "inherit" | "initial" | "unset" | "currentcolor" => None,
        hex if hex.starts_with('#') => Some(expand_short_hex(hex)),
        rgb if rgb.starts_with("rgb") => rgb_to_hex(rgb),
        _ => Some(value.to_string()),
    }
}

fn expand_short_hex(hex: &str) -> String {
    let digits = &hex[1..];
    if digits.len() == 3 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        digits.chars().fold(String::from("#"), |mut out, c| {
            out.push(c);
            out.push(c);
            out
        })
    } else {
        hex.to_string()
    }
}

fn rgb_to_hex(value: &str) -> Option<String> {
    let inner = value.split_once('(')?.1.trim_end().strip_suffix(')')?;
    let parts: Vec<f64> = inner
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.trim_end_matches('%').parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    if parts.len() < 3 {
        return None;
    }
    if parts.get(3).is_some_and(|&alpha| alpha <= 0.0) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    Some(format!(
        "#{:02x}{:02x}{:02x}",
        channel(parts[0]),
        channel(parts[1]),
        channel(parts[2])
    ))
}

fn first_color_token(value: &str) -> Option<&str> {
    if let Some(start) = value.find("rgb") {
        let end = value[start..].find(')')?;
        return Some(&value[start..=start + end]);
    }
    value.split_whitespace().find(|token| {
        token.starts_with('#')
            || (token.chars().all(|c| c.is_ascii_alphabetic()) && !is_background_keyword(token))
    })
}

fn is_background_keyword(token: &str) -> bool {
    matches!(
        token.to_ascii_lowercase().as_str(),
        "no-repeat"
            | "repeat"
            | "center"
            | "top"
            | "bottom"
            | "left"
            | "right"
            | "fixed"
            | "scroll"
            | "cover"
            | "contain"
            | "solid"
            | "dashed"
            | "dotted"
            | "double"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_declarations() {
        let style = InlineStyle::parse("Width: 100px; height:50px;; color : red !important;bad");
        assert_eq!(style.get("width"), Some("100px"));
        assert_eq!(style.px("height"), Some(50));
        assert_eq!(style.get("color"), Some("red"));
        assert!(!style.has("bad"));
    }

    #[test]
    fn test_parse_px_like_parse_int() {
        assert_eq!(parse_px("12.7px"), Some(12));
        assert_eq!(parse_px(" -4px"), Some(-4));
        assert_eq!(parse_px("0"), Some(0));
        assert_eq!(parse_px("auto"), None);
        assert_eq!(parse_px("px"), None);
    }

    #[test]
    fn test_color_to_hex() {
        assert_eq!(color_to_hex("rgb(59, 130, 246)").as_deref(), Some("#3b82f6"));
        assert_eq!(color_to_hex("rgba(255,0,0,0.5)").as_deref(), Some("#ff0000"));
        assert_eq!(color_to_hex("rgba(0, 0, 0, 0)"), None);
        assert_eq!(color_to_hex("transparent"), None);
        assert_eq!(color_to_hex("#EEE").as_deref(), Some("#eeeeee"));
        assert_eq!(color_to_hex("#ff0000").as_deref(), Some("#ff0000"));
        assert_eq!(color_to_hex("navy").as_deref(), Some("navy"));
    }

    #[test]
    fn test_shorthands() {
        let style = InlineStyle::parse(
            "padding: 12px 24px; background: #fff url(x.png) no-repeat; border: 2px solid rgb(0, 0, 255)",
        );
        assert_eq!(style.padding_top(), Some(12));
        assert_eq!(style.padding_left(), Some(24));
        assert_eq!(style.background_color().as_deref(), Some("#ffffff"));
        assert_eq!(style.border_width(), Some(2));
        assert_eq!(style.border_color().as_deref(), Some("#0000ff"));

        let four = InlineStyle::parse("padding: 1px 2px 3px 4px");
        assert_eq!(four.padding_left(), Some(4));
    }

    #[test]
    fn test_first_font_family() {
        let style = InlineStyle::parse(r#"font-family: "Helvetica Neue", Arial, sans-serif"#);
        assert_eq!(style.first_font_family().as_deref(), Some("Helvetica Neue"));
    }
}
