use keycap_core::Style;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FONT_SIZE: f64 = 12.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: Option<String>,
    pub font_size: f64,
    pub font_weight: Option<String>,
    pub font_style: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: None,
            font_size: DEFAULT_FONT_SIZE,
            font_weight: None,
            font_style: None,
        }
    }
}

impl TextStyle {
    pub fn with_size(font_family: Option<String>, font_size: f64) -> Self {
        Self {
            font_family,
            font_size,
            ..Self::default()
        }
    }

    /// Font variant for a node's inline style.
    pub fn variant(&self, style: Style) -> Self {
        Self {
            font_family: self.font_family.clone(),
            font_size: self.font_size,
            font_weight: style.bold.then(|| "bold".to_string()),
            font_style: style.italic.then(|| "italic".to_string()),
        }
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight
            .as_deref()
            .is_some_and(|w| w == "bold" || w.parse::<u32>().is_ok_and(|n| n >= 600))
    }

    pub fn is_italic(&self) -> bool {
        self.font_style.as_deref() == Some("italic")
    }

    /// CSS `font` shorthand, e.g. `italic bold 12px Arial`.
    pub fn css_font(&self) -> String {
        let mut out = String::new();
        if let Some(s) = &self.font_style {
            out.push_str(s);
            out.push(' ');
        }
        if let Some(w) = &self.font_weight {
            out.push_str(w);
            out.push(' ');
        }
        out.push_str(&format!("{}px ", self.font_size));
        out.push_str(self.font_family.as_deref().unwrap_or("sans-serif"));
        out
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub line_count: usize,
}

/// Width measurement used by both wrapping and drawing.
///
/// Layout and the renderer must measure with the same implementation; a divergence shows up as
/// runs drawn over each other or gaps between them.
pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;
}

/// Font-free measurer: every character advances `font_size * char_width_factor`.
#[derive(Debug, Clone, Default)]
pub struct DeterministicTextMeasurer {
    pub char_width_factor: f64,
    pub line_height_factor: f64,
    /// Extra width multiplier for bold runs; `0.0` means no widening.
    pub bold_width_factor: f64,
}

impl DeterministicTextMeasurer {
    pub fn normalized_text_lines(text: &str) -> Vec<&str> {
        let out = text.split('\n').collect::<Vec<_>>();
        if out.is_empty() { vec![""] } else { out }
    }
}

impl TextMeasurer for DeterministicTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let char_width_factor = if self.char_width_factor == 0.0 {
            0.6
        } else {
            self.char_width_factor
        };
        let line_height_factor = if self.line_height_factor == 0.0 {
            1.2
        } else {
            self.line_height_factor
        };
        let bold_factor = if self.bold_width_factor > 0.0 && style.is_bold() {
            self.bold_width_factor
        } else {
            1.0
        };

        let lines = Self::normalized_text_lines(text);
        let font_size = style.font_size.max(1.0);
        let max_chars = lines
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);

        TextMetrics {
            width: max_chars as f64 * font_size * char_width_factor * bold_factor,
            height: lines.len() as f64 * font_size * line_height_factor,
            line_count: lines.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_width_scales_with_chars_and_size() {
        let m = DeterministicTextMeasurer::default();
        let style = TextStyle::with_size(None, 10.0);
        assert_eq!(m.measure("abcd", &style).width, 24.0);
        assert_eq!(m.measure("", &style).width, 0.0);
        let two = m.measure("ab\nabc", &style);
        assert_eq!(two.line_count, 2);
        assert_eq!(two.width, 18.0);
    }

    #[test]
    fn bold_widening_is_opt_in() {
        let style = TextStyle::with_size(None, 10.0).variant(Style::PLAIN.with_bold());
        assert!(style.is_bold());
        let plain = DeterministicTextMeasurer::default();
        assert_eq!(plain.measure("ab", &style).width, 12.0);
        let wide = DeterministicTextMeasurer {
            bold_width_factor: 1.5,
            ..Default::default()
        };
        assert_eq!(wide.measure("ab", &style).width, 18.0);
    }

    #[test]
    fn css_font_shorthand() {
        let style = TextStyle::with_size(Some("Arial".to_string()), 12.0)
            .variant(Style::PLAIN.with_bold().with_italic());
        assert_eq!(style.css_font(), "italic bold 12px Arial");
    }
}
