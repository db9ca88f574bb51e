use crate::layout::Baseline;
use crate::model::BoxRect;
use crate::raster::RasterHandle;
use crate::surface::Surface;
use crate::text::TextStyle;
use base64::Engine as _;
use std::fmt::Write as _;

fn fmt_into(out: &mut String, v: f64) {
    // Stable decimal output: no `-0`, no tiny float noise.
    if !v.is_finite() {
        out.push('0');
        return;
    }
    let mut v = if v.abs() < 1e-9 { 0.0 } else { v };
    let nearest = v.round();
    if (v - nearest).abs() < 1e-6 {
        v = nearest;
    }
    if v == -0.0 {
        v = 0.0;
    }
    let _ = write!(out, "{v}");
}

pub(crate) fn escape_xml_into(out: &mut String, text: &str) {
    let mut start = 0usize;
    for (i, b) in text.bytes().enumerate() {
        let esc = match b {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            b'\'' => "&#39;",
            _ => continue,
        };
        out.push_str(&text[start..i]);
        out.push_str(esc);
        start = i + 1;
    }
    out.push_str(&text[start..]);
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_xml_into(&mut out, text);
    out
}

struct Frame {
    open_groups: usize,
}

/// Surface that writes an SVG document; rasters are embedded as base64 PNG data URIs.
pub struct SvgSurface {
    width: f64,
    height: f64,
    background: Option<String>,
    body: String,
    frames: Vec<Frame>,
    open_groups: usize,
}

impl SvgSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            background: None,
            body: String::new(),
            frames: Vec::new(),
            open_groups: 0,
        }
    }

    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background = Some(color.into());
        self
    }

    fn attr(&mut self, name: &str, v: f64) {
        let _ = write!(self.body, " {name}=\"");
        fmt_into(&mut self.body, v);
        self.body.push('"');
    }

    fn attr_str(&mut self, name: &str, v: &str) {
        let _ = write!(self.body, " {name}=\"");
        escape_xml_into(&mut self.body, v);
        self.body.push('"');
    }

    /// Closes any groups left open and returns the document.
    pub fn finish(mut self) -> String {
        while self.open_groups > 0 {
            self.body.push_str("</g>");
            self.open_groups -= 1;
        }

        let mut out = String::with_capacity(self.body.len() + 256);
        out.push_str(r#"<svg xmlns="http://www.w3.org/2000/svg""#);
        for (name, v) in [("width", self.width), ("height", self.height)] {
            let _ = write!(out, " {name}=\"");
            fmt_into(&mut out, v);
            out.push('"');
        }
        out.push_str(" viewBox=\"0 0 ");
        fmt_into(&mut out, self.width);
        out.push(' ');
        fmt_into(&mut out, self.height);
        out.push_str("\">");
        if let Some(bg) = &self.background {
            out.push_str(r#"<rect width="100%" height="100%" fill=""#);
            escape_xml_into(&mut out, bg);
            out.push_str("\"/>");
        }
        out.push_str(&self.body);
        out.push_str("</svg>");
        out
    }
}

impl Surface for SvgSurface {
    fn save(&mut self) {
        self.frames.push(Frame {
            open_groups: self.open_groups,
        });
    }

    fn restore(&mut self) {
        let target = self.frames.pop().map(|f| f.open_groups).unwrap_or(0);
        while self.open_groups > target {
            self.body.push_str("</g>");
            self.open_groups -= 1;
        }
    }

    fn rotate(&mut self, angle_deg: f64, origin_x: f64, origin_y: f64) {
        self.body.push_str("<g transform=\"rotate(");
        fmt_into(&mut self.body, angle_deg);
        self.body.push(' ');
        fmt_into(&mut self.body, origin_x);
        self.body.push(' ');
        fmt_into(&mut self.body, origin_y);
        self.body.push_str(")\">");
        self.open_groups += 1;
    }

    fn fill_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        style: &TextStyle,
        color: &str,
        baseline: Baseline,
    ) {
        self.body.push_str("<text");
        self.attr("x", x);
        self.attr("y", y);
        if let Some(family) = style.font_family.as_deref() {
            self.attr_str("font-family", family);
        }
        self.attr("font-size", style.font_size);
        if let Some(w) = style.font_weight.as_deref() {
            self.attr_str("font-weight", w);
        }
        if let Some(s) = style.font_style.as_deref() {
            self.attr_str("font-style", s);
        }
        self.attr_str("fill", color);
        self.attr_str("dominant-baseline", baseline.as_str());
        self.body.push_str(" xml:space=\"preserve\">");
        escape_xml_into(&mut self.body, text);
        self.body.push_str("</text>");
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: &str, width: f64) {
        self.body.push_str("<line");
        self.attr("x1", x1);
        self.attr("y1", y1);
        self.attr("x2", x2);
        self.attr("y2", y2);
        self.attr_str("stroke", color);
        self.attr("stroke-width", width);
        self.body.push_str("/>");
    }

    fn stroke_rect(&mut self, rect: BoxRect, color: &str, width: f64) {
        self.body.push_str("<rect");
        self.attr("x", rect.x);
        self.attr("y", rect.y);
        self.attr("width", rect.width);
        self.attr("height", rect.height);
        self.body.push_str(" fill=\"none\"");
        self.attr_str("stroke", color);
        self.attr("stroke-width", width);
        self.body.push_str("/>");
    }

    fn draw_raster(&mut self, raster: &RasterHandle, rect: BoxRect) {
        let png = match raster.encode_png() {
            Ok(png) => png,
            Err(err) => {
                tracing::warn!(error = %err, "skipping raster that could not be encoded");
                return;
            }
        };
        self.body.push_str("<image");
        self.attr("x", rect.x);
        self.attr("y", rect.y);
        self.attr("width", rect.width);
        self.attr("height", rect.height);
        self.body
            .push_str(" preserveAspectRatio=\"none\" href=\"data:image/png;base64,");
        self.body
            .push_str(&base64::engine::general_purpose::STANDARD.encode(png));
        self.body.push_str("\"/>");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_xml_covers_markup_characters() {
        assert_eq!(escape_xml(r#"a<b>&"c'"#), "a&lt;b&gt;&amp;&quot;c&#39;");
        assert_eq!(escape_xml("plain"), "plain");
    }

    #[test]
    fn restore_closes_groups_opened_since_save() {
        let mut s = SvgSurface::new(10.0, 10.0);
        s.save();
        s.rotate(-30.0, 5.0, 5.0);
        s.fill_text(
            "A&B",
            1.5,
            2.0,
            &TextStyle::with_size(Some("Arial".to_string()), 12.0),
            "#000",
            Baseline::Hanging,
        );
        s.restore();
        let svg = s.finish();
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10" viewBox="0 0 10 10">"#));
        assert!(svg.contains(r#"<g transform="rotate(-30 5 5)">"#));
        assert!(svg.contains(r#"x="1.5" y="2" font-family="Arial" font-size="12""#));
        assert!(svg.contains(">A&amp;B</text></g></svg>"));
    }
}
