//! Browser text measurement through `CanvasRenderingContext2d.measureText`.
//!
//! Words are measured by the canvas, then broken greedily the same way the
//! native backends break them, so the builder's boxes match what the
//! browser will draw.

use wb_core::text::{MeasureError, ShapingBackend};
use wb_core::{FontStyle, TextStyle};
use web_sys::CanvasRenderingContext2d;

pub struct CanvasBackend {
    ctx: CanvasRenderingContext2d,
}

impl CanvasBackend {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }
}

pub struct CanvasParagraph {
    text: String,
    font: String,
    letter_spacing: f32,
    word_spacing: f32,
    line_height: f32,
    lines: Vec<f32>,
}

/// CSS `font` shorthand for `style`.
pub fn css_font(style: &TextStyle) -> String {
    let slant = match style.font_style {
        FontStyle::Normal => "normal",
        FontStyle::Italic => "italic",
    };
    let families = style
        .font_family
        .iter()
        .map(|f| {
            if f.contains(' ') {
                format!("\"{f}\"")
            } else {
                f.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{slant} {} {}px {families}", style.font_weight, style.font_size)
}

/// Greedy line breaking with a caller-supplied width function.
///
/// Hard breaks at `\n`, soft breaks at whitespace runs. A word wider than
/// `max_width` breaks between glyphs. Returns the width of each line.
pub fn break_measured(
    text: &str,
    max_width: f32,
    letter_spacing: f32,
    word_spacing: f32,
    mut width_of: impl FnMut(&str) -> f32,
) -> Vec<f32> {
    let mut measure = |s: &str| width_of(s) + letter_spacing * s.chars().count() as f32;
    let space = measure(" ") + word_spacing;

    let mut lines = Vec::new();
    for hard_line in text.split('\n') {
        let mut current: Option<f32> = None;
        for word in hard_line.split_whitespace() {
            let width = measure(word);
            if let Some(line) = current {
                if line + space + width <= max_width {
                    current = Some(line + space + width);
                    continue;
                }
                lines.push(line);
                current = None;
            }
            if width <= max_width {
                current = Some(width);
                continue;
            }
            let mut line = 0.0;
            let mut buf = [0u8; 4];
            for ch in word.chars() {
                let w = measure(ch.encode_utf8(&mut buf));
                if line > 0.0 && line + w > max_width {
                    lines.push(line);
                    line = 0.0;
                }
                line += w;
            }
            current = Some(line);
        }
        lines.push(current.unwrap_or(0.0));
    }
    lines
}

impl ShapingBackend for CanvasBackend {
    type Paragraph = CanvasParagraph;

    fn build_paragraph(
        &mut self,
        style: &TextStyle,
        text: &str,
    ) -> Result<CanvasParagraph, MeasureError> {
        Ok(CanvasParagraph {
            text: text.to_string(),
            font: css_font(style),
            letter_spacing: style.letter_spacing,
            word_spacing: style.word_spacing,
            line_height: style.line_height_px(),
            lines: Vec::new(),
        })
    }

    fn layout(&mut self, p: &mut CanvasParagraph, max_width: f32) -> Result<(), MeasureError> {
        self.ctx.set_font(&p.font);
        let mut failure = None;
        let ctx = &self.ctx;
        p.lines = break_measured(&p.text, max_width, p.letter_spacing, p.word_spacing, |s| {
            match ctx.measure_text(s) {
                Ok(m) => m.width() as f32,
                Err(err) => {
                    failure.get_or_insert_with(|| format!("measureText failed: {err:?}"));
                    0.0
                }
            }
        });
        match failure {
            Some(msg) => Err(MeasureError::Backend(msg)),
            None => Ok(()),
        }
    }

    fn longest_line(&self, p: &CanvasParagraph) -> f32 {
        p.lines.iter().copied().fold(0.0, f32::max)
    }

    fn height(&self, p: &CanvasParagraph) -> f32 {
        p.lines.len() as f32 * p.line_height
    }

    fn line_count(&self, p: &CanvasParagraph) -> u32 {
        p.lines.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// 10px per char.
    fn fixed(s: &str) -> f32 {
        s.chars().count() as f32 * 10.0
    }

    #[test]
    fn wraps_at_word_boundaries() {
        assert_eq!(break_measured("ab cd ef", 55.0, 0.0, 0.0, fixed), vec![50.0, 20.0]);
        assert_eq!(break_measured("ab cd", f32::INFINITY, 0.0, 0.0, fixed), vec![50.0]);
    }

    #[test]
    fn long_word_breaks_between_glyphs() {
        assert_eq!(break_measured("abcdefg", 30.0, 0.0, 0.0, fixed), vec![30.0, 30.0, 10.0]);
    }

    #[test]
    fn hard_breaks_and_spacing() {
        assert_eq!(break_measured("a\n\nbb", 100.0, 0.0, 0.0, fixed), vec![10.0, 0.0, 20.0]);
        // letter spacing 1px per glyph, word spacing 5px
        assert_eq!(break_measured("ab cd", 100.0, 1.0, 5.0, fixed), vec![22.0 + 16.0 + 22.0]);
    }

    #[test]
    fn font_shorthand() {
        let mut style = TextStyle::default();
        style.font_family = vec!["Open Sans".into(), "sans-serif".into()];
        style.font_weight = 700;
        style.font_style = FontStyle::Italic;
        style.font_size = 14.0;
        assert_eq!(css_font(&style), "italic 700 14px \"Open Sans\", sans-serif");
    }
}
