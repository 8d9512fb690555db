//! Text shaping and measurement.
//!
//! Layout never talks to a font engine directly. It asks a [`TextMeasure`]
//! for `{width, height, line_count}` of a string under a width constraint,
//! and [`TextShaper`] answers by driving any [`ShapingBackend`] through the
//! build → layout → query → release cycle of a paragraph handle.
//!
//! The reported width is always the longest laid-out line, never the
//! constraint. Auto-width boxes shrink to it.

use crate::model::{FontStyle, TextStyle};
use serde::{Deserialize, Serialize};

/// Result of measuring one run of styled text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextMetrics {
    /// Longest rendered line.
    pub width: f32,
    /// Stacked height of all lines.
    pub height: f32,
    /// Always ≥ 1, even for empty text.
    pub line_count: u32,
}

impl TextMetrics {
    pub const EMPTY: TextMetrics = TextMetrics {
        width: 0.0,
        height: 0.0,
        line_count: 1,
    };
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeasureError {
    #[error("max width must be non-negative or infinite, got {0}")]
    InvalidMaxWidth(f32),
    #[error("font size must be positive, got {0}")]
    InvalidFontSize(f32),
    #[error("text backend failed: {0}")]
    Backend(String),
}

/// A paragraph-oriented text engine.
///
/// Any engine that can build a paragraph from styled text, lay it out at a
/// width, and report its extents is substitutable here.
pub trait ShapingBackend {
    type Paragraph;

    fn build_paragraph(
        &mut self,
        style: &TextStyle,
        text: &str,
    ) -> Result<Self::Paragraph, MeasureError>;

    /// Lay the paragraph out at `max_width` (`f32::INFINITY` for no wrapping).
    fn layout(&mut self, paragraph: &mut Self::Paragraph, max_width: f32)
    -> Result<(), MeasureError>;

    fn longest_line(&self, paragraph: &Self::Paragraph) -> f32;

    fn height(&self, paragraph: &Self::Paragraph) -> f32;

    fn line_count(&self, paragraph: &Self::Paragraph) -> u32;

    /// Free engine-side resources held by the paragraph.
    fn release(&mut self, paragraph: Self::Paragraph) {
        drop(paragraph);
    }
}

/// Owns a built paragraph and releases it on every exit path.
pub struct ParagraphGuard<'a, B: ShapingBackend> {
    backend: &'a mut B,
    paragraph: Option<B::Paragraph>,
}

impl<'a, B: ShapingBackend> ParagraphGuard<'a, B> {
    pub fn build(backend: &'a mut B, style: &TextStyle, text: &str) -> Result<Self, MeasureError> {
        let paragraph = backend.build_paragraph(style, text)?;
        Ok(Self {
            backend,
            paragraph: Some(paragraph),
        })
    }

    pub fn layout(&mut self, max_width: f32) -> Result<TextMetrics, MeasureError> {
        let Some(paragraph) = self.paragraph.as_mut() else {
            return Err(MeasureError::Backend("paragraph already released".into()));
        };
        self.backend.layout(paragraph, max_width)?;
        Ok(TextMetrics {
            width: self.backend.longest_line(paragraph),
            height: self.backend.height(paragraph),
            line_count: self.backend.line_count(paragraph).max(1),
        })
    }
}

impl<B: ShapingBackend> Drop for ParagraphGuard<'_, B> {
    fn drop(&mut self) {
        if let Some(paragraph) = self.paragraph.take() {
            self.backend.release(paragraph);
        }
    }
}

/// Measure `text` against `max_width` with the given backend.
///
/// Empty text measures `{0, 0, 1}`. Pass `f32::INFINITY` for an
/// unconstrained measurement; zero is a real (very narrow) constraint.
pub fn measure_text<B: ShapingBackend>(
    backend: &mut B,
    text: &str,
    style: &TextStyle,
    max_width: f32,
) -> Result<TextMetrics, MeasureError> {
    if max_width.is_nan() || max_width < 0.0 {
        return Err(MeasureError::InvalidMaxWidth(max_width));
    }
    if text.is_empty() {
        return Ok(TextMetrics::EMPTY);
    }
    if style.font_size.is_nan() || style.font_size <= 0.0 {
        return Err(MeasureError::InvalidFontSize(style.font_size));
    }
    let mut paragraph = ParagraphGuard::build(backend, style, text)?;
    let metrics = paragraph.layout(max_width)?;
    log::trace!(
        "measured {:?} at max {max_width}: {}x{} ({} lines)",
        text,
        metrics.width,
        metrics.height,
        metrics.line_count
    );
    Ok(metrics)
}

/// The measurement hook the layout engine calls for text-bearing boxes.
pub trait TextMeasure {
    fn measure(
        &mut self,
        text: &str,
        style: &TextStyle,
        max_width: f32,
    ) -> Result<TextMetrics, MeasureError>;
}

/// A [`TextMeasure`] over any shaping backend.
#[derive(Debug, Default)]
pub struct TextShaper<B> {
    backend: B,
}

impl<B: ShapingBackend> TextShaper<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: ShapingBackend> TextMeasure for TextShaper<B> {
    fn measure(
        &mut self,
        text: &str,
        style: &TextStyle,
        max_width: f32,
    ) -> Result<TextMetrics, MeasureError> {
        measure_text(&mut self.backend, text, style, max_width)
    }
}

impl<M: TextMeasure + ?Sized> TextMeasure for Box<M> {
    fn measure(
        &mut self,
        text: &str,
        style: &TextStyle,
        max_width: f32,
    ) -> Result<TextMetrics, MeasureError> {
        (**self).measure(text, style, max_width)
    }
}

/// Bind text and style so only the width varies: `width → metrics`.
pub fn measure_fn<'a, M: TextMeasure + ?Sized>(
    measurer: &'a mut M,
    text: &'a str,
    style: &'a TextStyle,
) -> impl FnMut(f32) -> Result<TextMetrics, MeasureError> + 'a {
    move |max_width| measurer.measure(text, style, max_width)
}

// ─── Line breaking ───────────────────────────────────────────────────────

/// Greedy line breaking for fixed-advance glyphs.
///
/// Hard breaks at `\n`; soft breaks at whitespace runs (collapsed to one
/// space). A word wider than `max_width` breaks between glyphs, so every
/// line fits unless a single glyph is wider than the constraint. Returns
/// the width of each line.
pub fn break_lines(text: &str, max_width: f32, advance: f32, word_spacing: f32) -> Vec<f32> {
    let space = advance + word_spacing;
    let glyphs_per_line = if max_width.is_finite() && advance > 0.0 {
        ((max_width / advance).floor() as usize).max(1)
    } else {
        usize::MAX
    };

    let mut lines = Vec::new();
    for hard_line in text.split('\n') {
        let mut current: Option<f32> = None;
        for word in hard_line.split_whitespace() {
            let glyphs = word.chars().count();
            let width = glyphs as f32 * advance;

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
            } else {
                let mut remaining = glyphs;
                while remaining > glyphs_per_line {
                    lines.push(glyphs_per_line as f32 * advance);
                    remaining -= glyphs_per_line;
                }
                current = Some(remaining as f32 * advance);
            }
        }
        lines.push(current.unwrap_or(0.0));
    }
    lines
}

// ─── Monospace backend ───────────────────────────────────────────────────

/// Deterministic approximation: every glyph advances `advance_ratio` em.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceBackend {
    pub advance_ratio: f32,
}

impl Default for MonospaceBackend {
    fn default() -> Self {
        Self { advance_ratio: 0.6 }
    }
}

#[derive(Debug, Clone)]
pub struct MonospaceParagraph {
    text: String,
    advance: f32,
    word_spacing: f32,
    line_height: f32,
    lines: Vec<f32>,
}

impl ShapingBackend for MonospaceBackend {
    type Paragraph = MonospaceParagraph;

    fn build_paragraph(
        &mut self,
        style: &TextStyle,
        text: &str,
    ) -> Result<MonospaceParagraph, MeasureError> {
        Ok(MonospaceParagraph {
            text: text.to_string(),
            advance: style.font_size * self.advance_ratio + style.letter_spacing,
            word_spacing: style.word_spacing,
            line_height: style.line_height_px(),
            lines: Vec::new(),
        })
    }

    fn layout(&mut self, p: &mut MonospaceParagraph, max_width: f32) -> Result<(), MeasureError> {
        p.lines = break_lines(&p.text, max_width, p.advance, p.word_spacing);
        Ok(())
    }

    fn longest_line(&self, p: &MonospaceParagraph) -> f32 {
        p.lines.iter().copied().fold(0.0, f32::max)
    }

    fn height(&self, p: &MonospaceParagraph) -> f32 {
        p.lines.len() as f32 * p.line_height
    }

    fn line_count(&self, p: &MonospaceParagraph) -> u32 {
        p.lines.len() as u32
    }
}

// ─── cosmic-text backend ─────────────────────────────────────────────────

/// Real shaping through `cosmic-text`.
#[cfg(feature = "cosmic")]
pub struct CosmicBackend {
    font_system: cosmic_text::FontSystem,
}

#[cfg(feature = "cosmic")]
impl CosmicBackend {
    /// Loads the system font database.
    pub fn new() -> Self {
        Self::with_font_system(cosmic_text::FontSystem::new())
    }

    pub fn with_font_system(font_system: cosmic_text::FontSystem) -> Self {
        Self { font_system }
    }

    pub fn font_system_mut(&mut self) -> &mut cosmic_text::FontSystem {
        &mut self.font_system
    }
}

#[cfg(feature = "cosmic")]
impl Default for CosmicBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "cosmic")]
pub struct CosmicParagraph {
    buffer: cosmic_text::Buffer,
    letter_spacing: f32,
    line_height: f32,
    lines: Vec<f32>,
}

/// Map the first CSS family to a cosmic-text family.
#[cfg(feature = "cosmic")]
pub fn cosmic_family(name: &str) -> cosmic_text::Family<'_> {
    use cosmic_text::Family;
    match name.to_ascii_lowercase().as_str() {
        "sans-serif" | "system-ui" => Family::SansSerif,
        "serif" => Family::Serif,
        "monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name),
    }
}

#[cfg(feature = "cosmic")]
fn cosmic_attrs(style: &TextStyle) -> cosmic_text::Attrs<'_> {
    let family = style
        .font_family
        .first()
        .map(|f| cosmic_family(f))
        .unwrap_or(cosmic_text::Family::SansSerif);
    let slant = match style.font_style {
        FontStyle::Normal => cosmic_text::Style::Normal,
        FontStyle::Italic => cosmic_text::Style::Italic,
    };
    cosmic_text::Attrs::new()
        .family(family)
        .weight(cosmic_text::Weight(style.font_weight))
        .style(slant)
}

#[cfg(feature = "cosmic")]
impl ShapingBackend for CosmicBackend {
    type Paragraph = CosmicParagraph;

    fn build_paragraph(
        &mut self,
        style: &TextStyle,
        text: &str,
    ) -> Result<CosmicParagraph, MeasureError> {
        let line_height = style.line_height_px();
        if line_height.is_nan() || line_height <= 0.0 {
            return Err(MeasureError::Backend(format!(
                "line height must be positive, got {line_height}"
            )));
        }
        let fs = &mut self.font_system;
        let metrics = cosmic_text::Metrics::new(style.font_size, line_height);
        let mut buffer = cosmic_text::Buffer::new(fs, metrics);
        buffer.set_wrap(fs, cosmic_text::Wrap::WordOrGlyph);
        buffer.set_text(fs, text, cosmic_attrs(style), cosmic_text::Shaping::Advanced);
        Ok(CosmicParagraph {
            buffer,
            letter_spacing: style.letter_spacing,
            line_height,
            lines: Vec::new(),
        })
    }

    fn layout(&mut self, p: &mut CosmicParagraph, max_width: f32) -> Result<(), MeasureError> {
        let fs = &mut self.font_system;
        let width = max_width.is_finite().then_some(max_width);
        p.buffer.set_size(fs, width, None);
        p.buffer.shape_until_scroll(fs, false);
        p.lines = p
            .buffer
            .layout_runs()
            .map(|run| run.line_w + p.letter_spacing * run.glyphs.len() as f32)
            .collect();
        Ok(())
    }

    fn longest_line(&self, p: &CosmicParagraph) -> f32 {
        p.lines.iter().copied().fold(0.0, f32::max)
    }

    fn height(&self, p: &CosmicParagraph) -> f32 {
        p.lines.len().max(1) as f32 * p.line_height
    }

    fn line_count(&self, p: &CosmicParagraph) -> u32 {
        p.lines.len().max(1) as u32
    }
}
