use std::sync::Arc;

use super::{Entity, EntityBase, Layer};
use crate::content::FontDef;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParagraphOptions {
    pub line_spacing: i32,
    pub alignment: TextAlign,
}

/// Bitmap-font text. Lines break only on explicit line breaks.
#[derive(Debug, Clone)]
pub struct Paragraph {
    base: EntityBase,
    font: Arc<FontDef>,
    text: String,
    lines: Vec<String>,
    options: ParagraphOptions,
}

impl Paragraph {
    pub fn new(
        font: Arc<FontDef>,
        layer: Layer,
        x: f32,
        y: f32,
        text: &str,
        options: ParagraphOptions,
    ) -> Self {
        let mut paragraph = Self {
            base: EntityBase::new(font.name.clone(), layer, x, y),
            font,
            text: String::new(),
            lines: Vec::new(),
            options,
        };
        paragraph.set_text(text);
        paragraph
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        let normalized = text
            .replace("\r\n", "\n")
            .replace("\n\r", "\n")
            .replace('\r', "\n");
        self.lines = normalized.split('\n').map(str::to_string).collect();
        self.text = normalized;
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn font(&self) -> &FontDef {
        &self.font
    }

    pub fn alignment(&self) -> TextAlign {
        self.options.alignment
    }

    pub fn set_alignment(&mut self, alignment: TextAlign) {
        self.options.alignment = alignment;
    }

    pub fn line_spacing(&self) -> i32 {
        self.options.line_spacing
    }

    pub fn line_width(&self, line: &str) -> f32 {
        (line.chars().count() as u32 * self.font.char_width) as f32
    }

    pub fn width(&self) -> f32 {
        self.lines
            .iter()
            .map(|line| self.line_width(line))
            .fold(0.0, f32::max)
    }

    pub fn line_height(&self) -> f32 {
        self.font.char_height as f32 + self.options.line_spacing as f32
    }

    pub fn height(&self) -> f32 {
        if self.lines.is_empty() {
            return 0.0;
        }
        self.line_height() * (self.lines.len() - 1) as f32 + self.font.char_height as f32
    }

    /// Left x of a line once alignment is applied around the paragraph origin.
    pub fn line_start_x(&self, line: &str) -> f32 {
        match self.options.alignment {
            TextAlign::Left => self.x(),
            TextAlign::Center => self.x() - (self.line_width(line) / 2.0).floor(),
            TextAlign::Right => self.x() - self.line_width(line),
        }
    }
}

impl Entity for Paragraph {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ImageData;

    fn font() -> Arc<FontDef> {
        Arc::new(FontDef {
            name: "ui".to_string(),
            char_width: 4,
            char_height: 6,
            columns: 16,
            image: ImageData::solid(64, 36, [255; 4]),
        })
    }

    #[test]
    fn line_breaks_are_normalized() {
        let paragraph = Paragraph::new(
            font(),
            Layer::Foreground,
            0.0,
            0.0,
            "one\r\ntwo\rthree\n\rfour",
            ParagraphOptions::default(),
        );
        assert_eq!(paragraph.lines(), ["one", "two", "three", "four"]);
    }

    #[test]
    fn size_tracks_longest_line_and_spacing() {
        let options = ParagraphOptions {
            line_spacing: 2,
            alignment: TextAlign::Left,
        };
        let paragraph = Paragraph::new(font(), Layer::Foreground, 0.0, 0.0, "ab\nabcd", options);
        assert_eq!(paragraph.width(), 16.0);
        assert_eq!(paragraph.height(), 14.0);
    }

    #[test]
    fn alignment_moves_line_start() {
        let mut paragraph = Paragraph::new(
            font(),
            Layer::Foreground,
            50.0,
            0.0,
            "abc",
            ParagraphOptions::default(),
        );
        assert_eq!(paragraph.line_start_x("abc"), 50.0);
        paragraph.set_alignment(TextAlign::Center);
        assert_eq!(paragraph.line_start_x("abc"), 44.0);
        paragraph.set_alignment(TextAlign::Right);
        assert_eq!(paragraph.line_start_x("abc"), 38.0);
    }

    #[test]
    fn set_text_replaces_lines() {
        let mut paragraph =
            Paragraph::new(font(), Layer::Foreground, 0.0, 0.0, "a\nb", ParagraphOptions::default());
        paragraph.set_text("score: 10");
        assert_eq!(paragraph.lines(), ["score: 10"]);
        assert_eq!(paragraph.text(), "score: 10");
    }
}
