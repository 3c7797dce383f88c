use serde::Deserialize;

use super::canvas::Canvas;

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;
pub(crate) const GLYPH_ADVANCE: i32 = GLYPH_WIDTH + 1;
pub(crate) const LINE_ADVANCE: i32 = GLYPH_HEIGHT + 2;

pub(crate) const TEXT_COLOR: [u8; 4] = [244, 248, 252, 255];
pub(crate) const PANEL_COLOR: [u8; 4] = [10, 12, 16, 210];
pub(crate) const MASK_COLOR: [u8; 4] = [64, 220, 96, 255];
pub(crate) const MASK_HIT_COLOR: [u8; 4] = [236, 64, 64, 255];
pub(crate) const MASK_HOVER_COLOR: [u8; 4] = [240, 220, 64, 255];
pub(crate) const MAP_MASK_COLOR: [u8; 4] = [80, 140, 255, 255];
pub(crate) const ORIGIN_COLOR: [u8; 4] = [255, 0, 255, 255];
pub(crate) const ACTION_POINT_COLOR: [u8; 4] = [0, 255, 255, 255];

/// Which debug layers are drawn over the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebugOverlays {
    pub collision_masks: bool,
    pub origin_points: bool,
    pub action_points: bool,
    pub room_info: bool,
    pub fps: bool,
}

/// 3x5 glyphs for ASCII 32..=126, row-major, top row in the high bits.
const GLYPHS: [u16; 95] = [
    0x0000, 0x2482, 0x5a00, 0x5f7d, 0x7ddf, 0x52a5, 0x2aab, 0x2400,
    0x1491, 0x4494, 0x0aa8, 0x05d0, 0x0014, 0x01c0, 0x0002, 0x12a4,
    0x7b6f, 0x2c97, 0x73e7, 0x73cf, 0x5bc9, 0x79cf, 0x79ef, 0x7292,
    0x7bef, 0x7bcf, 0x0410, 0x0414, 0x1511, 0x0e38, 0x4454, 0x72c2,
    0x7be7, 0x2bed, 0x6bae, 0x7927, 0x6b6e, 0x79a7, 0x79a4, 0x796f,
    0x5bed, 0x7497, 0x726f, 0x5bad, 0x4927, 0x5fed, 0x5ffd, 0x7b6f,
    0x6ba4, 0x7b79, 0x6bad, 0x79cf, 0x7492, 0x5b6f, 0x5b6a, 0x5bfd,
    0x5aad, 0x5a92, 0x72a7, 0x6926, 0x4889, 0x324b, 0x2a00, 0x0007,
    0x4400, 0x0e7f, 0x49ae, 0x0f27, 0x13ef, 0x0fa7, 0x39a4, 0x0f79,
    0x49ad, 0x2092, 0x106a, 0x4bad, 0x4927, 0x0ded, 0x0d6d, 0x0f6f,
    0x0d74, 0x0f79, 0x0d64, 0x0f8f, 0x2e93, 0x0b6f, 0x0b6a, 0x0b7a,
    0x0a95, 0x0b79, 0x0e57, 0x3593, 0x2492, 0x64d6, 0x0780,
];

/// Characters outside printable ASCII draw as `?`.
fn glyph_bits(ch: char) -> u16 {
    let code = ch as u32;
    let index = if (32..=126).contains(&code) {
        code - 32
    } else {
        u32::from(b'?') - 32
    };
    GLYPHS[index as usize]
}

pub(crate) fn text_width(text: &str) -> i32 {
    text.chars().count() as i32 * GLYPH_ADVANCE
}

pub(crate) fn draw_text(canvas: &mut Canvas, x: i32, y: i32, text: &str, color: [u8; 4]) {
    let mut cursor_x = x;
    for ch in text.chars() {
        let bits = glyph_bits(ch);
        for row in 0..GLYPH_HEIGHT {
            for col in 0..GLYPH_WIDTH {
                let shift = (GLYPH_HEIGHT - 1 - row) * GLYPH_WIDTH + (GLYPH_WIDTH - 1 - col);
                if bits & (1 << shift) != 0 {
                    canvas.blend_pixel(cursor_x + col, y + row, color, 1.0);
                }
            }
        }
        cursor_x += GLYPH_ADVANCE;
    }
}

/// Text lines on a dark backing plate in the top-left corner.
pub(crate) fn draw_panel(canvas: &mut Canvas, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let widest = lines.iter().map(|line| text_width(line)).max().unwrap_or(0);
    canvas.fill_rect(
        1,
        1,
        widest + 3,
        lines.len() as i32 * LINE_ADVANCE + 2,
        PANEL_COLOR,
        1.0,
    );
    let mut y = 3;
    for line in lines {
        draw_text(canvas, 3, y, line, TEXT_COLOR);
        y += LINE_ADVANCE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_table_covers_printable_ascii() {
        assert_eq!(glyph_bits(' '), 0);
        for code in 33u8..=126 {
            assert_ne!(glyph_bits(char::from(code)), 0, "glyph {}", char::from(code));
        }
        assert_eq!(glyph_bits('\u{e9}'), glyph_bits('?'));
    }

    #[test]
    fn digit_one_draws_its_stem() {
        let mut canvas = Canvas::new(4, 5);
        draw_text(&mut canvas, 0, 0, "1", [255, 255, 255, 255]);
        for row in 0..5 {
            assert_eq!(canvas.pixel(1, row), Some([255, 255, 255, 255]));
        }
    }

    #[test]
    fn text_near_edges_is_clipped() {
        let mut canvas = Canvas::new(2, 2);
        draw_text(&mut canvas, -5, -3, "WIDE TEXT", TEXT_COLOR);
        draw_panel(&mut canvas, &["FPS 60".to_string()]);
        assert_eq!(canvas.width(), 2);
    }

    #[test]
    fn overlays_deserialize_with_defaults() {
        let overlays: DebugOverlays =
            serde_json::from_str(r#"{"collisionMasks": true}"#).expect("parse");
        assert!(overlays.collision_masks);
        assert!(!overlays.fps);
    }
}
