use image::{Rgba, RgbaImage};

use crate::badge_font::{glyph, GLYPH_SIZE};

pub const ICON_EDGE: u32 = 128;

/// Lines must fit within 85% of the icon width.
const WRAP_WIDTH_BUDGET: u32 = ICON_EDGE * 85 / 100;
/// Stacked lines must fit within 70% of the icon height.
const MULTILINE_HEIGHT_BUDGET: u32 = ICON_EDGE * 70 / 100;
/// Badge contrast flips to black text above this background luminance.
const BADGE_CONTRAST_THRESHOLD: f32 = 0.7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeLayout {
    pub font_px: u32,
    pub lines: Vec<String>,
}

impl BadgeLayout {
    pub fn advance(&self) -> u32 {
        advance(self.font_px)
    }

    pub fn line_height(&self) -> u32 {
        line_height(self.font_px)
    }

    pub fn line_width(&self, line: &str) -> u32 {
        line.chars().count() as u32 * self.advance()
    }
}

/// Strips a trailing parenthesized annotation and surrounding whitespace.
pub fn normalize_label(text: &str) -> String {
    let mut trimmed = text.trim();
    if trimmed.ends_with(')') {
        if let Some(open) = trimmed.rfind('(') {
            trimmed = trimmed[..open].trim_end();
        }
    }
    trimmed.trim().to_string()
}

/// Black text on light backgrounds, white on dark ones.
pub fn foreground_for(background: u32) -> [u8; 4] {
    if relative_luminance(background) > BADGE_CONTRAST_THRESHOLD {
        [0, 0, 0, 255]
    } else {
        [255, 255, 255, 255]
    }
}

/// Deterministic size-and-wrap plan for a badge label. Empty labels
/// produce no lines and render as a plain color swatch.
pub fn badge_layout(text: &str) -> BadgeLayout {
    let normalized = normalize_label(text);
    if normalized.is_empty() {
        return BadgeLayout {
            font_px: 0,
            lines: Vec::new(),
        };
    }

    let mut font_px = font_size_for(normalized.chars().count());
    let mut lines = if normalized.chars().any(char::is_whitespace) {
        wrap_words(&normalized, font_px)
    } else {
        vec![normalized]
    };

    if lines.len() > 1 {
        let max_font = MULTILINE_HEIGHT_BUDGET * 4 / (5 * lines.len() as u32);
        font_px = font_px.min(max_font).max(1);
    }

    let widest = lines
        .iter()
        .map(|line| line.chars().count() as u32)
        .max()
        .unwrap_or(0);
    let width = widest * advance(font_px);
    if width > WRAP_WIDTH_BUDGET {
        font_px = (font_px * WRAP_WIDTH_BUDGET / width).max(1);
    }

    lines.retain(|line| !line.is_empty());
    BadgeLayout { font_px, lines }
}

/// Renders the badge: background fill, contrast-picked foreground,
/// stacked lines vertically centered and each horizontally centered.
pub fn render_text_icon(text: &str, background: u32) -> RgbaImage {
    let [r, g, b, a] = unpack_rgba(background);
    let mut image = RgbaImage::from_pixel(ICON_EDGE, ICON_EDGE, Rgba([r, g, b, a]));

    let layout = badge_layout(text);
    if layout.lines.is_empty() {
        return image;
    }

    let fg = Rgba(foreground_for(background));
    let cell_w = layout.advance();
    let cell_h = layout.font_px.max(1);
    let line_h = layout.line_height();
    let total_height = line_h * layout.lines.len() as u32;
    let y0 = ICON_EDGE.saturating_sub(total_height) / 2;

    for (row, line) in layout.lines.iter().enumerate() {
        let x0 = ICON_EDGE.saturating_sub(layout.line_width(line)) / 2;
        let y = y0 + row as u32 * line_h;
        for (col, ch) in line.chars().enumerate() {
            draw_glyph(&mut image, ch, x0 + col as u32 * cell_w, y, cell_w, cell_h, fg);
        }
    }

    image
}

fn font_size_for(char_count: usize) -> u32 {
    let percent = match char_count {
        0..=1 => 60,
        2 => 45,
        3..=4 => 35,
        5..=8 => 25,
        _ => 20,
    };
    ICON_EDGE * percent / 100
}

fn advance(font_px: u32) -> u32 {
    (font_px * 3 / 4).max(1)
}

fn line_height(font_px: u32) -> u32 {
    (font_px * 5 / 4).max(1)
}

fn wrap_words(text: &str, font_px: u32) -> Vec<String> {
    let adv = advance(font_px);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if current.is_empty() || candidate.chars().count() as u32 * adv <= WRAP_WIDTH_BUDGET {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn draw_glyph(
    image: &mut RgbaImage,
    ch: char,
    x0: u32,
    y0: u32,
    cell_w: u32,
    cell_h: u32,
    fg: Rgba<u8>,
) {
    let bitmap = glyph(ch);
    for dy in 0..cell_h {
        let gy = (dy * GLYPH_SIZE / cell_h).min(GLYPH_SIZE - 1);
        let row = bitmap[gy as usize];
        for dx in 0..cell_w {
            let gx = (dx * GLYPH_SIZE / cell_w).min(GLYPH_SIZE - 1);
            if row >> gx & 1 == 1 {
                let x = x0 + dx;
                let y = y0 + dy;
                if x < image.width() && y < image.height() {
                    image.put_pixel(x, y, fg);
                }
            }
        }
    }
}

fn relative_luminance(color: u32) -> f32 {
    let [r, g, b, _] = unpack_rgba(color);
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0
}

fn unpack_rgba(color: u32) -> [u8; 4] {
    color.to_be_bytes()
}
