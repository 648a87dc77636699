//! Fonts and text metrics

use alloc::vec::Vec;
use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_8X13, FONT_9X15_BOLD, FONT_10X20};

/// Button labels
pub const BUTTON_FONT: &MonoFont<'static> = &FONT_9X15_BOLD;

/// Small button labels and secondary text
pub const MINI_FONT: &MonoFont<'static> = &FONT_6X10;

/// Dialog messages and list rows
pub const BODY_FONT: &MonoFont<'static> = &FONT_8X13;

/// Dialog titles
pub const TITLE_FONT: &MonoFont<'static> = &FONT_9X15_BOLD;

/// Values and readouts
pub const LARGE_FONT: &MonoFont<'static> = &FONT_10X20;

/// Width in pixels of `text` rendered in `font`.
pub fn text_width(text: &str, font: &MonoFont<'_>) -> u32 {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return 0;
    }
    chars * font.character_size.width + (chars - 1) * font.character_spacing
}

pub fn line_height(font: &MonoFont<'_>) -> u32 {
    font.character_size.height
}

/// Copy `text` into a fixed-capacity string, dropping what does not fit.
pub fn bounded<const N: usize>(text: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Split `text` into lines no wider than `max_width`, breaking at spaces.
///
/// Words longer than a line are hard-split. Explicit `\n` always breaks.
pub fn wrap_lines<'a>(text: &'a str, max_width: u32, font: &MonoFont<'_>) -> Vec<&'a str> {
    let advance = font.character_size.width + font.character_spacing;
    let max_chars = ((max_width + font.character_spacing) / advance.max(1)).max(1) as usize;

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut rest = paragraph.trim_end();
        if rest.is_empty() {
            lines.push("");
            continue;
        }
        while !rest.is_empty() {
            if rest.chars().count() <= max_chars {
                lines.push(rest);
                break;
            }
            let hard = rest
                .char_indices()
                .nth(max_chars)
                .map_or(rest.len(), |(idx, _)| idx);
            let cut = rest[..hard].rfind(' ').filter(|&idx| idx > 0).unwrap_or(hard);
            lines.push(rest[..cut].trim_end());
            rest = rest[cut..].trim_start();
        }
    }
    lines
}
