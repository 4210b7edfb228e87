//! Software drawing into the softbuffer framebuffer (u32 per pixel, 0x00RRGGBB).

use font8x8::legacy::BASIC_LEGACY;
use rayon::prelude::*;

use crate::loader::DecodedImage;
use crate::ui::screen::{DrawCommand, Rect, Rgba};

pub const BG_COLOR: [u8; 4] = [31, 31, 31, 255]; // ~0.12 * 255
pub const GLYPH_SIZE: u32 = 8;
pub const TEXT_SCALE: u32 = 2;

/// Pack RGB into softbuffer u32 format: 0x00RRGGBB.
pub fn rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

/// Unpack softbuffer u32 into (r, g, b).
fn unpack_rgb(v: u32) -> (u8, u8, u8) {
    ((v >> 16) as u8, (v >> 8) as u8, v as u8)
}

fn blend(dst: u32, r: u8, g: u8, b: u8, a: u32) -> u32 {
    if a >= 255 {
        return rgb(r, g, b);
    }
    let (dr, dg, db) = unpack_rgb(dst);
    let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * (255 - a)) / 255) as u8;
    rgb(mix(r, dr), mix(g, dg), mix(b, db))
}

fn glyph(ch: char) -> [u8; 8] {
    let index = ch as usize;
    if index < BASIC_LEGACY.len() {
        BASIC_LEGACY[index]
    } else {
        BASIC_LEGACY[b'?' as usize]
    }
}

/// Width in pixels of `text` at the default scale.
pub fn text_width(text: &str) -> f32 {
    (text.chars().count() as u32 * GLYPH_SIZE * TEXT_SCALE) as f32
}

/// Draw one character at (px, py). Each glyph row is a byte, LSB = left column.
fn draw_char(buf: &mut [u32], stride: u32, buf_h: u32, ch: char, px: i32, py: i32, scale: u32, color: Rgba) {
    let a = color.3 as u32;
    for (row, bits) in glyph(ch).iter().enumerate() {
        for col in 0..GLYPH_SIZE {
            if bits & (1 << col) == 0 {
                continue;
            }
            for sy in 0..scale {
                for sx in 0..scale {
                    let x = px + (col * scale + sx) as i32;
                    let y = py + (row as u32 * scale + sy) as i32;
                    if x >= 0 && y >= 0 && (x as u32) < stride && (y as u32) < buf_h {
                        let off = (y as u32 * stride + x as u32) as usize;
                        buf[off] = blend(buf[off], color.0, color.1, color.2, a);
                    }
                }
            }
        }
    }
}

/// Draw a string. Returns the x position after the last character.
pub fn draw_text(buf: &mut [u32], stride: u32, buf_h: u32, text: &str, px: i32, py: i32, scale: u32, color: Rgba) -> i32 {
    let mut x = px;
    for ch in text.chars() {
        draw_char(buf, stride, buf_h, ch, x, py, scale, color);
        x += (GLYPH_SIZE * scale) as i32;
    }
    x
}

/// Fill a rectangle with a color (with alpha blending).
pub fn fill_rect(buf: &mut [u32], stride: u32, buf_h: u32, rx: i32, ry: i32, rw: u32, rh: u32, color: Rgba) {
    let a = color.3 as u32;
    for row in 0..rh {
        let y = ry + row as i32;
        if y < 0 || y as u32 >= buf_h {
            continue;
        }
        for col in 0..rw {
            let x = rx + col as i32;
            if x < 0 || x as u32 >= stride {
                continue;
            }
            let off = (y as u32 * stride + x as u32) as usize;
            buf[off] = blend(buf[off], color.0, color.1, color.2, a);
        }
    }
}

/// Nearest-neighbour blit of `img` stretched to `rect`, restricted to `clip`.
/// Rows are filled in parallel.
pub fn blit_scaled(dst: &mut [u32], dst_w: u32, dst_h: u32, img: &DecodedImage, rect: Rect, clip: Rect) {
    if rect.w <= 0.0 || rect.h <= 0.0 || img.width == 0 || img.height == 0 || dst_w == 0 {
        return;
    }
    let x_start = rect.x.max(clip.x).max(0.0) as usize;
    let y_start = rect.y.max(clip.y).max(0.0) as usize;
    let x_end = ((rect.x + rect.w).min(clip.x + clip.w).ceil().max(0.0) as usize).min(dst_w as usize);
    let y_end = ((rect.y + rect.h).min(clip.y + clip.h).ceil().max(0.0) as usize).min(dst_h as usize);
    if x_start >= x_end || y_start >= y_end {
        return;
    }

    let src = &img.rgba_bytes;
    let src_w = img.width as usize;
    let src_h = img.height as usize;
    let sx_scale = img.width as f32 / rect.w;
    let sy_scale = img.height as f32 / rect.h;

    dst.par_chunks_mut(dst_w as usize)
        .enumerate()
        .skip(y_start)
        .take(y_end - y_start)
        .for_each(|(dy, row)| {
            let sy = (((dy as f32 + 0.5 - rect.y) * sy_scale) as usize).min(src_h - 1);
            for dx in x_start..x_end {
                let sx = (((dx as f32 + 0.5 - rect.x) * sx_scale) as usize).min(src_w - 1);
                let si = (sy * src_w + sx) * 4;
                let sa = src[si + 3] as u32;
                if sa > 0 {
                    row[dx] = blend(row[dx], src[si], src[si + 1], src[si + 2], sa);
                }
            }
        });
}

/// Execute a frame's draw list, back to front.
pub fn draw(frame: &mut [u32], fb_w: u32, fb_h: u32, commands: &[DrawCommand]) {
    frame.fill(rgb(BG_COLOR[0], BG_COLOR[1], BG_COLOR[2]));
    for command in commands {
        match command {
            DrawCommand::Fill { rect, color } => fill_rect(
                frame,
                fb_w,
                fb_h,
                rect.x as i32,
                rect.y as i32,
                rect.w.max(0.0) as u32,
                rect.h.max(0.0) as u32,
                *color,
            ),
            DrawCommand::Text { text, x, y, color } => {
                draw_text(frame, fb_w, fb_h, text, *x as i32, *y as i32, TEXT_SCALE, *color);
            }
            DrawCommand::Image { image, rect, clip } => {
                blit_scaled(frame, fb_w, fb_h, image, *rect, *clip);
            }
        }
    }
}
