use crate::input::{InputSnapshot, Vec2};
use crate::loader::ImageRef;
use crate::ui::render::{GLYPH_SIZE, TEXT_SCALE};
use crate::viewer::{Action, VisibilityControl};

pub type Rgba = (u8, u8, u8, u8);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.y >= self.y && p.x < self.x + self.w && p.y < self.y + self.h
    }
}

pub const BAR_PADDING: f32 = 6.0;

/// Fixed split of the window: toolbar on top, status line at the bottom,
/// image viewport in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowLayout {
    pub window: Rect,
    pub toolbar: Rect,
    pub viewport: Rect,
    pub status: Rect,
}

impl WindowLayout {
    pub fn split(width: f32, height: f32) -> Self {
        let line = (GLYPH_SIZE * TEXT_SCALE) as f32;
        let toolbar_h = (line + 2.0 * BAR_PADDING).min(height);
        let status_h = (line + BAR_PADDING).min(height - toolbar_h);
        let viewport_h = (height - toolbar_h - status_h).max(0.0);
        Self {
            window: Rect::new(0.0, 0.0, width, height),
            toolbar: Rect::new(0.0, 0.0, width, toolbar_h),
            viewport: Rect::new(0.0, toolbar_h, width, viewport_h),
            status: Rect::new(0.0, toolbar_h + viewport_h, width, status_h),
        }
    }
}

/// One thing for the renderer to draw, in order.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Fill { rect: Rect, color: Rgba },
    Text { text: String, x: f32, y: f32, color: Rgba },
    Image { image: ImageRef, rect: Rect, clip: Rect },
}

/// Shared per-frame context handed to every screen in turn.
///
/// Screens earlier in the list may queue `actions` for later ones; the viewer
/// screen drains them.
pub struct FrameContext<'a> {
    pub input: &'a InputSnapshot,
    pub images: &'a [String],
    pub allow_upscaling: bool,
    pub layout: WindowLayout,
    pub visibility: &'a mut dyn VisibilityControl,
    pub actions: Vec<Action>,
}

/// Given a frame context, produce render instructions.
pub trait Screen {
    fn frame(&mut self, ctx: &mut FrameContext<'_>) -> Vec<DrawCommand>;
}
