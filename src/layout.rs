use crate::input::Vec2;

/// Result of fitting an image into the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayLayout {
    pub fit_scale: f32,
    pub scale: f32,
    pub size: Vec2,
}

/// Fit `image` inside `viewport` preserving aspect ratio, then apply `zoom`.
///
/// Without upscaling the fit scale never exceeds 1.0, so small images stay at
/// native size until zoomed. Returns `None` when either size is degenerate;
/// callers skip drawing the image that frame.
pub fn compute_display_size(
    viewport: Vec2,
    image: Vec2,
    allow_upscaling: bool,
    zoom: f32,
) -> Option<DisplayLayout> {
    let degenerate = |v: Vec2| !(v.x > 0.0 && v.y > 0.0);
    if degenerate(viewport) || degenerate(image) {
        return None;
    }

    let mut fit_scale = fit_scale(image.x, image.y, viewport.x, viewport.y);
    if !allow_upscaling && fit_scale > 1.0 {
        fit_scale = 1.0;
    }
    let scale = fit_scale * zoom;
    Some(DisplayLayout {
        fit_scale,
        scale,
        size: Vec2::new(image.x * scale, image.y * scale),
    })
}

pub fn fit_scale(img_w: f32, img_h: f32, win_w: f32, win_h: f32) -> f32 {
    (win_w / img_w).min(win_h / img_h)
}

// ---------------------------------------------------------------------------
// Scroll surface
// ---------------------------------------------------------------------------

/// A rendering surface that owns the real scroll position and clamps it to
/// its content bounds.
pub trait ScrollSurface {
    /// Request a scroll position; returns the position actually applied.
    fn scroll_to(&mut self, requested: Vec2) -> Vec2;
}

/// The image area of the window. Content smaller than the viewport is centred
/// and cannot scroll; larger content scrolls within `[0, content - size]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    size: Vec2,
    content: Vec2,
    scroll: Vec2,
}

impl Viewport {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    pub fn resize(&mut self, size: Vec2) {
        self.size = size;
        self.scroll = self.clamp(self.scroll);
    }

    pub fn set_content(&mut self, content: Vec2) {
        self.content = content;
        self.scroll = self.clamp(self.scroll);
    }

    pub fn max_scroll(&self) -> Vec2 {
        Vec2::new(
            (self.content.x - self.size.x).max(0.0),
            (self.content.y - self.size.y).max(0.0),
        )
    }

    /// Top-left of the content relative to the viewport origin.
    pub fn content_origin(&self) -> Vec2 {
        let axis = |content: f32, size: f32, scroll: f32| {
            if content <= size {
                (size - content) / 2.0
            } else {
                -scroll
            }
        };
        Vec2::new(
            axis(self.content.x, self.size.x, self.scroll.x),
            axis(self.content.y, self.size.y, self.scroll.y),
        )
    }

    fn clamp(&self, v: Vec2) -> Vec2 {
        let max = self.max_scroll();
        Vec2::new(v.x.clamp(0.0, max.x), v.y.clamp(0.0, max.y))
    }
}

impl ScrollSurface for Viewport {
    fn scroll_to(&mut self, requested: Vec2) -> Vec2 {
        self.scroll = self.clamp(requested);
        self.scroll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fits_wide_image_into_viewport() {
        let layout =
            compute_display_size(Vec2::new(400.0, 300.0), Vec2::new(800.0, 300.0), false, 1.0)
                .expect("renderable");
        assert_relative_eq!(layout.fit_scale, 0.5);
        assert_eq!(layout.size, Vec2::new(400.0, 150.0));
    }

    #[test]
    fn zoom_multiplies_fit_scale() {
        let layout =
            compute_display_size(Vec2::new(400.0, 300.0), Vec2::new(800.0, 300.0), false, 2.0)
                .expect("renderable");
        assert_relative_eq!(layout.scale, 1.0);
        assert_eq!(layout.size, Vec2::new(800.0, 300.0));
    }

    #[test]
    fn small_images_are_not_upscaled_unless_allowed() {
        let viewport = Vec2::new(1000.0, 1000.0);
        let image = Vec2::new(100.0, 50.0);

        let native = compute_display_size(viewport, image, false, 1.0).expect("renderable");
        assert_eq!(native.fit_scale, 1.0);
        assert_eq!(native.size, image);

        let grown = compute_display_size(viewport, image, true, 1.0).expect("renderable");
        assert_relative_eq!(grown.fit_scale, 10.0);
        assert_eq!(grown.size, Vec2::new(1000.0, 500.0));
    }

    #[test]
    fn degenerate_sizes_are_not_renderable() {
        let ok = Vec2::new(10.0, 10.0);
        for bad in [Vec2::new(0.0, 10.0), Vec2::new(10.0, 0.0), Vec2::ZERO] {
            assert!(compute_display_size(bad, ok, false, 1.0).is_none());
            assert!(compute_display_size(ok, bad, false, 1.0).is_none());
        }
        assert!(compute_display_size(ok, Vec2::new(f32::NAN, 1.0), false, 1.0).is_none());
    }

    #[test]
    fn viewport_clamps_scroll_to_content() {
        let mut viewport = Viewport::new(Vec2::new(400.0, 300.0));
        viewport.set_content(Vec2::new(800.0, 300.0));
        assert_eq!(viewport.max_scroll(), Vec2::new(400.0, 0.0));

        let applied = viewport.scroll_to(Vec2::new(500.0, 40.0));
        assert_eq!(applied, Vec2::new(400.0, 0.0));
        let applied = viewport.scroll_to(Vec2::new(-20.0, -30.0));
        assert_eq!(applied, Vec2::ZERO);
        let applied = viewport.scroll_to(Vec2::new(120.0, 0.0));
        assert_eq!(applied, Vec2::new(120.0, 0.0));
        assert_eq!(viewport.content_origin(), Vec2::new(-120.0, 0.0));
    }

    #[test]
    fn shrinking_content_reclamps_scroll() {
        let mut viewport = Viewport::new(Vec2::new(100.0, 100.0));
        viewport.set_content(Vec2::new(300.0, 300.0));
        viewport.scroll_to(Vec2::new(200.0, 150.0));
        viewport.set_content(Vec2::new(150.0, 80.0));
        assert_eq!(viewport.scroll(), Vec2::new(50.0, 0.0));
        assert_eq!(viewport.content_origin(), Vec2::new(-50.0, 10.0));
    }
}
