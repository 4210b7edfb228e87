use crate::input::Vec2;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const ZOOM_STEP: f32 = 0.25;
pub const MIN_ZOOM: f32 = 0.25;
pub const MAX_ZOOM: f32 = 10.0;

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Discrete transitions. Keybinds, toolbar buttons and host shortcuts all
/// resolve to one of these and go through the same code path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    NextImage,
    PreviousImage,
    ZoomIn,
    ZoomOut,
    ResetZoom,
    ToggleVisibility,
    Reload,
    Clear,
}

impl Action {
    pub fn describe(self) -> &'static str {
        match self {
            Self::NextImage => "Next image",
            Self::PreviousImage => "Previous image",
            Self::ZoomIn => "Zoom in",
            Self::ZoomOut => "Zoom out",
            Self::ResetZoom => "Reset zoom",
            Self::ToggleVisibility => "Show / hide viewer",
            Self::Reload => "Reload current image",
            Self::Clear => "Clear image",
        }
    }
}

/// Window-visibility collaborator. The viewer only asks for a toggle; how the
/// host hides itself is its own business.
pub trait VisibilityControl {
    fn toggle_visibility(&mut self);
    fn is_visible(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Viewer state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragAnchor {
    mouse: Vec2,
    pan: Vec2,
}

/// Index, zoom and pan for one viewing session.
///
/// Zoom is always within `[MIN_ZOOM, MAX_ZOOM]`. Whenever zoom is at or below
/// 1.0 the pan offset is zero and no drag is active.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    current_index: usize,
    zoom: f32,
    pan: Vec2,
    drag: Option<DragAnchor>,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewerState {
    pub fn new() -> Self {
        Self {
            current_index: 0,
            zoom: 1.0,
            pan: Vec2::ZERO,
            drag: None,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoom > 1.0
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// The collection may shrink behind our back; an out-of-range index
    /// silently falls back to the first image.
    pub fn sanitize_index(&mut self, len: usize) {
        if self.current_index >= len && self.current_index != 0 {
            log::debug!(
                "[viewer] index {} out of range for {} images, resetting",
                self.current_index,
                len
            );
            self.current_index = 0;
        }
    }

    pub fn next_image(&mut self, len: usize) {
        self.step_image(len, 1);
    }

    pub fn previous_image(&mut self, len: usize) {
        self.step_image(len, -1);
    }

    fn step_image(&mut self, len: usize, delta: i64) {
        if len <= 1 {
            return;
        }
        self.sanitize_index(len);
        let new_idx = (self.current_index as i64 + delta).rem_euclid(len as i64) as usize;
        log::debug!("[nav] move {} -> {}", self.current_index, new_idx);
        self.current_index = new_idx;
        self.reset_zoom();
    }

    pub fn zoom_in(&mut self) {
        self.adjust_zoom(ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.adjust_zoom(-ZOOM_STEP);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0;
        self.pan = Vec2::ZERO;
        self.drag = None;
    }

    /// Add `delta` to the zoom level, clamped. Falling back to 1.0 or below
    /// recentres the image and cancels any drag.
    pub fn adjust_zoom(&mut self, delta: f32) {
        self.set_zoom(self.zoom + delta);
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_nan() {
            return;
        }
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if self.zoom <= 1.0 {
            self.pan = Vec2::ZERO;
            self.drag = None;
        }
    }

    /// Pan writes are ignored while not zoomed in.
    pub fn set_pan(&mut self, pan: Vec2) {
        self.pan = if self.is_zoomed() { pan } else { Vec2::ZERO };
    }

    pub fn toggle_visibility(&self, visibility: &mut dyn VisibilityControl) {
        visibility.toggle_visibility();
    }

    pub fn begin_drag(&mut self, mouse: Vec2) {
        if !self.is_zoomed() {
            return;
        }
        self.drag = Some(DragAnchor {
            mouse,
            pan: self.pan,
        });
    }

    /// Move the pan opposite to the cursor displacement since the drag began.
    pub fn drag_to(&mut self, mouse: Vec2) {
        if let Some(anchor) = self.drag {
            self.set_pan(anchor.pan + (anchor.mouse - mouse));
        }
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }
}
