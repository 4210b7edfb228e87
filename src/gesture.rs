use winit::event::MouseButton;
use winit::keyboard::NamedKey;

use crate::input::{InputSnapshot, Vec2};
use crate::layout::ScrollSurface;
use crate::viewer::ViewerState;

pub const WHEEL_ZOOM_STEP: f32 = 0.25;
pub const PAN_STEP: f32 = 50.0;

/// Continuous input: wheel zoom, secondary-button drag, arrow-key panning.
///
/// All state lives in [`ViewerState`]; the controller only holds its step
/// sizes, so it can be shared or rebuilt freely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureController {
    pub wheel_step: f32,
    pub pan_step: f32,
    pub drag_button: MouseButton,
}

impl Default for GestureController {
    fn default() -> Self {
        Self {
            wheel_step: WHEEL_ZOOM_STEP,
            pan_step: PAN_STEP,
            drag_button: MouseButton::Right,
        }
    }
}

impl GestureController {
    /// Apply this frame's continuous input. The pan offset written here is
    /// provisional until [`read_back`](Self::read_back) clamps it.
    pub fn apply(&self, state: &mut ViewerState, input: &InputSnapshot) {
        if input.viewport_hovered && input.wheel_ticks != 0.0 {
            state.adjust_zoom(input.wheel_ticks * self.wheel_step);
        }

        if input.viewport_hovered && state.is_zoomed() && input.button_pressed(self.drag_button) {
            state.begin_drag(input.mouse_pos);
        }
        if state.is_dragging() {
            if input.button_released(self.drag_button) || !input.button_down(self.drag_button) {
                state.end_drag();
            } else {
                state.drag_to(input.mouse_pos);
            }
        }

        if input.viewport_focused && state.is_zoomed() {
            let step = self.pan_step;
            let mut delta = Vec2::ZERO;
            if input.named_pressed(NamedKey::ArrowLeft) {
                delta.x -= step;
            }
            if input.named_pressed(NamedKey::ArrowRight) {
                delta.x += step;
            }
            if input.named_pressed(NamedKey::ArrowUp) {
                delta.y -= step;
            }
            if input.named_pressed(NamedKey::ArrowDown) {
                delta.y += step;
            }
            if delta != Vec2::ZERO {
                state.set_pan(state.pan() + delta);
            }
        }
    }

    /// Push the pan offset to the surface and adopt whatever it clamped it
    /// to, so the two never drift apart.
    pub fn read_back(&self, state: &mut ViewerState, surface: &mut dyn ScrollSurface) {
        let applied = surface.scroll_to(state.pan());
        if applied != state.pan() {
            log::trace!(
                "[pan] surface clamped ({:.1},{:.1}) -> ({:.1},{:.1})",
                state.pan().x,
                state.pan().y,
                applied.x,
                applied.y
            );
            state.set_pan(applied);
        }
    }
}
