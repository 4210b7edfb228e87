use winit::event::MouseButton;

use crate::ui::render::{GLYPH_SIZE, TEXT_SCALE, text_width};
use crate::ui::screen::{BAR_PADDING, DrawCommand, FrameContext, Rect, Screen};
use crate::viewer::Action;

const BAR_BG: (u8, u8, u8, u8) = (45, 45, 45, 255);
const BUTTON_BG: (u8, u8, u8, u8) = (70, 70, 70, 255);
const BUTTON_HOVER: (u8, u8, u8, u8) = (100, 100, 110, 255);
const LABEL: (u8, u8, u8, u8) = (235, 235, 235, 255);

const BUTTONS: &[(&str, Action)] = &[
    ("< Prev", Action::PreviousImage),
    ("Next >", Action::NextImage),
    ("Zoom +", Action::ZoomIn),
    ("Zoom -", Action::ZoomOut),
    ("Reset", Action::ResetZoom),
    ("Reload", Action::Reload),
    ("Clear", Action::Clear),
    ("Hide", Action::ToggleVisibility),
];

/// Row of clickable buttons. Clicks are queued as actions for the viewer
/// screen, so buttons and keybinds share one code path.
#[derive(Debug, Default)]
pub struct Toolbar;

impl Toolbar {
    fn label(action: Action, text: &'static str, visible: bool) -> &'static str {
        match action {
            Action::ToggleVisibility if !visible => "Show",
            _ => text,
        }
    }

    /// Button rectangles laid out left to right inside `bar`.
    pub fn buttons(bar: Rect, visible: bool) -> Vec<(Rect, &'static str, Action)> {
        let mut x = bar.x + BAR_PADDING;
        BUTTONS
            .iter()
            .map(|&(text, action)| {
                let label = Self::label(action, text, visible);
                let w = text_width(label) + 2.0 * BAR_PADDING;
                let rect = Rect::new(x, bar.y + BAR_PADDING / 2.0, w, bar.h - BAR_PADDING);
                x += w + BAR_PADDING;
                (rect, label, action)
            })
            .collect()
    }
}

impl Screen for Toolbar {
    fn frame(&mut self, ctx: &mut FrameContext<'_>) -> Vec<DrawCommand> {
        let bar = ctx.layout.toolbar;
        let mouse = ctx.input.mouse_pos;
        let clicked = ctx.input.button_pressed(MouseButton::Left);
        let mut commands = vec![DrawCommand::Fill {
            rect: bar,
            color: BAR_BG,
        }];

        for (rect, label, action) in Self::buttons(bar, ctx.visibility.is_visible()) {
            let hovered = rect.contains(mouse);
            if hovered && clicked {
                log::debug!("[toolbar] {}", action.describe());
                ctx.actions.push(action);
            }
            commands.push(DrawCommand::Fill {
                rect,
                color: if hovered { BUTTON_HOVER } else { BUTTON_BG },
            });
            commands.push(DrawCommand::Text {
                text: label.to_string(),
                x: rect.x + BAR_PADDING,
                y: rect.y + (rect.h - (GLYPH_SIZE * TEXT_SCALE) as f32) / 2.0,
                color: LABEL,
            });
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputSnapshot, Vec2};
    use crate::ui::screen::WindowLayout;
    use crate::ui::screen::tests::Panel;

    fn click_at(p: Vec2) -> InputSnapshot {
        let mut input = InputSnapshot::new();
        input.mouse_pos = p;
        input.press_button(MouseButton::Left);
        input
    }

    fn centre(r: Rect) -> Vec2 {
        Vec2::new(r.x + r.w / 2.0, r.y + r.h / 2.0)
    }

    #[test]
    fn buttons_do_not_overlap() {
        let bar = WindowLayout::split(1280.0, 720.0).toolbar;
        let buttons = Toolbar::buttons(bar, true);
        assert_eq!(buttons.len(), BUTTONS.len());
        for pair in buttons.windows(2) {
            assert!(pair[0].0.x + pair[0].0.w <= pair[1].0.x);
        }
    }

    #[test]
    fn click_queues_action() {
        let layout = WindowLayout::split(1280.0, 720.0);
        let (next_rect, _, _) = Toolbar::buttons(layout.toolbar, true)
            .into_iter()
            .find(|(_, _, a)| *a == Action::NextImage)
            .expect("next button");
        let input = click_at(centre(next_rect));
        let mut panel = Panel(true);
        let mut ctx = FrameContext {
            input: &input,
            images: &[],
            allow_upscaling: false,
            layout,
            visibility: &mut panel,
            actions: Vec::new(),
        };
        Toolbar.frame(&mut ctx);
        assert_eq!(ctx.actions, vec![Action::NextImage]);
    }

    #[test]
    fn hover_without_click_does_nothing() {
        let layout = WindowLayout::split(1280.0, 720.0);
        let (rect, _, _) = Toolbar::buttons(layout.toolbar, true)[0];
        let mut input = InputSnapshot::new();
        input.mouse_pos = centre(rect);
        let mut panel = Panel(true);
        let mut ctx = FrameContext {
            input: &input,
            images: &[],
            allow_upscaling: false,
            layout,
            visibility: &mut panel,
            actions: Vec::new(),
        };
        Toolbar.frame(&mut ctx);
        assert!(ctx.actions.is_empty());
    }

    #[test]
    fn hide_button_relabels_when_hidden() {
        let bar = WindowLayout::split(1280.0, 720.0).toolbar;
        let labels: Vec<_> = Toolbar::buttons(bar, false)
            .into_iter()
            .map(|(_, label, _)| label)
            .collect();
        assert!(labels.contains(&"Show"));
        assert!(!labels.contains(&"Hide"));
    }
}
