use winit::keyboard::NamedKey;

use crate::cli::HELP_KEYS;
use crate::keybind::KeybindRegistry;
use crate::ui::render::{GLYPH_SIZE, TEXT_SCALE};
use crate::ui::screen::{DrawCommand, FrameContext, Screen};

/// Full-window help overlay, toggled with F1.
#[derive(Debug)]
pub struct HelpOverlay {
    lines: Vec<String>,
    visible: bool,
}

impl HelpOverlay {
    pub fn new(keybinds: &KeybindRegistry) -> Self {
        let mut lines: Vec<String> = HELP_KEYS.lines().map(str::to_string).collect();
        lines.push(String::new());
        lines.push("Current chords:".to_string());
        for binding in keybinds.bindings() {
            let mut line = format!("  {:<16}: {}", binding.action.describe(), binding.keybind);
            if let Some(problem) = &binding.problem {
                line.push_str(&format!("  (disabled: {problem})"));
            }
            lines.push(line);
        }
        Self {
            lines,
            visible: false,
        }
    }
}

impl Screen for HelpOverlay {
    fn frame(&mut self, ctx: &mut FrameContext<'_>) -> Vec<DrawCommand> {
        if ctx.input.named_pressed(NamedKey::F1) {
            self.visible = !self.visible;
        }
        if !self.visible {
            return Vec::new();
        }

        let line_h = (GLYPH_SIZE * TEXT_SCALE + 8) as f32;
        let mut commands = vec![DrawCommand::Fill {
            rect: ctx.layout.window,
            color: (0, 0, 0, 200),
        }];
        commands.extend(self.lines.iter().enumerate().map(|(i, line)| DrawCommand::Text {
            text: line.clone(),
            x: 20.0,
            y: 20.0 + i as f32 * line_h,
            color: (255, 255, 255, 255),
        }));
        commands
    }
}
