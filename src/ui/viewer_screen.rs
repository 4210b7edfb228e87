use winit::keyboard::NamedKey;

use crate::gesture::GestureController;
use crate::input::Vec2;
use crate::keybind::KeybindRegistry;
use crate::layout::{DisplayLayout, Viewport, compute_display_size};
use crate::loader::{ImageLoader, ImageRef, PendingLoad};
use crate::ui::render::{GLYPH_SIZE, TEXT_SCALE, text_width};
use crate::ui::screen::{BAR_PADDING, DrawCommand, FrameContext, Rect, Screen};
use crate::viewer::{Action, ViewerState, VisibilityControl};

const VIEWPORT_BG: (u8, u8, u8, u8) = (18, 18, 18, 255);
const STATUS_BG: (u8, u8, u8, u8) = (0, 0, 0, 178);
const TEXT: (u8, u8, u8, u8) = (255, 255, 255, 255);
const ERROR_TEXT: (u8, u8, u8, u8) = (255, 80, 80, 255);
const MUTED_TEXT: (u8, u8, u8, u8) = (170, 170, 170, 255);

/// What the renderer should show in the viewport this frame.
///
/// `display_size` is `None` when the viewport or image has no renderable
/// size; the image is then skipped for the frame.
#[derive(Debug, Clone, Default)]
pub struct DisplayInstruction {
    pub image: Option<ImageRef>,
    pub display_size: Option<Vec2>,
    pub placeholder: Option<String>,
}

#[derive(Debug)]
enum Slot {
    Empty,
    Pending(PendingLoad),
    Loaded { index: usize, image: ImageRef },
    Failed { index: usize, message: String },
    Cleared { index: usize },
}

impl Slot {
    fn index(&self) -> Option<usize> {
        match self {
            Slot::Empty => None,
            Slot::Pending(p) => Some(p.index),
            Slot::Loaded { index, .. } | Slot::Failed { index, .. } | Slot::Cleared { index } => {
                Some(*index)
            }
        }
    }

    /// Viewport text for every state that has no image to draw.
    fn placeholder(&self, len: usize) -> Option<String> {
        match self {
            Slot::Loaded { .. } => None,
            Slot::Empty if len == 0 => Some("No images configured.".to_string()),
            Slot::Empty | Slot::Pending(_) => Some("Loading...".to_string()),
            Slot::Failed { message, .. } => Some(format!("Could not load: {message}")),
            Slot::Cleared { .. } => Some("Image cleared".to_string()),
        }
    }
}

pub struct ViewerScreen {
    state: ViewerState,
    keybinds: KeybindRegistry,
    gestures: GestureController,
    loader: ImageLoader,
    viewport: Viewport,
    slot: Slot,
    layout: Option<DisplayLayout>,
    show_info: bool,
}

impl ViewerScreen {
    pub fn new(keybinds: KeybindRegistry, loader: ImageLoader) -> Self {
        Self {
            state: ViewerState::new(),
            keybinds,
            gestures: GestureController::default(),
            loader,
            viewport: Viewport::default(),
            slot: Slot::Empty,
            layout: None,
            show_info: true,
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    /// The single entry point for discrete transitions.
    pub fn apply(&mut self, action: Action, images: &[String], visibility: &mut dyn VisibilityControl) {
        let len = images.len();
        match action {
            Action::NextImage => self.state.next_image(len),
            Action::PreviousImage => self.state.previous_image(len),
            Action::ZoomIn => self.state.zoom_in(),
            Action::ZoomOut => self.state.zoom_out(),
            Action::ResetZoom => self.state.reset_zoom(),
            Action::ToggleVisibility => self.state.toggle_visibility(visibility),
            Action::Reload => self.request_current(images),
            Action::Clear => {
                self.loader.invalidate();
                self.slot = Slot::Cleared {
                    index: self.state.current_index(),
                };
                log::info!("Image cleared");
            }
        }
    }

    fn request_current(&mut self, images: &[String]) {
        let index = self.state.current_index();
        match images.get(index) {
            Some(reference) => {
                self.slot = Slot::Pending(self.loader.request(index, reference));
            }
            None => {
                self.loader.invalidate();
                self.slot = Slot::Empty;
            }
        }
    }

    fn poll_loader(&mut self) {
        while let Some(outcome) = self.loader.poll() {
            let Slot::Pending(pending) = &self.slot else {
                continue;
            };
            if pending.generation != outcome.generation {
                continue;
            }
            self.slot = match outcome.result {
                Ok(image) => Slot::Loaded {
                    index: outcome.index,
                    image,
                },
                Err(e) => Slot::Failed {
                    index: outcome.index,
                    message: e.to_string(),
                },
            };
        }
    }

    /// Run one frame of viewer logic and describe the result.
    pub fn update(&mut self, ctx: &mut FrameContext<'_>) -> DisplayInstruction {
        let input = ctx.input;
        let len = ctx.images.len();
        self.state.sanitize_index(len);

        let mut actions = self.keybinds.triggered(input);
        if input.named_pressed(NamedKey::F5) {
            actions.push(Action::Reload);
        }
        if input.named_pressed(NamedKey::Delete) {
            actions.push(Action::Clear);
        }
        actions.append(&mut ctx.actions);
        for action in actions {
            self.apply(action, ctx.images, ctx.visibility);
        }
        if input.named_pressed(NamedKey::F2) {
            self.show_info = !self.show_info;
        }

        if len == 0 {
            if !matches!(self.slot, Slot::Empty) {
                self.loader.invalidate();
                self.slot = Slot::Empty;
            }
        } else if self.slot.index() != Some(self.state.current_index()) {
            self.request_current(ctx.images);
        }
        self.poll_loader();

        self.layout = None;
        if !ctx.visibility.is_visible() {
            return DisplayInstruction::default();
        }

        self.gestures.apply(&mut self.state, input);
        self.viewport.resize(input.viewport_size);

        let Slot::Loaded { image, .. } = &self.slot else {
            self.viewport.set_content(Vec2::ZERO);
            return DisplayInstruction {
                placeholder: self.slot.placeholder(len),
                ..DisplayInstruction::default()
            };
        };
        let layout = compute_display_size(
            self.viewport.size(),
            image.native_size(),
            ctx.allow_upscaling,
            self.state.zoom(),
        );
        // A degenerate frame draws nothing and must not clamp the pan.
        if let Some(layout) = layout {
            self.viewport.set_content(layout.size);
            self.gestures.read_back(&mut self.state, &mut self.viewport);
        }
        self.layout = layout;
        DisplayInstruction {
            image: Some(image.clone()),
            display_size: layout.map(|l| l.size),
            placeholder: None,
        }
    }

    fn status_line(&self, images: &[String]) -> String {
        let index = self.state.current_index();
        let reference = images.get(index).map(String::as_str).unwrap_or("");
        let mut line = format!("[{}/{}] {}", (index + 1).min(images.len()), images.len(), reference);
        if let (true, Slot::Loaded { image, .. }) = (self.show_info, &self.slot) {
            line.push_str(&format!(
                " | {}x{} {} {}",
                image.width,
                image.height,
                image.format_name,
                format_size(image.file_size)
            ));
            if let Some(layout) = &self.layout {
                line.push_str(&format!(
                    " | {}x{} ({:.1}%)",
                    layout.size.x as u32,
                    layout.size.y as u32,
                    layout.scale * 100.0
                ));
            }
        }
        if self.show_info {
            line.push_str(&format!(" | zoom {:.2}x", self.state.zoom()));
        }
        line
    }
}

fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    let b = bytes as f64;
    if b >= MIB {
        format!("{:.1} MB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}

impl Screen for ViewerScreen {
    fn frame(&mut self, ctx: &mut FrameContext<'_>) -> Vec<DrawCommand> {
        let instruction = self.update(ctx);
        let vp = ctx.layout.viewport;
        let line_h = (GLYPH_SIZE * TEXT_SCALE) as f32;
        let mut commands = vec![DrawCommand::Fill {
            rect: vp,
            color: VIEWPORT_BG,
        }];

        if !ctx.visibility.is_visible() {
            let chord = self
                .keybinds
                .chord_for(Action::ToggleVisibility)
                .map(ToString::to_string)
                .unwrap_or_default();
            commands.push(DrawCommand::Text {
                text: format!("Viewer hidden ({chord} to show)"),
                x: vp.x + 20.0,
                y: vp.y + vp.h / 2.0,
                color: MUTED_TEXT,
            });
            return commands;
        }

        if let (Some(image), Some(size)) = (instruction.image, instruction.display_size) {
            let origin = self.viewport.content_origin();
            commands.push(DrawCommand::Image {
                image,
                rect: Rect::new(vp.x + origin.x, vp.y + origin.y, size.x, size.y),
                clip: vp,
            });
        }
        if let Some(text) = instruction.placeholder {
            let color = if text.starts_with("Could not load") {
                ERROR_TEXT
            } else {
                TEXT
            };
            let x = (vp.x + (vp.w - text_width(&text)) / 2.0).max(vp.x + 20.0);
            commands.push(DrawCommand::Text {
                text,
                x,
                y: vp.y + (vp.h - line_h) / 2.0,
                color,
            });
        }

        let status = ctx.layout.status;
        commands.push(DrawCommand::Fill {
            rect: status,
            color: STATUS_BG,
        });
        commands.push(DrawCommand::Text {
            text: self.status_line(ctx.images),
            x: status.x + BAR_PADDING,
            y: status.y + BAR_PADDING / 2.0,
            color: TEXT,
        });
        commands
    }
}
