use std::num::NonZeroU32;
use std::sync::Arc;
use softbuffer::Surface;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::keyboard::{Key as WinitKey, KeyCode, NamedKey, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::config::Config;
use crate::input::{InputSnapshot, Key, Modifiers, Vec2};
use crate::keybind::KeybindRegistry;
use crate::loader::ImageLoader;
use crate::ui::help::HelpOverlay;
use crate::ui::screen::{FrameContext, Screen, WindowLayout};
use crate::ui::toolbar::Toolbar;
use crate::ui::viewer_screen::ViewerScreen;
use crate::viewer::VisibilityControl;

pub mod help;
pub mod render;
pub mod screen;
pub mod toolbar;
pub mod viewer_screen;

// ---------------------------------------------------------------------------
// User event for waking the UI from loader threads
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum UserEvent {
    LoadFinished,
}

/// The viewer panel's visibility. Hiding keeps the window (and its input)
/// alive so the toggle chord can bring the panel back.
#[derive(Debug)]
pub struct PanelVisibility {
    visible: bool,
}

impl VisibilityControl for PanelVisibility {
    fn toggle_visibility(&mut self) {
        self.visible = !self.visible;
        log::info!("Viewer {}", if self.visible { "shown" } else { "hidden" });
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

// ---------------------------------------------------------------------------
// Application handler (winit 0.30 style)
// ---------------------------------------------------------------------------

pub struct App {
    screens: Vec<Box<dyn Screen>>,
    input: InputSnapshot,
    cursor_inside: bool,
    images: Vec<String>,
    allow_upscaling: bool,
    window_movable: bool,
    visibility: PanelVisibility,
    window: Option<Arc<Window>>,
    context: Option<softbuffer::Context<Arc<Window>>>,
    surface: Option<Surface<Arc<Window>, Arc<Window>>>,
}

impl App {
    pub fn new(config: Config, keybinds: KeybindRegistry, loader: ImageLoader) -> Self {
        let help = HelpOverlay::new(&keybinds);
        let screens: Vec<Box<dyn Screen>> = vec![
            Box::new(Toolbar),
            Box::new(ViewerScreen::new(keybinds, loader)),
            Box::new(help),
        ];
        let mut input = InputSnapshot::new();
        input.viewport_focused = true;
        Self {
            screens,
            input,
            cursor_inside: false,
            images: config.images,
            allow_upscaling: config.allow_upscaling,
            window_movable: config.window_movable,
            visibility: PanelVisibility { visible: true },
            window: None,
            context: None,
            surface: None,
        }
    }

    fn request_redraw(&self) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn window_layout(&self) -> WindowLayout {
        let size = self
            .window
            .as_ref()
            .map(|w| w.inner_size())
            .unwrap_or(PhysicalSize::new(0, 0));
        WindowLayout::split(size.width as f32, size.height as f32)
    }

    /// Run every screen for one frame and present the result.
    fn run_frame(&mut self) {
        let layout = self.window_layout();
        self.input.viewport_size = layout.viewport.size();
        self.input.viewport_hovered =
            self.cursor_inside && layout.viewport.contains(self.input.mouse_pos);

        let mut ctx = FrameContext {
            input: &self.input,
            images: &self.images,
            allow_upscaling: self.allow_upscaling,
            layout,
            visibility: &mut self.visibility,
            actions: Vec::new(),
        };
        let commands: Vec<_> = self
            .screens
            .iter_mut()
            .flat_map(|screen| screen.frame(&mut ctx))
            .collect();

        if let (Some(window), Some(surface)) = (self.window.as_ref(), self.surface.as_mut()) {
            let size = window.inner_size();
            let fb_w = size.width.max(1);
            let fb_h = size.height.max(1);
            match surface.buffer_mut() {
                Ok(mut buffer) => {
                    render::draw(&mut buffer, fb_w, fb_h, &commands);
                    if let Err(e) = buffer.present() {
                        log::warn!("present failed: {}", e);
                    }
                }
                Err(e) => log::warn!("no framebuffer this frame: {}", e),
            }
        }

        self.input.end_frame();
    }
}

const LETTER_KEYS: [(KeyCode, char); 26] = [
    (KeyCode::KeyA, 'a'),
    (KeyCode::KeyB, 'b'),
    (KeyCode::KeyC, 'c'),
    (KeyCode::KeyD, 'd'),
    (KeyCode::KeyE, 'e'),
    (KeyCode::KeyF, 'f'),
    (KeyCode::KeyG, 'g'),
    (KeyCode::KeyH, 'h'),
    (KeyCode::KeyI, 'i'),
    (KeyCode::KeyJ, 'j'),
    (KeyCode::KeyK, 'k'),
    (KeyCode::KeyL, 'l'),
    (KeyCode::KeyM, 'm'),
    (KeyCode::KeyN, 'n'),
    (KeyCode::KeyO, 'o'),
    (KeyCode::KeyP, 'p'),
    (KeyCode::KeyQ, 'q'),
    (KeyCode::KeyR, 'r'),
    (KeyCode::KeyS, 's'),
    (KeyCode::KeyT, 't'),
    (KeyCode::KeyU, 'u'),
    (KeyCode::KeyV, 'v'),
    (KeyCode::KeyW, 'w'),
    (KeyCode::KeyX, 'x'),
    (KeyCode::KeyY, 'y'),
    (KeyCode::KeyZ, 'z'),
];

/// Letter keys come from the physical position so chords keep working on
/// non-Latin layouts and with Option-composed glyphs on macOS.
fn translate_key(physical: PhysicalKey, logical: &WinitKey) -> Option<Key> {
    if let PhysicalKey::Code(code) = physical {
        if let Some((_, c)) = LETTER_KEYS.iter().find(|(k, _)| *k == code) {
            return Some(Key::Char(*c));
        }
    }
    match logical {
        WinitKey::Named(named) => Some(Key::Named(*named)),
        WinitKey::Character(s) => s.chars().next().map(Key::Char),
        _ => None,
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title("multiview")
            .with_inner_size(LogicalSize::new(1280u32, 720u32))
            .with_decorations(self.window_movable);
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));
        let context = softbuffer::Context::new(Arc::clone(&window)).expect("create context");
        let surface = Surface::new(&context, Arc::clone(&window)).expect("create surface");

        log::info!("Viewing {} image(s)", self.images.len());
        window.request_redraw();
        self.window = Some(window);
        self.context = Some(context);
        self.surface = Some(surface);
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::LoadFinished => self.request_redraw(),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let (Some(surface), Some(w), Some(h)) = (
                    self.surface.as_mut(),
                    NonZeroU32::new(width),
                    NonZeroU32::new(height),
                ) {
                    if let Err(e) = surface.resize(w, h) {
                        log::warn!("surface resize failed: {}", e);
                    }
                }
                self.request_redraw();
            }

            WindowEvent::Focused(false) => {
                self.input.keys_down.clear();
                self.input.buttons_down.clear();
                self.input.modifiers = Modifiers::default();
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                let state = modifiers.state();
                self.input.modifiers = Modifiers {
                    ctrl: state.control_key(),
                    shift: state.shift_key(),
                    alt: state.alt_key(),
                };
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.logical_key == WinitKey::Named(NamedKey::Escape)
                    && event.state == ElementState::Pressed
                {
                    event_loop.exit();
                    return;
                }
                if let Some(key) = translate_key(event.physical_key, &event.logical_key) {
                    match event.state {
                        ElementState::Pressed => self.input.press_key(key, event.repeat),
                        ElementState::Released => self.input.release_key(key),
                    }
                }
                self.request_redraw();
            }

            WindowEvent::MouseInput { state, button, .. } => {
                match state {
                    ElementState::Pressed => {
                        let layout = self.window_layout();
                        self.input.viewport_focused =
                            layout.viewport.contains(self.input.mouse_pos);
                        self.input.press_button(button);
                    }
                    ElementState::Released => self.input.release_button(button),
                }
                self.request_redraw();
            }

            WindowEvent::CursorEntered { .. } => {
                self.cursor_inside = true;
            }

            WindowEvent::CursorLeft { .. } => {
                self.cursor_inside = false;
                self.request_redraw();
            }

            WindowEvent::CursorMoved {
                position: PhysicalPosition { x, y },
                ..
            } => {
                self.cursor_inside = true;
                self.input.mouse_pos = Vec2::new(x as f32, y as f32);
                self.request_redraw();
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => y as f32 / 40.0,
                };
                self.input.wheel_ticks += y;
                self.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                self.run_frame();
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
    }
}
