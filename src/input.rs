use std::collections::HashSet;
use std::ops::{Add, Sub};
use winit::event::MouseButton;
use winit::keyboard::NamedKey;

// ---------------------------------------------------------------------------
// Shared geometry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

// ---------------------------------------------------------------------------
// Per-frame input snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

/// A key as the viewer sees it. Characters are always stored lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Named(NamedKey),
}

/// Everything the host reports for one frame.
///
/// `*_pressed` and `buttons_released` are edges: they hold only the
/// transitions seen since the previous frame and are cleared by
/// [`InputSnapshot::end_frame`]. `*_down` sets are levels.
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    pub modifiers: Modifiers,
    pub keys_pressed: HashSet<Key>,
    pub keys_down: HashSet<Key>,
    pub mouse_pos: Vec2,
    pub buttons_pressed: HashSet<MouseButton>,
    pub buttons_down: HashSet<MouseButton>,
    pub buttons_released: HashSet<MouseButton>,
    pub wheel_ticks: f32,
    pub viewport_hovered: bool,
    pub viewport_focused: bool,
    pub viewport_size: Vec2,
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press. Auto-repeat presses keep the key down but never
    /// produce a second edge.
    pub fn press_key(&mut self, key: Key, repeat: bool) {
        let key = lowercase(key);
        if !repeat && !self.keys_down.contains(&key) {
            self.keys_pressed.insert(key);
        }
        self.keys_down.insert(key);
    }

    pub fn release_key(&mut self, key: Key) {
        self.keys_down.remove(&lowercase(key));
    }

    pub fn press_button(&mut self, button: MouseButton) {
        if self.buttons_down.insert(button) {
            self.buttons_pressed.insert(button);
        }
    }

    pub fn release_button(&mut self, button: MouseButton) {
        if self.buttons_down.remove(&button) {
            self.buttons_released.insert(button);
        }
    }

    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&lowercase(key))
    }

    pub fn named_pressed(&self, key: NamedKey) -> bool {
        self.keys_pressed.contains(&Key::Named(key))
    }

    pub fn button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    pub fn button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    pub fn button_released(&self, button: MouseButton) -> bool {
        self.buttons_released.contains(&button)
    }

    /// Drop all edges and the wheel accumulator once a frame has consumed them.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
        self.wheel_ticks = 0.0;
    }
}

fn lowercase(key: Key) -> Key {
    match key {
        Key::Char(c) => Key::Char(c.to_ascii_lowercase()),
        named => named,
    }
}
