use std::collections::{HashMap, HashSet};

use winit::event::{ElementState, MouseButton as WinitMouseButton};
pub use winit::keyboard::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub const ALL: [MouseButton; 3] = [MouseButton::Left, MouseButton::Right, MouseButton::Middle];

    const fn index(self) -> usize {
        match self {
            MouseButton::Left => 0,
            MouseButton::Right => 1,
            MouseButton::Middle => 2,
        }
    }

    fn from_winit(button: WinitMouseButton) -> Option<Self> {
        match button {
            WinitMouseButton::Left => Some(MouseButton::Left),
            WinitMouseButton::Right => Some(MouseButton::Right),
            WinitMouseButton::Middle => Some(MouseButton::Middle),
            _ => None,
        }
    }
}

/// Edge-triggered state of one key or button for a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub pressed: bool,
    pub held: bool,
    pub released: bool,
}

/// Raw input captured for one update tick. Cursor coordinates are in base
/// resolution pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,
    mouse: [ButtonState; 3],
    cursor: Option<(f32, f32)>,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_key_pressed(mut self, key: KeyCode) -> Self {
        self.keys_pressed.insert(key);
        self.keys_down.insert(key);
        self
    }

    pub fn with_key_held(mut self, key: KeyCode) -> Self {
        self.keys_down.insert(key);
        self
    }

    pub fn with_key_released(mut self, key: KeyCode) -> Self {
        self.keys_released.insert(key);
        self.keys_down.remove(&key);
        self
    }

    pub fn with_mouse_button(mut self, button: MouseButton, state: ButtonState) -> Self {
        self.mouse[button.index()] = state;
        self
    }

    pub fn with_cursor(mut self, cursor: Option<(f32, f32)>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn key(&self, key: KeyCode) -> ButtonState {
        ButtonState {
            pressed: self.keys_pressed.contains(&key),
            held: self.keys_down.contains(&key),
            released: self.keys_released.contains(&key),
        }
    }

    pub fn mouse(&self, button: MouseButton) -> ButtonState {
        self.mouse[button.index()]
    }

    pub fn cursor(&self) -> Option<(f32, f32)> {
        self.cursor
    }
}

/// Accumulates window events between ticks and hands out one snapshot per
/// tick, clearing the edges it reported.
#[derive(Debug, Default)]
pub struct InputCollector {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,
    mouse_down: [bool; 3],
    mouse_pressed: [bool; 3],
    mouse_released: [bool; 3],
    cursor: Option<(f32, f32)>,
}

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_key(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.keys_down.insert(key) {
                    self.keys_pressed.insert(key);
                }
            }
            ElementState::Released => {
                if self.keys_down.remove(&key) {
                    self.keys_released.insert(key);
                }
            }
        }
    }

    pub fn handle_mouse_button(&mut self, button: WinitMouseButton, state: ElementState) {
        let Some(button) = MouseButton::from_winit(button) else {
            return;
        };
        let index = button.index();
        match state {
            ElementState::Pressed => {
                if !self.mouse_down[index] {
                    self.mouse_pressed[index] = true;
                }
                self.mouse_down[index] = true;
            }
            ElementState::Released => {
                if self.mouse_down[index] {
                    self.mouse_released[index] = true;
                }
                self.mouse_down[index] = false;
            }
        }
    }

    pub fn set_cursor(&mut self, cursor: Option<(f32, f32)>) {
        self.cursor = cursor;
    }

    /// Releases everything still held, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        let held: Vec<KeyCode> = self.keys_down.drain().collect();
        self.keys_released.extend(held);
        for index in 0..3 {
            if self.mouse_down[index] {
                self.mouse_released[index] = true;
            }
            self.mouse_down[index] = false;
        }
    }

    pub fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let mut mouse = [ButtonState::default(); 3];
        for (index, state) in mouse.iter_mut().enumerate() {
            *state = ButtonState {
                pressed: self.mouse_pressed[index],
                held: self.mouse_down[index],
                released: self.mouse_released[index],
            };
        }
        self.mouse_pressed = [false; 3];
        self.mouse_released = [false; 3];
        InputSnapshot {
            keys_down: self.keys_down.clone(),
            keys_pressed: std::mem::take(&mut self.keys_pressed),
            keys_released: std::mem::take(&mut self.keys_released),
            mouse,
            cursor: self.cursor,
        }
    }
}

/// Named inputs bound to keys, refreshed once per tick.
#[derive(Debug, Clone, Default)]
pub struct InputHandler {
    bindings: Vec<(String, KeyCode)>,
    states: HashMap<String, ButtonState>,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Several keys may feed the same name; any of them counts.
    pub fn map_input(&mut self, name: impl Into<String>, key: KeyCode) {
        let name = name.into();
        self.states.entry(name.clone()).or_default();
        self.bindings.push((name, key));
    }

    pub fn update(&mut self, snapshot: &InputSnapshot) {
        for state in self.states.values_mut() {
            *state = ButtonState::default();
        }
        for (name, key) in &self.bindings {
            let key_state = snapshot.key(*key);
            let state = self.states.entry(name.clone()).or_default();
            state.pressed |= key_state.pressed;
            state.held |= key_state.held;
            state.released |= key_state.released;
        }
    }

    pub fn state(&self, name: &str) -> ButtonState {
        self.states.get(name).copied().unwrap_or_default()
    }

    pub fn pressed(&self, name: &str) -> bool {
        self.state(name).pressed
    }

    pub fn held(&self, name: &str) -> bool {
        self.state(name).held
    }

    pub fn released(&self, name: &str) -> bool {
        self.state(name).released
    }
}
