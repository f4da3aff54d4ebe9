//! Input collaborator. The interpreter only queries the `InputDevice` trait;
//! `InputState` is the default implementation a host feeds raw events into.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Went down this frame.
    Pressed,
    Held,
    /// Went up this frame.
    Released,
}

pub trait InputDevice {
    /// Commits the events received since the last call and ages the buffer.
    fn update(&mut self, dt: f64);

    fn action(&self, action: &str, phase: Phase) -> bool;
    fn key(&self, key: &str, phase: Phase) -> bool;
    fn mouse_button(&self, button: u32, phase: Phase) -> bool;
    fn mouse_position(&self) -> (f64, f64);
    fn touch(&self, phase: Phase) -> bool;
    fn touch_position(&self) -> (f64, f64);
    fn pad_button(&self, button: u32, phase: Phase) -> bool;
    fn pad_axis(&self, axis: u32) -> f64;

    /// Arms `action` in the timed buffer for `seconds`.
    fn buffer(&mut self, action: &str, seconds: f64);
    fn buffered(&self, action: &str) -> bool;
    /// Disarms `action`, reporting whether it was armed.
    fn consume(&mut self, action: &str) -> bool;
    /// Seconds left on `action`'s buffer entry, zero when not armed.
    fn peek_buffer(&self, action: &str) -> f64;
    fn clear_buffer(&mut self, action: &str);

    /// Lets a host reach its concrete device to push raw events.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// ─── Button tracking ──────────────────────────────────────────────────────────

/// Raw down/up events folded into per-frame edge sets.
#[derive(Debug, Clone)]
struct Buttons<T> {
    /// Live state as of the latest event.
    down: HashSet<T>,
    /// Everything that went down since the last commit, so a tap shorter
    /// than one frame still registers as pressed.
    tapped: HashSet<T>,
    held: HashSet<T>,
    pressed: HashSet<T>,
    released: HashSet<T>,
}

impl<T> Default for Buttons<T> {
    fn default() -> Self {
        Self {
            down: HashSet::new(),
            tapped: HashSet::new(),
            held: HashSet::new(),
            pressed: HashSet::new(),
            released: HashSet::new(),
        }
    }
}

impl<T: Eq + Hash + Clone> Buttons<T> {
    fn press(&mut self, b: T) {
        self.tapped.insert(b.clone());
        self.down.insert(b);
    }

    fn release(&mut self, b: &T) {
        self.down.remove(b);
    }

    fn commit(&mut self) {
        self.pressed = self.tapped.iter().filter(|b| !self.held.contains(*b)).cloned().collect();
        let mut released: HashSet<T> = self.held.iter().filter(|b| !self.down.contains(*b)).cloned().collect();
        // a tap that came and went inside one frame is pressed and released
        released.extend(self.tapped.iter().filter(|b| !self.down.contains(*b)).cloned());
        self.released = released;
        self.held = self.down.clone();
        self.tapped.clear();
    }

    fn query(&self, b: &T, phase: Phase) -> bool {
        match phase {
            Phase::Pressed  => self.pressed.contains(b),
            Phase::Held     => self.held.contains(b),
            Phase::Released => self.released.contains(b),
        }
    }
}

// ─── Bindings ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Key(String),
    Pad(u32),
}

impl From<&str> for Binding {
    fn from(key: &str) -> Self {
        Binding::Key(normalize_key(key))
    }
}

/// Key names compare case-insensitively.
fn normalize_key(key: &str) -> String {
    key.to_ascii_lowercase()
}

// ─── InputState ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct InputState {
    bindings: HashMap<String, Vec<Binding>>,
    keys: Buttons<String>,
    mouse: Buttons<u32>,
    pad: Buttons<u32>,
    touch: Buttons<u32>,
    mouse_pos: (f64, f64),
    touch_pos: (f64, f64),
    axes: HashMap<u32, f64>,
    buffer: HashMap<String, f64>,
}

impl InputState {
    pub fn new() -> Self { Self::default() }

    /// Arrow keys and WASD for movement, space / pad 0 to jump,
    /// enter, `z` or pad 1 for the action button.
    pub fn with_default_bindings() -> Self {
        let mut s = Self::new();
        s.bind("left",   ["arrowleft", "a"]);
        s.bind("right",  ["arrowright", "d"]);
        s.bind("up",     ["arrowup", "w"]);
        s.bind("down",   ["arrowdown", "s"]);
        s.bind("jump",   ["space"]);
        s.bind("action", ["enter", "z"]);
        s.bind_pad("jump", 0);
        s.bind_pad("action", 1);
        s
    }

    /// Adds keys to `action`, keeping existing bindings.
    pub fn bind<I, K>(&mut self, action: &str, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let entry = self.bindings.entry(action.to_string()).or_default();
        entry.extend(keys.into_iter().map(|k| Binding::from(k.as_ref())));
    }

    pub fn bind_pad(&mut self, action: &str, button: u32) {
        self.bindings.entry(action.to_string()).or_default().push(Binding::Pad(button));
    }

    pub fn unbind(&mut self, action: &str) {
        self.bindings.remove(action);
    }

    // ── host events ──────────────────────────────────────────────────────────

    pub fn key_down(&mut self, key: &str) { self.keys.press(normalize_key(key)); }
    pub fn key_up(&mut self, key: &str) { self.keys.release(&normalize_key(key)); }

    pub fn mouse_move(&mut self, x: f64, y: f64) { self.mouse_pos = (x, y); }
    pub fn mouse_down(&mut self, button: u32) { self.mouse.press(button); }
    pub fn mouse_up(&mut self, button: u32) { self.mouse.release(&button); }

    pub fn touch_start(&mut self, x: f64, y: f64) {
        self.touch_pos = (x, y);
        self.touch.press(0);
    }
    pub fn touch_move(&mut self, x: f64, y: f64) { self.touch_pos = (x, y); }
    pub fn touch_end(&mut self) { self.touch.release(&0); }

    pub fn pad_down(&mut self, button: u32) { self.pad.press(button); }
    pub fn pad_up(&mut self, button: u32) { self.pad.release(&button); }
    pub fn set_pad_axis(&mut self, axis: u32, value: f64) {
        self.axes.insert(axis, value.clamp(-1.0, 1.0));
    }

    fn binding(&self, b: &Binding, phase: Phase) -> bool {
        match b {
            Binding::Key(k) => self.keys.query(k, phase),
            Binding::Pad(p) => self.pad.query(p, phase),
        }
    }
}

impl InputDevice for InputState {
    fn update(&mut self, dt: f64) {
        self.keys.commit();
        self.mouse.commit();
        self.pad.commit();
        self.touch.commit();
        self.buffer.retain(|_, left| {
            *left -= dt;
            *left > 0.0
        });
    }

    fn action(&self, action: &str, phase: Phase) -> bool {
        let Some(bindings) = self.bindings.get(action) else { return false };
        match phase {
            // released only once nothing bound to the action is still held
            Phase::Released => {
                bindings.iter().any(|b| self.binding(b, Phase::Released))
                    && !bindings.iter().any(|b| self.binding(b, Phase::Held))
            }
            _ => bindings.iter().any(|b| self.binding(b, phase)),
        }
    }

    fn key(&self, key: &str, phase: Phase) -> bool {
        self.keys.query(&normalize_key(key), phase)
    }

    fn mouse_button(&self, button: u32, phase: Phase) -> bool {
        self.mouse.query(&button, phase)
    }

    fn mouse_position(&self) -> (f64, f64) { self.mouse_pos }

    fn touch(&self, phase: Phase) -> bool { self.touch.query(&0, phase) }

    fn touch_position(&self) -> (f64, f64) { self.touch_pos }

    fn pad_button(&self, button: u32, phase: Phase) -> bool {
        self.pad.query(&button, phase)
    }

    fn pad_axis(&self, axis: u32) -> f64 {
        self.axes.get(&axis).copied().unwrap_or(0.0)
    }

    fn buffer(&mut self, action: &str, seconds: f64) {
        if seconds > 0.0 {
            self.buffer.insert(action.to_string(), seconds);
        }
    }

    fn buffered(&self, action: &str) -> bool {
        self.buffer.contains_key(action)
    }

    fn consume(&mut self, action: &str) -> bool {
        self.buffer.remove(action).is_some()
    }

    fn peek_buffer(&self, action: &str) -> f64 {
        self.buffer.get(action).copied().unwrap_or(0.0)
    }

    fn clear_buffer(&mut self, action: &str) {
        self.buffer.remove(action);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_edges_follow_frames() {
        let mut s = InputState::new();
        s.key_down("Space");
        s.update(0.016);
        assert!(s.key("space", Phase::Pressed));
        assert!(s.key("space", Phase::Held));

        s.update(0.016);
        assert!(!s.key("space", Phase::Pressed));
        assert!(s.key("space", Phase::Held));

        s.key_up("SPACE");
        s.update(0.016);
        assert!(s.key("space", Phase::Released));
        assert!(!s.key("space", Phase::Held));

        s.update(0.016);
        assert!(!s.key("space", Phase::Released));
    }

    #[test]
    fn tap_within_one_frame_is_seen() {
        let mut s = InputState::new();
        s.mouse_down(0);
        s.mouse_up(0);
        s.update(0.016);
        assert!(s.mouse_button(0, Phase::Pressed));
        assert!(s.mouse_button(0, Phase::Released));
        assert!(!s.mouse_button(0, Phase::Held));
    }

    #[test]
    fn actions_use_default_bindings() {
        let mut s = InputState::with_default_bindings();
        s.key_down("a");
        s.update(0.016);
        assert!(s.action("left", Phase::Pressed));
        assert!(!s.action("right", Phase::Held));

        s.pad_down(0);
        s.update(0.016);
        assert!(s.action("jump", Phase::Pressed));
        assert!(!s.action("missing", Phase::Held));
    }

    #[test]
    fn action_release_waits_for_all_bindings() {
        let mut s = InputState::with_default_bindings();
        s.key_down("a");
        s.key_down("ArrowLeft");
        s.update(0.016);
        s.key_up("a");
        s.update(0.016);
        assert!(!s.action("left", Phase::Released));
        s.key_up("ArrowLeft");
        s.update(0.016);
        assert!(s.action("left", Phase::Released));
    }

    #[test]
    fn buffer_expires_and_consumes() {
        let mut s = InputState::new();
        s.buffer("jump", 0.1);
        assert!(s.buffered("jump"));
        s.update(0.05);
        assert!((s.peek_buffer("jump") - 0.05).abs() < 1e-9);
        s.update(0.06);
        assert!(!s.buffered("jump"));

        s.buffer("jump", 1.0);
        assert!(s.consume("jump"));
        assert!(!s.consume("jump"));
        s.buffer("dash", 1.0);
        s.clear_buffer("dash");
        assert_eq!(s.peek_buffer("dash"), 0.0);
    }

    #[test]
    fn pointer_and_axes() {
        let mut s = InputState::new();
        s.mouse_move(10.0, 20.0);
        s.touch_start(3.0, 4.0);
        s.set_pad_axis(1, 2.0);
        s.update(0.016);
        assert_eq!(s.mouse_position(), (10.0, 20.0));
        assert_eq!(s.touch_position(), (3.0, 4.0));
        assert!(s.touch(Phase::Pressed));
        assert_eq!(s.pad_axis(1), 1.0);
        assert_eq!(s.pad_axis(7), 0.0);
    }
}
