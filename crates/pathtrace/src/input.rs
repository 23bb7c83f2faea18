use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{Key, NamedKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    ResetAccumulation,
    Exit,
}

/// Maps a key press onto a host action. Releases and auto-repeats map to
/// nothing.
pub fn action_for_key_event(event: &KeyEvent) -> Option<InputAction> {
    if event.state != ElementState::Pressed || event.repeat {
        return None;
    }
    action_for_key(&event.logical_key)
}

pub fn action_for_key(key: &Key) -> Option<InputAction> {
    match key {
        Key::Named(NamedKey::Space) => Some(InputAction::ResetAccumulation),
        Key::Character(value) if value.as_str() == " " => Some(InputAction::ResetAccumulation),
        Key::Named(NamedKey::Escape) => Some(InputAction::Exit),
        _ => None,
    }
}
