//! Keyboard, mouse and touch mapped onto tour input.

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::input::touch::Touches;
use bevy::prelude::*;
use bevy::window::{CursorLeft, PrimaryWindow};
use journey_core::{SpeedPreset, SurfaceRect, TourInput};

use crate::tour::{TourSet, TourState};

/// Lines per wheel notch when the device reports pixels.
const PIXELS_PER_LINE: f32 = 40.0;

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (track_surface, queue_keyboard, queue_pointer, queue_touch)
                .chain()
                .in_set(TourSet::Input),
        );
    }
}

/// Maps a key press to tour input. `shift` selects `?` and `+`.
pub fn map_key(key: KeyCode, shift: bool) -> Option<TourInput> {
    let input = match key {
        KeyCode::Digit1 | KeyCode::Numpad1 => TourInput::SetSpeed(SpeedPreset::Normal),
        KeyCode::Digit2 | KeyCode::Numpad2 => TourInput::SetSpeed(SpeedPreset::Fast),
        KeyCode::KeyP => TourInput::ToggleParticles,
        KeyCode::KeyK => TourInput::ToggleKpMeter,
        KeyCode::KeyN => TourInput::ToggleNarration,
        KeyCode::KeyF => TourInput::ToggleFreeCam,
        KeyCode::KeyA => TourInput::ToggleAutoPlay,
        KeyCode::KeyL => TourInput::ToggleLive,
        KeyCode::ArrowRight | KeyCode::Space => TourInput::Advance,
        KeyCode::ArrowLeft => TourInput::Retreat,
        KeyCode::Equal | KeyCode::NumpadAdd => TourInput::ZoomIn,
        KeyCode::Minus | KeyCode::NumpadSubtract => TourInput::ZoomOut,
        KeyCode::Slash if shift => TourInput::ToggleHelp,
        KeyCode::Escape | KeyCode::KeyQ => TourInput::Exit,
        _ => return None,
    };
    Some(input)
}

/// Wheel delta in lines, positive when scrolling down.
pub fn wheel_delta(event: &MouseWheel) -> f32 {
    let lines = match event.unit {
        MouseScrollUnit::Line => event.y,
        MouseScrollUnit::Pixel => event.y / PIXELS_PER_LINE,
    };
    -lines
}

fn track_surface(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut tour: ResMut<TourState>,
    mut last: Local<Option<SurfaceRect>>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let surface = SurfaceRect::new(window.width(), window.height());
    if *last != Some(surface) {
        *last = Some(surface);
        tour.context.push_input(TourInput::Resize(surface));
    }
}

fn queue_keyboard(keyboard: Res<ButtonInput<KeyCode>>, mut tour: ResMut<TourState>) {
    let shift = keyboard.pressed(KeyCode::ShiftLeft) || keyboard.pressed(KeyCode::ShiftRight);
    for key in keyboard.get_just_pressed() {
        if let Some(input) = map_key(*key, shift) {
            tour.context.push_input(input);
        }
    }
}

fn queue_pointer(
    mut tour: ResMut<TourState>,
    mut cursor_moved: EventReader<CursorMoved>,
    mut cursor_left: EventReader<CursorLeft>,
    mut wheel: EventReader<MouseWheel>,
    mut motion: EventReader<MouseMotion>,
    mouse_button: Res<ButtonInput<MouseButton>>,
) {
    for event in cursor_moved.read() {
        tour.context.push_input(TourInput::PointerMoved(event.position));
    }
    if cursor_left.read().count() > 0 {
        tour.context.push_input(TourInput::PointerLeft);
    }

    for event in wheel.read() {
        let delta_y = wheel_delta(event);
        if delta_y != 0.0 {
            tour.context.push_input(TourInput::Wheel { delta_y });
        }
    }

    // Right or middle drag orbits the free camera
    let dragging = mouse_button.pressed(MouseButton::Right) || mouse_button.pressed(MouseButton::Middle);
    if dragging {
        let delta: Vec2 = motion.read().map(|m| m.delta).sum();
        if delta != Vec2::ZERO {
            tour.context.push_input(TourInput::OrbitDrag(delta));
        }
    } else {
        motion.clear();
    }

    if mouse_button.just_pressed(MouseButton::Left) {
        tour.context.push_input(TourInput::Click);
    }
}

/// Inputs for one frame of touches: `pressed` are the positions of touches
/// that began this frame, `active` the deltas of every touch still down.
///
/// A tap is a lone new finger; it hovers then focuses. Two fingers orbit.
pub fn touch_inputs(pressed: &[Vec2], active: &[Vec2]) -> Vec<TourInput> {
    let mut inputs = Vec::new();
    if let ([position], 1) = (pressed, active.len()) {
        inputs.push(TourInput::PointerMoved(*position));
        inputs.push(TourInput::Click);
    }
    if let [a, b] = active {
        let delta = (*a + *b) * 0.5;
        if delta != Vec2::ZERO {
            inputs.push(TourInput::OrbitDrag(delta));
        }
    }
    inputs
}

fn queue_touch(touches: Res<Touches>, mut tour: ResMut<TourState>) {
    let pressed: Vec<Vec2> = touches.iter_just_pressed().map(|t| t.position()).collect();
    let active: Vec<Vec2> = touches.iter().map(|t| t.delta()).collect();
    for input in touch_inputs(&pressed, &active) {
        tour.context.push_input(input);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bindings() {
        assert_eq!(map_key(KeyCode::Digit2, false), Some(TourInput::SetSpeed(SpeedPreset::Fast)));
        assert_eq!(map_key(KeyCode::Space, false), Some(TourInput::Advance));
        assert_eq!(map_key(KeyCode::ArrowLeft, false), Some(TourInput::Retreat));
        assert_eq!(map_key(KeyCode::Equal, true), Some(TourInput::ZoomIn));
        assert_eq!(map_key(KeyCode::Minus, false), Some(TourInput::ZoomOut));
        assert_eq!(map_key(KeyCode::KeyQ, false), Some(TourInput::Exit));
        assert_eq!(map_key(KeyCode::KeyL, false), Some(TourInput::ToggleLive));
        assert_eq!(map_key(KeyCode::KeyZ, false), None);
    }

    #[test]
    fn test_single_finger_press_is_a_tap() {
        let at = Vec2::new(120.0, 80.0);
        assert_eq!(
            touch_inputs(&[at], &[Vec2::ZERO]),
            vec![TourInput::PointerMoved(at), TourInput::Click]
        );
    }

    #[test]
    fn test_two_finger_press_is_not_a_tap() {
        let both = [Vec2::new(100.0, 100.0), Vec2::new(200.0, 100.0)];
        assert!(touch_inputs(&both, &[Vec2::ZERO, Vec2::ZERO]).is_empty());

        // Second finger landing next to a held one
        assert!(touch_inputs(&both[..1], &[Vec2::ZERO, Vec2::ZERO]).is_empty());

        let drag = touch_inputs(&[], &[Vec2::new(4.0, 2.0), Vec2::new(2.0, 0.0)]);
        assert_eq!(drag, vec![TourInput::OrbitDrag(Vec2::new(3.0, 1.0))]);
    }

    #[test]
    fn test_help_needs_shift() {
        assert_eq!(map_key(KeyCode::Slash, true), Some(TourInput::ToggleHelp));
        assert_eq!(map_key(KeyCode::Slash, false), None);
    }

    #[test]
    fn test_wheel_sign_and_units() {
        let down = MouseWheel {
            unit: MouseScrollUnit::Line,
            x: 0.0,
            y: -1.0,
            window: Entity::PLACEHOLDER,
        };
        assert_eq!(wheel_delta(&down), 1.0);
        assert_eq!(TourInput::Wheel { delta_y: wheel_delta(&down) }.zoom_factor(), Some(1.25));

        let up_pixels = MouseWheel {
            unit: MouseScrollUnit::Pixel,
            x: 0.0,
            y: 80.0,
            window: Entity::PLACEHOLDER,
        };
        assert_eq!(wheel_delta(&up_pixels), -2.0);
    }
}
