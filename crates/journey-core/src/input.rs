//! Host input, queued as it arrives and drained once per frame.

use std::collections::VecDeque;

use bevy_math::Vec2;

use crate::controller::SpeedPreset;
use crate::picker::SurfaceRect;

/// Distance factor for scrolling down (zoom out).
pub const WHEEL_OUT_FACTOR: f32 = 1.25;
/// Distance factor for scrolling up (zoom in).
pub const WHEEL_IN_FACTOR: f32 = 0.8;
/// Distance factor for the `+` key.
pub const KEY_ZOOM_IN_FACTOR: f32 = 0.9;
/// Distance factor for the `-` key.
pub const KEY_ZOOM_OUT_FACTOR: f32 = 1.1;

/// One host input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TourInput {
    /// Pointer position in window coordinates.
    PointerMoved(Vec2),
    PointerLeft,
    Click,
    /// Wheel movement; positive `delta_y` scrolls down.
    Wheel { delta_y: f32 },
    /// Orbit drag in pixels (free camera only).
    OrbitDrag(Vec2),
    ZoomIn,
    ZoomOut,
    Advance,
    Retreat,
    JumpTo(i64),
    SetSpeed(SpeedPreset),
    ToggleParticles,
    ToggleKpMeter,
    ToggleNarration,
    ToggleFreeCam,
    ToggleAutoPlay,
    ToggleLive,
    ToggleHelp,
    Resize(SurfaceRect),
    Exit,
}

impl TourInput {
    /// Zoom factor applied to the camera distance, if this input zooms.
    pub fn zoom_factor(&self) -> Option<f32> {
        match *self {
            TourInput::Wheel { delta_y } if delta_y > 0.0 => Some(WHEEL_OUT_FACTOR),
            TourInput::Wheel { delta_y } if delta_y < 0.0 => Some(WHEEL_IN_FACTOR),
            TourInput::ZoomIn => Some(KEY_ZOOM_IN_FACTOR),
            TourInput::ZoomOut => Some(KEY_ZOOM_OUT_FACTOR),
            _ => None,
        }
    }
}

/// FIFO of pending input.
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    pending: VecDeque<TourInput>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, input: TourInput) {
        self.pending.push_back(input);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Takes everything queued so far, in arrival order.
    pub fn drain(&mut self) -> Vec<TourInput> {
        self.pending.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_preserves_order() {
        let mut queue = InputQueue::new();
        queue.push(TourInput::Advance);
        queue.push(TourInput::PointerMoved(Vec2::new(1.0, 2.0)));
        queue.push(TourInput::Click);

        assert_eq!(queue.len(), 3);
        let drained = queue.drain();
        assert_eq!(drained[0], TourInput::Advance);
        assert_eq!(drained[2], TourInput::Click);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_zoom_factors() {
        assert_eq!(TourInput::Wheel { delta_y: 3.0 }.zoom_factor(), Some(1.25));
        assert_eq!(TourInput::Wheel { delta_y: -1.0 }.zoom_factor(), Some(0.8));
        assert_eq!(TourInput::Wheel { delta_y: 0.0 }.zoom_factor(), None);
        assert_eq!(TourInput::ZoomIn.zoom_factor(), Some(0.9));
        assert_eq!(TourInput::ZoomOut.zoom_factor(), Some(1.1));
        assert_eq!(TourInput::Click.zoom_factor(), None);
    }
}
