use winit::keyboard::KeyCode;

/// Frame-boundary input, decoupled from the windowing library.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    CycleScene,
    IncreaseDepth,
    DecreaseDepth,
    /// Light offset change in steps along x and y.
    MoveLight { dx: f32, dy: f32 },
    /// View change in steps of azimuth and elevation.
    Rotate { azimuth: i32, elevation: i32 },
    ZoomIn,
    ZoomOut,
    ResetView,
    Snapshot,
    Quit,
}

impl InputEvent {
    pub fn from_key(key: KeyCode, shift: bool) -> Option<InputEvent> {
        let event = match key {
            KeyCode::Escape => InputEvent::Quit,
            KeyCode::Digit0 | KeyCode::Numpad0 => InputEvent::ResetView,
            KeyCode::KeyN if shift => InputEvent::DecreaseDepth,
            KeyCode::KeyN => InputEvent::IncreaseDepth,
            KeyCode::KeyA => InputEvent::MoveLight { dx: -1.0, dy: 0.0 },
            KeyCode::KeyD => InputEvent::MoveLight { dx: 1.0, dy: 0.0 },
            KeyCode::KeyS => InputEvent::MoveLight { dx: 0.0, dy: -1.0 },
            KeyCode::KeyW => InputEvent::MoveLight { dx: 0.0, dy: 1.0 },
            KeyCode::ArrowRight => InputEvent::Rotate {
                azimuth: 1,
                elevation: 0,
            },
            KeyCode::ArrowLeft => InputEvent::Rotate {
                azimuth: -1,
                elevation: 0,
            },
            KeyCode::ArrowUp => InputEvent::Rotate {
                azimuth: 0,
                elevation: 1,
            },
            KeyCode::ArrowDown => InputEvent::Rotate {
                azimuth: 0,
                elevation: -1,
            },
            KeyCode::PageUp => InputEvent::ZoomIn,
            KeyCode::PageDown => InputEvent::ZoomOut,
            KeyCode::KeyM => InputEvent::CycleScene,
            KeyCode::KeyP => InputEvent::Snapshot,
            _ => return None,
        };

        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_reverses_depth_key() {
        assert_eq!(
            InputEvent::from_key(KeyCode::KeyN, false),
            Some(InputEvent::IncreaseDepth)
        );
        assert_eq!(
            InputEvent::from_key(KeyCode::KeyN, true),
            Some(InputEvent::DecreaseDepth)
        );
    }

    #[test]
    fn unbound_keys_are_ignored() {
        assert_eq!(InputEvent::from_key(KeyCode::KeyQ, false), None);
    }

    #[test]
    fn page_up_zooms_in() {
        assert_eq!(
            InputEvent::from_key(KeyCode::PageUp, false),
            Some(InputEvent::ZoomIn)
        );
    }
}
