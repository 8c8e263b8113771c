use glam::Mat4;

use crate::define_scene::SceneMode;
use crate::input::InputEvent;
use crate::math::Mat3;

pub const ANGLE_STEP: i32 = 5;
pub const LIGHT_STEP: f32 = 10.0;
pub const ZOOM_IN_FACTOR: f32 = 0.9;
pub const ZOOM_OUT_FACTOR: f32 = 1.1;
pub const MIN_DEPTH: u32 = 1;

pub const INITIAL_AZIMUTH: i32 = -215;
pub const INITIAL_ELEVATION: i32 = -120;
pub const INITIAL_DEPTH: u32 = 8;

/// View angles forced when entering [`SceneMode::HowManySpheres`].
pub const SPECIAL_AZIMUTH: i32 = -215;
pub const SPECIAL_ELEVATION: i32 = -110;

/// Azimuth/elevation in whole degrees plus the rotation derived from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    azimuth: i32,
    elevation: i32,
    rotation: Mat3,
}

impl RotationState {
    pub fn new(azimuth: i32, elevation: i32) -> RotationState {
        let mut state = RotationState {
            azimuth,
            elevation,
            rotation: Mat3::IDENTITY,
        };
        state.set_angles(azimuth, elevation);
        state
    }

    pub fn azimuth(&self) -> i32 {
        self.azimuth
    }

    pub fn elevation(&self) -> i32 {
        self.elevation
    }

    pub fn rotation(&self) -> Mat3 {
        self.rotation
    }

    /// Stores the angles (truncating remainder, so they stay within +/-360)
    /// and recomputes the rotation.
    pub fn set_angles(&mut self, azimuth: i32, elevation: i32) {
        self.azimuth = azimuth % 360;
        self.elevation = elevation % 360;
        self.recalculate_rotation();
    }

    pub fn rotate(&mut self, azimuth_delta: i32, elevation_delta: i32) {
        self.set_angles(
            self.azimuth + azimuth_delta,
            self.elevation + elevation_delta,
        );
    }

    fn recalculate_rotation(&mut self) {
        let view = Mat4::from_rotation_x((self.elevation as f32).to_radians())
            * Mat4::from_rotation_y((self.azimuth as f32).to_radians());

        self.rotation = Mat3::from_upper_left(&view);
    }
}

/// Result of applying one input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Snapshot,
    Quit,
}

/// All user-controlled state that a frame is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameState {
    pub mode: SceneMode,
    pub light_offset: [f32; 2],
    pub max_depth: u32,
    pub zoom: f32,
    pub view: RotationState,
}

impl Default for FrameState {
    fn default() -> Self {
        FrameState {
            mode: SceneMode::TwoSpheres,
            light_offset: [0.0, 0.0],
            max_depth: INITIAL_DEPTH,
            zoom: 1.0,
            view: RotationState::new(INITIAL_AZIMUTH, INITIAL_ELEVATION),
        }
    }
}

impl FrameState {
    pub fn new(mode: SceneMode, max_depth: u32) -> FrameState {
        let mut state = FrameState {
            max_depth: max_depth.max(MIN_DEPTH),
            ..Default::default()
        };
        state.enter_mode(mode);
        state
    }

    fn enter_mode(&mut self, mode: SceneMode) {
        self.mode = mode;
        if mode == SceneMode::HowManySpheres {
            self.max_depth = 1;
            self.view.set_angles(SPECIAL_AZIMUTH, SPECIAL_ELEVATION);
        }
    }

    /// World-space light position for the current scene.
    pub fn light_position(&self) -> [f32; 3] {
        self.mode.light_position(self.light_offset)
    }

    pub fn apply(&mut self, event: InputEvent) -> Control {
        let mut control = Control::Continue;

        match event {
            InputEvent::Quit => control = Control::Quit,
            InputEvent::Snapshot => control = Control::Snapshot,
            InputEvent::ResetView => self.view.set_angles(0, 0),
            InputEvent::IncreaseDepth => self.max_depth += 1,
            InputEvent::DecreaseDepth => self.max_depth = self.max_depth.saturating_sub(1),
            InputEvent::MoveLight { dx, dy } => {
                self.light_offset[0] += dx * LIGHT_STEP;
                self.light_offset[1] += dy * LIGHT_STEP;
            }
            InputEvent::Rotate {
                azimuth,
                elevation,
            } => self
                .view
                .rotate(azimuth * ANGLE_STEP, elevation * ANGLE_STEP),
            InputEvent::ZoomIn => self.zoom *= ZOOM_IN_FACTOR,
            InputEvent::ZoomOut => self.zoom *= ZOOM_OUT_FACTOR,
            InputEvent::CycleScene => self.enter_mode(self.mode.next()),
        }

        self.max_depth = self.max_depth.max(MIN_DEPTH);

        control
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `Rx(elevation) * Ry(azimuth)` built straight from glam, row by row.
    fn elevation_then_azimuth(azimuth: f32, elevation: f32) -> Mat3 {
        let m = glam::Mat3::from_rotation_x(elevation.to_radians())
            * glam::Mat3::from_rotation_y(azimuth.to_radians());
        Mat3::from_rows(m.row(0).into(), m.row(1).into(), m.row(2).into())
    }

    #[test]
    fn zero_angles_give_identity() {
        let state = RotationState::new(0, 0);
        assert!(state.rotation().approx_eq(&Mat3::IDENTITY, 1e-6));
    }

    #[test]
    fn angles_wrap_with_truncating_remainder() {
        let mut state = RotationState::new(355, -355);
        state.rotate(10, -10);
        assert_eq!(state.azimuth(), 5);
        assert_eq!(state.elevation(), -5);
    }

    #[test]
    fn azimuth_only_rotates_about_y() {
        let rot = RotationState::new(90, 0).rotation();
        let expected = Mat3::from_rows([0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0]);
        assert!(rot.approx_eq(&expected, 1e-6), "{rot:?}");
    }

    #[test]
    fn elevation_is_applied_before_azimuth() {
        let rot = RotationState::new(30, 40).rotation();
        assert!(rot.approx_eq(&elevation_then_azimuth(30.0, 40.0), 1e-5), "{rot:?}");

        let swapped = glam::Mat3::from_rotation_y(30f32.to_radians())
            * glam::Mat3::from_rotation_x(40f32.to_radians());
        let swapped = Mat3::from_rows(swapped.row(0).into(), swapped.row(1).into(), swapped.row(2).into());
        assert!(!rot.approx_eq(&swapped, 1e-3));
    }

    #[test]
    fn depth_never_drops_below_one() {
        let mut state = FrameState::new(SceneMode::TwoSpheres, 1);
        state.apply(InputEvent::DecreaseDepth);
        assert_eq!(state.max_depth, 1);
        state.apply(InputEvent::IncreaseDepth);
        assert_eq!(state.max_depth, 2);
    }

    #[test]
    fn five_cycles_return_to_the_start() {
        let mut state = FrameState::default();
        let start = state.mode;
        let mut seen = vec![];
        for _ in 0..5 {
            state.apply(InputEvent::CycleScene);
            seen.push(state.mode.index());
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 0]);
        assert_eq!(state.mode, start);
    }

    #[test]
    fn entering_the_sphere_puzzle_forces_view() {
        let mut state = FrameState::new(SceneMode::SphereCubeCoil, 12);
        state.view.set_angles(40, 75);
        state.apply(InputEvent::CycleScene);

        assert_eq!(state.mode, SceneMode::HowManySpheres);
        assert_eq!(state.max_depth, 1);
        assert_eq!(state.view.azimuth(), SPECIAL_AZIMUTH);
        assert_eq!(state.view.elevation(), SPECIAL_ELEVATION);
        let expected = elevation_then_azimuth(SPECIAL_AZIMUTH as f32, SPECIAL_ELEVATION as f32);
        assert!(state.view.rotation().approx_eq(&expected, 1e-5));
    }

    #[test]
    fn starting_in_the_sphere_puzzle_forces_view() {
        let state = FrameState::new(SceneMode::HowManySpheres, 8);
        assert_eq!(state.max_depth, 1);
        assert_eq!(state.view.elevation(), SPECIAL_ELEVATION);
        assert_eq!(state.light_position(), [650.0, -390.0, -1000.0]);
    }

    #[test]
    fn reset_view_zeroes_both_angles() {
        let mut state = FrameState::default();
        state.apply(InputEvent::ResetView);
        assert_eq!((state.view.azimuth(), state.view.elevation()), (0, 0));
    }

    #[test]
    fn zoom_and_light_steps() {
        let mut state = FrameState::default();
        state.apply(InputEvent::ZoomIn);
        assert!((state.zoom - 0.9).abs() < 1e-6);
        state.apply(InputEvent::ZoomOut);
        assert!((state.zoom - 0.99).abs() < 1e-6);

        state.apply(InputEvent::MoveLight { dx: -1.0, dy: 0.0 });
        state.apply(InputEvent::MoveLight { dx: 0.0, dy: 1.0 });
        assert_eq!(state.light_offset, [-10.0, 10.0]);
    }

    #[test]
    fn quit_and_snapshot_are_reported() {
        let mut state = FrameState::default();
        assert_eq!(state.apply(InputEvent::Snapshot), Control::Snapshot);
        assert_eq!(state.apply(InputEvent::Quit), Control::Quit);
    }
}
