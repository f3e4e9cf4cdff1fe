//! Gesture Input Mapper
//!
//! Pointer events drive a two-state drag machine; discrete controls (rotate
//! buttons, scale/opacity sliders, blend chips) map one-to-one onto
//! mutations. Dragging is absolute: the overlay center follows the pointer.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blend::BlendMode;
use crate::compositor::SceneDescription;
use crate::transform::{Point, RotateDirection, TransformModel, ROTATION_STEP_DEGREES};
use crate::validation::{require_finite, ValidationError};

pub type PointerId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerEvent {
    Down { pointer: PointerId, at: Point },
    Move { pointer: PointerId, at: Point },
    Up { pointer: PointerId, at: Point },
    /// The platform abandoned the gesture.
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging { pointer: PointerId },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ControlInput {
    Rotate(RotateDirection),
    SetScale(f32),
    SetOpacity(f32),
    SetBlendMode(BlendMode),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformMutation {
    MoveTo(Point),
    RotateBy(f32),
    SetScale(f32),
    SetOpacity(f32),
    SetBlendMode(BlendMode),
}

impl TransformMutation {
    pub fn apply(self, model: TransformModel) -> TransformModel {
        match self {
            Self::MoveTo(p) => model.with_position(p),
            Self::RotateBy(degrees) => model.rotated_by(degrees),
            Self::SetScale(scale) => model.with_scale(scale),
            Self::SetOpacity(opacity) => model.with_opacity(opacity),
            Self::SetBlendMode(mode) => model.with_blend_mode(mode),
        }
    }
}

/// Where a drag may start.
pub trait HitRegion {
    fn hit(&self, p: Point) -> bool;
}

impl HitRegion for SceneDescription {
    fn hit(&self, p: Point) -> bool {
        self.overlay_contains(p)
    }
}

#[derive(Debug, Clone)]
pub struct GestureMapper {
    state: DragState,
    rotation_step: f32,
}

impl GestureMapper {
    pub fn new(rotation_step: f32) -> Self {
        Self { state: DragState::Idle, rotation_step }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Drop any in-progress drag.
    pub fn reset(&mut self) {
        self.state = DragState::Idle;
    }

    /// Advance the drag machine. Returns the mutation to apply, if any.
    pub fn on_pointer(
        &mut self,
        event: PointerEvent,
        region: &impl HitRegion,
    ) -> Option<TransformMutation> {
        match (self.state, event) {
            (DragState::Idle, PointerEvent::Down { pointer, at }) => {
                if at.is_finite() && region.hit(at) {
                    debug!(pointer, x = at.x, y = at.y, "Drag started");
                    self.state = DragState::Dragging { pointer };
                } else {
                    debug!(pointer, x = at.x, y = at.y, "Pointer down outside overlay ignored");
                }
                None
            }

            // Repeated downs while dragging are idempotent
            (DragState::Dragging { .. }, PointerEvent::Down { .. }) => None,

            (DragState::Dragging { pointer: owner }, PointerEvent::Move { pointer, at }) => {
                if pointer == owner && at.is_finite() {
                    Some(TransformMutation::MoveTo(at))
                } else {
                    None
                }
            }

            (DragState::Dragging { pointer: owner }, PointerEvent::Up { pointer, .. }) => {
                if pointer == owner {
                    debug!(pointer, "Drag ended");
                    self.state = DragState::Idle;
                }
                None
            }

            (DragState::Dragging { pointer }, PointerEvent::Cancel) => {
                debug!(pointer, "Drag cancelled");
                self.state = DragState::Idle;
                None
            }

            (DragState::Idle, PointerEvent::Move { .. })
            | (DragState::Idle, PointerEvent::Up { .. })
            | (DragState::Idle, PointerEvent::Cancel) => None,
        }
    }

    /// Map a control input to exactly one mutation.
    pub fn on_control(&self, input: ControlInput) -> Result<TransformMutation, ValidationError> {
        Ok(match input {
            ControlInput::Rotate(direction) => {
                TransformMutation::RotateBy(direction.step(self.rotation_step))
            }
            ControlInput::SetScale(v) => TransformMutation::SetScale(require_finite("scale", v)?),
            ControlInput::SetOpacity(v) => {
                TransformMutation::SetOpacity(require_finite("opacity", v)?)
            }
            ControlInput::SetBlendMode(mode) => TransformMutation::SetBlendMode(mode),
        })
    }
}

impl Default for GestureMapper {
    fn default() -> Self {
        Self::new(ROTATION_STEP_DEGREES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Square hit region around (150, 150).
    struct Square;

    impl HitRegion for Square {
        fn hit(&self, p: Point) -> bool {
            (p.x - 150.0).abs() <= 25.0 && (p.y - 150.0).abs() <= 25.0
        }
    }

    fn down(x: f32, y: f32) -> PointerEvent {
        PointerEvent::Down { pointer: 1, at: Point::new(x, y) }
    }

    fn moved(x: f32, y: f32) -> PointerEvent {
        PointerEvent::Move { pointer: 1, at: Point::new(x, y) }
    }

    #[test]
    fn test_down_on_overlay_starts_drag() {
        let mut mapper = GestureMapper::default();
        assert_eq!(mapper.on_pointer(down(150.0, 150.0), &Square), None);
        assert_eq!(mapper.state(), DragState::Dragging { pointer: 1 });
    }

    #[test]
    fn test_down_outside_overlay_ignored() {
        let mut mapper = GestureMapper::default();
        mapper.on_pointer(down(10.0, 10.0), &Square);
        assert_eq!(mapper.state(), DragState::Idle);
        assert_eq!(mapper.on_pointer(moved(20.0, 20.0), &Square), None);
    }

    #[test]
    fn test_move_emits_absolute_position() {
        let mut mapper = GestureMapper::default();
        mapper.on_pointer(down(140.0, 160.0), &Square);
        let first = mapper.on_pointer(moved(300.0, 40.0), &Square);
        let second = mapper.on_pointer(moved(310.0, 45.0), &Square);
        assert_eq!(first, Some(TransformMutation::MoveTo(Point::new(300.0, 40.0))));
        assert_eq!(second, Some(TransformMutation::MoveTo(Point::new(310.0, 45.0))));
    }

    #[test]
    fn test_repeated_down_is_idempotent() {
        let mut mapper = GestureMapper::default();
        mapper.on_pointer(down(150.0, 150.0), &Square);
        mapper.on_pointer(PointerEvent::Down { pointer: 2, at: Point::new(150.0, 150.0) }, &Square);
        mapper.on_pointer(down(150.0, 150.0), &Square);
        assert_eq!(mapper.state(), DragState::Dragging { pointer: 1 });
    }

    #[test]
    fn test_up_and_cancel_end_drag() {
        let mut mapper = GestureMapper::default();
        mapper.on_pointer(down(150.0, 150.0), &Square);
        mapper.on_pointer(PointerEvent::Up { pointer: 1, at: Point::new(0.0, 0.0) }, &Square);
        assert_eq!(mapper.state(), DragState::Idle);

        mapper.on_pointer(down(150.0, 150.0), &Square);
        mapper.on_pointer(PointerEvent::Cancel, &Square);
        assert!(!mapper.is_dragging());
    }

    #[test]
    fn test_foreign_pointer_ignored_while_dragging() {
        let mut mapper = GestureMapper::default();
        mapper.on_pointer(down(150.0, 150.0), &Square);
        let other = PointerEvent::Move { pointer: 7, at: Point::new(1.0, 1.0) };
        assert_eq!(mapper.on_pointer(other, &Square), None);
        mapper.on_pointer(PointerEvent::Up { pointer: 7, at: Point::new(1.0, 1.0) }, &Square);
        assert!(mapper.is_dragging());
    }

    #[test]
    fn test_non_finite_move_dropped() {
        let mut mapper = GestureMapper::default();
        mapper.on_pointer(down(150.0, 150.0), &Square);
        assert_eq!(mapper.on_pointer(moved(f32::NAN, 3.0), &Square), None);
        assert!(mapper.is_dragging());
    }

    #[test]
    fn test_controls_map_one_to_one() {
        let mapper = GestureMapper::default();
        assert_eq!(
            mapper.on_control(ControlInput::Rotate(RotateDirection::Right)).unwrap(),
            TransformMutation::RotateBy(15.0)
        );
        assert_eq!(
            mapper.on_control(ControlInput::Rotate(RotateDirection::Left)).unwrap(),
            TransformMutation::RotateBy(-15.0)
        );
        assert_eq!(
            mapper.on_control(ControlInput::SetScale(2.0)).unwrap(),
            TransformMutation::SetScale(2.0)
        );
        assert_eq!(
            mapper.on_control(ControlInput::SetBlendMode(BlendMode::Screen)).unwrap(),
            TransformMutation::SetBlendMode(BlendMode::Screen)
        );
    }

    #[test]
    fn test_non_finite_control_rejected() {
        let mapper = GestureMapper::default();
        let err = mapper.on_control(ControlInput::SetOpacity(f32::INFINITY)).unwrap_err();
        assert!(err.to_string().contains("opacity"));
    }

    #[test]
    fn test_mutation_apply_clamps() {
        let model = TransformMutation::SetScale(2.0).apply(TransformModel::default());
        assert_eq!(model.scale(), 1.5);
    }

    #[test]
    fn test_events_from_json() {
        let event: PointerEvent =
            serde_json::from_str(r#"{"type":"move","pointer":3,"at":{"x":1.5,"y":2.0}}"#).unwrap();
        assert_eq!(event, PointerEvent::Move { pointer: 3, at: Point::new(1.5, 2.0) });

        let input: ControlInput = serde_json::from_str(r#"{"type":"rotate","value":"left"}"#).unwrap();
        assert_eq!(input, ControlInput::Rotate(RotateDirection::Left));
    }
}
