//! Transform Model - Overlay Placement
//!
//! Every constructor and setter returns a clamped model. Deserialization goes
//! through the same clamp, so an out-of-range model is never observable.

use serde::{Deserialize, Serialize};

use crate::blend::BlendMode;

pub const SCALE_MIN: f32 = 0.2;
pub const SCALE_MAX: f32 = 1.5;
pub const OPACITY_MIN: f32 = 0.3;
pub const OPACITY_MAX: f32 = 1.0;
pub const ROTATION_STEP_DEGREES: f32 = 15.0;

pub const DEFAULT_POSITION: Point = Point { x: 150.0, y: 150.0 };
pub const DEFAULT_SCALE: f32 = 0.5;
pub const DEFAULT_OPACITY: f32 = 0.85;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotateDirection {
    Left,
    Right,
}

impl RotateDirection {
    /// Signed step in degrees; left is counter-clockwise.
    pub fn step(self, magnitude: f32) -> f32 {
        match self {
            Self::Left => -magnitude,
            Self::Right => magnitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TransformRecord")]
pub struct TransformModel {
    position: Point,
    scale: f32,
    rotation: f32,
    opacity: f32,
    blend_mode: BlendMode,
}

/// Unchecked wire form; converted into a model through `clamp`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransformRecord {
    #[serde(default = "default_position")]
    position: Point,
    #[serde(default = "default_scale")]
    scale: f32,
    #[serde(default)]
    rotation: f32,
    #[serde(default = "default_opacity")]
    opacity: f32,
    #[serde(default)]
    blend_mode: BlendMode,
}

fn default_position() -> Point { DEFAULT_POSITION }
fn default_scale() -> f32 { DEFAULT_SCALE }
fn default_opacity() -> f32 { DEFAULT_OPACITY }

impl From<TransformRecord> for TransformModel {
    fn from(record: TransformRecord) -> Self {
        clamp(TransformModel {
            position: record.position,
            scale: record.scale,
            rotation: record.rotation,
            opacity: record.opacity,
            blend_mode: record.blend_mode,
        })
    }
}

impl Default for TransformModel {
    fn default() -> Self {
        Self {
            position: DEFAULT_POSITION,
            scale: DEFAULT_SCALE,
            rotation: 0.0,
            opacity: DEFAULT_OPACITY,
            blend_mode: BlendMode::Multiply,
        }
    }
}

/// Bring every bounded field into range. Total: non-finite scale/opacity fall
/// back to their defaults, non-finite rotation to 0 and position to the
/// default anchor.
pub fn clamp(model: TransformModel) -> TransformModel {
    TransformModel {
        position: if model.position.is_finite() { model.position } else { DEFAULT_POSITION },
        scale: clamp_scale(model.scale),
        rotation: if model.rotation.is_finite() { model.rotation } else { 0.0 },
        opacity: clamp_opacity(model.opacity),
        blend_mode: model.blend_mode,
    }
}

pub fn clamp_scale(scale: f32) -> f32 {
    if scale.is_nan() {
        DEFAULT_SCALE
    } else {
        scale.clamp(SCALE_MIN, SCALE_MAX)
    }
}

pub fn clamp_opacity(opacity: f32) -> f32 {
    if opacity.is_nan() {
        DEFAULT_OPACITY
    } else {
        opacity.clamp(OPACITY_MIN, OPACITY_MAX)
    }
}

impl TransformModel {
    pub fn new(
        position: Point,
        scale: f32,
        rotation: f32,
        opacity: f32,
        blend_mode: BlendMode,
    ) -> Self {
        clamp(Self { position, scale, rotation, opacity, blend_mode })
    }

    pub fn position(&self) -> Point { self.position }
    pub fn scale(&self) -> f32 { self.scale }
    pub fn rotation(&self) -> f32 { self.rotation }
    pub fn opacity(&self) -> f32 { self.opacity }
    pub fn blend_mode(&self) -> BlendMode { self.blend_mode }

    /// Rotation wrapped into [0, 360) for display.
    pub fn display_rotation(&self) -> f32 {
        let wrapped = self.rotation.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360.0 for tiny negatives
        if wrapped >= 360.0 { 0.0 } else { wrapped }
    }

    /// Position is deliberately unclamped: off-canvas placement is allowed.
    pub fn with_position(self, position: Point) -> Self {
        clamp(Self { position, ..self })
    }

    pub fn with_scale(self, scale: f32) -> Self {
        clamp(Self { scale, ..self })
    }

    /// Rotation is unbounded; it only wraps for display.
    pub fn with_rotation(self, rotation: f32) -> Self {
        clamp(Self { rotation, ..self })
    }

    pub fn rotated_by(self, degrees: f32) -> Self {
        self.with_rotation(self.rotation + degrees)
    }

    pub fn rotated(self, direction: RotateDirection) -> Self {
        self.rotated_by(direction.step(ROTATION_STEP_DEGREES))
    }

    pub fn with_opacity(self, opacity: f32) -> Self {
        clamp(Self { opacity, ..self })
    }

    pub fn with_blend_mode(self, blend_mode: BlendMode) -> Self {
        Self { blend_mode, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let model = TransformModel::default();
        assert_eq!(model.position(), Point::new(150.0, 150.0));
        assert_eq!(model.scale(), 0.5);
        assert_eq!(model.rotation(), 0.0);
        assert_eq!(model.opacity(), 0.85);
        assert_eq!(model.blend_mode(), BlendMode::Multiply);
    }

    #[test]
    fn test_scale_clamps_to_nearest_bound() {
        let model = TransformModel::default();
        for (input, expected) in [(2.0, SCALE_MAX), (1.5001, SCALE_MAX), (0.0, SCALE_MIN), (-3.0, SCALE_MIN)] {
            assert_eq!(model.with_scale(input).scale(), expected, "scale {}", input);
        }
        assert_eq!(model.with_scale(f32::INFINITY).scale(), SCALE_MAX);
        assert_eq!(model.with_scale(1.0).scale(), 1.0);
    }

    #[test]
    fn test_opacity_clamps() {
        let model = TransformModel::default();
        assert_eq!(model.with_opacity(0.1).opacity(), OPACITY_MIN);
        assert_eq!(model.with_opacity(1.7).opacity(), OPACITY_MAX);
        assert_eq!(model.with_opacity(0.6).opacity(), 0.6);
    }

    #[test]
    fn test_nan_inputs_fall_back() {
        let model = TransformModel::default()
            .with_scale(f32::NAN)
            .with_opacity(f32::NAN)
            .with_rotation(f32::NAN)
            .with_position(Point::new(f32::NAN, 1.0));
        assert_eq!(model, TransformModel::default());
    }

    #[test]
    fn test_rotation_is_unbounded() {
        let model = TransformModel::default().with_rotation(725.0);
        assert_eq!(model.rotation(), 725.0);
        assert_eq!(model.display_rotation(), 5.0);

        let model = TransformModel::default().with_rotation(-15.0);
        assert_eq!(model.display_rotation(), 345.0);
    }

    #[test]
    fn test_rotate_left_then_right_restores() {
        let start = TransformModel::default().with_rotation(30.0);
        for steps in 0..30 {
            let mut model = start;
            for _ in 0..steps {
                model = model.rotated(RotateDirection::Left);
            }
            for _ in 0..steps {
                model = model.rotated(RotateDirection::Right);
            }
            assert_eq!(model.display_rotation(), start.display_rotation());
        }
    }

    #[test]
    fn test_position_is_unclamped() {
        let model = TransformModel::default().with_position(Point::new(-500.0, 9000.0));
        assert_eq!(model.position(), Point::new(-500.0, 9000.0));
    }

    #[test]
    fn test_deserialize_clamps() {
        let json = r#"{"position":{"x":10,"y":20},"scale":9,"rotation":45,"opacity":0,"blendMode":"screen"}"#;
        let model: TransformModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.scale(), SCALE_MAX);
        assert_eq!(model.opacity(), OPACITY_MIN);
        assert_eq!(model.rotation(), 45.0);
        assert_eq!(model.blend_mode(), BlendMode::Screen);
    }

    #[test]
    fn test_serialization_roundtrip_camel_case() {
        let model = TransformModel::default().with_blend_mode(BlendMode::Normal);
        let json = serde_json::to_string(&model).unwrap();
        assert!(json.contains("\"blendMode\":\"normal\""));
        let restored: TransformModel = serde_json::from_str(&json).unwrap();
        assert_eq!(model, restored);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let model: TransformModel = serde_json::from_str("{}").unwrap();
        assert_eq!(model, TransformModel::default());
    }
}
