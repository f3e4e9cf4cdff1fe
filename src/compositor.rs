//! Compositor - Layered Scene Description
//!
//! `compose` maps (base, overlay, model) to a renderable scene. It is pure:
//! the same inputs always produce the same scene, and it never fails.
//! Screen space is the preview canvas (origin top-left, y down); image space
//! is the base photo's pixel grid.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

use crate::blend::BlendMode;
use crate::config::EngineConfig;
use crate::hashing;
use crate::transform::{Point, TransformModel};

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static COMPOSE_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_compose_call_count() -> u32 {
    COMPOSE_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_compose_call_count() {
    COMPOSE_CALL_COUNT.store(0, Ordering::SeqCst);
}

/// Opaque image reference (URI). The core never dereferences it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Inline `data:image/png;base64,...` reference.
    pub fn from_png_bytes(bytes: &[u8]) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self(format!("data:image/png;base64,{}", encoded))
    }

    /// `None` for empty or whitespace-only references.
    pub fn non_empty(uri: &str) -> Option<Self> {
        if uri.trim().is_empty() { None } else { Some(Self::new(uri)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn is_inline(&self) -> bool {
        self.0.starts_with("data:")
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_positive(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn centered(center: Point, size: Size) -> Self {
        Self {
            x: center.x - size.width / 2.0,
            y: center.y - size.height / 2.0,
            width: size.width,
            height: size.height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    fn bounding(points: &[Point]) -> Self {
        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// How the base photo fills the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Fill the canvas, cropping the overflow.
    #[default]
    Cover,
    /// Fit inside the canvas, letterboxing.
    Contain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Base,
    Overlay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub kind: LayerKind,
    pub image: ImageRef,
    /// Unrotated frame in screen space.
    pub frame: Rect,
    /// Degrees, clockwise on screen, about the frame center.
    pub rotation: f32,
    pub opacity: f32,
    pub blend_mode: BlendMode,
}

impl Layer {
    /// Corners of the rotated frame: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point; 4] {
        let c = self.frame.center();
        let (hw, hh) = (self.frame.width / 2.0, self.frame.height / 2.0);
        [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
            .map(|(dx, dy)| rotate_about(c, Point::new(c.x + dx, c.y + dy), self.rotation))
    }

    /// Axis-aligned bounds of the rotated frame.
    pub fn bounds(&self) -> Rect {
        Rect::bounding(&self.corners())
    }

    /// Hit test against the rotated frame.
    pub fn contains(&self, p: Point) -> bool {
        let local = rotate_about(self.frame.center(), p, -self.rotation);
        self.frame.contains(local)
    }
}

fn rotate_about(center: Point, p: Point, degrees: f32) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (dx, dy) = (p.x - center.x, p.y - center.y);
    Point::new(
        center.x + dx * cos - dy * sin,
        center.y + dx * sin + dy * cos,
    )
}

/// Layers are ordered bottom to top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDescription {
    pub canvas: Size,
    pub base_fit: FitMode,
    pub layers: Vec<Layer>,
}

impl SceneDescription {
    pub fn base(&self) -> Option<&Layer> {
        self.layers.iter().find(|l| l.kind == LayerKind::Base)
    }

    pub fn overlay(&self) -> Option<&Layer> {
        self.layers.iter().find(|l| l.kind == LayerKind::Overlay)
    }

    /// Overlay hit region. False when there is no overlay.
    pub fn overlay_contains(&self, p: Point) -> bool {
        self.overlay().is_some_and(|layer| layer.contains(p))
    }

    pub fn overlay_corners(&self) -> Option<[Point; 4]> {
        self.overlay().map(Layer::corners)
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// SHA-256 over the canonical JSON of the scene.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        hashing::fingerprint(self)
    }
}

/// Screen <-> base-image mapping for one fit mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapping {
    /// Screen units per image pixel.
    pub scale: f32,
    /// Screen position of image pixel (0, 0).
    pub offset: Point,
}

impl CoordinateMapping {
    /// `None` when either size is degenerate.
    pub fn new(canvas: Size, image: Size, fit: FitMode) -> Option<Self> {
        if !canvas.is_positive() || !image.is_positive() {
            return None;
        }

        let sx = canvas.width / image.width;
        let sy = canvas.height / image.height;
        let scale = match fit {
            FitMode::Cover => sx.max(sy),
            FitMode::Contain => sx.min(sy),
        };

        let offset = Point::new(
            (canvas.width - image.width * scale) / 2.0,
            (canvas.height - image.height * scale) / 2.0,
        );
        Some(Self { scale, offset })
    }

    pub fn screen_to_image(&self, p: Point) -> Point {
        Point::new((p.x - self.offset.x) / self.scale, (p.y - self.offset.y) / self.scale)
    }

    pub fn image_to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.offset.x, p.y * self.scale + self.offset.y)
    }

    pub fn screen_rect_to_image(&self, r: Rect) -> Rect {
        let origin = self.screen_to_image(Point::new(r.x, r.y));
        Rect::new(origin.x, origin.y, r.width / self.scale, r.height / self.scale)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Compositor {
    canvas: Size,
    overlay_reference: f32,
    base_fit: FitMode,
}

impl Compositor {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            canvas: config.canvas,
            overlay_reference: config.overlay_reference_size,
            base_fit: config.base_fit,
        }
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    /// Build the scene. Absent (or empty) references are left out.
    pub fn compose(
        &self,
        base: Option<&ImageRef>,
        overlay: Option<&ImageRef>,
        model: &TransformModel,
    ) -> SceneDescription {
        #[cfg(feature = "test-hooks")]
        COMPOSE_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        let mut layers = Vec::with_capacity(2);

        if let Some(image) = base.filter(|r| !r.is_empty()) {
            layers.push(Layer {
                kind: LayerKind::Base,
                image: image.clone(),
                frame: Rect::new(0.0, 0.0, self.canvas.width, self.canvas.height),
                rotation: 0.0,
                opacity: 1.0,
                blend_mode: BlendMode::Normal,
            });
        }

        if let Some(image) = overlay.filter(|r| !r.is_empty()) {
            let edge = self.overlay_reference * model.scale();
            layers.push(Layer {
                kind: LayerKind::Overlay,
                image: image.clone(),
                frame: Rect::centered(model.position(), Size::new(edge, edge)),
                rotation: model.rotation(),
                opacity: model.opacity(),
                blend_mode: model.blend_mode(),
            });
        }

        trace!(
            layers = layers.len(),
            x = model.position().x,
            y = model.position().y,
            scale = model.scale(),
            rotation = model.rotation(),
            "Composed scene"
        );

        SceneDescription {
            canvas: self.canvas,
            base_fit: self.base_fit,
            layers,
        }
    }

    /// Mapping between the canvas and a base image of the given pixel size.
    pub fn mapping(&self, image: Size) -> Option<CoordinateMapping> {
        CoordinateMapping::new(self.canvas, image, self.base_fit)
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
