//! Blend Modes - Overlay Compositing Rules
//!
//! Colors are straight (non-premultiplied) RGBA with channels in [0, 1].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Standard alpha-over.
    Normal,
    /// Per-channel multiplicative darkening.
    #[default]
    Multiply,
    /// Per-channel inverse-multiplicative lightening.
    Screen,
}

impl BlendMode {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Multiply => "Multiply",
            Self::Screen => "Screen",
        }
    }

    /// All blend modes in display order.
    pub fn all() -> &'static [BlendMode] {
        &[Self::Normal, Self::Multiply, Self::Screen]
    }

    /// Blend function B(cb, cs) for one color channel.
    pub fn blend_channel(self, backdrop: f32, source: f32) -> f32 {
        match self {
            Self::Normal => source,
            Self::Multiply => backdrop * source,
            Self::Screen => backdrop + source - backdrop * source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// From 8-bit channels.
    pub fn from_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    pub fn to_u8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

/// Composite `source` over `backdrop` using `mode`, with the layer's `opacity`
/// multiplied into the source alpha.
///
/// Follows the separable-blend form of W3C Compositing Level 1:
/// the blended color is mixed with the raw source by the backdrop alpha,
/// then source-over is applied.
pub fn composite(backdrop: Rgba, source: Rgba, mode: BlendMode, opacity: f32) -> Rgba {
    let alpha_s = (source.a * opacity).clamp(0.0, 1.0);
    let alpha_b = backdrop.a.clamp(0.0, 1.0);
    let alpha_o = alpha_s + alpha_b * (1.0 - alpha_s);

    if alpha_o <= 0.0 {
        return Rgba::TRANSPARENT;
    }

    let channel = |cb: f32, cs: f32| {
        let mixed = (1.0 - alpha_b) * cs + alpha_b * mode.blend_channel(cb, cs);
        let premultiplied = alpha_s * mixed + alpha_b * cb * (1.0 - alpha_s);
        (premultiplied / alpha_o).clamp(0.0, 1.0)
    };

    Rgba {
        r: channel(backdrop.r, source.r),
        g: channel(backdrop.g, source.g),
        b: channel(backdrop.b, source.b),
        a: alpha_o,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn assert_close(a: Rgba, b: Rgba) {
        assert!(
            (a.r - b.r).abs() < EPS
                && (a.g - b.g).abs() < EPS
                && (a.b - b.b).abs() < EPS
                && (a.a - b.a).abs() < EPS,
            "{:?} != {:?}",
            a,
            b
        );
    }

    #[test]
    fn test_default_is_multiply() {
        assert_eq!(BlendMode::default(), BlendMode::Multiply);
    }

    #[test]
    fn test_wire_names_lowercase() {
        assert_eq!(serde_json::to_string(&BlendMode::Screen).unwrap(), "\"screen\"");
        let mode: BlendMode = serde_json::from_str("\"normal\"").unwrap();
        assert_eq!(mode, BlendMode::Normal);
    }

    #[test]
    fn test_normal_opaque_replaces_backdrop() {
        let out = composite(Rgba::WHITE, Rgba::opaque(0.2, 0.4, 0.6), BlendMode::Normal, 1.0);
        assert_close(out, Rgba::opaque(0.2, 0.4, 0.6));
    }

    #[test]
    fn test_normal_half_opacity_mixes() {
        let out = composite(Rgba::WHITE, Rgba::BLACK, BlendMode::Normal, 0.5);
        assert_close(out, Rgba::opaque(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_multiply_darkens() {
        let skin = Rgba::opaque(0.8, 0.6, 0.5);
        let ink = Rgba::opaque(0.5, 0.5, 0.5);
        let out = composite(skin, ink, BlendMode::Multiply, 1.0);
        assert_close(out, Rgba::opaque(0.4, 0.3, 0.25));
        assert!(out.r <= skin.r && out.g <= skin.g && out.b <= skin.b);
    }

    #[test]
    fn test_multiply_white_is_identity() {
        let skin = Rgba::opaque(0.8, 0.6, 0.5);
        let out = composite(skin, Rgba::WHITE, BlendMode::Multiply, 1.0);
        assert_close(out, skin);
    }

    #[test]
    fn test_screen_lightens() {
        let base = Rgba::opaque(0.5, 0.2, 0.0);
        let out = composite(base, Rgba::opaque(0.5, 0.5, 0.5), BlendMode::Screen, 1.0);
        assert_close(out, Rgba::opaque(0.75, 0.6, 0.5));
    }

    #[test]
    fn test_screen_black_is_identity() {
        let base = Rgba::opaque(0.3, 0.6, 0.9);
        let out = composite(base, Rgba::BLACK, BlendMode::Screen, 1.0);
        assert_close(out, base);
    }

    #[test]
    fn test_transparent_backdrop_uses_source_color() {
        // With no backdrop, every mode degrades to the raw source.
        for mode in BlendMode::all() {
            let out = composite(Rgba::TRANSPARENT, Rgba::opaque(0.3, 0.3, 0.3), *mode, 1.0);
            assert_close(out, Rgba::opaque(0.3, 0.3, 0.3));
        }
    }

    #[test]
    fn test_fully_transparent_result() {
        let out = composite(Rgba::TRANSPARENT, Rgba::BLACK, BlendMode::Multiply, 0.0);
        assert_eq!(out, Rgba::TRANSPARENT);
    }

    #[test]
    fn test_u8_quantization() {
        assert_eq!(Rgba::from_u8(255, 0, 128, 255).to_u8(), [255, 0, 128, 255]);
    }
}
