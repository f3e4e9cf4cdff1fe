//! Image Generation Contract
//!
//! The provider itself lives outside the core. This module fixes the request
//! shape, the prompt the provider receives, and an offline placeholder used in
//! development and tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::catalog::{BodyPart, TattooStyle};
use crate::compositor::ImageRef;

pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://placehold.co/1024x1024/png?text=Simulated+Tattoo+Design";

/// Minimal 1x1 transparent PNG.
const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A,
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
    0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41,
    0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00,
    0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Prompt must not be empty")]
    EmptyPrompt,

    #[error("Image provider failed: {0}")]
    Provider(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "256x256")]
    Small,
    #[serde(rename = "512x512")]
    Medium,
    #[default]
    #[serde(rename = "1024x1024")]
    Large,
}

impl ImageSize {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "256x256",
            Self::Medium => "512x512",
            Self::Large => "1024x1024",
        }
    }

    pub fn pixels(self) -> u32 {
        match self {
            Self::Small => 256,
            Self::Medium => 512,
            Self::Large => 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub style: TattooStyle,
    #[serde(default)]
    pub body_part: BodyPart,
    #[serde(default)]
    pub size: ImageSize,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            style: TattooStyle::default(),
            body_part: BodyPart::default(),
            size: ImageSize::default(),
        }
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.prompt.trim().is_empty() {
            Err(GenerationError::EmptyPrompt)
        } else {
            Ok(())
        }
    }

    /// Prompt sent to the provider: style framing, placement hint (skipped
    /// for `Other`), then fixed line-art guidance.
    pub fn enhanced_prompt(&self) -> String {
        let mut prompt = format!(
            "Create a unique {} tattoo design concept based on: \"{}\".",
            self.style,
            self.prompt.trim()
        );

        if self.body_part != BodyPart::Other {
            prompt.push_str(&format!(
                " Design it specifically to fit well on the {}.",
                self.body_part
            ));
        }

        prompt.push_str(" The tattoo should be highly detailed with clean lines, using only black and shades of gray.");
        prompt.push_str(" Create a realistic tattoo design that would look good on actual skin, with proper contrast and spacing.");
        prompt.push_str(" The design should be isolated on a transparent or plain background to make it easy to visualize.");
        prompt
    }
}

pub trait ImageGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<ImageRef, GenerationError>;
}

/// Offline stand-in for the real provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaceholderGenerator {
    /// Hosted placeholder image URL.
    #[default]
    Remote,
    /// Self-contained data URI; needs no network at render time.
    Inline,
}

impl ImageGenerator for PlaceholderGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<ImageRef, GenerationError> {
        request.validate()?;
        debug!(
            style = %request.style,
            body_part = %request.body_part,
            size = request.size.as_str(),
            "Using placeholder tattoo image"
        );
        Ok(match self {
            Self::Remote => ImageRef::new(PLACEHOLDER_IMAGE_URL),
            Self::Inline => ImageRef::from_png_bytes(PLACEHOLDER_PNG),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_wire_names() {
        assert_eq!(serde_json::to_string(&ImageSize::Medium).unwrap(), "\"512x512\"");
        let size: ImageSize = serde_json::from_str("\"256x256\"").unwrap();
        assert_eq!(size, ImageSize::Small);
        assert_eq!(ImageSize::default().pixels(), 1024);
    }

    #[test]
    fn test_enhanced_prompt_includes_body_part() {
        let request = GenerationRequest {
            body_part: BodyPart::Forearm,
            style: TattooStyle::Japanese,
            ..GenerationRequest::new("koi fish")
        };
        let prompt = request.enhanced_prompt();
        assert!(prompt.starts_with("Create a unique japanese tattoo design concept based on: \"koi fish\"."));
        assert!(prompt.contains("fit well on the forearm"));
    }

    #[test]
    fn test_enhanced_prompt_skips_other() {
        let prompt = GenerationRequest::new("rose").enhanced_prompt();
        assert!(prompt.contains("realistic"));
        assert!(!prompt.contains("fit well on"));
    }

    #[test]
    fn test_placeholder_remote() {
        let image = PlaceholderGenerator::Remote.generate(&GenerationRequest::new("rose")).unwrap();
        assert_eq!(image.as_str(), PLACEHOLDER_IMAGE_URL);
    }

    #[test]
    fn test_placeholder_inline_is_png_data_uri() {
        let image = PlaceholderGenerator::Inline.generate(&GenerationRequest::new("rose")).unwrap();
        assert!(image.is_inline());
        assert!(image.as_str().starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let err = PlaceholderGenerator::default()
            .generate(&GenerationRequest::new("   "))
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptyPrompt));
    }
}
