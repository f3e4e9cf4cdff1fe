//! Tattoo Preview Core - Overlay Placement Engine
//!
//! # Guarantees
//! 1. Transforms Are Always In Range
//! 2. Composition Is Deterministic
//! 3. One Gesture, One Mutation
//! 4. A Design Exists Only After Its Write Succeeded
//! 5. Saving Twice Stores Once

pub mod blend;
pub mod catalog;
pub mod compositor;
pub mod config;
pub mod generation;
pub mod gesture;
pub mod hashing;
pub mod session;
pub mod store;
pub mod transform;
pub mod validation;

pub use blend::{BlendMode, Rgba, composite};
pub use catalog::{BodyPart, TattooStyle};
pub use compositor::{Compositor, CoordinateMapping, FitMode, ImageRef, Layer, LayerKind, Rect, SceneDescription, Size};
pub use config::{ConfigError, EngineConfig, DEFAULT_STORAGE_KEY};
pub use generation::{GenerationError, GenerationRequest, ImageGenerator, ImageSize, PlaceholderGenerator};
pub use gesture::{ControlInput, DragState, GestureMapper, PointerEvent, TransformMutation};
pub use hashing::fingerprint;
pub use session::{DesignSession, SaveOutcome, SessionError, SessionState};
pub use store::{BlobStore, Clock, Design, DesignDraft, DesignStore, FileBlobStore, MemoryBlobStore, StoreError, SystemClock};
pub use transform::{Point, RotateDirection, TransformModel, clamp};
pub use validation::{InputBundle, ValidationError, ValidationResult, Validator};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
