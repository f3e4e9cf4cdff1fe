//! Design Session - Single Entry Point for Editing
//!
//! A session owns one live transform. Every applied mutation recomposes the
//! scene. Saving freezes the transform into a draft; while the write is in
//! flight the `Saving` state rejects further saves and edits.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{BodyPart, TattooStyle};
use crate::compositor::{Compositor, ImageRef, SceneDescription};
use crate::config::EngineConfig;
use crate::gesture::{ControlInput, DragState, GestureMapper, PointerEvent, TransformMutation};
use crate::store::{BlobStore, Clock, Design, DesignDraft, DesignStore, StoreError, SystemClock};
use crate::transform::TransformModel;
use crate::validation::{InputBundle, ValidationError, ValidationResult, Validator};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Saving design failed: {0}")]
    Storage(#[from] StoreError),

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("Design already saved")]
    AlreadySaved,

    #[error("No save in progress")]
    NotSaving,

    #[error("No overlay image to save")]
    MissingOverlay,
}

impl SessionError {
    /// Storage failures leave the session editable; retrying may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::SaveInProgress)
    }

    /// Short message suitable for an alert.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Some of the design details are invalid.",
            Self::Storage(_) => "The design could not be saved. Please try again.",
            Self::SaveInProgress => "The design is being saved.",
            Self::AlreadySaved => "This design has already been saved.",
            Self::NotSaving => "There is no save to finish.",
            Self::MissingOverlay => "Generate a tattoo before saving.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Editing,
    Saving,
    /// Terminal.
    Saved,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(Design),
    /// `save` on a saved session is a no-op returning the existing design.
    AlreadySaved(Design),
}

impl SaveOutcome {
    pub fn design(&self) -> &Design {
        match self {
            Self::Saved(d) | Self::AlreadySaved(d) => d,
        }
    }
}

pub struct DesignSession {
    user_image: ImageRef,
    overlay_image: Option<ImageRef>,
    description: String,
    style: TattooStyle,
    body_part: BodyPart,
    compositor: Compositor,
    gestures: GestureMapper,
    model: TransformModel,
    scene: SceneDescription,
    state: SessionState,
    saved: Option<Design>,
    validation: ValidationResult,
    opened_at: i64,
}

impl DesignSession {
    /// Open a session from the navigation shell's input bundle.
    ///
    /// Bundle errors reject the session; warnings (missing overlay, unknown
    /// style) are kept on the session and resolved with fallbacks.
    pub fn new(bundle: InputBundle, config: &EngineConfig) -> Result<Self, SessionError> {
        Self::new_with_clock(bundle, config, &SystemClock)
    }

    /// Like [`DesignSession::new`], stamping the open time from `clock`.
    /// Pass the store's clock so the saved `createdAt` is strictly later.
    pub fn new_with_clock(
        bundle: InputBundle,
        config: &EngineConfig,
        clock: &dyn Clock,
    ) -> Result<Self, SessionError> {
        let validation = Validator::new().check(&bundle)?;
        for warning in validation.warnings() {
            warn!(rule = %warning.rule, message = %warning.message, "Input bundle warning");
        }

        let model = TransformModel::default().with_position(config.default_position);
        let session = Self::assemble(
            ImageRef::new(bundle.user_image.as_str()),
            ImageRef::non_empty(&bundle.overlay_image),
            bundle.description.clone(),
            bundle.resolved_style(),
            bundle.resolved_body_part(),
            model,
            config,
            validation,
            clock.now_millis(),
        );

        info!(
            overlay = session.overlay_image.is_some(),
            style = %session.style,
            body_part = %session.body_part,
            "Design session opened"
        );
        Ok(session)
    }

    /// Reopen a saved design as a fresh editing session, restoring its
    /// placement when one was stored.
    pub fn from_design(design: &Design, config: &EngineConfig) -> Self {
        let model = design
            .placement()
            .copied()
            .unwrap_or_else(|| TransformModel::default().with_position(config.default_position));

        debug!(id = %design.id(), "Reopening saved design");
        Self::assemble(
            design.user_image().clone(),
            Some(design.overlay_image().clone()).filter(|r| !r.is_empty()),
            design.description().to_string(),
            design.style(),
            design.body_part(),
            model,
            config,
            ValidationResult { valid: true, violations: vec![] },
            SystemClock.now_millis(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        user_image: ImageRef,
        overlay_image: Option<ImageRef>,
        description: String,
        style: TattooStyle,
        body_part: BodyPart,
        model: TransformModel,
        config: &EngineConfig,
        validation: ValidationResult,
        opened_at: i64,
    ) -> Self {
        let compositor = Compositor::new(config);
        let scene = compositor.compose(Some(&user_image), overlay_image.as_ref(), &model);
        Self {
            user_image,
            overlay_image,
            description,
            style,
            body_part,
            compositor,
            gestures: GestureMapper::new(config.rotation_step),
            model,
            scene,
            state: SessionState::Editing,
            saved: None,
            validation,
            opened_at,
        }
    }

    pub fn state(&self) -> SessionState { self.state }
    pub fn model(&self) -> &TransformModel { &self.model }
    pub fn scene(&self) -> &SceneDescription { &self.scene }
    pub fn drag_state(&self) -> DragState { self.gestures.state() }
    pub fn style(&self) -> TattooStyle { self.style }
    pub fn body_part(&self) -> BodyPart { self.body_part }
    pub fn description(&self) -> &str { &self.description }
    pub fn user_image(&self) -> &ImageRef { &self.user_image }
    pub fn overlay_image(&self) -> Option<&ImageRef> { self.overlay_image.as_ref() }
    pub fn saved_design(&self) -> Option<&Design> { self.saved.as_ref() }
    pub fn validation(&self) -> &ValidationResult { &self.validation }
    /// Epoch millis when the session opened.
    pub fn opened_at(&self) -> i64 { self.opened_at }

    /// Attach the overlay once generation finishes after the session opened.
    /// Returns `false` outside `Editing`.
    pub fn set_overlay(&mut self, overlay: ImageRef) -> bool {
        if self.state != SessionState::Editing {
            return false;
        }
        self.overlay_image = Some(overlay).filter(|r| !r.is_empty());
        self.recompose();
        true
    }

    /// Feed a pointer event. Returns whether the transform changed.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        if self.state != SessionState::Editing {
            debug!(state = ?self.state, "Pointer event ignored outside editing");
            return false;
        }
        match self.gestures.on_pointer(event, &self.scene) {
            Some(mutation) => {
                self.apply(mutation);
                true
            }
            None => false,
        }
    }

    /// Apply a control input. Returns whether the transform was updated
    /// (`false` outside `Editing`).
    pub fn apply_control(&mut self, input: ControlInput) -> Result<bool, SessionError> {
        if self.state != SessionState::Editing {
            debug!(state = ?self.state, "Control input ignored outside editing");
            return Ok(false);
        }
        let mutation = self.gestures.on_control(input)?;
        self.apply(mutation);
        Ok(true)
    }

    fn apply(&mut self, mutation: TransformMutation) {
        self.model = mutation.apply(self.model);
        self.recompose();
    }

    fn recompose(&mut self) {
        self.scene = self.compositor.compose(
            Some(&self.user_image),
            self.overlay_image.as_ref(),
            &self.model,
        );
    }

    /// Enter `Saving` and hand back the frozen draft for the caller to persist.
    pub fn begin_save(&mut self) -> Result<DesignDraft, SessionError> {
        match self.state {
            SessionState::Saving => return Err(SessionError::SaveInProgress),
            SessionState::Saved => return Err(SessionError::AlreadySaved),
            SessionState::Editing => {}
        }

        let overlay_image = self.overlay_image.clone().ok_or(SessionError::MissingOverlay)?;

        self.gestures.reset();
        self.state = SessionState::Saving;
        debug!("Session saving");

        Ok(DesignDraft {
            user_image: self.user_image.clone(),
            overlay_image,
            description: self.description.clone(),
            style: self.style,
            body_part: self.body_part,
            placement: Some(self.model),
            not_before: Some(self.opened_at),
        })
    }

    /// Resolve an in-flight save with the store's result.
    pub fn complete_save(
        &mut self,
        result: Result<Design, StoreError>,
    ) -> Result<&Design, SessionError> {
        if self.state != SessionState::Saving {
            return Err(SessionError::NotSaving);
        }

        match result {
            Ok(design) => {
                info!(id = %design.id(), "Design session saved");
                self.state = SessionState::Saved;
                Ok(&*self.saved.insert(design))
            }
            Err(e) => {
                warn!(error = %e, "Design save failed, back to editing");
                self.state = SessionState::Editing;
                Err(SessionError::Storage(e))
            }
        }
    }

    /// Save through `store` in one step. Repeated calls after success are
    /// no-ops, so the store never receives a second record.
    pub fn save<B: BlobStore>(&mut self, store: &DesignStore<B>) -> Result<SaveOutcome, SessionError> {
        if let (SessionState::Saved, Some(design)) = (self.state, &self.saved) {
            debug!(id = %design.id(), "Save ignored, already saved");
            return Ok(SaveOutcome::AlreadySaved(design.clone()));
        }

        let draft = self.begin_save()?;
        let design = self.complete_save(store.create(draft))?;
        Ok(SaveOutcome::Saved(design.clone()))
    }
}
