mod state;

pub use state::{CancelToken, CapturedPhoto, EpochGuard, PipelineState};

use std::sync::Arc;
use std::time::SystemTime;

use anyhow::anyhow;
use image::{Rgba, RgbaImage};

use crate::catalog::Character;
use crate::compositing::{
    apply_cut_overlay, remove_background_or_original, OverlayConfig, OverlayLibrary, WHITE,
};
use crate::layout::{build_collage, CollageOptions, EncodedCollage, LayoutVariant, PhotoSource};
use crate::output::suggested_filename;
use crate::segmentation::SegmentationEngine;
use crate::{BoothError, BoothResult, CUT_COUNT};

/// Turns four captured photos into a collage: segment and flatten the
/// background on the cuts the variant selects, overlay every cut, lay out.
pub struct Pipeline {
    variant: LayoutVariant,
    segmentation: Option<Arc<SegmentationEngine>>,
    overlays: Arc<OverlayLibrary>,
    overlay_config: OverlayConfig,
    collage: CollageOptions,
    fill: Rgba<u8>,
}

impl Pipeline {
    pub fn new(variant: LayoutVariant, overlays: Arc<OverlayLibrary>) -> Self {
        Self {
            variant,
            segmentation: None,
            overlays,
            overlay_config: OverlayConfig::collage(),
            collage: CollageOptions::default(),
            fill: WHITE,
        }
    }

    /// Without an engine every cut keeps its original background.
    pub fn with_segmentation(mut self, engine: Arc<SegmentationEngine>) -> Self {
        self.segmentation = Some(engine);
        self
    }

    pub fn with_overlay_config(mut self, config: OverlayConfig) -> Self {
        self.overlay_config = config;
        self
    }

    pub fn with_collage_options(mut self, options: CollageOptions) -> Self {
        self.collage = options;
        self
    }

    pub fn with_fill(mut self, fill: Rgba<u8>) -> Self {
        self.fill = fill;
        self
    }

    pub fn variant(&self) -> LayoutVariant {
        self.variant
    }

    /// Runs a whole generation with no way to cancel it.
    pub fn generate(
        &self,
        photos: &[CapturedPhoto],
        character: &Character,
    ) -> BoothResult<EncodedCollage> {
        self.run(photos, character, &CancelToken::new().guard(), |_| {})?
            .ok_or_else(|| BoothError::Other(anyhow!("generation cancelled")))
    }

    /// Runs a generation, reporting each stage to `on_stage`. Returns
    /// `Ok(None)` when `guard` was cancelled before the collage was built.
    pub fn run(
        &self,
        photos: &[CapturedPhoto],
        character: &Character,
        guard: &EpochGuard,
        mut on_stage: impl FnMut(PipelineState),
    ) -> BoothResult<Option<EncodedCollage>> {
        if photos.len() != CUT_COUNT {
            return Err(BoothError::InvalidPhotoCount(photos.len()));
        }
        let _span = tracing::info_span!(
            "generate",
            character = %character.name,
            variant = %self.variant
        )
        .entered();

        let Some(processed) = self.process_photos(photos, character, guard, &mut on_stage) else {
            tracing::info!("Generation cancelled before layout");
            return Ok(None);
        };

        let sources: Vec<PhotoSource> = processed.into_iter().map(PhotoSource::from).collect();
        let collage = build_collage(&sources, self.variant, &self.collage)?;
        Ok(Some(collage))
    }

    /// Background removal and overlay for every cut, in order. `None` when
    /// cancelled between cuts.
    pub fn process_photos(
        &self,
        photos: &[CapturedPhoto],
        character: &Character,
        guard: &EpochGuard,
        on_stage: &mut impl FnMut(PipelineState),
    ) -> Option<Vec<RgbaImage>> {
        let removal = self.variant.spec().background_removal;
        let mut processed = Vec::with_capacity(photos.len());

        for (cut, photo) in photos.iter().enumerate() {
            if guard.is_cancelled() {
                return None;
            }

            let base = match &self.segmentation {
                Some(engine) if removal.applies_to(cut) => {
                    self.remove_background(engine, cut, &photo.image, on_stage)
                }
                _ => photo.image.clone(),
            };

            on_stage(PipelineState::Compositing { cut });
            processed.push(apply_cut_overlay(
                &base,
                &self.overlays,
                character,
                cut,
                &self.overlay_config,
            ));
        }

        (!guard.is_cancelled()).then_some(processed)
    }

    fn remove_background(
        &self,
        engine: &SegmentationEngine,
        cut: usize,
        image: &RgbaImage,
        on_stage: &mut impl FnMut(PipelineState),
    ) -> RgbaImage {
        on_stage(PipelineState::Segmenting { cut });
        remove_background_or_original(engine, image, self.fill, || {
            on_stage(PipelineState::Replacing { cut })
        })
    }
}

/// A four-cut session for one character.
///
/// The fourth capture runs the pipeline on the caller's thread. A fatal
/// error leaves the session `Failed` with its photos cleared, so the next
/// capture starts again from one.
pub struct CaptureSession {
    pipeline: Arc<Pipeline>,
    character: Character,
    photos: Vec<CapturedPhoto>,
    state: PipelineState,
    cancel: CancelToken,
}

impl CaptureSession {
    pub fn new(pipeline: Arc<Pipeline>, character: Character) -> Self {
        Self {
            pipeline,
            character,
            photos: Vec::with_capacity(CUT_COUNT),
            state: PipelineState::Idle,
            cancel: CancelToken::new(),
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn photos(&self) -> &[CapturedPhoto] {
        &self.photos
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    /// Cancelling through this token drops the result of a running generation.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn collage(&self) -> Option<&EncodedCollage> {
        match &self.state {
            PipelineState::Complete(collage) => Some(collage),
            _ => None,
        }
    }

    pub fn suggested_filename(&self) -> String {
        suggested_filename(&self.character.name, SystemTime::now())
    }

    /// Adds a photo. The fourth one triggers generation.
    pub fn capture(&mut self, image: RgbaImage) -> BoothResult<&PipelineState> {
        if matches!(self.state, PipelineState::Complete(_)) || self.photos.len() >= CUT_COUNT {
            return Err(BoothError::InvalidPhotoCount(self.photos.len() + 1));
        }

        let id = self.photos.len() as u32 + 1;
        self.photos.push(CapturedPhoto::new(id, image));
        self.state = PipelineState::Capturing {
            count: self.photos.len(),
        };
        tracing::info!("Captured photo {}/{}", id, CUT_COUNT);

        if self.photos.len() == CUT_COUNT {
            self.generate()?;
        }
        Ok(&self.state)
    }

    /// Removes a photo and renumbers the rest. Only while capturing.
    pub fn delete_photo(&mut self, id: u32) -> bool {
        if !matches!(self.state, PipelineState::Capturing { .. }) {
            return false;
        }
        let before = self.photos.len();
        self.photos.retain(|p| p.id != id);
        if self.photos.len() == before {
            return false;
        }

        for (i, photo) in self.photos.iter_mut().enumerate() {
            photo.id = i as u32 + 1;
        }
        self.state = match self.photos.len() {
            0 => PipelineState::Idle,
            count => PipelineState::Capturing { count },
        };
        true
    }

    /// Clears photos and any result, and supersedes in-flight work.
    pub fn reset(&mut self) {
        self.cancel.cancel();
        self.photos.clear();
        self.state = PipelineState::Idle;
    }

    fn generate(&mut self) -> BoothResult<()> {
        let guard = self.cancel.guard();
        let pipeline = self.pipeline.clone();
        let state = &mut self.state;
        let result = pipeline.run(&self.photos, &self.character, &guard, |stage| {
            tracing::debug!(?stage, "pipeline stage");
            *state = stage;
        });

        if guard.is_cancelled() {
            tracing::info!("Discarding result of a superseded generation");
            self.photos.clear();
            self.state = PipelineState::Idle;
            return Ok(());
        }

        match result {
            Ok(Some(collage)) => {
                self.state = PipelineState::Complete(collage);
                Ok(())
            }
            Ok(None) => {
                self.photos.clear();
                self.state = PipelineState::Idle;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Generation failed, photos cleared: {}", e);
                self.photos.clear();
                self.state = PipelineState::Failed {
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }
}
