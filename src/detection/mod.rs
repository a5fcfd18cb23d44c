pub mod classifier;
pub mod overlay;
pub mod postprocess;
pub mod preprocessing;
pub mod transform;

use image::DynamicImage;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::{Detection, Region, ScreenReading};
use classifier::Classifier;
use overlay::{OverlayTemplate, RegionFrame};
use postprocess::AssemblyOptions;
use transform::AffineTransform;

/// All tuning for a [`ScreenReader`], passed in at construction so behavior
/// stays deterministic under test. Nothing here is a process-wide static.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Side length of the classifier's square input.
    pub input_size: u32,
    /// Letterbox the crop into the input square instead of stretching it.
    pub maintain_aspect: bool,
    /// Blur sigma applied to the classifier input; `None` disables blurring.
    pub blur_sigma: Option<f32>,
    pub assembly: AssemblyOptions,
    pub template: OverlayTemplate,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            input_size: 200,
            maintain_aspect: true,
            blur_sigma: Some(1.0),
            assembly: AssemblyOptions::default(),
            template: OverlayTemplate::default(),
        }
    }
}

/// Everything produced for one region of one photograph: the digit string
/// plus both detection lists for diagnostic display. A single structured
/// result, returned synchronously.
#[derive(Debug, Clone)]
pub struct RegionReadout {
    pub region: Region,
    pub text: String,
    /// Detections in classifier-input space, as the model emitted them.
    pub raw_detections: Vec<Detection>,
    /// The same detections mapped back into the region crop's space.
    pub mapped_detections: Vec<Detection>,
}

/// Reads vital-sign digit strings off a photograph of the monitor screen.
///
/// Owns a long-lived classifier instance, reused across photographs.
/// Execution is synchronous; callers that care about responsiveness should
/// invoke it from their own background context.
pub struct ScreenReader<C: Classifier> {
    classifier: C,
    config: ReaderConfig,
    /// Last fully-valid reading, used to paper over transiently garbled fields.
    previous: Option<ScreenReading>,
}

impl<C: Classifier> ScreenReader<C> {
    pub fn new(classifier: C) -> Self {
        Self::with_config(classifier, ReaderConfig::default())
    }

    pub fn with_config(classifier: C, config: ReaderConfig) -> Self {
        Self {
            classifier,
            config,
            previous: None,
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Run the full pipeline for one region: crop, resize to the classifier
    /// input, optionally blur, detect, map detections back into crop space
    /// and assemble the digit string.
    pub fn read_region(
        &mut self,
        photo: &DynamicImage,
        region: Region,
    ) -> anyhow::Result<RegionReadout> {
        let crop = self
            .config
            .template
            .extract_region(photo, region, RegionFrame::FullImage);
        debug!(
            "{region:?}: cropped {}x{} from {}x{} photo",
            crop.width(),
            crop.height(),
            photo.width(),
            photo.height()
        );

        let forward = AffineTransform::frame_to_input(
            crop.width(),
            crop.height(),
            self.config.input_size,
            self.config.maintain_aspect,
        );
        let mut input = preprocessing::resize_for_input(&crop, &forward, self.config.input_size);
        if let Some(sigma) = self.config.blur_sigma {
            input = preprocessing::apply_blur(&input, sigma);
        }

        let raw_detections = self.classifier.recognize_image(&input)?;

        let inverse = forward.invert();
        let mapped_detections: Vec<Detection> = raw_detections
            .iter()
            .map(|d| Detection {
                rect: inverse.map_rect(&d.rect),
                ..d.clone()
            })
            .collect();

        let text = postprocess::assemble_digits(
            &mapped_detections,
            crop.height() as f32,
            &self.config.assembly,
        );
        debug!("{region:?}: \"{text}\" from {} detections", raw_detections.len());

        Ok(RegionReadout {
            region,
            text,
            raw_detections,
            mapped_detections,
        })
    }

    /// Read the three digit bands of one photograph.
    pub fn read_screen(&mut self, photo: &DynamicImage) -> anyhow::Result<ScreenReading> {
        let mut reading = ScreenReading::default();
        for region in Region::READINGS {
            let readout = self.read_region(photo, region)?;
            match region {
                Region::Systolic => reading.systolic = readout.text,
                Region::Diastolic => reading.diastolic = readout.text,
                Region::HeartRate => reading.heart_rate = readout.text,
                Region::Screen => unreachable!(),
            }
        }
        Ok(reading)
    }

    /// Read the screen and validate against physiological ranges.
    ///
    /// Returns `None` until a first fully-valid reading has been seen. After
    /// that, fields that fail validation fall back to the previous reading's
    /// values, so momentary glare on one band does not discard a frame.
    pub fn read_screen_validated(
        &mut self,
        photo: &DynamicImage,
    ) -> anyhow::Result<Option<ScreenReading>> {
        let reading = self.read_screen(photo)?;
        let result = match &self.previous {
            None => reading.is_fully_valid().then_some(reading),
            Some(previous) => Some(reading.merged_with(previous)),
        };
        if let Some(result) = &result {
            self.previous = Some(result.clone());
        }
        Ok(result)
    }
}
