use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow, ensure};
use image::RgbImage;
use log::debug;
use rten::Model;
use rten_tensor::NdTensor;
use rten_tensor::prelude::*;

use crate::models::{Detection, RectF};

// Normalization for float models.
const IMAGE_MEAN: f32 = 128.0;
const IMAGE_STD: f32 = 128.0;

/// Object detector for seven-segment digits.
///
/// Implementations take a classifier-input-sized image and return detections
/// located in that same pixel space. `&mut self` reflects that inference
/// runtimes are not assumed thread-safe: one instance per capture session,
/// no concurrent calls.
pub trait Classifier {
    fn recognize_image(&mut self, image: &RgbImage) -> anyhow::Result<Vec<Detection>>;
}

/// SSD-style digit detector backed by an `.rten` model.
///
/// Model contract: one NHWC `[1, size, size, 3]` float input and four
/// outputs — box corners `[1, n, 4]` as normalized `{top, left, bottom,
/// right}`, class indices `[1, n]`, scores `[1, n]` and the number of valid
/// detections `[1]`.
pub struct SsdDigitDetector {
    model: Model,
    labels: Vec<String>,
    input_size: u32,
    quantized: bool,
}

impl SsdDigitDetector {
    /// Load the model and label map from disk. Missing or corrupt assets are
    /// a hard failure; the caller should disable capture and surface it.
    pub fn from_files(
        model_path: impl AsRef<Path>,
        labels_path: impl AsRef<Path>,
        input_size: u32,
        quantized: bool,
    ) -> anyhow::Result<Self> {
        let model_path = model_path.as_ref();
        let model = Model::load_file(model_path)
            .map_err(|e| anyhow!("failed to load digit model {}: {e}", model_path.display()))?;

        ensure!(
            model.input_ids().len() == 1,
            "digit model must have exactly one image input"
        );
        ensure!(
            model.output_ids().len() == 4,
            "unexpected digit model: expected 4 outputs (boxes, classes, scores, count), got {}",
            model.output_ids().len()
        );

        let labels = load_labels(labels_path.as_ref())?;

        Ok(Self {
            model,
            labels,
            input_size,
            quantized,
        })
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    /// Label for a raw class index. The SSD label map reserves entry 0 for
    /// the background class, so class indices are shifted up by one.
    fn label_for_class(&self, class_index: f32) -> String {
        let label_offset = 1;
        self.labels
            .get(class_index as usize + label_offset)
            .cloned()
            .unwrap_or_default()
    }
}

impl Classifier for SsdDigitDetector {
    fn recognize_image(&mut self, image: &RgbImage) -> anyhow::Result<Vec<Detection>> {
        ensure!(
            image.dimensions() == (self.input_size, self.input_size),
            "classifier input must be {0}x{0}, got {1}x{2}",
            self.input_size,
            image.width(),
            image.height()
        );

        let size = self.input_size as usize;
        let mut input = NdTensor::<f32, 4>::zeros([1, size, size, 3]);
        for (x, y, pixel) in image.enumerate_pixels() {
            for channel in 0..3 {
                let value = pixel[channel] as f32;
                // Quantized models take raw 0..255 values; float models take
                // mean/std normalized values.
                input[[0, y as usize, x as usize, channel]] = if self.quantized {
                    value
                } else {
                    (value - IMAGE_MEAN) / IMAGE_STD
                };
            }
        }

        let input_id = self.model.input_ids()[0];
        let output_ids = self.model.output_ids().to_vec();
        let outputs = self
            .model
            .run(vec![(input_id, input.view().into())], &output_ids, None)
            .map_err(|e| anyhow!("digit model inference failed: {e}"))?;

        let mut outputs = outputs.into_iter();
        let boxes: NdTensor<f32, 3> = outputs
            .next()
            .context("model returned no box output")?
            .try_into()
            .map_err(|_| anyhow!("box output has unexpected type or rank"))?;
        let classes: NdTensor<f32, 2> = outputs
            .next()
            .context("model returned no class output")?
            .try_into()
            .map_err(|_| anyhow!("class output has unexpected type or rank"))?;
        let scores: NdTensor<f32, 2> = outputs
            .next()
            .context("model returned no score output")?
            .try_into()
            .map_err(|_| anyhow!("score output has unexpected type or rank"))?;
        let count: NdTensor<f32, 1> = outputs
            .next()
            .context("model returned no detection-count output")?
            .try_into()
            .map_err(|_| anyhow!("detection-count output has unexpected type or rank"))?;

        let slots = boxes.size(1);
        let valid = (count[[0]] as usize).min(slots);
        let scale = self.input_size as f32;

        let detections: Vec<Detection> = (0..valid)
            .map(|i| {
                // Boxes arrive normalized as {top, left, bottom, right}.
                let rect = RectF::new(
                    boxes[[0, i, 1]] * scale,
                    boxes[[0, i, 0]] * scale,
                    boxes[[0, i, 3]] * scale,
                    boxes[[0, i, 2]] * scale,
                );
                Detection::new(self.label_for_class(classes[[0, i]]), scores[[0, i]], rect)
            })
            .collect();

        for d in &detections {
            debug!(
                "  {} @ {:.2} -> {:3.0} {:3.0} {:3.0} {:3.0}",
                d.label, d.confidence, d.rect.left, d.rect.top, d.rect.right, d.rect.bottom
            );
        }

        Ok(detections)
    }
}

/// One label per line, in class-index order with the background class first.
fn load_labels(path: &Path) -> anyhow::Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read label file {}", path.display()))?;
    Ok(contents.lines().map(str::to_owned).collect())
}
