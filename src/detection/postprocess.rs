use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::Detection;

/// Tunables for turning one region's raw detections into a digit string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssemblyOptions {
    /// Detections scoring below this are discarded; sub-threshold results
    /// are dominated by glare and shadow false positives.
    pub min_confidence: f32,
    /// Maximum deviation of a digit's vertical center from the reading's
    /// baseline, as a fraction of the crop height.
    pub row_tolerance_pct: f32,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            row_tolerance_pct: 0.15,
        }
    }
}

/// Assemble one region's detections into a digit string.
///
/// Filters by confidence, keeps only the detections sharing a row with the
/// one nearest the vertical midline (digits of one reading sit on one row;
/// off-row detections are noise), then concatenates labels left to right.
/// An empty result is a valid outcome; any retry policy belongs to the caller.
// FUTURE: filter by aspect ratio as well?
pub fn assemble_digits(
    detections: &[Detection],
    image_height: f32,
    options: &AssemblyOptions,
) -> String {
    let mut survivors: Vec<&Detection> = detections
        .iter()
        .filter(|d| d.confidence >= options.min_confidence)
        .collect();
    debug!(
        "{} of {} detections pass the confidence threshold",
        survivors.len(),
        detections.len()
    );

    // Only cluster when there is more than one candidate; a lone detection
    // is emitted regardless of where it sits.
    if survivors.len() > 1 {
        let midline = image_height / 2.0;
        let baseline = survivors
            .iter()
            .map(|d| d.rect.center_y())
            .min_by(|a, b| (midline - a).abs().total_cmp(&(midline - b).abs()))
            .unwrap();
        let tolerance = image_height * options.row_tolerance_pct;
        survivors.retain(|d| (d.rect.center_y() - baseline).abs() <= tolerance);
        debug!("{} detections share the baseline row", survivors.len());
    }

    survivors.sort_by(|a, b| a.rect.center_x().total_cmp(&b.rect.center_x()));
    survivors.iter().map(|d| d.label.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RectF;

    fn detection(label: &str, confidence: f32, center_x: f32, center_y: f32) -> Detection {
        Detection::new(
            label,
            confidence,
            RectF::new(center_x - 5.0, center_y - 5.0, center_x + 5.0, center_y + 5.0),
        )
    }

    #[test]
    fn sub_threshold_detections_never_contribute() {
        let detections = vec![
            detection("1", 0.49, 10.0, 50.0),
            detection("2", 0.5, 30.0, 50.0),
            detection("3", 0.9, 50.0, 50.0),
        ];
        let text = assemble_digits(&detections, 100.0, &AssemblyOptions::default());
        assert_eq!(text, "23");
    }

    #[test]
    fn off_row_detection_is_excluded() {
        // Centers at y = 45, 50, 120 with height 100: baseline is 50, the
        // detection at 120 deviates by 70 > tolerance 15 and is dropped.
        let detections = vec![
            detection("3", 0.9, 10.0, 45.0),
            detection("7", 0.8, 30.0, 50.0),
            detection("9", 0.95, 20.0, 120.0),
        ];
        let text = assemble_digits(&detections, 100.0, &AssemblyOptions::default());
        assert_eq!(text, "37");
    }

    #[test]
    fn output_order_follows_horizontal_centers_not_input_order() {
        let detections = vec![
            detection("8", 0.9, 90.0, 50.0),
            detection("1", 0.9, 10.0, 50.0),
            detection("4", 0.9, 50.0, 50.0),
        ];
        let text = assemble_digits(&detections, 100.0, &AssemblyOptions::default());
        assert_eq!(text, "148");
    }

    #[test]
    fn rerunning_yields_the_same_string() {
        let detections = vec![
            detection("6", 0.7, 40.0, 52.0),
            detection("2", 0.6, 20.0, 48.0),
            detection("0", 0.3, 60.0, 50.0),
        ];
        let options = AssemblyOptions::default();
        let first = assemble_digits(&detections, 100.0, &options);
        let second = assemble_digits(&detections, 100.0, &options);
        assert_eq!(first, second);
        assert_eq!(first, "26");
    }

    #[test]
    fn empty_input_gives_empty_string() {
        assert_eq!(assemble_digits(&[], 100.0, &AssemblyOptions::default()), "");
    }

    #[test]
    fn all_sub_threshold_gives_empty_string() {
        let detections = vec![
            detection("1", 0.3, 10.0, 50.0),
            detection("2", 0.3, 30.0, 50.0),
        ];
        assert_eq!(
            assemble_digits(&detections, 100.0, &AssemblyOptions::default()),
            ""
        );
    }

    #[test]
    fn single_detection_skips_row_filtering() {
        // Way off the midline, but alone, so it is emitted anyway.
        let detections = vec![detection("5", 0.8, 10.0, 95.0)];
        assert_eq!(
            assemble_digits(&detections, 100.0, &AssemblyOptions::default()),
            "5"
        );
    }
}
