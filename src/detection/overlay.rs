use image::DynamicImage;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::{RectF, Region};

/// Which frame region coordinates are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionFrame {
    /// The full camera photograph, framed against the calibration overlay.
    FullImage,
    /// An image already cropped to the screen region.
    Screen,
}

/// Calibrated reference geometry of the monitor's display layout.
///
/// Margins and band heights are in reference pixels, measured once against a
/// reference photograph. The tolerance percentages are relative to the
/// reference width: the outer screen boundary expands *outward* (misframing
/// dominates at the photo edges) while the boundaries between the SYS/DIA/HR
/// bands expand *inward*, letting adjacent crops overlap so a digit sitting
/// on a boundary is clipped from neither. The two tolerances currently share
/// a value but are deliberately separate knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayTemplate {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub sys_height: f32,
    pub dia_height: f32,
    pub hr_height: f32,
    pub outside_error_pct: f32,
    pub inside_error_pct: f32,
}

impl Default for OverlayTemplate {
    fn default() -> Self {
        // Reference geometry measured from the calibration overlay artwork.
        Self {
            width: 800.0,
            height: 1305.0,
            margin_top: 243.0,
            margin_left: 216.0,
            margin_right: 217.0,
            margin_bottom: 566.0,
            sys_height: 174.0,
            dia_height: 168.0,
            hr_height: 160.0,
            outside_error_pct: 0.05,
            inside_error_pct: 0.05,
        }
    }
}

impl OverlayTemplate {
    fn outside_delta(&self) -> f32 {
        self.width * self.outside_error_pct
    }

    fn inside_delta(&self) -> f32 {
        self.width * self.inside_error_pct
    }

    fn screen_rect(&self) -> RectF {
        let outside = self.outside_delta();
        RectF::new(
            self.margin_left - outside,
            self.margin_top - outside,
            self.width - self.margin_right + outside,
            self.height - self.margin_bottom + outside,
        )
    }

    /// Tolerant crop rectangle for `region`, in reference coordinates of the
    /// requested frame.
    pub fn region_rect(&self, region: Region, frame: RegionFrame) -> RectF {
        let screen = self.screen_rect();
        let inside = self.inside_delta();
        let sys_bottom = self.margin_top + self.sys_height;
        let dia_bottom = sys_bottom + self.dia_height;

        let mut rect = match region {
            Region::Screen => screen,
            Region::Systolic => RectF::new(screen.left, screen.top, screen.right, sys_bottom + inside),
            Region::Diastolic => RectF::new(
                screen.left,
                sys_bottom - inside,
                screen.right,
                dia_bottom + inside,
            ),
            Region::HeartRate => {
                RectF::new(screen.left, dia_bottom - inside, screen.right, screen.bottom)
            }
        };

        if frame == RegionFrame::Screen {
            // Re-origin to the screen crop's top-left so the same geometry
            // applies to an image that was already trimmed to the screen.
            rect.left -= screen.left;
            rect.right -= screen.left;
            rect.top -= screen.top;
            rect.bottom -= screen.top;
        }
        rect
    }

    /// Reference width that an actual bitmap of this frame corresponds to;
    /// the divisor when scaling reference coordinates onto it.
    pub fn reference_width(&self, frame: RegionFrame) -> f32 {
        match frame {
            RegionFrame::FullImage => self.width,
            RegionFrame::Screen => self.screen_rect().width(),
        }
    }

    /// Crop the region out of `source`, scaling the reference rect to the
    /// bitmap's width first.
    pub fn extract_region(
        &self,
        source: &DynamicImage,
        region: Region,
        frame: RegionFrame,
    ) -> DynamicImage {
        let rect = self.region_rect(region, frame);
        let scaled = scale_to_image(&rect, self.reference_width(frame), source.width() as f32);
        extract(source, &scaled)
    }
}

/// Scale all four coordinates uniformly by `actual_width / reference_width`.
///
/// Width-only scaling assumes the template aspect ratio matches the captured
/// image; a known simplification.
pub fn scale_to_image(rect: &RectF, reference_width: f32, actual_width: f32) -> RectF {
    let scale = actual_width / reference_width;
    RectF::new(
        rect.left * scale,
        rect.top * scale,
        rect.right * scale,
        rect.bottom * scale,
    )
}

/// Crop `rect` out of `source`, silently clamping to the image bounds when
/// the rectangle spills past an edge.
pub fn extract(source: &DynamicImage, rect: &RectF) -> DynamicImage {
    debug!(
        "extracting region p1: {:.1},{:.1}; p2: {:.1}/{}, {:.1}/{}",
        rect.left,
        rect.top,
        rect.right,
        source.width(),
        rect.bottom,
        source.height()
    );

    let left = (rect.left.round().max(0.0) as u32).min(source.width());
    let top = (rect.top.round().max(0.0) as u32).min(source.height());
    let right = (rect.right.round().max(0.0) as u32).min(source.width());
    let bottom = (rect.bottom.round().max(0.0) as u32).min(source.height());

    source.crop_imm(
        left,
        top,
        right.saturating_sub(left),
        bottom.saturating_sub(top),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_rect_applies_outside_tolerance() {
        let template = OverlayTemplate::default();
        // outside delta = 800 * 0.05 = 40
        let rect = template.region_rect(Region::Screen, RegionFrame::FullImage);
        assert_eq!(rect, RectF::new(176.0, 203.0, 623.0, 779.0));
    }

    #[test]
    fn adjacent_bands_overlap_by_inside_tolerance() {
        let template = OverlayTemplate::default();
        let sys = template.region_rect(Region::Systolic, RegionFrame::FullImage);
        let dia = template.region_rect(Region::Diastolic, RegionFrame::FullImage);
        let hr = template.region_rect(Region::HeartRate, RegionFrame::FullImage);
        // A digit straddling a band boundary stays inside both crops.
        assert!(dia.top < sys.bottom);
        assert!(hr.top < dia.bottom);
        assert_eq!(sys.bottom - dia.top, 2.0 * 800.0 * 0.05);
    }

    #[test]
    fn screen_frame_reorigins_to_screen_top_left() {
        let template = OverlayTemplate::default();
        let screen = template.region_rect(Region::Screen, RegionFrame::Screen);
        assert_eq!(screen.left, 0.0);
        assert_eq!(screen.top, 0.0);

        let full = template.region_rect(Region::Systolic, RegionFrame::FullImage);
        let relative = template.region_rect(Region::Systolic, RegionFrame::Screen);
        assert_eq!(relative.width(), full.width());
        assert_eq!(relative.height(), full.height());
        assert_eq!(relative.top, full.top - 203.0);
    }

    #[test]
    fn doubling_image_width_doubles_scaled_rect() {
        let template = OverlayTemplate::default();
        let rect = template.region_rect(Region::Screen, RegionFrame::FullImage);
        let scaled = scale_to_image(&rect, 800.0, 1600.0);
        assert_eq!(scaled.left, rect.left * 2.0);
        assert_eq!(scaled.top, rect.top * 2.0);
        assert_eq!(scaled.right, rect.right * 2.0);
        assert_eq!(scaled.bottom, rect.bottom * 2.0);
    }

    #[test]
    fn extraction_clamps_to_image_bounds() {
        let img = DynamicImage::new_rgb8(100, 80);
        let crop = extract(&img, &RectF::new(-20.0, 50.0, 140.0, 200.0));
        assert_eq!(crop.width(), 100);
        assert_eq!(crop.height(), 30);
    }

    #[test]
    fn extraction_rounds_fractional_edges() {
        let img = DynamicImage::new_rgb8(100, 100);
        let crop = extract(&img, &RectF::new(10.4, 10.6, 20.4, 30.6));
        assert_eq!(crop.width(), 10);
        assert_eq!(crop.height(), 20);
    }
}
