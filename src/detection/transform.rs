use crate::models::RectF;

/// Scale-and-translate mapping between an image frame and the classifier's
/// square input. No rotation or shear is ever needed in this pipeline, so the
/// transform is kept as four scalars rather than a full matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    sx: f32,
    sy: f32,
    tx: f32,
    ty: f32,
}

impl AffineTransform {
    /// Transform from a `width` x `height` frame into a `size` x `size`
    /// classifier input.
    ///
    /// With `maintain_aspect`, the frame is scaled uniformly to fit and
    /// centered, leaving letterbox padding on the shorter axis. Otherwise
    /// each axis is scaled independently to fill the square.
    pub fn frame_to_input(width: u32, height: u32, size: u32, maintain_aspect: bool) -> Self {
        let (width, height, size) = (width as f32, height as f32, size as f32);
        if maintain_aspect {
            let scale = (size / width).min(size / height);
            Self {
                sx: scale,
                sy: scale,
                tx: (size - width * scale) / 2.0,
                ty: (size - height * scale) / 2.0,
            }
        } else {
            Self {
                sx: size / width,
                sy: size / height,
                tx: 0.0,
                ty: 0.0,
            }
        }
    }

    pub fn scale_x(&self) -> f32 {
        self.sx
    }

    pub fn scale_y(&self) -> f32 {
        self.sy
    }

    pub fn translate_x(&self) -> f32 {
        self.tx
    }

    pub fn translate_y(&self) -> f32 {
        self.ty
    }

    /// Exact inverse.
    ///
    /// The scale factors produced by [`frame_to_input`](Self::frame_to_input)
    /// are strictly positive for non-empty frames, so a singular transform
    /// here is an internal consistency bug.
    pub fn invert(&self) -> Self {
        assert!(
            self.sx != 0.0 && self.sy != 0.0,
            "cannot invert singular transform {self:?}"
        );
        Self {
            sx: 1.0 / self.sx,
            sy: 1.0 / self.sy,
            tx: -self.tx / self.sx,
            ty: -self.ty / self.sy,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.sx + self.tx, y * self.sy + self.ty)
    }

    /// Transform all four corners of `rect` and return their bounding rect.
    pub fn map_rect(&self, rect: &RectF) -> RectF {
        let corners = [
            self.apply(rect.left, rect.top),
            self.apply(rect.right, rect.top),
            self.apply(rect.left, rect.bottom),
            self.apply(rect.right, rect.bottom),
        ];
        let mut mapped = RectF::new(corners[0].0, corners[0].1, corners[0].0, corners[0].1);
        for (x, y) in corners {
            mapped.left = mapped.left.min(x);
            mapped.top = mapped.top.min(y);
            mapped.right = mapped.right.max(x);
            mapped.bottom = mapped.bottom.max(y);
        }
        mapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rect_close(a: &RectF, b: &RectF) {
        const EPS: f32 = 1e-4;
        assert!(
            (a.left - b.left).abs() < EPS
                && (a.top - b.top).abs() < EPS
                && (a.right - b.right).abs() < EPS
                && (a.bottom - b.bottom).abs() < EPS,
            "rects differ: {a:?} vs {b:?}"
        );
    }

    #[test]
    fn letterbox_centers_wide_frame() {
        // 400x100 into 200x200: uniform scale 0.5, vertical padding 75 each side.
        let t = AffineTransform::frame_to_input(400, 100, 200, true);
        assert_eq!(t.apply(0.0, 0.0), (0.0, 75.0));
        assert_eq!(t.apply(400.0, 100.0), (200.0, 125.0));
    }

    #[test]
    fn independent_axis_scale_fills_square() {
        let t = AffineTransform::frame_to_input(400, 100, 200, false);
        assert_eq!(t.apply(400.0, 100.0), (200.0, 200.0));
        assert_eq!(t.apply(0.0, 0.0), (0.0, 0.0));
    }

    #[test]
    fn invert_round_trips_rect() {
        let t = AffineTransform::frame_to_input(317, 143, 200, true);
        let rect = RectF::new(12.5, 30.25, 140.0, 90.75);
        let round_tripped = t.invert().map_rect(&t.map_rect(&rect));
        assert_rect_close(&rect, &round_tripped);
    }

    #[test]
    fn invert_round_trips_independent_axes() {
        let t = AffineTransform::frame_to_input(640, 480, 200, false);
        let rect = RectF::new(100.0, 50.0, 300.0, 400.0);
        let round_tripped = t.invert().map_rect(&t.map_rect(&rect));
        assert_rect_close(&rect, &round_tripped);
    }

    #[test]
    fn map_rect_scales_corners() {
        let t = AffineTransform::frame_to_input(100, 100, 200, true);
        let mapped = t.map_rect(&RectF::new(10.0, 20.0, 30.0, 40.0));
        assert_rect_close(&mapped, &RectF::new(20.0, 40.0, 60.0, 80.0));
    }
}
