/// Axis-aligned rectangle in floating-point pixel coordinates.
///
/// Callers are responsible for keeping `left < right` and `top < bottom`;
/// the pipeline never constructs a degenerate rect from a valid one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectF {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl RectF {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// One labeled, located, scored output of the digit classifier.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Digit label ("0".."9"); empty when the class index had no label.
    pub label: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
    /// Bounding box; the coordinate space depends on the pipeline stage
    /// (classifier-input space for raw results, sub-image space once mapped).
    pub rect: RectF,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, rect: RectF) -> Self {
        Self {
            label: label.into(),
            confidence,
            rect,
        }
    }
}

/// Symbolic regions of the monitor screen overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// The whole display area of the device.
    Screen,
    /// Systolic blood pressure band.
    Systolic,
    /// Diastolic blood pressure band.
    Diastolic,
    /// Heart rate band.
    HeartRate,
}

impl Region {
    /// The three digit-bearing bands, top to bottom.
    pub const READINGS: [Region; 3] = [Region::Systolic, Region::Diastolic, Region::HeartRate];
}

// Physiological plausibility bounds for a reading.
pub const MIN_SYSTOLIC: u32 = 50;
pub const MAX_SYSTOLIC: u32 = 300;
pub const MIN_DIASTOLIC: u32 = 30;
pub const MAX_DIASTOLIC: u32 = 200;
pub const MIN_HEART_RATE: u32 = 30;
pub const MAX_HEART_RATE: u32 = 250;

/// Digit strings read from one photograph of the screen.
///
/// Values are kept as the raw recognized text; an empty or implausible
/// string is a valid (if unhelpful) outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScreenReading {
    pub systolic: String,
    pub diastolic: String,
    pub heart_rate: String,
}

impl ScreenReading {
    pub fn systolic_value(&self) -> Option<u32> {
        parse_in_range(&self.systolic, MIN_SYSTOLIC, MAX_SYSTOLIC)
    }

    pub fn diastolic_value(&self) -> Option<u32> {
        parse_in_range(&self.diastolic, MIN_DIASTOLIC, MAX_DIASTOLIC)
    }

    pub fn heart_rate_value(&self) -> Option<u32> {
        parse_in_range(&self.heart_rate, MIN_HEART_RATE, MAX_HEART_RATE)
    }

    /// True when all three fields parse to plausible values.
    pub fn is_fully_valid(&self) -> bool {
        self.systolic_value().is_some()
            && self.diastolic_value().is_some()
            && self.heart_rate_value().is_some()
    }

    /// Merge with the previous fully-valid reading: per field, a plausible
    /// new value wins, otherwise the previous value is kept.
    pub fn merged_with(&self, previous: &ScreenReading) -> ScreenReading {
        ScreenReading {
            systolic: if self.systolic_value().is_some() {
                self.systolic.clone()
            } else {
                previous.systolic.clone()
            },
            diastolic: if self.diastolic_value().is_some() {
                self.diastolic.clone()
            } else {
                previous.diastolic.clone()
            },
            heart_rate: if self.heart_rate_value().is_some() {
                self.heart_rate.clone()
            } else {
                previous.heart_rate.clone()
            },
        }
    }
}

fn parse_in_range(text: &str, min: u32, max: u32) -> Option<u32> {
    let value: u32 = text.parse().ok()?;
    (min..=max).contains(&value).then_some(value)
}
