pub mod detection;
pub mod models;

pub use detection::classifier::{Classifier, SsdDigitDetector};
pub use detection::overlay::{OverlayTemplate, RegionFrame};
pub use detection::postprocess::{AssemblyOptions, assemble_digits};
pub use detection::transform::AffineTransform;
pub use detection::{ReaderConfig, RegionReadout, ScreenReader};
pub use models::{Detection, RectF, Region, ScreenReading};
