use clap::Parser;
use image::ImageReader;
use std::path::PathBuf;

use vitalseg::{ReaderConfig, Region, ScreenReader, SsdDigitDetector};

#[derive(Parser)]
#[command(name = "vitalseg")]
#[command(about = "Read a vital-signs monitor's seven-segment display from a photograph")]
struct Cli {
    /// Path to the photograph of the monitor
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Path to the seven-segment SSD model (.rten)
    #[arg(long, value_name = "MODEL")]
    model: PathBuf,

    /// Path to the label map (one label per line, background class first)
    #[arg(long, value_name = "LABELS")]
    labels: PathBuf,

    /// Side length of the model's square input
    #[arg(long, default_value_t = 200)]
    input_size: u32,

    /// The model takes float input instead of quantized 0-255 values
    #[arg(long)]
    float_model: bool,

    /// Skip the denoising blur before inference
    #[arg(long)]
    no_blur: bool,

    /// Print per-detection boxes for each region
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let img = ImageReader::open(&args.image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;

    let detector = SsdDigitDetector::from_files(
        &args.model,
        &args.labels,
        args.input_size,
        !args.float_model,
    )?;

    let mut config = ReaderConfig {
        input_size: args.input_size,
        ..ReaderConfig::default()
    };
    if args.no_blur {
        config.blur_sigma = None;
    }

    let mut reader = ScreenReader::with_config(detector, config);

    if args.verbose {
        for region in Region::READINGS {
            let readout = reader.read_region(&img, region)?;
            println!("{:?}: \"{}\"", region, readout.text);
            for d in &readout.mapped_detections {
                println!(
                    "  {} @ {:.2} -> {:.0} {:.0} {:.0} {:.0}",
                    d.label, d.confidence, d.rect.left, d.rect.top, d.rect.right, d.rect.bottom
                );
            }
        }
        return Ok(());
    }

    let reading = reader.read_screen(&img)?;
    println!("SYS: {}", reading.systolic);
    println!("DIA: {}", reading.diastolic);
    println!("HR:  {}", reading.heart_rate);

    if !reading.is_fully_valid() {
        println!("(some values are implausible or missing; retake the photo)");
    }

    Ok(())
}
