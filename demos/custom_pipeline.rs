use circlecam::detection::hough::HoughParams;
use circlecam::detection::steps::*;
use circlecam::{Pipeline, SyntheticScene, Tuning};
use image::ImageReader;
use std::env;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let frame = match args.get(1) {
        Some(path) => ImageReader::open(path)?
            .decode()
            .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?
            .to_rgb8(),
        None => SyntheticScene::new(640, 480, 4, 7).still().render(),
    };

    println!("Loaded frame: {}x{}", frame.width(), frame.height());

    // Example 1: full-resolution detection with k-means colors
    println!("\n=== Full Resolution Pipeline ===");
    let tuning = Tuning {
        hough: HoughParams {
            min_radius: 10,
            max_radius: 20,
            ..HoughParams::default()
        },
        ..Tuning::default()
    };
    let mut pipeline = Pipeline::new()
        .with_tuning(tuning)
        .add_step(Arc::new(GrayscaleStep))
        .add_step(Arc::new(MedianBlurStep { ksize: 5 }))
        .add_step(Arc::new(HoughCircleStep))
        .add_step(Arc::new(KMeansColorStep));

    let data = pipeline.run(frame.clone())?;
    println!("Found {} circles", data.circles.len());
    for (i, colored) in data.annotated().iter().take(10).enumerate() {
        let c = colored.circle;
        println!("  {}: ({}, {}) r={} colors={:?}", i + 1, c.x, c.y, c.radius, colored.colors);
    }

    // Example 2: stop after the blur to inspect preprocessing
    println!("\n=== Partial Pipeline (Stop After Median Blur) ===");
    let data = pipeline.run_partial(frame, 2)?;
    println!(
        "Working image after {} steps: {}x{}",
        2,
        data.image.width(),
        data.image.height()
    );

    Ok(())
}
