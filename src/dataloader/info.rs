use crate::worker::fetcher::DataFetcher;

use super::config::SampleErrorPolicy;

pub fn print_fetcher_info(fetcher: &DataFetcher) {
    let config = fetcher.config();

    println!("Fetcher Information:");
    println!("-------------------");
    println!("Manifest: {}", fetcher.manifest_path().display());
    println!("Mode: {}", if config.stereo { "stereo" } else { "single" });
    println!("Working set size: {}", fetcher.len());
    match config.effective_cap() {
        Some(cap) => println!("Sample cap: {}", cap),
        None => println!("Sample cap: none"),
    }
    println!();
    println!("Image size: {}x{}x3", config.image_height, config.image_width);
    println!("Image extension: {}", config.image_extension);
    println!("Queue capacity: {}", config.queue_capacity);
    println!(
        "On sample error: {}",
        match config.on_sample_error {
            SampleErrorPolicy::Propagate => "propagate",
            SampleErrorPolicy::Skip => "skip",
        }
    );
    println!("Seed: {:?}", config.shuffle_seed);
}
