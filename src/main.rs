use std::time::Instant;

use mesh_fetcher::dataloader::info::print_fetcher_info;
use mesh_fetcher::{DataFetcher, FetcherConfig, LoadedExample, SampleErrorPolicy};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    match std::env::var(name) {
        Ok(v) => v
            .parse()
            .map(Some)
            .map_err(|_| format!("{} has an invalid value: {:?}", name, v).into()),
        Err(_) => Ok(None),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let manifest = std::env::args()
        .nth(1)
        .ok_or("usage: mesh_fetcher <manifest> (MESH_FETCHER_* env vars for options)")?;

    let defaults = FetcherConfig::default();
    let config = FetcherConfig {
        stereo: env_flag("MESH_FETCHER_STEREO"),
        sample_cap: env_parse("MESH_FETCHER_SAMPLE_CAP")?,
        queue_capacity: env_parse("MESH_FETCHER_QUEUE")?.unwrap_or(defaults.queue_capacity),
        shuffle_seed: env_parse("MESH_FETCHER_SEED")?,
        on_sample_error: if env_flag("MESH_FETCHER_SKIP_ERRORS") {
            SampleErrorPolicy::Skip
        } else {
            SampleErrorPolicy::Propagate
        },
        ..defaults
    };
    let count: usize = env_parse("MESH_FETCHER_COUNT")?.unwrap_or(16);

    let mut fetcher = DataFetcher::new(&manifest, Some(config))?;
    print_fetcher_info(&fetcher);
    fetcher.start()?;

    let started = Instant::now();
    for i in 0..count {
        match fetcher.fetch() {
            Ok(Some(LoadedExample::Single { image, file_name, .. })) => {
                info!("{} {} {:?}", i, file_name, image.shape());
            }
            Ok(Some(LoadedExample::Stereo { image_1, image_2, file_name, .. })) => {
                info!("{} {} {:?} {:?}", i, file_name, image_1.shape(), image_2.shape());
            }
            Ok(None) => break,
            Err(e) => {
                error!("Fetch failed: {}", e);
                fetcher.shutdown();
                fetcher.join()?;
                return Err(e.into());
            }
        }
    }

    let elapsed = started.elapsed();
    info!(
        "Fetched {} examples in {:.2?} ({:.1} examples/s)",
        count,
        elapsed,
        count as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    fetcher.shutdown();
    fetcher.join()?;
    Ok(())
}
