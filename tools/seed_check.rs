use std::env;
use std::path::PathBuf;

use catalog::Catalog;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let seed_dir = env::args()
        .nth(1)
        .or_else(|| env::var("SEED_DIR").ok())
        .unwrap_or_else(|| "seeds".to_string());

    info!("Checking seeds in {}", seed_dir);
    let catalog = Catalog::load_seeds(&PathBuf::from(&seed_dir))?;
    let stats = catalog.stats();

    println!(
        "Seeds OK: {} artists, {} albums, {} songs",
        stats.artists, stats.albums, stats.songs
    );

    Ok(())
}
