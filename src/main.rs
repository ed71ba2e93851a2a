// LCD Compositor - Main Entry Point
//
// Opens a window showing a scrolling four-shade test pattern through the
// temporal compositor. Set `blend = false` in lcd_config.toml to compare
// against the unblended output.

use lcd_compositor::config::{DisplayConfig, CONFIG_FILE};
use lcd_compositor::display::run_display;
use log::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Default filter is "info" if RUST_LOG is not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("lcd-compositor v{}", env!("CARGO_PKG_VERSION"));

    // Load or create display configuration
    let config = DisplayConfig::load_or_default(CONFIG_FILE);
    info!("display configuration loaded from '{}'", CONFIG_FILE);

    run_display(&config)?;

    info!("display window closed");
    Ok(())
}
