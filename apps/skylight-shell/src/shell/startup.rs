use super::*;

pub(crate) fn run() -> Result<(), eframe::Error> {
    init_logging();

    let config = match shell_config_from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Skylight startup error: {error}");
            return Ok(());
        }
    };

    log::info!("starting shell for {}", config.start_url);
    log::info!(
        "engine tuning: suppress incremental rendering {}, haptic feedback {}",
        config.engine.suppresses_incremental_rendering,
        config.engine.haptic_feedback_enabled
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Skylight Shell")
            .with_inner_size([1024.0, 768.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Skylight Shell",
        native_options,
        Box::new(|_cc| {
            let app = ShellApp::new(config)?;
            Ok(Box::new(app) as Box<dyn eframe::App>)
        }),
    )
}

fn init_logging() {
    let _ = simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
}

/// Startup configuration comes from the environment, falling back to the
/// built-in start URL.
pub(super) fn shell_config_from_env() -> ShellResult<ShellConfig> {
    match std::env::var(START_URL_ENV) {
        Ok(value) if !value.trim().is_empty() => ShellConfig::new(value.trim()),
        _ => ShellConfig::new(DEFAULT_START_URL),
    }
}
