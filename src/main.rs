use tracing::Level;
use vision_sampler::app::FeatureListApp;
use vision_sampler::config::Settings;
use vision_sampler::error::AppError;

fn init_logging(level: Level) {
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let settings = Settings::load()?;
    init_logging(settings.log_level()?);
    tracing::debug!("Loaded settings: {:?}", settings);
    tracing::info!("Starting {}", settings.window.title);
    FeatureListApp::start_gui(settings, tokio::runtime::Handle::current())
}
