use bombot::infra::DefaultObserver;
use bombot::replay::ReplayReader;
use bombot::runner::Runner;
use bombot::{Engine, EngineConfig, RunnerConfig};
use dotenv::dotenv;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bombot=debug,info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_logging();

    let config = RunnerConfig::from_env()?;
    tracing::info!("Replaying {}", config.replay.display());
    tracing::info!("Tick interval: {:?}, boosters: {}", config.tick_interval, config.boosters);

    let frames = ReplayReader::open(&config.replay)?;
    let mut runner = Runner::new(Engine::new(EngineConfig::default()), DefaultObserver, config);
    runner.run(frames).await?;

    Ok(())
}
