use std::sync::Arc;

use calicoach::cli::ChatSession;
use calicoach::coach::RoutineGenerator;
use calicoach::config::CoachConfig;
use calicoach::llm::{GeminiProvider, LlmProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = CoachConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export GEMINI_API_KEY=...");
        std::process::exit(1);
    });

    eprintln!("💪 CaliCoach v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);
    eprintln!("   Responde cada pregunta y presiona Enter. /quit para salir.\n");

    let llm: Arc<dyn LlmProvider> = Arc::new(GeminiProvider::new(&config));
    let generator = RoutineGenerator::new(llm, &config);

    ChatSession::new(generator).run().await?;
    Ok(())
}
