use std::path::Path;
use std::sync::Arc;

use secrecy::SecretString;

use zenark::chat::{ChatMemory, ChatService};
use zenark::config::{ChatConfig, FallbackConfig, JournalConfig, QueueConfig, ReportConfig};
use zenark::fallback::FallbackPolicy;
use zenark::journal::{JournalRouteState, JournalService};
use zenark::llm::{LlmBackend, LlmConfig, create_provider};
use zenark::queue::RequestQueue;
use zenark::report::ReportGenerator;
use zenark::server::{self, ApiState};
use zenark::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Keep the guard alive for the whole run when file logging is on.
    let _log_guard = init_tracing();

    let backend = match std::env::var("ZENARK_LLM_BACKEND").as_deref() {
        Ok("anthropic") => LlmBackend::Anthropic,
        _ => LlmBackend::OpenAi,
    };
    let key_var = match backend {
        LlmBackend::OpenAi => "OPENAI_API_KEY",
        LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
    };
    let api_key = std::env::var(key_var).unwrap_or_else(|_| {
        eprintln!("Error: {key_var} not set");
        eprintln!("  export {key_var}=...");
        std::process::exit(1);
    });

    let model = std::env::var("ZENARK_MODEL").unwrap_or_else(|_| {
        match backend {
            LlmBackend::OpenAi => "gpt-4o-mini",
            LlmBackend::Anthropic => "claude-3-5-sonnet-latest",
        }
        .to_string()
    });

    let port: u16 = std::env::var("ZENARK_PORT")
        .unwrap_or_else(|_| "8000".to_string())
        .parse()
        .unwrap_or(8000);

    let db_path = std::env::var("ZENARK_DB").unwrap_or_else(|_| "data/zenark.db".to_string());

    eprintln!("🧘 Zenark v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {model}");
    eprintln!("   Database: {db_path}");
    eprintln!("   API: http://0.0.0.0:{port}/api/chat");
    eprintln!("   Health: http://0.0.0.0:{port}/health\n");

    let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_local(Path::new(&db_path)).await?);

    let provider = create_provider(&LlmConfig {
        backend,
        api_key: SecretString::from(api_key),
        model,
    })?;

    let queue = RequestQueue::new(QueueConfig::default());
    let chat = Arc::new(ChatService::new(
        Arc::clone(&provider),
        Arc::clone(&queue),
        FallbackPolicy::new(FallbackConfig::default()),
        ChatMemory::new(Arc::clone(&db)),
        ChatConfig::default(),
    ));
    let reports = Arc::new(ReportGenerator::new(
        provider,
        Arc::clone(&queue),
        ReportConfig::default(),
    ));
    let journal = Arc::new(JournalService::new(
        Arc::clone(&db),
        JournalConfig::default(),
    ));

    let app = server::build_router(
        ApiState { chat, reports, db },
        JournalRouteState { service: journal },
    );
    server::serve(app, port).await?;

    Ok(())
}

/// Initialize tracing: env-filter on stderr, or a daily-rolling file when
/// ZENARK_LOG_DIR is set.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Ok(dir) = std::env::var("ZENARK_LOG_DIR") {
        let appender = tracing_appender::rolling::daily(dir, "zenark.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
        None
    }
}
