use clap::Parser;
use skirmish::config::Config;
use skirmish::prelude::*;

#[tokio::main]
async fn main() -> Result<(), SkirmishError> {
    let config = Config::parse();
    init_tracing(config.json_logs);

    let store = SqliteAccountStore::open(&config.db)?;
    let server = SkirmishServerBuilder::new()
        .bind(&config.bind_addr())
        .session_config(config.session_config())
        .build(store)
        .await?;
    let registry = server.registry();

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            let frame = TextCodec.encode(&Reply::Shutdown);
            let notified = registry.broadcast(&frame, None).await;
            tracing::info!(notified, "shutting down");
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("skirmish=info,skirmish_store=info"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().pretty().with_env_filter(filter).init();
    }
}
