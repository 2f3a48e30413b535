use std::sync::Arc;

use ldb_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), ldb_core::Error> {
    ldb_core::logging::init("ldb")?;

    let cfg = Arc::new(Config::load()?);
    tracing::info!("messages loaded from {}", cfg.config_file.display());

    ldb_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| ldb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
