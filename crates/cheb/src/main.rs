use std::sync::Arc;

use cheb_core::{app::AppContext, config::Config};
use cheb_gemini::GeminiClient;

#[tokio::main]
async fn main() -> Result<(), cheb_core::Error> {
    cheb_core::logging::init("cheb")?;

    let cfg = Arc::new(Config::load()?);
    tracing::debug!(?cfg, "configuration loaded");

    let model = Arc::new(
        GeminiClient::new(cfg.gemini_api_key.clone(), cfg.gemini_model.clone())?
            .with_base_url(cfg.gemini_api_base.clone()),
    );

    let ctx = AppContext::new(cfg, model);

    cheb_telegram::router::run_polling(ctx)
        .await
        .map_err(|e| cheb_core::Error::External(format!("telegram bot failed: {e:#}")))?;

    Ok(())
}
