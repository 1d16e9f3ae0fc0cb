use anyhow::Context;
use platerank_server::{config::Config, create_router, AppState};
use platerank_storage::{Catalog, JsonlSource, RecordSource};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let source: Arc<dyn RecordSource> = Arc::new(JsonlSource::new(config.data_path.clone()));
    let catalog = Catalog::from_source(source.as_ref())
        .with_context(|| format!("loading corpus from {}", source.describe()))?;
    {
        let snap = catalog.snapshot();
        info!(
            records = snap.len(),
            cuisines = snap.vocabulary().len(),
            areas = snap.areas().len(),
            "catalog ready"
        );
    }

    let http_addr = config.http_addr;
    let tls = config.tls.clone();
    let app = create_router(AppState::new(catalog, source, config));

    info!("http listening on {}", http_addr);
    match tls {
        Some(paths) => {
            let tls_config =
                axum_server::tls_rustls::RustlsConfig::from_pem_file(&paths.cert, &paths.key)
                    .await
                    .context("loading TLS certificate and key")?;
            axum_server::bind_rustls(http_addr, tls_config)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            axum_server::bind(http_addr)
                .serve(app.into_make_service())
                .await?;
        }
    }
    Ok(())
}
