use festflow_api::{Config, app};
use festflow_observability::LogFormat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    festflow_observability::init(LogFormat::from_env());

    let config = Config::from_env()?;
    let app = app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
