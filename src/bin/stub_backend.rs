use tracing::info;

/// Runs the in-memory stub backend standalone so a front end (or manual
/// curl session) can be pointed at it during development.
#[tokio::main]
async fn main() -> genstudio::Result<()> {
    genstudio::init_tracing();

    let port = std::env::var("GENSTUDIO_STUB_PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8001);

    let server = genstudio::interfaces::stub_server::start(port).await?;
    info!(base_url = %server.base_url, "Stub backend ready");

    tokio::signal::ctrl_c()
        .await
        .map_err(genstudio::AppError::from)?;
    server.stop().await;
    Ok(())
}
