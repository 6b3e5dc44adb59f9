use frame_bus::{Config, Server, ServerState, init_logger_with_file, print_banner};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (.env, logging)
    dotenv::dotenv().ok();
    let config = Config::from_env();
    init_logger_with_file(&config.log_level, config.log_json, config.log_dir.as_deref())?;

    print_banner();
    tracing::info!(
        environment = %config.environment,
        listen_addr = %config.listen_addr,
        store = ?config.store_backend,
        handler_timeout_ms = config.handler_timeout_ms,
        "Frame bus starting"
    );

    // 2. Store, session, mailer
    let state = ServerState::initialize(&config)?;

    // 3. Serve until Ctrl-C
    let server = Server::new(config, state);
    let shutdown = server.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down...");
            shutdown.cancel();
        }
    });

    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    Ok(())
}
