use clap::Parser;
use log::{error, info};
use server::activity::DailyActivityLog;
use server::clock::GenerationClock;
use server::config::{Args, ServerConfig};
use server::controller::GameController;
use server::game::GameService;
use server::network::Server;
use std::sync::Arc;
use tokio::sync::watch;

/// Parses arguments, starts the generation clock and serves until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    let args = Args::parse();
    let config = ServerConfig::from_args(&args)?;

    info!(
        "Starting server on {} ({} bytes of board per response)",
        config.bind_address,
        config.packed_board_len()
    );

    let game = Arc::new(GameService::new(config.game.clone(), config.initial_board())?);
    let controller = Arc::new(GameController::new(
        Arc::clone(&game),
        Arc::new(DailyActivityLog::new()),
    ));

    let mut server = Server::new(&config.bind_address, controller, config.max_subscribers).await?;
    let clock = GenerationClock::spawn(Arc::clone(&game));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut server_handle = tokio::spawn(async move { server.run(shutdown_rx).await });

    let finished = tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            info!("Received Ctrl+C, shutting down gracefully...");
            None
        }
        result = &mut server_handle => Some(result),
    };

    let _ = shutdown_tx.send(true);
    let result = match finished {
        Some(result) => result,
        None => server_handle.await,
    };
    match result {
        Ok(Err(e)) => error!("Network server failed: {}", e),
        Err(e) => error!("Network task panicked: {}", e),
        Ok(Ok(())) => {}
    }
    clock.shutdown().await;

    let stats = game.stats().await;
    info!("Stopped at generation {} with {} live cells", stats.generation, stats.live_cells);

    Ok(())
}
