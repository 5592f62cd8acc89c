//! Server binary: resolve config, bind, run until SIGINT.

use std::sync::atomic::Ordering;

use rtype_server::prelude::*;

/// Exit code for socket initialization failure.
const EXIT_SOCKET_FAILURE: i32 = 84;

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = ServerConfig::resolve(&args);

    let transport = match UdpTransport::bind(config.bind_addr()) {
        Ok(transport) => transport,
        Err(e) => {
            tracing::error!(addr = %config.bind_addr(), error = %e, "failed to bind");
            return EXIT_SOCKET_FAILURE;
        }
    };

    let game = Game::new(GameConfig::default(), rand::random());
    let mut server = Server::new(transport, game);

    let running = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("interrupt received, shutting down");
        running.store(false, Ordering::Relaxed);
    }) {
        tracing::warn!(error = %e, "could not install signal handler");
    }

    server.run();
    0
}
