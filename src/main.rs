use hello_world_mcp::{
    build_app,
    config::{Config, Transport},
    domain::profile::build_registry,
    logging, stdio, AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let registry = build_registry(&config.profile)?;
    let state = AppState::new(config.api_token.clone(), registry);

    match config.transport {
        Transport::Stdio => stdio::serve_stdio(state).await?,
        Transport::Http => {
            let bind_socket = config.bind_socket()?;
            let app = build_app(state);
            let listener = tokio::net::TcpListener::bind(bind_socket).await?;

            info!(
                bind_addr = %config.bind_addr,
                bind_port = config.bind_port,
                auth = config.api_token.is_some(),
                "server starting"
            );

            axum::serve(listener, app.into_make_service()).await?;
        }
    }

    Ok(())
}
