use actix_web::{web, App, HttpServer};
use log::info;

use velha_chat_relay::config::ServerConfig;
use velha_chat_relay::routes::configure_routes;
use velha_chat_relay::state::ChatServer;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    info!(
        "Starting chat relay at http://{}:{} (WebSocket on /ws)",
        config.host, config.port
    );

    // Create shared relay state
    let server = web::Data::new(ChatServer::new());
    let bind_addr = (config.host.clone(), config.port);
    let config = web::Data::new(config);

    HttpServer::new(move || {
        let routes_config = config.clone();
        App::new()
            .app_data(server.clone())
            .app_data(config.clone())
            .configure(move |cfg| configure_routes(cfg, &routes_config))
    })
    .bind(bind_addr)?
    .run()
    .await
}
