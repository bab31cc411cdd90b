use actix_files as fs;
use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, warn};

use crate::config::ServerConfig;

const MISSING_INDEX: &str = "<h1>Crie o arquivo static/index.html</h1>";

/// HTTP handler for the index page
pub async fn index(req: HttpRequest, config: web::Data<ServerConfig>) -> HttpResponse {
    match fs::NamedFile::open_async(config.index_file()).await {
        Ok(file) => file.into_response(&req),
        Err(e) => {
            debug!("No index page at {}: {}", config.index_file().display(), e);
            HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .body(MISSING_INDEX)
        }
    }
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig, config: &ServerConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/").route(web::get().to(index)));

    if config.static_dir.is_dir() {
        cfg.service(fs::Files::new("/static", &config.static_dir));
    } else {
        warn!(
            "Static directory {} not found; /static is disabled",
            config.static_dir.display()
        );
    }
}
