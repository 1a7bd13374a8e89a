mod config;
mod controller;
mod errors;
mod file;
mod keys;
mod pipelines;
mod processor;
mod routes;
mod storage;
mod utils;


#[macro_use]
extern crate tracing;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use mimalloc::MiMalloc;
use poem::error::SizedLimitError;
use poem::listener::TcpListener;
use poem::web::headers::{ContentLength, HeaderMapExt};
use poem::{EndpointExt, IntoEndpoint, Request, Route, Server};
use poem_openapi::OpenApiService;

use crate::config::RuntimeConfig;
use crate::controller::MediaController;
use crate::routes::MediaApi;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Debug, Parser)]
#[clap(author, version, about)]
pub struct ServerConfig {
    #[clap(long, default_value = "127.0.0.1", env = "HOST")]
    /// The binding host address of the server.
    host: String,

    #[clap(long, default_value = "8000", env = "PORT")]
    /// The binding port of the server.
    port: u16,

    #[clap(long, env = "EXTERNAL_HOST")]
    /// The external host address the API docs point at.
    ///
    /// Defaults to `http://{host}:{port}`.
    external_host: Option<String>,

    #[clap(long, env = "CONFIG_FILE")]
    /// The path to the YAML runtime config.
    config_file: PathBuf,

    #[clap(long, default_value = "info", env = "LOG_LEVEL")]
    /// The most verbose log level to emit (error, warn, info, debug, trace).
    log_level: tracing::Level,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: ServerConfig = ServerConfig::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let config = RuntimeConfig::from_file(&args.config_file)?;
    let storage = config.backend.connect().await?;
    let controller = Arc::new(MediaController::new(&config, storage));

    let bind = format!("{}:{}", args.host, args.port);
    let external = args
        .external_host
        .unwrap_or_else(|| format!("http://{}", &bind));

    let app = build_app(controller, &external);

    info!("Serving on {} (docs @ {}/ui)", &bind, &external);
    Server::new(TcpListener::bind(bind)).run(app).await?;

    Ok(())
}

pub fn build_app(controller: Arc<MediaController>, external_host: &str) -> Route {
    let max_upload_size = controller.max_upload_size();
    let api_service = OpenApiService::new(
        MediaApi::new(controller),
        "Thumbstore API",
        env!("CARGO_PKG_VERSION"),
    )
    .server(format!("{}/v1", external_host.trim_end_matches('/')));

    let ui = api_service.redoc();

    // Declared oversized bodies are refused before they are read, bodies
    // without a length are still capped by the upload route itself.
    let api = match max_upload_size {
        Some(limit) => api_service
            .into_endpoint()
            .before(move |req: Request| async move { reject_declared_oversize(req, limit) })
            .map_to_response()
            .boxed(),
        None => api_service.map_to_response().boxed(),
    };

    Route::new().nest("/v1", api).nest("/ui", ui)
}

fn reject_declared_oversize(req: Request, limit: usize) -> poem::Result<Request> {
    match req.headers().typed_get::<ContentLength>() {
        Some(ContentLength(len)) if len > limit as u64 => {
            Err(SizedLimitError::PayloadTooLarge.into())
        },
        _ => Ok(req),
    }
}
