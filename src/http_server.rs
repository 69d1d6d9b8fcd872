use axum::{
    routing::{get, post},
    Router,
};
use snafu::{ResultExt, Snafu};
use std::sync::Arc;
use tokio::{io, net::TcpListener};
use tower_http::trace::TraceLayer;

use crate::client::http::new_http_client;
use crate::config::Settings;
use crate::handler;
use crate::service::payment::service::Service as PaymentService;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub payment_service: PaymentService,
}

#[derive(Debug, Snafu)]
pub enum ServerError {
    #[snafu(display("cannot build http client: {source}"))]
    HttpClient { source: reqwest::Error },
    #[snafu(display("invalid paypal url {url}: {source}"))]
    PaypalUrl {
        url: String,
        source: url::ParseError,
    },
    #[snafu(display("cannot bind to {address}: {source}"))]
    Bind { address: String, source: io::Error },
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
    port: u16,
}

impl HttpServer {
    pub async fn build(cfg: Settings) -> Result<Self, ServerError> {
        let http_client = new_http_client(&cfg.paypal).context(HttpClientSnafu)?;
        let payment_service =
            PaymentService::new(&cfg.paypal, http_client).context(PaypalUrlSnafu {
                url: cfg.paypal.base_url(),
            })?;
        let shared_state = Arc::new(AppState { payment_service });

        let router = get_router(shared_state);
        let listener = TcpListener::bind(&cfg.server.address)
            .await
            .context(BindSnafu {
                address: &cfg.server.address,
            })?;
        let port = listener
            .local_addr()
            .context(BindSnafu {
                address: &cfg.server.address,
            })?
            .port();
        tracing::info!("listening on port {}", port);
        Ok(HttpServer {
            router,
            listener,
            port,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run(self) -> Result<(), io::Error> {
        axum::serve(self.listener, self.router).await
    }
}

pub fn get_router(shared_state: SharedState) -> Router {
    let payment_routes = Router::new()
        .route("/", post(handler::api::payment::create_payment))
        .route("/:id/execute", post(handler::api::payment::execute_payment))
        .route("/success", get(handler::api::payment::payment_success))
        .route("/cancel", get(handler::api::payment::payment_cancel));

    let api_routes = Router::new().nest("/payments", payment_routes);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state)
}
