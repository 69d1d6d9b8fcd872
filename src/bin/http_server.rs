use paypal_payments::config;
use paypal_payments::http_server::HttpServer;
use paypal_payments::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() {
    let subscriber = get_subscriber("paypal-payments-server".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);
    let cfg = config::Settings::new().expect("cannot parse configuration");

    let http_server = HttpServer::build(cfg)
        .await
        .expect("cannot build http server");
    if let Err(e) = http_server.run().await {
        tracing::error!("http server stopped due to err: {}", e);
        std::process::exit(1);
    }
}
