use std::time::Duration;

use crate::config::PaypalConfig;

pub fn new_http_client(cfg: &PaypalConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .build()
}
