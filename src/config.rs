use config::Config;
use serde::Deserialize;

pub const PAYPAL_SANDBOX_URL: &str = "https://api.sandbox.paypal.com";
pub const PAYPAL_LIVE_URL: &str = "https://api.paypal.com";

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub server: ServerConfig,
    pub paypal: PaypalConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub address: String,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaypalMode {
    #[default]
    Sandbox,
    Live,
}

#[derive(Deserialize, Clone, Debug)]
pub struct PaypalConfig {
    #[serde(default)]
    pub mode: PaypalMode,
    /// Overrides the endpoint implied by `mode`.
    #[serde(default)]
    pub url: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl PaypalMode {
    pub fn default_url(&self) -> &'static str {
        match self {
            PaypalMode::Sandbox => PAYPAL_SANDBOX_URL,
            PaypalMode::Live => PAYPAL_LIVE_URL,
        }
    }
}

impl PaypalConfig {
    pub fn base_url(&self) -> &str {
        self.url.as_deref().unwrap_or(self.mode.default_url())
    }
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let cfg = Config::builder()
            .set_default("server.address", "127.0.0.1:8080")?
            .add_source(config::File::with_name("config").required(false))
            // PAYPAL__CLIENT_ID -> paypal.client_id
            .add_source(config::Environment::default().separator("__"))
            .build()?;
        cfg.try_deserialize::<Settings>()
    }
}
