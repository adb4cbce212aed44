use std::{env, time::Duration};

use booking_common::{
    helpers::{parse_boolean_flag, parse_duration_secs},
    Secret,
};
use log::*;

const DEFAULT_BKS_HOST: &str = "127.0.0.1";
const DEFAULT_BKS_PORT: u16 = 8480;
const DEFAULT_EXPIRY_SWEEP_INTERVAL: Duration = Duration::from_secs(300);
const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_GATEWAY_URL: &str = "https://api.sandbox.midtrans.com";
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// How often the expiry worker looks for orders that are past their payment deadline.
    pub expiry_sweep_interval: Duration,
    /// When false, this instance does not run the expiry worker. Useful when several instances share a database.
    pub run_expiry_worker: bool,
    /// Upper bound on the time spent processing a single gateway notification.
    pub webhook_timeout: Duration,
    /// Requests to `/admin` routes must carry this value in the `X-Admin-Key` header. If it is empty, every admin
    /// request is refused.
    pub admin_api_key: Secret<String>,
    /// Notifications are POSTed here as JSON. If unset, they are only logged.
    pub notification_url: Option<String>,
    pub event_buffer_size: usize,
    pub gateway: GatewayConfig,
}

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// The base URL of the payment gateway's API, e.g. "https://api.midtrans.com"
    pub base_url: String,
    /// Sent as the basic-auth user on every request to the gateway.
    pub server_key: Secret<String>,
    /// Upper bound on the time a reversal request may take.
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            server_key: Secret::default(),
            timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BKS_HOST.to_string(),
            port: DEFAULT_BKS_PORT,
            database_url: String::default(),
            expiry_sweep_interval: DEFAULT_EXPIRY_SWEEP_INTERVAL,
            run_expiry_worker: true,
            webhook_timeout: DEFAULT_WEBHOOK_TIMEOUT,
            admin_api_key: Secret::default(),
            notification_url: None,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            gateway: GatewayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("BKS_HOST").ok().unwrap_or_else(|| DEFAULT_BKS_HOST.into());
        let port = env::var("BKS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for BKS_PORT. {e} Using the default, {DEFAULT_BKS_PORT}, instead."
                    );
                    DEFAULT_BKS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_BKS_PORT);
        let database_url = env::var("BKS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ BKS_DATABASE_URL is not set. Please set it to the URL for the booking database.");
            String::default()
        });
        let expiry_sweep_interval = duration_from_env("BKS_EXPIRY_SWEEP_INTERVAL", DEFAULT_EXPIRY_SWEEP_INTERVAL);
        let run_expiry_worker = parse_boolean_flag(env::var("BKS_RUN_EXPIRY_WORKER").ok(), true);
        if !run_expiry_worker {
            warn!("🪛️ The expiry worker is disabled on this instance. Unpaid orders will not expire on their own.");
        }
        let webhook_timeout = duration_from_env("BKS_WEBHOOK_TIMEOUT", DEFAULT_WEBHOOK_TIMEOUT);
        let admin_api_key = Secret::new(env::var("BKS_ADMIN_API_KEY").ok().unwrap_or_default());
        if admin_api_key.is_empty() {
            warn!("🪛️ BKS_ADMIN_API_KEY is not set. All requests to the admin routes will be refused.");
        }
        let notification_url = env::var("BKS_NOTIFICATION_URL").ok().filter(|s| !s.trim().is_empty());
        match &notification_url {
            Some(url) => info!("🪛️ Notifications will be sent to {url}"),
            None => info!("🪛️ BKS_NOTIFICATION_URL is not set. Notifications will be logged, but not sent."),
        }
        let event_buffer_size = env::var("BKS_EVENT_BUFFER_SIZE")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for BKS_EVENT_BUFFER_SIZE. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE);
        let gateway = GatewayConfig::from_env_or_default();
        Self {
            host,
            port,
            database_url,
            expiry_sweep_interval,
            run_expiry_worker,
            webhook_timeout,
            admin_api_key,
            notification_url,
            event_buffer_size,
            gateway,
        }
    }
}

impl GatewayConfig {
    pub fn from_env_or_default() -> Self {
        let base_url = env::var("BKS_GATEWAY_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ BKS_GATEWAY_URL is not set. Using the sandbox gateway at {DEFAULT_GATEWAY_URL}");
            DEFAULT_GATEWAY_URL.to_string()
        });
        let server_key = env::var("BKS_GATEWAY_SERVER_KEY").ok().unwrap_or_else(|| {
            error!("🪛️ BKS_GATEWAY_SERVER_KEY is not set. Refund approvals will be rejected by the payment gateway.");
            String::default()
        });
        let timeout = duration_from_env("BKS_GATEWAY_TIMEOUT", DEFAULT_GATEWAY_TIMEOUT);
        Self { base_url: base_url.trim_end_matches('/').to_string(), server_key: Secret::new(server_key), timeout }
    }
}

fn duration_from_env(name: &str, default: Duration) -> Duration {
    env::var(name)
        .map_err(|_| info!("🪛️ {name} is not set. Using the default value of {}s.", default.as_secs()))
        .and_then(|s| parse_duration_secs(&s).map_err(|e| warn!("🪛️ Invalid configuration value for {name}. {e}")))
        .ok()
        .unwrap_or(default)
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub webhook_timeout: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self { webhook_timeout: DEFAULT_WEBHOOK_TIMEOUT }
    }
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { webhook_timeout: config.webhook_timeout }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::new("0.0.0.0", 9000);
        assert_eq!(config.port, 9000);
        assert_eq!(config.expiry_sweep_interval, Duration::from_secs(300));
        assert_eq!(config.webhook_timeout, Duration::from_secs(10));
        assert_eq!(config.gateway.timeout, Duration::from_secs(30));
        assert!(config.admin_api_key.is_empty());
        assert!(config.run_expiry_worker);
        assert_eq!(ServerOptions::from_config(&config).webhook_timeout, Duration::from_secs(10));
    }

    #[test]
    fn secrets_stay_out_of_debug_output() {
        let mut config = ServerConfig::default();
        config.admin_api_key = Secret::new("letmein".into());
        config.gateway.server_key = Secret::new("SB-Mid-server-abc".into());
        let s = format!("{config:?}");
        assert!(!s.contains("letmein"));
        assert!(!s.contains("SB-Mid-server-abc"));
    }
}
