use secrecy::Secret;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // Credential cipher key material (any string; derived to 32 bytes)
    pub credential_key: Secret<String>,

    // Reward accounts assigned longer than this are swept to EXPIRED
    pub reward_retention_days: i64,

    // Cron expression for the expiry sweep
    pub sweep_schedule: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Ok(Self {
            database_url: config.get("database_url")?,
            host: config.get("host").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port")?,

            credential_key: Secret::new(config.get("credential_key")?),

            reward_retention_days: config.get("reward_retention_days").unwrap_or(365),

            // Daily at 03:10 by default
            sweep_schedule: config
                .get("sweep_schedule")
                .unwrap_or_else(|_| "0 10 3 * * *".to_string()),
        })
    }
}
