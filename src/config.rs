use serde::Deserialize;

/// Maximum accepted upload size: 10 MB, matching the upload gate.
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Postgres connection string. When unset the service runs on the
    /// in-memory store instead of refusing to start.
    pub database_url: Option<String>,
    pub port: u16,
    pub max_file_size: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .or_else(|_| std::env::var("DB_URL"))
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| {
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })
                .transpose()?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            max_file_size: std::env::var("MAX_FILE_SIZE")
                .ok()
                .map(|raw| {
                    raw.parse::<usize>()
                        .map_err(|_| anyhow::anyhow!("MAX_FILE_SIZE must be a number of bytes"))
                })
                .transpose()?
                .unwrap_or(MAX_FILE_SIZE),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        if let Some(ref url) = config.database_url {
            tracing::debug!("Database URL: {}...", &url[..20.min(url.len())]);
        } else {
            tracing::info!("No DATABASE_URL configured; using in-memory storage");
        }
        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!("Max upload size: {} bytes", config.max_file_size);

        Ok(config)
    }
}
