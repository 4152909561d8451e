//! Server configuration
//!
//! Configuration is loaded from environment variables.

use std::env;
use std::path::PathBuf;

use crate::bundle::ResolverConfig;

/// Main server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Output bundle directory
    pub output_dir: PathBuf,
    /// CORS configuration
    pub cors: CorsConfig,
}

/// CORS configuration
#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    /// Allowed origins; empty means any origin
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty()
    }

    fn parse(value: &str) -> Self {
        let allowed_origins = value
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();

        if allowed_origins.iter().any(|o| o == "*") {
            return Self::default();
        }
        Self { allowed_origins }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            output_dir: PathBuf::from("output"),
            cors: CorsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("HOST") {
            config.host = host;
        }
        if let Ok(port) = env::var("PORT")
            && let Ok(p) = port.parse()
        {
            config.port = p;
        }
        if let Ok(dir) = env::var("OUTPUT_DIR")
            && !dir.is_empty()
        {
            config.output_dir = PathBuf::from(dir);
        }
        if let Ok(origins) = env::var("CORS_ALLOWED_ORIGINS") {
            config.cors = CorsConfig::parse(&origins);
        }

        config
    }

    /// Resolver configuration derived from this config
    pub fn resolver(&self) -> ResolverConfig {
        ResolverConfig::new(self.output_dir.clone())
    }
}
