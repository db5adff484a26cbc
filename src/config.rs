use crate::error::ConfigurationError;
use crate::util;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

fn default_mongodb_uri() -> String {
    env::var("MONGODB_URI").unwrap_or("mongodb://localhost:27017".to_string())
}

fn default_mongodb_db() -> String {
    env::var("MONGODB_DB_NAME").unwrap_or("yogaMeditation".to_string())
}

fn default_access_token_secret() -> String {
    env::var("ACCESS_TOKEN_SECRET").unwrap_or("zenbook-development-secret".to_string())
}

fn default_token_expiry_hours() -> i64 {
    5
}

fn default_stripe_secret_key() -> String {
    env::var("STRIPE_SECRET_KEY").unwrap_or_default()
}

fn default_stripe_api_base() -> String {
    env::var("STRIPE_API_BASE").unwrap_or("https://api.stripe.com".to_string())
}

fn default_currency() -> String {
    "usd".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    file_path: PathBuf,

    #[serde(default = "default_mongodb_uri")]
    pub mongodb_uri: String,
    #[serde(default = "default_mongodb_db")]
    pub mongodb_db: String,

    #[serde(default = "default_access_token_secret")]
    pub access_token_secret: String,
    #[serde(default = "default_token_expiry_hours")]
    pub token_expiry_hours: i64,

    #[serde(default = "default_stripe_secret_key")]
    pub stripe_secret_key: String,
    #[serde(default = "default_stripe_api_base")]
    pub stripe_api_base: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            file_path: config_dir().join("settings.yml"),
            mongodb_uri: default_mongodb_uri(),
            mongodb_db: default_mongodb_db(),
            access_token_secret: default_access_token_secret(),
            token_expiry_hours: default_token_expiry_hours(),
            stripe_secret_key: default_stripe_secret_key(),
            stripe_api_base: default_stripe_api_base(),
            currency: default_currency(),
        }
    }
}

#[inline]
fn config_dir() -> PathBuf {
    PathBuf::from(env::var("CONFIG_DIR").unwrap_or("./config".to_string()))
}

impl Config {
    pub fn load() -> Result<Config, ConfigurationError> {
        let config_file = util::find_first_subpath(
            config_dir(),
            &["settings.yml", "settings.yaml"],
            Path::exists,
        )
        .ok_or_else(|| ConfigurationError::NotFound(config_dir()))?;

        let file = File::open(config_file)?;
        let config = serde_yaml::from_reader(BufReader::new(file))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigurationError> {
        let file = File::create(&self.file_path)?;
        let mut out = BufWriter::new(file);
        serde_yaml::to_writer(&mut out, self)?;
        out.flush()?;
        Ok(())
    }
}
