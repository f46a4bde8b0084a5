use std::env::var;
use std::fs::read_to_string;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use toml::from_str;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub request_limit: usize,
    pub database: PathBuf,
    pub uploads: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5001)),
            request_limit: 32,
            database: "contacts.db".into(),
            uploads: "static/uploads".into(),
        }
    }
}

impl Config {
    /// Reads `server.toml` from the data path if present and resolves relative paths against it.
    pub fn read(data_path: &Path) -> Result<Self> {
        let path = data_path.join("server.toml");

        let mut val = match read_to_string(&path) {
            Ok(text) => Self::parse(&text)
                .with_context(|| format!("Failed to parse {}", path.display()))?,
            Err(err) if err.kind() == ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(err.into()),
        };

        if let Ok(bind_addr) = var("BIND_ADDR") {
            val.bind_addr = bind_addr
                .parse()
                .context("Environment variable BIND_ADDR invalid")?;
        }

        val.database = data_path.join(val.database);
        val.uploads = data_path.join(val.uploads);

        Ok(val)
    }

    fn parse(text: &str) -> Result<Self> {
        let val = from_str(text)?;

        Ok(val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.bind_addr.port(), 5001);
        assert_eq!(config.request_limit, 32);
        assert_eq!(config.database, Path::new("contacts.db"));
        assert_eq!(config.uploads, Path::new("static/uploads"));
    }

    #[test]
    fn partial_file_overrides_given_keys() {
        let config = Config::parse(
            r#"
            bind_addr = "0.0.0.0:8080"
            uploads = "/srv/uploads"
            "#,
        )
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.request_limit, 32);
        assert_eq!(config.uploads, Path::new("/srv/uploads"));
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(Config::parse("request_limit = \"many\"").is_err());
    }
}
