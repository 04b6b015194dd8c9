//! OAuth client credentials for the Google provider.
//!
//! Stored at `<config_dir>/taskcal/google/credentials.json`, with
//! `TASKCAL_GOOGLE_CLIENT_ID` / `TASKCAL_GOOGLE_CLIENT_SECRET` as an
//! environment override for deployments without a config directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// OAuth client id/secret for the Google Calendar API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
}

fn credentials_path() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("taskcal")
        .join("google")
        .join("credentials.json"))
}

impl GoogleCredentials {
    /// Load credentials from the environment or the config file.
    pub fn load() -> Result<Self> {
        if let (Ok(client_id), Ok(client_secret)) = (
            std::env::var("TASKCAL_GOOGLE_CLIENT_ID"),
            std::env::var("TASKCAL_GOOGLE_CLIENT_SECRET"),
        ) {
            return Ok(GoogleCredentials {
                client_id,
                client_secret,
            });
        }

        let path = credentials_path()?;
        if !path.exists() {
            anyhow::bail!(
                "Google credentials not found.\n\n\
                Create {} with:\n\n\
                {{\n  \
                  \"client_id\": \"your-client-id.apps.googleusercontent.com\",\n  \
                  \"client_secret\": \"your-client-secret\"\n\
                }}\n\n\
                See https://console.cloud.google.com/apis/credentials for setup.",
                path.display()
            );
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read credentials from {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse credentials from {}", path.display()))
    }
}
