use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::client::{QualtricsClient, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::model::DEFAULT_SURVEY_NAME;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub survey: SurveySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub api_token: Option<String>,
    /// Data center subdomain, e.g. `syd1`
    pub data_center: Option<String>,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Full web root, overriding `data_center`
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveySettings {
    pub name: String,
    pub dry_run: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            data_center: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: None,
        }
    }
}

impl Default for SurveySettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_SURVEY_NAME.to_string(),
            dry_run: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional `qualtrics` config file
    /// and `QUALTRICS__*` environment variables, in that order.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        config = config.add_source(config::File::with_name("qualtrics").required(false));

        // e.g. QUALTRICS__API__DATA_CENTER=syd1
        config = config.add_source(
            config::Environment::with_prefix("QUALTRICS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// API token from config, falling back to `QUALTRICS_API_TOKEN`
    pub fn api_token(&self) -> anyhow::Result<String> {
        if let Some(token) = self.api.api_token.as_ref().filter(|t| !t.is_empty()) {
            return Ok(token.clone());
        }
        std::env::var("QUALTRICS_API_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .context("no API token: set api.api_token or QUALTRICS_API_TOKEN")
    }

    /// Web root of the account's data center
    pub fn web_base_url(&self) -> anyhow::Result<String> {
        if let Some(base_url) = &self.api.base_url {
            return Ok(base_url.trim_end_matches('/').to_string());
        }
        let data_center = self
            .api
            .data_center
            .as_ref()
            .context("no data center: set api.data_center or api.base_url")?;
        Ok(format!("https://{}.qualtrics.com", data_center))
    }

    pub fn qualtrics_client(&self) -> anyhow::Result<QualtricsClient> {
        let client = QualtricsClient::with_base_url(
            self.api_token()?,
            &self.web_base_url()?,
            &self.api.user_agent,
            Duration::from_secs(self.api.timeout_secs),
        )?;
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api.user_agent, "user of library qualtrics-builder");
        assert_eq!(config.survey.name, "Test Survey");
        assert!(!config.survey.dry_run);
    }

    #[test]
    fn test_base_url_overrides_data_center() {
        let mut config = AppConfig::default();
        assert!(config.web_base_url().is_err());

        config.api.data_center = Some("syd1".to_string());
        assert_eq!(config.web_base_url().unwrap(), "https://syd1.qualtrics.com");

        config.api.base_url = Some("http://127.0.0.1:9000/".to_string());
        assert_eq!(config.web_base_url().unwrap(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_configured_token_wins() {
        let mut config = AppConfig::default();
        config.api.api_token = Some("from-config".to_string());
        assert_eq!(config.api_token().unwrap(), "from-config");
    }
}
