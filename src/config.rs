use crate::fetch::normalize_http_url;
use crate::paths::SitePaths;
use crate::{Result, VitrineError};
use serde::{Deserialize, Serialize};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_NEWSLETTER_URL: &str =
    "https://www.linkedin.com/newsletters/fala-ulisses-7391469228467499008/";
const DEFAULT_STRIP_HOME_URL: &str = "https://www.tirinhas.com.br/";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterSettings {
    pub index_url: String,
    pub limit: usize,
    /// Anchor tags and asset stems, newest first; both lists must be at
    /// least `limit` long.
    pub anchor_tags: Vec<String>,
    pub asset_stems: Vec<String>,
}

impl Default for NewsletterSettings {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_NEWSLETTER_URL.to_string(),
            limit: 2,
            anchor_tags: vec![
                "NEWSLETTER_LATEST".to_string(),
                "NEWSLETTER_PREVIOUS".to_string(),
            ],
            asset_stems: vec!["img_latest_post".to_string(), "img_previous_post".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripSettings {
    pub home_url: String,
    pub anchor_tag: String,
    pub asset_stem: String,
}

impl Default for StripSettings {
    fn default() -> Self {
        Self {
            home_url: DEFAULT_STRIP_HOME_URL.to_string(),
            anchor_tag: "DAILY_STRIP".to_string(),
            asset_stem: "strip".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSettings {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub newsletter: NewsletterSettings,
    pub strip: StripSettings,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            newsletter: NewsletterSettings::default(),
            strip: StripSettings::default(),
        }
    }
}

impl RefreshSettings {
    fn validate(&self) -> Result<()> {
        normalize_http_url(&self.newsletter.index_url)?;
        normalize_http_url(&self.strip.home_url)?;
        if self.newsletter.limit == 0 {
            return Err(VitrineError::Settings(
                "newsletter.limit must be at least 1".to_string(),
            ));
        }
        if self.newsletter.anchor_tags.len() < self.newsletter.limit
            || self.newsletter.asset_stems.len() < self.newsletter.limit
        {
            return Err(VitrineError::Settings(format!(
                "newsletter needs {} anchor tags and asset stems, got {} and {}",
                self.newsletter.limit,
                self.newsletter.anchor_tags.len(),
                self.newsletter.asset_stems.len()
            )));
        }
        Ok(())
    }
}

pub fn load_refresh_settings(paths: &SitePaths) -> Result<RefreshSettings> {
    let path = paths.settings_path();
    if !path.exists() {
        return Ok(RefreshSettings::default());
    }
    let bytes = std::fs::read(&path)?;
    let parsed: RefreshSettings = serde_json::from_slice(&bytes).map_err(|e| {
        VitrineError::Settings(format!(
            "failed to parse refresh settings at {}: {e}",
            path.to_string_lossy()
        ))
    })?;
    parsed.validate()?;
    Ok(parsed)
}

pub fn save_refresh_settings(paths: &SitePaths, settings: &RefreshSettings) -> Result<()> {
    settings.validate()?;
    let path = paths.settings_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(&path, format!("{json}\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_settings_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = SitePaths::new(dir.path().to_path_buf());
        let settings = load_refresh_settings(&paths).expect("settings");
        assert_eq!(settings.newsletter.limit, 2);
        assert_eq!(settings.newsletter.anchor_tags.len(), 2);
    }

    #[test]
    fn settings_round_trip_through_json_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = SitePaths::new(dir.path().to_path_buf());
        let mut settings = RefreshSettings::default();
        settings.strip.home_url = "https://comics.example.org/".to_string();
        save_refresh_settings(&paths, &settings).expect("save");
        let loaded = load_refresh_settings(&paths).expect("load");
        assert_eq!(loaded.strip.home_url, "https://comics.example.org/");
    }

    #[test]
    fn rejects_short_anchor_lists() {
        let mut settings = RefreshSettings::default();
        settings.newsletter.anchor_tags.pop();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_non_http_index_url() {
        let mut settings = RefreshSettings::default();
        settings.newsletter.index_url = "ftp://example.com/feed".to_string();
        assert!(settings.validate().is_err());
    }
}
