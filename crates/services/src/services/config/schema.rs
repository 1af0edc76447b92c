use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils_core::calendar::{DEFAULT_TIMEZONE, ReferenceClock};

pub const CURRENT_CONFIG_VERSION: &str = "v1";

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;
const DEFAULT_SESSION_TTL_HOURS: u64 = 12;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 20 * 1024 * 1024;
const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;
const DEFAULT_CACHE_MAX_ENTRIES: u64 = 500;
const DEFAULT_CACHE_TTL_SECS: u64 = 60;

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

/// Organisation contact data shown on the public pages.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct SiteConfig {
    #[serde(alias = "organizationName")]
    pub organization_name: String,
    #[serde(alias = "whatsappNumber")]
    pub whatsapp_number: String,
    pub email: String,
    pub phones: Vec<String>,
    #[serde(alias = "addressLines")]
    pub address_lines: Vec<String>,
    pub instagram: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            organization_name: "Cáritas Diocesana de Sobral".to_string(),
            whatsapp_number: "5588994253039".to_string(),
            email: "caritassobral@hotmail.com".to_string(),
            phones: vec!["(88) 9.9425-3039".to_string(), "(88) 9.9961-9348".to_string()],
            address_lines: vec![
                "Praça Quirino Rodrigues, 76 - Sala 04".to_string(),
                "Centro - Sobral/CE - CEP 62011-260".to_string(),
            ],
            instagram: Some("@caritassobral".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct AuthConfig {
    #[serde(alias = "sessionTtlHours")]
    pub session_ttl_hours: u64,
    #[serde(alias = "sweepIntervalSecs")]
    pub sweep_interval_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct UploadConfig {
    #[serde(alias = "maxDocumentBytes")]
    pub max_document_bytes: u64,
    #[serde(alias = "maxImageBytes")]
    pub max_image_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct CacheConfig {
    #[serde(alias = "maxEntries")]
    pub max_entries: u64,
    #[serde(alias = "ttlSecs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct Config {
    #[serde(alias = "configVersion")]
    pub config_version: String,
    pub timezone: String,
    #[serde(alias = "pageSize")]
    pub page_size: u64,
    #[serde(alias = "publicBaseUrl")]
    pub public_base_url: Option<String>,
    pub site: SiteConfig,
    pub auth: AuthConfig,
    pub uploads: UploadConfig,
    pub cache: CacheConfig,
}

impl Config {
    pub fn from_raw(raw_config: &str) -> Self {
        match serde_json::from_str::<Config>(raw_config) {
            Ok(config) => config.normalized(),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse config (line {}, column {}): {}, using default",
                    e.line(),
                    e.column(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn normalized(mut self) -> Self {
        self.config_version = CURRENT_CONFIG_VERSION.to_string();

        let timezone = self.timezone.trim().to_string();
        if ReferenceClock::from_name(&timezone).is_err() {
            tracing::warn!("Invalid timezone '{}', resetting to default", self.timezone);
            self.timezone = default_timezone();
        } else {
            self.timezone = timezone;
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            tracing::warn!(
                "Page size {} out of range, resetting to {}",
                self.page_size,
                DEFAULT_PAGE_SIZE
            );
            self.page_size = DEFAULT_PAGE_SIZE;
        }

        self.public_base_url = self
            .public_base_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        self.site.whatsapp_number = self
            .site
            .whatsapp_number
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        if matches!(
            self.site.instagram.as_deref(),
            Some(handle) if handle.trim().is_empty()
        ) {
            self.site.instagram = None;
        }

        if self.auth.session_ttl_hours == 0 {
            self.auth.session_ttl_hours = DEFAULT_SESSION_TTL_HOURS;
        }
        if self.auth.sweep_interval_secs == 0 {
            self.auth.sweep_interval_secs = DEFAULT_SWEEP_INTERVAL_SECS;
        }
        if self.uploads.max_document_bytes == 0 {
            self.uploads.max_document_bytes = DEFAULT_MAX_DOCUMENT_BYTES;
        }
        if self.uploads.max_image_bytes == 0 {
            self.uploads.max_image_bytes = DEFAULT_MAX_IMAGE_BYTES;
        }
        if self.cache.max_entries == 0 {
            self.cache.max_entries = DEFAULT_CACHE_MAX_ENTRIES;
        }

        self
    }

    /// Clock for "today" in the configured timezone.
    pub fn clock(&self) -> ReferenceClock {
        ReferenceClock::from_name(&self.timezone).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Falling back to default timezone");
            ReferenceClock::default()
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: CURRENT_CONFIG_VERSION.to_string(),
            timezone: default_timezone(),
            page_size: DEFAULT_PAGE_SIZE,
            public_base_url: None,
            site: SiteConfig::default(),
            auth: AuthConfig::default(),
            uploads: UploadConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_for_empty_config() {
        let config = Config::from_raw("{}");

        assert_eq!(config.config_version, CURRENT_CONFIG_VERSION);
        assert_eq!(config.timezone, DEFAULT_TIMEZONE);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.site.whatsapp_number, "5588994253039");
        assert_eq!(config.auth.session_ttl_hours, DEFAULT_SESSION_TTL_HOURS);
        assert!(config.public_base_url.is_none());
    }

    #[test]
    fn invalid_json_falls_back_to_default() {
        let config = Config::from_raw("{invalid json");

        assert_eq!(config.config_version, CURRENT_CONFIG_VERSION);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn aliases_and_normalization_are_applied() {
        let raw = r#"{
            "configVersion": "v0",
            "pageSize": 20,
            "publicBaseUrl": "https://caritas.example.org/ ",
            "site": { "whatsappNumber": "+55 (88) 99425-3039", "instagram": " " },
            "auth": { "sessionTtlHours": 0 }
        }"#;

        let config = Config::from_raw(raw);

        assert_eq!(config.config_version, CURRENT_CONFIG_VERSION);
        assert_eq!(config.page_size, 20);
        assert_eq!(
            config.public_base_url.as_deref(),
            Some("https://caritas.example.org")
        );
        assert_eq!(config.site.whatsapp_number, "5588994253039");
        assert!(config.site.instagram.is_none());
        assert_eq!(config.auth.session_ttl_hours, DEFAULT_SESSION_TTL_HOURS);
    }

    #[test]
    fn invalid_timezone_and_page_size_are_reset() {
        let raw = r#"{ "timezone": "Mars/Olympus", "pageSize": 0 }"#;
        let config = Config::from_raw(raw);

        assert_eq!(config.timezone, DEFAULT_TIMEZONE);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.clock().timezone(), chrono_tz::America::Sao_Paulo);
    }
}
