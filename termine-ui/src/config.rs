//! Frontend Configuration
//!
//! Built once at startup and passed down to the pages.

/// Default admin API base URL
pub const DEFAULT_API_BASE: &str = "http://localhost:8000/admin_api";

/// Default instance name shown above the user table
pub const DEFAULT_INSTANCE_NAME: &str = "Termine";

const API_URL_KEY: &str = "termine_api_url";
const INSTANCE_NAME_KEY: &str = "termine_instance_name";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    /// Admin API base URL without trailing slash
    pub api_base_url: String,
    /// Long instance name for the page header
    pub instance_name: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE, DEFAULT_INSTANCE_NAME)
    }
}

impl AdminConfig {
    pub fn new(api_base_url: &str, instance_name: &str) -> Self {
        Self {
            api_base_url: normalize_base_url(api_base_url),
            instance_name: instance_name.trim().to_string(),
        }
    }

    /// Defaults, overridden by entries in local storage
    pub fn from_local_storage() -> Self {
        let defaults = Self::default();
        let api_base_url = read_storage(API_URL_KEY).unwrap_or(defaults.api_base_url);
        let instance_name = read_storage(INSTANCE_NAME_KEY).unwrap_or(defaults.instance_name);
        Self::new(&api_base_url, &instance_name)
    }
}

fn read_storage(key: &str) -> Option<String> {
    let storage = web_sys::window()?.local_storage().ok()??;
    storage
        .get_item(key)
        .ok()
        .flatten()
        .filter(|value| !value.trim().is_empty())
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let config = AdminConfig::new(" https://termine.example/admin_api/ ", "Impfzentrum");
        assert_eq!(config.api_base_url, "https://termine.example/admin_api");
        assert_eq!(config.instance_name, "Impfzentrum");
    }

    #[test]
    fn test_default() {
        let config = AdminConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE);
        assert_eq!(config.instance_name, DEFAULT_INSTANCE_NAME);
    }
}
