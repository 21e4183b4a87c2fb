//! Configuration loaded from `menuflow.toml`.
//!
//! Values missing from the file fall back to defaults. The environment
//! variables `DATABASE_URL`, `GEMINI_API_KEY` and `CLOUD_NAME` take
//! precedence over the file, matching how the store connection and service
//! credentials are usually injected in deployment.

use std::path::Path;

use serde::Deserialize;

use crate::error::MenuflowError;

#[derive(Debug, Clone, Deserialize)]
pub struct MenuflowConfig {
    /// Postgres connection string for the record store.
    #[serde(default)]
    pub database_url: String,

    /// Gemini API key.
    #[serde(default)]
    pub api_key: String,

    /// Gemini model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Cloudinary cloud name, used to derive the image delivery URL.
    #[serde(default)]
    pub cloud_name: String,

    /// Full image delivery base URL. Overrides the Cloudinary default
    /// derived from `cloud_name` when set.
    #[serde(default)]
    pub image_base_url: Option<String>,

    /// Folder the menu images were uploaded under.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Output token cap for each inference call.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_namespace() -> String {
    "zomato".to_string()
}

fn default_max_output_tokens() -> u32 {
    8192
}

impl Default for MenuflowConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            api_key: String::new(),
            model: default_model(),
            cloud_name: String::new(),
            image_base_url: None,
            namespace: default_namespace(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl MenuflowConfig {
    /// Load from `menuflow.toml` in the working directory, then apply
    /// environment overrides.
    pub fn load() -> Result<Self, MenuflowError> {
        let mut config = Self::load_from(Path::new("menuflow.toml"))?;
        apply_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a specific file, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, MenuflowError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str::<MenuflowConfig>(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    /// The image delivery root: explicit override, or the Cloudinary
    /// template derived from `cloud_name`.
    pub fn image_base_url(&self) -> String {
        match &self.image_base_url {
            Some(url) => url.clone(),
            None => format!(
                "https://res.cloudinary.com/{}/image/upload",
                self.cloud_name
            ),
        }
    }

    /// Reject configurations that cannot possibly run.
    pub fn validate(&self) -> Result<(), MenuflowError> {
        if self.database_url.is_empty() {
            return Err(MenuflowError::Config(
                "database_url is required (or set DATABASE_URL)".into(),
            ));
        }
        if self.api_key.is_empty() {
            return Err(MenuflowError::Config(
                "api_key is required (or set GEMINI_API_KEY)".into(),
            ));
        }
        if self.cloud_name.is_empty() && self.image_base_url.is_none() {
            return Err(MenuflowError::Config(
                "either cloud_name or image_base_url is required".into(),
            ));
        }
        Ok(())
    }
}

fn apply_overrides(config: &mut MenuflowConfig, get: impl Fn(&str) -> Option<String>) {
    if let Some(url) = get("DATABASE_URL").filter(|v| !v.is_empty()) {
        config.database_url = url;
    }
    if let Some(key) = get("GEMINI_API_KEY").filter(|v| !v.is_empty()) {
        config.api_key = key;
    }
    if let Some(name) = get("CLOUD_NAME").filter(|v| !v.is_empty()) {
        config.cloud_name = name;
    }
}
