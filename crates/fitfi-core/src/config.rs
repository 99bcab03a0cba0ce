use std::{collections::HashMap, fs, path::Path};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub env: String,
}

fn default_nova_mode() -> String {
    "chat".to_string()
}

fn default_streaming() -> bool {
    true
}

/// Settings for the Nova assistant endpoint.
///
/// `streaming` is the administrative kill switch: when false the client
/// short-circuits to an error event without touching the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NovaSettings {
    pub base_url: String,
    #[serde(default = "default_streaming")]
    pub streaming: bool,
    #[serde(default = "default_nova_mode")]
    pub mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FusionSettings {
    /// Raw archetype mixture; normalized at scoring time, so weights
    /// need not sum to anything in particular.
    #[serde(default)]
    pub default_blend: HashMap<String, f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogSettings {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitfiConfig {
    pub app: AppConfig,
    pub nova: NovaSettings,
    #[serde(default)]
    pub fusion: FusionSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
}

pub fn resolve_env_var(raw: &str) -> String {
    let mut output = String::new();
    let mut rest = raw;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);

        let candidate = &rest[start + 2..];
        let Some(end) = candidate.find('}') else {
            output.push_str(&rest[start..]);
            return output;
        };

        let key = &candidate[..end];
        output.push_str(&std::env::var(key).unwrap_or_default());
        rest = &candidate[end + 1..];
    }

    output.push_str(rest);
    output
}

pub fn load_config(path: &Path, known_archetypes: &[&str]) -> Result<FitfiConfig> {
    let mut config: FitfiConfig = read_yaml_file(path)?;
    resolve_config_env(&mut config);
    validate_config(&config, known_archetypes)?;
    Ok(config)
}

pub fn validate_config(config: &FitfiConfig, known_archetypes: &[&str]) -> Result<()> {
    if config.nova.base_url.trim().is_empty() {
        return Err(anyhow!("nova.base_url must not be empty"));
    }

    for (archetype_id, weight) in &config.fusion.default_blend {
        if !known_archetypes.contains(&archetype_id.as_str()) {
            return Err(anyhow!(
                "unknown archetype in fusion.default_blend: {archetype_id}"
            ));
        }
        if !weight.is_finite() || *weight < 0.0 {
            return Err(anyhow!(
                "invalid weight for archetype {archetype_id}: {weight}"
            ));
        }
    }

    Ok(())
}

fn read_yaml_file<T>(path: &Path) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse yaml file: {}", path.display()))
}

fn resolve_config_env(config: &mut FitfiConfig) {
    config.app.name = resolve_env_var(&config.app.name);
    config.app.env = resolve_env_var(&config.app.env);
    config.nova.base_url = resolve_env_var(&config.nova.base_url);
    config.nova.mode = resolve_env_var(&config.nova.mode);
    if let Some(path) = &mut config.catalog.path {
        *path = resolve_env_var(path);
    }
}
