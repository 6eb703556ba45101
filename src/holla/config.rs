use crate::error::Result;
use crate::output::OutputFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";

/// Configuration for holla, stored in `<config_dir>/config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HollaConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack: Option<SlackConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlackConfig {
    /// Default output format when neither `--json` nor `--plain` is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<AttributionSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttributionSettings {
    /// Emoji name added as a reaction, or `false` to disable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction: Option<Setting>,

    /// Suffix template appended to messages (`{agent}` is substituted), or `false`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<Setting>,
}

/// A config value that is either a string or the literal `false`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Setting {
    Value(String),
    Flag(bool),
}

impl Setting {
    /// The string value, or `None` when the setting is a boolean.
    pub fn value(&self) -> Option<&str> {
        match self {
            Setting::Value(v) => Some(v),
            Setting::Flag(_) => None,
        }
    }
}

impl HollaConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: HollaConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content + "\n")?;
        Ok(())
    }

    pub fn output_format(&self) -> Option<OutputFormat> {
        self.slack.as_ref().and_then(|s| s.output_format)
    }

    pub fn attribution(&self) -> Option<&AttributionSettings> {
        self.slack.as_ref().and_then(|s| s.attribution.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_config() {
        let dir = TempDir::new().unwrap();
        let config = HollaConfig::load(dir.path()).unwrap();
        assert_eq!(config, HollaConfig::default());
        assert_eq!(config.output_format(), None);
    }

    #[test]
    fn test_parse_attribution_false_and_string() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{"slack":{"outputFormat":"plain","attribution":{"reaction":false,"suffix":"_sent by {agent}_"}}}"#,
        )
        .unwrap();

        let config = HollaConfig::load(dir.path()).unwrap();
        assert_eq!(config.output_format(), Some(OutputFormat::Plain));
        let attr = config.attribution().unwrap();
        assert_eq!(attr.reaction, Some(Setting::Flag(false)));
        assert_eq!(
            attr.suffix.as_ref().and_then(|s| s.value()),
            Some("_sent by {agent}_")
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");

        let config = HollaConfig {
            slack: Some(SlackConfig {
                output_format: Some(OutputFormat::Json),
                attribution: None,
            }),
        };
        config.save(&nested).unwrap();

        let loaded = HollaConfig::load(&nested).unwrap();
        assert_eq!(loaded, config);
    }
}
