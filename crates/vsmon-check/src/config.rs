use crate::error::{CheckError, Result};
use crate::session::ConnectionKey;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Check configuration in the agent's `conf.d/vmware.yaml` layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub init_config: InitConfig,
    #[serde(default)]
    pub instances: Vec<InstanceConfig>,
}

/// Settings shared by every instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitConfig {
    /// Seconds between poll cycles when the runner repeats; `None` runs once.
    #[serde(default)]
    pub collection_interval_secs: Option<u64>,
    #[serde(default = "default_buffer_max_size")]
    pub buffer_max_size: usize,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            collection_interval_secs: None,
            buffer_max_size: default_buffer_max_size(),
        }
    }
}

fn default_buffer_max_size() -> usize {
    10_000
}

/// `init_config:` with no body parses as YAML null.
fn null_as_default<'de, D>(deserializer: D) -> std::result::Result<InitConfig, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<InitConfig>::deserialize(deserializer)?.unwrap_or_default())
}

/// One management server to poll.
#[derive(Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for InstanceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl InstanceConfig {
    pub fn key(&self) -> ConnectionKey {
        ConnectionKey::new(&self.host, self.port)
    }

    /// Reject instances that could never connect.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(CheckError::InvalidConfig("instance is missing 'host'".to_string()));
        }
        if self.username.trim().is_empty() {
            return Err(CheckError::InvalidConfig(format!(
                "instance {} is missing 'username'",
                self.key()
            )));
        }
        Ok(())
    }
}

impl CheckConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        if config.init_config.buffer_max_size == 0 {
            return Err(CheckError::InvalidConfig(
                "init_config.buffer_max_size must be greater than 0".to_string(),
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
init_config:

instances:
  - host: vcenter.lab
    port: 443
    username: monitor
    password: s3cret
  - host: esx-standalone.lab
    username: root
"#;

    #[test]
    fn should_parse_instances_with_optional_port() {
        let cfg = CheckConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(cfg.instances.len(), 2);
        assert_eq!(cfg.instances[0].port, Some(443));
        assert_eq!(cfg.instances[1].port, None);
        assert_eq!(cfg.instances[1].password, "");
        assert_eq!(cfg.init_config.buffer_max_size, 10_000);
        assert_eq!(cfg.init_config.collection_interval_secs, None);
    }

    #[test]
    fn should_read_init_config_overrides() {
        let cfg = CheckConfig::from_yaml_str(
            "init_config:\n  collection_interval_secs: 20\n  buffer_max_size: 50\ninstances: []\n",
        )
        .unwrap();
        assert_eq!(cfg.init_config.collection_interval_secs, Some(20));
        assert_eq!(cfg.init_config.buffer_max_size, 50);
        assert!(cfg.instances.is_empty());
    }

    #[test]
    fn should_reject_zero_buffer_size() {
        let err = CheckConfig::from_yaml_str("init_config:\n  buffer_max_size: 0\n").unwrap_err();
        assert!(matches!(err, CheckError::InvalidConfig(_)));
    }

    #[test]
    fn should_validate_required_fields() {
        let mut cfg = CheckConfig::from_yaml_str(SAMPLE).unwrap();
        assert!(cfg.instances[0].validate().is_ok());

        cfg.instances[0].username = " ".to_string();
        let err = cfg.instances[0].validate().unwrap_err();
        assert!(err.to_string().contains("vcenter.lab:443"));

        cfg.instances[1].host = String::new();
        assert!(cfg.instances[1].validate().is_err());
    }

    #[test]
    fn should_redact_password_in_debug_output() {
        let cfg = CheckConfig::from_yaml_str(SAMPLE).unwrap();
        let rendered = format!("{:?}", cfg.instances[0]);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("monitor"));
    }

    #[test]
    fn should_load_config_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let cfg = CheckConfig::load(file.path()).unwrap();
        assert_eq!(cfg.instances[0].key().to_string(), "vcenter.lab:443");
    }

    #[test]
    fn should_report_missing_file_as_io_error() {
        let err = CheckConfig::load("/nonexistent/vmware.yaml").unwrap_err();
        assert!(matches!(err, CheckError::Io(_)));
    }
}
