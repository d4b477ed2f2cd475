//! Offline connector that serves recorded inventory and statistics from a
//! JSON fixture instead of a live management server.

use crate::config::InstanceConfig;
use crate::error::{ConnectionError, Result};
use crate::session::{Connector, Session, StatsHandle};
use crate::{HostRef, RawSample};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Oldest API major version the counter catalog is valid for.
const MIN_API_MAJOR: u32 = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayFixture {
    #[serde(default)]
    pub servers: Vec<ReplayServer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayServer {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub hosts: Vec<ReplayHost>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayHost {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub samples: Vec<RawSample>,
}

pub struct ReplayConnector {
    servers: Vec<Arc<ReplayServer>>,
}

impl ReplayConnector {
    pub fn new(fixture: ReplayFixture) -> Self {
        Self {
            servers: fixture.servers.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let fixture: ReplayFixture = serde_json::from_str(content)?;
        Ok(Self::new(fixture))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    fn find(&self, instance: &InstanceConfig) -> Option<&Arc<ReplayServer>> {
        self.servers
            .iter()
            .find(|s| s.host == instance.host && s.port == instance.port)
    }
}

fn api_major(version: &str) -> Option<u32> {
    version.split('.').next()?.trim().parse().ok()
}

impl Connector for ReplayConnector {
    fn connect(&self, instance: &InstanceConfig) -> std::result::Result<Box<dyn Session>, ConnectionError> {
        let target = instance.key().to_string();
        let server = self.find(instance).ok_or_else(|| ConnectionError::Network {
            host: target.clone(),
            reason: "no such server in replay fixture".to_string(),
        })?;

        if server.username != instance.username || server.password != instance.password {
            return Err(ConnectionError::AuthFailed {
                host: target,
                reason: "cannot complete login due to an incorrect user name or password".to_string(),
            });
        }

        if let Some(version) = &server.api_version {
            match api_major(version) {
                Some(major) if major >= MIN_API_MAJOR => {}
                _ => {
                    return Err(ConnectionError::ProtocolMismatch {
                        host: target,
                        version: version.clone(),
                    })
                }
            }
        }

        Ok(Box::new(ReplaySession {
            target,
            server: Arc::clone(server),
        }))
    }
}

#[derive(Clone)]
struct ReplaySession {
    target: String,
    server: Arc<ReplayServer>,
}

impl Session for ReplaySession {
    fn list_hosts(&self) -> std::result::Result<BTreeMap<String, String>, ConnectionError> {
        Ok(self
            .server
            .hosts
            .iter()
            .map(|h| (h.id.clone(), h.name.clone()))
            .collect())
    }

    fn statistics_handle(&self) -> std::result::Result<Box<dyn StatsHandle>, ConnectionError> {
        Ok(Box::new(self.clone()))
    }
}

impl StatsHandle for ReplaySession {
    fn query_entity_statistics(
        &self,
        host: &HostRef,
        stat_keys: &[String],
    ) -> std::result::Result<Vec<RawSample>, ConnectionError> {
        let recorded = self
            .server
            .hosts
            .iter()
            .find(|h| h.id == host.id)
            .ok_or_else(|| ConnectionError::Request {
                host: self.target.clone(),
                reason: format!("managed object {} not found", host.id),
            })?;

        Ok(recorded
            .samples
            .iter()
            .filter(|s| {
                stat_keys
                    .iter()
                    .any(|k| k.split_once('.') == Some((s.group.as_str(), s.counter.as_str())))
            })
            .cloned()
            .collect())
    }
}
