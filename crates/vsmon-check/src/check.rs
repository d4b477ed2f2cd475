use crate::catalog::{stat_keys, CATALOG};
use crate::config::{InitConfig, InstanceConfig};
use crate::error::{ConnectionError, Result};
use crate::session::{Connection, ConnectionKey, Connector, SessionManager};
use crate::sink::{emit, MetricSink};
use crate::HostRef;
use std::sync::Arc;

/// A counter that could not be extracted for one host.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFailure {
    pub hostname: String,
    pub stat_key: String,
    pub reason: String,
}

/// Outcome of one poll cycle against a management server.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub key: ConnectionKey,
    pub hosts_polled: usize,
    pub metrics_emitted: usize,
    pub failures: Vec<MetricFailure>,
}

/// Polls configured management servers for host performance counters.
pub struct VmwareCheck {
    init_config: InitConfig,
    instances: Vec<InstanceConfig>,
    sessions: SessionManager,
}

impl VmwareCheck {
    pub fn new(
        init_config: InitConfig,
        instances: Vec<InstanceConfig>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            init_config,
            instances,
            sessions: SessionManager::new(connector),
        }
    }

    pub fn init_config(&self) -> &InitConfig {
        &self.init_config
    }

    pub fn instances(&self) -> &[InstanceConfig] {
        &self.instances
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Run one poll cycle for `instance`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CheckError::InvalidConfig`] for an unusable instance and
    /// [`crate::error::CheckError::Connection`] when the session cannot be opened or a call
    /// on it fails. Counters with unsupported units are reported in
    /// [`CheckReport::failures`] instead.
    pub fn check(&self, instance: &InstanceConfig, sink: &mut dyn MetricSink) -> Result<CheckReport> {
        instance.validate()?;
        let key = instance.key();
        tracing::debug!(host = %key, "Starting poll cycle");

        let conn = self.sessions.acquire(instance)?;
        let mut report = CheckReport {
            key: key.clone(),
            hosts_polled: 0,
            metrics_emitted: 0,
            failures: Vec::new(),
        };

        if let Err(e) = self.poll_hosts(&conn, sink, &mut report) {
            if e.is_retryable() {
                self.sessions.evict(&key);
            }
            return Err(e.into());
        }

        tracing::info!(
            host = %key,
            hosts = report.hosts_polled,
            metrics = report.metrics_emitted,
            failures = report.failures.len(),
            "Poll cycle finished"
        );
        Ok(report)
    }

    fn poll_hosts(
        &self,
        conn: &Connection,
        sink: &mut dyn MetricSink,
        report: &mut CheckReport,
    ) -> std::result::Result<(), ConnectionError> {
        let hosts: Vec<HostRef> = conn
            .session
            .list_hosts()?
            .into_iter()
            .map(|(id, name)| HostRef::new(id, name))
            .collect();

        if hosts.is_empty() {
            tracing::warn!(host = %report.key, "No physical hosts visible to session");
            return Ok(());
        }

        let keys = stat_keys();
        for host in &hosts {
            let samples = conn.stats.query_entity_statistics(host, &keys)?;
            let hostname = host.display_name();
            tracing::debug!(hostname, samples = samples.len(), "Received statistics");

            for definition in &CATALOG {
                match definition.extract(&samples) {
                    Ok(metrics) => {
                        for metric in &metrics {
                            emit(sink, metric, hostname);
                        }
                        report.metrics_emitted += metrics.len();
                    }
                    Err(e) => {
                        tracing::warn!(
                            hostname,
                            metric = %definition.stat_key(),
                            error = %e,
                            "Skipping counter"
                        );
                        report.failures.push(MetricFailure {
                            hostname: hostname.to_string(),
                            stat_key: definition.stat_key(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
            report.hosts_polled += 1;
        }
        Ok(())
    }

    /// Run one poll cycle for every configured instance, in order.
    pub fn check_all(&self, sink: &mut dyn MetricSink) -> Vec<(ConnectionKey, Result<CheckReport>)> {
        self.instances
            .iter()
            .map(|instance| {
                let result = self.check(instance, sink);
                if let Err(e) = &result {
                    tracing::warn!(host = %instance.key(), error = %e, "Poll cycle failed");
                }
                (instance.key(), result)
            })
            .collect()
    }
}

