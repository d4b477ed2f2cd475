use crate::error::Result;
use crate::units::convert;
use crate::{NormalizedMetric, RawSample};

/// Prefix of every emitted metric name.
pub const METRIC_PREFIX: &str = "vmware";

/// One counter requested from the statistics API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetricDefinition {
    pub group: &'static str,
    pub counter: &'static str,
    /// Sub-entity dimension the counter is reported per (e.g. `nic`).
    pub tagged_by: Option<&'static str>,
}

impl MetricDefinition {
    pub const fn host(group: &'static str, counter: &'static str) -> Self {
        Self {
            group,
            counter,
            tagged_by: None,
        }
    }

    pub const fn tagged(group: &'static str, counter: &'static str, tagged_by: &'static str) -> Self {
        Self {
            group,
            counter,
            tagged_by: Some(tagged_by),
        }
    }

    /// Key used to request this counter, `<group>.<counter>`.
    pub fn stat_key(&self) -> String {
        format!("{}.{}", self.group, self.counter)
    }

    pub fn metric_name(&self) -> String {
        format!("{METRIC_PREFIX}.{}.{}", self.group, self.counter)
    }

    fn matches(&self, sample: &RawSample) -> bool {
        sample.group == self.group && sample.counter == self.counter
    }

    /// Convert the samples belonging to this counter.
    ///
    /// Host-level definitions only take samples without a sub-instance id and
    /// tagged definitions only take samples with one; anything else is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CheckError::UnsupportedUnit`] if any accepted
    /// sample carries an unknown unit. Nothing is returned for the definition
    /// in that case.
    pub fn extract(&self, samples: &[RawSample]) -> Result<Vec<NormalizedMetric>> {
        let mut metrics = Vec::new();
        for sample in samples.iter().filter(|s| self.matches(s)) {
            let tag = match (self.tagged_by, sample.sub_instance()) {
                (Some(dimension), Some(instance)) => Some(format!("{dimension}:{instance}")),
                (None, None) => None,
                _ => {
                    tracing::trace!(
                        metric = %self.stat_key(),
                        instance = %sample.sub_instance_id,
                        "Dropping sample with mismatched tagging"
                    );
                    continue;
                }
            };
            let (value, kind) = convert(sample.value, &sample.unit)?;
            metrics.push(NormalizedMetric {
                name: self.metric_name(),
                value,
                kind,
                tag,
            });
        }
        Ok(metrics)
    }
}

/// Counters collected from every host, in emission order.
pub static CATALOG: [MetricDefinition; 16] = [
    MetricDefinition::host("cpu", "coreUtilization"),
    MetricDefinition::host("cpu", "usage"),
    MetricDefinition::host("cpu", "utilization"),
    MetricDefinition::host("mem", "active"),
    MetricDefinition::host("mem", "compressed"),
    MetricDefinition::host("mem", "consumed"),
    MetricDefinition::host("mem", "granted"),
    MetricDefinition::host("mem", "shared"),
    MetricDefinition::host("mem", "sysUsage"),
    MetricDefinition::host("mem", "swapused"),
    MetricDefinition::host("mem", "usage"),
    MetricDefinition::host("power", "power"),
    MetricDefinition::host("power", "energy"),
    MetricDefinition::tagged("net", "packetsRx", "nic"),
    MetricDefinition::tagged("net", "packetsTx", "nic"),
    MetricDefinition::tagged("net", "multicastRx", "nic"),
];

/// Stat keys for the whole catalog, requested as one batch per host.
pub fn stat_keys() -> Vec<String> {
    CATALOG.iter().map(MetricDefinition::stat_key).collect()
}

/// Look up a catalog entry by its `<group>.<counter>` key.
pub fn find(stat_key: &str) -> Option<&'static MetricDefinition> {
    CATALOG.iter().find(|d| d.stat_key() == stat_key)
}
