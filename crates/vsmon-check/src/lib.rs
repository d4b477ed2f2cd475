//! Performance counter check for vSphere-style virtualization managers.
//!
//! A [`check::VmwareCheck`] acquires a cached session per configured server,
//! enumerates the physical hosts behind it, queries the counters listed in
//! [`catalog::CATALOG`] and hands normalized gauges to a [`sink::MetricSink`].

pub mod catalog;
pub mod check;
pub mod config;
pub mod error;
pub mod replay;
pub mod session;
pub mod sink;
pub mod units;


use serde::{Deserialize, Serialize};
use vsmon_common::types::MetricKind;

/// One statistic value returned for a (group, counter) pair on a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub group: String,
    pub counter: String,
    /// Sub-entity the value applies to (e.g. `vmnic0`); empty for host-level values.
    #[serde(default, alias = "instance")]
    pub sub_instance_id: String,
    pub value: f64,
    pub unit: String,
}

impl RawSample {
    pub fn sub_instance(&self) -> Option<&str> {
        if self.sub_instance_id.is_empty() {
            None
        } else {
            Some(&self.sub_instance_id)
        }
    }
}

/// A converted metric ready to be emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMetric {
    /// `vmware.<group>.<counter>`
    pub name: String,
    pub value: f64,
    pub kind: MetricKind,
    /// `<tagged_by>:<sub_instance_id>` for per-sub-entity counters.
    pub tag: Option<String>,
}

/// A physical host visible through a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRef {
    pub id: String,
    pub name: String,
}

impl HostRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Name to report metrics under; the host id when the server returned no name.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}
