use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a metric value is reported to the sink.
///
/// # Examples
///
/// ```
/// use vsmon_common::types::MetricKind;
///
/// let kind: MetricKind = "gauge".parse().unwrap();
/// assert_eq!(kind, MetricKind::Gauge);
/// assert_eq!(kind.to_string(), "gauge");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Point-in-time value, last write wins.
    Gauge,
    /// Value added to a running total by the receiver.
    Count,
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricKind::Gauge => write!(f, "gauge"),
            MetricKind::Count => write!(f, "count"),
        }
    }
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gauge" => Ok(MetricKind::Gauge),
            "count" => Ok(MetricKind::Count),
            _ => Err(format!("unknown metric kind: {s}")),
        }
    }
}

/// One metric as handed to a sink, stamped with the time it was emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub kind: MetricKind,
    pub value: f64,
    /// Display name of the physical host the value belongs to.
    pub hostname: String,
    /// `key:value` tags, e.g. `nic:vmnic0`.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Format tags into a human-readable string.
///
/// # Examples
///
/// ```
/// use vsmon_common::types::format_tags;
///
/// let tags = vec!["nic:vmnic1".to_string(), "nic:vmnic0".to_string()];
/// assert_eq!(format_tags(&tags), "nic:vmnic0,nic:vmnic1");
/// assert_eq!(format_tags(&[]), "");
/// ```
pub fn format_tags(tags: &[String]) -> String {
    let mut sorted: Vec<&str> = tags.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(",")
}

impl std::fmt::Display for MetricPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}={} host={}",
            self.timestamp.to_rfc3339(),
            self.kind,
            self.name,
            self.value,
            self.hostname
        )?;
        if !self.tags.is_empty() {
            write!(f, " tags={}", format_tags(&self.tags))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn point(tags: Vec<String>) -> MetricPoint {
        MetricPoint {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            name: "vmware.net.packetsRx".to_string(),
            kind: MetricKind::Gauge,
            value: 1500.0,
            hostname: "esx01.lab".to_string(),
            tags,
        }
    }

    #[test]
    fn should_reject_unknown_metric_kind() {
        assert!("histogram".parse::<MetricKind>().is_err());
        assert_eq!("COUNT".parse::<MetricKind>().unwrap(), MetricKind::Count);
    }

    #[test]
    fn should_serialize_kind_in_lowercase() {
        let json = serde_json::to_string(&MetricKind::Count).unwrap();
        assert_eq!(json, "\"count\"");
    }

    #[test]
    fn should_render_point_with_tags_only_when_present() {
        let tagged = point(vec!["nic:vmnic0".to_string()]).to_string();
        assert!(tagged.ends_with("gauge vmware.net.packetsRx=1500 host=esx01.lab tags=nic:vmnic0"));

        let untagged = point(vec![]).to_string();
        assert!(!untagged.contains("tags="));
    }
}
