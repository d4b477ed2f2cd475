use crate::NormalizedMetric;
use chrono::Utc;
use std::collections::VecDeque;
use vsmon_common::types::{MetricKind, MetricPoint};

/// Receiver for emitted metrics, one method per [`MetricKind`].
pub trait MetricSink {
    fn gauge(&mut self, name: &str, value: f64, hostname: &str, tags: &[String]);

    fn count(&mut self, name: &str, value: f64, hostname: &str, tags: &[String]);
}

/// Send `metric` to the sink method matching its kind.
pub fn emit(sink: &mut dyn MetricSink, metric: &NormalizedMetric, hostname: &str) {
    let tags: Vec<String> = metric.tag.iter().cloned().collect();
    match metric.kind {
        MetricKind::Gauge => sink.gauge(&metric.name, metric.value, hostname, &tags),
        MetricKind::Count => sink.count(&metric.name, metric.value, hostname, &tags),
    }
}

/// Bounded in-memory sink; the oldest points are dropped once full.
pub struct BufferedSink {
    buffer: VecDeque<MetricPoint>,
    max_size: usize,
    dropped: u64,
}

impl BufferedSink {
    pub fn new(max_size: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(max_size.min(1024)),
            max_size: max_size.max(1),
            dropped: 0,
        }
    }

    fn push(&mut self, kind: MetricKind, name: &str, value: f64, hostname: &str, tags: &[String]) {
        if self.buffer.len() >= self.max_size {
            self.buffer.pop_front();
            self.dropped += 1;
        }
        self.buffer.push_back(MetricPoint {
            timestamp: Utc::now(),
            name: name.to_string(),
            kind,
            value,
            hostname: hostname.to_string(),
            tags: tags.to_vec(),
        });
    }

    pub fn drain_all(&mut self) -> Vec<MetricPoint> {
        self.buffer.drain(..).collect()
    }

    pub fn points(&self) -> impl Iterator<Item = &MetricPoint> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Points discarded because the buffer was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl MetricSink for BufferedSink {
    fn gauge(&mut self, name: &str, value: f64, hostname: &str, tags: &[String]) {
        self.push(MetricKind::Gauge, name, value, hostname, tags);
    }

    fn count(&mut self, name: &str, value: f64, hostname: &str, tags: &[String]) {
        self.push(MetricKind::Count, name, value, hostname, tags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(kind: MetricKind, tag: Option<&str>) -> NormalizedMetric {
        NormalizedMetric {
            name: "vmware.net.packetsRx".to_string(),
            value: 3.0,
            kind,
            tag: tag.map(str::to_string),
        }
    }

    #[test]
    fn should_dispatch_on_metric_kind() {
        let mut sink = BufferedSink::new(10);
        emit(&mut sink, &metric(MetricKind::Gauge, Some("nic:vmnic0")), "esx01");
        emit(&mut sink, &metric(MetricKind::Count, None), "esx02");

        let points = sink.drain_all();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].kind, MetricKind::Gauge);
        assert_eq!(points[0].tags, vec!["nic:vmnic0".to_string()]);
        assert_eq!(points[0].hostname, "esx01");
        assert_eq!(points[1].kind, MetricKind::Count);
        assert!(points[1].tags.is_empty());
        assert!(sink.is_empty());
    }

    #[test]
    fn should_drop_oldest_points_when_full() {
        let mut sink = BufferedSink::new(2);
        for value in 1..=3 {
            sink.gauge("vmware.cpu.usage", f64::from(value), "esx01", &[]);
        }
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.dropped(), 1);
        let values: Vec<f64> = sink.points().map(|p| p.value).collect();
        assert_eq!(values, vec![2.0, 3.0]);
    }
}
