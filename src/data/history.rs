//! Bounded metric history for trend charts.

use std::collections::VecDeque;
use std::fmt::Write as _;

use serde::Deserialize;

use homewatch_types::{MetricKind, SystemMetrics};

/// Default number of samples kept per metric.
pub const DEFAULT_CAPACITY: usize = 20;

/// Chart area that [`RingBuffer::points`] maps samples onto.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChartExtent {
    pub width: f64,
    pub height: f64,
}

impl Default for ChartExtent {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 50.0,
        }
    }
}

/// Fixed-capacity sample series. Pushing onto a full buffer evicts the
/// oldest sample.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    values: VecDeque<f64>,
    capacity: usize,
}

impl RingBuffer {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Chart coordinates for the stored samples.
    ///
    /// `x` spreads samples evenly across `extent.width` (0 when there are
    /// fewer than two); `y` is the value clamped to `[0, 100]` and inverted
    /// so 100% sits at the top. An empty buffer yields a single point on the
    /// baseline.
    pub fn points(&self, extent: ChartExtent) -> Points<'_> {
        Points {
            values: &self.values,
            extent,
            index: 0,
            end: self.values.len().max(1),
        }
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Lazy iterator over `(x, y)` chart points. Clone it to restart.
#[derive(Debug, Clone)]
pub struct Points<'a> {
    values: &'a VecDeque<f64>,
    extent: ChartExtent,
    index: usize,
    end: usize,
}

impl Iterator for Points<'_> {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.end {
            return None;
        }
        let i = self.index;
        self.index += 1;

        let len = self.values.len();
        let x = if len <= 1 {
            0.0
        } else {
            i as f64 * self.extent.width / (len - 1) as f64
        };
        let value = self.values.get(i).copied().unwrap_or(0.0);
        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 100.0) };
        let y = self.extent.height - value / 100.0 * self.extent.height;
        Some((x, y))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Points<'_> {}

/// Render points as an SVG polyline `points` attribute: `"0,40 100,30"`.
pub fn polyline(points: impl Iterator<Item = (f64, f64)>) -> String {
    let mut out = String::new();
    for (i, (x, y)) in points.enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{},{}", x, y);
    }
    out
}

/// One ring buffer per host metric.
#[derive(Debug, Clone)]
pub struct History {
    memory: RingBuffer,
    disk: RingBuffer,
    cpu: RingBuffer,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            memory: RingBuffer::new(capacity),
            disk: RingBuffer::new(capacity),
            cpu: RingBuffer::new(capacity),
        }
    }

    /// Append one sample to every series.
    pub fn record(&mut self, metrics: &SystemMetrics) {
        for kind in MetricKind::ALL {
            self.buffer_mut(kind).push(metrics.get(kind));
        }
    }

    pub fn buffer(&self, kind: MetricKind) -> &RingBuffer {
        match kind {
            MetricKind::Memory => &self.memory,
            MetricKind::Disk => &self.disk,
            MetricKind::Cpu => &self.cpu,
        }
    }

    fn buffer_mut(&mut self, kind: MetricKind) -> &mut RingBuffer {
        match kind {
            MetricKind::Memory => &mut self.memory,
            MetricKind::Disk => &mut self.disk,
            MetricKind::Cpu => &mut self.cpu,
        }
    }

    pub fn points(&self, kind: MetricKind, extent: ChartExtent) -> Points<'_> {
        self.buffer(kind).points(extent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let mut buf = RingBuffer::new(20);
        for v in 0..25 {
            buf.push(v as f64);
        }
        assert_eq!(buf.len(), 20);
        let values: Vec<f64> = buf.iter().collect();
        let expected: Vec<f64> = (5..25).map(|v| v as f64).collect();
        assert_eq!(values, expected);
        assert_eq!(buf.latest(), Some(24.0));
    }

    #[test]
    fn test_ring_buffer_never_exceeds_capacity() {
        let mut buf = RingBuffer::default();
        assert_eq!(buf.capacity(), DEFAULT_CAPACITY);
        for k in 0..100 {
            buf.push(k as f64);
            assert!(buf.len() <= buf.capacity());
        }
    }

    #[test]
    fn test_points_three_samples() {
        let mut buf = RingBuffer::default();
        for v in [10.0, 20.0, 30.0] {
            buf.push(v);
        }
        let points: Vec<_> = buf.points(ChartExtent::default()).collect();
        assert_eq!(points, vec![(0.0, 45.0), (100.0, 40.0), (200.0, 35.0)]);
    }

    #[test]
    fn test_points_degenerate_inputs() {
        let extent = ChartExtent::default();

        let empty = RingBuffer::default();
        assert_eq!(empty.points(extent).collect::<Vec<_>>(), vec![(0.0, 50.0)]);

        let mut one = RingBuffer::default();
        one.push(50.0);
        assert_eq!(one.points(extent).collect::<Vec<_>>(), vec![(0.0, 25.0)]);
    }

    #[test]
    fn test_points_clamped() {
        let mut buf = RingBuffer::default();
        buf.push(-10.0);
        buf.push(150.0);
        let points: Vec<_> = buf.points(ChartExtent::default()).collect();
        assert_eq!(points, vec![(0.0, 50.0), (200.0, 0.0)]);
    }

    #[test]
    fn test_points_restartable() {
        let mut buf = RingBuffer::default();
        buf.push(10.0);
        buf.push(90.0);
        let points = buf.points(ChartExtent::default());
        assert_eq!(points.len(), 2);
        let first: Vec<_> = points.clone().collect();
        let second: Vec<_> = points.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_history_records_each_kind() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.record(&SystemMetrics::new(i as f64, 50.0, 100.0 - i as f64));
        }
        assert_eq!(history.buffer(MetricKind::Memory).iter().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
        assert_eq!(history.buffer(MetricKind::Disk).latest(), Some(50.0));
        assert_eq!(history.buffer(MetricKind::Cpu).latest(), Some(96.0));
    }

    #[test]
    fn test_polyline() {
        let mut buf = RingBuffer::default();
        buf.push(0.0);
        buf.push(100.0);
        assert_eq!(polyline(buf.points(ChartExtent::default())), "0,50 200,0");
    }
}
