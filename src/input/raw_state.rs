//! Live raw input state
//!
//! Everything the mapper knows about the physical inputs: the last sample
//! of every mapping ever seen, the last raw value of every axis (for co-axis
//! thresholds), and when each device last reported anything.

use std::collections::HashMap;

use super::mapping::{AxisId, DeviceId, InputMapping, InputSample};

#[derive(Debug, Clone)]
pub struct RawState {
    /// Entries are never removed; released inputs keep a zero sample so
    /// ordering and decay history survive.
    samples: HashMap<InputMapping, InputSample>,
    /// Signed raw value per axis id, shared across devices
    last_raw_axis: [f32; AxisId::SLOTS],
    /// Diagnostics only
    last_seen: [Option<f64>; DeviceId::SLOTS],
}

impl Default for RawState {
    fn default() -> Self {
        Self::new()
    }
}

impl RawState {
    pub fn new() -> Self {
        Self {
            samples: HashMap::new(),
            last_raw_axis: [0.0; AxisId::SLOTS],
            last_seen: [None; DeviceId::SLOTS],
        }
    }

    pub fn get(&self, mapping: &InputMapping) -> Option<InputSample> {
        self.samples.get(mapping).copied()
    }

    /// Current value, 0 for never-seen mappings
    pub fn value(&self, mapping: &InputMapping) -> f32 {
        self.samples.get(mapping).map_or(0.0, |s| s.value)
    }

    pub fn set(&mut self, mapping: InputMapping, sample: InputSample) {
        self.samples.insert(mapping, sample);
    }

    /// Record an axis-half magnitude.
    ///
    /// The timestamp marks when the value first crossed `threshold` and is
    /// reset to 0 once it drops back below, so strict combo ordering sees
    /// the moment the axis became "pressed", not its latest wiggle.
    pub fn set_axis(&mut self, mapping: InputMapping, value: f32, threshold: f32, now: f64) {
        let sample = self.samples.entry(mapping).or_default();
        sample.value = value;
        if value >= threshold {
            if sample.timestamp == 0.0 {
                sample.timestamp = now;
            }
        } else {
            sample.timestamp = 0.0;
        }
    }

    /// Mappings currently reading nonzero, in a stable order
    pub fn active(&self) -> Vec<InputMapping> {
        let mut active: Vec<InputMapping> = self
            .samples
            .iter()
            .filter(|(_, s)| s.value != 0.0)
            .map(|(m, _)| *m)
            .collect();
        active.sort();
        active
    }

    /// All known samples, sorted for display
    pub fn sorted(&self) -> Vec<(InputMapping, InputSample)> {
        let mut all: Vec<_> = self.samples.iter().map(|(m, s)| (*m, *s)).collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub fn raw_axis(&self, axis: AxisId) -> f32 {
        self.last_raw_axis[axis.slot()]
    }

    pub fn set_raw_axis(&mut self, axis: AxisId, value: f32) {
        self.last_raw_axis[axis.slot()] = value;
    }

    pub fn touch_device(&mut self, device: DeviceId, now: f64) {
        self.last_seen[device.slot()] = Some(now);
    }

    pub fn last_seen(&self, device: DeviceId) -> Option<f64> {
        self.last_seen[device.slot()]
    }
}
