//! Virtual stick composition
//!
//! Each virtual stick is fed one axis at a time from whichever virtual keys
//! drive it, possibly from several devices at once. The stick keeps the
//! last combined raw position and its shaped output, and remembers which
//! device currently deflects it so that a second, idle device reporting
//! near-zero noise cannot yank the stick back to center.

use tracing::debug;

use super::mapping::DeviceId;
use super::outputs::StickAxis;
use super::shaping::{convert_stick, StickShape};

/// Result of feeding one axis value to a stick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisUpdate {
    /// Raw position including the new value, before ghost suppression
    pub raw: (f32, f32),
    /// Whether the value was stored
    pub accepted: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StickState {
    raw_history: [f32; 2],
    converted: [f32; 2],
    owner: Option<DeviceId>,
}

impl StickState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one axis value from `device`.
    ///
    /// Values with magnitude below `ghost_limit` count as "inside the
    /// deadzone". Such a value is ignored when it comes from a device other
    /// than the current owner. A value outside the deadzone claims the stick
    /// for its device; the owner returning inside the deadzone releases it.
    pub fn set_axis(
        &mut self,
        device: DeviceId,
        axis: StickAxis,
        value: f32,
        ghost_limit: f32,
    ) -> AxisUpdate {
        let mut raw = self.raw_history;
        raw[axis.index()] = value;

        let in_deadzone = value.abs() < ghost_limit;
        let accepted = if in_deadzone {
            match self.owner {
                None => true,
                Some(owner) if owner == device => {
                    debug!(device = device.0, "stick released by owner");
                    self.owner = None;
                    true
                }
                Some(_) => false,
            }
        } else {
            if self.owner != Some(device) {
                debug!(device = device.0, "stick claimed");
            }
            self.owner = Some(device);
            true
        };

        if accepted {
            self.raw_history[axis.index()] = value;
        }

        AxisUpdate {
            raw: (raw[0], raw[1]),
            accepted,
        }
    }

    /// Recompute the shaped output from the raw history.
    ///
    /// `limiter` scales the result while the analog limiter is held.
    pub fn recompute(&mut self, shape: &StickShape, limiter: Option<f32>) -> (f32, f32) {
        let (mut x, mut y) = convert_stick(self.raw_history[0], self.raw_history[1], shape);
        if let Some(scale) = limiter {
            x *= scale;
            y *= scale;
        }

        debug_assert!(x.is_finite() && y.is_finite(), "non-finite stick output");
        if !x.is_finite() || !y.is_finite() {
            x = 0.0;
            y = 0.0;
        }

        self.converted = [x, y];
        (x, y)
    }

    /// Override the shaped output, for positions not derived from input
    pub fn set_output(&mut self, x: f32, y: f32) {
        self.converted = [x, y];
    }

    /// Center the raw position and forget the owner
    pub fn reset_history(&mut self) {
        self.raw_history = [0.0; 2];
        self.owner = None;
    }

    pub fn raw(&self) -> (f32, f32) {
        (self.raw_history[0], self.raw_history[1])
    }

    pub fn converted(&self) -> (f32, f32) {
        (self.converted[0], self.converted[1])
    }

    pub fn owner(&self) -> Option<DeviceId> {
        self.owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAD_A: DeviceId = DeviceId::PAD_0;
    const PAD_B: DeviceId = DeviceId::PAD_1;
    const GHOST: f32 = 0.15 * 0.7;

    #[test]
    fn test_idle_second_device_is_ignored() {
        let mut stick = StickState::new();
        assert!(stick.set_axis(PAD_A, StickAxis::X, 0.9, GHOST).accepted);
        assert_eq!(stick.owner(), Some(PAD_A));

        let update = stick.set_axis(PAD_B, StickAxis::X, 0.01, GHOST);
        assert!(!update.accepted);
        assert_eq!(update.raw, (0.01, 0.0));
        assert_eq!(stick.raw(), (0.9, 0.0));
    }

    #[test]
    fn test_owner_returning_to_center_releases() {
        let mut stick = StickState::new();
        stick.set_axis(PAD_A, StickAxis::X, 0.9, GHOST);
        assert!(stick.set_axis(PAD_A, StickAxis::X, 0.0, GHOST).accepted);
        assert_eq!(stick.owner(), None);

        assert!(stick.set_axis(PAD_B, StickAxis::X, 0.01, GHOST).accepted);
        assert_eq!(stick.raw(), (0.01, 0.0));
    }

    #[test]
    fn test_deflection_from_other_device_takes_over() {
        let mut stick = StickState::new();
        stick.set_axis(PAD_A, StickAxis::Y, 0.5, GHOST);
        assert!(stick.set_axis(PAD_B, StickAxis::Y, -0.8, GHOST).accepted);
        assert_eq!(stick.owner(), Some(PAD_B));
        assert_eq!(stick.raw(), (0.0, -0.8));
    }

    #[test]
    fn test_recompute_applies_shape_and_limiter() {
        let mut stick = StickState::new();
        let shape = StickShape {
            deadzone: 0.0,
            inverse_deadzone: 0.0,
            sensitivity: 1.0,
            circular: false,
        };
        stick.set_axis(PAD_A, StickAxis::X, 1.0, GHOST);
        assert_eq!(stick.recompute(&shape, None), (1.0, 0.0));
        assert_eq!(stick.recompute(&shape, Some(0.6)), (0.6, 0.0));
        assert_eq!(stick.converted(), (0.6, 0.0));
    }

    #[test]
    fn test_reset_history() {
        let mut stick = StickState::new();
        stick.set_axis(PAD_A, StickAxis::X, 1.0, GHOST);
        stick.reset_history();
        assert_eq!(stick.raw(), (0.0, 0.0));
        assert_eq!(stick.owner(), None);
    }
}
