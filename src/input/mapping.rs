//! Raw input identification
//!
//! Value types naming one raw input source: a key on a device, or one
//! direction of an axis on a device. A signed physical axis occupies two
//! mappings, one per direction.

use std::fmt;
use std::str::FromStr;

use super::error::MapperError;
use super::keynames;

/// Identifier of a physical input device.
///
/// Ids beyond the known range are accepted everywhere but share the
/// [`DeviceId::UNKNOWN`] slot in per-device tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u16);

impl DeviceId {
    pub const DEFAULT: DeviceId = DeviceId(0);
    pub const KEYBOARD: DeviceId = DeviceId(1);
    pub const MOUSE: DeviceId = DeviceId(2);
    pub const PAD_0: DeviceId = DeviceId(10);
    pub const PAD_1: DeviceId = DeviceId(11);
    pub const PAD_2: DeviceId = DeviceId(12);
    pub const PAD_3: DeviceId = DeviceId(13);
    pub const XINPUT_0: DeviceId = DeviceId(20);
    pub const ACCELEROMETER: DeviceId = DeviceId(30);
    pub const TOUCH: DeviceId = DeviceId(42);
    pub const UNKNOWN: DeviceId = DeviceId(47);

    /// Number of per-device slots, including the unknown slot
    pub const SLOTS: usize = 48;

    /// Generic gamepad `n` (0..=9)
    pub const fn pad(n: u16) -> DeviceId {
        DeviceId(Self::PAD_0.0 + if n > 9 { 9 } else { n })
    }

    /// Index into per-device tables, clamped to the unknown slot
    pub fn slot(self) -> usize {
        (self.0 as usize).min(Self::UNKNOWN.0 as usize)
    }

    pub fn is_mouse(self) -> bool {
        self == Self::MOUSE
    }
}

/// Platform key code (the keyboard and gamepad button space share it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub u32);

/// Analog axis identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AxisId(pub u16);

impl AxisId {
    pub const X: AxisId = AxisId(0);
    pub const Y: AxisId = AxisId(1);
    pub const Z: AxisId = AxisId(11);
    pub const RX: AxisId = AxisId(12);
    pub const RY: AxisId = AxisId(13);
    pub const RZ: AxisId = AxisId(14);
    pub const HAT_X: AxisId = AxisId(15);
    pub const HAT_Y: AxisId = AxisId(16);
    pub const LTRIGGER: AxisId = AxisId(17);
    pub const RTRIGGER: AxisId = AxisId(18);
    pub const GAS: AxisId = AxisId(22);
    pub const BRAKE: AxisId = AxisId(23);
    pub const MOUSE_REL_X: AxisId = AxisId(26);
    pub const MOUSE_REL_Y: AxisId = AxisId(27);
    pub const UNKNOWN: AxisId = AxisId(47);

    /// Number of per-axis slots, including the unknown slot
    pub const SLOTS: usize = 48;

    pub fn slot(self) -> usize {
        (self.0 as usize).min(Self::UNKNOWN.0 as usize)
    }

    /// Classification used for threshold selection.
    pub fn class(self) -> AxisClass {
        match self {
            Self::GAS | Self::BRAKE | Self::LTRIGGER | Self::RTRIGGER => AxisClass::Trigger,
            Self::X | Self::Y | Self::Z | Self::RX | Self::RY | Self::RZ => AxisClass::Stick,
            _ => AxisClass::Other,
        }
    }

    /// The perpendicular axis on the same physical stick.
    ///
    /// Z/RZ pair up because that is how XInput right sticks arrive.
    pub fn co_axis(self) -> Option<AxisId> {
        match self {
            Self::X => Some(Self::Y),
            Self::Y => Some(Self::X),
            Self::Z => Some(Self::RZ),
            Self::RZ => Some(Self::Z),
            Self::RX => Some(Self::RY),
            Self::RY => Some(Self::RX),
            _ => None,
        }
    }

    /// Stick axes are reported as signed values centered on zero.
    pub fn is_signed(self) -> bool {
        self.class() == AxisClass::Stick
    }
}

/// Physical axis classes with distinct threshold behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisClass {
    Trigger,
    Stick,
    Other,
}

/// One half of an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Negative,
    Positive,
}

impl Direction {
    pub fn sign(self) -> i8 {
        match self {
            Direction::Negative => -1,
            Direction::Positive => 1,
        }
    }

    pub fn flip(self) -> Direction {
        match self {
            Direction::Negative => Direction::Positive,
            Direction::Positive => Direction::Negative,
        }
    }

    /// Direction matching the sign of a raw sample; zero counts as positive.
    pub fn of(value: f32) -> Direction {
        if value < 0.0 {
            Direction::Negative
        } else {
            Direction::Positive
        }
    }
}

/// What on a device produced the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InputSource {
    Key(KeyCode),
    Axis { axis: AxisId, direction: Direction },
}

/// A single raw input source on a single device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputMapping {
    pub device: DeviceId,
    pub source: InputSource,
}

impl InputMapping {
    pub const fn key(device: DeviceId, key: KeyCode) -> Self {
        Self {
            device,
            source: InputSource::Key(key),
        }
    }

    pub const fn axis(device: DeviceId, axis: AxisId, direction: Direction) -> Self {
        Self {
            device,
            source: InputSource::Axis { axis, direction },
        }
    }

    pub fn is_axis(&self) -> bool {
        matches!(self.source, InputSource::Axis { .. })
    }

    /// -1 or +1 for axis halves, 0 for keys
    pub fn direction(&self) -> i8 {
        match self.source {
            InputSource::Key(_) => 0,
            InputSource::Axis { direction, .. } => direction.sign(),
        }
    }

    pub fn axis_id(&self) -> Option<AxisId> {
        match self.source {
            InputSource::Key(_) => None,
            InputSource::Axis { axis, .. } => Some(axis),
        }
    }

    pub fn key_code(&self) -> Option<KeyCode> {
        match self.source {
            InputSource::Key(key) => Some(key),
            InputSource::Axis { .. } => None,
        }
    }

    /// The other half of the same axis; keys are returned unchanged.
    pub fn flip_direction(&self) -> Self {
        match self.source {
            InputSource::Key(_) => *self,
            InputSource::Axis { axis, direction } => Self::axis(self.device, axis, direction.flip()),
        }
    }
}

impl fmt::Display for InputMapping {
    /// Text form: `<device>-<key>` or `<device>-a<axis><+|->`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            InputSource::Key(key) => match keynames::key_name_opt(key) {
                Some(name) => write!(f, "{}-{}", self.device.0, name),
                None => write!(f, "{}-{}", self.device.0, key.0),
            },
            InputSource::Axis { axis, direction } => {
                let sign = if direction == Direction::Negative { '-' } else { '+' };
                write!(f, "{}-a{}{}", self.device.0, axis.0, sign)
            }
        }
    }
}

impl FromStr for InputMapping {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MapperError::InvalidMapping(s.to_string());

        let (device, rest) = s.trim().split_once('-').ok_or_else(invalid)?;
        let device = DeviceId(device.parse().map_err(|_| invalid())?);
        if rest.is_empty() {
            return Err(invalid());
        }

        if let Some(axis) = rest.strip_prefix('a') {
            let direction = if let Some(id) = axis.strip_suffix('+') {
                Some((id, Direction::Positive))
            } else {
                axis.strip_suffix('-').map(|id| (id, Direction::Negative))
            };
            if let Some((id, direction)) = direction {
                if let Ok(id) = id.parse::<u16>() {
                    return Ok(Self::axis(device, AxisId(id), direction));
                }
            }
        }

        let key = match rest.parse::<u32>() {
            Ok(code) => KeyCode(code),
            Err(_) => keynames::key_from_name(rest).ok_or_else(invalid)?,
        };
        Ok(Self::key(device, key))
    }
}

/// Last known value of one mapping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputSample {
    /// 0..1; for axes the magnitude of this direction
    pub value: f32,
    /// Seconds, caller's clock
    pub timestamp: f64,
}

impl InputSample {
    pub const fn new(value: f32, timestamp: f64) -> Self {
        Self { value, timestamp }
    }
}

/// A key or button transition from the platform layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub device: DeviceId,
    pub key_code: KeyCode,
    pub pressed: bool,
    pub is_repeat: bool,
}

impl KeyInput {
    pub fn down(device: DeviceId, key_code: KeyCode) -> Self {
        Self {
            device,
            key_code,
            pressed: true,
            is_repeat: false,
        }
    }

    pub fn up(device: DeviceId, key_code: KeyCode) -> Self {
        Self {
            device,
            key_code,
            pressed: false,
            is_repeat: false,
        }
    }
}

/// A signed analog sample from the platform layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisInput {
    pub device: DeviceId,
    pub axis: AxisId,
    /// -1..1 for sticks, 0..1 for triggers
    pub value: f32,
}

impl AxisInput {
    pub fn new(device: DeviceId, axis: AxisId, value: f32) -> Self {
        Self {
            device,
            axis,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keynames::keys;
    use std::collections::HashSet;

    #[test]
    fn test_axis_directions_are_distinct() {
        let pos = InputMapping::axis(DeviceId::PAD_0, AxisId::X, Direction::Positive);
        let neg = InputMapping::axis(DeviceId::PAD_0, AxisId::X, Direction::Negative);
        assert_ne!(pos, neg);
        assert_eq!(pos.flip_direction(), neg);
        assert_eq!(neg.direction(), -1);

        let set: HashSet<_> = [pos, neg, pos].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_key_mapping_is_not_axis() {
        let m = InputMapping::key(DeviceId::KEYBOARD, keys::W);
        assert!(!m.is_axis());
        assert_eq!(m.direction(), 0);
        assert_eq!(m.flip_direction(), m);
        assert_eq!(m.key_code(), Some(keys::W));
    }

    #[test]
    fn test_device_slot_clamps() {
        assert_eq!(DeviceId::KEYBOARD.slot(), 1);
        assert_eq!(DeviceId(500).slot(), DeviceId::UNKNOWN.0 as usize);
        assert!(DeviceId(u16::MAX).slot() < DeviceId::SLOTS);
        assert_eq!(DeviceId::pad(3), DeviceId::PAD_3);
        assert_eq!(DeviceId::pad(40), DeviceId(19));
    }

    #[test]
    fn test_axis_classes() {
        assert_eq!(AxisId::LTRIGGER.class(), AxisClass::Trigger);
        assert_eq!(AxisId::RZ.class(), AxisClass::Stick);
        assert_eq!(AxisId::HAT_X.class(), AxisClass::Other);
        assert_eq!(AxisId::Z.co_axis(), Some(AxisId::RZ));
        assert_eq!(AxisId::GAS.co_axis(), None);
    }

    #[test]
    fn test_parse_key_mapping() {
        let m: InputMapping = "1-W".parse().unwrap();
        assert_eq!(m, InputMapping::key(DeviceId::KEYBOARD, keys::W));

        let m: InputMapping = "10-96".parse().unwrap();
        assert_eq!(m, InputMapping::key(DeviceId::PAD_0, KeyCode(96)));
    }

    #[test]
    fn test_parse_axis_mapping() {
        let m: InputMapping = "10-a0+".parse().unwrap();
        assert_eq!(
            m,
            InputMapping::axis(DeviceId::PAD_0, AxisId::X, Direction::Positive)
        );
        let m: InputMapping = "11-a14-".parse().unwrap();
        assert_eq!(
            m,
            InputMapping::axis(DeviceId::PAD_1, AxisId::RZ, Direction::Negative)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<InputMapping>().is_err());
        assert!("W".parse::<InputMapping>().is_err());
        assert!("x-W".parse::<InputMapping>().is_err());
        assert!("1-".parse::<InputMapping>().is_err());
        assert!("1-NotAKey".parse::<InputMapping>().is_err());
    }

    #[test]
    fn test_display_uses_key_names() {
        let m = InputMapping::key(DeviceId::KEYBOARD, keys::W);
        assert_eq!(m.to_string(), "1-W");
        let a = InputMapping::axis(DeviceId::PAD_0, AxisId::Y, Direction::Negative);
        assert_eq!(a.to_string(), "10-a1-");
        assert_eq!(a.to_string().parse::<InputMapping>().unwrap(), a);
    }
}
