//! Mapper output events
//!
//! The mapper reports everything it decides through a [`MapperSink`]. Events
//! are collected while the mapper state is locked and delivered afterwards,
//! so a sink is free to call back into the mapper.

use std::fmt;

use super::keynames;
use super::mapping::DeviceId;
use super::outputs::{buttons, Stick, VirtKey};

/// Consumer of mapper output.
///
/// Every method has an empty default so a sink only implements what it
/// cares about.
pub trait MapperSink: Send + Sync {
    /// Digital buttons that went down and up in one pass
    fn on_digital_delta(&self, _pressed: u32, _released: u32) {}

    /// A virtual key crossed its threshold
    fn on_virtual_key_edge(&self, _key: VirtKey, _down: bool) {}

    /// Analog value of a virtual key that does not drive a stick
    fn on_virtual_key_analog(&self, _device: DeviceId, _key: VirtKey, _value: f32) {}

    /// Shaped stick position
    fn on_stick_output(&self, _stick: Stick, _x: f32, _y: f32) {}

    /// Stick position before shaping, for calibration displays
    fn on_stick_raw(&self, _stick: Stick, _x: f32, _y: f32) {}
}

/// One deferred sink call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapperEvent {
    DigitalDelta { pressed: u32, released: u32 },
    VirtualKeyEdge { key: VirtKey, down: bool },
    VirtualKeyAnalog { device: DeviceId, key: VirtKey, value: f32 },
    StickOutput { stick: Stick, x: f32, y: f32 },
    StickRaw { stick: Stick, x: f32, y: f32 },
}

impl MapperEvent {
    /// Deliver this event to `sink`
    pub fn dispatch(&self, sink: &dyn MapperSink) {
        match *self {
            MapperEvent::DigitalDelta { pressed, released } => {
                sink.on_digital_delta(pressed, released)
            }
            MapperEvent::VirtualKeyEdge { key, down } => sink.on_virtual_key_edge(key, down),
            MapperEvent::VirtualKeyAnalog { device, key, value } => {
                sink.on_virtual_key_analog(device, key, value)
            }
            MapperEvent::StickOutput { stick, x, y } => sink.on_stick_output(stick, x, y),
            MapperEvent::StickRaw { stick, x, y } => sink.on_stick_raw(stick, x, y),
        }
    }
}

fn write_bits(f: &mut fmt::Formatter<'_>, sign: char, mask: u32) -> fmt::Result {
    for bit in (0..32).map(|i| 1u32 << i).filter(|b| mask & b != 0) {
        match buttons::name(bit) {
            Some(name) => write!(f, " {}{}", sign, name)?,
            None => write!(f, " {}{:#x}", sign, bit)?,
        }
    }
    Ok(())
}

impl fmt::Display for MapperEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MapperEvent::DigitalDelta { pressed, released } => {
                f.write_str("buttons")?;
                write_bits(f, '+', pressed)?;
                write_bits(f, '-', released)
            }
            MapperEvent::VirtualKeyEdge { key, down } => {
                write!(f, "vkey {} {}", key.name(), if down { "down" } else { "up" })
            }
            MapperEvent::VirtualKeyAnalog { device, key, value } => write!(
                f,
                "analog {} {} {:.3}",
                keynames::device_name(device),
                key.name(),
                value
            ),
            MapperEvent::StickOutput { stick, x, y } => {
                write!(f, "stick {:?} {:.3} {:.3}", stick, x, y)
            }
            MapperEvent::StickRaw { stick, x, y } => {
                write!(f, "raw {:?} {:.3} {:.3}", stick, x, y)
            }
        }
    }
}

/// Sink that keeps every event, for tests and the replay tool
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: parking_lot::Mutex<Vec<MapperEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far
    pub fn take(&self) -> Vec<MapperEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn events(&self) -> Vec<MapperEvent> {
        self.events.lock().clone()
    }

    fn push(&self, event: MapperEvent) {
        self.events.lock().push(event);
    }
}

impl MapperSink for RecordingSink {
    fn on_digital_delta(&self, pressed: u32, released: u32) {
        self.push(MapperEvent::DigitalDelta { pressed, released });
    }

    fn on_virtual_key_edge(&self, key: VirtKey, down: bool) {
        self.push(MapperEvent::VirtualKeyEdge { key, down });
    }

    fn on_virtual_key_analog(&self, device: DeviceId, key: VirtKey, value: f32) {
        self.push(MapperEvent::VirtualKeyAnalog { device, key, value });
    }

    fn on_stick_output(&self, stick: Stick, x: f32, y: f32) {
        self.push(MapperEvent::StickOutput { stick, x, y });
    }

    fn on_stick_raw(&self, stick: Stick, x: f32, y: f32) {
        self.push(MapperEvent::StickRaw { stick, x, y });
    }
}
