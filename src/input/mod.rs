//! Control mapping
//!
//! Turns raw device input into the logical controls of an emulated handheld.
//!
//! # Architecture
//!
//! - [`mapping`]: devices, keys, axes and the mapping of one physical input
//! - [`bindings`]: chords bound to logical outputs, editable at runtime
//! - [`raw_state`]: last value of every mapping seen
//! - [`shaping`]: deadzone, sensitivity and threshold math
//! - [`stick`]: per-stick raw history and ghost suppression
//! - [`mapper`]: [`ControlMapper`], the event-driven core
//! - [`sink`]: where mapper output goes
//!
//! # Thread Safety
//!
//! [`ControlMapper`] serializes all of its operations internally and may be
//! shared between an input thread and a frame thread. Sinks are called
//! without the state lock held.

pub mod bindings;
pub mod error;
pub mod keynames;
pub mod mapper;
pub mod mapping;
pub mod outputs;
pub mod raw_state;
pub mod shaping;
pub mod sink;
pub mod stick;

pub use bindings::{BindingQuery, BindingTable, Chord, ChordTable};
pub use error::{MapperError, MapperResult};
pub use keynames::{key_from_name, key_name};
pub use mapper::{ControlMapper, KeyOutcome};
pub use mapping::{AxisId, AxisInput, DeviceId, InputMapping, KeyCode, KeyInput};
pub use outputs::{buttons, LogicalOutput, Stick, VirtKey};
pub use sink::{MapperEvent, MapperSink, RecordingSink};
