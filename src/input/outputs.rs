//! Logical outputs of the mapper
//!
//! The emulated controller exposes a digital button bitmask and a set of
//! virtual keys (analog stick directions and actions beyond the physical
//! buttons). Both live in one [`LogicalOutput`] space so bindings can target
//! either without overlapping id ranges.

use std::fmt;
use std::str::FromStr;

use super::error::MapperError;

/// Digital button bits of the emulated controller
pub mod buttons {
    pub const SELECT: u32 = 0x0000_0001;
    pub const START: u32 = 0x0000_0008;
    pub const UP: u32 = 0x0000_0010;
    pub const RIGHT: u32 = 0x0000_0020;
    pub const DOWN: u32 = 0x0000_0040;
    pub const LEFT: u32 = 0x0000_0080;
    pub const LTRIGGER: u32 = 0x0000_0100;
    pub const RTRIGGER: u32 = 0x0000_0200;
    pub const FACE_TOP: u32 = 0x0000_1000;
    pub const FACE_RIGHT: u32 = 0x0000_2000;
    pub const FACE_BOTTOM: u32 = 0x0000_4000;
    pub const FACE_LEFT: u32 = 0x0000_8000;
    pub const HOME: u32 = 0x0001_0000;
    pub const HOLD: u32 = 0x0002_0000;
    pub const VOL_UP: u32 = 0x0010_0000;
    pub const VOL_DOWN: u32 = 0x0020_0000;
    pub const SCREEN: u32 = 0x0040_0000;
    pub const NOTE: u32 = 0x0080_0000;

    pub const DPAD: u32 = UP | RIGHT | DOWN | LEFT;

    /// Bits a user may bind; the rest are driven by the system
    pub const USER_MASK: u32 = SELECT
        | START
        | DPAD
        | LTRIGGER
        | RTRIGGER
        | FACE_TOP
        | FACE_RIGHT
        | FACE_BOTTOM
        | FACE_LEFT
        | VOL_UP
        | VOL_DOWN
        | SCREEN
        | NOTE;

    pub(crate) const NAMES: [(u32, &str); 18] = [
        (SELECT, "Select"),
        (START, "Start"),
        (UP, "Up"),
        (RIGHT, "Right"),
        (DOWN, "Down"),
        (LEFT, "Left"),
        (LTRIGGER, "LTrigger"),
        (RTRIGGER, "RTrigger"),
        (FACE_TOP, "FaceTop"),
        (FACE_RIGHT, "FaceRight"),
        (FACE_BOTTOM, "FaceBottom"),
        (FACE_LEFT, "FaceLeft"),
        (HOME, "Home"),
        (HOLD, "Hold"),
        (VOL_UP, "VolUp"),
        (VOL_DOWN, "VolDown"),
        (SCREEN, "Screen"),
        (NOTE, "Note"),
    ];

    /// Name of a single button bit
    pub fn name(bit: u32) -> Option<&'static str> {
        NAMES.iter().find(|(b, _)| *b == bit).map(|(_, n)| *n)
    }

    /// Rotate a D-pad bit one quarter turn clockwise; other bits pass through.
    pub fn rotate_dpad(bit: u32) -> u32 {
        match bit {
            UP => RIGHT,
            RIGHT => DOWN,
            DOWN => LEFT,
            LEFT => UP,
            other => other,
        }
    }
}

/// One of the two analog sticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stick {
    Left,
    Right,
}

impl Stick {
    pub const ALL: [Stick; 2] = [Stick::Left, Stick::Right];

    pub fn index(self) -> usize {
        match self {
            Stick::Left => 0,
            Stick::Right => 1,
        }
    }
}

/// Logical axis of a stick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StickAxis {
    X,
    Y,
}

impl StickAxis {
    pub fn index(self) -> usize {
        match self {
            StickAxis::X => 0,
            StickAxis::Y => 1,
        }
    }
}

/// Virtual keys: logical inputs beyond the physical button set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VirtKey {
    AxisXMin,
    AxisXMax,
    AxisYMin,
    AxisYMax,
    AxisRightXMin,
    AxisRightXMax,
    AxisRightYMin,
    AxisRightYMax,
    AnalogRotateCw,
    AnalogRotateCcw,
    AnalogLightly,
    AxisSwap,
    SpeedAnalog,
    RapidFire,
    FastForward,
    SpeedToggle,
    Pause,
    Rewind,
    SaveState,
    LoadState,
    Screenshot,
    MuteToggle,
}

impl VirtKey {
    pub const COUNT: usize = 22;

    pub const ALL: [VirtKey; Self::COUNT] = [
        VirtKey::AxisXMin,
        VirtKey::AxisXMax,
        VirtKey::AxisYMin,
        VirtKey::AxisYMax,
        VirtKey::AxisRightXMin,
        VirtKey::AxisRightXMax,
        VirtKey::AxisRightYMin,
        VirtKey::AxisRightYMax,
        VirtKey::AnalogRotateCw,
        VirtKey::AnalogRotateCcw,
        VirtKey::AnalogLightly,
        VirtKey::AxisSwap,
        VirtKey::SpeedAnalog,
        VirtKey::RapidFire,
        VirtKey::FastForward,
        VirtKey::SpeedToggle,
        VirtKey::Pause,
        VirtKey::Rewind,
        VirtKey::SaveState,
        VirtKey::LoadState,
        VirtKey::Screenshot,
        VirtKey::MuteToggle,
    ];

    /// Index into per-virtual-key arrays
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            VirtKey::AxisXMin => "An.Left",
            VirtKey::AxisXMax => "An.Right",
            VirtKey::AxisYMin => "An.Down",
            VirtKey::AxisYMax => "An.Up",
            VirtKey::AxisRightXMin => "RightAn.Left",
            VirtKey::AxisRightXMax => "RightAn.Right",
            VirtKey::AxisRightYMin => "RightAn.Down",
            VirtKey::AxisRightYMax => "RightAn.Up",
            VirtKey::AnalogRotateCw => "RotateAnalogCW",
            VirtKey::AnalogRotateCcw => "RotateAnalogCCW",
            VirtKey::AnalogLightly => "AnalogLimiter",
            VirtKey::AxisSwap => "AxisSwap",
            VirtKey::SpeedAnalog => "AnalogSpeed",
            VirtKey::RapidFire => "RapidFire",
            VirtKey::FastForward => "FastForward",
            VirtKey::SpeedToggle => "SpeedToggle",
            VirtKey::Pause => "Pause",
            VirtKey::Rewind => "Rewind",
            VirtKey::SaveState => "SaveState",
            VirtKey::LoadState => "LoadState",
            VirtKey::Screenshot => "Screenshot",
            VirtKey::MuteToggle => "MuteToggle",
        }
    }

    /// The opposing direction of a stick axis key
    pub fn opposite(self) -> Option<VirtKey> {
        match self {
            VirtKey::AxisXMin => Some(VirtKey::AxisXMax),
            VirtKey::AxisXMax => Some(VirtKey::AxisXMin),
            VirtKey::AxisYMin => Some(VirtKey::AxisYMax),
            VirtKey::AxisYMax => Some(VirtKey::AxisYMin),
            VirtKey::AxisRightXMin => Some(VirtKey::AxisRightXMax),
            VirtKey::AxisRightXMax => Some(VirtKey::AxisRightXMin),
            VirtKey::AxisRightYMin => Some(VirtKey::AxisRightYMax),
            VirtKey::AxisRightYMax => Some(VirtKey::AxisRightYMin),
            _ => None,
        }
    }

    /// Stick, axis and sign driven by a stick direction key
    pub fn stick_axis(self) -> Option<(Stick, StickAxis, f32)> {
        match self {
            VirtKey::AxisXMin => Some((Stick::Left, StickAxis::X, -1.0)),
            VirtKey::AxisXMax => Some((Stick::Left, StickAxis::X, 1.0)),
            VirtKey::AxisYMin => Some((Stick::Left, StickAxis::Y, -1.0)),
            VirtKey::AxisYMax => Some((Stick::Left, StickAxis::Y, 1.0)),
            VirtKey::AxisRightXMin => Some((Stick::Right, StickAxis::X, -1.0)),
            VirtKey::AxisRightXMax => Some((Stick::Right, StickAxis::X, 1.0)),
            VirtKey::AxisRightYMin => Some((Stick::Right, StickAxis::Y, -1.0)),
            VirtKey::AxisRightYMax => Some((Stick::Right, StickAxis::Y, 1.0)),
            _ => None,
        }
    }

    /// Unsigned keys take a full 0..1 range from a signed axis
    pub fn is_unsigned(self) -> bool {
        self == VirtKey::SpeedAnalog
    }

    /// Keys exchanged with the D-pad when axis swap is on
    pub fn is_swappable(self) -> bool {
        matches!(
            self,
            VirtKey::AxisXMin | VirtKey::AxisXMax | VirtKey::AxisYMin | VirtKey::AxisYMax
        )
    }
}

/// Anything a chord can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogicalOutput {
    /// A single digital button bit
    Button(u32),
    VirtualKey(VirtKey),
}

impl LogicalOutput {
    /// Substitute D-pad bits and left stick keys for each other.
    pub fn swap_axes(self) -> LogicalOutput {
        use LogicalOutput::{Button, VirtualKey};
        match self {
            Button(buttons::UP) => VirtualKey(VirtKey::AxisYMax),
            Button(buttons::DOWN) => VirtualKey(VirtKey::AxisYMin),
            Button(buttons::LEFT) => VirtualKey(VirtKey::AxisXMin),
            Button(buttons::RIGHT) => VirtualKey(VirtKey::AxisXMax),
            VirtualKey(VirtKey::AxisYMax) => Button(buttons::UP),
            VirtualKey(VirtKey::AxisYMin) => Button(buttons::DOWN),
            VirtualKey(VirtKey::AxisXMin) => Button(buttons::LEFT),
            VirtualKey(VirtKey::AxisXMax) => Button(buttons::RIGHT),
            other => other,
        }
    }

    pub fn is_swappable(self) -> bool {
        match self {
            LogicalOutput::Button(bit) => bit & buttons::DPAD != 0 && bit.count_ones() == 1,
            LogicalOutput::VirtualKey(vk) => vk.is_swappable(),
        }
    }
}

impl From<VirtKey> for LogicalOutput {
    fn from(vk: VirtKey) -> Self {
        LogicalOutput::VirtualKey(vk)
    }
}

impl fmt::Display for LogicalOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOutput::Button(bit) => match buttons::name(*bit) {
                Some(name) => f.write_str(name),
                None => write!(f, "Button{:#x}", bit),
            },
            LogicalOutput::VirtualKey(vk) => f.write_str(vk.name()),
        }
    }
}

impl FromStr for LogicalOutput {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((bit, _)) = buttons::NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s))
        {
            return Ok(LogicalOutput::Button(*bit));
        }
        VirtKey::ALL
            .iter()
            .find(|vk| vk.name().eq_ignore_ascii_case(s))
            .map(|vk| LogicalOutput::VirtualKey(*vk))
            .ok_or_else(|| MapperError::UnknownOutput(s.to_string()))
    }
}
