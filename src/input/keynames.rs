//! Key, device and axis names
//!
//! Maps platform key codes to human-readable names and back, and names
//! devices and axes for diagnostics.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::mapping::{AxisId, DeviceId, InputMapping, InputSource, KeyCode};

/// Frequently referenced key codes
pub mod keys {
    use super::KeyCode;

    pub const BACK: KeyCode = KeyCode(4);
    pub const DPAD_UP: KeyCode = KeyCode(19);
    pub const DPAD_DOWN: KeyCode = KeyCode(20);
    pub const DPAD_LEFT: KeyCode = KeyCode(21);
    pub const DPAD_RIGHT: KeyCode = KeyCode(22);
    pub const A: KeyCode = KeyCode(29);
    pub const D: KeyCode = KeyCode(32);
    pub const S: KeyCode = KeyCode(47);
    pub const W: KeyCode = KeyCode(51);
    pub const Z: KeyCode = KeyCode(54);
    pub const SHIFT_LEFT: KeyCode = KeyCode(59);
    pub const TAB: KeyCode = KeyCode(61);
    pub const SPACE: KeyCode = KeyCode(62);
    pub const ENTER: KeyCode = KeyCode(66);
    pub const BUTTON_A: KeyCode = KeyCode(96);
    pub const BUTTON_B: KeyCode = KeyCode(97);
    pub const BUTTON_X: KeyCode = KeyCode(99);
    pub const BUTTON_Y: KeyCode = KeyCode(100);
    pub const BUTTON_L1: KeyCode = KeyCode(102);
    pub const BUTTON_R1: KeyCode = KeyCode(103);
    pub const BUTTON_START: KeyCode = KeyCode(108);
    pub const BUTTON_SELECT: KeyCode = KeyCode(109);
    pub const ESCAPE: KeyCode = KeyCode(111);
    pub const CTRL_LEFT: KeyCode = KeyCode(113);
}

/// Key code to name mapping
static KEY_NAMES: LazyLock<HashMap<u32, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    m.insert(4, "Back");
    m.insert(19, "DPadUp");
    m.insert(20, "DPadDown");
    m.insert(21, "DPadLeft");
    m.insert(22, "DPadRight");
    m.insert(23, "DPadCenter");

    // Digits
    for (i, name) in ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]
        .iter()
        .enumerate()
    {
        m.insert(7 + i as u32, *name);
    }

    // Letters
    const LETTERS: [&str; 26] = [
        "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R",
        "S", "T", "U", "V", "W", "X", "Y", "Z",
    ];
    for (i, name) in LETTERS.iter().enumerate() {
        m.insert(29 + i as u32, *name);
    }

    m.insert(55, "Comma");
    m.insert(56, "Period");
    m.insert(57, "LeftAlt");
    m.insert(58, "RightAlt");
    m.insert(59, "LeftShift");
    m.insert(60, "RightShift");
    m.insert(61, "Tab");
    m.insert(62, "Space");
    m.insert(66, "Enter");
    m.insert(67, "Backspace");

    // Gamepad buttons
    m.insert(96, "ButtonA");
    m.insert(97, "ButtonB");
    m.insert(98, "ButtonC");
    m.insert(99, "ButtonX");
    m.insert(100, "ButtonY");
    m.insert(101, "ButtonZ");
    m.insert(102, "ButtonL1");
    m.insert(103, "ButtonR1");
    m.insert(104, "ButtonL2");
    m.insert(105, "ButtonR2");
    m.insert(106, "ThumbL");
    m.insert(107, "ThumbR");
    m.insert(108, "Start");
    m.insert(109, "Select");
    m.insert(110, "Mode");

    m.insert(111, "Escape");
    m.insert(112, "Delete");
    m.insert(113, "LeftCtrl");
    m.insert(114, "RightCtrl");

    // Function keys
    const FKEYS: [&str; 12] = [
        "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12",
    ];
    for (i, name) in FKEYS.iter().enumerate() {
        m.insert(131 + i as u32, *name);
    }

    m
});

/// Reverse lookup, lowercased
static NAME_KEYS: LazyLock<HashMap<String, u32>> = LazyLock::new(|| {
    KEY_NAMES
        .iter()
        .map(|(code, name)| (name.to_ascii_lowercase(), *code))
        .collect()
});

/// Get the name of a key, or "Unknown"
pub fn key_name(key: KeyCode) -> &'static str {
    key_name_opt(key).unwrap_or("Unknown")
}

pub fn key_name_opt(key: KeyCode) -> Option<&'static str> {
    KEY_NAMES.get(&key.0).copied()
}

/// Look up a key code by name (case insensitive)
pub fn key_from_name(name: &str) -> Option<KeyCode> {
    NAME_KEYS.get(&name.to_ascii_lowercase()).map(|c| KeyCode(*c))
}

/// Human-readable device name
pub fn device_name(device: DeviceId) -> String {
    match device {
        DeviceId::DEFAULT => "Default".to_string(),
        DeviceId::KEYBOARD => "Keyboard".to_string(),
        DeviceId::MOUSE => "Mouse".to_string(),
        DeviceId::ACCELEROMETER => "Accelerometer".to_string(),
        DeviceId::TOUCH => "Touch".to_string(),
        DeviceId(id @ 10..=19) => format!("Pad{}", id - 10),
        DeviceId(id @ 20..=23) => format!("XInput{}", id - 20),
        DeviceId(id) => format!("Device{}", id),
    }
}

/// Human-readable axis name
pub fn axis_name(axis: AxisId) -> String {
    match axis {
        AxisId::X => "X".to_string(),
        AxisId::Y => "Y".to_string(),
        AxisId::Z => "Z".to_string(),
        AxisId::RX => "RX".to_string(),
        AxisId::RY => "RY".to_string(),
        AxisId::RZ => "RZ".to_string(),
        AxisId::HAT_X => "HatX".to_string(),
        AxisId::HAT_Y => "HatY".to_string(),
        AxisId::LTRIGGER => "LTrigger".to_string(),
        AxisId::RTRIGGER => "RTrigger".to_string(),
        AxisId::GAS => "Gas".to_string(),
        AxisId::BRAKE => "Brake".to_string(),
        AxisId::MOUSE_REL_X => "MouseX".to_string(),
        AxisId::MOUSE_REL_Y => "MouseY".to_string(),
        AxisId(id) => format!("Axis{}", id),
    }
}

/// Visual form of a mapping, e.g. `Keyboard.W` or `Pad0.X+`
pub fn mapping_name(mapping: &InputMapping) -> String {
    let device = device_name(mapping.device);
    match mapping.source {
        InputSource::Key(key) => match key_name_opt(key) {
            Some(name) => format!("{}.{}", device, name),
            None => format!("{}.Key{}", device, key.0),
        },
        InputSource::Axis { axis, .. } => {
            let sign = if mapping.direction() < 0 { '-' } else { '+' };
            format!("{}.{}{}", device, axis_name(axis), sign)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::mapping::Direction;

    #[test]
    fn test_key_name_known() {
        assert_eq!(key_name(keys::W), "W");
        assert_eq!(key_name(keys::ESCAPE), "Escape");
        assert_eq!(key_name(KeyCode(131)), "F1");
        assert_eq!(key_name(KeyCode(142)), "F12");
        assert_eq!(key_name(KeyCode(7)), "0");
    }

    #[test]
    fn test_key_name_unknown() {
        assert_eq!(key_name(KeyCode(99999)), "Unknown");
        assert_eq!(key_name_opt(KeyCode(99999)), None);
    }

    #[test]
    fn test_key_from_name_case_insensitive() {
        assert_eq!(key_from_name("space"), Some(keys::SPACE));
        assert_eq!(key_from_name("ESCAPE"), Some(keys::ESCAPE));
        assert_eq!(key_from_name("buttona"), Some(keys::BUTTON_A));
    }

    #[test]
    fn test_key_from_name_not_found() {
        assert_eq!(key_from_name("NotAKey"), None);
    }

    #[test]
    fn test_letter_constants_match_table() {
        assert_eq!(key_from_name("A"), Some(keys::A));
        assert_eq!(key_from_name("D"), Some(keys::D));
        assert_eq!(key_from_name("S"), Some(keys::S));
        assert_eq!(key_from_name("Z"), Some(keys::Z));
    }

    #[test]
    fn test_device_names() {
        assert_eq!(device_name(DeviceId::KEYBOARD), "Keyboard");
        assert_eq!(device_name(DeviceId::PAD_2), "Pad2");
        assert_eq!(device_name(DeviceId(21)), "XInput1");
        assert_eq!(device_name(DeviceId(300)), "Device300");
    }

    #[test]
    fn test_mapping_names() {
        let key = InputMapping::key(DeviceId::KEYBOARD, keys::W);
        assert_eq!(mapping_name(&key), "Keyboard.W");

        let axis = InputMapping::axis(DeviceId::PAD_0, AxisId::X, Direction::Negative);
        assert_eq!(mapping_name(&axis), "Pad0.X-");

        let odd = InputMapping::key(DeviceId::PAD_1, KeyCode(5000));
        assert_eq!(mapping_name(&odd), "Pad1.Key5000");
    }
}
