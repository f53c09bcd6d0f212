//! Axis shaping
//!
//! Pure functions turning raw analog samples into shaped values. Nothing in
//! here touches mapper state, so every function is safe to call from any
//! thread and trivially testable.

use super::mapping::{AxisClass, InputSample};

/// Parameters for stick shaping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickShape {
    /// Magnitude below which the stick reads as centered
    pub deadzone: f32,
    /// Minimum output magnitude once outside the deadzone
    pub inverse_deadzone: f32,
    /// Output magnitude at full deflection
    pub sensitivity: f32,
    /// Normalize on the euclidean radius instead of the larger axis
    pub circular: bool,
}

impl Default for StickShape {
    fn default() -> Self {
        Self {
            deadzone: 0.15,
            inverse_deadzone: 0.0,
            sensitivity: 1.1,
            circular: false,
        }
    }
}

/// Thresholds for deciding when an analog input counts as "pressed"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdParams {
    /// Keys and axes without a class of their own
    pub base: f32,
    /// Trigger-class axes
    pub trigger: f32,
    /// Any axis on the mouse device
    pub mouse: f32,
    /// How much a deflected co-axis lowers a stick threshold
    pub co_axis_bias: f32,
    /// Floor for the biased stick threshold
    pub min: f32,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            base: 0.75,
            trigger: 0.75,
            mouse: 0.01,
            co_axis_bias: 0.35,
            min: 0.25,
        }
    }
}

/// What kind of source a threshold is computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputClass {
    Key,
    Mouse,
    Axis(AxisClass),
}

/// Apply deadzone, inverse deadzone and sensitivity to one signed value.
///
/// Returns exactly 0 for a raw value of 0, and for any value when the
/// deadzone covers the whole range.
pub fn shape_deadzone_sensitivity(
    raw: f32,
    deadzone: f32,
    inverse_deadzone: f32,
    sensitivity: f32,
) -> f32 {
    if raw == 0.0 || !raw.is_finite() || deadzone >= 1.0 {
        return 0.0;
    }
    let sign = if raw >= 0.0 { 1.0 } else { -1.0 };

    let mut v = ((raw.abs() - deadzone) / (1.0 - deadzone)).clamp(0.0, 1.0);
    if v != 0.0 {
        v = (inverse_deadzone + v * (sensitivity - inverse_deadzone)).clamp(0.0, 1.0);
    }

    sign * v
}

/// Shape a stick position.
///
/// The shaping is applied to the stick radius, not to each axis, so the
/// direction of the stick is preserved.
pub fn convert_stick(x: f32, y: f32, shape: &StickShape) -> (f32, f32) {
    if !x.is_finite() || !y.is_finite() {
        return (0.0, 0.0);
    }

    let (mut x, mut y) = (x, y);
    let mut norm = x.abs().max(y.abs());
    if norm == 0.0 {
        return (0.0, 0.0);
    }

    if shape.circular {
        let radius = (x * x + y * y).sqrt();
        let factor = radius / norm;
        x *= factor;
        y *= factor;
        norm = radius;
    }

    let mapped = shape_deadzone_sensitivity(
        norm,
        shape.deadzone,
        shape.inverse_deadzone,
        shape.sensitivity,
    );

    (
        (x / norm * mapped).clamp(-1.0, 1.0),
        (y / norm * mapped).clamp(-1.0, 1.0),
    )
}

/// Threshold for one input, biased by the deflection of its co-axis.
///
/// Holding one axis of a stick makes the perpendicular axis easier to
/// trigger, which makes diagonals reachable when a stick is bound to four
/// digital outputs.
pub fn adaptive_threshold(params: &ThresholdParams, class: InputClass, co_axis: f32) -> f32 {
    match class {
        InputClass::Mouse => params.mouse,
        InputClass::Axis(AxisClass::Trigger) => params.trigger,
        InputClass::Axis(AxisClass::Stick) => {
            let co = co_axis.abs();
            if co > 0.0 && co.is_finite() {
                let biased = params.base * (1.0 - params.co_axis_bias * co.min(1.0));
                biased.max(params.min)
            } else {
                params.base
            }
        }
        InputClass::Key | InputClass::Axis(AxisClass::Other) => params.base,
    }
}

/// Rebuild a 0..1 value from the two halves of a split signed axis.
///
/// Used when an unsigned output (like an analog speed control) is bound to
/// one half of a signed axis: rest maps to 0.5, this half fully deflected
/// to 1, the opposite half fully deflected to 0.
pub fn reconstruct_signed(direction_value: f32, opposite_value: f32, direction_sign: i8) -> f32 {
    let signed = direction_value - opposite_value;
    let ranged = (signed + 1.0) * 0.5;
    if direction_sign < 0 {
        1.0 - ranged
    } else {
        ranged
    }
}

/// Default grace period before a stale analog sample starts fading
pub const DECAY_GRACE_SECONDS: f64 = 2.0;
/// Magnitudes below this snap to zero after decay
pub const DECAY_FLOOR: f32 = 0.05;

/// Fade a stale sample toward zero.
///
/// Nothing happens during the grace period; after it the value fades
/// linearly to zero over one second.
pub fn decay_over_time(sample: InputSample, now: f64, grace_seconds: f64, floor: f32) -> InputSample {
    let mut sample = sample;
    let reduction = ((now - sample.timestamp - grace_seconds) as f32).clamp(0.0, 1.0);
    if reduction > 0.0 {
        sample.value *= 1.0 - reduction;
    }
    if sample.value.abs() < floor {
        sample.value = 0.0;
    }
    sample
}
