//! Mapper configuration
//!
//! Every analog and threshold knob the mapper reads, loadable from a TOML
//! file. Missing keys fall back to their defaults so old files keep working.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::input::shaping::{StickShape, ThresholdParams};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Orientation of the emulated screen; rotates D-pad bindings with it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenRotation {
    #[default]
    Horizontal,
    Vertical,
    Horizontal180,
    Vertical180,
}

impl ScreenRotation {
    /// Clockwise quarter turns applied to D-pad bits
    pub fn quarter_turns(self) -> u32 {
        match self {
            ScreenRotation::Horizontal => 0,
            ScreenRotation::Vertical => 1,
            ScreenRotation::Horizontal180 => 2,
            ScreenRotation::Vertical180 => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub deadzone: f32,
    pub inverse_deadzone: f32,
    pub sensitivity: f32,
    pub circular: bool,

    /// Radians per second for stick auto-rotation
    pub auto_rotation_speed: f32,
    /// Stick scale while the analog limiter is held
    pub limiter_scale: f32,

    pub trigger_threshold: f32,
    pub axis_bind_threshold: f32,
    pub mouse_threshold: f32,
    pub co_axis_bias: f32,
    pub min_threshold: f32,

    /// Chord members must be pressed in binding order
    pub strict_combo_order: bool,
    pub screen_rotation: ScreenRotation,
    /// Accept mouse axes at all
    pub mouse_control: bool,

    pub decay_grace: f64,
    pub decay_floor: f32,
    /// Fraction of the deadzone used for ghost suppression
    pub ghost_deadzone_factor: f32,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            deadzone: 0.15,
            inverse_deadzone: 0.0,
            sensitivity: 1.1,
            circular: false,
            auto_rotation_speed: 8.0,
            limiter_scale: 0.6,
            trigger_threshold: 0.75,
            axis_bind_threshold: 0.75,
            mouse_threshold: 0.01,
            co_axis_bias: 0.35,
            min_threshold: 0.25,
            strict_combo_order: false,
            screen_rotation: ScreenRotation::Horizontal,
            mouse_control: false,
            decay_grace: 2.0,
            decay_floor: 0.05,
            ghost_deadzone_factor: 0.7,
        }
    }
}

impl MapperConfig {
    /// Load config from file, or write and return the defaults if missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        if !path.as_ref().exists() {
            let config = Self::default();
            config.save_to_file(&path)?;
            info!(path = %path.as_ref().display(), "wrote default mapper config");
            return Ok(config);
        }
        Self::load_from_file(path)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(&path)?;
        let mut config: MapperConfig = toml::from_str(&content)?;
        config.validate();
        info!(path = %path.as_ref().display(), "loaded mapper config");
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Clamp every knob into its usable range.
    ///
    /// Non-finite values fall back to the default. Returns whether anything
    /// was changed.
    pub fn validate(&mut self) -> bool {
        let defaults = Self::default();
        let mut changed = false;

        let mut clamp = |name: &str, value: &mut f32, default: f32, min: f32, max: f32| {
            let fixed = if value.is_finite() {
                value.clamp(min, max)
            } else {
                default
            };
            if fixed != *value {
                warn!(field = name, from = %value, to = fixed, "config value out of range");
                *value = fixed;
                changed = true;
            }
        };

        clamp("deadzone", &mut self.deadzone, defaults.deadzone, 0.0, 1.0);
        clamp(
            "inverse_deadzone",
            &mut self.inverse_deadzone,
            defaults.inverse_deadzone,
            0.0,
            1.0,
        );
        clamp("sensitivity", &mut self.sensitivity, defaults.sensitivity, 0.0, 10.0);
        clamp(
            "auto_rotation_speed",
            &mut self.auto_rotation_speed,
            defaults.auto_rotation_speed,
            -100.0,
            100.0,
        );
        clamp("limiter_scale", &mut self.limiter_scale, defaults.limiter_scale, 0.0, 1.0);
        clamp(
            "trigger_threshold",
            &mut self.trigger_threshold,
            defaults.trigger_threshold,
            0.0,
            1.0,
        );
        clamp(
            "axis_bind_threshold",
            &mut self.axis_bind_threshold,
            defaults.axis_bind_threshold,
            0.0,
            1.0,
        );
        clamp(
            "mouse_threshold",
            &mut self.mouse_threshold,
            defaults.mouse_threshold,
            0.0,
            1.0,
        );
        clamp("co_axis_bias", &mut self.co_axis_bias, defaults.co_axis_bias, 0.0, 1.0);
        clamp("min_threshold", &mut self.min_threshold, defaults.min_threshold, 0.0, 1.0);
        clamp("decay_floor", &mut self.decay_floor, defaults.decay_floor, 0.0, 1.0);
        clamp(
            "ghost_deadzone_factor",
            &mut self.ghost_deadzone_factor,
            defaults.ghost_deadzone_factor,
            0.0,
            1.0,
        );

        if !self.decay_grace.is_finite() || self.decay_grace < 0.0 {
            warn!(from = self.decay_grace, "decay_grace out of range");
            self.decay_grace = defaults.decay_grace;
            changed = true;
        }

        changed
    }

    pub fn stick_shape(&self) -> StickShape {
        StickShape {
            deadzone: self.deadzone,
            inverse_deadzone: self.inverse_deadzone,
            sensitivity: self.sensitivity,
            circular: self.circular,
        }
    }

    pub fn threshold_params(&self) -> ThresholdParams {
        ThresholdParams {
            base: self.axis_bind_threshold,
            trigger: self.trigger_threshold,
            mouse: self.mouse_threshold,
            co_axis_bias: self.co_axis_bias,
            min: self.min_threshold,
        }
    }

    /// Magnitude below which a stick sample counts as idle noise
    pub fn ghost_limit(&self) -> f32 {
        self.deadzone * self.ghost_deadzone_factor
    }
}
