//! Control mapper
//!
//! Turns raw key and axis events from any number of devices into the state
//! of one emulated controller: a digital button mask, virtual key values
//! and two analog sticks.
//!
//! Resolution runs on every event. Instead of following an input to the
//! outputs it drives, each pass walks every output and asks whether the
//! chords bound to it are currently held, which makes multi-input chords
//! and analog/digital mixing fall out naturally.
//!
//! # Locking
//!
//! Every mutating entry point takes the reentrant dispatch lock, then the
//! state lock. Events are buffered while the state is locked and delivered
//! to the sink after the state lock is dropped, with only the dispatch lock
//! held. A sink may therefore call back into the mapper on the same thread,
//! while events from different threads never interleave. The binding table
//! is read-locked for the duration of one pass.

use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::MapperConfig;

use super::bindings::{BindingQuery, BindingTable, Chord};
use super::error::MapperResult;
use super::keynames::{self, keys};
use super::mapping::{
    AxisClass, AxisInput, DeviceId, Direction, InputMapping, InputSample, InputSource, KeyInput,
};
use super::outputs::{buttons, LogicalOutput, Stick, StickAxis, VirtKey};
use super::raw_state::RawState;
use super::shaping::{
    adaptive_threshold, decay_over_time, reconstruct_signed, InputClass, StickShape,
    ThresholdParams,
};
use super::sink::{MapperEvent, MapperSink};
use super::stick::StickState;

/// Radius used for auto-rotation; clamped to the unit square afterwards so
/// the stick reaches the corners.
const AUTO_ROTATION_RADIUS: f32 = 1.42;

/// Result of feeding a key event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyOutcome {
    /// The key took part in some binding, or was consumed otherwise
    pub handled: bool,
    /// The unbound back key was pressed; the host should pause
    pub pause_requested: bool,
}

/// Why a resolution pass runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// A raw input changed
    Event,
    /// Held inputs are replayed after the binding meaning changed
    Reevaluate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AutoRotation {
    Off,
    Clockwise,
    CounterClockwise,
}

/// Last value and latched state of every virtual key
#[derive(Debug, Clone)]
pub struct VirtualKeyState {
    analog: [f32; VirtKey::COUNT],
    latched: [bool; VirtKey::COUNT],
}

impl Default for VirtualKeyState {
    fn default() -> Self {
        Self {
            analog: [0.0; VirtKey::COUNT],
            latched: [false; VirtKey::COUNT],
        }
    }
}

impl VirtualKeyState {
    pub fn analog(&self, key: VirtKey) -> f32 {
        self.analog[key.index()]
    }

    pub fn is_latched(&self, key: VirtKey) -> bool {
        self.latched[key.index()]
    }
}

struct MapperState {
    config: MapperConfig,
    shape: StickShape,
    thresholds: ThresholdParams,
    raw: RawState,
    vkeys: VirtualKeyState,
    sticks: [StickState; 2],
    /// Buttons reported down to the sink
    button_mask: u32,
    swap_axes: bool,
    rotation: AutoRotation,
    /// Events of the running pass, delivered after the state lock is dropped
    events: Vec<MapperEvent>,
}

/// Maps raw input from any number of devices to one virtual controller.
pub struct ControlMapper {
    dispatch: ReentrantMutex<()>,
    state: Mutex<MapperState>,
    bindings: Arc<dyn BindingTable>,
    sink: RwLock<Option<Arc<dyn MapperSink>>>,
}

impl std::fmt::Debug for ControlMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlMapper")
            .field("button_mask", &self.button_mask())
            .field("swap_axes", &self.is_axis_swapped())
            .finish_non_exhaustive()
    }
}

impl ControlMapper {
    pub fn new(bindings: Arc<dyn BindingTable>, config: MapperConfig) -> Self {
        Self {
            dispatch: ReentrantMutex::new(()),
            state: Mutex::new(MapperState::new(config)),
            bindings,
            sink: RwLock::new(None),
        }
    }

    /// Install the consumer of mapper events, replacing any previous one
    pub fn set_sink(&self, sink: Arc<dyn MapperSink>) {
        *self.sink.write() = Some(sink);
    }

    /// Replace the configuration.
    ///
    /// A new screen rotation releases the D-pad and re-resolves held inputs
    /// so they land on their rotated buttons.
    pub fn set_config(&self, config: MapperConfig, now: f64) -> MapperResult<()> {
        self.run(|state, bindings| {
            let rotated = state.config.screen_rotation != config.screen_rotation;
            state.shape = config.stick_shape();
            state.thresholds = config.threshold_params();
            state.config = config;
            if !rotated {
                return Ok(());
            }
            bindings.with_read(&mut |q: &dyn BindingQuery| state.reapply_rotation(q, now))
        })
    }

    pub fn config(&self) -> MapperConfig {
        self.state.lock().config.clone()
    }

    // === Input entry points ===

    /// Feed a key or button transition.
    ///
    /// Repeats are reported as handled and otherwise ignored.
    pub fn key(&self, input: KeyInput, now: f64) -> MapperResult<KeyOutcome> {
        if input.is_repeat {
            return Ok(KeyOutcome {
                handled: true,
                pause_requested: false,
            });
        }
        self.run(|state, bindings| state.key(bindings, input, now))
    }

    /// Feed one signed axis sample. Returns whether any binding used it.
    pub fn axis(&self, input: AxisInput, now: f64) -> MapperResult<bool> {
        self.axes(&[input], now)
    }

    /// Feed a batch of axis samples under a single lock.
    pub fn axes(&self, inputs: &[AxisInput], now: f64) -> MapperResult<bool> {
        self.run(|state, bindings| -> MapperResult<bool> {
            let mut handled = false;
            bindings.with_read(&mut |q: &dyn BindingQuery| {
                for input in inputs {
                    handled |= state.apply_axis(q, *input, now);
                }
            })?;
            Ok(handled)
        })
    }

    /// Advance time-driven output. Call once per frame.
    pub fn update(&self, now: f64) {
        self.run(|state, _| state.update(now));
    }

    /// Release every input currently reading nonzero.
    pub fn release_all(&self, now: f64) -> MapperResult<()> {
        self.run(|state, bindings| {
            bindings.with_read(&mut |q: &dyn BindingQuery| state.release_all(q, now))
        })
    }

    /// Zero every input bound to `output`, except chords using the mouse.
    pub fn force_release(&self, output: LogicalOutput, now: f64) -> MapperResult<()> {
        self.run(|state, bindings| {
            bindings.with_read(&mut |q: &dyn BindingQuery| state.force_release(q, output, now))
        })
    }

    /// Swap the D-pad and the left stick, then replay held inputs so they
    /// register under their new meaning.
    pub fn toggle_axis_swap(&self, now: f64) -> MapperResult<()> {
        self.run(|state, bindings| {
            bindings.with_read(&mut |q: &dyn BindingQuery| state.toggle_axis_swap(q, now))
        })
    }

    /// Press or release a logical output directly, bypassing bindings.
    pub fn inject(&self, device: DeviceId, output: LogicalOutput, pressed: bool) {
        self.run(|state, _| state.inject(device, output, pressed));
    }

    // === Accessors ===

    pub fn button_mask(&self) -> u32 {
        self.state.lock().button_mask
    }

    pub fn virtual_key_value(&self, key: VirtKey) -> f32 {
        self.state.lock().vkeys.analog(key)
    }

    pub fn is_virtual_key_down(&self, key: VirtKey) -> bool {
        self.state.lock().vkeys.is_latched(key)
    }

    /// Shaped output of a stick
    pub fn stick_output(&self, stick: Stick) -> (f32, f32) {
        self.state.lock().sticks[stick.index()].converted()
    }

    pub fn is_axis_swapped(&self) -> bool {
        self.state.lock().swap_axes
    }

    /// When `device` last reported any input
    pub fn last_seen(&self, device: DeviceId) -> Option<f64> {
        self.state.lock().raw.last_seen(device)
    }

    /// Human readable snapshot of every active input and output
    pub fn debug_dump(&self) -> String {
        self.state.lock().debug_dump()
    }

    /// Run one locked operation and deliver the events it produced.
    fn run<T>(&self, op: impl FnOnce(&mut MapperState, &dyn BindingTable) -> T) -> T {
        let _dispatch = self.dispatch.lock();

        let (result, events) = {
            let mut state = self.state.lock();
            let result = op(&mut state, &*self.bindings);
            (result, std::mem::take(&mut state.events))
        };

        self.deliver(events);
        result
    }

    fn deliver(&self, mut events: Vec<MapperEvent>) {
        if !events.is_empty() {
            let sink = self.sink.read().clone();
            if let Some(sink) = sink {
                for event in &events {
                    event.dispatch(&*sink);
                }
            }
        }

        // Hand the buffer back so steady-state passes do not allocate.
        events.clear();
        let mut state = self.state.lock();
        if state.events.capacity() < events.capacity() {
            state.events = events;
        }
    }
}

impl MapperState {
    fn new(config: MapperConfig) -> Self {
        Self {
            shape: config.stick_shape(),
            thresholds: config.threshold_params(),
            config,
            raw: RawState::new(),
            vkeys: VirtualKeyState::default(),
            sticks: [StickState::new(); 2],
            button_mask: 0,
            swap_axes: false,
            rotation: AutoRotation::Off,
            events: Vec::with_capacity(16),
        }
    }

    fn key(
        &mut self,
        bindings: &dyn BindingTable,
        input: KeyInput,
        now: f64,
    ) -> MapperResult<KeyOutcome> {
        let mapping = InputMapping::key(input.device, input.key_code);
        self.raw.touch_device(input.device, now);
        let value = if input.pressed { 1.0 } else { 0.0 };
        self.raw.set(mapping, InputSample::new(value, now));

        let mut outcome = KeyOutcome::default();
        bindings.with_read(&mut |q: &dyn BindingQuery| {
            if input.pressed
                && input.key_code == keys::BACK
                && (!q.is_bound(&mapping) || input.device == DeviceId::DEFAULT)
            {
                debug!(device = input.device.0, "back key requests pause");
                outcome = KeyOutcome {
                    handled: true,
                    pause_requested: true,
                };
                return;
            }
            outcome.handled = self.resolve(q, mapping, now, Trigger::Event);
        })?;
        Ok(outcome)
    }

    fn apply_axis(&mut self, q: &dyn BindingQuery, input: AxisInput, now: f64) -> bool {
        if input.device.is_mouse() && !self.config.mouse_control {
            return false;
        }
        let value = if input.value.is_finite() {
            input.value
        } else {
            warn!(
                device = input.device.0,
                axis = input.axis.0,
                "non-finite axis value treated as centered"
            );
            0.0
        };
        self.raw.touch_device(input.device, now);
        self.write_axis(q, input, value, now)
    }

    /// Split a signed sample into its two halves and resolve both.
    fn write_axis(&mut self, q: &dyn BindingQuery, input: AxisInput, value: f32, now: f64) -> bool {
        self.raw.set_raw_axis(input.axis, value);

        let mapping = InputMapping::axis(input.device, input.axis, Direction::of(value));
        let opposite = mapping.flip_direction();

        let threshold = self.threshold_for(q, &mapping);
        self.raw.set_axis(mapping, value.abs(), threshold, now);
        let threshold = self.threshold_for(q, &opposite);
        self.raw.set_axis(opposite, 0.0, threshold, now);

        let used = self.resolve(q, mapping, now, Trigger::Event);
        self.resolve(q, opposite, now, Trigger::Event) || used
    }

    fn update(&mut self, now: f64) {
        let speed = self.config.auto_rotation_speed as f64;
        let angle = match self.rotation {
            AutoRotation::Off => return,
            AutoRotation::Clockwise => now * -speed,
            AutoRotation::CounterClockwise => now * speed,
        };
        let x = (AUTO_ROTATION_RADIUS * angle.cos() as f32).clamp(-1.0, 1.0);
        let y = (AUTO_ROTATION_RADIUS * angle.sin() as f32).clamp(-1.0, 1.0);
        self.sticks[Stick::Left.index()].set_output(x, y);
        self.events.push(MapperEvent::StickOutput {
            stick: Stick::Left,
            x,
            y,
        });
    }

    fn release_all(&mut self, q: &dyn BindingQuery, now: f64) {
        let active = self.raw.active();
        if !active.is_empty() {
            debug!(count = active.len(), "releasing all inputs");
        }
        for mapping in active {
            match mapping.source {
                InputSource::Key(_) => {
                    self.raw.set(mapping, InputSample::new(0.0, now));
                    self.resolve(q, mapping, now, Trigger::Event);
                }
                InputSource::Axis { axis, .. } => {
                    let input = AxisInput::new(mapping.device, axis, 0.0);
                    self.write_axis(q, input, 0.0, now);
                }
            }
        }
        self.clear_unbacked();
    }

    /// Drop outputs still on after every input reads zero.
    ///
    /// These are left behind when bindings or the rotation change under a
    /// held input, or by `inject`.
    fn clear_unbacked(&mut self) {
        if self.button_mask != 0 {
            let released = self.button_mask;
            debug!(released = format_args!("{:#x}", released), "clearing unbacked buttons");
            self.button_mask = 0;
            self.events.push(MapperEvent::DigitalDelta {
                pressed: 0,
                released,
            });
        }

        let mut sticks_stale = false;
        for key in VirtKey::ALL {
            let i = key.index();
            if !self.vkeys.latched[i] {
                continue;
            }
            debug!(key = key.name(), "clearing unbacked virtual key");
            self.vkeys.latched[i] = false;
            self.route_edge(key, false);
            if self.vkeys.analog[i] != 0.0 {
                self.vkeys.analog[i] = 0.0;
                if key.stick_axis().is_some() {
                    sticks_stale = true;
                } else {
                    self.events.push(MapperEvent::VirtualKeyAnalog {
                        device: DeviceId::DEFAULT,
                        key,
                        value: 0.0,
                    });
                }
            }
        }

        if sticks_stale {
            for stick in Stick::ALL {
                self.sticks[stick.index()].reset_history();
                self.update_stick_output(stick);
            }
        }
    }

    fn force_release(&mut self, q: &dyn BindingQuery, output: LogicalOutput, now: f64) {
        let chords = q.lookup(output);
        debug!(%output, chords = chords.len(), "force release");
        for chord in chords.iter().filter(|c| !c.has_mouse()) {
            for mapping in chord.mappings() {
                self.raw.set(*mapping, InputSample::new(0.0, now));
            }
        }
        for chord in chords.iter().filter(|c| !c.has_mouse()) {
            for mapping in chord.mappings() {
                self.resolve(q, *mapping, now, Trigger::Event);
            }
        }
    }

    fn toggle_axis_swap(&mut self, q: &dyn BindingQuery, now: f64) {
        self.swap_axes = !self.swap_axes;
        info!(swapped = self.swap_axes, "axis swap toggled");

        let released = self.button_mask & buttons::DPAD;
        if released != 0 {
            self.button_mask &= !released;
            self.events.push(MapperEvent::DigitalDelta {
                pressed: 0,
                released,
            });
        }

        for key in VirtKey::ALL.into_iter().filter(|k| k.is_swappable()) {
            let i = key.index();
            if self.vkeys.latched[i] {
                self.vkeys.latched[i] = false;
                self.events
                    .push(MapperEvent::VirtualKeyEdge { key, down: false });
            }
            self.vkeys.analog[i] = 0.0;
        }

        self.sticks[Stick::Left.index()].reset_history();
        self.update_stick_output(Stick::Left);
        self.update_stick_output(Stick::Right);

        for mapping in self.raw.active() {
            self.resolve(q, mapping, now, Trigger::Reevaluate);
        }
    }

    fn reapply_rotation(&mut self, q: &dyn BindingQuery, now: f64) {
        info!(rotation = ?self.config.screen_rotation, "screen rotation changed");

        let released = self.button_mask & buttons::DPAD;
        if released != 0 {
            self.button_mask &= !released;
            self.events.push(MapperEvent::DigitalDelta {
                pressed: 0,
                released,
            });
        }

        for mapping in self.raw.active() {
            self.resolve(q, mapping, now, Trigger::Reevaluate);
        }
    }

    fn inject(&mut self, device: DeviceId, output: LogicalOutput, pressed: bool) {
        debug!(device = device.0, %output, pressed, "injected output");
        match output {
            LogicalOutput::Button(bit) => {
                let (down, up) = if pressed {
                    (bit & !self.button_mask, 0)
                } else {
                    (0, bit & self.button_mask)
                };
                if down | up != 0 {
                    self.button_mask = (self.button_mask | down) & !up;
                    self.events.push(MapperEvent::DigitalDelta {
                        pressed: down,
                        released: up,
                    });
                }
            }
            LogicalOutput::VirtualKey(key) => {
                let value = if pressed { 1.0 } else { 0.0 };
                let i = key.index();
                if self.vkeys.latched[i] != pressed {
                    self.vkeys.latched[i] = pressed;
                    self.route_edge(key, pressed);
                }
                if self.vkeys.analog[i] != value {
                    self.vkeys.analog[i] = value;
                    self.route_analog(device, key, value);
                }
                if key == VirtKey::AnalogLightly {
                    self.update_stick_output(Stick::Left);
                    self.update_stick_output(Stick::Right);
                }
            }
        }
    }

    // === Resolution ===

    /// Output actually looked up for `output` after axis swap.
    fn effective(&self, output: LogicalOutput) -> LogicalOutput {
        if self.swap_axes {
            output.swap_axes()
        } else {
            output
        }
    }

    fn threshold_for(&self, q: &dyn BindingQuery, mapping: &InputMapping) -> f32 {
        let (class, co_axis) = if mapping.device.is_mouse() {
            (InputClass::Mouse, 0.0)
        } else {
            match mapping.axis_id() {
                None => (InputClass::Key, 0.0),
                Some(axis) => (
                    InputClass::Axis(q.axis_class(axis)),
                    axis.co_axis().map_or(0.0, |co| self.raw.raw_axis(co)),
                ),
            }
        };
        adaptive_threshold(&self.thresholds, class, co_axis)
    }

    /// Walk every output and update those whose chords involve `changed`.
    ///
    /// Returns whether `changed` took part in any binding.
    fn resolve(
        &mut self,
        q: &dyn BindingQuery,
        changed: InputMapping,
        now: f64,
        trigger: Trigger,
    ) -> bool {
        let turns = self.config.screen_rotation.quarter_turns();

        let mut mask = 0u32;
        let mut changed_mask = 0u32;
        for bit in (0..32).map(|i| 1u32 << i) {
            if bit & buttons::USER_MASK == 0 {
                continue;
            }
            let mut mapped = bit;
            for _ in 0..turns {
                mapped = buttons::rotate_dpad(mapped);
            }
            let chords = q.lookup(self.effective(LogicalOutput::Button(mapped)));
            for chord in chords {
                if chord.contains(&changed) {
                    changed_mask |= bit;
                }
                if self.chord_is_down(q, chord) {
                    mask |= bit;
                }
            }
        }

        let old = self.button_mask;
        let pressed = mask & changed_mask & !old;
        let released = !mask & changed_mask & old;
        if pressed | released != 0 {
            self.button_mask = (old | pressed) & !released;
            debug!(
                pressed = format_args!("{:#x}", pressed),
                released = format_args!("{:#x}", released),
                "buttons changed"
            );
            self.events
                .push(MapperEvent::DigitalDelta { pressed, released });
        }

        let mut used = changed_mask != 0;
        let mut refresh_sticks = false;

        for key in VirtKey::ALL {
            let output = self.effective(LogicalOutput::VirtualKey(key));
            let chords = q.lookup(output);
            if chords.is_empty() {
                continue;
            }
            let unsigned = matches!(output, LogicalOutput::VirtualKey(k) if k.is_unsigned());

            let touched = chords.iter().any(|chord| {
                chord.mappings().iter().any(|m| {
                    *m == changed
                        || (unsigned && self.is_reconstructed(q, m) && m.flip_direction() == changed)
                })
            });
            if !touched {
                continue;
            }
            used = true;

            if trigger == Trigger::Event && !changed.is_axis() {
                self.decay_stale_members(chords, &changed, now);
            }

            let (value, threshold) = self.score(q, chords, unsigned);
            if self.apply_virtual_key(key, value, threshold, changed.device) {
                refresh_sticks = true;
            }
        }

        if refresh_sticks {
            self.update_stick_output(Stick::Left);
            self.update_stick_output(Stick::Right);
        }

        used
    }

    /// Whether `mapping` is one half of a signed axis that an unsigned
    /// virtual key reads as a whole
    fn is_reconstructed(&self, q: &dyn BindingQuery, mapping: &InputMapping) -> bool {
        mapping
            .axis_id()
            .is_some_and(|axis| q.axis_class(axis) == AxisClass::Stick)
    }

    fn chord_is_down(&self, q: &dyn BindingQuery, chord: &Chord) -> bool {
        let mut last_time = 0.0;
        for mapping in chord.mappings() {
            let Some(sample) = self.raw.get(mapping) else {
                return false;
            };
            if self.config.strict_combo_order && sample.timestamp < last_time {
                return false;
            }
            last_time = sample.timestamp;
            if sample.value <= 0.0 || sample.value < self.threshold_for(q, mapping) {
                return false;
            }
        }
        !chord.is_empty()
    }

    /// Sum of chord products, clamped, and the threshold the value latches at
    fn score(&self, q: &dyn BindingQuery, chords: &[Chord], unsigned: bool) -> (f32, f32) {
        let mut threshold = 1.0;
        let mut total = 0.0f32;

        for chord in chords {
            let mut product = 1.0f32;
            let mut last_time = 0.0;
            for mapping in chord.mappings() {
                let Some(sample) = self.raw.get(mapping) else {
                    product = 0.0;
                    continue;
                };
                if self.config.strict_combo_order && sample.timestamp < last_time {
                    product = 0.0;
                    break;
                }
                last_time = sample.timestamp;

                if mapping.is_axis() {
                    threshold = self.threshold_for(q, mapping);
                    if unsigned && self.is_reconstructed(q, mapping) {
                        let other = self.raw.value(&mapping.flip_direction());
                        product *= reconstruct_signed(sample.value, other, mapping.direction());
                        continue;
                    }
                }
                product *= sample.value;
            }
            total += product;
        }

        let total = if total.is_finite() { total } else { 0.0 };
        (total.clamp(0.0, 1.0), threshold)
    }

    /// Fade analog members lingering near rest so a digital input bound to
    /// the same key can still reach full scale.
    fn decay_stale_members(&mut self, chords: &[Chord], changed: &InputMapping, now: f64) {
        for mapping in chords.iter().flat_map(|c| c.mappings()) {
            if mapping == changed {
                continue;
            }
            if let Some(sample) = self.raw.get(mapping) {
                if sample.value > 0.0 {
                    let decayed = decay_over_time(
                        sample,
                        now,
                        self.config.decay_grace,
                        self.config.decay_floor,
                    );
                    self.raw.set(*mapping, decayed);
                }
            }
        }
    }

    /// Store a new virtual key value and emit whatever changed.
    ///
    /// Returns whether the sticks need re-shaping.
    fn apply_virtual_key(&mut self, key: VirtKey, value: f32, threshold: f32, device: DeviceId) -> bool {
        let i = key.index();
        let was_down = self.vkeys.latched[i];
        let is_down = value >= threshold;

        if self.vkeys.analog[i] != value {
            self.vkeys.analog[i] = value;
            self.route_analog(device, key, value);
        }

        if was_down != is_down {
            self.vkeys.latched[i] = is_down;
            self.route_edge(key, is_down);
            return key == VirtKey::AnalogLightly;
        }
        false
    }

    fn route_analog(&mut self, device: DeviceId, key: VirtKey, value: f32) {
        match key.stick_axis() {
            Some((stick, axis, sign)) => {
                let opposite = key.opposite().map_or(0.0, |o| self.vkeys.analog[o.index()]);
                self.set_stick_axis(device, stick, axis, sign * (value - opposite));
            }
            None => self
                .events
                .push(MapperEvent::VirtualKeyAnalog { device, key, value }),
        }
    }

    fn route_edge(&mut self, key: VirtKey, down: bool) {
        debug!(key = key.name(), down, "virtual key edge");
        let rotation = match key {
            VirtKey::AnalogRotateCw => AutoRotation::Clockwise,
            VirtKey::AnalogRotateCcw => AutoRotation::CounterClockwise,
            _ => {
                self.events.push(MapperEvent::VirtualKeyEdge { key, down });
                return;
            }
        };

        if down {
            self.rotation = rotation;
        } else {
            if self.rotation == rotation {
                self.rotation = AutoRotation::Off;
            }
            self.sticks[Stick::Left.index()].set_output(0.0, 0.0);
            self.events.push(MapperEvent::StickOutput {
                stick: Stick::Left,
                x: 0.0,
                y: 0.0,
            });
        }
    }

    // === Sticks ===

    fn set_stick_axis(&mut self, device: DeviceId, stick: Stick, axis: StickAxis, value: f32) {
        let ghost_limit = self.config.ghost_limit();
        let update = self.sticks[stick.index()].set_axis(device, axis, value, ghost_limit);
        self.events.push(MapperEvent::StickRaw {
            stick,
            x: update.raw.0,
            y: update.raw.1,
        });
        if update.accepted {
            self.update_stick_output(stick);
        } else {
            debug!(device = device.0, ?stick, "ignored idle device on owned stick");
        }
    }

    fn update_stick_output(&mut self, stick: Stick) {
        let limiter = self
            .vkeys
            .is_latched(VirtKey::AnalogLightly)
            .then_some(self.config.limiter_scale);
        let (x, y) = self.sticks[stick.index()].recompute(&self.shape, limiter);
        self.events.push(MapperEvent::StickOutput { stick, x, y });
    }

    // === Diagnostics ===

    fn debug_dump(&self) -> String {
        let mut out = String::new();
        for (mapping, sample) in self.raw.sorted() {
            if sample.value != 0.0 {
                out.push_str(&format!(
                    "{}: {:.3}\n",
                    keynames::mapping_name(&mapping),
                    sample.value
                ));
            }
        }
        for key in VirtKey::ALL {
            let value = self.vkeys.analog(key);
            if value != 0.0 {
                out.push_str(&format!("{}: {:.3}\n", key.name(), value));
            }
        }
        let (lx, ly) = self.sticks[Stick::Left.index()].converted();
        let (rx, ry) = self.sticks[Stick::Right.index()].converted();
        out.push_str(&format!("Lstick: {:.3}, {:.3}\n", lx, ly));
        out.push_str(&format!("Rstick: {:.3}, {:.3}\n", rx, ry));
        out
    }
}
