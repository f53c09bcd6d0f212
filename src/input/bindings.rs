//! Binding table
//!
//! Resolves a logical output to the chords bound to it. The mapper only
//! ever reads the table through [`BindingTable::with_read`], which holds the
//! table's read lock for exactly the duration of the closure, so an editor
//! thread can change bindings between resolution passes but never during
//! one.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use tracing::warn;

use super::error::{MapperError, MapperResult};
use super::mapping::{AxisClass, AxisId, DeviceId, InputMapping};
use super::outputs::LogicalOutput;

/// How long a resolution pass waits for an editor to release the table
pub const BINDING_LOCK_TIMEOUT: Duration = Duration::from_millis(250);

/// A set of inputs that must all be active together.
///
/// Member order matters only when strict combo ordering is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Chord {
    mappings: Vec<InputMapping>,
}

impl Chord {
    pub fn new(mappings: Vec<InputMapping>) -> Self {
        Self { mappings }
    }

    pub fn single(mapping: InputMapping) -> Self {
        Self {
            mappings: vec![mapping],
        }
    }

    pub fn mappings(&self) -> &[InputMapping] {
        &self.mappings
    }

    pub fn contains(&self, mapping: &InputMapping) -> bool {
        self.mappings.contains(mapping)
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether any member comes from the mouse
    pub fn has_mouse(&self) -> bool {
        self.mappings.iter().any(|m| m.device.is_mouse())
    }
}

impl From<InputMapping> for Chord {
    fn from(mapping: InputMapping) -> Self {
        Chord::single(mapping)
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, mapping) in self.mappings.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{}", mapping)?;
        }
        Ok(())
    }
}

impl FromStr for Chord {
    type Err = MapperError;

    /// Members separated by `:`, e.g. `1-LeftCtrl:1-W`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mappings = s
            .split(':')
            .map(str::parse)
            .collect::<Result<Vec<InputMapping>, _>>()
            .map_err(|_| MapperError::InvalidChord(s.to_string()))?;
        if mappings.is_empty() {
            return Err(MapperError::InvalidChord(s.to_string()));
        }
        Ok(Chord { mappings })
    }
}

/// Read-only view of the bindings, valid while the table is locked.
pub trait BindingQuery {
    /// Chords bound to `output`; empty when unbound.
    fn lookup(&self, output: LogicalOutput) -> &[Chord];

    /// Whether `mapping` takes part in any binding.
    fn is_bound(&self, mapping: &InputMapping) -> bool;

    /// Physical class of an axis, for threshold selection.
    fn axis_class(&self, axis: AxisId) -> AxisClass {
        axis.class()
    }
}

/// A binding store the mapper can read under the store's own lock.
pub trait BindingTable: Send + Sync {
    /// Run `f` with the table read-locked.
    ///
    /// Fails with [`MapperError::BindingsUnavailable`] rather than blocking
    /// indefinitely or running `f` against a missing table.
    fn with_read(&self, f: &mut dyn FnMut(&dyn BindingQuery)) -> MapperResult<()>;
}

/// Plain bindings storage
#[derive(Debug, Default)]
struct ChordMap {
    chords: HashMap<LogicalOutput, Vec<Chord>>,
}

impl BindingQuery for ChordMap {
    fn lookup(&self, output: LogicalOutput) -> &[Chord] {
        self.chords.get(&output).map(Vec::as_slice).unwrap_or(&[])
    }

    fn is_bound(&self, mapping: &InputMapping) -> bool {
        self.chords
            .values()
            .flatten()
            .any(|chord| chord.contains(mapping))
    }
}

/// In-memory binding table safe to edit while a mapper is resolving.
#[derive(Debug, Default)]
pub struct ChordTable {
    inner: RwLock<ChordMap>,
    /// Bumped on every edit so editors know when to refresh
    generation: AtomicU64,
}

impl ChordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `chord` to `output`.
    ///
    /// With `replace`, existing chords for the output are dropped first.
    /// Binding an empty chord unbinds the output. Duplicate chords are
    /// ignored. Returns whether the table changed.
    pub fn set_binding(&self, output: LogicalOutput, chord: Chord, replace: bool) -> bool {
        let mut map = self.inner.write();
        if chord.is_empty() {
            let removed = map.chords.remove(&output).is_some();
            if removed {
                self.bump();
            }
            return removed;
        }

        let entry = map.chords.entry(output).or_default();
        if replace {
            entry.clear();
        } else if entry.contains(&chord) {
            return false;
        }
        entry.push(chord);
        self.bump();
        true
    }

    /// Convenience for the common single-input binding
    pub fn bind(&self, output: LogicalOutput, mapping: InputMapping) -> bool {
        self.set_binding(output, Chord::single(mapping), false)
    }

    /// Unbind every chord of `output`
    pub fn remove_output(&self, output: LogicalOutput) -> bool {
        let removed = self.inner.write().chords.remove(&output).is_some();
        if removed {
            self.bump();
        }
        removed
    }

    /// Remove the `n`th chord of `output`
    pub fn delete_nth(&self, output: LogicalOutput, n: usize) -> bool {
        let mut map = self.inner.write();
        let Some(chords) = map.chords.get_mut(&output) else {
            return false;
        };
        if n >= chords.len() {
            return false;
        }
        chords.remove(n);
        if chords.is_empty() {
            map.chords.remove(&output);
        }
        self.bump();
        true
    }

    pub fn clear(&self) {
        self.inner.write().chords.clear();
        self.bump();
    }

    /// Snapshot of the chords bound to `output`
    pub fn chords_for(&self, output: LogicalOutput) -> Vec<Chord> {
        self.inner.read().lookup(output).to_vec()
    }

    /// Devices appearing in any binding
    pub fn seen_devices(&self) -> BTreeSet<DeviceId> {
        self.inner
            .read()
            .chords
            .values()
            .flatten()
            .flat_map(|chord| chord.mappings().iter().map(|m| m.device))
            .collect()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

impl BindingTable for ChordTable {
    fn with_read(&self, f: &mut dyn FnMut(&dyn BindingQuery)) -> MapperResult<()> {
        match self.inner.try_read_for(BINDING_LOCK_TIMEOUT) {
            Some(guard) => {
                f(&*guard);
                Ok(())
            }
            None => {
                warn!(
                    timeout_ms = BINDING_LOCK_TIMEOUT.as_millis() as u64,
                    "binding table lock not acquired"
                );
                Err(MapperError::BindingsUnavailable(BINDING_LOCK_TIMEOUT))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keynames::keys;
    use crate::input::mapping::Direction;
    use crate::input::outputs::{buttons, VirtKey};
    use std::sync::Arc;
    use std::thread;

    fn kbd(key: crate::input::mapping::KeyCode) -> InputMapping {
        InputMapping::key(DeviceId::KEYBOARD, key)
    }

    #[test]
    fn test_bind_and_lookup() {
        let table = ChordTable::new();
        let up = LogicalOutput::Button(buttons::UP);
        assert!(table.bind(up, kbd(keys::W)));
        assert!(!table.bind(up, kbd(keys::W)), "duplicate chords are ignored");
        assert!(table.bind(up, kbd(keys::DPAD_UP)));

        let mut seen = 0;
        table
            .with_read(&mut |q| {
                seen = q.lookup(up).len();
                assert!(q.is_bound(&kbd(keys::W)));
                assert!(!q.is_bound(&kbd(keys::S)));
                assert!(q.lookup(LogicalOutput::Button(buttons::DOWN)).is_empty());
            })
            .unwrap();
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_replace_and_remove() {
        let table = ChordTable::new();
        let out = LogicalOutput::VirtualKey(VirtKey::Pause);
        table.bind(out, kbd(keys::ESCAPE));
        table.set_binding(out, Chord::single(kbd(keys::TAB)), true);
        assert_eq!(table.chords_for(out), vec![Chord::single(kbd(keys::TAB))]);

        table.bind(out, kbd(keys::SPACE));
        assert!(table.delete_nth(out, 0));
        assert_eq!(table.chords_for(out), vec![Chord::single(kbd(keys::SPACE))]);
        assert!(!table.delete_nth(out, 5));

        assert!(table.remove_output(out));
        assert!(table.chords_for(out).is_empty());
        assert!(!table.remove_output(out));
    }

    #[test]
    fn test_empty_chord_unbinds() {
        let table = ChordTable::new();
        let out = LogicalOutput::Button(buttons::START);
        table.bind(out, kbd(keys::ENTER));
        assert!(table.set_binding(out, Chord::default(), false));
        assert!(table.chords_for(out).is_empty());
    }

    #[test]
    fn test_generation_counts_edits() {
        let table = ChordTable::new();
        let g0 = table.generation();
        table.bind(LogicalOutput::Button(buttons::UP), kbd(keys::W));
        table.bind(LogicalOutput::Button(buttons::UP), kbd(keys::W));
        assert_eq!(table.generation(), g0 + 1);
        table.clear();
        assert_eq!(table.generation(), g0 + 2);
    }

    #[test]
    fn test_seen_devices() {
        let table = ChordTable::new();
        table.bind(LogicalOutput::Button(buttons::UP), kbd(keys::W));
        table.bind(
            LogicalOutput::VirtualKey(VirtKey::AxisXMax),
            InputMapping::axis(DeviceId::PAD_0, AxisId::X, Direction::Positive),
        );
        let devices: Vec<_> = table.seen_devices().into_iter().collect();
        assert_eq!(devices, vec![DeviceId::KEYBOARD, DeviceId::PAD_0]);
    }

    #[test]
    fn test_chord_text_form() {
        let chord: Chord = "1-LeftCtrl:1-W".parse().unwrap();
        assert_eq!(chord.len(), 2);
        assert_eq!(chord.mappings()[0], kbd(keys::CTRL_LEFT));
        assert_eq!(chord.to_string(), "1-LeftCtrl:1-W");
        assert!("1-W::".parse::<Chord>().is_err());
        assert!(!chord.has_mouse());
        assert!("2-a26+".parse::<Chord>().unwrap().has_mouse());
    }

    #[test]
    fn test_read_times_out_while_editor_holds_lock() {
        let table = Arc::new(ChordTable::new());
        let guard = table.inner.write();

        let reader = Arc::clone(&table);
        let result = thread::spawn(move || reader.with_read(&mut |_| {})).join().unwrap();
        assert_eq!(
            result,
            Err(MapperError::BindingsUnavailable(BINDING_LOCK_TIMEOUT))
        );
        drop(guard);

        assert!(table.with_read(&mut |_| {}).is_ok());
    }
}
