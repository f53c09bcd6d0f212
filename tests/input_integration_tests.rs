//! Integration tests for the control mapper
//!
//! These drive the mapper only through its public API, the way a platform
//! layer would: key and axis events in, sink events out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use ctrlmap::input::keynames::keys;
use ctrlmap::input::{
    buttons, AxisId, AxisInput, ChordTable, ControlMapper, DeviceId, InputMapping, KeyCode,
    KeyInput, LogicalOutput, MapperEvent, RecordingSink, Stick, VirtKey,
};
use ctrlmap::MapperConfig;
use proptest::prelude::*;

const PAD: DeviceId = DeviceId::PAD_0;

fn setup() -> (Arc<ChordTable>, Arc<ControlMapper>, Arc<RecordingSink>) {
    let table = Arc::new(ChordTable::new());
    let mapper = Arc::new(ControlMapper::new(table.clone(), MapperConfig::default()));
    let sink = Arc::new(RecordingSink::new());
    mapper.set_sink(sink.clone());
    (table, mapper, sink)
}

fn kbd(key: KeyCode) -> InputMapping {
    InputMapping::key(DeviceId::KEYBOARD, key)
}

/// Bindings shared by the scenario tests
fn bind_defaults(table: &ChordTable) {
    table.bind(LogicalOutput::Button(buttons::UP), kbd(keys::W));
    table.bind(LogicalOutput::Button(buttons::LEFT), kbd(keys::A));
    table.bind(LogicalOutput::Button(buttons::FACE_BOTTOM), kbd(keys::SPACE));
    table.set_binding(
        LogicalOutput::Button(buttons::FACE_TOP),
        "1-LeftCtrl:1-W".parse().unwrap(),
        false,
    );
    table.bind(VirtKey::FastForward.into(), kbd(keys::Z));
    table.bind(VirtKey::Rewind.into(), kbd(keys::S));
    table.bind(VirtKey::AxisXMax.into(), "10-a0+".parse().unwrap());
    table.bind(VirtKey::AxisXMin.into(), "10-a0-".parse().unwrap());
}

#[test]
fn test_chord_and_single_key_share_a_member() {
    let (table, mapper, sink) = setup();
    bind_defaults(&table);

    mapper.key(KeyInput::down(DeviceId::KEYBOARD, keys::W), 1.0).unwrap();
    mapper
        .key(KeyInput::down(DeviceId::KEYBOARD, keys::CTRL_LEFT), 1.1)
        .unwrap();
    assert_eq!(mapper.button_mask(), buttons::UP | buttons::FACE_TOP);

    mapper.key(KeyInput::up(DeviceId::KEYBOARD, keys::W), 1.2).unwrap();
    assert_eq!(mapper.button_mask(), 0);

    assert_eq!(
        sink.take(),
        vec![
            MapperEvent::DigitalDelta {
                pressed: buttons::UP,
                released: 0
            },
            MapperEvent::DigitalDelta {
                pressed: buttons::FACE_TOP,
                released: 0
            },
            MapperEvent::DigitalDelta {
                pressed: 0,
                released: buttons::UP | buttons::FACE_TOP
            },
        ]
    );
}

#[test]
fn test_pad_axis_drives_left_stick() {
    let (table, mapper, _sink) = setup();
    bind_defaults(&table);

    mapper.axis(AxisInput::new(PAD, AxisId::X, 1.0), 1.0).unwrap();
    assert_eq!(mapper.stick_output(Stick::Left), (1.0, 0.0));
    assert!(mapper.is_virtual_key_down(VirtKey::AxisXMax));

    mapper.axis(AxisInput::new(PAD, AxisId::X, -1.0), 1.1).unwrap();
    assert_eq!(mapper.stick_output(Stick::Left), (-1.0, 0.0));
    assert!(mapper.is_virtual_key_down(VirtKey::AxisXMin));
    assert!(!mapper.is_virtual_key_down(VirtKey::AxisXMax));

    mapper.axis(AxisInput::new(PAD, AxisId::X, 0.0), 1.2).unwrap();
    assert_eq!(mapper.stick_output(Stick::Left), (0.0, 0.0));
    assert!(!mapper.is_virtual_key_down(VirtKey::AxisXMin));
}

#[test]
fn test_release_all_after_mixed_input() {
    let (table, mapper, sink) = setup();
    bind_defaults(&table);

    mapper.key(KeyInput::down(DeviceId::KEYBOARD, keys::W), 1.0).unwrap();
    mapper.key(KeyInput::down(DeviceId::KEYBOARD, keys::Z), 1.0).unwrap();
    mapper.axis(AxisInput::new(PAD, AxisId::X, 0.9), 1.0).unwrap();
    sink.take();

    mapper.release_all(2.0).unwrap();
    assert_eq!(mapper.button_mask(), 0);
    assert!(!mapper.is_virtual_key_down(VirtKey::FastForward));
    assert!(!mapper.is_virtual_key_down(VirtKey::AxisXMax));
    assert_eq!(mapper.stick_output(Stick::Left), (0.0, 0.0));
    assert!(!sink.take().is_empty());

    mapper.release_all(3.0).unwrap();
    assert!(sink.take().is_empty());
}

#[test]
fn test_editing_bindings_while_mapping() {
    let (table, mapper, _sink) = setup();
    bind_defaults(&table);

    let stop = Arc::new(AtomicBool::new(false));
    let editor = {
        let table = table.clone();
        let stop = stop.clone();
        thread::spawn(move || {
            let output = LogicalOutput::Button(buttons::FACE_BOTTOM);
            let mut edits = 0u32;
            while !stop.load(Ordering::Relaxed) {
                table.remove_output(output);
                table.bind(output, kbd(keys::SPACE));
                edits += 1;
            }
            edits
        })
    };

    let axes = {
        let mapper = mapper.clone();
        thread::spawn(move || {
            for i in 0..500 {
                let value = if i % 2 == 0 { 0.8 } else { -0.8 };
                mapper
                    .axis(AxisInput::new(PAD, AxisId::X, value), i as f64)
                    .unwrap();
            }
        })
    };

    for i in 0..500 {
        let now = i as f64;
        mapper.key(KeyInput::down(DeviceId::KEYBOARD, keys::W), now).unwrap();
        mapper
            .key(KeyInput::down(DeviceId::KEYBOARD, keys::SPACE), now)
            .unwrap();
        mapper.key(KeyInput::up(DeviceId::KEYBOARD, keys::W), now).unwrap();
        mapper.key(KeyInput::up(DeviceId::KEYBOARD, keys::SPACE), now).unwrap();
        mapper.update(now);
    }

    axes.join().unwrap();
    stop.store(true, Ordering::Relaxed);
    let edits = editor.join().unwrap();
    assert!(edits > 0);

    mapper.release_all(1000.0).unwrap();
    assert_eq!(mapper.button_mask() & buttons::UP, 0);
    assert_eq!(mapper.stick_output(Stick::Left), (0.0, 0.0));
    assert!(table.generation() >= u64::from(edits));
}

#[derive(Debug, Clone)]
enum Step {
    Key(usize, bool),
    Axis(f32),
}

const STEP_KEYS: [KeyCode; 6] = [
    keys::W,
    keys::A,
    keys::SPACE,
    keys::CTRL_LEFT,
    keys::Z,
    keys::S,
];

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..STEP_KEYS.len(), any::<bool>()).prop_map(|(k, down)| Step::Key(k, down)),
        (-1.0f32..=1.0).prop_map(Step::Axis),
    ]
}

proptest! {
    #[test]
    fn prop_edges_alternate_and_release_all_clears(steps in prop::collection::vec(step(), 1..60)) {
        let (table, mapper, sink) = setup();
        bind_defaults(&table);

        for (i, step) in steps.iter().enumerate() {
            let now = i as f64 * 0.1;
            match *step {
                Step::Key(k, true) => {
                    mapper.key(KeyInput::down(DeviceId::KEYBOARD, STEP_KEYS[k]), now).unwrap();
                }
                Step::Key(k, false) => {
                    mapper.key(KeyInput::up(DeviceId::KEYBOARD, STEP_KEYS[k]), now).unwrap();
                }
                Step::Axis(value) => {
                    mapper.axis(AxisInput::new(PAD, AxisId::X, value), now).unwrap();
                }
            }
        }
        mapper.release_all(steps.len() as f64).unwrap();

        let mut mask = 0u32;
        let mut latched = [false; VirtKey::COUNT];
        for event in sink.take() {
            match event {
                MapperEvent::DigitalDelta { pressed, released } => {
                    prop_assert_eq!(pressed & mask, 0);
                    prop_assert_eq!(released & !mask, 0);
                    prop_assert_eq!(pressed & released, 0);
                    mask = (mask | pressed) & !released;
                }
                MapperEvent::VirtualKeyEdge { key, down } => {
                    prop_assert_ne!(latched[key.index()], down);
                    latched[key.index()] = down;
                }
                _ => {}
            }
        }

        prop_assert_eq!(mask, 0);
        prop_assert_eq!(mapper.button_mask(), 0);
        prop_assert!(latched.iter().all(|down| !down));
        prop_assert_eq!(mapper.stick_output(Stick::Left), (0.0, 0.0));
    }
}
