//! End-to-end tests for script replay with configs loaded from disk

use std::fs;

use ctrlmap::replay::{parse_script, Replay, ReplayError};
use ctrlmap::MapperConfig;
use tempfile::TempDir;

fn replay_with(config: MapperConfig, script: &str) -> Vec<String> {
    let script = parse_script(script).unwrap();
    let mut replay = Replay::new(config);
    let mut out = Vec::new();
    replay.run(&script, &mut out).unwrap();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_stick_script_with_loaded_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mapper.toml");
    fs::write(&path, "deadzone = 0.0\nsensitivity = 1.0\n").unwrap();
    let config = MapperConfig::load_from_file(&path).unwrap();

    let out = replay_with(
        config,
        "bind An.Right 10-a0+\n\
         bind An.Left 10-a0-\n\
         axis 10 0 0.5\n\
         axis 10 0 0\n",
    );

    assert_eq!(
        out,
        vec![
            "   0.000 raw Left 0.500 0.000",
            "   0.000 stick Left 0.500 0.000",
            "   0.000 raw Left 0.000 0.000",
            "   0.000 stick Left 0.000 0.000",
        ]
    );
}

#[test]
fn test_swap_moves_dpad_to_stick() {
    let out = replay_with(
        MapperConfig::default(),
        "bind Right 1-D\n\
         key 1-D down\n\
         swap\n\
         key 1-D up\n",
    );

    assert_eq!(out[0], "   0.000 buttons +Right");
    assert!(out.contains(&"   0.000 buttons -Right".to_string()));
    assert!(out.contains(&"   0.000 vkey An.Right down".to_string()));
    assert!(out.contains(&"   0.000 stick Left 1.000 0.000".to_string()));
    assert!(out.contains(&"   0.000 vkey An.Right up".to_string()));
}

#[test]
fn test_mapper_error_carries_line() {
    let script = parse_script("bind Up 1-W\nkey 1-W down\n").unwrap();
    assert_eq!(script[1].line, 2);

    let err = parse_script("bind Up 1-W\naxis 10 x 0.5\n").unwrap_err();
    assert!(matches!(err, ReplayError::Parse { line: 2, .. }));
    assert!(err.to_string().starts_with("line 2:"));
}

#[test]
fn test_inject_and_dump() {
    let out = replay_with(
        MapperConfig::default(),
        "inject 10 FastForward down\n\
         dump\n\
         inject 10 FastForward up\n",
    );

    assert_eq!(out[0], "   0.000 vkey FastForward down");
    assert_eq!(out[1], "   0.000 analog Pad0 FastForward 1.000");
    assert!(out.contains(&"FastForward: 1.000".to_string()));
    assert!(out.contains(&"Lstick: 0.000, 0.000".to_string()));
    assert_eq!(out[out.len() - 2], "   0.000 vkey FastForward up");
    assert_eq!(out[out.len() - 1], "   0.000 analog Pad0 FastForward 0.000");
}
