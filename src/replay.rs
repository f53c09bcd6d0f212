//! Input script replay
//!
//! Drives a [`ControlMapper`] from a plain text script so bindings can be
//! checked without a platform layer. One command per line, `#` starts a
//! comment:
//!
//! ```text
//! bind Up 1-W                 # output, chord
//! bind FaceTop 1-LeftCtrl:1-W
//! key 1-W down                # mapping, down|up
//! axis 10 0 0.8               # device, axis id, signed value
//! wait 0.5                    # advance the clock (seconds)
//! update
//! release
//! swap
//! force Up
//! inject 10 AnalogLimiter down
//! unbind Up
//! dump
//! ```

use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::MapperConfig;
use crate::input::{
    AxisId, AxisInput, Chord, ChordTable, ControlMapper, DeviceId, InputMapping, KeyInput,
    LogicalOutput, MapperError, RecordingSink,
};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: {source}")]
    Mapper {
        line: usize,
        #[source]
        source: MapperError,
    },

    #[error("output error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Bind { output: LogicalOutput, chord: Chord },
    Unbind(LogicalOutput),
    Key { mapping: InputMapping, pressed: bool },
    Axis { device: DeviceId, axis: AxisId, value: f32 },
    Wait(f64),
    Update,
    Release,
    Swap,
    Force(LogicalOutput),
    Inject { device: DeviceId, output: LogicalOutput, pressed: bool },
    Dump,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = s.split_whitespace().collect();
        let (&name, args) = words.split_first().ok_or("empty command")?;

        let arity = |n: usize| {
            if args.len() == n {
                Ok(())
            } else {
                Err(format!("`{}` takes {} argument(s), got {}", name, n, args.len()))
            }
        };

        match name {
            "bind" => {
                arity(2)?;
                Ok(Command::Bind {
                    output: parse_output(args[0])?,
                    chord: args[1].parse().map_err(|e: MapperError| e.to_string())?,
                })
            }
            "unbind" => {
                arity(1)?;
                Ok(Command::Unbind(parse_output(args[0])?))
            }
            "key" => {
                arity(2)?;
                let mapping: InputMapping =
                    args[0].parse().map_err(|e: MapperError| e.to_string())?;
                if mapping.is_axis() {
                    return Err(format!("`{}` is an axis, use `axis`", args[0]));
                }
                Ok(Command::Key {
                    mapping,
                    pressed: parse_state(args[1])?,
                })
            }
            "axis" => {
                arity(3)?;
                Ok(Command::Axis {
                    device: parse_device(args[0])?,
                    axis: AxisId(
                        args[1]
                            .parse()
                            .map_err(|_| format!("bad axis id `{}`", args[1]))?,
                    ),
                    value: args[2]
                        .parse()
                        .map_err(|_| format!("bad axis value `{}`", args[2]))?,
                })
            }
            "wait" => {
                arity(1)?;
                let dt: f64 = args[0]
                    .parse()
                    .map_err(|_| format!("bad duration `{}`", args[0]))?;
                if !dt.is_finite() || dt < 0.0 {
                    return Err(format!("bad duration `{}`", args[0]));
                }
                Ok(Command::Wait(dt))
            }
            "update" => arity(0).map(|_| Command::Update),
            "release" => arity(0).map(|_| Command::Release),
            "swap" => arity(0).map(|_| Command::Swap),
            "dump" => arity(0).map(|_| Command::Dump),
            "force" => {
                arity(1)?;
                Ok(Command::Force(parse_output(args[0])?))
            }
            "inject" => {
                arity(3)?;
                Ok(Command::Inject {
                    device: parse_device(args[0])?,
                    output: parse_output(args[1])?,
                    pressed: parse_state(args[2])?,
                })
            }
            other => Err(format!("unknown command `{}`", other)),
        }
    }
}

fn parse_output(s: &str) -> Result<LogicalOutput, String> {
    s.parse().map_err(|e: MapperError| e.to_string())
}

fn parse_device(s: &str) -> Result<DeviceId, String> {
    s.parse()
        .map(DeviceId)
        .map_err(|_| format!("bad device id `{}`", s))
}

fn parse_state(s: &str) -> Result<bool, String> {
    match s {
        "down" | "press" => Ok(true),
        "up" | "release" => Ok(false),
        other => Err(format!("expected down or up, got `{}`", other)),
    }
}

/// A parsed command with its 1-based source line
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub line: usize,
    pub command: Command,
}

/// Parse a whole script, stopping at the first bad line
pub fn parse_script(text: &str) -> Result<Vec<ScriptLine>, ReplayError> {
    let mut script = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let command = content
            .parse::<Command>()
            .map_err(|message| ReplayError::Parse { line, message })?;
        script.push(ScriptLine { line, command });
    }
    Ok(script)
}

/// A mapper with its own binding table, clock and recording sink
pub struct Replay {
    table: Arc<ChordTable>,
    mapper: ControlMapper,
    recorder: Arc<RecordingSink>,
    now: f64,
}

impl Replay {
    pub fn new(config: MapperConfig) -> Self {
        let table = Arc::new(ChordTable::new());
        let mapper = ControlMapper::new(table.clone(), config);
        let recorder = Arc::new(RecordingSink::new());
        mapper.set_sink(recorder.clone());
        Self {
            table,
            mapper,
            recorder,
            now: 0.0,
        }
    }

    pub fn mapper(&self) -> &ControlMapper {
        &self.mapper
    }

    pub fn bindings(&self) -> &ChordTable {
        &self.table
    }

    /// Script clock in seconds
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Run one command and return the lines it prints
    pub fn execute(&mut self, command: &Command) -> Result<Vec<String>, MapperError> {
        let mut notes = Vec::new();
        match command {
            Command::Bind { output, chord } => {
                self.table.set_binding(*output, chord.clone(), false);
            }
            Command::Unbind(output) => {
                if !self.table.remove_output(*output) {
                    notes.push(format!("{} was not bound", output));
                }
            }
            Command::Key { mapping, pressed } => {
                if let Some(code) = mapping.key_code() {
                    let input = if *pressed {
                        KeyInput::down(mapping.device, code)
                    } else {
                        KeyInput::up(mapping.device, code)
                    };
                    let outcome = self.mapper.key(input, self.now)?;
                    if outcome.pause_requested {
                        notes.push("pause requested".to_string());
                    } else if !outcome.handled {
                        notes.push(format!("{} is not bound", mapping));
                    }
                }
            }
            Command::Axis {
                device,
                axis,
                value,
            } => {
                self.mapper
                    .axis(AxisInput::new(*device, *axis, *value), self.now)?;
            }
            Command::Wait(dt) => self.now += dt,
            Command::Update => self.mapper.update(self.now),
            Command::Release => self.mapper.release_all(self.now)?,
            Command::Swap => self.mapper.toggle_axis_swap(self.now)?,
            Command::Force(output) => self.mapper.force_release(*output, self.now)?,
            Command::Inject {
                device,
                output,
                pressed,
            } => self.mapper.inject(*device, *output, *pressed),
            Command::Dump => {}
        }

        let mut lines: Vec<String> = self
            .recorder
            .take()
            .iter()
            .map(|event| format!("{:8.3} {}", self.now, event))
            .collect();
        lines.extend(notes.into_iter().map(|n| format!("{:8.3} # {}", self.now, n)));
        if matches!(command, Command::Dump) {
            lines.extend(self.mapper.debug_dump().lines().map(str::to_string));
        }
        Ok(lines)
    }

    /// Run a parsed script, writing every line of output to `out`
    pub fn run<W: Write>(&mut self, script: &[ScriptLine], out: &mut W) -> Result<(), ReplayError> {
        let mut printed = 0usize;
        for entry in script {
            debug!(line = entry.line, command = ?entry.command, "replay");
            let lines = self
                .execute(&entry.command)
                .map_err(|source| ReplayError::Mapper {
                    line: entry.line,
                    source,
                })?;
            for text in &lines {
                writeln!(out, "{}", text)?;
            }
            printed += lines.len();
        }
        info!(commands = script.len(), lines = printed, "replay finished");
        Ok(())
    }
}
