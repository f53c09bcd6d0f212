// ctrlmap: real-time input to emulated-controller mapping

pub mod cli;
pub mod config;
pub mod input;
pub mod logging;
pub mod replay;

pub use cli::Cli;
pub use config::{MapperConfig, ScreenRotation};
pub use input::{ChordTable, ControlMapper, LogicalOutput, MapperSink};
pub use logging::LogLevel;
