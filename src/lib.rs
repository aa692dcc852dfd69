//! devboard - Host process for the developer dashboard
//!
//! An embedding view (an editor webview or a browser shell) spawns this
//! process, writes command messages to its stdin as JSON lines and reads
//! render frames from its stdout. See [`stdio`] for the wire format.

pub mod stdio;

pub use stdio::{parse_command_line, read_commands_blocking, run_once, run_stdio, write_frames};
