//! devboard-app - Dashboard tabs and the host panel for devboard
//!
//! Each tab owns a snapshot fetched from one daemon, renders it to an HTML
//! fragment with a delegated-event script, and translates user commands into
//! remote calls. The [`HostPanel`] routes inbound messages to tabs and emits
//! render frames whenever a tab signals that its view changed.

pub mod config;
pub mod host;
pub mod lifecycle;
pub mod message;
pub mod registry;
pub mod tab;
pub mod tabs;
pub mod view;

// Re-export primary types
pub use config::{load_settings, Settings};
pub use host::{HostPanel, OutboundFrame, RenderedTab, TabSummary};
pub use lifecycle::{Clock, RenderNotifier, RetryCounter, TabContext, DEFAULT_MAX_RETRIES};
pub use message::InboundMessage;
pub use tab::{Dispatch, LoadReport, Tab};
