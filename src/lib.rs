pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::MailerConfig;

pub use adapters::{LettreTransport, LettreTransportConfig};
pub use core::dispatch::{start_dispatch, DispatchEvent, DispatchHandle, DispatchOptions};
pub use core::loader::{inspect_workbook, load_table};
pub use core::session::DisputeSession;
pub use domain::model::{DispatchOutcome, DispatchSummary, MailMessage, Row, SendMode, Table};
pub use utils::error::{MailerError, Result};
