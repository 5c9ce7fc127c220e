pub mod dispatch;
pub mod loader;
pub mod render;
pub mod session;

pub use crate::domain::model::{
    DispatchOutcome, DispatchSummary, MailMessage, Row, RowReport, SendMode, Table,
};
pub use crate::domain::ports::{MailSession, MailTransport};
pub use crate::utils::error::Result;
