use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One dispute record. Cell order follows the owning table's columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<String>,
}

impl Row {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// True when every cell is empty. Whitespace counts as content.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(String::is_empty)
    }
}

/// Ordered rows sharing one column list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Rows shorter than `columns` read as blank for the missing cells.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell text for `name` in row `row`; `""` when the column or cell is absent.
    pub fn value(&self, row: usize, name: &str) -> &str {
        self.column_index(name)
            .and_then(|col| self.rows.get(row).and_then(|r| r.cells.get(col)))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Borrowed view of one row with by-name field access.
    pub fn record(&self, row: usize) -> Option<RowView<'_>> {
        (row < self.rows.len()).then_some(RowView { table: self, row })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a Table,
    row: usize,
}

impl<'a> RowView<'a> {
    pub fn index(&self) -> usize {
        self.row
    }

    pub fn get(&self, name: &str) -> &'a str {
        self.table.value(self.row, name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendMode {
    /// Surface to a human for manual confirmation, never transmitted.
    #[default]
    Preview,
    /// Transmit immediately.
    Send,
}

impl SendMode {
    pub fn verb(&self) -> &'static str {
        match self {
            SendMode::Preview => "Previewed",
            SendMode::Send => "Queued",
        }
    }
}

impl fmt::Display for SendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendMode::Preview => write!(f, "preview"),
            SendMode::Send => write!(f, "send"),
        }
    }
}

impl std::str::FromStr for SendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preview" => Ok(SendMode::Preview),
            "send" => Ok(SendMode::Send),
            other => Err(format!("unknown send mode '{}'", other)),
        }
    }
}

/// Built fresh per row, handed to the transport, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub reply_to: Option<String>,
    pub on_behalf_of: Option<String>,
    pub attachments: Vec<PathBuf>,
    pub mode: SendMode,
}

impl MailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, html_body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            html_body: html_body.into(),
            cc: None,
            bcc: None,
            reply_to: None,
            on_behalf_of: None,
            attachments: Vec::new(),
            mode: SendMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: SendMode) -> Self {
        self.mode = mode;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DispatchOutcome {
    Sent,
    Skipped { reason: String },
    Failed { error: String },
}

/// Per-row result plus the context needed for its log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowReport {
    pub index: usize,
    pub recipient: String,
    pub mode: SendMode,
    pub outcome: DispatchOutcome,
}

impl fmt::Display for RowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            DispatchOutcome::Sent => write!(
                f,
                "✓ {} row {} → {}",
                self.mode.verb(),
                self.index,
                self.recipient
            ),
            DispatchOutcome::Skipped { reason } => {
                write!(f, "– Skipped row {}: {}", self.index, reason)
            }
            DispatchOutcome::Failed { error } => write!(
                f,
                "✗ Failed row {} → {}: {}",
                self.index, self.recipient, error
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub mode: SendMode,
    pub total: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DispatchSummary {
    pub fn new(mode: SendMode, total: usize) -> Self {
        Self {
            mode,
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Sent => self.sent += 1,
            DispatchOutcome::Skipped { .. } => self.skipped += 1,
            DispatchOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn attempted(&self) -> usize {
        self.sent + self.skipped + self.failed
    }
}

impl fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.mode {
            SendMode::Preview => "Previewed",
            SendMode::Send => "Sent",
        };
        write!(
            f,
            "Done. {}: {} | Skipped: {} | Failed: {}",
            label, self.sent, self.skipped, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        Table::new(
            vec!["Project ID".to_string(), "Email-To".to_string()],
            vec![
                Row::new(vec!["P-1".to_string(), "a@x.com".to_string()]),
                Row::new(vec!["P-2".to_string()]),
            ],
        )
    }

    #[test]
    fn test_value_lookup_by_name() {
        let table = sample_table();
        assert_eq!(table.value(0, "Project ID"), "P-1");
        assert_eq!(table.value(0, "Email-To"), "a@x.com");
        // short row reads as blank
        assert_eq!(table.value(1, "Email-To"), "");
        assert_eq!(table.value(0, "Nope"), "");
        assert_eq!(table.value(9, "Project ID"), "");
    }

    #[test]
    fn test_blank_row() {
        assert!(Row::new(vec![String::new(), String::new()]).is_blank());
        assert!(Row::new(Vec::new()).is_blank());
        assert!(!Row::new(vec![String::new(), "  ".to_string()]).is_blank());
    }

    #[test]
    fn test_record_view() {
        let table = sample_table();
        let view = table.record(1).unwrap();
        assert_eq!(view.index(), 1);
        assert_eq!(view.get("Project ID"), "P-2");
        assert!(table.record(2).is_none());
    }

    #[test]
    fn test_summary_counts_and_line() {
        let mut summary = DispatchSummary::new(SendMode::Send, 3);
        summary.record(&DispatchOutcome::Sent);
        summary.record(&DispatchOutcome::Skipped {
            reason: "missing Email-To".to_string(),
        });
        summary.record(&DispatchOutcome::Failed {
            error: "boom".to_string(),
        });

        assert_eq!(summary.attempted(), summary.total);
        assert_eq!(
            summary.to_string(),
            "Done. Sent: 1 | Skipped: 1 | Failed: 1"
        );
    }

    #[test]
    fn test_row_report_lines() {
        let sent = RowReport {
            index: 0,
            recipient: "a@x.com".to_string(),
            mode: SendMode::Send,
            outcome: DispatchOutcome::Sent,
        };
        assert_eq!(sent.to_string(), "✓ Queued row 0 → a@x.com");

        let skipped = RowReport {
            index: 1,
            recipient: String::new(),
            mode: SendMode::Preview,
            outcome: DispatchOutcome::Skipped {
                reason: "missing Email-To".to_string(),
            },
        };
        assert_eq!(skipped.to_string(), "– Skipped row 1: missing Email-To");
    }

    #[test]
    fn test_send_mode_parse() {
        assert_eq!("Preview".parse::<SendMode>().unwrap(), SendMode::Preview);
        assert_eq!(" send ".parse::<SendMode>().unwrap(), SendMode::Send);
        assert!("display".parse::<SendMode>().is_err());
    }
}
