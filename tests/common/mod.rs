#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use dispute_mailer::core::{MailSession, MailTransport};
use dispute_mailer::domain::schema::EXPECTED_COLUMNS;
use dispute_mailer::utils::error::TransportError;
use dispute_mailer::MailMessage;
use rust_xlsxwriter::Workbook;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Write a workbook whose `sheet` has `header` in C1.. and `rows` below it.
/// Columns A and B get a row counter, like the exported dispute sheets.
pub fn write_workbook(path: &Path, sheet: &str, header: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet)?;

    worksheet.write_string(0, 0, "#")?;
    for (col, name) in header.iter().enumerate() {
        worksheet.write_string(0, 2 + col as u16, *name)?;
    }
    for (r, row) in rows.iter().enumerate() {
        let sheet_row = r as u32 + 1;
        worksheet.write_number(sheet_row, 0, (r + 1) as f64)?;
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(sheet_row, 2 + col as u16, value.as_str())?;
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// One dispute row with the given project id and recipient.
pub fn dispute_row(project: &str, recipient: &str) -> Vec<String> {
    EXPECTED_COLUMNS
        .iter()
        .map(|column| match *column {
            "Submitter" => "Dana Ruiz".to_string(),
            "Project ID" => project.to_string(),
            "Appt Date" => "03/07/2024".to_string(),
            "Requested Outcome" => "Reschedule".to_string(),
            "Outcome" => "Approved".to_string(),
            "Outcome Note" => "Moved to next week".to_string(),
            "Email-To" => recipient.to_string(),
            _ => "n/a".to_string(),
        })
        .collect()
}

#[derive(Default)]
pub struct Recorded {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub delivered: Mutex<Vec<MailMessage>>,
}

impl Recorded {
    pub fn delivered_to(&self) -> Vec<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.to.clone())
            .collect()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Records every message; fails delivery for the listed recipients.
pub struct RecordingTransport {
    pub recorded: Arc<Recorded>,
    fail_for: Vec<String>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::failing_for(&[])
    }

    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            recorded: Arc::new(Recorded::default()),
            fail_for: recipients.iter().map(|r| r.to_string()).collect(),
        }
    }
}

struct RecordingSession {
    recorded: Arc<Recorded>,
    fail_for: Vec<String>,
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn open(&self) -> std::result::Result<Box<dyn MailSession>, TransportError> {
        self.recorded.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingSession {
            recorded: Arc::clone(&self.recorded),
            fail_for: self.fail_for.clone(),
        }))
    }
}

#[async_trait]
impl MailSession for RecordingSession {
    async fn deliver(&mut self, message: &MailMessage) -> std::result::Result<(), TransportError> {
        self.recorded.delivered.lock().unwrap().push(message.clone());
        if self.fail_for.contains(&message.to) {
            return Err(TransportError::Other(format!("{} rejected", message.to)));
        }
        Ok(())
    }

    async fn close(&mut self) -> std::result::Result<(), TransportError> {
        self.recorded.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
