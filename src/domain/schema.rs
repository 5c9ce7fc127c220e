/// Sheet the dispute rows live in.
pub const EXPECTED_SHEET: &str = "Emails";

/// Columns C:N inclusive, in order.
pub const EXPECTED_COLUMNS: [&str; 12] = [
    "Submitter",
    "Project ID",
    "Appt Date",
    "Requested Outcome",
    "Context",
    "Closer",
    "Outcome",
    "Outcome Note",
    "Closer Manager",
    "Setter Mgr First",
    "Closer Mgr First",
    "Email-To",
];

/// 0-based absolute index of column C.
pub const FIRST_COLUMN: u32 = 2;

pub const RECIPIENT_COLUMN: &str = "Email-To";

pub const SUBMITTER: &str = "Submitter";
pub const PROJECT_ID: &str = "Project ID";
pub const APPT_DATE: &str = "Appt Date";
pub const REQUESTED_OUTCOME: &str = "Requested Outcome";
pub const OUTCOME: &str = "Outcome";
pub const OUTCOME_NOTE: &str = "Outcome Note";

/// Spreadsheet letter for a 0-based column index (`2` -> `C`).
pub fn column_letter(index: u32) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Human label for the fixed range, e.g. `C:N`.
pub fn column_range_label() -> String {
    format!(
        "{}:{}",
        column_letter(FIRST_COLUMN),
        column_letter(FIRST_COLUMN + EXPECTED_COLUMNS.len() as u32 - 1)
    )
}
