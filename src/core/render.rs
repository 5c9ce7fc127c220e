use crate::domain::model::RowView;
use crate::domain::schema::{APPT_DATE, OUTCOME, OUTCOME_NOTE, PROJECT_ID, REQUESTED_OUTCOME, SUBMITTER};
use html_escape::encode_text;

/// `Dispute Result – Project {id} – {requested outcome, else outcome}`
pub fn render_subject(row: &RowView<'_>) -> String {
    let requested = row.get(REQUESTED_OUTCOME).trim();
    let headline = if requested.is_empty() {
        row.get(OUTCOME).trim()
    } else {
        requested
    };

    format!(
        "Dispute Result – Project {} – {}",
        row.get(PROJECT_ID).trim(),
        headline
    )
}

pub fn render_body(row: &RowView<'_>) -> String {
    let field = |name: &str| encode_text(row.get(name)).into_owned();

    format!(
        r#"<html>
<body style="font-family:Segoe UI, Arial, sans-serif; font-size:12pt;">
  <p>Hi,</p>
  <p>The dispute result for <b>Project {project}</b> is below.</p>
  <table cellpadding="6" cellspacing="0" border="0" style="border-collapse:collapse;">
    <tr><td><b>Submitter</b></td><td>{submitter}</td></tr>
    <tr><td><b>Appt Date</b></td><td>{appt_date}</td></tr>
    <tr><td><b>Requested Outcome</b></td><td>{requested}</td></tr>
    <tr><td><b>Final Outcome</b></td><td>{outcome}</td></tr>
    <tr><td><b>Note</b></td><td>{note}</td></tr>
  </table>
  <p style="margin-top:14px;">Regards,<br>Disputes Team</p>
</body>
</html>
"#,
        project = field(PROJECT_ID),
        submitter = field(SUBMITTER),
        appt_date = field(APPT_DATE),
        requested = field(REQUESTED_OUTCOME),
        outcome = field(OUTCOME),
        note = field(OUTCOME_NOTE),
    )
}
