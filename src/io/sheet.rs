//! Write-back: idempotent upsert of one organization's raw data into a sheet.
//!
//! The sheet is a CSV file whose first column holds the organization name.
//! A submission replaces the row whose first cell matches its name exactly
//! (case-sensitive), or is appended when there is no such row. Columns beyond
//! the submission's ten fields are left untouched.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::error::AppError;

/// Column layout written by a submission, in order.
pub const SHEET_COLUMNS: [&str; 10] = [
    "Organization Name",
    "Total Population",
    "Active Members",
    "Organization Members",
    "Total Members",
    "Revenue",
    "Events",
    "Calendar Events",
    "Projects",
    "Meeting Hosting",
];

/// One admin-form submission. Absent fields are written as empty cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(deserialize_with = "cell")]
    pub organization_name: String,
    #[serde(default, deserialize_with = "cell")]
    pub total_population: String,
    #[serde(default, deserialize_with = "cell")]
    pub active_members: String,
    #[serde(default, deserialize_with = "cell")]
    pub org_members: String,
    #[serde(default, deserialize_with = "cell")]
    pub total_members: String,
    #[serde(default, deserialize_with = "cell")]
    pub revenue: String,
    #[serde(default, deserialize_with = "cell")]
    pub events: String,
    #[serde(default, deserialize_with = "cell")]
    pub calendar_events: String,
    #[serde(default, deserialize_with = "cell")]
    pub projects: String,
    #[serde(default, deserialize_with = "cell")]
    pub meeting_hosting: String,
}

impl Submission {
    pub fn from_json(text: &str) -> Result<Self, AppError> {
        serde_json::from_str(text).map_err(|e| AppError::config(format!("Invalid submission JSON: {e}")))
    }

    /// Cells in `SHEET_COLUMNS` order.
    pub fn cells(&self) -> [&str; 10] {
        [
            self.organization_name.as_str(),
            self.total_population.as_str(),
            self.active_members.as_str(),
            self.org_members.as_str(),
            self.total_members.as_str(),
            self.revenue.as_str(),
            self.events.as_str(),
            self.calendar_events.as_str(),
            self.projects.as_str(),
            self.meeting_hosting.as_str(),
        ]
    }
}

/// Accept strings, numbers, booleans or null for a cell.
fn cell<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created { row: usize },
    Updated { row: usize },
}

/// In-memory sheet: header plus data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    /// An empty sheet with the submission column layout.
    pub fn with_default_columns() -> Self {
        Self {
            headers: SHEET_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::config(format!("Sheet not found '{}': {e}", path.display())))?;
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

        let headers = reader
            .headers()
            .map_err(|e| AppError::config(format!("Failed to read sheet header: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| AppError::config(format!("Failed to read sheet row: {e}")))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self { headers, rows })
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| AppError::config(format!("Failed to create sheet '{}': {e}", path.display())))?;
        writer
            .write_record(&self.headers)
            .map_err(|e| AppError::config(format!("Failed to write sheet header: {e}")))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| AppError::config(format!("Failed to write sheet row: {e}")))?;
        }
        writer
            .flush()
            .map_err(|e| AppError::config(format!("Failed to flush sheet: {e}")))
    }

    /// Index of the first data row whose first cell equals `name` exactly.
    pub fn find_row(&self, name: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| r.first().map(String::as_str) == Some(name))
    }

    /// Insert or overwrite the row for the submission's organization.
    pub fn upsert(&mut self, submission: &Submission) -> Result<UpsertOutcome, AppError> {
        let name = submission.organization_name.as_str();
        if name.trim().is_empty() {
            return Err(AppError::config("Submission is missing `organizationName`."));
        }

        let cells = submission.cells();
        match self.find_row(name) {
            Some(idx) => {
                let row = &mut self.rows[idx];
                if row.len() < cells.len() {
                    row.resize(cells.len(), String::new());
                }
                for (slot, value) in row.iter_mut().zip(cells) {
                    *slot = value.to_string();
                }
                info!(organization = name, row = idx, "updated organization");
                Ok(UpsertOutcome::Updated { row: idx })
            }
            None => {
                let mut row: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
                if row.len() < self.headers.len() {
                    row.resize(self.headers.len(), String::new());
                }
                self.rows.push(row);
                let idx = self.rows.len() - 1;
                info!(organization = name, row = idx, "added new organization");
                Ok(UpsertOutcome::Created { row: idx })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteStatus {
    Success,
    Error,
}

/// Status returned to the submitting form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteResponse {
    pub status: WriteStatus,
    pub message: String,
}

impl WriteResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: WriteStatus::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: WriteStatus::Error,
            message: message.into(),
        }
    }
}

/// Load the sheet, upsert the submission and save it back.
///
/// Every failure is reported in the response rather than returned.
pub fn apply_submission(path: &Path, submission: &Submission) -> WriteResponse {
    let result = Sheet::load(path).and_then(|mut sheet| {
        let outcome = sheet.upsert(submission)?;
        sheet.save(path)?;
        Ok(outcome)
    });

    match result {
        Ok(UpsertOutcome::Created { .. }) => WriteResponse::success("Data saved successfully (new organization)"),
        Ok(UpsertOutcome::Updated { .. }) => WriteResponse::success("Data saved successfully"),
        Err(e) => WriteResponse::error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(name: &str, revenue: &str) -> Submission {
        Submission {
            organization_name: name.to_string(),
            revenue: revenue.to_string(),
            ..Submission::default()
        }
    }

    fn sheet() -> Sheet {
        let mut sheet = Sheet::with_default_columns();
        sheet.upsert(&submission("Alpha", "100")).unwrap();
        sheet.upsert(&submission("Beta", "200")).unwrap();
        sheet
    }

    #[test]
    fn unseen_name_appends_a_row() {
        let mut sheet = sheet();
        let outcome = sheet.upsert(&submission("Gamma", "300")).unwrap();
        assert_eq!(outcome, UpsertOutcome::Created { row: 2 });
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[2][0], "Gamma");
        assert_eq!(sheet.rows[2][5], "300");
    }

    #[test]
    fn existing_name_overwrites_in_place() {
        let mut sheet = sheet();
        let before = sheet.rows.clone();

        let outcome = sheet.upsert(&submission("Alpha", "999")).unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated { row: 0 });
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][5], "999");
        assert_eq!(sheet.rows[1], before[1]);

        // Same submission again is a no-op.
        let again = sheet.clone();
        sheet.upsert(&submission("Alpha", "999")).unwrap();
        assert_eq!(sheet, again);
    }

    #[test]
    fn match_is_case_sensitive_and_requires_a_name() {
        let mut sheet = sheet();
        let outcome = sheet.upsert(&submission("alpha", "1")).unwrap();
        assert_eq!(outcome, UpsertOutcome::Created { row: 2 });
        assert!(sheet.upsert(&submission("  ", "1")).is_err());
    }

    #[test]
    fn extra_columns_survive_an_update() {
        let mut sheet = Sheet::with_default_columns();
        sheet.headers.push("Notes".to_string());
        let mut row: Vec<String> = vec![String::new(); 11];
        row[0] = "Alpha".to_string();
        row[10] = "keep me".to_string();
        sheet.rows.push(row);

        sheet.upsert(&submission("Alpha", "5")).unwrap();
        assert_eq!(sheet.rows[0][10], "keep me");
        assert_eq!(sheet.rows[0][5], "5");
    }

    #[test]
    fn submission_json_accepts_numbers_and_missing_fields() {
        let s = Submission::from_json(
            r#"{"organizationName": "Test Organization", "totalPopulation": 10000, "revenue": "100000", "projects": null}"#,
        )
        .unwrap();
        assert_eq!(s.organization_name, "Test Organization");
        assert_eq!(s.total_population, "10000");
        assert_eq!(s.revenue, "100000");
        assert_eq!(s.projects, "");
        assert_eq!(s.meeting_hosting, "");
    }

    #[test]
    fn apply_submission_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("society.csv");
        sheet().save(&path).unwrap();

        let response = apply_submission(&path, &submission("Beta", "250"));
        assert_eq!(response.status, WriteStatus::Success);

        let reloaded = Sheet::load(&path).unwrap();
        assert_eq!(reloaded.rows.len(), 2);
        assert_eq!(reloaded.rows[1][5], "250");

        let missing = apply_submission(&dir.path().join("nope.csv"), &submission("X", "1"));
        assert_eq!(missing.status, WriteStatus::Error);
    }
}
