//! Payroll exports: grouping stored records and rendering them as CSV.

mod aggregate;
mod render;
pub mod views;

pub use self::aggregate::ReportAggregator;
pub use self::render::{format_currency, render_csv, CsvRow, ReportError};

use chrono::NaiveDate;

use super::calendar::{end_of_day, start_of_day};
use super::domain::TutorId;
use super::error::PayrollError;
use super::repository::{DateField, DateWindow, RecordFilter};
use crate::config::PayrollPolicy;

/// The supported export layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    ByTutor,
    ByStudent,
    ByTutorByMonth,
}

impl ExportKind {
    pub const fn filename(self) -> &'static str {
        match self {
            ExportKind::ByTutor => "class_records.csv",
            ExportKind::ByStudent => "student_summary.csv",
            ExportKind::ByTutorByMonth => "monthly_payroll.csv",
        }
    }

    /// Timestamp the date range filters on.
    pub const fn date_field(self) -> DateField {
        match self {
            ExportKind::ByTutor | ExportKind::ByStudent => DateField::Submitted,
            ExportKind::ByTutorByMonth => DateField::LessonStart,
        }
    }
}

/// Admin-supplied narrowing of an export; dates are inclusive calendar days.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportFilter {
    pub tutor_id: Option<TutorId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ExportFilter {
    pub fn record_filter(
        &self,
        field: DateField,
        policy: &PayrollPolicy,
    ) -> Result<RecordFilter, PayrollError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(PayrollError::validation(
                    "'from' date must not be after 'to' date",
                ));
            }
        }

        let offset = policy.reference_offset();
        let out_of_range = |date: NaiveDate| {
            PayrollError::validation(format!("date {date} is out of range"))
        };
        let from = self
            .from
            .map(|date| start_of_day(date, offset).ok_or_else(|| out_of_range(date)))
            .transpose()?;
        let to = self
            .to
            .map(|date| end_of_day(date, offset).ok_or_else(|| out_of_range(date)))
            .transpose()?;

        let window = (from.is_some() || to.is_some()).then_some(DateWindow { field, from, to });
        Ok(RecordFilter {
            tutor_id: self.tutor_id.clone(),
            status: None,
            window,
        })
    }
}

/// Rendered export ready to be served as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub kind: ExportKind,
    pub filename: &'static str,
    pub rows: usize,
    pub csv: String,
}
