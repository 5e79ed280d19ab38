use super::render::CsvRow;
use crate::payroll::domain::{StudentId, TutorId};

/// Hours are reported to two decimal places.
pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct TutorPayrollRow {
    pub tutor_id: TutorId,
    pub tutor: String,
    pub bank: String,
    pub account_number: String,
    pub hours: f64,
    pub total_payment: u64,
}

impl CsvRow for TutorPayrollRow {
    const HEADERS: &'static [&'static str] = &[
        "TutorID",
        "Tutor",
        "TutorBank",
        "TutorAccountNumber",
        "Hours",
        "TotalPaymentAmount",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.tutor_id.0.clone(),
            self.tutor.clone(),
            self.bank.clone(),
            self.account_number.clone(),
            format!("{:.2}", self.hours),
            self.total_payment.to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentHoursRow {
    pub student_id: StudentId,
    pub student: String,
    pub class_level: String,
    pub hours: f64,
}

impl CsvRow for StudentHoursRow {
    const HEADERS: &'static [&'static str] = &["StudentID", "Student", "Class", "Hours"];

    fn fields(&self) -> Vec<String> {
        vec![
            self.student_id.0.clone(),
            self.student.clone(),
            self.class_level.clone(),
            format!("{:.2}", self.hours),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPayrollRow {
    pub year: i32,
    pub month: u32,
    pub tutor_id: TutorId,
    pub tutor: String,
    pub hours: f64,
    pub total_payment: u64,
    pub records: usize,
}

impl CsvRow for MonthlyPayrollRow {
    const HEADERS: &'static [&'static str] = &[
        "Year",
        "Month",
        "TutorID",
        "Tutor",
        "Hours",
        "TotalPaymentAmount",
        "Records",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.year.to_string(),
            format!("{:02}", self.month),
            self.tutor_id.0.clone(),
            self.tutor.clone(),
            format!("{:.2}", self.hours),
            self.total_payment.to_string(),
            self.records.to_string(),
        ]
    }
}
