use std::collections::HashMap;

use chrono::Datelike;

use super::views::{round_hours, MonthlyPayrollRow, StudentHoursRow, TutorPayrollRow};
use crate::config::PayrollPolicy;
use crate::payroll::domain::{StudentId, TutorId};
use crate::payroll::repository::HydratedRecord;

/// Groups hydrated records into payroll rows.
///
/// Records whose tutor (or, for the student summary, student) no longer
/// resolves are left out of the corresponding grouping.
#[derive(Debug, Clone, Default)]
pub struct ReportAggregator {
    policy: PayrollPolicy,
}

impl ReportAggregator {
    pub fn new(policy: PayrollPolicy) -> Self {
        Self { policy }
    }

    /// One row per tutor, ordered by tutor name.
    pub fn by_tutor(&self, records: &[HydratedRecord]) -> Vec<TutorPayrollRow> {
        let mut grouped: HashMap<TutorId, TutorPayrollRow> = HashMap::new();
        for hydrated in records {
            let Some(tutor) = &hydrated.tutor else {
                continue;
            };
            let row = grouped
                .entry(tutor.id.clone())
                .or_insert_with(|| TutorPayrollRow {
                    tutor_id: tutor.id.clone(),
                    tutor: tutor.name.clone(),
                    bank: tutor.bank.clone(),
                    account_number: tutor.account_number.clone(),
                    hours: 0.0,
                    total_payment: 0,
                });
            row.total_payment += hydrated.record.payment_amount;
            row.hours += hydrated.record.billable_hours();
        }

        let mut rows: Vec<TutorPayrollRow> = grouped
            .into_values()
            .map(|row| TutorPayrollRow {
                hours: round_hours(row.hours),
                ..row
            })
            .collect();
        rows.sort_by(|left, right| {
            left.tutor
                .cmp(&right.tutor)
                .then_with(|| left.tutor_id.cmp(&right.tutor_id))
        });
        rows
    }

    /// One row per student, ordered by student name. The class column is the
    /// level recorded on the first record seen for that student.
    pub fn by_student(&self, records: &[HydratedRecord]) -> Vec<StudentHoursRow> {
        let mut grouped: HashMap<StudentId, StudentHoursRow> = HashMap::new();
        for hydrated in records {
            let Some(student) = &hydrated.student else {
                continue;
            };
            let row = grouped
                .entry(student.id.clone())
                .or_insert_with(|| StudentHoursRow {
                    student_id: student.id.clone(),
                    student: student.name.clone(),
                    class_level: hydrated.record.class_level.clone(),
                    hours: 0.0,
                });
            row.hours += hydrated.record.billable_hours();
        }

        let mut rows: Vec<StudentHoursRow> = grouped
            .into_values()
            .map(|row| StudentHoursRow {
                hours: round_hours(row.hours),
                ..row
            })
            .collect();
        rows.sort_by(|left, right| {
            left.student
                .cmp(&right.student)
                .then_with(|| left.student_id.cmp(&right.student_id))
        });
        rows
    }

    /// Rows keyed by tutor and the lesson's calendar month in the reference
    /// timezone, ordered by year, month, then tutor name.
    pub fn by_tutor_by_month(&self, records: &[HydratedRecord]) -> Vec<MonthlyPayrollRow> {
        let offset = self.policy.reference_offset();
        let mut grouped: HashMap<(i32, u32, TutorId), MonthlyPayrollRow> = HashMap::new();
        for hydrated in records {
            let Some(tutor) = &hydrated.tutor else {
                continue;
            };
            let lesson = hydrated.record.start_time.with_timezone(&offset);
            let key = (lesson.year(), lesson.month(), tutor.id.clone());
            let row = grouped.entry(key).or_insert_with(|| MonthlyPayrollRow {
                year: lesson.year(),
                month: lesson.month(),
                tutor_id: tutor.id.clone(),
                tutor: tutor.name.clone(),
                hours: 0.0,
                total_payment: 0,
                records: 0,
            });
            row.hours += hydrated.record.billable_hours();
            row.total_payment += hydrated.record.payment_amount;
            row.records += 1;
        }

        let mut rows: Vec<MonthlyPayrollRow> = grouped
            .into_values()
            .map(|row| MonthlyPayrollRow {
                hours: round_hours(row.hours),
                ..row
            })
            .collect();
        rows.sort_by(|left, right| {
            (left.year, left.month, &left.tutor, &left.tutor_id).cmp(&(
                right.year,
                right.month,
                &right.tutor,
                &right.tutor_id,
            ))
        });
        rows
    }
}
