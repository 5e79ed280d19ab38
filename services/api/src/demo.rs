use crate::infra::{in_memory_service, policy_for_offset, InMemoryPayroll};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::{Args, ValueEnum};
use tutor_payroll::config::PayrollPolicy;
use tutor_payroll::error::AppError;
use tutor_payroll::payroll::calendar::{local_date, parse_date, parse_instant, start_of_day};
use tutor_payroll::payroll::report::format_currency;
use tutor_payroll::payroll::{
    quote_payment, ApprovalDecision, ClassLevel, ExportFilter, ExportKind, LateApprovalRequest,
    PayrollError, RateTier, RecordSubmission, Student, StudentRegistration, Tutor,
    TutorRegistration,
};

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// Class level, e.g. "Nursery" or "Year 9"
    #[arg(long)]
    pub(crate) class_level: String,
    /// Lesson start (RFC 3339, or YYYY-MM-DDTHH:MM in the reference timezone)
    #[arg(long)]
    pub(crate) start: String,
    /// Lesson end, same formats as --start
    #[arg(long)]
    pub(crate) end: String,
    /// Reference timezone offset from UTC in minutes (defaults to +60)
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) utc_offset_minutes: Option<i32>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Lesson day for the walkthrough (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Print only one export instead of all three.
    #[arg(long, value_enum)]
    pub(crate) export: Option<ExportChoice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ExportChoice {
    Tutor,
    Student,
    Monthly,
}

impl From<ExportChoice> for ExportKind {
    fn from(value: ExportChoice) -> Self {
        match value {
            ExportChoice::Tutor => ExportKind::ByTutor,
            ExportChoice::Student => ExportKind::ByStudent,
            ExportChoice::Monthly => ExportKind::ByTutorByMonth,
        }
    }
}

pub(crate) fn run_rates() {
    println!("Hourly tutoring rates");
    for tier in RateTier::ordered() {
        let levels: Vec<String> = ClassLevel::ordered()
            .into_iter()
            .filter(|level| level.tier() == tier)
            .map(|level| level.to_string())
            .collect();
        println!(
            "  {:<18} {:>8}/hour  ({} levels)",
            tier.label(),
            format_currency(u64::from(tier.hourly_rate())),
            levels.len()
        );
    }
}

pub(crate) fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let policy = policy_for_offset(args.utc_offset_minutes)?;
    let offset = policy.reference_offset();

    if ClassLevel::parse(&args.class_level).is_none() {
        return Err(PayrollError::validation(format!(
            "Unknown class level '{}'",
            args.class_level
        ))
        .into());
    }
    let (Some(start), Some(end)) = (
        parse_instant(&args.start, offset),
        parse_instant(&args.end, offset),
    ) else {
        return Err(PayrollError::validation("Invalid start or end time").into());
    };

    let amount = quote_payment(&args.class_level, &args.start, &args.end, offset);
    let minutes = (end - start).num_minutes().max(0);
    println!(
        "{} lesson of {} minutes pays {}",
        args.class_level.trim(),
        minutes,
        format_currency(amount)
    );
    Ok(())
}

struct Roster {
    tutors: Vec<Tutor>,
    students: Vec<Student>,
}

fn register_roster(service: &InMemoryPayroll, now: DateTime<Utc>) -> Result<Roster, PayrollError> {
    let tutors = [
        ("Adaeze Okafor", "0123456789", "Zenith Bank", &["Mathematics", "Physics"][..]),
        ("Tunde Bakare", "9876543210", "GTBank", &["English", "Literature"][..]),
    ]
    .into_iter()
    .map(|(name, account, bank, subjects)| {
        service.register_tutor(
            TutorRegistration {
                name: Some(name.to_string()),
                account_number: Some(account.to_string()),
                bank: Some(bank.to_string()),
                subjects: subjects.iter().map(|subject| subject.to_string()).collect(),
            },
            now,
        )
    })
    .collect::<Result<Vec<_>, _>>()?;

    let students = [
        ("Kemi Adeyemi", "Year 4"),
        ("Ifeanyi Eze", "Year 9"),
        ("Zainab Musa", "Year 12"),
    ]
    .into_iter()
    .map(|(name, class_level)| {
        service.register_student(
            StudentRegistration {
                name: Some(name.to_string()),
                class_level: Some(class_level.to_string()),
                enrolled_subjects: Vec::new(),
            },
            now,
        )
    })
    .collect::<Result<Vec<_>, _>>()?;

    Ok(Roster { tutors, students })
}

fn lesson(
    tutor: &Tutor,
    student: &Student,
    subject: &str,
    start: DateTime<Utc>,
    minutes: i64,
) -> RecordSubmission {
    RecordSubmission {
        tutor_id: Some(tutor.id.0.clone()),
        student_id: Some(student.id.0.clone()),
        class_level: Some(student.class_level.clone()),
        subject: Some(subject.to_string()),
        topic: Some(format!("{subject} practice")),
        start_time: Some(start.to_rfc3339()),
        end_time: Some((start + Duration::minutes(minutes)).to_rfc3339()),
        ..RecordSubmission::default()
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let policy = PayrollPolicy::default();
    let offset = policy.reference_offset();
    let day = args
        .date
        .unwrap_or_else(|| local_date(Utc::now(), offset));
    let midnight = start_of_day(day, offset)
        .ok_or_else(|| PayrollError::validation(format!("date {day} is out of range")))?;
    let at = |hours: i64| midnight + Duration::hours(hours);

    let service = in_memory_service(policy);
    let roster = register_roster(&service, at(7))?;
    let (ada, tunde) = (&roster.tutors[0], &roster.tutors[1]);
    let (kemi, ifeanyi, zainab) = (&roster.students[0], &roster.students[1], &roster.students[2]);

    println!("Tutor payroll demo for {day} (UTC{offset})");

    let same_day = [
        lesson(ada, zainab, "Physics", at(9), 90),
        lesson(ada, ifeanyi, "Mathematics", at(11), 60),
        lesson(tunde, kemi, "English", at(15), 30),
    ];
    for submission in same_day {
        let record = service.submit_record(submission, at(20))?;
        println!(
            "  recorded {} {} with {}: {}",
            record.id,
            record.subject,
            record.class_level,
            format_currency(record.payment_amount)
        );
    }

    match service.submit_record(lesson(ada, zainab, "Physics", at(10), 60), at(20)) {
        Err(err) => println!("  overlapping lesson refused: {err}"),
        Ok(record) => println!("  unexpected overlap accepted as {}", record.id),
    }

    let late = RecordSubmission {
        reason: Some("Tutor was offline after the lesson".to_string()),
        ..lesson(tunde, ifeanyi, "Literature", at(16) - Duration::days(1), 120)
    };
    let pending = service.submit_late_record(late, at(20))?;
    println!(
        "  late record {} is {}",
        pending.id,
        pending.status.label()
    );
    let approved = service.decide_approval(
        &pending.id,
        ApprovalDecision {
            approved: true,
            admin_id: Some("admin-demo".to_string()),
        },
        at(21),
    )?;
    println!("  admin decision: {}", approved.status.label());

    let overridden = service.late_approve(
        &approved.id,
        LateApprovalRequest {
            admin_name: Some("Payroll Desk".to_string()),
            notes: Some("Confirmed with parent".to_string()),
        },
        at(22),
    )?;
    println!(
        "  override applied: {} ({} admin action logged)",
        overridden.status.label(),
        service.action_log()?.len()
    );

    let kinds = match args.export {
        Some(choice) => vec![ExportKind::from(choice)],
        None => vec![
            ExportKind::ByTutor,
            ExportKind::ByStudent,
            ExportKind::ByTutorByMonth,
        ],
    };
    for kind in kinds {
        let document = service.export(kind, &ExportFilter::default())?;
        println!("\n{} ({} rows)", document.filename, document.rows);
        println!("{}", document.csv);
    }

    Ok(())
}
