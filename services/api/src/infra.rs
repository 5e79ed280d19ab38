use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tutor_payroll::config::{ConfigError, PayrollPolicy};
use tutor_payroll::payroll::{MemoryActionLog, MemoryStore, PayrollService};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type InMemoryPayroll = PayrollService<MemoryStore, MemoryActionLog>;

pub(crate) fn in_memory_service(policy: PayrollPolicy) -> InMemoryPayroll {
    PayrollService::new(
        Arc::new(MemoryStore::default()),
        Arc::new(MemoryActionLog::default()),
        policy,
    )
}

/// Resolve an optional `--utc-offset-minutes` flag into a payroll policy.
pub(crate) fn policy_for_offset(minutes: Option<i32>) -> Result<PayrollPolicy, ConfigError> {
    match minutes {
        None => Ok(PayrollPolicy::default()),
        Some(minutes) => PayrollPolicy::with_offset_minutes(minutes).ok_or(
            ConfigError::InvalidReferenceOffset {
                value: minutes.to_string(),
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_flag_defaults_to_reference_zone() {
        let policy = policy_for_offset(None).expect("default policy");
        assert_eq!(policy.reference_offset().local_minus_utc(), 3600);

        let eastern = policy_for_offset(Some(-300)).expect("valid offset");
        assert_eq!(eastern.reference_offset().local_minus_utc(), -18_000);

        assert!(matches!(
            policy_for_offset(Some(5000)),
            Err(ConfigError::InvalidReferenceOffset { .. })
        ));
    }
}
