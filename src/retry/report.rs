//! Attempt and execution results

use serde::Serialize;
use std::time::Duration;

use super::policy::AttemptOutcome;

/// Outcome of one execution attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptResult {
    /// 1-indexed attempt number
    pub attempt: u32,
    pub exit_code: i32,
    #[serde(serialize_with = "serialize_secs")]
    pub duration: Duration,
    pub timed_out: bool,
    pub outcome: AttemptOutcome,
}

/// Aggregate result across all attempts of one `execute` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionReport {
    pub success: bool,
    /// Attempts actually executed, never more than the policy's maximum
    pub attempts: u32,
    pub final_exit_code: i32,
    /// Wall-clock time of every attempt plus the sleeps between them
    pub total_duration_seconds: f64,
    /// Time spent sleeping between attempts
    pub total_delay_seconds: f64,
    pub attempt_results: Vec<AttemptResult>,
}

impl ExecutionReport {
    pub(crate) fn from_attempts(
        attempt_results: Vec<AttemptResult>,
        total_duration: Duration,
        total_delay: Duration,
    ) -> Self {
        let (success, final_exit_code) = attempt_results
            .last()
            .map(|last| (last.outcome == AttemptOutcome::Success, last.exit_code))
            .unwrap_or((false, 1));

        Self {
            success,
            attempts: attempt_results.len() as u32,
            final_exit_code,
            total_duration_seconds: total_duration.as_secs_f64(),
            total_delay_seconds: total_delay.as_secs_f64(),
            attempt_results,
        }
    }

    /// Exit code the wrapping step should terminate with
    ///
    /// A failed run never exits 0, even when 0 was not a success code.
    pub fn exit_code(&self) -> i32 {
        match (self.success, self.final_exit_code) {
            (true, _) => 0,
            (false, 0) => 1,
            (false, code) => code,
        }
    }

    /// Step outputs as `(key, value)` pairs
    pub fn outputs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("success", self.success.to_string()),
            ("attempts", self.attempts.to_string()),
            ("exit-code", self.final_exit_code.to_string()),
            ("duration", format!("{:.3}", self.total_duration_seconds)),
        ]
    }
}

fn serialize_secs<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(n: u32, code: i32, outcome: AttemptOutcome) -> AttemptResult {
        AttemptResult {
            attempt: n,
            exit_code: code,
            duration: Duration::from_millis(250),
            timed_out: false,
            outcome,
        }
    }

    #[test]
    fn test_report_from_failed_attempts() {
        let report = ExecutionReport::from_attempts(
            vec![
                attempt(1, 1, AttemptOutcome::Retryable),
                attempt(2, 1, AttemptOutcome::Retryable),
            ],
            Duration::from_secs(6),
            Duration::from_secs(5),
        );

        assert!(!report.success);
        assert_eq!(report.attempts, 2);
        assert_eq!(report.final_exit_code, 1);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.total_duration_seconds, 6.0);
    }

    #[test]
    fn test_report_success_exit_code_is_zero() {
        let report = ExecutionReport::from_attempts(
            vec![attempt(1, 0, AttemptOutcome::Success)],
            Duration::from_secs(1),
            Duration::ZERO,
        );
        assert!(report.success);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_failure_never_exits_zero() {
        let report = ExecutionReport::from_attempts(
            vec![attempt(1, 0, AttemptOutcome::Fatal)],
            Duration::from_secs(1),
            Duration::ZERO,
        );
        assert!(!report.success);
        assert_eq!(report.final_exit_code, 0);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_outputs() {
        let report = ExecutionReport::from_attempts(
            vec![attempt(1, 0, AttemptOutcome::Success)],
            Duration::from_millis(1500),
            Duration::ZERO,
        );
        let outputs = report.outputs();
        assert!(outputs.contains(&("success", "true".to_string())));
        assert!(outputs.contains(&("attempts", "1".to_string())));
        assert!(outputs.contains(&("exit-code", "0".to_string())));
        assert!(outputs.contains(&("duration", "1.500".to_string())));
    }

    #[test]
    fn test_serializes_to_json() {
        let report = ExecutionReport::from_attempts(
            vec![attempt(1, 3, AttemptOutcome::Fatal)],
            Duration::from_secs(1),
            Duration::ZERO,
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["attempt_results"][0]["outcome"], "fatal");
        assert_eq!(json["attempt_results"][0]["duration"], 0.25);
    }
}
