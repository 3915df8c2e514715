//! Completion time estimation

use chrono::{DateTime, Duration, Utc};

/// Estimate time remaining from the average pace so far. Returns None
/// until at least one task has finished, and for finished work.
pub fn estimate_remaining(
    started_at: DateTime<Utc>,
    total: usize,
    completed: usize,
    now: DateTime<Utc>,
) -> Option<Duration> {
    if completed == 0 || total == 0 || completed >= total {
        return None;
    }

    let elapsed = now.signed_duration_since(started_at);
    if elapsed <= Duration::zero() {
        return None;
    }

    let per_task_ms = elapsed.num_milliseconds() as f64 / completed as f64;
    let remaining_ms = per_task_ms * (total - completed) as f64;
    Some(Duration::milliseconds(remaining_ms as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_estimate_before_first_completion() {
        let start = Utc::now();
        assert!(estimate_remaining(start, 4, 0, start + Duration::seconds(10)).is_none());
    }

    #[test]
    fn no_estimate_when_done() {
        let start = Utc::now();
        assert!(estimate_remaining(start, 4, 4, start + Duration::seconds(10)).is_none());
    }

    #[test]
    fn estimate_scales_with_remaining_work() {
        let start = Utc::now();
        // 2 of 4 tasks in 10 seconds, so 2 remain at 5s each
        let eta = estimate_remaining(start, 4, 2, start + Duration::seconds(10)).unwrap();
        assert_eq!(eta.num_seconds(), 10);

        // 3 of 4 in 9 seconds, 1 remains at 3s
        let eta = estimate_remaining(start, 4, 3, start + Duration::seconds(9)).unwrap();
        assert_eq!(eta.num_seconds(), 3);
    }

    #[test]
    fn clock_skew_yields_no_estimate() {
        let start = Utc::now();
        assert!(estimate_remaining(start, 4, 2, start - Duration::seconds(5)).is_none());
    }
}
