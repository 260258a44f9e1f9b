//! Retry with exponential backoff for segment processing

use std::time::Duration;

use indicatif::ProgressBar;

use crate::error::SegmentError;

/// Maximum retry attempts for transient failures
pub const MAX_RETRIES: u32 = 3;

/// Exponential backoff: 2^attempt seconds (2s, 4s, 8s, ...)
pub const fn backoff_duration(attempt: u32) -> Duration {
    Duration::from_secs(2u64.pow(attempt))
}

/// Retry a fallible segment operation with exponential backoff.
///
/// On retryable errors, logs the failure, updates the progress bar, sleeps,
/// and retries up to [`MAX_RETRIES`].
///
/// Returns `Ok(T)` on first success, or the final `Err` on exhaustion /
/// non-retryable error.
pub fn retry_with_backoff<T>(
    segment_label: &str,
    pb: &ProgressBar,
    mut attempt_fn: impl FnMut() -> Result<T, SegmentError>,
) -> Result<T, SegmentError> {
    let mut attempt = 0u32;
    loop {
        match attempt_fn() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < MAX_RETRIES && e.is_retryable() => {
                attempt += 1;
                pb.set_message(format!("retry {attempt}/{MAX_RETRIES}..."));
                log::debug!(
                    "{segment_label}: attempt {attempt}/{MAX_RETRIES} failed: {e}, retrying..."
                );
                std::thread::sleep(backoff_duration(attempt));
            }
            Err(e) => {
                log::error!("{segment_label}: failed permanently: {e}");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_exponential() {
        assert_eq!(backoff_duration(1), Duration::from_secs(2));
        assert_eq!(backoff_duration(2), Duration::from_secs(4));
        assert_eq!(backoff_duration(3), Duration::from_secs(8));
    }

    #[test]
    fn first_success_returns() {
        let pb = ProgressBar::hidden();
        let result = retry_with_backoff("seg", &pb, || Ok::<_, SegmentError>(7));
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn non_retryable_fails_immediately() {
        let pb = ProgressBar::hidden();
        let mut calls = 0;
        let result: Result<(), _> = retry_with_backoff("seg", &pb, || {
            calls += 1;
            Err(SegmentError::Archive("broken".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
