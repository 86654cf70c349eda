//! Bounded blocking polls for asynchronous server work

use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::Error;

/// Timeout and interval for a blocking poll
#[derive(Debug, Clone, Copy)]
pub struct Poll {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Poll {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }
}

impl Default for Poll {
    fn default() -> Self {
        Self::new(Duration::from_secs(300), Duration::from_secs(1))
    }
}

/// Call `check` until it yields a value or the poll times out.
///
/// `check` runs at least once. Errors returned by `check` abort the wait
/// immediately.
pub fn wait_for<T, E, F>(what: &str, poll: Poll, mut check: F) -> Result<T, E>
where
    F: FnMut() -> Result<Option<T>, E>,
    E: From<Error>,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        if let Some(value) = check()? {
            debug!("{} ready after {} attempt(s)", what, attempts);
            return Ok(value);
        }

        if start.elapsed() + poll.interval > poll.timeout {
            return Err(Error::Timeout {
                what: what.to_string(),
                seconds: poll.timeout.as_secs(),
            }
            .into());
        }

        std::thread::sleep(poll.interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast(timeout_ms: u64) -> Poll {
        Poll::new(Duration::from_millis(timeout_ms), Duration::from_millis(1))
    }

    #[test]
    fn test_returns_first_ready_value() {
        let mut calls = 0;
        let value: Result<u32, Error> = wait_for("counter", fast(1000), || {
            calls += 1;
            Ok((calls == 3).then_some(calls))
        });
        assert_eq!(value.unwrap(), 3);
    }

    #[test]
    fn test_times_out() {
        let result: Result<(), Error> = wait_for("never", fast(5), || Ok(None));
        let err = result.unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("never"));
    }

    #[test]
    fn test_check_error_aborts() {
        let mut calls = 0;
        let result: Result<(), Error> = wait_for("broken", fast(1000), || {
            calls += 1;
            Err(Error::InvalidRequest("boom".to_string()))
        });
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
        assert_eq!(calls, 1);
    }
}
