//! Failed-login tracking with lockout.
//!
//! Counts consecutive failures per client identifier inside a rolling
//! window; reaching the limit locks the client out for a cooldown. Any
//! successful login clears the record. The lockout check runs before
//! password verification, so a correct password during cooldown still
//! fails.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy)]
struct AttemptRecord {
    attempts: u32,
    window_started_at: i64,
    locked_until: i64,
}

pub struct LoginRateLimiter {
    max_attempts: u32,
    window_secs: i64,
    lockout_secs: i64,
    records: Mutex<HashMap<String, AttemptRecord>>,
}

impl LoginRateLimiter {
    pub fn new(max_attempts: u32, window_secs: i64, lockout_secs: i64) -> Self {
        Self {
            max_attempts,
            window_secs,
            lockout_secs,
            records: Mutex::new(HashMap::new()),
        }
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    /// Reject with `RateLimited` when the client is locked out; otherwise
    /// return the number of attempts remaining before lockout.
    pub fn check(&self, key: &str) -> Result<u32> {
        self.check_at(key, Self::now())
    }

    pub fn check_at(&self, key: &str, now: i64) -> Result<u32> {
        let mut records = self.records.lock().unwrap();
        let Some(record) = records.get_mut(key) else {
            return Ok(self.max_attempts);
        };

        if record.locked_until > now {
            return Err(AppError::RateLimited {
                retry_after_secs: record.locked_until - now,
            });
        }

        // Stale window: start counting fresh.
        if now - record.window_started_at > self.window_secs {
            record.attempts = 0;
            record.window_started_at = now;
        }

        Ok(self.max_attempts.saturating_sub(record.attempts))
    }

    pub fn record_failure(&self, key: &str) {
        self.record_failure_at(key, Self::now());
    }

    pub fn record_failure_at(&self, key: &str, now: i64) {
        let mut records = self.records.lock().unwrap();
        let record = records.entry(key.to_string()).or_insert(AttemptRecord {
            attempts: 0,
            window_started_at: now,
            locked_until: 0,
        });

        if now - record.window_started_at > self.window_secs {
            record.attempts = 0;
            record.window_started_at = now;
        }

        record.attempts += 1;
        if record.attempts >= self.max_attempts {
            record.locked_until = now + self.lockout_secs;
        }
    }

    pub fn record_success(&self, key: &str) {
        self.records.lock().unwrap().remove(key);
    }

    /// Drop records whose lockout and window have both passed. Run
    /// opportunistically on request handling.
    pub fn sweep(&self) {
        let now = Self::now();
        self.records.lock().unwrap().retain(|_, record| {
            record.locked_until > now || now - record.window_started_at <= self.window_secs
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locks_after_max_failures() {
        let limiter = LoginRateLimiter::new(3, 900, 1800);
        let t = 1_000_000;

        for i in 0..3 {
            assert!(limiter.check_at("1.2.3.4", t + i).is_ok());
            limiter.record_failure_at("1.2.3.4", t + i);
        }

        match limiter.check_at("1.2.3.4", t + 10) {
            Err(AppError::RateLimited { retry_after_secs }) => {
                assert!(retry_after_secs > 0 && retry_after_secs <= 1800);
            }
            other => panic!("expected lockout, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn lockout_persists_until_cooldown_elapses() {
        let limiter = LoginRateLimiter::new(2, 900, 1800);
        let t = 1_000_000;
        limiter.record_failure_at("ip", t);
        limiter.record_failure_at("ip", t + 1);

        // Still locked mid-cooldown even though the caller would now
        // present the right password.
        assert!(limiter.check_at("ip", t + 1000).is_err());
        // Cooldown elapsed.
        assert!(limiter.check_at("ip", t + 1 + 1801).is_ok());
    }

    #[test]
    fn success_clears_the_record() {
        let limiter = LoginRateLimiter::new(3, 900, 1800);
        let t = 1_000_000;
        limiter.record_failure_at("ip", t);
        limiter.record_failure_at("ip", t + 1);
        limiter.record_success("ip");

        assert_eq!(limiter.check_at("ip", t + 2).unwrap(), 3);
    }

    #[test]
    fn stale_window_resets_attempt_count() {
        let limiter = LoginRateLimiter::new(3, 900, 1800);
        let t = 1_000_000;
        limiter.record_failure_at("ip", t);
        limiter.record_failure_at("ip", t + 1);

        assert_eq!(limiter.check_at("ip", t + 902).unwrap(), 3);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = LoginRateLimiter::new(1, 900, 1800);
        let t = 1_000_000;
        limiter.record_failure_at("a", t);

        assert!(limiter.check_at("a", t + 1).is_err());
        assert!(limiter.check_at("b", t + 1).is_ok());
    }
}
