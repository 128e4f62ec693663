//! A 60-second sliding-window request counter: blocks callers once the
//! configured requests-per-minute budget is exceeded.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct RpmLimiter {
    requests_per_minute: u32,
    window: Mutex<VecDeque<Instant>>,
}

impl RpmLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            window: Mutex::new(VecDeque::new()),
        }
    }

    /// Record one request, blocking the caller (via sleep) until the
    /// 60-second window has room. Returns the duration slept, if any.
    pub fn acquire(&self) -> Duration {
        if self.requests_per_minute == 0 {
            return Duration::ZERO;
        }
        let mut slept = Duration::ZERO;
        loop {
            let now = Instant::now();
            let mut window = self.window.lock().unwrap();
            while window.front().is_some_and(|t| now.duration_since(*t) >= Duration::from_secs(60)) {
                window.pop_front();
            }
            if window.len() < self.requests_per_minute as usize {
                window.push_back(now);
                return slept;
            }
            let wait = Duration::from_secs(60) - now.duration_since(*window.front().unwrap());
            drop(window);
            std::thread::sleep(wait);
            slept += wait;
        }
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_requests_under_the_limit_without_blocking() {
        let limiter = RpmLimiter::new(100);
        for _ in 0..10 {
            assert_eq!(limiter.acquire(), Duration::ZERO);
        }
    }

    #[test]
    fn zero_rpm_never_blocks() {
        let limiter = RpmLimiter::new(0);
        for _ in 0..1000 {
            assert_eq!(limiter.acquire(), Duration::ZERO);
        }
    }
}
