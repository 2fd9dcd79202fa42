//! Fixed-window per-client rate limiting.
//!
//! State is process-local: it starts empty when the process starts and
//! each instance of a horizontally scaled deployment counts on its own.
//! The limiter is abuse mitigation, not a correctness guarantee.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Map size above which expired windows are swept on insert. Sweeps run
/// at most once per window.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

#[derive(Debug)]
struct Clients {
    windows: HashMap<IpAddr, Window>,
    last_prune: Option<Instant>,
}

/// Per-client fixed-window counter.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max: u32,
    clients: Mutex<Clients>,
}

impl RateLimiter {
    pub fn new(window: Duration, max: u32) -> Self {
        Self {
            window,
            max,
            clients: Mutex::new(Clients {
                windows: HashMap::new(),
                last_prune: None,
            }),
        }
    }

    /// Record a request from `client` and report whether it is allowed.
    /// Requests without a client key are always allowed.
    pub fn check(&self, client: Option<IpAddr>) -> bool {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: Option<IpAddr>, now: Instant) -> bool {
        let Some(client) = client else {
            return true;
        };

        let mut clients = self.clients.lock();
        if let Some(entry) = clients.windows.get_mut(&client)
            && now < entry.reset_at
        {
            if entry.count >= self.max {
                return false;
            }
            entry.count += 1;
            return true;
        }

        if clients.windows.len() >= PRUNE_THRESHOLD
            && clients
                .last_prune
                .is_none_or(|at| now >= at + self.window)
        {
            clients.windows.retain(|_, w| now < w.reset_at);
            clients.last_prune = Some(now);
        }
        clients.windows.insert(
            client,
            Window {
                count: 1,
                reset_at: now + self.window,
            },
        );
        true
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.clients.lock().windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> Option<IpAddr> {
        Some(IpAddr::from([203, 0, 113, last]))
    }

    #[test]
    fn ninth_request_in_window_is_denied() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 8);
        let start = Instant::now();

        for i in 0..8 {
            assert!(limiter.check_at(ip(1), start + Duration::from_secs(i)));
        }
        assert!(!limiter.check_at(ip(1), start + Duration::from_secs(9)));
    }

    #[test]
    fn window_elapse_resets_count() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 8);
        let start = Instant::now();

        for _ in 0..9 {
            limiter.check_at(ip(1), start);
        }
        assert!(!limiter.check_at(ip(1), start + Duration::from_secs(59)));
        assert!(limiter.check_at(ip(1), start + Duration::from_secs(60)));
    }

    #[test]
    fn clients_are_counted_independently() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        let now = Instant::now();

        assert!(limiter.check_at(ip(1), now));
        assert!(!limiter.check_at(ip(1), now));
        assert!(limiter.check_at(ip(2), now));
    }

    #[test]
    fn missing_client_fails_open() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 0);
        for _ in 0..100 {
            assert!(limiter.check(None));
        }
        assert_eq!(limiter.tracked_clients(), 0);
    }

    fn fill(limiter: &RateLimiter, from: u32, count: u32, at: Instant) {
        for n in from..from + count {
            assert!(limiter.check_at(Some(IpAddr::from(n.to_be_bytes())), at));
        }
    }

    #[test]
    fn expired_windows_are_swept_at_most_once_per_window() {
        let window = Duration::from_secs(60);
        let limiter = RateLimiter::new(window, 8);
        let t0 = Instant::now();

        fill(&limiter, 0, 5_000, t0);
        fill(&limiter, 5_000, 5_000, t0 + Duration::from_secs(30));

        // First sweep drops the batch that expired at t0 + 60.
        assert!(limiter.check_at(ip(1), t0 + Duration::from_secs(61)));
        assert_eq!(limiter.tracked_clients(), 5_001);

        fill(&limiter, 10_000, 4_999, t0 + Duration::from_secs(61));
        assert_eq!(limiter.tracked_clients(), 10_000);

        // The t0 + 30 batch has expired, but the last sweep is too recent.
        assert!(limiter.check_at(ip(2), t0 + Duration::from_secs(95)));
        assert_eq!(limiter.tracked_clients(), 10_001);

        assert!(limiter.check_at(ip(3), t0 + Duration::from_secs(122)));
        assert_eq!(limiter.tracked_clients(), 2);
    }
}
