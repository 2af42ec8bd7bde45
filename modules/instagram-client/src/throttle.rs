use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Sliding-window request throttle, shared process-wide per fetcher type.
/// At most `max_requests` may start within any `window`; further callers
/// wait until the oldest start falls out of the window.
pub struct Throttle {
    max_requests: usize,
    window: Duration,
    starts: Mutex<VecDeque<Instant>>,
}

impl Throttle {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            starts: Mutex::new(VecDeque::new()),
        }
    }

    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut starts = self.starts.lock().await;
                let now = Instant::now();
                while let Some(front) = starts.front() {
                    if now.duration_since(*front) >= self.window {
                        starts.pop_front();
                    } else {
                        break;
                    }
                }
                if starts.len() < self.max_requests {
                    starts.push_back(now);
                    None
                } else {
                    let oldest = *starts.front().expect("window is full");
                    Some(self.window - now.duration_since(oldest))
                }
            };
            match wait {
                None => return,
                Some(delay) => tokio::time::sleep(delay).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn permits_within_window_are_immediate() {
        let throttle = Throttle::new(5, Duration::from_millis(200));
        let start = Instant::now();
        for _ in 0..5 {
            throttle.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn sixth_request_waits_for_the_window() {
        let throttle = Throttle::new(5, Duration::from_millis(100));
        let start = Instant::now();
        for _ in 0..6 {
            throttle.acquire().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
