// src/utils/stopwatch.rs
use std::time::Duration;
use tokio::time::Instant;

/// Elapsed time since the last reset. Backed by tokio's clock so paused-time
/// tests see it advance together with `sleep`.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn reset(&mut self) {
        self.start = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_tracks_clock_and_resets() {
        let mut sw = Stopwatch::start();
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(sw.elapsed(), Duration::from_secs(30));

        sw.reset();
        assert_eq!(sw.elapsed(), Duration::ZERO);
    }
}
