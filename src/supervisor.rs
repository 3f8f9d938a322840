//! # Stream Supervisor
//! IDLE → RUNNING gate for the generator pair, plus the tick loop driver.
//!
//! The gate flips once per process (compare-and-swap), so concurrent start
//! signals launch at most one pair of loops. Loops never stop; each tick is
//! isolated so an error or panic in one tick only costs that tick.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::FutureExt;
use metrics::counter;
use tokio::task::JoinHandle;
use tracing::{error, warn};

#[derive(Debug, Default)]
pub struct StreamSupervisor {
    running: AtomicBool,
}

impl StreamSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// `true` for exactly one caller: the one that performed the transition.
    pub fn try_start(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Spawn an endless `tick → sleep(interval)` loop on the runtime.
pub fn spawn_ticker<F, Fut>(stream: &'static str, interval: Duration, tick: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match AssertUnwindSafe(tick()).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    counter!("stream_tick_failures_total", "stream" => stream).increment(1);
                    warn!(target: "streams", stream, error = %e, "tick failed");
                }
                Err(panic) => {
                    counter!("stream_tick_failures_total", "stream" => stream).increment(1);
                    error!(target: "streams", stream, panic = %panic_message(panic.as_ref()), "tick panicked, loop continues");
                }
            }
            tokio::time::sleep(interval).await;
        }
    })
}

fn panic_message(p: &(dyn Any + Send)) -> String {
    if let Some(s) = p.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = p.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn only_first_start_wins() {
        let s = StreamSupervisor::new();
        assert!(!s.is_running());
        assert!(s.try_start());
        assert!(!s.try_start());
        assert!(s.is_running());
    }

    #[test]
    fn concurrent_starts_have_one_winner() {
        let s = Arc::new(StreamSupervisor::new());
        let wins = Arc::new(AtomicUsize::new(0));
        let threads: Vec<_> = (0..16)
            .map(|_| {
                let (s, wins) = (s.clone(), wins.clone());
                std::thread::spawn(move || {
                    if s.try_start() {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(wins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_and_panicking_ticks_do_not_stop_the_loop() {
        let n = Arc::new(AtomicUsize::new(0));
        let seen = n.clone();
        let handle = spawn_ticker("test", Duration::from_millis(10), move || {
            let n = seen.clone();
            async move {
                let i = n.fetch_add(1, Ordering::SeqCst);
                match i % 3 {
                    0 => Ok(()),
                    1 => Err(anyhow::anyhow!("tick {i} failed")),
                    _ => panic!("tick {i} exploded"),
                }
            }
        });

        tokio::time::sleep(Duration::from_millis(205)).await;
        assert!(!handle.is_finished());
        assert!(n.load(Ordering::SeqCst) >= 20, "ticks: {}", n.load(Ordering::SeqCst));
        handle.abort();
    }
}
