//! Simple profiling macros using thread-local storage
//!
//! Lightweight per-category timing without changing function signatures.
//! Enable with environment variable: SNAKE_PROFILE=1

use std::cell::RefCell;
use std::sync::OnceLock;
use std::time::Instant;

/// Categories tracked by the profiler, in report order
const CATEGORIES: [&str; 4] = ["flood_fill", "path_search", "scoring", "decide"];

#[derive(Debug, Default, Clone, Copy)]
struct Counter {
    time_ns: u64,
    count: usize,
}

thread_local! {
    static COUNTERS: RefCell<[Counter; 4]> = RefCell::new([Counter::default(); 4]);
}

#[inline]
pub fn is_profiling_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var("SNAKE_PROFILE").is_ok())
}

pub struct ProfileGuard {
    start: Instant,
    slot: usize,
}

impl ProfileGuard {
    pub fn new(category: &'static str) -> Option<Self> {
        if !is_profiling_enabled() {
            return None;
        }
        let slot = CATEGORIES.iter().position(|c| *c == category)?;
        Some(ProfileGuard {
            start: Instant::now(),
            slot,
        })
    }
}

impl Drop for ProfileGuard {
    fn drop(&mut self) {
        let elapsed_ns = self.start.elapsed().as_nanos() as u64;
        COUNTERS.with(|c| {
            let mut counters = c.borrow_mut();
            counters[self.slot].time_ns += elapsed_ns;
            counters[self.slot].count += 1;
        });
    }
}

pub fn print_report(turns: u32) {
    if !is_profiling_enabled() {
        return;
    }

    eprintln!("\n═══════════════════════════════════════════════════════════");
    eprintln!("                 PERFORMANCE PROFILE");
    eprintln!("═══════════════════════════════════════════════════════════");
    eprintln!("Turns: {}\n", turns);

    COUNTERS.with(|c| {
        for (name, counter) in CATEGORIES.iter().zip(c.borrow().iter()) {
            let ms = counter.time_ns as f64 / 1_000_000.0;
            let avg_us = if counter.count > 0 {
                counter.time_ns as f64 / (counter.count * 1000) as f64
            } else {
                0.0
            };
            eprintln!(
                "{:<12} {:>10.2}ms  {:>8} calls  {:>8.2}µs avg",
                name, ms, counter.count, avg_us
            );
        }
    });

    eprintln!("═══════════════════════════════════════════════════════════\n");
}

pub fn reset() {
    COUNTERS.with(|c| *c.borrow_mut() = [Counter::default(); 4]);
}

#[macro_export]
macro_rules! profile {
    ($category:expr, $code:block) => {{
        let _guard = $crate::simple_profiler::ProfileGuard::new($category);
        $code
    }};
}
