//! Stress tests for concurrent dispatch
//!
//! These tests verify:
//! - No entries are lost when many threads log at once
//! - Backends can be added while other threads are logging
//! - Scoped context stays per-thread under contention
//! - A panicking backend does not poison the dispatcher

use rust_dispatch_logger::backends::Backend;
use rust_dispatch_logger::prelude::*;
use rust_dispatch_logger::sinks::MemorySink;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const THREADS: usize = 8;
const PER_THREAD: usize = 250;

/// Every message from every thread arrives exactly once
#[test]
fn test_concurrent_logging_loses_nothing() {
    let sink = MemorySink::new();
    let logger = Arc::new(
        Dispatcher::builder("stress")
            .level(LogLevel::Debug)
            .sink(sink.clone())
            .build()
            .expect("Failed to build dispatcher"),
    );

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.debug(format!("{}-{}", t, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("logging thread panicked");
    }

    let lines = sink.lines();
    assert_eq!(lines.len(), THREADS * PER_THREAD);
    let unique: HashSet<_> = lines.iter().collect();
    assert_eq!(unique.len(), THREADS * PER_THREAD);
    assert_eq!(logger.metrics().dispatched(), (THREADS * PER_THREAD) as u64);
}

/// Per-thread order is preserved within one backend
#[test]
fn test_per_thread_order_preserved() {
    let sink = MemorySink::new();
    let logger = Arc::new(
        Dispatcher::builder("stress")
            .template("%<worker>s %<message>s")
            .sink(sink.clone())
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.info_with(i.to_string(), payload! { "worker" => t });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for t in 0..4 {
        let prefix = format!("{} ", t);
        let seen: Vec<usize> = sink
            .lines()
            .iter()
            .filter_map(|line| line.strip_prefix(&prefix))
            .map(|n| n.parse().unwrap())
            .collect();
        assert_eq!(seen, (0..PER_THREAD).collect::<Vec<_>>());
    }
}

/// Adding backends while logging never drops entries for existing backends
#[test]
fn test_add_backend_while_logging() {
    let first = MemorySink::new();
    let logger = Arc::new(Dispatcher::builder("stress").sink(first.clone()).build().unwrap());

    let writers: Vec<_> = (0..4)
        .map(|_| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.info(format!("message {}", i));
                }
            })
        })
        .collect();

    let late = MemorySink::new();
    let adder = {
        let logger = Arc::clone(&logger);
        let late = late.clone();
        thread::spawn(move || {
            for _ in 0..10 {
                logger
                    .add_backend(BackendOptions::new().sink(late.clone()))
                    .expect("Failed to add backend");
            }
        })
    };

    for handle in writers {
        handle.join().unwrap();
    }
    adder.join().unwrap();

    assert_eq!(logger.backends_len(), 11);
    assert_eq!(first.len(), 4 * PER_THREAD);
    assert!(late.len() <= 10 * 4 * PER_THREAD);
}

/// Tags pushed on one thread never show up on another
#[test]
fn test_scoped_tags_under_contention() {
    let sink = MemorySink::new();
    let logger = Arc::new(
        Dispatcher::builder("stress")
            .template("%<tags>s|%<message>s")
            .sink(sink.clone())
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                let tag = format!("t{}", t);
                for i in 0..50 {
                    logger.tagged([tag.as_str()], || logger.info(format!("{}", t)));
                    if i % 2 == 0 {
                        logger.info(format!("{}", t));
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for line in sink.lines() {
        let (tags, thread_id) = line.split_once('|').expect("separator");
        assert!(tags.is_empty() || tags == format!("t{}", thread_id));
    }
}

struct Flaky {
    calls: Arc<AtomicUsize>,
}

impl Backend for Flaky {
    fn log(&mut self, _level: LogLevel, _entry: &Entry) -> Result<()> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n % 3 == 0 {
            panic!("flaky backend failed on call {}", n);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "flaky"
    }

    fn level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

/// Panics in one backend are counted and never stop the others
#[test]
fn test_panicking_backend_under_load() {
    let sink = MemorySink::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let crashes = Arc::new(AtomicUsize::new(0));
    let crash_count = Arc::clone(&crashes);

    let logger = Arc::new(
        Dispatcher::builder("stress")
            .backend(Flaky { calls: Arc::clone(&calls) })
            .on_crash(move |_| {
                crash_count.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap(),
    );
    logger.add_backend(BackendOptions::new().sink(sink.clone())).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for _ in 0..99 {
                    assert!(logger.warn("load"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(sink.len(), 4 * 99);
    assert_eq!(calls.load(Ordering::SeqCst), 4 * 99);
    assert_eq!(crashes.load(Ordering::SeqCst), 4 * 33);
    assert_eq!(logger.metrics().backend_failures(), 4 * 33);
}

/// Many threads appending to one file produce whole lines only
#[test]
fn test_concurrent_file_writes() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("stress.log");

    let logger = Arc::new(
        Dispatcher::builder("stress")
            .sink(SinkSpec::path(&log_file))
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..100 {
                    logger.info(format!("thread={} seq={}", t, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    logger.close();

    let content = std::fs::read_to_string(&log_file).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), THREADS * 100);
    assert!(lines.iter().all(|line| line.starts_with("thread=")));
}
