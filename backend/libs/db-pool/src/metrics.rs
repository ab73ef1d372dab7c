//! Prometheus metrics for database client setup
//!
//! Tracks connection attempts and how long they take to be verified

use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};
use std::time::Instant;

lazy_static::lazy_static! {
    /// Connection attempts by outcome
    static ref DB_CONNECT_ATTEMPTS: IntCounterVec = register_int_counter_vec!(
        "db_client_connect_attempts_total",
        "Database client connection attempts",
        &["service", "outcome"]
    ).expect("Prometheus metrics registration should succeed at startup");

    /// Time from option parsing to a verified ping
    static ref DB_CONNECT_DURATION: HistogramVec = register_histogram_vec!(
        "db_client_connect_duration_seconds",
        "Time to create and verify a database client",
        &["service"],
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).expect("Prometheus metrics registration should succeed at startup");
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum ConnectOutcome {
    Success,
    Error,
    Timeout,
}

impl ConnectOutcome {
    fn as_str(self) -> &'static str {
        match self {
            ConnectOutcome::Success => "success",
            ConnectOutcome::Error => "error",
            ConnectOutcome::Timeout => "timeout",
        }
    }
}

pub(crate) fn record_connect_attempt(service: &str, outcome: ConnectOutcome, started: Instant) {
    DB_CONNECT_ATTEMPTS
        .with_label_values(&[service, outcome.as_str()])
        .inc();
    DB_CONNECT_DURATION
        .with_label_values(&[service])
        .observe(started.elapsed().as_secs_f64());
}
