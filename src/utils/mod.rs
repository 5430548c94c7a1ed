//! Utility functions and helpers

use serde::Serializer;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Host identifiers are case-insensitive; store them lower-cased
pub fn normalize_host(host: &str) -> String {
    host.to_lowercase()
}

pub fn normalize_hosts<'a, I>(hosts: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    hosts.into_iter().map(normalize_host).collect()
}

/// Milliseconds since the Unix epoch. Clock readings before the epoch yield 0.
pub fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Duration as fractional milliseconds
pub fn duration_millis(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

/// Serialize a `Duration` as fractional milliseconds
pub fn serialize_duration_millis<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration_millis(*duration))
}

/// Serialize a `SystemTime` as milliseconds since the Unix epoch
pub fn serialize_unix_millis<S: Serializer>(
    time: &SystemTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(unix_millis(*time))
}
