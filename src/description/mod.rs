//! Immutable server snapshot built from one handshake attempt
//!
//! A `ServerDescription` is created fresh for every handshake, successful or
//! not, and never updated in place. Everything it needs is copied out of the
//! reply during construction, so the reply can be dropped right after.

pub mod classify;
pub mod fields;
pub mod server_type;

pub use classify::{classify, MONGOS_MSG};
pub use server_type::ServerType;

use crate::error::{HandshakeError, SdamError, SdamResult};
use crate::reply::HelloReply;
use crate::utils::{
    duration_millis, normalize_hosts, serialize_duration_millis, serialize_unix_millis,
    unix_millis,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

/// Measurements supplied by whoever performed the handshake
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ServerDescriptionOptions {
    pub round_trip_time: Option<Duration>,
}

impl ServerDescriptionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_round_trip_time(mut self, round_trip_time: Duration) -> Self {
        self.round_trip_time = Some(round_trip_time);
        self
    }
}

/// Inclusive range of wire protocol versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireVersionRange {
    pub min: i32,
    pub max: i32,
}

impl WireVersionRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, version: i32) -> bool {
        self.min <= version && version <= self.max
    }
}

/// Snapshot of one server as observed by a single handshake
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDescription {
    address: String,
    #[serde(rename = "type")]
    server_type: ServerType,
    #[serde(rename = "roundTripMillis", serialize_with = "serialize_duration_millis")]
    round_trip_time: Duration,
    #[serde(rename = "observedAtMillis", serialize_with = "serialize_unix_millis")]
    observed_at: SystemTime,
    // Write-position metadata from `lastWrite`, carried but not interpreted
    #[serde(skip_serializing_if = "Option::is_none")]
    last_write_timestamp: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_write_op_time: Option<Value>,
    min_wire_version: i32,
    max_wire_version: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    me: Option<String>,
    hosts: Vec<String>,
    passives: Vec<String>,
    arbiters: Vec<String>,
    tags: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    set_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    set_version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    election_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logical_session_timeout_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<HandshakeError>,
}

impl ServerDescription {
    /// Build a snapshot from an address and an optional handshake reply.
    ///
    /// A missing reply, or one whose `ok` isn't truthy, yields an `Unknown`
    /// server with every field at its default.
    pub fn new<A: Into<String>>(
        address: A,
        reply: Option<&HelloReply>,
        options: ServerDescriptionOptions,
    ) -> Self {
        let address = address.into();
        if address.is_empty() {
            tracing::warn!("Building server description with an empty address");
        }

        let server_type = classify(reply);
        let projected = match reply {
            Some(reply) if reply.is_ok() => fields::project(reply),
            _ => fields::defaults(),
        };

        let description = Self::from_projected(address, server_type, &projected, options);
        tracing::debug!(
            "Server {} described as {} (wire versions {}..={}, {} hosts)",
            description.address,
            description.server_type,
            description.min_wire_version,
            description.max_wire_version,
            description.hosts.len()
        );
        description
    }

    /// Snapshot of a server nothing is known about yet
    pub fn unknown<A: Into<String>>(address: A) -> Self {
        Self::new(address, None, ServerDescriptionOptions::default())
    }

    /// Snapshot for a failed handshake attempt, carrying the failure
    pub fn with_error<A: Into<String>>(
        address: A,
        error: HandshakeError,
        options: ServerDescriptionOptions,
    ) -> Self {
        let mut description = Self::new(address, None, options);
        tracing::debug!("Server {} handshake failed: {}", description.address, error);
        description.error = Some(error);
        description
    }

    fn from_projected(
        address: String,
        server_type: ServerType,
        projected: &HelloReply,
        options: ServerDescriptionOptions,
    ) -> Self {
        let list = |key: &str| normalize_hosts(projected.get_str_list(key).unwrap_or_default());
        let last_write = |key: &str| {
            projected
                .get_document(fields::LAST_WRITE)
                .and_then(|doc| doc.get(key))
                .filter(|value| !value.is_null())
                .cloned()
        };
        let wire_version = |key: &str| {
            projected
                .get_i64(key)
                .and_then(|v| i32::try_from(v).ok())
                .unwrap_or(0)
        };

        Self {
            server_type,
            round_trip_time: options.round_trip_time.unwrap_or(Duration::ZERO),
            observed_at: SystemTime::now(),
            last_write_timestamp: last_write(fields::LAST_WRITE_DATE),
            last_write_op_time: last_write(fields::OP_TIME),
            min_wire_version: wire_version(fields::MIN_WIRE_VERSION),
            max_wire_version: wire_version(fields::MAX_WIRE_VERSION),
            me: projected.get_str(fields::ME).map(str::to_string),
            hosts: list(fields::HOSTS),
            passives: list(fields::PASSIVES),
            arbiters: list(fields::ARBITERS),
            tags: projected
                .get_document(fields::TAGS)
                .map(|doc| {
                    doc.iter()
                        .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                        .collect()
                })
                .unwrap_or_default(),
            set_name: projected.get_str(fields::SET_NAME).map(str::to_string),
            set_version: projected.get_i64(fields::SET_VERSION),
            election_id: projected.get(fields::ELECTION_ID).cloned(),
            primary: projected.get_str(fields::PRIMARY).map(str::to_string),
            logical_session_timeout_minutes: projected
                .get_i64(fields::LOGICAL_SESSION_TIMEOUT_MINUTES),
            error: None,
            address,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn server_type(&self) -> ServerType {
        self.server_type
    }

    pub fn round_trip_time(&self) -> Duration {
        self.round_trip_time
    }

    pub fn round_trip_millis(&self) -> f64 {
        duration_millis(self.round_trip_time)
    }

    pub fn observed_at(&self) -> SystemTime {
        self.observed_at
    }

    pub fn observed_at_millis(&self) -> u64 {
        unix_millis(self.observed_at)
    }

    pub fn last_write_timestamp(&self) -> Option<&Value> {
        self.last_write_timestamp.as_ref()
    }

    pub fn last_write_op_time(&self) -> Option<&Value> {
        self.last_write_op_time.as_ref()
    }

    pub fn min_wire_version(&self) -> i32 {
        self.min_wire_version
    }

    pub fn max_wire_version(&self) -> i32 {
        self.max_wire_version
    }

    pub fn me(&self) -> Option<&str> {
        self.me.as_deref()
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn passives(&self) -> &[String] {
        &self.passives
    }

    pub fn arbiters(&self) -> &[String] {
        &self.arbiters
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn set_name(&self) -> Option<&str> {
        self.set_name.as_deref()
    }

    pub fn set_version(&self) -> Option<i64> {
        self.set_version
    }

    pub fn election_id(&self) -> Option<&Value> {
        self.election_id.as_ref()
    }

    pub fn primary(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    pub fn logical_session_timeout_minutes(&self) -> Option<i64> {
        self.logical_session_timeout_minutes
    }

    pub fn error(&self) -> Option<&HandshakeError> {
        self.error.as_ref()
    }

    /// `hosts`, then `arbiters`, then `passives`
    pub fn all_hosts(&self) -> Vec<&str> {
        self.hosts
            .iter()
            .chain(&self.arbiters)
            .chain(&self.passives)
            .map(String::as_str)
            .collect()
    }

    pub fn is_writable(&self) -> bool {
        self.server_type.is_writable()
    }

    pub fn is_readable(&self) -> bool {
        self.server_type.is_readable()
    }

    pub fn is_data_bearing(&self) -> bool {
        self.server_type.is_data_bearing()
    }

    /// Whether two snapshots describe the same topology-relevant state.
    /// Capture time, round-trip time and last-write metadata are ignored.
    pub fn is_equivalent(&self, other: &ServerDescription) -> bool {
        self.address == other.address
            && self.server_type == other.server_type
            && self.min_wire_version == other.min_wire_version
            && self.max_wire_version == other.max_wire_version
            && self.me == other.me
            && self.hosts == other.hosts
            && self.passives == other.passives
            && self.arbiters == other.arbiters
            && self.tags == other.tags
            && self.set_name == other.set_name
            && self.set_version == other.set_version
            && self.election_id == other.election_id
            && self.primary == other.primary
            && self.logical_session_timeout_minutes == other.logical_session_timeout_minutes
            && self.error == other.error
    }

    /// Check the server's wire versions against the range this client speaks.
    /// Unknown servers haven't reported versions and always pass.
    pub fn check_compatibility(&self, supported: &WireVersionRange) -> SdamResult<()> {
        if self.server_type == ServerType::Unknown {
            return Ok(());
        }

        let message = if self.min_wire_version > supported.max {
            format!(
                "requires wire version {}, but only versions up to {} are supported",
                self.min_wire_version, supported.max
            )
        } else if self.max_wire_version < supported.min {
            format!(
                "reports maximum wire version {}, but at least {} is required",
                self.max_wire_version, supported.min
            )
        } else {
            return Ok(());
        };

        tracing::warn!("Server {} is incompatible: {}", self.address, message);
        Err(SdamError::incompatible(self.address.clone(), message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(value: Value) -> HelloReply {
        HelloReply::try_from(value).unwrap()
    }

    fn describe(value: Value) -> ServerDescription {
        ServerDescription::new("a:27017", Some(&reply(value)), ServerDescriptionOptions::default())
    }

    fn assert_all_defaults(description: &ServerDescription) {
        assert_eq!(description.server_type(), ServerType::Unknown);
        assert!(description.hosts().is_empty());
        assert!(description.passives().is_empty());
        assert!(description.arbiters().is_empty());
        assert!(description.tags().is_empty());
        assert_eq!(description.min_wire_version(), 0);
        assert_eq!(description.max_wire_version(), 0);
        assert_eq!(description.set_name(), None);
        assert_eq!(description.me(), None);
        assert_eq!(description.last_write_timestamp(), None);
    }

    #[test]
    fn test_absent_reply() {
        let description = ServerDescription::unknown("a:27017");
        assert_all_defaults(&description);
        assert_eq!(description.address(), "a:27017");
        assert_eq!(description.error(), None);
        assert_eq!(description.round_trip_time(), Duration::ZERO);
        assert!(!description.is_readable());
        assert!(!description.is_writable());
    }

    #[test]
    fn test_failed_reply_drops_fields() {
        let description = describe(json!({
            "ok": 0,
            "setName": "rs0",
            "hosts": ["a:27017"],
            "maxWireVersion": 21
        }));
        assert_all_defaults(&description);
    }

    #[test]
    fn test_with_error() {
        let description = ServerDescription::with_error(
            "a:27017",
            HandshakeError::new("connection refused"),
            ServerDescriptionOptions::default(),
        );
        assert_all_defaults(&description);
        assert_eq!(description.error().unwrap().message, "connection refused");
    }

    #[test]
    fn test_primary_fields_copied() {
        let description = describe(json!({
            "ok": 1,
            "ismaster": true,
            "setName": "rs0",
            "setVersion": 3,
            "electionId": {"$oid": "7fffffff0000000000000001"},
            "primary": "a:27017",
            "me": "A:27017",
            "minWireVersion": 0,
            "maxWireVersion": 21,
            "logicalSessionTimeoutMinutes": 30,
            "tags": {"dc": "east", "rack": 1},
            "lastWrite": {
                "opTime": {"ts": 1, "t": 2},
                "lastWriteDate": {"$date": "2024-01-01T00:00:00Z"}
            }
        }));

        assert_eq!(description.server_type(), ServerType::ReplicaSetPrimary);
        assert_eq!(description.set_name(), Some("rs0"));
        assert_eq!(description.set_version(), Some(3));
        assert_eq!(
            description.election_id(),
            Some(&json!({"$oid": "7fffffff0000000000000001"}))
        );
        assert_eq!(description.primary(), Some("a:27017"));
        // me is passed through as given
        assert_eq!(description.me(), Some("A:27017"));
        assert_eq!(description.max_wire_version(), 21);
        assert_eq!(description.logical_session_timeout_minutes(), Some(30));
        assert_eq!(description.tags().len(), 1);
        assert_eq!(description.tags().get("dc").map(String::as_str), Some("east"));
        assert_eq!(description.last_write_op_time(), Some(&json!({"ts": 1, "t": 2})));
        assert_eq!(
            description.last_write_timestamp(),
            Some(&json!({"$date": "2024-01-01T00:00:00Z"}))
        );
        assert_eq!(description.error(), None);
        assert!(description.is_writable());
        assert!(description.is_readable());
    }

    #[test]
    fn test_absent_fields_stay_absent() {
        let description = describe(json!({"ok": 1}));
        assert_eq!(description.server_type(), ServerType::Standalone);
        assert_eq!(description.me(), None);
        assert_eq!(description.set_name(), None);
        assert_eq!(description.set_version(), None);
        assert_eq!(description.election_id(), None);
        assert_eq!(description.primary(), None);
        assert_eq!(description.logical_session_timeout_minutes(), None);
        assert_eq!(description.last_write_timestamp(), None);
        assert_eq!(description.last_write_op_time(), None);
        assert_eq!(description.min_wire_version(), 0);
        assert_eq!(description.max_wire_version(), 0);
    }

    #[test]
    fn test_host_lists_lowercased() {
        let description = describe(json!({
            "ok": 1,
            "setName": "rs0",
            "secondary": true,
            "hosts": ["Host1:27017", "HOST2:27017"],
            "arbiters": ["Arb:27017"],
            "passives": ["Passive:27017"]
        }));
        assert_eq!(description.hosts(), ["host1:27017", "host2:27017"]);
        assert_eq!(description.arbiters(), ["arb:27017"]);
        assert_eq!(description.passives(), ["passive:27017"]);
        assert_eq!(
            description.all_hosts(),
            vec!["host1:27017", "host2:27017", "arb:27017", "passive:27017"]
        );
        assert!(description.is_readable());
        assert!(!description.is_writable());
    }

    #[test]
    fn test_address_case_preserved() {
        let description = ServerDescription::new(
            "MixedCase:27017",
            Some(&reply(json!({"ok": 1}))),
            ServerDescriptionOptions::default(),
        );
        assert_eq!(description.address(), "MixedCase:27017");
    }

    #[test]
    fn test_round_trip_time_supplied() {
        let options = ServerDescriptionOptions::new().with_round_trip_time(Duration::from_millis(12));
        let description = ServerDescription::new("a:27017", Some(&reply(json!({"ok": 1}))), options);
        assert_eq!(description.round_trip_time(), Duration::from_millis(12));
        assert_eq!(description.round_trip_millis(), 12.0);
    }

    #[test]
    fn test_observed_at_captured() {
        let before = SystemTime::now();
        let description = ServerDescription::unknown("a:27017");
        let after = SystemTime::now();
        assert!(description.observed_at() >= before);
        assert!(description.observed_at() <= after);
        assert!(description.observed_at_millis() > 0);
    }

    #[test]
    fn test_construction_is_deterministic() {
        let value = json!({
            "ok": 1,
            "setName": "rs0",
            "secondary": true,
            "hosts": ["A:1", "B:2"],
            "maxWireVersion": 17,
        });
        let first = describe(value.clone());
        let second = describe(value);
        assert!(first.is_equivalent(&second));
        assert_eq!(first.server_type(), second.server_type());
        assert_eq!(first.hosts(), second.hosts());
        assert_eq!(first.is_readable(), second.is_readable());
        assert_eq!(first.is_writable(), second.is_writable());
    }

    #[test]
    fn test_equivalence_detects_changes() {
        let secondary = describe(json!({"ok": 1, "setName": "rs0", "secondary": true}));
        let primary = describe(json!({"ok": 1, "setName": "rs0", "ismaster": true}));
        assert!(!secondary.is_equivalent(&primary));

        let failed = ServerDescription::with_error(
            "a:27017",
            HandshakeError::new("timeout"),
            ServerDescriptionOptions::default(),
        );
        assert!(!ServerDescription::unknown("a:27017").is_equivalent(&failed));
    }

    #[test]
    fn test_compatibility() {
        let supported = WireVersionRange::new(6, 21);

        let ok = describe(json!({"ok": 1, "minWireVersion": 0, "maxWireVersion": 17}));
        assert!(ok.check_compatibility(&supported).is_ok());

        let too_new = describe(json!({"ok": 1, "minWireVersion": 25, "maxWireVersion": 25}));
        let err = too_new.check_compatibility(&supported).unwrap_err();
        assert!(matches!(err, SdamError::IncompatibleServer { .. }));
        assert!(err.to_string().contains("requires wire version 25"));

        let too_old = describe(json!({"ok": 1, "minWireVersion": 0, "maxWireVersion": 2}));
        let err = too_old.check_compatibility(&supported).unwrap_err();
        assert!(err.to_string().contains("at least 6 is required"));

        assert!(ServerDescription::unknown("a:27017")
            .check_compatibility(&supported)
            .is_ok());
    }

    #[test]
    fn test_wire_version_range() {
        let range = WireVersionRange::new(6, 21);
        assert!(range.contains(6));
        assert!(range.contains(21));
        assert!(!range.contains(5));
        assert!(!range.contains(22));
    }

    #[test]
    fn test_serialize() {
        let description = describe(json!({"ok": 1, "msg": "isdbgrid", "maxWireVersion": 21}));
        let value = serde_json::to_value(&description).unwrap();
        assert_eq!(value["type"], json!("Mongos"));
        assert_eq!(value["address"], json!("a:27017"));
        assert_eq!(value["maxWireVersion"], json!(21));
        assert_eq!(value["hosts"], json!([]));
        assert!(value.get("setName").is_none());
        assert!(value.get("error").is_none());
        assert_eq!(value["roundTripMillis"], json!(0.0));
        assert_eq!(value["observedAtMillis"], json!(description.observed_at_millis()));
        assert!(value.get("roundTripTime").is_none());
        assert!(value.get("observedAt").is_none());
        assert!(value.get("lastWriteTimestamp").is_none());
    }

    #[test]
    fn test_serialize_last_write_and_round_trip() {
        let options = ServerDescriptionOptions::new().with_round_trip_time(Duration::from_micros(2500));
        let description = ServerDescription::new(
            "a:27017",
            Some(&reply(json!({
                "ok": 1,
                "lastWrite": {"lastWriteDate": 1700000000000u64, "opTime": {"ts": 5, "t": 1}}
            }))),
            options,
        );
        let value = serde_json::to_value(&description).unwrap();
        assert_eq!(value["roundTripMillis"], json!(2.5));
        assert_eq!(value["lastWriteTimestamp"], json!(1700000000000u64));
        assert_eq!(value["lastWriteOpTime"], json!({"ts": 5, "t": 1}));
        assert!(value.get("lastWrite").is_none());
    }

    #[test]
    fn test_null_last_write_fields_are_absent() {
        let description = describe(json!({
            "ok": 1,
            "lastWrite": {"lastWriteDate": null, "opTime": null}
        }));
        assert_eq!(description.last_write_timestamp(), None);
        assert_eq!(description.last_write_op_time(), None);

        let value = serde_json::to_value(&description).unwrap();
        assert!(value.get("lastWriteTimestamp").is_none());
        assert!(value.get("lastWriteOpTime").is_none());
    }
}
