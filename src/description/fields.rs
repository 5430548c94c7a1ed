//! Allow-list of reply fields copied into a snapshot, with per-field default policy

use crate::reply::HelloReply;
use serde_json::{Map, Value};

/// What a field holds when the reply doesn't carry it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPolicy {
    DefaultZero,
    DefaultEmptyList,
    DefaultEmptyDocument,
    /// Absence is preserved
    Absent,
}

impl FieldPolicy {
    pub fn default_value(&self) -> Option<Value> {
        match self {
            FieldPolicy::DefaultZero => Some(Value::from(0)),
            FieldPolicy::DefaultEmptyList => Some(Value::Array(Vec::new())),
            FieldPolicy::DefaultEmptyDocument => Some(Value::Object(Map::new())),
            FieldPolicy::Absent => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyField {
    pub name: &'static str,
    pub policy: FieldPolicy,
}

const fn field(name: &'static str, policy: FieldPolicy) -> ReplyField {
    ReplyField { name, policy }
}

pub const MIN_WIRE_VERSION: &str = "minWireVersion";
pub const MAX_WIRE_VERSION: &str = "maxWireVersion";
pub const HOSTS: &str = "hosts";
pub const PASSIVES: &str = "passives";
pub const ARBITERS: &str = "arbiters";
pub const TAGS: &str = "tags";
pub const ME: &str = "me";
pub const SET_NAME: &str = "setName";
pub const SET_VERSION: &str = "setVersion";
pub const ELECTION_ID: &str = "electionId";
pub const PRIMARY: &str = "primary";
pub const LOGICAL_SESSION_TIMEOUT_MINUTES: &str = "logicalSessionTimeoutMinutes";
pub const LAST_WRITE: &str = "lastWrite";

/// Nested inside `lastWrite`
pub const LAST_WRITE_DATE: &str = "lastWriteDate";
pub const OP_TIME: &str = "opTime";

pub const REPLY_FIELDS: &[ReplyField] = &[
    field(MIN_WIRE_VERSION, FieldPolicy::DefaultZero),
    field(MAX_WIRE_VERSION, FieldPolicy::DefaultZero),
    field(HOSTS, FieldPolicy::DefaultEmptyList),
    field(PASSIVES, FieldPolicy::DefaultEmptyList),
    field(ARBITERS, FieldPolicy::DefaultEmptyList),
    field(TAGS, FieldPolicy::DefaultEmptyDocument),
    field(ME, FieldPolicy::Absent),
    field(SET_NAME, FieldPolicy::Absent),
    field(SET_VERSION, FieldPolicy::Absent),
    field(ELECTION_ID, FieldPolicy::Absent),
    field(PRIMARY, FieldPolicy::Absent),
    field(LOGICAL_SESSION_TIMEOUT_MINUTES, FieldPolicy::Absent),
    field(LAST_WRITE, FieldPolicy::Absent),
];

pub fn policy_for(name: &str) -> Option<FieldPolicy> {
    REPLY_FIELDS
        .iter()
        .find(|field| field.name == name)
        .map(|field| field.policy)
}

/// The field table's defaults alone, as used for a missing or failed reply
pub fn defaults() -> HelloReply {
    let document = REPLY_FIELDS
        .iter()
        .filter_map(|field| {
            field
                .policy
                .default_value()
                .map(|value| (field.name.to_string(), value))
        })
        .collect::<Map<String, Value>>();
    HelloReply::new(document)
}

/// Defaults first, then every allow-listed field present in `reply`.
/// Fields outside the table are dropped.
pub fn project(reply: &HelloReply) -> HelloReply {
    let mut document = defaults().into_document();
    for field in REPLY_FIELDS {
        if let Some(value) = reply.get(field.name) {
            document.insert(field.name.to_string(), value.clone());
        }
    }
    HelloReply::new(document)
}
