//! Server role classification from a handshake reply
//!
//! Precedence, first match wins:
//! 1. missing reply or `ok` not truthy  -> Unknown
//! 2. `isreplicaset`                    -> RSGhost
//! 3. `msg == "isdbgrid"`               -> Mongos
//! 4. non-empty `setName`: hidden -> RSOther, ismaster -> RSPrimary,
//!    secondary -> RSSecondary, arbiterOnly -> RSArbiter, else RSOther
//! 5. otherwise                         -> Standalone

use super::ServerType;
use crate::reply::HelloReply;

/// `msg` value reported by a sharding router
pub const MONGOS_MSG: &str = "isdbgrid";

/// Classify a reply. Total: never fails and never yields `PossiblePrimary`.
pub fn classify(reply: Option<&HelloReply>) -> ServerType {
    let server_type = match reply {
        Some(reply) if reply.is_ok() => classify_ok(reply),
        _ => ServerType::Unknown,
    };
    tracing::debug!("Classified handshake reply as {}", server_type);
    server_type
}

fn classify_ok(reply: &HelloReply) -> ServerType {
    if reply.flag("isreplicaset") {
        return ServerType::ReplicaSetGhost;
    }

    if reply.get_str("msg") == Some(MONGOS_MSG) {
        return ServerType::Mongos;
    }

    match reply.get_str("setName") {
        Some(set_name) if !set_name.is_empty() => classify_member(reply),
        _ => ServerType::Standalone,
    }
}

// Hidden wins over every other marker, so a hidden secondary reports RSOther
fn classify_member(reply: &HelloReply) -> ServerType {
    if reply.flag("hidden") {
        ServerType::ReplicaSetOther
    } else if reply.flag("ismaster") || reply.flag("isWritablePrimary") {
        ServerType::ReplicaSetPrimary
    } else if reply.flag("secondary") {
        ServerType::ReplicaSetSecondary
    } else if reply.flag("arbiterOnly") {
        ServerType::ReplicaSetArbiter
    } else {
        ServerType::ReplicaSetOther
    }
}
