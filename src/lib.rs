//! puerta-sdam - Server role classification for MongoDB deployments
//!
//! Turns a raw `hello`/`ismaster` handshake reply from a replica set member,
//! mongos router or standalone server into an immutable `ServerDescription`:
//! - Classification: one `ServerType` per reply, by fixed precedence rules
//! - Normalization: allow-listed fields copied with per-field defaults,
//!   host lists lower-cased
//! - Derived predicates: writability, readability, combined host list
//!
//! Everything here is pure. Performing the handshake, monitoring loops and
//! topology aggregation belong to the caller.

pub mod config;
pub mod description;
pub mod error;
pub mod reply;
pub mod utils;

pub use description::{
    classify, ServerDescription, ServerDescriptionOptions, ServerType, WireVersionRange,
};
pub use error::{HandshakeError, SdamError, SdamResult};
pub use reply::HelloReply;

/// Parse a JSON handshake reply and describe the server that sent it
pub fn describe_json(
    address: &str,
    reply_json: &str,
    options: ServerDescriptionOptions,
) -> SdamResult<ServerDescription> {
    let reply = HelloReply::from_json_str(reply_json)?;
    Ok(ServerDescription::new(address, Some(&reply), options))
}
