//! Protocol data model shared by connectors and the platform.
//!
//! - [`version`]: protocol versions and supported ranges
//! - [`well_known`]: the well-known primitive type catalog
//! - [`schema`]: the JSON Schema value tree used for stream schemas
//! - [`message`]: the message envelope and its payload kinds

pub mod error;
pub mod message;
pub mod schema;
pub mod version;
pub mod well_known;

pub use error::{ProtocolError, SchemaError};
pub use message::{MessageType, ProtocolMessage};
pub use schema::{JsonSchema, KeyOrder, SchemaItems, SchemaNode, SchemaType};
pub use version::{ProtocolVersion, ProtocolVersionRange};
pub use well_known::WellKnownType;
