//! Relation data for the `haproxy-route` interface: typed records with
//! validation, plus provider and requirer helpers that read and publish them.

pub mod databag;
pub mod error;
pub mod provider;
pub mod requirer;
pub mod schema;
pub mod valid_str;

pub const HAPROXY_ROUTE_RELATION_NAME: &str = "haproxy-route";

pub use databag::DatabagModel;
pub use error::{HaproxyRouteError, Result};
pub use provider::{HaproxyRouteProvider, ProviderEvent, ValidationMode};
pub use requirer::{HaproxyRouteRequirer, PartialHealthCheck, RequirerEvent, RouteRequirements};
pub use schema::*;
pub use valid_str::{InvalidCharacters, ValidStr};
