//! Error types for PQMS
//!
//! This module defines all error types used throughout the library.
//! Topology errors are raised at construction time only; the single
//! runtime error is an unresolvable route key.

use thiserror::Error;

/// Result type alias for PQMS operations
pub type Result<T> = std::result::Result<T, MeshError>;

/// Main error type for PQMS operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// Topology table rejected at construction
    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    /// Route resolution failed
    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    /// Invalid simulation configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Integrity errors in the static topology table
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopologyError {
    /// Two nodes share the same identity
    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    /// A link or route names a node that does not exist
    #[error("Unknown node '{node}' referenced by {context}")]
    UnknownNode { node: String, context: String },

    /// A route must contain at least both endpoints
    #[error("Route '{key}' has {len} nodes, need at least 2")]
    RouteTooShort { key: String, len: usize },

    /// Consecutive route nodes are not joined by a link
    #[error("Route '{key}' steps from {from} to {to} without a link")]
    MissingLink { key: String, from: String, to: String },

    /// A route does not start and end on endpoint nodes
    #[error("Route '{key}' does not run endpoint to endpoint")]
    NotEndpointToEndpoint { key: String },

    /// Routes connect different endpoint pairs
    #[error("Route '{key}' connects a different endpoint pair")]
    EndpointMismatch { key: String },

    /// Fewer than two routes with distinct relay sets
    #[error("Need at least two routes with distinct relays, found {found}")]
    NoAlternateRoute { found: usize },
}

/// Errors during route resolution
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    /// Route key is not among the configured routes
    #[error("Unknown route key: {0}")]
    UnknownRouteKey(String),
}

/// Errors in the simulation configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A numeric range is empty or inverted
    #[error("Invalid range for {name}: [{low}, {high})")]
    InvalidRange { name: &'static str, low: f64, high: f64 },

    /// A value that must be positive is zero
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    /// A value exceeds its upper bound
    #[error("{name} is {value}, maximum is {max}")]
    TooLarge { name: &'static str, value: u64, max: u64 },

    /// JSON could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MeshError::Route(RouteError::UnknownRouteKey("tertiary".to_string()));
        let msg = format!("{}", err);
        assert!(msg.contains("Unknown route key"));
        assert!(msg.contains("tertiary"));
    }

    #[test]
    fn test_error_conversion() {
        let topo_err = TopologyError::DuplicateNode("Erde".to_string());
        let mesh_err: MeshError = topo_err.into();
        assert!(matches!(mesh_err, MeshError::Topology(_)));
    }

    #[test]
    fn test_too_large_display() {
        let err = ConfigError::TooLarge {
            name: "max_channels",
            value: 500,
            max: 10,
        };
        assert_eq!(err.to_string(), "max_channels is 500, maximum is 10");
    }

    #[test]
    fn test_missing_link_display() {
        let err = TopologyError::MissingLink {
            key: "primary".to_string(),
            from: "Mars".to_string(),
            to: "Erde".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Mars"));
        assert!(msg.contains("Erde"));
    }
}
