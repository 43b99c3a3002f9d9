//! Connection validation.
//!
//! A [`ConnectionValidator`] decides whether a candidate [`Connection`] may be
//! created. [`BasicConnectionValidator`] applies the built-in rules (handle
//! roles, self-loops, connectable nodes); host rules are added with
//! [`CompositeValidator`] or supplied as closures.
//!
//! # Example
//!
//! ```ignore
//! let validator = CompositeValidator::new()
//!     .add(NoDuplicatesValidator::new(edges.clone()))
//!     .add(|c: &Connection, _: &NodeGeometryStore| {
//!         if c.target == "locked" {
//!             ValidationResult::Invalid(ValidationError::Custom("node is locked".into()))
//!         } else {
//!             ValidationResult::Valid
//!         }
//!     });
//! ```

use crate::config::{ConnectionMode, FlowConfig};
use crate::store::NodeGeometryStore;
use crate::types::{Connection, Edge, HandleRef, HandleRole};
use std::fmt;

/// Result of connection validation with optional rejection reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Connection is valid
    Valid,
    /// Connection is invalid with a reason
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Combine two results (AND logic): returns first error if any
    pub fn and(self, other: ValidationResult) -> ValidationResult {
        match self {
            ValidationResult::Valid => other,
            invalid => invalid,
        }
    }
}

/// Reasons why a connection was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Node does not exist in the store
    NodeNotFound(String),
    /// Node does not accept connections
    NotConnectable(String),
    /// Cannot connect a handle to itself
    SameHandle,
    /// Source and target are the same node
    SelfLoop,
    /// Strict mode requires a source and a target handle
    IncompatibleRoles,
    /// An edge between these handles already exists
    DuplicateEdge,
    /// Custom validation failure
    Custom(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "Node {} not found", id),
            Self::NotConnectable(id) => write!(f, "Node {} is not connectable", id),
            Self::SameHandle => write!(f, "Cannot connect handle to itself"),
            Self::SelfLoop => write!(f, "Cannot connect a node to itself"),
            Self::IncompatibleRoles => write!(f, "Must connect a source to a target"),
            Self::DuplicateEdge => write!(f, "Edge already exists"),
            Self::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

/// A candidate connection together with the handles it was drawn between.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionCandidate {
    pub origin: HandleRef,
    pub hovered: HandleRef,
    pub connection: Connection,
}

impl ConnectionCandidate {
    /// Order the two handles into a source-to-target connection.
    ///
    /// The origin keeps its role; in loose mode a drag that started on a
    /// target handle therefore ends at a source.
    pub fn new(origin: HandleRef, hovered: HandleRef) -> Self {
        let (source, target) = match origin.role {
            HandleRole::Source => (&origin, &hovered),
            HandleRole::Target => (&hovered, &origin),
        };
        let connection = Connection {
            source: source.node_id.clone(),
            target: target.node_id.clone(),
            source_handle: source.handle_id.clone(),
            target_handle: target.handle_id.clone(),
        };
        Self {
            origin,
            hovered,
            connection,
        }
    }
}

/// Trait for connection validation rules.
pub trait ConnectionValidator {
    /// Check whether `candidate` may become an edge.
    fn validate(
        &self,
        candidate: &ConnectionCandidate,
        store: &NodeGeometryStore,
    ) -> ValidationResult;
}

impl<F> ConnectionValidator for F
where
    F: Fn(&Connection, &NodeGeometryStore) -> ValidationResult,
{
    fn validate(
        &self,
        candidate: &ConnectionCandidate,
        store: &NodeGeometryStore,
    ) -> ValidationResult {
        self(&candidate.connection, store)
    }
}

/// Accepts everything. Used when the host supplies no validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ConnectionValidator for AcceptAll {
    fn validate(&self, _: &ConnectionCandidate, _: &NodeGeometryStore) -> ValidationResult {
        ValidationResult::Valid
    }
}

/// Built-in connection rules.
///
/// - both nodes exist and are connectable
/// - a handle never connects to itself
/// - strict mode: one source handle and one target handle
/// - no self-loops unless allowed
#[derive(Debug, Clone, Copy)]
pub struct BasicConnectionValidator {
    pub mode: ConnectionMode,
    pub allow_self_loops: bool,
}

impl BasicConnectionValidator {
    pub fn new(mode: ConnectionMode, allow_self_loops: bool) -> Self {
        Self {
            mode,
            allow_self_loops,
        }
    }
}

impl From<&FlowConfig> for BasicConnectionValidator {
    fn from(config: &FlowConfig) -> Self {
        Self::new(config.connection_mode, config.allow_self_loops)
    }
}

impl ConnectionValidator for BasicConnectionValidator {
    fn validate(
        &self,
        candidate: &ConnectionCandidate,
        store: &NodeGeometryStore,
    ) -> ValidationResult {
        let origin = &candidate.origin;
        let hovered = &candidate.hovered;

        for node_id in [&origin.node_id, &hovered.node_id] {
            if !store.contains(node_id) {
                return ValidationResult::Invalid(ValidationError::NodeNotFound(node_id.clone()));
            }
            if !store.is_connectable(node_id) {
                return ValidationResult::Invalid(ValidationError::NotConnectable(node_id.clone()));
            }
        }

        if origin == hovered {
            return ValidationResult::Invalid(ValidationError::SameHandle);
        }

        if self.mode == ConnectionMode::Strict && origin.role == hovered.role {
            return ValidationResult::Invalid(ValidationError::IncompatibleRoles);
        }

        if !self.allow_self_loops && origin.node_id == hovered.node_id {
            return ValidationResult::Invalid(ValidationError::SelfLoop);
        }

        ValidationResult::Valid
    }
}

/// Rejects connections that duplicate an existing edge.
#[derive(Debug, Clone, Default)]
pub struct NoDuplicatesValidator {
    edges: Vec<Edge>,
}

impl NoDuplicatesValidator {
    pub fn new(edges: Vec<Edge>) -> Self {
        Self { edges }
    }
}

impl ConnectionValidator for NoDuplicatesValidator {
    fn validate(&self, candidate: &ConnectionCandidate, _: &NodeGeometryStore) -> ValidationResult {
        let c = &candidate.connection;
        let exists = self.edges.iter().any(|e| {
            e.source == c.source
                && e.target == c.target
                && e.source_handle == c.source_handle
                && e.target_handle == c.target_handle
        });
        if exists {
            ValidationResult::Invalid(ValidationError::DuplicateEdge)
        } else {
            ValidationResult::Valid
        }
    }
}

/// Combines multiple validators (all must pass)
///
/// Validators are checked in the order they were added and the first
/// rejection wins.
#[derive(Default)]
pub struct CompositeValidator {
    validators: Vec<Box<dyn ConnectionValidator>>,
}

impl CompositeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<V: ConnectionValidator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl ConnectionValidator for CompositeValidator {
    fn validate(
        &self,
        candidate: &ConnectionCandidate,
        store: &NodeGeometryStore,
    ) -> ValidationResult {
        for v in &self.validators {
            let result = v.validate(candidate, store);
            if !result.is_valid() {
                return result;
            }
        }
        ValidationResult::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Node;

    fn store() -> NodeGeometryStore {
        let mut store = NodeGeometryStore::default();
        store
            .upsert_nodes(vec![
                Node::new("a", 0.0, 0.0),
                Node::new("b", 200.0, 0.0),
                Node::new("locked", 400.0, 0.0).connectable(false),
            ])
            .unwrap();
        store
    }

    fn source(node: &str) -> HandleRef {
        HandleRef::new(node, Some("out"), HandleRole::Source)
    }

    fn target(node: &str) -> HandleRef {
        HandleRef::new(node, Some("in"), HandleRole::Target)
    }

    // ========================================================================
    // ConnectionCandidate ordering
    // ========================================================================

    #[test]
    fn test_candidate_orders_by_origin_role() {
        let c = ConnectionCandidate::new(target("b"), source("a"));
        assert_eq!(c.connection.source, "a");
        assert_eq!(c.connection.target, "b");
        assert_eq!(c.connection.source_handle.as_deref(), Some("out"));
    }

    // ========================================================================
    // BasicConnectionValidator
    // ========================================================================

    #[test]
    fn test_strict_accepts_source_to_target() {
        let v = BasicConnectionValidator::new(ConnectionMode::Strict, false);
        let c = ConnectionCandidate::new(source("a"), target("b"));
        assert!(v.validate(&c, &store()).is_valid());
    }

    #[test]
    fn test_strict_rejects_same_roles() {
        let v = BasicConnectionValidator::new(ConnectionMode::Strict, false);
        let c = ConnectionCandidate::new(source("a"), source("b"));
        assert_eq!(
            v.validate(&c, &store()),
            ValidationResult::Invalid(ValidationError::IncompatibleRoles)
        );
    }

    #[test]
    fn test_loose_accepts_same_roles() {
        let v = BasicConnectionValidator::new(ConnectionMode::Loose, false);
        let c = ConnectionCandidate::new(source("a"), source("b"));
        assert!(v.validate(&c, &store()).is_valid());
    }

    #[test]
    fn test_self_loop_rejected_unless_allowed() {
        let c = ConnectionCandidate::new(source("a"), target("a"));
        let strict = BasicConnectionValidator::new(ConnectionMode::Strict, false);
        assert_eq!(
            strict.validate(&c, &store()),
            ValidationResult::Invalid(ValidationError::SelfLoop)
        );
        let permissive = BasicConnectionValidator::new(ConnectionMode::Strict, true);
        assert!(permissive.validate(&c, &store()).is_valid());
    }

    #[test]
    fn test_same_handle_rejected_in_loose_mode() {
        let v = BasicConnectionValidator::new(ConnectionMode::Loose, true);
        let c = ConnectionCandidate::new(source("a"), source("a"));
        assert_eq!(
            v.validate(&c, &store()),
            ValidationResult::Invalid(ValidationError::SameHandle)
        );
    }

    #[test]
    fn test_not_connectable_and_missing_nodes() {
        let v = BasicConnectionValidator::new(ConnectionMode::Strict, false);
        let c = ConnectionCandidate::new(source("a"), target("locked"));
        assert_eq!(
            v.validate(&c, &store()),
            ValidationResult::Invalid(ValidationError::NotConnectable("locked".into()))
        );
        let c = ConnectionCandidate::new(source("a"), target("ghost"));
        assert!(matches!(
            v.validate(&c, &store()),
            ValidationResult::Invalid(ValidationError::NodeNotFound(_))
        ));
    }

    // ========================================================================
    // Composition
    // ========================================================================

    #[test]
    fn test_no_duplicates() {
        let edges = vec![Edge::new("e1", "a", "b").with_handles(Some("out"), Some("in"))];
        let v = NoDuplicatesValidator::new(edges);
        let c = ConnectionCandidate::new(source("a"), target("b"));
        assert_eq!(
            v.validate(&c, &store()),
            ValidationResult::Invalid(ValidationError::DuplicateEdge)
        );
    }

    #[test]
    fn test_composite_first_failure_wins() {
        let v = CompositeValidator::new()
            .add(BasicConnectionValidator::new(ConnectionMode::Strict, false))
            .add(|_: &Connection, _: &NodeGeometryStore| {
                ValidationResult::Invalid(ValidationError::Custom("nope".into()))
            });
        assert_eq!(v.len(), 2);

        let c = ConnectionCandidate::new(source("a"), source("b"));
        assert_eq!(
            v.validate(&c, &store()),
            ValidationResult::Invalid(ValidationError::IncompatibleRoles)
        );
        let c = ConnectionCandidate::new(source("a"), target("b"));
        assert_eq!(
            v.validate(&c, &store()),
            ValidationResult::Invalid(ValidationError::Custom("nope".into()))
        );
    }

    #[test]
    fn test_result_and() {
        let invalid = ValidationResult::Invalid(ValidationError::SelfLoop);
        assert_eq!(ValidationResult::Valid.and(invalid.clone()), invalid);
        assert!(ValidationResult::Valid.and(ValidationResult::Valid).is_valid());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(ValidationError::DuplicateEdge.to_string(), "Edge already exists");
        assert_eq!(ValidationError::Custom("x".into()).to_string(), "x");
    }
}
