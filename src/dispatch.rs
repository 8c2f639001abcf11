//! Invocation dispatcher.
//!
//! Runs one decoded invocation through lookup, argument resolution and the
//! store gateway, and folds the outcome into an [`Envelope`]. Every
//! invocation yields exactly one envelope; nothing is retried here.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::registry::{OperationKind, OperationRegistry};
use crate::resolve::{ResolvedArguments, resolve};
use crate::store::StoreGateway;

/// A decoded "invoke operation X with argument map M" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Operation wire name.
    pub operation: String,
    /// Untyped arguments.
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl Invocation {
    /// Creates an invocation.
    #[must_use]
    pub fn new(operation: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            operation: operation.into(),
            arguments,
        }
    }
}

/// Where an invocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// The operation name is not registered.
    Lookup,
    /// Arguments did not match the operation's schema.
    Resolution,
    /// The store call failed.
    Execution(OperationKind),
}

impl Phase {
    /// Human-readable prefix for failure messages.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Lookup => "failed to find operation",
            Self::Resolution => "failed to resolve arguments",
            Self::Execution(OperationKind::InsertOne) => "failed to insert object",
            Self::Execution(OperationKind::Query) => "failed to process query",
        }
    }
}

/// Uniform result of an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Envelope {
    /// The operation succeeded with a text payload.
    Success {
        /// Bare identifier for inserts, canonical JSON for queries.
        payload: String,
    },
    /// The operation failed.
    Failure {
        /// Phase that failed.
        phase: Phase,
        /// Underlying cause text.
        cause: String,
    },
}

impl Envelope {
    fn failure(phase: Phase, cause: impl std::fmt::Display) -> Self {
        Self::Failure {
            phase,
            cause: cause.to_string(),
        }
    }

    /// Returns `true` for [`Envelope::Failure`].
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Text shown to the caller: the payload, or `"<prefix>: <cause>"`.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Success { payload } => payload.clone(),
            Self::Failure { phase, cause } => format!("{}: {cause}", phase.prefix()),
        }
    }
}

/// Routes invocations to the store gateway.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<OperationRegistry>,
    gateway: StoreGateway,
    default_collection: String,
}

impl Dispatcher {
    /// Creates a dispatcher over a fixed registry and a connected gateway.
    #[must_use]
    pub fn new(
        registry: Arc<OperationRegistry>,
        gateway: StoreGateway,
        default_collection: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            gateway,
            default_collection: default_collection.into(),
        }
    }

    /// The registry this dispatcher resolves against.
    #[must_use]
    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Collection used when an invocation omits `collection`.
    #[must_use]
    pub fn default_collection(&self) -> &str {
        &self.default_collection
    }

    /// Handles one invocation end to end.
    pub async fn handle(&self, invocation: &Invocation) -> Envelope {
        let envelope = self.run(invocation).await;
        if let Envelope::Failure { phase, cause } = &envelope {
            warn!(
                operation = %invocation.operation,
                phase = phase.prefix(),
                %cause,
                "invocation failed"
            );
        }
        envelope
    }

    async fn run(&self, invocation: &Invocation) -> Envelope {
        let descriptor = match self.registry.lookup(&invocation.operation) {
            Ok(d) => d,
            Err(e) => return Envelope::failure(Phase::Lookup, e),
        };

        debug!(operation = descriptor.name, "resolving arguments");
        let resolved = match resolve(descriptor, &invocation.arguments, &self.default_collection)
        {
            Ok(r) => r,
            Err(e) => return Envelope::failure(Phase::Resolution, e),
        };

        debug!(
            operation = descriptor.name,
            collection = resolved.collection(),
            "executing"
        );
        let phase = Phase::Execution(descriptor.kind);
        let outcome = match resolved {
            ResolvedArguments::InsertOne {
                collection,
                properties,
            } => self.gateway.insert_one(&collection, properties).await,
            ResolvedArguments::Query {
                collection,
                query_text,
                target_fields,
            } => {
                self.gateway
                    .query(&collection, &query_text, &target_fields)
                    .await
            }
        };

        match outcome {
            Ok(payload) => Envelope::Success { payload },
            Err(e) => Envelope::failure(phase, e),
        }
    }
}
