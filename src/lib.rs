//! # weaviate-mcp
//!
//! An MCP (Model Context Protocol) server that exposes two operations
//! against a Weaviate vector store:
//!
//! - `insert-one`: insert one object into a collection, returning its ID.
//! - `query`: hybrid (keyword + vector) search returning selected
//!   properties as canonical JSON.
//!
//! ## Layers
//!
//! - [`registry`]: operation names and parameter schemas.
//! - [`resolve`]: untyped arguments → typed [`ResolvedArguments`].
//! - [`store`]: the store boundary ([`StoreClient`]), its Weaviate
//!   implementation, and the [`StoreGateway`] that normalizes responses.
//! - [`dispatch`]: runs an [`Invocation`] end to end into an [`Envelope`].
//! - [`mcp`]: rmcp server handler and stdio transport.
//! - [`cli`]: command-line entry points.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod mcp;
pub mod registry;
pub mod resolve;
pub mod store;

pub use config::AdapterConfig;
pub use dispatch::{Dispatcher, Envelope, Invocation, Phase};
pub use error::{ConfigError, Error, RegistryError, ResolveError, Result, StoreError};
pub use registry::{OperationDescriptor, OperationRegistry, ParamKind, ParameterSpec};
pub use resolve::{ResolvedArguments, resolve};
pub use store::{StoreClient, StoreGateway, WeaviateClient};
