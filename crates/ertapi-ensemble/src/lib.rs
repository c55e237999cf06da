//! ertapi-ensemble — Lazy proxy navigation over the ensemble API.
//!
//! - [`RemoteNode`]: any resource (ensemble, parameter, observation,
//!   realization, response), expanded once through `ref_url`
//! - [`FieldProjector`]: keyed lookup and field projection over a child collection
//! - [`materialize`]: comma/newline payloads to numeric [`Table`]s
//! - [`select_fields`]: named columnar selection over a record's collection
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ertapi_common::HttpTransport;
//! use ertapi_ensemble::{RemoteNode, ResourceKind};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = Arc::new(HttpTransport::new("http://localhost:5000")?);
//!     let ensemble = RemoteNode::open(transport, ResourceKind::Ensemble, "/ensembles/0")?;
//!
//!     let keys = ensemble.parameters().project("key")?;
//!     println!("{} parameters", keys.len());
//!
//!     if let Some(response) = ensemble.responses().get("POLY_RES")? {
//!         if let Some(table) = response.data()? {
//!             println!("{} realizations", table.len());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod kind;
pub mod materialize;
pub mod node;
pub mod projector;
pub mod record;
pub mod select;

pub use error::{NodeError, Result};
pub use kind::{Collection, CollectionSpec, ResourceKind, COLLECTIONS};
pub use materialize::{to_matrix, to_single_row, Table};
pub use node::RemoteNode;
pub use projector::FieldProjector;
pub use record::{collection, merge_into, merged};
pub use select::{select_fields, FieldNames, Selection};

pub use ertapi_common::{Record, Transport};
