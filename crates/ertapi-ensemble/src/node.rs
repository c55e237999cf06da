//! The recursive resource proxy.
//!
//! A [`RemoteNode`] wraps one metadata record of any [`ResourceKind`]. If the
//! record carries `ref_url`, construction performs one blocking expansion
//! fetch and merges the result into the record. After that the record is
//! never re-fetched. Payloads behind `data_url` / `alldata_url` are fetched
//! and materialized on every [`RemoteNode::data`] call unless the node was
//! built with [`RemoteNode::with_payload_cache`].

use std::fmt;
use std::sync::{Arc, OnceLock};

use ertapi_common::{Record, Transport};
use ertapi_config::CacheConfig;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{NodeError, Result};
use crate::kind::{Collection, ResourceKind};
use crate::materialize::{to_matrix, to_single_row, Table};
use crate::projector::FieldProjector;
use crate::record::merge_into;
use crate::select::{select_fields, FieldNames, Selection};

pub const REF_URL: &str = "ref_url";
pub const DATA_URL: &str = "data_url";
pub const ALLDATA_URL: &str = "alldata_url";

#[derive(Clone)]
pub struct RemoteNode {
    kind: ResourceKind,
    metadata: Record,
    transport: Arc<dyn Transport>,
    payload_cache: Option<OnceLock<Table>>,
}

impl RemoteNode {
    /// Wrap `metadata`, expanding it through `ref_url` if present.
    pub fn new(transport: Arc<dyn Transport>, kind: ResourceKind, metadata: Record) -> Result<Self> {
        let mut node = Self {
            kind,
            metadata,
            transport,
            payload_cache: None,
        };
        node.expand()?;
        Ok(node)
    }

    pub fn ensemble(transport: Arc<dyn Transport>, metadata: Record) -> Result<Self> {
        Self::new(transport, ResourceKind::Ensemble, metadata)
    }

    /// A node known only by its metadata URL; expanded immediately.
    pub fn open(transport: Arc<dyn Transport>, kind: ResourceKind, url: &str) -> Result<Self> {
        let mut metadata = Record::new();
        metadata.insert(REF_URL.to_string(), Value::String(url.to_string()));
        Self::new(transport, kind, metadata)
    }

    /// Memoize the first materialized payload. Children inherit the setting.
    pub fn with_payload_cache(mut self, enabled: bool) -> Self {
        self.payload_cache = enabled.then(OnceLock::new);
        self
    }

    /// Apply the `[cache]` section of the client configuration.
    pub fn configured(self, cache: &CacheConfig) -> Self {
        self.with_payload_cache(cache.payloads)
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    fn expand(&mut self) -> Result<()> {
        let Some(url) = self.link(REF_URL)? else {
            return Ok(());
        };
        let url = url.to_string();
        match self.transport.fetch_json(&url)? {
            Some(update) => {
                let keys = merge_into(&mut self.metadata, update);
                debug!(%url, keys, "Expanded metadata");
            }
            None => debug!(%url, "Expansion returned nothing; metadata unchanged"),
        }
        Ok(())
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn metadata(&self) -> &Record {
        &self.metadata
    }

    pub fn into_metadata(self) -> Record {
        self.metadata
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn caches_payload(&self) -> bool {
        self.payload_cache.is_some()
    }

    pub fn field(&self, name: &str) -> Result<&Value> {
        self.metadata.get(name).ok_or_else(|| NodeError::missing(name))
    }

    /// `None` only if the record has no `name` key. Realization names may be numbers.
    pub fn name(&self) -> Option<&Value> {
        self.metadata.get("name")
    }

    /// Value of this kind's identity field (`key` for parameters, `name` otherwise).
    pub fn identity(&self) -> Option<&Value> {
        self.metadata.get(self.kind.identity_key())
    }

    pub fn projected_fields(
        &self,
        collection: &str,
        keys: impl Into<FieldNames>,
    ) -> Result<Selection> {
        select_fields(&self.metadata, collection, keys)
    }

    pub fn collection(&self, collection: Collection) -> FieldProjector<'_> {
        FieldProjector::new(self, collection)
    }

    /// Projector for a collection given by its field name.
    pub fn projector(&self, collection: &str) -> Result<FieldProjector<'_>> {
        Ok(self.collection(collection.parse()?))
    }

    pub fn parameters(&self) -> FieldProjector<'_> {
        self.collection(Collection::Parameters)
    }

    pub fn observations(&self) -> FieldProjector<'_> {
        self.collection(Collection::Observations)
    }

    pub fn realizations(&self) -> FieldProjector<'_> {
        self.collection(Collection::Realizations)
    }

    pub fn responses(&self) -> FieldProjector<'_> {
        self.collection(Collection::Responses)
    }

    /// Materialize the payload behind `data_url` (single row) or, failing
    /// that, `alldata_url` (matrix). `None` when neither link is present or
    /// the transport returned nothing.
    pub fn data(&self) -> Result<Option<Table>> {
        let Some(cache) = &self.payload_cache else {
            return self.fetch_data();
        };
        if let Some(table) = cache.get() {
            return Ok(Some(table.clone()));
        }
        // Only a materialized table is kept; "nothing" is retried on the next read.
        let table = self.fetch_data()?;
        if let Some(table) = &table {
            let _ = cache.set(table.clone());
        }
        Ok(table)
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    fn fetch_data(&self) -> Result<Option<Table>> {
        if let Some(url) = self.link(DATA_URL)? {
            let Some(bytes) = self.transport.fetch_raw(url)? else {
                return Ok(None);
            };
            let table = to_single_row(&bytes)?;
            debug!(%url, rows = table.len(), "Materialized row");
            return Ok(Some(table));
        }
        if let Some(url) = self.link(ALLDATA_URL)? {
            let Some(bytes) = self.transport.fetch_raw(url)? else {
                return Ok(None);
            };
            let table = to_matrix(&bytes)?;
            debug!(%url, rows = table.len(), "Materialized matrix");
            return Ok(Some(table));
        }
        Ok(None)
    }

    fn link(&self, field: &str) -> Result<Option<&str>> {
        match self.metadata.get(field) {
            None => Ok(None),
            Some(Value::String(url)) => Ok(Some(url)),
            Some(other) => Err(NodeError::InvalidLink {
                field: field.to_string(),
                found: other.to_string(),
            }),
        }
    }

    /// Wrap a child record, sharing the transport and cache policy.
    pub(crate) fn child(&self, kind: ResourceKind, metadata: Record) -> Result<Self> {
        let node = Self::new(Arc::clone(&self.transport), kind, metadata)?;
        Ok(node.with_payload_cache(self.caches_payload()))
    }
}

impl PartialEq for RemoteNode {
    fn eq(&self, other: &Self) -> bool {
        self.metadata == other.metadata
    }
}

impl fmt::Debug for RemoteNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteNode")
            .field("kind", &self.kind)
            .field("metadata", &self.metadata)
            .field("caches_payload", &self.caches_payload())
            .finish()
    }
}
