//! Read-only views over one child collection of a node.

use serde_json::Value;
use tracing::debug;

use crate::error::{NodeError, Result};
use crate::kind::Collection;
use crate::node::RemoteNode;
use crate::record::{child_record, collection, project};

/// A view over `node.metadata()[collection]`. Built fresh on every accessor
/// call; holds nothing but the collection and a borrow of the owning node.
#[derive(Debug, Clone, Copy)]
pub struct FieldProjector<'a> {
    collection: Collection,
    node: &'a RemoteNode,
}

impl<'a> FieldProjector<'a> {
    pub(crate) fn new(node: &'a RemoteNode, collection: Collection) -> Self {
        Self { collection, node }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn identity_key(&self) -> &'static str {
        self.collection.identity_key()
    }

    /// The raw child records, in server order.
    pub fn records(&self) -> Result<&'a [Value]> {
        collection(self.node.metadata(), self.collection.field())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.records()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.records()?.is_empty())
    }

    /// First child whose identity field equals `identity`, wrapped as a node
    /// of the collection's kind (and expanded). `Ok(None)` when nothing matches.
    pub fn get(&self, identity: impl Into<Value>) -> Result<Option<RemoteNode>> {
        let identity = identity.into();
        let field = self.collection.field();
        let key = self.identity_key();

        for (i, child) in self.records()?.iter().enumerate() {
            let child = child_record(child, field, i)?;
            let value = child.get(key).ok_or_else(|| NodeError::missing_on_child(key, i))?;
            if *value == identity {
                debug!(collection = field, %identity, index = i, "Matched child");
                let node = self.node.child(self.collection.child_kind(), child.clone())?;
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    /// `attr` of every child, aligned by child index.
    pub fn project(&self, attr: &str) -> Result<Vec<Value>> {
        project(self.records()?, self.collection.field(), attr)
    }

    /// Identity values of every child (`key` for parameters, `name` otherwise).
    pub fn identities(&self) -> Result<Vec<Value>> {
        self.project(self.identity_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ResourceKind;
    use ertapi_test_utils::{record, ScriptedTransport};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn root(t: &Arc<ScriptedTransport>, metadata: Value) -> RemoteNode {
        RemoteNode::ensemble(t.clone(), record(metadata)).unwrap()
    }

    #[test]
    fn test_get_by_key_dispatches_kind() {
        let t = Arc::new(ScriptedTransport::new());
        let n = root(&t, json!({"parameters": [{"key": "k1"}, {"key": "k2"}]}));

        let p = n.parameters().get("k2").unwrap().unwrap();
        assert_eq!(p.kind(), ResourceKind::Parameter);
        assert_eq!(p.metadata(), &record(json!({"key": "k2"})));

        assert!(n.parameters().get("k3").unwrap().is_none());
    }

    #[test]
    fn test_get_is_exact_no_coercion() {
        let t = Arc::new(ScriptedTransport::new());
        let n = root(&t, json!({"realizations": [{"name": "0"}, {"name": 1}]}));
        assert!(n.realizations().get(0_u64).unwrap().is_none());
        assert!(n.realizations().get("1").unwrap().is_none());
        assert_eq!(n.realizations().get(1_u64).unwrap().unwrap().kind(), ResourceKind::Realization);
    }

    #[test]
    fn test_get_returns_first_match() {
        let t = Arc::new(ScriptedTransport::new());
        let n = root(&t, json!({"responses": [
            {"name": "FOPR", "n": 1},
            {"name": "FOPR", "n": 2},
        ]}));
        let r = n.responses().get("FOPR").unwrap().unwrap();
        assert_eq!(r.field("n").unwrap(), &json!(1));
    }

    #[test]
    fn test_get_expands_child() {
        let t = Arc::new(ScriptedTransport::new().with_json("/obs/0", json!({"values": [1, 2]})));
        let n = root(&t, json!({"observations": [{"name": "OBS", "ref_url": "/obs/0"}]}));
        assert_eq!(t.total_calls(), 0);

        let obs = n.observations().get("OBS").unwrap().unwrap();
        assert_eq!(obs.field("values").unwrap(), &json!([1, 2]));
        // The parent's copy of the child record is untouched.
        assert!(n.metadata()["observations"][0].get("values").is_none());
    }

    #[test]
    fn test_get_child_without_identity_key() {
        let t = Arc::new(ScriptedTransport::new());
        let n = root(&t, json!({"parameters": [{"key": "a"}, {"group": "G"}, {"key": "c"}]}));
        assert!(matches!(
            n.parameters().get("c"),
            Err(NodeError::MissingField { ref field, index: Some(1) }) if field == "key"
        ));
        // A match before the malformed child is still found.
        assert!(n.parameters().get("a").unwrap().is_some());
    }

    #[test]
    fn test_get_on_missing_collection() {
        let t = Arc::new(ScriptedTransport::new());
        let n = root(&t, json!({"name": "ens"}));
        assert!(matches!(
            n.parameters().get("k"),
            Err(NodeError::UnknownCollection(ref c)) if c == "parameters"
        ));
    }

    #[test]
    fn test_project_alignment() {
        let t = Arc::new(ScriptedTransport::new());
        let n = root(&t, json!({"realizations": [
            {"name": "r1", "status": "done"},
            {"name": "r2", "status": "failed"},
            {"name": "r3", "status": "running"},
        ]}));
        assert_eq!(
            n.realizations().project("status").unwrap(),
            vec![json!("done"), json!("failed"), json!("running")]
        );
        assert_eq!(n.realizations().len().unwrap(), 3);
        assert_eq!(
            n.realizations().identities().unwrap(),
            vec![json!("r1"), json!("r2"), json!("r3")]
        );
    }

    #[test]
    fn test_project_missing_on_one_child() {
        let t = Arc::new(ScriptedTransport::new());
        let n = root(&t, json!({"parameters": [{"key": "a", "group": "G"}, {"key": "b"}]}));
        assert!(matches!(
            n.parameters().project("group"),
            Err(NodeError::MissingField { index: Some(1), .. })
        ));
    }

    #[test]
    fn test_projector_by_name() {
        let t = Arc::new(ScriptedTransport::new());
        let n = root(&t, json!({"responses": [{"name": "A"}]}));
        let p = n.projector("responses").unwrap();
        assert_eq!(p.collection(), Collection::Responses);
        assert!(matches!(n.projector("ensembles"), Err(NodeError::UnknownCollection(_))));
    }

    #[test]
    fn test_child_inherits_payload_cache() {
        let t = Arc::new(ScriptedTransport::new().with_raw("/d", "1,2"));
        let n = root(&t, json!({"responses": [{"name": "A", "data_url": "/d"}]})).with_payload_cache(true);
        let child = n.responses().get("A").unwrap().unwrap();
        assert!(child.caches_payload());
        child.data().unwrap();
        child.data().unwrap();
        assert_eq!(t.call_count("/d"), 1);
    }
}
