//! Versioned key-value store client.
//!
//! A [`KvStore`] holds a snapshot of a remote store plus the local changes
//! made since the last successful commit. Reads and writes never touch the
//! network; [`KvStore::commit`] ships the pending changes together with the
//! version the snapshot came from, and the server applies them only if that
//! version is still current.
//!
//! ## Key Invariants
//!
//! - A key is never in both the pending-write and pending-delete sets
//! - The version only moves on fetch, successful commit, or store deletion
//! - A failed commit of any kind leaves the snapshot, pending changes and
//!   version exactly as they were
//! - Conflicts are never retried or merged automatically

use crate::error::{KvError, KvResult};
use crate::transport::StoreTransport;
use definite_kv_protocol::{validate_key, validate_store_name, CommitRequest, Version};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a store instance stands relative to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// Local view equals the last fetched or committed server state.
    Fetched,
    /// Local changes are waiting to be committed.
    Dirty,
    /// The last commit lost a version race; pending changes are retained
    /// until the caller reloads or rebases.
    Conflicted,
}

/// Outcome of a successful [`KvStore::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitResult {
    /// Number of keys written.
    pub upserts: usize,
    /// Number of keys deleted.
    pub deletes: usize,
    /// Version after the commit.
    pub version: Option<Version>,
}

impl CommitResult {
    /// Returns true if nothing was sent to the server.
    pub fn is_noop(&self) -> bool {
        self.upserts == 0 && self.deletes == 0
    }
}

/// Client-side view of one remote store.
pub struct KvStore<T: StoreTransport> {
    name: String,
    transport: Arc<T>,
    entries: BTreeMap<String, String>,
    pending_writes: BTreeMap<String, String>,
    pending_deletes: BTreeSet<String>,
    version: Option<Version>,
    state: StoreState,
}

impl<T: StoreTransport> KvStore<T> {
    /// Opens a store, fetching its full snapshot and version.
    ///
    /// A store that does not exist yet opens empty with no version.
    pub fn open(name: impl Into<String>, transport: Arc<T>) -> KvResult<Self> {
        let name = name.into();
        validate_store_name(&name)?;

        let snapshot = transport.fetch(&name)?;
        debug!(
            store = %name,
            keys = snapshot.data.len(),
            version = ?snapshot.version_id,
            "opened store"
        );

        Ok(Self {
            name,
            transport,
            entries: snapshot.data,
            pending_writes: BTreeMap::new(),
            pending_deletes: BTreeSet::new(),
            version: snapshot.version_id,
            state: StoreState::Fetched,
        })
    }

    /// Returns the store name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the version the local snapshot is based on.
    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    /// Returns the current state.
    pub fn state(&self) -> StoreState {
        self.state
    }

    /// Returns true if there are uncommitted changes.
    pub fn is_dirty(&self) -> bool {
        !self.pending_writes.is_empty() || !self.pending_deletes.is_empty()
    }

    /// Uncommitted writes.
    pub fn pending_writes(&self) -> &BTreeMap<String, String> {
        &self.pending_writes
    }

    /// Uncommitted deletes.
    pub fn pending_deletes(&self) -> &BTreeSet<String> {
        &self.pending_deletes
    }

    /// Looks up a key in the local view.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.pending_deletes.contains(key) {
            return None;
        }
        self.pending_writes
            .get(key)
            .or_else(|| self.entries.get(key))
            .map(String::as_str)
    }

    /// Returns true if the key is present in the local view.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Records a write. Replaces any pending delete of the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> KvResult<()> {
        let key = key.into();
        validate_key(&key)?;

        self.pending_deletes.remove(&key);
        self.pending_writes.insert(key, value.into());
        self.mark_dirty();
        Ok(())
    }

    /// Records a delete. Replaces any pending write of the same key.
    ///
    /// Keys that were never seen locally are still recorded; the server
    /// ignores deletes of keys it does not have.
    pub fn delete(&mut self, key: impl Into<String>) -> KvResult<()> {
        let key = key.into();
        validate_key(&key)?;

        self.pending_writes.remove(&key);
        self.pending_deletes.insert(key);
        self.mark_dirty();
        Ok(())
    }

    /// Iterates the local view in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        Merged {
            snapshot: self.entries.iter().peekable(),
            writes: self.pending_writes.iter().peekable(),
        }
        .filter(move |(k, _)| !self.pending_deletes.contains(*k))
    }

    /// Iterates the keys of the local view in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Number of keys in the local view.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns true if the local view has no keys.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Copies the local view into an owned map.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Commits pending changes against the current version.
    ///
    /// With nothing pending this succeeds without contacting the server.
    /// On [`KvError::Conflict`] the store enters [`StoreState::Conflicted`]
    /// and keeps its pending changes; call [`reload`](Self::reload) or
    /// [`rebase`](Self::rebase) to move on.
    pub fn commit(&mut self) -> KvResult<CommitResult> {
        if !self.is_dirty() {
            debug!(store = %self.name, "nothing to commit");
            return Ok(CommitResult {
                upserts: 0,
                deletes: 0,
                version: self.version.clone(),
            });
        }

        let request = CommitRequest::new(
            self.version.clone(),
            self.pending_writes.clone(),
            self.pending_deletes.iter().cloned().collect(),
        );

        let response = match self.transport.commit(&self.name, &request) {
            Ok(response) => response,
            Err(err @ KvError::Conflict { .. }) => {
                warn!(store = %self.name, error = %err, "commit rejected");
                self.state = StoreState::Conflicted;
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        let upserts = self.pending_writes.len();
        let deletes = self.pending_deletes.len();
        self.entries.append(&mut self.pending_writes);
        for key in std::mem::take(&mut self.pending_deletes) {
            self.entries.remove(&key);
        }
        self.version = Some(response.version_id);
        self.state = StoreState::Fetched;

        info!(
            store = %self.name,
            upserts,
            deletes,
            version = ?self.version,
            "committed"
        );
        Ok(CommitResult {
            upserts,
            deletes,
            version: self.version.clone(),
        })
    }

    /// Replaces the snapshot with fresh server state, discarding pending changes.
    pub fn reload(&mut self) -> KvResult<()> {
        let snapshot = self.transport.fetch(&self.name)?;
        let discarded = self.pending_writes.len() + self.pending_deletes.len();

        self.entries = snapshot.data;
        self.version = snapshot.version_id;
        self.pending_writes.clear();
        self.pending_deletes.clear();
        self.state = StoreState::Fetched;

        debug!(store = %self.name, discarded, version = ?self.version, "reloaded");
        Ok(())
    }

    /// Replaces the snapshot with fresh server state, keeping pending changes.
    ///
    /// A following commit applies the same local intent on top of whatever
    /// the other writers committed.
    pub fn rebase(&mut self) -> KvResult<()> {
        let snapshot = self.transport.fetch(&self.name)?;

        self.entries = snapshot.data;
        self.version = snapshot.version_id;
        self.state = if self.is_dirty() {
            StoreState::Dirty
        } else {
            StoreState::Fetched
        };

        debug!(store = %self.name, version = ?self.version, "rebased");
        Ok(())
    }

    /// Deletes the remote store and empties the local view.
    pub fn delete_store(&mut self) -> KvResult<()> {
        self.transport.delete_store(&self.name)?;

        self.entries.clear();
        self.pending_writes.clear();
        self.pending_deletes.clear();
        self.version = None;
        self.state = StoreState::Fetched;

        info!(store = %self.name, "deleted store");
        Ok(())
    }

    fn mark_dirty(&mut self) {
        if self.state != StoreState::Conflicted {
            self.state = StoreState::Dirty;
        }
    }
}

impl<T: StoreTransport> std::fmt::Debug for KvStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvStore")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("state", &self.state)
            .field("entries", &self.entries.len())
            .field("pending_writes", &self.pending_writes.len())
            .field("pending_deletes", &self.pending_deletes.len())
            .finish()
    }
}

/// Ordered merge of the snapshot and pending writes; writes shadow the snapshot.
struct Merged<'a, I, J>
where
    I: Iterator<Item = (&'a String, &'a String)>,
    J: Iterator<Item = (&'a String, &'a String)>,
{
    snapshot: std::iter::Peekable<I>,
    writes: std::iter::Peekable<J>,
}

impl<'a, I, J> Iterator for Merged<'a, I, J>
where
    I: Iterator<Item = (&'a String, &'a String)>,
    J: Iterator<Item = (&'a String, &'a String)>,
{
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let next = match (self.snapshot.peek(), self.writes.peek()) {
            (Some((sk, _)), Some((wk, _))) => match sk.cmp(wk) {
                std::cmp::Ordering::Less => self.snapshot.next(),
                std::cmp::Ordering::Equal => {
                    self.snapshot.next();
                    self.writes.next()
                }
                std::cmp::Ordering::Greater => self.writes.next(),
            },
            (Some(_), None) => self.snapshot.next(),
            (None, Some(_)) => self.writes.next(),
            (None, None) => None,
        };
        next.map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockCommit, MockTransport};
    use definite_kv_protocol::{SnapshotResponse, ValidationError};
    use proptest::prelude::*;

    fn seeded(pairs: &[(&str, &str)], version: u64) -> Arc<MockTransport> {
        let transport = Arc::new(MockTransport::new());
        let data = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        transport.set_snapshot(SnapshotResponse::new(data, Some(Version::Number(version))));
        transport
    }

    fn open(transport: &Arc<MockTransport>) -> KvStore<MockTransport> {
        KvStore::open("test_store", Arc::clone(transport)).unwrap()
    }

    #[test]
    fn open_loads_snapshot() {
        let transport = seeded(&[("a", "1"), ("b", "2")], 4);
        let store = open(&transport);

        assert_eq!(store.name(), "test_store");
        assert_eq!(store.version(), Some(&Version::Number(4)));
        assert_eq!(store.state(), StoreState::Fetched);
        assert_eq!(store.get("a"), Some("1"));
        assert_eq!(store.len(), 2);
        assert!(!store.is_dirty());
    }

    #[test]
    fn open_rejects_bad_name_before_fetch() {
        let transport = Arc::new(MockTransport::new());
        let err = KvStore::open("bad/name", Arc::clone(&transport)).unwrap_err();
        assert!(matches!(err, KvError::Validation(_)));
        assert_eq!(transport.fetch_count(), 0);
    }

    #[test]
    fn missing_key_reads_absent() {
        let store = open(&Arc::new(MockTransport::new()));
        assert_eq!(store.get("nope"), None);
        assert!(!store.contains("nope"));
        assert!(store.is_empty());
        assert!(store.version().is_none());
    }

    #[test]
    fn read_your_writes() {
        let mut store = open(&seeded(&[("k", "old")], 1));
        store.set("k", "new").unwrap();
        store.set("fresh", "v").unwrap();

        assert_eq!(store.get("k"), Some("new"));
        assert_eq!(store.get("fresh"), Some("v"));
        assert_eq!(store.state(), StoreState::Dirty);
        assert_eq!(store.version(), Some(&Version::Number(1)));
    }

    #[test]
    fn later_operation_wins() {
        let mut store = open(&seeded(&[("k", "v0")], 1));

        store.set("k", "v1").unwrap();
        store.delete("k").unwrap();
        assert_eq!(store.get("k"), None);
        assert!(!store.pending_writes().contains_key("k"));
        assert!(store.pending_deletes().contains("k"));

        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k"), Some("v2"));
        assert!(!store.pending_deletes().contains("k"));
    }

    #[test]
    fn delete_unknown_key_is_recorded() {
        let mut store = open(&Arc::new(MockTransport::new()));
        store.delete("never-seen").unwrap();
        assert!(store.is_dirty());
        assert!(store.pending_deletes().contains("never-seen"));
    }

    #[test]
    fn invalid_key_rejected_without_state_change() {
        let mut store = open(&Arc::new(MockTransport::new()));
        let err = store.set("", "v").unwrap_err();
        assert!(matches!(
            err,
            KvError::Validation(ValidationError::EmptyKey)
        ));
        assert!(store.delete("a\tb").is_err());
        assert!(!store.is_dirty());
        assert_eq!(store.state(), StoreState::Fetched);
    }

    #[test]
    fn enumeration_reflects_local_view() {
        let mut store = open(&seeded(&[("a", "1"), ("c", "3")], 1));
        store.set("k1", "v1").unwrap();
        store.set("k2", "v2").unwrap();
        store.delete("k1").unwrap();
        store.delete("a").unwrap();
        store.set("c", "33").unwrap();

        let keys: Vec<_> = store.keys().collect();
        assert_eq!(keys, vec!["c", "k2"]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.to_map().get("c").map(String::as_str), Some("33"));
    }

    #[test]
    fn noop_commit_sends_nothing() {
        let transport = seeded(&[("a", "1")], 6);
        let mut store = open(&transport);

        let result = store.commit().unwrap();
        assert!(result.is_noop());
        assert_eq!(result.version, Some(Version::Number(6)));
        assert_eq!(store.version(), Some(&Version::Number(6)));
        assert!(transport.commits().is_empty());
    }

    #[test]
    fn commit_sends_diff_and_adopts_version() {
        let transport = seeded(&[("a", "1"), ("b", "2")], 3);
        let mut store = open(&transport);
        store.set("a", "10").unwrap();
        store.delete("b").unwrap();
        store.delete("ghost").unwrap();

        let result = store.commit().unwrap();
        assert_eq!(result.upserts, 1);
        assert_eq!(result.deletes, 2);
        assert_eq!(store.version(), Some(&Version::Number(4)));
        assert_eq!(store.state(), StoreState::Fetched);
        assert!(!store.is_dirty());
        assert_eq!(store.get("a"), Some("10"));
        assert_eq!(store.get("b"), None);

        let commits = transport.commits();
        assert_eq!(commits.len(), 1);
        let (name, request) = &commits[0];
        assert_eq!(name, "test_store");
        assert_eq!(request.version_id, Some(Version::Number(3)));
        assert_eq!(request.upserts.len(), 1);
        assert_eq!(request.deletes, vec!["b".to_string(), "ghost".to_string()]);
    }

    #[test]
    fn conflict_keeps_pending_state() {
        let transport = seeded(&[("k", "base")], 1);
        transport.push_commit(MockCommit::Conflict(Some(Version::Number(2))));
        let mut store = open(&transport);
        store.set("k", "b").unwrap();

        let err = store.commit().unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.state(), StoreState::Conflicted);
        assert_eq!(store.get("k"), Some("b"));
        assert_eq!(store.pending_writes().get("k").map(String::as_str), Some("b"));
        assert_eq!(store.version(), Some(&Version::Number(1)));

        // Still conflicted after more local edits.
        store.set("other", "x").unwrap();
        assert_eq!(store.state(), StoreState::Conflicted);
    }

    #[test]
    fn transport_failure_keeps_state() {
        let transport = seeded(&[("k", "base")], 1);
        transport.push_commit(MockCommit::Disconnect("connection reset".into()));
        let mut store = open(&transport);
        store.set("k", "v").unwrap();

        let err = store.commit().unwrap_err();
        assert!(matches!(err, KvError::Transport(_)));
        assert!(err.is_retryable());
        assert_eq!(store.state(), StoreState::Dirty);
        assert_eq!(store.get("k"), Some("v"));
        assert_eq!(store.version(), Some(&Version::Number(1)));

        // The identical commit can be retried.
        store.commit().unwrap();
        let commits = transport.commits();
        assert_eq!(commits[0].1, commits[1].1);
    }

    #[test]
    fn reload_clears_conflict() {
        let transport = seeded(&[("k", "base")], 1);
        transport.push_commit(MockCommit::Conflict(Some(Version::Number(2))));
        let mut store = open(&transport);
        store.set("k", "mine").unwrap();
        store.commit().unwrap_err();

        transport.set_snapshot(SnapshotResponse::new(
            [("k".to_string(), "theirs".to_string())].into_iter().collect(),
            Some(Version::Number(2)),
        ));
        store.reload().unwrap();

        assert_eq!(store.state(), StoreState::Fetched);
        assert_eq!(store.get("k"), Some("theirs"));
        assert_eq!(store.version(), Some(&Version::Number(2)));
        assert!(!store.is_dirty());
    }

    #[test]
    fn rebase_keeps_pending_intent() {
        let transport = seeded(&[("k", "base")], 1);
        transport.push_commit(MockCommit::Conflict(Some(Version::Number(2))));
        let mut store = open(&transport);
        store.set("k", "mine").unwrap();
        store.commit().unwrap_err();

        transport.set_snapshot(SnapshotResponse::new(
            [
                ("k".to_string(), "theirs".to_string()),
                ("extra".to_string(), "e".to_string()),
            ]
            .into_iter()
            .collect(),
            Some(Version::Number(2)),
        ));
        store.rebase().unwrap();

        assert_eq!(store.state(), StoreState::Dirty);
        assert_eq!(store.get("k"), Some("mine"));
        assert_eq!(store.get("extra"), Some("e"));

        store.commit().unwrap();
        assert_eq!(store.version(), Some(&Version::Number(3)));
        assert_eq!(
            transport.commits()[1].1.version_id,
            Some(Version::Number(2))
        );
    }

    #[test]
    fn failed_reload_keeps_state() {
        let transport = seeded(&[("k", "base")], 1);
        let mut store = open(&transport);
        store.set("k", "v").unwrap();

        transport.set_connected(false);
        assert!(store.reload().is_err());
        assert_eq!(store.get("k"), Some("v"));
        assert_eq!(store.state(), StoreState::Dirty);
    }

    #[test]
    fn delete_store_resets_view() {
        let transport = seeded(&[("a", "1"), ("b", "2")], 5);
        let mut store = open(&transport);
        store.set("c", "3").unwrap();

        store.delete_store().unwrap();
        assert_eq!(transport.delete_count(), 1);
        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("c"), None);
        assert!(store.is_empty());
        assert!(store.version().is_none());
        assert_eq!(store.state(), StoreState::Fetched);
    }

    #[test]
    fn failed_delete_store_keeps_view() {
        let transport = seeded(&[("a", "1")], 5);
        let mut store = open(&transport);
        transport.set_connected(false);

        assert!(store.delete_store().is_err());
        assert_eq!(store.get("a"), Some("1"));
        assert_eq!(store.version(), Some(&Version::Number(5)));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(String, String),
        Delete(String),
    }

    fn op() -> impl Strategy<Value = Op> {
        let key = "[a-e]";
        prop_oneof![
            (key, "[a-z]{0,4}").prop_map(|(k, v)| Op::Set(k, v)),
            key.prop_map(Op::Delete),
        ]
    }

    proptest! {
        #[test]
        fn local_view_matches_model(
            seed in proptest::collection::btree_map("[a-e]", "[a-z]{0,4}", 0..5),
            ops in proptest::collection::vec(op(), 0..30),
        ) {
            let transport = Arc::new(MockTransport::new());
            transport.set_snapshot(SnapshotResponse::new(seed.clone(), Some(Version::Number(1))));
            let mut store = KvStore::open("prop", Arc::clone(&transport)).unwrap();

            let mut model = seed;
            for op in ops {
                match op {
                    Op::Set(k, v) => {
                        store.set(k.clone(), v.clone()).unwrap();
                        prop_assert_eq!(store.get(&k), Some(v.as_str()));
                        model.insert(k, v);
                    }
                    Op::Delete(k) => {
                        store.delete(k.clone()).unwrap();
                        prop_assert_eq!(store.get(&k), None);
                        model.remove(&k);
                    }
                }
                for key in store.pending_writes().keys() {
                    prop_assert!(!store.pending_deletes().contains(key));
                }
            }

            prop_assert_eq!(store.to_map(), model.clone());
            prop_assert_eq!(store.len(), model.len());
            prop_assert_eq!(store.version(), Some(&Version::Number(1)));

            store.commit().unwrap();
            prop_assert_eq!(store.to_map(), model);
            prop_assert!(!store.is_dirty());
        }
    }
}
