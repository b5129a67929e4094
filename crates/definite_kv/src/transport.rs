//! Transport layer abstraction for store operations.

use crate::error::{KvError, KvResult};
use definite_kv_protocol::{CommitRequest, CommitResponse, SnapshotResponse, Version};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A store transport carries the three store calls to the server.
///
/// Implementations own the credential; callers only pass the store name.
/// Fetch of a store that does not exist returns an empty snapshot with no
/// version. Deleting a store that does not exist succeeds.
pub trait StoreTransport: Send + Sync {
    /// Fetches the full snapshot and version of a store.
    fn fetch(&self, store: &str) -> KvResult<SnapshotResponse>;

    /// Commits a batch of changes guarded by `request.version_id`.
    ///
    /// Returns [`KvError::Conflict`] if the server's version differs.
    fn commit(&self, store: &str, request: &CommitRequest) -> KvResult<CommitResponse>;

    /// Removes a store and its version history.
    fn delete_store(&self, store: &str) -> KvResult<()>;
}

/// Scripted outcome for the next commit against a [`MockTransport`].
#[derive(Debug, Clone)]
pub enum MockCommit {
    /// Accept and report this version.
    Accept(Version),
    /// Reject as a version conflict, reporting this server version.
    Conflict(Option<Version>),
    /// Fail with a transport error.
    Disconnect(String),
}

/// A mock transport for testing.
///
/// Fetch returns whatever snapshot was last set. Commits follow the
/// scripted queue; once it is empty they are accepted with the next counter
/// version. Every commit request is recorded.
#[derive(Debug, Default)]
pub struct MockTransport {
    disconnected: AtomicBool,
    snapshot: Mutex<SnapshotResponse>,
    script: Mutex<VecDeque<MockCommit>>,
    commits: Mutex<Vec<(String, CommitRequest)>>,
    fetches: AtomicUsize,
    store_deletes: AtomicUsize,
}

impl MockTransport {
    /// Creates a new mock transport serving an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the snapshot returned by fetch.
    pub fn set_snapshot(&self, snapshot: SnapshotResponse) {
        *self.snapshot.lock() = snapshot;
    }

    /// Queues the outcome of a future commit.
    pub fn push_commit(&self, outcome: MockCommit) {
        self.script.lock().push_back(outcome);
    }

    /// Sets the connected state. While disconnected every call fails.
    pub fn set_connected(&self, connected: bool) {
        self.disconnected.store(!connected, Ordering::SeqCst);
    }

    /// Commit requests received so far.
    pub fn commits(&self) -> Vec<(String, CommitRequest)> {
        self.commits.lock().clone()
    }

    /// Number of fetch calls received.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of delete-store calls received.
    pub fn delete_count(&self) -> usize {
        self.store_deletes.load(Ordering::SeqCst)
    }

    fn check_connected(&self) -> KvResult<()> {
        if self.disconnected.load(Ordering::SeqCst) {
            Err(KvError::Transport("not connected".into()))
        } else {
            Ok(())
        }
    }
}

impl StoreTransport for MockTransport {
    fn fetch(&self, _store: &str) -> KvResult<SnapshotResponse> {
        self.check_connected()?;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot.lock().clone())
    }

    fn commit(&self, store: &str, request: &CommitRequest) -> KvResult<CommitResponse> {
        self.check_connected()?;
        self.commits
            .lock()
            .push((store.to_string(), request.clone()));

        match self.script.lock().pop_front() {
            Some(MockCommit::Accept(version)) => Ok(CommitResponse::new(version)),
            Some(MockCommit::Conflict(current)) => Err(KvError::Conflict {
                store: store.to_string(),
                expected: request.version_id.clone(),
                current,
            }),
            Some(MockCommit::Disconnect(message)) => Err(KvError::Transport(message)),
            None => {
                let next = request
                    .version_id
                    .as_ref()
                    .and_then(Version::as_number)
                    .unwrap_or(0)
                    .saturating_add(1);
                Ok(CommitResponse::new(next))
            }
        }
    }

    fn delete_store(&self, _store: &str) -> KvResult<()> {
        self.check_connected()?;
        self.store_deletes.fetch_add(1, Ordering::SeqCst);
        *self.snapshot.lock() = SnapshotResponse::empty();
        Ok(())
    }
}
