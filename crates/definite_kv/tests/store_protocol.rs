//! Integration tests for stores against the reference server.

use definite_kv::{
    DefiniteClient, HttpTransport, KvError, LoopbackClient, LoopbackServer, StoreState,
    ValidationError, Version,
};
use definite_kv_protocol::{HttpRequest, HttpResponse};
use definite_kv_server::{KvServer, ServerConfig};
use std::sync::Arc;

/// Routes client requests straight into a shared server.
struct InProcess(Arc<KvServer>);

impl LoopbackServer for InProcess {
    fn handle(&self, request: &HttpRequest) -> HttpResponse {
        self.0.handle_http(request)
    }
}

type Client = DefiniteClient<HttpTransport<LoopbackClient<InProcess>>>;

fn connect(server: &Arc<KvServer>, api_key: &str) -> Client {
    let client = LoopbackClient::new(InProcess(Arc::clone(server)));
    DefiniteClient::with_transport(HttpTransport::new("http://loopback", api_key, client))
}

fn setup() -> (Arc<KvServer>, Client) {
    let server = Arc::new(KvServer::new(ServerConfig::default()));
    let client = connect(&server, "key");
    (server, client)
}

#[test]
fn fresh_store_is_empty() {
    let (_server, client) = setup();
    let store = client.kv_store("test_store").unwrap();

    assert!(store.is_empty());
    assert!(store.version().is_none());
    assert_eq!(store.get("key"), None);
    assert_eq!(store.state(), StoreState::Fetched);
}

#[test]
fn commit_is_visible_to_new_instance() {
    let (server, client) = setup();

    let mut store = client.kv_store("test_store").unwrap();
    store.set("key", "value").unwrap();
    assert_eq!(store.len(), 1);
    store.commit().unwrap();

    let reopened = client.kv_store("test_store").unwrap();
    assert_eq!(reopened.get("key"), Some("value"));
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.version(), store.version());
    assert_eq!(server.store_count(), 1);
}

#[test]
fn stale_instance_conflicts_and_keeps_pending() {
    let (server, client) = setup();

    let mut a = client.kv_store("shared").unwrap();
    let mut b = client.kv_store("shared").unwrap();

    a.set("key", "from a").unwrap();
    a.commit().unwrap();

    b.set("key", "from b").unwrap();
    b.set("other", "x").unwrap();
    let err = b.commit().unwrap_err();

    match &err {
        KvError::Conflict {
            store,
            expected,
            current,
        } => {
            assert_eq!(store, "shared");
            assert!(expected.is_none());
            assert_eq!(current.as_ref(), a.version());
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    // Nothing from b reached the server.
    let fresh = client.kv_store("shared").unwrap();
    assert_eq!(fresh.get("key"), Some("from a"));
    assert!(!fresh.contains("other"));

    // b still holds its intent.
    assert_eq!(b.state(), StoreState::Conflicted);
    assert_eq!(b.get("key"), Some("from b"));
    assert_eq!(b.pending_writes().len(), 2);

    // A second attempt without refreshing conflicts again.
    assert!(b.commit().unwrap_err().is_conflict());
    assert_eq!(server.version_of("key", "shared"), Some(1));
}

#[test]
fn reload_discards_and_rebase_reapplies() {
    let (_server, client) = setup();

    let mut a = client.kv_store("s").unwrap();
    a.set("x", "1").unwrap();
    a.commit().unwrap();

    let mut b = client.kv_store("s").unwrap();
    let mut c = client.kv_store("s").unwrap();

    a.set("x", "2").unwrap();
    a.commit().unwrap();

    b.set("y", "b").unwrap();
    assert!(b.commit().unwrap_err().is_conflict());
    b.reload().unwrap();
    assert_eq!(b.get("x"), Some("2"));
    assert_eq!(b.get("y"), None);
    assert!(!b.is_dirty());

    c.set("z", "c").unwrap();
    c.delete("x").unwrap();
    assert!(c.commit().unwrap_err().is_conflict());
    c.rebase().unwrap();
    assert_eq!(c.state(), StoreState::Dirty);
    c.commit().unwrap();

    let fresh = client.kv_store("s").unwrap();
    assert_eq!(fresh.get("z"), Some("c"));
    assert!(!fresh.contains("x"));
}

#[test]
fn deletes_and_overwrites_commit_together() {
    let (_server, client) = setup();

    let mut store = client.kv_store("s").unwrap();
    store.set("a", "1").unwrap();
    store.set("b", "2").unwrap();
    store.commit().unwrap();

    store.delete("a").unwrap();
    store.set("b", "3").unwrap();
    store.set("c", "4").unwrap();
    let result = store.commit().unwrap();
    assert_eq!(result.upserts, 2);
    assert_eq!(result.deletes, 1);

    let fresh = client.kv_store("s").unwrap();
    let keys: Vec<_> = fresh.keys().collect();
    assert_eq!(keys, vec!["b", "c"]);
    assert_eq!(fresh.get("b"), Some("3"));
}

#[test]
fn noop_commit_leaves_version() {
    let (server, client) = setup();

    let mut store = client.kv_store("s").unwrap();
    store.set("a", "1").unwrap();
    store.commit().unwrap();
    let version = store.version().cloned();

    let result = store.commit().unwrap();
    assert!(result.is_noop());
    assert_eq!(store.version().cloned(), version);
    assert_eq!(server.version_of("key", "s"), Some(1));
}

#[test]
fn delete_store_resets_everything() {
    let (server, client) = setup();

    let mut store = client.kv_store("test_store").unwrap();
    store.set("key", "value").unwrap();
    store.commit().unwrap();

    store.delete_store().unwrap();
    assert!(store.is_empty());
    assert!(store.version().is_none());
    assert_eq!(server.store_count(), 0);

    // Deleting an absent store is fine.
    store.delete_store().unwrap();

    let fresh = client.kv_store("test_store").unwrap();
    assert_eq!(fresh.get("key"), None);
    assert!(fresh.version().is_none());
}

#[test]
fn version_is_not_reused_after_drop() {
    let (_server, client) = setup();

    let mut old = client.kv_store("s").unwrap();
    old.set("a", "1").unwrap();
    old.commit().unwrap();
    let stale = old.version().cloned();

    let mut dropper = client.kv_store("s").unwrap();
    dropper.delete_store().unwrap();

    let mut recreate = client.kv_store("s").unwrap();
    recreate.set("b", "2").unwrap();
    recreate.commit().unwrap();
    assert_ne!(recreate.version().cloned(), stale);
    assert_eq!(recreate.version(), Some(&Version::Number(2)));

    old.set("a", "late").unwrap();
    assert!(old.commit().unwrap_err().is_conflict());
}

#[test]
fn tenants_are_isolated() {
    let server = Arc::new(KvServer::new(ServerConfig::default()));
    let alice = connect(&server, "alice");
    let bob = connect(&server, "bob");

    let mut store = alice.kv_store("s").unwrap();
    store.set("a", "1").unwrap();
    store.commit().unwrap();

    assert!(bob.kv_store("s").unwrap().is_empty());
}

#[test]
fn unknown_key_is_unauthorized() {
    let server = Arc::new(KvServer::new(
        ServerConfig::default().with_api_key("good", "acme"),
    ));

    let err = connect(&server, "bad").kv_store("s").unwrap_err();
    assert!(matches!(err, KvError::Unauthorized(_)));

    assert!(connect(&server, "good").kv_store("s").is_ok());
}

#[test]
fn invalid_store_name_is_rejected_locally() {
    let (server, client) = setup();
    assert!(matches!(
        client.kv_store("no spaces").unwrap_err(),
        KvError::Validation(_)
    ));
    for dots in [".", ".."] {
        assert!(matches!(
            client.kv_store(dots).unwrap_err(),
            KvError::Validation(ValidationError::DotsOnlyStoreName(_))
        ));
    }
    assert_eq!(server.store_count(), 0);
}
