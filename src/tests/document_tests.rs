use std::{sync::Arc, time::Duration};

use anyhow::anyhow;
use serde_json::json;

use super::support::{Harness, ScriptedStore, StalledStore, TabCall, upserted};
use crate::{
    DeleteOutcome, DocumentId, Operation, SessionError, SessionOptions, SessionPhase, TabId,
    persistence::{DeleteResponse, FetchResponse, UpsertResponse},
};

fn stored_layout(id: &str, title: &str) -> FetchResponse {
    FetchResponse {
        item: Some(json!({
            "id": id,
            "title": title,
            "okey": "article",
            "custFields": [{"fldName": "body", "fldType": "richtext"}]
        })),
    }
}

#[tokio::test]
async fn new_document_starts_clean_without_touching_the_store() {
    let harness = Harness::new("tab-layout-NEW", vec![], true);
    let store = ScriptedStore::new();
    let mut session = harness.layout_session("NEW", store.clone(), SessionOptions::default());

    session.initialize().await.unwrap();

    assert!(store.calls().is_empty());
    assert!(!session.is_dirty());
    assert!(!session.is_loading());
    assert_eq!(session.phase(), SessionPhase::Ready);
    assert!(session.document_id().is_new());
    let tab = TabId::from("tab-layout-NEW");
    assert_eq!(harness.tabs.registry.title(&tab).as_deref(), Some("New Layout"));
    assert!(!harness.tabs.registry.is_loading(&tab));
    assert!(harness.tabs.dirty_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn new_document_waits_for_the_settle_delay() {
    let harness = Harness::new("tab-layout-NEW", vec![], true);
    let options = SessionOptions::default().with_new_document_settle(Duration::from_secs(1));
    let mut session = harness.layout_session("NEW", ScriptedStore::new(), options);

    let started = tokio::time::Instant::now();
    session.initialize().await.unwrap();

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(!session.is_loading());
}

#[tokio::test]
async fn existing_document_binds_and_titles_the_tab() {
    let harness = Harness::new("tab-layout-7", vec![], true);
    let store = ScriptedStore::new();
    store.expect_fetch(Ok(stored_layout("7", "Article")));
    let mut session = harness.layout_session("7", store.clone(), SessionOptions::default());

    session.initialize().await.unwrap();

    assert_eq!(store.calls(), vec!["fetch 7"]);
    let layout = session.document().unwrap();
    assert_eq!(layout.id, DocumentId::Persisted("7".into()));
    assert_eq!(layout.cust_fields.len(), 1);
    assert_eq!(
        harness.tabs.registry.title(&"tab-layout-7".into()).as_deref(),
        Some("Article")
    );
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn blank_titles_fall_back_to_the_untitled_label() {
    let harness = Harness::new("tab-layout-7", vec![], true);
    let store = ScriptedStore::new();
    store.expect_fetch(Ok(stored_layout("7", "")));
    let mut session = harness.layout_session("7", store.clone(), SessionOptions::default());

    session.initialize().await.unwrap();

    assert_eq!(
        harness.tabs.registry.title(&"tab-layout-7".into()).as_deref(),
        Some("Untitled Layout")
    );
}

#[tokio::test]
async fn missing_document_keeps_title_and_notifies_once() {
    let harness = Harness::new("tab-layout-9", vec![], true);
    let store = ScriptedStore::new();
    store.expect_fetch(Ok(FetchResponse { item: None }));
    let mut session = harness.layout_session("9", store.clone(), SessionOptions::default());

    session.initialize().await.unwrap();

    assert!(session.document().is_none());
    assert_eq!(
        harness.tabs.registry.title(&"tab-layout-9".into()).as_deref(),
        Some("Loading")
    );
    assert_eq!(harness.tabs.notifications(), vec!["Layout not found"]);
    assert_eq!(session.phase(), SessionPhase::Ready);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn failed_fetch_leaves_the_session_usable() {
    let harness = Harness::new("tab-layout-7", vec![], true);
    let store = ScriptedStore::new();
    store.expect_fetch(Err(anyhow!("connection reset")));
    let mut session = harness.layout_session("7", store.clone(), SessionOptions::default());

    let err = session.initialize().await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::Transport {
            operation: Operation::Load,
            ..
        }
    ));
    assert_eq!(store.calls().len(), 1, "no retry");
    assert_eq!(harness.tabs.notifications(), vec!["Error while loading layout"]);
    assert!(session.document().is_none());
    assert_eq!(session.phase(), SessionPhase::Ready);
    assert!(!harness.tabs.registry.is_loading(&"tab-layout-7".into()));
    assert!(matches!(session.save().await, Err(SessionError::Unbound)));
}

#[tokio::test]
async fn reload_that_fails_unbinds_the_previous_document() {
    let harness = Harness::new("tab-layout-7", vec![], true);
    let store = ScriptedStore::new();
    store
        .expect_fetch(Ok(stored_layout("7", "Article")))
        .expect_fetch(Ok(FetchResponse { item: None }))
        .expect_fetch(Ok(stored_layout("7", "Article")))
        .expect_fetch(Err(anyhow!("connection reset")));
    let mut session = harness.layout_session("7", store.clone(), SessionOptions::default());
    session.initialize().await.unwrap();
    session.modify(|layout| layout.title = "Edited".into()).unwrap();

    session.initialize().await.unwrap();

    assert!(session.document().is_none());
    assert!(!session.is_dirty());
    assert!(session.edit().is_none());
    assert_eq!(harness.tabs.dirty_calls(), vec![true, false]);

    session.initialize().await.unwrap();
    assert!(session.document().is_some());

    assert!(session.initialize().await.is_err());
    assert!(session.document().is_none());
    assert_eq!(
        harness.tabs.notifications(),
        vec!["Layout not found", "Error while loading layout"]
    );
    assert_eq!(session.phase(), SessionPhase::Ready);
}

#[tokio::test]
async fn save_without_key_is_rejected_before_the_network() {
    let harness = Harness::new("tab-layout-NEW", vec![], true);
    let store = ScriptedStore::new();
    let mut session = harness.layout_session("NEW", store.clone(), SessionOptions::default());
    session.initialize().await.unwrap();

    let err = session.save().await.unwrap_err();

    let SessionError::Validation { message, issues } = err else {
        panic!("expected a validation error");
    };
    assert_eq!(message, "Key name is required!");
    assert!(!issues.is_empty());
    assert!(store.calls().is_empty());
    assert!(!session.is_dirty());
    assert_eq!(session.phase(), SessionPhase::Ready);
}

#[tokio::test]
async fn empty_key_is_rejected_too() {
    let harness = Harness::new("tab-layout-NEW", vec![], true);
    let store = ScriptedStore::new();
    let mut session = harness.layout_session("NEW", store.clone(), SessionOptions::default());
    session.initialize().await.unwrap();
    session
        .modify(|layout| layout.okey = Some(String::new()))
        .unwrap();

    assert!(session.save().await.unwrap_err().is_validation());
    assert!(store.upserted().is_empty());
    assert!(session.is_dirty(), "validation leaves dirty state alone");
}

#[tokio::test]
async fn first_save_rekeys_the_tab_and_binds_the_server_identity() {
    let harness = Harness::new("tab-layout-NEW", vec![], true);
    let store = ScriptedStore::new();
    store.expect_upsert(upserted("42", true));
    let mut session = harness.layout_session("NEW", store.clone(), SessionOptions::default());
    session.initialize().await.unwrap();
    session
        .modify(|layout| layout.okey = Some("k1".into()))
        .unwrap();

    let outcome = session.save().await.unwrap();

    assert!(outcome.identity_changed);
    assert!(outcome.confirmed);
    assert_eq!(session.tab_id(), &TabId::from("tab-layout-42"));
    assert_eq!(session.document_id(), &DocumentId::Persisted("42".into()));
    assert_eq!(
        session.document().unwrap().id,
        DocumentId::Persisted("42".into())
    );
    assert!(!session.is_dirty());
    assert_eq!(harness.tabs.notifications(), vec!["Document saved"]);
    assert!(harness.tabs.calls().contains(&TabCall::Rekey(
        "tab-layout-NEW".into(),
        "tab-layout-42".into(),
        "42".into()
    )));

    let snapshot = harness.tabs.registry.snapshot(&"tab-layout-42".into()).unwrap();
    assert_eq!(snapshot.title, "Untitled Layout");
    assert_eq!(snapshot.document_id.as_deref(), Some("42"));
    assert!(!snapshot.dirty);
    assert!(!snapshot.loading);
    assert!(harness.tabs.registry.take_stale(&"tab-layouts".into()));

    let payload = &store.upserted()[0];
    assert!(payload.get("id").is_none(), "new documents carry no id");
    assert_eq!(payload["okey"], json!("k1"));
}

#[tokio::test]
async fn repeated_save_does_not_rekey_again() {
    let harness = Harness::new("tab-layout-NEW", vec![], true);
    let store = ScriptedStore::new();
    store.expect_upsert(upserted("42", true)).expect_upsert(upserted("42", true));
    let mut session = harness.layout_session("NEW", store.clone(), SessionOptions::default());
    session.initialize().await.unwrap();
    session
        .modify(|layout| layout.okey = Some("k1".into()))
        .unwrap();

    assert!(session.save().await.unwrap().identity_changed);
    let second = session.save().await.unwrap();

    assert!(!second.identity_changed);
    assert_eq!(harness.tabs.rekeys(), 1);
    assert_eq!(store.upserted()[1]["id"], json!("42"));
}

#[tokio::test]
async fn saved_without_confirmation_stays_dirty() {
    let harness = Harness::new("tab-layout-NEW", vec![], true);
    let store = ScriptedStore::new();
    store.expect_upsert(upserted("5", false));
    let mut session = harness.layout_session("NEW", store.clone(), SessionOptions::default());
    session.initialize().await.unwrap();
    session
        .modify(|layout| layout.okey = Some("k1".into()))
        .unwrap();

    let outcome = session.save().await.unwrap();

    assert!(outcome.identity_changed, "identity follows the response id");
    assert!(!outcome.confirmed);
    assert_eq!(session.tab_id(), &TabId::from("tab-layout-5"));
    assert!(session.is_dirty());
    assert!(harness.tabs.notifications().is_empty());
}

#[tokio::test]
async fn explicit_identity_flag_wins_over_id_comparison() {
    let harness = Harness::new("tab-layout-7", vec![], true);
    let store = ScriptedStore::new();
    store.expect_fetch(Ok(stored_layout("7", "Article"))).expect_upsert(Ok(UpsertResponse {
        id: "8".into(),
        success: true,
        saved_id_changed: Some(false),
    }));
    let mut session = harness.layout_session("7", store.clone(), SessionOptions::default());
    session.initialize().await.unwrap();

    let outcome = session.save().await.unwrap();

    assert!(!outcome.identity_changed);
    assert_eq!(session.tab_id(), &TabId::from("tab-layout-7"));
    assert_eq!(harness.tabs.rekeys(), 0);
}

#[tokio::test]
async fn failed_save_keeps_the_document_dirty() {
    let harness = Harness::new("tab-layout-7", vec![], true);
    let store = ScriptedStore::new();
    store
        .expect_fetch(Ok(stored_layout("7", "Article")))
        .expect_upsert(Err(anyhow!("502 bad gateway")));
    let mut session = harness.layout_session("7", store.clone(), SessionOptions::default());
    session.initialize().await.unwrap();
    session.modify(|layout| layout.title = "Story".into()).unwrap();

    let err = session.save().await.unwrap_err();

    assert!(err.is_transport());
    assert!(err.to_string().contains("502 bad gateway"));
    assert!(session.is_dirty());
    assert!(!session.is_loading());
    assert_eq!(session.phase(), SessionPhase::Ready);
    assert_eq!(harness.tabs.notifications(), vec!["Error while saving layout"]);
    assert_eq!(session.document().unwrap().title, "Story");
}

#[tokio::test]
async fn refused_delete_keeps_tab_and_document() {
    let harness = Harness::new("tab-layout-7", vec![], true);
    let store = ScriptedStore::new();
    store
        .expect_fetch(Ok(stored_layout("7", "Article")))
        .expect_delete(Ok(DeleteResponse { success: false }));
    let mut session = harness.layout_session("7", store.clone(), SessionOptions::default());
    session.initialize().await.unwrap();

    let outcome = session.delete().await.unwrap();

    assert_eq!(outcome, DeleteOutcome::Failed);
    assert_eq!(harness.tabs.notifications(), vec!["Error while deleting"]);
    assert!(harness.tabs.registry.contains(&"tab-layout-7".into()));
    assert!(session.document().is_some());
    assert_eq!(session.phase(), SessionPhase::Ready);
    assert!(!session.is_loading());
    assert_eq!(
        harness.confirm.prompts(),
        vec!["Do you really want to delete this object?"]
    );
}

#[tokio::test]
async fn declined_delete_does_nothing() {
    let harness = Harness::new("tab-layout-7", vec![], false);
    let store = ScriptedStore::new();
    store.expect_fetch(Ok(stored_layout("7", "Article")));
    let mut session = harness.layout_session("7", store.clone(), SessionOptions::default());
    session.initialize().await.unwrap();

    assert_eq!(session.delete().await.unwrap(), DeleteOutcome::Declined);
    assert_eq!(store.calls(), vec!["fetch 7"]);
    assert!(harness.tabs.notifications().is_empty());
    assert!(harness.tabs.registry.contains(&"tab-layout-7".into()));
}

#[tokio::test]
async fn successful_delete_closes_the_session() {
    let harness = Harness::new("tab-layout-7", vec![], true);
    let store = ScriptedStore::new();
    store
        .expect_fetch(Ok(stored_layout("7", "Article")))
        .expect_delete(Ok(DeleteResponse { success: true }));
    let mut session = harness.layout_session("7", store.clone(), SessionOptions::default());
    session.initialize().await.unwrap();

    assert_eq!(session.delete().await.unwrap(), DeleteOutcome::Deleted);

    assert_eq!(store.calls(), vec!["fetch 7", "delete 7"]);
    assert_eq!(harness.tabs.notifications(), vec!["Document deleted"]);
    assert!(!harness.tabs.registry.contains(&"tab-layout-7".into()));
    assert!(harness.tabs.registry.is_stale(&"tab-layouts".into()));
    assert_eq!(session.phase(), SessionPhase::Closed);
    assert!(matches!(session.save().await, Err(SessionError::Closed)));
    assert!(session.edit().is_none());
}

#[tokio::test]
async fn deleting_an_unsaved_document_skips_the_store() {
    let harness = Harness::new("tab-layout-NEW", vec![], true);
    let store = ScriptedStore::new();
    let mut session = harness.layout_session("NEW", store.clone(), SessionOptions::default());
    session.initialize().await.unwrap();

    assert_eq!(session.delete().await.unwrap(), DeleteOutcome::Discarded);
    assert!(store.calls().is_empty());
    assert!(!harness.tabs.registry.contains(&"tab-layout-NEW".into()));
    assert_eq!(session.phase(), SessionPhase::Closed);
}

#[tokio::test]
async fn transport_failure_on_delete_is_reported() {
    let harness = Harness::new("tab-layout-7", vec![], true);
    let store = ScriptedStore::new();
    store
        .expect_fetch(Ok(stored_layout("7", "Article")))
        .expect_delete(Err(anyhow!("timeout")));
    let mut session = harness.layout_session("7", store.clone(), SessionOptions::default());
    session.initialize().await.unwrap();

    let err = session.delete().await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::Transport {
            operation: Operation::Delete,
            ..
        }
    ));
    assert_eq!(harness.tabs.notifications(), vec!["Error while deleting"]);
    assert_eq!(session.phase(), SessionPhase::Ready);
    assert!(session.document().is_some());
}

#[tokio::test]
async fn dropped_save_blocks_until_abandoned() {
    let harness = Harness::new("tab-layout-NEW", vec![], true);
    let mut session =
        harness.layout_session("NEW", Arc::new(StalledStore), SessionOptions::default());
    session.initialize().await.unwrap();
    session
        .modify(|layout| layout.okey = Some("k1".into()))
        .unwrap();

    let timed_out = tokio::time::timeout(Duration::from_millis(20), session.save()).await;
    assert!(timed_out.is_err());
    assert_eq!(session.phase(), SessionPhase::Saving);
    assert!(session.is_loading());

    assert!(matches!(
        session.save().await,
        Err(SessionError::OperationInProgress(Operation::Save))
    ));
    assert!(matches!(
        session.delete().await,
        Err(SessionError::OperationInProgress(Operation::Save))
    ));

    assert!(session.abandon_pending());
    assert_eq!(session.phase(), SessionPhase::Ready);
    assert!(!session.is_loading());
    assert!(session.is_dirty());
    assert!(!session.abandon_pending());
}

#[tokio::test]
async fn navigation_is_forwarded() {
    let harness = Harness::new("tab-layout-NEW", vec![], true);
    let session = harness.layout_session("NEW", ScriptedStore::new(), SessionOptions::default());

    session.navigate_to("/layouts");

    assert_eq!(harness.tabs.registry.navigation_history(), vec!["/layouts"]);
}
