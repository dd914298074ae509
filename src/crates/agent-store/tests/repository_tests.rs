//! Integration tests for the domain repository

mod common;

use agent_store::models::tool::GROUP_KIND_MCP_SERVER;
use agent_store::{
    Agent, AgentType, Event, EventListOptions, LangGraphCheckpoint, Session, StoreError, Task,
    ToolServer,
};
use chrono::{Duration, TimeZone, Utc};
use common::setup_test_store;
use serde_json::json;

#[tokio::test]
async fn test_agent_type_update_keeps_single_row() {
    let (_temp, _manager, repo) = setup_test_store().await;

    repo.store_agent(&Agent::new("a1", AgentType::Declarative))
        .await
        .unwrap();
    assert_eq!(repo.get_agent("a1").await.unwrap().agent_type, "declarative");

    repo.store_agent(&Agent::new("a1", AgentType::Byo)).await.unwrap();
    assert_eq!(repo.get_agent("a1").await.unwrap().agent_type, "byo");

    assert_eq!(repo.list_agents().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_checkpoint_retry_and_conflict() {
    let (_temp, _manager, repo) = setup_test_store().await;
    let ck1 = LangGraphCheckpoint::new("alice", "thread", "", "0001")
        .with_state("json", r#"{"v":1}"#)
        .with_metadata(r#"{"step":1}"#);

    repo.store_checkpoint(&ck1).await.unwrap();
    repo.store_checkpoint(&ck1).await.unwrap();

    let changed = ck1.clone().with_metadata(r#"{"step":2}"#);
    let err = repo.store_checkpoint(&changed).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[tokio::test]
async fn test_session_with_tasks_and_events() {
    let (_temp, _manager, repo) = setup_test_store().await;

    let session = Session::new("s1", "alice").with_agent("a1").with_name("triage");
    repo.store_session(&session).await.unwrap();

    let task = Task::new("t1", &json!({"status": {"state": "working"}}))
        .unwrap()
        .with_session("s1");
    repo.store_task(&task).await.unwrap();

    let events: Vec<Event> = (0..5)
        .map(|i| {
            Event::generate("s1", "alice", &json!({"seq": i}))
                .unwrap()
                .with_task("t1")
        })
        .collect();
    repo.store_events(&events).await.unwrap();

    let stored = repo
        .list_events_for_session("s1", "alice", &EventListOptions::new())
        .await
        .unwrap();
    assert_eq!(stored.len(), 5);
    assert!(stored.iter().all(|e| e.task_id.as_deref() == Some("t1")));

    assert_eq!(repo.list_tasks_for_session("s1").await.unwrap().len(), 1);
    assert_eq!(
        repo.list_sessions_for_agent("a1", "alice").await.unwrap()[0].name.as_deref(),
        Some("triage")
    );
}

#[tokio::test]
async fn test_event_ordering_and_polling() {
    let (_temp, _manager, repo) = setup_test_store().await;
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();

    // Interleaved insertion order, several events sharing a timestamp
    let offsets = [3, 0, 7, 3, 1, 7, 5];
    let events: Vec<Event> = offsets
        .iter()
        .enumerate()
        .map(|(i, minutes)| {
            Event::new(format!("e{}", i), "s1", "alice", &json!({}))
                .unwrap()
                .with_created_at(base + Duration::minutes(*minutes))
        })
        .collect();
    repo.store_events(&events).await.unwrap();

    let newest_first = repo
        .list_events_for_session("s1", "alice", &EventListOptions::new())
        .await
        .unwrap();
    let times: Vec<_> = newest_first
        .iter()
        .map(|e| e.created_time().unwrap())
        .collect();
    assert!(times.windows(2).all(|w| w[0] >= w[1]));

    let cutoff = base + Duration::minutes(3);
    let polled = repo
        .list_events_for_session("s1", "alice", &EventListOptions::new().after(cutoff).ascending())
        .await
        .unwrap();
    assert_eq!(polled.len(), 3);
    assert!(polled.iter().all(|e| e.created_time().unwrap() > cutoff));
    assert!(polled
        .windows(2)
        .all(|w| w[0].created_at <= w[1].created_at));
}

#[tokio::test]
async fn test_not_found_is_distinguishable_from_storage_failure() {
    let (_temp, manager, repo) = setup_test_store().await;

    let err = repo.get_session("missing", "alice").await.unwrap_err();
    assert!(err.is_not_found());

    manager.close().await;
    let err = repo.get_session("missing", "alice").await.unwrap_err();
    assert!(err.is_storage());
}

#[tokio::test]
async fn test_reset_with_recreate_empties_store() {
    let (_temp, manager, repo) = setup_test_store().await;
    repo.store_agent(&Agent::new("a1", AgentType::Byo)).await.unwrap();

    manager.reset(true).await.unwrap();

    assert!(repo.list_agents().await.unwrap().is_empty());
    assert!(repo.get_agent("a1").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_records_without_optional_fields_read_back() {
    let (_temp, _manager, repo) = setup_test_store().await;

    let session = Session::new("s1", "alice");
    repo.store_session(&session).await.unwrap();
    let stored = repo.get_session("s1", "alice").await.unwrap();
    assert_eq!((stored.name, stored.agent_id), (None, None));
    assert_eq!(repo.list_sessions("alice").await.unwrap().len(), 1);

    repo.store_task(&Task::new("t1", &json!({})).unwrap()).await.unwrap();
    assert_eq!(repo.get_task("t1").await.unwrap().session_id, None);

    let event = Event::new("e1", "s1", "alice", &json!({})).unwrap();
    repo.store_events(&[event]).await.unwrap();
    let events = repo
        .list_events_for_session("s1", "alice", &EventListOptions::new())
        .await
        .unwrap();
    assert_eq!(events[0].task_id, None);

    repo.store_checkpoint(&LangGraphCheckpoint::new("alice", "thread", "", "0001"))
        .await
        .unwrap();
    let history = repo
        .list_checkpoints("alice", "thread", "", None, 0)
        .await
        .unwrap();
    assert_eq!(history[0].checkpoint.parent_checkpoint_id, None);

    repo.store_tool_server(&ToolServer::new("srv", GROUP_KIND_MCP_SERVER))
        .await
        .unwrap();
    let servers = repo.list_tool_servers().await.unwrap();
    assert_eq!(servers[0].last_connected, None);
}
