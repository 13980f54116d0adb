//! The reference conversation service wired to in-memory collaborators.

mod common;

use async_trait::async_trait;
use chat_orchestrator::facade::{
    ConversationService, HistoryStore, InMemoryHistoryStore, InMemoryProfiles, InMemoryUserGate,
    InboundMessage, ProfileProvider, Reply,
};
use chat_orchestrator::resilience::ManualClock;
use chat_orchestrator::{Error, ErrorContext, Turn};
use common::*;
use std::sync::Arc;
use std::time::Duration;

const PERSONA: &str = "You are Alice, a cheerful companion.";

struct BrokenHistory;

#[async_trait]
impl HistoryStore for BrokenHistory {
    async fn get_recent_turns(
        &self,
        _conversation_id: &str,
        _since_marker: Option<u64>,
    ) -> chat_orchestrator::Result<Vec<Turn>> {
        Err(Error::runtime_with_context(
            "database offline",
            ErrorContext::new().with_source("history"),
        ))
    }
}

struct BrokenProfiles;

#[async_trait]
impl ProfileProvider for BrokenProfiles {
    async fn get_personalization_text(
        &self,
        _user_id: &str,
    ) -> chat_orchestrator::Result<Option<String>> {
        Err(Error::runtime_with_context("profile service down", ErrorContext::new()))
    }
}

struct Fixture {
    transport: Arc<ScriptedTransport>,
    clock: Arc<ManualClock>,
    history: Arc<InMemoryHistoryStore>,
    profiles: Arc<InMemoryProfiles>,
    service: ConversationService,
}

fn fixture(replies: Vec<&str>) -> Fixture {
    let transport = ScriptedTransport::new(replies.into_iter().map(|r| ok(chat_reply(r))).collect());
    let clock = Arc::new(ManualClock::new());
    let history = Arc::new(InMemoryHistoryStore::new());
    let profiles = Arc::new(InMemoryProfiles::new());
    let orch = orchestrator(chat_config(), transport.clone(), clock.clone());
    let service = ConversationService::new(
        Arc::new(orch),
        history.clone(),
        profiles.clone(),
        Arc::new(InMemoryUserGate::with_clock(Duration::from_secs(3), clock.clone())),
        PERSONA,
    );
    Fixture {
        transport,
        clock,
        history,
        profiles,
        service,
    }
}

#[tokio::test]
async fn reply_uses_history_since_reset_and_profile() {
    let f = fixture(vec!["Try Frieren!"]);
    f.history.push("u1", Turn::user("I am sad"));
    f.history.push("u1", Turn::assistant("Sorry to hear that."));
    let marker = f.history.reset("u1");
    f.history.push("u1", Turn::user("Hi again"));
    f.history.push("u1", Turn::assistant("Welcome back!"));
    f.profiles.set("u1", "Loves anime");

    let message = InboundMessage::new("u1", "Recommend a show").since(marker);
    let (reply, stats) = f.service.respond_with_stats(&message).await;

    assert_eq!(reply.text(), Some("Try Frieren!"));
    let stats = stats.expect("a call was made");
    assert_eq!(stats.history_total, 2);

    let messages = f.transport.last_body()["messages"].as_array().unwrap().clone();
    assert_eq!(messages.len(), 4);
    let system = messages[0]["content"].as_str().unwrap();
    assert!(system.starts_with(PERSONA));
    assert!(system.ends_with("Loves anime"));
    assert_eq!(messages[1]["content"], "Hi again");
    assert_eq!(messages[3]["content"], "Recommend a show");
}

#[tokio::test]
async fn second_message_within_cooldown_is_throttled() {
    let f = fixture(vec!["first", "second"]);
    let message = InboundMessage::new("u1", "hello");

    assert_eq!(f.service.respond(&message).await.text(), Some("first"));

    f.clock.advance(Duration::from_secs(1));
    match f.service.respond(&message).await {
        Reply::Throttled { retry_in } => assert_eq!(retry_in, Duration::from_secs(2)),
        other => panic!("expected throttle, got {:?}", other),
    }
    assert_eq!(f.transport.calls(), 1);

    // Other users are unaffected.
    let other = InboundMessage::new("u2", "hello");
    assert_eq!(f.service.respond(&other).await.text(), Some("second"));
    assert_eq!(f.transport.calls(), 2);
}

#[tokio::test]
async fn failing_collaborators_degrade_to_bare_request() {
    let transport = ScriptedTransport::new(vec![ok(chat_reply("still here"))]);
    let orch = orchestrator(chat_config(), transport.clone(), Arc::new(ManualClock::new()));
    let service = ConversationService::new(
        Arc::new(orch),
        Arc::new(BrokenHistory),
        Arc::new(BrokenProfiles),
        Arc::new(InMemoryUserGate::default()),
        PERSONA,
    );

    let reply = service.respond(&InboundMessage::new("u1", "ping")).await;
    assert_eq!(reply.text(), Some("still here"));

    let messages = transport.last_body()["messages"].as_array().unwrap().clone();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], PERSONA);
}

#[tokio::test]
async fn group_messages_read_the_group_history() {
    let f = fixture(vec!["group answer"]);
    f.history.push("group-7", Turn::user("someone else said this"));
    f.history.push("u1", Turn::user("private note"));

    let message = InboundMessage::new("u1", "what did they say?").in_conversation("group-7");
    f.service.respond(&message).await;

    let messages = f.transport.last_body()["messages"].as_array().unwrap().clone();
    assert_eq!(messages[1]["content"], "someone else said this");
    assert_eq!(messages.len(), 3);
}
