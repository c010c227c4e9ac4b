mod common;

use axum::http::StatusCode;
use common::{Service, Sink};
use roomrelay::{
    db::{RecordFilter, RoomEntry, Store, TagRecord},
    tags::{Extracted, QueryMode},
    Config,
};

const ROOM: RecordFilter<'static> = RecordFilter {
    userbase_id: "ub",
    room_id: "room",
    sender_id: None,
};

async fn count(store: &Store, terms: &[&str], mode: QueryMode) -> usize {
    let terms: Vec<String> = terms.iter().map(|s| s.to_string()).collect();
    store.query_tag_records(ROOM, &terms, mode, 1000).await.unwrap().len()
}

/// A store with the room `ub:room` delivering to `sink`.
async fn room_store(sink: &Sink) -> Store {
    let store = Store::memory().await.unwrap();
    store.upsert_room(&RoomEntry::new("ub:room", "Room", &sink.url), "ub", "room").await.unwrap();
    store
}

#[tokio::test]
async fn bookmark_persists_explicit_tags() {
    let store = Store::memory().await.unwrap();
    let service = Service::start(Config::default(), Some(store.clone())).await;

    let (status, body) = service
        .send("/bookmark", "deploy failed #incident #prod", "ub:room", "alice")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    assert_eq!(count(&store, &["incident", "prod"], QueryMode::All).await, 1);
    assert_eq!(count(&store, &["deploy"], QueryMode::Any).await, 0);
}

#[tokio::test]
async fn bookmark_skips_untagged_and_directives() {
    let store = Store::memory().await.unwrap();
    let service = Service::start(Config::default(), Some(store.clone())).await;

    for message in ["just chatting about the deploy today", "#incident @ignore", "@quiet", ""] {
        let (status, _) = service
            .send("/bookmark?disableHashCheck=true", message, "ub:room", "alice")
            .await;
        assert_eq!(status, StatusCode::OK, "{message}");
    }

    assert_eq!(count(&store, &["incident", "deploy", "just"], QueryMode::Any).await, 0);
}

#[tokio::test]
async fn index_can_take_untagged_messages() {
    let store = Store::memory().await.unwrap();
    let config = Config {
        ignored_senders: vec!["bot".to_owned()],
        ..Config::default()
    };
    let service = Service::start(config, Some(store.clone())).await;

    let long = "the quick brown fox jumps over";
    service.send("/index", long, "ub:room", "alice").await;
    assert_eq!(count(&store, &["the"], QueryMode::Any).await, 0);

    service.send("/index?disableHashCheck=true", long, "ub:room", "alice").await;
    service.send("/index?disableHashCheck=true", "hello world", "ub:room", "alice").await;
    let from_bot = "bots say the same thing again";
    service.send("/index?disableHashCheck=true", from_bot, "ub:room", "bot").await;

    // 6 tokens at density 0.1 round to a single keyword, the first word
    assert_eq!(count(&store, &["the"], QueryMode::Any).await, 1);
    assert_eq!(count(&store, &["hello", "bots"], QueryMode::Any).await, 0);
}

#[tokio::test]
async fn index_requires_scope() {
    let service = Service::start(Config::default(), Some(Store::memory().await.unwrap())).await;
    let (status, body) = service
        .send("/index", "#tagged", "no-scope", "alice")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("missing userbase:room"), "{body}");
}

#[tokio::test]
async fn search_any_returns_only_matches() {
    let sink = Sink::start().await;
    let store = room_store(&sink).await;
    let service = Service::start(Config::default(), Some(store)).await;

    service.send("/bookmark", "db is down #incident", "ub:room", "alice").await;
    service.send("/bookmark", "rolled out #prod", "ub:room", "bob").await;

    let (status, _) = service
        .send("/search", "find #incident", "ub:room", "carol")
        .await;
    assert_eq!(status, StatusCode::OK);

    let results = sink.messages();
    assert_eq!(results.len(), 1);
    assert!(results[0].text.starts_with("showing 1 results:\n"), "{}", results[0].text);
    assert!(results[0].text.contains("db is down #incident"));
    assert!(!results[0].text.contains("rolled out"));
}

#[tokio::test]
async fn search_all_and_ordering() {
    let sink = Sink::start().await;
    let store = room_store(&sink).await;
    let service = Service::start(Config::default(), Some(store)).await;

    for message in ["one #db", "two #db #prod", "three #prod #db", "four #prod"] {
        service.send("/bookmark", message, "ub:room", "alice").await;
    }

    service.send("/search", "#db + #prod", "ub:room", "alice").await;
    service.send("/search", "#db", "ub:room", "alice").await;

    let results = sink.messages();
    assert_eq!(results.len(), 2);

    let all = &results[0].text;
    assert!(all.starts_with("showing 2 results:\n"), "{all}");
    assert!(all.find("three").unwrap() < all.find("two").unwrap());

    let any = &results[1].text;
    assert!(any.starts_with("showing 3 results:\n"), "{any}");
    let at = |word: &str| any.find(word).unwrap();
    assert!(at("three") < at("two") && at("two") < at("one"));
}

#[tokio::test]
async fn search_self_scope_and_explicit_target() {
    let room = Sink::start().await;
    let personal = Sink::start().await;
    let store = room_store(&room).await;
    let alice = RoomEntry::new("ub:alice", "Alice", &personal.url);
    store.upsert_room(&alice, "ub", "room").await.unwrap();
    let service = Service::start(Config::default(), Some(store)).await;

    service.send("/bookmark", "alice note #todo", "ub:room", "alice").await;
    service.send("/bookmark", "bob note #todo", "ub:room", "bob").await;

    // no target: results go to the requester's own room
    service.send("/search?scope=me", "#todo", "ub:room", "alice").await;
    // explicit target
    service.send("/search?target=ub:room", "#todo", "ub:room", "alice").await;

    let mine = personal.messages();
    assert_eq!(mine.len(), 1);
    assert!(mine[0].text.contains("alice note"));
    assert!(!mine[0].text.contains("bob note"));

    let everyone = room.messages();
    assert_eq!(everyone.len(), 1);
    assert!(everyone[0].text.starts_with("showing 2 results:\n"));
}

#[tokio::test]
async fn search_without_matches_or_terms_is_silent() {
    let sink = Sink::start().await;
    let store = room_store(&sink).await;
    let service = Service::start(Config::default(), Some(store)).await;

    service.send("/bookmark", "rolled out #prod", "ub:room", "bob").await;

    for query in ["#incident", "@search", "   "] {
        let (status, body) = service.send("/search", query, "ub:room", "bob").await;
        assert_eq!(status, StatusCode::OK, "{query}");
        assert!(body.is_empty());
    }
    assert!(sink.bodies().is_empty());
}

#[tokio::test]
async fn search_truncates_to_limit() {
    let sink = Sink::start().await;
    let store = room_store(&sink).await;
    for i in 0..120 {
        let record = TagRecord::new(
            "alice",
            ("ub", "room"),
            Extracted { tags: vec!["load".to_owned()], keywords: Vec::new() },
            &format!("load test {i}"),
        );
        store.insert_tag_record(&record).await.unwrap();
    }
    let config = Config {
        result_limit: 50,
        ..Config::default()
    };
    let service = Service::start(config, Some(store)).await;

    let (status, _) = service.send("/search", "#load", "ub:room", "alice").await;
    assert_eq!(status, StatusCode::OK);

    let results = sink.messages();
    assert_eq!(results.len(), 1);
    let text = &results[0].text;
    assert!(text.starts_with("showing 50 results, try refining search:\n"), "{text}");
    assert_eq!(text.matches(" >\n").count(), 50);
}
