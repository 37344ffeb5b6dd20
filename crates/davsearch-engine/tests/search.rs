//! End-to-end searches through the in-memory backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use davsearch_backend::{
    BoxFuture, CalendarObjectStore, ContainerLister, MemoryStore, StoreResult,
};
use davsearch_core::{
    CalendarContainer, CalendarObject, ComponentType, ComponentTypes, ContainerRef, Principal,
    SearchParameters, SearchQuery,
};
use davsearch_engine::{EngineConfig, SearchEngine, SearchError, SearchPage};

fn alice() -> Principal {
    Principal::for_user("alice").unwrap()
}

fn vevent(uid: &str, summary: &str) -> String {
    format!(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//davsearch//tests//EN\r\nBEGIN:VEVENT\r\nUID:{uid}\r\nDTSTART:20250205T100000Z\r\nSUMMARY:{summary}\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n"
    )
}

fn events_query(term: &str) -> SearchQuery {
    SearchQuery::builder(term)
        .component_type(ComponentType::Event)
        .properties(["SUMMARY", "LOCATION", "DESCRIPTION"])
        .build()
}

async fn put_event(store: &MemoryStore, container: ContainerRef, uri: &str, summary: &str) {
    store
        .put_object(CalendarObject::new(
            container,
            uri,
            ComponentType::Event,
            vevent(uri, summary),
        ))
        .await
        .unwrap();
}

/// Two calendars holding ten "Standup" events between them, plus noise.
async fn ten_matches() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .add_container(CalendarContainer::calendar(1, "work", alice()).with_order(0))
        .await;
    store
        .add_container(CalendarContainer::calendar(2, "team", alice()).with_order(1))
        .await;

    for i in 0..6 {
        put_event(&store, ContainerRef::calendar(1), &format!("w{i}.ics"), "Daily standup").await;
    }
    for i in 0..4 {
        put_event(&store, ContainerRef::calendar(2), &format!("t{i}.ics"), "Standup (remote)").await;
    }
    put_event(&store, ContainerRef::calendar(1), "other.ics", "Dentist").await;
    store
}

fn engine(store: Arc<MemoryStore>) -> SearchEngine<Arc<MemoryStore>, Arc<MemoryStore>> {
    SearchEngine::new(store.clone(), store, EngineConfig::default())
}

fn uris(page: &SearchPage) -> Vec<String> {
    page.hits.iter().map(|h| h.object.uri.clone()).collect()
}

#[tokio::test]
async fn pages_walk_the_whole_result_set() {
    let engine = engine(ten_matches().await);
    let mut query = events_query("standup");
    query.limit = 4;

    let mut sizes = Vec::new();
    let mut offsets = Vec::new();
    let mut seen = Vec::new();
    let mut offset = 0;
    for _ in 0..4 {
        let page = engine
            .search(&alice(), &query.at_offset(offset))
            .await
            .unwrap();
        assert!(page.len() <= query.limit);
        assert_eq!(page.next_offset, offset + page.len());
        sizes.push(page.len());
        offsets.push(page.next_offset);
        seen.extend(uris(&page));
        offset = page.next_offset;
    }

    assert_eq!(sizes, vec![4, 4, 2, 0]);
    assert_eq!(offsets, vec![4, 8, 10, 10]);

    let mut full_query = events_query("standup");
    full_query.limit = 50;
    let full = engine.search(&alice(), &full_query).await.unwrap();
    assert_eq!(seen, uris(&full));
    assert_eq!(
        seen,
        vec![
            "w0.ics", "w1.ics", "w2.ics", "w3.ics", "w4.ics", "w5.ics", "t0.ics", "t1.ics",
            "t2.ics", "t3.ics"
        ]
    );
}

#[tokio::test]
async fn repeated_searches_are_identical() {
    let engine = engine(ten_matches().await);
    let query = events_query("standup").at_offset(3);

    let first = engine.search(&alice(), &query).await.unwrap();
    let second = engine.search(&alice(), &query).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn term_is_a_case_insensitive_substring() {
    let store = Arc::new(MemoryStore::new());
    store
        .add_container(CalendarContainer::calendar(1, "personal", alice()))
        .await;
    put_event(&store, ContainerRef::calendar(1), "sync.ics", "Team Sync").await;
    put_event(&store, ContainerRef::calendar(1), "work.ics", "Teamwork").await;
    let engine = engine(store);

    for (term, expected) in [
        ("team", vec!["sync.ics", "work.ics"]),
        ("TEAM SYNC", vec!["sync.ics"]),
        ("m Sy", vec!["sync.ics"]),
        ("team ", vec!["sync.ics"]),
    ] {
        let page = engine.search(&alice(), &events_query(term)).await.unwrap();
        assert_eq!(uris(&page), expected, "term {term:?}");
    }
    for term in ["teams", "  team  ", " team", "sync "] {
        let page = engine.search(&alice(), &events_query(term)).await.unwrap();
        assert!(page.is_empty(), "term {term:?} should not match");
    }
}

#[tokio::test]
async fn todo_search_over_event_calendar_is_empty() {
    let engine = engine(ten_matches().await);
    let query = SearchQuery::builder("standup")
        .component_type(ComponentType::Todo)
        .properties(["SUMMARY"])
        .build();

    let page = engine.search(&alice(), &query).await.unwrap();
    assert!(page.is_empty());
    assert_eq!(page.next_offset, 0);
}

#[tokio::test]
async fn attendee_common_name_matches() {
    let store = Arc::new(MemoryStore::new());
    store
        .add_container(CalendarContainer::calendar(1, "personal", alice()))
        .await;
    let data = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:review\r\nSUMMARY:Quarterly review\r\nATTENDEE;CN=\"Bob Jones\";ROLE=REQ-PARTICIPANT:mailto:bj@example.com\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
    store
        .put_object(
            CalendarObject::from_ics(ContainerRef::calendar(1), "review.ics", data).unwrap(),
        )
        .await
        .unwrap();
    let engine = engine(store);

    let query = SearchQuery::builder("bob")
        .component_type(ComponentType::Event)
        .properties(["SUMMARY"])
        .parameters(SearchParameters::new().with("ATTENDEE", ["CN"]))
        .build();
    let page = engine.search(&alice(), &query).await.unwrap();
    assert_eq!(page.len(), 1);
    let matched = &page.hits[0].matched;
    assert_eq!(matched.property, "ATTENDEE");
    assert_eq!(matched.parameter.as_deref(), Some("CN"));
    assert_eq!(matched.value, "Bob Jones");

    // Without the parameter mapping the attendee is invisible.
    let page = engine.search(&alice(), &events_query("bob")).await.unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn store_outage_fails_the_whole_search() {
    let store = ten_matches().await;
    store.set_available(false);
    let engine = engine(store);

    let err = engine
        .search(&alice(), &events_query("standup"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::StoreUnavailable(ref e) if e.is_unavailable()));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn principal_without_containers_gets_an_empty_page() {
    let engine = engine(ten_matches().await);
    let bob = Principal::for_user("bob").unwrap();

    let page = engine
        .search(&bob, &events_query("standup").at_offset(7))
        .await
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.next_offset, 7);
}

#[tokio::test]
async fn parallel_and_sequential_scans_agree() {
    let store = ten_matches().await;
    let parallel = SearchEngine::new(store.clone(), store.clone(), EngineConfig::default());
    let sequential = SearchEngine::new(
        store.clone(),
        store,
        EngineConfig::default().with_parallel_scan(false),
    );

    for offset in [0, 3, 9] {
        let mut query = events_query("standup").at_offset(offset);
        query.limit = 4;
        assert_eq!(
            parallel.search(&alice(), &query).await.unwrap(),
            sequential.search(&alice(), &query).await.unwrap()
        );
    }
}

#[tokio::test]
async fn calendars_sort_before_subscriptions_on_equal_order() {
    let store = Arc::new(MemoryStore::new());
    store
        .add_container(CalendarContainer::subscription(1, "holidays", alice()))
        .await;
    store
        .add_container(CalendarContainer::calendar(1, "personal", alice()))
        .await;
    put_event(&store, ContainerRef::subscription(1), "a.ics", "Holiday party").await;
    put_event(&store, ContainerRef::calendar(1), "b.ics", "Office party").await;
    let engine = engine(store);

    let page = engine.search(&alice(), &events_query("party")).await.unwrap();
    assert_eq!(uris(&page), vec!["b.ics", "a.ics"]);
    assert!(page.hits[1].container.read_only);
}

#[tokio::test]
async fn unparseable_objects_are_skipped() {
    let store = Arc::new(MemoryStore::new());
    store
        .add_container(CalendarContainer::calendar(1, "personal", alice()))
        .await;
    store
        .put_object(CalendarObject::new(
            ContainerRef::calendar(1),
            "broken.ics",
            ComponentType::Event,
            "BEGIN:VCALENDAR\r\nSUMMARY standup without colon",
        ))
        .await
        .unwrap();
    put_event(&store, ContainerRef::calendar(1), "ok.ics", "Standup").await;
    let engine = engine(store);

    let page = engine.search(&alice(), &events_query("standup")).await.unwrap();
    assert_eq!(uris(&page), vec!["ok.ics"]);
}

#[tokio::test]
async fn recurrence_overrides_are_not_searched() {
    let store = Arc::new(MemoryStore::new());
    store
        .add_container(CalendarContainer::calendar(1, "personal", alice()))
        .await;
    let data = "BEGIN:VCALENDAR\r\n\
                VERSION:2.0\r\n\
                BEGIN:VEVENT\r\n\
                UID:sync\r\n\
                DTSTART:20250205T100000Z\r\n\
                RRULE:FREQ=WEEKLY\r\n\
                SUMMARY:Team Sync\r\n\
                END:VEVENT\r\n\
                BEGIN:VEVENT\r\n\
                UID:sync\r\n\
                RECURRENCE-ID:20250212T100000Z\r\n\
                DTSTART:20250212T140000Z\r\n\
                SUMMARY:Team Sync (moved)\r\n\
                END:VEVENT\r\n\
                END:VCALENDAR\r\n";
    store
        .put_object(CalendarObject::new(
            ContainerRef::calendar(1),
            "sync.ics",
            ComponentType::Event,
            data,
        ))
        .await
        .unwrap();
    let engine = engine(store);

    let page = engine.search(&alice(), &events_query("team sync")).await.unwrap();
    assert_eq!(uris(&page), vec!["sync.ics"]);
    assert_eq!(page.hits[0].matched.value, "Team Sync");

    let page = engine.search(&alice(), &events_query("moved")).await.unwrap();
    assert!(page.is_empty());
    assert_eq!(page.next_offset, 0);
}

/// Counts every call that reaches the backend.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
}

impl ContainerLister for CountingStore {
    fn list_containers<'a>(
        &'a self,
        principal: &'a Principal,
    ) -> BoxFuture<'a, StoreResult<Vec<CalendarContainer>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_containers(principal)
    }
}

impl CalendarObjectStore for CountingStore {
    fn name(&self) -> &str {
        "counting"
    }

    fn list_objects<'a>(
        &'a self,
        containers: &'a [ContainerRef],
        component_types: &'a ComponentTypes,
    ) -> BoxFuture<'a, StoreResult<Vec<CalendarObject>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_objects(containers, component_types)
    }
}

#[tokio::test]
async fn invalid_queries_never_reach_the_store() {
    let store = Arc::new(CountingStore::default());
    store
        .inner
        .add_container(CalendarContainer::calendar(1, "personal", alice()))
        .await;
    let engine = SearchEngine::new(store.clone(), store.clone(), EngineConfig::default());

    let mut zero_limit = events_query("standup");
    zero_limit.limit = 0;
    let no_fields = SearchQuery::builder("standup")
        .component_type(ComponentType::Event)
        .build();

    for query in [events_query("   "), zero_limit, no_fields] {
        let err = engine.search(&alice(), &query).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery(_)), "{err}");
    }
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);

    engine
        .search(&alice(), &events_query("standup"))
        .await
        .unwrap();
    assert_eq!(store.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn other_principals_objects_stay_invisible() {
    let store = ten_matches().await;
    let bob = Principal::for_user("bob").unwrap();
    store
        .add_container(CalendarContainer::calendar(3, "bobs", bob.clone()))
        .await;
    put_event(&store, ContainerRef::calendar(3), "bob.ics", "Standup with Bob").await;
    let engine = engine(store);

    let mut query = events_query("standup");
    query.limit = 50;
    let alice_page = engine.search(&alice(), &query).await.unwrap();
    assert!(!uris(&alice_page).contains(&"bob.ics".to_string()));

    let bob_page = engine.search(&bob, &query).await.unwrap();
    assert_eq!(uris(&bob_page), vec!["bob.ics"]);
}
