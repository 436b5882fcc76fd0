use std::{
    sync::{Arc, Barrier, Mutex},
    thread,
    time::Duration,
};

use tablekit::{memory::InMemoryTable, prelude::*};
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq)]
struct Item {
    key: &'static str,
    weight: u32,
}

impl Record for Item {
    fn table_name() -> &'static str {
        "items"
    }
}

fn item(key: &'static str) -> Item {
    Item { key, weight: 0 }
}

fn weighted(key: &'static str, weight: u32) -> Item {
    Item { key, weight }
}

fn key_in(keys: &'static [&'static str]) -> Selection<Item> {
    Selection::new(move |item: &Item| keys.contains(&item.key))
}

fn keys(items: &[Item]) -> Vec<&'static str> {
    items.iter().map(|item| item.key).collect()
}

async fn table_of(items: &[&'static str]) -> InMemoryTable<Item> {
    let table = InMemoryTable::<Item>::new().unwrap();
    for key in items {
        // Not awaited: submission order alone guarantees the inserts land first.
        let _ = table.insert(item(key));
    }
    table
}

#[tokio::test]
async fn basic_scenario() {
    let table = table_of(&["A", "B", "C", "D"]).await;

    assert_eq!(table.count().await.unwrap(), 4);
    assert_eq!(keys(&table.find_all().await.unwrap()), vec!["A", "B", "C", "D"]);

    assert_eq!(table.delete_all_matching(key_in(&["B", "D"])).await.unwrap(), 2);
    assert_eq!(keys(&table.find_all().await.unwrap()), vec!["A", "C"]);

    assert!(table.delete_first_matching(key_in(&["C"])).await.unwrap());
    assert_eq!(keys(&table.find_all().await.unwrap()), vec!["A"]);

    assert!(!table.delete_first_matching(key_in(&["Z"])).await.unwrap());
    assert_eq!(keys(&table.find_all().await.unwrap()), vec!["A"]);
}

#[tokio::test]
async fn inserts_preserve_order() {
    let table = InMemoryTable::<Item>::new().unwrap();
    let expected: Vec<Item> = (0..200).map(|n| weighted("n", n)).collect();

    for record in expected.iter().cloned() {
        let _ = table.insert(record);
    }

    assert_eq!(table.count().await.unwrap(), 200);
    assert_eq!(table.find_all().await.unwrap(), expected);
}

#[tokio::test]
async fn empty_table_is_total() {
    let table = InMemoryTable::<Item>::new().unwrap();

    assert_eq!(table.count().await.unwrap(), 0);
    assert_eq!(table.count_matching(key_in(&["A"])).await.unwrap(), 0);
    assert!(table.find_all().await.unwrap().is_empty());
    assert!(table.find_all_matching(key_in(&["A"])).await.unwrap().is_empty());
    assert_eq!(table.find_first_matching(key_in(&["A"])).await.unwrap(), None);
    assert_eq!(table.delete_all().await.unwrap(), 0);
    assert_eq!(table.delete_all_matching(key_in(&["A"])).await.unwrap(), 0);
    assert!(!table.delete_first_matching(key_in(&["A"])).await.unwrap());
}

#[tokio::test]
async fn queries_agree_with_each_other() {
    let table = InMemoryTable::<Item>::new().unwrap();
    table
        .insert_all((0..30).map(|n| weighted("n", n)).collect())
        .await
        .unwrap();

    let heavy = |item: &Item| item.weight % 7 == 3;
    let matching = table.find_all_matching(heavy).await.unwrap();

    assert_eq!(table.count_matching(heavy).await.unwrap(), matching.len());
    assert_eq!(
        table.find_first_matching(heavy).await.unwrap(),
        matching.first().cloned()
    );
    assert_eq!(
        matching.iter().map(|item| item.weight).collect::<Vec<_>>(),
        vec![3, 10, 17, 24]
    );

    let nothing = |item: &Item| item.weight > 100;
    assert!(table.find_all_matching(nothing).await.unwrap().is_empty());
    assert_eq!(table.find_first_matching(nothing).await.unwrap(), None);
}

#[tokio::test]
async fn delete_all_matching_removes_exactly_the_matches() {
    let table = table_of(&["a", "x", "b", "x", "x", "c", "x"]).await;
    let is_x = key_in(&["x"]);

    let before = table.find_all_matching(is_x.clone()).await.unwrap();
    let removed = table.delete_all_matching(is_x.clone()).await.unwrap();

    assert_eq!(removed, before.len());
    assert!(table.find_all_matching(is_x).await.unwrap().is_empty());
    assert_eq!(keys(&table.find_all().await.unwrap()), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn delete_first_matching_removes_the_first_match() {
    let table = InMemoryTable::<Item>::new().unwrap();
    table
        .insert_all(vec![weighted("a", 1), weighted("b", 1), weighted("b", 2), weighted("c", 1)])
        .await
        .unwrap();

    let is_b = key_in(&["b"]);
    let first = table.find_first_matching(is_b.clone()).await.unwrap();
    assert_eq!(first, Some(weighted("b", 1)));

    assert!(table.delete_first_matching(is_b).await.unwrap());
    assert_eq!(
        table.find_all().await.unwrap(),
        vec![weighted("a", 1), weighted("b", 2), weighted("c", 1)]
    );
}

#[tokio::test]
async fn delete_all_reports_previous_size() {
    let table = table_of(&["a", "b", "c"]).await;

    assert_eq!(table.delete_all().await.unwrap(), 3);
    assert_eq!(table.count().await.unwrap(), 0);
    assert!(table.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn reads_are_snapshots() {
    let table = table_of(&["a", "b"]).await;

    let mut snapshot = table.find_all().await.unwrap();
    snapshot[0].weight = 99;
    snapshot.clear();

    assert_eq!(table.find_all().await.unwrap(), vec![item("a"), item("b")]);
}

#[tokio::test]
async fn later_operations_observe_earlier_effects() {
    let table = InMemoryTable::<Item>::new().unwrap();

    // A slow completion on the first operation must not let the second one
    // run against a stale store.
    table
        .insert_with(item("a"), || thread::sleep(Duration::from_millis(50)))
        .unwrap();
    let count = table.count();
    let deleted = table.delete_all();
    let after = table.count();

    assert_eq!(count.await.unwrap(), 1);
    assert_eq!(deleted.await.unwrap(), 1);
    assert_eq!(after.await.unwrap(), 0);
}

#[tokio::test]
async fn callbacks_run_once_on_the_response_thread() {
    let table = table_of(&["a", "b", "c"]).await;
    let (tx, rx) = oneshot::channel();

    table
        .count_matching_with(key_in(&["a", "c"]), move |count| {
            let thread_name = thread::current().name().map(str::to_owned);
            tx.send((count, thread_name)).unwrap();
        })
        .unwrap();

    let (count, thread_name) = rx.await.unwrap();
    assert_eq!(count, 2);
    assert_eq!(thread_name.as_deref(), Some("items-responses"));
}

#[tokio::test]
async fn callbacks_are_delivered_in_submission_order() {
    let table = InMemoryTable::<Item>::new().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let (tx, rx) = oneshot::channel();

    for n in 0..20 {
        let log = Arc::clone(&log);
        table
            .insert_with(weighted("n", n), move || log.lock().unwrap().push(n))
            .unwrap();
    }
    table
        .find_all_with(move |items| tx.send(items.len()).unwrap())
        .unwrap();

    assert_eq!(rx.await.unwrap(), 20);
    assert_eq!(*log.lock().unwrap(), (0..20).collect::<Vec<_>>());
}

#[tokio::test]
async fn every_callback_form_delivers() {
    let table = table_of(&["a", "b", "c", "b"]).await;
    let (tx, rx) = oneshot::channel::<Vec<String>>();
    let log = Arc::new(Mutex::new(Vec::new()));

    let push = |log: &Arc<Mutex<Vec<String>>>, entry: String| log.lock().unwrap().push(entry);

    let l = Arc::clone(&log);
    table.count_with(move |n| push(&l, format!("count {n}"))).unwrap();
    let l = Arc::clone(&log);
    table
        .find_first_matching_with(key_in(&["b"]), move |found| {
            push(&l, format!("first {:?}", found.map(|item| item.key)))
        })
        .unwrap();
    let l = Arc::clone(&log);
    table
        .find_all_matching_with(key_in(&["b"]), move |found| push(&l, format!("all {}", found.len())))
        .unwrap();
    let l = Arc::clone(&log);
    table
        .delete_first_matching_with(key_in(&["b"]), move |removed| push(&l, format!("delete first {removed}")))
        .unwrap();
    let l = Arc::clone(&log);
    table
        .delete_all_matching_with(key_in(&["b"]), move |removed| push(&l, format!("delete matching {removed}")))
        .unwrap();
    let l = Arc::clone(&log);
    table
        .insert_all_with(vec![item("d")], move |inserted| push(&l, format!("insert all {inserted}")))
        .unwrap();
    let l = Arc::clone(&log);
    table.delete_all_with(move |removed| push(&l, format!("delete all {removed}"))).unwrap();
    table
        .find_all_with(move |_| tx.send(log.lock().unwrap().clone()).unwrap())
        .unwrap();

    assert_eq!(
        rx.await.unwrap(),
        vec![
            "count 4",
            "first Some(\"b\")",
            "all 2",
            "delete first true",
            "delete matching 1",
            "insert all 1",
            "delete all 3",
        ]
    );
}

#[tokio::test]
async fn dropped_completions_still_execute() {
    let table = InMemoryTable::<Item>::new().unwrap();

    drop(table.insert(item("a")));
    drop(table.insert(item("b")));

    assert_eq!(table.count().await.unwrap(), 2);
}

#[tokio::test]
async fn clones_share_one_table() {
    let table = InMemoryTable::<Item>::new().unwrap();
    let other = table.clone();

    other.insert(item("a")).await.unwrap();

    assert_eq!(table.count().await.unwrap(), 1);
    assert_eq!(table.name(), other.name());
}

#[tokio::test]
async fn tables_are_independent() {
    let first = table_of(&["a", "b"]).await;
    let second = table_of(&["c"]).await;

    assert_eq!(first.delete_all().await.unwrap(), 2);
    assert_eq!(keys(&second.find_all().await.unwrap()), vec!["c"]);
}

#[tokio::test]
async fn shutdown_drains_then_closes() {
    let table = InMemoryTable::<Item>::new().unwrap();

    let inserted = table.insert(item("a"));
    let count = table.count();
    table.shutdown().await.unwrap();

    inserted.await.unwrap();
    assert_eq!(count.await.unwrap(), 1);
    assert!(table.is_closed());
    assert_eq!(
        table.insert(item("b")).await,
        Err(TableError::Closed("items".to_string()))
    );
    assert_eq!(
        table.count_with(|_| {}),
        Err(TableError::Closed("items".to_string()))
    );
}

#[tokio::test]
async fn operations_racing_shutdown_run_or_are_refused() {
    let table = InMemoryTable::<Item>::new().unwrap();

    let shutdown = table.shutdown();
    let late = table.insert(item("late"));

    shutdown.await.unwrap();
    match late.await {
        Ok(()) => {}
        Err(error) => assert_eq!(error, TableError::Closed("items".to_string())),
    }
    assert_eq!(
        table.count().await,
        Err(TableError::Closed("items".to_string()))
    );
}

#[tokio::test]
async fn callbacks_accepted_before_shutdown_still_run() {
    let table = table_of(&["a"]).await;
    let gate = Arc::new(Barrier::new(2));
    let worker_gate = Arc::clone(&gate);
    let counted = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&counted);

    // Hold the worker inside a predicate so the next submissions are queued
    // behind the shutdown rather than refused.
    let held = table.count_matching(move |_: &Item| {
        worker_gate.wait();
        true
    });
    let shutdown = table.shutdown();
    let submitted = table.count_with(move |count| *sink.lock().unwrap() = Some(count));
    gate.wait();

    assert_eq!(submitted, Ok(()));
    assert_eq!(held.await, Ok(1));
    shutdown.await.unwrap();
    assert_eq!(*counted.lock().unwrap(), Some(1));
}

#[tokio::test]
async fn panicking_predicate_closes_the_table() {
    let table = table_of(&["a"]).await;

    let result = table
        .count_matching(|_: &Item| -> bool { panic!("predicate failure") })
        .await;
    assert_eq!(result, Err(TableError::OperationDropped("items".to_string())));

    assert!(table.count().await.is_err());
}

#[tokio::test]
async fn builder_settings() {
    let table = InMemoryTable::<Item>::builder()
        .name("inventory")
        .initial_capacity(16)
        .responder(InlineResponder)
        .spawn()
        .unwrap();
    let (tx, rx) = oneshot::channel();

    assert_eq!(table.name(), "inventory");

    table
        .insert_with(item("a"), move || {
            tx.send(thread::current().name().map(str::to_owned)).unwrap();
        })
        .unwrap();

    assert_eq!(rx.await.unwrap().as_deref(), Some("inventory-operations"));
}

#[tokio::test]
async fn builder_from_config() {
    let config: TableConfig =
        serde_json::from_str(r#"{ "name": "configured", "response": "inline" }"#).unwrap();
    let table = InMemoryTableBuilder::<Item>::from_config(config).build().await.unwrap();

    assert_eq!(table.name(), "configured");
    table.insert(item("a")).await.unwrap();
    assert_eq!(table.count().await.unwrap(), 1);
}

#[tokio::test]
async fn nul_in_configured_name_is_rejected() {
    let config: TableConfig = serde_json::from_str(r#"{ "name": "a\u0000b" }"#).unwrap();

    let result = InMemoryTableBuilder::<Item>::from_config(config).spawn();

    assert!(matches!(result, Err(TableError::Initialization(_))));
}

#[tokio::test]
async fn shared_serial_responder() {
    let responder = SerialResponder::spawn("shared").unwrap();
    let first = InMemoryTable::<Item>::builder()
        .name("first")
        .responder(responder.clone())
        .spawn()
        .unwrap();
    let second = InMemoryTable::<Item>::builder()
        .name("second")
        .responder(responder)
        .spawn()
        .unwrap();
    let (tx, rx) = oneshot::channel();

    first.insert(item("a")).await.unwrap();
    second
        .count_with(move |_| tx.send(thread::current().name().map(str::to_owned)).unwrap())
        .unwrap();

    assert_eq!(rx.await.unwrap().as_deref(), Some("shared-responses"));
}

async fn purge<B: RecordTable<Item>>(table: &B, keys: Selection<Item>) -> TableResult<usize> {
    let removed = table.delete_all_matching(keys).await?;
    table.insert(item("marker")).await?;

    Ok(removed)
}

#[tokio::test]
async fn usable_through_the_table_trait() {
    let table = table_of(&["a", "b", "a"]).await;

    assert_eq!(purge(&table, key_in(&["a"])).await.unwrap(), 2);
    assert_eq!(
        RecordTable::find_all(&table).await.unwrap(),
        vec![item("b"), item("marker")]
    );
    assert_eq!(
        RecordTable::count_matching(&table, Selection::all()).await.unwrap(),
        2
    );
}

#[tokio::test]
async fn composed_selections() {
    let table = InMemoryTable::<Item>::new().unwrap();
    table
        .insert_all(vec![weighted("a", 1), weighted("b", 5), weighted("a", 9)])
        .await
        .unwrap();

    let light_a = key_in(&["a"]).and(|item: &Item| item.weight < 5);
    assert_eq!(table.find_all_matching(light_a).await.unwrap(), vec![weighted("a", 1)]);

    let not_a = key_in(&["a"]).not();
    assert_eq!(table.delete_all_matching(not_a).await.unwrap(), 1);
    assert_eq!(keys(&table.find_all().await.unwrap()), vec!["a", "a"]);
}

#[cfg(feature = "tokio")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tokio_responder_delivers_on_the_runtime() {
    let table = InMemoryTable::<Item>::builder()
        .responder(TokioResponder::current())
        .spawn()
        .unwrap();
    let (tx, rx) = oneshot::channel();

    table.insert(item("a")).await.unwrap();
    table
        .count_with(move |count| tx.send((count, tokio::runtime::Handle::try_current().is_ok())).unwrap())
        .unwrap();

    assert_eq!(rx.await.unwrap(), (1, true));
}
