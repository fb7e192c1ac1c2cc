// tests/query/events_test.rs
use std::sync::Arc;

use joinery::error::QueryError;
use joinery::model::{Container, ContainerId, Item, ItemId, Join, Position, TableRef};
use joinery::query::{ItemProperty, JoinProperty, Query, QueryEvent, QueryProperty};
use parking_lot::Mutex;

type Log = Arc<Mutex<Vec<QueryEvent>>>;

fn record(query: &Query) -> Log {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    query.subscribe(move |event| sink.lock().push(event.clone()));
    log
}

fn take(log: &Log) -> Vec<QueryEvent> {
    std::mem::take(&mut *log.lock())
}

fn count(events: &[QueryEvent], wanted: fn(&QueryEvent) -> bool) -> usize {
    events.iter().filter(|e| wanted(e)).count()
}

fn add(query: &mut Query, name: &str, columns: &[&str]) -> ContainerId {
    let container = Container::table(TableRef::new(name), columns.iter().copied());
    query.add_table(container, None).unwrap()
}

fn item(query: &Query, container: ContainerId, column: &str) -> ItemId {
    query
        .container(container)
        .and_then(|c| c.item_for_column(column))
        .map(Item::id)
        .unwrap()
}

#[test]
fn test_nested_compound_edits_report_outermost_only() {
    let mut query = Query::new();
    let log = record(&query);

    query.start_compound_edit("outer");
    query.start_compound_edit("inner");
    query.end_compound_edit().unwrap();
    assert_eq!(
        take(&log),
        vec![QueryEvent::CompoundEditStarted { message: "outer".to_string() }]
    );

    query.end_compound_edit().unwrap();
    assert_eq!(take(&log), vec![QueryEvent::CompoundEditEnded]);
    assert_eq!(query.compound_depth(), 0);
}

#[test]
fn test_unbalanced_end_rejected() {
    let mut query = Query::new();
    let log = record(&query);
    assert_eq!(query.end_compound_edit().unwrap_err(), QueryError::UnbalancedCompoundEdit);
    assert!(take(&log).is_empty());
}

#[test]
fn test_compound_edit_closure_closes_on_error() {
    let mut query = Query::new();
    let log = record(&query);

    let result: Result<(), QueryError> = query.compound_edit("fails", |q| {
        q.set_filter("1 = 1");
        Err(QueryError::ConstantsContainer)
    });

    assert!(result.is_err());
    assert_eq!(query.compound_depth(), 0);
    assert_eq!(
        take(&log),
        vec![
            QueryEvent::CompoundEditStarted { message: "fails".to_string() },
            QueryEvent::PropertyChanged { property: QueryProperty::Filter },
            QueryEvent::CompoundEditEnded,
        ]
    );
}

#[test]
fn test_compound_edit_inside_open_edit_stays_silent() {
    let mut query = Query::new();
    query.start_compound_edit("outer");
    let log = record(&query);

    query.compound_edit("inner", |q| q.set_grouping(true));

    assert_eq!(query.compound_depth(), 1);
    assert_eq!(
        take(&log),
        vec![QueryEvent::PropertyChanged { property: QueryProperty::Grouping }]
    );
}

#[test]
fn test_setters_report_changes_only() {
    let mut query = Query::new();
    let log = record(&query);

    query.set_grouping(true);
    query.set_grouping(true);
    query.set_filter("");
    query.set_row_limit(Some(10));
    query.set_row_limit(Some(10));

    assert_eq!(
        take(&log),
        vec![
            QueryEvent::PropertyChanged { property: QueryProperty::Grouping },
            QueryEvent::PropertyChanged { property: QueryProperty::RowLimit },
        ]
    );
}

#[test]
fn test_table_and_container_events() {
    let mut query = Query::new();
    let log = record(&query);
    let orders = add(&mut query, "Orders", &["id"]);
    assert_eq!(
        take(&log),
        vec![QueryEvent::ContainerAdded { container: orders, index: 0 }]
    );

    query.set_container_alias(orders, Some("o".to_string())).unwrap();
    query.set_container_position(orders, Position::new(1.0, 2.0)).unwrap();
    query.set_container_alias(orders, Some("o".to_string())).unwrap();
    assert_eq!(
        take(&log),
        vec![
            QueryEvent::PropertyChanged { property: QueryProperty::ContainerAlias(orders) },
            QueryEvent::PropertyChanged { property: QueryProperty::ContainerPosition(orders) },
        ]
    );
}

#[test]
fn test_selection_reports_every_shifted_item() {
    let mut query = Query::new();
    let t = add(&mut query, "T", &["a", "b", "c"]);
    let (a, b, c) = (item(&query, t, "a"), item(&query, t, "b"), item(&query, t, "c"));
    for id in [a, b, c] {
        query.select_item(id).unwrap();
    }
    let log = record(&query);

    query.unselect_item(a).unwrap();
    let changed: Vec<ItemId> = take(&log)
        .into_iter()
        .filter_map(|e| match e {
            QueryEvent::ItemPropertyChanged { item, property: ItemProperty::Selection } => Some(item),
            _ => None,
        })
        .collect();
    assert_eq!(changed, vec![a, b, c]);
}

#[test]
fn test_remove_table_is_one_compound_edit() {
    let mut query = Query::new();
    let orders = add(&mut query, "Orders", &["id", "customer_id"]);
    let customers = add(&mut query, "Customers", &["id"]);
    let join = Join::new(
        query.item(item(&query, orders, "customer_id")).unwrap(),
        query.item(item(&query, customers, "id")).unwrap(),
    )
    .unwrap();
    let join = query.add_join(join).unwrap();
    query.select_item(item(&query, orders, "id")).unwrap();
    let log = record(&query);

    assert!(query.remove_table(orders));
    let events = take(&log);

    assert_eq!(
        events.first(),
        Some(&QueryEvent::CompoundEditStarted { message: "Remove table Orders".to_string() })
    );
    assert_eq!(events.last(), Some(&QueryEvent::CompoundEditEnded));
    assert!(events.contains(&QueryEvent::JoinRemoved { join }));
    assert!(events.contains(&QueryEvent::ContainerRemoved { container: orders }));
    assert_eq!(count(&events, |e| matches!(e, QueryEvent::ItemRemoved { .. })), 2);
    assert_eq!(count(&events, |e| matches!(e, QueryEvent::CompoundEditStarted { .. })), 1);
}

#[test]
fn test_outer_propagation_reports_each_join() {
    let mut query = Query::new();
    let a = add(&mut query, "A", &["b_id", "c_id"]);
    let b = add(&mut query, "B", &["id"]);
    let c = add(&mut query, "C", &["id"]);
    let ab = Join::new(
        query.item(item(&query, a, "b_id")).unwrap(),
        query.item(item(&query, b, "id")).unwrap(),
    )
    .unwrap();
    let ab = query.add_join(ab).unwrap();
    let ac = Join::new(
        query.item(item(&query, a, "c_id")).unwrap(),
        query.item(item(&query, c, "id")).unwrap(),
    )
    .unwrap();
    let ac = query.add_join(ac).unwrap();
    let log = record(&query);

    query.set_join_left_outer(ab, true).unwrap();
    assert_eq!(
        take(&log),
        vec![
            QueryEvent::JoinPropertyChanged { join: ab, property: JoinProperty::LeftOuter },
            QueryEvent::JoinPropertyChanged { join: ac, property: JoinProperty::LeftOuter },
        ]
    );

    query.set_join_left_outer(ac, true).unwrap();
    assert!(take(&log).is_empty());
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let mut query = Query::new();
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let id = query.subscribe(move |event| sink.lock().push(event.clone()));

    assert!(query.unsubscribe(id));
    query.set_grouping(true);
    assert!(log.lock().is_empty());
    assert!(!query.unsubscribe(id));
}

#[test]
fn test_copy_has_no_listeners() {
    let mut query = Query::new();
    let log = record(&query);
    let mut copy = query.create_copy().unwrap();

    copy.set_grouping(true);
    assert!(take(&log).is_empty());
    query.set_grouping(true);
    assert_eq!(take(&log).len(), 1);
}
