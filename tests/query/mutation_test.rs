// tests/query/mutation_test.rs
use joinery::error::QueryError;
use joinery::model::{Container, ContainerId, Item, ItemId, Join, JoinId, TableRef};
use joinery::query::Query;

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

fn new_join(query: &Query, left: (ContainerId, &str), right: (ContainerId, &str)) -> Join {
    let left = query.item(item(query, left.0, left.1)).unwrap();
    let right = query.item(item(query, right.0, right.1)).unwrap();
    Join::new(left, right).unwrap()
}

fn join(query: &mut Query, left: (ContainerId, &str), right: (ContainerId, &str)) -> JoinId {
    let join = new_join(query, left, right);
    query.add_join(join).unwrap()
}

/// A(id, b_id, c_id), B(id), C(id) with joins A-B and A-C.
fn star() -> (Query, [ContainerId; 3], [JoinId; 2]) {
    let mut query = Query::new();
    let a = add(&mut query, "A", &["id", "b_id", "c_id"]);
    let b = add(&mut query, "B", &["id"]);
    let c = add(&mut query, "C", &["id"]);
    let ab = join(&mut query, (a, "b_id"), (b, "id"));
    let ac = join(&mut query, (a, "c_id"), (c, "id"));
    (query, [a, b, c], [ab, ac])
}

#[test]
fn test_add_table_at_index() {
    let mut query = Query::new();
    let first = add(&mut query, "First", &["id"]);
    let second = Container::table(TableRef::new("Second"), ["id"]);
    let second = query.add_table(second, Some(0)).unwrap();

    assert_eq!(query.container_index(second), Some(0));
    assert_eq!(query.container_index(first), Some(1));

    let late = Container::table(TableRef::new("Late"), ["id"]);
    assert_eq!(
        query.add_table(late, Some(5)).unwrap_err(),
        QueryError::IndexOutOfRange { index: 5, len: 2 }
    );
}

#[test]
fn test_items_know_their_owner() {
    let mut query = Query::new();
    let orders = add(&mut query, "Orders", &["id"]);
    let id = item(&query, orders, "id");

    assert_eq!(query.owner_of(id).map(Container::id), Some(orders));
    assert_eq!(query.item(id).and_then(Item::container), Some(orders));
}

#[test]
fn test_join_index_is_symmetric() {
    let (query, [a, b, c], [ab, ac]) = star();
    assert_eq!(query.joins_for(a), &[ab, ac]);
    assert_eq!(query.joins_for(b), &[ab]);
    assert_eq!(query.joins_for(c), &[ac]);
}

#[test]
fn test_equivalent_join_rejected() {
    let (mut query, [a, b, _], [ab, _]) = star();
    let again = new_join(&query, (a, "b_id"), (b, "id"));
    assert_eq!(query.add_join(again).unwrap_err(), QueryError::DuplicateJoin(ab));
    assert_eq!(query.joins().len(), 2);
}

#[test]
fn test_join_needs_both_containers_in_query() {
    let mut query = Query::new();
    let orders = add(&mut query, "Orders", &["id"]);
    let outside = Container::table(TableRef::new("Outside"), ["id"]);
    let join = Join::new(query.item(item(&query, orders, "id")).unwrap(), &outside.items()[0]).unwrap();

    assert!(matches!(
        query.add_join(join),
        Err(QueryError::DanglingJoin { container, .. }) if container == outside.id()
    ));
}

#[test]
fn test_remove_join() {
    let (mut query, [a, b, _], [ab, ac]) = star();
    assert!(query.remove_join(ab));
    assert!(!query.remove_join(ab));
    assert_eq!(query.joins_for(a), &[ac]);
    assert!(query.joins_for(b).is_empty());
}

#[test]
fn test_remove_table_cascades() {
    let (mut query, [a, b, c], [_, ac]) = star();
    let a_id = item(&query, a, "id");
    let b_id = item(&query, b, "id");
    let c_id = item(&query, c, "id");
    query.select_item(a_id).unwrap();
    query.select_item(b_id).unwrap();
    query.select_item(c_id).unwrap();
    query.order_column(b_id, Default::default()).unwrap();

    assert!(query.remove_table(b));

    assert!(query.container(b).is_none());
    assert!(query.item(b_id).is_none());
    assert!(query.joins().iter().all(|j| !j.touches(b)));
    assert!(query.joins_for(b).is_empty());
    assert_eq!(query.joins_for(a), &[ac]);
    assert_eq!(query.item(c_id).unwrap().selected(), Some(1));
    assert!(query.ordering().is_empty());
    assert_eq!(query.compound_depth(), 0);
}

#[test]
fn test_remove_unknown_table() {
    let (mut query, _, _) = star();
    assert!(!query.remove_table(ContainerId::new()));
    assert_eq!(query.containers().len(), 3);
}

#[test]
fn test_outer_flag_propagates_to_sibling_joins() {
    let (mut query, [a, b, c], [ab, ac]) = star();
    query.set_join_left_outer(ab, true).unwrap();

    assert_eq!(query.join(ab).unwrap().outer_for(a), Some(true));
    assert_eq!(query.join(ac).unwrap().outer_for(a), Some(true));
    assert_eq!(query.join(ab).unwrap().outer_for(b), Some(false));
    assert_eq!(query.join(ac).unwrap().outer_for(c), Some(false));
}

#[test]
fn test_new_join_copies_container_orientation() {
    let (mut query, [a, b, c], [ab, _]) = star();
    query.set_join_left_outer(ab, true).unwrap();

    // A on the right of the new join still carries its outer flag.
    let d = add(&mut query, "D", &["a_id"]);
    let da = join(&mut query, (d, "a_id"), (a, "id"));
    let da = query.join(da).unwrap();
    assert!(da.right_outer());
    assert!(!da.left_outer());

    // B and C were never outer.
    let bc = join(&mut query, (b, "id"), (c, "id"));
    let bc = query.join(bc).unwrap();
    assert!(!bc.left_outer() && !bc.right_outer());
}

#[test]
fn test_outer_flag_on_unknown_join() {
    let (mut query, _, _) = star();
    let missing = JoinId::new();
    assert_eq!(
        query.set_join_right_outer(missing, true).unwrap_err(),
        QueryError::UnknownJoin(missing)
    );
}

#[test]
fn test_constants_lifecycle() {
    let mut query = Query::new();
    let orders = add(&mut query, "Orders", &["status"]);
    let open = query.add_constant(Item::expression("open", "'OPEN'"), None).unwrap();
    let status = item(&query, orders, "status");
    let constant_join = Join::new(query.item(status).unwrap(), query.item(open).unwrap()).unwrap();
    query.add_join(constant_join).unwrap();
    query.select_item(open).unwrap();

    assert_eq!(query.owner_of(open).map(Container::id), Some(query.constants().id()));

    let removed = query.remove_constant(open).unwrap();
    assert_eq!(removed.id(), open);
    assert!(query.item(open).is_none());
    assert!(query.joins().is_empty());
    assert!(query.selection().is_empty());
    assert!(query.constants().is_empty());
}

#[test]
fn test_table_items_are_not_constants() {
    let mut query = Query::new();
    let orders = add(&mut query, "Orders", &["id"]);
    let id = item(&query, orders, "id");
    assert_eq!(query.remove_constant(id).unwrap_err(), QueryError::SchemaBacked(orders));
}

#[test]
fn test_attach_without_provider_gives_empty_table() {
    let mut query = Query::new();
    let id = query.attach_table(TableRef::new("Orders"), None).unwrap();
    let container = query.container(id).unwrap();
    assert_eq!(container.name(), "Orders");
    assert!(container.is_empty());
}

#[test]
fn test_copy_is_independent() {
    let (mut query, [a, _, _], [ab, _]) = star();
    query.select_item(item(&query, a, "id")).unwrap();
    let mut copy = query.create_copy().unwrap();

    assert_eq!(copy.generate_query(), query.generate_query());
    assert_eq!(copy.joins_for(a), query.joins_for(a));

    copy.remove_join(ab);
    copy.set_container_alias(a, Some("x".to_string())).unwrap();
    assert_eq!(query.joins().len(), 2);
    assert_eq!(query.container(a).unwrap().alias(), None);
}
