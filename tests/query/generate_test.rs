// tests/query/generate_test.rs
use std::sync::Arc;

use joinery::dialect::Dialect;
use joinery::model::{
    Container, ContainerId, GroupFunction, Item, ItemId, ItemSource, Join, JoinId, SortDirection, TableRef,
};
use joinery::query::Query;
use joinery::sql::ConstantConverter;

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

fn join(query: &mut Query, left: ItemId, right: ItemId) -> JoinId {
    let join = Join::new(query.item(left).unwrap(), query.item(right).unwrap()).unwrap();
    query.add_join(join).unwrap()
}

fn join_columns(query: &mut Query, left: (ContainerId, &str), right: (ContainerId, &str)) -> JoinId {
    let left = item(query, left.0, left.1);
    let right = item(query, right.0, right.1);
    join(query, left, right)
}

/// Orders(id, customer_id) joined to Customers(id, name), selecting
/// Orders.id and Customers.name.
fn orders_and_customers() -> (Query, ContainerId, ContainerId, JoinId) {
    let mut query = Query::new();
    let orders = add(&mut query, "Orders", &["id", "customer_id"]);
    let customers = add(&mut query, "Customers", &["id", "name"]);
    let on = join_columns(&mut query, (orders, "customer_id"), (customers, "id"));
    query.select_item(item(&query, orders, "id")).unwrap();
    query.select_item(item(&query, customers, "name")).unwrap();
    (query, orders, customers, on)
}

fn sales() -> (Query, ContainerId) {
    let mut query = Query::new();
    let sales = add(&mut query, "Sales", &["region", "amount"]);
    (query, sales)
}

#[test]
fn test_inner_join() {
    let (query, _, _, _) = orders_and_customers();
    assert_eq!(
        query.generate_query(),
        "SELECT Orders.id, Customers.name \nFROM Orders \nINNER JOIN Customers \n  ON Orders.customer_id = Customers.id"
    );
    assert!(!query.contains_cross_joins());
}

#[test]
fn test_left_outer_join() {
    let (mut query, _, _, on) = orders_and_customers();
    query.set_join_left_outer(on, true).unwrap();

    assert_eq!(
        query.generate_query(),
        "SELECT Orders.id, Customers.name \nFROM Orders \nLEFT OUTER JOIN Customers \n  ON Orders.customer_id = Customers.id"
    );
}

#[test]
fn test_right_and_full_outer_join() {
    let (mut query, _, _, on) = orders_and_customers();
    query.set_join_right_outer(on, true).unwrap();
    assert!(query.generate_query().contains("\nRIGHT OUTER JOIN Customers \n"));

    query.set_join_left_outer(on, true).unwrap();
    assert!(query.generate_query().contains("\nFULL OUTER JOIN Customers \n"));
}

#[test]
fn test_unconnected_tables_cross_join() {
    let mut query = Query::new();
    let orders = add(&mut query, "Orders", &["id"]);
    let customers = add(&mut query, "Customers", &["name"]);
    query.select_item(item(&query, orders, "id")).unwrap();
    query.select_item(item(&query, customers, "name")).unwrap();

    assert!(query.contains_cross_joins());
    assert_eq!(
        query.generate_query(),
        "SELECT Orders.id, Customers.name \nFROM Orders \nINNER JOIN Customers \n  ON 0 = 0"
    );
}

#[test]
fn test_later_table_joined_to_several_earlier_tables() {
    let mut query = Query::new();
    let a = add(&mut query, "A", &["id", "x"]);
    let b = add(&mut query, "B", &["a_id", "y"]);
    let c = add(&mut query, "C", &["x", "y"]);
    join_columns(&mut query, (a, "id"), (b, "a_id"));
    join_columns(&mut query, (a, "x"), (c, "x"));
    join_columns(&mut query, (b, "y"), (c, "y"));
    query.select_item(item(&query, a, "id")).unwrap();

    assert_eq!(
        query.generate_query(),
        "SELECT A.id \nFROM A \nINNER JOIN C \n  ON A.x = C.x \nINNER JOIN B \n  ON A.id = B.a_id AND B.y = C.y"
    );
}

#[test]
fn test_aggregate_gets_generated_alias() {
    let (mut query, sales) = sales();
    let region = item(&query, sales, "region");
    let amount = item(&query, sales, "amount");
    query.select_item(region).unwrap();
    query.select_item(amount).unwrap();
    query.set_item_group_function(amount, GroupFunction::Sum).unwrap();

    // Without grouping the function is ignored.
    assert_eq!(query.generate_query(), "SELECT Sales.region, Sales.amount \nFROM Sales");

    query.set_grouping(true);
    assert_eq!(
        query.generate_query(),
        "SELECT Sales.region, SUM(Sales.amount) AS SUM_amount \nFROM Sales \nGROUP BY Sales.region"
    );
}

#[test]
fn test_explicit_alias_wins() {
    let (mut query, sales) = sales();
    let amount = item(&query, sales, "amount");
    query.select_item(amount).unwrap();
    query.set_grouping(true);
    query.set_item_group_function(amount, GroupFunction::Max).unwrap();
    query.set_item_alias(amount, Some("biggest".to_string())).unwrap();

    assert_eq!(query.generate_query(), "SELECT MAX(Sales.amount) AS biggest \nFROM Sales");
}

#[test]
fn test_having_uses_wrapped_item() {
    let (mut query, sales) = sales();
    let region = item(&query, sales, "region");
    let amount = item(&query, sales, "amount");
    query.select_item(region).unwrap();
    query.select_item(amount).unwrap();
    query.set_grouping(true);
    query.set_item_group_function(amount, GroupFunction::Sum).unwrap();
    query.set_item_having(amount, Some("> 100".to_string())).unwrap();

    assert_eq!(
        query.generate_query(),
        "SELECT Sales.region, SUM(Sales.amount) AS SUM_amount \nFROM Sales \nGROUP BY Sales.region \nHAVING SUM(Sales.amount) > 100"
    );
}

#[test]
fn test_aggregate_expression_not_grouped() {
    let (mut query, sales) = sales();
    let region = item(&query, sales, "region");
    let count = query
        .add_constant(Item::aggregate_expression("n", "COUNT(*)"), None)
        .unwrap();
    query.select_item(region).unwrap();
    query.select_item(count).unwrap();
    query.set_grouping(true);

    assert_eq!(
        query.generate_query(),
        "SELECT Sales.region, COUNT(*) \nFROM Sales \nGROUP BY Sales.region"
    );
}

#[test]
fn test_where_collects_item_filters_then_global_filter() {
    let (mut query, sales) = sales();
    let region = item(&query, sales, "region");
    let amount = item(&query, sales, "amount");
    query.select_item(region).unwrap();
    query.set_item_filter(amount, Some("> 10".to_string())).unwrap();
    query.set_item_filter(region, Some("= 'EU'".to_string())).unwrap();
    query.set_filter("1 = 1");

    assert_eq!(
        query.generate_query(),
        "SELECT Sales.region \nFROM Sales \nWHERE Sales.region = 'EU' AND Sales.amount > 10 AND 1 = 1"
    );
}

#[test]
fn test_join_to_constant_becomes_where_condition() {
    let mut query = Query::new();
    let orders = add(&mut query, "Orders", &["id", "status"]);
    let open = query.add_constant(Item::expression("open", "'OPEN'"), None).unwrap();
    let status = item(&query, orders, "status");
    join(&mut query, status, open);
    query.select_item(item(&query, orders, "id")).unwrap();

    assert_eq!(
        query.generate_query(),
        "SELECT Orders.id \nFROM Orders \nWHERE Orders.status = 'OPEN'"
    );
    assert!(!query.contains_cross_joins());
}

#[test]
fn test_order_by_direction_tokens() {
    let (mut query, sales) = sales();
    let region = item(&query, sales, "region");
    let amount = item(&query, sales, "amount");
    query.select_item(region).unwrap();
    query.order_column(amount, SortDirection::Desc).unwrap();
    query.order_column(region, SortDirection::None).unwrap();

    assert_eq!(
        query.generate_query(),
        "SELECT Sales.region \nFROM Sales \nORDER BY Sales.amount DESC, Sales.region"
    );
}

#[test]
fn test_constant_converted_for_dialect() {
    let mut query = Query::new();
    query.set_dialect(Dialect::TSql);
    let now = query
        .add_constant(Item::expression("now", "CURRENT_TIMESTAMP"), None)
        .unwrap();
    query.select_item(now).unwrap();

    assert_eq!(query.generate_query(), "SELECT GETDATE()");
}

#[test]
fn test_dialect_quoting() {
    let (mut query, _, _, _) = orders_and_customers();
    query.set_quote_identifiers(true);
    assert_eq!(
        query.generate_query(),
        "SELECT \"Orders\".\"id\", \"Customers\".\"name\" \nFROM \"Orders\" \nINNER JOIN \"Customers\" \n  ON \"Orders\".\"customer_id\" = \"Customers\".\"id\""
    );

    query.set_dialect(Dialect::TSql);
    assert!(query.generate_query().starts_with("SELECT [Orders].[id], [Customers].[name] \nFROM [Orders]"));
}

#[test]
fn test_alias_qualifies_columns() {
    let mut query = Query::new();
    let container = Container::table(TableRef::new("Orders").with_schema("sales"), ["id"]).with_alias("o");
    let orders = query.add_table(container, None).unwrap();
    query.select_item(item(&query, orders, "id")).unwrap();
    query.set_quote_identifiers(true);

    assert_eq!(query.generate_query(), "SELECT o.\"id\" \nFROM \"sales\".\"Orders\" o");
}

#[test]
fn test_user_sql_overrides_generation() {
    let (mut query, _, _, _) = orders_and_customers();
    query.set_user_sql(Some("SELECT 1".to_string()));
    assert_eq!(query.generate_query(), "SELECT 1");

    query.set_user_sql(None);
    assert!(query.generate_query().starts_with("SELECT Orders.id"));
}

#[test]
fn test_nothing_selected_generates_empty_text() {
    let mut query = Query::new();
    add(&mut query, "Orders", &["id"]);
    assert_eq!(query.generate_query(), "");
}

#[test]
fn test_row_limits_do_not_change_text() {
    let (mut query, _, _, _) = orders_and_customers();
    let before = query.generate_query();
    query.set_row_limit(Some(100));
    query.set_streaming_row_limit(Some(10));
    assert_eq!(query.generate_query(), before);
}

#[test]
fn test_generation_is_idempotent() {
    let (query, _, _, _) = orders_and_customers();
    assert_eq!(query.generate_query(), query.generate_query());
}

#[test]
fn test_full_outer_join_flagged_for_dialects_without_it() {
    let (mut query, _, _, on) = orders_and_customers();
    query.set_join_left_outer(on, true).unwrap();
    query.set_join_right_outer(on, true).unwrap();
    assert!(!query.contains_unsupported_joins());

    query.set_dialect(Dialect::MySql);
    assert!(query.contains_unsupported_joins());
    assert!(query.generate_query().contains("\nFULL OUTER JOIN Customers \n"));

    query.set_join_right_outer(on, false).unwrap();
    assert!(!query.contains_unsupported_joins());
}

/// Wraps every expression in a marker so the converter's output is visible.
struct Tagged;

impl ConstantConverter for Tagged {
    fn convert(&self, dialect: Dialect, item: &Item) -> String {
        match item.source() {
            ItemSource::Expression(expr) => format!("/* {} */ {}", dialect, expr.text),
            ItemSource::Column(column) => column.name.clone(),
        }
    }
}

#[test]
fn test_custom_converter_renders_expressions() {
    let mut query = Query::new().with_converter(Arc::new(Tagged));
    let now = query
        .add_constant(Item::expression("now", "CURRENT_TIMESTAMP"), None)
        .unwrap();
    query.select_item(now).unwrap();
    assert_eq!(query.generate_query(), "SELECT /* postgres */ CURRENT_TIMESTAMP");

    query.set_converter(Arc::new(joinery::sql::DialectConverter));
    query.set_dialect(Dialect::TSql);
    assert_eq!(query.generate_query(), "SELECT GETDATE()");
}
