// tests/query/properties_test.rs
//
// Invariants that must hold after any sequence of edits.

use joinery::model::{Container, ContainerId, Item, ItemId, Join, SortDirection, TableRef};
use joinery::query::{Query, QueryDocument};
use proptest::prelude::*;

const TABLES: usize = 4;
const COLUMNS: [&str; 3] = ["c0", "c1", "c2"];

fn build_query() -> (Query, Vec<ContainerId>) {
    let mut query = Query::new();
    let tables = (0..TABLES)
        .map(|n| {
            let container = Container::table(TableRef::new(&format!("T{}", n)), COLUMNS);
            query.add_table(container, None).unwrap()
        })
        .collect();
    (query, tables)
}

fn all_items(query: &Query) -> Vec<ItemId> {
    query
        .containers()
        .iter()
        .flat_map(|c| c.items().iter().map(Item::id))
        .collect()
}

fn try_join(query: &mut Query, tables: &[ContainerId], a: usize, b: usize, column: usize) {
    let (a, b) = (tables[a % tables.len()], tables[b % tables.len()]);
    let (Some(left), Some(right)) = (query.container(a), query.container(b)) else {
        return;
    };
    let (Some(left), Some(right)) = (
        left.item_at(column % COLUMNS.len()),
        right.item_at((column + 1) % COLUMNS.len()),
    ) else {
        return;
    };
    if let Ok(join) = Join::new(left, right) {
        let _ = query.add_join(join);
    }
}

fn apply_ordinal_op(query: &mut Query, op: u8, a: usize, b: usize) {
    let items = all_items(query);
    if items.is_empty() {
        return;
    }
    let id = items[a % items.len()];
    let _ = match op % 7 {
        0 => query.select_item(id).map(drop),
        1 => query.unselect_item(id).map(drop),
        2 => query.move_item(id, b % (query.selection().len() + 1)),
        3 => query.order_column(id, SortDirection::Asc).map(drop),
        4 => query.unorder_column(id).map(drop),
        5 => query.move_order_by_item_to_end(id).map(drop),
        _ => query.move_order_by_item(id, b % (query.ordering().len() + 1)),
    };
}

fn apply_join_op(query: &mut Query, tables: &[ContainerId], op: u8, a: usize, b: usize) {
    let joins: Vec<_> = query.joins().iter().map(Join::id).collect();
    match op % 4 {
        0 => try_join(query, tables, a, b, a + b),
        1 if !joins.is_empty() => {
            let _ = query.set_join_left_outer(joins[a % joins.len()], b % 2 == 0);
        }
        2 if !joins.is_empty() => {
            let _ = query.set_join_right_outer(joins[a % joins.len()], b % 2 == 0);
        }
        3 if !joins.is_empty() => {
            query.remove_join(joins[a % joins.len()]);
        }
        _ => {}
    }
}

fn assert_dense(query: &Query) -> Result<(), TestCaseError> {
    for space in [query.selection(), query.ordering()] {
        let ordinals: Vec<usize> = space.iter().map(|(ordinal, _)| ordinal).collect();
        prop_assert_eq!(ordinals, (0..space.len()).collect::<Vec<_>>());
    }
    for container in query.containers() {
        for item in container.items() {
            prop_assert_eq!(item.selected(), query.selection().get(item.id()));
            prop_assert_eq!(item.order_by(), query.ordering().get(item.id()));
        }
    }
    Ok(())
}

fn assert_uniform_outer(query: &Query) -> Result<(), TestCaseError> {
    for container in query.containers() {
        let flags: Vec<Option<bool>> = query
            .joins_for(container.id())
            .iter()
            .filter_map(|id| query.join(*id))
            .map(|join| join.outer_for(container.id()))
            .collect();
        prop_assert!(
            flags.windows(2).all(|pair| pair[0] == pair[1]),
            "mixed outer flags on {}: {:?}",
            container.name(),
            flags
        );
    }
    Ok(())
}

fn ops() -> impl Strategy<Value = Vec<(u8, usize, usize)>> {
    prop::collection::vec((any::<u8>(), 0usize..16, 0usize..16), 0..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn ordinals_stay_dense(ops in ops()) {
        let (mut query, _) = build_query();
        for (op, a, b) in ops {
            apply_ordinal_op(&mut query, op, a, b);
            assert_dense(&query)?;
        }
    }

    #[test]
    fn ordinals_stay_dense_across_table_removal(ops in ops(), victim in 0usize..TABLES) {
        let (mut query, tables) = build_query();
        for (op, a, b) in ops {
            apply_ordinal_op(&mut query, op, a, b);
        }
        prop_assert!(query.remove_table(tables[victim]));
        assert_dense(&query)?;
    }

    #[test]
    fn outer_flags_uniform_per_table(ops in ops()) {
        let (mut query, tables) = build_query();
        for (op, a, b) in ops {
            apply_join_op(&mut query, &tables, op, a, b);
            assert_uniform_outer(&query)?;
        }
    }

    #[test]
    fn removed_table_leaves_no_joins(ops in ops(), victim in 0usize..TABLES) {
        let (mut query, tables) = build_query();
        for (op, a, b) in ops {
            apply_join_op(&mut query, &tables, op, a, b);
        }
        let victim = tables[victim];
        query.remove_table(victim);

        prop_assert!(query.joins().iter().all(|join| !join.touches(victim)));
        prop_assert!(query.joins_for(victim).is_empty());
        for join in query.joins() {
            prop_assert!(query.item(join.left().item).is_some());
            prop_assert!(query.item(join.right().item).is_some());
        }
    }

    #[test]
    fn copies_generate_the_same_sql(join_ops in ops(), ordinal_ops in ops()) {
        let (mut query, tables) = build_query();
        for (op, a, b) in join_ops {
            apply_join_op(&mut query, &tables, op, a, b);
        }
        for (op, a, b) in ordinal_ops {
            apply_ordinal_op(&mut query, op, a, b);
        }

        let sql = query.generate_query();
        prop_assert_eq!(&query.generate_query(), &sql);
        prop_assert_eq!(&query.create_copy().unwrap().generate_query(), &sql);

        let json = query.to_document().to_json_pretty().unwrap();
        let restored = Query::from_document(QueryDocument::from_json(&json).unwrap()).unwrap();
        prop_assert_eq!(&restored.generate_query(), &sql);
    }

    #[test]
    fn every_joined_table_has_a_condition(ops in ops()) {
        let (mut query, tables) = build_query();
        for (op, a, b) in ops {
            apply_join_op(&mut query, &tables, op, a, b);
        }
        let components = query.join_graph().component_count();
        prop_assert_eq!(query.contains_cross_joins(), components > 1);
    }
}
