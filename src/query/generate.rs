//! SQL text generation.
//!
//! Clause layout (each clause after SELECT starts with `" \n"`):
//!
//! ```text
//! SELECT <items>
//! FROM <first container>
//! <JOIN KIND> <next container>
//!   ON <conditions to any earlier container, or 0 = 0>
//! WHERE <item filters AND constant joins AND global filter>
//! GROUP BY <plain selected items>
//! HAVING <wrapped having text>
//! ORDER BY <ordered items [ASC|DESC]>
//! ```

use std::collections::HashSet;

use tracing::{debug, warn};

use super::Query;
use crate::graph::JoinGraph;
use crate::metadata::resolve_identifier_quote;
use crate::model::{Container, ContainerId, Item, ItemSource, Join, JoinKind};
use crate::sql::dialect::helpers::quote_with;
use crate::sql::{Dialect, SqlDialect};

/// How identifiers are quoted for one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
enum IdentifierQuote {
    None,
    Dialect(Dialect),
    Literal(String),
}

impl IdentifierQuote {
    fn quote(&self, ident: &str) -> String {
        match self {
            IdentifierQuote::None => ident.to_string(),
            IdentifierQuote::Dialect(dialect) => dialect.quote_identifier(ident),
            IdentifierQuote::Literal(quote) => quote_with(ident, quote),
        }
    }
}

impl Query {
    /// The SQL text for the current graph.
    ///
    /// Returns the user override verbatim when one is set, and an empty
    /// string when nothing is selected. Never fails: metadata problems
    /// degrade to unquoted identifiers and unconnected tables are joined on
    /// `0 = 0`.
    pub fn generate_query(&self) -> String {
        if let Some(sql) = &self.user_sql {
            return sql.clone();
        }
        if self.selection.is_empty() {
            return String::new();
        }

        let renderer = Renderer {
            query: self,
            quote: self.identifier_quote(),
        };
        renderer.render()
    }

    /// Whether some container is joined to its predecessors only by the
    /// `0 = 0` fallback.
    pub fn contains_cross_joins(&self) -> bool {
        let order = self.join_graph().emission_order();
        let mut emitted = HashSet::new();
        for (index, container) in order.iter().enumerate() {
            if index > 0 && self.conditions_to(*container, &emitted).is_empty() {
                return true;
            }
            emitted.insert(*container);
        }
        false
    }

    /// Whether the text would contain a FULL OUTER JOIN the dialect cannot
    /// execute. The join is still written as FULL OUTER JOIN.
    pub fn contains_unsupported_joins(&self) -> bool {
        if self.dialect.supports_full_outer_join() {
            return false;
        }
        let order = self.join_graph().emission_order();
        (1..order.len()).any(|index| self.join_kind_at(&order, index) == JoinKind::FullOuter)
    }

    /// Snapshot of the from-containers and the joins between them.
    pub fn join_graph(&self) -> JoinGraph {
        JoinGraph::new(self.from.iter().map(Container::id), &self.joins)
    }

    fn identifier_quote(&self) -> IdentifierQuote {
        match self.metadata.as_deref() {
            Some(provider) => {
                let mut cached = self.provider_quote.lock();
                let quote = cached
                    .get_or_insert_with(|| resolve_identifier_quote(provider, self.data_source.as_ref()));
                IdentifierQuote::Literal(quote.clone())
            }
            None if self.quote_identifiers => IdentifierQuote::Dialect(self.dialect),
            None => IdentifierQuote::None,
        }
    }

    /// Joins from `container` to any container in `emitted`, in insertion
    /// order.
    fn conditions_to(&self, container: ContainerId, emitted: &HashSet<ContainerId>) -> Vec<&Join> {
        self.joins_for(container)
            .iter()
            .filter_map(|id| self.join(*id))
            .filter(|join| {
                join.other_end(container)
                    .is_some_and(|end| emitted.contains(&end.container))
            })
            .collect()
    }

    /// Keyword joining `order[index]` to its predecessor. `index` must be
    /// at least 1.
    fn join_kind_at(&self, order: &[ContainerId], index: usize) -> JoinKind {
        let previous = order[index - 1];
        self.first_join_between(previous, order[index])
            .map(|join| join.kind_from(previous))
            .unwrap_or(JoinKind::Inner)
    }

    /// The first join (insertion order) between two containers.
    fn first_join_between(&self, a: ContainerId, b: ContainerId) -> Option<&Join> {
        self.joins_for(b)
            .iter()
            .filter_map(|id| self.join(*id))
            .find(|join| join.other_end(b).is_some_and(|end| end.container == a))
    }
}

struct Renderer<'q> {
    query: &'q Query,
    quote: IdentifierQuote,
}

impl Renderer<'_> {
    fn render(&self) -> String {
        let mut sql = format!("SELECT {}", self.select_list());

        let from = self.from_clause();
        if !from.is_empty() {
            sql.push_str(" \nFROM ");
            sql.push_str(&from);
        }

        let conditions = self.where_conditions();
        if !conditions.is_empty() {
            sql.push_str(" \nWHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        if self.query.grouping {
            let group_by = self.group_by_list();
            if !group_by.is_empty() {
                sql.push_str(" \nGROUP BY ");
                sql.push_str(&group_by.join(", "));
            }

            let having = self.having_conditions();
            if !having.is_empty() {
                sql.push_str(" \nHAVING ");
                sql.push_str(&having.join(" AND "));
            }
        }

        let order_by = self.order_by_list();
        if !order_by.is_empty() {
            sql.push_str(" \nORDER BY ");
            sql.push_str(&order_by.join(", "));
        }

        sql
    }

    // -------------------------------------------------------------------------
    // Clauses
    // -------------------------------------------------------------------------

    fn select_list(&self) -> String {
        self.query
            .selected_items()
            .into_iter()
            .map(|item| {
                let mut entry = self.wrapped(item);
                if let Some(alias) = item.alias() {
                    entry.push_str(&format!(" AS {}", alias));
                } else if let Some(function) = self.aggregate_function(item) {
                    entry.push_str(&format!(" AS {}_{}", function, item.name()));
                }
                entry
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn from_clause(&self) -> String {
        let order = self.query.join_graph().emission_order();
        let mut sql = String::new();
        let mut emitted: HashSet<ContainerId> = HashSet::new();

        for (index, id) in order.iter().enumerate() {
            let Some(container) = self.query.container(*id) else {
                continue;
            };

            if index == 0 {
                sql.push_str(&self.table(container));
                emitted.insert(*id);
                continue;
            }

            let kind = self.query.join_kind_at(&order, index);
            if kind == JoinKind::FullOuter && !self.query.dialect.supports_full_outer_join() {
                warn!(
                    table = container.name(),
                    dialect = %self.query.dialect,
                    "dialect has no FULL OUTER JOIN"
                );
            }

            let conditions: Vec<String> = self
                .query
                .conditions_to(*id, &emitted)
                .into_iter()
                .map(|join| self.condition(join))
                .collect();
            let on = if conditions.is_empty() {
                debug!(table = container.name(), "no join to earlier tables, emitting cross join");
                "0 = 0".to_string()
            } else {
                conditions.join(" AND ")
            };

            sql.push_str(&format!(
                " \n{} {} \n  ON {}",
                kind.keyword(),
                self.table(container),
                on
            ));
            emitted.insert(*id);
        }

        sql
    }

    fn where_conditions(&self) -> Vec<String> {
        let containers = self
            .query
            .from
            .iter()
            .chain(std::iter::once(&self.query.constants));

        let mut conditions: Vec<String> = containers
            .flat_map(|container| container.items())
            .filter_map(|item| {
                item.filter()
                    .map(|filter| format!("{} {}", self.item_sql(item), filter))
            })
            .collect();

        let constants = self.query.constants.id();
        conditions.extend(
            self.query
                .joins_for(constants)
                .iter()
                .filter_map(|id| self.query.join(*id))
                .map(|join| self.condition(join)),
        );

        let filter = self.query.filter.trim();
        if !filter.is_empty() {
            conditions.push(filter.to_string());
        }
        conditions
    }

    fn group_by_list(&self) -> Vec<String> {
        self.query
            .selected_items()
            .into_iter()
            .filter(|item| !item.group_function().is_aggregate() && !item.is_aggregate_expression())
            .map(|item| self.item_sql(item))
            .collect()
    }

    fn having_conditions(&self) -> Vec<String> {
        self.query
            .selected_items()
            .into_iter()
            .filter_map(|item| {
                item.having()
                    .map(|having| format!("{} {}", self.wrapped(item), having))
            })
            .collect()
    }

    fn order_by_list(&self) -> Vec<String> {
        self.query
            .order_by_items()
            .into_iter()
            .map(|item| {
                let mut entry = self.wrapped(item);
                if let Some(token) = item.order_direction().token() {
                    entry.push(' ');
                    entry.push_str(token);
                }
                entry
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Fragments
    // -------------------------------------------------------------------------

    /// `catalog.schema.table alias`, each name part quoted.
    fn table(&self, container: &Container) -> String {
        let name = match container.table_ref() {
            Some(table) => table
                .parts()
                .map(|part| self.quote.quote(part))
                .collect::<Vec<_>>()
                .join("."),
            None => self.quote.quote(container.name()),
        };
        match container.alias() {
            Some(alias) => format!("{} {}", name, alias),
            None => name,
        }
    }

    /// Container qualifier: the alias as written, or the quoted name.
    fn qualifier(&self, container: &Container) -> String {
        match container.alias() {
            Some(alias) => alias.to_string(),
            None => self.quote.quote(container.name()),
        }
    }

    /// An item as referenced in any clause, without grouping function.
    fn item_sql(&self, item: &Item) -> String {
        match item.source() {
            ItemSource::Expression(_) => self.query.converter.convert(self.query.dialect, item),
            ItemSource::Column(column) => {
                let name = self.quote.quote(&column.name);
                let owner = item
                    .container()
                    .and_then(|id| self.query.container(id))
                    .filter(|container| !container.is_constants());
                match owner {
                    Some(container) => format!("{}.{}", self.qualifier(container), name),
                    None => name,
                }
            }
        }
    }

    /// The grouping function when grouping is on and one applies.
    fn aggregate_function(&self, item: &Item) -> Option<&'static str> {
        if self.query.grouping {
            item.group_function().sql_name()
        } else {
            None
        }
    }

    fn wrapped(&self, item: &Item) -> String {
        let sql = self.item_sql(item);
        match self.aggregate_function(item) {
            Some(function) => format!("{}({})", function, sql),
            None => sql,
        }
    }

    fn condition(&self, join: &Join) -> String {
        let left = self.query.item(join.left().item);
        let right = self.query.item(join.right().item);
        match (left, right) {
            (Some(left), Some(right)) => format!(
                "{} {} {}",
                self.item_sql(left),
                join.comparator(),
                self.item_sql(right)
            ),
            _ => "0 = 0".to_string(),
        }
    }
}
