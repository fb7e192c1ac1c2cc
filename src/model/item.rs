//! Items: the selectable, filterable columns and expressions of a query.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{ContainerId, ItemId};

// =============================================================================
// Item source (what an item wraps)
// =============================================================================

/// A column of a database table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub name: String,
    /// Database-specific type name, when known from metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
        }
    }

    pub fn with_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }
}

/// A literal or expression placed in the constants container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Expression {
    /// Display name (used for generated aliases).
    pub name: String,
    /// SQL text, run through the constant converter before rendering.
    pub text: String,
    /// The text is itself an aggregate (e.g. `COUNT(*)`); never grouped by.
    #[serde(default)]
    pub aggregate: bool,
}

/// The domain object an item wraps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemSource {
    /// A raw database column. Quoted with the identifier quote string.
    Column(ColumnRef),
    /// A literal expression. Never quoted; converted per database family.
    Expression(Expression),
}

impl ItemSource {
    pub fn name(&self) -> &str {
        match self {
            ItemSource::Column(column) => &column.name,
            ItemSource::Expression(expr) => &expr.name,
        }
    }
}

// =============================================================================
// Grouping and ordering
// =============================================================================

/// Grouping function applied to an item when grouping is enabled.
///
/// `None` is the plain "group by" marker: the item is listed in GROUP BY
/// instead of being aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupFunction {
    #[default]
    None,
    Sum,
    Min,
    Max,
    Avg,
    Count,
}

impl GroupFunction {
    pub const ALL: [GroupFunction; 6] = [
        GroupFunction::None,
        GroupFunction::Sum,
        GroupFunction::Min,
        GroupFunction::Max,
        GroupFunction::Avg,
        GroupFunction::Count,
    ];

    /// SQL function name, or `None` for the group-by marker.
    pub fn sql_name(&self) -> Option<&'static str> {
        match self {
            GroupFunction::None => None,
            GroupFunction::Sum => Some("SUM"),
            GroupFunction::Min => Some("MIN"),
            GroupFunction::Max => Some("MAX"),
            GroupFunction::Avg => Some("AVG"),
            GroupFunction::Count => Some("COUNT"),
        }
    }

    pub fn is_aggregate(&self) -> bool {
        !matches!(self, GroupFunction::None)
    }
}

impl fmt::Display for GroupFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql_name().unwrap_or("NONE"))
    }
}

/// ORDER BY direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    /// Ordered, but without an explicit direction token.
    #[default]
    None,
    Asc,
    Desc,
}

impl SortDirection {
    pub fn token(&self) -> Option<&'static str> {
        match self {
            SortDirection::None => None,
            SortDirection::Asc => Some("ASC"),
            SortDirection::Desc => Some("DESC"),
        }
    }
}

// =============================================================================
// Item
// =============================================================================

/// A single selectable/filterable column or literal expression.
///
/// Items are owned by a [`Container`](super::Container); the back reference
/// is the owning container's id. Selection and order-by ordinals are managed
/// by the owning [`Query`](crate::query::Query), which keeps them dense and
/// unique, so their setters are crate-private.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    container: Option<ContainerId>,
    source: ItemSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    having: Option<String>,
    #[serde(default)]
    group_function: GroupFunction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selected: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    order_by: Option<usize>,
    #[serde(default)]
    order_direction: SortDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
}

impl Item {
    pub fn new(source: ItemSource) -> Self {
        Self {
            id: ItemId::new(),
            container: None,
            source,
            alias: None,
            filter: None,
            having: None,
            group_function: GroupFunction::None,
            selected: None,
            order_by: None,
            order_direction: SortDirection::None,
            width: None,
        }
    }

    /// A column item wrapping `name`.
    pub fn column(name: impl Into<String>) -> Self {
        Self::new(ItemSource::Column(ColumnRef::new(name)))
    }

    /// A literal expression item; `name` is its display name.
    pub fn expression(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(ItemSource::Expression(Expression {
            name: name.into(),
            text: text.into(),
            aggregate: false,
        }))
    }

    /// An expression that already aggregates (e.g. `COUNT(*)`).
    pub fn aggregate_expression(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(ItemSource::Expression(Expression {
            name: name.into(),
            text: text.into(),
            aggregate: true,
        }))
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.set_alias(Some(alias.into()));
        self
    }

    pub fn with_group_function(mut self, function: GroupFunction) -> Self {
        self.group_function = function;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.set_filter(Some(filter.into()));
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Owning container, once the item has been added to one.
    pub fn container(&self) -> Option<ContainerId> {
        self.container
    }

    pub fn source(&self) -> &ItemSource {
        &self.source
    }

    /// Display name: the column name, or the expression's literal name.
    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn is_column(&self) -> bool {
        matches!(self.source, ItemSource::Column(_))
    }

    /// An expression that aggregates by itself and must not be grouped by.
    pub fn is_aggregate_expression(&self) -> bool {
        matches!(&self.source, ItemSource::Expression(expr) if expr.aggregate)
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn having(&self) -> Option<&str> {
        self.having.as_deref()
    }

    pub fn group_function(&self) -> GroupFunction {
        self.group_function
    }

    /// Selection ordinal; `None` when not selected.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_selected(&self) -> bool {
        self.selected.is_some()
    }

    /// Order-by ordinal; `None` when not ordered.
    pub fn order_by(&self) -> Option<usize> {
        self.order_by
    }

    pub fn order_direction(&self) -> SortDirection {
        self.order_direction
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Set the alias. Blank strings clear it.
    pub fn set_alias(&mut self, alias: Option<String>) {
        self.alias = non_blank(alias);
    }

    /// Set the per-item filter (a predicate suffix such as `> 10`).
    pub fn set_filter(&mut self, filter: Option<String>) {
        self.filter = non_blank(filter);
    }

    pub fn set_having(&mut self, having: Option<String>) {
        self.having = non_blank(having);
    }

    pub fn set_group_function(&mut self, function: GroupFunction) {
        self.group_function = function;
    }

    pub fn set_width(&mut self, width: Option<u32>) {
        self.width = width;
    }

    pub fn set_order_direction(&mut self, direction: SortDirection) {
        self.order_direction = direction;
    }

    pub(crate) fn set_container(&mut self, container: Option<ContainerId>) {
        self.container = container;
    }

    pub(crate) fn set_selected(&mut self, ordinal: Option<usize>) {
        self.selected = ordinal;
    }

    pub(crate) fn set_order_by(&mut self, ordinal: Option<usize>) {
        self.order_by = ordinal;
    }

    /// A structurally identical, independently owned copy.
    ///
    /// The id is preserved so Joins copied alongside still resolve.
    pub fn create_copy(&self) -> Item {
        self.clone()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
