//! Declarative statement descriptors and their rendering.
//!
//! # Responsibility
//! - Describe SELECT/INSERT/UPDATE/DELETE shapes as plain values.
//! - Render a descriptor to statement text plus its positional parameters.
//!
//! # Invariants
//! - Rendering is pure and infallible; malformed descriptors render to
//!   malformed but deterministic text. Validation belongs to callers.
//! - For insert/update/batch insert, the column list and the parameter list
//!   are produced from one walk over the same lexicographically ordered keys.
//! - Extra where-clause parameters are always appended after value
//!   parameters, in caller order.

use rusqlite::types::Value;
use std::collections::BTreeMap;

/// Operand prefixes rendered verbatim instead of being escaped.
const AGGREGATE_PREFIXES: &[&str] = &["COUNT(", "SUM(", "MIN(", "MAX(", "AVG("];

/// Rendered statement text and its ordered bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Column name to value mapping for single-row writes.
///
/// Keys are kept in lexicographic order; that order is the column order of
/// the rendered statement and the order of its bound values, regardless of
/// the order in which columns were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnValues(BTreeMap<String, Value>);

impl ColumnValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one column value.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(column.into(), value.into());
        self
    }

    /// Builder-style variant of `set`.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates columns in rendering order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(column, value)| (column.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ColumnValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        )
    }
}

/// Column name to per-row values mapping for multi-row inserts.
///
/// Every column should hold the same number of values, one per row. Keys
/// are ordered exactly like `ColumnValues`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchColumnValues(BTreeMap<String, Vec<Value>>);

impl BatchColumnValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one value to a column, creating the column when needed.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.entry(column.into()).or_default().push(value.into());
        self
    }

    /// Replaces a whole column.
    pub fn with_column(mut self, column: impl Into<String>, values: Vec<Value>) -> Self {
        self.0.insert(column.into(), values);
        self
    }

    /// Number of rows rendered: the longest column.
    pub fn row_count(&self) -> usize {
        self.0.values().map(Vec::len).max().unwrap_or(0)
    }

    /// True when every column holds exactly `row_count()` values.
    pub fn is_rectangular(&self) -> bool {
        let rows = self.row_count();
        self.0.values().all(|values| values.len() == rows)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    /// Separator placed between rendered operations, surrounding spaces
    /// included.
    pub fn separator(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// One comparison such as `` `Page`.`guid` = ? `` or `` `deletedAt` IS NULL ``.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereOperation {
    pub left: String,
    /// Comparison fragment rendered verbatim, e.g. `"= ?"` or `"IS NULL"`.
    pub fragment: String,
    /// Optional column operand rendered (escaped) after the fragment.
    pub right: Option<String>,
}

impl WhereOperation {
    pub fn new(left: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            fragment: fragment.into(),
            right: None,
        }
    }

    pub fn with_right(mut self, right: impl Into<String>) -> Self {
        self.right = Some(right.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereClause {
    pub combinator: Combinator,
    pub operations: Vec<WhereOperation>,
}

impl WhereClause {
    /// Operations joined with AND.
    pub fn all(operations: Vec<WhereOperation>) -> Self {
        Self {
            combinator: Combinator::And,
            operations,
        }
    }

    /// Operations joined with OR.
    pub fn any(operations: Vec<WhereOperation>) -> Self {
        Self {
            combinator: Combinator::Or,
            operations,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnCondition {
    pub left: String,
    pub right: String,
}

/// `JOIN <table> ON <left> = <right> [AND ...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    pub table: String,
    pub on: Vec<OnCondition>,
}

impl JoinClause {
    pub fn on(table: impl Into<String>, left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            on: vec![OnCondition {
                left: left.into(),
                right: right.into(),
            }],
        }
    }

    /// Adds another equality joined with AND.
    pub fn and(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.on.push(OnCondition {
            left: left.into(),
            right: right.into(),
        });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    pub column: String,
    pub direction: SortDirection,
}

impl OrderClause {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectStatement {
    pub columns: Vec<String>,
    pub from: String,
    pub joins: Vec<JoinClause>,
    pub filter: WhereClause,
    pub order: Option<OrderClause>,
    pub limit: Option<u64>,
}

impl SelectStatement {
    pub fn new<I, S>(columns: I, from: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            from: from.into(),
            ..Self::default()
        }
    }

    pub fn join(mut self, join: JoinClause) -> Self {
        self.joins.push(join);
        self
    }

    pub fn filter(mut self, filter: WhereClause) -> Self {
        self.filter = filter;
        self
    }

    pub fn order_by(mut self, order: OrderClause) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub into: String,
    pub values: ColumnValues,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchInsertStatement {
    pub into: String,
    pub rows: BatchColumnValues,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table: String,
    pub values: ColumnValues,
    pub filter: WhereClause,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteStatement {
    pub from: String,
    pub joins: Vec<JoinClause>,
    pub filter: WhereClause,
}

/// Renders a SELECT; `where_params` bind the placeholders of its filter.
pub fn build_select(statement: &SelectStatement, where_params: Vec<Value>) -> BuiltStatement {
    let mut sql = format!(
        "SELECT {} FROM {}",
        escape_sequence(&statement.columns),
        statement.from
    );
    push_joins(&mut sql, &statement.joins);
    push_where(&mut sql, &statement.filter);
    if let Some(order) = &statement.order {
        sql.push_str(&format!(
            " ORDER BY {} {}",
            escape_operand(&order.column),
            order.direction.as_sql()
        ));
    }
    if let Some(limit) = statement.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    BuiltStatement {
        sql,
        params: where_params,
    }
}

pub fn build_insert(statement: &InsertStatement) -> BuiltStatement {
    let (columns, params): (Vec<&str>, Vec<Value>) = statement
        .values
        .iter()
        .map(|(column, value)| (column, value.clone()))
        .unzip();

    BuiltStatement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            statement.into,
            escape_sequence(&columns),
            value_stub_list(columns.len())
        ),
        params,
    }
}

/// Renders a multi-row INSERT, one placeholder group per row.
///
/// Values are flattened row-major. A column shorter than the longest one is
/// padded with NULL.
pub fn build_batch_insert(statement: &BatchInsertStatement) -> BuiltStatement {
    let columns: Vec<&str> = statement.rows.0.keys().map(String::as_str).collect();
    let row_count = statement.rows.row_count();

    let group = format!("({})", value_stub_list(columns.len()));
    let groups = vec![group; row_count].join(",");

    let mut params = Vec::with_capacity(row_count * columns.len());
    for row in 0..row_count {
        for values in statement.rows.0.values() {
            params.push(values.get(row).cloned().unwrap_or(Value::Null));
        }
    }

    BuiltStatement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES {}",
            statement.into,
            escape_sequence(&columns),
            groups
        ),
        params,
    }
}

/// Renders an UPDATE; `where_params` are appended after the SET values.
pub fn build_update(statement: &UpdateStatement, where_params: Vec<Value>) -> BuiltStatement {
    let mut assignments = Vec::with_capacity(statement.values.len());
    let mut params = Vec::with_capacity(statement.values.len() + where_params.len());
    for (column, value) in statement.values.iter() {
        assignments.push(format!("{} = ?", escape_operand(column)));
        params.push(value.clone());
    }
    params.extend(where_params);

    let mut sql = format!("UPDATE {} SET {}", statement.table, assignments.join(","));
    push_where(&mut sql, &statement.filter);

    BuiltStatement { sql, params }
}

pub fn build_delete(statement: &DeleteStatement, where_params: Vec<Value>) -> BuiltStatement {
    let mut sql = format!("DELETE FROM {}", statement.from);
    push_joins(&mut sql, &statement.joins);
    push_where(&mut sql, &statement.filter);

    BuiltStatement {
        sql,
        params: where_params,
    }
}

/// Returns `n` comma-separated placeholders, e.g. `"?,?,?"` for 3.
pub fn value_stub_list(n: usize) -> String {
    vec!["?"; n].join(",")
}

fn push_joins(sql: &mut String, joins: &[JoinClause]) {
    if joins.is_empty() {
        return;
    }
    let rendered: Vec<String> = joins.iter().map(render_join).collect();
    sql.push(' ');
    sql.push_str(&rendered.join(" "));
}

fn render_join(join: &JoinClause) -> String {
    let conditions: Vec<String> = join
        .on
        .iter()
        .map(|condition| {
            format!(
                "{} = {}",
                escape_operand(&condition.left),
                escape_operand(&condition.right)
            )
        })
        .collect();
    format!("JOIN {} ON {}", join.table, conditions.join(" AND "))
}

fn push_where(sql: &mut String, filter: &WhereClause) {
    if filter.is_empty() {
        return;
    }
    sql.push_str(" WHERE ");
    sql.push_str(&render_where(filter));
}

fn render_where(filter: &WhereClause) -> String {
    filter
        .operations
        .iter()
        .map(render_operation)
        .collect::<Vec<_>>()
        .join(filter.combinator.separator())
}

fn render_operation(operation: &WhereOperation) -> String {
    let mut rendered = format!("{} {}", escape_operand(&operation.left), operation.fragment);
    if let Some(right) = &operation.right {
        rendered.push(' ');
        rendered.push_str(&escape_operand(right));
    }
    rendered
}

fn escape_sequence<S: AsRef<str>>(operands: &[S]) -> String {
    operands
        .iter()
        .map(|operand| escape_operand(operand.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Quotes each dot-separated segment unless the operand is an aggregate call.
fn escape_operand(operand: &str) -> String {
    if is_aggregate(operand) {
        return operand.to_string();
    }
    format!("`{}`", operand.replace('.', "`.`"))
}

fn is_aggregate(operand: &str) -> bool {
    let upper = operand.trim_start().to_ascii_uppercase();
    AGGREGATE_PREFIXES
        .iter()
        .any(|prefix| upper.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Value {
        Value::Text(value.to_string())
    }

    #[test]
    fn select_renders_joins_where_and_limit() {
        let statement = SelectStatement::new(
            [
                "Page.ID",
                "Version.guid",
                "PageTemplate.guid",
                "Page.title",
                "Page.summary",
                "Page.permission",
                "Page.createdAt",
                "Page.updatedAt",
            ],
            "Page",
        )
        .join(JoinClause::on("Version", "Page.Version_ID", "Version.ID"))
        .join(JoinClause::on(
            "PageTemplate",
            "Page.PageTemplate_ID",
            "PageTemplate.ID",
        ))
        .filter(WhereClause::all(vec![
            WhereOperation::new("guid", "= ?"),
            WhereOperation::new("deletedAt", "IS NULL"),
        ]))
        .limit(1);

        let built = build_select(&statement, vec![text("PG_1")]);
        assert_eq!(
            built.sql,
            "SELECT `Page`.`ID`,`Version`.`guid`,`PageTemplate`.`guid`,`Page`.`title`,`Page`.`summary`,`Page`.`permission`,`Page`.`createdAt`,`Page`.`updatedAt` FROM Page JOIN Version ON `Page`.`Version_ID` = `Version`.`ID` JOIN PageTemplate ON `Page`.`PageTemplate_ID` = `PageTemplate`.`ID` WHERE `guid` = ? AND `deletedAt` IS NULL LIMIT 1"
        );
        assert_eq!(built.params, vec![text("PG_1")]);
    }

    #[test]
    fn select_renders_composite_join_and_order() {
        let statement = SelectStatement::new(
            [
                "PagePropertyOrder.order",
                "PagePropertyNumber.value",
            ],
            "PagePropertyOrder",
        )
        .join(
            JoinClause::on(
                "PagePropertyNumber",
                "PagePropertyNumber.Page_ID",
                "PagePropertyOrder.Page_ID",
            )
            .and("PagePropertyNumber.Property_ID", "PagePropertyOrder.Property_ID"),
        )
        .order_by(OrderClause::asc("PagePropertyOrder.order"));

        let built = build_select(&statement, Vec::new());
        assert_eq!(
            built.sql,
            "SELECT `PagePropertyOrder`.`order`,`PagePropertyNumber`.`value` FROM PagePropertyOrder JOIN PagePropertyNumber ON `PagePropertyNumber`.`Page_ID` = `PagePropertyOrder`.`Page_ID` AND `PagePropertyNumber`.`Property_ID` = `PagePropertyOrder`.`Property_ID` ORDER BY `PagePropertyOrder`.`order` ASC"
        );
        assert!(built.params.is_empty());
    }

    #[test]
    fn aggregates_pass_through_unescaped() {
        let statement = SelectStatement::new(["COUNT(Page.ID)"], "Page").filter(WhereClause::all(
            vec![WhereOperation::new("Page.deletedAt", "IS NULL")],
        ));

        let built = build_select(&statement, Vec::new());
        assert_eq!(
            built.sql,
            "SELECT COUNT(Page.ID) FROM Page WHERE `Page`.`deletedAt` IS NULL"
        );
    }

    #[test]
    fn where_or_combinator_and_right_operand() {
        let filter = WhereClause::any(vec![
            WhereOperation::new("Page.createdAt", "=").with_right("Page.updatedAt"),
            WhereOperation::new("Page.deletedAt", "IS NOT NULL"),
        ]);
        let statement = SelectStatement::new(["Page.guid"], "Page")
            .filter(filter)
            .order_by(OrderClause::desc("Page.ID"));

        let built = build_select(&statement, Vec::new());
        assert_eq!(
            built.sql,
            "SELECT `Page`.`guid` FROM Page WHERE `Page`.`createdAt` = `Page`.`updatedAt` OR `Page`.`deletedAt` IS NOT NULL ORDER BY `Page`.`ID` DESC"
        );
    }

    #[test]
    fn insert_orders_columns_and_params_lexicographically() {
        let statement = InsertStatement {
            into: "Page".to_string(),
            values: ColumnValues::new()
                .with("PageTemplate_ID", 1_i64)
                .with("Version_ID", 2_i64)
                .with("guid", text("PG_1"))
                .with("title", text("Test Title"))
                .with("summary", text("Test Summary"))
                .with("permission", text("PU"))
                .with("createdAt", 1000_i64)
                .with("updatedAt", Value::Null),
        };

        let built = build_insert(&statement);
        assert_eq!(
            built.sql,
            "INSERT INTO Page (`PageTemplate_ID`,`Version_ID`,`createdAt`,`guid`,`permission`,`summary`,`title`,`updatedAt`) VALUES (?,?,?,?,?,?,?,?)"
        );
        assert_eq!(
            built.params,
            vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(1000),
                text("PG_1"),
                text("PU"),
                text("Test Summary"),
                text("Test Title"),
                Value::Null,
            ]
        );
    }

    #[test]
    fn insert_binding_is_independent_of_insertion_order() {
        let entries = [
            ("title", text("t")),
            ("guid", text("g")),
            ("Version_ID", Value::Integer(7)),
            ("summary", text("s")),
        ];
        let expected = build_insert(&InsertStatement {
            into: "Page".to_string(),
            values: entries.iter().cloned().collect(),
        });

        let orders: [[usize; 4]; 6] = [
            [0, 1, 2, 3],
            [3, 2, 1, 0],
            [1, 3, 0, 2],
            [2, 0, 3, 1],
            [1, 0, 2, 3],
            [3, 1, 2, 0],
        ];
        for order in orders {
            let mut values = ColumnValues::new();
            for index in order {
                let (column, value) = &entries[index];
                values.set(*column, value.clone());
            }
            let built = build_insert(&InsertStatement {
                into: "Page".to_string(),
                values,
            });
            assert_eq!(built, expected, "insertion order {order:?}");
        }

        assert_eq!(
            expected.params,
            vec![Value::Integer(7), text("g"), text("s"), text("t")]
        );
    }

    #[test]
    fn batch_insert_flattens_row_major() {
        let statement = BatchInsertStatement {
            into: "PagePropertyOrder".to_string(),
            rows: BatchColumnValues::new()
                .with_column("order", vec![Value::Integer(0), Value::Integer(1)])
                .with_column("Page_ID", vec![Value::Integer(9), Value::Integer(9)])
                .with_column("Property_ID", vec![Value::Integer(4), Value::Integer(5)]),
        };

        let built = build_batch_insert(&statement);
        assert_eq!(
            built.sql,
            "INSERT INTO PagePropertyOrder (`Page_ID`,`Property_ID`,`order`) VALUES (?,?,?),(?,?,?)"
        );
        assert_eq!(
            built.params,
            vec![
                Value::Integer(9),
                Value::Integer(4),
                Value::Integer(0),
                Value::Integer(9),
                Value::Integer(5),
                Value::Integer(1),
            ]
        );
    }

    #[test]
    fn batch_insert_pads_ragged_columns_with_null() {
        let mut rows = BatchColumnValues::new();
        rows.push("a", 1_i64).push("a", 2_i64).push("b", 3_i64);
        assert!(!rows.is_rectangular());
        assert_eq!(rows.row_count(), 2);

        let built = build_batch_insert(&BatchInsertStatement {
            into: "T".to_string(),
            rows,
        });
        assert_eq!(built.sql, "INSERT INTO T (`a`,`b`) VALUES (?,?),(?,?)");
        assert_eq!(
            built.params,
            vec![
                Value::Integer(1),
                Value::Integer(3),
                Value::Integer(2),
                Value::Null,
            ]
        );
    }

    #[test]
    fn update_appends_where_params_after_sorted_values() {
        let statement = UpdateStatement {
            table: "Page".to_string(),
            values: ColumnValues::new()
                .with("updatedAt", 5_i64)
                .with("title", text("new")),
            filter: WhereClause::all(vec![
                WhereOperation::new("guid", "= ?"),
                WhereOperation::new("deletedAt", "IS NULL"),
            ]),
        };

        let built = build_update(&statement, vec![text("PG_1")]);
        assert_eq!(
            built.sql,
            "UPDATE Page SET `title` = ?,`updatedAt` = ? WHERE `guid` = ? AND `deletedAt` IS NULL"
        );
        assert_eq!(
            built.params,
            vec![text("new"), Value::Integer(5), text("PG_1")]
        );
    }

    #[test]
    fn delete_renders_joins_and_where() {
        let statement = DeleteStatement {
            from: "PagePropertyOrder".to_string(),
            joins: vec![JoinClause::on(
                "Page",
                "PagePropertyOrder.Page_ID",
                "Page.ID",
            )],
            filter: WhereClause::all(vec![WhereOperation::new("Page.guid", "= ?")]),
        };

        let built = build_delete(&statement, vec![text("PG_1")]);
        assert_eq!(
            built.sql,
            "DELETE FROM PagePropertyOrder JOIN Page ON `PagePropertyOrder`.`Page_ID` = `Page`.`ID` WHERE `Page`.`guid` = ?"
        );
        assert_eq!(built.params, vec![text("PG_1")]);
    }

    #[test]
    fn delete_without_filter_has_no_where() {
        let built = build_delete(
            &DeleteStatement {
                from: "healthcheck".to_string(),
                ..DeleteStatement::default()
            },
            Vec::new(),
        );
        assert_eq!(built.sql, "DELETE FROM healthcheck");
    }

    #[test]
    fn value_stub_list_renders_n_placeholders() {
        assert_eq!(value_stub_list(0), "");
        assert_eq!(value_stub_list(1), "?");
        assert_eq!(value_stub_list(3), "?,?,?");
    }
}
