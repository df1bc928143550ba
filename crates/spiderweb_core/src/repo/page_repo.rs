//! Page repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create, read, list, patch and soft-delete pages.
//! - Gate access on the `PageOwner` relation and page permission.
//! - Read and replace a page's typed properties.
//!
//! # Invariants
//! - Validation runs before any statement is issued.
//! - Soft-deleted pages are excluded from every read.
//! - Multi-statement writes run in one transaction; a failed step leaves no
//!   partial effect behind.
//! - Every statement goes through `sql::builder`, so bound values follow the
//!   builder's column ordering.

use crate::clock::{Clock, SystemClock};
use crate::error::{StoreError, StoreResult};
use crate::ident::{MAX_RETRY_ATTEMPTS, PAGE_ID_FORMAT};
use crate::model::{
    Page, PageBatch, PagePatch, PageProperty, PageTemplate, PermissionType, PropertyType,
    PropertyValue, Version,
};
use crate::repo::schema::{ensure_connection_ready, TableRequirement};
use crate::repo::unique_id::resolve_unique_identifier;
use crate::sql::{
    build_batch_insert, build_delete, build_insert, build_select, build_update,
    exec_batch_insert, exec_delete, exec_insert, exec_update, query_all_rows, query_single_row,
    value_stub_list, BatchColumnValues, BatchInsertStatement, ColumnValues, DeleteStatement,
    InsertStatement, JoinClause, OrderClause, SelectStatement, UpdateStatement, WhereClause,
    WhereOperation,
};
use log::info;
use rusqlite::types::Value;
use rusqlite::{Connection, Row, Transaction, TransactionBehavior};
use std::collections::{HashMap, HashSet};

const PAGE_TABLE: &str = "Page";

const REQUIRED_TABLES: &[TableRequirement] = &[
    (
        "Page",
        &[
            "ID",
            "Version_ID",
            "PageTemplate_ID",
            "guid",
            "title",
            "summary",
            "permission",
            "createdAt",
            "updatedAt",
            "deletedAt",
        ],
    ),
    ("PageOwner", &["Page_ID", "User_ID", "isOwner"]),
    ("User", &["ID", "guid"]),
    ("Version", &["ID", "guid", "name"]),
    ("PageTemplate", &["ID", "guid", "name"]),
    ("Property", &["ID", "Version_ID", "type", "key", "deletedAt"]),
    ("PagePropertyOrder", &["Page_ID", "Property_ID", "order"]),
    ("PagePropertyNumber", &["Page_ID", "Property_ID", "value"]),
    ("PagePropertyString", &["Page_ID", "Property_ID", "value"]),
];

/// Columns read by `page_from_row`, in index order.
const PAGE_COLUMNS: &[&str] = &[
    "Page.ID",
    "Page.guid",
    "Page.title",
    "Page.summary",
    "Page.permission",
    "Page.createdAt",
    "Page.updatedAt",
    "Page.deletedAt",
    "Version.ID",
    "Version.guid",
    "Version.name",
    "PageTemplate.ID",
    "PageTemplate.guid",
    "PageTemplate.name",
];

/// Repository interface for pages, ownership and page properties.
pub trait PageRepository {
    /// Resolves a store-verified page identifier; empty `proposed` generates
    /// one.
    fn unique_page_id(&self, proposed: &str) -> StoreResult<String>;
    /// Inserts `page` and an owner row for `owner_id` (internal user id).
    fn create_page(&self, page: Page, owner_id: i64) -> StoreResult<Page>;
    /// Returns the caller's `isOwner` flag; no ownership row is
    /// `NotAuthorized`.
    fn can_edit_page(&self, page_guid: &str, user_guid: &str) -> StoreResult<bool>;
    /// Returns whether the caller owns the page; non-owners may read public
    /// pages, anything else is `NotAuthorized`.
    fn can_read_page(&self, page_guid: &str, user_guid: &str) -> StoreResult<bool>;
    fn set_page(&self, patch: &PagePatch) -> StoreResult<()>;
    /// Writes the non-empty fields of `page`.
    fn update_page(&self, page: &Page) -> StoreResult<()>;
    fn get_page(&self, guid: &str) -> StoreResult<Page>;
    /// Lists the caller's pages starting at `cursor` (inclusive).
    fn list_pages(&self, user_guid: &str, cursor: &str, limit: u32) -> StoreResult<PageBatch>;
    fn remove_page(&self, guid: &str) -> StoreResult<()>;
    fn get_page_properties(&self, guid: &str) -> StoreResult<Vec<PageProperty>>;
    /// Replaces all property values of a page, keeping the given order.
    fn replace_page_properties(&self, guid: &str, properties: &[PageProperty])
        -> StoreResult<()>;
}

/// SQLite-backed page repository.
pub struct SqlitePageRepository<'conn, C: Clock = SystemClock> {
    conn: &'conn Connection,
    clock: C,
}

impl<'conn> SqlitePageRepository<'conn, SystemClock> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        Self::with_clock(conn, SystemClock)
    }
}

impl<'conn, C: Clock> SqlitePageRepository<'conn, C> {
    /// Constructs a repository stamping timestamps from `clock`.
    pub fn with_clock(conn: &'conn Connection, clock: C) -> StoreResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn, clock })
    }

    /// Internal `(ID, Version_ID)` of a live page.
    fn page_keys(&self, guid: &str) -> StoreResult<(i64, i64)> {
        let statement = build_select(
            &SelectStatement::new(["Page.ID", "Page.Version_ID"], PAGE_TABLE)
                .filter(live_page_filter())
                .limit(1),
            vec![text(guid)],
        );
        query_single_row(self.conn, &statement, guid, |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
    }

    /// Sequence position a cursor points at; unknown cursors start at 0.
    fn cursor_position(&self, cursor: &str) -> StoreResult<i64> {
        if cursor.is_empty() {
            return Ok(0);
        }
        let statement = build_select(
            &SelectStatement::new(["Page.ID"], PAGE_TABLE)
                .filter(WhereClause::all(vec![WhereOperation::new("guid", "= ?")]))
                .limit(1),
            vec![text(cursor)],
        );
        let positions: Vec<i64> = query_all_rows(self.conn, &statement, |row| Ok(row.get(0)?))?;
        Ok(positions.first().copied().unwrap_or(0))
    }

    fn count_owned_pages(&self, user_guid: &str) -> StoreResult<u64> {
        let statement = build_select(
            &SelectStatement::new(["COUNT(Page.ID)"], PAGE_TABLE)
                .join(ownership_join())
                .join(owner_user_join())
                .filter(owned_live_filter()),
            vec![text(user_guid), Value::Integer(1)],
        );
        let total: i64 = query_single_row(self.conn, &statement, user_guid, |row| Ok(row.get(0)?))?;
        Ok(total.max(0) as u64)
    }

    /// Maps each key to `(Property.ID, type)` within a version.
    fn property_definitions(
        &self,
        version_id: i64,
        keys: &[&str],
    ) -> StoreResult<HashMap<String, (i64, PropertyType)>> {
        let mut params = vec![Value::Integer(version_id)];
        params.extend(keys.iter().map(|key| text(key)));

        let statement = build_select(
            &SelectStatement::new(["Property.ID", "Property.key", "Property.type"], "Property")
                .filter(WhereClause::all(vec![
                    WhereOperation::new("Property.Version_ID", "= ?"),
                    WhereOperation::new("Property.deletedAt", "IS NULL"),
                    WhereOperation::new(
                        "Property.key",
                        format!("IN ({})", value_stub_list(keys.len())),
                    ),
                ])),
            params,
        );
        let rows = query_all_rows(self.conn, &statement, |row| {
            let id: i64 = row.get(0)?;
            let key: String = row.get(1)?;
            let raw_type: String = row.get(2)?;
            let property_type = PropertyType::from_db(&raw_type).ok_or_else(|| {
                StoreError::InvalidData(format!("invalid Property.type `{raw_type}`"))
            })?;
            Ok((key, (id, property_type)))
        })?;
        Ok(rows.into_iter().collect())
    }

    /// Reads `(order, key, value)` rows of one value table.
    fn typed_property_rows<F>(
        &self,
        page_id: i64,
        value_table: &str,
        to_value: F,
    ) -> StoreResult<Vec<(i64, PageProperty)>>
    where
        F: Fn(&Row<'_>) -> rusqlite::Result<PropertyValue>,
    {
        let statement = build_select(
            &SelectStatement::new(
                [
                    "PagePropertyOrder.order".to_string(),
                    "Property.key".to_string(),
                    format!("{value_table}.value"),
                ],
                "PagePropertyOrder",
            )
            .join(JoinClause::on(
                "Property",
                "PagePropertyOrder.Property_ID",
                "Property.ID",
            ))
            .join(
                JoinClause::on(
                    value_table,
                    format!("{value_table}.Page_ID"),
                    "PagePropertyOrder.Page_ID",
                )
                .and(
                    format!("{value_table}.Property_ID"),
                    "PagePropertyOrder.Property_ID",
                ),
            )
            .filter(WhereClause::all(vec![WhereOperation::new(
                "PagePropertyOrder.Page_ID",
                "= ?",
            )])),
            vec![Value::Integer(page_id)],
        );
        query_all_rows(self.conn, &statement, |row| {
            let order: i64 = row.get(0)?;
            let key: String = row.get(1)?;
            Ok((order, PageProperty { key, value: to_value(row)? }))
        })
    }
}

impl<C: Clock> PageRepository for SqlitePageRepository<'_, C> {
    fn unique_page_id(&self, proposed: &str) -> StoreResult<String> {
        resolve_unique_identifier(
            self.conn,
            PAGE_TABLE,
            PAGE_ID_FORMAT.prefix,
            PAGE_ID_FORMAT.length,
            proposed,
            MAX_RETRY_ATTEMPTS,
        )
    }

    fn create_page(&self, mut page: Page, owner_id: i64) -> StoreResult<Page> {
        if page.guid.is_empty() {
            return Err(StoreError::validation("must provide a page id to create the page"));
        }
        if page.title.is_empty() {
            return Err(StoreError::validation("must provide a title to create the page"));
        }
        if page.version.id == 0 {
            return Err(StoreError::validation("must provide a version to create the page"));
        }
        if page.page_template.id == 0 {
            return Err(StoreError::validation(
                "must provide a page template to create the page",
            ));
        }
        if owner_id == 0 {
            return Err(StoreError::validation("must provide an owner to create the page"));
        }

        let now = self.clock.now_epoch_ms();
        page.created_at = now;
        page.updated_at = now;
        page.deleted_at = None;
        let permission = page.permission.unwrap_or_default();
        page.permission = Some(permission);

        let insert_page = build_insert(&InsertStatement {
            into: PAGE_TABLE.to_string(),
            values: ColumnValues::new()
                .with("Version_ID", page.version.id)
                .with("PageTemplate_ID", page.page_template.id)
                .with("guid", page.guid.clone())
                .with("title", page.title.clone())
                .with("summary", page.summary.clone())
                .with("permission", permission.as_db().to_string())
                .with("createdAt", now)
                .with("updatedAt", now),
        });

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        page.id = exec_insert(&tx, &insert_page)?;
        let insert_owner = build_insert(&InsertStatement {
            into: "PageOwner".to_string(),
            values: ColumnValues::new()
                .with("Page_ID", page.id)
                .with("User_ID", owner_id)
                .with("isOwner", true),
        });
        exec_insert(&tx, &insert_owner)?;
        tx.commit()?;

        info!(
            "event=page_create module=repo status=ok page_id={}",
            page.guid
        );
        Ok(page)
    }

    fn can_edit_page(&self, page_guid: &str, user_guid: &str) -> StoreResult<bool> {
        if page_guid.is_empty() {
            return Err(StoreError::validation("must provide a page id to check privileges"));
        }
        if user_guid.is_empty() {
            return Err(StoreError::validation("must provide a user id to check privileges"));
        }

        let statement = build_select(
            &SelectStatement::new(["PageOwner.isOwner"], "PageOwner")
                .join(JoinClause::on("Page", "PageOwner.Page_ID", "Page.ID"))
                .join(owner_user_join())
                .filter(WhereClause::all(vec![
                    WhereOperation::new("Page.guid", "= ?"),
                    WhereOperation::new("User.guid", "= ?"),
                ]))
                .limit(1),
            vec![text(page_guid), text(user_guid)],
        );
        match query_single_row(self.conn, &statement, page_guid, |row| Ok(row.get(0)?)) {
            Err(StoreError::NotFound { .. }) => {
                Err(StoreError::not_authorized(user_guid, page_guid))
            }
            other => other,
        }
    }

    fn can_read_page(&self, page_guid: &str, user_guid: &str) -> StoreResult<bool> {
        match self.can_edit_page(page_guid, user_guid) {
            Ok(true) => return Ok(true),
            Ok(false) | Err(StoreError::NotAuthorized { .. }) => {}
            Err(err) => return Err(err),
        }

        let statement = build_select(
            &SelectStatement::new(["Page.permission"], PAGE_TABLE)
                .filter(WhereClause::all(vec![WhereOperation::new("guid", "= ?")]))
                .limit(1),
            vec![text(page_guid)],
        );
        let permissions: Vec<String> =
            query_all_rows(self.conn, &statement, |row| Ok(row.get(0)?))?;
        let Some(raw) = permissions.first() else {
            return Err(StoreError::not_authorized(user_guid, page_guid));
        };
        if parse_permission(raw)?.is_public() {
            Ok(false)
        } else {
            Err(StoreError::not_authorized(user_guid, page_guid))
        }
    }

    fn set_page(&self, patch: &PagePatch) -> StoreResult<()> {
        if patch.guid.is_empty() {
            return Err(StoreError::validation("must provide a page id to update the page"));
        }

        let mut values = ColumnValues::new().with("updatedAt", self.clock.now_epoch_ms());
        if let Some(title) = patch.title.as_deref().filter(|title| !title.is_empty()) {
            values.set("title", title.to_string());
        }
        if let Some(summary) = patch.summary.as_deref().filter(|summary| !summary.is_empty()) {
            values.set("summary", summary.to_string());
        }
        if let Some(permission) = patch.permission {
            values.set("permission", permission.as_db().to_string());
        }
        if let Some(version_id) = patch.version_id {
            values.set("Version_ID", version_id);
        }
        if let Some(page_template_id) = patch.page_template_id {
            values.set("PageTemplate_ID", page_template_id);
        }
        if let Some(deleted_at) = patch.deleted_at {
            values.set("deletedAt", deleted_at);
        }

        let statement = build_update(
            &UpdateStatement {
                table: PAGE_TABLE.to_string(),
                values,
                filter: live_page_filter(),
            },
            vec![text(&patch.guid)],
        );
        exec_update(self.conn, &statement)
    }

    fn update_page(&self, page: &Page) -> StoreResult<()> {
        self.set_page(&PagePatch::from_record(page))
    }

    fn get_page(&self, guid: &str) -> StoreResult<Page> {
        if guid.is_empty() {
            return Err(StoreError::validation("must provide a page id to get the page"));
        }
        let statement = build_select(
            &page_select()
                .filter(WhereClause::all(vec![
                    WhereOperation::new("Page.guid", "= ?"),
                    WhereOperation::new("Page.deletedAt", "IS NULL"),
                ]))
                .limit(1),
            vec![text(guid)],
        );
        query_single_row(self.conn, &statement, guid, page_from_row)
    }

    fn list_pages(&self, user_guid: &str, cursor: &str, limit: u32) -> StoreResult<PageBatch> {
        if user_guid.is_empty() {
            return Err(StoreError::validation("must provide a user id to list pages"));
        }
        if limit == 0 {
            return Err(StoreError::validation("limit must be at least 1"));
        }

        let position = self.cursor_position(cursor)?;
        let mut filter = owned_live_filter();
        filter
            .operations
            .push(WhereOperation::new("Page.ID", ">= ?"));
        let statement = build_select(
            &page_select()
                .join(ownership_join())
                .join(owner_user_join())
                .filter(filter)
                .order_by(OrderClause::asc("Page.ID"))
                .limit(u64::from(limit) + 1),
            vec![text(user_guid), Value::Integer(1), Value::Integer(position)],
        );
        let mut pages = query_all_rows(self.conn, &statement, page_from_row)?;

        let next_cursor = if pages.len() > limit as usize {
            pages.pop().map(|page| page.guid).unwrap_or_default()
        } else {
            String::new()
        };
        let total = self.count_owned_pages(user_guid)?;

        Ok(PageBatch {
            pages,
            total,
            next_cursor,
        })
    }

    fn remove_page(&self, guid: &str) -> StoreResult<()> {
        let patch = PagePatch {
            deleted_at: Some(self.clock.now_epoch_ms()),
            ..PagePatch::new(guid)
        };
        self.set_page(&patch)?;
        info!("event=page_remove module=repo status=ok page_id={guid}");
        Ok(())
    }

    fn get_page_properties(&self, guid: &str) -> StoreResult<Vec<PageProperty>> {
        let (page_id, _) = self.page_keys(guid)?;

        let mut rows = self.typed_property_rows(page_id, "PagePropertyNumber", |row| {
            Ok(PropertyValue::Number(row.get(2)?))
        })?;
        rows.extend(
            self.typed_property_rows(page_id, "PagePropertyString", |row| {
                Ok(PropertyValue::String(row.get(2)?))
            })?,
        );
        rows.sort_by_key(|(order, _)| *order);

        Ok(rows.into_iter().map(|(_, property)| property).collect())
    }

    fn replace_page_properties(
        &self,
        guid: &str,
        properties: &[PageProperty],
    ) -> StoreResult<()> {
        let mut seen = HashSet::new();
        for property in properties {
            if property.key.is_empty() {
                return Err(StoreError::validation("property key must not be empty"));
            }
            if !seen.insert(property.key.as_str()) {
                return Err(StoreError::validation(format!(
                    "property `{}` is listed more than once",
                    property.key
                )));
            }
        }

        let (page_id, version_id) = self.page_keys(guid)?;
        let keys: Vec<&str> = properties.iter().map(|p| p.key.as_str()).collect();
        let definitions = if keys.is_empty() {
            HashMap::new()
        } else {
            self.property_definitions(version_id, &keys)?
        };

        let mut order_rows = BatchColumnValues::new();
        let mut number_rows = BatchColumnValues::new();
        let mut string_rows = BatchColumnValues::new();
        for (position, property) in properties.iter().enumerate() {
            let (property_id, declared) = definitions
                .get(&property.key)
                .copied()
                .ok_or_else(|| StoreError::not_found(property.key.clone()))?;
            if declared != property.value.property_type() {
                return Err(StoreError::validation(format!(
                    "property `{}` expects a {} value",
                    property.key,
                    match declared {
                        PropertyType::Number => "number",
                        PropertyType::String => "string",
                    }
                )));
            }

            order_rows
                .push("Page_ID", page_id)
                .push("Property_ID", property_id)
                .push("order", position as i64);
            let value_rows = match &property.value {
                PropertyValue::Number(value) => {
                    number_rows.push("value", *value);
                    &mut number_rows
                }
                PropertyValue::String(value) => {
                    string_rows.push("value", value.clone());
                    &mut string_rows
                }
            };
            value_rows
                .push("Page_ID", page_id)
                .push("Property_ID", property_id);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for table in ["PagePropertyOrder", "PagePropertyNumber", "PagePropertyString"] {
            let delete = build_delete(
                &DeleteStatement {
                    from: table.to_string(),
                    filter: WhereClause::all(vec![WhereOperation::new("Page_ID", "= ?")]),
                    ..DeleteStatement::default()
                },
                vec![Value::Integer(page_id)],
            );
            exec_delete(&tx, &delete)?;
        }
        for (table, rows) in [
            ("PagePropertyOrder", order_rows),
            ("PagePropertyNumber", number_rows),
            ("PagePropertyString", string_rows),
        ] {
            if rows.is_empty() {
                continue;
            }
            let insert = build_batch_insert(&BatchInsertStatement {
                into: table.to_string(),
                rows,
            });
            exec_batch_insert(&tx, &insert)?;
        }
        tx.commit()?;

        info!(
            "event=page_properties_replace module=repo status=ok page_id={} count={}",
            guid,
            properties.len()
        );
        Ok(())
    }
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn page_select() -> SelectStatement {
    SelectStatement::new(PAGE_COLUMNS.iter().copied(), PAGE_TABLE)
        .join(JoinClause::on("Version", "Page.Version_ID", "Version.ID"))
        .join(JoinClause::on(
            "PageTemplate",
            "Page.PageTemplate_ID",
            "PageTemplate.ID",
        ))
}

fn ownership_join() -> JoinClause {
    JoinClause::on("PageOwner", "PageOwner.Page_ID", "Page.ID")
}

fn owner_user_join() -> JoinClause {
    JoinClause::on("User", "PageOwner.User_ID", "User.ID")
}

/// `guid = ? AND deletedAt IS NULL` on `Page`.
fn live_page_filter() -> WhereClause {
    WhereClause::all(vec![
        WhereOperation::new("guid", "= ?"),
        WhereOperation::new("deletedAt", "IS NULL"),
    ])
}

/// Binds `User.guid` then `PageOwner.isOwner`.
fn owned_live_filter() -> WhereClause {
    WhereClause::all(vec![
        WhereOperation::new("User.guid", "= ?"),
        WhereOperation::new("Page.deletedAt", "IS NULL"),
        WhereOperation::new("PageOwner.isOwner", "= ?"),
    ])
}

fn parse_permission(raw: &str) -> StoreResult<PermissionType> {
    PermissionType::from_db(raw)
        .ok_or_else(|| StoreError::InvalidData(format!("invalid Page.permission `{raw}`")))
}

fn page_from_row(row: &Row<'_>) -> StoreResult<Page> {
    let raw_permission: String = row.get(4)?;
    Ok(Page {
        id: row.get(0)?,
        guid: row.get(1)?,
        title: row.get(2)?,
        summary: row.get(3)?,
        permission: Some(parse_permission(&raw_permission)?),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        deleted_at: row.get(7)?,
        version: Version {
            id: row.get(8)?,
            guid: row.get(9)?,
            name: row.get(10)?,
        },
        page_template: PageTemplate {
            id: row.get(11)?,
            guid: row.get(12)?,
            name: row.get(13)?,
        },
    })
}
