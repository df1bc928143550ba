//! Page record, visibility levels and partial updates.
//!
//! # Invariants
//! - `PagePatch` only carries fields the caller wants written; `None` means
//!   "leave untouched", never "set to NULL". Empty strings are also skipped.
//! - Records loaded from the store always carry a permission; an unsaved
//!   record may leave it unset.
//! - A soft-deleted page keeps its row and has `deleted_at` set.

use crate::model::reference::{PageTemplate, Version};
use serde::{Deserialize, Serialize};

/// Visibility level of a page for users that do not own it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PermissionType {
    #[default]
    #[serde(rename = "PR")]
    Private,
    #[serde(rename = "PU")]
    Public,
    #[serde(rename = "PO")]
    PublicOnly,
    #[serde(rename = "LO")]
    LinkOnly,
}

impl PermissionType {
    /// Two-letter code stored in `Page.permission`.
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Private => "PR",
            Self::Public => "PU",
            Self::PublicOnly => "PO",
            Self::LinkOnly => "LO",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "PR" => Some(Self::Private),
            "PU" => Some(Self::Public),
            "PO" => Some(Self::PublicOnly),
            "LO" => Some(Self::LinkOnly),
            _ => None,
        }
    }

    /// Whether non-owners may read a page with this permission.
    pub fn is_public(self) -> bool {
        self != Self::Private
    }
}

/// Page record as persisted, with its version and template resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "id")]
    pub guid: String,
    pub version: Version,
    pub page_template: PageTemplate,
    pub title: String,
    pub summary: String,
    /// `None` on a record means "not supplied"; create falls back to private.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<PermissionType>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

/// Fields to write on an existing page, addressed by `guid`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagePatch {
    pub guid: String,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub permission: Option<PermissionType>,
    pub version_id: Option<i64>,
    pub page_template_id: Option<i64>,
    pub deleted_at: Option<i64>,
}

impl PagePatch {
    pub fn new(guid: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            ..Self::default()
        }
    }

    /// Derives a patch from the non-empty, non-zero fields of `page`.
    ///
    /// Empty strings and zero ids are treated as "not supplied".
    pub fn from_record(page: &Page) -> Self {
        Self {
            guid: page.guid.clone(),
            title: non_empty(&page.title),
            summary: non_empty(&page.summary),
            permission: page.permission,
            version_id: non_zero(page.version.id),
            page_template_id: non_zero(page.page_template.id),
            deleted_at: page.deleted_at,
        }
    }
}

/// One window of a cursor-paginated page listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBatch {
    pub pages: Vec<Page>,
    /// Number of matching pages across all windows.
    pub total: u64,
    /// Identifier to pass back for the next window; empty when exhausted.
    pub next_cursor: String,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn non_zero(value: i64) -> Option<i64> {
    (value != 0).then_some(value)
}
