//! Page use-case service.
//!
//! # Responsibility
//! - Resolve external version/template/user identifiers before persistence.
//! - Check ownership or read permission before delegating to the repository.
//!
//! # Invariants
//! - Mutations are gated by `can_edit_page`, reads by `can_read_page`.
//! - Service APIs never bypass repository validation.

use crate::error::{StoreError, StoreResult};
use crate::model::{Page, PageBatch, PagePatch, PageProperty, PermissionType};
use crate::repo::page_repo::PageRepository;
use crate::repo::reference_repo::ReferenceRepository;
use log::debug;
use serde::Deserialize;

/// Number of pages returned per listing window.
pub const PAGE_BATCH_SIZE: u32 = 10;

/// Input for creating a page; identifiers are external (`guid`) values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatePageRequest {
    /// Proposed page identifier; empty generates one.
    pub id: String,
    pub title: String,
    pub summary: String,
    /// Defaults to private.
    pub permission: Option<PermissionType>,
    pub version_id: String,
    pub page_template_id: String,
}

/// Input for a partial page update; `None` or an empty string leaves a field
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePageRequest {
    pub id: String,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub permission: Option<PermissionType>,
    pub version_id: Option<String>,
    pub page_template_id: Option<String>,
}

/// Use-case service over page and reference repositories.
pub struct PageService<P: PageRepository, R: ReferenceRepository> {
    pages: P,
    references: R,
}

impl<P: PageRepository, R: ReferenceRepository> PageService<P, R> {
    pub fn new(pages: P, references: R) -> Self {
        Self { pages, references }
    }

    /// Creates a page owned by `owner_guid`.
    ///
    /// # Contract
    /// - Version and template must exist and not be soft-deleted.
    /// - A proposed `id` that is already taken fails with `Conflict`.
    pub fn create_page(&self, request: CreatePageRequest, owner_guid: &str) -> StoreResult<Page> {
        if request.title.is_empty() {
            return Err(StoreError::validation("must provide a title to create the page"));
        }

        let page_template = self
            .references
            .get_page_template(&request.page_template_id)?;
        let version = self.references.get_version(&request.version_id)?;
        let guid = self.pages.unique_page_id(&request.id)?;
        let owner = self.references.get_user(owner_guid)?;

        let page = Page {
            guid,
            version,
            page_template,
            title: request.title,
            summary: request.summary,
            permission: request.permission,
            ..Page::default()
        };
        self.pages.create_page(page, owner.id)
    }

    /// Applies the supplied fields of `request` to a page the caller owns.
    pub fn update_page(&self, request: UpdatePageRequest, user_guid: &str) -> StoreResult<()> {
        self.pages.can_edit_page(&request.id, user_guid)?;

        let mut patch = PagePatch::new(request.id);
        patch.title = request.title.filter(|title| !title.is_empty());
        patch.summary = request.summary.filter(|summary| !summary.is_empty());
        patch.permission = request.permission;
        if let Some(guid) = request.version_id.filter(|guid| !guid.is_empty()) {
            patch.version_id = Some(self.references.get_version(&guid)?.id);
        }
        if let Some(guid) = request.page_template_id.filter(|guid| !guid.is_empty()) {
            patch.page_template_id = Some(self.references.get_page_template(&guid)?.id);
        }

        self.pages.set_page(&patch)
    }

    pub fn get_page(&self, guid: &str, user_guid: &str) -> StoreResult<Page> {
        self.pages.can_read_page(guid, user_guid)?;
        self.pages.get_page(guid)
    }

    /// Lists the caller's pages, `PAGE_BATCH_SIZE` at a time.
    pub fn get_pages(&self, user_guid: &str, cursor: &str) -> StoreResult<PageBatch> {
        let batch = self.pages.list_pages(user_guid, cursor, PAGE_BATCH_SIZE)?;
        debug!(
            "event=page_list module=service status=ok returned={} total={} has_next={}",
            batch.pages.len(),
            batch.total,
            !batch.next_cursor.is_empty()
        );
        Ok(batch)
    }

    pub fn remove_page(&self, guid: &str, user_guid: &str) -> StoreResult<()> {
        self.pages.can_edit_page(guid, user_guid)?;
        self.pages.remove_page(guid)
    }

    pub fn get_page_properties(
        &self,
        guid: &str,
        user_guid: &str,
    ) -> StoreResult<Vec<PageProperty>> {
        self.pages.can_read_page(guid, user_guid)?;
        self.pages.get_page_properties(guid)
    }

    pub fn replace_page_properties(
        &self,
        guid: &str,
        user_guid: &str,
        properties: &[PageProperty],
    ) -> StoreResult<()> {
        self.pages.can_edit_page(guid, user_guid)?;
        self.pages.replace_page_properties(guid, properties)
    }
}
