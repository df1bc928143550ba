//! Records referenced by pages: versions, page templates and users.

use serde::Serialize;

/// Content version a page belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Version {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "id")]
    pub guid: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageTemplate {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "id")]
    pub guid: String,
    pub name: String,
}

/// Account that can own pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppUser {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "id")]
    pub guid: String,
    pub email: String,
}
