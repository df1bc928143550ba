#![allow(dead_code)]

use rusqlite::{params, Connection};
use spiderweb_core::{Page, PageTemplate, PermissionType, Version};

pub const ALICE: &str = "UR_alice";
pub const BOB: &str = "UR_bob";
pub const VERSION: &str = "VR_main";
pub const OTHER_VERSION: &str = "VR_fork";
pub const TEMPLATE: &str = "PT_person";

/// Internal ids of the seeded reference rows.
pub struct Fixture {
    pub alice_id: i64,
    pub bob_id: i64,
    pub version: Version,
    pub other_version: Version,
    pub template: PageTemplate,
}

/// Seeds two users, two versions, one template and the property definitions
/// `hp` (number), `race` (string) and `level` (number) on the main version.
pub fn seed(conn: &Connection) -> Fixture {
    let alice_id = insert(
        conn,
        "INSERT INTO User (guid, email) VALUES (?1, ?2);",
        params![ALICE, "alice@example.com"],
    );
    let bob_id = insert(
        conn,
        "INSERT INTO User (guid, email) VALUES (?1, ?2);",
        params![BOB, "bob@example.com"],
    );
    let version_id = insert(
        conn,
        "INSERT INTO Version (guid, name) VALUES (?1, ?2);",
        params![VERSION, "Main"],
    );
    let other_version_id = insert(
        conn,
        "INSERT INTO Version (guid, name) VALUES (?1, ?2);",
        params![OTHER_VERSION, "Fork"],
    );
    let template_id = insert(
        conn,
        "INSERT INTO PageTemplate (guid, name) VALUES (?1, ?2);",
        params![TEMPLATE, "Person"],
    );

    for (version, kind, key) in [
        (version_id, "NU", "hp"),
        (version_id, "ST", "race"),
        (version_id, "NU", "level"),
        (other_version_id, "ST", "alignment"),
    ] {
        insert(
            conn,
            "INSERT INTO Property (Version_ID, type, \"key\") VALUES (?1, ?2, ?3);",
            params![version, kind, key],
        );
    }

    Fixture {
        alice_id,
        bob_id,
        version: Version {
            id: version_id,
            guid: VERSION.to_string(),
            name: "Main".to_string(),
        },
        other_version: Version {
            id: other_version_id,
            guid: OTHER_VERSION.to_string(),
            name: "Fork".to_string(),
        },
        template: PageTemplate {
            id: template_id,
            guid: TEMPLATE.to_string(),
            name: "Person".to_string(),
        },
    }
}

/// Unsaved page on the main version and template.
pub fn new_page(fixture: &Fixture, guid: &str, title: &str, permission: PermissionType) -> Page {
    Page {
        guid: guid.to_string(),
        title: title.to_string(),
        summary: format!("{title} summary"),
        permission: Some(permission),
        version: fixture.version.clone(),
        page_template: fixture.template.clone(),
        ..Page::default()
    }
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn insert(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> i64 {
    conn.execute(sql, params).unwrap();
    conn.last_insert_rowid()
}
