//! Page detail documents made of nested markdown partitions.
//!
//! # Invariants
//! - Every partition carries a known `PartitionType`; unknown type codes are
//!   rejected while decoding, at any nesting depth.
//! - A detail always keeps a non-empty title.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

/// Markdown construct a partition renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartitionType {
    #[serde(rename = "h1")]
    HeaderOne,
    #[serde(rename = "h2")]
    HeaderTwo,
    #[serde(rename = "h3")]
    HeaderThree,
    #[serde(rename = "h4")]
    HeaderFour,
    #[serde(rename = "h5")]
    HeaderFive,
    #[serde(rename = "h6")]
    HeaderSix,
    #[serde(rename = "p")]
    Paragraph,
    #[serde(rename = "ul")]
    UnorderedList,
    #[serde(rename = "ol")]
    OrderedList,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "quotes")]
    Quotes,
    #[serde(rename = "hr")]
    PageBreak,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "bold")]
    Bold,
    #[serde(rename = "italics")]
    Italics,
    #[serde(rename = "link")]
    Link,
    #[serde(rename = "relation")]
    Relation,
    #[serde(rename = "color")]
    Color,
}

impl PartitionType {
    const ALL: [Self; 18] = [
        Self::HeaderOne,
        Self::HeaderTwo,
        Self::HeaderThree,
        Self::HeaderFour,
        Self::HeaderFive,
        Self::HeaderSix,
        Self::Paragraph,
        Self::UnorderedList,
        Self::OrderedList,
        Self::Image,
        Self::Quotes,
        Self::PageBreak,
        Self::Text,
        Self::Bold,
        Self::Italics,
        Self::Link,
        Self::Relation,
        Self::Color,
    ];

    pub fn as_code(self) -> &'static str {
        match self {
            Self::HeaderOne => "h1",
            Self::HeaderTwo => "h2",
            Self::HeaderThree => "h3",
            Self::HeaderFour => "h4",
            Self::HeaderFive => "h5",
            Self::HeaderSix => "h6",
            Self::Paragraph => "p",
            Self::UnorderedList => "ul",
            Self::OrderedList => "ol",
            Self::Image => "image",
            Self::Quotes => "quotes",
            Self::PageBreak => "hr",
            Self::Text => "text",
            Self::Bold => "bold",
            Self::Italics => "italics",
            Self::Link => "link",
            Self::Relation => "relation",
            Self::Color => "color",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_code() == code)
    }
}

/// One node of a detail's partition tree.
///
/// Block partitions nest through `partitions`; list partitions hold their
/// entries in `items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
    #[serde(rename = "type")]
    pub kind: PartitionType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<Partition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Partition>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alt_text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub link: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub relation: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,
}

impl Partition {
    pub fn new(kind: PartitionType) -> Self {
        Self {
            kind,
            value: String::new(),
            partitions: Vec::new(),
            items: Vec::new(),
            alt_text: String::new(),
            link: String::new(),
            relation: String::new(),
            color: String::new(),
        }
    }

    /// Number of partitions in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self
            .partitions
            .iter()
            .chain(&self.items)
            .map(Partition::node_count)
            .sum::<usize>()
    }
}

/// A titled document attached to a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDetail {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "id", default)]
    pub guid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub partitions: Vec<Partition>,
}

impl PageDetail {
    pub fn validate(&self) -> StoreResult<()> {
        if self.title.is_empty() {
            return Err(StoreError::validation("a page detail must retain a title"));
        }
        Ok(())
    }
}
