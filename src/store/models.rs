//! Records kept by the demo store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl Category {
    pub fn create(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub price: f64,
}

impl Item {
    pub fn create(category_id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: new_id(),
            category_id: category_id.into(),
            name: name.into(),
            price,
        }
    }
}

/// One physical unit of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    pub item_id: String,
    pub category_id: String,
}

impl Instance {
    pub fn create(item_id: impl Into<String>, category_id: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            item_id: item_id.into(),
            category_id: category_id.into(),
        }
    }
}

/// An item joined with its category name and instance count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemWithCount {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category: Option<String>,
    pub count: usize,
}

/// An instance joined with its category and item names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedInstance {
    pub id: String,
    pub category_name: Option<String>,
    pub item_name: Option<String>,
}
