//! JSON file database.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::dispatch::HttpError;
use crate::store::models::{Category, Instance, Item, ItemWithCount, JoinedInstance};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store file is corrupt: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid record: {0}")]
    Invalid(String),
}

impl From<StoreError> for HttpError {
    fn from(err: StoreError) -> Self {
        let status = match err {
            StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        HttpError::with_status(status, err.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CategoryRecord {
    name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemRecord {
    name: String,
    price: f64,
    category_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceRecord {
    item_id: String,
    category_id: String,
}

/// On-disk layout: records keyed by id.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Data {
    categories: BTreeMap<String, CategoryRecord>,
    items: BTreeMap<String, ItemRecord>,
    instances: BTreeMap<String, InstanceRecord>,
}

impl Data {
    fn category(&self, id: &str) -> Option<Category> {
        self.categories.get(id).map(|c| Category {
            id: id.to_string(),
            name: c.name.clone(),
        })
    }

    fn item(&self, id: &str) -> Option<Item> {
        self.items.get(id).map(|i| Item {
            id: id.to_string(),
            category_id: i.category_id.clone(),
            name: i.name.clone(),
            price: i.price,
        })
    }

    fn join_instance(&self, id: &str, record: &InstanceRecord) -> JoinedInstance {
        JoinedInstance {
            id: id.to_string(),
            category_name: self.categories.get(&record.category_id).map(|c| c.name.clone()),
            item_name: self.items.get(&record.item_id).map(|i| i.name.clone()),
        }
    }

    fn instances_where<F>(&self, keep: F) -> Vec<JoinedInstance>
    where
        F: Fn(&InstanceRecord) -> bool,
    {
        self.instances
            .iter()
            .filter(|(_, record)| keep(record))
            .map(|(id, record)| self.join_instance(id, record))
            .collect()
    }

    fn items_with_count(&self) -> Vec<ItemWithCount> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in self.instances.values() {
            *counts.entry(record.item_id.as_str()).or_default() += 1;
        }

        self.items
            .iter()
            .filter_map(|(id, item)| {
                let count = *counts.get(id.as_str())?;
                Some(ItemWithCount {
                    id: id.clone(),
                    name: item.name.clone(),
                    price: item.price,
                    category: self.categories.get(&item.category_id).map(|c| c.name.clone()),
                    count,
                })
            })
            .collect()
    }
}

/// Handle to one database file.
#[derive(Debug)]
pub struct Database {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Data, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Data::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Data::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, data: &Data) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn read(&self) -> Result<Data, StoreError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    /// Remove every record.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.save(&Data::default()).await
    }

    /// Insert a category unless one with the same name (any case) exists.
    /// Returns whether it was inserted.
    pub async fn insert_category(&self, category: &Category) -> Result<bool, StoreError> {
        if category.name.trim().is_empty() {
            return Err(StoreError::Invalid("category name is empty".into()));
        }

        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;

        let name = category.name.to_uppercase();
        if data.categories.values().any(|c| c.name.to_uppercase() == name) {
            tracing::debug!(name = %category.name, "Category already exists");
            return Ok(false);
        }

        data.categories.insert(
            category.id.clone(),
            CategoryRecord {
                name: category.name.clone(),
            },
        );
        self.save(&data).await?;
        Ok(true)
    }

    /// Insert an item unless one with the same name (any case) exists in the
    /// same category. Returns whether it was inserted.
    pub async fn insert_item(&self, item: &Item) -> Result<bool, StoreError> {
        if item.name.trim().is_empty() {
            return Err(StoreError::Invalid("item name is empty".into()));
        }
        if !item.price.is_finite() || item.price < 0.0 {
            return Err(StoreError::Invalid(format!("invalid price {}", item.price)));
        }

        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;

        let name = item.name.to_uppercase();
        let duplicate = data
            .items
            .values()
            .any(|i| i.name.to_uppercase() == name && i.category_id == item.category_id);
        if duplicate {
            tracing::debug!(name = %item.name, "Item already exists in category");
            return Ok(false);
        }

        data.items.insert(
            item.id.clone(),
            ItemRecord {
                name: item.name.clone(),
                price: item.price,
                category_id: item.category_id.clone(),
            },
        );
        self.save(&data).await?;
        Ok(true)
    }

    /// Insert an instance unless its id is taken. Returns whether it was inserted.
    pub async fn insert_instance(&self, instance: &Instance) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;

        if data.instances.contains_key(&instance.id) {
            return Ok(false);
        }

        data.instances.insert(
            instance.id.clone(),
            InstanceRecord {
                item_id: instance.item_id.clone(),
                category_id: instance.category_id.clone(),
            },
        );
        self.save(&data).await?;
        Ok(true)
    }

    pub async fn category(&self, id: &str) -> Result<Option<Category>, StoreError> {
        Ok(self.read().await?.category(id))
    }

    pub async fn item(&self, id: &str) -> Result<Option<Item>, StoreError> {
        Ok(self.read().await?.item(id))
    }

    pub async fn instance(&self, id: &str) -> Result<Option<Instance>, StoreError> {
        let data = self.read().await?;
        Ok(data.instances.get(id).map(|i| Instance {
            id: id.to_string(),
            item_id: i.item_id.clone(),
            category_id: i.category_id.clone(),
        }))
    }

    pub async fn all_categories(&self) -> Result<Vec<Category>, StoreError> {
        let data = self.read().await?;
        Ok(data
            .categories
            .iter()
            .map(|(id, c)| Category {
                id: id.clone(),
                name: c.name.clone(),
            })
            .collect())
    }

    pub async fn all_items(&self) -> Result<Vec<Item>, StoreError> {
        let data = self.read().await?;
        Ok(data.items.keys().filter_map(|id| data.item(id)).collect())
    }

    /// Items that have at least one instance, with their instance counts.
    pub async fn all_items_with_count(&self) -> Result<Vec<ItemWithCount>, StoreError> {
        Ok(self.read().await?.items_with_count())
    }

    /// Like [`all_items_with_count`](Self::all_items_with_count), limited to one
    /// category. Empty when the category does not exist.
    pub async fn items_by_category_with_count(
        &self,
        category_id: &str,
    ) -> Result<Vec<ItemWithCount>, StoreError> {
        let data = self.read().await?;
        let Some(category) = data.category(category_id) else {
            return Ok(Vec::new());
        };
        Ok(data
            .items_with_count()
            .into_iter()
            .filter(|item| item.category.as_deref() == Some(category.name.as_str()))
            .collect())
    }

    /// `None` when the category does not exist.
    pub async fn instances_by_category(
        &self,
        category_id: &str,
    ) -> Result<Option<Vec<JoinedInstance>>, StoreError> {
        let data = self.read().await?;
        if !data.categories.contains_key(category_id) {
            return Ok(None);
        }
        Ok(Some(data.instances_where(|i| i.category_id == category_id)))
    }

    /// `None` when the item does not exist.
    pub async fn instances_by_item(
        &self,
        item_id: &str,
    ) -> Result<Option<Vec<JoinedInstance>>, StoreError> {
        let data = self.read().await?;
        if !data.items.contains_key(item_id) {
            return Ok(None);
        }
        Ok(Some(data.instances_where(|i| i.item_id == item_id)))
    }

    /// `None` when either the category or the item does not exist.
    pub async fn instances_by_item_and_category(
        &self,
        category_id: &str,
        item_id: &str,
    ) -> Result<Option<Vec<JoinedInstance>>, StoreError> {
        let data = self.read().await?;
        if !data.categories.contains_key(category_id) || !data.items.contains_key(item_id) {
            return Ok(None);
        }
        Ok(Some(data.instances_where(|i| {
            i.category_id == category_id && i.item_id == item_id
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> Database {
        Database::new(
            std::env::temp_dir()
                .join(format!("switchback-db-{}", uuid::Uuid::new_v4()))
                .join("database.json"),
        )
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let db = temp_db();
        assert!(db.all_categories().await.unwrap().is_empty());
        assert!(db.category("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_category_names_dedupe_case_insensitively() {
        let db = temp_db();
        assert!(db.insert_category(&Category::create("Tools")).await.unwrap());
        assert!(!db.insert_category(&Category::create("TOOLS")).await.unwrap());
        assert_eq!(db.all_categories().await.unwrap().len(), 1);

        let err = db.insert_category(&Category::create("  ")).await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_items_dedupe_within_category_only() {
        let db = temp_db();
        let a = Category::create("a");
        let b = Category::create("b");
        db.insert_category(&a).await.unwrap();
        db.insert_category(&b).await.unwrap();

        assert!(db.insert_item(&Item::create(&a.id, "Pen", 1.5)).await.unwrap());
        assert!(!db.insert_item(&Item::create(&a.id, "pen", 2.0)).await.unwrap());
        assert!(db.insert_item(&Item::create(&b.id, "pen", 2.0)).await.unwrap());
        assert_eq!(db.all_items().await.unwrap().len(), 2);

        let err = db.insert_item(&Item::create(&a.id, "Cup", -1.0)).await.unwrap_err();
        assert_eq!(HttpError::from(err).status(), Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn test_counts_and_joins() {
        let db = temp_db();
        let tools = Category::create("tools");
        let toys = Category::create("toys");
        db.insert_category(&tools).await.unwrap();
        db.insert_category(&toys).await.unwrap();
        let hammer = Item::create(&tools.id, "hammer", 10.0);
        let ball = Item::create(&toys.id, "ball", 3.0);
        let kite = Item::create(&toys.id, "kite", 8.0);
        for item in [&hammer, &ball, &kite] {
            db.insert_item(item).await.unwrap();
        }

        let first = Instance::create(&hammer.id, &tools.id);
        assert!(db.insert_instance(&first).await.unwrap());
        assert!(!db.insert_instance(&first).await.unwrap());
        db.insert_instance(&Instance::create(&hammer.id, &tools.id)).await.unwrap();
        db.insert_instance(&Instance::create(&ball.id, &toys.id)).await.unwrap();

        let counts = db.all_items_with_count().await.unwrap();
        assert_eq!(counts.len(), 2);
        let hammer_count = counts.iter().find(|i| i.id == hammer.id).unwrap();
        assert_eq!(hammer_count.count, 2);
        assert_eq!(hammer_count.category.as_deref(), Some("tools"));

        let toys_items = db.items_by_category_with_count(&toys.id).await.unwrap();
        assert_eq!(toys_items.len(), 1);
        assert_eq!(toys_items[0].name, "ball");
        assert!(db.items_by_category_with_count("nope").await.unwrap().is_empty());

        let by_item = db.instances_by_item(&hammer.id).await.unwrap().unwrap();
        assert_eq!(by_item.len(), 2);
        assert_eq!(by_item[0].item_name.as_deref(), Some("hammer"));
        assert_eq!(by_item[0].category_name.as_deref(), Some("tools"));

        let both = db
            .instances_by_item_and_category(&toys.id, &ball.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(both.len(), 1);
        assert!(db.instances_by_category("nope").await.unwrap().is_none());
        let stored = db.instance(&first.id).await.unwrap();
        assert_eq!(stored, Some(first.clone()));

        db.clear().await.unwrap();
        assert!(db.all_items().await.unwrap().is_empty());
    }
}
