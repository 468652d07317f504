//! Category and item routes over the flat-file store.
//!
//! ```text
//! GET  /categories              list categories
//! POST /categories              create { name }
//! GET  /categories/:id          one category
//! GET  /categories/:id/items    items of a category with instance counts
//! GET  /items                   items view (HTML), or JSON when asked for
//! POST /items                   create { name, categoryId, price }
//! GET  /items/:id               one item with its instances
//! POST /items/:id/instances     add an instance of an item
//! ```

use axum::http::{header, StatusCode};
use serde_json::json;
use std::sync::Arc;

use crate::dispatch::{handler_fn, Flow, Handler, HttpError, Router};
use crate::http::{Body, Request, ResponseError};
use crate::store::{Category, Database, Instance, Item};

pub fn categories_router(db: Arc<Database>) -> Router {
    let mut categories = Router::new();
    categories
        .route("/")
        .get("/", list_categories(Arc::clone(&db)))
        .post("/", create_category(Arc::clone(&db)));
    categories
        .get("/:id", show_category(Arc::clone(&db)))
        .get("/:id/items", category_items(db));
    categories
}

pub fn items_router(db: Arc<Database>) -> Router {
    let mut items = Router::new();
    items
        .get("/", list_items(Arc::clone(&db)))
        .post("/", create_item(Arc::clone(&db)))
        .get("/:id", show_item(Arc::clone(&db)))
        .post("/:id/instances", create_instance(db));
    items
}

fn param(req: &Request, name: &str) -> Result<String, HttpError> {
    req.param(name)
        .map(str::to_string)
        .ok_or_else(|| HttpError::bad_request(format!("missing route parameter `{name}`")))
}

fn required_field(body: &Body, name: &str) -> Result<String, HttpError> {
    body.field(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| HttpError::bad_request(format!("missing field `{name}`")))
}

/// Numbers arrive as JSON numbers or as form strings.
fn number_field(body: &Body, name: &str) -> Result<f64, HttpError> {
    let value = match body {
        Body::Json(value) => value.get(name).and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }),
        Body::Form(form) => form.get(name).and_then(|s| s.trim().parse().ok()),
        _ => None,
    };
    value.ok_or_else(|| HttpError::bad_request(format!("missing or invalid number `{name}`")))
}

fn wants_json(req: &Request) -> bool {
    req.header(header::ACCEPT.as_str())
        .is_some_and(|accept| accept.contains("application/json"))
}

fn list_categories(db: Arc<Database>) -> impl Handler {
    handler_fn(move |_req, res, _next| {
        let db = Arc::clone(&db);
        Box::pin(async move {
            res.json(&db.all_categories().await?)?;
            Ok(Flow::Halt)
        })
    })
}

fn create_category(db: Arc<Database>) -> impl Handler {
    handler_fn(move |req, res, _next| {
        let db = Arc::clone(&db);
        Box::pin(async move {
            let category = Category::create(required_field(req.body(), "name")?);
            if !db.insert_category(&category).await? {
                return Err(HttpError::with_status(
                    StatusCode::CONFLICT,
                    format!("category `{}` already exists", category.name),
                ));
            }
            res.status(StatusCode::CREATED).json(&category)?;
            Ok(Flow::Halt)
        })
    })
}

fn show_category(db: Arc<Database>) -> impl Handler {
    handler_fn(move |req, res, _next| {
        let db = Arc::clone(&db);
        Box::pin(async move {
            let id = param(req, "id")?;
            let category = db
                .category(&id)
                .await?
                .ok_or_else(|| HttpError::not_found(format!("no category {id}")))?;
            res.json(&category)?;
            Ok(Flow::Halt)
        })
    })
}

fn category_items(db: Arc<Database>) -> impl Handler {
    handler_fn(move |req, res, _next| {
        let db = Arc::clone(&db);
        Box::pin(async move {
            let id = param(req, "id")?;
            if db.category(&id).await?.is_none() {
                return Err(HttpError::not_found(format!("no category {id}")));
            }
            res.json(&db.items_by_category_with_count(&id).await?)?;
            Ok(Flow::Halt)
        })
    })
}

fn list_items(db: Arc<Database>) -> impl Handler {
    handler_fn(move |req, res, _next| {
        let db = Arc::clone(&db);
        Box::pin(async move {
            let items = db.all_items_with_count().await?;
            if wants_json(req) {
                res.json(&items)?;
                return Ok(Flow::Halt);
            }

            let data = json!({ "title": "Items", "items": items });
            match res.render("items", &data).await {
                Ok(()) => {}
                Err(ResponseError::ViewsNotConfigured) => res.json(&items)?,
                Err(err) => return Err(err.into()),
            }
            Ok(Flow::Halt)
        })
    })
}

fn create_item(db: Arc<Database>) -> impl Handler {
    handler_fn(move |req, res, _next| {
        let db = Arc::clone(&db);
        Box::pin(async move {
            let body = req.body();
            let name = required_field(body, "name")?;
            let category_id = required_field(body, "categoryId")?;
            let price = number_field(body, "price")?;

            if db.category(&category_id).await?.is_none() {
                return Err(HttpError::bad_request(format!("no category {category_id}")));
            }

            let item = Item::create(category_id, name, price);
            if !db.insert_item(&item).await? {
                return Err(HttpError::with_status(
                    StatusCode::CONFLICT,
                    format!("item `{}` already exists in this category", item.name),
                ));
            }
            res.status(StatusCode::CREATED).json(&item)?;
            Ok(Flow::Halt)
        })
    })
}

fn show_item(db: Arc<Database>) -> impl Handler {
    handler_fn(move |req, res, _next| {
        let db = Arc::clone(&db);
        Box::pin(async move {
            let id = param(req, "id")?;
            let item = db
                .item(&id)
                .await?
                .ok_or_else(|| HttpError::not_found(format!("no item {id}")))?;
            let instances = db.instances_by_item(&id).await?.unwrap_or_default();
            res.json(&json!({ "item": item, "instances": instances }))?;
            Ok(Flow::Halt)
        })
    })
}

fn create_instance(db: Arc<Database>) -> impl Handler {
    handler_fn(move |req, res, _next| {
        let db = Arc::clone(&db);
        Box::pin(async move {
            let id = param(req, "id")?;
            let item = db
                .item(&id)
                .await?
                .ok_or_else(|| HttpError::not_found(format!("no item {id}")))?;
            let instance = Instance::create(item.id, item.category_id);
            db.insert_instance(&instance).await?;
            res.status(StatusCode::CREATED).json(&instance)?;
            Ok(Flow::Halt)
        })
    })
}
