use brrtdispatch::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

pub const API_KEY: &str = "test123";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub qty: u32,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    items: BTreeMap<u64, Item>,
}

/// In-memory item storage shared by the item handlers.
#[derive(Debug, Clone, Default)]
pub struct Store(Arc<Mutex<Inner>>);

impl Store {
    fn with<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut inner)
    }
}

fn new_item_schema() -> Schema {
    Schema::new(
        "NewItem",
        json!({
            "type": "object",
            "required": ["name"],
            "additionalProperties": false,
            "properties": {
                "name": { "type": "string", "minLength": 1 },
                "qty": { "type": "integer", "minimum": 0 }
            }
        }),
    )
}

fn item_schema() -> Schema {
    Schema::new(
        "Item",
        json!({
            "type": "object",
            "required": ["id", "name", "qty"],
            "properties": {
                "id": { "type": "integer" },
                "name": { "type": "string" },
                "qty": { "type": "integer" }
            }
        }),
    )
}

/// `GET /items?limit=&in_stock=`
pub fn list(store: Store) -> Handler {
    Handler::sync(move |args| {
        let limit = usize::try_from(args.int("limit")?).unwrap_or(0);
        let in_stock = args.opt_bool("in_stock")?;
        let items: Vec<Item> = store.with(|inner| {
            inner
                .items
                .values()
                .filter(|i| in_stock.is_none_or(|want| (i.qty > 0) == want))
                .take(limit)
                .cloned()
                .collect()
        });
        Ok(Json(items))
    })
    .param(Param::new("limit", ParamType::Int).with_default(20))
    .param(Param::new("in_stock", ParamType::Bool).optional())
    .named("list_items")
}

/// `POST /items`, guarded by the `x-api-key` header.
pub fn create(store: Store) -> Handler {
    Handler::sync(move |args| {
        if args.str("x-api-key")? != API_KEY {
            return Err(HttpError::unauthorized("invalid api key").into());
        }
        let mut item: Item = args.body("item")?;
        let item = store.with(|inner| {
            inner.next_id += 1;
            item.id = inner.next_id;
            inner.items.insert(item.id, item.clone());
            item
        });
        tracing::info!(item_id = item.id, "Item created");
        Ok(Response::json(201, &serde_json::to_value(&item)?)
            .with_header("location", format!("/items/{}", item.id)))
    })
    .param(Param::header("x-api-key", ParamType::Str))
    .param(Param::body("item", new_item_schema()))
    .named("create_item")
}

/// `GET /items/{id}`
pub fn fetch(store: Store) -> Handler {
    Handler::sync(move |args| {
        let id = args.int("id")?;
        let found = u64::try_from(id)
            .ok()
            .and_then(|id| store.with(|inner| inner.items.get(&id).cloned()));
        match found {
            Some(item) => Ok(Json(item)),
            None => Err(HttpError::not_found(format!("item {id} not found")).into()),
        }
    })
    .param(Param::new("id", ParamType::Int))
    .returns(item_schema())
    .named("get_item")
}

/// `DELETE /items/{id}`
pub fn remove(store: Store) -> Handler {
    Handler::sync(move |args| {
        let id = u64::try_from(args.int("id")?).unwrap_or(u64::MAX);
        match store.with(|inner| inner.items.remove(&id)) {
            Some(_) => Ok(Response::new(204)),
            None => Err(HttpError::not_found(format!("item {id} not found")).into()),
        }
    })
    .param(Param::new("id", ParamType::Int))
    .named("delete_item")
}
