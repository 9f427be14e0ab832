//! Coercion and validation of admin product forms.
//!
//! The admin panel posts loosely typed JSON: numbers arrive as strings,
//! cleared inputs arrive as `""`, prices may carry a currency prefix. These
//! helpers turn such bodies into typed product data, rejecting only what
//! cannot be interpreted (unknown enum values, negative quantities).

use crate::error::AppError;
use crate::models::{Category, Condition, Product, StockStatus, StorageType};
use serde_json::{Map, Value};
use std::str::FromStr;

type Body = Map<String, Value>;

/// State of one optional field in a form body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<T> {
    /// Key absent, or a value that could not be interpreted.
    Missing,
    /// Explicitly cleared (`null` or blank).
    Null,
    Value(T),
}

impl<T> Field<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Field::Missing => Field::Missing,
            Field::Null => Field::Null,
            Field::Value(v) => Field::Value(f(v)),
        }
    }

    pub fn value(self) -> Option<T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Update semantics: missing keeps `current`, null clears it.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Field::Missing => current,
            Field::Null => None,
            Field::Value(v) => Some(v),
        }
    }

    /// Update semantics for non-nullable columns: only a value changes it.
    pub fn apply_required(self, current: T) -> T {
        match self {
            Field::Value(v) => v,
            _ => current,
        }
    }
}

/// Scalar JSON rendered as text. Arrays and objects have no text form.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Price in whole currency units (possibly "R 4 500.50") to cents.
///
/// Anything that does not yield a number after stripping non-digits is 0.
pub fn parse_price_to_cents(value: Option<&Value>) -> i64 {
    if let Some(Value::Number(n)) = value {
        return n.as_f64().map_or(0, |v| (v * 100.0).round() as i64);
    }

    let text = value.and_then(text_of).unwrap_or_default();
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return 0;
    }

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map_or(0, |n| (n * 100.0).round() as i64)
}

fn parse_number(value: Option<&Value>) -> Field<f64> {
    match value {
        None => Field::Missing,
        Some(Value::Null) => Field::Null,
        Some(Value::Number(n)) => n.as_f64().map_or(Field::Missing, Field::Value),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Field::Null;
            }
            s.parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map_or(Field::Missing, Field::Value)
        }
        Some(_) => Field::Missing,
    }
}

/// Integer field; fractional input is truncated toward zero.
pub fn parse_optional_int(value: Option<&Value>) -> Field<i64> {
    parse_number(value).map(|n| n.trunc() as i64)
}

pub fn parse_optional_float(value: Option<&Value>) -> Field<f64> {
    parse_number(value)
}

pub fn parse_optional_bool(value: Option<&Value>) -> Field<bool> {
    match value {
        None => Field::Missing,
        Some(Value::Null) => Field::Null,
        Some(Value::Bool(b)) => Field::Value(*b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Field::Value(true),
            "false" => Field::Value(false),
            _ => Field::Missing,
        },
        Some(_) => Field::Missing,
    }
}

/// Free-text field for updates: `""` and `null` clear it.
fn parse_text(value: Option<&Value>) -> Field<String> {
    match value {
        None => Field::Missing,
        Some(Value::Null) => Field::Null,
        Some(v) => match text_of(v) {
            Some(s) if s.is_empty() => Field::Null,
            Some(s) => Field::Value(s),
            None => Field::Missing,
        },
    }
}

/// Whether a form value counts as filled in: `null`, `false`, `0` and `""`
/// do not.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Free-text field for creation: only filled-in values are kept.
fn create_text(body: &Body, key: &str) -> Option<String> {
    body.get(key).filter(|v| is_truthy(v)).and_then(text_of)
}

/// Enum field: absent, `null` and `""` count as not given.
fn parse_enum<T: FromStr>(body: &Body, key: &str, label: &str) -> Result<Field<T>, AppError> {
    match body.get(key) {
        None => Ok(Field::Missing),
        Some(Value::Null) => Ok(Field::Null),
        Some(Value::String(s)) if s.is_empty() => Ok(Field::Null),
        Some(Value::String(s)) => s
            .parse::<T>()
            .map(Field::Value)
            .map_err(|_| AppError::BadRequest(format!("Invalid {}", label))),
        Some(_) => Err(AppError::BadRequest(format!("Invalid {}", label))),
    }
}

fn non_negative<T: PartialOrd + Default>(field: Field<T>, key: &str) -> Result<Field<T>, AppError> {
    match field {
        Field::Value(ref v) if *v < T::default() => {
            Err(AppError::BadRequest(format!("Invalid {}", key)))
        }
        other => Ok(other),
    }
}

/// Numeric fields shared by create and update, validated in form order.
struct Measurements {
    warranty_days: Field<i64>,
    quantity: Field<i64>,
    ram_gb: Field<i64>,
    storage_gb: Field<i64>,
    screen_inches: Field<f64>,
}

impl Measurements {
    fn from_body(body: &Body) -> Result<Self, AppError> {
        Ok(Self {
            warranty_days: non_negative(
                parse_optional_int(body.get("warrantyDays")),
                "warrantyDays",
            )?,
            quantity: non_negative(parse_optional_int(body.get("quantity")), "quantity")?,
            ram_gb: non_negative(parse_optional_int(body.get("ramGb")), "ramGb")?,
            storage_gb: non_negative(parse_optional_int(body.get("storageGb")), "storageGb")?,
            screen_inches: non_negative(
                parse_optional_float(body.get("screenInches")),
                "screenInches",
            )?,
        })
    }
}

/// Enum fields shared by create and update.
struct Classification {
    category: Field<Category>,
    status: Field<StockStatus>,
    condition: Field<Condition>,
    storage_type: Field<StorageType>,
}

impl Classification {
    fn from_body(body: &Body) -> Result<Self, AppError> {
        Ok(Self {
            category: parse_enum(body, "category", "category")?,
            status: parse_enum(body, "status", "status")?,
            condition: parse_enum(body, "condition", "condition")?,
            storage_type: parse_enum(body, "storageType", "storage type")?,
        })
    }
}

/// A validated create request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub category: Category,
    pub name: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub condition: Option<Condition>,
    pub warranty_days: Option<i64>,
    pub featured: bool,
    pub cpu: Option<String>,
    pub ram_gb: Option<i64>,
    pub storage_gb: Option<i64>,
    pub storage_type: Option<StorageType>,
    pub screen_inches: Option<f64>,
    pub os: Option<String>,
    pub accessory_type: Option<String>,
    pub compatibility: Option<String>,
    pub quantity: i64,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: i64,
    pub status: StockStatus,
}

impl NewProduct {
    /// Validate a create body. `name` and `category` are required.
    pub fn from_json(value: &Value) -> Result<Self, AppError> {
        let missing = || AppError::BadRequest("Missing fields".to_string());
        let body = value.as_object().ok_or_else(missing)?;

        // Required fields are checked before any value is parsed.
        let name = create_text(body, "name").ok_or_else(missing)?;
        if !body.get("category").is_some_and(is_truthy) {
            return Err(missing());
        }
        let classes = Classification::from_body(body)?;
        let category = classes.category.value().ok_or_else(missing)?;
        let numbers = Measurements::from_body(body)?;

        Ok(Self {
            category,
            name,
            brand: create_text(body, "brand"),
            model: create_text(body, "model"),
            condition: classes.condition.value(),
            warranty_days: numbers.warranty_days.value(),
            featured: parse_optional_bool(body.get("featured"))
                .value()
                .unwrap_or(false),
            cpu: create_text(body, "cpu"),
            ram_gb: numbers.ram_gb.value(),
            storage_gb: numbers.storage_gb.value(),
            storage_type: classes.storage_type.value(),
            screen_inches: numbers.screen_inches.value(),
            os: create_text(body, "os"),
            accessory_type: create_text(body, "accessoryType"),
            compatibility: create_text(body, "compatibility"),
            quantity: numbers.quantity.value().unwrap_or(1),
            notes: create_text(body, "notes"),
            image_url: create_text(body, "imageUrl"),
            price_cents: parse_price_to_cents(body.get("price")),
            status: classes.status.value().unwrap_or(StockStatus::InStock),
        })
    }

    pub fn into_product(self, id: String, now_ms: u64) -> Product {
        Product {
            id,
            category: self.category,
            name: self.name,
            brand: self.brand,
            model: self.model,
            condition: self.condition,
            warranty_days: self.warranty_days,
            featured: self.featured,
            cpu: self.cpu,
            ram_gb: self.ram_gb,
            storage_gb: self.storage_gb,
            storage_type: self.storage_type,
            screen_inches: self.screen_inches,
            os: self.os,
            accessory_type: self.accessory_type,
            compatibility: self.compatibility,
            quantity: self.quantity,
            notes: self.notes,
            image_url: self.image_url,
            price_cents: self.price_cents,
            status: self.status,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }
}

/// A validated partial update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPatch {
    pub category: Field<Category>,
    pub name: Field<String>,
    pub brand: Field<String>,
    pub model: Field<String>,
    pub condition: Field<Condition>,
    pub warranty_days: Field<i64>,
    pub featured: Field<bool>,
    pub cpu: Field<String>,
    pub ram_gb: Field<i64>,
    pub storage_gb: Field<i64>,
    pub storage_type: Field<StorageType>,
    pub screen_inches: Field<f64>,
    pub os: Field<String>,
    pub accessory_type: Field<String>,
    pub compatibility: Field<String>,
    pub quantity: Field<i64>,
    pub notes: Field<String>,
    pub image_url: Field<String>,
    pub price_cents: Option<i64>,
    pub status: Field<StockStatus>,
}

impl ProductPatch {
    pub fn from_json(value: &Value) -> Result<Self, AppError> {
        let body = value
            .as_object()
            .ok_or_else(|| AppError::BadRequest("Invalid body".to_string()))?;

        let classes = Classification::from_body(body)?;
        let numbers = Measurements::from_body(body)?;

        let name = parse_text(body.get("name"));
        if name == Field::Null {
            return Err(AppError::BadRequest("Invalid name".to_string()));
        }

        Ok(Self {
            category: classes.category,
            name,
            brand: parse_text(body.get("brand")),
            model: parse_text(body.get("model")),
            condition: classes.condition,
            warranty_days: numbers.warranty_days,
            featured: parse_optional_bool(body.get("featured")),
            cpu: parse_text(body.get("cpu")),
            ram_gb: numbers.ram_gb,
            storage_gb: numbers.storage_gb,
            storage_type: classes.storage_type,
            screen_inches: numbers.screen_inches,
            os: parse_text(body.get("os")),
            accessory_type: parse_text(body.get("accessoryType")),
            compatibility: parse_text(body.get("compatibility")),
            quantity: numbers.quantity,
            notes: parse_text(body.get("notes")),
            image_url: parse_text(body.get("imageUrl")),
            price_cents: body.get("price").map(|p| parse_price_to_cents(Some(p))),
            status: classes.status,
        })
    }

    /// Apply the patch and bump `updated_at`.
    pub fn apply(self, product: &mut Product, now_ms: u64) {
        product.category = self.category.apply_required(product.category);
        product.name = self.name.apply_required(std::mem::take(&mut product.name));
        product.brand = self.brand.apply(product.brand.take());
        product.model = self.model.apply(product.model.take());
        product.condition = self.condition.apply(product.condition.take());
        product.warranty_days = self.warranty_days.apply(product.warranty_days.take());
        product.featured = self.featured.apply_required(product.featured);
        product.cpu = self.cpu.apply(product.cpu.take());
        product.ram_gb = self.ram_gb.apply(product.ram_gb.take());
        product.storage_gb = self.storage_gb.apply(product.storage_gb.take());
        product.storage_type = self.storage_type.apply(product.storage_type.take());
        product.screen_inches = self.screen_inches.apply(product.screen_inches.take());
        product.os = self.os.apply(product.os.take());
        product.accessory_type = self.accessory_type.apply(product.accessory_type.take());
        product.compatibility = self.compatibility.apply(product.compatibility.take());
        product.quantity = self.quantity.apply_required(product.quantity);
        product.notes = self.notes.apply(product.notes.take());
        product.image_url = self.image_url.apply(product.image_url.take());
        if let Some(price_cents) = self.price_cents {
            product.price_cents = price_cents;
        }
        product.status = self.status.apply_required(product.status);
        product.updated_at = now_ms;
    }
}
