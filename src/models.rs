//! Request and response models for the API.
//!
//! All models use serde for serialization/deserialization. Products are
//! stored in Redis as the same camelCase JSON the admin panel receives.

use serde::{Deserialize, Serialize};

// ============================================================================
// Product Enums
// ============================================================================

/// Declares a fieldless enum with its wire names, plus `as_str`, `Display`
/// and `FromStr` in terms of those names.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($name), s)),
                }
            }
        }
    };
}

wire_enum! {
    /// Which stock list a product belongs to.
    Category {
        Refurb => "REFURB",
        Accessory => "ACCESSORY",
    }
}

wire_enum! {
    Condition {
        New => "NEW",
        Good => "GOOD",
        Fair => "FAIR",
    }
}

wire_enum! {
    StorageType {
        Ssd => "SSD",
        Hdd => "HDD",
    }
}

wire_enum! {
    StockStatus {
        InStock => "IN_STOCK",
        OutOfStock => "OUT_OF_STOCK",
    }
}

// ============================================================================
// Storage Models
// ============================================================================

/// Product record as stored in Redis and returned by the API.
///
/// Refurbished machines use the hardware fields (`cpu`, `ramGb`, ...);
/// accessories use `accessoryType` and `compatibility`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
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
    pub created_at: u64,
    pub updated_at: u64,
}

// ============================================================================
// Auth Models
// ============================================================================

/// Admin login request. `password` is optional so a missing field is a 400,
/// not a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: Option<String>,
}

/// Generic `{ "ok": true }` acknowledgement.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// Whether the caller currently holds a valid admin session.
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub ok: bool,
    pub authenticated: bool,
}

// ============================================================================
// Product Responses
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub ok: bool,
    pub product: Product,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub ok: bool,
    pub products: Vec<Product>,
}

/// Public stock page data, split the way the page shows it.
#[derive(Debug, Serialize)]
pub struct StockResponse {
    pub ok: bool,
    pub refurb: Vec<Product>,
    pub accessories: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub ok: bool,
    pub url: String,
}
