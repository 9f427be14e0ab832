//! Product storage operations.
//!
//! Redis key patterns:
//! - `product:{nanoid}` - product record (JSON)
//! - `products:by_updated` - ZSET of product IDs scored by `updatedAt`
//!
//! Updates are compare-and-set, so a concurrent delete or edit is never overwritten.

use crate::models::Product;
use redis::AsyncCommands;

/// ZSET indexing every product by last update time.
pub const PRODUCTS_INDEX_KEY: &str = "products:by_updated";

/// Compare-and-set attempts before an update on a contended record gives up.
const MAX_UPDATE_ATTEMPTS: usize = 5;

/// Result of a conditional overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// Stored record matched and was overwritten.
    Replaced,
    /// Stored record changed since it was read; nothing written.
    Conflict,
    /// Record no longer exists; nothing written.
    Missing,
}

fn product_key(id: &str) -> String {
    format!("product:{}", id)
}

fn json_error(context: &'static str, err: serde_json::Error) -> redis::RedisError {
    redis::RedisError::from((
        redis::ErrorKind::TypeError,
        context,
        err.to_string(),
    ))
}

/// Store a product (insert or overwrite) and refresh its index entry.
pub async fn save_product<C>(con: &mut C, product: &Product) -> Result<(), redis::RedisError>
where
    C: AsyncCommands,
{
    let json = serde_json::to_string(product).map_err(|e| json_error("JSON serialize", e))?;

    let _: () = redis::pipe()
        .atomic()
        .set(product_key(&product.id), json)
        .ignore()
        .zadd(PRODUCTS_INDEX_KEY, &product.id, product.updated_at)
        .ignore()
        .query_async(con)
        .await?;

    Ok(())
}

/// Stored JSON for a product, exactly as written.
pub async fn get_product_json<C>(con: &mut C, id: &str) -> Result<Option<String>, redis::RedisError>
where
    C: AsyncCommands,
{
    con.get(product_key(id)).await
}

/// Get a product by ID.
pub async fn get_product<C>(con: &mut C, id: &str) -> Result<Option<Product>, redis::RedisError>
where
    C: AsyncCommands,
{
    match get_product_json(con, id).await? {
        Some(data) => {
            let product =
                serde_json::from_str(&data).map_err(|e| json_error("JSON deserialize", e))?;
            Ok(Some(product))
        }
        None => Ok(None),
    }
}

/// Overwrite a product only if its stored JSON still equals `expected`.
///
/// Never creates a record: a product deleted since `expected` was read
/// stays deleted.
pub async fn replace_product<C>(
    con: &mut C,
    expected: &str,
    product: &Product,
) -> Result<ReplaceOutcome, redis::RedisError>
where
    C: AsyncCommands,
{
    let json = serde_json::to_string(product).map_err(|e| json_error("JSON serialize", e))?;

    let script = redis::Script::new(
        r#"
        local current = redis.call('GET', KEYS[1])
        if not current then
            return -1
        end
        if current ~= ARGV[1] then
            return 0
        end
        redis.call('SET', KEYS[1], ARGV[2])
        redis.call('ZADD', KEYS[2], ARGV[3], ARGV[4])
        return 1
        "#,
    );

    let result: i32 = script
        .key(product_key(&product.id))
        .key(PRODUCTS_INDEX_KEY)
        .arg(expected)
        .arg(json)
        .arg(product.updated_at)
        .arg(&product.id)
        .invoke_async(con)
        .await?;

    Ok(match result {
        1 => ReplaceOutcome::Replaced,
        0 => ReplaceOutcome::Conflict,
        _ => ReplaceOutcome::Missing,
    })
}

/// Read, edit and write back a product.
///
/// The write only lands if nobody changed the record in between; otherwise
/// the edit is re-applied to the fresh record. Returns `None` if the
/// product does not exist or is deleted mid-update.
pub async fn update_product<C, F>(
    con: &mut C,
    id: &str,
    mut edit: F,
) -> Result<Option<Product>, redis::RedisError>
where
    C: AsyncCommands,
    F: FnMut(&mut Product),
{
    for _ in 0..MAX_UPDATE_ATTEMPTS {
        let Some(current) = get_product_json(con, id).await? else {
            return Ok(None);
        };
        let mut product: Product =
            serde_json::from_str(&current).map_err(|e| json_error("JSON deserialize", e))?;
        edit(&mut product);

        match replace_product(con, &current, &product).await? {
            ReplaceOutcome::Replaced => return Ok(Some(product)),
            ReplaceOutcome::Missing => return Ok(None),
            ReplaceOutcome::Conflict => {
                tracing::debug!(product_id = %id, "Product changed during update, retrying");
            }
        }
    }

    Err(redis::RedisError::from((
        redis::ErrorKind::TryAgain,
        "Product update contended",
        id.to_string(),
    )))
}

/// List all products, most recently updated first.
///
/// Index entries whose record has disappeared are skipped.
pub async fn list_products<C>(con: &mut C) -> Result<Vec<Product>, redis::RedisError>
where
    C: AsyncCommands,
{
    let ids: Vec<String> = con.zrevrange(PRODUCTS_INDEX_KEY, 0, -1).await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let keys: Vec<String> = ids.iter().map(|id| product_key(id)).collect();
    let records: Vec<Option<String>> = redis::cmd("MGET").arg(&keys).query_async(con).await?;

    let mut products = Vec::with_capacity(records.len());
    for (id, record) in ids.iter().zip(records) {
        match record {
            Some(data) => {
                products.push(
                    serde_json::from_str(&data).map_err(|e| json_error("JSON deserialize", e))?,
                );
            }
            None => {
                tracing::warn!(product_id = %id, "Product index entry without record");
            }
        }
    }

    Ok(products)
}

/// Delete a product and its index entry atomically.
///
/// Returns true if the product was deleted, false if it didn't exist.
pub async fn delete_product<C>(con: &mut C, id: &str) -> Result<bool, redis::RedisError>
where
    C: AsyncCommands,
{
    let script = redis::Script::new(
        r#"
        local deleted = redis.call('DEL', KEYS[1])
        redis.call('ZREM', KEYS[2], ARGV[1])
        return deleted
        "#,
    );

    let deleted: i32 = script
        .key(product_key(id))
        .key(PRODUCTS_INDEX_KEY)
        .arg(id)
        .invoke_async(con)
        .await?;

    Ok(deleted > 0)
}
