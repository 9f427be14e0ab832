//! Storage layer: product records in Redis, product images on disk.
//!
//! Redis functions are async and generic over redis::AsyncCommands.
//! Records are serialized to JSON for storage in Redis.

pub mod product;
pub mod upload;
