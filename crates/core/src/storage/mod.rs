//! Storage service for todo attachments using Apache OpenDAL.
//!
//! This module provides vendor-agnostic object storage with support for:
//! - S3-compatible: AWS S3, Cloudflare R2, MinIO
//! - Azure Blob Storage
//! - Local filesystem (development only)
//!
//! An attachment's object key is its id. Uploads go through a presigned
//! `PUT` URL; retrieval uses a stable public URL under the bucket.

mod config;
mod error;
mod service;

pub use config::StorageConfig;
pub use error::StorageError;
pub use service::{PresignedUrl, StorageService};
pub use todo_shared::config::StorageProvider;
