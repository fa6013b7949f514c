//! Core business logic for the todo backend.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Gateways to the item store and the blob store are traits implemented elsewhere
//! and injected into [`todo::TodoService`].
//!
//! # Modules
//!
//! - `todo` - Todo items, ownership rules and attachment association
//! - `storage` - Presigned attachment URLs over Apache OpenDAL

pub mod storage;
pub mod todo;
