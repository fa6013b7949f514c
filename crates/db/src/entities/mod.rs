//! `SeaORM` entity definitions.

pub mod todos;
