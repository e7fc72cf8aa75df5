//! `SeaORM` entity definitions.

pub mod file_storage;
