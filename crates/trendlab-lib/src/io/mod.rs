//! Ingestion helpers that turn files into [`Series`](crate::series::Series) values.

pub mod table;
pub mod text;
