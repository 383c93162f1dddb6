//! Query functions, one module per table group.
//!
//! Single-statement queries are generic over [`sqlx::PgExecutor`] so they run
//! equally against a pool, a pooled connection, or an open transaction.

pub mod buffets;
pub mod foods;
pub mod meal_plans;
pub mod users;
