//! Domain logic of the meal-planning service: the food catalog, name
//! embeddings, weekly plan generation, and catalog data loading and seeding.

pub mod catalog;
pub mod embedding;
pub mod loader;
pub mod planner;
pub mod seed;
