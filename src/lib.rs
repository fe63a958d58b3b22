//! Foodgram: a recipe sharing backend.
//!
//! Users publish recipes with a picture and an ingredient list, follow other
//! authors, keep favorites and build an aggregated shopping list from the
//! recipes in their cart.

pub mod accounts;
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod images;
pub mod models;
pub mod photos;
pub mod schema;
pub mod shopping_list;
pub mod short_link;
pub mod telemetry;
#[cfg(test)]
mod test_support;
pub mod validation;
