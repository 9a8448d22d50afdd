//! Used-car price estimation.
//!
//! Listings for one manufacturer/model pair are pulled from a
//! [`store::ListingStore`], turned into a scaled feature matrix, and used to
//! train two regression strategies. The one with the lower validation MAPE
//! values the requested car. See [`service::PredictionService`].

pub mod config;
pub mod error;
pub mod features;
pub mod fetch;
pub mod import;
pub mod listing;
pub mod models;
pub mod output;
pub mod service;
pub mod store;
