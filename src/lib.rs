//! Rental listing extraction: split scraped chat or page text into posts,
//! pull out listing fields, add coordinates and driving distance, and keep
//! the results as JSON and CSV.

pub mod config;
pub mod error;
pub mod extractors;
pub mod geo;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod screening;
pub mod sources;
pub mod splitter;
pub mod store;
