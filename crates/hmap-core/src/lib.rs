pub mod cascade;
pub mod classifier;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod generate;
pub mod graph;
pub mod impact;
pub mod io;
pub mod markdown;
pub mod milestone;
pub mod paths;
pub mod plan;
pub mod project;
pub mod prompt;
pub mod repository;
pub mod rules;
pub mod sprint;
pub mod store;
pub mod task;
pub mod team;
pub mod template;
pub mod types;
pub mod unlock;
pub mod views;

pub use error::{HmapError, Result};
