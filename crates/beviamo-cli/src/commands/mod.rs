pub mod common;
pub mod completions;
pub mod config;
pub mod draft;
pub mod export;
pub mod history;
pub mod import;
pub mod station;
pub mod submit;
pub mod sync;
pub mod workspace;
