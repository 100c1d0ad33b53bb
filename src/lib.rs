pub mod actions;
pub mod changes;
pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod model;
pub mod parsers;
pub mod path;
pub mod report;
