pub mod catalog;
pub mod commands;
pub mod config;
pub mod media;
pub mod parser;
