pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod constants;
pub mod fetch;
pub mod identity;
pub mod install;
pub mod privdrop;
pub mod source;

pub use anyhow::Result;
