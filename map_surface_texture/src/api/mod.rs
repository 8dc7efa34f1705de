//! Interface exposed to the embedding application.

pub mod commands;
pub mod plugin;
pub mod plugin_types;
