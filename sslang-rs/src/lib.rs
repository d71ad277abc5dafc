//! sslang: a small shell-like scripting language for driving host commands.
//!
//! The host registers typed commands in a [`script::FunctionRegistry`];
//! scripts call them with shell-style arguments and pass results around
//! through variables and the result history.

pub mod cli;
pub mod config;
pub mod history;
pub mod script;
pub mod var;
