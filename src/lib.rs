pub mod actions;
pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod revisions;
pub mod tasks;
pub mod ui;
pub mod validation;
pub mod web;

#[cfg(test)]
pub mod test_utils;
