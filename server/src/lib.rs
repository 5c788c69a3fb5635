// grocer_server/src/lib.rs

//! HTTP surface and PostgreSQL persistence for the `grocer` engine.

pub mod config;
pub mod db;
pub mod errors;
pub mod seed;
pub mod state;
pub mod ticker;
pub mod web;
