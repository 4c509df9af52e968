#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod database;
pub mod datasource;
pub mod entities;
pub mod errors;
pub mod generator;
pub mod models;
pub mod normalizer;
pub mod watcher;
pub mod web;
