#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod database;
pub mod entities;
pub mod errors;
pub mod models;
pub mod rasterizer;
pub mod services;
pub mod storage;
pub mod utils;
pub mod web;
