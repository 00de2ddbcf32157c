pub mod api;
pub mod config;
pub mod entity;
pub mod feed;
pub mod graph;
pub mod monitor;
pub mod pipeline;
pub mod risk;
