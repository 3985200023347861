#![allow(clippy::uninlined_format_args)]

pub mod action;
pub mod app;
pub mod config;
pub mod dispatch;
pub mod feed;
pub mod logging;
pub mod page;
pub mod render;
pub mod snapshot;
pub mod storage;
pub mod ui;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::run;
