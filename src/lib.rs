pub mod app;
pub mod backend;
pub mod config;
pub mod core;
pub mod ipc;
pub mod logging;
pub mod menu;
pub mod model;
pub mod playlist;
pub mod presenter;
pub mod text;
pub mod tray;
