pub mod config;
pub mod errors;
pub mod load;
pub mod logging;
pub mod route;
pub mod storage;
pub mod tui;
pub mod views;
