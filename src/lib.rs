//! Survey Scope: browse NOAA EK80 raw-file catalogs, overlay sardine
//! detections and view generated echograms.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod remote;
pub mod state;
pub mod tasks;
pub mod ui;
