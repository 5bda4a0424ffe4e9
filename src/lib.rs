//! Electric Vehicle population dashboard: data loading, filtering, summary
//! statistics and static chart export. The egui front end lives in the
//! `ev-dashboard` binary.

pub mod config;
pub mod data;
pub mod export;
