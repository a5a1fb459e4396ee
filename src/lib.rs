//! plansight: a dashboard for App Service cost-optimization analyses.
//!
//! Fetches an analysis payload from the backend, decides which analysis
//! mode it represents, and renders a mode-adapted dashboard as an HTML
//! page, a JSON view or a terminal report.

pub mod analytics;
pub mod charts;
pub mod cli;
pub mod client;
pub mod config;
pub mod controller;
pub mod mode;
pub mod payload;
pub mod recommendations;
pub mod render;
pub mod view;
pub mod web;
