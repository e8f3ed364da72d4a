//! contentgen - AI content plan generation with live step-by-step progress
//!
//! A run walks the content-plan pipeline, publishing every status change to
//! a shared [`store::RunStore`]. Renderers subscribe to the store; the
//! driver is the only writer.

pub mod app;
pub mod config;
pub mod generation;
pub mod logging;
pub mod navigation;
pub mod notifications;
pub mod state;
pub mod steps;
pub mod store;
pub mod ui;
