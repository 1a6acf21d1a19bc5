//! Reminder orchestration: message selection and the send pipeline.

pub mod catalog;
pub mod service;
