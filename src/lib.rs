// src/lib.rs

//! gov.il Service Page Tracker Library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
