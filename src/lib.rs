pub mod app;
pub mod chart;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod genbank;
pub mod ncbi;
pub mod output;
pub mod report;
pub mod retriever;
