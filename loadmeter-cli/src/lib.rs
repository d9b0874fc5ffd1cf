pub mod config;
pub mod operation;
pub mod runner;
pub mod workload;
