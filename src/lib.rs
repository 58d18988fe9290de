pub mod cancel;
pub mod cli;
pub mod collect;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod remote;
pub mod report;
pub mod run;
