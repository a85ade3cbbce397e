pub mod config;
pub mod logging;

pub mod control;
pub mod fetcher;
pub mod item;
pub mod ledger;
pub mod manifest;
pub mod pool;
pub mod retry;
pub mod storage;
pub mod validate;
