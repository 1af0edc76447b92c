pub mod auth;
pub mod config;
pub mod contact;
pub mod query_cache;
pub mod storage;
