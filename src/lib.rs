// Library for tests to access modules

pub mod collector;
pub mod config;
pub mod cpu_usage;
pub mod encoder;
pub mod history;
pub mod models;
pub mod publisher;
pub mod routes;
pub mod version;
pub mod worker;
