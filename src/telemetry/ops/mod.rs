pub mod agg;
pub mod users;
pub mod feeds;
pub mod follows;
pub mod browse;
