pub mod candidates;
pub mod client;
pub mod server;
pub mod storage;
