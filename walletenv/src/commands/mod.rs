pub mod cache;
pub mod network;
pub mod prepare;
pub mod resolve;
