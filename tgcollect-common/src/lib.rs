pub mod client;
pub mod collector;
pub mod model;
