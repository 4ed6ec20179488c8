pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod messages;
pub mod normalize;
pub mod observability;
pub mod schema;
pub mod sync;
