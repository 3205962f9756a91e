pub mod data;
pub mod io;


pub use data::{Config, RoutingConfig};
pub use io::ConfigError;
