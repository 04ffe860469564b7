pub mod setting;
pub mod config;
pub mod dbconfig;
pub mod containerconfig;

pub use setting::Settings;
pub use config::Config;
pub use dbconfig::{ConnectionConfig, DbConfig, PoolConfig};
pub use containerconfig::ContainerConfig;
