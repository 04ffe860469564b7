pub mod pool;
pub mod source;
pub mod management;
pub mod collector;
pub mod sql;

pub use pool::{
    DatabasePool,
    PoolStatus,
    initialize_dbpool,
};

pub use source::{
    DataSource,
    PgConnection,
};

pub use management::DatabaseManagement;

pub use collector::StatisticsCollector;
