pub mod postgres;

pub use postgres::PostgreSqlContainer;
