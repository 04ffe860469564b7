use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod, Runtime};
use log::{debug, info};
use tokio_postgres::{
    NoTls,
    config::{Config, SslMode},
};

use pgstats_config::DbConfig;
use pgstats_error::{DemoError, Result, db_err};

use crate::source::{DataSource, PgConnection};
use crate::sql::statistics::PING;

/// deadpool 기반 연결 공급원
///
/// `DataSource::get_connection` 으로 빌린 연결은 drop되는 즉시 풀로 돌아간다.
#[derive(Clone)]
pub struct DatabasePool {
    pool: Arc<Pool>,
}

impl DatabasePool {
    /// 풀 생성 후 `SELECT 1` 로 접속 확인
    pub async fn new(dbconfig: &DbConfig) -> Result<Self> {
        let connection = &dbconfig.connection;
        info!(
            "db 풀 초기화: {}@{}:{}/{}",
            connection.user, connection.host, connection.port, connection.database
        );

        let mgr = Manager::from_config(
            pg_config(dbconfig),
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(mgr)
            .max_size(dbconfig.pool.max_connections)
            .runtime(Runtime::Tokio1)
            .recycle_timeout(Some(Duration::from_secs(dbconfig.pool.recycle_seconds)))
            .build()
            .map_err(|e| db_err(format!("db 풀 생성 실패: {e}")))?;

        let db_pool = Self {
            pool: Arc::new(pool),
        };

        db_pool
            .get_connection()
            .await?
            .execute(PING)
            .await
            .map_err(|e| db_err(format!("데이터베이스 접속 확인 실패: {e}")))?;

        info!("db 풀 준비 완료 (최대 연결 수: {})", dbconfig.pool.max_connections);
        Ok(db_pool)
    }

    /// 풀에서 deadpool 객체 대여
    async fn object(&self) -> Result<Object> {
        self.pool
            .get()
            .await
            .map_err(|e| DemoError::Database(format!("연결 풀에서 연결 가져오기 실패: {e}")))
    }

    pub fn pool_status(&self) -> PoolStatus {
        let status = self.pool.status();
        PoolStatus {
            size: status.size,
            available: status.available,
            waiting: status.waiting,
        }
    }
}

#[async_trait]
impl DataSource for DatabasePool {
    async fn get_connection(&self) -> Result<Box<dyn PgConnection>> {
        let object = self.object().await?;
        debug!("연결 대여, 풀 상태: {:?}", self.pool_status());
        Ok(Box::new(PooledConnection(object)))
    }
}

/// 풀에서 대여한 연결
struct PooledConnection(Object);

#[async_trait]
impl PgConnection for PooledConnection {
    async fn execute(&self, sql: &str) -> Result<()> {
        // vacuum 은 트랜잭션 블록 밖에서 실행되어야 하므로 simple query 사용
        self.0.batch_execute(sql).await?;
        Ok(())
    }

    async fn query_timestamp(&self, sql: &str) -> Result<Option<DateTime<Utc>>> {
        match self.0.query_opt(sql, &[]).await? {
            Some(row) => Ok(row.try_get::<usize, Option<DateTime<Utc>>>(0)?),
            None => Ok(None),
        }
    }
}

/// `DbConfig` 를 tokio-postgres 접속 설정으로 변환
fn pg_config(dbconfig: &DbConfig) -> Config {
    let ssl_mode = match dbconfig.connection.sslmode.to_lowercase().as_str() {
        "disable" => SslMode::Disable,
        "require" => SslMode::Require,
        _ => SslMode::Prefer,
    };

    let mut config = Config::new();
    config
        .host(dbconfig.connection.host.as_str())
        .port(dbconfig.connection.port)
        .dbname(dbconfig.connection.database.as_str())
        .user(dbconfig.connection.user.as_str())
        .password(dbconfig.connection.password.as_str())
        .ssl_mode(ssl_mode)
        .connect_timeout(Duration::from_secs(dbconfig.pool.connection_timeout_seconds))
        .keepalives(true);
    config
}

/// 연결 풀 상태 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStatus {
    pub size: usize,
    pub available: usize,
    pub waiting: usize,
}

impl PoolStatus {
    /// 대여 중인 연결이 없는지
    pub fn is_idle(&self) -> bool {
        self.available == self.size
    }
}

pub async fn initialize_dbpool(config: &DbConfig) -> Result<DatabasePool> {
    DatabasePool::new(config).await
}
