use async_trait::async_trait;
use chrono::{DateTime, Utc};

use pgstats_error::Result;

/// 단일 데이터베이스 연결
///
/// 연결 반납은 Drop으로 처리되므로 구현체는 스코프를 벗어나는 즉시 자원을 돌려줘야 한다.
#[async_trait]
pub trait PgConnection: Send + Sync {
    /// 결과가 필요없는 쿼리 실행
    async fn execute(&self, sql: &str) -> Result<()>;

    /// 첫 행의 첫 컬럼을 timestamptz로 조회 (행이 없거나 NULL이면 None)
    async fn query_timestamp(&self, sql: &str) -> Result<Option<DateTime<Utc>>>;
}

/// 연결 공급원
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn get_connection(&self) -> Result<Box<dyn PgConnection>>;
}
