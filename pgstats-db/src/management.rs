use chrono::{DateTime, Utc};
use log::{debug, info};

use pgstats_error::Result;

use crate::source::DataSource;
use crate::sql::statistics::{RESET_STATISTICS, SELECT_LAST_STATS_RESET};

/// 데이터베이스 통계 관리
pub struct DatabaseManagement<'a> {
    data_source: &'a dyn DataSource,
}

impl<'a> DatabaseManagement<'a> {
    pub fn new(data_source: &'a dyn DataSource) -> Self {
        Self { data_source }
    }

    /// 현재 데이터베이스의 통계 카운터 초기화
    pub async fn reset_statistics(&self) -> Result<()> {
        let conn = self.data_source.get_connection().await?;
        conn.execute(RESET_STATISTICS).await?;
        info!("통계 카운터 초기화 요청 완료");
        Ok(())
    }

    /// 마지막 통계 초기화 시각 (초기화 이력이 없으면 None)
    pub async fn get_last_stats_reset_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.data_source.get_connection().await?;
        let timestamp = conn.query_timestamp(SELECT_LAST_STATS_RESET).await?;
        debug!("stats_reset 조회 결과: {timestamp:?}");
        Ok(timestamp)
    }
}
