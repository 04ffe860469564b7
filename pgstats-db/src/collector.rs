use std::time::Duration;

use chrono::{DateTime, Local};
use log::{error, info};

use pgstats_config::Config;
use pgstats_error::{DemoError, Result};

use crate::management::DatabaseManagement;
use crate::source::DataSource;
use crate::sql::statistics::VACUUM_ANALYZE;

const DEFAULT_COLLECTOR_WAIT: Duration = Duration::from_millis(1000);
const DEFAULT_MAINTENANCE_TIMEOUT: Duration = Duration::from_secs(60);

/// 통계 초기화 후 수집기 반영까지 기다렸다가 초기화 시각을 확인한다.
///
/// `vacuum analyze` 뒤의 고정 대기는 수집기 반영을 보장하지 않는다.
/// 대기가 짧으면 이전 `stats_reset` 값을 읽을 수 있으니 느린 환경에서는 `collector_wait` 를 늘린다.
pub struct StatisticsCollector<'a> {
    data_source: &'a dyn DataSource,
    collector_wait: Duration,
    maintenance_timeout: Duration,
}

impl<'a> StatisticsCollector<'a> {
    pub fn new(data_source: &'a dyn DataSource) -> Self {
        Self {
            data_source,
            collector_wait: DEFAULT_COLLECTOR_WAIT,
            maintenance_timeout: DEFAULT_MAINTENANCE_TIMEOUT,
        }
    }

    /// 실행 설정의 대기/타임아웃 값 적용
    pub fn from_config(data_source: &'a dyn DataSource, config: &Config) -> Self {
        Self::new(data_source)
            .with_collector_wait(config.collector_wait())
            .with_maintenance_timeout(config.maintenance_timeout())
    }

    #[must_use]
    pub fn with_collector_wait(mut self, wait: Duration) -> Self {
        self.collector_wait = wait;
        self
    }

    #[must_use]
    pub fn with_maintenance_timeout(mut self, timeout: Duration) -> Self {
        self.maintenance_timeout = timeout;
        self
    }

    /// 통계 초기화 후 마지막 초기화 시각을 로컬 시간대로 반환
    pub async fn reset_statistics(&self) -> Result<DateTime<Local>> {
        let management = DatabaseManagement::new(self.data_source);
        management.reset_statistics().await?;
        self.wait_for_statistics_collector().await?;

        let reset_timestamp = management
            .get_last_stats_reset_timestamp()
            .await?
            .ok_or_else(|| {
                error!("통계 초기화 이후에도 stats_reset 값이 없음");
                DemoError::Statistics("마지막 통계 초기화 시각을 확인할 수 없습니다".to_string())
            })?;

        let zoned = reset_timestamp.with_timezone(&Local);
        info!("마지막 통계 초기화 시각: {zoned}");
        Ok(zoned)
    }

    /// `vacuum analyze` 실행 후 고정 시간 대기
    pub async fn wait_for_statistics_collector(&self) -> Result<()> {
        let conn = self.data_source.get_connection().await?;
        info!("'vacuum analyze' 실행으로 통계 수집기 대기");

        match tokio::time::timeout(self.maintenance_timeout, conn.execute(VACUUM_ANALYZE)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("vacuum analyze 실행 실패: {e}");
                return Err(e);
            }
            Err(e) => {
                error!("vacuum analyze 실행 타임아웃 ({:?})", self.maintenance_timeout);
                return Err(e.into());
            }
        }

        tokio::time::sleep(self.collector_wait).await;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use pgstats_error::db_err;

    use crate::source::PgConnection;
    use crate::sql::statistics::{RESET_STATISTICS, SELECT_LAST_STATS_RESET};

    #[derive(Default)]
    struct StubState {
        executed: Vec<String>,
        queried: Vec<String>,
        acquired: usize,
        released: usize,
    }

    #[derive(Clone, Default)]
    struct StubBehavior {
        timestamp: Option<DateTime<Utc>>,
        fail_on: Option<&'static str>,
        stall_on: Option<(&'static str, Duration)>,
    }

    /// 실행한 쿼리와 연결 대여/반납 횟수를 기록하는 테스트용 연결 공급원
    pub(crate) struct StubDataSource {
        state: Arc<Mutex<StubState>>,
        behavior: StubBehavior,
    }

    impl StubDataSource {
        pub(crate) fn new(timestamp: Option<DateTime<Utc>>) -> Self {
            Self {
                state: Arc::new(Mutex::new(StubState::default())),
                behavior: StubBehavior {
                    timestamp,
                    ..StubBehavior::default()
                },
            }
        }

        fn failing_on(mut self, sql: &'static str) -> Self {
            self.behavior.fail_on = Some(sql);
            self
        }

        fn stalling_on(mut self, sql: &'static str, delay: Duration) -> Self {
            self.behavior.stall_on = Some((sql, delay));
            self
        }

        pub(crate) fn executed(&self) -> Vec<String> {
            self.state.lock().unwrap().executed.clone()
        }

        pub(crate) fn queried(&self) -> Vec<String> {
            self.state.lock().unwrap().queried.clone()
        }

        pub(crate) fn acquired(&self) -> usize {
            self.state.lock().unwrap().acquired
        }

        pub(crate) fn released(&self) -> usize {
            self.state.lock().unwrap().released
        }
    }

    struct StubConnection {
        state: Arc<Mutex<StubState>>,
        behavior: StubBehavior,
    }

    impl Drop for StubConnection {
        fn drop(&mut self) {
            self.state.lock().unwrap().released += 1;
        }
    }

    #[async_trait]
    impl PgConnection for StubConnection {
        async fn execute(&self, sql: &str) -> Result<()> {
            self.state.lock().unwrap().executed.push(sql.to_string());
            if let Some((stall_sql, delay)) = self.behavior.stall_on {
                if stall_sql == sql {
                    tokio::time::sleep(delay).await;
                }
            }
            if self.behavior.fail_on == Some(sql) {
                return Err(db_err(format!("stub failure: {sql}")));
            }
            Ok(())
        }

        async fn query_timestamp(&self, sql: &str) -> Result<Option<DateTime<Utc>>> {
            self.state.lock().unwrap().queried.push(sql.to_string());
            Ok(self.behavior.timestamp)
        }
    }

    #[async_trait]
    impl DataSource for StubDataSource {
        async fn get_connection(&self) -> Result<Box<dyn PgConnection>> {
            self.state.lock().unwrap().acquired += 1;
            Ok(Box::new(StubConnection {
                state: Arc::clone(&self.state),
                behavior: self.behavior.clone(),
            }))
        }
    }

    fn reset_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 15).unwrap()
    }

    #[tokio::test]
    async fn test_reset_returns_local_timestamp() {
        let source = StubDataSource::new(Some(reset_at()));
        let collector = StatisticsCollector::new(&source).with_collector_wait(Duration::ZERO);

        let zoned = collector.reset_statistics().await.unwrap();

        assert_eq!(zoned, reset_at().with_timezone(&Local));
        assert_eq!(
            source.executed(),
            vec![RESET_STATISTICS.to_string(), VACUUM_ANALYZE.to_string()]
        );
        assert_eq!(source.queried(), vec![SELECT_LAST_STATS_RESET.to_string()]);
    }

    #[tokio::test]
    async fn test_vacuum_runs_exactly_once() {
        let source = StubDataSource::new(Some(reset_at()));
        let collector = StatisticsCollector::new(&source).with_collector_wait(Duration::ZERO);

        collector.reset_statistics().await.unwrap();

        let vacuums = source
            .executed()
            .iter()
            .filter(|sql| sql.as_str() == VACUUM_ANALYZE)
            .count();
        assert_eq!(vacuums, 1);
    }

    #[tokio::test]
    async fn test_missing_timestamp_fails() {
        let source = StubDataSource::new(None);
        let collector = StatisticsCollector::new(&source).with_collector_wait(Duration::ZERO);

        let err = collector.reset_statistics().await.unwrap_err();

        assert!(matches!(err, DemoError::Statistics(_)));
        assert_eq!(source.acquired(), source.released());
    }

    #[tokio::test]
    async fn test_vacuum_failure_releases_connection() {
        let source = StubDataSource::new(Some(reset_at())).failing_on(VACUUM_ANALYZE);
        let collector = StatisticsCollector::new(&source).with_collector_wait(Duration::ZERO);

        let err = collector.reset_statistics().await.unwrap_err();

        assert!(matches!(err, DemoError::Database(_)));
        assert_eq!(source.acquired(), 2);
        assert_eq!(source.released(), 2);
        assert!(source.queried().is_empty());
    }

    #[tokio::test]
    async fn test_vacuum_timeout_releases_connection() {
        let source = StubDataSource::new(Some(reset_at()))
            .stalling_on(VACUUM_ANALYZE, Duration::from_secs(5));
        let collector = StatisticsCollector::new(&source)
            .with_collector_wait(Duration::ZERO)
            .with_maintenance_timeout(Duration::from_millis(20));

        let err = collector.wait_for_statistics_collector().await.unwrap_err();

        assert!(matches!(err, DemoError::Timeout(_)));
        assert_eq!(source.acquired(), 1);
        assert_eq!(source.released(), 1);
    }

    #[tokio::test]
    async fn test_reset_failure_skips_vacuum() {
        let source = StubDataSource::new(Some(reset_at())).failing_on(RESET_STATISTICS);
        let collector = StatisticsCollector::new(&source).with_collector_wait(Duration::ZERO);

        assert!(collector.reset_statistics().await.is_err());
        assert_eq!(source.executed(), vec![RESET_STATISTICS.to_string()]);
        assert_eq!(source.acquired(), source.released());
    }

    #[tokio::test]
    async fn test_waits_for_collector() {
        let source = StubDataSource::new(Some(reset_at()));
        let collector =
            StatisticsCollector::new(&source).with_collector_wait(Duration::from_millis(50));

        let started = Instant::now();
        collector.wait_for_statistics_collector().await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(source.released(), 1);
    }

    #[test]
    fn test_from_config() {
        let source = StubDataSource::new(None);
        let config = Config {
            collector_wait_ms: 250,
            maintenance_timeout_seconds: 5,
        };

        let collector = StatisticsCollector::from_config(&source, &config);
        assert_eq!(collector.collector_wait, Duration::from_millis(250));
        assert_eq!(collector.maintenance_timeout, Duration::from_secs(5));
    }
}
