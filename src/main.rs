use std::io::Write;

use log::{debug, error, info, warn, LevelFilter};
use env_logger::Builder;
use chrono::Local;

use pgstats_config::{DbConfig, Settings};
use pgstats_container::PostgreSqlContainer;
use pgstats_db::{StatisticsCollector, initialize_dbpool};
use pgstats_error::Result;

/// 로거 세팅
fn setup_logger() {
    #[cfg(debug_assertions)]
    {
        Builder::new()
            .filter(None, LevelFilter::Debug)
            .format(|buf,record| {
                writeln!(
                    buf,
                    "[{} {} {}:{}] {}",
                    Local::now().format("%Y-%m-%d %H:%M:%S"),
                    record.level(),
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0),
                    record.args()
                )
            })
            .init()
    }

    #[cfg(not(debug_assertions))]
    {
        Builder::new()
            .filter(None, LevelFilter::Info)
            .init();
    }
}

/// 통계 초기화 → vacuum analyze → 대기 → 초기화 시각 확인
async fn run(settings: &Settings, dbconfig: &DbConfig) -> Result<()> {
    let pool = initialize_dbpool(dbconfig).await?;

    let collector = StatisticsCollector::from_config(&pool, &settings.app);
    let reset_at = collector.reset_statistics().await?;
    debug!("확인된 초기화 시각(RFC 3339): {}", reset_at.to_rfc3339());

    debug!("연결 풀 상태: {:?}", pool.pool_status());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 로거 세팅
    setup_logger();

    info!("PostgreSQL 통계 초기화 데모 시작");

    // 통합 설정 로드
    let settings = Settings::new()?;

    if !settings.container.enabled {
        info!("컨테이너 비활성화, db 설정으로 직접 접속");
        return run(&settings, &settings.database).await;
    }

    // 일회용 db 세팅
    let container = PostgreSqlContainer::start(&settings.container).await?;
    info!("컨테이너 {} 사용", container.id());
    let dbconfig = settings.database.with_connection(container.connection_config());

    let result = run(&settings, &dbconfig).await;

    // 실행 결과와 무관하게 컨테이너 정리
    let cleanup = container.stop().await;

    settle(result, cleanup)
}

/// 실행 결과와 컨테이너 정리 결과 병합 (실행 에러 우선)
fn settle(result: Result<()>, cleanup: Result<()>) -> Result<()> {
    match (result, cleanup) {
        (Err(e), Err(stop_err)) => {
            error!("통계 초기화 실패: {e}");
            warn!("컨테이너 정리 실패: {stop_err}");
            Err(e)
        }
        (Err(e), Ok(())) => {
            error!("통계 초기화 실패: {e}");
            Err(e)
        }
        (Ok(()), cleanup) => cleanup,
    }
}
