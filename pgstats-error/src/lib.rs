use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::num::ParseIntError;
use tokio::time::error::Elapsed;
use deadpool_postgres::PoolError;
use serde_yml::Error as YmlError;
use tokio_postgres::Error as PgError;

/// 통계 초기화 데모의 모든 에러 타입을 정의합니다.
#[derive(Debug)]
pub enum DemoError {
    /// 설정 관련 에러
    Config(String),

    /// 입출력 에러
    Io(io::Error),

    /// 데이터베이스 관련 에러
    Database(String),

    /// 컨테이너 프로비저닝 관련 에러
    Container(String),

    /// 통계 초기화 결과 관련 에러
    Statistics(String),

    /// 타임아웃 에러
    Timeout(String),
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemoError::Config(msg) => write!(f, "설정 에러: {}", msg),
            DemoError::Io(err) => write!(f, "I/O 에러: {}", err),
            DemoError::Database(msg) => write!(f, "데이터베이스 에러: {}", msg),
            DemoError::Container(msg) => write!(f, "컨테이너 에러: {}", msg),
            DemoError::Statistics(msg) => write!(f, "통계 에러: {}", msg),
            DemoError::Timeout(msg) => write!(f, "타임아웃 에러: {}", msg),
        }
    }
}

impl StdError for DemoError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            DemoError::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Result 타입 별칭 정의
pub type Result<T> = std::result::Result<T, DemoError>;

/// From 트레이트 구현으로 다양한 에러 타입을 DemoError로 변환
impl From<io::Error> for DemoError {
    fn from(err: io::Error) -> Self {
        DemoError::Io(err)
    }
}

impl From<PoolError> for DemoError {
    fn from(err: PoolError) -> Self {
        DemoError::Database(format!("DB 풀 에러: {}", err))
    }
}

impl From<PgError> for DemoError {
    fn from(err: PgError) -> Self {
        DemoError::Database(format!("PostgreSQL 에러: {}", err))
    }
}

impl From<Elapsed> for DemoError {
    fn from(err: Elapsed) -> Self {
        DemoError::Timeout(format!("작업 타임아웃: {}", err))
    }
}

impl From<ParseIntError> for DemoError {
    fn from(err: ParseIntError) -> Self {
        DemoError::Container(format!("포트 파싱 에러: {}", err))
    }
}

impl From<YmlError> for DemoError {
    fn from(err: YmlError) -> Self {
        DemoError::Config(format!("YAML 파싱 에러: {}", err))
    }
}

/// 에러 처리 유틸리티 함수
pub fn config_err<E: fmt::Display>(err: E) -> DemoError {
    DemoError::Config(format!("{}", err))
}

pub fn db_err<E: fmt::Display>(err: E) -> DemoError {
    DemoError::Database(format!("{}", err))
}

pub fn container_err<E: fmt::Display>(err: E) -> DemoError {
    DemoError::Container(format!("{}", err))
}
