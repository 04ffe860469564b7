use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use pgstats_error::Result;

/// 데모 실행 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `vacuum analyze` 이후 통계 수집기 대기 시간(ms)
    ///
    /// 수집기 반영을 보장하지 않는 경험값이라 느린 환경에서는 경쟁 상태가 생길 수 있음
    pub collector_wait_ms: u64,
    /// 유지보수 쿼리 타임아웃(초)
    pub maintenance_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// 기본설정으로 생성
    #[must_use]
    pub fn new() -> Self {
        Self {
            collector_wait_ms: 1000,
            maintenance_timeout_seconds: 60,
        }
    }

    /// 설정파일에서 설정 로드
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config = serde_yml::from_str(&contents)?;

        Ok(config)
    }

    pub fn collector_wait(&self) -> Duration {
        Duration::from_millis(self.collector_wait_ms)
    }

    pub fn maintenance_timeout(&self) -> Duration {
        Duration::from_secs(self.maintenance_timeout_seconds)
    }
}
