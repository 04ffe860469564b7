use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use pgstats_error::Result;

/// 일회용 PostgreSQL 컨테이너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// false면 컨테이너 없이 db.yml 접속 정보를 그대로 사용
    pub enabled: bool,
    pub docker_bin: String,
    pub image: String,
    pub tag: String,
    pub user: String,
    pub password: String,
    pub database: String,
    /// 공유 메모리 크기(MB)
    pub shm_size_mb: u64,
    /// 데이터 디렉토리를 tmpfs로 마운트
    pub tmpfs_data: bool,
    /// 기동 대기 타임아웃(초)
    pub startup_timeout_seconds: u64,
    /// `-c key=value` 로 전달할 추가 서버 파라미터
    pub parameters: BTreeMap<String, String>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerConfig {
    /// 기본설정으로 생성
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            docker_bin: "docker".to_string(),
            image: "postgres".to_string(),
            tag: "13.7".to_string(),
            user: "test".to_string(),
            password: "test".to_string(),
            database: "test".to_string(),
            shm_size_mb: 512,
            tmpfs_data: true,
            startup_timeout_seconds: 60,
            parameters: BTreeMap::new(),
        }
    }

    /// 설정파일에서 컨테이너 설정 로드
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config = serde_yml::from_str(&contents)?;

        Ok(config)
    }

    /// `image:tag`
    pub fn image_ref(&self) -> String {
        format!("{}:{}", self.image, self.tag)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_seconds)
    }
}
