use std::path::Path;
use std::fs::File;
use std::io::Read;

use serde::{Deserialize, Serialize};

use pgstats_error::Result;

/// 데이터베이스 설정
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// 데이터베이스 연결 설정
    pub connection: ConnectionConfig,
    /// 연결 풀 설정
    pub pool: PoolConfig,
}

impl DbConfig {
    /// 설정파일에서 db 설정 로드
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: DbConfig = serde_yml::from_str(&contents)?;

        Ok(config)
    }

    /// 연결 설정만 교체 (컨테이너가 접속 정보를 제공하는 경우)
    #[must_use]
    pub fn with_connection(&self, connection: ConnectionConfig) -> Self {
        Self {
            connection,
            pool: self.pool.clone(),
        }
    }
}

/// db 연결설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub sslmode: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "postgres".to_string(),
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            sslmode: "disable".to_string(),
        }
    }
}

/// 데이터베이스 연결 풀 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// 최대 연결 수
    pub max_connections: usize,
    /// 연결 타임아웃(초)
    pub connection_timeout_seconds: u64,
    /// 연결 재사용 전 대기 시간(초)
    pub recycle_seconds: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 4, // 순차 실행이라 소수면 충분
            connection_timeout_seconds: 30,  // 연결 시도 타임아웃 30초
            recycle_seconds: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_file_nested_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "connection:\n  host: db.internal\n  port: 6432\npool:\n  max_connections: 2\n"
        )
        .unwrap();

        let config = DbConfig::from_file(file.path()).unwrap();
        assert_eq!(config.connection.host, "db.internal");
        assert_eq!(config.connection.port, 6432);
        assert_eq!(config.connection.sslmode, "disable");
        assert_eq!(config.pool.max_connections, 2);
        assert_eq!(config.pool.connection_timeout_seconds, 30);
    }

    #[test]
    fn test_with_connection_keeps_pool() {
        let mut config = DbConfig::default();
        config.pool.max_connections = 7;

        let connection = ConnectionConfig {
            host: "127.0.0.1".to_string(),
            port: 49153,
            ..ConnectionConfig::default()
        };
        let replaced = config.with_connection(connection.clone());

        assert_eq!(replaced.connection, connection);
        assert_eq!(replaced.pool.max_connections, 7);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "connection: [not, a, map]").unwrap();

        let err = DbConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, pgstats_error::DemoError::Config(_)));
    }
}
