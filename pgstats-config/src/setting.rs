use std::path::Path;

use log::info;

use pgstats_error::{Result, config_err};

use crate::config::Config;
use crate::containerconfig::ContainerConfig;
use crate::dbconfig::DbConfig;

const APP_CONFIG_FILE: &str = "config.yml";
const DB_CONFIG_FILE: &str = "db.yml";
const CONTAINER_CONFIG_FILE: &str = "container.yml";

/// 통합 세팅 인스턴스
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub app: Config,
    pub database: DbConfig,
    pub container: ContainerConfig,
}

impl Settings {
    /// 현재 디렉토리 기준으로 Setting 생성
    pub fn new() -> Result<Self> {
        Self::from_dir(".")
    }

    /// 지정한 디렉토리의 설정파일로 Setting 생성
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let app = Self::load_app_config(dir)?;
        let database = Self::load_db_config(dir)?;
        let container = Self::load_container_config(dir)?;

        Ok(Self {
            app,
            database,
            container,
        })
    }

    /// 데모 실행 설정 로드
    fn load_app_config(dir: &Path) -> Result<Config> {
        let path = dir.join(APP_CONFIG_FILE);
        // yml 파일 유무 확인
        if path.exists() {
            info!("실행 설정파일 로드: {}", path.display());
            Config::from_file(&path)
                .map_err(|e| config_err(format!("실행 설정파일 로드 실패: {}", e)))
        } else {
            // 기본설정사용
            info!("실행 기본설정 사용");
            Ok(Config::new())
        }
    }

    /// db 설정 로드
    fn load_db_config(dir: &Path) -> Result<DbConfig> {
        let path = dir.join(DB_CONFIG_FILE);
        if path.exists() {
            info!("DB 설정파일 로드: {}", path.display());
            DbConfig::from_file(&path)
                .map_err(|e| config_err(format!("DB 설정파일 로드 실패: {}", e)))
        } else {
            info!("DB 기본설정 사용");
            Ok(DbConfig::default())
        }
    }

    /// 컨테이너 설정 로드
    fn load_container_config(dir: &Path) -> Result<ContainerConfig> {
        let path = dir.join(CONTAINER_CONFIG_FILE);
        if path.exists() {
            info!("컨테이너 설정파일 로드: {}", path.display());
            ContainerConfig::from_file(&path)
                .map_err(|e| config_err(format!("컨테이너 설정파일 로드 실패: {}", e)))
        } else {
            info!("컨테이너 기본설정 사용");
            Ok(ContainerConfig::new())
        }
    }
}
