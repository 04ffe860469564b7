use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::process::Command;
use tokio_postgres::NoTls;

use pgstats_config::{ConnectionConfig, ContainerConfig};
use pgstats_error::{Result, container_err};

/// 컨테이너 내부 PostgreSQL 포트
const POSTGRES_PORT: &str = "5432/tcp";
/// 데이터 디렉토리 (tmpfs 마운트 대상)
const DATA_DIR: &str = "/var/lib/postgresql/data";
/// 호스트 바인딩 주소
const BIND_HOST: &str = "127.0.0.1";
/// 기동 확인 재시도 간격
const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// docker CLI로 띄운 일회용 PostgreSQL 컨테이너
///
/// `stop` 으로 정리하는 것이 기본이며 호출되지 않은 채 drop되면 동기적으로 삭제를 시도한다.
#[derive(Debug)]
pub struct PostgreSqlContainer {
    id: String,
    host: String,
    port: u16,
    config: ContainerConfig,
    removed: bool,
}

impl PostgreSqlContainer {
    /// 컨테이너 실행 후 접속 가능해질 때까지 대기
    pub async fn start(config: &ContainerConfig) -> Result<Self> {
        info!("PostgreSQL 컨테이너 시작: {}", config.image_ref());

        let id = run_docker(&config.docker_bin, &run_args(config)).await?;
        if id.is_empty() {
            return Err(container_err("docker run 이 컨테이너 ID를 반환하지 않음"));
        }
        debug!("컨테이너 ID: {id}");

        // 이후 단계가 실패해도 Drop에서 정리되도록 먼저 구조체를 만든다
        let mut container = Self {
            id,
            host: BIND_HOST.to_string(),
            port: 0,
            config: config.clone(),
            removed: false,
        };

        if let Err(e) = container.resolve_port().await {
            container.remove().await?;
            return Err(e);
        }

        if let Err(e) = container.wait_until_ready().await {
            warn!("컨테이너 기동 확인 실패, 컨테이너 삭제: {e}");
            container.remove().await?;
            return Err(e);
        }

        info!("PostgreSQL 컨테이너 준비 완료: {}", container.url());
        Ok(container)
    }

    /// 매핑된 호스트 포트 조회
    async fn resolve_port(&mut self) -> Result<()> {
        let output = run_docker(
            &self.config.docker_bin,
            &["port".to_string(), self.id.clone(), POSTGRES_PORT.to_string()],
        )
        .await?;
        self.port = parse_mapped_port(&output)?;
        debug!("매핑된 포트: {}", self.port);
        Ok(())
    }

    /// TCP로 `SELECT 1` 이 성공할 때까지 대기
    async fn wait_until_ready(&self) -> Result<()> {
        let timeout = self.config.startup_timeout();
        let pg_config = self.pg_config();

        let probe = async {
            loop {
                match pg_config.connect(NoTls).await {
                    Ok((client, connection)) => {
                        let handle = tokio::spawn(connection);
                        let ready = client.simple_query("SELECT 1").await;
                        drop(client);
                        let _ = handle.await;
                        match ready {
                            Ok(_) => return,
                            Err(e) => debug!("기동 확인 쿼리 실패, 재시도: {e}"),
                        }
                    }
                    Err(e) => debug!("컨테이너 접속 대기중: {e}"),
                }
                tokio::time::sleep(READY_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, probe).await.map_err(|_| {
            container_err(format!(
                "{}초 안에 PostgreSQL 컨테이너가 준비되지 않음",
                timeout.as_secs()
            ))
        })
    }

    fn pg_config(&self) -> tokio_postgres::Config {
        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .host(self.host.as_str())
            .port(self.port)
            .dbname(self.config.database.as_str())
            .user(self.config.user.as_str())
            .password(self.config.password.as_str())
            .connect_timeout(READY_POLL_INTERVAL * 4);
        pg_config
    }

    /// 풀 생성에 사용할 접속 정보
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            host: self.host.clone(),
            port: self.port,
            database: self.config.database.clone(),
            user: self.config.user.clone(),
            password: self.config.password.clone(),
            sslmode: "disable".to_string(),
        }
    }

    /// 접속 URL
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.config.user, self.config.password, self.host, self.port, self.config.database
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// 컨테이너 정지 및 삭제
    pub async fn stop(mut self) -> Result<()> {
        self.remove().await
    }

    async fn remove(&mut self) -> Result<()> {
        if self.removed {
            return Ok(());
        }
        run_docker(&self.config.docker_bin, &remove_args(&self.id)).await?;
        self.removed = true;
        info!("PostgreSQL 컨테이너 삭제: {}", self.id);
        Ok(())
    }
}

impl Drop for PostgreSqlContainer {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        warn!("정리되지 않은 컨테이너 삭제: {}", self.id);
        match std::process::Command::new(&self.config.docker_bin)
            .args(remove_args(&self.id))
            .output()
        {
            Ok(output) if output.status.success() => {}
            Ok(output) => warn!(
                "컨테이너 삭제 실패: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            Err(e) => warn!("컨테이너 삭제 명령 실행 실패: {e}"),
        }
    }
}

/// docker 명령 실행 후 stdout 반환
async fn run_docker(docker_bin: &str, args: &[String]) -> Result<String> {
    debug!("{docker_bin} {}", args.join(" "));
    let output = Command::new(docker_bin).args(args).output().await?;

    if !output.status.success() {
        return Err(container_err(format!(
            "{docker_bin} {} 실패 ({}): {}",
            args.first().map_or("", String::as_str),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// 추가 서버 파라미터를 `-c key=value` 인자로 변환
pub fn command_parts(parameters: &BTreeMap<String, String>) -> Vec<String> {
    parameters
        .iter()
        .flat_map(|(key, value)| ["-c".to_string(), format!("{key}={value}")])
        .collect()
}

/// `docker run` 인자 구성
pub fn run_args(config: &ContainerConfig) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "-d".to_string(),
        "--shm-size".to_string(),
        format!("{}m", config.shm_size_mb),
    ];

    if config.tmpfs_data {
        args.push("--tmpfs".to_string());
        args.push(format!("{DATA_DIR}:rw"));
    }

    for (key, value) in [
        ("POSTGRES_USER", &config.user),
        ("POSTGRES_PASSWORD", &config.password),
        ("POSTGRES_DB", &config.database),
    ] {
        args.push("-e".to_string());
        args.push(format!("{key}={value}"));
    }

    args.push("-p".to_string());
    args.push(format!("{BIND_HOST}::5432"));
    args.push(config.image_ref());
    args.extend(command_parts(&config.parameters));

    args
}

fn remove_args(id: &str) -> Vec<String> {
    vec!["rm".to_string(), "-f".to_string(), "-v".to_string(), id.to_string()]
}

/// `docker port` 출력(`127.0.0.1:49153`)에서 호스트 포트 추출
pub fn parse_mapped_port(output: &str) -> Result<u16> {
    let line = output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| container_err("docker port 출력이 비어 있음"))?;

    let (_, port) = line
        .rsplit_once(':')
        .ok_or_else(|| container_err(format!("포트 매핑 형식 오류: {line}")))?;

    Ok(port.parse::<u16>()?)
}
