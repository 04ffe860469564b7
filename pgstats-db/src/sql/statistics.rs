/// 현재 데이터베이스 통계 카운터 초기화 쿼리
pub const RESET_STATISTICS: &str = "select pg_stat_reset()";

/// 마지막 통계 초기화 시각 조회 쿼리
pub const SELECT_LAST_STATS_RESET: &str = "
    select stats_reset
    from pg_stat_database
    where datname = current_database()
";

/// 통계 수집기 동기화용 유지보수 쿼리
pub const VACUUM_ANALYZE: &str = "vacuum analyze;";

/// 연결 확인 쿼리
pub const PING: &str = "SELECT 1";
