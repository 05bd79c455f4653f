//! 데이터 모듈 오류 타입.

use flow_core::FlowError;
use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 레코드를 찾을 수 없음
    #[error("Record not found: {0}")]
    NotFound(String),

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// 캐시 오류
    #[error("Cache error: {0}")]
    CacheError(String),

    /// 잘못된 데이터 형식
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// 마이그레이션 오류
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// 연결 풀 소진
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// 외부 시세 소스 오류
    #[error("Fetch error: {0}")]
    FetchError(String),
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DataError::NotFound("Row not found".to_string()),
            sqlx::Error::PoolTimedOut => DataError::PoolExhausted,
            sqlx::Error::Database(db_err) => DataError::QueryError(db_err.message().to_string()),
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

impl From<redis::RedisError> for DataError {
    fn from(err: redis::RedisError) -> Self {
        DataError::CacheError(err.to_string())
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

impl From<DataError> for FlowError {
    fn from(err: DataError) -> Self {
        FlowError::Upstream(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_become_upstream() {
        let err: FlowError = DataError::QueryError("relation missing".to_string()).into();
        assert_eq!(err.kind(), "UPSTREAM_FAILURE");
        assert!(err.is_retryable());

        let err: FlowError = DataError::PoolExhausted.into();
        assert_eq!(err.kind(), "UPSTREAM_FAILURE");
    }

    #[test]
    fn test_serde_error_message_preserved() {
        let json_err = serde_json::from_str::<u32>("x").unwrap_err();
        let err: FlowError = DataError::from(json_err).into();
        assert!(err.to_string().contains("Serialization error"));
    }
}
