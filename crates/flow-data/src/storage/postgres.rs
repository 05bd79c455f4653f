//! PostgreSQL 수급/가격 이력 저장소.
//!
//! `investor_trading` 테이블은 종목별(또는 `stock_code IS NULL`인 시장 전체)
//! 투자자 매매 동향을, `stock_prices` 테이블은 종목별 종가를 저장합니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flow_core::{
    DatabaseConfig, FlowResult, FlowSample, InvestorSnapshot, Market, PricePoint, StockCode,
};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{DataError, Result};
use crate::source::HistoryStore;

/// 이력 조회 최대 행 수.
const HISTORY_LIMIT: i64 = 1000;

/// 데이터베이스 연결 풀 래퍼.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 새로운 데이터베이스 연결 풀을 생성합니다.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        info!("Database connection established");

        Ok(Self { pool })
    }

    /// 기존 연결 풀에서 Database 인스턴스를 생성합니다.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 내부 연결 풀을 반환합니다.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 데이터베이스 마이그레이션을 실행합니다.
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");

        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DataError::MigrationError(e.to_string()))?;

        info!("Migrations completed successfully");
        Ok(())
    }

    /// 데이터베이스 상태를 확인합니다.
    pub async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DataError::QueryError(e.to_string()))?;
        Ok(true)
    }
}

// =============================================================================
// Records
// =============================================================================

/// `investor_trading` 레코드.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct FlowRecord {
    pub timestamp: DateTime<Utc>,
    pub stock_code: Option<String>,
    pub market: String,
    pub foreign_buy: i64,
    pub foreign_sell: i64,
    pub foreign_net: i64,
    pub institution_buy: i64,
    pub institution_sell: i64,
    pub institution_net: i64,
    pub individual_buy: i64,
    pub individual_sell: i64,
    pub individual_net: i64,
    pub program_buy: i64,
    pub program_sell: i64,
    pub program_net: i64,
}

impl FlowRecord {
    /// 현재 매매 현황으로 레코드를 만듭니다. 매수/매도 금액은 0입니다.
    pub fn from_snapshot(snapshot: &InvestorSnapshot, market: Market) -> Self {
        Self {
            timestamp: snapshot.timestamp,
            stock_code: snapshot.stock_code.as_ref().map(|c| c.as_str().to_string()),
            market: market.as_str().to_string(),
            foreign_buy: 0,
            foreign_sell: 0,
            foreign_net: snapshot.foreign_net,
            institution_buy: 0,
            institution_sell: 0,
            institution_net: snapshot.institution_net,
            individual_buy: 0,
            individual_sell: 0,
            individual_net: snapshot.individual_net,
            program_buy: 0,
            program_sell: 0,
            program_net: snapshot.program_net,
        }
    }

    /// 저장 전 검증. 종목 코드가 있으면 6자리여야 합니다.
    pub fn validate(&self) -> Result<()> {
        if self.market.is_empty() {
            return Err(DataError::InvalidData("market is empty".to_string()));
        }
        if let Some(code) = &self.stock_code {
            StockCode::new(code.as_str())
                .map_err(|e| DataError::InvalidData(e.to_string()))?;
        }
        Ok(())
    }

    pub fn to_flow_sample(&self) -> FlowSample {
        FlowSample::new(
            self.timestamp,
            self.foreign_net,
            self.institution_net,
            self.individual_net,
        )
        .with_program(self.program_net)
    }
}

/// `stock_prices` 레코드.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PriceRecord {
    pub timestamp: DateTime<Utc>,
    pub close_price: Decimal,
    pub volume: Option<i64>,
}

impl PriceRecord {
    pub fn to_price_point(&self) -> PricePoint {
        let point = PricePoint::new(self.timestamp, self.close_price.to_f64().unwrap_or_default());
        match self.volume {
            Some(volume) => point.with_volume(volume),
            None => point,
        }
    }
}

// =============================================================================
// History Store
// =============================================================================

/// PostgreSQL 기반 이력 저장소.
#[derive(Clone)]
pub struct PgHistoryStore {
    db: Database,
}

impl PgHistoryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// 수급 레코드 하나를 저장합니다. 같은 시각/종목/시장이면 갱신합니다.
    #[instrument(skip(self, record), fields(stock_code = ?record.stock_code, market = %record.market))]
    pub async fn insert_flow(&self, record: &FlowRecord) -> Result<()> {
        record.validate()?;
        upsert_flow(record).execute(self.db.pool()).await?;
        Ok(())
    }

    /// 여러 수급 레코드를 한 트랜잭션으로 저장합니다.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn insert_flows(&self, records: &[FlowRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        for record in records {
            record.validate()?;
        }

        let mut tx = self.db.pool().begin().await?;
        let mut affected = 0usize;
        for record in records {
            let result = upsert_flow(record).execute(&mut *tx).await?;
            affected += result.rows_affected() as usize;
        }
        tx.commit().await?;

        debug!(affected, "Upserted investor trading records");
        Ok(affected)
    }

    /// 종가 하나를 저장합니다.
    #[instrument(skip(self, point))]
    pub async fn insert_price(&self, stock_code: &StockCode, point: &PricePoint) -> Result<()> {
        let close = Decimal::from_f64(point.close_price).ok_or_else(|| {
            DataError::InvalidData(format!("close price {} is not representable", point.close_price))
        })?;

        sqlx::query(
            r#"
            INSERT INTO stock_prices (timestamp, stock_code, close_price, volume)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (stock_code, timestamp) DO UPDATE SET
                close_price = EXCLUDED.close_price,
                volume = EXCLUDED.volume
            "#,
        )
        .bind(point.timestamp)
        .bind(stock_code.as_str())
        .bind(close)
        .bind(point.volume)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// 최근 `hours`시간의 수급 레코드 (오래된 것 → 최신).
    ///
    /// 종목 코드가 없으면 시장 전체 레코드(`stock_code IS NULL`)만 조회합니다.
    #[instrument(skip(self))]
    pub async fn flow_records(
        &self,
        stock_code: Option<&StockCode>,
        market: Market,
        hours: u32,
    ) -> Result<Vec<FlowRecord>> {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT timestamp, stock_code, market,
                   foreign_buy, foreign_sell, foreign_net,
                   institution_buy, institution_sell, institution_net,
                   individual_buy, individual_sell, individual_net,
                   program_buy, program_sell, program_net
            FROM investor_trading
            WHERE timestamp >= NOW() - make_interval(hours => "#,
        );
        query.push_bind(hours as i32).push(")");

        match stock_code {
            Some(code) => {
                query.push(" AND stock_code = ").push_bind(code.as_str().to_string());
            }
            None => {
                query.push(" AND stock_code IS NULL");
            }
        }
        if market != Market::All {
            query.push(" AND market = ").push_bind(market.as_str());
        }
        query.push(" ORDER BY timestamp DESC LIMIT ").push_bind(HISTORY_LIMIT);

        let mut records: Vec<FlowRecord> = query.build_query_as().fetch_all(self.db.pool()).await?;
        records.reverse();

        debug!(count = records.len(), "Loaded investor trading history");
        Ok(records)
    }

    /// 최근 `hours`시간의 종가 레코드 (오래된 것 → 최신).
    #[instrument(skip(self))]
    pub async fn price_records(&self, stock_code: &StockCode, hours: u32) -> Result<Vec<PriceRecord>> {
        let mut records: Vec<PriceRecord> = sqlx::query_as(
            r#"
            SELECT timestamp, close_price, volume FROM stock_prices
            WHERE stock_code = $1 AND timestamp >= NOW() - make_interval(hours => $2)
            ORDER BY timestamp DESC
            LIMIT $3
            "#,
        )
        .bind(stock_code.as_str())
        .bind(hours as i32)
        .bind(HISTORY_LIMIT)
        .fetch_all(self.db.pool())
        .await?;
        records.reverse();

        debug!(count = records.len(), "Loaded price history");
        Ok(records)
    }
}

fn upsert_flow(record: &FlowRecord) -> sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(
        r#"
        INSERT INTO investor_trading (
            timestamp, stock_code, market,
            foreign_buy, foreign_sell, foreign_net,
            institution_buy, institution_sell, institution_net,
            individual_buy, individual_sell, individual_net,
            program_buy, program_sell, program_net
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        ON CONFLICT (timestamp, (COALESCE(stock_code, '')), market) DO UPDATE SET
            foreign_buy = EXCLUDED.foreign_buy,
            foreign_sell = EXCLUDED.foreign_sell,
            foreign_net = EXCLUDED.foreign_net,
            institution_buy = EXCLUDED.institution_buy,
            institution_sell = EXCLUDED.institution_sell,
            institution_net = EXCLUDED.institution_net,
            individual_buy = EXCLUDED.individual_buy,
            individual_sell = EXCLUDED.individual_sell,
            individual_net = EXCLUDED.individual_net,
            program_buy = EXCLUDED.program_buy,
            program_sell = EXCLUDED.program_sell,
            program_net = EXCLUDED.program_net,
            updated_at = NOW()
        "#,
    )
    .bind(record.timestamp)
    .bind(record.stock_code.as_deref())
    .bind(record.market.as_str())
    .bind(record.foreign_buy)
    .bind(record.foreign_sell)
    .bind(record.foreign_net)
    .bind(record.institution_buy)
    .bind(record.institution_sell)
    .bind(record.institution_net)
    .bind(record.individual_buy)
    .bind(record.individual_sell)
    .bind(record.individual_net)
    .bind(record.program_buy)
    .bind(record.program_sell)
    .bind(record.program_net)
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn flow_history(
        &self,
        stock_code: Option<&StockCode>,
        market: Market,
        hours: u32,
    ) -> FlowResult<Vec<FlowSample>> {
        let records = self.flow_records(stock_code, market, hours).await?;
        Ok(records.iter().map(FlowRecord::to_flow_sample).collect())
    }

    async fn price_history(&self, stock_code: &StockCode, hours: u32) -> FlowResult<Vec<PricePoint>> {
        let records = self.price_records(stock_code, hours).await?;
        Ok(records.iter().map(PriceRecord::to_price_point).collect())
    }

    async fn health_check(&self) -> bool {
        match self.db.health_check().await {
            Ok(ok) => ok,
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn snapshot() -> InvestorSnapshot {
        let mut snapshot = InvestorSnapshot::empty(Utc.with_ymd_and_hms(2024, 3, 4, 6, 30, 0).unwrap());
        snapshot.stock_code = Some(StockCode::new("005930").unwrap());
        snapshot.foreign_net = 1_500_000_000;
        snapshot.institution_net = -200_000_000;
        snapshot.individual_net = -1_300_000_000;
        snapshot.program_net = 50_000_000;
        snapshot
    }

    #[test]
    fn test_flow_record_from_snapshot() {
        let record = FlowRecord::from_snapshot(&snapshot(), Market::Kospi);
        assert_eq!(record.stock_code.as_deref(), Some("005930"));
        assert_eq!(record.market, "KOSPI");
        assert_eq!(record.foreign_buy, 0);
        assert!(record.validate().is_ok());

        let sample = record.to_flow_sample();
        assert_eq!(sample.smart_money_net(), 1_300_000_000);
        assert_eq!(sample.program_net, Some(50_000_000));
    }

    #[test]
    fn test_flow_record_rejects_bad_stock_code() {
        let mut record = FlowRecord::from_snapshot(&snapshot(), Market::Kospi);
        record.stock_code = Some("5930".to_string());
        assert!(matches!(record.validate(), Err(DataError::InvalidData(_))));

        record.stock_code = None;
        record.market = String::new();
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_price_record_conversion() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 6, 30, 0).unwrap();
        let record = PriceRecord {
            timestamp: ts,
            close_price: dec!(78500.50),
            volume: Some(1_200_000),
        };
        let point = record.to_price_point();
        assert_eq!(point.close_price, 78500.5);
        assert_eq!(point.volume, Some(1_200_000));

        let record = PriceRecord { volume: None, ..record };
        assert_eq!(record.to_price_point().volume, None);
    }
}
