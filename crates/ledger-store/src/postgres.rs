use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{EntryId, OwnerId, ProductName};
use sqlx::{PgConnection, PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    CustomerInfo, LedgerQuery, PriceChangeKind, PriceHistoryEntry, PurchaseEntry,
    Result, SaleEntry, StockRow, StoreError, SupplierInfo, Version,
    store::InventoryStore,
    unit_of_work::{ExpectedVersion, LedgerWrite, StockWrite, UnitOfWork, validate_unit_of_work},
};

const PURCHASE_COLUMNS: &str = "id, owner_id, supplier_name, supplier_location, supplier_company, \
     product_name, quantity, unit_price, entry_date, entry_time, notes, deleted, deleted_at, \
     created_at, updated_at, version";

const SALE_COLUMNS: &str = "id, owner_id, customer_name, customer_number, product_name, quantity, \
     price, total_price, entry_date, entry_time, deleted, deleted_at, created_at, updated_at, version";

const STOCK_COLUMNS: &str = "owner_id, product_name, supplier_company, quantity, unit_price, \
     total_value, low_stock_threshold, last_updated, created_at, version";

/// PostgreSQL-backed ledger store implementation.
#[derive(Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    /// Creates a new PostgreSQL ledger store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_purchase(row: &PgRow) -> Result<PurchaseEntry> {
        Ok(PurchaseEntry {
            id: EntryId::from_uuid(row.try_get::<Uuid, _>("id")?),
            owner: OwnerId::from_uuid(row.try_get::<Uuid, _>("owner_id")?),
            supplier: SupplierInfo {
                name: row.try_get("supplier_name")?,
                location: row.try_get("supplier_location")?,
                company: row.try_get("supplier_company")?,
            },
            product_name: decode_product_name(row.try_get("product_name")?)?,
            quantity: row.try_get("quantity")?,
            unit_price: row.try_get("unit_price")?,
            date: row.try_get("entry_date")?,
            time: row.try_get("entry_time")?,
            notes: row.try_get("notes")?,
            deleted: row.try_get("deleted")?,
            deleted_at: row.try_get("deleted_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            version: Version::new(row.try_get("version")?),
        })
    }

    fn row_to_sale(row: &PgRow) -> Result<SaleEntry> {
        Ok(SaleEntry {
            id: EntryId::from_uuid(row.try_get::<Uuid, _>("id")?),
            owner: OwnerId::from_uuid(row.try_get::<Uuid, _>("owner_id")?),
            customer: CustomerInfo {
                name: row.try_get("customer_name")?,
                number: row.try_get("customer_number")?,
            },
            product_name: decode_product_name(row.try_get("product_name")?)?,
            quantity: row.try_get("quantity")?,
            price: row.try_get("price")?,
            total_price: row.try_get("total_price")?,
            date: row.try_get("entry_date")?,
            time: row.try_get("entry_time")?,
            deleted: row.try_get("deleted")?,
            deleted_at: row.try_get("deleted_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            version: Version::new(row.try_get("version")?),
        })
    }

    fn row_to_stock(row: &PgRow, price_history: Vec<PriceHistoryEntry>) -> Result<StockRow> {
        Ok(StockRow {
            owner: OwnerId::from_uuid(row.try_get::<Uuid, _>("owner_id")?),
            product_name: decode_product_name(row.try_get("product_name")?)?,
            supplier_company: row.try_get("supplier_company")?,
            quantity: row.try_get("quantity")?,
            unit_price: row.try_get("unit_price")?,
            total_value: row.try_get("total_value")?,
            low_stock_threshold: row.try_get("low_stock_threshold")?,
            last_updated: row.try_get("last_updated")?,
            created_at: row.try_get("created_at")?,
            price_history,
            version: Version::new(row.try_get("version")?),
        })
    }

    fn row_to_history(row: &PgRow) -> Result<PriceHistoryEntry> {
        let kind: String = row.try_get("kind")?;
        let kind = PriceChangeKind::parse(&kind).ok_or_else(|| {
            StoreError::Database(sqlx::Error::Decode(
                format!("unknown price change kind '{kind}'").into(),
            ))
        })?;

        Ok(PriceHistoryEntry {
            seq: row.try_get::<i32, _>("seq")? as u32,
            date: row.try_get("recorded_at")?,
            price: row.try_get("price")?,
            kind,
            reference_id: row
                .try_get::<Option<Uuid>, _>("reference_id")?
                .map(EntryId::from_uuid),
        })
    }

    async fn write_ledger(conn: &mut PgConnection, write: &LedgerWrite) -> Result<()> {
        match write {
            LedgerWrite::InsertPurchase(entry) => {
                let sql = format!(
                    "INSERT INTO purchases ({PURCHASE_COLUMNS}) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)"
                );
                bind_purchase(sqlx::query(&sql), entry)
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| {
                        insert_conflict(e, format!("purchase {}", entry.id), entry.version)
                    })?;
            }
            LedgerWrite::ReplacePurchase { entry, expected } => {
                let result = sqlx::query(
                    r#"
                    UPDATE purchases SET
                        supplier_name = $3, supplier_location = $4, supplier_company = $5,
                        product_name = $6, quantity = $7, unit_price = $8, entry_date = $9,
                        entry_time = $10, notes = $11, deleted = $12, deleted_at = $13,
                        created_at = $14, updated_at = $15, version = $16
                    WHERE id = $1 AND owner_id = $2 AND version = $17
                    "#,
                )
                .bind(entry.id.as_uuid())
                .bind(entry.owner.as_uuid())
                .bind(&entry.supplier.name)
                .bind(&entry.supplier.location)
                .bind(&entry.supplier.company)
                .bind(entry.product_name.as_str())
                .bind(entry.quantity)
                .bind(entry.unit_price)
                .bind(entry.date)
                .bind(entry.time)
                .bind(&entry.notes)
                .bind(entry.deleted)
                .bind(entry.deleted_at)
                .bind(entry.created_at)
                .bind(entry.updated_at)
                .bind(entry.version.as_i64())
                .bind(expected.as_i64())
                .execute(&mut *conn)
                .await?;

                if result.rows_affected() == 0 {
                    let actual = entry_version(conn, "purchases", entry.owner, entry.id).await?;
                    return Err(conflict(format!("purchase {}", entry.id), *expected, actual));
                }
            }
            LedgerWrite::DeletePurchase {
                owner,
                id,
                expected,
            } => {
                let result = sqlx::query(
                    "DELETE FROM purchases WHERE id = $1 AND owner_id = $2 AND version = $3",
                )
                .bind(id.as_uuid())
                .bind(owner.as_uuid())
                .bind(expected.as_i64())
                .execute(&mut *conn)
                .await?;

                if result.rows_affected() == 0 {
                    let actual = entry_version(conn, "purchases", *owner, *id).await?;
                    return Err(conflict(format!("purchase {id}"), *expected, actual));
                }
            }
            LedgerWrite::InsertSale(entry) => {
                let sql = format!(
                    "INSERT INTO sales ({SALE_COLUMNS}) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
                );
                bind_sale(sqlx::query(&sql), entry)
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| insert_conflict(e, format!("sale {}", entry.id), entry.version))?;
            }
            LedgerWrite::ReplaceSale { entry, expected } => {
                let result = sqlx::query(
                    r#"
                    UPDATE sales SET
                        customer_name = $3, customer_number = $4, product_name = $5,
                        quantity = $6, price = $7, total_price = $8, entry_date = $9,
                        entry_time = $10, deleted = $11, deleted_at = $12, created_at = $13,
                        updated_at = $14, version = $15
                    WHERE id = $1 AND owner_id = $2 AND version = $16
                    "#,
                )
                .bind(entry.id.as_uuid())
                .bind(entry.owner.as_uuid())
                .bind(&entry.customer.name)
                .bind(&entry.customer.number)
                .bind(entry.product_name.as_str())
                .bind(entry.quantity)
                .bind(entry.price)
                .bind(entry.total_price)
                .bind(entry.date)
                .bind(entry.time)
                .bind(entry.deleted)
                .bind(entry.deleted_at)
                .bind(entry.created_at)
                .bind(entry.updated_at)
                .bind(entry.version.as_i64())
                .bind(expected.as_i64())
                .execute(&mut *conn)
                .await?;

                if result.rows_affected() == 0 {
                    let actual = entry_version(conn, "sales", entry.owner, entry.id).await?;
                    return Err(conflict(format!("sale {}", entry.id), *expected, actual));
                }
            }
            LedgerWrite::DeleteSale {
                owner,
                id,
                expected,
            } => {
                let result =
                    sqlx::query("DELETE FROM sales WHERE id = $1 AND owner_id = $2 AND version = $3")
                        .bind(id.as_uuid())
                        .bind(owner.as_uuid())
                        .bind(expected.as_i64())
                        .execute(&mut *conn)
                        .await?;

                if result.rows_affected() == 0 {
                    let actual = entry_version(conn, "sales", *owner, *id).await?;
                    return Err(conflict(format!("sale {id}"), *expected, actual));
                }
            }
            LedgerWrite::InsertNotification(notification) => {
                sqlx::query(
                    r#"
                    INSERT INTO notifications (id, owner_id, message, read, created_at)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(notification.id)
                .bind(notification.owner.as_uuid())
                .bind(&notification.message)
                .bind(notification.read)
                .bind(notification.created_at)
                .execute(&mut *conn)
                .await?;
            }
        }
        Ok(())
    }

    async fn write_stock(conn: &mut PgConnection, write: &StockWrite) -> Result<()> {
        let row = &write.row;
        let key = row.key();

        match write.expected {
            ExpectedVersion::New => {
                let sql = format!(
                    "INSERT INTO stock ({STOCK_COLUMNS}) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
                );
                sqlx::query(&sql)
                    .bind(row.owner.as_uuid())
                    .bind(row.product_name.as_str())
                    .bind(&row.supplier_company)
                    .bind(row.quantity)
                    .bind(row.unit_price)
                    .bind(row.total_value)
                    .bind(row.low_stock_threshold)
                    .bind(row.last_updated)
                    .bind(row.created_at)
                    .bind(row.version.as_i64())
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| insert_conflict(e, key.to_string(), Version::initial()))?;
            }
            ExpectedVersion::Exact(expected) => {
                let result = sqlx::query(
                    r#"
                    UPDATE stock SET
                        supplier_company = $3, quantity = $4, unit_price = $5, total_value = $6,
                        low_stock_threshold = $7, last_updated = $8, version = $9
                    WHERE owner_id = $1 AND product_name = $2 AND version = $10
                    "#,
                )
                .bind(row.owner.as_uuid())
                .bind(row.product_name.as_str())
                .bind(&row.supplier_company)
                .bind(row.quantity)
                .bind(row.unit_price)
                .bind(row.total_value)
                .bind(row.low_stock_threshold)
                .bind(row.last_updated)
                .bind(row.version.as_i64())
                .bind(expected.as_i64())
                .execute(&mut *conn)
                .await?;

                if result.rows_affected() == 0 {
                    let actual: Option<i64> = sqlx::query_scalar(
                        "SELECT version FROM stock WHERE owner_id = $1 AND product_name = $2",
                    )
                    .bind(row.owner.as_uuid())
                    .bind(row.product_name.as_str())
                    .fetch_optional(&mut *conn)
                    .await?;
                    return Err(conflict(
                        key.to_string(),
                        expected,
                        actual.map(Version::new).unwrap_or(Version::initial()),
                    ));
                }
            }
        }

        // The log is append-only: only entries past the stored tail are written.
        let stored: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM stock_price_history WHERE owner_id = $1 AND product_name = $2",
        )
        .bind(row.owner.as_uuid())
        .bind(row.product_name.as_str())
        .fetch_one(&mut *conn)
        .await?;

        for entry in row.price_history.iter().skip(stored as usize) {
            sqlx::query(
                r#"
                INSERT INTO stock_price_history
                    (owner_id, product_name, seq, recorded_at, price, kind, reference_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(row.owner.as_uuid())
            .bind(row.product_name.as_str())
            .bind(entry.seq as i32)
            .bind(entry.date)
            .bind(entry.price)
            .bind(entry.kind.as_str())
            .bind(entry.reference_id.map(|id| id.as_uuid()))
            .execute(&mut *conn)
            .await
            .map_err(|e| insert_conflict(e, key.to_string(), write.expected.as_version()))?;
        }

        Ok(())
    }

    /// Opens a read-only transaction that sees one snapshot for all its queries.
    async fn begin_snapshot(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    async fn load_history(
        conn: &mut PgConnection,
        owner: OwnerId,
        product_name: Option<&ProductName>,
    ) -> Result<HashMap<String, Vec<PriceHistoryEntry>>> {
        let rows = sqlx::query(
            r#"
            SELECT product_name, seq, recorded_at, price, kind, reference_id
            FROM stock_price_history
            WHERE owner_id = $1 AND ($2::varchar IS NULL OR product_name = $2)
            ORDER BY product_name ASC, seq ASC
            "#,
        )
        .bind(owner.as_uuid())
        .bind(product_name.map(|p| p.as_str()))
        .fetch_all(&mut *conn)
        .await?;

        let mut history: HashMap<String, Vec<PriceHistoryEntry>> = HashMap::new();
        for row in &rows {
            let product: String = row.try_get("product_name")?;
            history
                .entry(product)
                .or_default()
                .push(Self::row_to_history(row)?);
        }
        Ok(history)
    }
}

fn bind_purchase<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    entry: &'q PurchaseEntry,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(entry.id.as_uuid())
        .bind(entry.owner.as_uuid())
        .bind(&entry.supplier.name)
        .bind(&entry.supplier.location)
        .bind(&entry.supplier.company)
        .bind(entry.product_name.as_str())
        .bind(entry.quantity)
        .bind(entry.unit_price)
        .bind(entry.date)
        .bind(entry.time)
        .bind(&entry.notes)
        .bind(entry.deleted)
        .bind(entry.deleted_at)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .bind(entry.version.as_i64())
}

fn bind_sale<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    entry: &'q SaleEntry,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(entry.id.as_uuid())
        .bind(entry.owner.as_uuid())
        .bind(&entry.customer.name)
        .bind(&entry.customer.number)
        .bind(entry.product_name.as_str())
        .bind(entry.quantity)
        .bind(entry.price)
        .bind(entry.total_price)
        .bind(entry.date)
        .bind(entry.time)
        .bind(entry.deleted)
        .bind(entry.deleted_at)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .bind(entry.version.as_i64())
}

fn decode_product_name(raw: String) -> Result<ProductName> {
    ProductName::parse(raw).map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))
}

fn conflict(resource: String, expected: Version, actual: Version) -> StoreError {
    StoreError::ConcurrencyConflict {
        resource,
        expected,
        actual,
    }
}

/// Maps a unique violation on insert to a concurrency conflict.
fn insert_conflict(err: sqlx::Error, resource: String, attempted: Version) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return conflict(resource, Version::initial(), attempted);
    }
    StoreError::Database(err)
}

async fn entry_version(
    conn: &mut PgConnection,
    table: &str,
    owner: OwnerId,
    id: EntryId,
) -> Result<Version> {
    let sql = format!("SELECT version FROM {table} WHERE id = $1 AND owner_id = $2");
    let version: Option<i64> = sqlx::query_scalar(&sql)
        .bind(id.as_uuid())
        .bind(owner.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;
    Ok(version.map(Version::new).unwrap_or(Version::initial()))
}

/// Builds the filtered, newest-first listing query for a ledger table.
fn ledger_listing_sql(table: &str, columns: &str, query: &LedgerQuery) -> String {
    let mut sql = format!("SELECT {columns} FROM {table} WHERE owner_id = $1");
    let mut param_count = 1;

    if !query.include_deleted {
        sql.push_str(" AND NOT deleted");
    }
    if query.product_name.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND product_name = ${param_count}"));
    }

    sql.push_str(" ORDER BY entry_date DESC, entry_time DESC, created_at DESC, id DESC");

    if query.limit.is_some() {
        param_count += 1;
        sql.push_str(&format!(" LIMIT ${param_count}"));
    }
    if query.offset.is_some() {
        param_count += 1;
        sql.push_str(&format!(" OFFSET ${param_count}"));
    }
    sql
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    async fn commit(&self, unit: UnitOfWork) -> Result<()> {
        validate_unit_of_work(&unit)?;

        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.pool.begin().await?;

        for write in &unit.ledger {
            Self::write_ledger(&mut tx, write).await?;
        }
        for write in &unit.stock {
            Self::write_stock(&mut tx, write).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_stock(
        &self,
        owner: OwnerId,
        product_name: &ProductName,
    ) -> Result<Option<StockRow>> {
        let sql = format!(
            "SELECT {STOCK_COLUMNS} FROM stock WHERE owner_id = $1 AND product_name = $2"
        );
        // Row and history must come from the same snapshot.
        let mut tx = self.begin_snapshot().await?;
        let row: Option<PgRow> = sqlx::query(&sql)
            .bind(owner.as_uuid())
            .bind(product_name.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let stock = match row {
            Some(row) => {
                let mut history = Self::load_history(&mut tx, owner, Some(product_name)).await?;
                let entries = history.remove(product_name.as_str()).unwrap_or_default();
                Some(Self::row_to_stock(&row, entries)?)
            }
            None => None,
        };
        tx.commit().await?;
        Ok(stock)
    }

    async fn list_stock(&self, owner: OwnerId) -> Result<Vec<StockRow>> {
        let sql = format!(
            "SELECT {STOCK_COLUMNS} FROM stock WHERE owner_id = $1 ORDER BY product_name ASC"
        );
        let mut tx = self.begin_snapshot().await?;
        let rows = sqlx::query(&sql)
            .bind(owner.as_uuid())
            .fetch_all(&mut *tx)
            .await?;
        let mut history = Self::load_history(&mut tx, owner, None).await?;
        tx.commit().await?;

        rows.iter()
            .map(|row| {
                let product: String = row.try_get("product_name")?;
                let entries = history.remove(&product).unwrap_or_default();
                Self::row_to_stock(row, entries)
            })
            .collect()
    }

    async fn get_purchase(&self, owner: OwnerId, id: EntryId) -> Result<Option<PurchaseEntry>> {
        let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = $1 AND owner_id = $2");
        let row: Option<PgRow> = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(owner.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_purchase).transpose()
    }

    async fn list_purchases(
        &self,
        owner: OwnerId,
        query: LedgerQuery,
    ) -> Result<Vec<PurchaseEntry>> {
        let sql = ledger_listing_sql("purchases", PURCHASE_COLUMNS, &query);

        let mut sqlx_query = sqlx::query(&sql).bind(owner.as_uuid());
        if let Some(ref product_name) = query.product_name {
            sqlx_query = sqlx_query.bind(product_name.as_str());
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_purchase).collect()
    }

    async fn get_sale(&self, owner: OwnerId, id: EntryId) -> Result<Option<SaleEntry>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = $1 AND owner_id = $2");
        let row: Option<PgRow> = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(owner.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_sale).transpose()
    }

    async fn list_sales(&self, owner: OwnerId, query: LedgerQuery) -> Result<Vec<SaleEntry>> {
        let sql = ledger_listing_sql("sales", SALE_COLUMNS, &query);

        let mut sqlx_query = sqlx::query(&sql).bind(owner.as_uuid());
        if let Some(ref product_name) = query.product_name {
            sqlx_query = sqlx_query.bind(product_name.as_str());
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_sale).collect()
    }

    async fn purge_purchases(&self, owner: Option<OwnerId>, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM purchases
            WHERE deleted AND deleted_at <= $1 AND ($2::uuid IS NULL OR owner_id = $2)
            "#,
        )
        .bind(cutoff)
        .bind(owner.map(|o| o.as_uuid()))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn purge_sales(&self, owner: Option<OwnerId>, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM sales
            WHERE deleted AND deleted_at <= $1 AND ($2::uuid IS NULL OR owner_id = $2)
            "#,
        )
        .bind(cutoff)
        .bind(owner.map(|o| o.as_uuid()))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn unread_notifications(&self, owner: OwnerId) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE owner_id = $1 AND NOT read")
                .bind(owner.as_uuid())
                .fetch_one(&self.pool)
                .await?;

        Ok(count as u64)
    }
}
