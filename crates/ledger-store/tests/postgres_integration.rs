//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency. Every test
//! truncates the tables, so they are serialized.
//! Run with:
//!
//! ```bash
//! cargo test -p ledger-store --test postgres_integration
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use ledger_store::{
    CustomerInfo, EntryId, ExpectedVersion, InventoryStore, InventoryStoreExt, LedgerQuery,
    LedgerWrite, Notification, OwnerId, PostgresInventoryStore, PriceChangeKind,
    PriceHistoryEntry, ProductName, PurchaseEntry, SaleEntry, StockRow, StockWrite, StoreError,
    SupplierInfo, UnitOfWork, Version,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresInventoryStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresInventoryStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query(
        "TRUNCATE TABLE purchases, sales, stock_price_history, stock, notifications CASCADE",
    )
    .execute(&pool)
    .await
    .unwrap();

    PostgresInventoryStore::new(pool)
}

fn product(name: &str) -> ProductName {
    ProductName::parse(name).unwrap()
}

fn create_test_purchase(owner: OwnerId, name: &str) -> PurchaseEntry {
    let now = Utc::now();
    PurchaseEntry {
        id: EntryId::new(),
        owner,
        supplier: SupplierInfo {
            name: "Esi".to_string(),
            location: "Tema".to_string(),
            company: Some("Tema Hardware".to_string()),
        },
        product_name: product(name),
        quantity: dec!(10),
        unit_price: dec!(5.00),
        date: now.date_naive(),
        time: now.time(),
        notes: Some("first delivery".to_string()),
        deleted: false,
        deleted_at: None,
        created_at: now,
        updated_at: now,
        version: Version::first(),
    }
}

fn create_test_sale(owner: OwnerId, name: &str) -> SaleEntry {
    let now = Utc::now();
    SaleEntry {
        id: EntryId::new(),
        owner,
        customer: CustomerInfo {
            name: "Kwame".to_string(),
            number: "0201234567".to_string(),
        },
        product_name: product(name),
        quantity: dec!(5),
        price: dec!(9.50),
        total_price: dec!(47.50),
        date: now.date_naive(),
        time: now.time(),
        deleted: false,
        deleted_at: None,
        created_at: now,
        updated_at: now,
        version: Version::first(),
    }
}

fn create_test_row(
    owner: OwnerId,
    name: &str,
    quantity: Decimal,
    unit_price: Decimal,
    version: Version,
    history_len: u32,
) -> StockRow {
    let now = Utc::now();
    StockRow {
        owner,
        product_name: product(name),
        supplier_company: "Tema Hardware".to_string(),
        quantity,
        unit_price,
        total_value: quantity * unit_price,
        low_stock_threshold: dec!(10),
        last_updated: now,
        created_at: now,
        price_history: (0..history_len)
            .map(|seq| PriceHistoryEntry {
                seq,
                date: now,
                price: unit_price,
                kind: if seq == 0 {
                    PriceChangeKind::Purchase
                } else {
                    PriceChangeKind::Sale
                },
                reference_id: None,
            })
            .collect(),
        version,
    }
}

async fn seed(store: &PostgresInventoryStore, owner: OwnerId, name: &str) -> PurchaseEntry {
    let purchase = create_test_purchase(owner, name);
    store
        .commit(
            UnitOfWork::new()
                .with_ledger(LedgerWrite::InsertPurchase(purchase.clone()))
                .with_stock(StockWrite {
                    row: create_test_row(owner, name, dec!(10), dec!(5.00), Version::first(), 1),
                    expected: ExpectedVersion::New,
                }),
        )
        .await
        .unwrap();
    purchase
}

#[tokio::test]
#[serial]
async fn commit_and_read_back_purchase_and_stock() {
    let store = get_test_store().await;
    let owner = OwnerId::new();
    let purchase = seed(&store, owner, "Cement").await;

    let stored = store.get_purchase(owner, purchase.id).await.unwrap().unwrap();
    assert_eq!(stored.id, purchase.id);
    assert_eq!(stored.quantity, dec!(10));
    assert_eq!(stored.supplier, purchase.supplier);
    assert_eq!(stored.notes.as_deref(), Some("first delivery"));

    let row = store.get_stock(owner, &product("Cement")).await.unwrap().unwrap();
    assert_eq!(row.quantity, dec!(10));
    assert_eq!(row.total_value, dec!(50));
    assert_eq!(row.version, Version::first());
    assert_eq!(row.price_history.len(), 1);
    assert_eq!(row.price_history[0].kind, PriceChangeKind::Purchase);
}

#[tokio::test]
#[serial]
async fn stock_update_appends_history() {
    let store = get_test_store().await;
    let owner = OwnerId::new();
    seed(&store, owner, "Cement").await;

    let sale = create_test_sale(owner, "Cement");
    store
        .commit(
            UnitOfWork::new()
                .with_ledger(LedgerWrite::InsertSale(sale.clone()))
                .with_stock(StockWrite {
                    row: create_test_row(owner, "Cement", dec!(5), dec!(4.75), Version::new(2), 2),
                    expected: ExpectedVersion::Exact(Version::first()),
                }),
        )
        .await
        .unwrap();

    let row = store.get_stock(owner, &product("Cement")).await.unwrap().unwrap();
    assert_eq!(row.quantity, dec!(5));
    assert_eq!(row.unit_price, dec!(4.75));
    assert_eq!(row.version, Version::new(2));
    let seqs: Vec<_> = row.price_history.iter().map(|h| h.seq).collect();
    assert_eq!(seqs, vec![0, 1]);

    let stored = store.get_sale(owner, sale.id).await.unwrap().unwrap();
    assert_eq!(stored.total_price, dec!(47.50));
}

#[tokio::test]
#[serial]
async fn stale_stock_version_conflicts_and_rolls_back() {
    let store = get_test_store().await;
    let owner = OwnerId::new();
    seed(&store, owner, "Cement").await;

    let sale = create_test_sale(owner, "Cement");
    let result = store
        .commit(
            UnitOfWork::new()
                .with_ledger(LedgerWrite::InsertSale(sale.clone()))
                .with_stock(StockWrite {
                    row: create_test_row(owner, "Cement", dec!(5), dec!(4.75), Version::new(3), 2),
                    expected: ExpectedVersion::Exact(Version::new(2)),
                }),
        )
        .await;

    assert!(matches!(
        result,
        Err(StoreError::ConcurrencyConflict { expected, actual, .. })
            if expected == Version::new(2) && actual == Version::first()
    ));
    // The sale insert ran first in the transaction and must be gone.
    assert!(store.get_sale(owner, sale.id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn duplicate_stock_insert_conflicts() {
    let store = get_test_store().await;
    let owner = OwnerId::new();
    seed(&store, owner, "Cement").await;

    let result = store
        .commit(UnitOfWork::new().with_stock(StockWrite {
            row: create_test_row(owner, "Cement", dec!(1), dec!(1), Version::first(), 1),
            expected: ExpectedVersion::New,
        }))
        .await;

    assert!(result.unwrap_err().is_conflict());
}

#[tokio::test]
#[serial]
async fn replace_and_delete_check_entry_versions() {
    let store = get_test_store().await;
    let owner = OwnerId::new();
    let purchase = seed(&store, owner, "Cement").await;

    let deleted = purchase.soft_deleted(Utc::now());
    store
        .commit(UnitOfWork::new().with_ledger(LedgerWrite::ReplacePurchase {
            entry: deleted.clone(),
            expected: Version::first(),
        }))
        .await
        .unwrap();

    let stale = store
        .commit(UnitOfWork::new().with_ledger(LedgerWrite::DeletePurchase {
            owner,
            id: purchase.id,
            expected: Version::first(),
        }))
        .await;
    assert!(stale.unwrap_err().is_conflict());

    store
        .commit(UnitOfWork::new().with_ledger(LedgerWrite::DeletePurchase {
            owner,
            id: purchase.id,
            expected: deleted.version,
        }))
        .await
        .unwrap();
    assert!(store.get_purchase(owner, purchase.id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn reads_are_owner_scoped() {
    let store = get_test_store().await;
    let alice = OwnerId::new();
    let bob = OwnerId::new();
    let purchase = seed(&store, alice, "Cement").await;

    assert!(store.get_purchase(bob, purchase.id).await.unwrap().is_none());
    assert!(!store.stock_exists(bob, &product("Cement")).await.unwrap());
    assert!(store.list_stock(bob).await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn list_purchases_filters_and_paginates() {
    let store = get_test_store().await;
    let owner = OwnerId::new();
    seed(&store, owner, "Cement").await;
    seed(&store, owner, "Rebar").await;
    let deleted = create_test_purchase(owner, "Cement");
    store
        .commit(UnitOfWork::new().with_ledger(LedgerWrite::InsertPurchase(PurchaseEntry {
            deleted: true,
            deleted_at: Some(Utc::now()),
            ..deleted
        })))
        .await
        .unwrap();

    let active = store
        .list_purchases(owner, LedgerQuery::new())
        .await
        .unwrap();
    assert_eq!(active.len(), 2);

    let cement_history = store
        .list_purchases(owner, LedgerQuery::history().product(product("Cement")))
        .await
        .unwrap();
    assert_eq!(cement_history.len(), 2);

    let page = store
        .list_purchases(owner, LedgerQuery::history().limit(1).offset(1))
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
}

#[tokio::test]
#[serial]
async fn list_stock_orders_by_product_name_with_history() {
    let store = get_test_store().await;
    let owner = OwnerId::new();
    seed(&store, owner, "Rebar").await;
    seed(&store, owner, "Cement").await;

    let rows = store.list_stock(owner).await.unwrap();
    let names: Vec<_> = rows.iter().map(|r| r.product_name.as_str()).collect();
    assert_eq!(names, vec!["Cement", "Rebar"]);
    assert!(rows.iter().all(|r| r.price_history.len() == 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn stock_reads_see_row_and_history_from_one_commit() {
    let store = get_test_store().await;
    let owner = OwnerId::new();
    seed(&store, owner, "Gravel").await;

    // Every commit bumps the version and appends one history entry.
    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for version in 2..=30u32 {
                store
                    .commit(UnitOfWork::new().with_stock(StockWrite {
                        row: create_test_row(
                            owner,
                            "Gravel",
                            dec!(10),
                            dec!(5.00),
                            Version::new(version as i64),
                            version,
                        ),
                        expected: ExpectedVersion::Exact(Version::new(version as i64 - 1)),
                    }))
                    .await
                    .unwrap();
            }
        })
    };

    while !writer.is_finished() {
        let row = store.get_stock(owner, &product("Gravel")).await.unwrap().unwrap();
        assert_eq!(row.price_history.len() as i64, row.version.as_i64());

        let rows = store.list_stock(owner).await.unwrap();
        assert_eq!(rows[0].price_history.len() as i64, rows[0].version.as_i64());
    }
    writer.await.unwrap();

    let row = store.get_stock(owner, &product("Gravel")).await.unwrap().unwrap();
    assert_eq!(row.version, Version::new(30));
    assert_eq!(row.price_history.len(), 30);
}

#[tokio::test]
#[serial]
async fn purge_respects_cutoff_and_owner() {
    let store = get_test_store().await;
    let alice = OwnerId::new();
    let bob = OwnerId::new();
    let now = Utc::now();

    for owner in [alice, bob] {
        let sale = SaleEntry {
            deleted: true,
            deleted_at: Some(now - Duration::days(4)),
            ..create_test_sale(owner, "Cement")
        };
        store
            .commit(UnitOfWork::new().with_ledger(LedgerWrite::InsertSale(sale)))
            .await
            .unwrap();
    }
    let recent = SaleEntry {
        deleted: true,
        deleted_at: Some(now - Duration::days(1)),
        ..create_test_sale(alice, "Cement")
    };
    store
        .commit(UnitOfWork::new().with_ledger(LedgerWrite::InsertSale(recent.clone())))
        .await
        .unwrap();

    let cutoff = now - Duration::days(3);
    assert_eq!(store.purge_sales(Some(alice), cutoff).await.unwrap(), 1);
    assert_eq!(store.purge_sales(None, cutoff).await.unwrap(), 1);
    assert!(store.get_sale(alice, recent.id).await.unwrap().is_some());
}

#[tokio::test]
#[serial]
async fn notifications_are_counted_unread() {
    let store = get_test_store().await;
    let owner = OwnerId::new();

    store
        .commit(
            UnitOfWork::new()
                .with_ledger(LedgerWrite::InsertNotification(Notification::unread(
                    owner,
                    "Sale recorded for Cement (5 @ 9.50)",
                    Utc::now(),
                )))
                .with_ledger(LedgerWrite::InsertNotification(Notification::unread(
                    owner,
                    "Sale recorded for Rebar (1 @ 3.00)",
                    Utc::now(),
                ))),
        )
        .await
        .unwrap();

    assert_eq!(store.unread_notifications(owner).await.unwrap(), 2);
    assert_eq!(store.unread_notifications(OwnerId::new()).await.unwrap(), 0);
}
