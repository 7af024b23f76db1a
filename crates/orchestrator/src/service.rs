//! Inventory use-cases.
//!
//! Every mutating operation follows the same shape: read the entry and the
//! stock rows it touches, stage the stock changes in a [`StockWorkset`], then
//! commit ledger and stock writes as one [`UnitOfWork`]. The store rejects the
//! unit if any row moved since it was read, in which case the whole attempt
//! is repeated from a fresh read.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use common::{Clock, EntryId, OwnerId, ProductName, SystemClock};
use domain::{ReversibleEffect, StockError, StockLevel, StockWorkset, replace_effect};
use ledger_store::{
    InventoryStore, LedgerQuery, LedgerWrite, Notification, PurchaseEntry, SaleEntry, StockRow,
    StoreError, UnitOfWork, Version,
};
use serde::{Deserialize, Serialize};

use crate::commands::{
    CreatePurchase, CreateSale, UpdatePurchase, UpdateSale, line_total, parse_product_name,
    require_positive, require_present,
};
use crate::config::ServiceConfig;
use crate::error::{InventoryError, Result};
use crate::notifier::{SaleNotification, SaleNotifier};

/// A committed ledger entry together with the stock rows the commit wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recorded<E> {
    pub entry: E,
    pub stock: Vec<StockRow>,
}

impl<E> Recorded<E> {
    /// Returns the written row for a product.
    pub fn stock_for(&self, product_name: &ProductName) -> Option<&StockRow> {
        self.stock.iter().find(|row| &row.product_name == product_name)
    }
}

/// Outcome of a retention sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub purchases_removed: u64,
    pub sales_removed: u64,
}

impl SweepReport {
    pub fn total(&self) -> u64 {
        self.purchases_removed + self.sales_removed
    }
}

/// Why a single attempt ended.
enum AttemptError {
    /// Another writer committed first; the attempt may be repeated.
    Conflict(StoreError),
    Failed(InventoryError),
}

impl From<StoreError> for AttemptError {
    fn from(err: StoreError) -> Self {
        if err.is_conflict() {
            AttemptError::Conflict(err)
        } else {
            AttemptError::Failed(err.into())
        }
    }
}

impl From<StockError> for AttemptError {
    fn from(err: StockError) -> Self {
        AttemptError::Failed(err.into())
    }
}

impl From<InventoryError> for AttemptError {
    fn from(err: InventoryError) -> Self {
        AttemptError::Failed(err)
    }
}

type AttemptResult<T> = std::result::Result<T, AttemptError>;

/// Purchase and sale use-cases over a ledger store.
pub struct InventoryService<S, N, C = SystemClock> {
    store: S,
    notifier: Arc<N>,
    clock: C,
    config: ServiceConfig,
}

impl<S, N> InventoryService<S, N>
where
    S: InventoryStore,
    N: SaleNotifier,
{
    /// Creates a service on the system clock with default configuration.
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            store,
            notifier: Arc::new(notifier),
            clock: SystemClock,
            config: ServiceConfig::default(),
        }
    }
}

impl<S, N, C> InventoryService<S, N, C>
where
    S: InventoryStore,
    N: SaleNotifier,
    C: Clock,
{
    /// Replaces the clock grace periods and timestamps are read from.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> InventoryService<S, N, C2> {
        InventoryService {
            store: self.store,
            notifier: self.notifier,
            clock,
            config: self.config,
        }
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Records a purchase and adds it to the product's stock.
    #[tracing::instrument(skip(self, cmd), fields(product = %cmd.product_name))]
    pub async fn create_purchase(
        &self,
        owner: OwnerId,
        cmd: CreatePurchase,
    ) -> Result<Recorded<PurchaseEntry>> {
        let purchase = self.new_purchase(owner, cmd)?;
        let purchase = &purchase;

        let stock = self
            .with_retry("create_purchase", move || self.try_create_purchase(purchase))
            .await?;

        tracing::info!(
            entry_id = %purchase.id,
            quantity = %purchase.quantity,
            unit_price = %purchase.unit_price,
            "purchase recorded"
        );
        Ok(Recorded {
            entry: purchase.clone(),
            stock,
        })
    }

    async fn try_create_purchase(&self, purchase: &PurchaseEntry) -> AttemptResult<Vec<StockRow>> {
        let at = self.clock.now();
        let mut workset =
            StockWorkset::load(&self.store, purchase.owner, [purchase.product_name.clone()])
                .await?;
        purchase.apply(&mut workset, at)?;

        let unit = UnitOfWork::new().with_ledger(LedgerWrite::InsertPurchase(purchase.clone()));
        self.commit_with_stock(unit, workset).await
    }

    /// Edits a purchase, moving its stock effect from the old values to the new.
    #[tracing::instrument(skip(self, cmd))]
    pub async fn update_purchase(
        &self,
        owner: OwnerId,
        id: EntryId,
        cmd: UpdatePurchase,
    ) -> Result<Recorded<PurchaseEntry>> {
        let cmd = &cmd;
        self.with_retry("update_purchase", move || {
            self.try_update_purchase(owner, id, cmd)
        })
        .await
    }

    async fn try_update_purchase(
        &self,
        owner: OwnerId,
        id: EntryId,
        cmd: &UpdatePurchase,
    ) -> AttemptResult<Recorded<PurchaseEntry>> {
        let at = self.clock.now();
        let current = self.load_purchase(owner, id).await?;
        if current.deleted {
            return Err(deleted_entry("purchase", id).into());
        }
        let updated = patch_purchase(&current, cmd, at)?;

        let mut workset = StockWorkset::load(
            &self.store,
            owner,
            [current.product_name.clone(), updated.product_name.clone()],
        )
        .await?;
        replace_effect(&mut workset, &current, &updated, at)?;

        let unit = UnitOfWork::new().with_ledger(LedgerWrite::ReplacePurchase {
            entry: updated.clone(),
            expected: current.version,
        });
        let stock = self.commit_with_stock(unit, workset).await?;
        Ok(Recorded {
            entry: updated,
            stock,
        })
    }

    /// Flags a purchase as deleted. Stock is left as it is.
    #[tracing::instrument(skip(self))]
    pub async fn soft_delete_purchase(&self, owner: OwnerId, id: EntryId) -> Result<PurchaseEntry> {
        self.with_retry("soft_delete_purchase", move || {
            self.try_soft_delete_purchase(owner, id)
        })
        .await
    }

    async fn try_soft_delete_purchase(
        &self,
        owner: OwnerId,
        id: EntryId,
    ) -> AttemptResult<PurchaseEntry> {
        let current = self.load_purchase(owner, id).await?;
        if current.deleted {
            return Err(already_deleted("purchase", id).into());
        }
        let deleted = current.soft_deleted(self.clock.now());
        self.store
            .commit(UnitOfWork::new().with_ledger(LedgerWrite::ReplacePurchase {
                entry: deleted.clone(),
                expected: current.version,
            }))
            .await?;
        Ok(deleted)
    }

    /// Removes a soft-deleted purchase whose grace period has elapsed and
    /// takes its quantity back out of stock.
    #[tracing::instrument(skip(self))]
    pub async fn hard_delete_purchase(
        &self,
        owner: OwnerId,
        id: EntryId,
    ) -> Result<Recorded<PurchaseEntry>> {
        self.with_retry("hard_delete_purchase", move || {
            self.try_hard_delete_purchase(owner, id)
        })
        .await
    }

    async fn try_hard_delete_purchase(
        &self,
        owner: OwnerId,
        id: EntryId,
    ) -> AttemptResult<Recorded<PurchaseEntry>> {
        let at = self.clock.now();
        let current = self.load_purchase(owner, id).await?;
        self.check_purge_allowed("purchase", id, current.deleted_at, at)?;

        let mut workset =
            StockWorkset::load(&self.store, owner, [current.product_name.clone()]).await?;
        current.reverse(&mut workset, at)?;

        let unit = UnitOfWork::new().with_ledger(LedgerWrite::DeletePurchase {
            owner,
            id,
            expected: current.version,
        });
        let stock = self.commit_with_stock(unit, workset).await?;
        Ok(Recorded {
            entry: current,
            stock,
        })
    }

    pub async fn get_purchase(&self, owner: OwnerId, id: EntryId) -> Result<PurchaseEntry> {
        self.store
            .get_purchase(owner, id)
            .await?
            .ok_or_else(|| not_found("purchase", id))
    }

    /// Lists purchases, newest first.
    pub async fn list_purchases(
        &self,
        owner: OwnerId,
        query: LedgerQuery,
    ) -> Result<Vec<PurchaseEntry>> {
        Ok(self.store.list_purchases(owner, query).await?)
    }

    async fn load_purchase(&self, owner: OwnerId, id: EntryId) -> AttemptResult<PurchaseEntry> {
        self.store
            .get_purchase(owner, id)
            .await?
            .ok_or_else(|| not_found("purchase", id).into())
    }

    fn new_purchase(&self, owner: OwnerId, cmd: CreatePurchase) -> Result<PurchaseEntry> {
        let product_name = parse_product_name(&cmd.product_name)?;
        require_present("supplier name", &cmd.supplier.name)?;
        let quantity = require_positive("quantity", cmd.quantity)?;
        let unit_price = require_positive("unit price", cmd.unit_price)?;
        line_total(quantity, unit_price)?;

        let now = self.clock.now();
        Ok(PurchaseEntry {
            id: EntryId::new(),
            owner,
            supplier: cmd.supplier,
            product_name,
            quantity,
            unit_price,
            date: cmd.date.unwrap_or_else(|| now.date_naive()),
            time: cmd.time.unwrap_or_else(|| now.time()),
            notes: cmd.notes,
            deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            version: Version::first(),
        })
    }

    /// Records a sale, takes it out of stock and notifies the owner.
    ///
    /// The notification runs after the commit on its own task. Its failure
    /// is logged and counted but never fails the sale.
    #[tracing::instrument(skip(self, cmd), fields(product = %cmd.product_name))]
    pub async fn create_sale(&self, owner: OwnerId, cmd: CreateSale) -> Result<Recorded<SaleEntry>> {
        let notify_email = cmd.notify_email.clone();
        let sale = self.new_sale(owner, cmd)?;
        let notice = Notification::unread(
            owner,
            format!(
                "Sale recorded for {} ({} @ {})",
                sale.product_name, sale.quantity, sale.price
            ),
            sale.created_at,
        );
        let (sale_ref, notice) = (&sale, &notice);

        let stock = self
            .with_retry("create_sale", move || self.try_create_sale(sale_ref, notice))
            .await?;

        tracing::info!(
            entry_id = %sale.id,
            quantity = %sale.quantity,
            price = %sale.price,
            "sale recorded"
        );
        self.dispatch_notification(SaleNotification::for_sale(&sale, notify_email));

        Ok(Recorded { entry: sale, stock })
    }

    async fn try_create_sale(
        &self,
        sale: &SaleEntry,
        notice: &Notification,
    ) -> AttemptResult<Vec<StockRow>> {
        let at = self.clock.now();
        let mut workset =
            StockWorkset::load(&self.store, sale.owner, [sale.product_name.clone()]).await?;
        sale.apply(&mut workset, at)?;

        let unit = UnitOfWork::new()
            .with_ledger(LedgerWrite::InsertSale(sale.clone()))
            .with_ledger(LedgerWrite::InsertNotification(notice.clone()));
        self.commit_with_stock(unit, workset).await
    }

    fn dispatch_notification(&self, notification: SaleNotification) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            let owner = notification.owner;
            if let Err(err) = notifier.notify(notification).await {
                metrics::counter!("inventory_notification_failures_total").increment(1);
                tracing::warn!(%owner, error = %err, "sale notification failed");
            }
        });
    }

    /// Edits a sale. If the new values cannot be applied, stock is left
    /// exactly as it was before the call.
    #[tracing::instrument(skip(self, cmd))]
    pub async fn update_sale(
        &self,
        owner: OwnerId,
        id: EntryId,
        cmd: UpdateSale,
    ) -> Result<Recorded<SaleEntry>> {
        let cmd = &cmd;
        self.with_retry("update_sale", move || self.try_update_sale(owner, id, cmd))
            .await
    }

    async fn try_update_sale(
        &self,
        owner: OwnerId,
        id: EntryId,
        cmd: &UpdateSale,
    ) -> AttemptResult<Recorded<SaleEntry>> {
        let at = self.clock.now();
        let current = self.load_sale(owner, id).await?;
        if current.deleted {
            return Err(deleted_entry("sale", id).into());
        }
        let updated = patch_sale(&current, cmd, at)?;

        let mut workset = StockWorkset::load(
            &self.store,
            owner,
            [current.product_name.clone(), updated.product_name.clone()],
        )
        .await?;
        replace_effect(&mut workset, &current, &updated, at)?;

        let unit = UnitOfWork::new().with_ledger(LedgerWrite::ReplaceSale {
            entry: updated.clone(),
            expected: current.version,
        });
        let stock = self.commit_with_stock(unit, workset).await?;
        Ok(Recorded {
            entry: updated,
            stock,
        })
    }

    /// Flags a sale as deleted. Stock is left as it is.
    #[tracing::instrument(skip(self))]
    pub async fn soft_delete_sale(&self, owner: OwnerId, id: EntryId) -> Result<SaleEntry> {
        self.with_retry("soft_delete_sale", move || self.try_soft_delete_sale(owner, id))
            .await
    }

    async fn try_soft_delete_sale(&self, owner: OwnerId, id: EntryId) -> AttemptResult<SaleEntry> {
        let current = self.load_sale(owner, id).await?;
        if current.deleted {
            return Err(already_deleted("sale", id).into());
        }
        let deleted = current.soft_deleted(self.clock.now());
        self.store
            .commit(UnitOfWork::new().with_ledger(LedgerWrite::ReplaceSale {
                entry: deleted.clone(),
                expected: current.version,
            }))
            .await?;
        Ok(deleted)
    }

    /// Removes a soft-deleted sale whose grace period has elapsed and puts
    /// its quantity back into stock.
    #[tracing::instrument(skip(self))]
    pub async fn hard_delete_sale(&self, owner: OwnerId, id: EntryId) -> Result<Recorded<SaleEntry>> {
        self.with_retry("hard_delete_sale", move || self.try_hard_delete_sale(owner, id))
            .await
    }

    async fn try_hard_delete_sale(
        &self,
        owner: OwnerId,
        id: EntryId,
    ) -> AttemptResult<Recorded<SaleEntry>> {
        let at = self.clock.now();
        let current = self.load_sale(owner, id).await?;
        self.check_purge_allowed("sale", id, current.deleted_at, at)?;

        let mut workset =
            StockWorkset::load(&self.store, owner, [current.product_name.clone()]).await?;
        current.reverse(&mut workset, at)?;

        let unit = UnitOfWork::new().with_ledger(LedgerWrite::DeleteSale {
            owner,
            id,
            expected: current.version,
        });
        let stock = self.commit_with_stock(unit, workset).await?;
        Ok(Recorded {
            entry: current,
            stock,
        })
    }

    pub async fn get_sale(&self, owner: OwnerId, id: EntryId) -> Result<SaleEntry> {
        self.store
            .get_sale(owner, id)
            .await?
            .ok_or_else(|| not_found("sale", id))
    }

    /// Lists sales, newest first.
    pub async fn list_sales(&self, owner: OwnerId, query: LedgerQuery) -> Result<Vec<SaleEntry>> {
        Ok(self.store.list_sales(owner, query).await?)
    }

    async fn load_sale(&self, owner: OwnerId, id: EntryId) -> AttemptResult<SaleEntry> {
        self.store
            .get_sale(owner, id)
            .await?
            .ok_or_else(|| not_found("sale", id).into())
    }

    fn new_sale(&self, owner: OwnerId, cmd: CreateSale) -> Result<SaleEntry> {
        let product_name = parse_product_name(&cmd.product_name)?;
        require_present("customer name", &cmd.customer.name)?;
        let quantity = require_positive("quantity", cmd.quantity)?;
        let price = require_positive("price", cmd.price)?;
        let total_price = line_total(quantity, price)?;

        let now = self.clock.now();
        Ok(SaleEntry {
            id: EntryId::new(),
            owner,
            customer: cmd.customer,
            product_name,
            quantity,
            price,
            total_price,
            date: cmd.date.unwrap_or_else(|| now.date_naive()),
            time: cmd.time.unwrap_or_else(|| now.time()),
            deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            version: Version::first(),
        })
    }

    /// Returns the stock row for a product.
    pub async fn get_stock(&self, owner: OwnerId, product_name: &str) -> Result<StockRow> {
        let product_name = parse_product_name(product_name)?;
        self.store
            .get_stock(owner, &product_name)
            .await?
            .ok_or_else(|| InventoryError::NotFound(format!("stock for product '{product_name}'")))
    }

    /// Returns every stock row of an owner, ordered by product name.
    pub async fn list_stock(&self, owner: OwnerId) -> Result<Vec<StockRow>> {
        Ok(self.store.list_stock(owner).await?)
    }

    /// Returns the rows at or below their low-stock threshold.
    pub async fn low_stock(&self, owner: OwnerId) -> Result<Vec<StockRow>> {
        let rows = self.store.list_stock(owner).await?;
        Ok(rows.into_iter().filter(StockRow::is_low_stock).collect())
    }

    /// Overrides the level of several products in one commit.
    #[tracing::instrument(skip(self, levels), fields(count = levels.len()))]
    pub async fn bulk_upsert_stock(
        &self,
        owner: OwnerId,
        levels: Vec<StockLevel>,
    ) -> Result<Vec<StockRow>> {
        if levels.is_empty() {
            return Err(InventoryError::Validation(
                "at least one stock level is required".to_string(),
            ));
        }
        let levels = &levels;

        self.with_retry("bulk_upsert_stock", move || self.try_set_levels(owner, levels))
            .await
    }

    async fn try_set_levels(
        &self,
        owner: OwnerId,
        levels: &[StockLevel],
    ) -> AttemptResult<Vec<StockRow>> {
        let at = self.clock.now();
        let names = levels.iter().map(|level| level.product_name.clone());
        let mut workset = StockWorkset::load(&self.store, owner, names).await?;
        for level in levels {
            workset.set_level(level, at)?;
        }
        self.commit_with_stock(UnitOfWork::new(), workset).await
    }

    /// Counts the owner's unread notifications.
    pub async fn unread_notifications(&self, owner: OwnerId) -> Result<u64> {
        Ok(self.store.unread_notifications(owner).await?)
    }

    /// Removes entries soft-deleted longer than the grace period ago.
    ///
    /// Scoped to one owner when given, otherwise every owner. Stock rows are
    /// not touched.
    #[tracing::instrument(skip(self))]
    pub async fn sweep_retention(&self, owner: Option<OwnerId>) -> Result<SweepReport> {
        let report = self
            .with_retry("sweep_retention", move || self.try_sweep(owner))
            .await?;

        metrics::counter!("inventory_sweep_removed_total", "kind" => "purchase")
            .increment(report.purchases_removed);
        metrics::counter!("inventory_sweep_removed_total", "kind" => "sale")
            .increment(report.sales_removed);
        if report.total() > 0 {
            tracing::info!(
                purchases = report.purchases_removed,
                sales = report.sales_removed,
                "swept expired entries"
            );
        }
        Ok(report)
    }

    async fn try_sweep(&self, owner: Option<OwnerId>) -> AttemptResult<SweepReport> {
        let cutoff = self.clock.now() - self.config.grace_period;
        let purchases_removed = self.store.purge_purchases(owner, cutoff).await?;
        let sales_removed = self.store.purge_sales(owner, cutoff).await?;
        Ok(SweepReport {
            purchases_removed,
            sales_removed,
        })
    }

    fn check_purge_allowed(
        &self,
        kind: &str,
        id: EntryId,
        deleted_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> std::result::Result<(), InventoryError> {
        let Some(deleted_at) = deleted_at else {
            return Err(InventoryError::Policy(format!(
                "{kind} {id} must be soft-deleted before it can be removed"
            )));
        };
        if now - deleted_at < self.config.grace_period {
            return Err(InventoryError::Policy(format!(
                "{kind} {id} is still within its retention period"
            )));
        }
        Ok(())
    }

    async fn commit_with_stock(
        &self,
        unit: UnitOfWork,
        workset: StockWorkset,
    ) -> AttemptResult<Vec<StockRow>> {
        let writes = workset.into_writes();
        let stock = writes.iter().map(|write| write.row.clone()).collect();
        self.store.commit(unit.with_stock_writes(writes)).await?;
        Ok(stock)
    }

    /// Runs `attempt` until it commits, fails for a reason other than a
    /// version conflict, or `max_attempts` is reached.
    async fn with_retry<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AttemptResult<T>>,
    {
        let started = Instant::now();
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempts = 0;

        let result = loop {
            attempts += 1;
            match attempt().await {
                Ok(value) => break Ok(value),
                Err(AttemptError::Failed(err)) => break Err(err),
                Err(AttemptError::Conflict(err)) => {
                    metrics::counter!("inventory_commit_conflicts_total", "operation" => operation)
                        .increment(1);
                    if attempts >= max_attempts {
                        tracing::warn!(operation, attempts, error = %err, "giving up on conflicted commit");
                        break Err(InventoryError::Conflict { attempts });
                    }
                    tracing::debug!(operation, attempt = attempts, error = %err, "commit conflict, retrying");
                    tokio::time::sleep(self.config.backoff * attempts).await;
                }
            }
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(err) => err.kind().as_str(),
        };
        metrics::counter!("inventory_operations_total", "operation" => operation, "outcome" => outcome)
            .increment(1);
        metrics::histogram!("inventory_operation_duration_seconds", "operation" => operation)
            .record(started.elapsed().as_secs_f64());
        result
    }
}

fn not_found(kind: &str, id: EntryId) -> InventoryError {
    InventoryError::NotFound(format!("{kind} {id}"))
}

fn already_deleted(kind: &str, id: EntryId) -> InventoryError {
    InventoryError::Policy(format!("{kind} {id} is already deleted"))
}

fn deleted_entry(kind: &str, id: EntryId) -> InventoryError {
    InventoryError::Policy(format!("{kind} {id} is deleted and cannot be edited"))
}

fn patch_purchase(
    current: &PurchaseEntry,
    cmd: &UpdatePurchase,
    at: DateTime<Utc>,
) -> Result<PurchaseEntry> {
    let mut next = current.clone();
    if let Some(supplier) = &cmd.supplier {
        require_present("supplier name", &supplier.name)?;
        next.supplier = supplier.clone();
    }
    if let Some(product_name) = &cmd.product_name {
        next.product_name = parse_product_name(product_name)?;
    }
    if let Some(quantity) = cmd.quantity {
        next.quantity = require_positive("quantity", quantity)?;
    }
    if let Some(unit_price) = cmd.unit_price {
        next.unit_price = require_positive("unit price", unit_price)?;
    }
    if let Some(date) = cmd.date {
        next.date = date;
    }
    if let Some(time) = cmd.time {
        next.time = time;
    }
    if let Some(notes) = &cmd.notes {
        next.notes = Some(notes.clone());
    }
    line_total(next.quantity, next.unit_price)?;
    next.updated_at = at;
    next.version = current.version.next();
    Ok(next)
}

fn patch_sale(current: &SaleEntry, cmd: &UpdateSale, at: DateTime<Utc>) -> Result<SaleEntry> {
    let mut next = current.clone();
    if let Some(customer) = &cmd.customer {
        require_present("customer name", &customer.name)?;
        next.customer = customer.clone();
    }
    if let Some(product_name) = &cmd.product_name {
        next.product_name = parse_product_name(product_name)?;
    }
    if let Some(quantity) = cmd.quantity {
        next.quantity = require_positive("quantity", quantity)?;
    }
    if let Some(price) = cmd.price {
        next.price = require_positive("price", price)?;
    }
    if let Some(date) = cmd.date {
        next.date = date;
    }
    if let Some(time) = cmd.time {
        next.time = time;
    }
    next.total_price = line_total(next.quantity, next.price)?;
    next.updated_at = at;
    next.version = current.version.next();
    Ok(next)
}
