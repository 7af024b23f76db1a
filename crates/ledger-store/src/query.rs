use common::ProductName;

/// Builder for listing ledger entries of one owner.
///
/// Entries come back newest first. Soft-deleted entries are hidden unless
/// the query asks for the full history.
#[derive(Debug, Clone, Default)]
pub struct LedgerQuery {
    /// Include soft-deleted entries.
    pub include_deleted: bool,

    /// Only entries for this product.
    pub product_name: Option<ProductName>,

    /// Maximum number of entries to return.
    pub limit: Option<usize>,

    /// Number of entries to skip.
    pub offset: Option<usize>,
}

impl LedgerQuery {
    /// Creates a query for the active (not soft-deleted) entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for every entry, soft-deleted ones included.
    pub fn history() -> Self {
        Self {
            include_deleted: true,
            ..Default::default()
        }
    }

    /// Filters by product.
    pub fn product(mut self, product_name: ProductName) -> Self {
        self.product_name = Some(product_name);
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first N results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if an entry with the given deletion flag and product passes the filters.
    pub fn matches(&self, deleted: bool, product_name: &ProductName) -> bool {
        if deleted && !self.include_deleted {
            return false;
        }
        if let Some(ref wanted) = self.product_name
            && wanted != product_name
        {
            return false;
        }
        true
    }

    /// Applies offset and limit to an already filtered and sorted list.
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = self.offset.unwrap_or(0);
        let items = items.into_iter().skip(offset);
        match self.limit {
            Some(limit) => items.take(limit).collect(),
            None => items.collect(),
        }
    }
}
