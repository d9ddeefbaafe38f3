//! Product repository: catalog records and per-product stock positions.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};

use comptoir_core::billing::{self, StockSummary};
use comptoir_shared::AppError;

use crate::entities::{invoice_lines, invoices, products, return_lines, stock_entries};

/// Error types for product operations.
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    /// Reference code already exists.
    #[error("Product reference '{0}' already exists")]
    DuplicateReference(String),

    /// Product not found.
    #[error("Product not found: {0}")]
    NotFound(i64),

    /// Cannot delete product because invoice lines or stock entries reference it.
    #[error(
        "Cannot delete product: {invoice_lines} invoice line(s) and {stock_entries} stock entry(ies) reference it"
    )]
    StillReferenced {
        /// Number of invoice lines referencing the product.
        invoice_lines: u64,
        /// Number of stock entries referencing the product.
        stock_entries: u64,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ProductError> for AppError {
    fn from(e: ProductError) -> Self {
        match e {
            ProductError::DuplicateReference(reference) => {
                Self::Conflict(format!("product reference '{reference}' already exists"))
            }
            ProductError::NotFound(id) => Self::NotFound(format!("product {id}")),
            ProductError::StillReferenced {
                invoice_lines,
                stock_entries,
            } => Self::Guard(format!(
                "product is referenced by {invoice_lines} invoice line(s) and {stock_entries} stock entry(ies)"
            )),
            ProductError::Database(err) => Self::Database(err.to_string()),
        }
    }
}

/// Opening stock recorded together with a new product.
#[derive(Debug, Clone)]
pub struct OpeningStockInput {
    /// Receipt date.
    pub date: NaiveDate,
    /// Quantity received.
    pub quantity: i32,
}

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct CreateProductInput {
    /// Reference code (globally unique).
    pub reference: String,
    /// Product name.
    pub name: String,
    /// Purchase price.
    pub purchase_price: Decimal,
    /// Standard sale price.
    pub standard_price: Decimal,
    /// Optional opening stock; recorded only for a positive quantity.
    pub opening_stock: Option<OpeningStockInput>,
}

/// Input for partially updating a product; `None` keeps the previous value.
#[derive(Debug, Clone, Default)]
pub struct UpdateProductInput {
    /// Reference code.
    pub reference: Option<String>,
    /// Product name.
    pub name: Option<String>,
    /// Purchase price.
    pub purchase_price: Option<Decimal>,
    /// Standard sale price.
    pub standard_price: Option<Decimal>,
}

/// A product with its total received quantity.
#[derive(Debug, Clone)]
pub struct ProductWithReceived {
    /// The product record.
    pub product: products::Model,
    /// Sum of its stock entry quantities.
    pub quantity_received: i64,
}

/// Product repository for CRUD operations and stock queries.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    db: DatabaseConnection,
}

impl ProductRepository {
    /// Creates a new product repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a product, optionally together with its opening stock entry.
    ///
    /// Both writes commit as one unit; a failure rolls the whole creation
    /// back.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference is already taken.
    pub async fn create(&self, input: CreateProductInput) -> Result<products::Model, ProductError> {
        self.ensure_reference_free(&input.reference, None).await?;

        let txn = self.db.begin().await?;

        let product = products::ActiveModel {
            reference: Set(input.reference),
            name: Set(input.name),
            purchase_price: Set(input.purchase_price),
            standard_price: Set(input.standard_price),
            ..Default::default()
        };
        let product = product.insert(&txn).await?;

        if let Some(opening) = input.opening_stock
            && opening.quantity > 0
        {
            let entry = stock_entries::ActiveModel {
                product_id: Set(product.id),
                date: Set(opening.date),
                quantity: Set(opening.quantity),
                ..Default::default()
            };
            entry.insert(&txn).await?;
        }

        txn.commit().await?;
        Ok(product)
    }

    /// Lists all products ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<products::Model>, ProductError> {
        Ok(products::Entity::find()
            .order_by_asc(products::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Lists all products with their total received quantities.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_with_received(&self) -> Result<Vec<ProductWithReceived>, ProductError> {
        let products = self.list().await?;

        let rows: Vec<(i64, Option<i64>)> = stock_entries::Entity::find()
            .select_only()
            .column(stock_entries::Column::ProductId)
            .column_as(stock_entries::Column::Quantity.sum(), "total")
            .group_by(stock_entries::Column::ProductId)
            .into_tuple()
            .all(&self.db)
            .await?;
        let received: std::collections::HashMap<i64, i64> = rows
            .into_iter()
            .map(|(id, total)| (id, total.unwrap_or(0)))
            .collect();

        Ok(products
            .into_iter()
            .map(|product| {
                let quantity_received = received.get(&product.id).copied().unwrap_or(0);
                ProductWithReceived {
                    product,
                    quantity_received,
                }
            })
            .collect())
    }

    /// Finds a product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<products::Model>, ProductError> {
        Ok(products::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Updates a product; absent fields keep their previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is missing or the new reference is
    /// taken.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateProductInput,
    ) -> Result<products::Model, ProductError> {
        let product = products::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        if let Some(reference) = &input.reference
            && *reference != product.reference
        {
            self.ensure_reference_free(reference, Some(id)).await?;
        }

        let mut active: products::ActiveModel = product.into();
        if let Some(reference) = input.reference {
            active.reference = Set(reference);
        }
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(purchase_price) = input.purchase_price {
            active.purchase_price = Set(purchase_price);
        }
        if let Some(standard_price) = input.standard_price {
            active.standard_price = Set(standard_price);
        }

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a product.
    ///
    /// Rejected while any invoice line or stock entry references the
    /// product; the check runs before any write is attempted.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is missing or still referenced.
    pub async fn delete(&self, id: i64) -> Result<(), ProductError> {
        let product = products::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        let line_count = invoice_lines::Entity::find()
            .filter(invoice_lines::Column::ProductId.eq(id))
            .count(&self.db)
            .await?;
        let entry_count = stock_entries::Entity::find()
            .filter(stock_entries::Column::ProductId.eq(id))
            .count(&self.db)
            .await?;

        if !billing::product_deletable(line_count, entry_count) {
            return Err(ProductError::StillReferenced {
                invoice_lines: line_count,
                stock_entries: entry_count,
            });
        }

        product.delete(&self.db).await?;
        Ok(())
    }

    /// Computes the product's stock position from the three ledgers:
    /// entries, sales on finalized invoices, and returns (regardless of the
    /// invoice's finalization state).
    ///
    /// # Errors
    ///
    /// Returns an error if the product is missing or a query fails.
    pub async fn stock_summary(&self, id: i64) -> Result<StockSummary, ProductError> {
        if products::Entity::find_by_id(id).one(&self.db).await?.is_none() {
            return Err(ProductError::NotFound(id));
        }

        let received = self.received_sum(id).await?;
        let sold = self.sold_finalized_sum(id).await?;
        let returned = self.returned_sum(id).await?;

        Ok(billing::stock_summary(received, sold, returned))
    }

    /// Sum of stock entry quantities for one product.
    async fn received_sum(&self, product_id: i64) -> Result<i64, ProductError> {
        let sum: Option<Option<i64>> = stock_entries::Entity::find()
            .select_only()
            .column_as(stock_entries::Column::Quantity.sum(), "total")
            .filter(stock_entries::Column::ProductId.eq(product_id))
            .into_tuple()
            .one(&self.db)
            .await?;

        Ok(sum.flatten().unwrap_or(0))
    }

    /// Sum of line quantities on FINALIZED invoices for one product.
    async fn sold_finalized_sum(&self, product_id: i64) -> Result<i64, ProductError> {
        let sum: Option<Option<i64>> = invoice_lines::Entity::find()
            .select_only()
            .column_as(invoice_lines::Column::Quantity.sum(), "total")
            .join(JoinType::InnerJoin, invoice_lines::Relation::Invoices.def())
            .filter(invoice_lines::Column::ProductId.eq(product_id))
            .filter(invoices::Column::Finalized.eq(true))
            .into_tuple()
            .one(&self.db)
            .await?;

        Ok(sum.flatten().unwrap_or(0))
    }

    /// Sum of returned quantities for one product, drafts included.
    async fn returned_sum(&self, product_id: i64) -> Result<i64, ProductError> {
        let sum: Option<Option<i64>> = return_lines::Entity::find()
            .select_only()
            .column_as(return_lines::Column::Quantity.sum(), "total")
            .filter(return_lines::Column::ProductId.eq(product_id))
            .into_tuple()
            .one(&self.db)
            .await?;

        Ok(sum.flatten().unwrap_or(0))
    }

    async fn ensure_reference_free(
        &self,
        reference: &str,
        exclude_id: Option<i64>,
    ) -> Result<(), ProductError> {
        let mut query =
            products::Entity::find().filter(products::Column::Reference.eq(reference));
        if let Some(id) = exclude_id {
            query = query.filter(products::Column::Id.ne(id));
        }
        if query.one(&self.db).await?.is_some() {
            return Err(ProductError::DuplicateReference(reference.to_string()));
        }
        Ok(())
    }
}
