//! Stock entry repository: inventory receipts.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use comptoir_shared::AppError;

use crate::entities::{products, stock_entries};

/// Error types for stock entry operations.
#[derive(Debug, thiserror::Error)]
pub enum StockError {
    /// Referenced product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<StockError> for AppError {
    fn from(e: StockError) -> Self {
        match e {
            StockError::ProductNotFound(id) => Self::NotFound(format!("product {id}")),
            StockError::Database(err) => Self::Database(err.to_string()),
        }
    }
}

/// Input for recording a stock receipt.
#[derive(Debug, Clone)]
pub struct CreateStockEntryInput {
    /// Product received.
    pub product_id: i64,
    /// Receipt date.
    pub date: NaiveDate,
    /// Quantity received. Negative corrective entries are accepted.
    pub quantity: i32,
}

/// Stock entry repository.
#[derive(Debug, Clone)]
pub struct StockRepository {
    db: DatabaseConnection,
}

impl StockRepository {
    /// Creates a new stock repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a stock receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist.
    pub async fn record(
        &self,
        input: CreateStockEntryInput,
    ) -> Result<stock_entries::Model, StockError> {
        if products::Entity::find_by_id(input.product_id)
            .one(&self.db)
            .await?
            .is_none()
        {
            return Err(StockError::ProductNotFound(input.product_id));
        }

        let entry = stock_entries::ActiveModel {
            product_id: Set(input.product_id),
            date: Set(input.date),
            quantity: Set(input.quantity),
            ..Default::default()
        };

        Ok(entry.insert(&self.db).await?)
    }

    /// Lists receipts for one product, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist.
    pub async fn list_for_product(
        &self,
        product_id: i64,
    ) -> Result<Vec<stock_entries::Model>, StockError> {
        if products::Entity::find_by_id(product_id)
            .one(&self.db)
            .await?
            .is_none()
        {
            return Err(StockError::ProductNotFound(product_id));
        }

        Ok(stock_entries::Entity::find()
            .filter(stock_entries::Column::ProductId.eq(product_id))
            .order_by_desc(stock_entries::Column::Date)
            .order_by_desc(stock_entries::Column::Id)
            .all(&self.db)
            .await?)
    }
}
