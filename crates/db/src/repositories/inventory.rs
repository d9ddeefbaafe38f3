//! Inventory report: per-product quantities, valuations, and profit.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait,
    sea_query::Expr,
};

use comptoir_core::billing;
use comptoir_shared::AppError;

use crate::entities::{invoice_lines, invoices, products, return_lines, stock_entries};

/// Error types for inventory reporting.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<InventoryError> for AppError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::Database(err) => Self::Database(err.to_string()),
        }
    }
}

/// One product's row in the inventory report.
#[derive(Debug, Clone)]
pub struct InventoryRow {
    /// Product id.
    pub product_id: i64,
    /// Reference code.
    pub reference: String,
    /// Product name.
    pub name: String,
    /// Total quantity received.
    pub quantity_received: i64,
    /// Purchase price per unit.
    pub purchase_price: Decimal,
    /// `quantity_received * purchase_price`.
    pub total_purchase: Decimal,
    /// Standard sale price per unit.
    pub standard_price: Decimal,
    /// Quantity sold net of returns, floored at zero.
    pub quantity_sold: i64,
    /// Finalized sales value minus returned value.
    pub total_sales: Decimal,
    /// Quantity on hand; negative when oversold.
    pub quantity_available: i64,
}

/// The full inventory report with its grand totals.
#[derive(Debug, Clone)]
pub struct InventoryReport {
    /// Per-product rows, ordered by product name.
    pub rows: Vec<InventoryRow>,
    /// Sum of purchase valuations.
    pub total_purchase: Decimal,
    /// Sum of sales valuations.
    pub total_sales: Decimal,
    /// `total_sales - total_purchase`.
    pub total_profit: Decimal,
}

/// Per-product sums feeding one report row.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductSums {
    /// Quantity received across stock entries.
    pub received: i64,
    /// Quantity sold on finalized invoices.
    pub sold_finalized: i64,
    /// Quantity returned, drafts included.
    pub returned: i64,
    /// Sales value on finalized invoices.
    pub sales_value: Decimal,
    /// Value of returned goods.
    pub returns_value: Decimal,
}

/// Builds one report row from a product and its ledger sums.
///
/// Pure assembly over the stock calculator; extracted so the valuation
/// arithmetic can be tested without database access.
#[must_use]
pub fn build_row(product: &products::Model, sums: ProductSums) -> InventoryRow {
    let stock = billing::stock_summary(sums.received, sums.sold_finalized, sums.returned);

    InventoryRow {
        product_id: product.id,
        reference: product.reference.clone(),
        name: product.name.clone(),
        quantity_received: stock.quantity_received,
        purchase_price: product.purchase_price,
        total_purchase: Decimal::from(sums.received) * product.purchase_price,
        standard_price: product.standard_price,
        quantity_sold: stock.quantity_sold,
        total_sales: sums.sales_value - sums.returns_value,
        quantity_available: stock.quantity_available,
    }
}

/// Inventory report repository.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    db: DatabaseConnection,
}

impl InventoryRepository {
    /// Creates a new inventory repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Builds the inventory report over every product.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn report(&self) -> Result<InventoryReport, InventoryError> {
        let products = products::Entity::find()
            .order_by_asc(products::Column::Name)
            .all(&self.db)
            .await?;

        let received = self.received_by_product().await?;
        let sold = self.sold_finalized_by_product().await?;
        let returned = self.returned_by_product().await?;
        let sales_value = self.sales_value_by_product().await?;
        let returns_value = self.returns_value_by_product().await?;

        let mut rows = Vec::with_capacity(products.len());
        let mut total_purchase = Decimal::ZERO;
        let mut total_sales = Decimal::ZERO;

        for product in &products {
            let sums = ProductSums {
                received: received.get(&product.id).copied().unwrap_or(0),
                sold_finalized: sold.get(&product.id).copied().unwrap_or(0),
                returned: returned.get(&product.id).copied().unwrap_or(0),
                sales_value: sales_value.get(&product.id).copied().unwrap_or(Decimal::ZERO),
                returns_value: returns_value
                    .get(&product.id)
                    .copied()
                    .unwrap_or(Decimal::ZERO),
            };

            let row = build_row(product, sums);
            total_purchase += row.total_purchase;
            total_sales += row.total_sales;
            rows.push(row);
        }

        Ok(InventoryReport {
            rows,
            total_purchase,
            total_sales,
            total_profit: total_sales - total_purchase,
        })
    }

    async fn received_by_product(&self) -> Result<HashMap<i64, i64>, InventoryError> {
        let rows: Vec<(i64, Option<i64>)> = stock_entries::Entity::find()
            .select_only()
            .column(stock_entries::Column::ProductId)
            .column_as(stock_entries::Column::Quantity.sum(), "total")
            .group_by(stock_entries::Column::ProductId)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(collect_i64(rows))
    }

    async fn sold_finalized_by_product(&self) -> Result<HashMap<i64, i64>, InventoryError> {
        let rows: Vec<(i64, Option<i64>)> = invoice_lines::Entity::find()
            .select_only()
            .column(invoice_lines::Column::ProductId)
            .column_as(invoice_lines::Column::Quantity.sum(), "total")
            .join(JoinType::InnerJoin, invoice_lines::Relation::Invoices.def())
            .filter(invoices::Column::Finalized.eq(true))
            .group_by(invoice_lines::Column::ProductId)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(collect_i64(rows))
    }

    async fn returned_by_product(&self) -> Result<HashMap<i64, i64>, InventoryError> {
        let rows: Vec<(i64, Option<i64>)> = return_lines::Entity::find()
            .select_only()
            .column(return_lines::Column::ProductId)
            .column_as(return_lines::Column::Quantity.sum(), "total")
            .group_by(return_lines::Column::ProductId)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(collect_i64(rows))
    }

    async fn sales_value_by_product(&self) -> Result<HashMap<i64, Decimal>, InventoryError> {
        let rows: Vec<(i64, Option<Decimal>)> = invoice_lines::Entity::find()
            .select_only()
            .column(invoice_lines::Column::ProductId)
            .column_as(
                Expr::expr(
                    Expr::col((invoice_lines::Entity, invoice_lines::Column::UnitPrice)).mul(
                        Expr::col((invoice_lines::Entity, invoice_lines::Column::Quantity)),
                    ),
                )
                .sum(),
                "total",
            )
            .join(JoinType::InnerJoin, invoice_lines::Relation::Invoices.def())
            .filter(invoices::Column::Finalized.eq(true))
            .group_by(invoice_lines::Column::ProductId)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(collect_decimal(rows))
    }

    async fn returns_value_by_product(&self) -> Result<HashMap<i64, Decimal>, InventoryError> {
        let rows: Vec<(i64, Option<Decimal>)> = return_lines::Entity::find()
            .select_only()
            .column(return_lines::Column::ProductId)
            .column_as(
                Expr::expr(
                    Expr::col((return_lines::Entity, return_lines::Column::UnitPrice)).mul(
                        Expr::col((return_lines::Entity, return_lines::Column::Quantity)),
                    ),
                )
                .sum(),
                "total",
            )
            .group_by(return_lines::Column::ProductId)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(collect_decimal(rows))
    }
}

fn collect_i64(rows: Vec<(i64, Option<i64>)>) -> HashMap<i64, i64> {
    rows.into_iter()
        .map(|(id, total)| (id, total.unwrap_or(0)))
        .collect()
}

fn collect_decimal(rows: Vec<(i64, Option<Decimal>)>) -> HashMap<i64, Decimal> {
    rows.into_iter()
        .map(|(id, total)| (id, total.unwrap_or(Decimal::ZERO)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product() -> products::Model {
        products::Model {
            id: 5,
            reference: "REF-100".to_string(),
            name: "Carton 60x40".to_string(),
            purchase_price: dec!(4.00),
            standard_price: dec!(6.50),
        }
    }

    #[test]
    fn test_build_row_reference_case() {
        let row = build_row(
            &product(),
            ProductSums {
                received: 100,
                sold_finalized: 30,
                returned: 5,
                sales_value: dec!(195.00),
                returns_value: dec!(32.50),
            },
        );
        assert_eq!(row.quantity_received, 100);
        assert_eq!(row.quantity_sold, 25);
        assert_eq!(row.quantity_available, 75);
        assert_eq!(row.total_purchase, dec!(400.00));
        assert_eq!(row.total_sales, dec!(162.50));
    }

    #[test]
    fn test_build_row_untouched_product() {
        let row = build_row(&product(), ProductSums::default());
        assert_eq!(row.quantity_available, 0);
        assert_eq!(row.total_purchase, Decimal::ZERO);
        assert_eq!(row.total_sales, Decimal::ZERO);
    }

    #[test]
    fn test_build_row_returns_exceed_sales() {
        let row = build_row(
            &product(),
            ProductSums {
                received: 10,
                sold_finalized: 10,
                returned: 20,
                sales_value: dec!(65.00),
                returns_value: dec!(130.00),
            },
        );
        // Sold quantity floors at zero, the sales value does not.
        assert_eq!(row.quantity_sold, 0);
        assert_eq!(row.total_sales, dec!(-65.00));
        assert_eq!(row.quantity_available, 20);
    }
}
