//! Invoice repository: invoices, their lines and returns, and standings.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
    JoinType, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    Set,
    sea_query::Expr,
};

use comptoir_core::billing::{self, InvoiceTotals, LineAmount};
use comptoir_shared::AppError;

use crate::entities::{
    clients, invoice_lines, invoices, payment_applications, products, return_lines,
};

/// Error types for invoice operations.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    /// Invoice number already exists.
    #[error("Invoice number '{0}' already exists")]
    DuplicateNumber(String),

    /// Invoice not found.
    #[error("Invoice not found: {0}")]
    NotFound(i64),

    /// Referenced client not found.
    #[error("Client not found: {0}")]
    ClientNotFound(i64),

    /// Referenced product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Cannot delete invoice because payments are applied to it.
    #[error("Cannot delete invoice: {0} payment application(s) reference it")]
    HasApplications(u64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<InvoiceError> for AppError {
    fn from(e: InvoiceError) -> Self {
        match e {
            InvoiceError::DuplicateNumber(number) => {
                Self::Conflict(format!("invoice number '{number}' already exists"))
            }
            InvoiceError::NotFound(id) => Self::NotFound(format!("invoice {id}")),
            InvoiceError::ClientNotFound(id) => Self::NotFound(format!("client {id}")),
            InvoiceError::ProductNotFound(id) => Self::NotFound(format!("product {id}")),
            InvoiceError::HasApplications(count) => Self::Guard(format!(
                "{count} payment application(s) reference this invoice"
            )),
            InvoiceError::Database(err) => Self::Database(err.to_string()),
        }
    }
}

/// An invoice with its derived financial standing.
#[derive(Debug, Clone)]
pub struct InvoiceStanding {
    /// The invoice record.
    pub invoice: invoices::Model,
    /// Totals derived from the invoice lines.
    pub totals: InvoiceTotals,
    /// Sum of payment applications on this invoice.
    pub applied: Decimal,
    /// `total_ttc - applied`; negative when over-paid.
    pub remaining: Decimal,
}

/// A line item with its product's reference and name for display.
#[derive(Debug, Clone, FromQueryResult)]
pub struct LineWithProduct {
    /// Line id.
    pub id: i64,
    /// Product sold.
    pub product_id: i64,
    /// Product reference code.
    pub product_reference: String,
    /// Product name.
    pub product_name: String,
    /// Unit sale price.
    pub unit_price: Decimal,
    /// Quantity sold.
    pub quantity: i32,
}

impl LineWithProduct {
    /// The line total: unit price times quantity.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A return line with its product's reference and name for display.
#[derive(Debug, Clone, FromQueryResult)]
pub struct ReturnWithProduct {
    /// Return line id.
    pub id: i64,
    /// Product returned.
    pub product_id: i64,
    /// Product reference code.
    pub product_reference: String,
    /// Product name.
    pub product_name: String,
    /// Unit price credited.
    pub unit_price: Decimal,
    /// Quantity returned.
    pub quantity: i32,
    /// Return date.
    pub date: NaiveDate,
}

impl ReturnWithProduct {
    /// The credited total: unit price times quantity.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// An invoice with everything needed to display or print it.
#[derive(Debug, Clone)]
pub struct InvoiceDetail {
    /// The invoice record.
    pub invoice: invoices::Model,
    /// The invoiced client.
    pub client: clients::Model,
    /// Line items, insertion order.
    pub lines: Vec<LineWithProduct>,
    /// Return lines, insertion order.
    pub returns: Vec<ReturnWithProduct>,
    /// Totals derived from the lines.
    pub totals: InvoiceTotals,
    /// Sum of payment applications on this invoice.
    pub applied: Decimal,
    /// Remaining amount due.
    pub remaining: Decimal,
}

/// Input for creating an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    /// Invoice number (globally unique).
    pub number: String,
    /// Sale date.
    pub sale_date: NaiveDate,
    /// Owning client.
    pub client_id: i64,
    /// Number of packages shipped.
    pub package_count: i32,
}

/// Input for partially updating an invoice; `None` keeps the previous value.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoiceInput {
    /// Invoice number.
    pub number: Option<String>,
    /// Sale date.
    pub sale_date: Option<NaiveDate>,
    /// Owning client.
    pub client_id: Option<i64>,
    /// Number of packages shipped.
    pub package_count: Option<i32>,
}

/// Input for adding a line item to an invoice.
#[derive(Debug, Clone)]
pub struct AddLineInput {
    /// Product sold.
    pub product_id: i64,
    /// Unit sale price.
    pub unit_price: Decimal,
    /// Quantity sold.
    pub quantity: i32,
}

/// Input for recording a return against an invoice.
#[derive(Debug, Clone)]
pub struct AddReturnInput {
    /// Product returned.
    pub product_id: i64,
    /// Unit price credited.
    pub unit_price: Decimal,
    /// Quantity returned.
    pub quantity: i32,
    /// Return date.
    pub date: NaiveDate,
}

/// Builds an invoice standing from its aggregate sums.
///
/// Pure assembly over the core calculators; extracted so it can be tested
/// without database access.
#[must_use]
pub fn standing_from_sums(
    invoice: invoices::Model,
    total_ht: Decimal,
    applied: Decimal,
    tax_rate: Decimal,
) -> InvoiceStanding {
    let totals = billing::totals_from_ht(total_ht, tax_rate);
    let remaining = billing::invoice_remaining(totals.total_ttc, applied);
    InvoiceStanding {
        invoice,
        totals,
        applied,
        remaining,
    }
}

/// Invoice repository for CRUD, lines, returns, and standings.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new invoice in the draft state.
    ///
    /// # Errors
    ///
    /// Returns an error if the number is already taken or the client does
    /// not exist.
    pub async fn create(&self, input: CreateInvoiceInput) -> Result<invoices::Model, InvoiceError> {
        self.ensure_number_free(&input.number, None).await?;
        self.ensure_client_exists(input.client_id).await?;

        let invoice = invoices::ActiveModel {
            number: Set(input.number),
            sale_date: Set(input.sale_date),
            client_id: Set(input.client_id),
            package_count: Set(input.package_count),
            finalized: Set(false),
            ..Default::default()
        };

        Ok(invoice.insert(&self.db).await?)
    }

    /// Finds an invoice by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<invoices::Model>, InvoiceError> {
        Ok(invoices::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Loads an invoice with its lines, returns, totals, and remaining due.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_detail(
        &self,
        id: i64,
        tax_rate: Decimal,
    ) -> Result<Option<InvoiceDetail>, InvoiceError> {
        let Some(invoice) = invoices::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let client = clients::Entity::find_by_id(invoice.client_id)
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::ClientNotFound(invoice.client_id))?;

        let lines: Vec<LineWithProduct> = invoice_lines::Entity::find()
            .select_only()
            .column(invoice_lines::Column::Id)
            .column(invoice_lines::Column::ProductId)
            .column_as(products::Column::Reference, "product_reference")
            .column_as(products::Column::Name, "product_name")
            .column(invoice_lines::Column::UnitPrice)
            .column(invoice_lines::Column::Quantity)
            .join(JoinType::InnerJoin, invoice_lines::Relation::Products.def())
            .filter(invoice_lines::Column::InvoiceId.eq(id))
            .order_by_asc(invoice_lines::Column::Id)
            .into_model::<LineWithProduct>()
            .all(&self.db)
            .await?;

        let returns: Vec<ReturnWithProduct> = return_lines::Entity::find()
            .select_only()
            .column(return_lines::Column::Id)
            .column(return_lines::Column::ProductId)
            .column_as(products::Column::Reference, "product_reference")
            .column_as(products::Column::Name, "product_name")
            .column(return_lines::Column::UnitPrice)
            .column(return_lines::Column::Quantity)
            .column(return_lines::Column::Date)
            .join(JoinType::InnerJoin, return_lines::Relation::Products.def())
            .filter(return_lines::Column::InvoiceId.eq(id))
            .order_by_asc(return_lines::Column::Id)
            .into_model::<ReturnWithProduct>()
            .all(&self.db)
            .await?;

        let amounts: Vec<LineAmount> = lines
            .iter()
            .map(|l| LineAmount {
                unit_price: l.unit_price,
                quantity: l.quantity,
            })
            .collect();
        let totals = billing::invoice_totals(&amounts, tax_rate);
        let applied = self.applied_total(id).await?;
        let remaining = billing::invoice_remaining(totals.total_ttc, applied);

        Ok(Some(InvoiceDetail {
            invoice,
            client,
            lines,
            returns,
            totals,
            applied,
            remaining,
        }))
    }

    /// Lists all invoices, newest first, each with totals, paid, and
    /// remaining amounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_with_standing(
        &self,
        tax_rate: Decimal,
    ) -> Result<Vec<InvoiceStanding>, InvoiceError> {
        let invoices = invoices::Entity::find()
            .order_by_desc(invoices::Column::SaleDate)
            .order_by_desc(invoices::Column::Id)
            .all(&self.db)
            .await?;

        let ht_map = self.line_totals_by_invoice().await?;
        let applied_map = self.applied_by_invoice().await?;

        Ok(invoices
            .into_iter()
            .map(|inv| {
                let ht = ht_map.get(&inv.id).copied().unwrap_or(Decimal::ZERO);
                let applied = applied_map.get(&inv.id).copied().unwrap_or(Decimal::ZERO);
                standing_from_sums(inv, ht, applied, tax_rate)
            })
            .collect())
    }

    /// Updates an invoice; absent fields keep their previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice is missing, the new number is taken,
    /// or the new client does not exist.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateInvoiceInput,
    ) -> Result<invoices::Model, InvoiceError> {
        let invoice = invoices::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        if let Some(number) = &input.number
            && *number != invoice.number
        {
            self.ensure_number_free(number, Some(id)).await?;
        }
        if let Some(client_id) = input.client_id {
            self.ensure_client_exists(client_id).await?;
        }

        let mut active: invoices::ActiveModel = invoice.into();
        if let Some(number) = input.number {
            active.number = Set(number);
        }
        if let Some(sale_date) = input.sale_date {
            active.sale_date = Set(sale_date);
        }
        if let Some(client_id) = input.client_id {
            active.client_id = Set(client_id);
        }
        if let Some(package_count) = input.package_count {
            active.package_count = Set(package_count);
        }

        Ok(active.update(&self.db).await?)
    }

    /// Deletes an invoice together with its lines and returns.
    ///
    /// Rejected while any payment application references the invoice; the
    /// check runs before any write is attempted.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice is missing or still referenced.
    pub async fn delete(&self, id: i64) -> Result<(), InvoiceError> {
        let invoice = invoices::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        let applications = payment_applications::Entity::find()
            .filter(payment_applications::Column::InvoiceId.eq(id))
            .count(&self.db)
            .await?;

        if !billing::invoice_deletable(applications) {
            return Err(InvoiceError::HasApplications(applications));
        }

        invoice.delete(&self.db).await?;
        Ok(())
    }

    /// Sets the finalized flag to an explicit value.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice is missing.
    pub async fn set_finalized(
        &self,
        id: i64,
        finalized: bool,
    ) -> Result<invoices::Model, InvoiceError> {
        let invoice = invoices::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        let mut active: invoices::ActiveModel = invoice.into();
        active.finalized = Set(finalized);
        Ok(active.update(&self.db).await?)
    }

    /// Toggles between draft and finalized (the manual transition, valid in
    /// both directions).
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice is missing.
    pub async fn toggle_finalized(&self, id: i64) -> Result<invoices::Model, InvoiceError> {
        let invoice = invoices::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        let next = billing::InvoiceStatus::from_finalized(invoice.finalized).toggled();
        let mut active: invoices::ActiveModel = invoice.into();
        active.finalized = Set(next.counts_toward_sales());
        Ok(active.update(&self.db).await?)
    }

    /// Adds a line item to an invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice or product does not exist.
    pub async fn add_line(
        &self,
        invoice_id: i64,
        input: AddLineInput,
    ) -> Result<invoice_lines::Model, InvoiceError> {
        self.ensure_invoice_exists(invoice_id).await?;
        self.ensure_product_exists(input.product_id).await?;

        let line = invoice_lines::ActiveModel {
            invoice_id: Set(invoice_id),
            product_id: Set(input.product_id),
            unit_price: Set(input.unit_price),
            quantity: Set(input.quantity),
            ..Default::default()
        };

        Ok(line.insert(&self.db).await?)
    }

    /// Records a return against an invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice or product does not exist.
    pub async fn add_return(
        &self,
        invoice_id: i64,
        input: AddReturnInput,
    ) -> Result<return_lines::Model, InvoiceError> {
        self.ensure_invoice_exists(invoice_id).await?;
        self.ensure_product_exists(input.product_id).await?;

        let ret = return_lines::ActiveModel {
            invoice_id: Set(invoice_id),
            product_id: Set(input.product_id),
            unit_price: Set(input.unit_price),
            quantity: Set(input.quantity),
            date: Set(input.date),
            ..Default::default()
        };

        Ok(ret.insert(&self.db).await?)
    }

    /// Sum of payment applications on one invoice.
    async fn applied_total(&self, invoice_id: i64) -> Result<Decimal, InvoiceError> {
        let sum: Option<Option<Decimal>> = payment_applications::Entity::find()
            .select_only()
            .column_as(payment_applications::Column::Amount.sum(), "total")
            .filter(payment_applications::Column::InvoiceId.eq(invoice_id))
            .into_tuple()
            .one(&self.db)
            .await?;

        Ok(sum.flatten().unwrap_or(Decimal::ZERO))
    }

    /// Pre-tax line totals grouped by invoice id.
    async fn line_totals_by_invoice(&self) -> Result<HashMap<i64, Decimal>, InvoiceError> {
        let rows: Vec<(i64, Option<Decimal>)> = invoice_lines::Entity::find()
            .select_only()
            .column(invoice_lines::Column::InvoiceId)
            .column_as(
                Expr::expr(
                    Expr::col((invoice_lines::Entity, invoice_lines::Column::UnitPrice)).mul(
                        Expr::col((invoice_lines::Entity, invoice_lines::Column::Quantity)),
                    ),
                )
                .sum(),
                "total",
            )
            .group_by(invoice_lines::Column::InvoiceId)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, total)| (id, total.unwrap_or(Decimal::ZERO)))
            .collect())
    }

    /// Applied amounts grouped by invoice id.
    async fn applied_by_invoice(&self) -> Result<HashMap<i64, Decimal>, InvoiceError> {
        let rows: Vec<(i64, Option<Decimal>)> = payment_applications::Entity::find()
            .select_only()
            .column(payment_applications::Column::InvoiceId)
            .column_as(payment_applications::Column::Amount.sum(), "total")
            .group_by(payment_applications::Column::InvoiceId)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, total)| (id, total.unwrap_or(Decimal::ZERO)))
            .collect())
    }

    async fn ensure_number_free(
        &self,
        number: &str,
        exclude_id: Option<i64>,
    ) -> Result<(), InvoiceError> {
        let mut query = invoices::Entity::find().filter(invoices::Column::Number.eq(number));
        if let Some(id) = exclude_id {
            query = query.filter(invoices::Column::Id.ne(id));
        }
        if query.one(&self.db).await?.is_some() {
            return Err(InvoiceError::DuplicateNumber(number.to_string()));
        }
        Ok(())
    }

    async fn ensure_client_exists(&self, client_id: i64) -> Result<(), InvoiceError> {
        if clients::Entity::find_by_id(client_id)
            .one(&self.db)
            .await?
            .is_none()
        {
            return Err(InvoiceError::ClientNotFound(client_id));
        }
        Ok(())
    }

    async fn ensure_invoice_exists(&self, invoice_id: i64) -> Result<(), InvoiceError> {
        if invoices::Entity::find_by_id(invoice_id)
            .one(&self.db)
            .await?
            .is_none()
        {
            return Err(InvoiceError::NotFound(invoice_id));
        }
        Ok(())
    }

    async fn ensure_product_exists(&self, product_id: i64) -> Result<(), InvoiceError> {
        if crate::entities::products::Entity::find_by_id(product_id)
            .one(&self.db)
            .await?
            .is_none()
        {
            return Err(InvoiceError::ProductNotFound(product_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn invoice(finalized: bool) -> invoices::Model {
        invoices::Model {
            id: 7,
            number: "F-2026-001".to_string(),
            sale_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            client_id: 1,
            package_count: 2,
            finalized,
        }
    }

    #[test]
    fn test_standing_from_sums() {
        let s = standing_from_sums(invoice(true), dec!(100), dec!(50), dec!(0.20));
        assert_eq!(s.totals.total_ht, dec!(100));
        assert_eq!(s.totals.total_ttc, dec!(120.00));
        assert_eq!(s.applied, dec!(50));
        assert_eq!(s.remaining, dec!(70.00));
    }

    #[test]
    fn test_standing_empty_invoice() {
        let s = standing_from_sums(invoice(false), Decimal::ZERO, Decimal::ZERO, dec!(0.20));
        assert_eq!(s.totals, InvoiceTotals::ZERO);
        assert_eq!(s.remaining, Decimal::ZERO);
    }

    #[test]
    fn test_standing_over_paid_goes_negative() {
        let s = standing_from_sums(invoice(true), dec!(35), dec!(50), dec!(0.20));
        assert_eq!(s.totals.total_ttc, dec!(42.00));
        assert_eq!(s.remaining, dec!(-8.00));
    }
}
