//! Payment repository: payments and their applications against invoices.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
    JoinType, ModelTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

use comptoir_core::billing;
use comptoir_shared::AppError;

use crate::entities::{clients, invoices, payment_applications, payments};

/// Error types for payment operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Payment number already exists.
    #[error("Payment number '{0}' already exists")]
    DuplicateNumber(String),

    /// Payment not found.
    #[error("Payment not found: {0}")]
    NotFound(i64),

    /// Referenced client not found.
    #[error("Client not found: {0}")]
    ClientNotFound(i64),

    /// Referenced invoice not found.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(i64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<PaymentError> for AppError {
    fn from(e: PaymentError) -> Self {
        match e {
            PaymentError::DuplicateNumber(number) => {
                Self::Conflict(format!("payment number '{number}' already exists"))
            }
            PaymentError::NotFound(id) => Self::NotFound(format!("payment {id}")),
            PaymentError::ClientNotFound(id) => Self::NotFound(format!("client {id}")),
            PaymentError::InvoiceNotFound(id) => Self::NotFound(format!("invoice {id}")),
            PaymentError::Database(err) => Self::Database(err.to_string()),
        }
    }
}

/// Input for creating a payment.
#[derive(Debug, Clone)]
pub struct CreatePaymentInput {
    /// Payment number (globally unique).
    pub number: String,
    /// Paying client.
    pub client_id: i64,
    /// Payment date.
    pub date: NaiveDate,
    /// Amount received.
    pub amount: Decimal,
    /// Bank name, if paid by cheque or transfer.
    pub bank: Option<String>,
    /// Due date, for deferred instruments.
    pub due_date: Option<NaiveDate>,
}

/// Input for partially updating a payment; `None` keeps the previous value.
#[derive(Debug, Clone, Default)]
pub struct UpdatePaymentInput {
    /// Payment number.
    pub number: Option<String>,
    /// Payment date.
    pub date: Option<NaiveDate>,
    /// Amount received.
    pub amount: Option<Decimal>,
    /// Bank name.
    pub bank: Option<String>,
    /// Due date.
    pub due_date: Option<NaiveDate>,
}

/// Input for applying part of a payment to an invoice.
#[derive(Debug, Clone)]
pub struct ApplyPaymentInput {
    /// Target invoice.
    pub invoice_id: i64,
    /// Amount applied. Nothing prevents the payment's applications from
    /// exceeding its amount; the remaining figure goes negative instead.
    pub amount: Decimal,
}

/// One application with its target invoice's number for display.
#[derive(Debug, Clone, FromQueryResult)]
pub struct ApplicationRow {
    /// Application id.
    pub id: i64,
    /// Target invoice id.
    pub invoice_id: i64,
    /// Target invoice number.
    pub invoice_number: String,
    /// Amount applied.
    pub amount: Decimal,
}

/// A payment with its applications and remaining balance.
#[derive(Debug, Clone)]
pub struct PaymentDetail {
    /// The payment record.
    pub payment: payments::Model,
    /// Applications against invoices, insertion order.
    pub applications: Vec<ApplicationRow>,
    /// Sum of the applied amounts.
    pub applied: Decimal,
    /// `amount - applied`; negative when over-applied.
    pub remaining: Decimal,
}

/// Assembles a payment detail from its loaded parts.
///
/// Pure; extracted so the remaining-balance arithmetic can be tested without
/// database access.
#[must_use]
pub fn detail_from_parts(
    payment: payments::Model,
    applications: Vec<ApplicationRow>,
) -> PaymentDetail {
    let applied: Decimal = applications.iter().map(|a| a.amount).sum();
    let remaining = billing::payment_remaining(payment.amount, applied);
    PaymentDetail {
        payment,
        applications,
        applied,
        remaining,
    }
}

/// Payment repository for CRUD operations and applications.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the number is already taken or the client does
    /// not exist.
    pub async fn create(&self, input: CreatePaymentInput) -> Result<payments::Model, PaymentError> {
        self.ensure_number_free(&input.number, None).await?;
        if clients::Entity::find_by_id(input.client_id)
            .one(&self.db)
            .await?
            .is_none()
        {
            return Err(PaymentError::ClientNotFound(input.client_id));
        }

        let payment = payments::ActiveModel {
            number: Set(input.number),
            client_id: Set(input.client_id),
            date: Set(input.date),
            amount: Set(input.amount),
            bank: Set(input.bank),
            due_date: Set(input.due_date),
            ..Default::default()
        };

        Ok(payment.insert(&self.db).await?)
    }

    /// Finds a payment by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<payments::Model>, PaymentError> {
        Ok(payments::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Loads a payment with its applications and remaining balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_detail(&self, id: i64) -> Result<Option<PaymentDetail>, PaymentError> {
        let Some(payment) = payments::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let applications: Vec<ApplicationRow> = payment_applications::Entity::find()
            .select_only()
            .column(payment_applications::Column::Id)
            .column(payment_applications::Column::InvoiceId)
            .column_as(invoices::Column::Number, "invoice_number")
            .column(payment_applications::Column::Amount)
            .join(
                JoinType::InnerJoin,
                payment_applications::Relation::Invoices.def(),
            )
            .filter(payment_applications::Column::PaymentId.eq(id))
            .order_by_asc(payment_applications::Column::Id)
            .into_model::<ApplicationRow>()
            .all(&self.db)
            .await?;

        Ok(Some(detail_from_parts(payment, applications)))
    }

    /// Lists all payments, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<payments::Model>, PaymentError> {
        Ok(payments::Entity::find()
            .order_by_desc(payments::Column::Date)
            .order_by_desc(payments::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Lists one client's payments, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_client(
        &self,
        client_id: i64,
    ) -> Result<Vec<payments::Model>, PaymentError> {
        Ok(payments::Entity::find()
            .filter(payments::Column::ClientId.eq(client_id))
            .order_by_desc(payments::Column::Date)
            .order_by_desc(payments::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Updates a payment; absent fields keep their previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment is missing or the new number is
    /// taken.
    pub async fn update(
        &self,
        id: i64,
        input: UpdatePaymentInput,
    ) -> Result<payments::Model, PaymentError> {
        let payment = payments::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(PaymentError::NotFound(id))?;

        if let Some(number) = &input.number
            && *number != payment.number
        {
            self.ensure_number_free(number, Some(id)).await?;
        }

        let mut active: payments::ActiveModel = payment.into();
        if let Some(number) = input.number {
            active.number = Set(number);
        }
        if let Some(date) = input.date {
            active.date = Set(date);
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(bank) = input.bank {
            active.bank = Set(Some(bank));
        }
        if let Some(due_date) = input.due_date {
            active.due_date = Set(Some(due_date));
        }

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a payment; its applications cascade with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment is missing.
    pub async fn delete(&self, id: i64) -> Result<(), PaymentError> {
        let payment = payments::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(PaymentError::NotFound(id))?;

        payment.delete(&self.db).await?;
        Ok(())
    }

    /// Applies part of a payment to an invoice.
    ///
    /// Over-application is not prevented here or anywhere else; the
    /// payment's remaining figure simply goes negative.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment or invoice does not exist.
    pub async fn apply(
        &self,
        payment_id: i64,
        input: ApplyPaymentInput,
    ) -> Result<payment_applications::Model, PaymentError> {
        if payments::Entity::find_by_id(payment_id)
            .one(&self.db)
            .await?
            .is_none()
        {
            return Err(PaymentError::NotFound(payment_id));
        }
        if invoices::Entity::find_by_id(input.invoice_id)
            .one(&self.db)
            .await?
            .is_none()
        {
            return Err(PaymentError::InvoiceNotFound(input.invoice_id));
        }

        let application = payment_applications::ActiveModel {
            payment_id: Set(payment_id),
            invoice_id: Set(input.invoice_id),
            amount: Set(input.amount),
            ..Default::default()
        };

        Ok(application.insert(&self.db).await?)
    }

    async fn ensure_number_free(
        &self,
        number: &str,
        exclude_id: Option<i64>,
    ) -> Result<(), PaymentError> {
        let mut query = payments::Entity::find().filter(payments::Column::Number.eq(number));
        if let Some(id) = exclude_id {
            query = query.filter(payments::Column::Id.ne(id));
        }
        if query.one(&self.db).await?.is_some() {
            return Err(PaymentError::DuplicateNumber(number.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payment(amount: Decimal) -> payments::Model {
        payments::Model {
            id: 3,
            number: "P-2026-003".to_string(),
            client_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(),
            amount,
            bank: Some("BMCE".to_string()),
            due_date: None,
        }
    }

    fn application(amount: Decimal) -> ApplicationRow {
        ApplicationRow {
            id: 1,
            invoice_id: 9,
            invoice_number: "F-2026-009".to_string(),
            amount,
        }
    }

    #[test]
    fn test_detail_remaining() {
        let detail = detail_from_parts(
            payment(dec!(200)),
            vec![application(dec!(100)), application(dec!(50))],
        );
        assert_eq!(detail.applied, dec!(150));
        assert_eq!(detail.remaining, dec!(50));
    }

    #[test]
    fn test_detail_no_applications() {
        let detail = detail_from_parts(payment(dec!(200)), vec![]);
        assert_eq!(detail.applied, Decimal::ZERO);
        assert_eq!(detail.remaining, dec!(200));
    }

    #[test]
    fn test_detail_over_applied_goes_negative() {
        let detail = detail_from_parts(
            payment(dec!(200)),
            vec![application(dec!(150)), application(dec!(60))],
        );
        assert_eq!(detail.remaining, dec!(-10));
    }
}
