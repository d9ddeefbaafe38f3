//! Client repository: client records, balances, and account history.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    sea_query::Expr,
};

use comptoir_core::billing::{self, ClientBalance};
use comptoir_shared::AppError;

use crate::entities::{clients, invoice_lines, invoices, payment_applications, payments};
use crate::repositories::invoice::{InvoiceStanding, standing_from_sums};

/// Error types for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Client not found.
    #[error("Client not found: {0}")]
    NotFound(i64),

    /// Cannot delete client because invoices or payments reference it.
    #[error("Cannot delete client: {invoices} invoice(s) and {payments} payment(s) reference it")]
    StillReferenced {
        /// Number of invoices referencing the client.
        invoices: u64,
        /// Number of payments referencing the client.
        payments: u64,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ClientError> for AppError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::NotFound(id) => Self::NotFound(format!("client {id}")),
            ClientError::StillReferenced { invoices, payments } => Self::Guard(format!(
                "client is referenced by {invoices} invoice(s) and {payments} payment(s)"
            )),
            ClientError::Database(err) => Self::Database(err.to_string()),
        }
    }
}

/// Input for creating a client.
#[derive(Debug, Clone)]
pub struct CreateClientInput {
    /// Client name.
    pub name: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
}

/// Input for partially updating a client; `None` keeps the previous value.
#[derive(Debug, Clone, Default)]
pub struct UpdateClientInput {
    /// Client name.
    pub name: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
}

/// A client with its computed outstanding balance.
#[derive(Debug, Clone)]
pub struct ClientWithBalance {
    /// The client record.
    pub client: clients::Model,
    /// Balance breakdown (invoiced, applied, outstanding).
    pub balance: ClientBalance,
}

/// One client's account history.
#[derive(Debug, Clone)]
pub struct ClientHistory {
    /// The client record.
    pub client: clients::Model,
    /// Finalized invoices, newest first, with their standings.
    pub invoices: Vec<InvoiceStanding>,
    /// Payments, newest first.
    pub payments: Vec<payments::Model>,
    /// Balance breakdown for the client.
    pub balance: ClientBalance,
}

/// Client repository for CRUD operations and balance queries.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    db: DatabaseConnection,
}

impl ClientRepository {
    /// Creates a new client repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, input: CreateClientInput) -> Result<clients::Model, ClientError> {
        let client = clients::ActiveModel {
            name: Set(input.name),
            phone: Set(input.phone),
            address: Set(input.address),
            city: Set(input.city),
            ..Default::default()
        };

        Ok(client.insert(&self.db).await?)
    }

    /// Lists all clients ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<clients::Model>, ClientError> {
        Ok(clients::Entity::find()
            .order_by_asc(clients::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Lists all clients with their outstanding balances.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_with_balances(
        &self,
        tax_rate: Decimal,
    ) -> Result<Vec<ClientWithBalance>, ClientError> {
        let clients = self.list().await?;

        let mut results = Vec::with_capacity(clients.len());
        for client in clients {
            let balance = self.balance(client.id, tax_rate).await?;
            results.push(ClientWithBalance { client, balance });
        }

        Ok(results)
    }

    /// Finds a client by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<clients::Model>, ClientError> {
        Ok(clients::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Updates a client; absent fields keep their previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the client is missing.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateClientInput,
    ) -> Result<clients::Model, ClientError> {
        let client = clients::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ClientError::NotFound(id))?;

        let mut active: clients::ActiveModel = client.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = input.address {
            active.address = Set(Some(address));
        }
        if let Some(city) = input.city {
            active.city = Set(Some(city));
        }

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a client.
    ///
    /// Rejected while any invoice or payment references the client; the
    /// check runs before any write is attempted.
    ///
    /// # Errors
    ///
    /// Returns an error if the client is missing or still referenced.
    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        let client = clients::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ClientError::NotFound(id))?;

        let invoice_count = invoices::Entity::find()
            .filter(invoices::Column::ClientId.eq(id))
            .count(&self.db)
            .await?;
        let payment_count = payments::Entity::find()
            .filter(payments::Column::ClientId.eq(id))
            .count(&self.db)
            .await?;

        if !billing::client_deletable(invoice_count, payment_count) {
            return Err(ClientError::StillReferenced {
                invoices: invoice_count,
                payments: payment_count,
            });
        }

        client.delete(&self.db).await?;
        Ok(())
    }

    /// Computes the client's outstanding balance.
    ///
    /// The invoiced side covers FINALIZED invoices only; the applied side
    /// covers applications on any of the client's invoices regardless of
    /// their finalization state. The asymmetry is intentional (see
    /// `comptoir_core::billing::client_balance`).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn balance(&self, id: i64, tax_rate: Decimal) -> Result<ClientBalance, ClientError> {
        let invoiced_ht = self.finalized_ht_total(id).await?;
        let applied = self.applied_total(id).await?;
        let invoiced_ttc = billing::totals_from_ht(invoiced_ht, tax_rate).total_ttc;
        Ok(billing::client_balance(invoiced_ttc, applied))
    }

    /// Loads one client's account history: finalized invoices with their
    /// standings, payments, and the balance breakdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the client is missing or a query fails.
    pub async fn history(&self, id: i64, tax_rate: Decimal) -> Result<ClientHistory, ClientError> {
        let client = clients::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ClientError::NotFound(id))?;

        let invoices = invoices::Entity::find()
            .filter(invoices::Column::ClientId.eq(id))
            .filter(invoices::Column::Finalized.eq(true))
            .order_by_desc(invoices::Column::SaleDate)
            .order_by_desc(invoices::Column::Id)
            .all(&self.db)
            .await?;

        let invoice_ids: Vec<i64> = invoices.iter().map(|i| i.id).collect();
        let ht_map = self.line_totals_for_invoices(&invoice_ids).await?;
        let applied_map = self.applied_for_invoices(&invoice_ids).await?;

        let standings = invoices
            .into_iter()
            .map(|inv| {
                let ht = ht_map.get(&inv.id).copied().unwrap_or(Decimal::ZERO);
                let applied = applied_map.get(&inv.id).copied().unwrap_or(Decimal::ZERO);
                standing_from_sums(inv, ht, applied, tax_rate)
            })
            .collect();

        let payments = payments::Entity::find()
            .filter(payments::Column::ClientId.eq(id))
            .order_by_desc(payments::Column::Date)
            .order_by_desc(payments::Column::Id)
            .all(&self.db)
            .await?;

        let balance = self.balance(id, tax_rate).await?;

        Ok(ClientHistory {
            client,
            invoices: standings,
            payments,
            balance,
        })
    }

    /// Pre-tax total over the client's finalized invoice lines.
    async fn finalized_ht_total(&self, client_id: i64) -> Result<Decimal, ClientError> {
        let sum: Option<Option<Decimal>> = invoice_lines::Entity::find()
            .select_only()
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
            .filter(invoices::Column::ClientId.eq(client_id))
            .filter(invoices::Column::Finalized.eq(true))
            .into_tuple()
            .one(&self.db)
            .await?;

        Ok(sum.flatten().unwrap_or(Decimal::ZERO))
    }

    /// Sum of applications on any of the client's invoices.
    ///
    /// Joined through the invoice's client id with NO filter on the
    /// finalized flag; a payment applied to a draft invoice still reduces
    /// the client's balance.
    async fn applied_total(&self, client_id: i64) -> Result<Decimal, ClientError> {
        let sum: Option<Option<Decimal>> = payment_applications::Entity::find()
            .select_only()
            .column_as(payment_applications::Column::Amount.sum(), "total")
            .join(
                JoinType::InnerJoin,
                payment_applications::Relation::Invoices.def(),
            )
            .filter(invoices::Column::ClientId.eq(client_id))
            .into_tuple()
            .one(&self.db)
            .await?;

        Ok(sum.flatten().unwrap_or(Decimal::ZERO))
    }

    /// Pre-tax line totals grouped by invoice, restricted to the given ids.
    async fn line_totals_for_invoices(
        &self,
        invoice_ids: &[i64],
    ) -> Result<std::collections::HashMap<i64, Decimal>, ClientError> {
        if invoice_ids.is_empty() {
            return Ok(std::collections::HashMap::new());
        }

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
            .filter(invoice_lines::Column::InvoiceId.is_in(invoice_ids.iter().copied()))
            .group_by(invoice_lines::Column::InvoiceId)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, total)| (id, total.unwrap_or(Decimal::ZERO)))
            .collect())
    }

    /// Applied amounts grouped by invoice, restricted to the given ids.
    async fn applied_for_invoices(
        &self,
        invoice_ids: &[i64],
    ) -> Result<std::collections::HashMap<i64, Decimal>, ClientError> {
        if invoice_ids.is_empty() {
            return Ok(std::collections::HashMap::new());
        }

        let rows: Vec<(i64, Option<Decimal>)> = payment_applications::Entity::find()
            .select_only()
            .column(payment_applications::Column::InvoiceId)
            .column_as(payment_applications::Column::Amount.sum(), "total")
            .filter(payment_applications::Column::InvoiceId.is_in(invoice_ids.iter().copied()))
            .group_by(payment_applications::Column::InvoiceId)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, total)| (id, total.unwrap_or(Decimal::ZERO)))
            .collect())
    }
}
