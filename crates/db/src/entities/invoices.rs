//! `SeaORM` Entity for the invoices table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub number: String,
    pub sale_date: Date,
    pub client_id: i64,
    pub package_count: i32,
    pub finalized: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::clients::Entity",
        from = "Column::ClientId",
        to = "super::clients::Column::Id"
    )]
    Clients,
    #[sea_orm(has_many = "super::invoice_lines::Entity")]
    InvoiceLines,
    #[sea_orm(has_many = "super::return_lines::Entity")]
    ReturnLines,
    #[sea_orm(has_many = "super::payment_applications::Entity")]
    PaymentApplications,
}

impl Related<super::clients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clients.def()
    }
}

impl Related<super::invoice_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvoiceLines.def()
    }
}

impl Related<super::return_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReturnLines.def()
    }
}

impl Related<super::payment_applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentApplications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
