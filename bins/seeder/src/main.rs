//! Database seeder for Comptoir development and testing.
//!
//! Seeds a handful of clients and products, one finalized invoice with
//! lines and a return, and a payment applied against the invoice, so every
//! screen has something to show.
//!
//! Usage: cargo run --bin seeder

use chrono::NaiveDate;
use rust_decimal::Decimal;

use comptoir_core::auth::hash_password;
use comptoir_db::repositories::client::{ClientRepository, CreateClientInput};
use comptoir_db::repositories::invoice::{
    AddLineInput, AddReturnInput, CreateInvoiceInput, InvoiceRepository,
};
use comptoir_db::repositories::payment::{
    ApplyPaymentInput, CreatePaymentInput, PaymentRepository,
};
use comptoir_db::repositories::product::{
    CreateProductInput, OpeningStockInput, ProductRepository,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = comptoir_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding clients...");
    let clients = ClientRepository::new(db.clone());
    let atlas = clients
        .create(CreateClientInput {
            name: "Atlas Distribution".to_string(),
            phone: Some("0522-000-111".to_string()),
            address: Some("12 Rue des Orangers".to_string()),
            city: Some("Casablanca".to_string()),
        })
        .await
        .expect("Failed to seed client");
    clients
        .create(CreateClientInput {
            name: "Menara Emballage".to_string(),
            phone: Some("0524-333-444".to_string()),
            address: None,
            city: Some("Marrakech".to_string()),
        })
        .await
        .expect("Failed to seed client");

    println!("Seeding products...");
    let products = ProductRepository::new(db.clone());
    let carton = products
        .create(CreateProductInput {
            reference: "CRT-6040".to_string(),
            name: "Carton 60x40".to_string(),
            purchase_price: Decimal::new(400, 2),
            standard_price: Decimal::new(650, 2),
            opening_stock: Some(OpeningStockInput {
                date: date(2026, 1, 5),
                quantity: 100,
            }),
        })
        .await
        .expect("Failed to seed product");
    let film = products
        .create(CreateProductInput {
            reference: "FLM-0500".to_string(),
            name: "Film etirable 500mm".to_string(),
            purchase_price: Decimal::new(1800, 2),
            standard_price: Decimal::new(2500, 2),
            opening_stock: Some(OpeningStockInput {
                date: date(2026, 1, 5),
                quantity: 40,
            }),
        })
        .await
        .expect("Failed to seed product");

    println!("Seeding invoice...");
    let invoices = InvoiceRepository::new(db.clone());
    let invoice = invoices
        .create(CreateInvoiceInput {
            number: "F-2026-0001".to_string(),
            sale_date: date(2026, 2, 10),
            client_id: atlas.id,
            package_count: 3,
        })
        .await
        .expect("Failed to seed invoice");
    invoices
        .add_line(
            invoice.id,
            AddLineInput {
                product_id: carton.id,
                unit_price: Decimal::new(650, 2),
                quantity: 30,
            },
        )
        .await
        .expect("Failed to seed invoice line");
    invoices
        .add_line(
            invoice.id,
            AddLineInput {
                product_id: film.id,
                unit_price: Decimal::new(2500, 2),
                quantity: 10,
            },
        )
        .await
        .expect("Failed to seed invoice line");
    invoices
        .add_return(
            invoice.id,
            AddReturnInput {
                product_id: carton.id,
                unit_price: Decimal::new(650, 2),
                quantity: 5,
                date: date(2026, 2, 20),
            },
        )
        .await
        .expect("Failed to seed return line");
    invoices
        .set_finalized(invoice.id, true)
        .await
        .expect("Failed to finalize invoice");

    println!("Seeding payment...");
    let payments = PaymentRepository::new(db.clone());
    let payment = payments
        .create(CreatePaymentInput {
            number: "P-2026-0001".to_string(),
            client_id: atlas.id,
            date: date(2026, 3, 1),
            amount: Decimal::new(30000, 2),
            bank: Some("BMCE".to_string()),
            due_date: None,
        })
        .await
        .expect("Failed to seed payment");
    payments
        .apply(
            payment.id,
            ApplyPaymentInput {
                invoice_id: invoice.id,
                amount: Decimal::new(20000, 2),
            },
        )
        .await
        .expect("Failed to seed payment application");

    let hash = hash_password("change-me").expect("Failed to hash password");
    println!("Seeding complete!");
    println!();
    println!("Development admin hash (password \"change-me\"):");
    println!("COMPTOIR__AUTH__PASSWORD_HASH='{hash}'");
}
