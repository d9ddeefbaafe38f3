//! CSV export encoding.
//!
//! Exports are semicolon-delimited to match the spreadsheet conventions of
//! the documents this ledger replaces.

use comptoir_db::entities::clients;
use comptoir_db::repositories::inventory::InventoryReport;
use comptoir_shared::AppError;

/// Errors that can occur while encoding an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// CSV encoding failed.
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    /// Flushing the CSV buffer failed.
    #[error("CSV buffer error: {0}")]
    Io(#[from] std::io::Error),

    /// The encoded output was not valid UTF-8.
    #[error("CSV output was not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        Self::Internal(e.to_string())
    }
}

/// Encodes the client list as CSV.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn clients_csv(rows: &[clients::Model]) -> Result<String, ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(vec![]);

    wtr.write_record(["name", "phone", "address", "city"])?;
    for client in rows {
        wtr.write_record([
            client.name.as_str(),
            client.phone.as_deref().unwrap_or(""),
            client.address.as_deref().unwrap_or(""),
            client.city.as_deref().unwrap_or(""),
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Encodes the inventory report as CSV, with a trailing totals row.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn inventory_csv(report: &InventoryReport) -> Result<String, ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(vec![]);

    wtr.write_record([
        "reference",
        "name",
        "quantity_received",
        "purchase_price",
        "total_purchase",
        "standard_price",
        "quantity_sold",
        "total_sales",
        "stock",
    ])?;

    for row in &report.rows {
        wtr.write_record([
            row.reference.clone(),
            row.name.clone(),
            row.quantity_received.to_string(),
            row.purchase_price.to_string(),
            row.total_purchase.to_string(),
            row.standard_price.to_string(),
            row.quantity_sold.to_string(),
            row.total_sales.to_string(),
            row.quantity_available.to_string(),
        ])?;
    }

    wtr.write_record([
        "TOTAL".to_string(),
        String::new(),
        String::new(),
        String::new(),
        report.total_purchase.to_string(),
        String::new(),
        String::new(),
        report.total_sales.to_string(),
        String::new(),
    ])?;

    let bytes = wtr
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use comptoir_db::repositories::inventory::InventoryRow;
    use rust_decimal_macros::dec;

    fn client(name: &str, city: Option<&str>) -> clients::Model {
        clients::Model {
            id: 1,
            name: name.to_string(),
            phone: Some("0600000000".to_string()),
            address: None,
            city: city.map(ToString::to_string),
        }
    }

    #[test]
    fn test_clients_csv() {
        let csv = clients_csv(&[client("Atlas Distribution", Some("Casablanca"))]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("name;phone;address;city"));
        assert_eq!(
            lines.next(),
            Some("Atlas Distribution;0600000000;;Casablanca")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_clients_csv_quotes_delimiter() {
        let csv = clients_csv(&[client("A;B", None)]).unwrap();
        assert!(csv.lines().nth(1).unwrap().starts_with("\"A;B\""));
    }

    #[test]
    fn test_inventory_csv_totals_row() {
        let report = InventoryReport {
            rows: vec![InventoryRow {
                product_id: 1,
                reference: "REF-1".to_string(),
                name: "Carton".to_string(),
                quantity_received: 100,
                purchase_price: dec!(4.00),
                total_purchase: dec!(400.00),
                standard_price: dec!(6.50),
                quantity_sold: 25,
                total_sales: dec!(162.50),
                quantity_available: 75,
            }],
            total_purchase: dec!(400.00),
            total_sales: dec!(162.50),
            total_profit: dec!(-237.50),
        };

        let csv = inventory_csv(&report).unwrap();
        let last = csv.lines().last().unwrap();
        assert_eq!(last, "TOTAL;;;;400.00;;;162.50;");
    }
}
