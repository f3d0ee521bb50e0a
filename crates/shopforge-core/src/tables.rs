use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Schema namespace holding every generated table.
pub const SOURCE_SCHEMA: &str = "ecommerce";

/// Tables produced by the generator, in foreign-key dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    Categories,
    Products,
    Customers,
    Orders,
    OrderItems,
    Payments,
    Invoices,
    InvoiceItems,
}

impl TableName {
    /// All tables, parents before children.
    pub const ALL: [TableName; 8] = [
        TableName::Categories,
        TableName::Products,
        TableName::Customers,
        TableName::Orders,
        TableName::OrderItems,
        TableName::Payments,
        TableName::Invoices,
        TableName::InvoiceItems,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TableName::Categories => "categories",
            TableName::Products => "products",
            TableName::Customers => "customers",
            TableName::Orders => "orders",
            TableName::OrderItems => "order_items",
            TableName::Payments => "payments",
            TableName::Invoices => "invoices",
            TableName::InvoiceItems => "invoice_items",
        }
    }

    /// Schema-qualified name, e.g. `ecommerce.orders`.
    pub fn qualified(self) -> String {
        format!("{SOURCE_SCHEMA}.{}", self.as_str())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableName {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TableName::ALL
            .into_iter()
            .find(|table| table.as_str() == value)
            .ok_or_else(|| CoreError::Unknown {
                kind: "table",
                value: value.to_string(),
            })
    }
}
