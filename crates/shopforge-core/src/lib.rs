//! Core contracts shared across shopforge crates.
//!
//! Defines the ecommerce labels, generated entity rows, the table catalog,
//! column-typed table frames, runtime settings and connection redaction
//! used by the generator, the persistence helpers and the staging exporter.

pub mod entities;
pub mod error;
pub mod frame;
pub mod labels;
pub mod redaction;
pub mod settings;
pub mod tables;

pub use entities::{
    Category, Customer, Invoice, InvoiceItem, Order, OrderItem, Payment, Product, ProductRef,
};
pub use error::{CoreError, Result};
pub use frame::{CellValue, ColumnKind, ColumnSpec, TableFrame};
pub use labels::{
    CustomerSegment, Gender, InvoiceStatus, OrderStatus, PaymentMethod, PaymentStatus,
    SalesChannel,
};
pub use redaction::{RedactedConnection, redact_connection_string};
pub use settings::{DatabaseSettings, ObjectStorageSettings, OrchestrationSettings, Settings};
pub use tables::{SOURCE_SCHEMA, TableName};
