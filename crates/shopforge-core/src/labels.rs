//! Categorical labels stored as text columns.
//!
//! Each label serializes to the exact string persisted in the database, so
//! config files, CSV renders and SQL rows all agree on spelling.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

macro_rules! label_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($label => Ok($name::$variant),)+
                    other => Err(CoreError::Unknown {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

label_enum! {
    /// Customer value segment.
    CustomerSegment, "customer segment" {
        Vip => "VIP",
        Regular => "Regular",
        Occasional => "Occasional",
        New => "New",
    }
}

label_enum! {
    /// Channel an order was placed through.
    SalesChannel, "sales channel" {
        Website => "Website",
        MobileApp => "Mobile App",
        Marketplace => "Marketplace",
        Store => "Store",
    }
}

label_enum! {
    PaymentMethod, "payment method" {
        CreditCard => "Credit Card",
        BankTransfer => "Bank Transfer",
        Cod => "COD",
        EWallet => "E-Wallet",
    }
}

label_enum! {
    /// Lifecycle status of an order.
    OrderStatus, "order status" {
        Completed => "Completed",
        Delivered => "Delivered",
        Shipped => "Shipped",
        Processing => "Processing",
        Pending => "Pending",
        Cancelled => "Cancelled",
        Refunded => "Refunded",
    }
}

label_enum! {
    PaymentStatus, "payment status" {
        Completed => "Completed",
        Processing => "Processing",
        Pending => "Pending",
        Failed => "Failed",
        Refunded => "Refunded",
    }
}

label_enum! {
    InvoiceStatus, "invoice status" {
        Paid => "Paid",
        Issued => "Issued",
        Closed => "Closed",
    }
}

label_enum! {
    Gender, "gender" {
        Male => "Male",
        Female => "Female",
        Other => "Other",
    }
}

impl PaymentMethod {
    /// Gateways that can process the method. Cash on delivery has none.
    pub fn gateways(self) -> &'static [&'static str] {
        match self {
            PaymentMethod::CreditCard => &["VNPay", "OnePay", "Stripe"],
            PaymentMethod::BankTransfer => &["VNPay", "Direct Bank"],
            PaymentMethod::Cod => &[],
            PaymentMethod::EWallet => &["Momo", "ZaloPay", "VNPay"],
        }
    }
}

impl OrderStatus {
    /// Orders in a fulfilled status are the only ones that get invoiced.
    pub fn is_fulfilled(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_their_text() {
        for channel in SalesChannel::ALL {
            assert_eq!(channel.as_str().parse::<SalesChannel>().unwrap(), *channel);
        }
        assert_eq!(PaymentMethod::EWallet.to_string(), "E-Wallet");
    }

    #[test]
    fn serde_uses_the_persisted_spelling() {
        let json = serde_json::to_string(&SalesChannel::MobileApp).unwrap();
        assert_eq!(json, "\"Mobile App\"");
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = "Lost".parse::<OrderStatus>().unwrap_err();
        assert!(err.to_string().contains("order status"));
    }

    #[test]
    fn only_completed_and_delivered_are_fulfilled() {
        let fulfilled: Vec<_> = OrderStatus::ALL
            .iter()
            .filter(|status| status.is_fulfilled())
            .collect();
        assert_eq!(fulfilled, [&OrderStatus::Completed, &OrderStatus::Delivered]);
    }

    #[test]
    fn cod_has_no_gateway() {
        assert!(PaymentMethod::Cod.gateways().is_empty());
        assert!(!PaymentMethod::CreditCard.gateways().is_empty());
    }
}
