//! Status enums shared with the backend.
//!
//! All of them travel as `SCREAMING_SNAKE_CASE` strings, and `Display` /
//! `FromStr` use the same spelling so CLI input matches the wire format.

use serde::{Deserialize, Serialize};

/// Error returned when a status string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

macro_rules! wire_names {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// All variants in lifecycle order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire spelling of this value.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = ParseStatusError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
                match normalized.as_str() {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(ParseStatusError {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

/// Order lifecycle status.
///
/// The happy path runs `Pending → Confirmed → Processing → Shipped →
/// OutForDelivery → Delivered`. `Cancelled` and `Returned` are alternate
/// terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
    Returned,
}

wire_names!(OrderStatus, "order status", {
    Pending => "PENDING",
    Confirmed => "CONFIRMED",
    Processing => "PROCESSING",
    Shipped => "SHIPPED",
    OutForDelivery => "OUT_FOR_DELIVERY",
    Delivered => "DELIVERED",
    Cancelled => "CANCELLED",
    Returned => "RETURNED",
});

impl OrderStatus {
    /// Whether the order can move from `self` to `next`.
    ///
    /// Forward moves along the fulfilment path may skip steps. Cancelling is
    /// allowed until the order ships; a return is only possible once it has
    /// left the warehouse.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        match next {
            Self::Cancelled => matches!(self, Self::Pending | Self::Confirmed | Self::Processing),
            Self::Returned => matches!(self, Self::Shipped | Self::OutForDelivery | Self::Delivered),
            _ => match (self.fulfilment_step(), next.fulfilment_step()) {
                (Some(from), Some(to)) => to > from,
                _ => false,
            },
        }
    }

    /// No further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Returned)
    }

    /// Whether the order has not shipped yet and can still be cancelled.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::Processing)
    }

    const fn fulfilment_step(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Confirmed => Some(1),
            Self::Processing => Some(2),
            Self::Shipped => Some(3),
            Self::OutForDelivery => Some(4),
            Self::Delivered => Some(5),
            Self::Cancelled | Self::Returned => None,
        }
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

wire_names!(PaymentStatus, "payment status", {
    Pending => "PENDING",
    Processing => "PROCESSING",
    Completed => "COMPLETED",
    Failed => "FAILED",
    Refunded => "REFUNDED",
});

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
    DigitalWallet,
    CashOnDelivery,
}

wire_names!(PaymentMethod, "payment method", {
    CreditCard => "CREDIT_CARD",
    DebitCard => "DEBIT_CARD",
    Paypal => "PAYPAL",
    DigitalWallet => "DIGITAL_WALLET",
    CashOnDelivery => "CASH_ON_DELIVERY",
});

impl PaymentMethod {
    /// Card methods need card details at checkout.
    #[must_use]
    pub const fn is_card(self) -> bool {
        matches!(self, Self::CreditCard | Self::DebitCard)
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreditCard => "Credit Card",
            Self::DebitCard => "Debit Card",
            Self::Paypal => "PayPal",
            Self::DigitalWallet => "Digital Wallet",
            Self::CashOnDelivery => "Cash on Delivery",
        }
    }
}
