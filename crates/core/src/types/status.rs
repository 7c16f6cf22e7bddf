//! Status enums reported by the backend.
//!
//! Wire values are `snake_case`. Each enum carries a human label for
//! templates and parses back from the same wire string so admin forms can
//! post it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a status string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} status: {value}")]
pub struct UnknownStatus {
    kind: &'static str,
    value: String,
}

macro_rules! wire_enum {
    ($name:ident, $kind:literal, { $($variant:ident => ($wire:literal, $label:literal)),+ $(,)? }) => {
        impl $name {
            /// Every variant, in lifecycle order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire representation.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }

            /// Human readable label.
            #[must_use]
            pub const fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(UnknownStatus {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

wire_enum!(OrderStatus, "order", {
    Pending => ("pending", "Awaiting payment"),
    Paid => ("paid", "Paid"),
    Processing => ("processing", "Processing"),
    Shipped => ("shipped", "Shipped"),
    Delivered => ("delivered", "Delivered"),
    Cancelled => ("cancelled", "Cancelled"),
    Refunded => ("refunded", "Refunded"),
});

impl OrderStatus {
    /// Whether staff may still move this order along.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Paid | Self::Processing | Self::Shipped)
    }
}

/// Payment status as relayed from the payment processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    Succeeded,
    Canceled,
    Failed,
}

wire_enum!(PaymentStatus, "payment", {
    RequiresPaymentMethod => ("requires_payment_method", "Awaiting payment details"),
    RequiresConfirmation => ("requires_confirmation", "Awaiting confirmation"),
    RequiresAction => ("requires_action", "Action required"),
    Processing => ("processing", "Processing"),
    Succeeded => ("succeeded", "Paid"),
    Canceled => ("canceled", "Canceled"),
    Failed => ("failed", "Failed"),
});

impl PaymentStatus {
    /// Whether the order can be considered paid.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Processing)
    }
}

/// Taproom reservation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    #[default]
    Pending,
    Confirmed,
    Seated,
    Cancelled,
    NoShow,
}

wire_enum!(ReservationStatus, "reservation", {
    Pending => ("pending", "Requested"),
    Confirmed => ("confirmed", "Confirmed"),
    Seated => ("seated", "Seated"),
    Cancelled => ("cancelled", "Cancelled"),
    NoShow => ("no_show", "No show"),
});

impl ReservationStatus {
    /// Whether a guest may still cancel a reservation in this status.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_strings_match_serde() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        for status in PaymentStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        for status in ReservationStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!(
            "no_show".parse::<ReservationStatus>().unwrap(),
            ReservationStatus::NoShow
        );
        let err = "lost".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown order status: lost");
    }

    #[test]
    fn test_cancellable() {
        assert!(ReservationStatus::Pending.is_cancellable());
        assert!(ReservationStatus::Confirmed.is_cancellable());
        assert!(!ReservationStatus::Seated.is_cancellable());
        assert!(!ReservationStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_order_open() {
        assert!(OrderStatus::Paid.is_open());
        assert!(!OrderStatus::Delivered.is_open());
        assert!(!OrderStatus::Refunded.is_open());
    }
}
