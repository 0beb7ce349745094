//! Order status policy.

use serde::{Deserialize, Serialize};

use super::OrderError;

/// The fulfilment status of an order.
///
/// Transitions a merchant may request:
/// ```text
/// Pending ──► Processing ──► Shipped ──► Delivered
///    │            │             │
///    └────────────┴─────────────┴──► Cancelled
/// ```
/// Re-requesting the current status is allowed for non-terminal orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, not yet picked up by the merchant.
    #[default]
    Pending,

    /// Being prepared.
    Processing,

    /// Handed to the carrier.
    Shipped,

    /// Received by the customer (terminal state).
    Delivered,

    /// Cancelled by the customer or a merchant (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Statuses a merchant may move the order to from this one.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[
                OrderStatus::Pending,
                OrderStatus::Processing,
                OrderStatus::Cancelled,
            ],
            OrderStatus::Processing => &[
                OrderStatus::Processing,
                OrderStatus::Shipped,
                OrderStatus::Cancelled,
            ],
            OrderStatus::Shipped => &[
                OrderStatus::Shipped,
                OrderStatus::Delivered,
                OrderStatus::Cancelled,
            ],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    /// Returns true if a merchant may move the order to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    /// Returns true if the customer may still cancel.
    pub fn can_customer_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(OrderError::UnknownStatus)
    }
}

/// Checks a merchant-requested status change.
///
/// Terminal orders reject every request, including a no-op.
pub fn check_transition(current: OrderStatus, requested: OrderStatus) -> Result<(), OrderError> {
    if current.is_terminal() {
        return Err(OrderError::Terminal { current });
    }
    if !current.can_transition_to(requested) {
        return Err(OrderError::InvalidTransition { current, requested });
    }
    Ok(())
}

/// Whether money for an order has been collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Every payment status.
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    /// Returns the wire name of the payment status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(OrderError::UnknownPaymentStatus)
    }
}

/// How the customer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Cash,
    Paypal,
}

impl std::str::FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(PaymentMethod::Card),
            "cash" => Ok(PaymentMethod::Cash),
            "paypal" => Ok(PaymentMethod::Paypal),
            _ => Err(OrderError::UnknownPaymentMethod(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
        assert_eq!(PaymentMethod::default(), PaymentMethod::Card);
    }

    #[test]
    fn test_transition_table() {
        use OrderStatus::*;

        let allowed = [
            (Pending, Pending),
            (Pending, Processing),
            (Pending, Cancelled),
            (Processing, Processing),
            (Processing, Shipped),
            (Processing, Cancelled),
            (Shipped, Shipped),
            (Shipped, Delivered),
            (Shipped, Cancelled),
        ];

        for current in OrderStatus::ALL {
            for requested in OrderStatus::ALL {
                let expected = allowed.contains(&(current, requested));
                assert_eq!(
                    check_transition(current, requested).is_ok(),
                    expected,
                    "{current} -> {requested}"
                );
            }
        }
    }

    #[test]
    fn test_terminal_rejects_even_noop() {
        assert!(matches!(
            check_transition(OrderStatus::Delivered, OrderStatus::Delivered),
            Err(OrderError::Terminal {
                current: OrderStatus::Delivered
            })
        ));
        assert!(matches!(
            check_transition(OrderStatus::Cancelled, OrderStatus::Pending),
            Err(OrderError::Terminal {
                current: OrderStatus::Cancelled
            })
        ));
    }

    #[test]
    fn test_skipping_ahead_is_rejected() {
        let err = check_transition(OrderStatus::Pending, OrderStatus::Delivered).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot change status from pending to delivered"
        );
    }

    #[test]
    fn test_only_pending_is_customer_cancellable() {
        for status in OrderStatus::ALL {
            assert_eq!(status.can_customer_cancel(), status == OrderStatus::Pending);
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_parse_status() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!(matches!(
            "lost".parse::<OrderStatus>(),
            Err(OrderError::UnknownStatus)
        ));
        assert_eq!("refunded".parse::<PaymentStatus>().unwrap(), PaymentStatus::Refunded);
        assert!("card".parse::<PaymentStatus>().is_err());
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&OrderStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        let status: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, OrderStatus::Processing);
    }
}
