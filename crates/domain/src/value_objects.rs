//! Identifiers and money.

use common::DocumentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random ID.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an ID from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Parses an ID from its hyphenated string form.
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for DocumentId {
            fn from(id: $name) -> Self {
                DocumentId::from_uuid(id.0)
            }
        }

        impl From<DocumentId> for $name {
            fn from(id: DocumentId) -> Self {
                Self(id.as_uuid())
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a user account (consumer or merchant).
    UserId
);

entity_id!(
    /// Unique identifier for a product listing.
    ProductId
);

entity_id!(
    /// Unique identifier for an order.
    OrderId
);

/// Money amount in minor currency units (cents, paise).
///
/// Serialized as a bare integer. The operators saturate at the `i64` bounds;
/// use [`Money::checked_multiply`] and [`Money::checked_add`] where an
/// overflow must be reported.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a new amount from minor units.
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in minor units.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies by a quantity, or None on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    /// Multiplies by a quantity, clamping at the `i64` bounds.
    pub fn saturating_multiply(&self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Adds two amounts, or None on overflow.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Divides evenly across `count` parts, rounding toward zero.
    ///
    /// Returns zero when `count` is zero.
    pub fn average_over(&self, count: u64) -> Money {
        if count == 0 {
            return Money::zero();
        }
        Money(self.0 / count as i64)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_convert_to_and_from_document_ids() {
        let id = ProductId::new();
        let doc: DocumentId = id.into();
        assert_eq!(doc.as_uuid(), id.as_uuid());
        assert_eq!(ProductId::from(doc), id);
    }

    #[test]
    fn ids_parse_from_strings() {
        let id = OrderId::new();
        assert_eq!(OrderId::parse(&id.to_string()).unwrap(), id);
        assert!(UserId::parse("nope").is_err());
    }

    #[test]
    fn money_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!(a.checked_multiply(3), Some(Money::from_cents(3000)));

        let mut c = a;
        c += b;
        assert_eq!(c.cents(), 1500);
    }

    #[test]
    fn money_checked_arithmetic_reports_overflow() {
        let big = Money::from_cents(10_000_000_000);
        assert_eq!(big.checked_multiply(1_000_000_000), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(i64::MAX - 1).checked_add(Money::from_cents(1)),
            Some(Money::from_cents(i64::MAX))
        );
    }

    #[test]
    fn money_operators_saturate() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!(max + Money::from_cents(1), max);
        assert_eq!(max.saturating_multiply(2), max);
        let min = Money::from_cents(i64::MIN);
        assert_eq!(min - Money::from_cents(1), min);

        let mut total = max;
        total += Money::from_cents(500);
        assert_eq!(total, max);
    }

    #[test]
    fn money_sum() {
        let total: Money = [100, 250, 50].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 400);
    }

    #[test]
    fn money_average_guards_zero_count() {
        assert_eq!(Money::from_cents(1000).average_over(0), Money::zero());
        assert_eq!(Money::from_cents(1000).average_over(3).cents(), 333);
    }

    #[test]
    fn money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "12.34");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-12.34");
        assert_eq!(
            Money::from_cents(i64::MIN).to_string(),
            "-92233720368547758.08"
        );
    }

    #[test]
    fn money_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Money::from_cents(2000)).unwrap(), "2000");
        let m: Money = serde_json::from_str("60").unwrap();
        assert_eq!(m.cents(), 60);
    }
}
