//! Payment and credit-package types

use serde::{Deserialize, Serialize};

/// Kind of entitlement a payment event grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// One-time premium upgrade
    PremiumSubscription,
    /// Consumable credit package
    CreditPackage,
}

impl std::fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PremiumSubscription => write!(f, "premium_subscription"),
            Self::CreditPackage => write!(f, "credit_package"),
        }
    }
}

impl std::str::FromStr for PaymentKind {
    type Err = PaymentKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "premium_subscription" => Ok(Self::PremiumSubscription),
            "credit_package" => Ok(Self::CreditPackage),
            _ => Err(PaymentKindParseError(s.to_string())),
        }
    }
}

/// Error parsing a payment kind string
#[derive(Debug, Clone)]
pub struct PaymentKindParseError(pub String);

impl std::fmt::Display for PaymentKindParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid payment kind: {}", self.0)
    }
}

impl std::error::Error for PaymentKindParseError {}

/// Purchasable credit packages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditPack {
    /// 10 credits
    Starter,
    /// 30 credits
    Popular,
    /// 100 credits
    Large,
}

impl CreditPack {
    /// Number of credits this pack grants
    pub const fn credits(&self) -> i64 {
        match self {
            Self::Starter => 10,
            Self::Popular => 30,
            Self::Large => 100,
        }
    }

    /// Pack price in cents. Premium members buy at a discount.
    pub const fn price_cents(&self, is_premium: bool) -> u32 {
        match (self, is_premium) {
            (Self::Starter, false) => 399,
            (Self::Starter, true) => 299,
            (Self::Popular, false) => 999,
            (Self::Popular, true) => 699,
            (Self::Large, false) => 1_999,
            (Self::Large, true) => 1_499,
        }
    }

    /// Display name used on checkout line items
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Starter => "Starter Pack",
            Self::Popular => "Popular Pack",
            Self::Large => "Premium Pack",
        }
    }
}

impl std::fmt::Display for CreditPack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Starter => write!(f, "starter"),
            Self::Popular => write!(f, "popular"),
            Self::Large => write!(f, "large"),
        }
    }
}

impl std::str::FromStr for CreditPack {
    type Err = CreditPackParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "starter" => Ok(Self::Starter),
            "popular" => Ok(Self::Popular),
            "large" | "premium" => Ok(Self::Large),
            _ => Err(CreditPackParseError(s.to_string())),
        }
    }
}

/// Error parsing a credit pack string
#[derive(Debug, Clone)]
pub struct CreditPackParseError(pub String);

impl std::fmt::Display for CreditPackParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid credit pack: {}", self.0)
    }
}

impl std::error::Error for CreditPackParseError {}

/// A purchasable item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purchase {
    /// One-time premium upgrade, $9.99
    Premium,
    /// A credit package
    Credits(CreditPack),
}

impl Purchase {
    /// Price in cents for the buying user
    pub const fn price_cents(&self, is_premium: bool) -> u32 {
        match self {
            Self::Premium => 999,
            Self::Credits(pack) => pack.price_cents(is_premium),
        }
    }

    /// Entitlement kind this purchase grants
    pub const fn kind(&self) -> PaymentKind {
        match self {
            Self::Premium => PaymentKind::PremiumSubscription,
            Self::Credits(_) => PaymentKind::CreditPackage,
        }
    }

    /// Credits granted by this purchase (zero for premium upgrades)
    pub const fn credits_granted(&self) -> i64 {
        match self {
            Self::Premium => 0,
            Self::Credits(pack) => pack.credits(),
        }
    }

    /// Line-item name shown at checkout
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Premium => "Premium Subscription",
            Self::Credits(pack) => pack.display_name(),
        }
    }
}
