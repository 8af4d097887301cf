use crate::core::error::PipelineError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankProvider {
    JazzCash,
    Easypaisa,
    SadaPay,
    NayaPay,
    Unknown,
}

impl BankProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JazzCash => "jazzcash",
            Self::Easypaisa => "easypaisa",
            Self::SadaPay => "sadapay",
            Self::NayaPay => "nayapay",
            Self::Unknown => "unknown",
        }
    }

    /// Maps any unrecognised provider name to `Unknown`.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for BankProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BankProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jazzcash" => Ok(Self::JazzCash),
            "easypaisa" => Ok(Self::Easypaisa),
            "sadapay" => Ok(Self::SadaPay),
            "nayapay" => Ok(Self::NayaPay),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("Unknown bank provider: {}", other)),
        }
    }
}

/// Caller-supplied claims about the transaction the receipt is meant to prove.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionContext {
    claimed_amount: Decimal,
    claimed_sender: Option<String>,
    transaction_time: Option<String>,
    expected_bank: BankProvider,
}

impl TransactionContext {
    pub fn new(claimed_amount: Decimal, expected_bank: BankProvider) -> Result<Self, PipelineError> {
        if claimed_amount <= Decimal::ZERO {
            return Err(PipelineError::InvalidContext(format!(
                "claimed amount must be positive, got {}",
                claimed_amount
            )));
        }

        Ok(Self {
            claimed_amount,
            claimed_sender: None,
            transaction_time: None,
            expected_bank,
        })
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.claimed_sender = Some(sender.into());
        self
    }

    pub fn with_transaction_time(mut self, time: impl Into<String>) -> Self {
        self.transaction_time = Some(time.into());
        self
    }

    pub fn claimed_amount(&self) -> Decimal {
        self.claimed_amount
    }

    pub fn claimed_sender(&self) -> Option<&str> {
        self.claimed_sender.as_deref()
    }

    pub fn transaction_time(&self) -> Option<&str> {
        self.transaction_time.as_deref()
    }

    pub fn expected_bank(&self) -> BankProvider {
        self.expected_bank
    }

    pub fn vision_context(&self) -> VisionContext {
        VisionContext {
            claimed_amount: self.claimed_amount,
            expected_bank: self.expected_bank,
            transaction_time: self.transaction_time.clone(),
        }
    }
}

/// The subset of the transaction context forwarded to the remote model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisionContext {
    pub claimed_amount: Decimal,
    pub expected_bank: BankProvider,
    pub transaction_time: Option<String>,
}
