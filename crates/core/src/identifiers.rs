//! Transaction and ticket code derivation.
//!
//! A transaction code is the hex SHA-256 of the request attributes salted
//! with the current time, so two identical purchases never share a code.
//! Ticket codes append the 1-based ticket index to the transaction code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Identifier binding all artifacts of one fulfillment request together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionCode(String);

impl TransactionCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TransactionCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// Identifier of one ticket within a transaction; encoded into its QR symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketCode(String);

impl TicketCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TicketCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// Derive the transaction code for a request.
///
/// The salt is rendered as Unix nanoseconds so that requests arriving
/// within the same second still diverge.
pub fn derive_transaction_code(
    event_id: &str,
    quantity: u32,
    buyer_email: &str,
    salt: DateTime<Utc>,
) -> TransactionCode {
    let salt = salt
        .timestamp_nanos_opt()
        .unwrap_or_else(|| salt.timestamp_micros());
    let material = format!("{}{}{}{}", event_id, quantity, buyer_email, salt);
    TransactionCode(format!("{:x}", Sha256::digest(material.as_bytes())))
}

/// Derive the code of ticket `index` (1-based) within a transaction.
pub fn derive_ticket_code(txn: &TransactionCode, index: u32) -> TicketCode {
    TicketCode(format!("{}-{}", txn.0, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::collections::HashSet;

    fn fixed_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_transaction_code_is_64_char_lowercase_hex() {
        let code = derive_transaction_code("EVT1", 3, "a@b.com", fixed_instant());
        assert_eq!(code.as_str().len(), 64);
        assert!(code
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_transaction_code_is_deterministic_for_same_salt() {
        let a = derive_transaction_code("EVT1", 3, "a@b.com", fixed_instant());
        let b = derive_transaction_code("EVT1", 3, "a@b.com", fixed_instant());
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_instants_give_different_codes() {
        let t0 = fixed_instant();
        let a = derive_transaction_code("EVT1", 3, "a@b.com", t0);
        let b = derive_transaction_code("EVT1", 3, "a@b.com", t0 + Duration::seconds(1));
        let c = derive_transaction_code("EVT1", 3, "a@b.com", t0 + Duration::nanoseconds(1));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_each_attribute_changes_the_code() {
        let t0 = fixed_instant();
        let base = derive_transaction_code("EVT1", 3, "a@b.com", t0);
        assert_ne!(base, derive_transaction_code("EVT2", 3, "a@b.com", t0));
        assert_ne!(base, derive_transaction_code("EVT1", 4, "a@b.com", t0));
        assert_ne!(base, derive_transaction_code("EVT1", 3, "c@d.com", t0));
    }

    #[test]
    fn test_ticket_code_format() {
        let txn = TransactionCode::from("abc123".to_string());
        assert_eq!(derive_ticket_code(&txn, 1).as_str(), "abc123-1");
        assert_eq!(derive_ticket_code(&txn, 12).as_str(), "abc123-12");
    }

    #[test]
    fn test_ticket_codes_are_pairwise_distinct_with_shared_prefix() {
        let txn = derive_transaction_code("EVT1", 250, "a@b.com", fixed_instant());
        let codes: Vec<TicketCode> = (1..=250).map(|i| derive_ticket_code(&txn, i)).collect();

        let unique: HashSet<&str> = codes.iter().map(|c| c.as_str()).collect();
        assert_eq!(unique.len(), 250);

        let prefix = format!("{}-", txn);
        assert!(codes.iter().all(|c| c.as_str().starts_with(&prefix)));
    }

    #[test]
    fn test_codes_serialize_as_plain_strings() {
        let txn = TransactionCode::from("abc".to_string());
        let ticket = derive_ticket_code(&txn, 2);
        assert_eq!(serde_json::to_string(&txn).unwrap(), "\"abc\"");
        assert_eq!(serde_json::to_string(&ticket).unwrap(), "\"abc-2\"");
    }
}
