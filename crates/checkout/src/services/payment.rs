//! Payment service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use domain::{CreditCardInfo, Money};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::ServiceError;

/// Trait for capturing payments.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Charges `amount` to `card` and returns the transaction id.
    async fn charge(&self, amount: &Money, card: &CreditCardInfo) -> Result<String, ServiceError>;
}

/// Card networks the in-memory processor accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardType {
    Visa,
    Mastercard,
}

/// Checks a card number, its network and its expiry.
///
/// `today` is `(year, month)`.
pub fn validate_card(card: &CreditCardInfo, today: (i32, u32)) -> Result<CardType, ServiceError> {
    let digits: String = card
        .credit_card_number
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if digits.len() < 12 || !digits.bytes().all(|b| b.is_ascii_digit()) || !luhn_valid(&digits) {
        return Err(ServiceError::Declined("invalid credit card".to_string()));
    }

    let card_type = card_type(&digits).ok_or_else(|| {
        ServiceError::Declined(format!(
            "unsupported card type for card ending {}",
            card.last_four()
        ))
    })?;

    let (year, month) = today;
    let now = i64::from(year) * 12 + i64::from(month);
    let expiry = i64::from(card.credit_card_expiration_year) * 12
        + i64::from(card.credit_card_expiration_month);
    if now > expiry {
        return Err(ServiceError::Declined(format!(
            "card ending {} expired on {:02}/{}",
            card.last_four(),
            card.credit_card_expiration_month,
            card.credit_card_expiration_year
        )));
    }

    Ok(card_type)
}

fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

fn card_type(digits: &str) -> Option<CardType> {
    let prefix = |n: usize| digits.get(..n).and_then(|p| p.parse::<u32>().ok());

    if digits.starts_with('4') {
        return Some(CardType::Visa);
    }
    match (prefix(2), prefix(4)) {
        (Some(51..=55), _) => Some(CardType::Mastercard),
        (_, Some(2221..=2720)) => Some(CardType::Mastercard),
        _ => None,
    }
}

/// A captured charge as the processor's ledger keeps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRecord {
    pub amount: Money,
    pub card_type: CardType,
    pub last_four: String,
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    charges: HashMap<String, ChargeRecord>,
    fail_on_charge: bool,
    unavailable: bool,
}

/// In-memory payment processor for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentService {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentService {
    /// Creates a new in-memory payment service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to decline every charge.
    pub fn set_fail_on_charge(&self, fail: bool) {
        self.state.write().fail_on_charge = fail;
    }

    /// Configures the service to be unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unavailable = unavailable;
    }

    /// Returns the number of captured charges.
    pub fn charge_count(&self) -> usize {
        self.state.read().charges.len()
    }

    /// Returns the ledger entry for `transaction_id`.
    pub fn charge_record(&self, transaction_id: &str) -> Option<ChargeRecord> {
        self.state.read().charges.get(transaction_id).cloned()
    }

    /// Returns the amount captured under `transaction_id`.
    pub fn charged_amount(&self, transaction_id: &str) -> Option<Money> {
        self.charge_record(transaction_id).map(|record| record.amount)
    }
}

#[async_trait]
impl PaymentService for InMemoryPaymentService {
    async fn charge(&self, amount: &Money, card: &CreditCardInfo) -> Result<String, ServiceError> {
        let mut state = self.state.write();

        if state.unavailable {
            return Err(ServiceError::Unavailable(
                "payment service unreachable".to_string(),
            ));
        }
        if state.fail_on_charge {
            return Err(ServiceError::Declined("payment declined".to_string()));
        }
        if amount.is_negative() {
            return Err(ServiceError::InvalidArgument(format!(
                "cannot charge a negative amount: {amount}"
            )));
        }

        let now = Utc::now();
        let card_type = validate_card(card, (now.year(), now.month()))?;

        let transaction_id = Uuid::new_v4().to_string();
        tracing::debug!(
            %transaction_id,
            ?card_type,
            card = card.last_four(),
            %amount,
            "charge captured"
        );
        state.charges.insert(
            transaction_id.clone(),
            ChargeRecord {
                amount: amount.clone(),
                card_type,
                last_four: card.last_four().to_string(),
            },
        );

        Ok(transaction_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VISA: &str = "4432801561520454";
    const MASTERCARD: &str = "5555555555554444";
    const MASTERCARD_2_SERIES: &str = "2221000000000009";
    const AMEX: &str = "378282246310005";

    fn card(number: &str, year: i32, month: u32) -> CreditCardInfo {
        CreditCardInfo {
            credit_card_number: number.to_string(),
            credit_card_cvv: 672,
            credit_card_expiration_year: year,
            credit_card_expiration_month: month,
        }
    }

    #[test]
    fn test_accepts_visa_and_mastercard() {
        assert_eq!(
            validate_card(&card(VISA, 2030, 1), (2026, 10)).unwrap(),
            CardType::Visa
        );
        assert_eq!(
            validate_card(&card(MASTERCARD, 2030, 1), (2026, 10)).unwrap(),
            CardType::Mastercard
        );
        assert_eq!(
            validate_card(&card(MASTERCARD_2_SERIES, 2030, 1), (2026, 10)).unwrap(),
            CardType::Mastercard
        );
    }

    #[test]
    fn test_rejects_other_networks() {
        let result = validate_card(&card(AMEX, 2030, 1), (2026, 10));
        assert!(matches!(result, Err(ServiceError::Declined(msg)) if msg.contains("unsupported")));
    }

    #[test]
    fn test_rejects_bad_checksum() {
        let result = validate_card(&card("4432801561520455", 2030, 1), (2026, 10));
        assert!(matches!(result, Err(ServiceError::Declined(msg)) if msg.contains("invalid")));
    }

    #[test]
    fn test_expiry_month_is_inclusive() {
        assert!(validate_card(&card(VISA, 2026, 10), (2026, 10)).is_ok());
        assert!(validate_card(&card(VISA, 2026, 9), (2026, 10)).is_err());
    }

    #[tokio::test]
    async fn test_charge_returns_uuid() {
        let service = InMemoryPaymentService::new();
        let amount = Money::from_cents("EUR", 2_250).unwrap();

        let transaction_id = service.charge(&amount, &card(VISA, 2099, 12)).await.unwrap();
        assert!(Uuid::parse_str(&transaction_id).is_ok());
        assert_eq!(service.charge_count(), 1);
        assert_eq!(service.charged_amount(&transaction_id), Some(amount));
    }

    #[tokio::test]
    async fn test_ledger_keeps_card_details() {
        let service = InMemoryPaymentService::new();
        let amount = Money::from_cents("USD", 4_897).unwrap();

        let visa_id = service.charge(&amount, &card(VISA, 2099, 12)).await.unwrap();
        let mastercard_id = service
            .charge(&amount, &card(MASTERCARD, 2099, 12))
            .await
            .unwrap();

        assert_eq!(
            service.charge_record(&visa_id),
            Some(ChargeRecord {
                amount: amount.clone(),
                card_type: CardType::Visa,
                last_four: "0454".to_string(),
            })
        );
        let record = service.charge_record(&mastercard_id).unwrap();
        assert_eq!(record.card_type, CardType::Mastercard);
        assert_eq!(record.last_four, "4444");
        assert!(service.charge_record("unknown").is_none());
    }

    #[tokio::test]
    async fn test_fail_on_charge() {
        let service = InMemoryPaymentService::new();
        service.set_fail_on_charge(true);

        let amount = Money::from_cents("USD", 100).unwrap();
        let result = service.charge(&amount, &card(VISA, 2099, 12)).await;
        assert!(matches!(result, Err(ServiceError::Declined(_))));
        assert_eq!(service.charge_count(), 0);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let service = InMemoryPaymentService::new();
        service.set_unavailable(true);

        let amount = Money::from_cents("USD", 100).unwrap();
        let result = service.charge(&amount, &card(VISA, 2099, 12)).await;
        assert!(matches!(result, Err(ServiceError::Unavailable(_))));
    }
}
