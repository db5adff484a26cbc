use reqwest::Client;
use serde::Deserialize;

use crate::resp::error::ApiError;

/// Converts a dollar price to integer cents, the only representation the
/// gateway accepts. Rejects non-positive and non-finite amounts before any
/// network call is made.
pub fn to_minor_units(price: f64) -> Option<i64> {
    if !price.is_finite() || price <= 0.0 {
        return None;
    }

    Some((price * 100.0).round() as i64)
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// Stripe payment-intent adapter. Creating an intent has no local side
/// effects, so a failed call is always safe to retry.
#[derive(Clone)]
pub struct PaymentGateway {
    http: Client,
    secret_key: String,
    api_base: String,
    currency: String,
}

impl std::fmt::Debug for PaymentGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentGateway:{}:{}", self.api_base, self.currency)
    }
}

impl PaymentGateway {
    pub fn new(secret_key: String, api_base: String, currency: String) -> PaymentGateway {
        PaymentGateway {
            http: Client::new(),
            secret_key,
            api_base,
            currency,
        }
    }

    pub async fn create_payment_intent(&self, amount: i64) -> Result<PaymentIntent, ApiError> {
        let url = format!("{}/v1/payment_intents", self.api_base);

        let params = [
            ("amount", amount.to_string()),
            ("currency", self.currency.clone()),
            ("payment_method_types[]", "card".to_string()),
        ];

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("payment gateway rejected intent ({}): {}", status, body);
            return Err(ApiError::upstream("payment gateway rejected the request"));
        }

        let intent: PaymentIntent = response.json().await?;
        tracing::debug!("created payment intent {}", intent.id);

        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_dollars_become_cents() {
        assert_eq!(to_minor_units(10.0), Some(1000));
        assert_eq!(to_minor_units(1.0), Some(100));
    }

    #[test]
    fn fractional_prices_round_to_nearest_cent() {
        assert_eq!(to_minor_units(19.99), Some(1999));
        assert_eq!(to_minor_units(24.35), Some(2435));
        assert_eq!(to_minor_units(0.015), Some(2));
    }

    #[test]
    fn non_positive_prices_are_rejected() {
        assert_eq!(to_minor_units(0.0), None);
        assert_eq!(to_minor_units(-5.0), None);
    }

    #[test]
    fn non_finite_prices_are_rejected() {
        assert_eq!(to_minor_units(f64::NAN), None);
        assert_eq!(to_minor_units(f64::INFINITY), None);
        assert_eq!(to_minor_units(f64::NEG_INFINITY), None);
    }
}
