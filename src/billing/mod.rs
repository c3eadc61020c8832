pub mod metadata;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::config::BillingConfig;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItem {
    pub id: String,
    #[serde(default)]
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItems {
    pub data: Vec<SubscriptionItem>,
}

/// The subset of the provider's subscription object this service reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSubscription {
    pub id: String,
    pub status: String,
    pub items: SubscriptionItems,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

impl ProviderSubscription {
    /// The seat item. Monthly contract subscriptions carry exactly one item.
    pub fn first_item(&self) -> Result<&SubscriptionItem, BillingError> {
        self.items.data.first().ok_or_else(|| {
            BillingError::UnexpectedResponse(format!("subscription {} has no items", self.id))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Source {
    id: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SourceList {
    data: Vec<Source>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Parameters for a new monthly subscription.
#[derive(Debug, Clone)]
pub struct NewSubscription<'a> {
    pub customer: &'a str,
    pub quantity: i64,
    pub metadata: HashMap<String, String>,
    pub payment_method_id: Option<&'a str>,
    pub source_id: Option<&'a str>,
}

/// REST client for the subscription billing provider.
#[derive(Clone)]
pub struct BillingClient {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
    monthly_price_id: String,
}

impl BillingClient {
    pub fn new(config: &BillingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
            monthly_price_id: config.monthly_price_id.clone(),
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BillingError> {
        let response = request.bearer_auth(&self.secret_key).send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or(text);
            return Err(BillingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| BillingError::UnexpectedResponse(e.to_string()))
    }

    pub async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<ProviderSubscription, BillingError> {
        debug!(subscription_id, "retrieving subscription");
        let url = format!("{}/subscriptions/{subscription_id}", self.api_base);
        self.send(self.client.get(url)).await
    }

    /// Update `cancel_at_period_end` and merge `metadata` into the subscription.
    pub async fn update_subscription(
        &self,
        subscription_id: &str,
        cancel_at_period_end: bool,
        metadata: &HashMap<String, String>,
    ) -> Result<ProviderSubscription, BillingError> {
        let mut form = vec![(
            "cancel_at_period_end".to_string(),
            cancel_at_period_end.to_string(),
        )];
        form.extend(metadata_form(metadata));

        let url = format!("{}/subscriptions/{subscription_id}", self.api_base);
        self.send(self.client.post(url).form(&form)).await
    }

    pub async fn update_item_quantity(
        &self,
        item_id: &str,
        quantity: i64,
    ) -> Result<SubscriptionItem, BillingError> {
        debug!(item_id, quantity, "updating subscription item quantity");
        let form = [("quantity", quantity.to_string())];
        let url = format!("{}/subscription_items/{item_id}", self.api_base);
        self.send(self.client.post(url).form(&form)).await
    }

    pub async fn create_subscription(
        &self,
        params: NewSubscription<'_>,
    ) -> Result<ProviderSubscription, BillingError> {
        let mut form = vec![
            ("customer".to_string(), params.customer.to_string()),
            ("items[0][price]".to_string(), self.monthly_price_id.clone()),
            ("items[0][quantity]".to_string(), params.quantity.to_string()),
        ];
        if let Some(payment_method_id) = params.payment_method_id {
            form.push((
                "default_payment_method".to_string(),
                payment_method_id.to_string(),
            ));
        } else if let Some(source_id) = params.source_id {
            form.push(("default_source".to_string(), source_id.to_string()));
        }
        form.extend(metadata_form(&params.metadata));

        let url = format!("{}/subscriptions", self.api_base);
        self.send(self.client.post(url).form(&form)).await
    }

    /// First verified bank-account source of the customer, if any.
    pub async fn customer_bank_source(
        &self,
        customer_id: &str,
    ) -> Result<Option<String>, BillingError> {
        let url = format!(
            "{}/customers/{customer_id}/sources?object=bank_account",
            self.api_base
        );
        let sources: SourceList = self.send(self.client.get(url)).await?;

        Ok(sources
            .data
            .into_iter()
            .find(|s| s.status.as_deref().is_none_or(|status| status == "verified"))
            .map(|s| s.id))
    }
}

fn metadata_form(metadata: &HashMap<String, String>) -> Vec<(String, String)> {
    metadata
        .iter()
        .map(|(key, value)| (format!("metadata[{key}]"), value.clone()))
        .collect()
}
