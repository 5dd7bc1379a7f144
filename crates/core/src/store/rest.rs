//! REST (PostgREST-compatible) fulfillment store.
//!
//! Records are written to `{url}/rest/v1/transactions` and
//! `{url}/rest/v1/tickets`; the access key is sent both as the `apikey`
//! header and as a bearer token.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::{FulfillmentStore, StoreError, TicketRecord, TransactionRecord};
use crate::config::RestConfig;
use crate::identifiers::TransactionCode;

const TRANSACTIONS: &str = "transactions";
const TICKETS: &str = "tickets";

/// Fulfillment store backed by a PostgREST endpoint.
pub struct RestFulfillmentStore {
    client: Client,
    config: RestConfig,
}

impl RestFulfillmentStore {
    pub fn new(config: RestConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| StoreError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn send(&self, request: RequestBuilder, key: &str) -> Result<Response, StoreError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::CONFLICT => Err(StoreError::Conflict(key.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(StoreError::Http(format!("{}: {}", status, body)))
            }
        }
    }

    async fn insert<T: serde::Serialize + Sync>(
        &self,
        table: &str,
        record: &T,
        key: &str,
    ) -> Result<(), StoreError> {
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(record);
        self.send(request, key).await?;
        debug!(table = table, key = key, "Record inserted");
        Ok(())
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        code: &TransactionCode,
    ) -> Result<Vec<T>, StoreError> {
        let request = self.client.get(self.table_url(table)).query(&[
            ("transaction_code", format!("eq.{}", code)),
            ("select", "*".to_string()),
        ]);
        self.send(request, code.as_str())
            .await?
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl FulfillmentStore for RestFulfillmentStore {
    async fn insert_transaction(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        self.insert(TRANSACTIONS, record, record.transaction_code.as_str())
            .await
    }

    async fn insert_ticket(&self, record: &TicketRecord) -> Result<(), StoreError> {
        self.insert(TICKETS, record, record.ticket_code.as_str()).await
    }

    async fn mark_delivered(&self, code: &TransactionCode) -> Result<(), StoreError> {
        let request = self
            .client
            .patch(self.table_url(TRANSACTIONS))
            .query(&[("transaction_code", format!("eq.{}", code))])
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({ "delivered": true }));
        self.send(request, code.as_str()).await?;
        Ok(())
    }

    async fn get_transaction(
        &self,
        code: &TransactionCode,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        Ok(self.select(TRANSACTIONS, code).await?.into_iter().next())
    }

    async fn list_tickets(&self, code: &TransactionCode) -> Result<Vec<TicketRecord>, StoreError> {
        self.select(TICKETS, code).await
    }
}
