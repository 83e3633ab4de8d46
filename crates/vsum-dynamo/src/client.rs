//! DynamoDB client wrapper.
//!
//! Adds to the SDK client:
//! - Table configuration from the environment
//! - Retry with backoff on throttling and network failures
//! - Observability (tracing spans, metrics)

use std::collections::HashMap;
use std::time::Instant;

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::{Builder, Region};
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tracing::{debug, info, info_span, Instrument};

use crate::error::{StoreError, StoreResult};
use crate::item::{UpdatePlan, GSI1, GSI1_PARTITION, GSI1_PK, PK};
use crate::metrics::record_request;
use crate::retry::{with_retry, RetryConfig};

/// Default article table.
pub const DEFAULT_TABLE: &str = "SummarizedSubtitles";

// =============================================================================
// Configuration
// =============================================================================

/// DynamoDB client configuration.
#[derive(Debug, Clone)]
pub struct DynamoConfig {
    pub table_name: String,
    pub region: String,
    /// Custom endpoint (DynamoDB Local); unset for AWS itself
    pub endpoint_url: Option<String>,
    pub retry: RetryConfig,
}

impl Default for DynamoConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE.to_string(),
            region: "us-east-1".to_string(),
            endpoint_url: None,
            retry: RetryConfig::default(),
        }
    }
}

impl DynamoConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        let table_name =
            std::env::var("DYNAMODB_TABLE").unwrap_or_else(|_| DEFAULT_TABLE.to_string());

        if table_name.is_empty() {
            return Err(StoreError::config("DYNAMODB_TABLE cannot be empty"));
        }

        Ok(Self {
            table_name,
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            endpoint_url: std::env::var("DYNAMODB_ENDPOINT_URL")
                .ok()
                .filter(|u| !u.is_empty()),
            retry: RetryConfig::from_env(),
        })
    }
}

// =============================================================================
// Client
// =============================================================================

/// DynamoDB client bound to the article table.
#[derive(Clone)]
pub struct DynamoClient {
    client: Client,
    config: DynamoConfig,
}

impl DynamoClient {
    /// Create a new client from configuration.
    pub async fn new(config: DynamoConfig) -> StoreResult<Self> {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        info!(table = %config.table_name, "DynamoDB client initialized");

        Ok(Self {
            client: Client::from_conf(builder.build()),
            config,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StoreResult<Self> {
        Self::new(DynamoConfig::from_env()?).await
    }

    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Apply an update plan to the item keyed by `video_id`.
    pub async fn update(&self, operation: &str, video_id: &str, plan: &UpdatePlan) -> StoreResult<()> {
        self.execute_request(operation, Some(video_id), async {
            with_retry(&self.config.retry, operation, || async {
                let mut request = self
                    .client
                    .update_item()
                    .table_name(&self.config.table_name)
                    .key(PK, AttributeValue::S(video_id.to_string()))
                    .update_expression(&plan.update_expression)
                    .set_expression_attribute_names(Some(plan.names.clone()))
                    .set_expression_attribute_values(Some(plan.values.clone()));

                if let Some(condition) = &plan.condition {
                    request = request.condition_expression(condition);
                }

                request
                    .send()
                    .await
                    .map_err(|e| StoreError::from_sdk(operation, e))?;
                Ok(())
            })
            .await
        })
        .await
    }

    /// Strongly consistent read of one item.
    pub async fn get_item(
        &self,
        video_id: &str,
    ) -> StoreResult<Option<HashMap<String, AttributeValue>>> {
        self.execute_request("get_item", Some(video_id), async {
            with_retry(&self.config.retry, "get_item", || async {
                let output = self
                    .client
                    .get_item()
                    .table_name(&self.config.table_name)
                    .key(PK, AttributeValue::S(video_id.to_string()))
                    .consistent_read(true)
                    .send()
                    .await
                    .map_err(|e| StoreError::from_sdk("get_item", e))?;
                Ok(output.item().cloned())
            })
            .await
        })
        .await
    }

    /// Query `GSI1` newest first.
    pub async fn query_recent(&self, limit: usize) -> StoreResult<Vec<HashMap<String, AttributeValue>>> {
        let limit = i32::try_from(limit).unwrap_or(i32::MAX).max(1);

        self.execute_request("query_recent", None, async {
            with_retry(&self.config.retry, "query_recent", || async {
                let output = self
                    .client
                    .query()
                    .table_name(&self.config.table_name)
                    .index_name(GSI1)
                    .key_condition_expression("#pk = :pk")
                    .expression_attribute_names("#pk", GSI1_PK)
                    .expression_attribute_values(":pk", AttributeValue::S(GSI1_PARTITION.to_string()))
                    .scan_index_forward(false)
                    .limit(limit)
                    .send()
                    .await
                    .map_err(|e| StoreError::from_sdk("query_recent", e))?;
                debug!(count = output.count(), "GSI1 query returned");
                Ok(output.items().to_vec())
            })
            .await
        })
        .await
    }

    /// Check the table exists and is reachable.
    pub async fn check_connectivity(&self) -> StoreResult<()> {
        self.client
            .describe_table()
            .table_name(&self.config.table_name)
            .send()
            .await
            .map_err(|e| StoreError::from_sdk("describe_table", e))?;
        Ok(())
    }

    async fn execute_request<T, F>(&self, operation: &str, video_id: Option<&str>, fut: F) -> StoreResult<T>
    where
        F: std::future::Future<Output = StoreResult<T>>,
    {
        let span = if let Some(id) = video_id {
            info_span!("dynamodb_request", operation = %operation, table = %self.config.table_name, video_id = %id)
        } else {
            info_span!("dynamodb_request", operation = %operation, table = %self.config.table_name)
        };

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => "ok",
            Err(e) => e.metric_label(),
        };
        record_request(operation, status, latency_ms);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DynamoConfig::default();
        assert_eq!(config.table_name, "SummarizedSubtitles");
        assert_eq!(config.region, "us-east-1");
        assert!(config.endpoint_url.is_none());
        assert_eq!(config.retry.max_retries, 3);
    }
}
