// Coinbase Pro REST API client
//
// All private endpoints are signed per the exchange contract:
// CB-ACCESS-SIGN is the base64 HMAC-SHA256 of timestamp + method +
// request path + body, keyed with the base64-decoded API secret. The
// timestamp comes from the exchange /time endpoint so a skewed local
// clock cannot invalidate signatures.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Method, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::warn;
use uuid::Uuid;

use crate::clients::{Account, ExchangeGateway, OrderOutcome, OrderRequest, Ticker};
use crate::config::ApiConfig;
use crate::error::{TradingError, TradingResult};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
pub struct CoinbaseRestClient {
    client: reqwest::Client,
    base_url: String,
    key: String,
    secret: String,
    passphrase: String,
}

#[derive(Debug, Deserialize)]
struct TimeResponse {
    epoch: f64,
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    price: Decimal,
    time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct OrderBody<'a> {
    client_oid: Uuid,
    product_id: &'a str,
    #[serde(rename = "type")]
    order_type: &'static str,
    side: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    funds: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    #[serde(default)]
    executed_value: Option<Decimal>,
    #[serde(default)]
    filled_size: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

impl CoinbaseRestClient {
    pub fn new(api: &ApiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: api.rest_url.trim_end_matches('/').to_string(),
            key: api.key.clone(),
            secret: api.secret.clone(),
            passphrase: api.passphrase.clone(),
        }
    }

    /// Current exchange time, formatted as the signature timestamp
    async fn server_timestamp(&self) -> TradingResult<String> {
        let url = format!("{}/time", self.base_url);
        let time: TimeResponse = self.client.get(&url).send().await?.json().await?;
        Ok(format!("{}", time.epoch))
    }

    fn sign(&self, timestamp: &str, method: &str, path: &str, body: &str) -> TradingResult<String> {
        let key = BASE64
            .decode(&self.secret)
            .map_err(|_| TradingError::ApiAuthentication("API secret is not valid base64".to_string()))?;

        let mut mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| TradingError::ApiAuthentication(e.to_string()))?;
        mac.update(timestamp.as_bytes());
        mac.update(method.as_bytes());
        mac.update(path.as_bytes());
        mac.update(body.as_bytes());

        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    async fn signed_request(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> TradingResult<reqwest::Response> {
        let timestamp = self.server_timestamp().await?;
        let body = body.unwrap_or_default();
        let signature = self.sign(&timestamp, method.as_str(), path, &body)?;

        let mut request = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Accept", "application/json")
            .header("CB-ACCESS-KEY", &self.key)
            .header("CB-ACCESS-SIGN", signature)
            .header("CB-ACCESS-TIMESTAMP", timestamp)
            .header("CB-ACCESS-PASSPHRASE", &self.passphrase);

        if !body.is_empty() {
            request = request
                .header("Content-Type", "application/json")
                .body(body);
        }

        Ok(request.send().await?)
    }

    async fn check_auth(response: reqwest::Response) -> TradingResult<reqwest::Response> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = rejection_message(response).await;
            Err(TradingError::ApiAuthentication(message))
        } else if !status.is_success() {
            Err(TradingError::ApiResponse(format!(
                "HTTP {}: {}",
                status,
                rejection_message(response).await
            )))
        } else {
            Ok(response)
        }
    }
}

/// Best-effort extraction of the exchange error message
async fn rejection_message(response: reqwest::Response) -> String {
    match response.json::<ErrorResponse>().await {
        Ok(err) => err.message,
        Err(_) => "no error message".to_string(),
    }
}

#[async_trait]
impl ExchangeGateway for CoinbaseRestClient {
    async fn ticker(&self, product_id: &str) -> TradingResult<Ticker> {
        let url = format!("{}/products/{}/ticker", self.base_url, product_id);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(TradingError::ApiResponse(format!(
                "ticker request for {} failed with HTTP {}",
                product_id,
                response.status()
            )));
        }

        let ticker: TickerResponse = response.json().await?;
        Ok(Ticker {
            price: ticker.price,
            time: ticker.time,
        })
    }

    async fn list_accounts(&self) -> TradingResult<Vec<Account>> {
        let response = self.signed_request(Method::GET, "/accounts", None).await?;
        let response = Self::check_auth(response).await?;
        Ok(response.json().await?)
    }

    async fn get_account(&self, id: &str) -> TradingResult<Account> {
        let path = format!("/accounts/{}", id);
        let response = self.signed_request(Method::GET, &path, None).await?;
        let response = Self::check_auth(response).await?;
        Ok(response.json().await?)
    }

    async fn submit_order(&self, request: &OrderRequest) -> TradingResult<OrderOutcome> {
        let body = OrderBody {
            client_oid: request.client_oid,
            product_id: &request.product_id,
            order_type: "market",
            side: request.side.as_str(),
            funds: request.funds.map(|f| f.to_string()),
            size: request.size.map(|s| s.to_string()),
        };
        let body = serde_json::to_string(&body)?;

        let response = self
            .signed_request(Method::POST, "/orders", Some(body))
            .await?;
        let status = response.status();

        if status.is_success() {
            let order: OrderResponse = response.json().await?;
            return Ok(OrderOutcome {
                filled: true,
                fill_price: fill_price_from(order),
            });
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = rejection_message(response).await;
            Err(TradingError::ApiAuthentication(message))
        } else if status.is_client_error() {
            // Ordinary rejection (insufficient funds, size below the
            // product minimum): reported as data, retried by the loop
            warn!(
                "{} order rejected by exchange: {}",
                request.side,
                rejection_message(response).await
            );
            Ok(OrderOutcome::rejected())
        } else {
            Err(TradingError::ApiResponse(format!(
                "order submission failed with HTTP {}",
                status
            )))
        }
    }
}

/// Market order responses report executed value and filled size; the
/// realized execution price is their quotient when both are present
fn fill_price_from(order: OrderResponse) -> Option<Decimal> {
    match (order.executed_value, order.filled_size) {
        (Some(value), Some(size)) if size > Decimal::ZERO => Some(value / size),
        _ => None,
    }
}
