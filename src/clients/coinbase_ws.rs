// WebSocket client for the Coinbase market data feed

use futures_util::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::debug;

use crate::error::{TradingError, TradingResult};

pub struct CoinbaseFeedClient {
    ws_sender: futures_util::stream::SplitSink<
        tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
        Message,
    >,
    ws_receiver: futures_util::stream::SplitStream<
        tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    >,
}

/// A trade printed on the ticker channel
#[derive(Debug, Clone)]
pub struct TickerEvent {
    pub product_id: String,
    pub price: Decimal,
    pub high_24h: Option<Decimal>,
    pub low_24h: Option<Decimal>,
}

impl CoinbaseFeedClient {
    pub async fn connect(url: &str) -> TradingResult<Self> {
        let (ws_stream, _) = connect_async(url).await?;
        let (ws_sender, ws_receiver) = ws_stream.split();

        Ok(Self {
            ws_sender,
            ws_receiver,
        })
    }

    pub async fn subscribe_ticker(&mut self, product_id: &str) -> TradingResult<()> {
        let subscribe_message = json!({
            "type": "subscribe",
            "product_ids": [product_id],
            "channels": ["ticker"]
        });

        self.ws_sender
            .send(Message::Text(subscribe_message.to_string()))
            .await?;

        Ok(())
    }

    /// Next ticker print from the feed. Returns `None` when the
    /// connection closes; feed-level error messages (e.g. an invalid
    /// subscription) surface as errors.
    pub async fn next_ticker(&mut self) -> TradingResult<Option<TickerEvent>> {
        while let Some(message) = self.ws_receiver.next().await {
            match message? {
                Message::Text(text) => {
                    let data: Value = match serde_json::from_str(&text) {
                        Ok(data) => data,
                        Err(_) => continue,
                    };

                    match data.get("type").and_then(|t| t.as_str()) {
                        Some("ticker") => {
                            if let Some(event) = parse_ticker_event(&data) {
                                return Ok(Some(event));
                            }
                        }
                        Some("error") => {
                            let message = data
                                .get("message")
                                .and_then(|m| m.as_str())
                                .unwrap_or("feed error");
                            return Err(TradingError::WebSocket(message.to_string()));
                        }
                        Some("subscriptions") => {
                            debug!("ticker subscription confirmed");
                        }
                        _ => {}
                    }
                }
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }

        Ok(None)
    }
}

pub fn parse_ticker_event(data: &Value) -> Option<TickerEvent> {
    let product_id = data.get("product_id")?.as_str()?.to_string();
    let price = data.get("price")?.as_str()?.parse::<Decimal>().ok()?;
    let high_24h = data
        .get("high_24h")
        .and_then(|h| h.as_str())
        .and_then(|h| h.parse::<Decimal>().ok());
    let low_24h = data
        .get("low_24h")
        .and_then(|l| l.as_str())
        .and_then(|l| l.parse::<Decimal>().ok());

    Some(TickerEvent {
        product_id,
        price,
        high_24h,
        low_24h,
    })
}
