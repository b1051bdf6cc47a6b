//! WebSocket transport for the realtime channel.
//!
//! Each dial spawns two tasks: a reader that decodes text frames into
//! [`Event`]s and a writer that drains the outbound queue. The reader ending
//! closes the session's inbound receiver; dropping the outbound sender makes
//! the writer send a close frame.

use async_trait::async_trait;
use events::Event;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, StatusCode, header};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use super::channel::{ChannelError, Connector, OUTBOUND_CAPACITY, Session};

#[derive(Clone, Copy, Debug, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str, token: Option<&str>) -> Result<Session, ChannelError> {
        let mut request = url.into_client_request().map_err(|e| ChannelError::InvalidUrl(e.to_string()))?;
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ChannelError::Connect(format!("invalid token header: {e}")))?;
            request.headers_mut().insert(header::AUTHORIZATION, value);
        }

        let (stream, _response) = connect_async(request).await.map_err(|e| match &e {
            WsError::Http(resp) if resp.status() == StatusCode::UNAUTHORIZED => ChannelError::Unauthorized,
            _ => ChannelError::Connect(e.to_string()),
        })?;
        let (mut sink, mut source) = stream.split();

        let (inbound_tx, inbound) = mpsc::channel::<Event>(OUTBOUND_CAPACITY);
        let (outbound, mut outbound_rx) = mpsc::channel::<Event>(OUTBOUND_CAPACITY);

        tokio::spawn(async move {
            while let Some(event) = outbound_rx.recv().await {
                let text = events::encode_event(&event);
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    tracing::warn!(error = %e, "ws send failed");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(message) = source.next().await {
                match message {
                    Ok(Message::Text(text)) => match events::decode_event(text.as_str()) {
                        Ok(event) => {
                            if inbound_tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "ws: dropping undecodable frame"),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "ws recv error");
                        break;
                    }
                }
            }
        });

        Ok(Session { inbound, outbound })
    }
}
