//! Websocket connection adapter: delivers inbound patches to a [`Session`] and
//! carries forwarded event identifiers back to the server.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::TransportError;
use crate::forwarder::ChannelOutbound;
use crate::session::{Interaction, Session};

/// Drive `session` over a websocket at `url` until the server closes the
/// connection. Messages are applied one at a time, in arrival order.
pub async fn run(
    session: &mut Session,
    url: &Url,
    mut interactions: UnboundedReceiver<Interaction>,
) -> Result<(), TransportError> {
    let (stream, _) = connect_async(url.as_str()).await?;
    info!(target: "transport", %url, "connected");

    let (mut sink, mut source) = stream.split();
    let (outbound_tx, mut outbound_rx) = unbounded_channel();
    session.connect(ChannelOutbound::new(outbound_tx));

    let result = loop {
        tokio::select! {
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    session.handle_message(text.as_str());
                }
                Some(Ok(Message::Binary(_))) => {
                    warn!(target: "transport", "ignoring binary frame");
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(target: "transport", ?frame, "server closed connection");
                    if let Err(err) = sink.close().await {
                        debug!(target: "transport", error = %err, "close reply not delivered");
                    }
                    break Ok(());
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => break Err(err.into()),
                None => break Ok(()),
            },
            Some(interaction) = interactions.recv() => {
                session.interact(&interaction);
            }
            Some(message) = outbound_rx.recv() => {
                if let Err(err) = sink.send(Message::Text(message.into())).await {
                    break Err(err.into());
                }
            }
        }
    };

    session.disconnect();
    info!(target: "transport", %url, "disconnected");
    result
}
