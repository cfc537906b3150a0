//! Subscription to the sensor's ZeroMQ publisher

use anyhow::{Context, Result};
use tmftools::source::Source;
use tmftools::MAX_MSG_SIZE;
use tokio::runtime::Builder;
use tracing::{debug, info};
use zeromq::{Socket, SocketRecv, SubSocket};

/// Messages buffered between the socket thread and the session
const QUEUE_DEPTH: usize = 64;

/// Handle to a subscription running on its own thread.
///
/// Buffers arrive in publication order; dropping the handle ends the
/// subscription the next time a message is published.
pub struct ClientHandle {
    receiver: flume::Receiver<Result<Vec<u8>>>,
}

impl ClientHandle {
    pub fn new(uri: String) -> Result<Self> {
        let (sender, receiver) = flume::bounded(QUEUE_DEPTH);
        let rt = Builder::new_current_thread()
            .enable_all()
            .build()?;

        std::thread::spawn(move || {
            rt.block_on(async move {
                if let Err(e) = subscribe(&uri, &sender).await {
                    let _ = sender.send_async(Err(e)).await;
                }
            });
        });

        Ok(ClientHandle { receiver })
    }
}

async fn subscribe(uri: &str, sender: &flume::Sender<Result<Vec<u8>>>) -> Result<()> {
    let mut socket = SubSocket::new();
    socket
        .connect(uri)
        .await
        .with_context(|| format!("could not connect to {}", uri))?;
    socket.subscribe("").await?;
    info!(uri, "subscribed");

    loop {
        let msg = socket.recv().await?;
        let mut buf = Vec::with_capacity(MAX_MSG_SIZE);
        for frame in msg.into_vec() {
            buf.extend_from_slice(&frame);
        }
        if sender.send_async(Ok(buf)).await.is_err() {
            debug!("subscription dropped");
            return Ok(());
        }
    }
}

impl Source for ClientHandle {
    fn recv(&mut self) -> Result<Option<Vec<u8>>> {
        match self.receiver.recv() {
            Ok(Ok(buf)) => Ok(Some(buf)),
            Ok(Err(e)) => Err(e),
            // Socket thread is gone
            Err(_) => Ok(None),
        }
    }
}
