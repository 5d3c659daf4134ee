use super::factory::{FrameStream, Transport};
use crate::messaging::{Handshake, Packet};
use crate::types::{RealtimeError, Result};
use futures::{SinkExt, StreamExt};

/// Runs the Engine.IO open + Socket.IO connect exchange on a fresh transport.
///
/// Expects `0{...}` from the server, answers `40`, then waits for the server's
/// `40` (accepted) or `44` (refused). Pings that arrive meanwhile are answered.
pub async fn perform(transport: &mut Transport) -> Result<Handshake> {
    let handshake = match next_packet(&mut transport.stream).await? {
        Packet::Open(handshake) => handshake,
        other => {
            return Err(RealtimeError::Protocol(format!(
                "expected open packet, got {:?}",
                other
            )));
        }
    };
    tracing::debug!(sid = %handshake.sid, "Engine.IO session opened");

    transport.sink.send(Packet::Connect(None).encode()?).await?;

    loop {
        match next_packet(&mut transport.stream).await? {
            Packet::Connect(_) => return Ok(handshake),
            Packet::ConnectError(message) => return Err(RealtimeError::Auth(message)),
            Packet::Ping => transport.sink.send(Packet::Pong.encode()?).await?,
            Packet::Close | Packet::Disconnect => {
                return Err(RealtimeError::Connection(
                    "server closed the session during handshake".to_string(),
                ));
            }
            other => tracing::debug!("Ignoring {:?} during handshake", other),
        }
    }
}

async fn next_packet(stream: &mut FrameStream) -> Result<Packet> {
    let frame = stream.next().await.ok_or_else(|| {
        RealtimeError::Connection("connection closed during handshake".to_string())
    })??;
    Packet::decode(&frame)
}
