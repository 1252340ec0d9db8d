//! Framing for deal protocol messages.
//!
//! Every message travels as a single length delimited frame (u32 big endian
//! length prefix) holding the bincode encoding of the message.

use anyhow::anyhow;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

use crate::error::ExchangeError;

/// Largest frame either side will accept
pub const MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

fn codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .max_frame_length(MAX_MESSAGE_SIZE)
        .new_codec()
}

pub fn encode<T: Serialize>(message: &T) -> Result<Bytes, bincode::Error> {
    bincode::serialize(message).map(Bytes::from)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, bincode::Error> {
    bincode::deserialize(bytes)
}

/// Write one framed message and flush it
pub async fn write_frame<W>(writer: W, message: Bytes) -> Result<(), ExchangeError>
where
    W: AsyncWrite + Unpin,
{
    let mut framed = FramedWrite::new(writer, codec());
    framed
        .send(message)
        .await
        .map_err(|e| ExchangeError::Write(e.into()))
}

/// Read exactly one framed message
pub async fn read_frame<R>(reader: R) -> Result<Bytes, ExchangeError>
where
    R: AsyncRead + Unpin,
{
    let mut framed = FramedRead::new(reader, codec());
    match framed.next().await {
        Some(Ok(frame)) => Ok(frame.freeze()),
        Some(Err(e)) => Err(ExchangeError::Read(e.into())),
        None => Err(ExchangeError::NoResponse),
    }
}

/// Write `request` then block on a single response frame from the same stream
pub async fn request_response<W, R>(
    writer: W,
    reader: R,
    request: Bytes,
) -> Result<Bytes, ExchangeError>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    if request.len() > MAX_MESSAGE_SIZE {
        return Err(ExchangeError::Write(anyhow!(
            "request of {} bytes exceeds the {} byte frame limit",
            request.len(),
            MAX_MESSAGE_SIZE
        )));
    }
    write_frame(writer, request).await?;
    read_frame(reader).await
}
