//! A scriptable peer standing in for the simulator.

use bytes::{Buf, BufMut, BytesMut};
use futures::StreamExt;
use serde_json::Value;
use tokio_util::codec::{Decoder, Encoder, FramedRead, FramedWrite};

use crate::codec::{find_header_end, parse_content_length};
use crate::error::CodecError;
use crate::transport::SimTransport;

/// Codec that frames raw JSON values in both directions.
///
/// The real [`crate::SimCodec`] bakes in the client's view of the
/// protocol (decode updates, encode commands). Tests playing the
/// simulator's side need the mirror image, and passing raw
/// [`Value`]s lets them script any payload, malformed ones included.
#[derive(Debug, Default)]
struct RawJsonCodec;

impl Decoder for RawJsonCodec {
    type Item = Value;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(header_end) = find_header_end(src) else {
            return Ok(None);
        };
        let content_length = parse_content_length(&src[..header_end])?;
        let total_length = header_end + 4 + content_length;
        if src.len() < total_length {
            return Ok(None);
        }
        let value = serde_json::from_slice(&src[header_end + 4..total_length])
            .map_err(|e| CodecError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        src.advance(total_length);
        Ok(Some(value))
    }
}

impl Encoder<Value> for RawJsonCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Value, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_vec(&item).map_err(CodecError::JsonSerialize)?;
        dst.put_slice(b"Content-Length: ");
        dst.put_slice(json.len().to_string().as_bytes());
        dst.put_slice(b"\r\n\r\n");
        dst.put_slice(&json);
        Ok(())
    }
}

/// A fake simulator driving the far end of a transport.
///
/// Receives the client's commands as raw JSON arrays and pushes scripted
/// update frames back.
///
/// # Example
///
/// ```ignore
/// let (transport, peer) = MemoryTransport::pair();
/// let client = Client::from_transport(transport, events_tx);
/// let mut stub = SimulatorStub::new(peer);
///
/// stub.push_batch(vec![json!(["nextline", 3])]).await;
/// assert_eq!(stub.recv_command().await, Some(json!(["stop"])));
/// ```
pub struct SimulatorStub<T: SimTransport> {
    reader: FramedRead<T::Read, RawJsonCodec>,
    writer: FramedWrite<T::Write, RawJsonCodec>,
}

impl<T: SimTransport> SimulatorStub<T> {
    pub fn new(transport: T) -> Self {
        let (read, write) = transport.into_split();
        Self {
            reader: FramedRead::new(read, RawJsonCodec),
            writer: FramedWrite::new(write, RawJsonCodec),
        }
    }

    /// Receive the next command the client sent, or `None` once the client
    /// side is gone.
    pub async fn recv_command(&mut self) -> Option<Value> {
        match self.reader.next().await? {
            Ok(value) => Some(value),
            Err(error) => panic!("stub failed to read command: {error}"),
        }
    }

    /// Push one frame containing a batch of tuples.
    pub async fn push_batch(&mut self, tuples: Vec<Value>) {
        self.push_raw(Value::Array(tuples)).await;
    }

    /// Push one frame containing a single tuple.
    pub async fn push_tuple(&mut self, tuple: Value) {
        self.push_raw(tuple).await;
    }

    /// Push an arbitrary JSON body, however malformed.
    pub async fn push_raw(&mut self, body: Value) {
        use futures::SinkExt;
        SinkExt::send(&mut self.writer, body)
            .await
            .expect("stub failed to push frame");
    }
}
