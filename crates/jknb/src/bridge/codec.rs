//! Length-prefixed JSON frames for the host stream.
//!
//! Each frame is a 4-byte big-endian length followed by one JSON document.

use std::io;
use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};
use tokio_util::bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

/// Frames values of `T` as JSON documents.
pub struct JsonFrameCodec<T> {
    frames: LengthDelimitedCodec,
    _message: PhantomData<fn() -> T>,
}

impl<T> Default for JsonFrameCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> JsonFrameCodec<T> {
    pub fn new() -> Self {
        Self {
            frames: LengthDelimitedCodec::builder()
                .length_field_length(4)
                .new_codec(),
            _message: PhantomData,
        }
    }

    /// Largest accepted frame body, in bytes. Defaults to 8 MiB.
    pub fn with_max_frame_length(mut self, max: usize) -> Self {
        self.frames.set_max_frame_length(max);
        self
    }
}

fn invalid_data(err: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

impl<T: DeserializeOwned> Decoder for JsonFrameCodec<T> {
    type Item = T;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<T>, io::Error> {
        let Some(frame) = self.frames.decode(src)? else {
            return Ok(None);
        };
        serde_json::from_slice(&frame).map(Some).map_err(invalid_data)
    }
}

impl<T: Serialize> Encoder<T> for JsonFrameCodec<T> {
    type Error = io::Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), io::Error> {
        let body = serde_json::to_vec(&item).map_err(invalid_data)?;
        // HostLogLayer skips jknb::bridge targets, otherwise each frame would log another frame.
        tracing::trace!(frame_bytes = body.len(), "Encoding host frame");
        self.frames.encode(Bytes::from(body), dst)
    }
}
