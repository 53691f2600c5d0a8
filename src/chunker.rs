// Copyright (C) 2026 the tracing-gelf authors
//
// This file is part of tracing-gelf.
//
// tracing-gelf is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// tracing-gelf is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
// even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with tracing-gelf.  If
// not, see <http://www.gnu.org/licenses/>.

//! Splitting GELF payloads into datagram-sized chunks.
//!
//! UDP imposes a practical upper bound on datagram size; GELF's [chunked transport] works around
//! it by splitting a message into up to 128 chunks, each prefixed with a 12-byte header that
//! lets the collector reassemble them:
//!
//! ```text
//! bytes[0:2]  = 0x1E 0x0F     magic
//! bytes[2:10] = message id    8 random bytes, shared by every chunk of one message
//! bytes[10]   = sequence number
//! bytes[11]   = sequence count
//! ```
//!
//! [chunked transport]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html#chunking
//!
//! [`ChunkSplitter`] implements that split. A payload that already fits in one datagram is
//! passed through without a header; a payload that would need more than 128 chunks is dropped
//! (the collector could never reassemble it), which surfaces to the caller as an empty result
//! rather than an error. Payloads may be gzip-compressed, once, before slicing; whether
//! compressing a *chunked* message is within the letter of the GELF spec is ambiguous, but
//! collectors accept it and it is the behavior callers of this crate have come to rely on.
//!
//! The message-id and compression services sit behind the [`MessageIdSource`] and
//! [`Compressor`] traits so tests can pin them down; the defaults ([`ThreadRngId`], [`Gzip`])
//! are what production callers want.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace, warn};

use std::borrow::Cow;

/// Fixed bytes identifying chunked-GELF framing.
pub const GELF_MAGIC: [u8; 2] = [0x1e, 0x0f];

/// Magic (2) + message id (8) + sequence number (1) + sequence count (1).
pub const CHUNK_HEADER_LEN: usize = 12;

/// A collector will never reassemble a message of more than 128 chunks.
pub const MAX_CHUNK_COUNT: usize = 128;

/// Default maximum chunk size, header included. Safe for loopback & most LANs; callers on
/// WAN paths will want something closer to the conservative 1420 recommended by Graylog.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 8192;

/// Source of per-message chunk identifiers.
///
/// The id needs to be unique only among the messages a collector is holding partially
/// reassembled at one moment, so no cryptographic strength is required.
pub trait MessageIdSource {
    fn next_id(&self) -> [u8; 8];
}

/// The production [`MessageIdSource`]: eight bytes from the thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRngId;

impl MessageIdSource for ThreadRngId {
    fn next_id(&self) -> [u8; 8] {
        rand::random()
    }
}

/// Whole-payload compression, applied before slicing.
pub trait Compressor {
    fn compress(&self, buf: &[u8]) -> std::io::Result<Vec<u8>>;
}

/// The production [`Compressor`]: gzip via [`flate2`].
#[derive(Clone, Copy, Debug)]
pub struct Gzip {
    level: flate2::Compression,
}

impl std::default::Default for Gzip {
    fn default() -> Self {
        Gzip {
            level: flate2::Compression::default(),
        }
    }
}

impl Compressor for Gzip {
    fn compress(&self, buf: &[u8]) -> std::io::Result<Vec<u8>> {
        use std::io::Write;
        let mut enc = flate2::write::GzEncoder::new(Vec::with_capacity(buf.len()), self.level);
        enc.write_all(buf)?;
        enc.finish()
    }
}

/// How a payload is framed for the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Framing {
    /// GELF chunked framing: 12-byte reassembly headers, optional compression, 128-chunk limit.
    Gelf,
    /// No framing at all: the payload is sliced into `maximum`-sized pieces and nothing more.
    /// For non-GELF payloads that merely need to respect a datagram size limit.
    Raw,
}

/// Splits one payload into a finite, ordered sequence of transport-ready chunks.
///
/// Stateless across calls; each call to [`chunks`](ChunkSplitter::chunks) performs a fresh
/// split. The splitter never fails: conditions that make a message unsendable (it would need
/// more than [`MAX_CHUNK_COUNT`] chunks, or `maximum` leaves no room for chunk bodies) produce
/// an empty result and a diagnostic event, so a logging call can never take down its host.
#[derive(Clone, Debug)]
pub struct ChunkSplitter<I = ThreadRngId, C = Gzip> {
    framing: Framing,
    compress: bool,
    threshold: usize,
    maximum: usize,
    ids: I,
    compressor: C,
}

impl ChunkSplitter {
    /// A GELF-framed splitter with no compression and the given maximum chunk size
    /// (header included).
    pub fn new(maximum: usize) -> ChunkSplitter {
        ChunkSplitter {
            framing: Framing::Gelf,
            compress: false,
            threshold: 0,
            maximum,
            ids: ThreadRngId,
            compressor: Gzip::default(),
        }
    }
}

impl std::default::Default for ChunkSplitter {
    fn default() -> Self {
        ChunkSplitter::new(DEFAULT_MAX_CHUNK_SIZE)
    }
}

impl<I, C> ChunkSplitter<I, C> {
    /// Slice payloads without GELF headers (see [`Framing::Raw`]).
    pub fn raw(mut self) -> Self {
        self.framing = Framing::Raw;
        self
    }

    /// Compress payloads longer than `threshold` bytes before slicing.
    pub fn with_compression(mut self, threshold: usize) -> Self {
        self.compress = true;
        self.threshold = threshold;
        self
    }

    /// Replace the message-id source.
    pub fn with_id_source<I2: MessageIdSource>(self, ids: I2) -> ChunkSplitter<I2, C> {
        ChunkSplitter {
            framing: self.framing,
            compress: self.compress,
            threshold: self.threshold,
            maximum: self.maximum,
            ids,
            compressor: self.compressor,
        }
    }

    /// Replace the compressor.
    pub fn with_compressor<C2: Compressor>(self, compressor: C2) -> ChunkSplitter<I, C2> {
        ChunkSplitter {
            framing: self.framing,
            compress: self.compress,
            threshold: self.threshold,
            maximum: self.maximum,
            ids: self.ids,
            compressor,
        }
    }

    /// Maximum bytes per chunk, header included.
    pub fn maximum(&self) -> usize {
        self.maximum
    }
}

impl<I: MessageIdSource, C: Compressor> ChunkSplitter<I, C> {
    /// Split `payload` into transport-ready chunks, in ascending sequence order.
    ///
    /// An empty payload, or one this splitter cannot frame, yields an empty `Vec`; every
    /// chunk returned is at most `maximum` bytes.
    pub fn chunks(&self, payload: &[u8]) -> Vec<Bytes> {
        if payload.is_empty() {
            return Vec::new();
        }
        if self.maximum == 0 {
            debug!("maximum chunk size is zero; dropping message");
            return Vec::new();
        }
        match self.framing {
            Framing::Raw => payload
                .chunks(self.maximum)
                .map(Bytes::copy_from_slice)
                .collect(),
            Framing::Gelf => self.gelf_chunks(payload),
        }
    }

    fn gelf_chunks(&self, payload: &[u8]) -> Vec<Bytes> {
        // Compression happens at most once, on the whole payload, never per-chunk. A failing
        // compressor degrades to sending the payload uncompressed.
        let payload: Cow<[u8]> = if self.compress && payload.len() > self.threshold {
            match self.compressor.compress(payload) {
                Ok(buf) => Cow::Owned(buf),
                Err(err) => {
                    warn!(error = %err, "compression failed; sending uncompressed");
                    Cow::Borrowed(payload)
                }
            }
        } else {
            Cow::Borrowed(payload)
        };

        // Small enough for a single unchunked datagram: no header.
        if payload.len() < self.maximum {
            return vec![Bytes::copy_from_slice(&payload)];
        }

        if self.maximum <= CHUNK_HEADER_LEN {
            debug!(
                maximum = self.maximum,
                "maximum chunk size leaves no room for chunk bodies; dropping message"
            );
            return Vec::new();
        }
        let body_len = self.maximum - CHUNK_HEADER_LEN;
        let count = payload.len().div_ceil(body_len);
        if count > MAX_CHUNK_COUNT {
            debug!(
                chunk_count = count,
                payload_len = payload.len(),
                "message would need more than {} chunks; dropping",
                MAX_CHUNK_COUNT
            );
            return Vec::new();
        }

        let id = self.ids.next_id();
        trace!(
            message_id = ?id,
            chunk_count = count,
            body_len = body_len,
            "generating GELF chunks"
        );

        payload
            .chunks(body_len)
            .enumerate()
            .map(|(i, body)| {
                let mut chunk = BytesMut::with_capacity(CHUNK_HEADER_LEN + body.len());
                chunk.put_slice(&GELF_MAGIC);
                chunk.put_slice(&id);
                chunk.put_u8(i as u8);
                chunk.put_u8(count as u8);
                chunk.put_slice(body);
                chunk.freeze()
            })
            .collect()
    }
}

#[cfg(test)]
mod test {

    use super::*;

    struct FixedId([u8; 8]);

    impl MessageIdSource for FixedId {
        fn next_id(&self) -> [u8; 8] {
            self.0
        }
    }

    /// A compressor that ignores its input and returns a canned buffer.
    struct CannedCompressor(Vec<u8>);

    impl Compressor for CannedCompressor {
        fn compress(&self, _buf: &[u8]) -> std::io::Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    struct FailingCompressor;

    impl Compressor for FailingCompressor {
        fn compress(&self, _buf: &[u8]) -> std::io::Result<Vec<u8>> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
        }
    }

    fn reassemble(chunks: &[Bytes]) -> Vec<u8> {
        let mut out = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk[0..2], GELF_MAGIC);
            assert_eq!(chunk[2..10], chunks[0][2..10], "message id differs");
            assert_eq!(chunk[10], i as u8);
            assert_eq!(chunk[11], chunks.len() as u8);
            out.extend_from_slice(&chunk[CHUNK_HEADER_LEN..]);
        }
        out
    }

    #[test]
    fn empty_payload() {
        assert!(ChunkSplitter::new(27).chunks(&[]).is_empty());
        assert!(ChunkSplitter::new(27).raw().chunks(&[]).is_empty());
    }

    #[test]
    fn small_payload_passes_through_unheadered() {
        let splitter = ChunkSplitter::new(27);
        let payload = vec![0xab_u8; 26];
        let chunks = splitter.chunks(&payload);
        assert_eq!(chunks.len(), 1);
        assert_eq!(&chunks[0][..], &payload[..]);
    }

    #[test]
    fn payload_equal_to_maximum_is_chunked() {
        // `< maximum` is the single-datagram shortcut; exactly `maximum` goes chunked.
        let splitter = ChunkSplitter::new(27).with_id_source(FixedId([1; 8]));
        let payload = vec![0xab_u8; 27];
        let chunks = splitter.chunks(&payload);
        assert_eq!(chunks.len(), 2);
        assert_eq!(reassemble(&chunks), payload);
    }

    #[test]
    fn fifty_byte_payload_maximum_27() {
        // body length 15 => 4 chunks of lengths 27, 27, 27, 17.
        let splitter = ChunkSplitter::new(27).with_id_source(FixedId([0xc3; 8]));
        let payload: Vec<u8> = (0x00..0x32).collect();
        let chunks = splitter.chunks(&payload);
        assert_eq!(chunks.len(), 4);
        assert_eq!(
            chunks.iter().map(|c| c.len()).collect::<Vec<_>>(),
            vec![27, 27, 27, 17]
        );
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk[0..2], GELF_MAGIC);
            assert_eq!(chunk[2..10], [0xc3; 8]);
            assert_eq!(chunk[10], i as u8);
            assert_eq!(chunk[11], 4);
        }
        assert_eq!(reassemble(&chunks), payload);
    }

    #[test]
    fn id_source_consulted_once_per_split() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingId(AtomicUsize);
        impl MessageIdSource for CountingId {
            fn next_id(&self) -> [u8; 8] {
                self.0.fetch_add(1, Ordering::SeqCst);
                [0; 8]
            }
        }

        let splitter = ChunkSplitter::new(27).with_id_source(CountingId(AtomicUsize::new(0)));
        let chunks = splitter.chunks(&[0xab; 100]);
        assert_eq!(chunks.len(), 7);
        assert_eq!(splitter.ids.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn raw_mode_slices_without_headers() {
        let splitter = ChunkSplitter::new(16).raw();
        let payload: Vec<u8> = (0..50).collect();
        let chunks = splitter.chunks(&payload);
        assert_eq!(chunks.len(), 4); // ceil(50 / 16)
        for chunk in &chunks[..3] {
            assert_eq!(chunk.len(), 16);
        }
        assert_eq!(chunks[3].len(), 2);
        let cat: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
        assert_eq!(cat, payload);
    }

    #[test]
    fn chunk_count_boundary() {
        // maximum 13 => one body byte per chunk.
        let splitter = ChunkSplitter::new(13).with_id_source(FixedId([7; 8]));
        let chunks = splitter.chunks(&[0_u8; 128]);
        assert_eq!(chunks.len(), 128);
        assert_eq!(chunks[127][10], 127);
        assert_eq!(chunks[127][11], 128);

        // 129 chunks needed: dropped.
        assert!(splitter.chunks(&[0_u8; 129]).is_empty());
    }

    #[test]
    fn degenerate_maximum_drops_message() {
        // Payloads of at least `maximum` bytes need headers, but `maximum <= 12` leaves no
        // room for a body.
        let splitter = ChunkSplitter::new(12);
        assert!(splitter.chunks(&[0_u8; 64]).is_empty());
        assert!(ChunkSplitter::new(0).chunks(&[0_u8; 64]).is_empty());
        // ...but a payload under `maximum` still takes the unchunked path.
        let splitter = ChunkSplitter::new(12);
        assert_eq!(splitter.chunks(&[0_u8; 4]).len(), 1);
    }

    #[test]
    fn compression_applies_to_whole_payload_before_slicing() {
        let canned: Vec<u8> = (0..40).collect();
        let splitter = ChunkSplitter::new(27)
            .with_compression(10)
            .with_id_source(FixedId([9; 8]))
            .with_compressor(CannedCompressor(canned.clone()));
        let chunks = splitter.chunks(&[0xff_u8; 100]);
        // 40 canned bytes, body length 15 => 3 chunks; reassembly yields the compressed form.
        assert_eq!(chunks.len(), 3);
        assert_eq!(reassemble(&chunks), canned);
    }

    #[test]
    fn compression_skipped_at_or_below_threshold() {
        let splitter = ChunkSplitter::new(1024)
            .with_compression(100)
            .with_compressor(CannedCompressor(vec![0xee; 8]));
        let payload = vec![0x11_u8; 100]; // not strictly greater than the threshold
        let chunks = splitter.chunks(&payload);
        assert_eq!(chunks.len(), 1);
        assert_eq!(&chunks[0][..], &payload[..]);
    }

    #[test]
    fn failed_compression_degrades_to_uncompressed() {
        let splitter = ChunkSplitter::new(1024)
            .with_compression(0)
            .with_compressor(FailingCompressor);
        let payload = vec![0x22_u8; 64];
        let chunks = splitter.chunks(&payload);
        assert_eq!(chunks.len(), 1);
        assert_eq!(&chunks[0][..], &payload[..]);
    }

    #[test]
    fn gzip_round_trips() {
        use std::io::Read;

        let payload = b"the quick brown fox jumps over the lazy dog".repeat(20);
        let compressed = Gzip::default().compress(&payload).unwrap();
        assert!(compressed.len() < payload.len());

        let mut decoder = flate2::read::GzDecoder::new(&compressed[..]);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn round_trip_across_sizes() {
        let splitter = ChunkSplitter::new(64).with_id_source(FixedId([3; 8]));
        for len in [64_usize, 65, 100, 512, 1000] {
            let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let chunks = splitter.chunks(&payload);
            let expected = payload.len().div_ceil(64 - CHUNK_HEADER_LEN);
            assert_eq!(chunks.len(), expected, "len {}", len);
            assert!(chunks.iter().all(|c| c.len() <= 64));
            assert_eq!(reassemble(&chunks), payload, "len {}", len);
        }
    }
}
