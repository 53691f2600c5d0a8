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

//! The GELF transport layer.
//!
//! This module defines the [`Transport`] trait that all implementations must support, as well
//! as the UDP & TCP implementations. UDP is the interesting one: a finished GELF document is
//! run through a [`ChunkSplitter`] and each chunk goes out as its own datagram. TCP needs no
//! chunking; a document is written as-is, NUL-delimited per the GELF TCP framing.
//!
//! # Examples
//!
//! To send GELF messages over UDP to a collector listening on port 12201 (the default) on
//! localhost:
//!
//! ```rust
//! use tracing_gelf::transport::UdpTransport;
//! let transpo = UdpTransport::local().unwrap();
//! ```
//!
//! On a non-standard port on another host:
//!
//! ```rust
//! use tracing_gelf::transport::UdpTransport;
//! let transpo = UdpTransport::new("some-host.domain.io:5514");
//! assert!(transpo.is_err()); // no such host, after all
//! ```

use crate::{
    chunker::ChunkSplitter,
    error::{Error, Result},
};

use backtrace::Backtrace;
use tracing::debug;

use std::net::TcpStream;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      transport mechanisms                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations all transport layers must support.
pub trait Transport {
    /// Send a finished wire payload on this transport mechanism; returns the number of payload
    /// bytes accepted.
    ///
    /// It would be nice to make this more general, to accept input in a variety of forms that
    /// might support zero-copy, but at the end of the day UDP & TCP sockets both operate on a
    /// contiguous slice of `u8`, so we require that our caller assemble one.
    fn send(&self, buf: &[u8]) -> Result<usize>;
}

/// Shared sinks (e.g. a [`PersistentWriter`](crate::persistent::PersistentWriter) handed out
/// as an `Arc`) are transports too.
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        (**self).send(buf)
    }
}

/// The GELF UDP input's default port.
pub const DEFAULT_UDP_PORT: u16 = 12201;

/// Sending GELF messages via UDP datagrams, chunking as needed.
pub struct UdpTransport {
    socket: std::net::UdpSocket,
    splitter: ChunkSplitter,
}

impl UdpTransport {
    /// Construct a [`Transport`] implementation via UDP at `addr`, with a default-configured
    /// [`ChunkSplitter`].
    pub fn new<A: std::net::ToSocketAddrs>(addr: A) -> Result<UdpTransport> {
        UdpTransport::with_splitter(addr, ChunkSplitter::default())
    }

    /// Construct a [`Transport`] implementation via UDP at localhost:12201.
    pub fn local() -> Result<UdpTransport> {
        UdpTransport::new(("localhost", DEFAULT_UDP_PORT))
    }

    /// Construct a [`Transport`] implementation via UDP at `addr` with a caller-configured
    /// splitter (maximum chunk size, compression & the like).
    pub fn with_splitter<A: std::net::ToSocketAddrs>(
        addr: A,
        splitter: ChunkSplitter,
    ) -> Result<UdpTransport> {
        // Bind to any available port on localhost...
        let socket = std::net::UdpSocket::bind("127.0.0.1:0").map_err(|err| Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        })?;
        // and connect to the collector at `addr`:
        socket.connect(addr).map_err(|err| Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        })?;
        Ok(UdpTransport { socket, splitter })
    }
}

impl Transport for UdpTransport {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        let chunks = self.splitter.chunks(buf);
        if chunks.is_empty() {
            // Either the payload was empty or the splitter dropped it (it would have needed
            // more than 128 chunks). Nothing to send is not a transport failure.
            debug!(payload_len = buf.len(), "no chunks to send");
            return Ok(0);
        }
        let mut sent = 0;
        for chunk in chunks {
            sent += self.socket.send(&chunk).map_err(|err| Error::Transport {
                source: Box::new(err),
                back: Backtrace::new(),
            })?;
        }
        Ok(sent)
    }
}

/// Sending GELF messages via TCP streams.
///
/// TCP GELF is NUL-delimited: each document is written verbatim, followed by a single zero
/// byte. No chunking and no compression (a compressed document could contain the delimiter).
pub struct TcpTransport {
    socket: std::net::TcpStream,
}

impl TcpTransport {
    /// Construct a [`Transport`] implementation via TCP at `addr`.
    pub fn new<A: std::net::ToSocketAddrs>(addr: A) -> Result<TcpTransport> {
        Ok(TcpTransport {
            socket: TcpStream::connect(addr).map_err(|err| Error::Transport {
                source: Box::new(err),
                back: Backtrace::new(),
            })?,
        })
    }
    /// Construct a [`Transport`] implementation via TCP at localhost:12201.
    pub fn try_default() -> Result<TcpTransport> {
        TcpTransport::new(("localhost", DEFAULT_UDP_PORT))
    }
}

impl Transport for TcpTransport {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        use std::io::Write;
        // `std::io::Write` wants a `&mut self` and we just have a `&self`; `Write` is
        // implemented on `&TcpStream` as well as `TcpStream`, so write through a `&mut
        // &TcpStream` (the same trick tracing-subscriber's fmt layer uses).
        let mut writer: &TcpStream = &self.socket;
        writer.write_all(buf).map_err(|err| Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        })?;
        writer.write_all(&[0]).map_err(|err| Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        })?;
        writer.flush().map_err(|err| Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        })?;

        Ok(buf.len())
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use crate::chunker::CHUNK_HEADER_LEN;

    #[test]
    fn udp_chunks_on_the_wire() {
        let receiver = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(std::time::Duration::from_secs(5)))
            .unwrap();
        let addr = receiver.local_addr().unwrap();

        let transpo =
            UdpTransport::with_splitter(addr, ChunkSplitter::new(CHUNK_HEADER_LEN + 16)).unwrap();

        // Small payload: one unchunked datagram.
        transpo.send(b"hello").unwrap();
        let mut buf = [0_u8; 64];
        let n = receiver.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello");

        // 40 bytes with 16-byte bodies: three chunked datagrams.
        let payload: Vec<u8> = (0..40).collect();
        transpo.send(&payload).unwrap();
        let mut reassembled = Vec::new();
        for i in 0..3 {
            let n = receiver.recv(&mut buf).unwrap();
            assert_eq!(buf[..2], [0x1e, 0x0f]);
            assert_eq!(buf[10], i as u8);
            assert_eq!(buf[11], 3);
            reassembled.extend_from_slice(&buf[CHUNK_HEADER_LEN..n]);
        }
        assert_eq!(reassembled, payload);
    }

    #[test]
    fn udp_oversized_payload_is_nothing_to_send() {
        let receiver = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = receiver.local_addr().unwrap();

        // One body byte per chunk: anything past 128 bytes is undeliverable.
        let transpo =
            UdpTransport::with_splitter(addr, ChunkSplitter::new(CHUNK_HEADER_LEN + 1)).unwrap();
        assert_eq!(transpo.send(&[0_u8; 200]).unwrap(), 0);
    }

    #[test]
    fn tcp_nul_delimits() {
        use std::io::Read;

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf).unwrap();
            buf
        });

        let transpo = TcpTransport::new(addr).unwrap();
        assert_eq!(transpo.send(b"{\"version\":\"1.1\"}").unwrap(), 17);
        drop(transpo);

        let received = server.join().unwrap();
        assert_eq!(&received[..17], b"{\"version\":\"1.1\"}");
        assert_eq!(received[17], 0);
    }
}
