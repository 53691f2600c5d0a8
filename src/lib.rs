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

//! A [`tracing-subscriber`] [`Layer`] implementation for sending [`tracing`] [`Event`]s to a
//! [GELF] collector such as Graylog.
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//! [`Event`]: https://docs.rs/tracing/latest/tracing/struct.Event.html
//! [GELF]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
//!
//! # Introduction
//!
//! The translation from [`tracing`] events to collector-bound GELF messages occurs in three
//! parts, each behind its own trait so that implementations can be mixed & matched:
//!
//! 1. formatting the event to a textual message
//!    ([`TracingFormatter`](crate::tracing::TracingFormatter))
//!
//! 2. incorporating that message into a GELF document ([`Formatter`](formatter::Formatter),
//!    implemented by [`Gelf`](gelf::Gelf))
//!
//! 3. transporting that document to the collector ([`Transport`](transport::Transport))
//!
//! The interesting machinery lives below the [`Transport`](transport::Transport) seam. GELF
//! over UDP must respect datagram size limits, so the [`chunker`] module splits oversized
//! documents into up to 128 reassembly-addressed, optionally gzip-compressed chunks. Sinks
//! that perform slow I/O (the [`persistent`] file writer) decouple themselves from logging
//! threads with the [`queue`] module's [`ObservableQueue`](queue::ObservableQueue), a
//! thread-safe FIFO whose fire-and-forget notifications drive batched drains.
//!
//! A logging call never panics its host and never blocks on a sink: failures inside the
//! pipeline degrade to diagnostic events, oversized messages are dropped with a `debug!`, and
//! file appends happen on a notification thread behind the queue.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tracing_gelf::layer::Layer;
//! use tracing_subscriber::prelude::*;
//!
//! // Send GELF over UDP to localhost:12201, chunking documents that outgrow a datagram:
//! let layer = Layer::try_default().unwrap();
//! tracing_subscriber::registry().with(layer).init();
//! tracing::info!("Hello, Graylog!");
//! ```

#[path = "byte-utils.rs"]
mod byte_utils;

pub mod chunker;
pub mod error;
pub mod formatter;
pub mod gelf;
pub mod layer;
pub mod level;
pub mod persistent;
pub mod queue;
pub mod tracing;
pub mod transport;

pub use chunker::ChunkSplitter;
pub use error::{Error, Result};
pub use gelf::Gelf;
pub use layer::Layer;
pub use level::Level;
pub use persistent::PersistentWriter;
pub use queue::ObservableQueue;
pub use transport::{TcpTransport, Transport, UdpTransport};
