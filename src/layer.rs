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

//! [tracing-gelf](crate) [`Layer`] implementations.
//!
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//!
//! A basic struct [`Layer`] is defined, but constructors are provided only for a few (sensible)
//! combinations of type parameters. Consumers of this crate are of course free to implement the
//! [`Formatter`], [`TracingFormatter`] and [`Transport`] traits for themselves & provide their
//! own implementations.

use crate::{
    error::Error,
    formatter::Formatter,
    gelf::Gelf,
    tracing::{TracingFormatter, TrivialTracingFormatter},
    transport::{Transport, UdpTransport},
};

use backtrace::Backtrace;
use tracing::Event;
use tracing_subscriber::layer::Context;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          struct Layer                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A [`tracing-subscriber`]-compliant [`Layer`] implementation that will send [`Event`]s to a
/// GELF collector.
///
/// [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
/// [`Event`]: https://docs.rs/tracing/latest/tracing/struct.Event.html
pub struct Layer<S, F: Formatter, TF: TracingFormatter<S>, T: Transport>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    formatter: F,
    tracing_formatter: TF,
    transport: T,
    // I need the Subscriber implementation type as a type parameter to transmit it to the
    // TracingFormatter trait. 👇 gets the compiler to shut-up about unused type parameters.
    subscriber_type: std::marker::PhantomData<S>,
}

/// A [`Layer`] implementation with the following characteristics:
///
/// - Uses the "trivial" formatter for mapping from Tracing events to messages
/// - Speaks GELF 1.1
/// - Sends the resulting documents over UDP, chunked as needed
///
/// May be used with any [`tracing_subscriber::Subscriber`] implementation that supports
/// [`LookupSpan`].
///
/// [`tracing_subscriber::Subscriber`]: https://docs.rs/tracing/latest/tracing/trait.Subscriber.html
/// [`LookupSpan`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/registry/trait.LookupSpan.html
impl<S> Layer<S, Gelf, TrivialTracingFormatter, UdpTransport>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    /// Attempt to construct a [`Layer`] that will send GELF documents via UDP to port 12201 on
    /// localhost.
    pub fn try_default() -> crate::error::Result<Self> {
        Ok(Layer {
            formatter: Gelf::default(),
            tracing_formatter: TrivialTracingFormatter::default(),
            transport: UdpTransport::local()?,
            subscriber_type: std::marker::PhantomData,
        })
    }
}

impl<S, T: Transport> Layer<S, Gelf, TrivialTracingFormatter, T>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    /// Construct a Layer that will send GELF documents via transport `transport`.
    pub fn with_transport(transport: T) -> Self {
        Layer {
            formatter: Gelf::default(),
            tracing_formatter: TrivialTracingFormatter::default(),
            transport,
            subscriber_type: std::marker::PhantomData,
        }
    }

    /// Construct a Layer that will send documents from `formatter` via transport `transport`.
    pub fn with_transport_and_formatter(transport: T, formatter: Gelf) -> Self {
        Layer {
            formatter,
            tracing_formatter: TrivialTracingFormatter::default(),
            transport,
            subscriber_type: std::marker::PhantomData,
        }
    }
}

impl<S, F: Formatter, TF: TracingFormatter<S>, T: Transport> Layer<S, F, TF, T>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    /// construct Layer with custom inners
    pub fn new(formatter: F, tracing_formatter: TF, transport: T) -> Self {
        Layer {
            formatter,
            tracing_formatter,
            transport,
            subscriber_type: std::marker::PhantomData,
        }
    }
}

/// This is the Big Tuna-- the [`Layer`] implementation.
///
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
impl<S, F, TF, T> tracing_subscriber::layer::Layer<S> for Layer<S, F, TF, T>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    F: Formatter + 'static,
    TF: TracingFormatter<S> + 'static,
    T: Transport + 'static,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let meta = event.metadata();
        self.tracing_formatter
            .on_event(event, ctx) // :=> Result<Option<(String, Level)>>
            .and_then(|x| {
                if let Some((msg, level)) = x {
                    let buf = self.formatter.format(level, &msg, None, meta).map_err(|err| {
                        Error::Format {
                            source: Box::new(err),
                            back: Backtrace::new(),
                        }
                    })?;
                    self.transport.send(&buf)?;
                }
                Ok(())
            })
            .unwrap_or_else(|err| {
                ::tracing::error!(error = %err, "failed to forward event to the collector");
            })
    }
}

#[cfg(test)]
mod smoke {

    use super::*;

    use tracing_subscriber::prelude::*;

    use std::sync::{Arc, Mutex, PoisonError};

    /// A [`Transport`] that just remembers what it was asked to send.
    #[derive(Default)]
    struct Capture {
        sent: Mutex<Vec<Vec<u8>>>,
    }

    impl Capture {
        fn sent(&self) -> Vec<Vec<u8>> {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    impl Transport for Capture {
        fn send(&self, buf: &[u8]) -> crate::error::Result<usize> {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(buf.to_vec());
            Ok(buf.len())
        }
    }

    #[test]
    fn events_reach_the_transport_as_gelf() {
        let capture = Arc::new(Capture::default());
        let gelf = Gelf::builder()
            .host_as_string("bree.local".to_string())
            .unwrap()
            .build();
        let layer = Layer::with_transport_and_formatter(Arc::clone(&capture), gelf);

        tracing::subscriber::with_default(tracing_subscriber::registry().with(layer), || {
            tracing::info!("Hello, world!");
            tracing::warn!("Hello, 世界!");
        });

        let sent = capture.sent();
        assert_eq!(sent.len(), 2);

        let doc: serde_json::Value = serde_json::from_slice(&sent[0]).unwrap();
        assert_eq!(doc["version"], "1.1");
        assert_eq!(doc["host"], "bree.local");
        assert_eq!(doc["short_message"], "Hello, world!");
        assert_eq!(doc["level"], 6);

        let doc: serde_json::Value = serde_json::from_slice(&sent[1]).unwrap();
        assert_eq!(doc["short_message"], "Hello, 世界!");
        assert_eq!(doc["level"], 4);
    }

    #[test]
    fn custom_tracing_formatter() {
        use crate::level::Level;

        let capture = Arc::new(Capture::default());
        let gelf = Gelf::builder()
            .host_as_string("bree.local".to_string())
            .unwrap()
            .build();
        // Everything at LOG_CRIT, regardless of the tracing level.
        let fmtr =
            TrivialTracingFormatter::with_level_mapping(|_level: &tracing::Level| Level::LOG_CRIT);
        let layer = Layer::new(gelf, fmtr, Arc::clone(&capture));

        tracing::subscriber::with_default(tracing_subscriber::registry().with(layer), || {
            tracing::debug!("all hands");
        });

        let sent = capture.sent();
        assert_eq!(sent.len(), 1);
        let doc: serde_json::Value = serde_json::from_slice(&sent[0]).unwrap();
        assert_eq!(doc["level"], 2);
    }
}
