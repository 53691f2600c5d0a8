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

//! Primitives for mapping [`tracing`] entities to GELF messages.
//!
//! [`TracingFormatter`] implementations handle encoding [`Event`]s and [`Span`]s into text;
//! the result becomes a GELF document's `short_message`. This module provides a single
//! implementation: [`TrivialTracingFormatter`], which simply extracts the "message" field from
//! [`Event`]s and maps the [`tracing`] level to a syslog severity.
//!
//! [`Event`]: https://docs.rs/tracing/latest/tracing/struct.Event.html
//! [`Span`]: https://docs.rs/tracing/latest/tracing/struct.Span.html

use crate::{
    error::{Error, Result},
    level::Level,
};

use backtrace::Backtrace;

/// Format [`tracing`] [`Span`]s & [`Event`]s to UTF-8-encoded strings & severities.
///
/// [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
/// [`Span`]: https://docs.rs/tracing/latest/tracing/struct.Span.html
/// [`Event`]: https://docs.rs/tracing/latest/tracing/struct.Event.html
///
/// Each method indicates, firstly, whether the [`tracing`] occurrence shall produce a log
/// message at all, and if so, what the message text and severity shall be. The default span
/// implementations produce nothing.
pub trait TracingFormatter<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    /// An event has occurred
    fn on_event(
        &self,
        event: &tracing::Event,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) -> Result<Option<(String, Level)>>;
    /// A span with the given ID was entered
    fn on_enter(
        &self,
        _id: &tracing_core::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) -> Result<Option<(String, Level)>> {
        Ok(Option::None)
    }
    /// A span with the given ID was exited
    fn on_exit(
        &self,
        _id: &tracing_core::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) -> Result<Option<(String, Level)>> {
        Ok(Option::None)
    }
}

fn default_level_mapping(level: &tracing::Level) -> Level {
    match level {
        &tracing::Level::TRACE | &tracing::Level::DEBUG => Level::LOG_DEBUG,
        &tracing::Level::INFO => Level::LOG_INFO,
        &tracing::Level::WARN => Level::LOG_WARNING,
        &tracing::Level::ERROR => Level::LOG_ERR,
    }
}

/// A [`TracingFormatter`] that just returns an [`Event`]s "message" field, if present (fails
/// otherwise). It doesn't respond to any other occurrences.
///
/// [`Event`]: https://docs.rs/tracing/latest/tracing/struct.Event.html
pub struct TrivialTracingFormatter {
    map_level: Box<dyn Fn(&tracing::Level) -> Level + Send + Sync>,
}

impl TrivialTracingFormatter {
    /// Replace the default tracing-level-to-severity mapping.
    pub fn with_level_mapping(
        map_level: impl Fn(&tracing::Level) -> Level + Send + Sync + 'static,
    ) -> Self {
        TrivialTracingFormatter {
            map_level: Box::new(map_level),
        }
    }
}

impl std::default::Default for TrivialTracingFormatter {
    fn default() -> Self {
        TrivialTracingFormatter {
            map_level: Box::new(default_level_mapping),
        }
    }
}

struct MessageEventVisitor {
    message: Option<String>,
}

impl tracing::field::Visit for MessageEventVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            // Regrettably, we have only a `Debug` implementation available to us; but the
            // tracing macros `info!()`, `event!()` & the like all take care to "pre-format" the
            // `message` field so that `value` actually refers to a `std::fmt::Arguments`
            // instance, which will print to a debug format without enclosing double-quotes.
            self.message = Some(format!("{:?}", value));
        }
    }
}

impl<S> TracingFormatter<S> for TrivialTracingFormatter
where
    S: tracing_core::subscriber::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(
        &self,
        event: &tracing::Event,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) -> Result<Option<(String, Level)>> {
        let mut visitor = MessageEventVisitor { message: None };
        event.record(&mut visitor);
        visitor
            .message
            .ok_or(Error::NoMessageField {
                name: event.metadata().name(),
                back: Backtrace::new(),
            })
            .map(|s| Some((s, (*self.map_level)(event.metadata().level()))))
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn level_mapping() {
        assert_eq!(default_level_mapping(&tracing::Level::TRACE), Level::LOG_DEBUG);
        assert_eq!(default_level_mapping(&tracing::Level::DEBUG), Level::LOG_DEBUG);
        assert_eq!(default_level_mapping(&tracing::Level::INFO), Level::LOG_INFO);
        assert_eq!(default_level_mapping(&tracing::Level::WARN), Level::LOG_WARNING);
        assert_eq!(default_level_mapping(&tracing::Level::ERROR), Level::LOG_ERR);
    }
}
