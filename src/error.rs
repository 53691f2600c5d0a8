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

//! [tracing-gelf](crate) errors

use backtrace::Backtrace;

/// [tracing-gelf](crate) error type
///
/// [tracing-gelf](crate) eschews libraries like [thiserror], [anyhow] & [Snafu] in favor of a
/// straightforward enumeration with a few match arms chosen on the basis of what the caller will
/// need to respond.
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
/// [Snafu]: https://docs.rs/snafu/latest/snafu
#[non_exhaustive]
pub enum Error {
    /// An additional field name is not usable in a GELF document
    BadFieldName {
        name: String,
        back: Backtrace,
    },
    /// Formatting layer error (JSON serialization, field extraction & the like)
    Format {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// Failed to fetch hostname (via libc)
    NoHostname {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// An Event had no message field
    NoMessageField {
        name: &'static str,
        back: Backtrace,
    },
    /// General transport layer error
    Transport {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadFieldName { name, .. } => {
                write!(f, "'{}' cannot be used as a GELF additional field", name)
            }
            Error::Format { source, .. } => {
                write!(f, "While formatting a GELF document, got {}", source)
            }
            Error::NoHostname { source, .. } => {
                write!(f, "While fetching the hostname, got {}", source)
            }
            Error::NoMessageField { name, .. } => write!(
                f,
                "Event '{}' had no message field, and so was not forwarded",
                name
            ),
            Error::Transport { source, .. } => {
                write!(f, "While sending a GELF message, got {}", source)
            }
            _ => write!(f, "Other tracing-gelf error"),
        }
    }
}

impl std::fmt::Debug for Error {
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadFieldName { name: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::Format { source: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::NoHostname { source: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::NoMessageField { name: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::Transport { source: _, back } => write!(f, "{}\n{:#?}", self, back),
            _ => write!(f, "{}", self),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
