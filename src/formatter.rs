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

//! Wire-format primitives.
//!
//! This module defines the [`Formatter`] trait.

use crate::level::Level;

use chrono::prelude::*;

use std::ops::Deref;

/// Operations all wire formatters must support
/// ===========================================
///
/// # Introduction
///
/// The translation from [`tracing`] events to collector-bound messages occurs in three parts:
///
/// [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
///
/// 1. formatting the event to a textual message
///
/// 2. incorporating that message into a document compliant with your collector's wire format
///
/// 3. transporting that document to your collector
///
/// [`Formatter`] implements step 2 in this process: given the [`Level`], a textual message
/// field, an optional timestamp, and the event's [`Metadata`], produce a finished payload.
///
/// [`Metadata`]: https://docs.rs/tracing/latest/tracing/struct.Metadata.html
///
/// # Design
///
/// The associated type `Output` is designed to make illegal states unrepresentable. If the
/// [`Transport`] trait simply took, say, a slice of `u8` then callers could mistakenly pass
/// _anything_ to it. The constraint that `Output` be dereferenceable to a slice of `u8` is what
/// lets the [`Transport`] implementation deal with it.
///
/// [`Transport`]: crate::transport::Transport
pub trait Formatter {
    type Error: std::error::Error + Send + Sync + 'static;
    type Output: Deref<Target = [u8]>;
    fn format(
        &self,
        level: Level,
        msg: &str,
        timestamp: Option<DateTime<Utc>>,
        meta: &tracing::Metadata,
    ) -> std::result::Result<Self::Output, Self::Error>;
}
