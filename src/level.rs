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

//! GELF severity level definitions.
//!
//! The GELF `level` field carries a standard syslog severity number; [`Level`] replicates the
//! names used in `<syslog.h>`, as RFC [5424] does.
//!
//! [5424]: https://datatracker.ietf.org/doc/html/rfc5424

/// The eight syslog severity levels, as carried in a GELF document's `level` field.
///
/// The enumeration values duplicate the constants defined in `<syslog.h>`. Graylog renders
/// these numerically; `LOG_DEBUG` (7) is the least severe, `LOG_EMERG` (0) the most.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Level {
    /// system is unusable
    LOG_EMERG = 0,
    /// action must be taken immediately
    LOG_ALERT = 1,
    /// critical conditions
    LOG_CRIT = 2,
    /// error conditions
    LOG_ERR = 3,
    /// warning conditions
    LOG_WARNING = 4,
    /// normal but significant condition
    LOG_NOTICE = 5,
    /// informational
    LOG_INFO = 6,
    /// debug-level messages
    LOG_DEBUG = 7,
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn levels_are_syslog_severities() {
        assert_eq!(Level::LOG_EMERG as u8, 0);
        assert_eq!(Level::LOG_ERR as u8, 3);
        assert_eq!(Level::LOG_DEBUG as u8, 7);
    }
}
