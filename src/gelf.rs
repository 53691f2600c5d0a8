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

//! GELF [1.1]-compliant message formatting
//!
//! [1.1]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
//!
//! [`Gelf`] is a [`Formatter`] that produces GELF 1.1 JSON documents. A document carries
//! `version`, `host`, `short_message`, `timestamp` (seconds since the epoch, fractional part
//! allowed) and `level` (a syslog severity); everything else travels as "additional fields"
//! whose names must start with an underscore.

use crate::{
    byte_utils::string_from_os_str,
    error::{Error, Result},
    formatter::Formatter,
    level::Level,
};

use backtrace::Backtrace;
use chrono::prelude::*;
use serde_json::{json, Map, Value};

type StdResult<T, E> = std::result::Result<T, E>;

/// A [`String`] with the additional constraint that it is non-empty (a GELF document without a
/// usable `host` field is rejected by collectors).
pub struct GelfHostname(String);

impl GelfHostname {
    pub fn new(host: String) -> Result<GelfHostname> {
        if host.is_empty() {
            Err(Error::NoHostname {
                source: "empty hostname".into(),
                back: Backtrace::new(),
            })
        } else {
            Ok(GelfHostname(host))
        }
    }
}

impl std::default::Default for GelfHostname {
    /// Attempt to figure-out the local hostname.
    ///
    /// This implementation simply tries [gethostname()]; if that fails, or produces an empty
    /// string, it falls back to `"-"` (the collector will still accept the document, it just
    /// won't be attributable to a host).
    ///
    /// [gethostname()]: https://man7.org/linux/man-pages/man2/gethostname.2.html
    fn default() -> Self {
        hostname::get()
            .map_err(|err| Error::NoHostname {
                source: Box::new(err),
                back: Backtrace::new(),
            })
            .and_then(|hn| GelfHostname::new(string_from_os_str(hn)))
            .unwrap_or_else(|_err| GelfHostname("-".to_string()))
    }
}

impl std::convert::TryFrom<String> for GelfHostname {
    type Error = Error;
    fn try_from(x: String) -> StdResult<Self, Self::Error> {
        GelfHostname::new(x)
    }
}

/// A formatter that produces GELF [1.1]-conformant JSON documents.
///
/// [1.1]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
pub struct Gelf {
    host: GelfHostname,
    additional: Map<String, Value>,
    include_target: bool,
    include_module: bool,
    include_source_location: bool,
}

impl std::default::Default for Gelf {
    fn default() -> Self {
        Gelf {
            host: GelfHostname::default(),
            additional: Map::new(),
            include_target: false,
            include_module: false,
            include_source_location: false,
        }
    }
}

pub struct GelfBuilder {
    imp: Gelf,
}

impl GelfBuilder {
    pub fn host(mut self, host: GelfHostname) -> Self {
        self.imp.host = host;
        self
    }
    pub fn host_as_string(mut self, host: String) -> Result<Self> {
        self.imp.host = GelfHostname::try_from(host)?;
        Ok(self)
    }
    /// Attach a static additional field to every document this formatter produces.
    ///
    /// The leading underscore GELF requires is added if missing. `_id` is reserved by the
    /// GELF spec and rejected.
    pub fn additional_field(mut self, name: &str, value: impl Into<Value>) -> Result<Self> {
        let name = if let Some(stripped) = name.strip_prefix('_') {
            stripped
        } else {
            name
        };
        if name.is_empty() || name == "id" {
            return Err(Error::BadFieldName {
                name: name.to_string(),
                back: Backtrace::new(),
            });
        }
        self.imp
            .additional
            .insert(format!("_{}", name), value.into());
        Ok(self)
    }
    /// Include the event's target as `_target`.
    pub fn with_tracing_target(mut self, include: bool) -> Self {
        self.imp.include_target = include;
        self
    }
    /// Include the event's module path as `_module`.
    pub fn with_tracing_module(mut self, include: bool) -> Self {
        self.imp.include_module = include;
        self
    }
    /// Include the event's file & line as `_file` / `_line`.
    pub fn with_tracing_source_location(mut self, include: bool) -> Self {
        self.imp.include_source_location = include;
        self
    }
    pub fn build(self) -> Gelf {
        self.imp
    }
}

impl Gelf {
    pub fn builder() -> GelfBuilder {
        GelfBuilder {
            imp: Gelf::default(),
        }
    }
}

impl Formatter for Gelf {
    type Error = Error;
    type Output = Vec<u8>;

    fn format(
        &self,
        level: Level,
        msg: &str,
        timestamp: Option<DateTime<Utc>>,
        meta: &tracing::Metadata,
    ) -> Result<Vec<u8>> {
        let mut doc = Map::new();
        doc.insert("version".to_string(), json!("1.1"));
        doc.insert("host".to_string(), json!(self.host.0));
        doc.insert("short_message".to_string(), json!(msg));
        let ts = timestamp.unwrap_or_else(Utc::now);
        doc.insert(
            "timestamp".to_string(),
            json!(ts.timestamp_millis() as f64 / 1000.0),
        );
        doc.insert("level".to_string(), json!(level as u8));

        for (name, value) in &self.additional {
            doc.insert(name.clone(), value.clone());
        }
        if self.include_target {
            doc.insert("_target".to_string(), json!(meta.target()));
        }
        if self.include_module {
            if let Some(module) = meta.module_path() {
                doc.insert("_module".to_string(), json!(module));
            }
        }
        if self.include_source_location {
            if let Some(file) = meta.file() {
                doc.insert("_file".to_string(), json!(file));
            }
            if let Some(line) = meta.line() {
                doc.insert("_line".to_string(), json!(line));
            }
        }

        serde_json::to_vec(&Value::Object(doc)).map_err(|err| Error::Format {
            source: Box::new(err),
            back: Backtrace::new(),
        })
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use tracing::Callsite;

    struct TestCallsite {
        metadata: &'static tracing::Metadata<'static>,
    }
    impl tracing_core::callsite::Callsite for TestCallsite {
        fn set_interest(&self, _interest: tracing_core::subscriber::Interest) {}
        fn metadata(&self) -> &tracing::Metadata<'static> {
            self.metadata
        }
    }
    impl TestCallsite {
        pub const fn new(metadata: &'static tracing::Metadata<'static>) -> TestCallsite {
            TestCallsite { metadata }
        }
    }

    static CALLSITE: TestCallsite = {
        static METADATA: tracing::Metadata = tracing::Metadata::new(
            "test event metadata",
            "test-target",
            tracing::Level::INFO,
            Some(file!()),
            Some(line!()),
            Some(module_path!()),
            tracing::field::FieldSet::new(
                &["message"],
                tracing_core::callsite::Identifier(&CALLSITE),
            ),
            tracing_core::metadata::Kind::EVENT,
        );
        TestCallsite::new(&METADATA)
    };

    #[test]
    fn hostname() {
        let _x = GelfHostname::default(); // At least _exercise_ `Default`
        assert!(GelfHostname::new(String::new()).is_err());
        assert!(GelfHostname::new("bree.local".to_string()).is_ok());
    }

    #[test]
    fn basic_document() {
        let f = Gelf::builder()
            .host_as_string("bree.local".to_string())
            .unwrap()
            .build();

        let buf = f
            .format(
                Level::LOG_INFO,
                "Hello, world!",
                Some(std::time::UNIX_EPOCH.into()),
                CALLSITE.metadata(),
            )
            .unwrap();
        let doc: Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(doc["version"], "1.1");
        assert_eq!(doc["host"], "bree.local");
        assert_eq!(doc["short_message"], "Hello, world!");
        assert_eq!(doc["timestamp"], 0.0);
        assert_eq!(doc["level"], 6);
        assert!(doc.get("_target").is_none());
    }

    #[test]
    fn additional_and_metadata_fields() {
        let f = Gelf::builder()
            .host_as_string("bree.local".to_string())
            .unwrap()
            .additional_field("environment", "prototyping")
            .unwrap()
            .additional_field("_build", 123)
            .unwrap()
            .with_tracing_target(true)
            .with_tracing_source_location(true)
            .build();

        let buf = f
            .format(
                Level::LOG_WARNING,
                "Hello, 世界!",
                Some(std::time::UNIX_EPOCH.into()),
                CALLSITE.metadata(),
            )
            .unwrap();
        let doc: Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(doc["short_message"], "Hello, 世界!");
        assert_eq!(doc["level"], 4);
        assert_eq!(doc["_environment"], "prototyping");
        assert_eq!(doc["_build"], 123);
        assert_eq!(doc["_target"], "test-target");
        assert_eq!(doc["_file"], CALLSITE.metadata().file().unwrap());
        assert_eq!(
            doc["_line"],
            u64::from(CALLSITE.metadata().line().unwrap())
        );
        assert!(doc.get("_module").is_none());
    }

    #[test]
    fn reserved_field_names_rejected() {
        assert!(Gelf::builder().additional_field("id", 1).is_err());
        assert!(Gelf::builder().additional_field("_id", 1).is_err());
        assert!(Gelf::builder().additional_field("_", 1).is_err());
    }
}
