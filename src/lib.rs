//! This crate contains the connection string parsing and validation engine
//! used to turn a `mongodb://` or `mongodb+srv://` URI into a structured,
//! validated [`UriData`] before any connection is attempted. It performs no
//! I/O: SRV hostnames are validated but not resolved, and credentials are
//! decoded but never used. Parsing either succeeds completely or fails with
//! the first rule violation found.
//!
//! # Parsing
//!
//! The only entry point is [`parse_uri`] (also reachable through `UriData`'s
//! [`FromStr`](std::str::FromStr) implementation):
//!
//! ```
//! use mongodb_uri::{parse_uri, UriValue};
//!
//! let uri = parse_uri("mongodb://readonly@db1:27017,db2/reports?readPreference=secondary")?;
//! assert_eq!(uri.nodelist.len(), 2);
//! assert_eq!(uri.username.as_deref(), Some("readonly"));
//! assert_eq!(uri.database.as_deref(), Some("reports"));
//!
//! let options = uri.options.unwrap();
//! assert_eq!(
//!     options.get("readPreference"),
//!     Some(&UriValue::String("secondary".to_string())),
//! );
//! # Ok::<(), mongodb_uri::Error>(())
//! ```
//!
//! # Errors
//!
//! Every failure is a [`Error`] wrapping an [`ErrorKind`]. In addition to
//! the formatted `Display` message, each error exposes a stable
//! message-catalog key (for example `uriParser.invalidScheme`) through
//! [`Error::message_key`], so callers can localize or test against errors
//! without matching on prose.
//!
//! # Diagnostics
//!
//! A few conditions are deliberately non-fatal and only logged through the
//! [`log`] facade: duplicate query options (the last occurrence wins), an
//! unescaped `/` inside the user-info section, and unrecognized option names
//! that closely resemble a known option.

#![warn(missing_docs)]

pub mod error;
mod uri;

#[cfg(test)]
mod test;

pub use crate::{
    error::{Error, ErrorKind, Result},
    uri::{parse_uri, HostAddress, UriData, UriOptions, UriValue, DEFAULT_PORT},
};
