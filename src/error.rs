//! Contains the `Error` and `Result` types that `mongodb-uri` uses.

use thiserror::Error;

/// The result type for all methods that can return an error in the
/// `mongodb-uri` crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur while parsing or validating a connection string.
///
/// The inner [`ErrorKind`] identifies the rule that was violated. The
/// `Display` implementation produces a fully formatted, user-facing message;
/// callers that need to match on errors without parsing prose should use
/// [`Error::message_key`] instead.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("{kind}")]
#[non_exhaustive]
pub struct Error {
    /// The type of error that occurred.
    pub kind: ErrorKind,
}

impl Error {
    /// The stable message-catalog key for this error, e.g.
    /// `uriParser.invalidScheme`.
    ///
    /// Keys are part of the crate's public contract and never change between
    /// releases, which makes them suitable for localization table lookups and
    /// for tests.
    pub fn message_key(&self) -> &'static str {
        self.kind.message_key()
    }
}

impl<E> From<E> for Error
where
    ErrorKind: From<E>,
{
    fn from(err: E) -> Self {
        Self { kind: err.into() }
    }
}

impl std::ops::Deref for Error {
    type Target = ErrorKind;

    fn deref(&self) -> &Self::Target {
        &self.kind
    }
}

/// The types of errors that can occur.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The string does not begin with `mongodb://` or `mongodb+srv://`.
    #[error("connection string must begin with 'mongodb://' or 'mongodb+srv://'")]
    InvalidScheme,

    /// Nothing follows the scheme.
    #[error("connection string is empty apart from the scheme")]
    EmptyUri,

    /// The database name contains a forbidden character or a malformed
    /// percent escape.
    #[error("database name contains an invalid or improperly escaped character")]
    InvalidDatabaseName,

    /// The host section still contains a `/` after the path was split off.
    #[error("host '{host}' must not contain an unescaped slash")]
    #[non_exhaustive]
    InvalidHostSlash { host: String },

    /// The user-info section contains a nested `@`, more than one `:`, or a
    /// malformed percent escape.
    #[error("user information must be URL encoded and contain at most one ':'")]
    InvalidUserInfo,

    /// Credentials were supplied without a username. Defensive; the grammar
    /// as written always produces a (possibly empty) username.
    #[error("a username is required when credentials are present")]
    EmptyUsername,

    #[error("username contains an unescaped slash")]
    UnescapedUsername,

    #[error("password contains an unescaped slash")]
    UnescapedPassword,

    /// The host section produced no entries at all. Defensive; splitting
    /// always yields at least one entry.
    #[error("connection string contains no hosts")]
    EmptyHostList,

    /// A host entry contains a `:` outside of a bracketed IPv6 literal.
    #[error("invalid host entry '{host}'")]
    #[non_exhaustive]
    InvalidHostEntry { host: String },

    /// A port was present but was not an integer in `(0, 65535)`.
    #[error("invalid port '{port}': ports must be integers between 1 and 65534")]
    #[non_exhaustive]
    InvalidPort { port: String },

    #[error("query options must not mix '&' and ';' separators")]
    InvalidQueryMixingSeparators,

    /// A separator-less query string begins with `=`.
    #[error("query string is not a 'key=value' pair")]
    InvalidQueryFormat,

    /// A query segment is not exactly one `key=value` pair.
    #[error("query option '{option}' is not a single 'key=value' pair")]
    #[non_exhaustive]
    InvalidQueryOption { option: String },

    /// Two options that cannot be combined are both present.
    #[error("options '{option1}' and '{option2}' cannot be used together")]
    #[non_exhaustive]
    ConflictingOptions { option1: String, option2: String },

    #[error("options 'tls' and 'ssl' must agree when both are present")]
    TlsAndSslConflict,

    #[error("option 'authSource' requires a non-empty value")]
    AuthSourceRequired,

    #[error("'directConnection=true' cannot be used with the 'mongodb+srv' scheme")]
    SrvDirectConnection,

    #[error("exactly one host must be specified with 'mongodb+srv'")]
    SrvMultipleHosts,

    #[error("a port cannot be specified with 'mongodb+srv'")]
    SrvPortSpecified,

    #[error("'srvServiceName' requires the 'mongodb+srv' scheme")]
    SrvServiceNameNotSrv,

    #[error("'srvMaxHosts' requires the 'mongodb+srv' scheme")]
    SrvMaxHostsNotSrv,

    #[error("'directConnection=true' cannot be used with multiple hosts")]
    DirectConnectionMultipleHosts,

    #[error("'loadBalanced=true' cannot be used with multiple hosts")]
    LoadBalancedMultipleHosts,

    #[error("'loadBalanced=true' cannot be used with 'directConnection=true'")]
    LoadBalancedDirectConnection,

    #[error("'loadBalanced=true' cannot be used with 'replicaSet'")]
    LoadBalancedReplicaSet,

    /// A recognized option's value was rejected by its validator. The
    /// message key comes from the option catalog entry that rejected it.
    #[error("{}", option_value_message(.message_key, .key, .value))]
    #[non_exhaustive]
    InvalidOptionValue {
        key: String,
        value: String,
        message_key: &'static str,
    },
}

impl ErrorKind {
    /// The stable message-catalog key for this kind of error.
    pub fn message_key(&self) -> &'static str {
        match self {
            ErrorKind::InvalidScheme => "uriParser.invalidScheme",
            ErrorKind::EmptyUri => "uriParser.emptyUri",
            ErrorKind::InvalidDatabaseName => "uriParser.invalidDatabaseName",
            ErrorKind::InvalidHostSlash { .. } => "uriParser.invalidHostSlash",
            ErrorKind::InvalidUserInfo => "uriParser.invalidUserInfo",
            ErrorKind::EmptyUsername => "uriParser.emptyUsername",
            ErrorKind::UnescapedUsername => "uriParser.unescapedUsername",
            ErrorKind::UnescapedPassword => "uriParser.unescapedPassword",
            ErrorKind::EmptyHostList => "uriParser.emptyHostList",
            ErrorKind::InvalidHostEntry { .. } => "uriParser.invalidHostEntry",
            ErrorKind::InvalidPort { .. } => "uriParser.invalidPort",
            ErrorKind::InvalidQueryMixingSeparators => "uriParser.invalidQueryMixingSeparators",
            ErrorKind::InvalidQueryFormat => "uriParser.invalidQueryFormat",
            ErrorKind::InvalidQueryOption { .. } => "uriParser.invalidQueryOption",
            ErrorKind::ConflictingOptions { .. } => "uriParser.conflictingOptions",
            ErrorKind::TlsAndSslConflict => "uriParser.tlsAndSslConflict",
            ErrorKind::AuthSourceRequired => "uriParser.authSourceRequired",
            ErrorKind::SrvDirectConnection => "uriParser.srvDirectConnection",
            ErrorKind::SrvMultipleHosts => "uriParser.srvMultipleHosts",
            ErrorKind::SrvPortSpecified => "uriParser.srvPortSpecified",
            ErrorKind::SrvServiceNameNotSrv => "uriParser.srvServiceNameNotSrv",
            ErrorKind::SrvMaxHostsNotSrv => "uriParser.srvMaxHostsNotSrv",
            ErrorKind::DirectConnectionMultipleHosts => {
                "uriParser.directConnectionMultipleHosts"
            }
            ErrorKind::LoadBalancedMultipleHosts => "uriParser.loadBalancedMultipleHosts",
            ErrorKind::LoadBalancedDirectConnection => "uriParser.loadBalancedDirectConnection",
            ErrorKind::LoadBalancedReplicaSet => "uriParser.loadBalancedReplicaSet",
            ErrorKind::InvalidOptionValue { message_key, .. } => message_key,
        }
    }
}

/// Formats the message for a rejected option value from its catalog message
/// key and the `key`/`value` parameters.
///
/// This is the sole place option-validator messages are rendered, so callers
/// that localize can reimplement exactly this lookup against their own
/// message table.
fn option_value_message(message_key: &str, key: &str, value: &str) -> String {
    match message_key {
        "uriParser.appNameTooLong" => {
            format!("application name '{value}' exceeds the maximum of 128 bytes")
        }
        "uriParser.invalidAuthMechanism" => {
            format!("'{value}' is not a supported authentication mechanism")
        }
        "uriParser.invalidAuthMechanismProps" => {
            format!("option '{key}' is not a valid list of mechanism properties")
        }
        "uriParser.authSourceRequired" => {
            "option 'authSource' requires a non-empty value".to_string()
        }
        "uriParser.invalidCompressors" => {
            format!("option '{key}' contains an unsupported compressor: '{value}'")
        }
        "uriParser.invalidTimeout" | "uriParse.invalidTimeout" => {
            format!("option '{key}' expects a non-negative number of milliseconds, got '{value}'")
        }
        "uriParser.invalidBoolean" | "uriParse.invalidBoolean" => {
            format!("option '{key}' expects 'true' or 'false', got '{value}'")
        }
        "uriParser.invalidPositiveFloat" => {
            format!("option '{key}' expects a non-negative number, got '{value}'")
        }
        "uriParser.invalidNonNegativeInteger" => {
            format!("option '{key}' expects a non-negative integer, got '{value}'")
        }
        "uriParser.invalidPositiveInteger" => {
            format!("option '{key}' expects a positive integer, got '{value}'")
        }
        "uriParser.invalidMaxStaleness" => {
            format!("option '{key}' expects -1 or a positive integer, got '{value}'")
        }
        "uriParser.invalidReadPreferenceMode" => {
            format!("'{value}' is not a valid read preference mode")
        }
        "uriParser.invalidServerMonitoringMode" => {
            format!("'{value}' is not a valid server monitoring mode")
        }
        _ => format!("invalid value '{value}' for option '{key}'"),
    }
}
