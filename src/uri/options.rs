//! The query-option half of connection string parsing: key normalization,
//! value coercion, the static option catalog, and the per-option and
//! cross-option validation passes.

use std::fmt;

use indexmap::IndexMap;
use log::warn;
use serde::Serialize;
use strsim::jaro_winkler;

use crate::error::{ErrorKind, Result};

use super::percent_decode_lossy;

/// Parsed query options keyed by canonical option name, in input order.
pub type UriOptions = IndexMap<String, UriValue>;

/// A coerced query-option value.
///
/// Plain values are typed by shape: literal `true`/`false` becomes
/// [`Bool`](UriValue::Bool), digit-only values become
/// [`Int`](UriValue::Int), digits-and-dots become
/// [`Float`](UriValue::Float), and everything else is percent-decoded into
/// [`String`](UriValue::String). `readPreferenceTags` and
/// `authMechanismProperties` have dedicated shapes.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UriValue {
    /// A literal `true` or `false`, any casing.
    Bool(bool),
    /// A value consisting solely of ASCII digits.
    Int(i64),
    /// A value consisting solely of ASCII digits and dots, or an integer too
    /// large for [`Int`](UriValue::Int).
    Float(f64),
    /// Any other value, percent-decoded.
    String(String),
    /// The `readPreferenceTags` value, stored raw (one entry per surviving
    /// occurrence).
    StringList(Vec<String>),
    /// The `authMechanismProperties` pairs, both sides percent-decoded.
    Properties(IndexMap<String, String>),
}

impl UriValue {
    /// Truthiness as the cross-option rules understand it: `false`, zero,
    /// and empty values are falsey.
    pub(crate) fn is_truthy(&self) -> bool {
        match self {
            UriValue::Bool(value) => *value,
            UriValue::Int(value) => *value != 0,
            UriValue::Float(value) => *value != 0.0,
            UriValue::String(value) => !value.is_empty(),
            UriValue::StringList(values) => !values.is_empty(),
            UriValue::Properties(values) => !values.is_empty(),
        }
    }
}

impl fmt::Display for UriValue {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UriValue::Bool(value) => write!(fmt, "{}", value),
            UriValue::Int(value) => write!(fmt, "{}", value),
            UriValue::Float(value) => write!(fmt, "{}", value),
            UriValue::String(value) => fmt.write_str(value),
            UriValue::StringList(values) => fmt.write_str(&values.join(",")),
            UriValue::Properties(values) => {
                for (i, (key, value)) in values.iter().enumerate() {
                    if i > 0 {
                        fmt.write_str(",")?;
                    }
                    write!(fmt, "{}:{}", key, value)?;
                }
                Ok(())
            }
        }
    }
}

/// How a recognized option's value is checked after coercion.
#[derive(Clone, Copy, Debug)]
enum ValueRule {
    /// UTF-8 byte length at most 128; empty allowed.
    AppName,
    /// Exact member of [`AUTH_MECHANISMS`].
    AuthMechanism,
    /// Accepted as-is; the pair structure was already imposed during
    /// coercion.
    AuthMechanismProperties,
    /// Literal `true` or `false`, case-insensitive.
    Boolean,
    /// Comma-separated subset of [`SUPPORTED_COMPRESSORS`]; empty allowed.
    Compressors,
    /// Non-negative integer, or empty (0 and absence both mean "no
    /// timeout").
    Timeout,
    /// Non-negative float.
    NonNegativeFloat,
    /// Non-negative integer.
    NonNegativeInteger,
    /// Strictly positive integer.
    PositiveInteger,
    /// Empty, `-1`, or a strictly positive integer.
    MaxStaleness,
    /// Member of [`READ_PREFERENCE_MODES`], case-insensitive.
    ReadPreferenceMode,
    /// Member of [`SERVER_MONITORING_MODES`], case-insensitive.
    ServerMonitoringMode,
    /// Integer between 0 and 9 inclusive.
    ZlibCompressionLevel,
    /// Any non-empty string.
    NonEmpty,
}

/// A validator attached to a catalog entry, with the message key reported
/// when the value is rejected.
struct OptionValidator {
    rule: ValueRule,
    message_key: &'static str,
}

/// One entry of the static option catalog: the canonical key casing plus an
/// optional validator. `None` means the option is recognized but its value
/// is not constrained.
struct UriOption {
    canonical: &'static str,
    validator: Option<OptionValidator>,
}

const fn validated(
    canonical: &'static str,
    rule: ValueRule,
    message_key: &'static str,
) -> UriOption {
    UriOption {
        canonical,
        validator: Some(OptionValidator { rule, message_key }),
    }
}

const fn recognized(canonical: &'static str) -> UriOption {
    UriOption {
        canonical,
        validator: None,
    }
}

/// Every option the parser recognizes. Incoming keys are matched
/// case-insensitively and normalized to the casing given here; unrecognized
/// keys pass through as typed.
///
/// Two entries carry historical `uriParse.`-prefixed message keys. They are
/// load-bearing identifiers for callers' localization tables and stay
/// misspelled.
static URI_OPTIONS: &[UriOption] = &[
    validated("appname", ValueRule::AppName, "uriParser.appNameTooLong"),
    validated(
        "authMechanism",
        ValueRule::AuthMechanism,
        "uriParser.invalidAuthMechanism",
    ),
    validated(
        "authMechanismProperties",
        ValueRule::AuthMechanismProperties,
        "uriParser.invalidAuthMechanismProps",
    ),
    validated(
        "authSource",
        ValueRule::NonEmpty,
        "uriParser.authSourceRequired",
    ),
    validated(
        "compressors",
        ValueRule::Compressors,
        "uriParser.invalidCompressors",
    ),
    validated(
        "connectTimeoutMS",
        ValueRule::Timeout,
        "uriParser.invalidTimeout",
    ),
    validated(
        "directConnection",
        ValueRule::Boolean,
        "uriParser.invalidBoolean",
    ),
    validated(
        "heartbeatFrequencyMS",
        ValueRule::Timeout,
        "uriParse.invalidTimeout",
    ),
    validated("journal", ValueRule::Boolean, "uriParse.invalidBoolean"),
    recognized("loadBalanced"),
    validated(
        "localThresholdMS",
        ValueRule::NonNegativeFloat,
        "uriParser.invalidPositiveFloat",
    ),
    validated(
        "maxIdleTimeMS",
        ValueRule::Timeout,
        "uriParser.invalidTimeout",
    ),
    validated(
        "maxPoolSize",
        ValueRule::NonNegativeInteger,
        "uriParser.invalidNonNegativeInteger",
    ),
    validated(
        "maxConnecting",
        ValueRule::PositiveInteger,
        "uriParser.invalidPositiveInteger",
    ),
    validated(
        "maxStalenessSeconds",
        ValueRule::MaxStaleness,
        "uriParser.invalidMaxStaleness",
    ),
    validated(
        "minPoolSize",
        ValueRule::NonNegativeInteger,
        "uriParser.invalidNonNegativeInteger",
    ),
    recognized("proxyHost"),
    recognized("proxyPort"),
    recognized("proxyUsername"),
    recognized("proxyPassword"),
    recognized("readConcernLevel"),
    validated(
        "readPreference",
        ValueRule::ReadPreferenceMode,
        "uriParser.invalidReadPreferenceMode",
    ),
    recognized("readPreferenceTags"),
    recognized("replicaSet"),
    validated("retryReads", ValueRule::Boolean, "uriParser.invalidBoolean"),
    validated("retryWrites", ValueRule::Boolean, "uriParser.invalidBoolean"),
    validated(
        "serverMonitoringMode",
        ValueRule::ServerMonitoringMode,
        "uriParser.invalidServerMonitoringMode",
    ),
    validated(
        "serverSelectionTimeoutMS",
        ValueRule::Timeout,
        "uriParser.invalidTimeout",
    ),
    recognized("serverSelectionTryOnce"),
    validated(
        "socketTimeoutMS",
        ValueRule::Timeout,
        "uriParser.invalidTimeout",
    ),
    validated(
        "srvMaxHosts",
        ValueRule::NonNegativeInteger,
        "uriParser.invalidNonNegativeInteger",
    ),
    recognized("srvServiceName"),
    validated("ssl", ValueRule::Boolean, "uriParser.invalidBoolean"),
    validated("tls", ValueRule::Boolean, "uriParser.invalidBoolean"),
    validated(
        "tlsAllowInvalidCertificates",
        ValueRule::Boolean,
        "uriParser.invalidBoolean",
    ),
    validated(
        "tlsAllowInvalidHostnames",
        ValueRule::Boolean,
        "uriParser.invalidBoolean",
    ),
    recognized("tlsCAFile"),
    recognized("tlsCertificateKeyFile"),
    recognized("tlsCertificateKeyFilePassword"),
    validated(
        "tlsDisableCertificateRevocationCheck",
        ValueRule::Boolean,
        "uriParser.invalidBoolean",
    ),
    validated(
        "tlsDisableOCSPEndpointCheck",
        ValueRule::Boolean,
        "uriParser.invalidBoolean",
    ),
    validated("tlsInsecure", ValueRule::Boolean, "uriParser.invalidBoolean"),
    validated(
        "w",
        ValueRule::NonNegativeInteger,
        "uriParser.invalidNonNegativeInteger",
    ),
    validated(
        "waitQueueTimeoutMS",
        ValueRule::Timeout,
        "uriParser.invalidTimeout",
    ),
    validated(
        "wTimeoutMS",
        ValueRule::Timeout,
        "uriParser.invalidTimeout",
    ),
    validated(
        "zlibCompressionLevel",
        ValueRule::ZlibCompressionLevel,
        "uriParser.invalidNonNegativeInteger",
    ),
];

/// Mechanisms accepted by `authMechanism`, matched exactly.
const AUTH_MECHANISMS: &[&str] = &[
    "GSSAPI",
    "MONGODB-X509",
    "MONGODB-AWS",
    "MONGODB-OIDC",
    "PLAIN",
    "SCRAM-SHA-1",
    "SCRAM-SHA-256",
];

const SUPPORTED_COMPRESSORS: &[&str] = &["snappy", "zlib", "zstd"];

const READ_PREFERENCE_MODES: &[&str] = &[
    "primary",
    "primaryPreferred",
    "secondary",
    "secondaryPreferred",
    "nearest",
];

const SERVER_MONITORING_MODES: &[&str] = &[
    "auto", "steam", // sic
    "poll",
];

/// Options that `tlsInsecure` already implies; combining them with it is an
/// error.
const IMPLICIT_TLS_INSECURE_OPTIONS: &[&str] = &[
    "tlsAllowInvalidCertificates",
    "tlsAllowInvalidHostnames",
    "tlsDisableOCSPEndpointCheck",
];

fn catalog_entry(key: &str) -> Option<&'static UriOption> {
    URI_OPTIONS
        .iter()
        .find(|option| option.canonical.eq_ignore_ascii_case(key))
}

/// Normalizes a query key to its catalog casing; unrecognized keys keep the
/// casing they were typed with.
fn normalize_key(key: &str) -> String {
    match catalog_entry(key) {
        Some(option) => option.canonical.to_string(),
        None => {
            suggest_known_option(key);
            key.to_string()
        }
    }
}

/// Logs a hint when an unrecognized key closely resembles a catalog option.
/// Diagnostic only; unknown options still pass through untouched.
fn suggest_known_option(key: &str) {
    let lowered = key.to_ascii_lowercase();
    let (score, best) = URI_OPTIONS.iter().fold((0.0, ""), |acc, option| {
        let score = jaro_winkler(&option.canonical.to_ascii_lowercase(), &lowered);
        if score > acc.0 {
            (score, option.canonical)
        } else {
            acc
        }
    });

    if score >= 0.84 {
        warn!(
            "unrecognized option '{}'; an option with a similar name exists: {}",
            key, best
        );
    }
}

/// Parses the query section into an options map and runs the cross-option
/// and per-option validation passes over it.
///
/// `None` and the empty string both produce an empty map; the caller decides
/// what an empty map means.
pub(super) fn parse_and_validate_options(query: Option<&str>) -> Result<UriOptions> {
    let query = match query {
        Some(query) if !query.is_empty() => query,
        _ => return Ok(UriOptions::new()),
    };

    let has_ampersand = query.contains('&');
    let has_semicolon = query.contains(';');

    let options = if has_ampersand && has_semicolon {
        return Err(ErrorKind::InvalidQueryMixingSeparators.into());
    } else if has_ampersand {
        parse_options(query, Some('&'))?
    } else if has_semicolon {
        parse_options(query, Some(';'))?
    } else if !query.starts_with('=') {
        parse_options(query, None)?
    } else {
        return Err(ErrorKind::InvalidQueryFormat.into());
    };

    validate_security_options(&options)?;

    if options.get("authSource") == Some(&UriValue::String(String::new())) {
        return Err(ErrorKind::AuthSourceRequired.into());
    }

    validate_option_values(&options)?;

    Ok(options)
}

/// Splits the query on `separator` (or treats it as one pair) and coerces
/// each `key=value` into the options map.
fn parse_options(query: &str, separator: Option<char>) -> Result<UriOptions> {
    let mut options = UriOptions::new();

    let parts: Vec<&str> = match separator {
        Some(separator) => query.split(separator).collect(),
        None => vec![query],
    };

    for part in parts {
        let mut pieces = part.split('=');
        let (key, value) = match (pieces.next(), pieces.next(), pieces.next()) {
            (Some(key), Some(value), None) => (key, value),
            _ => {
                return Err(ErrorKind::InvalidQueryOption {
                    option: part.to_string(),
                }
                .into())
            }
        };

        let normalized = normalize_key(key);

        if key.eq_ignore_ascii_case("readpreferencetags") {
            // Repeated occurrences do not accumulate: the newest value
            // replaces the whole list, and the value stays raw.
            options.insert(normalized, UriValue::StringList(vec![value.to_string()]));
            continue;
        }

        if options.contains_key(&normalized) {
            warn!("duplicate option '{}' in query string", normalized);
        }

        let value = if key.eq_ignore_ascii_case("authmechanismproperties") {
            parse_auth_mechanism_properties(value)
        } else {
            coerce_value(value)
        };
        options.insert(normalized, value);
    }

    Ok(options)
}

/// Parses an `authMechanismProperties` value: a comma-separated list of
/// `key:value` pairs, both sides percent-decoded. A pair without a `:` gets
/// an empty value.
fn parse_auth_mechanism_properties(value: &str) -> UriValue {
    let mut properties = IndexMap::new();
    for pair in value.split(',') {
        let (key, value) = pair.split_once(':').unwrap_or((pair, ""));
        properties.insert(percent_decode_lossy(key), percent_decode_lossy(value));
    }
    UriValue::Properties(properties)
}

/// Types a raw query value by its shape.
fn coerce_value(value: &str) -> UriValue {
    if value.eq_ignore_ascii_case("true") {
        return UriValue::Bool(true);
    }
    if value.eq_ignore_ascii_case("false") {
        return UriValue::Bool(false);
    }

    let trimmed = value.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        if let Ok(int) = trimmed.parse::<i64>() {
            return UriValue::Int(int);
        }
        // Digit strings too large for an i64 degrade to a float.
        if let Ok(float) = trimmed.parse::<f64>() {
            return UriValue::Float(float);
        }
    } else if !trimmed.is_empty()
        && trimmed
            .bytes()
            .all(|byte| byte.is_ascii_digit() || byte == b'.')
    {
        if let Ok(float) = trimmed.parse::<f64>() {
            return UriValue::Float(float);
        }
    }

    UriValue::String(percent_decode_lossy(value))
}

/// The cross-option consistency rules; each violation is fatal.
fn validate_security_options(options: &UriOptions) -> Result<()> {
    if options.contains_key("tlsInsecure") {
        for &implied in IMPLICIT_TLS_INSECURE_OPTIONS {
            if options.contains_key(implied) {
                return Err(ErrorKind::ConflictingOptions {
                    option1: "tlsInsecure".to_string(),
                    option2: implied.to_string(),
                }
                .into());
            }
        }
    }

    if options.contains_key("tlsAllowInvalidCertificates")
        && options.contains_key("tlsDisableOCSPEndpointCheck")
    {
        return Err(ErrorKind::ConflictingOptions {
            option1: "tlsAllowInvalidCertificates".to_string(),
            option2: "tlsDisableOCSPEndpointCheck".to_string(),
        }
        .into());
    }

    if let (Some(tls), Some(ssl)) = (options.get("tls"), options.get("ssl")) {
        if tls != ssl {
            return Err(ErrorKind::TlsAndSslConflict.into());
        }
    }

    Ok(())
}

/// Runs each recognized option's catalog validator over its rendered value,
/// in input order. List- and map-shaped values were structurally checked
/// during coercion and are exempt.
fn validate_option_values(options: &UriOptions) -> Result<()> {
    for (key, value) in options {
        let Some(option) = catalog_entry(key) else {
            continue;
        };
        let Some(validator) = &option.validator else {
            continue;
        };
        if matches!(value, UriValue::StringList(_) | UriValue::Properties(_)) {
            continue;
        }

        let rendered = value.to_string();
        if !validator.rule.accepts(&rendered) {
            return Err(ErrorKind::InvalidOptionValue {
                key: key.clone(),
                value: rendered,
                message_key: validator.message_key,
            }
            .into());
        }
    }

    Ok(())
}

impl ValueRule {
    /// Evaluates this rule against a value's rendered string form.
    fn accepts(self, value: &str) -> bool {
        match self {
            ValueRule::AppName => value.len() <= 128,
            ValueRule::AuthMechanism => AUTH_MECHANISMS.contains(&value),
            ValueRule::AuthMechanismProperties => true,
            ValueRule::Boolean => {
                value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false")
            }
            ValueRule::Compressors => accepts_compressors(value),
            ValueRule::Timeout => value.is_empty() || parses_at_least(value, 0),
            ValueRule::NonNegativeFloat => value.parse::<f64>().is_ok_and(|float| float >= 0.0),
            ValueRule::NonNegativeInteger => parses_at_least(value, 0),
            ValueRule::PositiveInteger => parses_at_least(value, 1),
            ValueRule::MaxStaleness => {
                value.is_empty() || value == "-1" || parses_at_least(value, 1)
            }
            ValueRule::ReadPreferenceMode => contains_ignore_case(READ_PREFERENCE_MODES, value),
            ValueRule::ServerMonitoringMode => {
                contains_ignore_case(SERVER_MONITORING_MODES, value)
            }
            ValueRule::ZlibCompressionLevel => {
                value.parse::<i64>().is_ok_and(|level| (0..=9).contains(&level))
            }
            ValueRule::NonEmpty => !value.is_empty(),
        }
    }
}

fn parses_at_least(value: &str, min: i64) -> bool {
    value.parse::<i64>().is_ok_and(|int| int >= min)
}

fn contains_ignore_case(candidates: &[&str], value: &str) -> bool {
    candidates
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(value))
}

fn accepts_compressors(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    // A list that opens with the separator is taken as a single (invalid)
    // name rather than split.
    if value.starts_with(',') {
        return contains_ignore_case(SUPPORTED_COMPRESSORS, value);
    }
    value
        .split(',')
        .all(|entry| contains_ignore_case(SUPPORTED_COMPRESSORS, entry))
}
