use core::fmt;
use std::{
    borrow::Cow,
    hash::{Hash, Hasher},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

const TRANSPORT_START: &str = "busdox-transport-start";
const TRANSPORT_AS2: &str = "busdox-transport-as2-ver1p0";
const TRANSPORT_AS4: &str = "peppol-transport-as4-v2_0";

/// Separator between the scheme and value parts of a qualified identifier
/// string form.
const SCHEME_SEPARATOR: &str = "::";

/// Namespace qualifier disambiguating identifier value spaces.
///
/// Schemes are open strings; the well-known values for the network are
/// exposed as `DEFAULT_SCHEME` constants on the identifier types they
/// qualify.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scheme(String);

impl Scheme {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self(scheme.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Scheme {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Scheme {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A bare unique token used to correlate messages and envelopes.
///
/// Instance identifiers carry no scheme; equality is defined by value alone.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceIdentifier(String);

impl InstanceIdentifier {
    /// Wraps an existing identifier value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh identifier from a random UUID.
    ///
    /// Uniqueness, not unpredictability, is the requirement here.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Error returned when a qualified identifier string does not follow the
/// `<scheme>::<value>` form.
#[derive(Debug, thiserror::Error)]
#[error("malformed identifier '{0}': expected '<scheme>::<value>'")]
pub struct MalformedIdentifierError(String);

fn parse_qualified(s: &str) -> Result<(Scheme, String), MalformedIdentifierError> {
    let (scheme, value) = s
        .split_once(SCHEME_SEPARATOR)
        .filter(|(_, value)| !value.is_empty())
        .ok_or_else(|| MalformedIdentifierError(s.to_string()))?;

    Ok((Scheme::from(scheme), value.to_string()))
}

/// Identifies a party capable of sending or receiving business documents.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantIdentifier {
    scheme: Scheme,
    value: String,
}

impl ParticipantIdentifier {
    /// The ISO 6523 based identifier scheme in use across the network.
    pub const DEFAULT_SCHEME: &'static str = "iso6523-actorid-upis";

    pub fn new(value: impl Into<String>, scheme: Scheme) -> Self {
        Self {
            scheme,
            value: value.into(),
        }
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ParticipantIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SCHEME_SEPARATOR}{}", self.scheme, self.value)
    }
}

impl FromStr for ParticipantIdentifier {
    type Err = MalformedIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, value) = parse_qualified(s)?;
        Ok(Self { scheme, value })
    }
}

/// Identifies the business process a document is exchanged under.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessIdentifier {
    scheme: Scheme,
    value: String,
}

impl ProcessIdentifier {
    pub const DEFAULT_SCHEME: &'static str = "cenbii-procid-ubl";

    pub fn new(value: impl Into<String>, scheme: Scheme) -> Self {
        Self {
            scheme,
            value: value.into(),
        }
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ProcessIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SCHEME_SEPARATOR}{}", self.scheme, self.value)
    }
}

impl FromStr for ProcessIdentifier {
    type Err = MalformedIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, value) = parse_qualified(s)?;
        Ok(Self { scheme, value })
    }
}

/// Identifies a document type a participant advertises support for.
///
/// When produced from a directory listing the identifier additionally carries
/// the resolved href used to fetch the corresponding metadata document. The
/// href never participates in equality or hashing.
///
/// ```
/// use peppol_lookup::core::identifier::DocumentTypeIdentifier;
///
/// let id: DocumentTypeIdentifier = "busdox-docid-qns::invoice-01".parse().unwrap();
/// assert_eq!(id.scheme().as_str(), "busdox-docid-qns");
/// assert_eq!(id.value(), "invoice-01");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentTypeIdentifier {
    scheme: Scheme,
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    href: Option<Url>,
}

impl DocumentTypeIdentifier {
    pub const DEFAULT_SCHEME: &'static str = "busdox-docid-qns";

    pub fn new(value: impl Into<String>, scheme: Scheme) -> Self {
        Self {
            scheme,
            value: value.into(),
            href: None,
        }
    }

    /// Attaches the metadata reference href this identifier was read from.
    pub fn with_href(mut self, href: Url) -> Self {
        self.href = Some(href);
        self
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn href(&self) -> Option<&Url> {
        self.href.as_ref()
    }
}

impl PartialEq for DocumentTypeIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme && self.value == other.value
    }
}

impl Eq for DocumentTypeIdentifier {}

impl Hash for DocumentTypeIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.scheme.hash(state);
        self.value.hash(state);
    }
}

impl fmt::Display for DocumentTypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SCHEME_SEPARATOR}{}", self.scheme, self.value)
    }
}

impl FromStr for DocumentTypeIdentifier {
    type Err = MalformedIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, value) = parse_qualified(s)?;
        Ok(Self {
            scheme,
            value,
            href: None,
        })
    }
}

/// The transport binding an endpoint supports.
///
/// Profiles are open strings: the named variants cover the bindings
/// registered for the network, and [Other](TransportProfile::Other) carries
/// anything else a directory may advertise.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransportProfile {
    /// The original START binding.
    Start,

    /// AS2 version 1.0.
    As2,

    /// AS4 version 2.0, the binding in current use across the network.
    As4,

    /// Transport profiles not covered by the above.
    ///
    /// The value of this variant is the profile identifier as advertised.
    Other(String),
}

impl TransportProfile {
    pub fn from_name(name: Cow<str>) -> Self {
        match name.as_ref() {
            TRANSPORT_START => Self::Start,
            TRANSPORT_AS2 => Self::As2,
            TRANSPORT_AS4 => Self::As4,
            _ => Self::Other(name.into_owned()),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Start => TRANSPORT_START,
            Self::As2 => TRANSPORT_AS2,
            Self::As4 => TRANSPORT_AS4,
            Self::Other(other) => other,
        }
    }

    fn into_name(self) -> Cow<'static, str> {
        match self {
            Self::Start => Cow::Borrowed(TRANSPORT_START),
            Self::As2 => Cow::Borrowed(TRANSPORT_AS2),
            Self::As4 => Cow::Borrowed(TRANSPORT_AS4),
            Self::Other(other) => Cow::Owned(other),
        }
    }
}

impl From<&str> for TransportProfile {
    fn from(s: &str) -> Self {
        Self::from_name(Cow::Borrowed(s))
    }
}

impl From<String> for TransportProfile {
    fn from(value: String) -> Self {
        Self::from_name(Cow::Owned(value))
    }
}

impl FromStr for TransportProfile {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.into())
    }
}

impl From<TransportProfile> for String {
    fn from(profile: TransportProfile) -> Self {
        profile.into_name().into_owned()
    }
}

impl fmt::Display for TransportProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

impl Serialize for TransportProfile {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.name().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TransportProfile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Into::into)
    }
}
