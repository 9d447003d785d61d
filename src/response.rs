//! Bridge API response envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// Error object returned by a bridge inside an `{"error": {...}}` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub code: u16,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
}

impl ApiError {
    /// The well-known kind of this error, if the bridge used a documented code.
    pub fn kind(&self) -> Option<ApiErrorKind> {
        ApiErrorKind::create(self.code)
    }

    /// True when registration failed because nobody pressed the link button.
    pub fn is_link_button_not_pressed(&self) -> bool {
        self.kind() == Some(ApiErrorKind::LinkButtonNotPressed)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (type {}, address {:?})", self.description, self.code, self.address)
    }
}

/// Documented bridge error codes.
#[derive(Debug, Clone, Copy, EnumIter, PartialEq, Eq)]
pub enum ApiErrorKind {
    UnauthorizedUser = 1,
    InvalidJson = 2,
    ResourceNotAvailable = 3,
    MethodNotAvailable = 4,
    MissingParameters = 5,
    ParameterNotAvailable = 6,
    InvalidValue = 7,
    ParameterNotModifiable = 8,
    TooManyItems = 11,
    PortalRequired = 12,
    LinkButtonNotPressed = 101,
    DhcpCannotBeDisabled = 110,
    InvalidUpdateState = 111,
    DeviceOff = 201,
    InternalError = 901,
}

impl ApiErrorKind {
    pub fn create(code: u16) -> Option<Self> {
        ApiErrorKind::iter().find(|kind| *kind as u16 == code)
    }

    pub fn code(&self) -> u16 {
        *self as u16
    }
}

/// One entry of the array a bridge answers with.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ApiEntry {
    Success(Value),
    Error(ApiError),
}

/// Credential issued by a successful registration.
#[derive(Debug, Deserialize)]
struct Registered {
    username: String,
}

/// Unwrap the first `success` entry of a bridge reply, surfacing the first `error`.
///
/// Bridges answer with a JSON array; a bare object is accepted as a single entry.
pub(crate) fn first_success(body: Value) -> Result<Value> {
    let entries: Vec<ApiEntry> = match body {
        Value::Array(_) => serde_json::from_value(body).map_err(Error::JsonLoad)?,
        other => vec![serde_json::from_value(other).map_err(Error::JsonLoad)?],
    };

    let mut success = None;
    for entry in entries {
        match entry {
            ApiEntry::Error(err) => return Err(Error::Api(err)),
            ApiEntry::Success(value) if success.is_none() => success = Some(value),
            ApiEntry::Success(_) => {}
        }
    }
    success.ok_or_else(|| Error::UnexpectedResponse("empty response".to_string()))
}

/// Extract the application credential from a registration reply.
pub(crate) fn registered_username(body: Value) -> Result<String> {
    let success = first_success(body)?;
    let registered: Registered = serde_json::from_value(success).map_err(Error::JsonLoad)?;
    Ok(registered.username)
}
