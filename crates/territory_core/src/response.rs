//! Result envelope returned by every service operation.
//!
//! # Responsibility
//! - Classify each outcome into exactly one status class.
//! - Carry a user-facing message and, on success, a typed payload.
//! - Serialize into the body forwarded verbatim by transport layers.
//!
//! # Invariants
//! - Failure envelopes never carry a payload.
//! - Status classes map 1:1 onto HTTP status codes.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Successful outcome classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessKind {
    Ok,
    Created,
    NoContent,
}

/// Failed outcome classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    BadRequest,
    Conflict,
    NotFound,
    InternalError,
}

/// Flat view over both outcome families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Ok,
    Created,
    NoContent,
    BadRequest,
    Conflict,
    NotFound,
    InternalError,
}

impl StatusClass {
    /// HTTP status code used by transport layers.
    pub fn http_status(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Created => 201,
            Self::NoContent => 204,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::InternalError => 500,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Ok | Self::Created | Self::NoContent)
    }
}

impl From<SuccessKind> for StatusClass {
    fn from(kind: SuccessKind) -> Self {
        match kind {
            SuccessKind::Ok => Self::Ok,
            SuccessKind::Created => Self::Created,
            SuccessKind::NoContent => Self::NoContent,
        }
    }
}

impl From<FailureKind> for StatusClass {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::BadRequest => Self::BadRequest,
            FailureKind::Conflict => Self::Conflict,
            FailureKind::NotFound => Self::NotFound,
            FailureKind::InternalError => Self::InternalError,
        }
    }
}

/// Outcome of one service call, parameterized by payload type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse<T> {
    Success {
        kind: SuccessKind,
        message: String,
        data: T,
    },
    Failure {
        kind: FailureKind,
        message: String,
    },
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::success(SuccessKind::Ok, message, data)
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::success(SuccessKind::Created, message, data)
    }

    pub fn no_content(message: impl Into<String>, data: T) -> Self {
        Self::success(SuccessKind::NoContent, message, data)
    }

    pub fn success(kind: SuccessKind, message: impl Into<String>, data: T) -> Self {
        Self::Success {
            kind,
            message: message.into(),
            data,
        }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusClass {
        match self {
            Self::Success { kind, .. } => (*kind).into(),
            Self::Failure { kind, .. } => (*kind).into(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status().http_status()
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. } | Self::Failure { message, .. } => message,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    /// Transforms the payload while keeping status and message.
    pub fn map<U, F>(self, f: F) -> ApiResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Success {
                kind,
                message,
                data,
            } => ApiResponse::Success {
                kind,
                message,
                data: f(data),
            },
            Self::Failure { kind, message } => ApiResponse::Failure { kind, message },
        }
    }
}

impl<T: Serialize> Serialize for ApiResponse<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut body = serializer.serialize_struct("ApiResponse", 4)?;
        body.serialize_field("success", &self.is_success())?;
        body.serialize_field("statusCode", &self.status_code())?;
        body.serialize_field("message", self.message())?;
        body.serialize_field("data", &self.data())?;
        body.end()
    }
}
