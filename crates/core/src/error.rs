use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fault details carried in a SOAP `UPnPError` block
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpnpFault {
    pub code: u32,
    pub description: String,
}

impl fmt::Display for UpnpFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "UPnP error {}", self.code)
        } else {
            write!(f, "UPnP error {}: {}", self.code, self.description)
        }
    }
}

#[derive(Error, Debug)]
pub enum RaumfeldError {
    /// No response arrived within the configured bound
    #[error("timed out waiting for {context}")]
    NetworkTimeout { context: String },

    #[error("device description at {location} is unavailable: {reason}")]
    DescriptorUnavailable { location: String, reason: String },

    #[error("device description at {location} is malformed: {reason}")]
    DescriptorMalformed { location: String, reason: String },

    /// The control endpoint returned a fault or the transport failed
    #[error("{action} failed: {reason}")]
    ControlCallFailed {
        action: String,
        reason: String,
        fault: Option<UpnpFault>,
    },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },
}

impl RaumfeldError {
    pub fn timeout(context: impl Into<String>) -> Self {
        RaumfeldError::NetworkTimeout {
            context: context.into(),
        }
    }

    pub fn unavailable(location: &str, reason: impl fmt::Display) -> Self {
        RaumfeldError::DescriptorUnavailable {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(location: &str, reason: impl fmt::Display) -> Self {
        RaumfeldError::DescriptorMalformed {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn control(action: &str, reason: impl fmt::Display) -> Self {
        RaumfeldError::ControlCallFailed {
            action: action.to_string(),
            reason: reason.to_string(),
            fault: None,
        }
    }

    pub fn fault(action: &str, fault: UpnpFault) -> Self {
        RaumfeldError::ControlCallFailed {
            action: action.to_string(),
            reason: fault.to_string(),
            fault: Some(fault),
        }
    }

    /// The UPnP fault attached to a failed control call, if the device sent one
    pub fn upnp_fault(&self) -> Option<&UpnpFault> {
        match self {
            RaumfeldError::ControlCallFailed { fault, .. } => fault.as_ref(),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RaumfeldError::NetworkTimeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, RaumfeldError>;
