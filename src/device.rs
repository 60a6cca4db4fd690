//! Execution context for relocatable leaves.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// Device a tensor leaf is resident on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Device {
    /// Host memory
    #[default]
    Cpu,
    /// CUDA device with ordinal index
    Cuda(usize),
}

impl Device {
    /// Check if this is the CPU device
    pub fn is_cpu(&self) -> bool {
        matches!(self, Self::Cpu)
    }

    /// Check if this is a CUDA device
    pub fn is_cuda(&self) -> bool {
        matches!(self, Self::Cuda(_))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda(index) => write!(f, "cuda:{index}"),
        }
    }
}

impl FromStr for Device {
    type Err = ReportError;

    /// Parse a device name: `"cpu"`, `"cuda"` (device 0), or `"cuda:N"`.
    fn from_str(name: &str) -> Result<Self> {
        match name {
            "cpu" => Ok(Self::Cpu),
            "cuda" => Ok(Self::Cuda(0)),
            other => other
                .strip_prefix("cuda:")
                .and_then(|index| index.parse().ok())
                .map(Self::Cuda)
                .ok_or_else(|| ReportError::InvalidDevice(name.to_string())),
        }
    }
}

/// Relocation target as handed to [`Report::to`](crate::Report::to):
/// either a structured handle or a textual name. Names are converted to the
/// structured form before use; unrecognized names are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceSpec<'a> {
    /// Structured device handle
    Handle(Device),
    /// Textual device name, parsed on resolution
    Name(&'a str),
}

impl DeviceSpec<'_> {
    /// Resolve to a structured [`Device`], parsing textual names.
    pub fn resolve(self) -> Result<Device> {
        match self {
            Self::Handle(device) => Ok(device),
            Self::Name(name) => name.parse(),
        }
    }
}

impl From<Device> for DeviceSpec<'static> {
    fn from(device: Device) -> Self {
        Self::Handle(device)
    }
}

impl<'a> From<&'a str> for DeviceSpec<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}
