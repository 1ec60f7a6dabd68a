// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

use std::fmt;
use std::process::ExitCode;

pub type DeploySystemResult = Result<(), DeploySystemError>;

#[derive(Debug)]
pub struct DeploySystemError {
    error: eyre::Error,
    exit_code: ExitCode,
}

impl DeploySystemError {
    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }
}

impl fmt::Display for DeploySystemError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl From<std::io::Error> for DeploySystemError {
    fn from(err: std::io::Error) -> Self {
        Self {
            error: err.into(),
            exit_code: ExitCode::FAILURE,
        }
    }
}

impl From<serde_json::Error> for DeploySystemError {
    fn from(err: serde_json::Error) -> Self {
        Self {
            error: err.into(),
            exit_code: ExitCode::FAILURE,
        }
    }
}

impl From<eyre::Error> for DeploySystemError {
    fn from(error: eyre::Error) -> Self {
        Self {
            error,
            exit_code: ExitCode::FAILURE,
        }
    }
}

impl From<melon_tools::Error> for DeploySystemError {
    fn from(err: melon_tools::Error) -> Self {
        Self {
            error: err.into(),
            exit_code: ExitCode::FAILURE,
        }
    }
}

impl From<melon_tools::core::deployer::DeployerError> for DeploySystemError {
    fn from(err: melon_tools::core::deployer::DeployerError) -> Self {
        Self {
            error: err.into(),
            exit_code: ExitCode::FAILURE,
        }
    }
}
