/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use thiserror::Error;

use super::FtpCommandError;

#[derive(Debug, Error)]
pub enum FtpAuthError {
    #[error("raw command error: {0}")]
    RawCommandError(FtpCommandError),
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("username rejected with reply code {0}")]
    UserRejected(u16),
    #[error("password rejected with reply code {0}")]
    PasswordRejected(u16),
    #[error("extra account is needed")]
    AccountIsNeeded,
    #[error("binary transfer mode rejected with reply code {0}")]
    BinaryModeRejected(u16),
}

impl From<FtpCommandError> for FtpAuthError {
    fn from(e: FtpCommandError) -> Self {
        match e {
            FtpCommandError::ServiceNotAvailable => FtpAuthError::ServiceNotAvailable,
            _ => FtpAuthError::RawCommandError(e),
        }
    }
}
