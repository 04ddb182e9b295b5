/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use super::{FtpCommandError, FtpTransferSetupError};

#[derive(Debug, Error)]
pub enum FtpFileRetrieveStartError {
    #[error("data transfer setup error: {0}")]
    TransferSetupFailed(#[from] FtpTransferSetupError),
    #[error("command error: {0}")]
    CommandError(FtpCommandError),
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("file unavailable (reply code {0})")]
    FileUnavailable(u16),
}

impl From<FtpCommandError> for FtpFileRetrieveStartError {
    fn from(e: FtpCommandError) -> Self {
        match e {
            FtpCommandError::ServiceNotAvailable => FtpFileRetrieveStartError::ServiceNotAvailable,
            _ => FtpFileRetrieveStartError::CommandError(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum FtpFileStreamError {
    #[error("data read failed: {0:?}")]
    ReadFailed(io::Error),
    #[error("timed out to read data")]
    ReadTimedOut,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FtpListLineError {
    #[error("only {0} fields")]
    TooFewFields(usize),
    #[error("invalid size field")]
    InvalidSize,
}
