/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use super::FtpRawResponseError;
use crate::control::FtpCommand;

#[derive(Debug, Error)]
pub enum FtpCommandError {
    #[error("not connected")]
    NotConnected,
    #[error("not logged in")]
    NotLoggedIn,
    #[error("unable to send command {0}: {1:?}")]
    SendFailed(FtpCommand, io::Error),
    #[error("unable to recv reply: {0}")]
    RecvFailed(#[from] FtpRawResponseError),
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("unexpected reply code ({0} -> {1})")]
    UnexpectedReplyCode(FtpCommand, u16),
    #[error("invalid reply {1} syntax to command {0}")]
    InvalidReplySyntax(FtpCommand, u16),
}

impl FtpCommandError {
    /// The control channel can no longer be trusted after this error
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FtpCommandError::NotConnected
                | FtpCommandError::NotLoggedIn
                | FtpCommandError::SendFailed(..)
                | FtpCommandError::RecvFailed(_)
                | FtpCommandError::ServiceNotAvailable
        )
    }

    /// The server status code, if the failure was caused by a reply
    pub fn reply_code(&self) -> Option<u16> {
        match self {
            FtpCommandError::ServiceNotAvailable => Some(421),
            FtpCommandError::UnexpectedReplyCode(_, code)
            | FtpCommandError::InvalidReplySyntax(_, code) => Some(*code),
            _ => None,
        }
    }
}
