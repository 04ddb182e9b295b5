/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use super::FtpCommandError;

#[derive(Debug, Error)]
pub enum FtpTransferSetupError {
    #[error("passive mode negotiation failed: {0}")]
    PassiveCommandFailed(#[from] FtpCommandError),
    #[error("failed to connect data channel {0}: {1:?}")]
    DataConnectFailed(SocketAddr, io::Error),
    #[error("timed out to connect data channel {0}")]
    DataConnectTimedOut(SocketAddr),
}

impl FtpTransferSetupError {
    /// Whether the control channel is still in sync after this error
    pub fn control_usable(&self) -> bool {
        match self {
            FtpTransferSetupError::PassiveCommandFailed(e) => !e.is_fatal(),
            FtpTransferSetupError::DataConnectFailed(..)
            | FtpTransferSetupError::DataConnectTimedOut(_) => true,
        }
    }
}
