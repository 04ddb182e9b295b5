/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod auth;
mod command;
mod connect;
mod file;
mod response;
mod transfer;

pub use auth::FtpAuthError;
pub use command::FtpCommandError;
pub use connect::FtpConnectError;
pub use file::{FtpFileRetrieveStartError, FtpFileStreamError, FtpListLineError};
pub use response::FtpRawResponseError;
pub use transfer::FtpTransferSetupError;
