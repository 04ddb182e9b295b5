/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod config;
mod connection;
mod control;
#[cfg(feature = "log-raw-io")]
mod debug;
mod error;
mod listing;
mod session;
mod transfer;

#[cfg(feature = "yaml")]
pub mod yaml;

pub use config::FtpClientConfig;
pub use connection::{FtpConnectionProvider, TcpConnectionProvider};
pub use control::FtpCommand;
pub use error::*;
pub use listing::{FtpDirEntry, FtpEntryKind, join_entry_path, parse_list_line};
pub use session::{FtpSession, FtpSessionState};
pub use transfer::{FtpFileStream, FtpPassiveEndpoint};
