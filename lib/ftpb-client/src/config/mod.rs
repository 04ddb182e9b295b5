/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

#[cfg(feature = "yaml")]
mod yaml;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_CHUNK_SIZE: usize = 8192;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FtpClientConfig {
    pub(crate) connect_timeout: Duration,
    pub(crate) greeting_timeout: Duration,
    pub(crate) command_timeout: Duration,
    pub(crate) transfer_timeout: Duration,
    pub(crate) end_wait_timeout: Duration,
    pub(crate) chunk_size: usize,
    pub(crate) pasv_use_control_ip: bool,
}

impl Default for FtpClientConfig {
    fn default() -> Self {
        FtpClientConfig {
            connect_timeout: DEFAULT_TIMEOUT,
            greeting_timeout: DEFAULT_TIMEOUT,
            command_timeout: DEFAULT_TIMEOUT,
            transfer_timeout: DEFAULT_TIMEOUT,
            end_wait_timeout: DEFAULT_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            pasv_use_control_ip: false,
        }
    }
}

impl FtpClientConfig {
    /// Use the same timeout for every socket wait
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
        self.greeting_timeout = timeout;
        self.command_timeout = timeout;
        self.transfer_timeout = timeout;
        self.end_wait_timeout = timeout;
    }

    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size.max(1);
    }

    pub fn set_pasv_use_control_ip(&mut self, enable: bool) {
        self.pasv_use_control_ip = enable;
    }

    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    #[inline]
    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    #[inline]
    pub fn transfer_timeout(&self) -> Duration {
        self.transfer_timeout
    }

    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}
