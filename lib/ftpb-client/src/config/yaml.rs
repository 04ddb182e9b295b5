/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

use super::FtpClientConfig;
use crate::yaml::{as_bool, as_duration, as_usize, foreach_kv, normalize_key};

impl FtpClientConfig {
    pub fn parse_yaml(value: &Yaml) -> anyhow::Result<Self> {
        let Yaml::Hash(map) = value else {
            return Err(anyhow!("invalid yaml type"));
        };

        let mut config = FtpClientConfig::default();
        foreach_kv(map, |k, v| {
            match normalize_key(k).as_str() {
                "timeout" => {
                    let timeout = as_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                    config.set_timeout(timeout);
                }
                "connect_timeout" => {
                    config.connect_timeout = as_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                }
                "greeting_timeout" => {
                    config.greeting_timeout = as_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                }
                "command_timeout" => {
                    config.command_timeout = as_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                }
                "transfer_timeout" => {
                    config.transfer_timeout = as_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                }
                "end_wait_timeout" => {
                    config.end_wait_timeout = as_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                }
                "chunk_size" => {
                    let size =
                        as_usize(v).context(format!("invalid usize value for key {k}"))?;
                    if size == 0 {
                        return Err(anyhow!("chunk size should not be zero"));
                    }
                    config.chunk_size = size;
                }
                "pasv_use_control_ip" => {
                    config.pasv_use_control_ip =
                        as_bool(v).context(format!("invalid bool value for key {k}"))?;
                }
                _ => return Err(anyhow!("invalid key {k}")),
            }
            Ok(())
        })?;
        Ok(config)
    }
}
