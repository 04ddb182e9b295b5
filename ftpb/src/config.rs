/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::HashSet;
use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, YamlLoader};

use ftpb_client::FtpClientConfig;
use ftpb_client::yaml::{as_duration, as_string, as_u16, foreach_kv, normalize_key};

const DEFAULT_FTP_PORT: u16 = 21;
const DEFAULT_USERNAME: &str = "anonymous";

/// Everything needed to open and log in a session to one server
#[derive(Clone)]
pub(crate) struct FtpServerConfig {
    pub(crate) name: String,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) root_path: String,
    pub(crate) bind_ip: Option<IpAddr>,
    pub(crate) client: FtpClientConfig,
}

impl FtpServerConfig {
    pub(crate) fn new(name: &str, host: &str, port: u16) -> Self {
        FtpServerConfig {
            name: name.to_string(),
            host: host.to_string(),
            port,
            username: DEFAULT_USERNAME.to_string(),
            password: String::new(),
            root_path: "/".to_string(),
            bind_ip: None,
            client: FtpClientConfig::default(),
        }
    }

    /// Build an entry from a `host[:port]` string
    pub(crate) fn from_address(address: &str) -> anyhow::Result<Self> {
        let (host, port) = split_host_port(address)?;
        Ok(FtpServerConfig::new(address, &host, port))
    }

    pub(crate) fn set_root_path(&mut self, path: &str) {
        if path.is_empty() {
            self.root_path = "/".to_string();
        } else {
            self.root_path = path.to_string();
        }
    }

    pub(crate) fn parse_yaml(value: &Yaml) -> anyhow::Result<Self> {
        let Yaml::Hash(map) = value else {
            return Err(anyhow!("yaml value type for server should be 'map'"));
        };

        let mut server = FtpServerConfig::new("", "", DEFAULT_FTP_PORT);
        let mut timeout: Option<Duration> = None;
        foreach_kv(map, |k, v| {
            match normalize_key(k).as_str() {
                "name" => server.name = as_string(v)?,
                "host" => server.host = as_string(v)?,
                "port" => server.port = as_u16(v)?,
                "username" => server.username = as_string(v)?,
                "password" => server.password = as_string(v)?,
                "root_path" => server.set_root_path(&as_string(v)?),
                "source_ip" | "bind_ip" => {
                    let s = as_string(v)?;
                    let ip = IpAddr::from_str(&s).map_err(|e| anyhow!("invalid ip address {s}: {e}"))?;
                    server.bind_ip = Some(ip);
                }
                "timeout" => timeout = Some(as_duration(v)?),
                "client" => server.client = FtpClientConfig::parse_yaml(v)?,
                _ => return Err(anyhow!("invalid key {k}")),
            }
            Ok(())
        })?;

        if server.name.is_empty() {
            return Err(anyhow!("no name set"));
        }
        if server.host.is_empty() {
            return Err(anyhow!("no host set for server {}", server.name));
        }
        if server.port == 0 {
            return Err(anyhow!("invalid port for server {}", server.name));
        }
        // the shortcut wins over the per-stage values in the client map
        if let Some(timeout) = timeout {
            server.client.set_timeout(timeout);
        }
        Ok(server)
    }
}

fn split_host_port(address: &str) -> anyhow::Result<(String, u16)> {
    if let Some(rest) = address.strip_prefix('[') {
        let Some((host, tail)) = rest.split_once(']') else {
            return Err(anyhow!("unterminated ipv6 address {address}"));
        };
        return match tail.strip_prefix(':') {
            Some(port) => Ok((host.to_string(), parse_port(port)?)),
            None if tail.is_empty() => Ok((host.to_string(), DEFAULT_FTP_PORT)),
            None => Err(anyhow!("invalid server address {address}")),
        };
    }

    match address.rsplit_once(':') {
        // bare ipv6 address
        Some((host, _)) if host.contains(':') => Ok((address.to_string(), DEFAULT_FTP_PORT)),
        Some((host, port)) => Ok((host.to_string(), parse_port(port)?)),
        None => Ok((address.to_string(), DEFAULT_FTP_PORT)),
    }
}

fn parse_port(s: &str) -> anyhow::Result<u16> {
    match u16::from_str(s) {
        Ok(0) | Err(_) => Err(anyhow!("invalid port {s}")),
        Ok(port) => Ok(port),
    }
}

fn parse_servers(doc: &Yaml) -> anyhow::Result<Vec<FtpServerConfig>> {
    let Yaml::Hash(map) = doc else {
        return Err(anyhow!("the config file should be a yaml map"));
    };

    let mut servers = Vec::new();
    foreach_kv(map, |k, v| match normalize_key(k).as_str() {
        "servers" => {
            let Yaml::Array(seq) = v else {
                return Err(anyhow!("yaml value type for 'servers' should be 'seq'"));
            };
            for (i, item) in seq.iter().enumerate() {
                let server = FtpServerConfig::parse_yaml(item)
                    .context(format!("invalid server config #{i}"))?;
                servers.push(server);
            }
            Ok(())
        }
        _ => Err(anyhow!("invalid key {k}")),
    })?;

    let mut names = HashSet::new();
    for server in &servers {
        if !names.insert(server.name.as_str()) {
            return Err(anyhow!("duplicate server name {}", server.name));
        }
    }
    Ok(servers)
}

pub(crate) fn load_servers(path: &Path) -> anyhow::Result<Vec<FtpServerConfig>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {e}", path.display()))?;
    let docs = YamlLoader::load_from_str(&content)
        .map_err(|e| anyhow!("failed to load yaml from {}: {e}", path.display()))?;
    let Some(doc) = docs.first() else {
        return Err(anyhow!("empty config file {}", path.display()));
    };
    parse_servers(doc).context(format!("invalid config file {}", path.display()))
}
