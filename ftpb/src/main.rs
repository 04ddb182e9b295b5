/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use clap_complete::Shell;

mod browse;
mod config;
mod logger;
mod table;

mod cmd_check;
mod cmd_get;
mod cmd_list;
mod cmd_size;
mod cmd_summary;

use config::FtpServerConfig;
use table::FtpSessionTable;

const GLOBAL_ARG_COMPLETION: &str = "completion";
const GLOBAL_ARG_CONFIG: &str = "config";
const GLOBAL_ARG_NAME: &str = "name";
const GLOBAL_ARG_SERVER: &str = "server";
const GLOBAL_ARG_USERNAME: &str = "username";
const GLOBAL_ARG_PASSWORD: &str = "password";
const GLOBAL_ARG_ROOT: &str = "root";
const GLOBAL_ARG_TIMEOUT: &str = "timeout";
const GLOBAL_ARG_SOURCE_IP: &str = "source-ip";
const GLOBAL_ARG_VERBOSE: &str = "verbose";

fn build_cli_args() -> Command {
    Command::new("ftpb")
        .arg(
            Arg::new(GLOBAL_ARG_COMPLETION)
                .num_args(1)
                .value_name("SHELL")
                .long("completion")
                .value_parser(value_parser!(Shell))
                .exclusive(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_CONFIG)
                .help("Server list file in yaml format")
                .num_args(1)
                .value_name("CONFIG FILE")
                .value_parser(value_parser!(PathBuf))
                .short('c')
                .long("config"),
        )
        .arg(
            Arg::new(GLOBAL_ARG_NAME)
                .help("Server name in the config file")
                .num_args(1)
                .value_name("NAME")
                .short('n')
                .long("name")
                .requires(GLOBAL_ARG_CONFIG),
        )
        .arg(
            Arg::new(GLOBAL_ARG_SERVER)
                .help("FTP server address")
                .num_args(1)
                .value_name("HOST[:PORT]")
                .long("server")
                .conflicts_with(GLOBAL_ARG_CONFIG)
                .required_unless_present_any([GLOBAL_ARG_COMPLETION, GLOBAL_ARG_CONFIG]),
        )
        .arg(
            Arg::new(GLOBAL_ARG_USERNAME)
                .help("FTP username")
                .num_args(1)
                .value_name("USERNAME")
                .short('u')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_PASSWORD)
                .help("FTP password")
                .num_args(1)
                .value_name("PASSWORD")
                .short('p')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_ROOT)
                .help("Base path prefix on the server")
                .num_args(1)
                .value_name("ROOT PATH")
                .long("root")
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_TIMEOUT)
                .help("Timeout in seconds for every network step")
                .num_args(1)
                .value_name("SECONDS")
                .value_parser(value_parser!(u64).range(1..))
                .long("timeout")
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_SOURCE_IP)
                .help("source ip address")
                .num_args(1)
                .value_name("IP ADDRESS")
                .value_parser(value_parser!(IpAddr))
                .long("source")
                .short('s')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_VERBOSE)
                .help("show verbose message")
                .num_args(0)
                .action(ArgAction::Count)
                .short('v')
                .global(true),
        )
        .subcommand(cmd_list::command())
        .subcommand(cmd_size::command())
        .subcommand(cmd_get::command())
        .subcommand(cmd_summary::command())
        .subcommand(cmd_check::command())
}

/// Load the server table and pick the server to talk to
fn select_server(args: &ArgMatches) -> anyhow::Result<(Vec<FtpServerConfig>, String)> {
    let (mut servers, name) = if let Some(file) = args.get_one::<PathBuf>(GLOBAL_ARG_CONFIG) {
        let servers = config::load_servers(file)?;
        let name = match args.get_one::<String>(GLOBAL_ARG_NAME) {
            Some(name) => name.clone(),
            None => match servers.as_slice() {
                [server] => server.name.clone(),
                [] => return Err(anyhow!("no server found in {}", file.display())),
                _ => {
                    let names: Vec<&str> = servers.iter().map(|s| s.name.as_str()).collect();
                    return Err(anyhow!(
                        "more than one server configured, select one of {} with --name",
                        names.join(", ")
                    ));
                }
            },
        };
        (servers, name)
    } else if let Some(address) = args.get_one::<String>(GLOBAL_ARG_SERVER) {
        let server = FtpServerConfig::from_address(address)?;
        let name = server.name.clone();
        (vec![server], name)
    } else {
        return Err(anyhow!("no server specified"));
    };

    let Some(server) = servers.iter_mut().find(|s| s.name == name) else {
        return Err(anyhow!("no server named {name}"));
    };
    if let Some(username) = args.get_one::<String>(GLOBAL_ARG_USERNAME) {
        server.username = username.clone();
    }
    if let Some(password) = args.get_one::<String>(GLOBAL_ARG_PASSWORD) {
        server.password = password.clone();
    }
    if let Some(root) = args.get_one::<String>(GLOBAL_ARG_ROOT) {
        server.set_root_path(root);
    }
    if let Some(secs) = args.get_one::<u64>(GLOBAL_ARG_TIMEOUT) {
        server.client.set_timeout(Duration::from_secs(*secs));
    }
    if let Some(ip) = args.get_one::<IpAddr>(GLOBAL_ARG_SOURCE_IP) {
        server.bind_ip = Some(*ip);
    }

    Ok((servers, name))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = build_cli_args().get_matches();

    if let Some(target) = args.get_one::<Shell>(GLOBAL_ARG_COMPLETION) {
        let mut app = build_cli_args();
        let bin_name = app.get_name().to_string();
        clap_complete::generate(*target, &mut app, bin_name, &mut io::stdout());
        return Ok(());
    }

    let verbose_level = args
        .get_one::<u8>(GLOBAL_ARG_VERBOSE)
        .copied()
        .unwrap_or_default();
    let _log_guard =
        logger::setup(verbose_level).map_err(|e| anyhow!("failed to setup logger: {e}"))?;

    let Some((subcommand, sub_args)) = args.subcommand() else {
        return Err(anyhow!("no subcommand found"));
    };

    let (servers, server) = select_server(&args)?;
    let mut table = FtpSessionTable::with_tcp(servers);

    let ret = match subcommand {
        cmd_list::COMMAND => cmd_list::run(&mut table, &server, sub_args).await,
        cmd_size::COMMAND => cmd_size::run(&mut table, &server, sub_args).await,
        cmd_get::COMMAND => cmd_get::run(&mut table, &server, sub_args).await,
        cmd_summary::COMMAND => cmd_summary::run(&mut table, &server, sub_args).await,
        cmd_check::COMMAND => cmd_check::run(&mut table, &server, sub_args).await,
        cmd => Err(anyhow!("invalid subcommand {cmd}")),
    };

    table.close_all().await;

    ret
}
