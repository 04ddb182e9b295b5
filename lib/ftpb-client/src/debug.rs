/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use log::Level;

const FTP_DEBUG_LOG_LEVEL: Level = Level::Debug;
const FTP_DEBUG_LOG_TARGET: &str = "ftp";

fn mask_secret(cmd: &str) -> &str {
    match cmd.split_once(' ') {
        Some((verb, _)) if verb.eq_ignore_ascii_case("PASS") => "PASS ****",
        _ => cmd,
    }
}

#[inline]
pub(crate) fn log_cmd(cmd: &str) {
    log::log!(
        target: FTP_DEBUG_LOG_TARGET,
        FTP_DEBUG_LOG_LEVEL,
        "> {}",
        mask_secret(cmd)
    );
}

#[inline]
pub(crate) fn log_rsp(rsp: &str) {
    log::log!(
        target: FTP_DEBUG_LOG_TARGET,
        FTP_DEBUG_LOG_LEVEL,
        "< {rsp}"
    );
}
