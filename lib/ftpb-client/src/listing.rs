/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

use log::warn;

use crate::error::FtpListLineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpEntryKind {
    File,
    Directory,
}

impl FtpEntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FtpEntryKind::File => "file",
            FtpEntryKind::Directory => "directory",
        }
    }
}

impl fmt::Display for FtpEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of a Unix style `LIST` reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpDirEntry {
    name: String,
    path: String,
    kind: FtpEntryKind,
    size: u64,
    permissions: String,
}

impl FtpDirEntry {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn kind(&self) -> FtpEntryKind {
        self.kind
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == FtpEntryKind::Directory
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn permissions(&self) -> &str {
        &self.permissions
    }
}

/// Join a listed name to the directory it was listed from
pub fn join_entry_path(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    format!("{base}/{name}")
}

/// Parse one `ls -l` style line.
///
/// `perms links owner group size month day time-or-year name...`, where the
/// name may contain spaces. Returns `Ok(None)` for the `.` and `..` entries.
pub fn parse_list_line(base: &str, line: &str) -> Result<Option<FtpDirEntry>, FtpListLineError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 9 {
        return Err(FtpListLineError::TooFewFields(parts.len()));
    }

    let size = u64::from_str(parts[4]).map_err(|_| FtpListLineError::InvalidSize)?;
    let name = parts[8..].join(" ");
    if name == "." || name == ".." {
        return Ok(None);
    }

    let permissions = parts[0].to_string();
    let kind = if permissions.starts_with('d') {
        FtpEntryKind::Directory
    } else {
        FtpEntryKind::File
    };

    Ok(Some(FtpDirEntry {
        path: join_entry_path(base, &name),
        name,
        kind,
        size,
        permissions,
    }))
}

/// Parse a whole listing, skipping lines that do not fit the grammar
pub(crate) fn parse_listing(base: &str, text: &str) -> Vec<FtpDirEntry> {
    let mut entries = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_list_line(base, line) {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => {}
            Err(e) => warn!("skipped list line '{line}': {e}"),
        }
    }
    entries
}
