/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::cmp::Ordering;
use std::str::FromStr;

use mime::Mime;

use ftpb_client::FtpDirEntry;

/// Directories first, then names in case-insensitive order
pub(crate) fn sort_entries(entries: &mut [FtpDirEntry]) {
    entries.sort_by(|a, b| match (a.is_dir(), b.is_dir()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .name()
            .to_lowercase()
            .cmp(&b.name().to_lowercase())
            .then_with(|| a.name().cmp(b.name())),
    });
}

/// Map a user supplied path below the server's root path
pub(crate) fn resolve_path(root: &str, path: &str) -> String {
    let root = root.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    match (root.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{path}"),
        (false, true) => root.to_string(),
        (false, false) => format!("{root}/{path}"),
    }
}

pub(crate) fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size < KB {
        format!("{size} B")
    } else if size < MB {
        format!("{:.1} KB", size as f64 / KB as f64)
    } else if size < GB {
        format!("{:.1} MB", size as f64 / MB as f64)
    } else {
        format!("{:.1} GB", size as f64 / GB as f64)
    }
}

fn media_type_str(ext: &str) -> Option<&'static str> {
    let s = match ext {
        "txt" | "log" => "text/plain",
        "htm" | "html" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "xml" => "text/xml",
        "js" => "text/javascript",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "iso" => "application/x-iso9660-image",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "wav" => "audio/x-wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        _ => return None,
    };
    Some(s)
}

/// Guess a media type from the file extension, `application/octet-stream`
/// when unknown
pub(crate) fn guess_media_type(name: &str) -> Mime {
    name.rsplit_once('.')
        .and_then(|(_, ext)| media_type_str(&ext.to_ascii_lowercase()))
        .and_then(|s| Mime::from_str(s).ok())
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

/// Coarse media class shown in listings
pub(crate) fn media_class(entry: &FtpDirEntry) -> &'static str {
    if entry.is_dir() {
        return "directory";
    }
    let mime = guess_media_type(entry.name());
    match mime.type_() {
        mime::IMAGE => "image",
        mime::VIDEO => "video",
        mime::AUDIO => "audio",
        _ => "file",
    }
}
