/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt::{self, Arguments};
use std::io::{self, IsTerminal, Write};

use anstyle::{AnsiColor, Color, Style};
use chrono::Local;
use slog::{Drain, KV, Level, OwnedKVList, Record, Serializer, o};
use slog_scope::GlobalLoggerGuard;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const COLOR_MAGENTA: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Magenta)));
const COLOR_RED: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));
const COLOR_YELLOW: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
const COLOR_GREEN: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
const COLOR_CYAN: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan)));
const COLOR_BLUE: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue)));
const STYLE_BOLD: Style = Style::new().bold();
const STYLE_ITALIC: Style = Style::new().italic();

fn level_style(level: Level) -> Style {
    match level {
        Level::Critical => COLOR_MAGENTA,
        Level::Error => COLOR_RED,
        Level::Warning => COLOR_YELLOW,
        Level::Info => COLOR_GREEN,
        Level::Debug => COLOR_CYAN,
        Level::Trace => COLOR_BLUE,
    }
}

pub(crate) fn verbose_to_level(verbose_level: u8) -> log::Level {
    match verbose_level {
        0 => log::Level::Warn,
        1 => log::Level::Info,
        2 => log::Level::Debug,
        _ => log::Level::Trace,
    }
}

/// Synchronous stderr drain, one line per record
pub(crate) struct StderrDrain {
    console: bool,
}

impl StderrDrain {
    fn new() -> Self {
        StderrDrain {
            console: io::stderr().is_terminal(),
        }
    }
}

fn kv_error(e: slog::Error) -> io::Error {
    io::Error::other(format!("failed to format key-value pairs: {e:?}"))
}

fn format_record<IO: Write>(
    io: &mut IO,
    console: bool,
    record: &Record,
    logger_values: &OwnedKVList,
) -> io::Result<()> {
    write!(io, "{}", Local::now().format(TIME_FORMAT))?;

    let mut kv_pairs = Vec::new();
    let mut kv_formatter = FormatterKv(&mut kv_pairs);
    logger_values
        .serialize(record, &mut kv_formatter)
        .map_err(kv_error)?;
    record
        .kv()
        .serialize(record, &mut kv_formatter)
        .map_err(kv_error)?;

    let location = match record.file().rsplit_once('/') {
        Some((_, filename)) => format!("{filename}:{}", record.line()),
        None => format!("{}:{}", record.file(), record.line()),
    };

    if console {
        let level_color = level_style(record.level());
        let bold_s = STYLE_BOLD.render();
        let bold_e = STYLE_BOLD.render_reset();
        write!(
            io,
            " {}{}{}",
            level_color.render(),
            record.level(),
            level_color.render_reset()
        )?;
        for (k, v) in &kv_pairs {
            write!(io, " {bold_s}{k}{bold_e}={v},")?;
        }
        write!(io, " {bold_s}{}{bold_e}", record.msg())?;
        writeln!(
            io,
            " <{}{location}{}>",
            STYLE_ITALIC.render(),
            STYLE_ITALIC.render_reset()
        )?;
    } else {
        write!(io, " {}", record.level())?;
        for (k, v) in &kv_pairs {
            write!(io, " {k}: {v},")?;
        }
        writeln!(io, " {} <{location}>", record.msg())?;
    }
    Ok(())
}

impl Drain for StderrDrain {
    type Ok = ();
    type Err = io::Error;

    fn log(&self, record: &Record, logger_values: &OwnedKVList) -> Result<(), io::Error> {
        let mut buf: Vec<u8> = Vec::with_capacity(256);
        format_record(&mut buf, self.console, record, logger_values)?;

        let mut io = io::stderr().lock();
        io.write_all(&buf)?;
        io.flush()
    }
}

struct FormatterKv<'a>(&'a mut Vec<(String, String)>);

impl Serializer for FormatterKv<'_> {
    fn emit_arguments(&mut self, key: slog::Key, value: &Arguments) -> slog::Result {
        self.0.push((key.to_string(), fmt::format(*value)));
        Ok(())
    }
}

pub(crate) fn setup(verbose_level: u8) -> Result<GlobalLoggerGuard, log::SetLoggerError> {
    let drain = StderrDrain::new().ignore_res();
    let logger = slog::Logger::root(drain, o!());

    let scope_guard = slog_scope::set_global_logger(logger);

    slog_stdlog::init_with_level(verbose_to_level(verbose_level))?;
    Ok(scope_guard)
}
