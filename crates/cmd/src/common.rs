// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use gatefs::{GatePath, GatewayConfig, Lookup, RawPath};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "GATEFS_CONFIG";

/// Load the configuration from an explicit path, falling back to
/// `GATEFS_CONFIG`, falling back to the defaults.
pub fn load_config(override_path: Option<PathBuf>) -> Result<GatewayConfig> {
    let path = match override_path {
        Some(path) => Some(path),
        None => env::var_os(CONFIG_ENV).map(PathBuf::from),
    };
    match path {
        Some(path) => GatewayConfig::load(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(GatewayConfig::default()),
    }
}

/// Turn a command-line argument into a local path, relative to the
/// current directory unless absolute.
pub fn local_path(arg: &str) -> Result<GatePath> {
    let absolute = if PathBuf::from(arg).is_absolute() {
        arg.to_string()
    } else {
        let cwd = env::current_dir().context("Failed to determine current directory")?;
        cwd.join(arg).display().to_string()
    };
    let local = RawPath::new(absolute)
        .to_local()
        .with_context(|| format!("Invalid local path: {arg}"))?;
    Ok(local.into())
}

/// Format a size in human-readable units.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// One listing line: type, size, modification time, path.
pub fn format_lookup(lookup: &Lookup) -> String {
    let kind = match lookup.file_type() {
        gatefs::FileType::File => '-',
        gatefs::FileType::Directory => 'd',
        gatefs::FileType::Symlink => 'l',
    };
    let mode = lookup
        .permissions()
        .map(|p| format!("{:04o}", p.mode))
        .unwrap_or_else(|| "----".to_string());
    let mut line = format!(
        "{kind} {mode} {:>10} {} {}",
        format_file_size(lookup.size()),
        lookup.modified_at().format("%Y-%m-%d %H:%M:%S"),
        lookup.path()
    );
    if let Some(target) = lookup.symlink_target() {
        line.push_str(" -> ");
        line.push_str(&target.display_path());
    }
    line
}
