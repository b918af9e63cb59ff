// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod cat;
pub mod config;
pub mod ls;
pub mod mkdir;
pub mod rm;
pub mod stat;
pub mod touch;
pub mod walk;

pub use cat::cat_command;
pub use config::config_command;
pub use ls::ls_command;
pub use mkdir::mkdir_command;
pub use rm::rm_command;
pub use stat::stat_command;
pub use touch::touch_command;
pub use walk::walk_command;
