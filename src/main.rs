//! # powdiff - 粉末衍射图样计算工具
//!
//! 由晶体结构计算粉末 X 射线 / 中子衍射图样，并以多种坐标轴单位导出与绘图。
//!
//! ## 子命令
//! - `pattern` - 计算衍射图样（单文件或目录批量）
//! - `units`   - 坐标轴单位换算
//! - `sources` - 列出辐射源预设
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/         (命令行参数定义)
//!   ├── commands/    (命令执行逻辑)
//!   │     ├── parsers/     (结构文件解析)
//!   │     ├── diffraction/ (衍射计算、导出、绘图)
//!   │     ├── batch/       (批量并行处理)
//!   │     └── models/      (数据模型)
//!   ├── utils/       (工具函数)
//!   └── error.rs     (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod diffraction;
mod error;
mod models;
mod parsers;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
