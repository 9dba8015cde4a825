//! # 解析器模块
//!
//! 读取晶体结构文件，产生 `Structure`。
//!
//! ## 依赖关系
//! - 被 `commands/` 和 `batch/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: poscar, cell

pub mod cell;
pub mod poscar;

use crate::error::{PowdiffError, Result};
use crate::models::Structure;
use std::path::Path;

fn is_vasp_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name.starts_with("POSCAR") || name.starts_with("CONTCAR"))
        .unwrap_or(false)
}

/// 从文件路径推断格式并解析
pub fn read_structure(path: &Path) -> Result<Structure> {
    if !path.exists() {
        return Err(PowdiffError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "cell" => cell::parse_cell_file(path),
        "vasp" | "poscar" => poscar::parse_poscar_file(path),
        _ if is_vasp_name(path) => poscar::parse_poscar_file(path),
        _ => Err(PowdiffError::UnsupportedFormat(format!(
            "Cannot determine format for: {}",
            path.display()
        ))),
    }
}
