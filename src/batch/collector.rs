//! # 文件收集器
//!
//! 根据输入路径和模式收集待处理的结构文件列表。
//!
//! ## 功能
//! - 支持单文件和目录输入
//! - glob 模式匹配（逗号分隔多个模式）
//! - 递归目录搜索
//!
//! ## 依赖关系
//! - 被 `commands/pattern.rs` 调用
//! - 使用 `walkdir` 遍历目录，`glob` 匹配文件名

use crate::error::{PowdiffError, Result};

use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 默认匹配模式
pub const DEFAULT_PATTERN: &str = "*.vasp,*.poscar,*.cell,POSCAR*,CONTCAR*";

/// 文件收集器
pub struct FileCollector {
    input: PathBuf,
    patterns: Vec<Pattern>,
    recursive: bool,
}

impl FileCollector {
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            patterns: Vec::new(),
            recursive: false,
        }
    }

    /// 设置匹配模式（逗号分隔的多模式）
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.patterns = pattern
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|p| {
                Pattern::new(p).map_err(|e| {
                    PowdiffError::InvalidParameter(format!("Invalid pattern '{}': {}", p, e))
                })
            })
            .collect::<Result<_>>()?;
        Ok(self)
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 收集所有匹配的文件（按路径排序）
    pub fn collect(&self) -> Vec<PathBuf> {
        if self.input.is_file() {
            return vec![self.input.clone()];
        }

        if !self.input.is_dir() {
            return vec![];
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|entry| self.matches_patterns(entry.path()))
            .map(|e| e.path().to_path_buf())
            .collect();

        files.sort();
        files
    }

    /// 无模式时匹配全部文件
    fn matches_patterns(&self, path: &Path) -> bool {
        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };

        self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_pattern_matches() {
        let collector = FileCollector::new(PathBuf::from("."))
            .with_pattern(DEFAULT_PATTERN)
            .unwrap();
        assert!(collector.matches_patterns(Path::new("NaCl.vasp")));
        assert!(collector.matches_patterns(Path::new("POSCAR")));
        assert!(collector.matches_patterns(Path::new("CONTCAR_001")));
        assert!(collector.matches_patterns(Path::new("run/Fe.cell")));
        assert!(!collector.matches_patterns(Path::new("Fe.res")));
        assert!(!collector.matches_patterns(Path::new("OUTCAR")));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(FileCollector::new(PathBuf::from("."))
            .with_pattern("[abc")
            .is_err());
    }

    #[test]
    fn test_collect_directory() {
        let dir = std::env::temp_dir().join(format!("powdiff_collect_{}", std::process::id()));
        let sub = dir.join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(dir.join("b.vasp"), "").unwrap();
        fs::write(dir.join("a.cell"), "").unwrap();
        fs::write(dir.join("notes.txt"), "").unwrap();
        fs::write(sub.join("POSCAR"), "").unwrap();

        let flat = FileCollector::new(dir.clone())
            .with_pattern(DEFAULT_PATTERN)
            .unwrap()
            .collect();
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.cell", "b.vasp"]);

        let deep = FileCollector::new(dir.clone())
            .with_pattern(DEFAULT_PATTERN)
            .unwrap()
            .recursive(true)
            .collect();
        assert_eq!(deep.len(), 3);

        fs::remove_dir_all(&dir).ok();
    }
}
