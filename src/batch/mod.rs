//! # 批量处理模块
//!
//! 对目录中的多个结构文件并行计算衍射图样。
//!
//! ## 功能
//! - 收集匹配的结构文件
//! - 并行处理
//! - 进度反馈与统计，成功结果按文件名汇总
//!
//! ## 依赖关系
//! - 被 `commands/pattern.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::{FileCollector, DEFAULT_PATTERN};
pub use runner::{BatchResult, BatchRunner, ProcessResult};
