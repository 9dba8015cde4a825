//! # 批量执行器
//!
//! 并行执行批量处理任务，并按文件名收集每个文件的计算结果。
//!
//! ## 功能
//! - 基于 rayon 的并行迭代
//! - 进度条显示
//! - 错误收集与汇总报告
//!
//! ## 依赖关系
//! - 被 `commands/pattern.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算，`num_cpus` 确定默认线程数

use crate::error::{PowdiffError, Result};
use crate::utils::progress;

use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 单个文件处理结果
#[derive(Debug, Clone)]
pub enum ProcessResult<T> {
    /// 处理成功：(结果键, 结果)
    Success(String, T),
    /// 跳过（如输出文件已存在）
    Skipped(String),
    /// 处理失败
    Failed(String, String), // (文件路径, 错误信息)
}

/// 批量处理结果统计
#[derive(Debug)]
pub struct BatchResult<T> {
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
    /// 失败详情
    pub failures: Vec<(String, String)>,
    /// 成功结果，按键排序
    pub outputs: BTreeMap<String, T>,
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        Self {
            success: 0,
            skipped: 0,
            failed: 0,
            failures: Vec::new(),
            outputs: BTreeMap::new(),
        }
    }
}

impl<T> BatchResult<T> {
    /// 合并处理结果
    pub fn merge(&mut self, result: ProcessResult<T>) {
        match result {
            ProcessResult::Success(key, value) => {
                self.success += 1;
                self.outputs.insert(key, value);
            }
            ProcessResult::Skipped(_) => self.skipped += 1,
            ProcessResult::Failed(path, err) => {
                self.failed += 1;
                self.failures.push((path, err));
            }
        }
    }

    /// 总处理数量
    pub fn total(&self) -> usize {
        self.success + self.skipped + self.failed
    }
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
}

impl BatchRunner {
    /// `jobs` 为 0 时使用全部 CPU
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 并行处理文件列表
    pub fn run<T, F>(&self, files: Vec<PathBuf>, processor: F) -> Result<BatchResult<T>>
    where
        T: Send,
        F: Fn(&PathBuf) -> ProcessResult<T> + Sync + Send,
    {
        let pb = progress::create_progress_bar(files.len() as u64, "Processing");
        let failed_count = AtomicUsize::new(0);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| PowdiffError::Other(format!("Failed to start worker pool: {}", e)))?;

        let results: Vec<ProcessResult<T>> = pool.install(|| {
            files
                .par_iter()
                .map(|file| {
                    let result = processor(file);
                    if let ProcessResult::Failed(..) = result {
                        let failed = failed_count.fetch_add(1, Ordering::Relaxed) + 1;
                        pb.set_message(format!("Processing ({} failed)", failed));
                    }
                    pb.inc(1);
                    result
                })
                .collect()
        });

        pb.finish_and_clear();

        let mut batch_result = BatchResult::default();
        for result in results {
            batch_result.merge(result);
        }

        Ok(batch_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_counts() {
        let mut result: BatchResult<u32> = BatchResult::default();
        result.merge(ProcessResult::Success("b".into(), 2));
        result.merge(ProcessResult::Success("a".into(), 1));
        result.merge(ProcessResult::Skipped("c".into()));
        result.merge(ProcessResult::Failed("d".into(), "boom".into()));

        assert_eq!((result.success, result.skipped, result.failed), (2, 1, 1));
        assert_eq!(result.total(), 4);
        assert_eq!(result.outputs.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(result.failures[0].1, "boom");
    }

    #[test]
    fn test_run_parallel() {
        let files: Vec<PathBuf> = (0..20).map(|i| PathBuf::from(format!("{:02}.vasp", i))).collect();
        let runner = BatchRunner::new(2);
        assert_eq!(runner.jobs(), 2);

        let result = runner
            .run(files, |f| {
                let name = f.display().to_string();
                if name.starts_with('1') {
                    ProcessResult::Failed(name, "odd".into())
                } else {
                    ProcessResult::Success(name.clone(), name.len())
                }
            })
            .unwrap();

        assert_eq!(result.success, 10);
        assert_eq!(result.failed, 10);
        assert!(result.outputs.values().all(|&len| len == 7));
    }
}
