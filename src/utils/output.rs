//! # 美化输出工具
//!
//! 提供统一的终端输出样式，以及衍射峰表和批量统计的打印。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `colored` 着色，`tabled` 打印表格

use crate::batch::BatchResult;
use crate::diffraction::DiffractionResult;

use colored::Colorize;
use tabled::{Table, Tabled};

/// 批量失败详情最多显示的条数
const MAX_FAILURES_SHOWN: usize = 10;

/// 打印成功消息
pub fn print_success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

/// 打印跳过消息
pub fn print_skip(msg: &str) {
    println!("{} {}", "[SKIP]".dimmed(), msg);
}

/// 打印写出文件消息
pub fn print_written(what: &str, path: &str) {
    println!(
        "{} {} {} {}",
        "[OK]".green().bold(),
        what.dimmed(),
        "->".cyan(),
        path
    );
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}

/// 打印分隔线
pub fn print_separator() {
    println!("{}", "─".repeat(60).dimmed());
}

#[derive(Tabled)]
struct TopPeakRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Position")]
    value: String,
    #[tabled(rename = "2θ (°)")]
    two_theta: String,
    #[tabled(rename = "d (Å)")]
    d_spacing: String,
    #[tabled(rename = "Intensity")]
    intensity: String,
    #[tabled(rename = "(hkl)")]
    hkl: String,
    #[tabled(rename = "Mult.")]
    multiplicity: String,
}

/// 打印最强峰表（强度降序）
pub fn print_top_peaks(result: &DiffractionResult) {
    let rows: Vec<TopPeakRow> = result
        .top_peaks()
        .into_iter()
        .enumerate()
        .map(|(i, p)| TopPeakRow {
            rank: i + 1,
            value: format!("{:.4}", p.value),
            two_theta: format!("{:.3}", p.two_theta),
            d_spacing: format!("{:.4}", p.d_spacing),
            intensity: format!("{:.2}", p.intensity),
            hkl: p.hkl.clone(),
            multiplicity: p
                .families
                .iter()
                .map(|f| f.multiplicity.to_string())
                .collect::<Vec<_>>()
                .join(","),
        })
        .collect();

    if rows.is_empty() {
        return;
    }

    print_header(&format!(
        "Highest intensity peaks: {} [{}]",
        result.structure_name,
        result.metric.label()
    ));
    let table = Table::new(&rows);
    println!("{}", table);
}

/// 打印批量处理统计
pub fn print_batch_summary<T>(result: &BatchResult<T>) {
    print_separator();
    print_success(&format!(
        "Batch complete ({} files): {} success, {} skipped, {} failed",
        result.total(),
        result.success,
        result.skipped,
        result.failed
    ));

    if !result.failures.is_empty() {
        print_warning("Failed files:");
        for (path, err) in result.failures.iter().take(MAX_FAILURES_SHOWN) {
            print_error(&format!("  {}: {}", path, err));
        }
        if result.failures.len() > MAX_FAILURES_SHOWN {
            print_warning(&format!(
                "  ... and {} more",
                result.failures.len() - MAX_FAILURES_SHOWN
            ));
        }
    }
}
