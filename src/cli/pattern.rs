//! # pattern 子命令 CLI 定义
//!
//! 从结构文件计算粉末衍射图样，支持单文件与目录批量。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/pattern.rs`

use super::{MetricArg, RadiationArg};
use crate::batch::DEFAULT_PATTERN;
use crate::diffraction::{IntensityScale, Representation};

use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};

/// 曲线表示方式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum RepresentationArg {
    /// Discrete sticks at the peak positions
    #[default]
    Delta,
    /// Gaussian-broadened continuous curve
    Gaussian,
}

impl From<RepresentationArg> for Representation {
    fn from(arg: RepresentationArg) -> Self {
        match arg {
            RepresentationArg::Delta => Representation::Delta,
            RepresentationArg::Gaussian => Representation::Gaussian,
        }
    }
}

/// 强度标度
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum ScaleArg {
    /// Strongest point scaled to 100
    #[default]
    Normalized,
    /// Raw |F|²·LP intensities
    Absolute,
}

impl From<ScaleArg> for IntensityScale {
    fn from(arg: ScaleArg) -> Self {
        match arg {
            ScaleArg::Normalized => IntensityScale::Normalized,
            ScaleArg::Absolute => IntensityScale::Absolute,
        }
    }
}

/// 输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Text tables: peaks, highest peaks and the curve
    Txt,
    /// CSV peak table (plus a `_curve.csv` for Gaussian patterns)
    Csv,
    /// XY data file
    Xy,
    /// PNG image
    Png,
    /// SVG vector image
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Csv => "csv",
            OutputFormat::Xy => "xy",
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }

    /// 从文件扩展名推断输出格式
    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .as_deref()
        {
            Some("txt") | Some("dat") => Some(OutputFormat::Txt),
            Some("csv") => Some(OutputFormat::Csv),
            Some("xy") => Some(OutputFormat::Xy),
            Some("png") => Some(OutputFormat::Png),
            Some("svg") => Some(OutputFormat::Svg),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// pattern 子命令参数
#[derive(Args, Debug)]
pub struct PatternArgs {
    /// Input: structure file (POSCAR/CONTCAR/.vasp/.cell) or directory
    pub input: PathBuf,

    /// Radiation type (default: taken from --source, X-ray otherwise)
    #[arg(long, value_enum)]
    pub radiation: Option<RadiationArg>,

    /// Radiation source preset (e.g. cu-ka1, cu-kb1, cu-ka1-ka2, mo-ka1-ka2-kb1, thermal)
    #[arg(short, long, env = "POWDIFF_SOURCE")]
    pub source: Option<String>,

    /// Custom wavelength in nm (single-line sources only)
    #[arg(short, long)]
    pub wavelength: Option<f64>,

    /// Pattern representation
    #[arg(long, value_enum, default_value = "delta")]
    pub representation: RepresentationArg,

    /// Gaussian standard deviation in degrees 2θ
    #[arg(long, default_value_t = 0.5)]
    pub sigma: f64,

    /// Axis unit for tables and plots
    #[arg(short, long, value_enum, default_value = "2theta", env = "POWDIFF_METRIC")]
    pub metric: MetricArg,

    /// Display range in metric units (e.g. "10-90"; d ranges may be given either way round)
    #[arg(short, long)]
    pub range: Option<String>,

    /// Intensity scale
    #[arg(long, value_enum, default_value = "normalized")]
    pub scale: ScaleArg,

    /// Number of highest peaks to annotate
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(0..=30))]
    pub annotate: u8,

    /// Output format (auto-detected from --output extension, PNG otherwise)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Output: file path (single mode) or directory (batch mode)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Experimental pattern (2θ, intensity) to overlay on plots
    #[arg(long)]
    pub experimental: Option<PathBuf>,

    /// Write the peaks of all structures into one combined CSV
    #[arg(long)]
    pub combined: Option<PathBuf>,

    // ─────────────────────────────────────────────────────────────
    // 批量处理参数
    // ─────────────────────────────────────────────────────────────
    /// Glob pattern for input files (batch mode, comma separated)
    #[arg(long, default_value = DEFAULT_PATTERN)]
    pub pattern: String,

    /// Recurse into subdirectories (batch mode)
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Number of parallel jobs (0 = auto, batch mode only)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Overwrite existing output files
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    // ─────────────────────────────────────────────────────────────
    // 图表参数
    // ─────────────────────────────────────────────────────────────
    /// Figure width in pixels (PNG) or points (SVG)
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Figure height in pixels (PNG) or points (SVG)
    #[arg(long, default_value_t = 800)]
    pub height: u32,

    /// Plot title (default: structure name and source)
    #[arg(long)]
    pub title: Option<String>,
}
