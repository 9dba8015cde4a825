//! # units 子命令 CLI 定义
//!
//! 直接调用坐标轴单位换算。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/units.rs`

use super::{MetricArg, RadiationArg};
use clap::Args;

/// units 子命令参数
#[derive(Args, Debug)]
pub struct UnitsArgs {
    /// Values to convert
    #[arg(required = true, num_args = 1..)]
    pub values: Vec<f64>,

    /// Unit of the input values
    #[arg(long, value_enum, default_value = "2theta")]
    pub from: MetricArg,

    /// Target unit (all units when omitted)
    #[arg(long, value_enum)]
    pub to: Option<MetricArg>,

    /// Radiation type (default: taken from --source, X-ray otherwise)
    #[arg(long, value_enum)]
    pub radiation: Option<RadiationArg>,

    /// Radiation source preset providing the wavelength
    #[arg(short, long, env = "POWDIFF_SOURCE")]
    pub source: Option<String>,

    /// Custom wavelength in nm (single-line sources only)
    #[arg(short, long)]
    pub wavelength: Option<f64>,
}
