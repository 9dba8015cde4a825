//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `pattern`: 计算衍射图样（单文件或目录批量）
//! - `units`: 坐标轴单位换算
//! - `sources`: 列出辐射源预设
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: pattern, units

pub mod pattern;
pub mod units;

use crate::diffraction::{DisplayMetric, RadiationKind};
use clap::{Parser, Subcommand, ValueEnum};

/// powdiff - 粉末 X 射线 / 中子衍射图样计算
#[derive(Parser)]
#[command(name = "powdiff")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Powder X-ray and neutron diffraction patterns from crystal structures", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Calculate the diffraction pattern of a structure file or directory
    Pattern(pattern::PatternArgs),

    /// Convert values between diffraction axis units
    Units(units::UnitsArgs),

    /// List the built-in radiation sources
    Sources,
}

// ─────────────────────────────────────────────────────────────
// 共用的取值枚举
// ─────────────────────────────────────────────────────────────

/// 辐射类型
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum RadiationArg {
    /// X-ray diffraction
    #[default]
    Xray,
    /// Neutron diffraction
    Neutron,
}

impl From<RadiationArg> for RadiationKind {
    fn from(arg: RadiationArg) -> Self {
        match arg {
            RadiationArg::Xray => RadiationKind::XRay,
            RadiationArg::Neutron => RadiationKind::Neutron,
        }
    }
}

impl RadiationArg {
    /// 未指定 --source 时使用的预设
    pub fn default_source(self) -> &'static str {
        match self {
            RadiationArg::Xray => "cu-ka1",
            RadiationArg::Neutron => "thermal",
        }
    }
}

/// 坐标轴单位
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum MetricArg {
    /// 2θ in degrees
    #[default]
    #[value(name = "2theta", alias = "tth")]
    TwoTheta,
    /// 2θ in radians
    #[value(name = "2theta-rad")]
    TwoThetaRad,
    /// θ in degrees
    #[value(name = "theta")]
    Theta,
    /// θ in radians
    #[value(name = "theta-rad")]
    ThetaRad,
    /// Scattering vector q in 1/Å
    #[value(name = "q")]
    Q,
    /// Scattering vector q in 1/nm
    #[value(name = "q-nm")]
    QNm,
    /// Interplanar spacing d in Å
    #[value(name = "d")]
    D,
    /// Interplanar spacing d in nm
    #[value(name = "d-nm")]
    DNm,
    /// Photon energy in keV (X-ray only)
    #[value(name = "energy")]
    Energy,
    /// Photon frequency in PHz (X-ray only)
    #[value(name = "frequency")]
    Frequency,
}

impl From<MetricArg> for DisplayMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::TwoTheta => DisplayMetric::TwoThetaDeg,
            MetricArg::TwoThetaRad => DisplayMetric::TwoThetaRad,
            MetricArg::Theta => DisplayMetric::ThetaDeg,
            MetricArg::ThetaRad => DisplayMetric::ThetaRad,
            MetricArg::Q => DisplayMetric::QInvAngstrom,
            MetricArg::QNm => DisplayMetric::QInvNm,
            MetricArg::D => DisplayMetric::DAngstrom,
            MetricArg::DNm => DisplayMetric::DNm,
            MetricArg::Energy => DisplayMetric::EnergyKev,
            MetricArg::Frequency => DisplayMetric::FrequencyPhz,
        }
    }
}
