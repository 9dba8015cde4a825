//! # 坐标轴单位换算
//!
//! 2θ（度）与十种显示单位之间的双向换算。
//!
//! ## 公式
//! - q = 4π sin(θ) / λ
//! - d = λ / (2 sin(θ))，sin(θ) = 0 时为 +∞
//! - X 射线能量 E = 24.796 sin(θ) / λ[Å]（keV）
//! - 中子能量 E = 0.003956 / λ[nm]²，与角度无关
//! - 频率 f = E_xray · 2.418e17 / 1e15（PHz）
//!
//! 反向换算在 asin 之前将 sin(θ) 截断到 [0, 1]。
//!
//! ## 依赖关系
//! - 被 `diffraction/pipeline.rs`、`commands/` 使用
//! - 无外部模块依赖

use crate::diffraction::radiation::RadiationKind;
use crate::error::{PowdiffError, Result};

use std::f64::consts::PI;
use std::fmt;

/// X 射线能量常数 2hc（keV·Å）
const XRAY_ENERGY_CONST: f64 = 24.796;
/// 中子能量常数（nm²）
const NEUTRON_ENERGY_CONST: f64 = 0.003956;
/// keV → Hz
const KEV_TO_HZ: f64 = 2.418e17;

/// 换算所需的上下文
#[derive(Debug, Clone, Copy)]
pub struct ConversionContext {
    /// 波长（nm）
    pub wavelength_nm: f64,
    pub kind: RadiationKind,
}

impl ConversionContext {
    pub fn new(wavelength_nm: f64, kind: RadiationKind) -> Self {
        Self {
            wavelength_nm,
            kind,
        }
    }

    fn wavelength_angstrom(&self) -> f64 {
        self.wavelength_nm * 10.0
    }
}

type Conversion = fn(f64, &ConversionContext) -> f64;

/// 显示单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayMetric {
    TwoThetaDeg,
    TwoThetaRad,
    ThetaDeg,
    ThetaRad,
    QInvAngstrom,
    QInvNm,
    DAngstrom,
    DNm,
    EnergyKev,
    FrequencyPhz,
}

impl DisplayMetric {
    pub const ALL: [DisplayMetric; 10] = [
        DisplayMetric::TwoThetaDeg,
        DisplayMetric::TwoThetaRad,
        DisplayMetric::ThetaDeg,
        DisplayMetric::ThetaRad,
        DisplayMetric::QInvAngstrom,
        DisplayMetric::QInvNm,
        DisplayMetric::DAngstrom,
        DisplayMetric::DNm,
        DisplayMetric::EnergyKev,
        DisplayMetric::FrequencyPhz,
    ];

    /// 坐标轴标签
    pub fn label(self) -> &'static str {
        match self {
            DisplayMetric::TwoThetaDeg => "2θ (°)",
            DisplayMetric::TwoThetaRad => "2θ (rad)",
            DisplayMetric::ThetaDeg => "θ (°)",
            DisplayMetric::ThetaRad => "θ (rad)",
            DisplayMetric::QInvAngstrom => "q (1/Å)",
            DisplayMetric::QInvNm => "q (1/nm)",
            DisplayMetric::DAngstrom => "d (Å)",
            DisplayMetric::DNm => "d (nm)",
            DisplayMetric::EnergyKev => "energy (keV)",
            DisplayMetric::FrequencyPhz => "frequency (PHz)",
        }
    }

    /// 命令行名称
    pub fn name(self) -> &'static str {
        match self {
            DisplayMetric::TwoThetaDeg => "2theta",
            DisplayMetric::TwoThetaRad => "2theta-rad",
            DisplayMetric::ThetaDeg => "theta",
            DisplayMetric::ThetaRad => "theta-rad",
            DisplayMetric::QInvAngstrom => "q",
            DisplayMetric::QInvNm => "q-nm",
            DisplayMetric::DAngstrom => "d",
            DisplayMetric::DNm => "d-nm",
            DisplayMetric::EnergyKev => "energy",
            DisplayMetric::FrequencyPhz => "frequency",
        }
    }

    /// 换算公式说明
    pub fn formula(self) -> &'static str {
        match self {
            DisplayMetric::TwoThetaDeg => "identity: 2θ in degrees",
            DisplayMetric::TwoThetaRad => "radians = degrees · π/180",
            DisplayMetric::ThetaDeg => "θ = 2θ / 2",
            DisplayMetric::ThetaRad => "θ = (2θ / 2) · π/180",
            DisplayMetric::QInvAngstrom => "q = 4π sin(θ) / λ, λ in Å",
            DisplayMetric::QInvNm => "q = 4π sin(θ) / λ, λ in nm",
            DisplayMetric::DAngstrom => "d = λ / (2 sin(θ)), λ in Å",
            DisplayMetric::DNm => "d = λ / (2 sin(θ)), λ in nm",
            DisplayMetric::EnergyKev => {
                "E = 24.796 sin(θ) / λ, λ in Å (neutron: E = 0.003956 / λ², λ in nm)"
            }
            DisplayMetric::FrequencyPhz => "f = 24.796 sin(θ) / λ · 2.418e17 / 1e15, λ in Å",
        }
    }

    /// d 单位随 2θ 增大而减小，绘图时需要交换坐标轴方向
    pub fn is_inverted(self) -> bool {
        matches!(self, DisplayMetric::DAngstrom | DisplayMetric::DNm)
    }

    /// 该单位是否适用于给定辐射类型（中子不提供能量与频率）
    pub fn available_for(self, kind: RadiationKind) -> bool {
        match kind {
            RadiationKind::XRay => true,
            RadiationKind::Neutron => {
                !matches!(self, DisplayMetric::EnergyKev | DisplayMetric::FrequencyPhz)
            }
        }
    }

    /// 不适用时返回 `InvalidParameter`
    pub fn ensure_available(self, kind: RadiationKind) -> Result<()> {
        if self.available_for(kind) {
            Ok(())
        } else {
            Err(PowdiffError::InvalidParameter(format!(
                "metric '{}' is not available for {} diffraction",
                self.label(),
                kind
            )))
        }
    }

    /// (正向, 反向) 换算函数对
    fn conversions(self) -> (Conversion, Conversion) {
        match self {
            DisplayMetric::TwoThetaDeg => (|a, _| a, |v, _| v),
            DisplayMetric::TwoThetaRad => (|a, _| a.to_radians(), |v, _| v.to_degrees()),
            DisplayMetric::ThetaDeg => (|a, _| a / 2.0, |v, _| 2.0 * v),
            DisplayMetric::ThetaRad => (
                |a, _| (a / 2.0).to_radians(),
                |v, _| 2.0 * v.to_degrees(),
            ),
            DisplayMetric::QInvAngstrom => (
                |a, ctx| 4.0 * PI * sin_theta(a) / ctx.wavelength_angstrom(),
                |v, ctx| two_theta_from_sin(v * ctx.wavelength_angstrom() / (4.0 * PI)),
            ),
            DisplayMetric::QInvNm => (
                |a, ctx| 4.0 * PI * sin_theta(a) / ctx.wavelength_nm,
                |v, ctx| two_theta_from_sin(v * ctx.wavelength_nm / (4.0 * PI)),
            ),
            DisplayMetric::DAngstrom => (
                |a, ctx| d_spacing(ctx.wavelength_angstrom(), a),
                |v, ctx| two_theta_from_sin(ctx.wavelength_angstrom() / (2.0 * v)),
            ),
            DisplayMetric::DNm => (
                |a, ctx| d_spacing(ctx.wavelength_nm, a),
                |v, ctx| two_theta_from_sin(ctx.wavelength_nm / (2.0 * v)),
            ),
            DisplayMetric::EnergyKev => (
                |a, ctx| match ctx.kind {
                    RadiationKind::XRay => xray_energy(a, ctx),
                    RadiationKind::Neutron => NEUTRON_ENERGY_CONST / ctx.wavelength_nm.powi(2),
                },
                |v, ctx| match ctx.kind {
                    RadiationKind::XRay => {
                        two_theta_from_sin(v * ctx.wavelength_angstrom() / XRAY_ENERGY_CONST)
                    }
                    RadiationKind::Neutron => {
                        let lambda = (NEUTRON_ENERGY_CONST / v).sqrt();
                        two_theta_from_sin(lambda / (2.0 * ctx.wavelength_nm))
                    }
                },
            ),
            DisplayMetric::FrequencyPhz => (
                |a, ctx| xray_energy(a, ctx) * KEV_TO_HZ / 1e15,
                |v, ctx| {
                    let energy = v * 1e15 / KEV_TO_HZ;
                    two_theta_from_sin(energy * ctx.wavelength_angstrom() / XRAY_ENERGY_CONST)
                },
            ),
        }
    }
}

impl fmt::Display for DisplayMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn sin_theta(two_theta_deg: f64) -> f64 {
    (two_theta_deg / 2.0).to_radians().sin()
}

/// 截断到 [0, 1] 后反解 2θ（度）
fn two_theta_from_sin(sin_theta: f64) -> f64 {
    2.0 * sin_theta.clamp(0.0, 1.0).asin().to_degrees()
}

fn d_spacing(wavelength: f64, two_theta_deg: f64) -> f64 {
    let s = sin_theta(two_theta_deg);
    if s == 0.0 {
        f64::INFINITY
    } else {
        wavelength / (2.0 * s)
    }
}

fn xray_energy(two_theta_deg: f64, ctx: &ConversionContext) -> f64 {
    XRAY_ENERGY_CONST * sin_theta(two_theta_deg) / ctx.wavelength_angstrom()
}

/// 2θ（度）→ 显示单位
pub fn to_metric(two_theta_deg: f64, metric: DisplayMetric, ctx: &ConversionContext) -> f64 {
    (metric.conversions().0)(two_theta_deg, ctx)
}

/// 显示单位 → 2θ（度）
pub fn from_metric(value: f64, metric: DisplayMetric, ctx: &ConversionContext) -> f64 {
    (metric.conversions().1)(value, ctx)
}

/// 批量换算
pub fn to_metric_all(two_thetas: &[f64], metric: DisplayMetric, ctx: &ConversionContext) -> Vec<f64> {
    let (forward, _) = metric.conversions();
    two_thetas.iter().map(|&a| forward(a, ctx)).collect()
}

/// 将显示单位下的范围换算为升序 2θ 范围
///
/// d 单位的范围会自动交换端点。
pub fn range_to_two_theta(
    range: (f64, f64),
    metric: DisplayMetric,
    ctx: &ConversionContext,
) -> (f64, f64) {
    let a = from_metric(range.0, metric, ctx);
    let b = from_metric(range.1, metric, ctx);
    (a.min(b), a.max(b))
}

/// 将 2θ 范围换算为显示单位下的 (左, 右) 端点
///
/// d 单位下左端为大值。
pub fn range_from_two_theta(
    range: (f64, f64),
    metric: DisplayMetric,
    ctx: &ConversionContext,
) -> (f64, f64) {
    let a = to_metric(range.0, metric, ctx);
    let b = to_metric(range.1, metric, ctx);
    if metric.is_inverted() {
        (a.max(b), a.min(b))
    } else {
        (a.min(b), a.max(b))
    }
}
