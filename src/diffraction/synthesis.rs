//! # 衍射图样合成
//!
//! 将各波长分量的衍射峰展宽（或分箱）为连续曲线并叠加。
//!
//! ## 峰形
//! - Delta：峰强度累加到最近的网格点
//! - Gaussian：I / (Σ g · dx) · g(x)，g = exp(-(x - x₀)² / 2σ²)，峰面积等于 I
//!
//! ## 强度标度
//! - Normalized：曲线除以自身最大值 × 100；离散峰除以最大原始强度 × 100
//! - Absolute：保持原值
//!
//! ## 依赖关系
//! - 被 `diffraction/pipeline.rs` 调用
//! - 使用 `diffraction/reflections.rs` 的 Reflection

use crate::diffraction::reflections::{validate_angle_range, Reflection};
use crate::error::{PowdiffError, Result};

use std::fmt;

/// 默认计算网格范围（度）
pub const WORKING_RANGE: (f64, f64) = (0.01, 179.9);
/// 默认网格点数
pub const GRID_POINTS: usize = 20_000;
/// 默认 Gaussian σ（度）
pub const DEFAULT_SIGMA: f64 = 0.5;
/// σ 低于该值时加密网格
const FINE_SIGMA: f64 = 0.1;
/// 每个 σ 内的最少网格点数
const POINTS_PER_SIGMA: f64 = 5.0;
/// 加密后的网格点数上限
pub const MAX_GRID_POINTS: usize = 2_000_000;
/// Gaussian 核截断半宽（σ 的倍数）
const KERNEL_HALF_WIDTH: f64 = 10.0;

/// 峰形表示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Representation {
    #[default]
    Delta,
    Gaussian,
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Representation::Delta => write!(f, "delta"),
            Representation::Gaussian => write!(f, "gaussian"),
        }
    }
}

/// 强度标度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntensityScale {
    #[default]
    Normalized,
    Absolute,
}

impl fmt::Display for IntensityScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntensityScale::Normalized => write!(f, "normalized"),
            IntensityScale::Absolute => write!(f, "absolute"),
        }
    }
}

/// 合成参数
#[derive(Debug, Clone, Copy)]
pub struct SynthesisOptions {
    pub representation: Representation,
    /// Gaussian σ（度）
    pub sigma: f64,
    /// 计算网格范围 2θ（度）
    pub working_range: (f64, f64),
    pub scale: IntensityScale,
    /// 基础网格点数（细 σ 时会自动加密）
    pub grid_points: usize,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            representation: Representation::Delta,
            sigma: DEFAULT_SIGMA,
            working_range: WORKING_RANGE,
            scale: IntensityScale::Normalized,
            grid_points: GRID_POINTS,
        }
    }
}

/// 合成后的衍射图样
#[derive(Debug, Clone)]
pub struct Pattern {
    /// 网格 2θ（度）
    pub two_theta: Vec<f64>,
    /// 网格强度
    pub intensity: Vec<f64>,
    /// 所有分量的衍射峰（已乘分量因子，未标度）
    pub reflections: Vec<Reflection>,
    /// 与 `reflections` 一一对应的显示强度
    pub peak_intensities: Vec<f64>,
}

impl Pattern {
    /// 截取 2θ ∈ [min, max] 的曲线
    pub fn clipped(&self, range: (f64, f64)) -> (Vec<f64>, Vec<f64>) {
        self.two_theta
            .iter()
            .zip(self.intensity.iter())
            .filter(|(&x, _)| x >= range.0 && x <= range.1)
            .map(|(&x, &y)| (x, y))
            .unzip()
    }

    pub fn max_intensity(&self) -> f64 {
        self.intensity.iter().copied().fold(0.0, f64::max)
    }
}

/// 构建等间距网格
///
/// Gaussian 且 σ < 0.1° 时加密，使间距 ≤ σ/5。
/// 所需点数超过 `MAX_GRID_POINTS` 时返回 `InvalidParameter`。
pub fn build_grid(options: &SynthesisOptions) -> Result<Vec<f64>> {
    validate_angle_range(options.working_range)?;
    let (start, end) = options.working_range;

    let mut points = options.grid_points;
    if options.representation == Representation::Gaussian && options.sigma < FINE_SIGMA {
        let needed = ((end - start) / (options.sigma / POINTS_PER_SIGMA)).ceil() + 1.0;
        if !(needed.is_finite() && needed > 0.0 && needed <= MAX_GRID_POINTS as f64) {
            return Err(PowdiffError::InvalidParameter(format!(
                "sigma {}° is too small for the {:.2}°-{:.2}° grid (limit {} points)",
                options.sigma, start, end, MAX_GRID_POINTS
            )));
        }
        points = points.max(needed as usize);
    }
    if points < 2 {
        return Err(PowdiffError::InvalidParameter(format!(
            "grid needs at least 2 points, got {}",
            points
        )));
    }

    let step = (end - start) / (points - 1) as f64;
    Ok((0..points).map(|i| start + i as f64 * step).collect())
}

/// 合成衍射图样
///
/// `reflection_sets` 每个元素对应一个波长分量，强度已乘分量因子。
pub fn synthesize(reflection_sets: Vec<Vec<Reflection>>, options: &SynthesisOptions) -> Result<Pattern> {
    if options.representation == Representation::Gaussian
        && !(options.sigma.is_finite() && options.sigma > 0.0)
    {
        return Err(PowdiffError::InvalidParameter(format!(
            "Gaussian sigma must be positive, got {}",
            options.sigma
        )));
    }

    let grid = build_grid(options)?;
    let mut total = vec![0.0; grid.len()];

    for set in &reflection_sets {
        let component = match options.representation {
            Representation::Delta => delta_curve(&grid, set),
            Representation::Gaussian => gaussian_curve(&grid, set, options.sigma),
        };
        for (t, c) in total.iter_mut().zip(component) {
            *t += c;
        }
    }

    let reflections: Vec<Reflection> = reflection_sets.into_iter().flatten().collect();
    let mut peak_intensities: Vec<f64> = reflections.iter().map(|r| r.intensity).collect();

    if options.scale == IntensityScale::Normalized {
        let curve_max = total.iter().copied().fold(0.0, f64::max);
        if curve_max > 0.0 {
            total.iter_mut().for_each(|y| *y = *y / curve_max * 100.0);
        }
        let peak_max = peak_intensities.iter().copied().fold(0.0, f64::max);
        let norm = if peak_max > 0.0 { peak_max } else { 1.0 };
        peak_intensities.iter_mut().for_each(|y| *y = *y / norm * 100.0);
    }

    Ok(Pattern {
        two_theta: grid,
        intensity: total,
        reflections,
        peak_intensities,
    })
}

/// 网格步长
fn grid_step(grid: &[f64]) -> f64 {
    grid[1] - grid[0]
}

/// 最近网格点的索引
fn nearest_index(grid: &[f64], x: f64) -> usize {
    let idx = ((x - grid[0]) / grid_step(grid)).round();
    idx.clamp(0.0, (grid.len() - 1) as f64) as usize
}

fn delta_curve(grid: &[f64], reflections: &[Reflection]) -> Vec<f64> {
    let mut curve = vec![0.0; grid.len()];
    for r in reflections {
        curve[nearest_index(grid, r.two_theta)] += r.intensity;
    }
    curve
}

fn gaussian_curve(grid: &[f64], reflections: &[Reflection], sigma: f64) -> Vec<f64> {
    let dx = grid_step(grid);
    let last = grid.len() - 1;
    let half = KERNEL_HALF_WIDTH * sigma;
    let two_sigma2 = 2.0 * sigma * sigma;
    let mut curve = vec![0.0; grid.len()];
    let mut kernel = Vec::new();

    for r in reflections {
        let lo = ((r.two_theta - half - grid[0]) / dx).floor().clamp(0.0, last as f64) as usize;
        let hi = ((r.two_theta + half - grid[0]) / dx).ceil().clamp(0.0, last as f64) as usize;

        kernel.clear();
        kernel.extend(grid[lo..=hi].iter().map(|&x| {
            let t = x - r.two_theta;
            (-t * t / two_sigma2).exp()
        }));
        let area: f64 = kernel.iter().sum::<f64>() * dx;
        if area <= 0.0 {
            continue;
        }

        let scale = r.intensity / area;
        for (y, g) in curve[lo..=hi].iter_mut().zip(kernel.iter()) {
            *y += scale * g;
        }
    }
    curve
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diffraction::radiation::LineLabel;

    fn peak(two_theta: f64, intensity: f64) -> Reflection {
        Reflection {
            two_theta,
            d_spacing: 1.0,
            intensity,
            families: Vec::new(),
            label: LineLabel::KAlpha1,
        }
    }

    fn options(representation: Representation, sigma: f64, scale: IntensityScale) -> SynthesisOptions {
        SynthesisOptions {
            representation,
            sigma,
            scale,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_grid() {
        let grid = build_grid(&SynthesisOptions::default()).unwrap();
        assert_eq!(grid.len(), GRID_POINTS);
        assert_eq!(grid[0], 0.01);
        assert!((grid[GRID_POINTS - 1] - 179.9).abs() < 1e-9);
    }

    #[test]
    fn test_fine_sigma_refines_grid() {
        let opts = options(Representation::Gaussian, 0.02, IntensityScale::Absolute);
        let grid = build_grid(&opts).unwrap();
        assert!(grid[1] - grid[0] <= 0.02 / 5.0 + 1e-12);

        // Delta 不加密
        let opts = options(Representation::Delta, 0.02, IntensityScale::Absolute);
        assert_eq!(build_grid(&opts).unwrap().len(), GRID_POINTS);
    }

    #[test]
    fn test_tiny_sigma_is_rejected() {
        for sigma in [1e-9, 1e-4, 0.0, -0.1] {
            let opts = options(Representation::Gaussian, sigma, IntensityScale::Absolute);
            assert!(
                matches!(build_grid(&opts), Err(PowdiffError::InvalidParameter(_))),
                "σ = {}",
                sigma
            );
            assert!(synthesize(vec![vec![peak(40.0, 1.0)]], &opts).is_err());
        }

        // 上限附近仍可构建
        let opts = options(Representation::Gaussian, 0.001, IntensityScale::Absolute);
        let grid = build_grid(&opts).unwrap();
        assert!(grid.len() <= MAX_GRID_POINTS);
    }

    #[test]
    fn test_gaussian_area_preserved() {
        for sigma in [0.05, 0.2, 1.0] {
            let opts = options(Representation::Gaussian, sigma, IntensityScale::Absolute);
            let pattern = synthesize(vec![vec![peak(40.0, 250.0)]], &opts).unwrap();
            let dx = pattern.two_theta[1] - pattern.two_theta[0];
            let area: f64 = pattern.intensity.iter().sum::<f64>() * dx;
            assert!((area - 250.0).abs() / 250.0 < 0.01, "σ = {}: area {}", sigma, area);
        }
    }

    #[test]
    fn test_normalized_max_is_100() {
        let sets = vec![vec![peak(30.0, 10.0), peak(45.0, 40.0)], vec![peak(30.2, 5.0)]];
        for repr in [Representation::Delta, Representation::Gaussian] {
            let opts = options(repr, 0.3, IntensityScale::Normalized);
            let pattern = synthesize(sets.clone(), &opts).unwrap();
            assert!((pattern.max_intensity() - 100.0).abs() < 1e-9);
            assert_eq!(pattern.peak_intensities, vec![25.0, 100.0, 12.5]);
        }
    }

    #[test]
    fn test_absolute_is_untouched() {
        let opts = options(Representation::Delta, 0.5, IntensityScale::Absolute);
        let pattern = synthesize(vec![vec![peak(30.0, 7.0), peak(60.0, 3.0)]], &opts).unwrap();
        assert_eq!(pattern.peak_intensities, vec![7.0, 3.0]);
        assert_eq!(pattern.max_intensity(), 7.0);
        assert!((pattern.intensity.iter().sum::<f64>() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_delta_matches_gaussian_centre() {
        let sets = vec![vec![peak(33.333, 1.0)]];
        let delta = synthesize(sets.clone(), &options(Representation::Delta, 0.2, IntensityScale::Absolute)).unwrap();
        let gauss =
            synthesize(sets, &options(Representation::Gaussian, 0.2, IntensityScale::Absolute)).unwrap();
        let argmax = |v: &[f64]| {
            v.iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap()
        };
        assert_eq!(argmax(&delta.intensity), argmax(&gauss.intensity));
    }

    #[test]
    fn test_components_are_summed() {
        let opts = options(Representation::Delta, 0.5, IntensityScale::Absolute);
        let pattern = synthesize(vec![vec![peak(50.0, 2.0)], vec![peak(50.0, 1.0)]], &opts).unwrap();
        assert_eq!(pattern.max_intensity(), 3.0);
        assert_eq!(pattern.reflections.len(), 2);
    }

    #[test]
    fn test_clipped() {
        let opts = options(Representation::Delta, 0.5, IntensityScale::Absolute);
        let pattern = synthesize(vec![vec![peak(50.0, 2.0)]], &opts).unwrap();
        let (x, y) = pattern.clipped((5.0, 165.0));
        assert_eq!(x.len(), y.len());
        assert!(x.iter().all(|&v| (5.0..=165.0).contains(&v)));
        assert_eq!(y.iter().copied().fold(0.0, f64::max), 2.0);
    }

    #[test]
    fn test_invalid_parameters() {
        let opts = options(Representation::Gaussian, 0.0, IntensityScale::Normalized);
        assert!(matches!(
            synthesize(Vec::new(), &opts),
            Err(PowdiffError::InvalidParameter(_))
        ));

        // Delta 忽略 σ
        let opts = options(Representation::Delta, 0.0, IntensityScale::Normalized);
        assert!(synthesize(Vec::new(), &opts).is_ok());

        let opts = SynthesisOptions {
            grid_points: 1,
            ..Default::default()
        };
        assert!(synthesize(Vec::new(), &opts).is_err());

        let opts = SynthesisOptions {
            working_range: (100.0, 10.0),
            ..Default::default()
        };
        assert!(synthesize(Vec::new(), &opts).is_err());
    }
}
