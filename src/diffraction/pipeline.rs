//! # 衍射计算流程
//!
//! 串联各组件：每个波长分量生成衍射峰 → 合成曲线并标度 → 换算显示单位 → 标注最强峰。
//!
//! 计算无隐藏状态：`DiffractionRequest` 输入，`DiffractionResult` 输出。
//!
//! ## 依赖关系
//! - 被 `commands/pattern.rs` 调用
//! - 使用 `diffraction/` 下的全部计算组件

use crate::diffraction::annotate::{format_hkl_group, select_top_peaks, MAX_ANNOTATIONS};
use crate::diffraction::radiation::{Anode, LineLabel, LineSet, RadiationSource, SourcePreset};
use crate::diffraction::reflections::{validate_angle_range, HklFamily, ReflectionGenerator};
use crate::diffraction::synthesis::{
    synthesize, IntensityScale, Pattern, Representation, SynthesisOptions, DEFAULT_SIGMA,
    GRID_POINTS, WORKING_RANGE,
};
use crate::diffraction::units::{to_metric, to_metric_all, ConversionContext, DisplayMetric};
use crate::error::{PowdiffError, Result};
use crate::models::Structure;

/// 默认显示范围 2θ（度）
pub const DISPLAY_RANGE: (f64, f64) = (5.0, 165.0);
/// 默认标注数量
pub const DEFAULT_ANNOTATIONS: usize = 5;

/// 衍射计算请求
#[derive(Debug, Clone)]
pub struct DiffractionRequest {
    pub source: RadiationSource,
    pub representation: Representation,
    /// Gaussian σ（度）
    pub sigma: f64,
    pub metric: DisplayMetric,
    /// 显示范围 2θ（度）
    pub display_range: (f64, f64),
    /// 计算范围 2θ（度）
    pub working_range: (f64, f64),
    pub scale: IntensityScale,
    /// 标注的最强峰数量
    pub annotate: usize,
}

impl Default for DiffractionRequest {
    fn default() -> Self {
        Self {
            source: SourcePreset::XRay(Anode::Cu, LineSet::KAlpha1).resolve(),
            representation: Representation::Delta,
            sigma: DEFAULT_SIGMA,
            metric: DisplayMetric::TwoThetaDeg,
            display_range: DISPLAY_RANGE,
            working_range: WORKING_RANGE,
            scale: IntensityScale::Normalized,
            annotate: DEFAULT_ANNOTATIONS,
        }
    }
}

impl DiffractionRequest {
    pub fn validate(&self) -> Result<()> {
        self.source.validate()?;
        self.metric.ensure_available(self.source.kind)?;
        validate_angle_range(self.display_range)?;
        validate_angle_range(self.working_range)?;
        if self.annotate > MAX_ANNOTATIONS {
            return Err(PowdiffError::InvalidParameter(format!(
                "at most {} peaks can be annotated, got {}",
                MAX_ANNOTATIONS, self.annotate
            )));
        }
        Ok(())
    }

    /// 坐标换算上下文（使用名义波长）
    pub fn conversion_context(&self) -> ConversionContext {
        ConversionContext::new(self.source.nominal_wavelength_nm, self.source.kind)
    }

    fn synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            representation: self.representation,
            sigma: self.sigma,
            working_range: self.working_range,
            scale: self.scale,
            grid_points: GRID_POINTS,
        }
    }
}

/// 峰表中的一行
#[derive(Debug, Clone)]
pub struct PeakRow {
    /// 显示单位下的位置
    pub value: f64,
    /// 2θ（度）
    pub two_theta: f64,
    /// d 间距（Å）
    pub d_spacing: f64,
    /// 显示强度
    pub intensity: f64,
    /// 格式化后的指数
    pub hkl: String,
    pub families: Vec<HklFamily>,
    pub component: LineLabel,
    /// 是否属于最强峰
    pub annotated: bool,
}

/// 单个结构的计算结果
#[derive(Debug, Clone)]
pub struct DiffractionResult {
    pub structure_name: String,
    pub formula: String,
    pub source_name: String,
    pub metric: DisplayMetric,
    pub scale: IntensityScale,
    pub representation: Representation,
    /// 完整计算范围内的图样
    pub pattern: Pattern,
    /// 显示范围内的曲线（显示单位）
    pub curve_x: Vec<f64>,
    pub curve_y: Vec<f64>,
    /// 显示范围内的衍射峰
    pub peaks: Vec<PeakRow>,
}

impl DiffractionResult {
    /// 被标注的峰，按强度降序
    pub fn top_peaks(&self) -> Vec<&PeakRow> {
        let mut rows: Vec<&PeakRow> = self.peaks.iter().filter(|p| p.annotated).collect();
        rows.sort_by(|a, b| b.intensity.total_cmp(&a.intensity));
        rows
    }
}

/// 计算单个结构的衍射图样
///
/// 最强峰在整个计算范围内排序后才截取到显示范围，显示范围外的强峰同样占用标注名额。
/// 结构按输入晶胞计算，不转换为惯用胞：峰位与晶胞选取无关，Miller 指数则对应输入晶胞。
pub fn compute(structure: &Structure, request: &DiffractionRequest) -> Result<DiffractionResult> {
    request.validate()?;
    let kind = request.source.kind;

    let mut reflection_sets = Vec::with_capacity(request.source.components.len());
    for component in &request.source.components {
        let reflections = ReflectionGenerator::new(kind, component.wavelength_nm)
            .generate(structure, request.working_range)?;
        reflection_sets.push(
            reflections
                .into_iter()
                .map(|r| r.scaled(component.factor, component.label))
                .collect::<Vec<_>>(),
        );
    }

    let pattern = synthesize(reflection_sets, &request.synthesis_options())?;
    let annotated = select_top_peaks(&pattern.reflections, &pattern.peak_intensities, request.annotate);

    let ctx = request.conversion_context();
    let (lo, hi) = request.display_range;
    let peaks: Vec<PeakRow> = pattern
        .reflections
        .iter()
        .zip(pattern.peak_intensities.iter())
        .enumerate()
        .filter(|(_, (r, _))| r.two_theta >= lo && r.two_theta <= hi)
        .map(|(i, (r, &intensity))| PeakRow {
            value: to_metric(r.two_theta, request.metric, &ctx),
            two_theta: r.two_theta,
            d_spacing: r.d_spacing,
            intensity,
            hkl: format_hkl_group(&r.families),
            families: r.families.clone(),
            component: r.label,
            annotated: annotated.contains(&i),
        })
        .collect();

    let (x, curve_y) = pattern.clipped(request.display_range);
    let curve_x = to_metric_all(&x, request.metric, &ctx);

    Ok(DiffractionResult {
        structure_name: structure.name.clone(),
        formula: structure.formula(),
        source_name: request.source.name.clone(),
        metric: request.metric,
        scale: request.scale,
        representation: request.representation,
        pattern,
        curve_x,
        curve_y,
        peaks,
    })
}
