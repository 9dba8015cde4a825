//! # 衍射图表生成
//!
//! 使用 `plotters` 库生成衍射图谱。
//!
//! ## 功能
//! - Delta 模式绘制竖线（按波长分量区分颜色），Gaussian 模式绘制连续曲线
//! - 标注最强峰的 hkl
//! - d 单位下坐标轴反向
//! - 可选实验图谱叠加
//! - 支持 PNG 和 SVG 输出
//!
//! ## 依赖关系
//! - 被 `commands/pattern.rs` 调用
//! - 使用 `diffraction/pipeline.rs` 的 DiffractionResult
//! - 使用 `plotters` 渲染图表

use crate::diffraction::pipeline::DiffractionResult;
use crate::diffraction::radiation::LineLabel;
use crate::diffraction::synthesis::{IntensityScale, Representation};
use crate::error::{PowdiffError, Result};

use plotters::prelude::*;
use std::path::Path;

/// 图表参数
#[derive(Debug, Clone)]
pub struct PlotOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub svg: bool,
    /// 是否标注最强峰
    pub label_peaks: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            width: 1200,
            height: 800,
            svg: false,
            label_peaks: true,
        }
    }
}

/// 叠加曲线（已换算到显示单位）
pub struct Overlay<'a> {
    pub name: &'a str,
    pub points: &'a [(f64, f64)],
}

fn plot_error<E: std::fmt::Debug>(e: E) -> PowdiffError {
    PowdiffError::PlotError(format!("{:?}", e))
}

fn component_color(label: LineLabel) -> RGBColor {
    match label {
        LineLabel::KAlpha1 => RGBColor(0, 102, 204),
        LineLabel::KAlpha2 => RGBColor(230, 120, 20),
        LineLabel::KBeta => RGBColor(40, 160, 60),
    }
}

/// 生成衍射图表
pub fn generate_plot(
    result: &DiffractionResult,
    overlay: Option<Overlay<'_>>,
    output_path: &Path,
    options: &PlotOptions,
) -> Result<()> {
    let size = (options.width, options.height);
    if options.svg {
        let root = SVGBackend::new(output_path, size).into_drawing_area();
        draw_chart(&root, result, overlay.as_ref(), options)?;
        root.present().map_err(plot_error)?;
    } else {
        let root = BitMapBackend::new(output_path, size).into_drawing_area();
        draw_chart(&root, result, overlay.as_ref(), options)?;
        root.present().map_err(plot_error)?;
    }
    Ok(())
}

/// 计算 x 轴范围；d 单位下用 -x 绘制以实现反向坐标轴
fn x_bounds(result: &DiffractionResult, overlay: Option<&Overlay<'_>>) -> (f64, f64) {
    let xs = result
        .curve_x
        .iter()
        .chain(result.peaks.iter().map(|p| &p.value))
        .chain(overlay.into_iter().flat_map(|o| o.points.iter().map(|(x, _)| x)))
        .copied()
        .filter(|x| x.is_finite());

    let (min, max) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
        (lo.min(x), hi.max(x))
    });
    if min.is_finite() && max > min {
        (min, max)
    } else {
        (0.0, 1.0)
    }
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    result: &DiffractionResult,
    overlay: Option<&Overlay<'_>>,
    options: &PlotOptions,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_error)?;

    let inverted = result.metric.is_inverted();
    let sign: f64 = if inverted { -1.0 } else { 1.0 };
    let (x_min, x_max) = x_bounds(result, overlay);
    let (x_start, x_end) = if inverted {
        (-x_max, -x_min)
    } else {
        (x_min, x_max)
    };

    let y_top = result
        .curve_y
        .iter()
        .chain(result.peaks.iter().map(|p| &p.intensity))
        .chain(overlay.into_iter().flat_map(|o| o.points.iter().map(|(_, y)| y)))
        .copied()
        .fold(0.0, f64::max);
    let y_top = if y_top > 0.0 { y_top * 1.1 } else { 110.0 };

    let y_desc = match result.scale {
        IntensityScale::Normalized => "Relative Intensity (%)",
        IntensityScale::Absolute => "Intensity (a.u.)",
    };
    let title = if options.title.is_empty() {
        format!("{} ({})", result.structure_name, result.source_name)
    } else {
        options.title.clone()
    };

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_start..x_end, 0.0..y_top)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc(result.metric.label())
        .y_desc(y_desc)
        .x_label_formatter(&|x| format!("{:.2}", x * sign))
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(plot_error)?;

    match result.representation {
        Representation::Gaussian => {
            let color = component_color(LineLabel::KAlpha1);
            chart
                .draw_series(LineSeries::new(
                    result
                        .curve_x
                        .iter()
                        .zip(result.curve_y.iter())
                        .map(|(x, y)| (x * sign, *y)),
                    color.stroke_width(2),
                ))
                .map_err(plot_error)?
                .label("calculated")
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }
        Representation::Delta => {
            for label in [LineLabel::KAlpha1, LineLabel::KAlpha2, LineLabel::KBeta] {
                let color = component_color(label);
                let sticks: Vec<_> = result
                    .peaks
                    .iter()
                    .filter(|p| p.component == label && p.value.is_finite())
                    .map(|p| {
                        PathElement::new(
                            vec![(p.value * sign, 0.0), (p.value * sign, p.intensity)],
                            color.stroke_width(2),
                        )
                    })
                    .collect();
                if sticks.is_empty() {
                    continue;
                }
                chart
                    .draw_series(sticks)
                    .map_err(plot_error)?
                    .label(label.to_string())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }
        }
    }

    if let Some(overlay) = overlay {
        let color = RGBColor(0, 150, 0);
        chart
            .draw_series(LineSeries::new(
                overlay.points.iter().map(|(x, y)| (x * sign, *y)),
                color.stroke_width(1),
            ))
            .map_err(plot_error)?
            .label(overlay.name.to_string())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    if options.label_peaks {
        let offset = y_top * 0.02;
        for peak in result.peaks.iter().filter(|p| p.annotated && p.value.is_finite()) {
            let y = match result.representation {
                Representation::Delta => peak.intensity,
                Representation::Gaussian => nearest_curve_value(result, peak.value).unwrap_or(peak.intensity),
            };
            chart
                .draw_series(std::iter::once(Text::new(
                    peak.hkl.clone(),
                    (peak.value * sign, y + offset),
                    ("sans-serif", 12).into_font().color(&BLACK),
                )))
                .map_err(plot_error)?;
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_error)?;

    Ok(())
}

/// 曲线上离 x 最近的点的强度
fn nearest_curve_value(result: &DiffractionResult, x: f64) -> Option<f64> {
    result
        .curve_x
        .iter()
        .zip(result.curve_y.iter())
        .min_by(|a, b| (a.0 - x).abs().total_cmp(&(b.0 - x).abs()))
        .map(|(_, y)| *y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diffraction::pipeline::{compute, DiffractionRequest};
    use crate::diffraction::units::DisplayMetric;
    use crate::models::{Lattice, Site, Structure};

    fn simple_cubic(metric: DisplayMetric, representation: Representation) -> DiffractionResult {
        let structure = Structure::new("Bi", Lattice::cubic(3.35), vec![Site::new("Bi", [0.0; 3])]);
        let request = DiffractionRequest {
            metric,
            representation,
            ..Default::default()
        };
        compute(&structure, &request).unwrap()
    }

    #[test]
    fn test_x_bounds_cover_peaks() {
        let result = simple_cubic(DisplayMetric::DAngstrom, Representation::Delta);
        let (lo, hi) = x_bounds(&result, None);
        assert!(lo < hi);
        assert!(result.peaks.iter().all(|p| p.value >= lo && p.value <= hi));
    }

    #[test]
    fn test_nearest_curve_value() {
        let result = simple_cubic(DisplayMetric::TwoThetaDeg, Representation::Gaussian);
        let tallest = result
            .peaks
            .iter()
            .max_by(|a, b| a.intensity.total_cmp(&b.intensity))
            .unwrap();
        let y = nearest_curve_value(&result, tallest.value).unwrap();
        assert!(y > 0.0);
    }
}
