//! # 衍射数据导出
//!
//! 导出计算结果到文本表格、CSV 和 XY 格式。
//!
//! ## 支持格式
//! - 文本表格：全部峰、最强峰、连续曲线（固定列宽）
//! - CSV：峰位表、曲线、多结构合并峰表
//! - XY：曲线（Gaussian）或峰位（Delta），`#` 开头的注释头
//!
//! ## 依赖关系
//! - 被 `commands/pattern.rs` 调用
//! - 使用 `diffraction/pipeline.rs` 的 DiffractionResult
//! - 使用 `csv` + `serde` 写入 CSV 文件

use crate::diffraction::pipeline::{DiffractionResult, PeakRow};
use crate::diffraction::synthesis::Representation;
use crate::diffraction::units::DisplayMetric;
use crate::error::{PowdiffError, Result};

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const PEAK_HEADER: &str = "#X-axis    Intensity    hkl\n";
const CURVE_HEADER: &str = "#X-axis    Y-value\n";

fn write_error(path: &Path) -> impl Fn(std::io::Error) -> PowdiffError + '_ {
    move |e| PowdiffError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    }
}

fn peak_lines<'a, I>(rows: I) -> String
where
    I: IntoIterator<Item = &'a PeakRow>,
{
    let mut table = String::from(PEAK_HEADER);
    for row in rows {
        let _ = writeln!(table, "{:<12.3} {:<12.3} {}", row.value, row.intensity, row.hkl);
    }
    table
}

/// 全部衍射峰表
pub fn peak_table(result: &DiffractionResult) -> String {
    peak_lines(result.peaks.iter())
}

/// 最强峰表（仅标注行，保持峰表顺序）
pub fn top_peak_table(result: &DiffractionResult) -> String {
    peak_lines(result.peaks.iter().filter(|p| p.annotated))
}

/// 连续曲线表
pub fn curve_table(result: &DiffractionResult) -> String {
    let mut table = String::from(CURVE_HEADER);
    for (x, y) in result.curve_x.iter().zip(result.curve_y.iter()) {
        let _ = writeln!(table, "{:<12.5} {:<12.5}", x, y);
    }
    table
}

/// 写出文本表格：峰表、最强峰表与曲线表依次写入
pub fn to_text(result: &DiffractionResult, output_path: &Path) -> Result<()> {
    let file = File::create(output_path).map_err(write_error(output_path))?;
    let mut out = BufWriter::new(file);

    let write = |out: &mut BufWriter<File>| -> std::io::Result<()> {
        writeln!(out, "# Structure: {} ({})", result.structure_name, result.formula)?;
        writeln!(out, "# Source: {}", result.source_name)?;
        writeln!(out, "# Metric: {}", result.metric.label())?;
        writeln!(out, "# Scale: {}", result.scale)?;
        writeln!(out, "\n# Peaks")?;
        out.write_all(peak_table(result).as_bytes())?;
        writeln!(out, "\n# Highest intensity peaks")?;
        out.write_all(top_peak_table(result).as_bytes())?;
        writeln!(out, "\n# Continuous curve")?;
        out.write_all(curve_table(result).as_bytes())?;
        out.flush()
    };
    write(&mut out).map_err(write_error(output_path))
}

/// 峰位 CSV 的一行
#[derive(Debug, Serialize)]
struct PeakRecord<'a> {
    value: f64,
    two_theta: f64,
    d_spacing: f64,
    intensity: f64,
    hkl: &'a str,
    multiplicity: String,
    component: String,
    annotated: bool,
}

/// 导出峰位为 CSV
pub fn peaks_to_csv(result: &DiffractionResult, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    for row in &result.peaks {
        let multiplicity: Vec<String> = row.families.iter().map(|f| f.multiplicity.to_string()).collect();
        wtr.serialize(PeakRecord {
            value: row.value,
            two_theta: row.two_theta,
            d_spacing: row.d_spacing,
            intensity: row.intensity,
            hkl: &row.hkl,
            multiplicity: multiplicity.join(";"),
            component: row.component.to_string(),
            annotated: row.annotated,
        })?;
    }

    wtr.flush().map_err(write_error(output_path))
}

/// 导出曲线为 CSV
pub fn curve_to_csv(result: &DiffractionResult, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record([result.metric.label(), "intensity"])?;
    for (x, y) in result.curve_x.iter().zip(result.curve_y.iter()) {
        wtr.write_record(&[format!("{:.5}", x), format!("{:.5}", y)])?;
    }

    wtr.flush().map_err(write_error(output_path))
}

/// 导出为 XY 格式
///
/// Delta 模式写出离散峰位，Gaussian 模式写出曲线。
pub fn to_xy(result: &DiffractionResult, output_path: &Path) -> Result<()> {
    let file = File::create(output_path).map_err(write_error(output_path))?;
    let mut out = BufWriter::new(file);

    let kind = match result.representation {
        Representation::Delta => "peaks",
        Representation::Gaussian => "curve",
    };
    let write = |out: &mut BufWriter<File>| -> std::io::Result<()> {
        writeln!(out, "# Diffraction pattern: {} ({})", result.structure_name, kind)?;
        writeln!(out, "# Source: {}", result.source_name)?;
        writeln!(out, "# Columns: {}, Intensity ({})", result.metric.label(), result.scale)?;
        writeln!(out, "#")?;
        match result.representation {
            Representation::Delta => {
                for p in &result.peaks {
                    writeln!(out, "{:.5}\t{:.5}", p.value, p.intensity)?;
                }
            }
            Representation::Gaussian => {
                for (x, y) in result.curve_x.iter().zip(result.curve_y.iter()) {
                    writeln!(out, "{:.5}\t{:.5}", x, y)?;
                }
            }
        }
        out.flush()
    };
    write(&mut out).map_err(write_error(output_path))
}

/// 多个结构的合并峰表
///
/// 列：显示单位、Intensity、(hkl)、Phase（结构名）。
pub fn combined_to_csv(
    results: &BTreeMap<String, DiffractionResult>,
    metric: DisplayMetric,
    output_path: &Path,
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record([metric.label(), "Intensity", "(hkl)", "Phase"])?;
    for (phase, result) in results {
        for row in &result.peaks {
            wtr.write_record(&[
                format!("{:.5}", row.value),
                format!("{:.5}", row.intensity),
                row.hkl.clone(),
                phase.clone(),
            ])?;
        }
    }

    wtr.flush().map_err(write_error(output_path))
}
