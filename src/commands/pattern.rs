//! # pattern 子命令实现
//!
//! 从结构文件计算粉末衍射图样。
//!
//! ## 功能
//! - 支持单文件和批量目录处理
//! - 并行计算（rayon）
//! - 导出文本 / CSV / XY，绘制 PNG / SVG
//! - 多结构合并峰表、实验图谱叠加
//!
//! ## 依赖关系
//! - 使用 `cli/pattern.rs` 定义的 PatternArgs
//! - 使用 `batch/` 模块进行批量处理
//! - 使用 `diffraction/` 模块进行计算与导出
//! - 使用 `parsers/` 读取结构

use super::resolve_source;
use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::pattern::{OutputFormat, PatternArgs};
use crate::diffraction::export;
use crate::diffraction::overlay::ExperimentalPattern;
use crate::diffraction::pipeline::DISPLAY_RANGE;
use crate::diffraction::plot::{self, Overlay, PlotOptions};
use crate::diffraction::units::{range_from_two_theta, range_to_two_theta};
use crate::diffraction::{
    compute, ConversionContext, DiffractionRequest, DiffractionResult, DisplayMetric,
    Representation,
};
use crate::error::{PowdiffError, Result};
use crate::parsers;
use crate::utils::{output, progress};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// 批量模式默认输出目录
const DEFAULT_BATCH_DIR: &str = "patterns";

/// 执行 pattern 命令
pub fn execute(args: PatternArgs) -> Result<()> {
    output::print_header("Powder Diffraction Pattern Calculation");

    let request = build_request(&args)?;
    print_request(&request);

    let experimental = match &args.experimental {
        Some(path) => {
            let pattern = ExperimentalPattern::read(path)?;
            output::print_info(&format!(
                "Experimental pattern: '{}' ({} points)",
                pattern.name,
                pattern.len()
            ));
            Some(pattern)
        }
        None => None,
    };

    if args.input.is_file() {
        let format = args
            .format
            .or_else(|| args.output.as_deref().and_then(OutputFormat::from_path))
            .unwrap_or(OutputFormat::Png);
        let settings = OutputSettings::new(&args, &request, format, experimental.as_ref());
        execute_single_file(&args, &request, &settings)
    } else if args.input.is_dir() {
        let format = args.format.unwrap_or(OutputFormat::Png);
        let settings = OutputSettings::new(&args, &request, format, experimental.as_ref());
        execute_batch(&args, &request, &settings)
    } else {
        Err(PowdiffError::FileNotFound {
            path: args.input.display().to_string(),
        })
    }
}

/// 由命令行参数构造计算请求
fn build_request(args: &PatternArgs) -> Result<DiffractionRequest> {
    let source = resolve_source(args.radiation, args.source.as_deref(), args.wavelength)?;
    let metric = DisplayMetric::from(args.metric);
    metric.ensure_available(source.kind)?;

    let ctx = ConversionContext::new(source.nominal_wavelength_nm, source.kind);
    let display_range = match &args.range {
        Some(range) => range_to_two_theta(parse_range(range)?, metric, &ctx),
        None => DISPLAY_RANGE,
    };

    let request = DiffractionRequest {
        source,
        representation: args.representation.into(),
        sigma: args.sigma,
        metric,
        display_range,
        scale: args.scale.into(),
        annotate: args.annotate as usize,
        ..Default::default()
    };
    request.validate()?;
    Ok(request)
}

/// 解析 "min-max" 格式的范围（显示单位）
fn parse_range(range: &str) -> Result<(f64, f64)> {
    let parts: Vec<&str> = range.split('-').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(PowdiffError::InvalidRange(range.to_string()));
    }

    let min: f64 = parts[0]
        .parse()
        .map_err(|_| PowdiffError::InvalidRange(range.to_string()))?;
    let max: f64 = parts[1]
        .parse()
        .map_err(|_| PowdiffError::InvalidRange(range.to_string()))?;

    if !min.is_finite() || !max.is_finite() || min == max {
        return Err(PowdiffError::InvalidRange(format!(
            "{} (bounds must be distinct numbers)",
            range
        )));
    }

    Ok((min, max))
}

fn print_request(request: &DiffractionRequest) {
    let source = &request.source;
    let lines: Vec<String> = source
        .components
        .iter()
        .map(|c| format!("{} {:.5} nm ×{:.3}", c.label, c.wavelength_nm, c.factor))
        .collect();
    output::print_info(&format!(
        "Source: {} ({}): {}",
        source.name,
        source.kind,
        lines.join(", ")
    ));

    let ctx = request.conversion_context();
    let (left, right) = range_from_two_theta(request.display_range, request.metric, &ctx);
    output::print_info(&format!(
        "Axis: {}, range {:.4} to {:.4} (2θ {:.2}°-{:.2}°)",
        request.metric.label(),
        left,
        right,
        request.display_range.0,
        request.display_range.1
    ));

    let representation = match request.representation {
        Representation::Delta => request.representation.to_string(),
        Representation::Gaussian => format!("{} (σ = {}°)", request.representation, request.sigma),
    };
    output::print_info(&format!(
        "Representation: {}, scale: {}, annotated peaks: {}",
        representation, request.scale, request.annotate
    ));
}

/// 输出相关配置（单文件与批量共用）
struct OutputSettings {
    format: OutputFormat,
    plot: PlotOptions,
    /// 换算到显示单位的实验图谱
    overlay: Option<(String, Vec<(f64, f64)>)>,
}

impl OutputSettings {
    fn new(
        args: &PatternArgs,
        request: &DiffractionRequest,
        format: OutputFormat,
        experimental: Option<&ExperimentalPattern>,
    ) -> Self {
        let ctx = request.conversion_context();
        let overlay = experimental
            .map(|exp| exp.prepared(request.scale, request.display_range))
            .filter(|prepared| {
                if prepared.is_empty() {
                    output::print_warning("No experimental points inside the display range");
                }
                !prepared.is_empty()
            })
            .map(|prepared| (prepared.name.clone(), prepared.points(request.metric, &ctx)));

        Self {
            format,
            plot: PlotOptions {
                title: args.title.clone().unwrap_or_default(),
                width: args.width,
                height: args.height,
                svg: format == OutputFormat::Svg,
                label_peaks: request.annotate > 0,
            },
            overlay,
        }
    }

    /// 写出单个结果，返回写出的文件
    fn write(&self, result: &DiffractionResult, path: &Path) -> Result<Vec<PathBuf>> {
        let mut written = vec![path.to_path_buf()];
        match self.format {
            OutputFormat::Txt => export::to_text(result, path)?,
            OutputFormat::Csv => {
                export::peaks_to_csv(result, path)?;
                if result.representation == Representation::Gaussian {
                    let curve_path = sibling_path(path, "_curve.csv");
                    export::curve_to_csv(result, &curve_path)?;
                    written.push(curve_path);
                }
            }
            OutputFormat::Xy => export::to_xy(result, path)?,
            OutputFormat::Png | OutputFormat::Svg => {
                let overlay = self.overlay.as_ref().map(|(name, points)| Overlay {
                    name: name.as_str(),
                    points: points.as_slice(),
                });
                plot::generate_plot(result, overlay, path, &self.plot)?;
            }
        }
        Ok(written)
    }
}

/// 同目录下替换扩展名与后缀的路径，如 `a.csv` → `a_curve.csv`
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("pattern");
    path.with_file_name(format!("{}{}", stem, suffix))
}

/// 输出文件名：`<name>_pattern.<ext>`
fn output_file_name(name: &str, format: OutputFormat) -> String {
    let base = name.rsplit_once('.').map(|(b, _)| b).unwrap_or(name);
    format!("{}_pattern.{}", base.replace(['/', '\\'], "_"), format.extension())
}

/// 单文件模式
fn execute_single_file(
    args: &PatternArgs,
    request: &DiffractionRequest,
    settings: &OutputSettings,
) -> Result<()> {
    output::print_info(&format!("Single file mode: '{}'", args.input.display()));

    let structure = parsers::read_structure(&args.input)?;
    let disordered = structure.sites.iter().filter(|s| !s.is_ordered()).count();
    output::print_success(&format!(
        "Loaded structure: {} ({}, {} sites, {} partially occupied)",
        structure.name,
        structure.formula(),
        structure.num_sites(),
        disordered
    ));

    let spinner = progress::create_spinner("Computing pattern");
    let result = compute(&structure, request);
    spinner.finish_and_clear();
    let result = result?;

    output::print_success(&format!(
        "Calculated {} diffraction peaks in the display range (max intensity {:.4})",
        result.peaks.len(),
        result.pattern.max_intensity()
    ));

    let file_name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| structure.name.clone());
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(output_file_name(&file_name, settings.format)));

    for path in settings.write(&result, &output_path)? {
        output::print_written(&settings.format.to_string(), &path.display().to_string());
    }

    output::print_top_peaks(&result);

    if let Some(combined) = &args.combined {
        let mut results = BTreeMap::new();
        results.insert(file_name, result);
        export::combined_to_csv(&results, request.metric, combined)?;
        output::print_written("combined", &combined.display().to_string());
    }

    Ok(())
}

/// 批量处理任务
struct BatchJob<'a> {
    root: PathBuf,
    output_dir: PathBuf,
    request: &'a DiffractionRequest,
    settings: &'a OutputSettings,
    overwrite: bool,
    keep_results: bool,
}

/// 批量处理模式
fn execute_batch(
    args: &PatternArgs,
    request: &DiffractionRequest,
    settings: &OutputSettings,
) -> Result<()> {
    output::print_info(&format!("Batch mode: directory '{}'", args.input.display()));

    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive)
        .collect();

    if files.is_empty() {
        return Err(PowdiffError::NoFilesFound {
            pattern: args.pattern.clone(),
        });
    }

    output::print_info(&format!("Found {} structure files", files.len()));

    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BATCH_DIR));
    fs::create_dir_all(&output_dir).map_err(|e| PowdiffError::FileWriteError {
        path: output_dir.display().to_string(),
        source: e,
    })?;
    output::print_info(&format!(
        "Output: {} files in '{}'",
        settings.format,
        output_dir.display()
    ));

    let job = BatchJob {
        root: args.input.clone(),
        output_dir,
        request,
        settings,
        overwrite: args.overwrite,
        keep_results: args.combined.is_some(),
    };

    let runner = BatchRunner::new(args.jobs);
    output::print_info(&format!("Using {} parallel jobs", runner.jobs()));
    let result = runner.run(files, |file| process_batch_file(file, &job))?;

    output::print_batch_summary(&result);

    if let Some(combined) = &args.combined {
        if result.skipped > 0 {
            output::print_skip(&format!(
                "{} skipped structures are not in the combined table (use --overwrite)",
                result.skipped
            ));
        }
        let results: BTreeMap<String, DiffractionResult> = result
            .outputs
            .into_iter()
            .filter_map(|(key, value)| value.map(|r| (key, r)))
            .collect();
        export::combined_to_csv(&results, request.metric, combined)?;
        output::print_written("combined", &combined.display().to_string());
    }

    Ok(())
}

/// 处理批量模式中的单个文件
fn process_batch_file(input: &Path, job: &BatchJob<'_>) -> ProcessResult<Option<DiffractionResult>> {
    let key = input
        .strip_prefix(&job.root)
        .unwrap_or(input)
        .display()
        .to_string();
    let output_file = job
        .output_dir
        .join(output_file_name(&key, job.settings.format));

    if output_file.exists() && !job.overwrite {
        return ProcessResult::Skipped(format!(
            "Output exists, skipping: {}",
            output_file.display()
        ));
    }

    let outcome = parsers::read_structure(input)
        .and_then(|structure| compute(&structure, job.request))
        .and_then(|result| {
            job.settings.write(&result, &output_file)?;
            Ok(result)
        });

    match outcome {
        Ok(result) => ProcessResult::Success(key, job.keep_results.then_some(result)),
        Err(e) => ProcessResult::Failed(input.display().to_string(), e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn pattern_args(argv: &[&str]) -> PatternArgs {
        let mut full = vec!["powdiff", "pattern"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Pattern(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("10-90").unwrap(), (10.0, 90.0));
        assert_eq!(parse_range(" 2.5 - 0.8 ").unwrap(), (2.5, 0.8));
        assert!(parse_range("10").is_err());
        assert!(parse_range("a-b").is_err());
        assert!(parse_range("5-5").is_err());
    }

    #[test]
    fn test_build_request_defaults() {
        let request = build_request(&pattern_args(&["NaCl.vasp"])).unwrap();
        assert_eq!(request.display_range, DISPLAY_RANGE);
        assert_eq!(request.metric, DisplayMetric::TwoThetaDeg);
        assert_eq!(request.representation, Representation::Delta);
        assert_eq!(request.annotate, 5);
        assert_eq!(request.source.name, "cu-ka1");
    }

    #[test]
    fn test_build_request_d_range_is_swapped() {
        let args = pattern_args(&["NaCl.vasp", "--metric", "d", "--range", "1-3"]);
        let request = build_request(&args).unwrap();
        let (lo, hi) = request.display_range;
        assert!(lo < hi);
        // d = 3 Å ↔ 2θ ≈ 29.76°，d = 1 Å ↔ 2θ ≈ 100.8°
        assert!((lo - 29.76).abs() < 0.01, "{}", lo);
        assert!((hi - 100.8).abs() < 0.1, "{}", hi);
    }

    #[test]
    fn test_build_request_rejects_neutron_energy() {
        let args = pattern_args(&["x.vasp", "--source", "thermal", "--metric", "energy"]);
        assert!(matches!(
            build_request(&args),
            Err(PowdiffError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_annotate_limit() {
        let mut full = vec!["powdiff", "pattern", "x.vasp", "--annotate", "31"];
        assert!(Cli::try_parse_from(full.clone()).is_err());
        full[4] = "30";
        assert!(Cli::try_parse_from(full).is_ok());
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("NaCl.vasp", OutputFormat::Png), "NaCl_pattern.png");
        assert_eq!(output_file_name("POSCAR", OutputFormat::Csv), "POSCAR_pattern.csv");
        assert_eq!(output_file_name("sub/POSCAR", OutputFormat::Xy), "sub_POSCAR_pattern.xy");
        assert_eq!(
            sibling_path(Path::new("out/a.csv"), "_curve.csv"),
            PathBuf::from("out/a_curve.csv")
        );
    }

    #[test]
    fn test_batch_end_to_end() {
        let dir = std::env::temp_dir().join(format!("powdiff_batch_{}", std::process::id()));
        let out = dir.join("out");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("Cu.vasp"),
            "Cu\n3.615\n1 0 0\n0 1 0\n0 0 1\nCu\n4\nDirect\n0 0 0\n0.5 0.5 0\n0.5 0 0.5\n0 0.5 0.5\n",
        )
        .unwrap();
        fs::write(
            dir.join("Fe.cell"),
            "%BLOCK LATTICE_CART\n2.87 0 0\n0 2.87 0\n0 0 2.87\n%ENDBLOCK LATTICE_CART\n\
             %BLOCK POSITIONS_FRAC\nFe 0 0 0\nFe 0.5 0.5 0.5\n%ENDBLOCK POSITIONS_FRAC\n",
        )
        .unwrap();
        fs::write(dir.join("broken.vasp"), "not a poscar\n").unwrap();

        let combined = dir.join("combined.csv");
        let args = pattern_args(&[
            dir.to_str().unwrap(),
            "--format",
            "csv",
            "--output",
            out.to_str().unwrap(),
            "--combined",
            combined.to_str().unwrap(),
            "--jobs",
            "2",
        ]);
        execute(args).unwrap();

        assert!(out.join("Cu_pattern.csv").exists());
        assert!(out.join("Fe_pattern.csv").exists());
        assert!(!out.join("broken_pattern.csv").exists());

        let content = fs::read_to_string(&combined).unwrap();
        assert!(content.lines().any(|l| l.ends_with(",Cu.vasp")));
        assert!(content.lines().any(|l| l.ends_with(",Fe.cell")));

        fs::remove_dir_all(&dir).ok();
    }
}
