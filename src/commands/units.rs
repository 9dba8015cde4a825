//! # units 子命令实现
//!
//! 在任意两种坐标轴单位之间换算数值（包括中子能量）。
//!
//! ## 依赖关系
//! - 使用 `cli/units.rs` 定义的 UnitsArgs
//! - 使用 `diffraction/units.rs`

use super::resolve_source;
use crate::cli::units::UnitsArgs;
use crate::diffraction::units::{from_metric, to_metric};
use crate::diffraction::{ConversionContext, DisplayMetric};
use crate::error::Result;
use crate::utils::output;

use tabled::{Table, Tabled};

#[derive(Tabled)]
struct ConversionRow {
    #[tabled(rename = "Input")]
    input: String,
    #[tabled(rename = "2θ (°)")]
    two_theta: String,
    #[tabled(rename = "Unit")]
    unit: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// 执行 units 命令
pub fn execute(args: UnitsArgs) -> Result<()> {
    let source = resolve_source(args.radiation, args.source.as_deref(), args.wavelength)?;
    let ctx = ConversionContext::new(source.nominal_wavelength_nm, source.kind);

    let from = DisplayMetric::from(args.from);
    let targets: Vec<DisplayMetric> = match args.to {
        Some(to) => vec![to.into()],
        None => DisplayMetric::ALL.to_vec(),
    };

    output::print_header(&format!(
        "Unit conversion ({} radiation, λ = {:.5} nm)",
        source.kind, source.nominal_wavelength_nm
    ));

    let rows = convert_values(&args.values, from, &targets, &ctx);
    println!("{}", Table::new(&rows));

    if let [target] = targets.as_slice() {
        output::print_info(&format!("{}: {}", from.label(), from.formula()));
        output::print_info(&format!("{}: {}", target.label(), target.formula()));
    }

    Ok(())
}

fn convert_values(
    values: &[f64],
    from: DisplayMetric,
    targets: &[DisplayMetric],
    ctx: &ConversionContext,
) -> Vec<ConversionRow> {
    let mut rows = Vec::with_capacity(values.len() * targets.len());
    for &value in values {
        let two_theta = from_metric(value, from, ctx);
        for &target in targets {
            rows.push(ConversionRow {
                input: format!("{} {}", value, from.label()),
                two_theta: format!("{:.5}", two_theta),
                unit: target.label(),
                value: format!("{:.6}", to_metric(two_theta, target, ctx)),
            });
        }
    }
    rows
}
