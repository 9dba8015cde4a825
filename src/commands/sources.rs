//! # sources 子命令实现
//!
//! 列出内置辐射源预设及其谱线。
//!
//! ## 依赖关系
//! - 使用 `diffraction/radiation.rs`

use crate::diffraction::SourcePreset;
use crate::error::Result;
use crate::utils::output;

use tabled::{Table, Tabled};

#[derive(Tabled)]
struct SourceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Radiation")]
    kind: String,
    #[tabled(rename = "λ (nm)")]
    nominal: String,
    #[tabled(rename = "Lines (λ nm × factor)")]
    lines: String,
}

fn source_rows() -> Vec<SourceRow> {
    SourcePreset::all()
        .into_iter()
        .map(|preset| {
            let source = preset.resolve();
            let lines = source
                .components
                .iter()
                .map(|c| format!("{} {:.5} ×{:.3}", c.label, c.wavelength_nm, c.factor))
                .collect::<Vec<_>>()
                .join(", ");
            SourceRow {
                name: preset.to_string(),
                kind: source.kind.to_string(),
                nominal: format!("{:.5}", source.nominal_wavelength_nm),
                lines,
            }
        })
        .collect()
}

/// 执行 sources 命令
pub fn execute() -> Result<()> {
    output::print_header("Radiation Sources");
    println!("{}", Table::new(source_rows()));
    output::print_info("Select one with --source <NAME> or the POWDIFF_SOURCE environment variable");
    Ok(())
}
