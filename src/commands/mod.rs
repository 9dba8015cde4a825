//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `diffraction/`, `batch/`, `utils/`
//! - 子模块: pattern, units, sources

pub mod pattern;
pub mod sources;
pub mod units;

use crate::cli::{Commands, RadiationArg};
use crate::diffraction::{RadiationKind, RadiationSource, SourcePreset};
use crate::error::{PowdiffError, Result};

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Pattern(args) => pattern::execute(args),
        Commands::Units(args) => units::execute(args),
        Commands::Sources => sources::execute(),
    }
}

/// 由 --radiation / --source / --wavelength 确定辐射源
///
/// 自定义波长只能替换单谱线预设。
pub(crate) fn resolve_source(
    radiation: Option<RadiationArg>,
    source: Option<&str>,
    wavelength_nm: Option<f64>,
) -> Result<RadiationSource> {
    let preset: SourcePreset = match source {
        Some(name) => name.parse()?,
        None => radiation.unwrap_or_default().default_source().parse()?,
    };

    if let Some(r) = radiation {
        let kind = RadiationKind::from(r);
        if kind != preset.kind() {
            return Err(PowdiffError::InvalidParameter(format!(
                "source '{}' is not a {} source",
                preset, kind
            )));
        }
    }

    match wavelength_nm {
        Some(wl) => {
            let resolved = preset.resolve();
            if resolved.is_multi_component() {
                return Err(PowdiffError::InvalidParameter(format!(
                    "--wavelength cannot replace the multi-line source '{}'",
                    preset
                )));
            }
            RadiationSource::custom(preset.kind(), wl)
        }
        None => Ok(preset.resolve()),
    }
}
