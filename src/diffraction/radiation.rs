//! # 辐射源与波长分量
//!
//! 将辐射源预设解析为带权重的波长分量列表。
//!
//! ## 预设
//! - X 射线：Cu/Mo/Cr/Fe/Co/Ag 阳极 × (Kα1 | Kα2 | Kβ | Kα1+Kα2 | Kα1+Kα2+Kβ)
//! - 中子：热中子 / 冷中子 / 热(hot)中子
//!
//! 强度比固定为 I(Kα2) = ½·I(Kα1)，I(Kβ) = ⅑·I(Kα1)。
//! 单独的 Kα2 或 Kβ 预设与中子源一样只有一条谱线，作为主线参与标注。
//! 波长单位统一为 nm（与用户输入一致），计算时再换算为 Å。
//!
//! ## 依赖关系
//! - 被 `diffraction/pipeline.rs`、`cli/` 使用
//! - 无外部模块依赖

use crate::error::{PowdiffError, Result};

use std::fmt;
use std::str::FromStr;

/// Kα2 相对 Kα1 的强度比
pub const KALPHA2_FACTOR: f64 = 0.5;
/// Kβ 相对 Kα1 的强度比
pub const KBETA_FACTOR: f64 = 1.0 / 9.0;

/// 辐射类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadiationKind {
    XRay,
    Neutron,
}

impl fmt::Display for RadiationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RadiationKind::XRay => write!(f, "X-ray"),
            RadiationKind::Neutron => write!(f, "neutron"),
        }
    }
}

/// 特征谱线标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LineLabel {
    KAlpha1,
    KAlpha2,
    KBeta,
}

impl LineLabel {
    /// 是否为主线（指标化只针对主线报告）
    pub fn is_primary(self) -> bool {
        self == LineLabel::KAlpha1
    }
}

impl fmt::Display for LineLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineLabel::KAlpha1 => write!(f, "Kα1"),
            LineLabel::KAlpha2 => write!(f, "Kα2"),
            LineLabel::KBeta => write!(f, "Kβ"),
        }
    }
}

/// 单个波长分量
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavelengthComponent {
    /// 波长（nm）
    pub wavelength_nm: f64,
    /// 相对强度因子
    pub factor: f64,
    pub label: LineLabel,
}

impl WavelengthComponent {
    /// 波长（Å）
    pub fn wavelength_angstrom(&self) -> f64 {
        self.wavelength_nm * 10.0
    }
}

/// X 射线阳极材料
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anode {
    Cu,
    Mo,
    Cr,
    Fe,
    Co,
    Ag,
}

impl Anode {
    pub const ALL: [Anode; 6] = [Anode::Cu, Anode::Mo, Anode::Cr, Anode::Fe, Anode::Co, Anode::Ag];

    /// (Kα1, Kα2, Kβ) 波长，单位 nm
    pub fn lines(self) -> (f64, f64, f64) {
        match self {
            Anode::Cu => (0.15406, 0.15444, 0.13922),
            Anode::Mo => (0.07093, 0.0711, 0.064),
            Anode::Cr => (0.22897, 0.22888, 0.208),
            Anode::Fe => (0.19360, 0.194, 0.176),
            Anode::Co => (0.17889, 0.17927, 0.163),
            Anode::Ag => (0.0561, 0.05634, 0.0496),
        }
    }

    /// 组合谱线的名义波长（用于坐标轴换算），单位 nm
    fn nominal(self, lines: LineSet) -> f64 {
        match (self, lines) {
            (_, LineSet::KAlpha1) => self.lines().0,
            (_, LineSet::KAlpha2) => self.lines().1,
            (_, LineSet::KBeta) => self.lines().2,
            (Anode::Cu, LineSet::KAlpha12) => 0.154,
            (Anode::Mo, LineSet::KAlpha12) => 0.071,
            (Anode::Cr, LineSet::KAlpha12) => 0.229,
            (Anode::Fe, LineSet::KAlpha12) => 0.194,
            (Anode::Co, LineSet::KAlpha12) => 0.179,
            (Anode::Ag, LineSet::KAlpha12) => 0.0561,
            (Anode::Cu, LineSet::KAlpha12Beta) => 0.153339,
            (Anode::Mo, LineSet::KAlpha12Beta) => 0.07059119,
            (Anode::Cr, LineSet::KAlpha12Beta) => 0.22775471,
            (Anode::Fe, LineSet::KAlpha12Beta) => 0.1927295,
            (Anode::Co, LineSet::KAlpha12Beta) => 0.1781100,
            (Anode::Ag, LineSet::KAlpha12Beta) => 0.0557006,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Anode::Cu => "cu",
            Anode::Mo => "mo",
            Anode::Cr => "cr",
            Anode::Fe => "fe",
            Anode::Co => "co",
            Anode::Ag => "ag",
        }
    }
}

/// 谱线组合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSet {
    KAlpha1,
    KAlpha2,
    KBeta,
    KAlpha12,
    KAlpha12Beta,
}

impl LineSet {
    pub const ALL: [LineSet; 5] = [
        LineSet::KAlpha1,
        LineSet::KAlpha2,
        LineSet::KBeta,
        LineSet::KAlpha12,
        LineSet::KAlpha12Beta,
    ];

    fn suffix(self) -> &'static str {
        match self {
            LineSet::KAlpha1 => "ka1",
            LineSet::KAlpha2 => "ka2",
            LineSet::KBeta => "kb1",
            LineSet::KAlpha12 => "ka1-ka2",
            LineSet::KAlpha12Beta => "ka1-ka2-kb1",
        }
    }
}

/// 中子源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeutronSource {
    Thermal,
    Cold,
    Hot,
}

impl NeutronSource {
    pub const ALL: [NeutronSource; 3] = [NeutronSource::Thermal, NeutronSource::Cold, NeutronSource::Hot];

    /// 波长（nm）
    pub fn wavelength_nm(self) -> f64 {
        match self {
            NeutronSource::Thermal => 0.154,
            NeutronSource::Cold => 0.475,
            NeutronSource::Hot => 0.087,
        }
    }

    fn name(self) -> &'static str {
        match self {
            NeutronSource::Thermal => "thermal",
            NeutronSource::Cold => "cold",
            NeutronSource::Hot => "hot",
        }
    }
}

/// 辐射源预设
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePreset {
    XRay(Anode, LineSet),
    Neutron(NeutronSource),
}

impl SourcePreset {
    /// 所有预设（按 `sources` 命令的显示顺序）
    pub fn all() -> Vec<SourcePreset> {
        let mut presets: Vec<SourcePreset> = Anode::ALL
            .iter()
            .flat_map(|&anode| LineSet::ALL.iter().map(move |&set| SourcePreset::XRay(anode, set)))
            .collect();
        presets.extend(NeutronSource::ALL.iter().map(|&n| SourcePreset::Neutron(n)));
        presets
    }

    pub fn kind(self) -> RadiationKind {
        match self {
            SourcePreset::XRay(..) => RadiationKind::XRay,
            SourcePreset::Neutron(_) => RadiationKind::Neutron,
        }
    }

    /// 解析为辐射源
    pub fn resolve(self) -> RadiationSource {
        match self {
            SourcePreset::XRay(anode, set @ (LineSet::KAlpha2 | LineSet::KBeta)) => {
                RadiationSource::single(RadiationKind::XRay, anode.nominal(set), self.to_string())
            }
            SourcePreset::XRay(anode, set) => {
                let (ka1, ka2, kb) = anode.lines();
                let mut components = vec![WavelengthComponent {
                    wavelength_nm: ka1,
                    factor: 1.0,
                    label: LineLabel::KAlpha1,
                }];
                if matches!(set, LineSet::KAlpha12 | LineSet::KAlpha12Beta) {
                    components.push(WavelengthComponent {
                        wavelength_nm: ka2,
                        factor: KALPHA2_FACTOR,
                        label: LineLabel::KAlpha2,
                    });
                }
                if set == LineSet::KAlpha12Beta {
                    components.push(WavelengthComponent {
                        wavelength_nm: kb,
                        factor: KBETA_FACTOR,
                        label: LineLabel::KBeta,
                    });
                }
                RadiationSource {
                    name: self.to_string(),
                    kind: RadiationKind::XRay,
                    nominal_wavelength_nm: anode.nominal(set),
                    components,
                }
            }
            SourcePreset::Neutron(source) => {
                RadiationSource::single(RadiationKind::Neutron, source.wavelength_nm(), self.to_string())
            }
        }
    }
}

impl fmt::Display for SourcePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourcePreset::XRay(anode, set) => write!(f, "{}-{}", anode.symbol(), set.suffix()),
            SourcePreset::Neutron(n) => write!(f, "{}", n.name()),
        }
    }
}

impl FromStr for SourcePreset {
    type Err = PowdiffError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase().replace(['(', ')', '+', '_', ' '], "-");
        let key = key.trim_matches('-');
        // "cu-ka" 作为 Kα1+Kα2 的常用简称
        let key = match key.strip_suffix("ka").map(|anode| anode.trim_end_matches('-')) {
            Some(anode) if !anode.is_empty() && !anode.contains('-') => format!("{}-ka1-ka2", anode),
            _ => key.to_string(),
        };

        SourcePreset::all()
            .into_iter()
            .find(|p| {
                let name = p.to_string();
                name == key || name.replace('-', "") == key.replace('-', "")
            })
            .ok_or_else(|| {
                PowdiffError::InvalidParameter(format!(
                    "unknown radiation source '{}' (try `powdiff sources`)",
                    s
                ))
            })
    }
}

/// 已解析的辐射源
#[derive(Debug, Clone, PartialEq)]
pub struct RadiationSource {
    pub name: String,
    pub kind: RadiationKind,
    /// 坐标轴换算使用的名义波长（nm）
    pub nominal_wavelength_nm: f64,
    /// 波长分量，第一个为主线
    pub components: Vec<WavelengthComponent>,
}

impl RadiationSource {
    /// 单一波长辐射源
    pub fn single(kind: RadiationKind, wavelength_nm: f64, name: impl Into<String>) -> Self {
        RadiationSource {
            name: name.into(),
            kind,
            nominal_wavelength_nm: wavelength_nm,
            components: vec![WavelengthComponent {
                wavelength_nm,
                factor: 1.0,
                label: LineLabel::KAlpha1,
            }],
        }
    }

    /// 用户指定波长（nm）的辐射源
    pub fn custom(kind: RadiationKind, wavelength_nm: f64) -> Result<Self> {
        let source = RadiationSource::single(kind, wavelength_nm, format!("{:.5} nm", wavelength_nm));
        source.validate()?;
        Ok(source)
    }

    pub fn is_multi_component(&self) -> bool {
        self.components.len() > 1
    }

    /// 校验波长与强度因子
    pub fn validate(&self) -> Result<()> {
        if self.components.is_empty() {
            return Err(PowdiffError::InvalidParameter(
                "radiation source has no wavelength components".to_string(),
            ));
        }
        if !is_positive(self.nominal_wavelength_nm) {
            return Err(PowdiffError::InvalidParameter(format!(
                "wavelength must be positive, got {} nm",
                self.nominal_wavelength_nm
            )));
        }
        for c in &self.components {
            if !is_positive(c.wavelength_nm) {
                return Err(PowdiffError::InvalidParameter(format!(
                    "wavelength must be positive, got {} nm ({})",
                    c.wavelength_nm, c.label
                )));
            }
            if !is_positive(c.factor) {
                return Err(PowdiffError::InvalidParameter(format!(
                    "intensity factor must be positive, got {} ({})",
                    c.factor, c.label
                )));
            }
        }
        Ok(())
    }
}

fn is_positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}
