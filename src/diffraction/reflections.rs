//! # 衍射峰生成器
//!
//! 由晶体结构和单一波长计算 Bragg 衍射峰。
//!
//! ## 算法概述
//! 1. 计算晶体学倒格子（不含 2π）
//! 2. 遍历 |g| ≤ 2/λ 限制球内的所有 (hkl)
//! 3. d = 1/|g|，sin(θ) = λ/(2d)，丢弃 2θ 范围外的点
//! 4. 结构因子 F = Σ occ · f · exp(2πi(hx + ky + lz))，I = |F|²
//! 5. X 射线乘 Lorentz 极化因子，中子乘 Lorentz 因子
//! 6. 合并 2θ 相同（容差 1e-5°）的峰并归并为等效晶面族
//!
//! ## 参考
//! - pymatgen.analysis.diffraction.xrd / neutron
//!
//! ## 依赖关系
//! - 被 `diffraction/pipeline.rs` 调用
//! - 使用 `models/structure.rs` 的 Structure, Lattice
//! - 使用 `diffraction/scattering.rs` 获取散射强度

use crate::diffraction::radiation::{LineLabel, RadiationKind};
use crate::diffraction::scattering;
use crate::error::{PowdiffError, Result};
use crate::models::structure::norm;
use crate::models::Structure;

use std::f64::consts::PI;

/// 2θ 合并容差（度）
pub const TWO_THETA_TOL: f64 = 1e-5;

/// 相对强度下限（最强峰 = 100）
pub const SCALED_INTENSITY_TOL: f64 = 1e-3;

/// 等效晶面族
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HklFamily {
    /// 代表指数（族内字典序最大者），三指数或四指数 (h k i l)
    pub indices: Vec<i32>,
    /// 多重度
    pub multiplicity: usize,
}

impl HklFamily {
    pub fn is_zero(&self) -> bool {
        self.indices.iter().all(|&i| i == 0)
    }
}

/// 衍射峰
#[derive(Debug, Clone)]
pub struct Reflection {
    /// 衍射角 2θ（度）
    pub two_theta: f64,
    /// d 间距（Å）
    pub d_spacing: f64,
    /// 未归一化强度
    pub intensity: f64,
    /// 该 2θ 处合并的晶面族
    pub families: Vec<HklFamily>,
    /// 所属波长分量
    pub label: LineLabel,
}

impl Reflection {
    /// 按波长分量重新标注并缩放强度
    pub fn scaled(self, factor: f64, label: LineLabel) -> Self {
        Reflection {
            intensity: self.intensity * factor,
            label,
            ..self
        }
    }
}

/// 单个 (hkl) 点的中间结果
struct RawPoint {
    hkl: [i32; 3],
    g: f64,
    two_theta: f64,
    d_spacing: f64,
    intensity: f64,
}

/// 合并中的衍射峰
struct MergedPeak {
    two_theta: f64,
    d_spacing: f64,
    intensity: f64,
    members: Vec<Vec<i32>>,
}

/// 衍射峰生成器
pub struct ReflectionGenerator {
    kind: RadiationKind,
    /// 波长（nm）
    wavelength_nm: f64,
}

impl ReflectionGenerator {
    pub fn new(kind: RadiationKind, wavelength_nm: f64) -> Self {
        Self {
            kind,
            wavelength_nm,
        }
    }

    /// 计算 2θ ∈ [min, max]（度）内的衍射峰，按 2θ 升序返回
    pub fn generate(&self, structure: &Structure, range: (f64, f64)) -> Result<Vec<Reflection>> {
        if !(self.wavelength_nm.is_finite() && self.wavelength_nm > 0.0) {
            return Err(PowdiffError::InvalidParameter(format!(
                "wavelength must be positive, got {} nm",
                self.wavelength_nm
            )));
        }
        validate_angle_range(range)?;
        structure.validate()?;

        let wavelength = self.wavelength_nm * 10.0;
        let recip = structure.lattice.reciprocal_lattice_crystallographic()?;
        let hexagonal = structure.lattice.is_hexagonal();

        // 预先展开所有 (物种, 占据率, 位置)，并校验散射数据
        let species = distinct_species(structure);
        scattering::check_species(self.kind, species.iter().map(String::as_str))?;
        let occupants: Vec<(usize, f64, [f64; 3])> = structure
            .sites
            .iter()
            .flat_map(|site| {
                let species = &species;
                site.occupants.iter().map(move |occ| {
                    let idx = species.iter().position(|s| *s == occ.species).unwrap_or(0);
                    (idx, occ.occupancy, site.position)
                })
            })
            .collect();

        let mut points = self.collect_points(&recip, &structure.lattice.matrix, wavelength, range);
        let mut factors = vec![0.0; species.len()];
        for point in &mut points {
            let s = point.g / 2.0;
            for (f, sp) in factors.iter_mut().zip(species.iter()) {
                *f = scattering::scattering_factor(self.kind, sp, s)?;
            }

            let (mut f_real, mut f_imag) = (0.0, 0.0);
            for &(idx, occupancy, pos) in &occupants {
                let phase = 2.0
                    * PI
                    * (point.hkl[0] as f64 * pos[0]
                        + point.hkl[1] as f64 * pos[1]
                        + point.hkl[2] as f64 * pos[2]);
                let amplitude = occupancy * factors[idx];
                f_real += amplitude * phase.cos();
                f_imag += amplitude * phase.sin();
            }

            let theta = (point.two_theta / 2.0).to_radians();
            point.intensity = (f_real * f_real + f_imag * f_imag) * self.lorentz_factor(theta);
        }

        let merged = merge_points(points, hexagonal);
        let max_intensity = merged.iter().map(|p| p.intensity).fold(0.0, f64::max);
        if max_intensity <= 0.0 {
            return Ok(Vec::new());
        }

        Ok(merged
            .into_iter()
            .filter(|p| p.intensity / max_intensity * 100.0 > SCALED_INTENSITY_TOL)
            .map(|p| Reflection {
                two_theta: p.two_theta,
                d_spacing: p.d_spacing,
                intensity: p.intensity,
                families: unique_families(&p.members),
                label: LineLabel::KAlpha1,
            })
            .filter(|r| !r.families.iter().any(HklFamily::is_zero))
            .collect())
    }

    /// 遍历限制球，返回按 (|g|, -h, -k, -l) 排序的候选点
    fn collect_points(
        &self,
        recip: &[[f64; 3]; 3],
        matrix: &[[f64; 3]; 3],
        wavelength: f64,
        range: (f64, f64),
    ) -> Vec<RawPoint> {
        let g_max = 2.0 / wavelength;
        // |h| = |g · a₁| ≤ |g| |a₁|
        let bound = |axis: usize| (g_max * norm(&matrix[axis])).floor() as i32;
        let (h_max, k_max, l_max) = (bound(0), bound(1), bound(2));

        let mut points = Vec::new();
        for h in -h_max..=h_max {
            for k in -k_max..=k_max {
                for l in -l_max..=l_max {
                    if h == 0 && k == 0 && l == 0 {
                        continue;
                    }
                    let (hf, kf, lf) = (h as f64, k as f64, l as f64);
                    let g = [
                        hf * recip[0][0] + kf * recip[1][0] + lf * recip[2][0],
                        hf * recip[0][1] + kf * recip[1][1] + lf * recip[2][1],
                        hf * recip[0][2] + kf * recip[1][2] + lf * recip[2][2],
                    ];
                    let g_mag = norm(&g);
                    if g_mag > g_max || g_mag < 1e-12 {
                        continue;
                    }

                    let sin_theta = wavelength * g_mag / 2.0;
                    if sin_theta > 1.0 {
                        continue;
                    }
                    let two_theta = 2.0 * sin_theta.asin().to_degrees();
                    if two_theta < range.0 || two_theta > range.1 {
                        continue;
                    }

                    points.push(RawPoint {
                        hkl: [h, k, l],
                        g: g_mag,
                        two_theta,
                        d_spacing: 1.0 / g_mag,
                        intensity: 0.0,
                    });
                }
            }
        }

        points.sort_by(|a, b| {
            a.g.total_cmp(&b.g)
                .then(b.hkl[0].cmp(&a.hkl[0]))
                .then(b.hkl[1].cmp(&a.hkl[1]))
                .then(b.hkl[2].cmp(&a.hkl[2]))
        });
        points
    }

    /// 角度校正因子
    ///
    /// X 射线：(1 + cos²2θ) / (sin²θ cosθ)；中子：1 / (sin²θ cosθ)
    fn lorentz_factor(&self, theta: f64) -> f64 {
        let sin_theta = theta.sin();
        let cos_theta = theta.cos();
        let denom = sin_theta * sin_theta * cos_theta;
        if denom.abs() < 1e-12 {
            return 0.0;
        }
        match self.kind {
            RadiationKind::XRay => {
                let cos_2theta = (2.0 * theta).cos();
                (1.0 + cos_2theta * cos_2theta) / denom
            }
            RadiationKind::Neutron => 1.0 / denom,
        }
    }
}

/// 校验 2θ 范围：0 ≤ min < max ≤ 180
pub fn validate_angle_range(range: (f64, f64)) -> Result<()> {
    let (min, max) = range;
    if !(min.is_finite() && max.is_finite()) || min < 0.0 || max > 180.0 || min >= max {
        return Err(PowdiffError::InvalidParameter(format!(
            "invalid 2θ range [{}, {}], expected 0 ≤ min < max ≤ 180",
            min, max
        )));
    }
    Ok(())
}

/// 结构中出现的物种（保持首次出现顺序）
fn distinct_species(structure: &Structure) -> Vec<String> {
    let mut species: Vec<String> = Vec::new();
    for occ in structure.sites.iter().flat_map(|s| s.occupants.iter()) {
        if !species.contains(&occ.species) {
            species.push(occ.species.clone());
        }
    }
    species
}

/// 合并 2θ 相同的点；六方晶格转换为四指数
fn merge_points(points: Vec<RawPoint>, hexagonal: bool) -> Vec<MergedPeak> {
    let mut merged: Vec<MergedPeak> = Vec::new();

    for point in points {
        let indices = if hexagonal {
            let [h, k, l] = point.hkl;
            vec![h, k, -(h + k), l]
        } else {
            point.hkl.to_vec()
        };

        // 点已按 |g| 排序，只需回看末尾 2θ 容差内的峰
        let found = merged
            .iter()
            .rposition(|m| (m.two_theta - point.two_theta).abs() >= TWO_THETA_TOL)
            .map_or(0, |i| i + 1);
        match merged[found..]
            .iter_mut()
            .find(|m| (m.two_theta - point.two_theta).abs() < TWO_THETA_TOL)
        {
            Some(existing) => {
                existing.intensity += point.intensity;
                existing.members.push(indices);
            }
            None => merged.push(MergedPeak {
                two_theta: point.two_theta,
                d_spacing: point.d_spacing,
                intensity: point.intensity,
                members: vec![indices],
            }),
        }
    }

    merged
}

/// 将指数归并为等效晶面族（|指数| 的排列相同即等效）
///
/// 族按首次出现顺序排列，代表指数取字典序最大者。
pub fn unique_families(members: &[Vec<i32>]) -> Vec<HklFamily> {
    let key = |hkl: &[i32]| {
        let mut abs: Vec<i32> = hkl.iter().map(|i| i.abs()).collect();
        abs.sort_unstable();
        abs
    };

    let mut groups: Vec<(Vec<i32>, Vec<&Vec<i32>>)> = Vec::new();
    for hkl in members {
        let k = key(hkl);
        match groups.iter_mut().find(|(gk, _)| *gk == k) {
            Some((_, group)) => group.push(hkl),
            None => groups.push((k, vec![hkl])),
        }
    }

    groups
        .into_iter()
        .filter_map(|(_, group)| {
            let multiplicity = group.len();
            group.into_iter().max().map(|rep| HklFamily {
                indices: rep.clone(),
                multiplicity,
            })
        })
        .collect()
}
