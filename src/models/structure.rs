//! # 晶体结构数据模型
//!
//! 衍射计算使用的统一晶体结构表示：晶格 + 带占据率的格点。
//! 结构由解析器创建，对衍射核心只读。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `diffraction/` 使用
//! - 无外部模块依赖

use crate::error::{PowdiffError, Result};

/// 晶格参数表示
#[derive(Debug, Clone)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    /// [[a1, a2, a3], [b1, b2, b3], [c1, c2, c3]]
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格参数 (a, b, c, alpha, beta, gamma) 创建晶格
    /// 角度单位：度
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let alpha_rad = alpha.to_radians();
        let beta_rad = beta.to_radians();
        let gamma_rad = gamma.to_radians();

        let cos_alpha = alpha_rad.cos();
        let cos_beta = beta_rad.cos();
        let cos_gamma = gamma_rad.cos();
        let sin_gamma = gamma_rad.sin();

        let a_vec = [a, 0.0, 0.0];
        let b_vec = [b * cos_gamma, b * sin_gamma, 0.0];

        let c1 = c * cos_beta;
        let c2 = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let c3 = (c * c - c1 * c1 - c2 * c2).sqrt();
        let c_vec = [c1, c2, c3];

        Lattice {
            matrix: [a_vec, b_vec, c_vec],
        }
    }

    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 立方晶格
    #[cfg(test)]
    pub fn cubic(a: f64) -> Self {
        Lattice::from_vectors([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]])
    }

    /// 获取晶格参数 (a, b, c, alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let [a_vec, b_vec, c_vec] = self.matrix;

        let a = norm(&a_vec);
        let b = norm(&b_vec);
        let c = norm(&c_vec);

        let alpha = (dot(&b_vec, &c_vec) / (b * c)).acos().to_degrees();
        let beta = (dot(&a_vec, &c_vec) / (a * c)).acos().to_degrees();
        let gamma = (dot(&a_vec, &b_vec) / (a * b)).acos().to_degrees();

        (a, b, c, alpha, beta, gamma)
    }

    /// 计算晶格体积（带符号）
    pub fn volume(&self) -> f64 {
        let [a, b, c] = self.matrix;
        dot(&a, &cross(&b, &c))
    }

    /// 晶体学倒格子（不含 2π 因子）：bᵢ · aⱼ = δᵢⱼ
    ///
    /// 退化晶格返回 `InvalidParameter`。
    pub fn reciprocal_lattice_crystallographic(&self) -> Result<[[f64; 3]; 3]> {
        let [a, b, c] = self.matrix;
        let volume = self.volume();

        if volume.abs() < 1e-10 {
            return Err(PowdiffError::InvalidParameter(
                "lattice vectors are linearly dependent".to_string(),
            ));
        }

        let scale = |v: [f64; 3]| [v[0] / volume, v[1] / volume, v[2] / volume];
        Ok([
            scale(cross(&b, &c)),
            scale(cross(&c, &a)),
            scale(cross(&a, &b)),
        ])
    }

    /// 判断是否为六方晶格（两个直角 + 一个 60°/120° 角）
    ///
    /// 六方晶格的衍射峰以四指数 (h k i l) 报告。
    pub fn is_hexagonal(&self) -> bool {
        const ANGLE_TOL: f64 = 5.0;
        const LENGTH_TOL: f64 = 0.01;

        let (a, b, c, alpha, beta, gamma) = self.parameters();
        let lengths = [a, b, c];
        let angles = [alpha, beta, gamma];

        let right: Vec<usize> = (0..3)
            .filter(|&i| (angles[i] - 90.0).abs() < ANGLE_TOL)
            .collect();
        let hex = (0..3)
            .filter(|&i| {
                (angles[i] - 60.0).abs() < ANGLE_TOL || (angles[i] - 120.0).abs() < ANGLE_TOL
            })
            .count();

        right.len() == 2 && hex == 1 && (lengths[right[0]] - lengths[right[1]]).abs() < LENGTH_TOL
    }

    /// 笛卡尔坐标转分数坐标
    ///
    /// 利用倒格子：xᵢ = bᵢ · r。奇异矩阵时原样返回。
    pub fn cart_to_frac(&self, cart: [f64; 3]) -> [f64; 3] {
        match self.reciprocal_lattice_crystallographic() {
            Ok(recip) => [
                dot(&recip[0], &cart),
                dot(&recip[1], &cart),
                dot(&recip[2], &cart),
            ],
            Err(_) => cart,
        }
    }
}

/// 格点上的一种物种及其占据率
#[derive(Debug, Clone)]
pub struct Occupant {
    /// 物种标签（元素符号，可带编号或价态，如 "Fe1"、"O2-"）
    pub species: String,
    /// 占据率 (0, 1]
    pub occupancy: f64,
}

/// 格点
#[derive(Debug, Clone)]
pub struct Site {
    /// 分数坐标 [x, y, z]
    pub position: [f64; 3],

    /// 占据物种；多个物种表示无序
    pub occupants: Vec<Occupant>,
}

impl Site {
    /// 完全占据的单一物种格点
    pub fn new(species: impl Into<String>, position: [f64; 3]) -> Self {
        Site {
            position,
            occupants: vec![Occupant {
                species: species.into(),
                occupancy: 1.0,
            }],
        }
    }

    /// 无序格点：(物种, 占据率) 列表
    pub fn disordered<S: Into<String>>(occupants: Vec<(S, f64)>, position: [f64; 3]) -> Self {
        Site {
            position,
            occupants: occupants
                .into_iter()
                .map(|(species, occupancy)| Occupant {
                    species: species.into(),
                    occupancy,
                })
                .collect(),
        }
    }

    /// 总占据率
    pub fn total_occupancy(&self) -> f64 {
        self.occupants.iter().map(|o| o.occupancy).sum()
    }

    /// 是否为有序（单一物种满占据）格点
    pub fn is_ordered(&self) -> bool {
        self.occupants.len() == 1 && (self.occupants[0].occupancy - 1.0).abs() < 1e-8
    }
}

/// 晶体结构
#[derive(Debug, Clone)]
pub struct Structure {
    /// 结构名称
    pub name: String,

    /// 晶格
    pub lattice: Lattice,

    /// 格点列表
    pub sites: Vec<Site>,

    /// 来源文件格式
    pub source_format: Option<String>,
}

impl Structure {
    pub fn new(name: impl Into<String>, lattice: Lattice, sites: Vec<Site>) -> Self {
        Structure {
            name: name.into(),
            lattice,
            sites,
            source_format: None,
        }
    }

    /// 校验结构是否可用于衍射计算
    pub fn validate(&self) -> Result<()> {
        if self.sites.is_empty() {
            return Err(PowdiffError::EmptyStructure {
                name: self.name.clone(),
            });
        }

        if self.lattice.volume().abs() < 1e-10 {
            return Err(PowdiffError::InvalidParameter(format!(
                "lattice of '{}' is degenerate",
                self.name
            )));
        }

        for (i, site) in self.sites.iter().enumerate() {
            if site.occupants.is_empty() {
                return Err(PowdiffError::InvalidParameter(format!(
                    "site {} of '{}' has no species",
                    i + 1,
                    self.name
                )));
            }
            if site.occupants.iter().any(|o| o.occupancy <= 0.0) {
                return Err(PowdiffError::InvalidParameter(format!(
                    "site {} of '{}' has a non-positive occupancy",
                    i + 1,
                    self.name
                )));
            }
            let total = site.total_occupancy();
            if total > 1.0 + 1e-6 {
                return Err(PowdiffError::InvalidParameter(format!(
                    "site {} of '{}' has total occupancy {:.4} > 1",
                    i + 1,
                    self.name,
                    total
                )));
            }
        }

        Ok(())
    }

    /// 计算化学式（按占据率加权）
    pub fn formula(&self) -> String {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<&str, f64> = BTreeMap::new();

        for site in &self.sites {
            for occ in &site.occupants {
                *counts.entry(occ.species.as_str()).or_insert(0.0) += occ.occupancy;
            }
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                if (count - 1.0).abs() < 1e-6 {
                    el.to_string()
                } else if (count - count.round()).abs() < 1e-6 {
                    format!("{}{}", el, count.round() as i64)
                } else {
                    format!("{}{:.2}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// 格点数
    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }
}

pub(crate) fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub(crate) fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn norm(a: &[f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lattice_from_parameters_cubic() {
        let lattice = Lattice::from_parameters(5.0, 5.0, 5.0, 90.0, 90.0, 90.0);
        let (a, b, c, alpha, beta, gamma) = lattice.parameters();

        assert!((a - 5.0).abs() < 1e-6);
        assert!((b - 5.0).abs() < 1e-6);
        assert!((c - 5.0).abs() < 1e-6);
        assert!((alpha - 90.0).abs() < 1e-6);
        assert!((beta - 90.0).abs() < 1e-6);
        assert!((gamma - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_lattice_volume_cubic() {
        let lattice = Lattice::cubic(5.0);
        assert!((lattice.volume().abs() - 125.0).abs() < 1e-6);
    }

    #[test]
    fn test_reciprocal_lattice_cubic() {
        let recip = Lattice::cubic(4.0)
            .reciprocal_lattice_crystallographic()
            .unwrap();
        assert!((recip[0][0] - 0.25).abs() < 1e-12);
        assert!(recip[0][1].abs() < 1e-12);
        assert!((recip[2][2] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_reciprocal_lattice_degenerate() {
        let lattice = Lattice::from_vectors([[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        assert!(matches!(
            lattice.reciprocal_lattice_crystallographic(),
            Err(PowdiffError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_lattice_hexagonal() {
        let hex = Lattice::from_parameters(3.0, 3.0, 5.0, 90.0, 90.0, 120.0);
        let (a, b, c, _, _, gamma) = hex.parameters();

        assert!((a - 3.0).abs() < 0.01);
        assert!((b - 3.0).abs() < 0.01);
        assert!((c - 5.0).abs() < 0.01);
        assert!((gamma - 120.0).abs() < 0.01);
        assert!(hex.is_hexagonal());
        assert!(!Lattice::cubic(3.0).is_hexagonal());
    }

    #[test]
    fn test_cart_to_frac() {
        let lattice = Lattice::from_parameters(3.0, 3.0, 5.0, 90.0, 90.0, 120.0);
        let m = lattice.matrix;
        let frac = [0.1, 0.25, 0.7];
        let cart = [
            frac[0] * m[0][0] + frac[1] * m[1][0] + frac[2] * m[2][0],
            frac[0] * m[0][1] + frac[1] * m[1][1] + frac[2] * m[2][1],
            frac[0] * m[0][2] + frac[1] * m[1][2] + frac[2] * m[2][2],
        ];
        let back = lattice.cart_to_frac(cart);
        for i in 0..3 {
            assert!((back[i] - frac[i]).abs() < 1e-10);
        }
    }

    #[test]
    fn test_structure_validate_empty() {
        let s = Structure::new("empty", Lattice::cubic(4.0), vec![]);
        assert!(matches!(s.validate(), Err(PowdiffError::EmptyStructure { .. })));
    }

    #[test]
    fn test_structure_validate_overfull_site() {
        let site = Site::disordered(vec![("Fe", 0.7), ("Ni", 0.5)], [0.0, 0.0, 0.0]);
        let s = Structure::new("FeNi", Lattice::cubic(3.5), vec![site]);
        assert!(matches!(s.validate(), Err(PowdiffError::InvalidParameter(_))));
    }

    #[test]
    fn test_structure_formula_disordered() {
        let sites = vec![
            Site::disordered(vec![("Fe", 0.5), ("Ni", 0.5)], [0.0, 0.0, 0.0]),
            Site::new("O", [0.5, 0.5, 0.5]),
            Site::new("O", [0.0, 0.5, 0.5]),
        ];
        let s = Structure::new("test", Lattice::cubic(4.0), sites);
        assert_eq!(s.formula(), "Fe0.50Ni0.50O2");
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_site_is_ordered() {
        assert!(Site::new("Fe1", [0.0, 0.0, 0.0]).is_ordered());
        assert!(!Site::disordered(vec![("Fe", 0.9)], [0.0; 3]).is_ordered());
        assert!(!Site::disordered(vec![("Fe", 0.5), ("Co", 0.5)], [0.0; 3]).is_ordered());
    }
}
