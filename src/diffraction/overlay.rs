//! # 实验图谱叠加
//!
//! 读取用户提供的两列实验衍射数据（2θ, 强度），用于与计算图谱对比。
//!
//! 分隔符可以是空白、逗号或分号；第一行为表头。
//!
//! ## 依赖关系
//! - 被 `commands/pattern.rs`、`diffraction/plot.rs` 使用
//! - 使用 `regex` 切分数据列

use crate::diffraction::synthesis::IntensityScale;
use crate::diffraction::units::{to_metric, ConversionContext, DisplayMetric};
use crate::error::{PowdiffError, Result};

use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+|,|;").unwrap());

/// 实验衍射图谱
#[derive(Debug, Clone)]
pub struct ExperimentalPattern {
    pub name: String,
    /// 2θ（度）
    pub two_theta: Vec<f64>,
    pub intensity: Vec<f64>,
}

impl ExperimentalPattern {
    /// 从文件读取
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PowdiffError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = fs::read_to_string(path).map_err(|e| PowdiffError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self::parse(&content, &name)
    }

    /// 解析文本内容，跳过表头、空行和 `#` 注释
    pub fn parse(content: &str, name: &str) -> Result<Self> {
        let mut two_theta = Vec::new();
        let mut intensity = Vec::new();

        for (line_no, line) in content.lines().enumerate().skip(1) {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let values: Vec<&str> = SEPARATOR.split(line).filter(|t| !t.is_empty()).collect();
            if values.len() < 2 {
                return Err(parse_error(name, line_no, "expected at least two columns"));
            }
            let x: f64 = values[0]
                .parse()
                .map_err(|_| parse_error(name, line_no, "invalid 2θ value"))?;
            let y: f64 = values[1]
                .parse()
                .map_err(|_| parse_error(name, line_no, "invalid intensity value"))?;
            two_theta.push(x);
            intensity.push(y);
        }

        if two_theta.is_empty() {
            return Err(PowdiffError::ParseError {
                format: "pattern".to_string(),
                path: name.to_string(),
                reason: "no data rows".to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            two_theta,
            intensity,
        })
    }

    /// 按强度标度归一化，并截取 2θ 显示范围
    pub fn prepared(&self, scale: IntensityScale, display_range: (f64, f64)) -> Self {
        let max = self.intensity.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let factor = if scale == IntensityScale::Normalized && max > 0.0 {
            100.0 / max
        } else {
            1.0
        };

        let (two_theta, intensity) = self
            .two_theta
            .iter()
            .zip(self.intensity.iter())
            .filter(|(&x, _)| x >= display_range.0 && x <= display_range.1)
            .map(|(&x, &y)| (x, y * factor))
            .unzip();

        Self {
            name: self.name.clone(),
            two_theta,
            intensity,
        }
    }

    /// 换算到显示单位的 (x, y) 点列
    pub fn points(&self, metric: DisplayMetric, ctx: &ConversionContext) -> Vec<(f64, f64)> {
        self.two_theta
            .iter()
            .zip(self.intensity.iter())
            .map(|(&x, &y)| (to_metric(x, metric, ctx), y))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.two_theta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.two_theta.is_empty()
    }
}

fn parse_error(name: &str, line_no: usize, reason: &str) -> PowdiffError {
    PowdiffError::ParseError {
        format: "pattern".to_string(),
        path: name.to_string(),
        reason: format!("line {}: {}", line_no + 1, reason),
    }
}
