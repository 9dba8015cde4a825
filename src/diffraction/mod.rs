//! # 粉末衍射计算模块
//!
//! 提供 X 射线与中子粉末衍射图样的计算、单位换算、标注与导出。
//!
//! ## 子模块
//! - `radiation`: 辐射源预设与波长分量
//! - `scattering`: 原子散射因子 / 中子散射长度数据库
//! - `reflections`: 衍射峰生成
//! - `synthesis`: 曲线合成与强度标度
//! - `units`: 坐标轴单位换算
//! - `annotate`: 最强峰选择与 Miller 指数格式化
//! - `pipeline`: 完整计算流程
//! - `overlay`: 实验图谱读取
//! - `export`: 数据导出
//! - `plot`: 图表生成
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/structure.rs`

pub mod annotate;
pub mod export;
pub mod overlay;
pub mod pipeline;
pub mod plot;
pub mod radiation;
pub mod reflections;
pub mod scattering;
pub mod synthesis;
pub mod units;

pub use pipeline::{compute, DiffractionRequest, DiffractionResult};
pub use radiation::{RadiationKind, RadiationSource, SourcePreset};
pub use synthesis::{IntensityScale, Representation};
pub use units::{ConversionContext, DisplayMetric};
