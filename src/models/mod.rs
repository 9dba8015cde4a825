//! # 数据模型模块
//!
//! 定义衍射计算使用的晶体结构数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`diffraction/` 和 `commands/` 使用
//! - 子模块: structure

pub mod structure;

pub use structure::{Lattice, Occupant, Site, Structure};
