//! # 衍射峰标注
//!
//! 选出最强的若干主线衍射峰，并格式化 Miller 指数。
//!
//! ## 依赖关系
//! - 被 `diffraction/pipeline.rs`、`diffraction/export.rs`、`diffraction/plot.rs` 使用
//! - 使用 `diffraction/reflections.rs` 的 Reflection, HklFamily

use crate::diffraction::reflections::{HklFamily, Reflection};

use std::collections::BTreeSet;

/// 标注数量上限
pub const MAX_ANNOTATIONS: usize = 30;

/// 选出显示强度最高的 n 个主线（Kα1）衍射峰
///
/// 强度相同时保持原顺序。返回 `reflections` 中的索引。
pub fn select_top_peaks(reflections: &[Reflection], intensities: &[f64], n: usize) -> BTreeSet<usize> {
    let mut primary: Vec<(usize, f64)> = reflections
        .iter()
        .zip(intensities.iter())
        .enumerate()
        .filter(|(_, (r, _))| r.label.is_primary())
        .map(|(i, (_, &y))| (i, y))
        .collect();

    primary.sort_by(|a, b| b.1.total_cmp(&a.1));
    primary.into_iter().take(n).map(|(i, _)| i).collect()
}

/// 格式化单个指数，保持列宽一致
///
/// 两位负数原样返回；两位正数首位补右空格、其余两侧补空格；
/// 更长的数两侧补空格；一位数不补。
pub fn format_index(index: i32, first: bool, last: bool) -> String {
    let s = index.to_string();
    let len = s.chars().count();

    if s.starts_with('-') && len == 2 {
        s
    } else if first && len == 2 {
        format!("{} ", s)
    } else if (last && len == 2) || len >= 2 {
        format!(" {} ", s)
    } else {
        s
    }
}

/// 格式化单个晶面族，如 "(111)"；四指数省略 i
pub fn format_family(indices: &[i32]) -> String {
    let (h, k, l) = match indices {
        [h, k, l] => (*h, *k, *l),
        [h, k, _, l] => (*h, *k, *l),
        _ => {
            let parts: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
            return format!("({})", parts.join(" "));
        }
    };
    format!(
        "({}{}{})",
        format_index(h, true, false),
        format_index(k, false, false),
        format_index(l, false, true)
    )
}

/// 格式化一个衍射峰的全部晶面族，以 ", " 分隔
pub fn format_hkl_group(families: &[HklFamily]) -> String {
    families
        .iter()
        .map(|f| format_family(&f.indices))
        .collect::<Vec<_>>()
        .join(", ")
}
