//! # VASP POSCAR 格式解析器
//!
//! 解析 VASP POSCAR/CONTCAR 文件为 `Structure`。
//!
//! ## POSCAR 格式说明
//! ```text
//! Comment line (structure name)
//! 1.0                    # scaling factor（负值表示目标体积）
//! a1 a2 a3               # lattice vector a
//! b1 b2 b3               # lattice vector b
//! c1 c2 c3               # lattice vector c
//! Element1 Element2 ...  # element symbols (VASP 5+)
//! n1 n2 ...              # number of atoms per element
//! Selective dynamics     # optional
//! Direct/Cartesian       # coordinate type
//! x1 y1 z1               # atom positions
//! ...
//! ```
//!
//! VASP 4 格式没有元素行，此时从注释行读取元素符号。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{PowdiffError, Result};
use crate::models::{Lattice, Site, Structure};
use std::fs;
use std::path::Path;

/// 解析 POSCAR/CONTCAR 文件
pub fn parse_poscar_file(path: &Path) -> Result<Structure> {
    let content = fs::read_to_string(path).map_err(|e| PowdiffError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_poscar_content(
        &content,
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown"),
    )
}

fn parse_error(name: &str, reason: impl Into<String>) -> PowdiffError {
    PowdiffError::ParseError {
        format: "poscar".to_string(),
        path: name.to_string(),
        reason: reason.into(),
    }
}

/// 去掉 VASP 6 赝势哈希后缀，如 "Fe/1a2b3c" → "Fe"
fn clean_species(token: &str) -> String {
    token.split('/').next().unwrap_or(token).to_string()
}

/// 从字符串内容解析 POSCAR 格式
pub fn parse_poscar_content(content: &str, default_name: &str) -> Result<Structure> {
    let lines: Vec<&str> = content.lines().collect();

    if lines.len() < 8 {
        return Err(parse_error(default_name, "File too short"));
    }

    // Line 0: Comment/name
    let comment = lines[0].trim();
    let name = if comment.is_empty() {
        default_name.to_string()
    } else {
        comment.to_string()
    };

    // Line 1: Scaling factor
    let scale: f64 = lines[1]
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| parse_error(&name, "Invalid scaling factor at line 2"))?;

    // Lines 2-4: Lattice vectors
    let mut matrix = [[0.0; 3]; 3];
    for (i, row) in matrix.iter_mut().enumerate() {
        let parts: Vec<f64> = lines[2 + i]
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        if parts.len() < 3 {
            return Err(parse_error(
                &name,
                format!("Invalid lattice vector at line {}", 3 + i),
            ));
        }
        *row = [parts[0], parts[1], parts[2]];
    }

    // 负缩放因子表示晶胞体积
    let factor = if scale < 0.0 {
        let volume = Lattice::from_vectors(matrix).volume().abs();
        if volume < 1e-10 {
            return Err(parse_error(&name, "Degenerate lattice"));
        }
        (scale.abs() / volume).cbrt()
    } else {
        scale
    };
    for row in matrix.iter_mut() {
        for v in row.iter_mut() {
            *v *= factor;
        }
    }
    let lattice = Lattice::from_vectors(matrix);

    // Line 5: Element symbols (VASP 5+) or atom counts (VASP 4)
    let line5_parts: Vec<&str> = lines[5].split_whitespace().collect();
    let first = line5_parts
        .first()
        .ok_or_else(|| parse_error(&name, "Missing element/count line"))?;
    let (elements, counts, atom_line_start) = if first.parse::<usize>().is_ok() {
        // VASP 4：元素符号取自注释行
        let counts: Vec<usize> = line5_parts.iter().filter_map(|s| s.parse().ok()).collect();
        let elements: Vec<String> = comment
            .split_whitespace()
            .take(counts.len())
            .map(clean_species)
            .collect();
        if elements.len() != counts.len()
            || elements
                .iter()
                .any(|e| !e.starts_with(|c: char| c.is_ascii_uppercase()))
        {
            return Err(parse_error(
                &name,
                "VASP 4 POSCAR without element symbols (put them on the comment line)",
            ));
        }
        (elements, counts, 6)
    } else {
        let elements: Vec<String> = line5_parts.iter().map(|s| clean_species(s)).collect();
        let counts: Vec<usize> = lines[6]
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        if counts.len() != elements.len() {
            return Err(parse_error(&name, "Element and count lines do not match"));
        }
        (elements, counts, 7)
    };

    // Check for "Selective dynamics" line
    let mut coord_line = atom_line_start;
    if lines.len() > coord_line
        && lines[coord_line]
            .trim()
            .to_lowercase()
            .starts_with('s')
    {
        coord_line += 1;
    }

    // Coordinate type line
    if lines.len() <= coord_line {
        return Err(parse_error(&name, "Missing coordinate type line"));
    }

    let coord_type = lines[coord_line].trim().to_lowercase();
    let is_cartesian = coord_type.starts_with('c') || coord_type.starts_with('k');

    // Parse atom positions
    let total: usize = counts.iter().sum();
    let mut sites: Vec<Site> = Vec::with_capacity(total);
    let mut line_idx = coord_line + 1;

    for (elem, &count) in elements.iter().zip(counts.iter()) {
        for _ in 0..count {
            let parts: Vec<f64> = lines
                .get(line_idx)
                .map(|l| {
                    l.split_whitespace()
                        .take(3)
                        .filter_map(|s| s.parse().ok())
                        .collect()
                })
                .unwrap_or_default();

            if parts.len() < 3 {
                return Err(parse_error(
                    &name,
                    format!(
                        "Expected {} positions, invalid or missing line {}",
                        total,
                        line_idx + 1
                    ),
                ));
            }
            let position = if is_cartesian {
                lattice.cart_to_frac([parts[0] * factor, parts[1] * factor, parts[2] * factor])
            } else {
                [parts[0], parts[1], parts[2]]
            };
            sites.push(Site::new(elem.clone(), position));
            line_idx += 1;
        }
    }

    let mut structure = Structure::new(name, lattice, sites);
    structure.source_format = Some("poscar".to_string());

    Ok(structure)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NACL: &str = r#"NaCl
1.0
5.64 0.0 0.0
0.0 5.64 0.0
0.0 0.0 5.64
Na Cl
4 4
Direct
0.0 0.0 0.0
0.5 0.5 0.0
0.5 0.0 0.5
0.0 0.5 0.5
0.5 0.0 0.0
0.0 0.5 0.0
0.0 0.0 0.5
0.5 0.5 0.5
"#;

    #[test]
    fn test_parse_poscar_vasp5() {
        let structure = parse_poscar_content(NACL, "NaCl").unwrap();
        assert_eq!(structure.name, "NaCl");
        assert_eq!(structure.num_sites(), 8);
        assert_eq!(structure.source_format.as_deref(), Some("poscar"));

        let species = |el: &str| {
            structure
                .sites
                .iter()
                .filter(|s| s.occupants[0].species == el)
                .count()
        };
        assert_eq!(species("Na"), 4);
        assert_eq!(species("Cl"), 4);
        assert!(structure.sites.iter().all(|s| s.is_ordered()));
    }

    #[test]
    fn test_parse_poscar_with_scale() {
        let content = r#"Si
2.0
2.0 0.0 0.0
0.0 2.0 0.0
0.0 0.0 2.0
Si
2
Direct
0.0 0.0 0.0
0.5 0.5 0.5
"#;
        let structure = parse_poscar_content(content, "Si").unwrap();
        let (a, _, _, _, _, _) = structure.lattice.parameters();
        assert!((a - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_scale_is_volume() {
        let content = "Cu\n-27.0\n1 0 0\n0 1 0\n0 0 1\nCu\n1\nDirect\n0 0 0\n";
        let structure = parse_poscar_content(content, "Cu").unwrap();
        assert!((structure.lattice.volume() - 27.0).abs() < 1e-9);
    }

    #[test]
    fn test_cartesian_positions() {
        let content = "Fe\n1.0\n2.0 0 0\n0 2.0 0\n0 0 2.0\nFe\n2\nCartesian\n0 0 0\n1.0 1.0 1.0\n";
        let structure = parse_poscar_content(content, "Fe").unwrap();
        let p = structure.sites[1].position;
        assert!(p.iter().all(|x| (x - 0.5).abs() < 1e-12));
    }

    #[test]
    fn test_parse_poscar_selective_dynamics() {
        let content = r#"Fe with selective
1.0
2.87 0.0 0.0
0.0 2.87 0.0
0.0 0.0 2.87
Fe
2
Selective dynamics
Direct
0.0 0.0 0.0 T T T
0.5 0.5 0.5 F F F
"#;
        let structure = parse_poscar_content(content, "Fe").unwrap();
        assert_eq!(structure.num_sites(), 2);
    }

    #[test]
    fn test_vasp4_uses_comment_symbols() {
        let content = "Na Cl rocksalt\n5.64\n1 0 0\n0 1 0\n0 0 1\n1 1\nDirect\n0 0 0\n0.5 0.5 0.5\n";
        let structure = parse_poscar_content(content, "x").unwrap();
        assert_eq!(structure.sites[0].occupants[0].species, "Na");
        assert_eq!(structure.sites[1].occupants[0].species, "Cl");

        let content = "unnamed\n5.64\n1 0 0\n0 1 0\n0 0 1\n1 1\nDirect\n0 0 0\n0.5 0.5 0.5\n";
        assert!(parse_poscar_content(content, "x").is_err());
    }

    #[test]
    fn test_vasp6_species_hash() {
        let content = "Fe\n2.87\n1 0 0\n0 1 0\n0 0 1\nFe/a1b2c3\n1\nDirect\n0 0 0\n";
        let structure = parse_poscar_content(content, "Fe").unwrap();
        assert_eq!(structure.sites[0].occupants[0].species, "Fe");
    }

    #[test]
    fn test_missing_positions() {
        let truncated: String = NACL.lines().take(12).collect::<Vec<_>>().join("\n");
        assert!(matches!(
            parse_poscar_content(&truncated, "NaCl"),
            Err(PowdiffError::ParseError { .. })
        ));
    }
}
