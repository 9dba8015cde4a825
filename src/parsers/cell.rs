//! # CASTEP .cell 格式解析器
//!
//! 解析 CASTEP 输入文件 .cell 格式。
//!
//! ## .cell 格式说明
//! ```text
//! %BLOCK LATTICE_CART
//! ang
//! a1 a2 a3
//! b1 b2 b3
//! c1 c2 c3
//! %ENDBLOCK LATTICE_CART
//!
//! %BLOCK POSITIONS_FRAC
//! Element x y z
//! Fe 0.0 0.0 0.0 MIXTURE:( 1 0.5 )
//! Co 0.0 0.0 0.0 MIXTURE:( 1 0.5 )
//! %ENDBLOCK POSITIONS_FRAC
//! ```
//!
//! 相同 MIXTURE 编号的行合并为一个部分占据位点，权重即占据率。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{PowdiffError, Result};
use crate::models::{Lattice, Occupant, Site, Structure};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

const BOHR_TO_ANGSTROM: f64 = 0.529_177_210_903;

static MIXTURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)MIXTURE\s*:?\s*\(\s*(\d+)\s+([-+0-9.eE]+)\s*\)").unwrap()
});

/// 解析 .cell 文件
pub fn parse_cell_file(path: &Path) -> Result<Structure> {
    let content = fs::read_to_string(path).map_err(|e| PowdiffError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_cell_content(
        &content,
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown"),
    )
}

fn parse_error(name: &str, reason: impl Into<String>) -> PowdiffError {
    PowdiffError::ParseError {
        format: "cell".to_string(),
        path: name.to_string(),
        reason: reason.into(),
    }
}

/// 从字符串内容解析 .cell 格式
pub fn parse_cell_content(content: &str, default_name: &str) -> Result<Structure> {
    let lines: Vec<&str> = content.lines().collect();

    let lattice = if let Some(block) = find_block(&lines, "LATTICE_CART") {
        parse_lattice_cart(&block, default_name)?
    } else if let Some(block) = find_block(&lines, "LATTICE_ABC") {
        parse_lattice_abc(&block, default_name)?
    } else {
        return Err(parse_error(
            default_name,
            "Missing LATTICE_CART or LATTICE_ABC block",
        ));
    };

    let sites = if let Some(block) = find_block(&lines, "POSITIONS_FRAC") {
        parse_positions(&block, default_name, None)?
    } else if let Some(block) = find_block(&lines, "POSITIONS_ABS") {
        parse_positions(&block, default_name, Some(&lattice))?
    } else {
        return Err(parse_error(
            default_name,
            "Missing POSITIONS_FRAC or POSITIONS_ABS block",
        ));
    };

    let mut structure = Structure::new(default_name, lattice, sites);
    structure.source_format = Some("cell".to_string());

    Ok(structure)
}

/// 块内的有效行（去掉注释和空行）
#[derive(Debug)]
struct Block<'a> {
    /// 单位行（ang/bohr/nm），如有
    unit: Option<&'a str>,
    rows: Vec<&'a str>,
}

impl Block<'_> {
    fn length_factor(&self) -> f64 {
        match self.unit.map(|u| u.to_ascii_lowercase()).as_deref() {
            Some("bohr") | Some("a0") => BOHR_TO_ANGSTROM,
            Some("nm") => 10.0,
            _ => 1.0,
        }
    }
}

/// 查找 %BLOCK XXX ... %ENDBLOCK XXX
fn find_block<'a>(lines: &[&'a str], block_name: &str) -> Option<Block<'a>> {
    let start = lines.iter().position(|line| {
        let mut tokens = line.split_whitespace();
        matches!(tokens.next(), Some(t) if t.eq_ignore_ascii_case("%BLOCK"))
            && matches!(tokens.next(), Some(t) if t.eq_ignore_ascii_case(block_name))
    })?;

    let mut block = Block {
        unit: None,
        rows: Vec::new(),
    };
    for line in &lines[start + 1..] {
        let line = line.trim();
        if line.to_uppercase().starts_with("%ENDBLOCK") {
            break;
        }
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let is_unit = ["ang", "bohr", "a0", "nm"]
            .iter()
            .any(|u| line.eq_ignore_ascii_case(u));
        if is_unit {
            block.unit = Some(line);
        } else {
            block.rows.push(line);
        }
    }
    Some(block)
}

fn numbers(line: &str) -> Vec<f64> {
    line.split_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect()
}

/// 解析 LATTICE_CART 块
fn parse_lattice_cart(block: &Block<'_>, name: &str) -> Result<Lattice> {
    let factor = block.length_factor();
    let rows: Vec<Vec<f64>> = block
        .rows
        .iter()
        .map(|l| numbers(l))
        .filter(|p| p.len() >= 3)
        .take(3)
        .collect();

    if rows.len() < 3 {
        return Err(parse_error(name, "Incomplete LATTICE_CART block"));
    }

    let mut matrix = [[0.0; 3]; 3];
    for (row, parts) in matrix.iter_mut().zip(rows.iter()) {
        *row = [parts[0] * factor, parts[1] * factor, parts[2] * factor];
    }
    Ok(Lattice::from_vectors(matrix))
}

/// 解析 LATTICE_ABC 块
fn parse_lattice_abc(block: &Block<'_>, name: &str) -> Result<Lattice> {
    let params: Vec<f64> = block.rows.iter().flat_map(|l| numbers(l)).collect();

    if params.len() < 6 {
        return Err(parse_error(
            name,
            "Incomplete LATTICE_ABC block (need a b c alpha beta gamma)",
        ));
    }

    let f = block.length_factor();
    Ok(Lattice::from_parameters(
        params[0] * f,
        params[1] * f,
        params[2] * f,
        params[3],
        params[4],
        params[5],
    ))
}

/// 解析原子位置块
///
/// 给定 `lattice` 时按绝对坐标处理并换算为分数坐标。
fn parse_positions(block: &Block<'_>, name: &str, lattice: Option<&Lattice>) -> Result<Vec<Site>> {
    let factor = block.length_factor();
    let mut sites: Vec<Site> = Vec::new();
    // MIXTURE 编号 → sites 中的下标
    let mut mixtures: HashMap<u32, usize> = HashMap::new();

    for line in &block.rows {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(parse_error(name, format!("Invalid position line: '{}'", line)));
        }
        let coords: Vec<f64> = parts[1..4].iter().filter_map(|s| s.parse().ok()).collect();
        if coords.len() < 3 {
            return Err(parse_error(name, format!("Invalid coordinates: '{}'", line)));
        }

        let position = match lattice {
            Some(lat) => lat.cart_to_frac([coords[0] * factor, coords[1] * factor, coords[2] * factor]),
            None => [coords[0], coords[1], coords[2]],
        };
        let species = parts[0];

        match MIXTURE_RE.captures(line) {
            Some(caps) => {
                let id: u32 = caps[1]
                    .parse()
                    .map_err(|_| parse_error(name, format!("Invalid MIXTURE id: '{}'", line)))?;
                let weight: f64 = caps[2]
                    .parse()
                    .map_err(|_| parse_error(name, format!("Invalid MIXTURE weight: '{}'", line)))?;

                match mixtures.get(&id) {
                    Some(&idx) => sites[idx].occupants.push(Occupant {
                        species: species.to_string(),
                        occupancy: weight,
                    }),
                    None => {
                        mixtures.insert(id, sites.len());
                        sites.push(Site::disordered(vec![(species, weight)], position));
                    }
                }
            }
            None => sites.push(Site::new(species, position)),
        }
    }

    Ok(sites)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_lattice_cart() {
        let content = r#"
%BLOCK LATTICE_CART
ang
5.0 0.0 0.0
0.0 5.0 0.0
0.0 0.0 5.0
%ENDBLOCK LATTICE_CART

%BLOCK POSITIONS_FRAC
Na 0.0 0.0 0.0
Cl 0.5 0.5 0.5
%ENDBLOCK POSITIONS_FRAC
"#;
        let structure = parse_cell_content(content, "NaCl").unwrap();
        assert_eq!(structure.num_sites(), 2);
        assert_eq!(structure.source_format.as_deref(), Some("cell"));

        let (a, b, c, _, _, _) = structure.lattice.parameters();
        assert!((a - 5.0).abs() < 0.01);
        assert!((b - 5.0).abs() < 0.01);
        assert!((c - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_parse_cell_lattice_abc() {
        let content = r#"
%block lattice_abc
ang
3.21 3.21 5.21
90.0 90.0 120.0
%endblock lattice_abc

%BLOCK POSITIONS_FRAC
Mg 0.333333 0.666667 0.25
Mg 0.666667 0.333333 0.75
%ENDBLOCK POSITIONS_FRAC
"#;
        let structure = parse_cell_content(content, "Mg").unwrap();
        let (a, _, c, alpha, _, gamma) = structure.lattice.parameters();

        assert!((a - 3.21).abs() < 1e-6);
        assert!((c - 5.21).abs() < 1e-6);
        assert!((alpha - 90.0).abs() < 1e-6);
        assert!((gamma - 120.0).abs() < 1e-6);
        assert!(structure.lattice.is_hexagonal());
    }

    #[test]
    fn test_bohr_units() {
        let content = "%BLOCK LATTICE_CART\nbohr\n10 0 0\n0 10 0\n0 0 10\n%ENDBLOCK LATTICE_CART\n\
                       %BLOCK POSITIONS_FRAC\nFe 0 0 0\n%ENDBLOCK POSITIONS_FRAC\n";
        let structure = parse_cell_content(content, "Fe").unwrap();
        let (a, _, _, _, _, _) = structure.lattice.parameters();
        assert!((a - 5.29177210903).abs() < 1e-9);
    }

    #[test]
    fn test_positions_abs() {
        let content = r#"
%BLOCK LATTICE_CART
4.0 0.0 0.0
0.0 4.0 0.0
0.0 0.0 4.0
%ENDBLOCK LATTICE_CART
%BLOCK POSITIONS_ABS
Si 0.0 0.0 0.0
Si 1.0 1.0 1.0
%ENDBLOCK POSITIONS_ABS
"#;
        let structure = parse_cell_content(content, "Si").unwrap();
        let p = structure.sites[1].position;
        assert!(p.iter().all(|x| (x - 0.25).abs() < 1e-12));
    }

    #[test]
    fn test_mixture_sites() {
        let content = r#"
%BLOCK LATTICE_CART
2.87 0 0
0 2.87 0
0 0 2.87
%ENDBLOCK LATTICE_CART
%BLOCK POSITIONS_FRAC
Fe 0.0 0.0 0.0 MIXTURE:( 1 0.5 )
Co 0.0 0.0 0.0 MIXTURE:( 1 0.5 )
Fe 0.5 0.5 0.5
%ENDBLOCK POSITIONS_FRAC
"#;
        let structure = parse_cell_content(content, "FeCo").unwrap();
        assert_eq!(structure.num_sites(), 2);

        let mixed = &structure.sites[0];
        assert!(!mixed.is_ordered());
        assert_eq!(mixed.occupants.len(), 2);
        assert_eq!(mixed.occupants[1].species, "Co");
        assert!((mixed.total_occupancy() - 1.0).abs() < 1e-12);
        assert!(structure.sites[1].is_ordered());
    }

    #[test]
    fn test_parse_cell_with_comments() {
        let content = r#"
# This is a comment
! Another comment
%BLOCK LATTICE_CART
ang
3.0 0.0 0.0
0.0 3.0 0.0
0.0 0.0 3.0
%ENDBLOCK LATTICE_CART

%BLOCK POSITIONS_FRAC
# Fe at origin
Fe 0.0 0.0 0.0
%ENDBLOCK POSITIONS_FRAC
"#;
        let structure = parse_cell_content(content, "Fe").unwrap();
        assert_eq!(structure.num_sites(), 1);
        assert_eq!(structure.sites[0].occupants[0].species, "Fe");
    }

    #[test]
    fn test_missing_blocks() {
        let no_lattice = "%BLOCK POSITIONS_FRAC\nFe 0 0 0\n%ENDBLOCK POSITIONS_FRAC\n";
        assert!(parse_cell_content(no_lattice, "x").is_err());

        let no_positions = "%BLOCK LATTICE_CART\n1 0 0\n0 1 0\n0 0 1\n%ENDBLOCK LATTICE_CART\n";
        assert!(parse_cell_content(no_positions, "x").is_err());

        let short_lattice = "%BLOCK LATTICE_CART\n1 0 0\n0 1 0\n%ENDBLOCK LATTICE_CART\n\
                             %BLOCK POSITIONS_FRAC\nFe 0 0 0\n%ENDBLOCK POSITIONS_FRAC\n";
        assert!(parse_cell_content(short_lattice, "x").is_err());
    }
}
