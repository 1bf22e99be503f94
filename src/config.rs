use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level model description.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Plain matrices, registered in file order.
    #[serde(default, rename = "matrix")]
    pub matrices: Vec<MatrixToml>,

    /// Algebras, registered in file order. Definitions may refer to
    /// algebras listed after them.
    #[serde(default, rename = "algebra")]
    pub algebras: Vec<AlgebraToml>,

    /// Population edges.
    #[serde(default)]
    pub populate: Vec<PopulateToml>,

    /// Free parameters.
    #[serde(default, rename = "parameter")]
    pub parameters: Vec<ParameterToml>,

    /// RAM expectation settings.
    #[serde(default)]
    pub ram: Option<RamToml>,

    /// Maximum-likelihood fit node.
    #[serde(default)]
    pub fit: Option<FitToml>,

    /// Nodes printed by `eval`.
    #[serde(default)]
    pub evaluate: Vec<String>,
}

impl ModelConfig {
    /// Reads and parses a model file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read model file: {}", path.display()))?;
        toml::from_str(&text).context("failed to parse TOML model")
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatrixToml {
    pub name: String,
    pub rows: usize,
    pub cols: usize,
    /// Values in storage order; zeros when omitted.
    #[serde(default)]
    pub values: Option<Vec<f64>>,
    #[serde(default = "default_order")]
    pub order: String,
    /// Unit diagonal instead of zeros when `values` is omitted.
    #[serde(default)]
    pub identity: bool,
}

fn default_order() -> String {
    "col".to_string()
}

/// Either `opcodes`, or `op` with named `args`. Neither makes an empty
/// pass-through.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlgebraToml {
    pub name: String,
    #[serde(default)]
    pub opcodes: Option<Vec<i32>>,
    #[serde(default)]
    pub op: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    /// Initial shape, used by operators that read their own value.
    #[serde(default)]
    pub rows: Option<usize>,
    #[serde(default)]
    pub cols: Option<usize>,
}

/// Copies `from[from_row, from_col]` into `into[row, col]` on every
/// recompute. Coordinates are 1-based.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PopulateToml {
    pub into: String,
    pub row: usize,
    pub col: usize,
    pub from: String,
    #[serde(default = "default_one")]
    pub from_row: usize,
    #[serde(default = "default_one")]
    pub from_col: usize,
}

fn default_one() -> usize {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterToml {
    pub name: String,
    /// Starting value; the current cell value when omitted.
    #[serde(default)]
    pub value: Option<f64>,
    pub locations: Vec<LocationToml>,
}

/// A 1-based cell of a named matrix.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocationToml {
    pub matrix: String,
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RamToml {
    pub a: String,
    pub s: String,
    pub f: String,
    /// `general`, `series` or `auto`.
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Series depth, required by `series`.
    #[serde(default)]
    pub depth: Option<usize>,
}

fn default_mode() -> String {
    "general".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FitToml {
    #[serde(default = "default_fit_name")]
    pub name: String,
    /// Matrix holding the observed covariance.
    pub observed: String,
    /// Node holding the expected covariance.
    pub expected: String,
}

fn default_fit_name() -> String {
    "fit".to_string()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const MODEL: &str = r#"
evaluate = ["cov"]

[[matrix]]
name = "A"
rows = 2
cols = 2

[[matrix]]
name = "S"
rows = 2
cols = 2
identity = true

[[matrix]]
name = "F"
rows = 1
cols = 2
values = [0.0, 1.0]
order = "row"

[[algebra]]
name = "cov"
opcodes = [6, -3, 6, 0, 1, -2]

[[algebra]]
name = "Z"
op = "i_minus_a_inverse"
args = ["A"]

[[parameter]]
name = "b"
value = 0.5
locations = [{ matrix = "A", row = 2, col = 1 }]

[ram]
a = "A"
s = "S"
f = "F"
mode = "auto"
"#;

    fn write(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_full_model() {
        let file = write(MODEL);
        let config = ModelConfig::load(file.path()).unwrap();
        assert_eq!(config.matrices.len(), 3);
        assert_eq!(config.matrices[0].order, "col");
        assert!(config.matrices[1].identity);
        assert_eq!(config.algebras[0].opcodes.as_deref(), Some(&[6, -3, 6, 0, 1, -2][..]));
        assert_eq!(config.algebras[1].args, vec!["A".to_string()]);
        assert_eq!(config.parameters[0].locations[0].row, 2);
        let ram = config.ram.unwrap();
        assert_eq!(ram.mode, "auto");
        assert_eq!(ram.depth, None);
        assert!(config.fit.is_none());
        assert_eq!(config.evaluate, vec!["cov".to_string()]);
    }

    #[test]
    fn populate_defaults_to_first_cell() {
        let file = write(
            r#"
[[populate]]
into = "S"
row = 1
col = 2
from = "rho"
"#,
        );
        let config = ModelConfig::load(file.path()).unwrap();
        assert_eq!(config.populate[0].from_row, 1);
        assert_eq!(config.populate[0].from_col, 1);
        assert!(config.matrices.is_empty());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let file = write("[[matrix]]\nname = \"A\"\nrows = 1\ncols = 1\nsize = 3\n");
        let err = ModelConfig::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("unknown field"), "{err:#}");
    }

    #[test]
    fn missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = ModelConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
