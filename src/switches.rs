use std::{collections::BTreeMap, path::Path};

use anyhow::Context as _;

use crate::error::{FigpipeError, FigpipeResult};

/// Immutable set of `name = True|False` switches gating every pipeline stage.
///
/// Loaded once per run. Lookups of switches absent from the file are errors;
/// nothing defaults silently.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Switches {
    values: BTreeMap<String, bool>,
}

impl Switches {
    pub fn load(path: &Path) -> FigpipeResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read switch file '{}'", path.display()))?;
        Self::parse(&text)
            .map_err(|e| FigpipeError::config(format!("{}: {e}", path.display())))
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        let mut values = BTreeMap::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let Some((name, setting)) = line.split_once(" = ") else {
                return Err(format!("line {}: expected 'name = True|False'", lineno + 1));
            };
            let value = match setting {
                "True" => true,
                "False" => false,
                other => {
                    return Err(format!(
                        "line {}: switch '{name}' has value '{other}', expected True or False",
                        lineno + 1
                    ));
                }
            };
            values.insert(name.to_string(), value);
        }
        Ok(Self { values })
    }

    /// Missing switches are a hard error, never an implicit `false`.
    pub fn get(&self, name: &str) -> FigpipeResult<bool> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| FigpipeError::config(format!("switch '{name}' is not configured")))
    }

    /// Validates that every switch the pipeline consumes is present,
    /// reporting all missing names at once.
    pub fn require_all(&self, names: &[&str]) -> FigpipeResult<()> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| !self.values.contains_key(*name))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(FigpipeError::config(format!(
                "missing switches: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn to_file_string(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.values {
            out.push_str(name);
            out.push_str(" = ");
            out.push_str(if *value { "True" } else { "False" });
            out.push('\n');
        }
        out
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, bool)]) -> Self {
        Self {
            values: pairs
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_values_and_skips_blank_lines() {
        let sw = Switches::parse("a = True\n\nb = False\n").unwrap();
        assert!(sw.get("a").unwrap());
        assert!(!sw.get("b").unwrap());
    }

    #[test]
    fn missing_separator_is_an_error() {
        let err = Switches::parse("nhc_analysis True\n").unwrap_err();
        assert!(err.contains("line 1"));
    }

    #[test]
    fn non_boolean_value_is_an_error() {
        let err = Switches::parse("a = Yes\n").unwrap_err();
        assert!(err.contains("'Yes'"));
    }

    #[test]
    fn missing_switch_lookup_fails_loudly() {
        let sw = Switches::parse("a = True\n").unwrap();
        assert!(sw.get("b").is_err());
    }

    #[test]
    fn require_all_reports_every_missing_switch() {
        let sw = Switches::parse("a = True\n").unwrap();
        let err = sw.require_all(&["a", "b", "c"]).unwrap_err().to_string();
        assert!(err.contains("b, c"));
    }

    #[test]
    fn round_trips_through_file_format() {
        let sw = Switches::parse("b = False\na = True\n").unwrap();
        let again = Switches::parse(&sw.to_file_string()).unwrap();
        assert_eq!(sw, again);
    }
}
