//! On-disk persistence glue (§6): `usage.txt`, `functions.json`, and
//! `recordings/<timestamp>.json`. Grounded on the teacher's
//! `sonido-config::Preset::{save,load,to_toml,from_toml}` read/write shape,
//! adapted from TOML to the plain-text/JSON formats spec.md names.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use synte_lang::ops::{self, Operand};
use synte_lang::{Function, Listing};

/// One `{Op, Opd}` pair in a function body, matching spec.md §6's
/// `functions.json` shape exactly (capitalised keys, flat op/operand
/// pairs) rather than the compiler's internal flat token list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpPair {
    #[serde(rename = "Op")]
    pub op: String,
    #[serde(rename = "Opd")]
    pub opd: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct FunctionRecord {
    #[serde(rename = "Comment")]
    comment: String,
    #[serde(rename = "Body")]
    body: Vec<OpPair>,
}

/// Split a function's flat token stream into `{Op, Opd}` pairs using the
/// operator table's operand arity — the same rule the compiler applies
/// when deciding whether to consume a following operand token.
fn pair_tokens(tokens: &[String]) -> Vec<OpPair> {
    let mut pairs = Vec::new();
    let mut iter = tokens.iter();
    while let Some(tok) = iter.next() {
        let takes_operand = ops::lookup(tok).is_some_and(|spec| spec.operand != Operand::None);
        let opd = if takes_operand {
            iter.next().cloned().unwrap_or_default()
        } else {
            String::new()
        };
        pairs.push(OpPair { op: tok.clone(), opd });
    }
    pairs
}

/// Flatten `{Op, Opd}` pairs back into a token stream, dropping empty
/// operands.
fn unpair_tokens(pairs: &[OpPair]) -> Vec<String> {
    let mut tokens = Vec::with_capacity(pairs.len() * 2);
    for pair in pairs {
        tokens.push(pair.op.clone());
        if !pair.opd.is_empty() {
            tokens.push(pair.opd.clone());
        }
    }
    tokens
}

/// Write every persistent (`:fon`-flagged) function in `functions`, keyed
/// by name, to `path` as pretty-printed JSON.
pub fn write_functions_json<'a>(
    path: &Path,
    functions: impl Iterator<Item = &'a Function>,
) -> std::io::Result<()> {
    let map: HashMap<&str, FunctionRecord> = functions
        .map(|f| {
            (
                f.name.as_str(),
                FunctionRecord {
                    comment: f.comment.clone(),
                    body: pair_tokens(&f.tokens),
                },
            )
        })
        .collect();
    let content = serde_json::to_string_pretty(&map)?;
    std::fs::write(path, content)
}

/// Read `functions.json` back into `Function`s (all marked persistent,
/// since only persistent functions are ever written there).
pub fn read_functions_json(path: &Path) -> std::io::Result<Vec<Function>> {
    let content = std::fs::read_to_string(path)?;
    let map: HashMap<String, FunctionRecord> = serde_json::from_str(&content)?;
    Ok(map
        .into_iter()
        .map(|(name, record)| {
            let mut function = Function::new(name, record.comment, unpair_tokens(&record.body));
            function.persistent = true;
            function
        })
        .collect())
}

/// Write an admitted-listing archive to `recordings/<timestamp>.json`.
pub fn write_recording(path: &Path, listings: &[Listing]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(listings)?;
    std::fs::write(path, content)
}

/// Tracks per-operator use counts for `usage.txt`: `op N` lines sorted
/// descending by count, then an `unused:` section listing every operator
/// in the table that was never invoked.
#[derive(Debug, Default)]
pub struct UsageCounter {
    counts: HashMap<String, usize>,
}

impl UsageCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, op_name: &str) {
        *self.counts.entry(op_name.to_string()).or_insert(0) += 1;
    }

    /// Render the `usage.txt` text: used operators sorted by descending
    /// count (ties broken alphabetically for stability), then every
    /// operator table entry that was never used.
    pub fn render(&self) -> String {
        let mut used: Vec<(&str, usize)> =
            self.counts.iter().map(|(name, &count)| (name.as_str(), count)).collect();
        used.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut out = String::new();
        for (name, count) in &used {
            out.push_str(&format!("{name} {count}\n"));
        }

        let mut unused: Vec<&str> = ops::OPERATOR_TABLE
            .iter()
            .map(|spec| spec.name)
            .filter(|name| !self.counts.contains_key(*name))
            .collect();
        unused.sort_unstable();
        if !unused.is_empty() {
            out.push_str("unused:\n");
            for name in unused {
                out.push_str(name);
                out.push('\n');
            }
        }
        out
    }

    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn functions_round_trip_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("functions.json");

        let mut osc = Function::new("osc", "a tone", vec!["mul".into(), "@".into(), "out".into(), "dac".into()]);
        osc.persistent = true;
        write_functions_json(path.as_path(), std::iter::once(&osc)).unwrap();

        let loaded = read_functions_json(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "osc");
        assert_eq!(loaded[0].comment, "a tone");
        assert_eq!(loaded[0].tokens, osc.tokens);
    }

    #[test]
    fn usage_lists_used_operators_by_descending_count() {
        let mut usage = UsageCounter::new();
        usage.record("mul");
        usage.record("mul");
        usage.record("out");
        let rendered = usage.render();
        let mul_line = rendered.lines().position(|l| l == "mul 2").unwrap();
        let out_line = rendered.lines().position(|l| l == "out 1").unwrap();
        assert!(mul_line < out_line);
    }

    #[test]
    fn usage_lists_unused_operators_in_a_trailing_section() {
        let mut usage = UsageCounter::new();
        usage.record("mul");
        let rendered = usage.render();
        assert!(rendered.contains("unused:\n"));
        assert!(rendered.contains("sine\n"));
    }

    #[test]
    fn recording_archive_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recordings").join("1700000000.json");
        let listings = vec![Listing::new(vec![], "in a out dac")];
        write_recording(&path, &listings).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<Listing> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, listings);
    }
}
