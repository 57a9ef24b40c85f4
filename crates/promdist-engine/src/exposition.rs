//! Prometheus text exposition (format 0.0.4).
//!
//! Output per family:
//! - `# HELP` / `# TYPE` (counters use `<name>_total` on both),
//! - one line per sample of every live label combination,
//! - a trailing `<name>_created` gauge block when creation times are known.
//!
//! Labels are rendered sorted by name with `le` merged in for buckets; a
//! combination without labels renders no braces.

use std::fmt::Write;

use promdist_core::format::{escape_help, escape_label_value, format_value};
use promdist_core::{MetricKind, Suffix};

use crate::collector::{FamilySnapshot, Series};

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Debug, Default, Clone, Copy)]
pub struct ExpositionBuilder;

impl ExpositionBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, families: &[FamilySnapshot]) -> String {
        let mut out = String::new();
        for family in families {
            self.render_family(family, &mut out);
        }
        out
    }

    fn render_family(&self, family: &FamilySnapshot, out: &mut String) {
        let def = &family.definition;
        let name = def.name();
        let help = escape_help(def.help());
        let header_name = match def.kind() {
            MetricKind::Counter => format!("{name}_total"),
            _ => name.to_string(),
        };

        let _ = writeln!(out, "# HELP {header_name} {help}");
        let _ = writeln!(out, "# TYPE {header_name} {}", def.kind().as_str());

        for series in &family.series {
            for sample in &series.samples {
                let le = match sample.suffix {
                    Suffix::Bucket(le) => Some(le),
                    _ => None,
                };
                let _ = writeln!(
                    out,
                    "{name}{}{} {}",
                    sample.suffix.sample_suffix(),
                    label_str(series, le),
                    format_value(sample.value)
                );
            }
        }

        if family.series.iter().any(|s| s.created.is_some()) {
            let _ = writeln!(out, "# HELP {name}_created {help}");
            let _ = writeln!(out, "# TYPE {name}_created gauge");
            for series in &family.series {
                if let Some(ts) = series.created {
                    let _ = writeln!(out, "{name}_created{} {}", label_str(series, None), format_value(ts));
                }
            }
        }
    }
}

fn label_str(series: &Series, le: Option<f64>) -> String {
    let mut pairs: Vec<(&str, String)> = series
        .labels
        .iter()
        .map(|(k, v)| (k.as_str(), escape_label_value(v)))
        .collect();
    if let Some(le) = le {
        pairs.push(("le", format_value(le)));
    }
    if pairs.is_empty() {
        return String::new();
    }
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    let body = pairs
        .iter()
        .map(|(k, v)| format!("{k}=\"{v}\""))
        .collect::<Vec<_>>()
        .join(",");
    format!("{{{body}}}")
}
