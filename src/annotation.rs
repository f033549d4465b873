//! Annotation sources and the per-node annotation map.
//!
//! Each supported tool output is read by its own table dialect; all of them
//! produce the same [`RawAnnotations`], which is then resolved against the
//! graph's node names into an [`AnnotationMap`].

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::graph::Graph;

/// Display text for nodes without an annotation.
pub const UNANNOTATED: &str = "unannotated";

/// Supported annotation tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationFormat {
    /// KofamScan results reduced to `Hit_Id` / `Gene` columns.
    Kofam,
    /// eggNOG-mapper `.annotations` output.
    Eggnog,
    /// User supplied tab-separated table with `Hit_Id` / `Gene` columns.
    Tabular,
}

struct Dialect {
    comment_prefix: Option<&'static str>,
    header_may_start_with_hash: bool,
    key_column: &'static str,
    label_column: &'static str,
    missing_label: Option<&'static str>,
}

impl AnnotationFormat {
    /// Folder name used for this source's frames.
    pub fn folder_name(self) -> &'static str {
        match self {
            AnnotationFormat::Kofam => "KOFAM",
            AnnotationFormat::Eggnog => "EGGNOG",
            AnnotationFormat::Tabular => "ANNOTATION",
        }
    }

    fn dialect(self) -> Dialect {
        match self {
            AnnotationFormat::Kofam => Dialect {
                comment_prefix: None,
                header_may_start_with_hash: false,
                key_column: "Hit_Id",
                label_column: "Gene",
                missing_label: None,
            },
            AnnotationFormat::Eggnog => Dialect {
                comment_prefix: Some("##"),
                header_may_start_with_hash: true,
                key_column: "query",
                label_column: "Preferred_name",
                missing_label: Some("-"),
            },
            AnnotationFormat::Tabular => Dialect {
                comment_prefix: Some("#"),
                header_may_start_with_hash: false,
                key_column: "Hit_Id",
                label_column: "Gene",
                missing_label: None,
            },
        }
    }

    /// Read an annotation table from `path`.
    pub fn load(self, path: &Path) -> Result<RawAnnotations> {
        info!("Loading {} annotations from {:?}...", self.folder_name(), path);
        let file = File::open(path).map_err(|e| Error::load(path, e.to_string()))?;
        let raw = self.parse(BufReader::new(file), path)?;
        info!("Found {} annotated identifiers", raw.len());
        Ok(raw)
    }

    /// Parse an annotation table. `path` is only used in errors.
    pub fn parse<R: BufRead>(self, input: R, path: &Path) -> Result<RawAnnotations> {
        let dialect = self.dialect();
        let mut columns: Option<(usize, usize)> = None;
        let mut raw = RawAnnotations::default();

        for (line_no, line) in input.lines().enumerate() {
            let line = line.map_err(|e| Error::load(path, e.to_string()))?;
            let line = line.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }
            if let Some(prefix) = dialect.comment_prefix {
                if line.starts_with(prefix) {
                    continue;
                }
            }

            let Some((key_idx, label_idx)) = columns else {
                let header = if dialect.header_may_start_with_hash {
                    line.strip_prefix('#').unwrap_or(line)
                } else {
                    line
                };
                columns = Some(locate_columns(header, &dialect, path)?);
                continue;
            };

            let fields: Vec<&str> = line.split('\t').collect();
            let (Some(key), Some(label)) = (fields.get(key_idx), fields.get(label_idx)) else {
                return Err(Error::load(
                    path,
                    format!("line {}: expected at least {} columns", line_no + 1, key_idx.max(label_idx) + 1),
                ));
            };
            let (key, label) = (key.trim(), label.trim());
            if key.is_empty() || label.is_empty() || Some(label) == dialect.missing_label {
                continue;
            }
            raw.insert(key, label);
        }

        if columns.is_none() {
            return Err(Error::load(path, "annotation table has no header"));
        }
        Ok(raw)
    }
}

fn locate_columns(header: &str, dialect: &Dialect, path: &Path) -> Result<(usize, usize)> {
    let names: Vec<&str> = header.split('\t').map(str::trim).collect();
    let find = |wanted: &str| {
        names
            .iter()
            .position(|n| *n == wanted)
            .ok_or_else(|| Error::load(path, format!("missing column {wanted:?} in header")))
    };
    Ok((find(dialect.key_column)?, find(dialect.label_column)?))
}

/// Identifier → label pairs as read from a source, before being matched to
/// graph nodes. Later rows overwrite earlier rows for the same identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAnnotations {
    entries: FxHashMap<String, String>,
}

impl RawAnnotations {
    pub fn insert(&mut self, key: impl Into<String>, label: impl Into<String>) {
        self.entries.insert(key.into(), label.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawAnnotations {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut raw = RawAnnotations::default();
        for (k, v) in iter {
            raw.insert(k, v);
        }
        raw
    }
}

/// One annotation slot per graph node, indexed like [`Graph::nodes`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationMap {
    labels: Vec<Option<String>>,
}

impl AnnotationMap {
    /// Match raw annotations to nodes by node name. Nodes without an entry,
    /// or whose label is the [`UNANNOTATED`] text itself, stay unannotated.
    pub fn resolve(graph: &Graph, raw: &RawAnnotations) -> Self {
        let labels: Vec<Option<String>> = graph
            .nodes()
            .iter()
            .map(|node| {
                raw.get(&node.name)
                    .filter(|label| *label != UNANNOTATED)
                    .map(str::to_string)
            })
            .collect();
        let annotated = labels.iter().filter(|l| l.is_some()).count();
        debug!(
            "{} of {} nodes annotated",
            annotated,
            labels.len()
        );
        AnnotationMap { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Annotation of node `idx`, `None` if unannotated or out of range.
    pub fn label(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).and_then(|l| l.as_deref())
    }

    pub fn display_label(&self, idx: usize) -> &str {
        self.label(idx).unwrap_or(UNANNOTATED)
    }

    /// Sorted distinct annotation values, sentinel excluded.
    pub fn distinct_labels(&self) -> BTreeSet<&str> {
        self.labels.iter().filter_map(|l| l.as_deref()).collect()
    }

    pub fn has_unannotated(&self) -> bool {
        self.labels.iter().any(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn parse(format: AnnotationFormat, text: &str) -> Result<RawAnnotations> {
        format.parse(text.as_bytes(), Path::new("annot.tsv"))
    }

    #[test]
    fn tabular_skips_comments_and_keeps_last_row() {
        let raw = parse(
            AnnotationFormat::Tabular,
            "# my table\nHit_Id\tGene\nWP_1\tgeneX\nWP_2\tgeneY\nWP_1\tgeneZ\n",
        )
        .unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.get("WP_1"), Some("geneZ"));
    }

    #[test]
    fn kofam_columns_found_by_name() {
        let raw = parse(
            AnnotationFormat::Kofam,
            "KO\tHit_Id\tscore\tGene\nK00001\tWP_1\t120.3\tadh\n",
        )
        .unwrap();
        assert_eq!(raw.get("WP_1"), Some("adh"));
    }

    #[test]
    fn eggnog_header_and_dash_names() {
        let text = "## emapper-2.1.9\n## command: emapper.py\n\
                    #query\tseed_ortholog\tevalue\tPreferred_name\n\
                    WP_1\t123.X\t1e-50\tdnaK\n\
                    WP_2\t456.Y\t1e-20\t-\n\
                    ## 2 queries scanned\n";
        let raw = parse(AnnotationFormat::Eggnog, text).unwrap();
        assert_eq!(raw.get("WP_1"), Some("dnaK"));
        assert_eq!(raw.get("WP_2"), None);
    }

    #[test]
    fn missing_column_is_a_load_error() {
        let err = parse(AnnotationFormat::Tabular, "id\tGene\nWP_1\tx\n").unwrap_err();
        assert!(err.to_string().contains("Hit_Id"));
    }

    #[test]
    fn short_row_is_a_load_error() {
        assert!(parse(AnnotationFormat::Tabular, "Hit_Id\tGene\nWP_1\n").is_err());
    }

    #[test]
    fn literal_unannotated_row_leaves_node_unannotated() {
        let mut b = GraphBuilder::new();
        b.add_node("1", "A");
        b.add_node("2", "B");
        let g = b.build();
        let raw = parse(
            AnnotationFormat::Tabular,
            "Hit_Id\tGene\nA\tunannotated\nB\tgeneX\nB\tunannotated\n",
        )
        .unwrap();
        let map = AnnotationMap::resolve(&g, &raw);
        assert_eq!(map.label(0), None);
        assert_eq!(map.label(1), None);
        assert!(map.distinct_labels().is_empty());
        assert_eq!(map.display_label(0), UNANNOTATED);
    }

    #[test]
    fn resolve_is_total_over_nodes() {
        let mut b = GraphBuilder::new();
        b.add_node("1", "A");
        b.add_node("2", "B");
        b.add_node("3", "C");
        let g = b.build();
        let raw: RawAnnotations = [("A", "geneX"), ("B", "geneX"), ("Z", "other")]
            .into_iter()
            .collect();
        let map = AnnotationMap::resolve(&g, &raw);
        assert_eq!(map.len(), 3);
        assert_eq!(map.display_label(2), UNANNOTATED);
        assert!(map.has_unannotated());
        assert_eq!(map.distinct_labels().into_iter().collect::<Vec<_>>(), ["geneX"]);
    }
}
