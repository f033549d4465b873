//! Loader for XGMML networks as exported by EFI-EST.
//!
//! Only what the sweep needs is kept: node identifiers, the hit name found
//! in the node's `Description` attribute, and each edge's
//! `alignment_score`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::graph::{Graph, GraphBuilder};

const SCORE_ATTRIBUTE: &str = "alignment_score";
const DESCRIPTION_ATTRIBUTE: &str = "Description";

#[derive(Debug, Default)]
struct PendingNode {
    id: Option<String>,
    label: Option<String>,
    description: Option<String>,
    /// Number of currently open `<att>` elements inside the node.
    att_depth: usize,
    /// Depth at which the `Description` list was opened.
    description_list: Option<usize>,
}

#[derive(Debug, Default)]
struct PendingEdge {
    source: Option<String>,
    target: Option<String>,
    score: Option<String>,
}

#[derive(Debug)]
enum Scope {
    Outside,
    Node(PendingNode),
    Edge(PendingEdge),
}

/// Attributes of interest on a single XML element.
#[derive(Debug, Default)]
struct Attrs {
    id: Option<String>,
    label: Option<String>,
    name: Option<String>,
    value: Option<String>,
    source: Option<String>,
    target: Option<String>,
}

fn read_attrs(e: &BytesStart<'_>) -> std::result::Result<Attrs, quick_xml::Error> {
    let mut attrs = Attrs::default();
    for attr in e.attributes() {
        let attr = attr?;
        let slot = match attr.key.local_name().as_ref() {
            b"id" => &mut attrs.id,
            b"label" => &mut attrs.label,
            b"name" => &mut attrs.name,
            b"value" => &mut attrs.value,
            b"source" => &mut attrs.source,
            b"target" => &mut attrs.target,
            _ => continue,
        };
        *slot = Some(attr.unescape_value()?.into_owned());
    }
    Ok(attrs)
}

/// Load an XGMML network from `path`.
pub fn load_xgmml(path: &Path) -> Result<Graph> {
    info!("Loading XGMML network {:?}...", path);
    let file = File::open(path).map_err(|e| Error::load(path, e.to_string()))?;
    let graph = parse_xgmml(BufReader::new(file), path)?;
    info!(
        "Found {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Parse XGMML from any buffered reader. `path` is only used in errors.
pub fn parse_xgmml<R: BufRead>(input: R, path: &Path) -> Result<Graph> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);

    let xml_err = |source: quick_xml::Error| Error::Xml {
        path: path.to_path_buf(),
        source,
    };

    let mut builder = GraphBuilder::new();
    let mut pending_edges: Vec<PendingEdge> = Vec::new();
    let mut scope = Scope::Outside;
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(xml_err)?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let attrs = read_attrs(e).map_err(xml_err)?;
                match e.local_name().as_ref() {
                    b"node" => {
                        let node = PendingNode {
                            id: attrs.id,
                            label: attrs.label,
                            ..PendingNode::default()
                        };
                        if is_empty {
                            finish_node(&mut builder, node, path)?;
                        } else {
                            scope = Scope::Node(node);
                        }
                    }
                    b"edge" => {
                        let edge = PendingEdge {
                            source: attrs.source,
                            target: attrs.target,
                            score: None,
                        };
                        if is_empty {
                            pending_edges.push(edge);
                        } else {
                            scope = Scope::Edge(edge);
                        }
                    }
                    b"att" => apply_att(&mut scope, attrs, is_empty),
                    _ => {}
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"node" => {
                    if let Scope::Node(node) = std::mem::replace(&mut scope, Scope::Outside) {
                        finish_node(&mut builder, node, path)?;
                    }
                }
                b"edge" => {
                    if let Scope::Edge(edge) = std::mem::replace(&mut scope, Scope::Outside) {
                        pending_edges.push(edge);
                    }
                }
                b"att" => {
                    if let Scope::Node(node) = &mut scope {
                        if node.description_list == Some(node.att_depth) {
                            node.description_list = None;
                        }
                        node.att_depth = node.att_depth.saturating_sub(1);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    debug!("Resolving {} edge elements", pending_edges.len());
    for edge in pending_edges {
        finish_edge(&mut builder, edge, path)?;
    }

    Ok(builder.build())
}

fn apply_att(scope: &mut Scope, attrs: Attrs, is_empty: bool) {
    match scope {
        Scope::Node(node) => {
            if !is_empty {
                node.att_depth += 1;
            }
            if node.description_list.is_some() {
                if node.description.is_none() {
                    node.description = attrs.value;
                }
            } else if attrs.name.as_deref() == Some(DESCRIPTION_ATTRIBUTE) {
                match attrs.value {
                    Some(value) => {
                        if node.description.is_none() {
                            node.description = Some(value);
                        }
                    }
                    None if !is_empty => node.description_list = Some(node.att_depth),
                    None => {}
                }
            }
        }
        Scope::Edge(edge) => {
            if attrs.name.as_deref() == Some(SCORE_ATTRIBUTE) {
                edge.score = attrs.value;
            }
        }
        Scope::Outside => {}
    }
}

fn finish_node(builder: &mut GraphBuilder, node: PendingNode, path: &Path) -> Result<()> {
    let id = node
        .id
        .ok_or_else(|| Error::load(path, "node element without an id"))?;
    let name = node
        .description
        .as_deref()
        .and_then(|d| d.split_whitespace().next())
        .map(str::to_string)
        .or(node.label)
        .unwrap_or_else(|| id.clone());
    builder.add_node(id, name);
    Ok(())
}

fn finish_edge(builder: &mut GraphBuilder, edge: PendingEdge, path: &Path) -> Result<()> {
    let (source, target) = match (edge.source, edge.target) {
        (Some(s), Some(t)) => (s, t),
        _ => return Err(Error::load(path, "edge element without source or target")),
    };
    let endpoint = |id: &str| {
        builder
            .node_index(id)
            .ok_or_else(|| Error::load(path, format!("edge references unknown node {id:?}")))
    };
    let a = endpoint(&source)?;
    let b = endpoint(&target)?;

    let raw = edge.score.ok_or_else(|| {
        Error::load(
            path,
            format!("edge {source}-{target} has no {SCORE_ATTRIBUTE} attribute"),
        )
    })?;
    let score = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite())
        .ok_or_else(|| {
            Error::load(
                path,
                format!("edge {source}-{target} has invalid {SCORE_ATTRIBUTE} {raw:?}"),
            )
        })?;
    builder.add_edge(a, b, score);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Result<Graph> {
        parse_xgmml(xml.as_bytes(), Path::new("test.xgmml"))
    }

    const NETWORK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<graph label="demo" xmlns="http://www.cs.rpi.edu/XGMML">
  <node id="n1" label="A0A001">
    <att name="Description" type="list">
      <att type="string" name="Description" value="WP_0001 putative hydrolase"/>
      <att type="string" name="Description" value="WP_0009 other"/>
    </att>
  </node>
  <node id="n2" label="A0A002">
    <att name="Description" type="string" value="WP_0002 kinase"/>
  </node>
  <node id="n3" label="A0A003"/>
  <edge id="e1" label="n1,n2" source="n1" target="n2">
    <att name="%id" type="real" value="41.2"/>
    <att name="alignment_score" type="real" value="50"/>
  </edge>
  <edge id="e2" label="n2,n3" source="n2" target="n3">
    <att name="alignment_score" type="real" value="80"/>
  </edge>
  <edge id="e3" label="n2,n1" source="n2" target="n1">
    <att name="alignment_score" type="real" value="47"/>
  </edge>
</graph>
"#;

    #[test]
    fn reads_names_and_scores() {
        let g = parse(NETWORK).unwrap();
        let names: Vec<&str> = g.nodes().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["WP_0001", "WP_0002", "A0A003"]);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.edges()[0].score, 50.0);
        assert_eq!((g.edges()[1].a, g.edges()[1].b), (1, 2));
        assert_eq!(g.edges()[1].score, 80.0);
    }

    #[test]
    fn description_list_with_closing_tags_keeps_first_value() {
        let xml = r#"<graph>
          <node id="n1" label="L1">
            <att name="Description" type="list">
              <att type="string" name="Description" value="FIRST x"></att>
              <att type="string" name="Description" value="SECOND y"></att>
            </att>
            <att name="Description" type="string" value="THIRD z"/>
          </node>
        </graph>"#;
        let g = parse(xml).unwrap();
        assert_eq!(g.nodes()[0].name, "FIRST");
    }

    #[test]
    fn edge_without_score_is_a_load_error() {
        let xml = r#"<graph><node id="a"/><node id="b"/><edge source="a" target="b"/></graph>"#;
        assert!(matches!(parse(xml), Err(Error::Load { .. })));
    }

    #[test]
    fn dangling_edge_is_a_load_error() {
        let xml = r#"<graph><node id="a"/>
            <edge source="a" target="zz"><att name="alignment_score" value="3"/></edge></graph>"#;
        let err = parse(xml).unwrap_err();
        assert!(err.to_string().contains("zz"));
    }

    #[test]
    fn non_numeric_score_is_rejected() {
        let xml = r#"<graph><node id="a"/><node id="b"/>
            <edge source="a" target="b"><att name="alignment_score" value="NaN"/></edge></graph>"#;
        assert!(matches!(parse(xml), Err(Error::Load { .. })));
    }

    #[test]
    fn malformed_xml_is_reported() {
        assert!(matches!(
            parse("<graph><node id=\"a\"></edge></graph>"),
            Err(Error::Xml { .. })
        ));
    }

    #[test]
    fn edges_may_precede_nodes() {
        let xml = r#"<graph>
            <edge source="a" target="b"><att name="alignment_score" value="9"/></edge>
            <node id="a"/><node id="b"/></graph>"#;
        assert_eq!(parse(xml).unwrap().edge_count(), 1);
    }
}
