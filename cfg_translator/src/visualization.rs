use std::io::{Error, ErrorKind, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use chartparse::Tree;
use itertools::Itertools;

struct Counter(usize);

impl Counter {
    fn peek(&self) -> usize {
        self.0
    }

    fn next(&mut self) -> usize {
        self.0 += 1;
        self.0
    }
}

struct Edge {
    color: String,
    from_id: usize,
    to_id: usize,
    style: Option<String>,
}

struct Node {
    id: usize,
    label: String,
    shape: &'static str,
    color: String,
}

fn prop_str(props: &[(&str, Option<&str>)]) -> String {
    props
        .iter()
        .filter_map(|(key, val)| val.map(|val| format!("{}=\"{}\"", key, escape(val))))
        .join(" ")
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

impl Edge {
    fn to_dot(&self) -> String {
        format!(
            "{} -> {} [{}]",
            self.from_id,
            self.to_id,
            prop_str(&[
                ("color", Some(self.color.as_str())),
                ("arrowhead", Some("none")),
                ("style", self.style.as_deref()),
            ])
        )
    }
}

impl Node {
    fn to_dot(&self) -> String {
        format!(
            "{} [{}]",
            self.id,
            prop_str(&[
                ("label", Some(self.label.as_str())),
                ("shape", Some(self.shape)),
                ("color", Some(self.color.as_str())),
                ("fontcolor", Some(self.color.as_str())),
            ])
        )
    }
}

enum Item {
    Node(Node),
    Edge(Edge),
}

fn tree_to_graph_helper(
    tree: &Tree,
    counter: &mut Counter,
    leaf_color: &str,
    items: &mut Vec<Item>,
) {
    let id = counter.peek();
    match tree {
        Tree::Leaf(word) => {
            items.push(Item::Node(Node {
                id,
                label: word.clone(),
                shape: "box",
                color: leaf_color.to_string(),
            }));
        }
        Tree::Branch(label, children) => {
            let color = tag_color(label);
            items.push(Item::Node(Node {
                id,
                label: label.clone(),
                shape: "none",
                color: color.to_string(),
            }));
            for child in children {
                let child_id = counter.next();
                let (style, edge_color) = match child {
                    Tree::Leaf(_) => (None, color),
                    Tree::Branch(child_label, _) => (
                        Some("bold".to_string()),
                        if color == tag_color(child_label) {
                            color
                        } else {
                            "#000000"
                        },
                    ),
                };
                items.push(Item::Edge(Edge {
                    color: edge_color.to_string(),
                    from_id: id,
                    to_id: child_id,
                    style,
                }));

                tree_to_graph_helper(child, counter, color, items);
            }
        }
    }
}

/// Renders `tree` as a Graphviz digraph. Nodes are colored by category family and leaves take
/// the color of their parent.
pub fn render_dot(tree: &Tree) -> String {
    let mut items = Vec::new();
    tree_to_graph_helper(tree, &mut Counter(0), "#000000", &mut items);
    let body = items
        .into_iter()
        .map(|item| match item {
            Item::Node(n) => n.to_dot(),
            Item::Edge(e) => e.to_dot(),
        })
        .join("\n");
    format!("digraph {{\n{}\n}}\n", body)
}

/// Writes the rendering of `tree` to `path`. A `.dot` path (or one without an extension) gets
/// the digraph source; any other extension is passed to `dot -T<ext>`.
pub fn write_rendering<P: AsRef<Path>>(tree: &Tree, path: P) -> std::io::Result<()> {
    let path = path.as_ref();
    let dot_str = render_dot(tree);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file_format = match path.extension().and_then(|ext| ext.to_str()) {
        None | Some("dot") | Some("gv") => return std::fs::write(path, dot_str),
        Some(ext) => ext,
    };

    let mut cmd = Command::new("dot")
        .arg(format!("-T{}", file_format))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    cmd.stdin
        .take()
        .ok_or_else(|| Error::new(ErrorKind::BrokenPipe, "dot stdin unavailable"))?
        .write_all(dot_str.as_bytes())?;
    let output = cmd.wait_with_output()?;
    if !output.status.success() {
        return Err(Error::new(
            ErrorKind::Other,
            format!(
                "dot exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }
    std::fs::write(path, output.stdout)
}

/// Color of a category's family: predicates, nominals, modifiers, relations, function words.
pub fn tag_color(label: &str) -> &'static str {
    match label {
        "VP" | "V" | "AUX" | "ASP" => "#FF8B3D",
        "ADV" | "ADVP" => "#ff9a57",
        "NP" | "N" | "PRON" | "PN" | "NAME" => "#00AA00",
        "ADJ" | "ADJP" => "#00dd00",
        "PP" | "P" | "PREP" | "CONJ" => "#E3242B",
        "DET" | "AY" | "LNK" | "PUNCT" => "#b0b0b0",
        _ => "#000000",
    }
}
