//! Simple inspector for Marshal 4.8 files.

use std::fs;

use marshal48::{decode, Graph, Namespace, Reference, Vertex};

fn render(graph: &Graph, reference: Reference, depth: usize) -> String {
    if depth > 2 {
        return format!("{reference}");
    }
    let Some(vertex) = graph.get(reference) else {
        return format!("{reference} <unresolved>");
    };
    match vertex {
        Vertex::Nil => "nil".to_string(),
        Vertex::True => "true".to_string(),
        Vertex::False => "false".to_string(),
        Vertex::Fixnum(n) => format!("{n}"),
        Vertex::Float(f) => format!("{f}"),
        Vertex::Symbol(bytes) => format!(":{}", String::from_utf8_lossy(bytes)),
        Vertex::Str { bytes, .. } => {
            let text = String::from_utf8_lossy(bytes);
            let preview: String = text.chars().take(60).collect();
            if text.len() > 60 {
                format!("\"{preview}...\"")
            } else {
                format!("\"{preview}\"")
            }
        }
        Vertex::Bignum { negative, magnitude } => {
            format!("BIGNUM(sign={}, {} bytes)", if *negative { "-" } else { "+" }, magnitude.len())
        }
        Vertex::Regex { source, .. } => format!("/{}/", String::from_utf8_lossy(source)),
        Vertex::ClassName(name) => format!("CLASS({})", String::from_utf8_lossy(name)),
        Vertex::ModuleName(name) => format!("MODULE({})", String::from_utf8_lossy(name)),
        Vertex::ClassOrModuleName(name) => {
            format!("CLASS_OR_MODULE({})", String::from_utf8_lossy(name))
        }
        Vertex::Array { elements, .. } => {
            let inner: Vec<String> = elements
                .iter()
                .take(8)
                .map(|&e| render(graph, e, depth + 1))
                .collect();
            let ellipsis = if elements.len() > 8 { ", ..." } else { "" };
            format!("[{}{}]", inner.join(", "), ellipsis)
        }
        Vertex::Hash { pairs, default, .. } => {
            let inner: Vec<String> = pairs
                .iter()
                .take(8)
                .map(|&(k, v)| {
                    format!(
                        "{} => {}",
                        render(graph, k, depth + 1),
                        render(graph, v, depth + 1)
                    )
                })
                .collect();
            let tail = if default.is_some() { " (with default)" } else { "" };
            format!("{{{}}}{}", inner.join(", "), tail)
        }
        Vertex::Object { class, ext } => format!(
            "#<{} {} ivar(s)>",
            render(graph, *class, depth + 1),
            ext.ivars.len()
        ),
        Vertex::Struct { name, members, .. } => format!(
            "STRUCT({}, {} member(s))",
            render(graph, *name, depth + 1),
            members.len()
        ),
        Vertex::Subclassed { class, inner, .. } => format!(
            "SUBCLASSED({}, {})",
            render(graph, *class, depth + 1),
            render(graph, *inner, depth + 1)
        ),
        Vertex::DataObject { class, .. } => {
            format!("DATA({})", render(graph, *class, depth + 1))
        }
        Vertex::UserMarshal { class, inner, .. } => format!(
            "USER_MARSHAL({}, {})",
            render(graph, *class, depth + 1),
            render(graph, *inner, depth + 1)
        ),
        Vertex::UserDefined { class, payload, .. } => format!(
            "USER_DEFINED({}, {} byte(s))",
            render(graph, *class, depth + 1),
            payload.len()
        ),
    }
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .expect("usage: inspect <file.marshal>");

    println!("Reading: {path}");
    let data = fs::read(&path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());

    let (graph, root) = decode(&data).expect("Failed to decode");

    println!("\n=== Graph ===");
    println!("Values:  {}", graph.len(Namespace::Value));
    println!("Symbols: {}", graph.len(Namespace::Symbol));
    println!("Objects: {}", graph.len(Namespace::Object));

    println!("\n=== Root ({root}) ===");
    println!("{}", render(&graph, root, 0));
}
