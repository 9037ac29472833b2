use anyhow::{Context, Result};
use roxmltree::{Document, Node};

/// Visible text of an SVG drawing, one `<text>` element per line.
pub fn svg_text(bytes: &[u8]) -> Result<String> {
    let xml = std::str::from_utf8(bytes).context("SVG is not UTF-8")?;
    let doc = Document::parse(xml).context("parse SVG XML")?;

    let svg = doc
        .descendants()
        .find(|n| n.has_tag_name("svg"))
        .context("no <svg> root element")?;

    let mut lines = Vec::new();
    walk(svg, &mut lines);
    Ok(lines.join("\n"))
}

fn walk(node: Node<'_, '_>, lines: &mut Vec<String>) {
    if node.is_element() && node.tag_name().name() == "text" {
        // <tspan> runs inside one <text> belong to the same label.
        let value = collect_text(node);
        let value = value.trim();
        if !value.is_empty() {
            lines.push(value.to_string());
        }
        return;
    }
    for c in node.children() {
        walk(c, lines);
    }
}

fn collect_text(node: Node<'_, '_>) -> String {
    let mut out = String::new();
    for d in node.descendants().filter(|d| d.is_text()) {
        if let Some(t) = d.text() {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
            out.push_str(t.trim());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_text_and_tspans() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
            <line x1="0" y1="0" x2="10" y2="0"/>
            <g><text x="1" y="2">W 420</text></g>
            <text x="1" y="9"><tspan>D</tspan><tspan>310</tspan></text>
            <text x="1" y="9">   </text>
        </svg>"#;
        let text = svg_text(svg).unwrap();
        assert_eq!("W 420\nD 310", text);
    }

    #[test]
    fn rejects_non_svg_xml() {
        assert!(svg_text(b"<html></html>").is_err());
        assert!(svg_text(b"not xml at all <").is_err());
    }
}
