//! Generate static SVG text from a rendered [`Scene`].
//!
//! The output is a snapshot of the scene's retained state: one group per
//! block (rounded rectangle, nested link paths, centered label) plus the
//! legend/comment text rows, inside a padded outer group. Timeline entries
//! are not replayed; the snapshot shows the scene as it stands.

use crate::geometry::{BLOCK_HEIGHT, PADDING};
use crate::render::{BlockShape, LinkShape, Scene, TextShape};

/// Generate the SVG text for a scene snapshot.
pub fn render_svg(scene: &Scene) -> String {
    let mut out = String::with_capacity(4096);
    let (id, width, height, view_box, offset_x, offset_y) = match &scene.config {
        Some(config) => (
            config.id.as_str(),
            config.width,
            config.height,
            config.view_box.clone(),
            config.offset.x,
            config.offset.y,
        ),
        None => ("graph", 0.0, 0.0, "0 0 0 0".to_string(), PADDING, PADDING),
    };
    out.push_str(&format!(
        "<svg id=\"{}\" width=\"{}\" height=\"{}\" viewBox=\"{}\" \
         preserveAspectRatio=\"xMidYMid meet\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        xml_escape_attr(id),
        width,
        height,
        xml_escape_attr(&view_box)
    ));
    out.push_str(&format!("  <g transform=\"translate({offset_x},{offset_y})\">\n"));

    for text in scene.texts.values() {
        write_text(&mut out, text, 2);
    }
    for block in scene.blocks.values() {
        let links = scene.links.get(&block.id).map(Vec::as_slice).unwrap_or(&[]);
        write_block(&mut out, block, links, 2);
    }

    out.push_str("  </g>\n");
    out.push_str("</svg>\n");
    out
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

/// Escape text content for XML.
fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape an attribute value for XML. Like [`xml_escape`] but also encodes
/// newlines and carriage returns.
fn xml_escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
    out
}

fn write_block(out: &mut String, block: &BlockShape, links: &[LinkShape], level: usize) {
    indent(out, level);
    out.push_str(&format!(
        "<g id=\"{}\" class=\"{}\" transform=\"translate({},{})\">\n",
        xml_escape_attr(&block.id),
        xml_escape_attr(&block.classes.join(" ")),
        block.x,
        block.y
    ));
    // Links first so the rectangle paints over the path ends.
    for link in links {
        write_link(out, link, level + 1);
    }
    indent(out, level + 1);
    out.push_str(&format!(
        "<rect width=\"{}\" height=\"{}\" rx=\"{}\" ry=\"{}\"/>\n",
        block.width, block.height, block.corner_radius, block.corner_radius
    ));
    indent(out, level + 1);
    out.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\">{}</text>\n",
        block.width / 2.0,
        block.height - 20.0,
        xml_escape(&block.label)
    ));
    indent(out, level);
    out.push_str("</g>\n");
}

fn write_link(out: &mut String, link: &LinkShape, level: usize) {
    indent(out, level);
    out.push_str(&format!(
        "<path class=\"{}\" d=\"{}\"/>\n",
        xml_escape_attr(&link.class),
        xml_escape_attr(&link.path)
    ));
}

fn write_text(out: &mut String, text: &TextShape, level: usize) {
    indent(out, level);
    out.push_str(&format!(
        "<text id=\"{}\" x=\"{}\" y=\"{}\">{}</text>\n",
        xml_escape_attr(&text.id),
        text.x,
        text.y + BLOCK_HEIGHT / 2.0,
        xml_escape(&text.text)
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::render::{Surface, SurfaceConfig};

    fn scene() -> Scene {
        let mut scene = Scene::new();
        scene.configure(SurfaceConfig {
            id: "slide-graph".into(),
            width: 960.0,
            height: 540.0,
            view_box: "0 0 1228.8 600".into(),
            offset: Point::new(PADDING, PADDING),
        });
        scene
    }

    #[test]
    fn emits_outer_svg_and_padded_group() {
        let svg = render_svg(&scene());
        assert!(svg.starts_with("<svg id=\"slide-graph\" width=\"960\" height=\"540\""));
        assert!(svg.contains("viewBox=\"0 0 1228.8 600\""));
        assert!(svg.contains("preserveAspectRatio=\"xMidYMid meet\""));
        assert!(svg.contains("<g transform=\"translate(20,20)\">"));
    }

    #[test]
    fn block_groups_nest_links_under_the_block() {
        let mut scene = scene();
        scene.insert_block(BlockShape {
            id: "block-master-0".into(),
            x: 130.0,
            y: 0.0,
            width: 90.0,
            height: 50.0,
            corner_radius: 15.0,
            label: "c2".into(),
            classes: vec!["block".into(), "commit".into()],
        });
        scene.set_links(
            "block-master-0",
            vec![LinkShape {
                class: "link link-commit diagonal-master-0".into(),
                source: Point::new(-40.0, 25.0),
                target: Point::new(0.0, 25.0),
                path: "M-40,25C-20,25 -20,25 0,25".into(),
            }],
        );
        let svg = render_svg(&scene);
        let group = svg.find("<g id=\"block-master-0\"").unwrap();
        let path = svg.find("<path class=\"link link-commit diagonal-master-0\"").unwrap();
        let rect = svg.find("<rect width=\"90\" height=\"50\" rx=\"15\" ry=\"15\"/>").unwrap();
        assert!(group < path && path < rect);
        assert!(svg.contains("<text x=\"45\" y=\"30\" text-anchor=\"middle\">c2</text>"));
    }

    #[test]
    fn escapes_markup_in_labels() {
        let mut scene = scene();
        scene.insert_block(BlockShape {
            id: "block-x".into(),
            x: 0.0,
            y: 0.0,
            width: 90.0,
            height: 50.0,
            corner_radius: 15.0,
            label: "a<b&c".into(),
            classes: vec!["block".into()],
        });
        let svg = render_svg(&scene);
        assert!(svg.contains(">a&lt;b&amp;c</text>"));
    }
}
