//! Positioned visual units: commits, merge commits, head tags, branch tags.
//!
//! A block combines a rectangle, a label and the connecting paths drawn from
//! its origins (a merge commit has two origins, a rootless first commit has
//! none). All variants share one struct with a [`BlockKind`] tag; the
//! per-variant construction and refresh rules live in [`crate::branch`] and
//! [`crate::graph`], which own the position math.

use serde::Serialize;

use crate::geometry::{diagonal_path, Metrics, Point, Side, CORNER_RADIUS, MAX_LABEL_LENGTH};
use crate::render::{BlockShape, LinkShape};

/// Style class marking a commit as unreachable from its branch tip.
pub const DETACHED_CLASS: &str = "detached";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Commit,
    Merge,
    Head,
    Branch,
}

impl BlockKind {
    pub fn as_class(self) -> &'static str {
        match self {
            BlockKind::Commit => "commit",
            BlockKind::Merge => "merge",
            BlockKind::Head => "head",
            BlockKind::Branch => "branch",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    /// Stable id, unique within the graph; the removal/redraw key derives
    /// from it.
    pub id: String,
    pub kind: BlockKind,
    /// Full label; truncation is applied only when the shape is generated.
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Ids of the blocks this one visually connects from.
    pub origins: Vec<String>,
    /// Which side of this block its links attach at.
    pub position: Side,
    /// Ordered style-class set; always starts with "block" and the kind.
    pub classes: Vec<String>,
    /// Whether this block has been drawn to the surface at least once.
    pub drawn: bool,
}

impl Block {
    pub fn new(
        id: String,
        kind: BlockKind,
        label: String,
        x: f64,
        y: f64,
        origins: Vec<String>,
        position: Side,
        metrics: &Metrics,
    ) -> Self {
        let classes = vec!["block".to_string(), kind.as_class().to_string()];
        Self {
            id,
            kind,
            label,
            x,
            y,
            width: metrics.block_width,
            height: metrics.block_height,
            origins,
            position,
            classes,
            drawn: false,
        }
    }

    /// The label as rendered: cut at [`MAX_LABEL_LENGTH`] characters with an
    /// ellipsis marker. Purely cosmetic, never used for lookups.
    pub fn display_label(&self) -> String {
        let mut chars = self.label.chars();
        let head: String = chars.by_ref().take(MAX_LABEL_LENGTH).collect();
        if chars.next().is_some() {
            format!("{head}…")
        } else {
            head
        }
    }

    /// Surface element id for this block.
    pub fn element_id(&self) -> String {
        format!("block-{}", sanitize_id(&self.id))
    }

    /// Per-block link class suffix, shared by all of this block's paths.
    pub fn link_selector(&self) -> String {
        format!("diagonal-{}", sanitize_id(&self.id))
    }

    pub fn shape(&self) -> BlockShape {
        BlockShape {
            id: self.element_id(),
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            corner_radius: CORNER_RADIUS,
            label: self.display_label(),
            classes: self.classes.clone(),
        }
    }

    /// One connecting path per origin, in this block's translated frame.
    ///
    /// The attachment offsets derive from this block's `position` side: a
    /// right-positioned block leaves its origin at the origin's right edge
    /// and arrives at its own left edge; top/bottom-positioned tags connect
    /// vertically through the block centers.
    pub fn link_shapes(&self, origin_points: &[Point]) -> Vec<LinkShape> {
        let selector = self.link_selector();
        origin_points
            .iter()
            .map(|origin| {
                let mut x_source = self.width / 2.0;
                let mut y_source = self.height / 2.0;
                match self.position {
                    Side::Right => x_source = self.width,
                    Side::Left => x_source = 0.0,
                    _ => {}
                }
                match self.position {
                    Side::Bottom => y_source = self.height,
                    Side::Top => y_source = 0.0,
                    _ => {}
                }

                let x_target = match self.position {
                    Side::Top | Side::Bottom => self.width / 2.0,
                    _ => 0.0,
                };
                let y_target = match self.position {
                    Side::Bottom => 0.0,
                    Side::Top => self.height,
                    _ => self.height / 2.0,
                };

                let source =
                    Point::new(origin.x + x_source - self.x, origin.y + y_source - self.y);
                let target = Point::new(x_target, y_target);
                LinkShape {
                    class: format!("link link-{} {}", self.kind.as_class(), selector),
                    source,
                    target,
                    path: diagonal_path(source, target),
                }
            })
            .collect()
    }

    /// Add a style class; the class set keeps insertion order and rejects
    /// duplicates.
    pub fn add_class(&mut self, class: &str) {
        if !self.classes.iter().any(|c| c == class) {
            self.classes.push(class.to_string());
        }
    }

    /// Mark this block as detached from its branch tip.
    pub fn detach(&mut self) {
        self.add_class(DETACHED_CLASS);
    }

    /// Invert [`Block::detach`].
    pub fn attach(&mut self) {
        self.classes.retain(|c| c != DETACHED_CLASS);
    }
}

/// Element ids must be selector-safe: path separators become dashes.
pub fn sanitize_id(id: &str) -> String {
    id.replace(['/', '\\'], "-")
}
