//! The rendering transport seam.
//!
//! The core never draws anything itself: it drives a [`Surface`], an abstract
//! retained scene keyed by element id. [`Scene`] is the bundled in-memory
//! implementation, used by the tests, the CLI, and the SVG generator. Real
//! hosts either implement [`Surface`] directly or replay a [`Scene`]
//! timeline.
//!
//! Ordering contract: every animated mutation appends to an ordered timeline.
//! A host that replays timeline entries sequentially (waiting for each
//! transition's duration) preserves the sequencing the graph relies on — in
//! particular a step's block changes never start before the step's legend
//! transition has finished.

use indexmap::IndexMap;
use serde::Serialize;

use crate::geometry::{Point, BLOCK_TRANSITION_MS};
use crate::text::TextPhase;

/// Dimensions and identity of the rendering surface, fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceConfig {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub view_box: String,
    /// Global translation applied to all coordinates (the outer padding).
    pub offset: Point,
}

/// A positioned rectangle-plus-label visual, one per block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockShape {
    /// Element id, also the removal/redraw key.
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub corner_radius: f64,
    /// Display label, already truncated.
    pub label: String,
    pub classes: Vec<String>,
}

/// One connecting path from a block to one of its origins.
///
/// `source` and `target` are expressed relative to the owning block's
/// translated frame, so a host can nest the path inside the block group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkShape {
    pub class: String,
    pub source: Point,
    pub target: Point,
    /// SVG path data for the connecting curve.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextShape {
    pub id: String,
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// An animated change appended to the scene timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    /// Element appeared (fade from transparent).
    FadeIn { id: String, duration_ms: u32 },
    /// Element translated to a new position.
    Move {
        id: String,
        x: f64,
        y: f64,
        duration_ms: u32,
    },
    /// Text content replaced through its phase sequence.
    Text { id: String, phases: Vec<TextPhase> },
}

/// The drawing operations the graph core needs from a renderer.
///
/// Implementations must treat [`Surface::insert_block`] as replace-by-id:
/// drawing the same id twice yields one element, never duplicates.
pub trait Surface {
    fn configure(&mut self, config: SurfaceConfig);
    fn insert_block(&mut self, shape: BlockShape);
    /// Replace the link set attached to `owner`.
    fn set_links(&mut self, owner: &str, links: Vec<LinkShape>);
    fn remove_links(&mut self, owner: &str);
    fn remove_element(&mut self, id: &str);
    fn move_element(&mut self, id: &str, x: f64, y: f64);
    fn set_classes(&mut self, id: &str, classes: Vec<String>);
    fn has_text(&self, id: &str) -> bool;
    fn insert_text(&mut self, shape: TextShape);
    fn animate_text(&mut self, id: &str, text: String, phases: Vec<TextPhase>);
    fn clear(&mut self);
}

/// Retained in-memory scene.
///
/// Element maps preserve insertion order, which doubles as paint order when
/// the scene is rendered to SVG.
#[derive(Debug, Default, Serialize)]
pub struct Scene {
    pub config: Option<SurfaceConfig>,
    pub blocks: IndexMap<String, BlockShape>,
    /// Links keyed by the owning block's element id.
    pub links: IndexMap<String, Vec<LinkShape>>,
    pub texts: IndexMap<String, TextShape>,
    pub timeline: Vec<Transition>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Surface for Scene {
    fn configure(&mut self, config: SurfaceConfig) {
        self.config = Some(config);
    }

    fn insert_block(&mut self, shape: BlockShape) {
        // Re-inserting moves the element to the end of the paint order,
        // matching a remove-and-append on a real canvas.
        self.blocks.shift_remove(&shape.id);
        self.timeline.push(Transition::FadeIn {
            id: shape.id.clone(),
            duration_ms: BLOCK_TRANSITION_MS,
        });
        self.blocks.insert(shape.id.clone(), shape);
    }

    fn set_links(&mut self, owner: &str, links: Vec<LinkShape>) {
        self.links.insert(owner.to_string(), links);
    }

    fn remove_links(&mut self, owner: &str) {
        self.links.shift_remove(owner);
    }

    fn remove_element(&mut self, id: &str) {
        self.blocks.shift_remove(id);
        self.texts.shift_remove(id);
    }

    fn move_element(&mut self, id: &str, x: f64, y: f64) {
        if let Some(block) = self.blocks.get_mut(id) {
            block.x = x;
            block.y = y;
            self.timeline.push(Transition::Move {
                id: id.to_string(),
                x,
                y,
                duration_ms: BLOCK_TRANSITION_MS,
            });
        }
    }

    fn set_classes(&mut self, id: &str, classes: Vec<String>) {
        if let Some(block) = self.blocks.get_mut(id) {
            block.classes = classes;
        }
    }

    fn has_text(&self, id: &str) -> bool {
        self.texts.contains_key(id)
    }

    fn insert_text(&mut self, shape: TextShape) {
        self.texts.insert(shape.id.clone(), shape);
    }

    fn animate_text(&mut self, id: &str, text: String, phases: Vec<TextPhase>) {
        if let Some(shape) = self.texts.get_mut(id) {
            shape.text = text;
            if let Some(y) = phases.iter().rev().find_map(|p| p.target_y) {
                shape.y = y;
            }
        }
        self.timeline.push(Transition::Text {
            id: id.to_string(),
            phases,
        });
    }

    fn clear(&mut self) {
        self.blocks.clear();
        self.links.clear();
        self.texts.clear();
        self.timeline.clear();
    }
}
