//! Layout constants and shared geometry for the graph plane.
//!
//! All coordinates are absolute positions in the rendering plane, measured in
//! the same units as the SVG user space. Blocks are uniform rectangles of
//! [`BLOCK_WIDTH`] × [`BLOCK_HEIGHT`]; the gaps between them are fixed.

use serde::{Deserialize, Serialize};

pub const X_GAP: f64 = 40.0;
pub const Y_GAP: f64 = 30.0;
pub const BLOCK_WIDTH: f64 = 90.0;
pub const BLOCK_HEIGHT: f64 = 50.0;
pub const TEXT_HEIGHT: f64 = 30.0;
pub const PADDING: f64 = 20.0;
pub const MIN_WIDTH: f64 = 960.0;
pub const CORNER_RADIUS: f64 = 15.0;

/// Labels longer than this are cut and suffixed with an ellipsis when drawn.
pub const MAX_LABEL_LENGTH: usize = 12;

/// Duration of block appearance/move transitions, in milliseconds.
pub const BLOCK_TRANSITION_MS: u32 = 1000;
/// Duration of one legend/comment text transition phase, in milliseconds.
pub const TEXT_TRANSITION_MS: u32 = 500;

/// Which side of a block other elements attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

/// Default row used when placing a branch's tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagPosition {
    Top,
    Bottom,
}

impl Default for TagPosition {
    fn default() -> Self {
        TagPosition::Bottom
    }
}

impl From<TagPosition> for Side {
    fn from(pos: TagPosition) -> Self {
        match pos {
            TagPosition::Top => Side::Top,
            TagPosition::Bottom => Side::Bottom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Per-graph layout parameters shared by branch and block position math.
///
/// `base_y` is the vertical offset reserved for the legend/comment rows;
/// `headless` records that no branch in the graph declares a HEAD tag, which
/// narrows the rows reserved above "top"-tagged branches.
#[derive(Debug, Clone, Copy)]
pub struct Metrics {
    pub x_gap: f64,
    pub y_gap: f64,
    pub block_width: f64,
    pub block_height: f64,
    pub base_y: f64,
    pub headless: bool,
}

impl Metrics {
    /// Height of one block row including the inter-row gap.
    pub fn row_gap(&self) -> f64 {
        self.block_height + self.y_gap
    }
}

/// Cubic "diagonal" path between two points, in SVG path syntax.
///
/// The control points sit at the horizontal midpoint, producing the familiar
/// S-curve between a block and its origin.
pub fn diagonal_path(source: Point, target: Point) -> String {
    let mid = (source.x + target.x) / 2.0;
    format!(
        "M{},{}C{},{} {},{} {},{}",
        source.x, source.y, mid, source.y, mid, target.y, target.x, target.y
    )
}
