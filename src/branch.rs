//! An ordered chain of commit blocks anchored to an origin branch/commit.
//!
//! A branch owns its commit blocks and its two optional tags. Its x and y are
//! fixed when the branch forks (or re-forks, on a move); every commit's
//! position derives from its predecessor through [`Branch::x_next`]. The
//! cross-branch orchestration (moving, merging, tag re-anchoring) lives in
//! [`crate::graph`], which can resolve blocks on other branches.

use anyhow::{bail, Result};

use crate::block::{Block, BlockKind};
use crate::geometry::{Metrics, Side, TagPosition};

/// Snapshot of the commit a branch forks from, taken when the fork is
/// established. Current positions are always re-resolved by id through the
/// graph; the snapshot carries the coordinates at fork time.
#[derive(Debug, Clone)]
pub struct ForkAnchor {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone)]
pub struct Branch {
    pub label: String,
    /// Stable id: the label with separator punctuation stripped. Unlike the
    /// label it never changes, so element ids survive a rename.
    pub id: String,
    pub commits: Vec<Block>,
    pub branch_tag: Option<Block>,
    pub head_tag: Option<Block>,
    pub tag_position: TagPosition,
    /// Index of the origin branch in the graph's branch list.
    pub origin: Option<usize>,
    pub start_commit: Option<ForkAnchor>,
    pub x: f64,
    pub y: f64,
}

impl Branch {
    pub fn new(label: &str, tag_position: TagPosition) -> Self {
        Self {
            label: label.to_string(),
            id: label.replace(['(', ')', '.'], ""),
            commits: Vec::new(),
            branch_tag: None,
            head_tag: None,
            tag_position,
            origin: None,
            start_commit: None,
            x: 0.0,
            y: 0.0,
        }
    }

    /// Append a commit chained to the current tip (or the fork point when the
    /// branch is still empty). Returns the index of the new commit.
    pub fn add_commit(&mut self, label: &str, metrics: &Metrics) -> usize {
        let id = format!("{}-{}", self.id, self.commits.len());
        let origins: Vec<String> = self
            .commits
            .last()
            .map(|c| c.id.clone())
            .or_else(|| self.start_commit.as_ref().map(|f| f.id.clone()))
            .into_iter()
            .collect();
        let x = self.x_next(None, metrics);
        let y = self.y;
        self.commits.push(Block::new(
            id,
            BlockKind::Commit,
            label.to_string(),
            x,
            y,
            origins,
            Side::Right,
            metrics,
        ));
        self.commits.len() - 1
    }

    pub fn add_commits(&mut self, labels: &[String], metrics: &Metrics) {
        for label in labels {
            self.add_commit(label, metrics);
        }
    }

    pub fn find_commit(&self, label: &str) -> Result<&Block> {
        match self.commits.iter().find(|c| c.label == label) {
            Some(commit) => Ok(commit),
            None => bail!(
                "Cannot find commit with label \"{}\" on branch \"{}\"",
                label,
                self.label
            ),
        }
    }

    pub fn find_commit_index(&self, label: &str) -> Result<usize> {
        match self.commits.iter().position(|c| c.label == label) {
            Some(index) => Ok(index),
            None => bail!(
                "Cannot find commit with label \"{}\" on branch \"{}\"",
                label,
                self.label
            ),
        }
    }

    /// The next free abscissa: one gap past the given (or last) commit's
    /// right edge. An empty branch answers its own x.
    pub fn x_next(&self, start_x: Option<f64>, metrics: &Metrics) -> f64 {
        if self.commits.is_empty() {
            return self.x;
        }
        let last_x = start_x
            .or_else(|| self.commits.last().map(|c| c.x))
            .unwrap_or(self.x);
        last_x + metrics.block_width + metrics.x_gap
    }

    /// The next free ordinate, used to place bottom-row tags and forked
    /// branches. When a branch tag already occupies the matching x-axis (and
    /// is not pinned to the top row), the next row is below it.
    pub fn y_next(&self, x_axis: Option<f64>, metrics: &Metrics) -> f64 {
        let gap = metrics.row_gap();
        if let Some(tag) = &self.branch_tag {
            let same_axis = x_axis.map_or(true, |x| x == tag.x);
            if same_axis && self.tag_position != TagPosition::Top {
                return tag.y + gap;
            }
        }
        if self.commits.is_empty() || self.tag_position == TagPosition::Top {
            return self.y;
        }
        match self.commits.last() {
            Some(last) => last.y + gap,
            None => self.y,
        }
    }

    /// Mirror of [`Branch::y_next`] for the top row. With no commits it
    /// reserves two full rows above the branch, leaving room for a branch
    /// tag and a HEAD tag stacked.
    pub fn y_previous(&self, source: Option<(f64, Side)>, metrics: &Metrics) -> f64 {
        let gap = metrics.row_gap();
        if let Some(tag) = &self.branch_tag {
            let same_axis = source.map_or(true, |(x, position)| x == tag.x && position == tag.position);
            if same_axis {
                return tag.y - gap;
            }
        }
        match self.commits.last() {
            Some(last) => last.y - gap,
            None => self.y - 2.0 * gap,
        }
    }

    /// Create the branch tag, anchored on the named commit, else the tip,
    /// else the fork point. A rootless empty branch gets no tag.
    pub fn set_branch_tag(&mut self, anchor_label: Option<&str>, metrics: &Metrics) -> Result<()> {
        let anchor: Option<(String, f64)> = match anchor_label {
            Some(label) => {
                let commit = self.find_commit(label)?;
                Some((commit.id.clone(), commit.x))
            }
            None => self
                .commits
                .last()
                .map(|c| (c.id.clone(), c.x))
                .or_else(|| self.start_commit.as_ref().map(|f| (f.id.clone(), f.x))),
        };
        let Some((anchor_id, anchor_x)) = anchor else {
            return Ok(());
        };
        let y = match self.tag_position {
            TagPosition::Top => self.y_previous(None, metrics),
            TagPosition::Bottom => self.y_next(None, metrics),
        };
        self.branch_tag = Some(Block::new(
            format!("branch-{}", self.id),
            BlockKind::Branch,
            self.label.clone(),
            anchor_x,
            y,
            vec![anchor_id],
            Side::from(self.tag_position),
            metrics,
        ));
        Ok(())
    }

    /// Create the HEAD tag. No-op without a head label; anchors on the
    /// branch tag when one exists, else on the named commit.
    pub fn set_head_tag(&mut self, head_label: Option<&str>, metrics: &Metrics) -> Result<()> {
        let Some(label) = head_label else {
            return Ok(());
        };
        let (anchor_id, anchor_x) = match &self.branch_tag {
            Some(tag) => (tag.id.clone(), tag.x),
            None => {
                let commit = self.find_commit(label)?;
                (commit.id.clone(), commit.x)
            }
        };
        let y = match self.tag_position {
            TagPosition::Top => self.y_previous(None, metrics),
            TagPosition::Bottom => self.y_next(None, metrics),
        };
        self.head_tag = Some(Block::new(
            format!("head-{}", self.id),
            BlockKind::Head,
            "HEAD".to_string(),
            anchor_x,
            y,
            vec![anchor_id],
            Side::from(self.tag_position),
            metrics,
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BLOCK_HEIGHT, BLOCK_WIDTH, X_GAP, Y_GAP};

    fn metrics() -> Metrics {
        Metrics {
            x_gap: X_GAP,
            y_gap: Y_GAP,
            block_width: BLOCK_WIDTH,
            block_height: BLOCK_HEIGHT,
            base_y: 0.0,
            headless: true,
        }
    }

    #[test]
    fn id_strips_separator_punctuation() {
        let branch = Branch::new("release (v1.2)", TagPosition::Bottom);
        assert_eq!(branch.id, "release v12");
        assert_eq!(branch.label, "release (v1.2)");
    }

    #[test]
    fn commits_chain_from_their_predecessor() {
        let m = metrics();
        let mut branch = Branch::new("master", TagPosition::Bottom);
        branch.add_commits(&["c1".into(), "c2".into(), "c3".into()], &m);
        assert_eq!(branch.commits.len(), 3);
        assert!(branch.commits[0].origins.is_empty());
        assert_eq!(branch.commits[1].origins, vec!["master-0".to_string()]);
        assert_eq!(branch.commits[2].origins, vec!["master-1".to_string()]);
        assert_eq!(branch.commits[0].x, 0.0);
        assert_eq!(branch.commits[1].x, BLOCK_WIDTH + X_GAP);
        assert_eq!(branch.commits[2].x, 2.0 * (BLOCK_WIDTH + X_GAP));
    }

    #[test]
    fn first_commit_chains_from_the_fork_point() {
        let m = metrics();
        let mut branch = Branch::new("feature", TagPosition::Bottom);
        branch.start_commit = Some(ForkAnchor {
            id: "master-0".into(),
            x: 0.0,
            y: 0.0,
        });
        branch.x = BLOCK_WIDTH + X_GAP;
        branch.add_commit("f1", &m);
        assert_eq!(branch.commits[0].origins, vec!["master-0".to_string()]);
        assert_eq!(branch.commits[0].x, branch.x);
    }

    #[test]
    fn find_commit_fails_loudly() {
        let branch = Branch::new("master", TagPosition::Bottom);
        let err = branch.find_commit("nope").unwrap_err();
        assert!(err.to_string().contains("nope"));
        assert!(err.to_string().contains("master"));
    }

    #[test]
    fn bottom_tag_sits_one_row_below_the_tip() {
        let m = metrics();
        let mut branch = Branch::new("master", TagPosition::Bottom);
        branch.add_commits(&["c1".into()], &m);
        branch.set_branch_tag(None, &m).unwrap();
        let tag = branch.branch_tag.as_ref().unwrap().clone();
        assert_eq!(tag.x, branch.commits[0].x);
        assert_eq!(tag.y, branch.commits[0].y + m.row_gap());
        assert_eq!(tag.position, Side::Bottom);
        // HEAD stacks below the branch tag.
        branch.set_head_tag(Some("c1"), &m).unwrap();
        let head = branch.head_tag.as_ref().unwrap();
        assert_eq!(head.origins, vec!["branch-master".to_string()]);
        assert_eq!(head.y, tag.y + m.row_gap());
    }

    #[test]
    fn top_tag_reserves_rows_above() {
        let m = metrics();
        let mut branch = Branch::new("feature", TagPosition::Top);
        branch.y = 200.0;
        branch.add_commits(&["f1".into()], &m);
        branch.set_branch_tag(None, &m).unwrap();
        let tag = branch.branch_tag.as_ref().unwrap().clone();
        assert_eq!(tag.y, branch.commits[0].y - m.row_gap());
        branch.set_head_tag(Some("f1"), &m).unwrap();
        let head = branch.head_tag.as_ref().unwrap();
        assert_eq!(head.y, tag.y - m.row_gap());
    }
}
