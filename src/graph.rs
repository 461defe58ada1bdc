//! The aggregate graph: branches, legend state and the step interpreter.
//!
//! Construction resolves the declarative branch descriptors into positioned
//! [`Branch`]/[`Block`] trees; `next_step` replays authored actions one step
//! at a time and `reset` rebuilds everything from the recorded initial
//! description. Every mutating operation leaves all block coordinates
//! consistent before it returns — positions are re-derived eagerly, never
//! lazily.

use anyhow::{bail, Context, Result};

use crate::block::{Block, BlockKind};
use crate::branch::{Branch, ForkAnchor};
use crate::document::{Action, BranchDescriptor, CommitRef, GraphDocument, Step};
use crate::geometry::{
    Metrics, Point, Side, TagPosition, BLOCK_HEIGHT, BLOCK_WIDTH, MIN_WIDTH, PADDING, TEXT_HEIGHT,
    TEXT_TRANSITION_MS, X_GAP, Y_GAP,
};
use crate::render::{Surface, SurfaceConfig, TextShape};
use crate::text::TextAnimation;

/// Host-supplied construction parameters.
#[derive(Debug, Clone)]
pub struct GraphParams {
    /// Identifier of the slide container this graph renders into. Required;
    /// it namespaces all element ids.
    pub container_id: String,
    /// Identifier of the description the graph was built from (a file path
    /// or document key). Required; hosts use it to tell graphs apart.
    pub source_id: String,
    pub width: f64,
    pub height: f64,
    /// Explicit view-box override; derived from width/height when absent.
    pub view_box: Option<String>,
}

impl GraphParams {
    pub fn new(container_id: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            source_id: source_id.into(),
            width: 1024.0,
            height: 500.0,
            view_box: None,
        }
    }
}

/// The branch/legend description as first constructed, kept for `reset`.
#[derive(Debug, Clone)]
struct InitialState {
    branches: Vec<BranchDescriptor>,
    legend: Option<String>,
    comments: Option<String>,
}

/// Addresses one block inside the branch list.
#[derive(Debug, Clone, Copy)]
enum BlockLoc {
    Commit(usize, usize),
    BranchTag(usize),
    HeadTag(usize),
}

/// A resolved re-anchoring target for a tag refresh.
struct TagAnchor {
    id: String,
    branch_idx: usize,
}

#[derive(Debug)]
pub struct Graph<S: Surface> {
    /// Surface id, derived from the container id.
    pub id: String,
    source_id: String,
    metrics: Metrics,
    legend: Option<String>,
    comments: Option<String>,
    steps: Vec<Step>,
    last_step_index: usize,
    branches: Vec<Branch>,
    /// Index of the branch currently holding the graph's singular HEAD tag.
    head_branch: Option<usize>,
    initial: InitialState,
    surface: S,
}

impl<S: Surface> Graph<S> {
    pub fn new(params: GraphParams, document: GraphDocument, mut surface: S) -> Result<Self> {
        if params.container_id.is_empty() {
            bail!("containerId is missing");
        }
        if params.source_id.is_empty() {
            bail!("dataSource is missing");
        }
        let legend = document.legend.clone().filter(|t| !t.is_empty());
        let comments = document.comments.clone().filter(|t| !t.is_empty());
        let base_y = match (&legend, &comments) {
            (Some(_), Some(_)) => 2.0 * TEXT_HEIGHT + PADDING,
            (Some(_), None) => BLOCK_HEIGHT + Y_GAP,
            (None, _) => 0.0,
        };
        let metrics = Metrics {
            x_gap: X_GAP,
            y_gap: Y_GAP,
            block_width: BLOCK_WIDTH,
            block_height: BLOCK_HEIGHT,
            base_y,
            headless: document.headless,
        };

        let id = format!("{}-graph", params.container_id);
        let view_box = params
            .view_box
            .clone()
            .unwrap_or_else(|| format!("0 0 {} {}", params.width * 1.2, params.height * 1.2));
        surface.configure(SurfaceConfig {
            id: id.clone(),
            width: (params.width + 2.0 * PADDING).min(MIN_WIDTH),
            height: params.height + 2.0 * PADDING,
            view_box,
            offset: Point::new(PADDING, PADDING),
        });

        let mut graph = Self {
            id,
            source_id: params.source_id.clone(),
            metrics,
            legend: legend.clone(),
            comments: comments.clone(),
            steps: document.steps.clone(),
            last_step_index: 0,
            branches: Vec::new(),
            head_branch: None,
            initial: InitialState {
                branches: document.branches.clone(),
                legend,
                comments,
            },
            surface,
        };
        for descriptor in &document.branches {
            graph.add_branch(descriptor)?;
        }
        Ok(graph)
    }

    // ── accessors ───────────────────────────────────────────────────────────

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn find_branch(&self, label: &str) -> Result<&Branch> {
        let index = self.find_branch_index(label)?;
        Ok(&self.branches[index])
    }

    /// The branch currently holding the graph-wide HEAD tag, if any.
    pub fn head_branch(&self) -> Option<&Branch> {
        self.head_branch.map(|i| &self.branches[i])
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn legend(&self) -> Option<&str> {
        self.legend.as_deref()
    }

    pub fn comments(&self) -> Option<&str> {
        self.comments.as_deref()
    }

    pub fn last_step_index(&self) -> usize {
        self.last_step_index
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn find_branch_index(&self, label: &str) -> Result<usize> {
        self.branches
            .iter()
            .position(|b| b.label == label)
            .with_context(|| format!("Cannot find branch <{label}>"))
    }

    fn resolve_commit(&self, reference: &CommitRef) -> Result<(usize, usize)> {
        let bi = self.find_branch_index(&reference.branch)?;
        let ci = self.branches[bi].find_commit_index(&reference.commit)?;
        Ok((bi, ci))
    }

    /// Current position of any block in the graph, looked up by id.
    fn find_block_point(&self, id: &str) -> Option<Point> {
        for branch in &self.branches {
            for commit in &branch.commits {
                if commit.id == id {
                    return Some(Point::new(commit.x, commit.y));
                }
            }
            for tag in [&branch.branch_tag, &branch.head_tag].into_iter().flatten() {
                if tag.id == id {
                    return Some(Point::new(tag.x, tag.y));
                }
            }
        }
        None
    }

    fn block_at(&self, loc: BlockLoc) -> Option<&Block> {
        match loc {
            BlockLoc::Commit(bi, ci) => self.branches.get(bi).and_then(|b| b.commits.get(ci)),
            BlockLoc::BranchTag(bi) => self.branches.get(bi).and_then(|b| b.branch_tag.as_ref()),
            BlockLoc::HeadTag(bi) => self.branches.get(bi).and_then(|b| b.head_tag.as_ref()),
        }
    }

    fn block_at_mut(&mut self, loc: BlockLoc) -> Option<&mut Block> {
        match loc {
            BlockLoc::Commit(bi, ci) => {
                self.branches.get_mut(bi).and_then(|b| b.commits.get_mut(ci))
            }
            BlockLoc::BranchTag(bi) => self.branches.get_mut(bi).and_then(|b| b.branch_tag.as_mut()),
            BlockLoc::HeadTag(bi) => self.branches.get_mut(bi).and_then(|b| b.head_tag.as_mut()),
        }
    }

    fn origin_points(&self, block: &Block) -> Vec<Point> {
        block
            .origins
            .iter()
            .filter_map(|id| self.find_block_point(id))
            .collect()
    }

    // ── drawing ─────────────────────────────────────────────────────────────

    /// Draw the legend/comment rows, then every branch.
    pub fn draw(&mut self) {
        self.draw_legend();
        for bi in 0..self.branches.len() {
            self.draw_branch(bi);
        }
    }

    fn draw_branch(&mut self, bi: usize) {
        for ci in 0..self.branches[bi].commits.len() {
            self.draw_block(BlockLoc::Commit(bi, ci));
        }
        self.draw_block(BlockLoc::BranchTag(bi));
        self.draw_block(BlockLoc::HeadTag(bi));
    }

    /// (Re-)draw one block: replaces any element with the same id and
    /// recomputes its origin links.
    fn draw_block(&mut self, loc: BlockLoc) {
        let Some((id, shape, links)) = self
            .block_at(loc)
            .map(|b| (b.element_id(), b.shape(), b.link_shapes(&self.origin_points(b))))
        else {
            return;
        };
        self.surface.insert_block(shape);
        self.surface.set_links(&id, links);
        if let Some(block) = self.block_at_mut(loc) {
            block.drawn = true;
        }
    }

    /// Animate one block to its current model coordinates and redraw links.
    fn move_block(&mut self, loc: BlockLoc) {
        let Some((id, x, y, links)) = self
            .block_at(loc)
            .map(|b| (b.element_id(), b.x, b.y, b.link_shapes(&self.origin_points(b))))
        else {
            return;
        };
        self.surface.move_element(&id, x, y);
        self.surface.set_links(&id, links);
    }

    fn draw_legend(&mut self) {
        let legend = self.legend.clone();
        self.draw_text(legend.as_deref(), "legend", 0.0, TEXT_HEIGHT / 2.0, 0.0);
        self.draw_comments();
    }

    fn draw_comments(&mut self) {
        // The comment element always exists (drawn as a space when absent) so
        // a later step can fade real text in.
        let text = self.comments.clone().unwrap_or_else(|| " ".to_string());
        let y_start = if self.legend.is_some() { TEXT_HEIGHT } else { 0.0 };
        self.draw_text(Some(&text), "comments", 0.0, TEXT_HEIGHT, y_start);
    }

    fn draw_text(&mut self, text: Option<&str>, id: &str, x_pos: f64, y_pos: f64, y_start: f64) {
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            return;
        };
        if self.surface.has_text(id) {
            let phases = TextAnimation::EaseOut.sequence(y_start, TEXT_TRANSITION_MS);
            self.surface.animate_text(id, text.to_string(), phases);
        } else {
            self.surface.insert_text(TextShape {
                id: id.to_string(),
                text: text.to_string(),
                x: x_pos,
                y: y_pos,
            });
            let phases = TextAnimation::EaseIn.sequence(y_start, TEXT_TRANSITION_MS);
            self.surface.animate_text(id, text.to_string(), phases);
        }
    }

    // ── construction / stepping ─────────────────────────────────────────────

    /// Resolve a branch descriptor and append the branch.
    ///
    /// When the descriptor names no origin the most recently added branch is
    /// used; the first branch of a graph becomes a root branch.
    pub fn add_branch(&mut self, descriptor: &BranchDescriptor) -> Result<usize> {
        if self.branches.iter().any(|b| b.label == descriptor.name.value) {
            bail!("Branch <{}> already exists", descriptor.name.value);
        }
        let origin_idx = match &descriptor.origin {
            Some(label) => Some(self.find_branch_index(label)?),
            None => self.branches.len().checked_sub(1),
        };
        let fork = match (origin_idx, &descriptor.start_at) {
            (Some(oi), Some(label)) => {
                let commit = self.branches[oi].find_commit(label)?;
                Some(ForkAnchor {
                    id: commit.id.clone(),
                    x: commit.x,
                    y: commit.y,
                })
            }
            _ => None,
        };

        let metrics = self.metrics;
        let mut branch = Branch::new(&descriptor.name.value, descriptor.tag_position);
        let with_commits = !descriptor.commits.is_empty();
        let (x, y) =
            self.origin_geometry(origin_idx, fork.as_ref(), branch.tag_position, with_commits, false);
        branch.origin = origin_idx;
        branch.start_commit = fork;
        branch.x = x;
        branch.y = y;
        branch.add_commits(&descriptor.commits, &metrics);
        branch.set_branch_tag(descriptor.name.position.as_deref(), &metrics)?;
        branch.set_head_tag(descriptor.head.as_deref(), &metrics)?;
        let has_head = branch.head_tag.is_some();

        self.branches.push(branch);
        let index = self.branches.len() - 1;
        self.detach_commits(&descriptor.name.value, &descriptor.detached_commits)?;
        if has_head {
            self.head_branch = Some(index);
        }
        Ok(index)
    }

    /// Starting x and y of a branch relative to its origin's layout.
    ///
    /// `with_commits` is false only for branches declared without commits,
    /// which sit flush with their origin's row. `has_commits` distinguishes
    /// construction (commit list still empty) from a move of a populated
    /// branch, which lands one row below the origin's next free row.
    fn origin_geometry(
        &self,
        origin_idx: Option<usize>,
        fork: Option<&ForkAnchor>,
        tag_position: TagPosition,
        with_commits: bool,
        has_commits: bool,
    ) -> (f64, f64) {
        let m = &self.metrics;
        let x = match origin_idx {
            Some(oi) => self.branches[oi].x_next(fork.map(|f| f.x), m),
            None => 0.0,
        };
        let origin_y = origin_idx.map(|oi| self.branches[oi].y).unwrap_or(0.0);
        let y = if !with_commits {
            m.base_y + origin_y
        } else if tag_position == TagPosition::Top {
            // Reserve room above the branch for its tags; twice as much when
            // a HEAD tag exists anywhere in the graph.
            let reserved = if m.headless {
                m.row_gap()
            } else {
                2.0 * m.row_gap()
            };
            m.base_y + origin_y + reserved
        } else {
            match origin_idx {
                Some(oi) => {
                    let below = if has_commits {
                        self.branches[oi].y_next(Some(x), m)
                    } else {
                        self.branches[oi].y
                    };
                    m.base_y + below
                }
                None => m.base_y,
            }
        };
        (x, y)
    }

    /// Execute the step at the cursor, if any, and advance the cursor.
    /// Calls past the last authored step are no-ops.
    pub fn next_step(&mut self) -> Result<()> {
        let Some(step) = self.steps.get(self.last_step_index).cloned() else {
            return Ok(());
        };
        if let Some(legend) = &step.legend {
            self.legend = Some(legend.clone());
            self.comments = step.comments.clone();
            self.draw_legend();
        }
        self.process_actions(&step.actions)?;
        self.last_step_index += 1;
        Ok(())
    }

    /// Clear everything and rebuild from the initial description.
    pub fn reset(&mut self) -> Result<()> {
        self.surface.clear();
        self.branches.clear();
        self.head_branch = None;
        let descriptors = self.initial.branches.clone();
        for descriptor in &descriptors {
            self.add_branch(descriptor)?;
        }
        self.legend = self.initial.legend.clone();
        self.comments = self.initial.comments.clone();
        self.last_step_index = 0;
        self.draw();
        Ok(())
    }

    /// Apply an action batch in order. A failing action aborts the batch,
    /// leaving the state produced by the prior actions — there is no
    /// rollback.
    pub fn process_actions(&mut self, actions: &[Action]) -> Result<()> {
        for action in actions {
            self.apply_action(action)?;
        }
        Ok(())
    }

    fn apply_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::AddClassToCommit {
                branch,
                commit,
                class_name,
            } => self.add_class_to_commit(branch, commit, class_name),
            Action::AddCommits { branch, commits } => self.add_commits(branch, commits),
            Action::AttachCommits { branch, commits } => self.attach_commits(branch, commits),
            Action::DetachCommits { branch, commits } => self.detach_commits(branch, commits),
            Action::Merge {
                label,
                source,
                target,
            } => self.merge(label, source, target),
            Action::MoveBranch { branch, target } => self.move_branch(branch, target),
            Action::MoveBranchTag {
                branch,
                target,
                target_branch,
                tag_position,
            } => self.move_branch_tag(branch, target, target_branch.as_deref(), *tag_position),
            Action::MoveHeadTag {
                branch,
                target,
                tag_position,
            } => self.move_head_tag(branch, target.as_deref(), *tag_position),
            Action::RemoveBranchTag { branch } => self.remove_branch_tag(branch),
            Action::RemoveCommits { branch, commits } => self.remove_commits(branch, commits),
            Action::RenameBranchTag { branch, label } => self.rename_branch_tag(branch, label),
            Action::SetBranch { branch } => self.set_branch(branch),
        }
    }

    // ── actions ─────────────────────────────────────────────────────────────

    /// Add a style class to a commit and redraw it.
    pub fn add_class_to_commit(&mut self, branch: &str, commit: &str, class_name: &str) -> Result<()> {
        let bi = self.find_branch_index(branch)?;
        let ci = self.branches[bi].find_commit_index(commit)?;
        self.branches[bi].commits[ci].add_class(class_name);
        self.draw_block(BlockLoc::Commit(bi, ci));
        Ok(())
    }

    /// Append commits to a branch, drawing each one.
    pub fn add_commits(&mut self, branch: &str, commits: &[String]) -> Result<()> {
        let bi = self.find_branch_index(branch)?;
        let metrics = self.metrics;
        for label in commits {
            let ci = self.branches[bi].add_commit(label, &metrics);
            self.draw_block(BlockLoc::Commit(bi, ci));
        }
        Ok(())
    }

    /// Clear the detached style from commits.
    pub fn attach_commits(&mut self, branch: &str, commits: &[String]) -> Result<()> {
        let bi = self.find_branch_index(branch)?;
        for label in commits {
            let ci = self.branches[bi].find_commit_index(label)?;
            let (id, classes, drawn) = {
                let block = &mut self.branches[bi].commits[ci];
                block.attach();
                (block.element_id(), block.classes.clone(), block.drawn)
            };
            if drawn {
                self.surface.set_classes(&id, classes);
            }
        }
        Ok(())
    }

    /// Style commits as detached from the branch tip.
    pub fn detach_commits(&mut self, branch: &str, commits: &[String]) -> Result<()> {
        let bi = self.find_branch_index(branch)?;
        for label in commits {
            let ci = self.branches[bi].find_commit_index(label)?;
            let (id, classes, drawn) = {
                let block = &mut self.branches[bi].commits[ci];
                block.detach();
                (block.element_id(), block.classes.clone(), block.drawn)
            };
            if drawn {
                self.surface.set_classes(&id, classes);
            }
        }
        Ok(())
    }

    /// Build a merge commit from two resolved commits and append it to the
    /// source branch. The merge block sits one step past whichever of the
    /// two branches is further along, so it overlaps neither.
    pub fn merge(&mut self, label: &str, source: &CommitRef, target: &CommitRef) -> Result<()> {
        let (sbi, sci) = self.resolve_commit(source)?;
        let (tbi, tci) = self.resolve_commit(target)?;
        let metrics = self.metrics;
        let (id, origins, x) = {
            let s = &self.branches[sbi].commits[sci];
            let t = &self.branches[tbi].commits[tci];
            let x = if s.x > t.x {
                self.branches[sbi].x_next(None, &metrics)
            } else {
                self.branches[tbi].x_next(None, &metrics)
            };
            (
                format!("{}-{}-merge", s.id, t.id),
                vec![s.id.clone(), t.id.clone()],
                x,
            )
        };
        let y = self.branches[sbi].y;
        let block = Block::new(
            id,
            BlockKind::Merge,
            label.to_string(),
            x,
            y,
            origins,
            Side::Right,
            &metrics,
        );
        self.branches[sbi].commits.push(block);
        let ci = self.branches[sbi].commits.len() - 1;
        self.draw_block(BlockLoc::Commit(sbi, ci));
        Ok(())
    }

    /// Re-parent a branch onto a different origin branch/commit and cascade
    /// new positions through all of its commits and tags.
    pub fn move_branch(&mut self, branch: &str, target: &CommitRef) -> Result<()> {
        let bi = self.find_branch_index(branch)?;
        let oi = self.find_branch_index(&target.branch)?;
        let fork = {
            let commit = self.branches[oi].find_commit(&target.commit)?;
            ForkAnchor {
                id: commit.id.clone(),
                x: commit.x,
                y: commit.y,
            }
        };
        let metrics = self.metrics;
        let has_commits = !self.branches[bi].commits.is_empty();
        let tag_position = self.branches[bi].tag_position;
        let (x, y) = self.origin_geometry(Some(oi), Some(&fork), tag_position, true, has_commits);
        {
            let moved = &mut self.branches[bi];
            moved.origin = Some(oi);
            moved.start_commit = Some(fork.clone());
            moved.x = x;
            moved.y = y;
            let row_y = moved.y;
            let mut prev = (fork.id.clone(), fork.x);
            for commit in &mut moved.commits {
                commit.origins = vec![prev.0.clone()];
                commit.x = prev.1 + metrics.block_width + metrics.x_gap;
                commit.y = row_y;
                prev = (commit.id.clone(), commit.x);
            }
        }
        for ci in 0..self.branches[bi].commits.len() {
            self.move_block(BlockLoc::Commit(bi, ci));
        }
        self.refresh_branch_tag(bi, None, None);
        self.move_block(BlockLoc::BranchTag(bi));
        if self.branches[bi].head_tag.is_some() {
            self.refresh_head_tag(bi, None, None);
            self.move_block(BlockLoc::HeadTag(bi));
        }
        Ok(())
    }

    /// Re-anchor a branch tag, optionally onto another branch's commit and
    /// optionally forcing the tag row.
    pub fn move_branch_tag(
        &mut self,
        branch: &str,
        target: &str,
        target_branch: Option<&str>,
        tag_position: Option<TagPosition>,
    ) -> Result<()> {
        let bi = self.find_branch_index(branch)?;
        if self.branches[bi].branch_tag.is_none() {
            bail!("Branch <{branch}> has no branch tag");
        }
        let anchor = match target_branch {
            Some(other) => {
                let obi = self.find_branch_index(other)?;
                let commit = self.branches[obi].find_commit(target)?;
                TagAnchor {
                    id: commit.id.clone(),
                    branch_idx: obi,
                }
            }
            None => {
                let commit = self.branches[bi].find_commit(target)?;
                TagAnchor {
                    id: commit.id.clone(),
                    branch_idx: bi,
                }
            }
        };
        self.refresh_branch_tag(bi, Some(&anchor), tag_position);
        self.move_block(BlockLoc::BranchTag(bi));
        Ok(())
    }

    /// Move the graph's singular HEAD tag, re-parenting it to another branch
    /// when needed.
    pub fn move_head_tag(
        &mut self,
        branch: &str,
        target: Option<&str>,
        tag_position: Option<TagPosition>,
    ) -> Result<()> {
        let si = self.find_branch_index(branch)?;
        let hi = self.head_branch.context("Graph has no HEAD tag")?;
        if hi != si {
            let tag = self.branches[hi].head_tag.take();
            self.branches[si].head_tag = tag;
            self.head_branch = Some(si);
        }
        let anchor = match target {
            Some(label) => {
                let commit = self.branches[si].find_commit(label)?;
                Some(TagAnchor {
                    id: commit.id.clone(),
                    branch_idx: si,
                })
            }
            None => self.branches[si].branch_tag.as_ref().map(|tag| TagAnchor {
                id: tag.id.clone(),
                branch_idx: si,
            }),
        };
        self.refresh_head_tag(si, anchor.as_ref(), tag_position);
        self.move_block(BlockLoc::HeadTag(si));
        Ok(())
    }

    /// Remove a branch tag's visual. The tag stays in the model so a later
    /// refresh can redraw it.
    pub fn remove_branch_tag(&mut self, branch: &str) -> Result<()> {
        let bi = self.find_branch_index(branch)?;
        let id = match &self.branches[bi].branch_tag {
            Some(tag) => tag.element_id(),
            None => bail!("Branch <{branch}> has no branch tag"),
        };
        self.surface.remove_element(&id);
        self.surface.remove_links(&id);
        if let Some(tag) = self.branches[bi].branch_tag.as_mut() {
            tag.drawn = false;
        }
        Ok(())
    }

    /// Remove commits and close the gaps: every commit downstream of a
    /// vacated slot is re-chained and shifted left.
    pub fn remove_commits(&mut self, branch: &str, commits: &[String]) -> Result<()> {
        let bi = self.find_branch_index(branch)?;
        let metrics = self.metrics;
        for label in commits {
            let ci = self.branches[bi].find_commit_index(label)?;
            let removed = self.branches[bi].commits.remove(ci);
            let element = removed.element_id();
            self.surface.remove_element(&element);
            self.surface.remove_links(&element);
            {
                let moved = &mut self.branches[bi];
                let row_y = moved.y;
                let branch_x = moved.x;
                let mut prev: Option<(String, f64)> = if ci == 0 {
                    moved.start_commit.as_ref().map(|f| (f.id.clone(), f.x))
                } else {
                    moved.commits.get(ci - 1).map(|c| (c.id.clone(), c.x))
                };
                for commit in moved.commits.iter_mut().skip(ci) {
                    match &prev {
                        Some((prev_id, prev_x)) => {
                            commit.origins = vec![prev_id.clone()];
                            commit.x = prev_x + metrics.block_width + metrics.x_gap;
                        }
                        None => {
                            // Root branch, first slot: the chain restarts at
                            // the branch origin with no incoming link.
                            commit.origins = Vec::new();
                            commit.x = branch_x;
                        }
                    }
                    commit.y = row_y;
                    prev = Some((commit.id.clone(), commit.x));
                }
            }
            for i in ci..self.branches[bi].commits.len() {
                self.move_block(BlockLoc::Commit(bi, i));
            }
        }
        Ok(())
    }

    /// Rename a branch and its tag. The branch id (and with it all element
    /// ids) stays stable; later lookups use the new label.
    pub fn rename_branch_tag(&mut self, branch: &str, label: &str) -> Result<()> {
        let bi = self.find_branch_index(branch)?;
        self.branches[bi].label = label.to_string();
        match self.branches[bi].branch_tag.as_mut() {
            Some(tag) => tag.label = label.to_string(),
            None => bail!("Branch <{branch}> has no branch tag"),
        }
        self.draw_block(BlockLoc::BranchTag(bi));
        Ok(())
    }

    /// Add a new branch mid-presentation and draw it.
    pub fn set_branch(&mut self, descriptor: &BranchDescriptor) -> Result<()> {
        let index = self.add_branch(descriptor)?;
        self.draw_branch(index);
        Ok(())
    }

    // ── tag refresh rules ───────────────────────────────────────────────────

    /// Recompute a branch tag's anchor, row preference and coordinates.
    ///
    /// With an anchor and no explicit position the tag adopts the anchor
    /// branch's row preference and stores it on its own branch; an explicit
    /// position wins without being stored. Without an anchor the tag follows
    /// its current origin's position (after a branch move).
    fn refresh_branch_tag(
        &mut self,
        bi: usize,
        origin: Option<&TagAnchor>,
        override_position: Option<TagPosition>,
    ) {
        if self.branches[bi].branch_tag.is_none() {
            return;
        }
        let metrics = self.metrics;
        match (origin, override_position) {
            (Some(anchor), None) => {
                let position = self.branches[anchor.branch_idx].tag_position;
                self.branches[bi].tag_position = position;
                if let Some(tag) = self.branches[bi].branch_tag.as_mut() {
                    tag.position = position.into();
                }
            }
            (_, Some(position)) => {
                if let Some(tag) = self.branches[bi].branch_tag.as_mut() {
                    tag.position = position.into();
                }
            }
            (None, None) => {}
        }
        if let Some(anchor) = origin {
            if let Some(tag) = self.branches[bi].branch_tag.as_mut() {
                tag.origins = vec![anchor.id.clone()];
            }
        }
        let (anchor_id, fallback_x, side, old_y) = match &self.branches[bi].branch_tag {
            Some(tag) => (tag.origins.first().cloned(), tag.x, tag.position, tag.y),
            None => return,
        };
        let new_x = anchor_id
            .and_then(|id| self.find_block_point(&id))
            .map(|p| p.x)
            .unwrap_or(fallback_x);
        let new_y = if side == Side::Top {
            match origin {
                // Anchored on another branch: its own tag decides the axis.
                Some(anchor) if anchor.branch_idx != bi => {
                    self.branches[anchor.branch_idx].y_previous(Some((new_x, side)), &metrics)
                }
                // The probe would be this very tag: same axis by identity.
                _ => old_y - metrics.row_gap(),
            }
        } else {
            self.branches[bi].y_next(None, &metrics)
        };
        if let Some(tag) = self.branches[bi].branch_tag.as_mut() {
            tag.x = new_x;
            tag.y = new_y;
        }
    }

    /// Recompute the HEAD tag of branch `bi`, mirroring the branch-tag rules
    /// but measuring the row against the branch tag on the matching x-axis.
    fn refresh_head_tag(
        &mut self,
        bi: usize,
        origin: Option<&TagAnchor>,
        override_position: Option<TagPosition>,
    ) {
        if self.branches[bi].head_tag.is_none() {
            return;
        }
        let metrics = self.metrics;
        match (origin, override_position) {
            (Some(anchor), None) => {
                let position = self.branches[anchor.branch_idx].tag_position;
                self.branches[bi].tag_position = position;
                if let Some(tag) = self.branches[bi].head_tag.as_mut() {
                    tag.position = position.into();
                }
            }
            (_, Some(position)) => {
                if let Some(tag) = self.branches[bi].head_tag.as_mut() {
                    tag.position = position.into();
                }
            }
            (None, None) => {}
        }
        if let Some(anchor) = origin {
            if let Some(tag) = self.branches[bi].head_tag.as_mut() {
                tag.origins = vec![anchor.id.clone()];
            }
        }
        let (anchor_id, fallback_x, side) = match &self.branches[bi].head_tag {
            Some(tag) => (tag.origins.first().cloned(), tag.x, tag.position),
            None => return,
        };
        let new_x = anchor_id
            .and_then(|id| self.find_block_point(&id))
            .map(|p| p.x)
            .unwrap_or(fallback_x);
        let new_y = if side == Side::Top {
            self.branches[bi].y_previous(None, &metrics)
        } else {
            self.branches[bi].y_next(Some(new_x), &metrics)
        };
        if let Some(tag) = self.branches[bi].head_tag.as_mut() {
            tag.x = new_x;
            tag.y = new_y;
        }
    }
}
