//! Serde model of the graph description document.
//!
//! The document is authored as JSON next to the slides: a legend, an ordered
//! branch list and an ordered step list. Steps carry [`Action`]s, internally
//! tagged on `method`; an unknown method name fails at deserialization, so a
//! malformed step script is rejected before it can run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::geometry::TagPosition;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    pub legend: Option<String>,
    pub comments: Option<String>,
    pub branches: Vec<BranchDescriptor>,
    #[serde(default)]
    pub steps: Vec<Step>,
    /// True when no branch in the graph carries a HEAD tag; narrows the rows
    /// reserved above "top"-tagged branches.
    #[serde(default)]
    pub headless: bool,
}

impl GraphDocument {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse graph description")
    }
}

/// Declarative description of one branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchDescriptor {
    pub name: BranchName,
    /// Label of the branch to fork from. When absent the most recently added
    /// branch is used; the first branch of a graph becomes a root branch.
    pub origin: Option<String>,
    #[serde(default)]
    pub commits: Vec<String>,
    /// Commits drawn with the detached style from the start.
    #[serde(default)]
    pub detached_commits: Vec<String>,
    /// When present, the commit label the HEAD tag anchors on.
    pub head: Option<String>,
    /// Commit label on the origin branch this branch forks from.
    pub start_at: Option<String>,
    #[serde(default)]
    pub tag_position: TagPosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchName {
    pub value: String,
    /// Optional commit label the branch tag anchors on (defaults to the
    /// branch tip).
    pub position: Option<String>,
}

/// One unit of the presentation narrative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Legend override; also replaces (or clears) the comment line.
    pub legend: Option<String>,
    pub comments: Option<String>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// A commit addressed by branch and commit label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRef {
    pub branch: String,
    pub commit: String,
}

/// A named, parameterized mutation applied to the graph during a step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum Action {
    #[serde(rename = "addClassToCommit", rename_all = "camelCase")]
    AddClassToCommit {
        branch: String,
        commit: String,
        class_name: String,
    },
    #[serde(rename = "addCommits")]
    AddCommits {
        branch: String,
        commits: Vec<String>,
    },
    #[serde(rename = "attachCommits")]
    AttachCommits {
        branch: String,
        #[serde(default)]
        commits: Vec<String>,
    },
    #[serde(rename = "detachCommits")]
    DetachCommits {
        branch: String,
        #[serde(default)]
        commits: Vec<String>,
    },
    #[serde(rename = "merge")]
    Merge {
        label: String,
        source: CommitRef,
        target: CommitRef,
    },
    #[serde(rename = "moveBranch")]
    MoveBranch { branch: String, target: CommitRef },
    #[serde(rename = "moveBranchTag", rename_all = "camelCase")]
    MoveBranchTag {
        branch: String,
        target: String,
        target_branch: Option<String>,
        tag_position: Option<TagPosition>,
    },
    #[serde(rename = "moveHeadTag", rename_all = "camelCase")]
    MoveHeadTag {
        branch: String,
        target: Option<String>,
        tag_position: Option<TagPosition>,
    },
    #[serde(rename = "removeBranchTag")]
    RemoveBranchTag { branch: String },
    #[serde(rename = "removeCommits")]
    RemoveCommits {
        branch: String,
        #[serde(default)]
        commits: Vec<String>,
    },
    #[serde(rename = "renameBranchTag")]
    RenameBranchTag { branch: String, label: String },
    #[serde(rename = "setBranch")]
    SetBranch { branch: BranchDescriptor },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_document() {
        let doc = GraphDocument::from_json(
            r#"{
                "legend": "A simple history",
                "branches": [
                    { "name": { "value": "master" }, "commits": ["c1", "c2"], "head": "c2" },
                    { "name": { "value": "feature" }, "origin": "master", "startAt": "c1",
                      "commits": ["f1"], "tagPosition": "top" }
                ],
                "steps": [
                    { "legend": "Commit", "actions": [
                        { "method": "addCommits", "branch": "master", "commits": ["c3"] }
                    ] }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(doc.branches.len(), 2);
        assert_eq!(doc.branches[1].start_at.as_deref(), Some("c1"));
        assert_eq!(doc.branches[1].tag_position, TagPosition::Top);
        assert!(!doc.headless);
        assert_eq!(doc.steps.len(), 1);
        match &doc.steps[0].actions[0] {
            Action::AddCommits { branch, commits } => {
                assert_eq!(branch, "master");
                assert_eq!(commits, &["c3".to_string()]);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn unknown_action_method_is_rejected() {
        let err = GraphDocument::from_json(
            r#"{
                "legend": "x",
                "branches": [],
                "steps": [ { "actions": [ { "method": "teleportBranch" } ] } ]
            }"#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("teleportBranch"));
    }
}
