use anyhow::Result;
use gitslides::document::GraphDocument;
use gitslides::graph::{Graph, GraphParams};
use gitslides::render::{Scene, Transition};

fn build(json: &str) -> Result<Graph<Scene>> {
    let document = GraphDocument::from_json(json)?;
    let mut graph = Graph::new(GraphParams::new("slide", "demo.json"), document, Scene::new())?;
    graph.draw();
    Ok(graph)
}

fn scripted() -> Result<Graph<Scene>> {
    build(
        r#"{
            "legend": "Start",
            "comments": "two commits",
            "branches": [ { "name": { "value": "master" }, "commits": ["c1", "c2"] } ],
            "steps": [
                { "actions": [
                    { "method": "addCommits", "branch": "master", "commits": ["c3"] }
                ] },
                { "legend": "Tag it", "actions": [
                    { "method": "addClassToCommit", "branch": "master",
                      "commit": "c3", "className": "highlight" }
                ] },
                { "actions": [
                    { "method": "removeCommits", "branch": "master", "commits": ["c1"] }
                ] }
            ],
            "headless": true
        }"#,
    )
}

#[test]
fn test_steps_execute_in_order() -> Result<()> {
    let mut graph = scripted()?;
    assert_eq!(graph.last_step_index(), 0);

    graph.next_step()?;
    assert_eq!(graph.last_step_index(), 1);
    assert_eq!(graph.find_branch("master")?.commits.len(), 3);

    graph.next_step()?;
    assert_eq!(graph.last_step_index(), 2);
    assert!(graph.find_branch("master")?.commits[2]
        .classes
        .iter()
        .any(|c| c == "highlight"));

    graph.next_step()?;
    assert_eq!(graph.find_branch("master")?.commits.len(), 2);
    Ok(())
}

#[test]
fn test_steps_past_the_end_are_noops() -> Result<()> {
    let mut graph = scripted()?;
    for _ in 0..3 {
        graph.next_step()?;
    }
    assert_eq!(graph.last_step_index(), 3);
    graph.next_step()?;
    graph.next_step()?;
    assert_eq!(graph.last_step_index(), 3);
    assert_eq!(graph.find_branch("master")?.commits.len(), 2);
    Ok(())
}

#[test]
fn test_legend_override_replaces_legend_and_comments() -> Result<()> {
    let mut graph = scripted()?;
    graph.next_step()?;
    graph.next_step()?;
    assert_eq!(graph.legend(), Some("Tag it"));
    // The step declared no comments, so the override clears them.
    assert_eq!(graph.comments(), None);
    assert!(graph
        .surface()
        .timeline
        .iter()
        .any(|t| matches!(t, Transition::Text { id, phases } if id == "legend" && phases.len() == 2)));
    Ok(())
}

#[test]
fn test_failing_action_keeps_the_cursor() -> Result<()> {
    let mut graph = build(
        r#"{
            "branches": [ { "name": { "value": "master" }, "commits": ["c1"] } ],
            "steps": [
                { "actions": [
                    { "method": "addCommits", "branch": "nope", "commits": ["x"] }
                ] }
            ],
            "headless": true
        }"#,
    )?;
    let err = graph.next_step().unwrap_err();
    assert!(err.to_string().contains("Cannot find branch <nope>"));
    assert_eq!(graph.last_step_index(), 0);
    Ok(())
}

#[test]
fn test_reset_restores_the_initial_description() -> Result<()> {
    let mut graph = scripted()?;
    for _ in 0..3 {
        graph.next_step()?;
    }
    assert_eq!(graph.legend(), Some("Tag it"));

    graph.reset()?;
    assert_eq!(graph.last_step_index(), 0);
    assert_eq!(graph.legend(), Some("Start"));
    assert_eq!(graph.comments(), Some("two commits"));
    let master = graph.find_branch("master")?;
    assert_eq!(master.commits.len(), 2);
    assert_eq!(master.commits[0].label, "c1");
    // Scene was cleared and redrawn from scratch.
    assert!(graph.surface().blocks.contains_key("block-master-0"));
    assert!(graph.surface().blocks.contains_key("block-master-1"));
    assert!(!graph.surface().blocks.contains_key("block-master-2"));
    Ok(())
}

#[test]
fn test_reset_replays_steps_identically() -> Result<()> {
    let mut graph = scripted()?;
    for _ in 0..3 {
        graph.next_step()?;
    }
    let commits_before: Vec<(String, f64)> = graph
        .find_branch("master")?
        .commits
        .iter()
        .map(|c| (c.label.clone(), c.x))
        .collect();

    graph.reset()?;
    for _ in 0..3 {
        graph.next_step()?;
    }
    let commits_after: Vec<(String, f64)> = graph
        .find_branch("master")?
        .commits
        .iter()
        .map(|c| (c.label.clone(), c.x))
        .collect();
    assert_eq!(commits_before, commits_after);
    Ok(())
}
