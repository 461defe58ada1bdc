use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;

use gitslides::document::GraphDocument;
use gitslides::graph::{Graph, GraphParams};
use gitslides::render::Scene;
use gitslides::svg::render_svg;

#[derive(Parser, Debug)]
#[command(author, version, about = "Render an animated git graph description to JSON or SVG", long_about = None)]
struct Cli {
    /// Graph description JSON file
    #[arg(value_name = "GRAPH_JSON")]
    graph_json: Utf8PathBuf,

    /// Number of steps to advance before rendering
    #[arg(long, default_value_t = 0)]
    steps: usize,

    /// Write a static SVG snapshot to this file instead of printing JSON
    #[arg(long, value_name = "FILE")]
    svg: Option<Utf8PathBuf>,

    /// Container id the graph is addressed by
    #[arg(long, default_value = "slide")]
    container: String,

    /// Drawing surface width
    #[arg(long, default_value_t = 1024.0)]
    width: f64,

    /// Drawing surface height
    #[arg(long, default_value_t = 500.0)]
    height: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let text = std::fs::read_to_string(&cli.graph_json)
        .with_context(|| format!("Open {}", cli.graph_json))?;
    let document = GraphDocument::from_json(&text)?;

    let mut params = GraphParams::new(&cli.container, cli.graph_json.as_str());
    params.width = cli.width;
    params.height = cli.height;
    let mut graph = Graph::new(params, document, Scene::new())?;
    graph.draw();
    for _ in 0..cli.steps {
        graph.next_step()?;
    }

    match &cli.svg {
        Some(path) => {
            let svg = render_svg(graph.surface());
            std::fs::write(path, svg).with_context(|| format!("Write {path}"))?;
        }
        None => {
            let json = serde_json::to_string_pretty(graph.surface())?;
            println!("{}", json);
        }
    }
    Ok(())
}
