use crate::classify::classify;
use crate::dtd::Dtd;
use crate::graph::IdentityGraph;
use crate::models::RawElement;
use crate::parser::{GzXmlParser, StreamParser};
use crate::stats::ParseStats;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, info};

/// Feeds every element of `parser` into `graph`, calling `on_progress` with the
/// running element count every `PROGRESS_INTERVAL` qualifying elements.
///
/// Stops at the first parse error; the graph is then incomplete and must not
/// be merged or exported.
pub fn ingest_with_progress<R: BufRead>(
    parser: StreamParser<R>,
    graph: &mut IdentityGraph,
    mut on_progress: impl FnMut(u64),
) -> Result<ParseStats> {
    let mut stats = ParseStats::new();

    for element in parser {
        let element = element.context("DBLP dump failed validation")?;

        let fact = classify(&element);
        match &element {
            RawElement::Author(_) => stats.inc_authors(fact.is_some()),
            RawElement::Homepage(_) => stats.inc_homepages(fact.is_some()),
        }
        if let Some(fact) = fact {
            graph.apply(fact);
        }

        if stats.inc_elements() {
            on_progress(stats.elements());
        }
    }

    Ok(stats)
}

pub fn ingest<R: BufRead>(parser: StreamParser<R>, graph: &mut IdentityGraph) -> Result<ParseStats> {
    let pb = ProgressBar::new_spinner();
    let stats = ingest_with_progress(parser, graph, |count| {
        info!(elements = count, "xml nodes processed");
        pb.set_message(format!("{} xml nodes processed", count));
        pb.tick();
    })?;
    pb.finish_and_clear();
    Ok(stats)
}

/// Builds the identity graph from a gzip-compressed dump. Without a DTD only
/// the predefined XML entities resolve and element names are not checked.
pub fn build_graph(xml_path: &Path, dtd_path: Option<&Path>) -> Result<(IdentityGraph, ParseStats)> {
    let dtd = match dtd_path {
        Some(path) => Dtd::load(path)?,
        None => Dtd::permissive(),
    };
    let parser = GzXmlParser::open(xml_path, dtd)?;

    info!("Started parsing: {:?}", xml_path);

    let mut graph = IdentityGraph::new();
    let stats = ingest(parser, &mut graph)
        .with_context(|| format!("Failed to parse {:?}", xml_path))?;

    let (aliases, orcids, records) = graph.stats();
    info!(
        elements = stats.elements(),
        aliases,
        orcids,
        records,
        edges = graph.edge_count(),
        "Finished parsing"
    );
    debug!(?stats, "Parse statistics");

    Ok((graph, stats))
}
