//! Folds the identity graph into canonical records after the parsing pass.
//!
//! Grouping by ORCID merges the attribute records of all aliases sharing the
//! identifier: aliases are visited in lexicographic order, the first record is
//! taken whole and later ones only fill fields that are still empty. When two
//! aliases disagree on a field the lexicographically first alias wins.
//!
//! Grouping by alias performs no cross-alias merge.

use crate::graph::IdentityGraph;
use crate::models::{AliasRecord, AttributeRecord, CanonicalRecord, GroupBy, OrcidRecord};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

fn sorted(set: &FxHashSet<String>) -> Vec<String> {
    let mut items: Vec<String> = set.iter().cloned().collect();
    items.sort_unstable();
    items
}

/// Writes the merged record, DBLP keys of all aliases included, back onto
/// every alias of each ORCID, so aliases sharing an identifier end up with the
/// same content. ORCIDs are visited in lexicographic order.
pub fn merge_by_orcid(graph: &mut IdentityGraph) -> FxHashMap<String, OrcidRecord> {
    // a shared alias carries the earlier ORCID's merge into the later one
    let mut groups: Vec<(String, Vec<String>)> = graph
        .orcid_to_alias()
        .iter()
        .map(|(orcid, aliases)| (orcid.clone(), sorted(aliases)))
        .collect();
    groups.sort_unstable_by(|a, b| a.0.cmp(&b.0));

    let mut result = FxHashMap::default();
    result.reserve(groups.len());

    for (orcid, aliases) in groups {
        let records = graph.records_mut();

        let mut dblp_keys: FxHashSet<String> = FxHashSet::default();
        let mut merged: Option<AttributeRecord> = None;

        for alias in &aliases {
            let Some(record) = records.get(alias) else {
                // only seen inline, never in a homepage record
                continue;
            };
            dblp_keys.extend(record.source_keys.iter().cloned());
            match merged.as_mut() {
                None => merged = Some(record.clone()),
                Some(m) => m.fill_blanks_from(record),
            }
        }

        let mut merged = merged.unwrap_or_default();
        merged.source_keys = dblp_keys.clone();
        for alias in &aliases {
            records.insert(alias.clone(), merged.clone());
        }

        if aliases.len() > 1 {
            debug!(orcid = %orcid, aliases = aliases.len(), "Merged aliases");
        }

        result.insert(
            orcid.clone(),
            OrcidRecord {
                orcid,
                alias: aliases,
                dblp_key: sorted(&dblp_keys),
                affiliation: merged.affiliation,
                researcher_id: merged.researcher_id,
                scholar_id: merged.scholar_id,
                scopus_id: merged.scopus_id,
                acm_id: merged.acm_id,
                homepage: merged.homepage,
            },
        );
    }

    result
}

/// The DBLP key of an alias with several keys is the lexicographically
/// smallest one; an alias without any record gets an empty key.
pub fn merge_by_alias(graph: &IdentityGraph) -> FxHashMap<String, AliasRecord> {
    let empty = AttributeRecord::default();

    graph
        .alias_to_orcid()
        .iter()
        .map(|(alias, orcids)| {
            let record = graph.record(alias).unwrap_or(&empty);
            let dblp_key = record.source_keys.iter().min().cloned().unwrap_or_default();

            let merged = AliasRecord {
                alias: alias.clone(),
                orcid: sorted(orcids),
                dblp_key,
                affiliation: record.affiliation.clone(),
                researcher_id: record.researcher_id.clone(),
                scholar_id: record.scholar_id.clone(),
                scopus_id: record.scopus_id.clone(),
                acm_id: record.acm_id.clone(),
                homepage: record.homepage.clone(),
            };
            (alias.clone(), merged)
        })
        .collect()
}

/// Runs the selected grouping. The result is unordered; sorting is left to the exporter.
pub fn merge(graph: &mut IdentityGraph, group_by: GroupBy) -> Vec<CanonicalRecord> {
    match group_by {
        GroupBy::Orcid => merge_by_orcid(graph)
            .into_values()
            .map(CanonicalRecord::ByOrcid)
            .collect(),
        GroupBy::Alias => merge_by_alias(graph)
            .into_values()
            .map(CanonicalRecord::ByAlias)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fact, HomepageFact};

    fn record(key: &str) -> AttributeRecord {
        AttributeRecord {
            source_keys: [key.to_string()].into_iter().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn single_alias_keeps_its_record() {
        let mut graph = IdentityGraph::new();
        let own = AttributeRecord {
            affiliation: Some("MIT".to_string()),
            orcid: Some("O1".to_string()),
            researcher_id: Some("A-1".to_string()),
            scholar_id: Some("S1".to_string()),
            scopus_id: Some("55".to_string()),
            acm_id: Some("99".to_string()),
            homepage: Some("https://x.example".to_string()),
            ..record("homepages/x/X")
        };
        graph.set_attribute_record("X", own.clone());
        graph.add_edge("X", "O1");

        let merged = merge_by_orcid(&mut graph);
        let r = &merged["O1"];
        assert_eq!(r.alias, vec!["X"]);
        assert_eq!(r.dblp_key, vec!["homepages/x/X"]);
        assert_eq!(r.affiliation, own.affiliation);
        assert_eq!(r.researcher_id, own.researcher_id);
        assert_eq!(r.scholar_id, own.scholar_id);
        assert_eq!(r.scopus_id, own.scopus_id);
        assert_eq!(r.acm_id, own.acm_id);
        assert_eq!(r.homepage, own.homepage);
        assert_eq!(graph.record("X"), Some(&own));
    }

    #[test]
    fn disjoint_fields_are_combined() {
        let mut graph = IdentityGraph::new();
        graph.set_attribute_record(
            "Y",
            AttributeRecord {
                homepage: Some("y.example".to_string()),
                ..record("homepages/y/Y")
            },
        );
        graph.set_attribute_record(
            "X",
            AttributeRecord {
                affiliation: Some("MIT".to_string()),
                ..record("homepages/x/X")
            },
        );
        graph.add_edge("Y", "O1");
        graph.add_edge("X", "O1");

        let merged = merge_by_orcid(&mut graph);
        let r = &merged["O1"];
        assert_eq!(r.alias, vec!["X", "Y"]);
        assert_eq!(r.dblp_key, vec!["homepages/x/X", "homepages/y/Y"]);
        assert_eq!(r.affiliation.as_deref(), Some("MIT"));
        assert_eq!(r.homepage.as_deref(), Some("y.example"));
        assert_eq!(r.orcid, "O1");
    }

    #[test]
    fn conflicting_field_goes_to_first_alias() {
        let mut graph = IdentityGraph::new();
        for (alias, affiliation) in [("Zed", "ETH"), ("Abe", "MIT")] {
            graph.set_attribute_record(
                alias,
                AttributeRecord {
                    affiliation: Some(affiliation.to_string()),
                    ..record(alias)
                },
            );
            graph.add_edge(alias, "O1");
        }

        let merged = merge_by_orcid(&mut graph);
        assert_eq!(merged["O1"].affiliation.as_deref(), Some("MIT"));
    }

    #[test]
    fn merged_record_is_written_back_to_every_alias() {
        let mut graph = IdentityGraph::new();
        graph.apply(Fact::Homepage(HomepageFact {
            aliases: ["X".to_string()].into_iter().collect(),
            record: AttributeRecord {
                affiliation: Some("MIT".to_string()),
                ..record("homepages/x/X")
            },
        }));
        graph.set_attribute_record(
            "Y",
            AttributeRecord {
                homepage: Some("y.example".to_string()),
                ..record("homepages/y/Y")
            },
        );
        graph.add_edge("X", "O1");
        graph.add_edge("Y", "O1");

        merge_by_orcid(&mut graph);

        assert_eq!(graph.record("X"), graph.record("Y"));
        assert_eq!(graph.record("Y").unwrap().affiliation.as_deref(), Some("MIT"));
    }

    fn shared_alias_graph(edges: &[(&str, &str)]) -> IdentityGraph {
        let mut graph = IdentityGraph::new();
        graph.set_attribute_record("A", record("kA"));
        graph.set_attribute_record("B", record("kB"));
        for (alias, orcid) in edges {
            graph.add_edge(alias, orcid);
        }
        graph
    }

    #[test]
    fn written_back_record_carries_all_keys() {
        let mut graph = shared_alias_graph(&[("A", "O1"), ("B", "O1")]);

        merge_by_orcid(&mut graph);

        for alias in ["A", "B"] {
            let keys = &graph.record(alias).unwrap().source_keys;
            assert!(keys.contains("kA") && keys.contains("kB"), "{} lost a key", alias);
        }
    }

    #[test]
    fn alias_of_two_orcids_keeps_its_own_key() {
        let edges = [("A", "O1"), ("B", "O1"), ("B", "O2")];
        let mut graph = shared_alias_graph(&edges);
        let merged = merge_by_orcid(&mut graph);

        assert_eq!(merged["O1"].dblp_key, vec!["kA", "kB"]);
        assert!(merged["O2"].dblp_key.contains(&"kB".to_string()));

        let mut reversed: Vec<_> = edges.to_vec();
        reversed.reverse();
        let mut again = shared_alias_graph(&reversed);
        assert_eq!(merge_by_orcid(&mut again), merged);
    }

    #[test]
    fn shared_alias_follows_orcid_order() {
        // A2 sorts first, so B only carries its own key into Z1
        let mut graph = shared_alias_graph(&[("A", "Z1"), ("B", "Z1"), ("B", "A2")]);
        let merged = merge_by_orcid(&mut graph);

        assert_eq!(merged["A2"].dblp_key, vec!["kB"]);
        assert_eq!(merged["Z1"].dblp_key, vec!["kA", "kB"]);
    }

    #[test]
    fn alias_without_record_merges_as_empty() {
        let mut graph = IdentityGraph::new();
        graph.add_edge("Inline Only", "O1");

        let merged = merge_by_orcid(&mut graph);
        assert_eq!(merged["O1"].alias, vec!["Inline Only"]);
        assert!(merged["O1"].dblp_key.is_empty());
        assert_eq!(merged["O1"].homepage, None);

        let by_alias = merge_by_alias(&graph);
        assert_eq!(by_alias["Inline Only"].dblp_key, "");
    }

    #[test]
    fn by_alias_lists_every_orcid() {
        let mut graph = IdentityGraph::new();
        graph.set_attribute_record(
            "X",
            AttributeRecord {
                affiliation: Some("MIT".to_string()),
                ..record("homepages/x/X")
            },
        );
        graph.add_edge("X", "O2");
        graph.add_edge("X", "O1");
        graph.add_edge("Y", "O1");

        let merged = merge_by_alias(&graph);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["X"].orcid, vec!["O1", "O2"]);
        assert_eq!(merged["X"].dblp_key, "homepages/x/X");
        assert_eq!(merged["X"].affiliation.as_deref(), Some("MIT"));
        assert_eq!(merged["Y"].orcid, vec!["O1"]);
        assert_eq!(merged["Y"].affiliation, None);
    }

    #[test]
    fn by_alias_picks_smallest_key() {
        let mut graph = IdentityGraph::new();
        let mut rec = record("homepages/b/B");
        rec.source_keys.insert("homepages/a/A".to_string());
        graph.set_attribute_record("X", rec);
        graph.add_edge("X", "O1");

        assert_eq!(merge_by_alias(&graph)["X"].dblp_key, "homepages/a/A");
    }

    #[test]
    fn merge_dispatches_on_mode() {
        let mut graph = IdentityGraph::new();
        graph.add_edge("X", "O1");
        graph.add_edge("Y", "O1");

        let by_orcid = merge(&mut graph, GroupBy::Orcid);
        assert_eq!(by_orcid.len(), 1);
        assert_eq!(by_orcid[0].primary_key(), "O1");

        let by_alias = merge(&mut graph, GroupBy::Alias);
        assert_eq!(by_alias.len(), 2);
        assert!(by_alias.iter().all(|r| matches!(r, CanonicalRecord::ByAlias(_))));
    }
}
