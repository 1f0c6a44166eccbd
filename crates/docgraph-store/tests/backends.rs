//! Behaviour every backend must share, run against both implementations.

use std::sync::Arc;

use docgraph_core::Error;
use docgraph_store::*;
use tempfile::TempDir;

const ALICE: OwnerId = OwnerId(1);
const BOB: OwnerId = OwnerId(2);

fn backends() -> Vec<(Arc<dyn GraphStore>, Option<TempDir>)> {
    let dir = tempfile::tempdir().unwrap();
    let sqlite = SqliteGraphStore::open(dir.path().join("docgraph.db")).unwrap();
    vec![
        (Arc::new(MemoryGraphStore::new()), None),
        (Arc::new(sqlite), Some(dir)),
    ]
}

fn node(store: &dyn GraphStore, label: &str, name: &str, owner: OwnerId) -> Node {
    store
        .create_node(label, Properties::named(name), owner)
        .unwrap()
}

fn link(store: &dyn GraphStore, a: &Node, b: &Node, rel_type: &str) -> Relationship {
    store
        .create_relationship(&a.id, &b.id, rel_type, Properties::new(), a.owner)
        .unwrap()
}

#[test]
fn nodes_and_relationships_list_in_insertion_order() {
    for (store, _dir) in backends() {
        let store = store.as_ref();
        let a = node(store, "Person", "Alice Smith", ALICE);
        let b = node(store, "Organization", "Acme Corp.", ALICE);
        let c = node(store, "Location", "Berlin", ALICE);
        let r1 = link(store, &a, &b, "WORKS_FOR");
        let r2 = link(store, &b, &c, "LOCATED_IN");

        let names: Vec<String> = store
            .nodes_by_owner(ALICE)
            .unwrap()
            .iter()
            .map(Node::name)
            .collect();
        assert_eq!(names, vec!["Alice Smith", "Acme Corp.", "Berlin"]);
        let rels = store.relationships_by_owner(ALICE).unwrap();
        assert_eq!(rels, vec![r1, r2], "backend {}", store.backend());
    }
}

#[test]
fn labels_and_types_are_sanitized() {
    for (store, _dir) in backends() {
        let store = store.as_ref();
        let a = node(store, "Per son!", "A", ALICE);
        let b = node(store, "", "B", ALICE);
        assert_eq!(a.label, "Person");
        assert_eq!(b.label, "Entity");
        let r = store
            .create_relationship(&a.id, &b.id, "works-for", Properties::new(), ALICE)
            .unwrap();
        assert_eq!(r.rel_type, "worksfor");
    }
}

#[test]
fn missing_or_foreign_endpoint_writes_nothing() {
    for (store, _dir) in backends() {
        let store = store.as_ref();
        let mine = node(store, "Person", "Alice Smith", ALICE);
        let theirs = node(store, "Person", "Bob Jones", BOB);

        let err = store
            .create_relationship(&mine.id, &theirs.id, "KNOWS", Properties::new(), ALICE)
            .unwrap_err();
        assert!(matches!(err, Error::NodesNotFound { .. }));

        let err = store
            .create_relationship(
                &NodeId::from("does-not-exist"),
                &mine.id,
                "KNOWS",
                Properties::new(),
                ALICE,
            )
            .unwrap_err();
        assert!(matches!(err, Error::NodesNotFound { .. }));

        assert!(store.relationships_by_owner(ALICE).unwrap().is_empty());
        assert!(store.relationships_by_owner(BOB).unwrap().is_empty());
    }
}

#[test]
fn owners_never_see_each_other() {
    for (store, _dir) in backends() {
        let store = store.as_ref();
        let a = node(store, "Organization", "Acme Corp.", ALICE);
        let b = node(store, "Person", "Alice Smith", ALICE);
        link(store, &b, &a, "WORKS_FOR");
        node(store, "Organization", "Acme Holdings", BOB);

        let bob_view = store
            .query_subgraph(&SubgraphQuery::NameContains {
                owner: BOB,
                terms: vec!["acme".into()],
                limit: 20,
            })
            .unwrap();
        assert_eq!(bob_view.nodes.len(), 1);
        assert!(bob_view.nodes.iter().all(|n| n.owner == BOB));
        assert!(bob_view.relationships.is_empty());

        let overview = store.graph_overview(BOB).unwrap();
        assert_eq!(overview.stats.node_count, 1);
        assert_eq!(overview.stats.relationship_count, 0);
    }
}

#[test]
fn name_contains_returns_one_hop_neighborhood() {
    for (store, _dir) in backends() {
        let store = store.as_ref();
        let alice = node(store, "Person", "Alice Smith", ALICE);
        let acme = node(store, "Organization", "Acme Corp.", ALICE);
        let bob = node(store, "Person", "Bob Jones", ALICE);
        let far = node(store, "Location", "Paris", ALICE);
        link(store, &alice, &acme, "WORKS_FOR");
        link(store, &bob, &acme, "FOUNDED");
        link(store, &bob, &far, "LOCATED_IN");

        let sub = store
            .query_subgraph(&SubgraphQuery::NameContains {
                owner: ALICE,
                terms: vec!["ACME".into()],
                limit: 20,
            })
            .unwrap();
        assert!(sub.contains_node_named("Acme Corp."));
        assert!(sub.contains_node_named("Alice Smith"));
        assert!(sub.contains_node_named("Bob Jones"));
        assert!(!sub.contains_node_named("Paris"));
        assert_eq!(sub.relationships.len(), 2);
        assert_eq!(sub.nodes[0].name(), "Acme Corp.");
    }
}

#[test]
fn name_contains_keeps_isolated_matches_and_honours_limit() {
    for (store, _dir) in backends() {
        let store = store.as_ref();
        let hub = node(store, "Concept", "Widget", ALICE);
        for i in 0..5 {
            let spoke = node(store, "Concept", &format!("Part {}", i), ALICE);
            link(store, &hub, &spoke, "HAS_PART");
        }
        node(store, "Concept", "Widget Spare", ALICE);

        let sub = store
            .query_subgraph(&SubgraphQuery::NameContains {
                owner: ALICE,
                terms: vec!["widget".into()],
                limit: 3,
            })
            .unwrap();
        assert_eq!(sub.relationships.len(), 3);
        assert_eq!(sub.nodes.len(), 4);
        assert!(!sub.contains_node_named("Widget Spare"));

        let sub = store
            .query_subgraph(&SubgraphQuery::NameContains {
                owner: ALICE,
                terms: vec!["spare".into()],
                limit: 20,
            })
            .unwrap();
        assert_eq!(sub.nodes.len(), 1);
        assert!(sub.relationships.is_empty());
    }
}

#[test]
fn name_contains_with_blank_terms_is_empty() {
    for (store, _dir) in backends() {
        let store = store.as_ref();
        node(store, "Concept", "Anything", ALICE);
        let sub = store
            .query_subgraph(&SubgraphQuery::NameContains {
                owner: ALICE,
                terms: vec!["  ".into()],
                limit: 20,
            })
            .unwrap();
        assert!(sub.is_empty());
    }
}

#[test]
fn owner_sample_returns_first_relationships() {
    for (store, _dir) in backends() {
        let store = store.as_ref();
        let doc = node(store, "Document", "a.txt", ALICE);
        let mut chunks = Vec::new();
        for i in 0..30 {
            let chunk = node(store, "Chunk", &format!("Chunk {} of a.txt", i + 1), ALICE);
            chunks.push(link(store, &doc, &chunk, rel::HAS_CHUNK));
        }

        let sub = store
            .query_subgraph(&SubgraphQuery::OwnerSample {
                owner: ALICE,
                limit: 20,
            })
            .unwrap();
        assert_eq!(sub.relationships.len(), 20);
        assert_eq!(sub.relationships[0].id, chunks[0].id);
        assert_eq!(sub.nodes.len(), 21);

        let empty = store
            .query_subgraph(&SubgraphQuery::OwnerSample {
                owner: BOB,
                limit: 20,
            })
            .unwrap();
        assert!(empty.is_empty());
    }
}

#[test]
fn document_neighborhood_follows_mentions() {
    for (store, _dir) in backends() {
        let store = store.as_ref();
        let doc = node(store, "Document", "report.txt", ALICE);
        let chunk = node(store, "Chunk", "Chunk 1 of report.txt", ALICE);
        let alice = node(store, "Person", "Alice Smith", ALICE);
        let acme = node(store, "Organization", "Acme Corp.", ALICE);
        let unrelated = node(store, "Concept", "Elsewhere", ALICE);
        link(store, &doc, &chunk, rel::HAS_CHUNK);
        link(store, &doc, &alice, rel::MENTIONS);
        link(store, &alice, &acme, "WORKS_FOR");
        link(store, &chunk, &unrelated, "NOTED");

        let sub = store
            .query_subgraph(&SubgraphQuery::DocumentNeighborhood {
                owner: ALICE,
                document: doc.id.clone(),
            })
            .unwrap();
        assert_eq!(sub.nodes[0].id, doc.id);
        assert!(sub.contains_node_named("Chunk 1 of report.txt"));
        assert!(sub.contains_node_named("Alice Smith"));
        assert!(sub.contains_node_named("Acme Corp."));
        assert!(!sub.contains_node_named("Elsewhere"));
        assert_eq!(sub.relationships.len(), 3);

        let foreign = store
            .query_subgraph(&SubgraphQuery::DocumentNeighborhood {
                owner: BOB,
                document: doc.id.clone(),
            })
            .unwrap();
        assert!(foreign.is_empty());
    }
}

#[test]
fn overview_counts_exactly_and_caps_samples() {
    for (store, _dir) in backends() {
        let store = store.as_ref();
        let doc = node(store, "Document", "big.txt", ALICE);
        for i in 0..249 {
            let chunk = node(store, "Chunk", &format!("Chunk {}", i + 1), ALICE);
            link(store, &doc, &chunk, rel::HAS_CHUNK);
        }

        let overview = store.graph_overview(ALICE).unwrap();
        assert_eq!(overview.stats.node_count, 250);
        assert_eq!(overview.stats.relationship_count, 249);
        assert_eq!(overview.stats.node_types.get("Chunk"), Some(&249));
        assert_eq!(overview.stats.node_types.get("Document"), Some(&1));
        assert_eq!(overview.stats.relationship_types.get(rel::HAS_CHUNK), Some(&249));
        assert_eq!(overview.graph_data.nodes.len(), 100);
        assert_eq!(overview.graph_data.links.len(), 200);
        assert_eq!(overview.graph_data.nodes[0].name, "big.txt");
    }
}

#[test]
fn clear_removes_everything() {
    for (store, _dir) in backends() {
        let store = store.as_ref();
        let a = node(store, "Person", "A", ALICE);
        let b = node(store, "Person", "B", BOB);
        link(store, &a, &a, "SELF");
        store.clear().unwrap();
        assert!(store.nodes_by_owner(ALICE).unwrap().is_empty());
        assert!(store.nodes_by_owner(BOB).unwrap().is_empty());
        assert!(store.relationships_by_owner(ALICE).unwrap().is_empty());
        let again = node(store, "Person", "B", BOB);
        assert_ne!(again.id, b.id);
    }
}

#[test]
fn display_name_falls_back_to_label_and_id() {
    for (store, _dir) in backends() {
        let store = store.as_ref();
        let n = store
            .create_node("Chunk", Properties::new().with_content("text"), ALICE)
            .unwrap();
        let view = NodeView::from(&n);
        let short: String = n.id.as_str().chars().take(8).collect();
        assert_eq!(view.name, format!("Chunk_{}", short));

        let sub = store
            .query_subgraph(&SubgraphQuery::NameContains {
                owner: ALICE,
                terms: vec!["chunk_".into()],
                limit: 20,
            })
            .unwrap();
        assert_eq!(sub.nodes.len(), 1);
    }
}

#[test]
fn document_neighborhood_includes_structure_children() {
    for (store, _dir) in backends() {
        let store = store.as_ref();
        let doc = node(store, "Document", "people.csv", ALICE);
        let structure = node(store, "CSVStructure", "CSV Data (2 columns, 3 rows)", ALICE);
        let name_col = node(store, "CSVColumn", "name", ALICE);
        let age_col = node(store, "CSVColumn", "age", ALICE);
        link(store, &doc, &structure, rel::HAS_STRUCTURE);
        link(store, &structure, &name_col, rel::HAS_COLUMN);
        link(store, &structure, &age_col, rel::HAS_COLUMN);

        let sub = store
            .query_subgraph(&SubgraphQuery::DocumentNeighborhood {
                owner: ALICE,
                document: doc.id.clone(),
            })
            .unwrap();
        assert_eq!(sub.nodes.len(), 4);
        assert_eq!(sub.relationships.len(), 3);
        assert!(sub.contains_node_named("age"));
    }
}

#[test]
fn non_ascii_names_match_case_insensitively() {
    for (store, _dir) in backends() {
        let store = store.as_ref();
        node(store, "Person", "Émile Zola", ALICE);
        node(store, "Location", "ÅLESUND", ALICE);
        node(store, "Person", "Emile Durkheim", ALICE);

        let cases = [
            ("émile", "Émile Zola"),
            ("ÉMILE", "Émile Zola"),
            ("ålesund", "ÅLESUND"),
        ];
        for (term, expected) in cases {
            let sub = store
                .query_subgraph(&SubgraphQuery::NameContains {
                    owner: ALICE,
                    terms: vec![term.into()],
                    limit: 20,
                })
                .unwrap();
            assert_eq!(sub.nodes.len(), 1, "term {} on backend {}", term, store.backend());
            assert_eq!(sub.nodes[0].name(), expected);
        }
    }
}

#[test]
fn mistyped_well_known_properties_stay_readable() {
    for (store, _dir) in backends() {
        let store = store.as_ref();
        let chunk = store
            .create_node(
                "Chunk",
                Properties::named("Chunk one")
                    .with("index", "first")
                    .with("count", "several"),
                ALICE,
            )
            .unwrap();
        let other = node(store, "Concept", "Widget", ALICE);
        store
            .create_relationship(
                &chunk.id,
                &other.id,
                rel::MENTIONS,
                Properties::new().with("title", 7i64),
                ALICE,
            )
            .unwrap();

        let nodes = store.nodes_by_owner(ALICE).unwrap();
        assert_eq!(nodes.len(), 2, "backend {}", store.backend());
        assert_eq!(nodes[0].properties.index, None);
        assert_eq!(
            nodes[0].properties.get("index_value"),
            Some(PropertyValue::Text("first".into()))
        );
        assert_eq!(
            nodes[0].properties.get("count_value"),
            Some(PropertyValue::Text("several".into()))
        );
        let rels = store.relationships_by_owner(ALICE).unwrap();
        assert_eq!(rels[0].properties.get("title_value"), Some(PropertyValue::Int(7)));

        let overview = store.graph_overview(ALICE).unwrap();
        assert_eq!(overview.stats.node_count, 2);
        assert_eq!(overview.stats.relationship_count, 1);
    }
}

#[test]
fn non_finite_floats_stay_readable() {
    for (store, _dir) in backends() {
        let store = store.as_ref();
        store
            .create_node(
                "Concept",
                Properties::named("Ratio")
                    .with("score", f64::NAN)
                    .with("ceiling", f64::INFINITY)
                    .with("weight", 0.5),
                ALICE,
            )
            .unwrap();

        let nodes = store.nodes_by_owner(ALICE).unwrap();
        assert_eq!(nodes.len(), 1, "backend {}", store.backend());
        let props = &nodes[0].properties;
        assert_eq!(props.get("score"), Some(PropertyValue::Text("NaN".into())));
        assert_eq!(props.get("ceiling"), Some(PropertyValue::Text("inf".into())));
        assert_eq!(props.get("weight"), Some(PropertyValue::Float(0.5)));

        let overview = store.graph_overview(ALICE).unwrap();
        assert_eq!(overview.stats.node_count, 1);
    }
}
