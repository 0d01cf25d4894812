use goscope::application::build_call_graph;
use goscope::domain::callgraph::{CallGraph, GraphAlgorithm};
use goscope::domain::cha::ChaBuilder;
use goscope::domain::diagnostics::{Severity, DANGLING_REFERENCES, RTA_NO_ENTRY_POINTS, UNRESOLVED_CALL_SITES};
use goscope::domain::index::ProgramIndex;
use goscope::domain::options::{Algorithm, AnalysisConfig};
use goscope::domain::program::{CallKind, Program};
use goscope::domain::rta::RtaBuilder;
use goscope::ports::CallGraphBuilder;
use serde_json::json;

fn program(value: serde_json::Value) -> Program {
    serde_json::from_value(value).expect("valid program fixture")
}

fn cha() -> AnalysisConfig {
    AnalysisConfig::default()
}

fn rta(entries: &[&str]) -> AnalysisConfig {
    AnalysisConfig {
        algorithm: Algorithm::Rta,
        entry_points: entries.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

fn edge_pairs(graph: &CallGraph) -> Vec<(&str, &str)> {
    graph
        .edges
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect()
}

fn scenario_a() -> Program {
    program(json!({ "packages": [{ "path": "p", "name": "p", "functions": [
        { "name": "A", "call_sites": [{ "target": { "static": { "package": "p", "name": "B" } } }] },
        { "name": "B" }
    ]}]}))
}

/// Interface I{M}; T1 and T2 both implement M; main builds a T1 and calls M through I.
fn scenario_b() -> Program {
    program(json!({ "packages": [{ "path": "p", "name": "main",
        "types": [{ "name": "T1" }, { "name": "T2" }],
        "interfaces": [{ "name": "I", "methods": [{ "name": "M" }] }],
        "functions": [
            { "name": "main",
              "constructs": [{ "type": { "package": "p", "name": "T1" }, "pointer": false }],
              "call_sites": [{ "target": { "interface": { "interface": { "package": "p", "name": "I" }, "method": "M" } } }] },
            { "name": "M", "receiver": { "type_name": "T1" } },
            { "name": "M", "receiver": { "type_name": "T2" } }
        ]
    }]}))
}

fn scenario_c() -> Program {
    program(json!({ "packages": [{ "path": "p", "name": "main", "functions": [
        { "name": "main", "call_sites": [
            { "target": { "static": { "package": "p", "name": "C" } }, "kind": "deferred" },
            { "target": { "static": { "package": "p", "name": "D" } }, "kind": "go" }
        ]},
        { "name": "C" },
        { "name": "D" }
    ]}]}))
}

#[test]
fn scenario_a_direct_call() {
    let prog = scenario_a();
    for (config, algorithm) in [(cha(), GraphAlgorithm::Cha), (rta(&["p.A"]), GraphAlgorithm::Rta)] {
        let graph = build_call_graph(&prog, &config).unwrap();
        assert_eq!(graph.algorithm, algorithm);
        assert_eq!(graph.node_ids().collect::<Vec<_>>(), vec!["p.A", "p.B"]);
        assert_eq!(edge_pairs(&graph), vec![("p.A", "p.B")]);
        assert_eq!(graph.edges[0].kind, CallKind::Call);
        assert!(graph.diagnostics.is_empty(), "{:?}", graph.diagnostics);
    }
}

#[test]
fn scenario_b_interface_dispatch() {
    let prog = scenario_b();

    let graph = build_call_graph(&prog, &cha()).unwrap();
    assert!(graph.edge("p.main", "p.(T1).M").is_some());
    assert!(graph.edge("p.main", "p.(T2).M").is_some());

    let graph = build_call_graph(&prog, &rta(&[])).unwrap();
    assert_eq!(graph.algorithm, GraphAlgorithm::Rta);
    assert_eq!(edge_pairs(&graph), vec![("p.main", "p.(T1).M")]);
    assert!(graph.node("p.(T2).M").is_none());
}

#[test]
fn scenario_c_call_kinds() {
    let prog = scenario_c();
    for config in [cha(), rta(&[])] {
        let graph = build_call_graph(&prog, &config).unwrap();
        assert_eq!(graph.edge("p.main", "p.C").unwrap().kind, CallKind::Deferred);
        assert_eq!(graph.edge("p.main", "p.D").unwrap().kind, CallKind::Spawn);
    }

    let graph = build_call_graph(&prog, &cha()).unwrap();
    let text = serde_json::to_string(&graph).unwrap();
    assert!(text.contains("\"deferred\""));
    assert!(text.contains("\"concurrent-spawn\""));
}

#[test]
fn scenario_d_filter_matching_nothing() {
    let prog = scenario_b();
    let config = AnalysisConfig {
        only_pkg: vec!["no/such/package".to_string()],
        ..Default::default()
    };
    let graph = build_call_graph(&prog, &config).unwrap();
    assert!(graph.nodes.is_empty());
    assert!(graph.edges.is_empty());
    assert!(graph.diagnostics.is_empty());
}

#[test]
fn fallback_equals_cha_plus_info() {
    let prog = scenario_a();
    let cha_graph = build_call_graph(&prog, &cha()).unwrap();
    let fallback = build_call_graph(&prog, &rta(&[])).unwrap();

    assert_eq!(fallback.algorithm, GraphAlgorithm::ChaFallback);
    assert_eq!(fallback.nodes, cha_graph.nodes);
    assert_eq!(fallback.edges, cha_graph.edges);
    assert_eq!(fallback.diagnostics.len(), 1);
    assert_eq!(fallback.diagnostics[0].code, RTA_NO_ENTRY_POINTS);
    assert_eq!(fallback.diagnostics[0].severity, Severity::Info);
}

#[test]
fn output_is_deterministic() {
    let prog = scenario_b();
    for config in [cha(), rta(&[])] {
        let first = serde_json::to_string(&build_call_graph(&prog, &config).unwrap()).unwrap();
        for _ in 0..5 {
            let again = serde_json::to_string(&build_call_graph(&prog, &config).unwrap()).unwrap();
            assert_eq!(first, again);
        }
    }
}

#[test]
fn identities_stable_across_algorithms() {
    let prog = scenario_b();
    let cha_graph = build_call_graph(&prog, &cha()).unwrap();
    let rta_graph = build_call_graph(&prog, &rta(&[])).unwrap();

    for node in &rta_graph.nodes {
        let other = cha_graph.node(&node.id).expect("RTA node also present under CHA");
        assert_eq!(node, other);
    }
}

#[test]
fn repeated_call_sites_collapse() {
    let prog = program(json!({ "packages": [{ "path": "p", "name": "p", "functions": [
        { "name": "A", "call_sites": [
            { "target": { "static": { "package": "p", "name": "B" } }, "position": { "file": "a.go", "start_line": 2 } },
            { "target": { "static": { "package": "p", "name": "B" } }, "kind": "go", "position": { "file": "a.go", "start_line": 3 } },
            { "target": { "static": { "package": "p", "name": "B" } }, "position": { "file": "a.go", "start_line": 4 } }
        ]},
        { "name": "B" }
    ]}]}));
    let graph = build_call_graph(&prog, &cha()).unwrap();
    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.edges[0].kind, CallKind::Call);
    assert_eq!(graph.edges[0].call_site.as_ref().unwrap().start_line, 2);
}

#[test]
fn rta_is_a_subset_of_cha() {
    let prog = program(json!({ "packages": [
        { "path": "example.com/app", "name": "main",
          "types": [{ "name": "File" }, { "name": "Buffer" }, { "name": "Null" }],
          "interfaces": [
              { "name": "Reader", "methods": [{ "name": "Read", "params": ["[]byte"], "results": ["int", "error"] }] },
              { "name": "ReadCloser", "methods": [{ "name": "Close", "results": ["error"] }],
                "embeds": [{ "package": "example.com/app", "name": "Reader" }] }
          ],
          "functions": [
              { "name": "main",
                "constructs": [{ "type": { "package": "example.com/app", "name": "File" }, "pointer": true }],
                "address_taken": [{ "package": "example.com/app", "name": "handler" }],
                "call_sites": [
                    { "target": { "static": { "package": "example.com/app", "name": "consume" } } },
                    { "target": { "dynamic": { "params": ["string"] } } },
                    { "target": { "static": { "name": "println" } } }
                ]},
              { "name": "consume", "call_sites": [
                  { "target": { "interface": { "interface": { "package": "example.com/app", "name": "ReadCloser" }, "method": "Read" } } },
                  { "target": { "interface": { "interface": { "package": "example.com/app", "name": "ReadCloser" }, "method": "Close" } }, "kind": "defer" }
              ]},
              { "name": "handler", "params": ["string"] },
              { "name": "other", "params": ["string"] },
              { "name": "Read", "receiver": { "type_name": "File", "pointer": true }, "params": ["[]byte"], "results": ["int", "error"] },
              { "name": "Close", "receiver": { "type_name": "File", "pointer": true }, "results": ["error"] },
              { "name": "Read", "receiver": { "type_name": "Buffer" }, "params": ["[]byte"], "results": ["int", "error"] },
              { "name": "Close", "receiver": { "type_name": "Buffer" }, "results": ["error"] },
              { "name": "Read", "receiver": { "type_name": "Null" }, "params": ["[]byte"], "results": ["int", "error"] },
              { "name": "unused", "call_sites": [{ "target": { "static": { "package": "example.com/app", "name": "other" } } }] }
          ]}
    ]}));

    let index = ProgramIndex::build(&prog);
    let cha_calls = ChaBuilder::new().build_call_graph(&index);
    let analysis = RtaBuilder::new(vec!["example.com/app.main".to_string()]).analyze(&index);

    let cha_edges: Vec<(String, String)> = cha_calls
        .edges
        .iter()
        .map(|e| (e.caller.clone(), e.callee.clone()))
        .collect();
    for edge in &analysis.calls.edges {
        assert!(
            cha_edges.contains(&(edge.caller.clone(), edge.callee.clone())),
            "RTA edge {} -> {} missing under CHA",
            edge.caller,
            edge.callee
        );
    }
    let cha_reachable = ChaBuilder::reachable(&index, &cha_calls);
    assert!(analysis.reachable.is_subset(&cha_reachable));

    let graph = build_call_graph(&prog, &rta(&[])).unwrap();
    assert!(graph.edge("example.com/app.consume", "example.com/app.(*File).Read").is_some());
    assert!(graph.edge("example.com/app.consume", "example.com/app.(*File).Close").is_some());
    assert!(graph.edge("example.com/app.consume", "example.com/app.(Buffer).Read").is_none());
    assert!(graph.edge("example.com/app.main", "example.com/app.handler").is_some());
    assert!(graph.edge("example.com/app.main", "example.com/app.other").is_none());
    assert!(graph.edge("example.com/app.main", "println").is_some());
    assert!(graph.node("example.com/app.unused").is_none());

    let graph = build_call_graph(&prog, &cha()).unwrap();
    assert!(graph.edge("example.com/app.consume", "example.com/app.(Buffer).Close").is_some());
    assert!(graph.edge("example.com/app.consume", "example.com/app.(Null).Read").is_none());
    assert!(graph.edge("example.com/app.main", "example.com/app.other").is_some());
}

#[test]
fn promoted_method_dispatch() {
    let prog = program(json!({ "packages": [{ "path": "p", "name": "main",
        "types": [
            { "name": "Inner" },
            { "name": "Outer", "embeds": [{ "package": "p", "name": "Inner" }] }
        ],
        "interfaces": [{ "name": "I", "methods": [{ "name": "M" }] }],
        "functions": [
            { "name": "main",
              "constructs": [{ "type": { "package": "p", "name": "Outer" } }],
              "call_sites": [{ "target": { "interface": { "interface": { "package": "p", "name": "I" }, "method": "M" } } }] },
            { "name": "M", "receiver": { "type_name": "Inner" } }
        ]
    }]}));

    for config in [cha(), rta(&[])] {
        let graph = build_call_graph(&prog, &config).unwrap();
        assert_eq!(edge_pairs(&graph), vec![("p.main", "p.(Inner).M")]);
        assert!(graph.diagnostics.is_empty(), "{:?}", graph.diagnostics);
    }
}

#[test]
fn bad_references_are_skipped_and_reported() {
    let prog = program(json!({ "packages": [{ "path": "p", "name": "main", "functions": [
        { "name": "main",
          "constructs": [{ "type": { "package": "p", "name": "Ghost" } }],
          "address_taken": [{ "package": "p", "name": "vanished" }],
          "call_sites": [
              { "target": { "interface": { "method": "Close" } } },
              { "target": { "static": { "package": "p", "name": "B" } } }
          ]},
        { "name": "B" }
    ]}]}));

    let graph = build_call_graph(&prog, &rta(&[])).unwrap();
    assert_eq!(graph.algorithm, GraphAlgorithm::Rta);
    assert_eq!(edge_pairs(&graph), vec![("p.main", "p.B")]);

    let codes: Vec<(&str, Severity)> = graph
        .diagnostics
        .iter()
        .map(|d| (d.code.as_str(), d.severity))
        .collect();
    assert_eq!(
        codes,
        vec![(UNRESOLVED_CALL_SITES, Severity::Warning), (DANGLING_REFERENCES, Severity::Warning)]
    );
    assert!(graph.diagnostics[0].message.starts_with("1 "));
    assert!(graph.diagnostics[1].message.starts_with("2 "));
}
