use std::fs;
use std::io::Write;

use goscope::application::AnalyzeUsecase;
use goscope::domain::callgraph::GraphAlgorithm;
use goscope::domain::options::{Algorithm, AnalysisConfig, PositionMode};
use goscope::error::AnalysisError;
use goscope::infrastructure::config::{resolve_config, ConfigOverrides};
use goscope::infrastructure::{exporter_for, JsonExporter, JsonProgramLoader, OutputFormat};
use tempfile::{tempdir, NamedTempFile};

const GREETER: &str = r#"{
  "root": "/src/greeter",
  "packages": [
    {
      "path": "example.com/greeter",
      "name": "main",
      "types": [
        { "name": "A", "position": { "file": "/src/greeter/main.go", "start_line": 7, "start_column": 6 } },
        { "name": "B", "position": { "file": "/src/greeter/main.go", "start_line": 11, "start_column": 6 } }
      ],
      "interfaces": [ { "name": "Greeter", "methods": [ { "name": "Greet" } ] } ],
      "functions": [
        {
          "name": "main",
          "position": { "file": "/src/greeter/main.go", "start_line": 15, "start_column": 6 },
          "constructs": [ { "type": { "package": "example.com/greeter", "name": "A" }, "pointer": false } ],
          "call_sites": [
            {
              "target": { "interface": { "interface": { "package": "example.com/greeter", "name": "Greeter" }, "method": "Greet" } },
              "position": { "file": "/src/greeter/main.go", "start_line": 17, "start_column": 9 }
            }
          ]
        },
        { "name": "Greet", "receiver": { "type_name": "A" }, "position": { "file": "/src/greeter/main.go", "start_line": 9, "start_column": 12 } },
        { "name": "Greet", "receiver": { "type_name": "B" }, "position": { "file": "/src/greeter/main.go", "start_line": 13, "start_column": 12 } }
      ]
    }
  ]
}"#;

fn greeter_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(GREETER.as_bytes()).unwrap();
    file
}

#[test]
fn analyze_file_to_json() {
    let program = greeter_file();
    let out_dir = tempdir().unwrap();
    let out = out_dir.path().join("graphs").join("greeter.json");

    let loader = JsonProgramLoader::new(program.path());
    let usecase = AnalyzeUsecase {
        source: &loader,
        exporter: &JsonExporter,
    };
    let config = AnalysisConfig {
        algorithm: Algorithm::Rta,
        ..Default::default()
    };
    let graph = usecase.run(&config, out.to_str().unwrap()).unwrap();
    assert_eq!(graph.algorithm, GraphAlgorithm::Rta);

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["algorithm"], "rta");
    assert_eq!(written["edges"].as_array().unwrap().len(), 1);
    assert_eq!(written["edges"][0]["target"], "example.com/greeter.(A).Greet");
    assert_eq!(written["edges"][0]["call_site"]["file"], "main.go");
    assert_eq!(written["edges"][0]["call_site"]["start_line"], 17);
    assert_eq!(written["nodes"][0]["kind"], "method");
}

#[test]
fn analyze_file_to_dot_minimal() {
    let program = greeter_file();
    let out_dir = tempdir().unwrap();
    let out = out_dir.path().join("greeter.dot");

    let loader = JsonProgramLoader::new(program.path());
    let usecase = AnalyzeUsecase {
        source: &loader,
        exporter: exporter_for(OutputFormat::Dot),
    };
    let config = AnalysisConfig {
        emit_positions: PositionMode::Minimal,
        ..Default::default()
    };
    let graph = usecase.run(&config, out.to_str().unwrap()).unwrap();
    assert_eq!(graph.edges.len(), 2);
    assert!(graph.nodes.iter().all(|n| n.position.is_none()));

    let dot = fs::read_to_string(&out).unwrap();
    assert!(dot.contains("\"example.com/greeter.main\" -> \"example.com/greeter.(B).Greet\";"));
}

#[test]
fn missing_and_empty_programs_fail() {
    let loader = JsonProgramLoader::new("/nonexistent/greeter.json");
    let usecase = AnalyzeUsecase {
        source: &loader,
        exporter: &JsonExporter,
    };
    assert!(matches!(
        usecase.analyze(&AnalysisConfig::default()),
        Err(AnalysisError::ProgramNotFound { .. })
    ));

    let mut empty = NamedTempFile::new().unwrap();
    empty.write_all(br#"{"packages": []}"#).unwrap();
    let loader = JsonProgramLoader::new(empty.path());
    let usecase = AnalyzeUsecase {
        source: &loader,
        exporter: &JsonExporter,
    };
    assert!(matches!(
        usecase.analyze(&AnalysisConfig::default()),
        Err(AnalysisError::EmptyProgram)
    ));
}

#[test]
fn config_file_with_cli_overrides() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"algorithm = \"rta\"\nemit_positions = \"minimal\"\n").unwrap();

    let overrides = ConfigOverrides {
        emit_positions: Some("detailed".to_string()),
        entry_points: vec!["example.com/greeter.main".to_string()],
        ..Default::default()
    };
    let config = resolve_config(Some(file.path()), &overrides).unwrap();
    assert_eq!(config.algorithm, Algorithm::Rta);
    assert_eq!(config.emit_positions, PositionMode::Detailed);
    assert_eq!(config.entry_points, vec!["example.com/greeter.main"]);
}

#[test]
fn demo_program_only_live_greeter_is_called() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join("iface.json");
    let loader = JsonProgramLoader::new(path);
    let usecase = AnalyzeUsecase {
        source: &loader,
        exporter: &JsonExporter,
    };

    let rta = usecase
        .analyze(&AnalysisConfig {
            algorithm: Algorithm::Rta,
            ..Default::default()
        })
        .unwrap();
    assert!(rta.edge("example.com/iface.main", "example.com/iface.(A).Greet").is_some());
    assert!(rta.edge("example.com/iface.main", "example.com/iface.(B).Greet").is_none());
    assert!(rta.edge("example.com/iface.(A).Greet", "fmt.Println").is_some());

    let cha = usecase.analyze(&AnalysisConfig::default()).unwrap();
    assert!(cha.edge("example.com/iface.main", "example.com/iface.(B).Greet").is_some());
    assert_eq!(cha.edges.len(), 4);
}
