use depends::config::DependsConfig;
use depends::core::DiagnosticKind;
use depends::resolver::Depends;
use depends::test_utils::RecordingInjector;
use tempfile::TempDir;

const CONFIG: &str = r#"
[resolver]
warn-unknown = false
detect-cycles = true

[registry]
jquery = "jquery.js"

[registry.datatables]
style = ["datatables.css", { href = "print.css", media = "print" }]
script = "datatables.js"
dependencies = "jquery"
"#;

#[test]
fn test_registry_from_toml_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("depends.toml");
    std::fs::write(&path, CONFIG).unwrap();

    let config = DependsConfig::load_from(&path).unwrap();
    let injector = RecordingInjector::new();
    let depends = Depends::with_config(injector.clone(), &config);
    assert!(!depends.options().warn_unknown);
    assert_eq!(depends.registered(), vec!["datatables", "jquery"]);

    depends.ensure("datatables");
    assert_eq!(injector.injected(), vec!["jquery.js"]);

    injector.complete_all();
    assert_eq!(
        injector.injected(),
        vec!["jquery.js", "datatables.css", "print.css", "datatables.js"]
    );
    assert!(depends.is_ready("datatables"));
}

#[test]
fn test_registry_from_json_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("depends.json");
    std::fs::write(
        &path,
        r#"{ "registry": { "a": "a.js", "b": { "script": ["b.js"], "dependencies": ["a"] } } }"#,
    )
    .unwrap();

    let config = DependsConfig::load_from(&path).unwrap();
    let injector = RecordingInjector::new();
    let depends = Depends::with_config(injector.clone(), &config);

    depends.ensure("b");
    injector.complete_all();
    assert_eq!(injector.injected(), vec!["a.js", "b.js"]);
}

#[test]
fn test_malformed_config_entry_reported_on_request() {
    let config = DependsConfig::from_toml_str(
        r#"
        [registry]
        good = "good.js"
        bad = 7
        "#,
    )
    .unwrap();
    let depends = Depends::with_config(RecordingInjector::new(), &config);
    assert_eq!(depends.registered(), vec!["bad", "good"]);

    depends.ensure("bad");
    let diagnostics = depends.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(diagnostics[0].kind, DiagnosticKind::MalformedDescriptor { .. }));
}

#[test]
fn test_invalid_config_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("depends.toml");
    std::fs::write(&path, "[resolver]\nwarn-unknown = \"yes\"\n").unwrap();

    let error = DependsConfig::load_from(&path).unwrap_err();
    assert!(error.to_string().contains("Failed to parse config"));
}
