use depends::core::DiagnosticKind;
use depends::registry::{AttributeValue, ResourceKind, ResourceRef};
use depends::resolver::Depends;
use depends::test_utils::RecordingInjector;
use serde_json::json;

fn injected_for(descriptor: serde_json::Value) -> RecordingInjector {
    let injector = RecordingInjector::new();
    let depends = Depends::new(injector.clone());
    depends.register_json(&json!({ "dep1": descriptor }));
    depends.ensure("dep1");
    injector
}

#[test]
fn test_script_shapes() {
    for descriptor in [
        json!("js/dep1.js"),
        json!({ "script": "js/dep1.js" }),
        json!({ "script": { "src": "js/dep1.js" } }),
        json!({ "script": [{ "src": "js/dep1.js" }] }),
    ] {
        let injector = injected_for(descriptor.clone());
        assert_eq!(injector.injected(), vec!["js/dep1.js"], "descriptor {descriptor}");
        assert_eq!(injector.resources()[0].kind, ResourceKind::Script);
    }
}

#[test]
fn test_multiple_scripts_keep_order() {
    let injector = injected_for(json!({ "script": ["js/dep1.js", "js/dep1_1.js"] }));
    assert_eq!(injector.injected(), vec!["js/dep1.js", "js/dep1_1.js"]);
}

#[test]
fn test_style_shapes() {
    for descriptor in [
        json!({ "style": "js/dep1.css" }),
        json!({ "style": { "href": "js/dep1.css" } }),
        json!({ "style": [{ "href": "js/dep1.css" }] }),
    ] {
        let injector = injected_for(descriptor.clone());
        assert_eq!(injector.injected(), vec!["js/dep1.css"], "descriptor {descriptor}");
        assert_eq!(injector.resources()[0].kind, ResourceKind::Style);
    }
}

#[test]
fn test_multiple_styles_keep_order() {
    let injector = injected_for(json!({ "style": ["js/dep1.css", "js/dep1_1.css"] }));
    assert_eq!(injector.injected(), vec!["js/dep1.css", "js/dep1_1.css"]);
}

#[test]
fn test_styles_before_scripts() {
    let injector = injected_for(json!({ "script": "app.js", "style": "app.css" }));
    assert_eq!(injector.injected(), vec!["app.css", "app.js"]);
}

#[test]
fn test_attributes_pass_through_verbatim() {
    let injector = injected_for(json!({
        "script": {
            "src": "app.js",
            "integrity": "sha384-abc",
            "crossorigin": "anonymous"
        }
    }));

    let resource = &injector.resources()[0];
    assert_eq!(resource.owner, "dep1");
    assert_eq!(resource.locator(), Some("app.js"));
    assert_eq!(
        resource.reference,
        ResourceRef::attributes([
            ("src", "app.js"),
            ("integrity", "sha384-abc"),
            ("crossorigin", "anonymous"),
        ])
    );
}

#[test]
fn test_boolean_and_number_attributes_still_load() {
    let injector = injected_for(json!({
        "script": { "src": "x.js", "async": true, "data-version": 2 }
    }));

    assert_eq!(injector.injected(), vec!["x.js"]);
    let resource = &injector.resources()[0];
    assert_eq!(
        resource.reference,
        ResourceRef::attributes([
            ("src", AttributeValue::from("x.js")),
            ("async", AttributeValue::from(true)),
            ("data-version", AttributeValue::from(2)),
        ])
    );
}

#[test]
fn test_malformed_entry_does_not_block_siblings() {
    let injector = RecordingInjector::new();
    let depends = Depends::new(injector.clone());
    let written = depends.register_json(&json!({
        "broken": 42,
        "list": ["a.js"],
        "fine": "fine.js",
        "app": { "script": "app.js", "dependencies": ["broken", "fine"] }
    }));
    assert_eq!(written, 4);
    assert!(depends.diagnostics().is_empty());

    depends.ensure("app");
    assert!(depends.is_ready("broken"));
    injector.complete_all();
    assert!(depends.is_ready("app"));

    let diagnostics = depends.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].name, "broken");
    assert!(matches!(diagnostics[0].kind, DiagnosticKind::MalformedDescriptor { .. }));
}

#[test]
fn test_unknown_dependency_is_satisfied_with_suggestion() {
    let injector = RecordingInjector::new();
    let depends = Depends::new(injector.clone());
    depends.register_json(&json!({
        "jquery": "jquery.js",
        "app": { "script": "app.js", "dependencies": "jqeury" }
    }));

    depends.ensure("app");
    assert_eq!(injector.injected(), vec!["app.js"]);

    let diagnostics = depends.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].name, "jqeury");
    assert_eq!(
        diagnostics[0].to_string(),
        "'jqeury' is not registered; treating it as empty (did you mean jquery?)"
    );
}

#[test]
fn test_non_object_registration_is_ignored() {
    let depends = Depends::new(RecordingInjector::new());
    assert_eq!(depends.register_json(&json!(["a.js"])), 0);
    assert!(depends.registered().is_empty());
}
