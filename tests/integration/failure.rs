use std::cell::Cell;
use std::rc::Rc;

use depends::core::{DependsError, DiagnosticKind};
use depends::registry::StructuredDescriptor;
use depends::resolver::{Depends, Readiness, Source};
use depends::test_utils::RecordingInjector;

fn jquery_stack() -> (RecordingInjector, Depends) {
    let injector = RecordingInjector::new();
    let depends = Depends::new(injector.clone());
    depends.register([
        ("jquery", StructuredDescriptor::new().script("jquery.js")),
        ("plugin", StructuredDescriptor::new().script("plugin.js").depends_on("jquery")),
        ("app", StructuredDescriptor::new().script("app.js").depends_on("plugin")),
    ]);
    (injector, depends)
}

#[test]
fn test_failed_load_marks_owner_failed() {
    let (injector, depends) = jquery_stack();

    depends.ensure("jquery");
    assert!(injector.fail("jquery.js", "404 Not Found"));

    assert_eq!(
        depends.state("jquery"),
        Readiness::Failed(DependsError::LoadFailed {
            name: "jquery".to_string(),
            resource: "jquery.js".to_string(),
            reason: "404 Not Found".to_string(),
        })
    );
}

#[test]
fn test_failure_cascades_to_dependents() {
    let (injector, depends) = jquery_stack();

    depends.ensure("app");
    assert!(injector.fail("jquery.js", "timeout"));

    assert!(matches!(depends.state("plugin"), Readiness::Failed(DependsError::DependencyFailed { .. })));
    assert_eq!(
        depends.state("app"),
        Readiness::Failed(DependsError::DependencyFailed {
            name: "app".to_string(),
            dependency: "plugin".to_string(),
        })
    );
    assert_eq!(injector.injected(), vec!["jquery.js"]);
    assert_eq!(depends.pending_len(), 0);
}

#[test]
fn test_failure_drops_gated_callbacks() {
    let (injector, depends) = jquery_stack();
    let ran = Rc::new(Cell::new(false));
    let flag = ran.clone();

    depends.load("widget", Source::callback(move || flag.set(true)), ["jquery"]);
    assert!(injector.fail("jquery.js", "blocked"));

    assert!(!ran.get());
    assert!(matches!(depends.state("widget"), Readiness::Failed(_)));
    assert!(
        depends
            .diagnostics()
            .iter()
            .any(|diagnostic| diagnostic.name == "widget" && diagnostic.kind == DiagnosticKind::CallbackDropped)
    );
}

#[test]
fn test_failure_does_not_touch_unrelated_names() {
    let (injector, depends) = jquery_stack();
    depends.register([("fonts", "fonts.css")]);

    depends.ensure(["jquery", "fonts"]);
    assert!(injector.fail("jquery.js", "blocked"));
    assert!(injector.complete("fonts.css"));

    assert!(depends.is_ready("fonts"));
}

#[test]
fn test_ready_name_never_regresses() {
    let injector = RecordingInjector::new();
    let depends = Depends::new(injector.clone());

    depends.load("test", "js/test.js", depends::resolver::NO_DEPENDENCIES);
    assert!(injector.complete("js/test.js"));
    depends.load("test", "js/test.js", depends::resolver::NO_DEPENDENCIES);
    assert!(injector.fail("js/test.js", "gone"));

    assert!(depends.is_ready("test"));
}

#[test]
fn test_cycle_fails_members_and_dependents() {
    let injector = RecordingInjector::new();
    let depends = Depends::new(injector.clone());
    depends.register_json(&serde_json::json!({
        "a": { "script": "a.js", "dependencies": "b" },
        "b": { "script": "b.js", "dependencies": "c" },
        "c": { "script": "c.js", "dependencies": "a" },
        "app": { "script": "app.js", "dependencies": "a" }
    }));

    depends.ensure("app");

    for name in ["a", "b", "c"] {
        assert!(
            matches!(depends.state(name), Readiness::Failed(DependsError::CircularDependency { .. })),
            "{name} should be failed"
        );
    }
    assert!(matches!(depends.state("app"), Readiness::Failed(DependsError::DependencyFailed { .. })));
    assert!(injector.injected().is_empty());

    let cycles = depends
        .diagnostics()
        .into_iter()
        .filter(|diagnostic| matches!(diagnostic.kind, DiagnosticKind::CircularDependency { .. }))
        .count();
    assert_eq!(cycles, 3);
    assert!(depends.load_order("app").is_err());
}
