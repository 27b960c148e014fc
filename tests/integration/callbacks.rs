use std::cell::{Cell, RefCell};
use std::rc::Rc;

use depends::registry::ResourceRef;
use depends::resolver::{Depends, NO_DEPENDENCIES, Readiness, Source};
use depends::test_utils::RecordingInjector;

fn two_deps() -> (RecordingInjector, Depends) {
    let injector = RecordingInjector::new();
    let depends = Depends::new(injector.clone());
    depends.register([("dep1", "js/dep1.js"), ("dep2", "js/dep2.js")]);
    (injector, depends)
}

fn counting_callback(count: &Rc<Cell<u32>>) -> Source {
    let count = count.clone();
    Source::callback(move || count.set(count.get() + 1))
}

#[test]
fn test_load_appends_script() {
    let injector = RecordingInjector::new();
    let depends = Depends::new(injector.clone());

    depends.load("test", "js/test.js", NO_DEPENDENCIES);
    assert_eq!(injector.injected(), vec!["js/test.js"]);
}

#[test]
fn test_load_appends_script_with_attributes() {
    let injector = RecordingInjector::new();
    let depends = Depends::new(injector.clone());

    depends.load(
        "test",
        ResourceRef::attributes([("src", "js/test.js"), ("data-test", "test")]),
        NO_DEPENDENCIES,
    );

    let resource = &injector.resources()[0];
    assert_eq!(resource.locator(), Some("js/test.js"));
    assert_eq!(
        resource.reference,
        ResourceRef::attributes([("src", "js/test.js"), ("data-test", "test")])
    );
}

#[test]
fn test_load_appends_script_every_time() {
    let injector = RecordingInjector::new();
    let depends = Depends::new(injector.clone());

    for _ in 0..3 {
        depends.load("test", "js/test.js", NO_DEPENDENCIES);
    }
    assert_eq!(injector.count("js/test.js"), 3);
}

#[test]
fn test_load_once_appends_script_once() {
    let injector = RecordingInjector::new();
    let depends = Depends::new(injector.clone());

    for _ in 0..3 {
        depends.load_once("test", "js/test.js", NO_DEPENDENCIES);
    }
    assert_eq!(injector.count("js/test.js"), 1);
}

#[test]
fn test_load_with_dependencies_issues_them_first() {
    let (injector, depends) = two_deps();

    depends.load("test", "js/test.js", ["dep2", "dep1"]);
    assert_eq!(injector.injected(), vec!["js/dep2.js", "js/dep1.js", "js/test.js"]);

    assert!(injector.complete("js/test.js"));
    assert!(depends.is_ready("test"));
    assert!(!depends.is_ready("dep1"));
}

#[test]
fn test_load_with_callback() {
    let (injector, depends) = two_deps();
    let count = Rc::new(Cell::new(0));

    depends.load("test callback", counting_callback(&count), ["dep2", "dep1"]);
    assert_eq!(injector.injected(), vec!["js/dep2.js", "js/dep1.js"]);
    assert_eq!(count.get(), 0);
    assert_eq!(depends.state("test callback"), Readiness::Loading);

    injector.complete_all();
    assert_eq!(count.get(), 1);
    assert!(depends.is_ready("test callback"));
}

#[test]
fn test_callback_gates_on_whole_set() {
    for reversed in [false, true] {
        let (injector, depends) = two_deps();
        let count = Rc::new(Cell::new(0));

        depends.load("cb", counting_callback(&count), ["dep1", "dep2"]);

        let (first, second) = if reversed {
            ("js/dep2.js", "js/dep1.js")
        } else {
            ("js/dep1.js", "js/dep2.js")
        };
        assert!(injector.complete(first));
        assert_eq!(count.get(), 0);
        assert!(injector.complete(second));
        assert_eq!(count.get(), 1);
    }
}

#[test]
fn test_load_once_with_callback_runs_once() {
    let (injector, depends) = two_deps();
    let first = Rc::new(Cell::new(0));
    let second = Rc::new(Cell::new(0));

    depends.load_once("test callback", counting_callback(&first), ["dep2", "dep1"]);
    depends.load_once("test callback", counting_callback(&second), ["dep2", "dep1"]);
    assert_eq!(injector.injected(), vec!["js/dep2.js", "js/dep1.js"]);

    injector.complete_all();
    assert_eq!(first.get(), 1);
    assert_eq!(second.get(), 0);
}

#[test]
fn test_callbacks_fire_in_registration_order() {
    let (injector, depends) = two_deps();
    let order = Rc::new(RefCell::new(Vec::new()));

    for label in ["first", "second", "third"] {
        let order = order.clone();
        depends.load(label, Source::callback(move || order.borrow_mut().push(label)), ["dep1", "dep2"]);
    }

    injector.complete_all();
    assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn test_callback_may_load_more_during_drain() {
    let (injector, depends) = two_deps();
    let count = Rc::new(Cell::new(0));

    let handle = depends.clone();
    let nested = counting_callback(&count);
    depends.load(
        "outer",
        Source::callback(move || handle.load("inner", nested, "dep2")),
        "dep1",
    );
    // a later entry gated on the same name must still fire in the same drain
    depends.load("sibling", counting_callback(&count), "dep1");

    assert!(injector.complete("js/dep1.js"));
    assert!(depends.are_ready(["outer", "sibling"]));
    assert_eq!(count.get(), 1);

    assert!(injector.complete("js/dep2.js"));
    assert_eq!(count.get(), 2);
    assert!(depends.is_ready("inner"));
    assert_eq!(depends.pending_len(), 0);
}

#[test]
fn test_callback_gated_on_names_loaded_later() {
    let injector = RecordingInjector::new();
    let depends = Depends::new(injector.clone());
    let count = Rc::new(Cell::new(0));

    depends.load("widget", counting_callback(&count), "plugin");
    assert_eq!(count.get(), 1, "unknown names count as ready");

    depends.load("app", "app.js", NO_DEPENDENCIES);
    depends.load("after-app", counting_callback(&count), "app");
    assert_eq!(count.get(), 1);

    assert!(injector.complete("app.js"));
    assert_eq!(count.get(), 2);
}
