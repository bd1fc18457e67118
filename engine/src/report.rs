//! Utilities for structured reporting of experimental results.
//!
//! Values are collected into a tree of JSON objects and collections which mirrors the context
//! guards alive at the time of reporting.
//! The whole tree is printed to stdout as a single JSON object once the `ReportingGuard` returned by
//! `enable_reporting` is dropped.
//! Reporting is thread local, values reported from rayon worker threads are discarded.
//! Workers should return their numbers and the main thread should report them.

use crate::built_info;
use serde_json::{Map, Value};
use std::{cell::RefCell, mem::replace};

pub use serde_json::json;

#[derive(Debug)]
enum ContextStackItem {
    Key(String),
    Collection(Vec<Value>),
    Object(Map<String, Value>),
}

#[derive(Debug)]
enum CurrentReportingContext {
    Collection(Vec<Value>),
    Object(Map<String, Value>),
}

#[derive(Debug)]
pub struct Reporter {
    current: CurrentReportingContext,
    context_stack: Vec<ContextStackItem>,
}

impl Default for Reporter {
    fn default() -> Self {
        Reporter {
            current: CurrentReportingContext::Object(Map::new()),
            context_stack: Vec::new(),
        }
    }
}

impl Reporter {
    fn create_object_under_key(&mut self, key: String) {
        match &mut self.current {
            CurrentReportingContext::Object(object) => {
                let parent = replace(object, Map::new());
                self.context_stack.push(ContextStackItem::Object(parent));
                self.context_stack.push(ContextStackItem::Key(key));
            }
            CurrentReportingContext::Collection(_) => {
                panic!("Cannot create object at key in collection");
            }
        }
    }

    fn create_collection_under_key(&mut self, key: String) {
        match &mut self.current {
            CurrentReportingContext::Object(object) => {
                let parent = replace(object, Map::new());
                self.context_stack.push(ContextStackItem::Object(parent));
                self.context_stack.push(ContextStackItem::Key(key));
                self.current = CurrentReportingContext::Collection(Vec::new());
            }
            CurrentReportingContext::Collection(_) => {
                panic!("Cannot create collection at key in collection");
            }
        }
    }

    fn create_collection_item(&mut self) {
        match &mut self.current {
            CurrentReportingContext::Object(_) => {
                panic!("Cannot create collection item in object");
            }
            CurrentReportingContext::Collection(collection) => {
                let parent = replace(collection, Vec::new());
                self.context_stack.push(ContextStackItem::Collection(parent));
                self.current = CurrentReportingContext::Object(Map::new());
            }
        }
    }

    fn report(&mut self, key: String, val: Value) {
        match &mut self.current {
            CurrentReportingContext::Object(object) => {
                let prev = object.insert(key, val);
                if !cfg!(feature = "report-allow-override") {
                    assert!(prev.is_none());
                }
            }
            CurrentReportingContext::Collection(_) => {
                panic!("Cannot report value on collection");
            }
        }
    }

    fn pop_context(&mut self) {
        let finished = replace(&mut self.current, CurrentReportingContext::Object(Map::new()));

        match self.context_stack.pop().expect("tried to pop from empty context") {
            ContextStackItem::Key(key) => {
                let mut object = match self.context_stack.pop() {
                    Some(ContextStackItem::Object(object)) => object,
                    _ => panic!("Inconsistent context stack"),
                };
                let value = match finished {
                    CurrentReportingContext::Object(finished) => Value::Object(finished),
                    CurrentReportingContext::Collection(finished) => Value::Array(finished),
                };
                assert_eq!(object.insert(key, value), None);
                self.current = CurrentReportingContext::Object(object);
            }
            ContextStackItem::Collection(mut collection) => {
                match finished {
                    CurrentReportingContext::Object(finished) => collection.push(Value::Object(finished)),
                    CurrentReportingContext::Collection(_) => panic!("Cannot insert collection into collection"),
                }
                self.current = CurrentReportingContext::Collection(collection);
            }
            ContextStackItem::Object(_) => panic!("Inconsistent context stack"),
        }
    }
}

thread_local! {
    static REPORTER: RefCell<Option<Reporter>> = RefCell::new(None);
}

fn with_reporter(f: impl FnOnce(&mut Reporter)) {
    REPORTER.with(|reporter| {
        if let Some(r) = reporter.borrow_mut().as_mut() {
            f(r)
        }
    });
}

#[must_use]
pub struct ContextGuard(());

impl Drop for ContextGuard {
    fn drop(&mut self) {
        with_reporter(Reporter::pop_context);
    }
}

/// All values reported while the returned guard is alive end up in an object under `key`.
pub fn push_context(key: String) -> ContextGuard {
    with_reporter(|r| r.create_object_under_key(key));
    ContextGuard(())
}

#[must_use]
pub struct CollectionContextGuard(());

impl Drop for CollectionContextGuard {
    fn drop(&mut self) {
        with_reporter(Reporter::pop_context);
    }
}

/// Create a JSON array under `key`.
/// Items have to be pushed through `push_collection_item` on the returned guard.
pub fn push_collection_context(key: String) -> CollectionContextGuard {
    with_reporter(|r| r.create_collection_under_key(key));
    CollectionContextGuard(())
}

impl CollectionContextGuard {
    pub fn push_collection_item(&mut self) -> CollectionItemContextGuard {
        with_reporter(Reporter::create_collection_item);
        CollectionItemContextGuard(self)
    }
}

#[must_use]
pub struct CollectionItemContextGuard<'a>(&'a CollectionContextGuard);

impl<'a> Drop for CollectionItemContextGuard<'a> {
    fn drop(&mut self) {
        with_reporter(Reporter::pop_context);
    }
}

pub fn report(key: String, val: Value) {
    if cfg!(feature = "report-to-stderr") {
        eprintln!("{}: {}", key, val);
    }
    report_silent(key, val)
}

pub fn report_silent(key: String, val: Value) {
    with_reporter(|r| r.report(key, val));
}

#[must_use]
pub struct ReportingGuard(());

impl Drop for ReportingGuard {
    fn drop(&mut self) {
        REPORTER.with(|reporter| {
            if let Some(r) = reporter.borrow_mut().take() {
                assert!(r.context_stack.is_empty());
                if let CurrentReportingContext::Object(object) = r.current {
                    println!("{}", Value::Object(object));
                } else {
                    panic!("broken root object for reporting");
                }
            };
        });
    }
}

#[macro_export]
macro_rules! report {
    ($k:expr, $($json:tt)+) => { report($k.to_string(), json!($($json)+)) };
}

#[macro_export]
macro_rules! report_silent {
    ($k:expr, $($json:tt)+) => { report_silent($k.to_string(), json!($($json)+)) };
}

/// Start collecting reported values for the current thread.
/// Also records build info and some details about the environment of this run.
pub fn enable_reporting(program: &str) -> ReportingGuard {
    REPORTER.with(|reporter| reporter.replace(Some(Reporter::default())));

    report!("git_revision", built_info::GIT_VERSION.unwrap_or(""));
    report!("build_target", built_info::TARGET);
    report!("build_profile", built_info::PROFILE);
    report!("feature_flags", built_info::FEATURES_STR);
    report!("build_time", built_info::BUILT_TIME_UTC);
    report!("build_with_rustc", built_info::RUSTC_VERSION);

    if let Ok(hostname) = std::process::Command::new("hostname").output() {
        report!("hostname", String::from_utf8_lossy(&hostname.stdout).trim());
    }

    report!("program", program);
    report!("start_time", format!("{}", time::now_utc().rfc822()));
    report!("args", std::env::args().collect::<Vec<String>>());

    ReportingGuard(())
}

pub mod benchmark;
pub use benchmark::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_contexts_build_expected_tree() {
        let mut reporter = Reporter::default();
        reporter.report("a".to_string(), json!(1));
        reporter.create_collection_under_key("runs".to_string());
        reporter.create_collection_item();
        reporter.report("b".to_string(), json!(2));
        reporter.pop_context();
        reporter.pop_context();
        reporter.create_object_under_key("nested".to_string());
        reporter.report("c".to_string(), json!("x"));
        reporter.pop_context();

        assert!(reporter.context_stack.is_empty());
        match reporter.current {
            CurrentReportingContext::Object(object) => {
                assert_eq!(Value::Object(object), json!({ "a": 1, "runs": [{ "b": 2 }], "nested": { "c": "x" } }));
            }
            CurrentReportingContext::Collection(_) => panic!("root has to be an object"),
        }
    }

    #[test]
    fn reporting_without_reporter_is_a_noop() {
        report!("ignored", 42);
        let _ctxt = push_context("also_ignored".to_string());
    }

    #[test]
    fn collection_guards_create_one_object_per_item() {
        REPORTER.with(|reporter| reporter.replace(Some(Reporter::default())));
        {
            let mut workers = push_collection_context("workers".to_string());
            for i in 0..2 {
                let _item = workers.push_collection_item();
                report!("id", i);
            }
        }
        let reporter = REPORTER.with(|reporter| reporter.borrow_mut().take()).expect("reporter enabled above");

        assert!(reporter.context_stack.is_empty());
        match reporter.current {
            CurrentReportingContext::Object(object) => {
                assert_eq!(Value::Object(object), json!({ "workers": [{ "id": 0 }, { "id": 1 }] }));
            }
            CurrentReportingContext::Collection(_) => panic!("root has to be an object"),
        }
    }
}
