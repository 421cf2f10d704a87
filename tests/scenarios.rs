//! End-to-end loads against in-memory and on-disk resources.

use std::fs;
use std::sync::Arc;

use layercfg::{
    ConfigError, ConfigurationLoader, DEFAULT_PROPERTIES, Environment, Event,
    FileSystemResourceLoader, MemoryResourceLoader, NullSink, Profile, PropertySource,
    RecordingSink, reorder_sources,
};

fn environment(pairs: &[(&str, &str)]) -> Environment {
    let mut env = Environment::new();
    env.property_sources_mut()
        .add_last(Arc::new(PropertySource::from_pairs(
            "commandLineArgs",
            pairs.iter().copied(),
        )));
    env
}

fn value(env: &Environment, key: &str) -> Option<String> {
    env.get_property(key).expect("property")
}

fn classpath_root_loader() -> ConfigurationLoader {
    ConfigurationLoader::new().with_search_locations("classpath:/")
}

#[test]
fn single_properties_file() {
    let resources =
        MemoryResourceLoader::new().with("classpath:/application.properties", "x=1");
    let mut env = Environment::new();
    let report = classpath_root_loader()
        .process(&mut env, &resources, &NullSink)
        .expect("load");

    assert_eq!(report.added_sources.len(), 1);
    assert_eq!(env.property_sources().len(), 1);
    assert_eq!(value(&env, "x").as_deref(), Some("1"));
    assert!(report.active_profiles.is_empty());
    assert!(env.active_profiles().expect("active").is_empty());
}

#[test]
fn profile_specific_file_wins() {
    let resources = MemoryResourceLoader::new()
        .with("classpath:/application.properties", "x=1")
        .with("classpath:/application-dev.properties", "x=2");
    let mut env = environment(&[("profiles.active", "dev")]);
    let report = classpath_root_loader()
        .process(&mut env, &resources, &NullSink)
        .expect("load");

    assert_eq!(value(&env, "x").as_deref(), Some("2"));
    assert_eq!(report.active_profiles, vec!["dev"]);
    assert_eq!(env.active_profiles().expect("active"), vec!["dev"]);
}

#[test]
fn included_profile_is_processed() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("application.properties"),
        "profiles.include=metrics\nx=1\n",
    )
    .expect("write");
    fs::write(dir.path().join("application-metrics.properties"), "metrics.enabled=true\n")
        .expect("write");
    let resources = FileSystemResourceLoader::new(dir.path()).with_classpath_root(dir.path());
    let mut env = Environment::new();
    let sink = RecordingSink::new();
    let report = classpath_root_loader()
        .process(&mut env, &resources, &sink)
        .expect("load");

    assert!(report.processed_profiles.contains(&Profile::named("metrics")));
    assert_eq!(value(&env, "metrics.enabled").as_deref(), Some("true"));
    assert_eq!(
        sink.count(|e| matches!(e, Event::ProfilesIncluded { .. })),
        1
    );
}

#[test]
fn missing_exact_location_is_not_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resources = FileSystemResourceLoader::new(dir.path());
    let mut env = environment(&[("config.location", "file:./custom.yml")]);
    let sink = RecordingSink::new();
    let report = ConfigurationLoader::new()
        .process(&mut env, &resources, &sink)
        .expect("load");

    assert!(report.added_sources.is_empty());
    assert_eq!(env.property_sources().len(), 1);
    assert!(sink.count(|e| matches!(e, Event::SkippedMissing { .. })) > 0);
}

#[test]
fn wildcard_location_fails_before_loading() {
    let resources =
        MemoryResourceLoader::new().with("classpath:/application.properties", "x=1");
    let mut env = environment(&[("config.location", "classpath*:/nope/")]);
    let sink = RecordingSink::new();
    let err = ConfigurationLoader::new()
        .process(&mut env, &resources, &sink)
        .expect_err("wildcard");

    assert!(matches!(err, ConfigError::WildcardLocation(_)));
    assert!(sink.events().is_empty());
    assert_eq!(env.property_sources().len(), 1);
}

#[test]
fn repeated_loads_are_identical() {
    let resources = MemoryResourceLoader::new()
        .with("classpath:/application.yml", "a: 1\nb:\n  c: 2\n---\nprofiles: '!x'\nd: 3\n")
        .with("classpath:/config/application.properties", "a=override\n");
    let snapshot = || {
        let mut env = Environment::new();
        ConfigurationLoader::new()
            .process(&mut env, &resources, &NullSink)
            .expect("load");
        env.property_sources()
            .iter()
            .map(|source| {
                let entries: Vec<(String, String)> = source
                    .entries()
                    .map(|(key, value)| (key.to_string(), value.value.clone()))
                    .collect();
                (source.name().to_string(), entries)
            })
            .collect::<Vec<_>>()
    };
    let first = snapshot();
    assert_eq!(first, snapshot());
    assert_eq!(first.len(), 3);
}

#[test]
fn default_properties_end_last() {
    let resources = MemoryResourceLoader::new()
        .with("classpath:/application.properties", "x=file")
        .with("classpath:/config/application.properties", "y=file")
        .with("classpath:/application-dev.properties", "z=dev");
    let mut env = environment(&[("profiles.active", "dev")]);
    env.set_default_properties(PropertySource::from_pairs(
        "defaults",
        [("x", "default"), ("w", "default")],
    ));
    env.property_sources_mut()
        .add_last(Arc::new(PropertySource::from_pairs("late", [("v", "late")])));
    ConfigurationLoader::new()
        .process(&mut env, &resources, &NullSink)
        .expect("load");
    reorder_sources(&mut env);

    let names = env.property_sources().names();
    assert_eq!(names.last().copied(), Some(DEFAULT_PROPERTIES));
    assert_eq!(value(&env, "x").as_deref(), Some("file"));
    assert_eq!(value(&env, "w").as_deref(), Some("default"));
}

#[test]
fn include_chains_reach_a_fixpoint() {
    let resources = MemoryResourceLoader::new()
        .with("classpath:/application.yml", "profiles:\n  include: a, b\n")
        .with("classpath:/application-a.yml", "profiles:\n  include: b, c\nfrom.a: yes\n")
        .with("classpath:/application-b.yml", "profiles:\n  include: a\nfrom.b: yes\n")
        .with("classpath:/application-c.yml", "from.c: yes\n");
    let mut env = Environment::new();
    let report = classpath_root_loader()
        .process(&mut env, &resources, &NullSink)
        .expect("load");

    for name in ["a", "b", "c"] {
        let profile = Profile::named(name);
        let occurrences = report
            .processed_profiles
            .iter()
            .filter(|processed| **processed == profile)
            .count();
        assert_eq!(occurrences, 1, "profile {name} processed once");
        assert_eq!(value(&env, &format!("from.{name}")).as_deref(), Some("yes"));
    }
    assert_eq!(report.active_profiles, vec!["a", "b", "c"]);
}

#[test]
fn profile_section_reached_by_two_paths_is_merged_once() {
    let resources = MemoryResourceLoader::new()
        .with(
            "classpath:/application.yml",
            "x: base\n---\nprofiles: prod\nbase.prod: yes\n",
        )
        .with(
            "classpath:/application-dev.yml",
            "x: dev\n---\nprofiles: prod\nx: dev-prod\n",
        );
    let mut env = environment(&[("profiles.active", "dev,prod")]);
    let report = classpath_root_loader()
        .process(&mut env, &resources, &NullSink)
        .expect("load");

    let names = env.property_sources().names();
    for name in &report.added_sources {
        assert_eq!(
            names.iter().filter(|n| **n == name.as_str()).count(),
            1,
            "{name} merged once"
        );
    }
    assert!(names.contains(&"applicationConfig: [classpath:/application-dev.yml] (document #1)"));
    assert!(names.contains(&"applicationConfig: [classpath:/application.yml] (document #1)"));
    assert_eq!(value(&env, "x").as_deref(), Some("dev-prod"));
    assert_eq!(value(&env, "base.prod").as_deref(), Some("yes"));
}
