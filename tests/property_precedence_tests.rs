//! Property-based checks of search-location precedence.

use std::sync::Arc;

use proptest::prelude::*;

use layercfg::{ConfigurationLoader, Environment, MemoryResourceLoader, NullSink, PropertySource};

/// Distinct directory names, in the order they are configured.
fn directories_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z]{1,8}", 1..6)
        .prop_flat_map(|set| Just(set.into_iter().collect::<Vec<_>>()).prop_shuffle())
}

proptest! {
    #[test]
    fn later_locations_take_precedence(directories in directories_strategy()) {
        let mut resources = MemoryResourceLoader::new();
        for (index, directory) in directories.iter().enumerate() {
            resources.insert(
                &format!("classpath:/{directory}/application.properties"),
                &format!("x={index}\nonly.{directory}={index}\n"),
            );
        }
        let locations: Vec<String> = directories
            .iter()
            .map(|directory| format!("classpath:/{directory}/"))
            .collect();

        let mut env = Environment::new();
        env.property_sources_mut().add_last(Arc::new(PropertySource::from_pairs(
            "commandLineArgs",
            [("config.location", locations.join(","))],
        )));
        let report = ConfigurationLoader::new()
            .process(&mut env, &resources, &NullSink)
            .expect("load");

        let last = directories.len() - 1;
        prop_assert_eq!(env.get_property("x").expect("x"), Some(last.to_string()));
        prop_assert_eq!(report.added_sources.len(), directories.len());

        let expected: Vec<String> = directories
            .iter()
            .rev()
            .map(|directory| format!("applicationConfig: [classpath:/{directory}/application.properties]"))
            .collect();
        prop_assert_eq!(report.added_sources, expected);
    }
}
