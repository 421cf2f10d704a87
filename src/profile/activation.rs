use std::collections::{HashSet, VecDeque};

use super::Profile;
use crate::binder::Binder;
use crate::diagnostics::{DiagnosticsSink, Event};
use crate::environment::{ACTIVE_PROFILES_PROPERTY, Environment, INCLUDE_PROFILES_PROPERTY};
use crate::error::Result;
use crate::property_source::PropertySource;

/// Profile work queue for one load.
///
/// Profiles move from queued to processed exactly once. Documents discovered
/// while a profile is processed may activate further profiles (appended to
/// the queue) or include them (pushed to the front), so the load runs until
/// no new profile appears.
#[derive(Debug, Default)]
pub struct ProfileActivation {
    queue: VecDeque<Profile>,
    processed: Vec<Profile>,
    processed_set: HashSet<Profile>,
    activated: bool,
}

impl ProfileActivation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the queue from the environment: the unscoped profile first, then
    /// profiles already active, then `profiles.include`, then
    /// `profiles.active`. With nothing named, the default profiles are queued.
    pub fn initialize(
        environment: &Environment,
        binder: &dyn Binder,
        sink: &dyn DiagnosticsSink,
    ) -> Result<Self> {
        let mut activation = Self::new();
        activation.queue.push_back(Profile::Unscoped);
        let activated_via_property =
            profiles_from_property(environment, binder, ACTIVE_PROFILES_PROPERTY)?;
        let included_via_property =
            profiles_from_property(environment, binder, INCLUDE_PROFILES_PROPERTY)?;
        let other_active: Vec<Profile> = environment
            .active_profiles()?
            .into_iter()
            .map(Profile::named)
            .filter(|profile| {
                !activated_via_property.contains(profile) && !included_via_property.contains(profile)
            })
            .collect();
        activation.queue.extend(other_active);
        activation.queue.extend(included_via_property);
        activation.activate(activated_via_property, sink);
        if activation.queue.len() == 1 {
            for name in environment.default_profiles()? {
                activation.queue.push_back(Profile::default_profile(name));
            }
        }
        Ok(activation)
    }

    /// Queues `profiles` and locks activation. Later calls are ignored, and
    /// any default profile still waiting in the queue is dropped.
    pub fn activate(&mut self, profiles: Vec<Profile>, sink: &dyn DiagnosticsSink) {
        if profiles.is_empty() {
            return;
        }
        if self.activated {
            sink.record(Event::ActivationIgnored {
                profiles: names(&profiles),
            });
            return;
        }
        sink.record(Event::ProfilesActivated {
            profiles: names(&profiles),
        });
        self.queue.extend(profiles);
        self.activated = true;
        self.queue.retain(|profile| !profile.is_default());
    }

    /// Puts `profiles` ahead of everything still queued, skipping processed ones.
    pub fn include(&mut self, profiles: Vec<Profile>, sink: &dyn DiagnosticsSink) {
        if profiles.is_empty() {
            return;
        }
        sink.record(Event::ProfilesIncluded {
            profiles: names(&profiles),
        });
        let mut queue: VecDeque<Profile> = profiles.into_iter().collect();
        queue.extend(self.queue.drain(..));
        queue.retain(|profile| !self.processed_set.contains(profile));
        self.queue = queue;
    }

    /// Next profile that has not been processed yet.
    pub fn next_pending(&mut self) -> Option<Profile> {
        while let Some(profile) = self.queue.pop_front() {
            if !self.processed_set.contains(&profile) {
                return Some(profile);
            }
        }
        None
    }

    pub fn mark_processed(&mut self, profile: Profile) {
        if self.processed_set.insert(profile.clone()) {
            self.processed.push(profile);
        }
    }

    /// Processed profiles in completion order.
    pub fn processed(&self) -> &[Profile] {
        &self.processed
    }

    pub fn pending(&self) -> impl Iterator<Item = &Profile> {
        self.queue.iter()
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// The active-profile list written back once the queue drains: profiles
    /// included by the default properties, the ones they activate unless an
    /// explicit activation happened, then every processed named profile that
    /// was not a fallback default.
    pub fn final_active_profiles(
        &self,
        default_properties: Option<&PropertySource>,
        binder: &dyn Binder,
        environment: &Environment,
    ) -> Result<Vec<String>> {
        let mut active = Vec::new();
        if let Some(defaults) = default_properties {
            let sources = [defaults];
            active.extend(
                binder
                    .bind_list(&sources, INCLUDE_PROFILES_PROPERTY, environment)?
                    .unwrap_or_default(),
            );
            if !self.activated {
                active.extend(
                    binder
                        .bind_list(&sources, ACTIVE_PROFILES_PROPERTY, environment)?
                        .unwrap_or_default(),
                );
            }
        }
        active.extend(
            self.processed
                .iter()
                .filter(|profile| profile.is_explicit())
                .filter_map(|profile| profile.name().map(str::to_string)),
        );
        let mut seen = HashSet::new();
        active.retain(|name| seen.insert(name.clone()));
        Ok(active)
    }
}

/// Profiles named by `property` anywhere in the environment, deduplicated in order.
pub fn profiles_from_property(
    environment: &Environment,
    binder: &dyn Binder,
    property: &str,
) -> Result<Vec<Profile>> {
    if !environment.contains_property(property) {
        return Ok(Vec::new());
    }
    let sources: Vec<&PropertySource> = environment
        .property_sources()
        .iter()
        .map(|source| source.as_ref())
        .collect();
    let names = binder
        .bind_list(&sources, property, environment)?
        .unwrap_or_default();
    Ok(profiles_as_set(names))
}

pub(crate) fn profiles_as_set(names: Vec<String>) -> Vec<Profile> {
    let mut profiles: Vec<Profile> = Vec::with_capacity(names.len());
    for name in names {
        let profile = Profile::named(name);
        if !profiles.contains(&profile) {
            profiles.push(profile);
        }
    }
    profiles
}

fn names(profiles: &[Profile]) -> Vec<String> {
    profiles
        .iter()
        .filter_map(|profile| profile.name().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::binder::PropertyBinder;
    use crate::diagnostics::{NullSink, RecordingSink};

    fn environment(pairs: &[(&str, &str)]) -> Environment {
        let mut env = Environment::new();
        env.property_sources_mut().add_last(Arc::new(PropertySource::from_pairs(
            "commandLineArgs",
            pairs.iter().copied(),
        )));
        env
    }

    fn drain(activation: &mut ProfileActivation) -> Vec<Profile> {
        let mut order = Vec::new();
        while let Some(profile) = activation.next_pending() {
            order.push(profile.clone());
            activation.mark_processed(profile);
        }
        order
    }

    #[test]
    fn falls_back_to_default_profiles() {
        let env = environment(&[]);
        let mut activation =
            ProfileActivation::initialize(&env, &PropertyBinder, &NullSink).expect("init");
        let order = drain(&mut activation);
        assert_eq!(order, vec![Profile::Unscoped, Profile::named("default")]);
        assert!(order[1].is_default());
        assert!(!activation.is_activated());
    }

    #[test]
    fn initial_order_is_other_then_include_then_active() {
        let mut env = environment(&[("profiles.active", "dev"), ("profiles.include", "shared")]);
        env.set_active_profiles(vec!["manual".into(), "dev".into()])
            .expect("set");
        let mut activation =
            ProfileActivation::initialize(&env, &PropertyBinder, &NullSink).expect("init");
        assert!(activation.is_activated());
        let order: Vec<_> = drain(&mut activation)
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(order, vec!["(no profile)", "manual", "shared", "dev"]);
    }

    #[test]
    fn explicit_activation_preempts_defaults_and_locks() {
        let env = environment(&[]);
        let sink = RecordingSink::new();
        let mut activation =
            ProfileActivation::initialize(&env, &PropertyBinder, &sink).expect("init");
        assert_eq!(activation.pending().count(), 2);
        activation.activate(vec![Profile::named("dev")], &sink);
        activation.activate(vec![Profile::named("prod")], &sink);
        let order = drain(&mut activation);
        assert_eq!(order, vec![Profile::Unscoped, Profile::named("dev")]);
        assert_eq!(
            sink.count(|e| matches!(e, Event::ActivationIgnored { .. })),
            1
        );
    }

    #[test]
    fn includes_jump_the_queue_without_reprocessing() {
        let mut activation = ProfileActivation::new();
        activation.queue.extend([Profile::Unscoped, Profile::named("a"), Profile::named("b")]);
        let first = activation.next_pending().expect("first");
        activation.mark_processed(first);
        activation.include(
            vec![Profile::named("c"), Profile::Unscoped, Profile::named("b")],
            &NullSink,
        );
        let order: Vec<_> = drain(&mut activation)
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(order, vec!["c", "b", "a"]);
        activation.include(vec![Profile::named("a")], &NullSink);
        assert!(activation.next_pending().is_none());
        assert_eq!(activation.processed().len(), 4);
    }

    #[test]
    fn final_profiles_skip_fallback_defaults() {
        let env = environment(&[]);
        let mut activation =
            ProfileActivation::initialize(&env, &PropertyBinder, &NullSink).expect("init");
        drain(&mut activation);
        let defaults = PropertySource::from_pairs(
            "defaultProperties",
            [("profiles.include", "base"), ("profiles.active", "local")],
        );
        let active = activation
            .final_active_profiles(Some(&defaults), &PropertyBinder, &env)
            .expect("final");
        assert_eq!(active, vec!["base", "local"]);
    }

    #[test]
    fn final_profiles_ignore_default_activation_after_explicit_one() {
        let env = environment(&[("profiles.active", "dev")]);
        let mut activation =
            ProfileActivation::initialize(&env, &PropertyBinder, &NullSink).expect("init");
        drain(&mut activation);
        let defaults = PropertySource::from_pairs("defaultProperties", [("profiles.active", "local")]);
        let active = activation
            .final_active_profiles(Some(&defaults), &PropertyBinder, &env)
            .expect("final");
        assert_eq!(active, vec!["dev"]);
    }
}
