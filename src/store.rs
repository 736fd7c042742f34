//! In-memory registry of dispatch targets.
//!
//! `TargetRegistry` maps each notification frequency to the subscribers
//! currently eligible for it. The HTTP confirm/unsubscribe handlers
//! mutate it while the scheduler snapshots it, so all access goes through
//! a shared-read/exclusive-write lock held only for the duration of the
//! map operation, never across fetch or send work. The raw map is not
//! exposed; these four operations are the only way in.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::notifier::types::{Frequency, Subscriber};

/// Thread-safe `Frequency → subscribers` mapping used for dispatch
/// targeting. The database remains the system of record; the registry
/// holds copies, rebuilt once at startup and mutated in place thereafter.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    targets: RwLock<HashMap<Frequency, Vec<Subscriber>>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self {
            targets: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the entire mapping in one step. Concurrent readers observe
    /// either the previous mapping or the new one, never a mix.
    pub async fn load_all(&self, subscribers: Vec<Subscriber>) {
        let mut fresh: HashMap<Frequency, Vec<Subscriber>> = HashMap::new();
        for subscriber in subscribers {
            fresh.entry(subscriber.frequency).or_default().push(subscriber);
        }

        let mut targets = self.targets.write().await;
        *targets = fresh;
    }

    /// Insert into the bucket matching `subscriber.frequency`. A no-op
    /// when an entry with the same email already exists in that bucket.
    pub async fn add(&self, subscriber: Subscriber) {
        let mut targets = self.targets.write().await;
        let bucket = targets.entry(subscriber.frequency).or_default();

        if bucket.iter().any(|existing| existing.email == subscriber.email) {
            return;
        }
        bucket.push(subscriber);
    }

    /// Delete the entry for `email` from the named bucket, if present.
    /// A no-op otherwise; never errors on "not found".
    pub async fn remove(&self, email: &str, frequency: Frequency) {
        let mut targets = self.targets.write().await;
        if let Some(bucket) = targets.get_mut(&frequency) {
            bucket.retain(|subscriber| subscriber.email != email);
        }
    }

    /// Independent copy of one bucket at a point in time, safe to iterate
    /// without holding any lock. Mutations made after the call returns
    /// are not observed.
    pub async fn snapshot(&self, frequency: Frequency) -> Vec<Subscriber> {
        let targets = self.targets.read().await;
        targets.get(&frequency).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn subscriber(email: &str, city: &str, frequency: Frequency) -> Subscriber {
        Subscriber {
            id: 0,
            email: email.to_string(),
            city: city.to_string(),
            frequency,
            token: "tok".to_string(),
            confirmed: true,
            subscribed: true,
        }
    }

    fn emails(snapshot: &[Subscriber]) -> Vec<&str> {
        snapshot.iter().map(|s| s.email.as_str()).collect()
    }

    // ---- load_all ----

    #[tokio::test]
    async fn load_all_partitions_by_frequency() {
        let registry = TargetRegistry::new();
        registry
            .load_all(vec![
                subscriber("a@x", "Kyiv", Frequency::Daily),
                subscriber("b@x", "Lviv", Frequency::Hourly),
            ])
            .await;

        assert_eq!(emails(&registry.snapshot(Frequency::Daily).await), vec!["a@x"]);
        assert_eq!(emails(&registry.snapshot(Frequency::Hourly).await), vec!["b@x"]);
    }

    #[tokio::test]
    async fn load_all_replaces_previous_content_entirely() {
        let registry = TargetRegistry::new();
        registry
            .load_all(vec![
                subscriber("a@x", "Kyiv", Frequency::Daily),
                subscriber("b@x", "Lviv", Frequency::Hourly),
            ])
            .await;
        registry
            .load_all(vec![subscriber("c@x", "Odesa", Frequency::Daily)])
            .await;

        assert_eq!(emails(&registry.snapshot(Frequency::Daily).await), vec!["c@x"]);
        assert!(registry.snapshot(Frequency::Hourly).await.is_empty());
    }

    // ---- add / remove ----

    #[tokio::test]
    async fn add_is_idempotent_per_bucket() {
        let registry = TargetRegistry::new();
        registry.add(subscriber("a@x", "Kyiv", Frequency::Daily)).await;
        registry.add(subscriber("a@x", "Kyiv", Frequency::Daily)).await;

        assert_eq!(registry.snapshot(Frequency::Daily).await.len(), 1);
    }

    #[tokio::test]
    async fn remove_deletes_the_matching_entry() {
        let registry = TargetRegistry::new();
        registry.add(subscriber("a@x", "Kyiv", Frequency::Daily)).await;
        registry.add(subscriber("b@x", "Lviv", Frequency::Daily)).await;

        registry.remove("a@x", Frequency::Daily).await;

        assert_eq!(emails(&registry.snapshot(Frequency::Daily).await), vec!["b@x"]);
    }

    #[tokio::test]
    async fn remove_of_missing_email_is_a_noop() {
        let registry = TargetRegistry::new();
        registry.add(subscriber("a@x", "Kyiv", Frequency::Daily)).await;

        registry.remove("no@one", Frequency::Daily).await;
        registry.remove("a@x", Frequency::Hourly).await;

        assert_eq!(emails(&registry.snapshot(Frequency::Daily).await), vec!["a@x"]);
    }

    // ---- snapshot ----

    #[tokio::test]
    async fn snapshot_is_an_independent_copy() {
        let registry = TargetRegistry::new();
        registry.add(subscriber("a@x", "Kyiv", Frequency::Hourly)).await;

        let before = registry.snapshot(Frequency::Hourly).await;
        registry.add(subscriber("b@x", "Lviv", Frequency::Hourly)).await;
        registry.remove("a@x", Frequency::Hourly).await;

        assert_eq!(emails(&before), vec!["a@x"]);
        assert_eq!(emails(&registry.snapshot(Frequency::Hourly).await), vec!["b@x"]);
    }

    #[tokio::test]
    async fn snapshot_of_unknown_bucket_is_empty() {
        let registry = TargetRegistry::new();
        assert!(registry.snapshot(Frequency::Daily).await.is_empty());
    }

    // ---- uniqueness invariant ----

    #[derive(Debug, Clone)]
    enum Op {
        Add(String, Frequency),
        Remove(String, Frequency),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        // A deliberately tiny address space so that sequences collide.
        let email = prop_oneof![
            Just("a@x".to_string()),
            Just("b@x".to_string()),
            Just("c@x".to_string()),
        ];
        let frequency = prop_oneof![Just(Frequency::Hourly), Just(Frequency::Daily)];
        (email, frequency, any::<bool>()).prop_map(|(email, frequency, add)| {
            if add {
                Op::Add(email, frequency)
            } else {
                Op::Remove(email, frequency)
            }
        })
    }

    proptest! {
        #[test]
        fn buckets_never_contain_duplicate_emails(ops in proptest::collection::vec(op_strategy(), 0..64)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("test runtime");

            let duplicate_free = runtime.block_on(async {
                let registry = TargetRegistry::new();
                for op in ops {
                    match op {
                        Op::Add(email, frequency) => {
                            registry.add(subscriber(&email, "Kyiv", frequency)).await;
                        }
                        Op::Remove(email, frequency) => {
                            registry.remove(&email, frequency).await;
                        }
                    }
                }

                for frequency in Frequency::ALL {
                    let snapshot = registry.snapshot(frequency).await;
                    let mut seen: Vec<&str> = snapshot.iter().map(|s| s.email.as_str()).collect();
                    seen.sort_unstable();
                    let len = seen.len();
                    seen.dedup();
                    if seen.len() != len {
                        return false;
                    }
                }
                true
            });

            prop_assert!(duplicate_free);
        }
    }
}
