//! Property-based tests for the property system and progress reporting.

use parking_lot::Mutex;
use proptest::prelude::*;
use reductionrs::algorithm::{AlgorithmIdentity, CancelFlag, NotificationCenter};
use reductionrs::property::ScalarKind;
use reductionrs::{
    AlgorithmEvent, Direction, EventMask, FrameworkError, Notification, Progress, Property, PropertyKind,
    PropertyManager,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

// =============================================================================
// Declaration uniqueness
// =============================================================================

proptest! {
    /// The first declaration of a name wins; every later one, in any case,
    /// fails with DuplicateName.
    #[test]
    fn prop_names_are_unique(names in prop::collection::vec("[A-Za-z][A-Za-z0-9_]{0,6}", 1..24)) {
        let mut pm = PropertyManager::new();
        let mut seen = HashSet::new();

        for name in &names {
            let result = pm.declare(Property::new(name.as_str(), 0i64));
            if seen.insert(name.to_lowercase()) {
                prop_assert!(result.is_ok());
            } else {
                let is_duplicate = matches!(result, Err(FrameworkError::DuplicateName { .. }));
                prop_assert!(is_duplicate);
            }
        }

        prop_assert_eq!(pm.len(), seen.len());
        for name in &names {
            prop_assert!(pm.get_property(name).is_ok());
        }
    }
}

// =============================================================================
// Default tracking
// =============================================================================

proptest! {
    #[test]
    fn prop_default_tracking(default: i64, other: i64) {
        let mut property = Property::new("Value", default);
        prop_assert!(property.is_default());
        prop_assert_eq!(property.value_as_string(), default.to_string());

        property.set_value(other).unwrap();
        prop_assert_eq!(property.is_default(), other == default);
        prop_assert_eq!(property.value_as_string(), other.to_string());

        property.reset();
        prop_assert!(property.is_default());
    }

    #[test]
    fn prop_string_default_tracking(default in ".{0,12}", other in ".{0,12}") {
        let mut property = Property::new("Text", default.as_str());
        property.set_value(other.as_str()).unwrap();
        prop_assert_eq!(property.is_default(), other == default);
        prop_assert_eq!(property.value_as_string(), other);
    }
}

// =============================================================================
// Serialization round trip
// =============================================================================

fn schema() -> PropertyManager {
    let mut pm = PropertyManager::new();
    pm.declare(Property::new("Count", 0i64)).unwrap();
    pm.declare(Property::new("Factor", 1.0)).unwrap();
    pm.declare(Property::new("Title", "")).unwrap();
    pm.declare(Property::new("Enabled", false)).unwrap();
    pm.declare(Property::with_kind("Indices", PropertyKind::ArrayOf(ScalarKind::Int))).unwrap();
    pm.declare(Property::with_kind("Params", PropertyKind::ArrayOf(ScalarKind::Double))).unwrap();
    pm.declare(Property::with_kind("Tags", PropertyKind::ArrayOf(ScalarKind::String))).unwrap();
    pm.declare(Property::with_kind("Flags", PropertyKind::ArrayOf(ScalarKind::Bool))).unwrap();
    pm.declare(Property::new("Result", 0i64).with_direction(Direction::Output)).unwrap();
    pm
}

proptest! {
    #[test]
    fn prop_serialized_form_round_trips(
        count: i64,
        factor in -1.0e12f64..1.0e12,
        title in "[a-zA-Z0-9 ;=,._\\\\-]{0,16}",
        enabled: bool,
        indices in prop::collection::vec(any::<i64>(), 0..6),
        params in prop::collection::vec(-1.0e6f64..1.0e6, 0..6),
        tags in prop::collection::vec("[ a-z;=,\\\\]{0,5}", 0..5),
        flags in prop::collection::vec(any::<bool>(), 0..6),
        result: i64,
    ) {
        let mut source = schema();
        source.set_property("Count", count).unwrap();
        source.set_property("Factor", factor).unwrap();
        source.set_property("Title", title.as_str()).unwrap();
        source.set_property("Enabled", enabled).unwrap();
        source.set_property("Indices", indices.clone()).unwrap();
        source.set_property("Params", params.clone()).unwrap();
        source.set_property("Tags", tags.clone()).unwrap();
        source.set_property("Flags", flags.clone()).unwrap();
        source.set_property("Result", result).unwrap();

        let mut copy = schema();
        copy.set_properties_from_string(&source.as_string()).unwrap();

        prop_assert_eq!(copy.get_value::<i64>("Count").unwrap(), count);
        prop_assert_eq!(copy.get_value::<f64>("Factor").unwrap(), factor);
        prop_assert_eq!(copy.get_value::<String>("Title").unwrap(), title);
        prop_assert_eq!(copy.get_value::<bool>("Enabled").unwrap(), enabled);
        prop_assert_eq!(copy.get_value::<Vec<i64>>("Indices").unwrap(), indices);
        prop_assert_eq!(copy.get_value::<Vec<f64>>("Params").unwrap(), params);
        prop_assert_eq!(copy.get_value::<Vec<String>>("Tags").unwrap(), tags);
        prop_assert_eq!(copy.get_value::<Vec<bool>>("Flags").unwrap(), flags);
        // Outputs are not restored.
        prop_assert_eq!(copy.get_value::<i64>("Result").unwrap(), 0);
    }
}

// =============================================================================
// Progress monotonicity
// =============================================================================

fn observed() -> (Arc<NotificationCenter>, Arc<Mutex<Vec<f64>>>) {
    let center = Arc::new(NotificationCenter::new());
    let fractions = Arc::new(Mutex::new(Vec::new()));
    let sink = fractions.clone();
    center.add(
        Arc::new(move |n: &Notification| {
            if let AlgorithmEvent::Progress { fraction, .. } = n.event {
                sink.lock().push(fraction);
            }
        }),
        EventMask::PROGRESS,
    );
    (center, fractions)
}

proptest! {
    #[test]
    fn prop_progress_is_linear(start in 0.0f64..0.5, width in 0.0f64..0.5, steps in 1usize..50) {
        let (center, fractions) = observed();
        let end = start + width;
        let progress = Progress::new(AlgorithmIdentity::new("P", 1), center, CancelFlag::new(), start, end, steps);

        for i in 1..=steps {
            let expected = start + width * i as f64 / steps as f64;
            prop_assert!((progress.report() - expected).abs() < 1e-12);
        }
        prop_assert_eq!(fractions.lock().len(), steps);
    }

    #[test]
    fn prop_concurrent_reports_are_non_decreasing(threads in 1usize..6, per_thread in 1usize..40) {
        let (center, fractions) = observed();
        let total = threads * per_thread;
        let progress = Arc::new(Progress::new(
            AlgorithmIdentity::new("P", 1),
            center,
            CancelFlag::new(),
            0.2,
            0.8,
            total,
        ));

        let workers: Vec<_> = (0..threads)
            .map(|_| {
                let progress = progress.clone();
                thread::spawn(move || {
                    for _ in 0..per_thread {
                        progress.report();
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }

        let seen = fractions.lock().clone();
        prop_assert_eq!(seen.len(), total);
        prop_assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        prop_assert!((seen[total - 1] - 0.8).abs() < 1e-12);
    }
}

#[test]
fn test_progress_matches_reference_range() {
    let (center, fractions) = observed();
    let progress = Progress::new(AlgorithmIdentity::new("P", 1), center, CancelFlag::new(), 0.2, 0.8, 10);
    for _ in 0..10 {
        progress.report();
    }

    let seen = fractions.lock().clone();
    for (i, f) in seen.iter().enumerate() {
        assert!((f - (0.2 + 0.6 * (i + 1) as f64 / 10.0)).abs() < 1e-12);
    }
}
