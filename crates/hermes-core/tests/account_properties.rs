//! Property-based tests for time account slicing, reversal and indexing.

use proptest::prelude::*;

use chrono::{DateTime, Duration, TimeZone, Utc};
use hermes_core::{AccountError, Clipped, OrdinalSlice, Tag, TimeAccount, TimeInterval};

// =============================================================================
// Strategy helpers
// =============================================================================

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 4, 16, 0, 0, 0).unwrap()
}

fn interval_strategy() -> impl Strategy<Value = TimeInterval> {
    (0_i64..1_000, 0_i64..120).prop_map(|(start, width)| {
        let start = epoch() + Duration::minutes(start);
        TimeInterval::new(start, start + Duration::minutes(width)).unwrap()
    })
}

fn tag_strategy() -> impl Strategy<Value = Tag> {
    "[A-Z][a-z]{0,4}".prop_map(|name| Tag::new(name).unwrap())
}

/// Up to 12 records, each placing one to three tags over an interval.
fn account_strategy() -> impl Strategy<Value = TimeAccount> {
    prop::collection::vec(
        (interval_strategy(), prop::collection::vec(tag_strategy(), 1..=3)),
        0..=12,
    )
    .prop_map(|records| {
        let mut builder = TimeAccount::builder();
        for (interval, tags) in records {
            builder.record(interval, tags).unwrap();
        }
        builder.build()
    })
}

fn names(account: &TimeAccount) -> Vec<String> {
    account.iter().map(|tag| tag.name().to_string()).collect()
}

/// Bounds that are usually near the data, sometimes anywhere in `isize`.
fn bound_strategy() -> impl Strategy<Value = Option<isize>> {
    prop::option::of(prop_oneof![3 => -20_isize..20, 1 => any::<isize>()])
}

fn step_strategy() -> impl Strategy<Value = isize> {
    prop_oneof![3 => -5_isize..=5, 1 => any::<isize>()].prop_filter("non-zero step", |s| *s != 0)
}

/// Positions picked by a Python-style `seq[start:stop:step]` over `len` items,
/// computed the slow way in `i128` so no bound or step can overflow.
fn python_slice(len: usize, start: Option<isize>, stop: Option<isize>, step: isize) -> Vec<usize> {
    let len = i128::try_from(len).unwrap();
    let step = i128::try_from(step).unwrap();
    let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };
    let clamp = |bound: Option<isize>, default: i128| match bound {
        None => default,
        Some(bound) => {
            let bound = i128::try_from(bound).unwrap();
            let bound = if bound < 0 { bound + len } else { bound };
            bound.clamp(lower, upper)
        }
    };
    let (first, last) = if step < 0 {
        (clamp(start, upper), clamp(stop, lower))
    } else {
        (clamp(start, lower), clamp(stop, upper))
    };

    let mut picked = Vec::new();
    let mut cursor = first;
    while (step > 0 && cursor < last) || (step < 0 && cursor > last) {
        picked.push(usize::try_from(cursor).unwrap());
        cursor += step;
    }
    picked
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn full_slice_is_equal_copy(account in account_strategy()) {
        let copy = account.slice(..).unwrap();
        prop_assert_eq!(copy.len(), account.len());
        prop_assert_eq!(&copy, &account);
    }

    #[test]
    fn reversal_matches_negative_step(account in account_strategy()) {
        let reversed = account.reversed();
        prop_assert_eq!(&reversed, &account.slice(OrdinalSlice::reversed()).unwrap());

        let mut forwards = names(&account);
        forwards.reverse();
        let backwards: Vec<String> = account.iter_reversed().map(|t| t.name().to_string()).collect();
        prop_assert_eq!(&backwards, &forwards);
        prop_assert_eq!(names(&reversed), forwards);
    }

    #[test]
    fn double_reversal_is_identity(account in account_strategy()) {
        prop_assert_eq!(account.reversed().reversed(), account);
    }

    #[test]
    fn valid_indices_are_deterministic(account in account_strategy(), seed in any::<prop::sample::Index>()) {
        prop_assume!(!account.is_empty());
        let len = isize::try_from(account.len()).unwrap();
        let i = isize::try_from(seed.index(account.len())).unwrap();

        let first = account.get(i).unwrap();
        prop_assert_eq!(first, account.get(i).unwrap());
        prop_assert_eq!(first, account.get(i - len).unwrap());
        prop_assert_eq!(first, &account[seed.index(account.len())]);
    }

    #[test]
    fn out_of_bounds_indices_fail(account in account_strategy(), beyond in 0_isize..50) {
        let len = isize::try_from(account.len()).unwrap();
        for index in [len + beyond, -len - beyond] {
            prop_assert_eq!(
                account.get(index),
                Err(AccountError::OutOfRange { index, len: account.len() })
            );
        }
    }

    #[test]
    fn queries_outside_the_data_are_empty(account in account_strategy(), offset in 1_i64..500) {
        // every generated interval ends before minute 1120
        let start = epoch() + Duration::minutes(1_200 + offset);
        let query = TimeInterval::new(start, start + Duration::minutes(30)).unwrap();
        let result = account.slice(query).unwrap();
        prop_assert_eq!(result.len(), 0);
        prop_assert!(account.slice(start).unwrap().is_empty());
    }

    #[test]
    fn temporal_slices_keep_only_intersecting_taggings(
        account in account_strategy(),
        query in interval_strategy(),
    ) {
        let sliced = account.slice(query).unwrap();
        prop_assert!(sliced.len() <= account.len());
        prop_assert!(sliced.taggings().all(|t| t.interval().intersects(&query)));

        let expected = account.taggings().filter(|t| t.interval().intersects(&query)).count();
        prop_assert_eq!(sliced.len(), expected);
    }

    #[test]
    fn clipped_slices_stay_within_the_query(
        account in account_strategy(),
        query in interval_strategy(),
    ) {
        let sliced = account.with_strategy(Clipped).slice(query).unwrap();
        prop_assert!(sliced.taggings().all(|t| t.interval().during(&query)));
    }

    #[test]
    fn iteration_is_chronological(account in account_strategy()) {
        let starts: Vec<_> = account.taggings().map(|t| t.interval().start()).collect();
        prop_assert!(starts.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn ordinal_slices_never_exceed_the_source(
        account in account_strategy(),
        start in -15_isize..15,
        stop in -15_isize..15,
        step in prop_oneof![-3_isize..=-1, 1_isize..=3],
    ) {
        let sliced = account.slice(OrdinalSlice::new(Some(start), Some(stop), Some(step))).unwrap();
        prop_assert!(sliced.len() <= account.len());
        prop_assert!(sliced.iter().all(|tag| account.has_tag(tag)));
    }

    #[test]
    fn ordinal_slices_match_python_semantics(
        account in account_strategy(),
        start in bound_strategy(),
        stop in bound_strategy(),
        step in step_strategy(),
    ) {
        let all = names(&account);
        let expected: Vec<String> = python_slice(account.len(), start, stop, step)
            .into_iter()
            .map(|position| all[position].clone())
            .collect();
        let sliced = account.slice(OrdinalSlice::new(start, stop, Some(step))).unwrap();
        prop_assert_eq!(names(&sliced), expected);

        let defaulted = account.slice(OrdinalSlice::new(start, stop, None)).unwrap();
        prop_assert_eq!(names(&defaulted), python_slice(account.len(), start, stop, 1)
            .into_iter()
            .map(|position| all[position].clone())
            .collect::<Vec<_>>());
    }
}
