mod hashmap {
    use std::collections::HashMap as ModelMap;
    use std::panic::{RefUnwindSafe, UnwindSafe};

    use proptest::prelude::*;

    use crate::{Error, HashMap};

    static_assertions::assert_impl_all!(HashMap<u64, f64>: Send, Sync, RefUnwindSafe, UnwindSafe);
    static_assertions::assert_impl_all!(crate::Cursor<u64>: Send, Sync);

    #[test]
    fn insert_returns_previous() {
        let mut map: HashMap<u64, i64> = HashMap::new();
        assert_eq!(map.insert(5, 100), None);
        assert_eq!(map.insert(5, 200), Some(100));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(5), Some(200));
    }

    #[test]
    fn insert_get_remove() {
        let mut map: HashMap<u64, u64> = HashMap::new();
        let workload_size = 256;
        for k in 0..workload_size {
            assert_eq!(map.insert(k, k * 2), None);
        }
        assert_eq!(map.len() as u64, workload_size);
        for k in 0..workload_size {
            assert!(map.contains_key(k));
            assert_eq!(map.get(k), Some(k * 2));
        }
        assert_eq!(map.get(workload_size), None);
        for k in 0..workload_size {
            assert_eq!(map.remove(k), Some(k * 2));
            assert_eq!(map.remove(k), None);
        }
        assert!(map.is_empty());
    }

    #[test]
    fn growth_preserves_mappings() {
        let mut map: HashMap<u64, u64> = HashMap::with_capacity(16);
        let initial_capacity = map.capacity();
        assert!(initial_capacity.is_power_of_two());
        for k in 0..4096 {
            assert_eq!(map.insert(k, !k), None);
        }
        assert!(map.capacity() > initial_capacity);
        assert!(map.capacity().is_power_of_two());
        for k in 0..4096 {
            assert_eq!(map.get(k), Some(!k));
        }
    }

    #[test]
    fn zero_capacity() {
        let mut map: HashMap<u64, u64> = HashMap::with_capacity(0);
        assert!(map.capacity() >= 1);
        assert_eq!(map.insert(1, 1), None);
        assert_eq!(map.get(1), Some(1));
    }

    #[test]
    fn invalid_load_factor() {
        for load_factor in [0.0_f32, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                HashMap::<u64, u64>::with_capacity_and_load_factor(16, load_factor),
                Err(Error::InvalidLoadFactor(_))
            ));
        }
        let map = HashMap::<u64, u64>::with_capacity_and_load_factor(16, 0.5).unwrap();
        assert_eq!(map.load_factor(), 0.5);
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut map: HashMap<u32, i32> = HashMap::new();
        map.insert(7, 1);
        if let Some(value) = map.get_mut(7) {
            *value += 41;
        }
        assert_eq!(map.get(7), Some(42));
    }

    #[test]
    fn contains_value() {
        let mut map: HashMap<u64, char> = HashMap::new();
        map.insert(1, 'a');
        map.insert(2, 'b');
        assert!(map.contains_value('a'));
        assert!(!map.contains_value('z'));
    }

    #[test]
    fn retain_keeps_matching() {
        let mut map: HashMap<u64, u64> = HashMap::new();
        for k in 0..64 {
            map.insert(k, k);
        }
        map.retain(|k, _| k % 2 == 0);
        assert_eq!(map.len(), 32);
        for k in 0..64 {
            assert_eq!(map.contains_key(k), k % 2 == 0);
        }
    }

    #[test]
    fn retain_predicate_updates_kept_values() {
        let mut map: HashMap<u64, u64> = (0..64).map(|k| (k, k)).collect();
        map.retain(|k, v| {
            *v = k * 10;
            k % 2 == 0
        });
        assert_eq!(map.len(), 32);
        for k in (0..64).step_by(2) {
            assert_eq!(map.get(k), Some(k * 10));
        }
        map.retain(|_, _| false);
        assert!(map.is_empty());
        assert_eq!(map.insert(1, 1), None);
    }

    #[test]
    fn iter_visits_everything() {
        let mut map: HashMap<u16, u16> = HashMap::new();
        for k in 0..128 {
            map.insert(k, k + 1);
        }
        let mut seen: Vec<(u16, u16)> = map.iter().collect();
        seen.sort_unstable();
        let expected: Vec<(u16, u16)> = (0..128).map(|k| (k, k + 1)).collect();
        assert_eq!(seen, expected);

        let mut keys: Vec<u16> = map.keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..128).collect::<Vec<u16>>());

        let mut values: Vec<u16> = map.values().collect();
        values.sort_unstable();
        assert_eq!(values, (1..129).collect::<Vec<u16>>());
    }

    #[test]
    fn iter_mut_updates_all() {
        let mut map: HashMap<u64, u64> = HashMap::new();
        for k in 0..64 {
            map.insert(k, k);
        }
        for (_, value) in map.iter_mut() {
            *value *= 2;
        }
        for k in 0..64 {
            assert_eq!(map.get(k), Some(k * 2));
        }
    }

    #[test]
    fn cursor_visits_everything() {
        let map: HashMap<u64, u64> = (0..64).map(|k| (k, k)).collect();
        let mut cursor = map.cursor();
        let mut seen = Vec::new();
        while let Some((key, value)) = cursor.next(&map).unwrap() {
            assert_eq!(key, value);
            seen.push(key);
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..64).collect::<Vec<u64>>());
        // Exhausted cursors stay exhausted.
        assert_eq!(cursor.next(&map).unwrap(), None);
    }

    #[test]
    fn cursor_fails_fast_on_structural_change() {
        let mut map: HashMap<u64, u64> = (0..16).map(|k| (k, k)).collect();
        let mut cursor = map.cursor();
        assert!(cursor.next(&map).unwrap().is_some());
        map.insert(100, 100);
        assert_eq!(cursor.next(&map), Err(Error::ConcurrentModification));

        let mut cursor = map.cursor();
        assert!(cursor.next(&map).unwrap().is_some());
        map.remove(100);
        assert_eq!(cursor.next(&map), Err(Error::ConcurrentModification));

        let mut cursor = map.cursor();
        map.retain(|k, _| k < 8);
        assert_eq!(cursor.next(&map), Err(Error::ConcurrentModification));

        let mut cursor = map.cursor();
        map.clear();
        assert_eq!(cursor.next(&map), Err(Error::ConcurrentModification));
    }

    #[test]
    fn cursor_tolerates_value_replacement() {
        let mut map: HashMap<u64, u64> = (0..16).map(|k| (k, k)).collect();
        let mut cursor = map.cursor();
        assert!(cursor.next(&map).unwrap().is_some());
        // Replacing an existing value is not a structural change.
        assert_eq!(map.insert(3, 33), Some(3));
        assert!(cursor.next(&map).unwrap().is_some());
    }

    #[test]
    fn cursor_remove_current() {
        let mut map: HashMap<u64, u64> = (0..64).map(|k| (k, k * 3)).collect();
        let mut cursor = map.cursor();
        while let Some((_, value)) = cursor.next(&map).unwrap() {
            assert_eq!(cursor.remove_current(&mut map).unwrap(), Some(value));
        }
        assert!(map.is_empty());
    }

    #[test]
    fn clone_is_independent() {
        let mut map: HashMap<u64, u64> = (0..256).map(|k| (k, k)).collect();
        let cloned = map.clone();
        assert_eq!(map, cloned);
        map.insert(1000, 1000);
        map.remove(0);
        assert_eq!(cloned.len(), 256);
        assert_eq!(cloned.get(0), Some(0));
        assert_eq!(cloned.get(1000), None);
    }

    #[test]
    fn extend_and_equality() {
        let mut map: HashMap<u64, u64> = HashMap::new();
        map.extend_from(&(0..32).map(|k| (k, k)).collect::<HashMap<u64, u64>>());
        let other: HashMap<u64, u64> = (0..32).rev().map(|k| (k, k)).collect();
        assert_eq!(map, other);
        map.insert(0, 1);
        assert_ne!(map, other);
    }

    #[test]
    fn clear_empties() {
        let mut map: HashMap<u64, u64> = (0..512).map(|k| (k, k)).collect();
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.get(1), None);
        assert_eq!(map.insert(1, 1), None);
    }

    #[test]
    fn signed_and_bool_keys() {
        let mut signed: HashMap<i64, u8> = HashMap::new();
        signed.insert(-1, 1);
        signed.insert(i64::MIN, 2);
        signed.insert(i64::MAX, 3);
        assert_eq!(signed.get(-1), Some(1));
        assert_eq!(signed.get(i64::MIN), Some(2));
        assert_eq!(signed.get(i64::MAX), Some(3));

        let mut flags: HashMap<bool, u64> = HashMap::new();
        flags.insert(true, 1);
        flags.insert(false, 0);
        assert_eq!(flags.len(), 2);
        assert_eq!(flags.get(true), Some(1));
    }

    proptest! {
        #[cfg_attr(miri, ignore)]
        #[test]
        fn model_equivalence(ops in proptest::collection::vec((0_u16..64, any::<i32>(), any::<bool>()), 0..512)) {
            let mut map: HashMap<u16, i32> = HashMap::new();
            let mut model: ModelMap<u16, i32> = ModelMap::new();
            for (key, value, remove) in ops {
                if remove {
                    assert_eq!(map.remove(key), model.remove(&key));
                } else {
                    assert_eq!(map.insert(key, value), model.insert(key, value));
                }
                assert_eq!(map.len(), model.len());
            }
            for key in 0_u16..64 {
                assert_eq!(map.get(key), model.get(&key).copied());
            }
        }
    }
}

mod cowlist {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering::{Acquire, Release};
    use std::sync::{Arc, Barrier};
    use std::thread;

    use proptest::prelude::*;

    use crate::{CowList, Error, SubList};

    static_assertions::assert_impl_all!(CowList<u64>: Send, Sync);
    static_assertions::assert_impl_all!(SubList<'static, u64>: Send, Sync);

    #[test]
    fn push_get_len() {
        let list: CowList<u64> = CowList::new();
        assert!(list.is_empty());
        for k in 0..64 {
            list.push(k);
        }
        assert_eq!(list.len(), 64);
        for k in 0..64 {
            assert_eq!(list.get(k as usize), Some(k));
        }
        assert_eq!(list.get(64), None);
    }

    #[test]
    fn iterator_ignores_later_mutation() {
        let list: CowList<u64> = CowList::from(vec![1, 2, 3]);
        let iter = list.iter();
        list.push(4);
        assert!(list.remove(1));
        assert_eq!(iter.collect::<Vec<u64>>(), vec![1, 2, 3]);
        assert_eq!(list.to_vec(), vec![2, 3, 4]);
    }

    #[test]
    fn iterator_is_double_ended() {
        let list: CowList<u64> = CowList::from(vec![1, 2, 3, 4]);
        let mut iter = list.iter();
        assert_eq!(iter.len(), 4);
        assert_eq!(iter.next(), Some(1));
        assert_eq!(iter.next_back(), Some(4));
        assert_eq!(iter.index(), 1);
        assert_eq!(iter.as_slice(), &[2, 3]);
        assert_eq!(iter.next(), Some(2));
        assert_eq!(iter.next(), Some(3));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn iter_at_bounds() {
        let list: CowList<u64> = CowList::from(vec![1, 2, 3]);
        assert_eq!(list.iter_at(1).unwrap().collect::<Vec<u64>>(), vec![2, 3]);
        assert_eq!(list.iter_at(3).unwrap().count(), 0);
        assert_eq!(
            list.iter_at(4).err(),
            Some(Error::OutOfBounds { index: 4, len: 3 })
        );
    }

    #[test]
    fn insert_set_remove_at() {
        let list: CowList<u64> = CowList::from(vec![10, 30]);
        list.insert(1, 20).unwrap();
        assert_eq!(list.to_vec(), vec![10, 20, 30]);
        assert_eq!(list.set(2, 31).unwrap(), 30);
        assert_eq!(list.remove_at(0).unwrap(), 10);
        assert_eq!(list.to_vec(), vec![20, 31]);
        assert_eq!(
            list.insert(3, 0).err(),
            Some(Error::OutOfBounds { index: 3, len: 2 })
        );
        assert_eq!(
            list.set(2, 0).err(),
            Some(Error::OutOfBounds { index: 2, len: 2 })
        );
        assert_eq!(
            list.remove_at(2).err(),
            Some(Error::OutOfBounds { index: 2, len: 2 })
        );
    }

    #[test]
    fn remove_by_value() {
        let list: CowList<u64> = CowList::from(vec![10, 20, 10]);
        assert!(list.remove(10));
        assert_eq!(list.to_vec(), vec![20, 10]);
        // The last slot takes the separate check path.
        assert!(list.remove(10));
        assert_eq!(list.to_vec(), vec![20]);
        assert!(!list.remove(30));
        list.clear();
        assert!(!list.remove(20));
    }

    #[test]
    fn remove_range_bounds() {
        let list: CowList<u64> = CowList::from(vec![10, 20, 30, 40]);
        assert_eq!(
            list.remove_range(1, 5).err(),
            Some(Error::InvalidRange {
                start: 1,
                end: 5,
                len: 4
            })
        );
        assert_eq!(
            list.remove_range(2, 1).err(),
            Some(Error::InvalidRange {
                start: 2,
                end: 1,
                len: 4
            })
        );
        list.remove_range(1, 3).unwrap();
        assert_eq!(list.to_vec(), vec![10, 40]);

        let empty: CowList<u64> = CowList::new();
        assert!(empty.remove_range(0, 0).is_err());
    }

    #[test]
    fn bulk_set_operations() {
        let list: CowList<u64> = CowList::from(vec![1, 2, 3, 2]);
        assert!(list.contains_all(&[1, 3]));
        assert!(!list.contains_all(&[1, 4]));

        assert!(list.remove_all(&[2, 4]));
        assert_eq!(list.to_vec(), vec![1, 3]);
        assert!(!list.remove_all(&[9]));

        assert!(list.retain_all(&[3]));
        assert_eq!(list.to_vec(), vec![3]);
        assert!(!list.retain_all(&[3]));
    }

    #[test]
    fn add_if_absent() {
        let list: CowList<u64> = CowList::from(vec![1]);
        assert!(list.add_if_absent(2));
        assert!(!list.add_if_absent(2));
        assert_eq!(list.to_vec(), vec![1, 2]);
    }

    #[test]
    fn add_all_absent_dedupes_batch() {
        let list: CowList<u64> = CowList::from(vec![1, 2]);
        assert_eq!(list.add_all_absent(&[2, 3, 2]), 1);
        assert_eq!(list.to_vec(), vec![1, 2, 3]);
        assert_eq!(list.add_all_absent(&[]), 0);
        assert_eq!(list.add_all_absent(&[1, 2, 3]), 0);
    }

    #[test]
    fn insert_all_splices() {
        let list: CowList<u64> = CowList::from(vec![1, 4]);
        assert!(list.insert_all(1, &[2, 3]).unwrap());
        assert_eq!(list.to_vec(), vec![1, 2, 3, 4]);
        assert!(!list.insert_all(0, &[]).unwrap());
        assert!(list.insert_all(5, &[9]).is_err());
    }

    #[test]
    fn searching() {
        let list: CowList<i32> = CowList::from(vec![5, -1, 5, 2]);
        assert_eq!(list.index_of(5), Some(0));
        assert_eq!(list.index_of_from(5, 1), Some(2));
        assert_eq!(list.index_of_from(5, 3), None);
        assert_eq!(list.last_index_of(5), Some(2));
        assert_eq!(list.last_index_of_from(5, 1), Some(0));
        assert_eq!(list.index_of(9), None);
        assert_eq!(list.last_index_of(9), None);
    }

    #[test]
    fn sub_list_mutation() {
        let list: CowList<u64> = CowList::from(vec![10, 20, 30, 40]);
        let mut view = list.sub_list(1, 3).unwrap();
        assert_eq!(view.len().unwrap(), 2);
        assert_eq!(view.get(0).unwrap(), 20);
        assert_eq!(view.remove_at(0).unwrap(), 20);
        assert_eq!(list.to_vec(), vec![10, 30, 40]);
        assert_eq!(view.iter().unwrap().collect::<Vec<u64>>(), vec![30]);
        view.push(35).unwrap();
        assert_eq!(list.to_vec(), vec![10, 30, 35, 40]);
        assert_eq!(view.set(0, 31).unwrap(), 30);
        view.clear().unwrap();
        assert_eq!(list.to_vec(), vec![10, 40]);
        assert!(view.is_empty().unwrap());
    }

    #[test]
    fn sub_list_fails_fast() {
        let list: CowList<u64> = CowList::from(vec![10, 20, 30, 40]);
        let mut view = list.sub_list(1, 3).unwrap();
        list.push(50);
        assert_eq!(view.get(0), Err(Error::ConcurrentModification));
        assert_eq!(view.len(), Err(Error::ConcurrentModification));
        assert_eq!(view.remove_at(0), Err(Error::ConcurrentModification));
        assert!(view.iter().is_err());
    }

    #[test]
    fn sub_list_survives_equal_set() {
        let list: CowList<u64> = CowList::from(vec![10, 20, 30]);
        let view = list.sub_list(0, 3).unwrap();
        // Storing the value already present republishes the same snapshot.
        assert_eq!(list.set(1, 20).unwrap(), 20);
        assert_eq!(view.get(1).unwrap(), 20);
        // Storing a different value replaces the snapshot.
        assert_eq!(list.set(1, 21).unwrap(), 20);
        assert_eq!(view.get(1), Err(Error::ConcurrentModification));
    }

    #[test]
    fn stale_sub_list_stays_invalid() {
        let list: CowList<u64> = (0..8).collect();
        let mut view = list.sub_list(2, 6).unwrap();
        list.clear();
        // Snapshot allocations come and go below; the view must keep failing
        // instead of mistaking a recycled allocation for the one it observed.
        for round in 0..256 {
            list.extend_from_slice(&[round; 4]);
            list.clear();
            assert_eq!(view.get(2), Err(Error::ConcurrentModification));
            assert_eq!(view.len(), Err(Error::ConcurrentModification));
            assert_eq!(view.remove_at(0), Err(Error::ConcurrentModification));
            assert!(view.iter().is_err());
        }
    }

    #[test]
    fn sub_list_invalidated_by_empty_range_removal() {
        let list: CowList<u64> = CowList::from(vec![10, 20]);
        let view = list.sub_list(0, 2).unwrap();
        // An empty range still republishes a fresh snapshot.
        list.remove_range(0, 0).unwrap();
        assert_eq!(list.to_vec(), vec![10, 20]);
        assert_eq!(view.get(0), Err(Error::ConcurrentModification));
    }

    #[test]
    fn nested_sub_list() {
        let list: CowList<u64> = CowList::from(vec![0, 1, 2, 3, 4, 5]);
        let view = list.sub_list(1, 5).unwrap();
        let nested = view.sub_list(1, 3).unwrap();
        assert_eq!(nested.iter().unwrap().collect::<Vec<u64>>(), vec![2, 3]);
        assert!(view.sub_list(1, 9).is_err());
    }

    #[test]
    fn sub_list_range_validation() {
        let list: CowList<u64> = CowList::from(vec![1, 2]);
        assert!(list.sub_list(0, 3).is_err());
        assert!(list.sub_list(2, 1).is_err());
        assert!(list.sub_list(2, 2).unwrap().is_empty().unwrap());
    }

    #[test]
    fn clone_is_independent() {
        let list: CowList<u64> = CowList::from(vec![1, 2, 3]);
        let cloned = list.clone();
        list.push(4);
        assert_eq!(cloned.to_vec(), vec![1, 2, 3]);
        cloned.remove_at(0).unwrap();
        assert_eq!(list.to_vec(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn collection_traits() {
        let mut list: CowList<u64> = (0..4).collect();
        assert_eq!(list.to_vec(), vec![0, 1, 2, 3]);
        list.extend(4..6);
        assert_eq!(list.to_vec(), vec![0, 1, 2, 3, 4, 5]);
        let other = CowList::from(&[0, 1, 2, 3, 4, 5][..]);
        assert_eq!(list, other);
        assert_eq!((&list).into_iter().sum::<u64>(), 15);
    }

    #[test]
    fn readers_observe_consistent_prefixes() {
        let list: Arc<CowList<u64>> = Arc::new(CowList::new());
        let published: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(3));
        let workload_size = 1024;

        let mut readers = Vec::new();
        for _ in 0..2 {
            let list = list.clone();
            let published = published.clone();
            let barrier = barrier.clone();
            readers.push(thread::spawn(move || {
                barrier.wait();
                loop {
                    let floor = published.load(Acquire);
                    let snapshot = list.to_vec();
                    // A snapshot is always a prefix of the final sequence,
                    // at least as long as what was published before the read.
                    assert!(snapshot.len() >= floor);
                    for (i, &e) in snapshot.iter().enumerate() {
                        assert_eq!(e, i as u64);
                    }
                    if snapshot.len() == workload_size {
                        break;
                    }
                }
            }));
        }

        barrier.wait();
        for k in 0..workload_size {
            list.push(k as u64);
            published.store(k + 1, Release);
        }
        for reader in readers {
            assert!(reader.join().is_ok());
        }
    }

    proptest! {
        #[cfg_attr(miri, ignore)]
        #[test]
        fn model_equivalence(ops in proptest::collection::vec((0_u8..4, any::<usize>(), any::<i32>()), 0..256)) {
            let list: CowList<i32> = CowList::new();
            let mut model: Vec<i32> = Vec::new();
            for (op, index, value) in ops {
                match op {
                    0 => {
                        list.push(value);
                        model.push(value);
                    }
                    1 => {
                        let index = if model.is_empty() { 0 } else { index % (model.len() + 1) };
                        list.insert(index, value).unwrap();
                        model.insert(index, value);
                    }
                    2 if !model.is_empty() => {
                        let index = index % model.len();
                        assert_eq!(list.remove_at(index).unwrap(), model.remove(index));
                    }
                    3 if !model.is_empty() => {
                        let index = index % model.len();
                        let old = model[index];
                        model[index] = value;
                        assert_eq!(list.set(index, value).unwrap(), old);
                    }
                    _ => (),
                }
                assert_eq!(list.len(), model.len());
            }
            assert_eq!(list.to_vec(), model);
        }
    }
}
