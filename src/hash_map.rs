//! [`HashMap`] is an open-chained hash table for primitive keys and values.

use super::error::Error;
use super::primitive::{Primitive, PrimitiveKey};
use std::fmt::{self, Debug};
use std::iter::FusedIterator;
use std::mem::replace;

/// The default number of buckets.
const DEFAULT_CAPACITY: usize = 16;

/// The hard ceiling on the number of buckets.
///
/// Once the table reaches this capacity it stops growing and the growth
/// threshold is pinned, letting chains grow long instead; an accepted
/// degradation, not a fault.
const MAXIMUM_CAPACITY: usize = 1 << 30;

/// The load factor used when none is specified.
const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Open-chained hash table mapping one primitive type to another.
///
/// [`HashMap`] stores raw primitive values instead of boxed objects, so an
/// entry costs one small allocation and no per-element indirection beyond
/// its chain link. The bucket array length is always a power of two and the
/// table doubles when the entry count reaches `capacity * load_factor`.
///
/// [`HashMap`] provides no internal synchronization: mutation requires
/// `&mut self`, so concurrent structural modification is rejected at compile
/// time. Callers needing shared mutable access must supply their own mutual
/// exclusion. This is a deliberate trade-off favoring raw single-threaded
/// throughput; [`CowList`](crate::CowList) makes the opposite one.
///
/// Iteration while the map is borrowed is always consistent. A detached
/// [`Cursor`] additionally supports removal mid-traversal with best-effort
/// fail-fast detection of any other structural change.
pub struct HashMap<K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
    table: Box<[Bucket<K, V>]>,
    len: usize,
    threshold: usize,
    load_factor: f32,
    mod_count: u64,
}

type Bucket<K, V> = Option<Box<Entry<K, V>>>;

struct Entry<K, V> {
    hash: u64,
    key: K,
    value: V,
    next: Option<Box<Entry<K, V>>>,
}

/// Spreads the raw key image by XOR-folding upper bits into lower bits.
///
/// The table masks hashes with `capacity - 1`, so without this step keys
/// differing only in upper bits would collide systematically.
const fn spread(bits: u64) -> u64 {
    let h = bits ^ (bits >> 32);
    let h = h ^ (h >> 20) ^ (h >> 12);
    h ^ (h >> 7) ^ (h >> 4)
}

#[inline]
const fn bucket_index(hash: u64, capacity: usize) -> usize {
    (hash as usize) & (capacity - 1)
}

fn empty_table<K, V>(capacity: usize) -> Box<[Bucket<K, V>]> {
    std::iter::repeat_with(|| None).take(capacity).collect()
}

impl<K, V> HashMap<K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
    /// Creates an empty [`HashMap`] with the default capacity.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let map: HashMap<u64, u32> = HashMap::new();
    ///
    /// assert_eq!(map.capacity(), 16);
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_table(DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR)
    }

    /// Creates an empty [`HashMap`] with the specified capacity.
    ///
    /// The actual capacity is the smallest power of two that is equal to or
    /// greater than the specified capacity, at most `1 << 30`.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let map: HashMap<u64, u32> = HashMap::with_capacity(1000);
    ///
    /// assert_eq!(map.capacity(), 1024);
    /// ```
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_table(capacity, DEFAULT_LOAD_FACTOR)
    }

    /// Creates an empty [`HashMap`] with the specified capacity and load
    /// factor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLoadFactor`] if the load factor is not a
    /// positive finite number.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let map: HashMap<u64, u32> = HashMap::with_capacity_and_load_factor(64, 0.5).unwrap();
    ///
    /// assert_eq!(map.capacity(), 64);
    /// assert!(HashMap::<u64, u32>::with_capacity_and_load_factor(64, f32::NAN).is_err());
    /// ```
    #[inline]
    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f32) -> Result<Self, Error> {
        if load_factor <= 0.0 || !load_factor.is_finite() {
            return Err(Error::InvalidLoadFactor(load_factor));
        }
        Ok(Self::with_table(capacity, load_factor))
    }

    /// Returns the number of entries in the [`HashMap`].
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let mut map: HashMap<u64, u32> = HashMap::new();
    ///
    /// map.insert(1, 0);
    /// assert_eq!(map.len(), 1);
    /// ```
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the [`HashMap`] is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let map: HashMap<u64, u32> = HashMap::new();
    ///
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the current number of buckets.
    ///
    /// The capacity is always a power of two.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.table.len()
    }

    /// Returns the load factor fixed at construction.
    #[inline]
    #[must_use]
    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    /// Returns the value associated with the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let mut map: HashMap<u64, u32> = HashMap::new();
    ///
    /// map.insert(1, 10);
    /// assert_eq!(map.get(1), Some(10));
    /// assert_eq!(map.get(2), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn get(&self, key: K) -> Option<V> {
        self.find(key).map(|entry| entry.value)
    }

    /// Returns a mutable reference to the value associated with the key.
    ///
    /// Replacing a value in place is not a structural change and does not
    /// interfere with a live [`Cursor`].
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let mut map: HashMap<u64, u32> = HashMap::new();
    ///
    /// map.insert(1, 10);
    /// *map.get_mut(1).unwrap() += 1;
    /// assert_eq!(map.get(1), Some(11));
    /// ```
    #[inline]
    #[must_use]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.find_mut(key).map(|entry| &mut entry.value)
    }

    /// Returns `true` if the [`HashMap`] contains an entry for the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let mut map: HashMap<u64, u32> = HashMap::new();
    ///
    /// map.insert(1, 0);
    /// assert!(map.contains_key(1));
    /// assert!(!map.contains_key(2));
    /// ```
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: K) -> bool {
        self.find(key).is_some()
    }

    /// Returns `true` if the [`HashMap`] maps one or more keys to the value.
    ///
    /// The time complexity is `O(capacity + len)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let mut map: HashMap<u64, u32> = HashMap::new();
    ///
    /// map.insert(1, 10);
    /// assert!(map.contains_value(10));
    /// assert!(!map.contains_value(11));
    /// ```
    #[must_use]
    pub fn contains_value(&self, value: V) -> bool {
        self.table.iter().any(|bucket| {
            let mut entry = bucket.as_deref();
            while let Some(e) = entry {
                if e.value == value {
                    return true;
                }
                entry = e.next.as_deref();
            }
            false
        })
    }

    /// Associates the value with the key, returning the previous value.
    ///
    /// Replacing the value of an existing entry is not a structural change;
    /// linking a new entry is, and doubles the table when the entry count
    /// reaches `capacity * load_factor`.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let mut map: HashMap<u64, u32> = HashMap::new();
    ///
    /// assert_eq!(map.insert(5, 100), None);
    /// assert_eq!(map.insert(5, 200), Some(100));
    /// assert_eq!(map.get(5), Some(200));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = spread(key.to_bits());
        let index = bucket_index(hash, self.table.len());
        let mut entry = self.table[index].as_deref_mut();
        while let Some(e) = entry {
            if e.hash == hash && e.key == key {
                return Some(replace(&mut e.value, value));
            }
            entry = e.next.as_deref_mut();
        }
        self.mod_count += 1;
        self.add_entry(hash, key, value, index);
        None
    }

    /// Removes the entry for the key, returning its value.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let mut map: HashMap<u64, u32> = HashMap::new();
    ///
    /// map.insert(1, 10);
    /// assert_eq!(map.remove(1), Some(10));
    /// assert_eq!(map.remove(1), None);
    /// ```
    pub fn remove(&mut self, key: K) -> Option<V> {
        let hash = spread(key.to_bits());
        let index = bucket_index(hash, self.table.len());
        let mut link = &mut self.table[index];
        loop {
            match link {
                None => return None,
                Some(entry) if entry.hash == hash && entry.key == key => {
                    let next = entry.next.take();
                    let removed = replace(link, next);
                    self.len -= 1;
                    self.mod_count += 1;
                    return removed.map(|entry| entry.value);
                }
                Some(entry) => link = &mut entry.next,
            }
        }
    }

    /// Copies all entries of `other` into the [`HashMap`].
    ///
    /// Entries of `other` replace existing entries with the same key. The
    /// table is conservatively pre-grown to fit `other` so that at most one
    /// extra rehash can occur.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let mut map: HashMap<u64, u32> = HashMap::new();
    /// map.insert(1, 10);
    ///
    /// let mut other: HashMap<u64, u32> = HashMap::new();
    /// other.insert(1, 11);
    /// other.insert(2, 20);
    ///
    /// map.extend_from(&other);
    /// assert_eq!(map.get(1), Some(11));
    /// assert_eq!(map.len(), 2);
    /// ```
    pub fn extend_from(&mut self, other: &Self) {
        if other.is_empty() {
            return;
        }
        if other.len() > self.threshold {
            let target = ((other.len() as f64 / f64::from(self.load_factor)) as usize + 1)
                .min(MAXIMUM_CAPACITY);
            let mut new_capacity = self.table.len();
            while new_capacity < target {
                new_capacity <<= 1;
            }
            if new_capacity > self.table.len() {
                self.resize(new_capacity);
            }
        }
        for (key, value) in other.iter() {
            self.insert(key, value);
        }
    }

    /// Removes all entries, keeping the current bucket array.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let mut map: HashMap<u64, u32> = HashMap::new();
    ///
    /// map.insert(1, 0);
    /// map.clear();
    /// assert!(map.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.mod_count += 1;
        for bucket in self.table.iter_mut() {
            // Unlink iteratively; a recursive chain drop could overflow the
            // stack once growth is pinned and chains get long.
            let mut chain = bucket.take();
            while let Some(mut entry) = chain {
                chain = entry.next.take();
            }
        }
        self.len = 0;
    }

    /// Retains only the entries satisfying the predicate.
    ///
    /// Each removal counts as a structural change.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let mut map: HashMap<u64, u32> = (0..8).map(|k| (k, k as u32)).collect();
    ///
    /// map.retain(|key, _| key % 2 == 0);
    /// assert_eq!(map.len(), 4);
    /// assert!(map.contains_key(6));
    /// assert!(!map.contains_key(7));
    /// ```
    pub fn retain<F: FnMut(K, &mut V) -> bool>(&mut self, mut pred: F) {
        let mut removed = 0;
        for bucket in self.table.iter_mut() {
            let mut link = bucket;
            loop {
                // Evaluate the predicate first so its borrow of the entry has
                // ended before the chain is edited.
                let unlink = match link.as_deref_mut() {
                    Some(entry) => !pred(entry.key, &mut entry.value),
                    None => break,
                };
                if unlink {
                    if let Some(mut entry) = link.take() {
                        *link = entry.next.take();
                        removed += 1;
                    }
                } else if let Some(entry) = link {
                    link = &mut entry.next;
                }
            }
        }
        self.len -= removed;
        self.mod_count += removed as u64;
    }

    /// Returns an iterator over the entries in bucket order.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let map: HashMap<u64, u32> = (0..4).map(|k| (k, 1)).collect();
    ///
    /// assert_eq!(map.iter().count(), 4);
    /// assert_eq!(map.iter().map(|(_, v)| v).sum::<u32>(), 4);
    /// ```
    #[inline]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.table.iter(),
            entry: None,
            remaining: self.len,
        }
    }

    /// Returns an iterator yielding mutable references to the values.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let mut map: HashMap<u64, u32> = (0..4).map(|k| (k, 1)).collect();
    ///
    /// for (_, value) in map.iter_mut() {
    ///     *value += 1;
    /// }
    /// assert_eq!(map.get(0), Some(2));
    /// ```
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            buckets: self.table.iter_mut(),
            entry: None,
            remaining: self.len,
        }
    }

    /// Returns an iterator over the keys in bucket order.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let map: HashMap<u64, u32> = (0..4).map(|k| (k, 0)).collect();
    ///
    /// let mut keys: Vec<u64> = map.keys().collect();
    /// keys.sort_unstable();
    /// assert_eq!(keys, [0, 1, 2, 3]);
    /// ```
    #[inline]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    /// Returns an iterator over the values in bucket order.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let map: HashMap<u64, u32> = (0..4).map(|k| (k, k as u32)).collect();
    ///
    /// assert_eq!(map.values().sum::<u32>(), 6);
    /// ```
    #[inline]
    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }

    /// Returns a detached fail-fast [`Cursor`] positioned before the first
    /// entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::HashMap;
    ///
    /// let mut map: HashMap<u64, u32> = HashMap::new();
    /// map.insert(1, 10);
    ///
    /// let mut cursor = map.cursor();
    /// assert_eq!(cursor.next(&map).unwrap(), Some((1, 10)));
    /// assert_eq!(cursor.next(&map).unwrap(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn cursor(&self) -> Cursor<K> {
        Cursor {
            bucket: 0,
            index: 0,
            expected: self.mod_count,
            current: None,
        }
    }

    fn with_table(capacity: usize, load_factor: f32) -> Self {
        let capacity = capacity.clamp(1, MAXIMUM_CAPACITY).next_power_of_two();
        Self {
            table: empty_table(capacity),
            len: 0,
            threshold: Self::threshold_for(capacity, load_factor),
            load_factor,
            mod_count: 0,
        }
    }

    fn threshold_for(capacity: usize, load_factor: f32) -> usize {
        (capacity as f64 * f64::from(load_factor)) as usize
    }

    fn find(&self, key: K) -> Option<&Entry<K, V>> {
        let hash = spread(key.to_bits());
        let mut entry = self.table[bucket_index(hash, self.table.len())].as_deref();
        while let Some(e) = entry {
            if e.hash == hash && e.key == key {
                return Some(e);
            }
            entry = e.next.as_deref();
        }
        None
    }

    fn find_mut(&mut self, key: K) -> Option<&mut Entry<K, V>> {
        let hash = spread(key.to_bits());
        let index = bucket_index(hash, self.table.len());
        let mut entry = self.table[index].as_deref_mut();
        while let Some(e) = entry {
            if e.hash == hash && e.key == key {
                return Some(e);
            }
            entry = e.next.as_deref_mut();
        }
        None
    }

    /// Links a new entry at the bucket head and grows the table when the
    /// pre-insert entry count has reached the threshold.
    fn add_entry(&mut self, hash: u64, key: K, value: V, index: usize) {
        let next = self.table[index].take();
        self.table[index] = Some(Box::new(Entry {
            hash,
            key,
            value,
            next,
        }));
        self.len += 1;
        if self.len > self.threshold {
            self.resize(self.table.len() * 2);
        }
    }

    /// Redistributes every existing entry into a table of `new_capacity`
    /// buckets, recomputing bucket indices from the stored hashes and
    /// relinking the entry boxes without recreating them.
    ///
    /// At the maximum capacity the threshold is pinned instead, which stops
    /// all future growth.
    fn resize(&mut self, new_capacity: usize) {
        if self.table.len() == MAXIMUM_CAPACITY {
            self.threshold = usize::MAX;
            return;
        }
        let mut new_table: Box<[Bucket<K, V>]> = empty_table(new_capacity);
        for bucket in self.table.iter_mut() {
            let mut chain = bucket.take();
            while let Some(mut entry) = chain {
                chain = entry.next.take();
                let index = bucket_index(entry.hash, new_capacity);
                entry.next = new_table[index].take();
                new_table[index] = Some(entry);
            }
        }
        self.table = new_table;
        self.threshold = Self::threshold_for(new_capacity, self.load_factor);
    }

    /// Creates an empty [`HashMap`] pre-sized to hold `entry_count` entries
    /// without growing.
    pub(crate) fn for_entry_count(entry_count: usize) -> Self {
        let target = ((entry_count as f64 / f64::from(DEFAULT_LOAD_FACTOR)) as usize + 1)
            .max(DEFAULT_CAPACITY);
        Self::with_table(target, DEFAULT_LOAD_FACTOR)
    }

    /// Inserts without growth checks or a `mod_count` bump.
    ///
    /// Only called from construction paths where the target table has been
    /// pre-sized; duplicates are overwritten in place, matching `insert`
    /// semantics without the structural bookkeeping.
    pub(crate) fn insert_for_create(&mut self, key: K, value: V) {
        let hash = spread(key.to_bits());
        let index = bucket_index(hash, self.table.len());
        let mut entry = self.table[index].as_deref_mut();
        while let Some(e) = entry {
            if e.hash == hash && e.key == key {
                e.value = value;
                return;
            }
            entry = e.next.as_deref_mut();
        }
        let next = self.table[index].take();
        self.table[index] = Some(Box::new(Entry {
            hash,
            key,
            value,
            next,
        }));
        self.len += 1;
    }
}

impl<K, V> Clone for HashMap<K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
    fn clone(&self) -> Self {
        let mut clone = Self::with_table(self.table.len(), self.load_factor);
        for (key, value) in self.iter() {
            clone.insert_for_create(key, value);
        }
        clone
    }
}

impl<K, V> Debug for HashMap<K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Default for HashMap<K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for HashMap<K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
    fn drop(&mut self) {
        // Same iterative unlinking as `clear`.
        for bucket in self.table.iter_mut() {
            let mut chain = bucket.take();
            while let Some(mut entry) = chain {
                chain = entry.next.take();
            }
        }
    }
}

impl<K, V> PartialEq for HashMap<K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K, V> Extend<(K, V)> for HashMap<K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for HashMap<K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'m, K, V> IntoIterator for &'m HashMap<K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
    type Item = (K, V);
    type IntoIter = Iter<'m, K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the entries of a [`HashMap`] in bucket order.
pub struct Iter<'m, K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
    buckets: std::slice::Iter<'m, Bucket<K, V>>,
    entry: Option<&'m Entry<K, V>>,
    remaining: usize,
}

impl<K, V> Iterator for Iter<'_, K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.entry {
                self.entry = entry.next.as_deref();
                self.remaining -= 1;
                return Some((entry.key, entry.value));
            }
            self.entry = self.buckets.next()?.as_deref();
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
}

impl<K, V> FusedIterator for Iter<'_, K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
}

/// A mutable iterator over the entries of a [`HashMap`].
pub struct IterMut<'m, K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
    buckets: std::slice::IterMut<'m, Bucket<K, V>>,
    entry: Option<&'m mut Entry<K, V>>,
    remaining: usize,
}

impl<'m, K, V> Iterator for IterMut<'m, K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
    type Item = (K, &'m mut V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.entry.take() {
                let Entry {
                    key, value, next, ..
                } = entry;
                self.entry = next.as_deref_mut();
                self.remaining -= 1;
                return Some((*key, value));
            }
            self.entry = self.buckets.next()?.as_deref_mut();
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
}

impl<K, V> FusedIterator for IterMut<'_, K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
}

/// An iterator over the keys of a [`HashMap`].
pub struct Keys<'m, K, V>(Iter<'m, K, V>)
where
    K: PrimitiveKey,
    V: Primitive;

impl<K, V> Iterator for Keys<'_, K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
    type Item = K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(key, _)| key)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
}

impl<K, V> FusedIterator for Keys<'_, K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
}

/// An iterator over the values of a [`HashMap`].
pub struct Values<'m, K, V>(Iter<'m, K, V>)
where
    K: PrimitiveKey,
    V: Primitive;

impl<K, V> Iterator for Values<'_, K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
    type Item = V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, value)| value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
}

impl<K, V> FusedIterator for Values<'_, K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
}

/// A detached traversal position with fail-fast detection of structural
/// changes.
///
/// A [`Cursor`] does not borrow the [`HashMap`] it was created from; every
/// step receives the map explicitly, which is what makes removal during
/// traversal expressible. In exchange, the cursor records the map's
/// modification counter and refuses to proceed once a structural change was
/// made via any path other than [`Cursor::remove_current`]. The check
/// compares a counter, so it is best-effort bug detection, not a correctness
/// guarantee, and a cursor must only be used with the map that created it.
///
/// # Examples
///
/// ```
/// use primcoll::{Error, HashMap};
///
/// let mut map: HashMap<u64, u32> = (0..4).map(|k| (k, k as u32 * 10)).collect();
///
/// let mut cursor = map.cursor();
/// while let Some((key, _)) = cursor.next(&map)? {
///     if key % 2 == 1 {
///         cursor.remove_current(&mut map)?;
///     }
/// }
/// assert_eq!(map.len(), 2);
///
/// // Any other structural change trips the cursor.
/// let mut cursor = map.cursor();
/// map.insert(9, 90);
/// assert_eq!(cursor.next(&map), Err(Error::ConcurrentModification));
/// # Ok::<(), primcoll::Error>(())
/// ```
pub struct Cursor<K>
where
    K: PrimitiveKey,
{
    /// Bucket holding the next entry to yield.
    bucket: usize,
    /// Offset of the next entry within that bucket's chain.
    index: usize,
    /// The modification counter value this cursor is synchronized with.
    expected: u64,
    /// The most recently yielded entry, as `(bucket, key)`.
    current: Option<(usize, K)>,
}

impl<K> Cursor<K>
where
    K: PrimitiveKey,
{
    /// Yields the next entry, or `None` once the traversal is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentModification`] if the map was structurally
    /// changed via any path other than [`Cursor::remove_current`] since this
    /// cursor was created or last synchronized.
    pub fn next<V: Primitive>(&mut self, map: &HashMap<K, V>) -> Result<Option<(K, V)>, Error> {
        if self.expected != map.mod_count {
            return Err(Error::ConcurrentModification);
        }
        while self.bucket < map.table.len() {
            let mut entry = map.table[self.bucket].as_deref();
            let mut offset = 0;
            while let Some(e) = entry {
                if offset == self.index {
                    self.current = Some((self.bucket, e.key));
                    self.index += 1;
                    return Ok(Some((e.key, e.value)));
                }
                offset += 1;
                entry = e.next.as_deref();
            }
            self.bucket += 1;
            self.index = 0;
        }
        Ok(None)
    }

    /// Removes the most recently yielded entry from the map and returns its
    /// value, re-synchronizing the cursor with the resulting state.
    ///
    /// Returns `Ok(None)` if there is no current entry, either because
    /// [`Cursor::next`] has not yielded one or because it was already
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentModification`] under the same conditions
    /// as [`Cursor::next`].
    pub fn remove_current<V: Primitive>(
        &mut self,
        map: &mut HashMap<K, V>,
    ) -> Result<Option<V>, Error> {
        if self.expected != map.mod_count {
            return Err(Error::ConcurrentModification);
        }
        let Some((bucket, key)) = self.current.take() else {
            return Ok(None);
        };
        let removed = map.remove(key);
        self.expected = map.mod_count;
        if removed.is_some() && bucket == self.bucket && self.index > 0 {
            // The entries behind the removed one slid back by one slot.
            self.index -= 1;
        }
        Ok(removed)
    }
}
