//! [`CowList`] is a copy-on-write list readable without synchronization.

use super::error::Error;
use super::primitive::Primitive;
use sdd::{AtomicShared, Guard, Shared, Tag};
use std::fmt::{self, Debug};
use std::iter::FusedIterator;
use std::sync::atomic::Ordering::{AcqRel, Acquire};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Copy-on-write sequence of a primitive element type.
///
/// Every mutating operation computes a brand-new backing array under a
/// single mutual-exclusion lock and atomically publishes it; the published
/// array is never touched again. Read operations never acquire the lock:
/// they load the current snapshot reference and work on it, so a reader
/// always observes one consistent point-in-time state, never a partial one,
/// and a mutator never blocks a reader.
///
/// This makes mutation linear in the list size by design, in exchange for
/// allocation-free, contention-free reads; the intended workloads are
/// read-heavy and write-rare. Any read that starts after a mutation has
/// completed observes that mutation's effect or a later one: the snapshot
/// reference is published with `AcqRel` and loaded with `Acquire`.
///
/// [`CowList::iter`] captures the snapshot at creation time and is immune to
/// later mutation. [`CowList::sub_list`] returns a live window that detects
/// out-of-band structural changes to its parent and fails fast.
pub struct CowList<T>
where
    T: Primitive,
{
    /// The published snapshot; replaced wholesale by every mutator.
    snapshot: AtomicShared<Box<[T]>>,
    /// Serializes mutators. Readers never touch it.
    mutators: Mutex<()>,
}

impl<T> CowList<T>
where
    T: Primitive,
{
    /// Creates an empty [`CowList`].
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::new();
    ///
    /// assert!(list.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: AtomicShared::from(Shared::new(Vec::new().into_boxed_slice())),
            mutators: Mutex::new(()),
        }
    }

    /// Returns the number of elements in the [`CowList`].
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![1, 2, 3]);
    ///
    /// assert_eq!(list.len(), 3);
    /// ```
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.read(<[T]>::len)
    }

    /// Returns `true` if the [`CowList`] is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the element at the index, or `None` if out of bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![10, 20]);
    ///
    /// assert_eq!(list.get(1), Some(20));
    /// assert_eq!(list.get(2), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.read(|elements| elements.get(index).copied())
    }

    /// Returns `true` if the [`CowList`] contains the element.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![10, 20]);
    ///
    /// assert!(list.contains(10));
    /// assert!(!list.contains(30));
    /// ```
    #[inline]
    #[must_use]
    pub fn contains(&self, element: T) -> bool {
        self.read(|elements| elements.contains(&element))
    }

    /// Returns `true` if the [`CowList`] contains every element of the
    /// collection.
    #[must_use]
    pub fn contains_all(&self, collection: &[T]) -> bool {
        self.read(|elements| collection.iter().all(|e| elements.contains(e)))
    }

    /// Returns the index of the first occurrence of the element.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![10, 20, 10]);
    ///
    /// assert_eq!(list.index_of(10), Some(0));
    /// assert_eq!(list.index_of(30), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn index_of(&self, element: T) -> Option<usize> {
        self.read(|elements| index_of(element, elements, 0))
    }

    /// Returns the index of the first occurrence of the element at position
    /// `from` or later.
    ///
    /// Returns `None` if `from` is past the end of the list.
    #[inline]
    #[must_use]
    pub fn index_of_from(&self, element: T, from: usize) -> Option<usize> {
        self.read(|elements| index_of(element, elements, from))
    }

    /// Returns the index of the last occurrence of the element.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![10, 20, 10]);
    ///
    /// assert_eq!(list.last_index_of(10), Some(2));
    /// ```
    #[inline]
    #[must_use]
    pub fn last_index_of(&self, element: T) -> Option<usize> {
        self.read(|elements| last_index_of(element, elements, elements.len()))
    }

    /// Returns the index of the last occurrence of the element at position
    /// `from` or earlier.
    #[inline]
    #[must_use]
    pub fn last_index_of_from(&self, element: T, from: usize) -> Option<usize> {
        self.read(|elements| last_index_of(element, elements, from.saturating_add(1)))
    }

    /// Copies the elements into a new [`Vec`].
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![10, 20]);
    ///
    /// assert_eq!(list.to_vec(), vec![10, 20]);
    /// ```
    #[inline]
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.read(<[T]>::to_vec)
    }

    /// Appends the element to the end of the [`CowList`].
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::new();
    ///
    /// list.push(17);
    /// assert_eq!(list.to_vec(), vec![17]);
    /// ```
    pub fn push(&self, element: T) {
        let _mutators = self.lock();
        let guard = Guard::new();
        let elements = self.load(&guard);
        let mut new = Vec::with_capacity(elements.len() + 1);
        new.extend_from_slice(elements);
        new.push(element);
        self.publish(new);
    }

    /// Inserts the element at the index, shifting subsequent elements to
    /// the right.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `index > len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![10, 30]);
    ///
    /// list.insert(1, 20).unwrap();
    /// assert_eq!(list.to_vec(), vec![10, 20, 30]);
    /// assert!(list.insert(9, 0).is_err());
    /// ```
    pub fn insert(&self, index: usize, element: T) -> Result<(), Error> {
        let _mutators = self.lock();
        self.insert_unlocked(index, element)
    }

    /// Replaces the element at the index, returning the previous element.
    ///
    /// If the new element equals the stored one, the unchanged snapshot is
    /// still republished so the call remains a visibility event for
    /// happens-before reasoning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `index >= len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![10, 20]);
    ///
    /// assert_eq!(list.set(1, 21).unwrap(), 20);
    /// assert_eq!(list.to_vec(), vec![10, 21]);
    /// ```
    pub fn set(&self, index: usize, element: T) -> Result<T, Error> {
        let _mutators = self.lock();
        self.set_unlocked(index, element)
    }

    /// Removes and returns the element at the index, shifting subsequent
    /// elements to the left.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `index >= len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![10, 20, 30]);
    ///
    /// assert_eq!(list.remove_at(0).unwrap(), 10);
    /// assert_eq!(list.to_vec(), vec![20, 30]);
    /// ```
    pub fn remove_at(&self, index: usize) -> Result<T, Error> {
        let _mutators = self.lock();
        self.remove_at_unlocked(index)
    }

    /// Removes the first occurrence of the element, returning `true` if the
    /// [`CowList`] contained it.
    ///
    /// The scan copies ahead speculatively, assuming the element is present
    /// and typically near the front; only the final slot needs a separate
    /// check once the copy has been built.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![10, 20, 10]);
    ///
    /// assert!(list.remove(10));
    /// assert_eq!(list.to_vec(), vec![20, 10]);
    /// assert!(!list.remove(30));
    /// ```
    pub fn remove(&self, element: T) -> bool {
        let _mutators = self.lock();
        let guard = Guard::new();
        let elements = self.load(&guard);
        let len = elements.len();
        if len == 0 {
            return false;
        }
        // Copy while searching; wins whenever the element is present.
        let last = len - 1;
        let mut new = Vec::with_capacity(last);
        for i in 0..last {
            if elements[i] == element {
                new.extend_from_slice(&elements[i + 1..]);
                self.publish(new);
                return true;
            }
            new.push(elements[i]);
        }
        if elements[last] == element {
            self.publish(new);
            return true;
        }
        false
    }

    /// Removes the elements in `[start, end)`, shifting subsequent elements
    /// to the left.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRange`] if `start >= len`, `end > len`, or
    /// `end < start`.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![10, 20, 30, 40]);
    ///
    /// list.remove_range(1, 3).unwrap();
    /// assert_eq!(list.to_vec(), vec![10, 40]);
    /// ```
    pub fn remove_range(&self, start: usize, end: usize) -> Result<(), Error> {
        let _mutators = self.lock();
        self.remove_range_unlocked(start, end)
    }

    /// Removes every element contained in the collection, returning `true`
    /// if the [`CowList`] changed.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![1, 2, 3, 2]);
    ///
    /// assert!(list.remove_all(&[2, 4]));
    /// assert_eq!(list.to_vec(), vec![1, 3]);
    /// ```
    pub fn remove_all(&self, collection: &[T]) -> bool {
        let _mutators = self.lock();
        let guard = Guard::new();
        let elements = self.load(&guard);
        if elements.is_empty() {
            return false;
        }
        let kept: Vec<T> = elements
            .iter()
            .copied()
            .filter(|e| !collection.contains(e))
            .collect();
        if kept.len() == elements.len() {
            return false;
        }
        self.publish(kept);
        true
    }

    /// Retains only the elements contained in the collection, returning
    /// `true` if the [`CowList`] changed.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![1, 2, 3, 2]);
    ///
    /// assert!(list.retain_all(&[2]));
    /// assert_eq!(list.to_vec(), vec![2, 2]);
    /// ```
    pub fn retain_all(&self, collection: &[T]) -> bool {
        let _mutators = self.lock();
        let guard = Guard::new();
        let elements = self.load(&guard);
        if elements.is_empty() {
            return false;
        }
        let kept: Vec<T> = elements
            .iter()
            .copied()
            .filter(|e| collection.contains(e))
            .collect();
        if kept.len() == elements.len() {
            return false;
        }
        self.publish(kept);
        true
    }

    /// Appends the element if the [`CowList`] does not already contain it,
    /// returning `true` if it was added.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![1]);
    ///
    /// assert!(list.add_if_absent(2));
    /// assert!(!list.add_if_absent(2));
    /// assert_eq!(list.to_vec(), vec![1, 2]);
    /// ```
    pub fn add_if_absent(&self, element: T) -> bool {
        let _mutators = self.lock();
        let guard = Guard::new();
        let elements = self.load(&guard);
        // Copy while checking; wins whenever the element is absent.
        let mut new = Vec::with_capacity(elements.len() + 1);
        for &e in elements {
            if e == element {
                return false;
            }
            new.push(e);
        }
        new.push(element);
        self.publish(new);
        true
    }

    /// Appends the elements of the collection that are absent from both the
    /// [`CowList`] and the batch processed so far, returning the number of
    /// elements added.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![1, 2]);
    ///
    /// assert_eq!(list.add_all_absent(&[2, 3, 2]), 1);
    /// assert_eq!(list.to_vec(), vec![1, 2, 3]);
    /// ```
    pub fn add_all_absent(&self, collection: &[T]) -> usize {
        if collection.is_empty() {
            return 0;
        }
        let _mutators = self.lock();
        let guard = Guard::new();
        let elements = self.load(&guard);
        let mut unique: Vec<T> = Vec::with_capacity(collection.len());
        for &e in collection {
            if !elements.contains(&e) && !unique.contains(&e) {
                unique.push(e);
            }
        }
        let added = unique.len();
        if added > 0 {
            let mut new = Vec::with_capacity(elements.len() + added);
            new.extend_from_slice(elements);
            new.append(&mut unique);
            self.publish(new);
        }
        added
    }

    /// Appends all elements of the collection, returning `true` if the
    /// [`CowList`] changed.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![1]);
    ///
    /// assert!(list.extend_from_slice(&[2, 3]));
    /// assert_eq!(list.to_vec(), vec![1, 2, 3]);
    /// ```
    pub fn extend_from_slice(&self, collection: &[T]) -> bool {
        if collection.is_empty() {
            return false;
        }
        let _mutators = self.lock();
        let guard = Guard::new();
        let elements = self.load(&guard);
        let mut new = Vec::with_capacity(elements.len() + collection.len());
        new.extend_from_slice(elements);
        new.extend_from_slice(collection);
        self.publish(new);
        true
    }

    /// Inserts all elements of the collection at the index, returning
    /// `true` if the [`CowList`] changed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `index > len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![1, 4]);
    ///
    /// assert!(list.insert_all(1, &[2, 3]).unwrap());
    /// assert_eq!(list.to_vec(), vec![1, 2, 3, 4]);
    /// ```
    pub fn insert_all(&self, index: usize, collection: &[T]) -> Result<bool, Error> {
        let _mutators = self.lock();
        let guard = Guard::new();
        let elements = self.load(&guard);
        let len = elements.len();
        if index > len {
            return Err(Error::OutOfBounds { index, len });
        }
        if collection.is_empty() {
            return Ok(false);
        }
        let mut new = Vec::with_capacity(len + collection.len());
        new.extend_from_slice(&elements[..index]);
        new.extend_from_slice(collection);
        new.extend_from_slice(&elements[index..]);
        self.publish(new);
        Ok(true)
    }

    /// Removes all elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![1, 2]);
    ///
    /// list.clear();
    /// assert!(list.is_empty());
    /// ```
    pub fn clear(&self) {
        let _mutators = self.lock();
        self.publish(Vec::new());
    }

    /// Returns a snapshot iterator positioned before the first element.
    ///
    /// The iterator captures the current snapshot and never observes later
    /// mutation.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![1, 2, 3]);
    ///
    /// let iter = list.iter();
    /// list.remove_at(0).unwrap();
    /// assert_eq!(iter.collect::<Vec<u64>>(), vec![1, 2, 3]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> Iter<T> {
        let guard = Guard::new();
        let snapshot = self.snapshot.get_shared(Acquire, &guard);
        let len = snapshot.as_ref().map_or(0, |s| s.len());
        Iter {
            snapshot,
            front: 0,
            back: len,
        }
    }

    /// Returns a snapshot iterator positioned before `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `index > len`.
    pub fn iter_at(&self, index: usize) -> Result<Iter<T>, Error> {
        let guard = Guard::new();
        let snapshot = self.snapshot.get_shared(Acquire, &guard);
        let len = snapshot.as_ref().map_or(0, |s| s.len());
        if index > len {
            return Err(Error::OutOfBounds { index, len });
        }
        Ok(Iter {
            snapshot,
            front: index,
            back: len,
        })
    }

    /// Returns a live [`SubList`] view of `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRange`] if `end < start` or `end > len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![10, 20, 30, 40]);
    ///
    /// let view = list.sub_list(1, 3).unwrap();
    /// assert_eq!(view.get(0).unwrap(), 20);
    /// ```
    pub fn sub_list(&self, start: usize, end: usize) -> Result<SubList<'_, T>, Error> {
        let _mutators = self.lock();
        let guard = Guard::new();
        let len = self.load(&guard).len();
        if end < start || end > len {
            return Err(Error::InvalidRange { start, end, len });
        }
        Ok(SubList {
            list: self,
            offset: start,
            len: end - start,
            expected: self.snapshot.get_shared(Acquire, &guard),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.mutators.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load<'g>(&self, guard: &'g Guard) -> &'g [T] {
        self.snapshot.load(Acquire, guard).as_ref().map_or(&[], |s| s)
    }

    fn read<R, F: FnOnce(&[T]) -> R>(&self, reader: F) -> R {
        let guard = Guard::new();
        reader(self.load(&guard))
    }

    /// Publishes a new snapshot; the previous one stays alive for as long
    /// as any reader still holds it.
    fn publish(&self, elements: Vec<T>) {
        self.snapshot.swap(
            (Some(Shared::new(elements.into_boxed_slice())), Tag::None),
            AcqRel,
        );
    }

    fn insert_unlocked(&self, index: usize, element: T) -> Result<(), Error> {
        let guard = Guard::new();
        let elements = self.load(&guard);
        let len = elements.len();
        if index > len {
            return Err(Error::OutOfBounds { index, len });
        }
        let mut new = Vec::with_capacity(len + 1);
        new.extend_from_slice(&elements[..index]);
        new.push(element);
        new.extend_from_slice(&elements[index..]);
        self.publish(new);
        Ok(())
    }

    fn set_unlocked(&self, index: usize, element: T) -> Result<T, Error> {
        let guard = Guard::new();
        let ptr = self.snapshot.load(Acquire, &guard);
        let elements: &[T] = ptr.as_ref().map_or(&[], |s| s);
        let len = elements.len();
        if index >= len {
            return Err(Error::OutOfBounds { index, len });
        }
        let old = elements[index];
        if old == element {
            // Republish the unchanged snapshot; the write event remains.
            self.snapshot.swap((ptr.get_shared(), Tag::None), AcqRel);
        } else {
            let mut new = elements.to_vec();
            new[index] = element;
            self.publish(new);
        }
        Ok(old)
    }

    fn remove_at_unlocked(&self, index: usize) -> Result<T, Error> {
        let guard = Guard::new();
        let elements = self.load(&guard);
        let len = elements.len();
        if index >= len {
            return Err(Error::OutOfBounds { index, len });
        }
        let old = elements[index];
        let mut new = Vec::with_capacity(len - 1);
        new.extend_from_slice(&elements[..index]);
        new.extend_from_slice(&elements[index + 1..]);
        self.publish(new);
        Ok(old)
    }

    fn remove_range_unlocked(&self, start: usize, end: usize) -> Result<(), Error> {
        let guard = Guard::new();
        let elements = self.load(&guard);
        let len = elements.len();
        if start >= len || end > len || end < start {
            return Err(Error::InvalidRange { start, end, len });
        }
        let mut new = Vec::with_capacity(len - (end - start));
        new.extend_from_slice(&elements[..start]);
        new.extend_from_slice(&elements[end..]);
        self.publish(new);
        Ok(())
    }

}

fn index_of<T: Primitive>(element: T, elements: &[T], from: usize) -> Option<usize> {
    elements
        .iter()
        .enumerate()
        .skip(from)
        .find_map(|(i, &e)| (e == element).then_some(i))
}

fn last_index_of<T: Primitive>(element: T, elements: &[T], fence: usize) -> Option<usize> {
    elements[..fence.min(elements.len())]
        .iter()
        .rposition(|&e| e == element)
}

impl<T> Clone for CowList<T>
where
    T: Primitive,
{
    /// Returns a shallow copy sharing the current snapshot, with a freshly
    /// initialized lock.
    fn clone(&self) -> Self {
        let guard = Guard::new();
        let snapshot = self
            .snapshot
            .get_shared(Acquire, &guard)
            .map_or_else(AtomicShared::null, AtomicShared::from);
        Self {
            snapshot,
            mutators: Mutex::new(()),
        }
    }
}

impl<T> Debug for CowList<T>
where
    T: Primitive,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read(|elements| f.debug_list().entries(elements.iter()).finish())
    }
}

impl<T> Default for CowList<T>
where
    T: Primitive,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PartialEq for CowList<T>
where
    T: Primitive,
{
    fn eq(&self, other: &Self) -> bool {
        self.read(|own| other.read(|their| own == their))
    }
}

impl<T> From<Vec<T>> for CowList<T>
where
    T: Primitive,
{
    fn from(elements: Vec<T>) -> Self {
        Self {
            snapshot: AtomicShared::from(Shared::new(elements.into_boxed_slice())),
            mutators: Mutex::new(()),
        }
    }
}

impl<T> From<&[T]> for CowList<T>
where
    T: Primitive,
{
    fn from(elements: &[T]) -> Self {
        Self::from(elements.to_vec())
    }
}

impl<T> FromIterator<T> for CowList<T>
where
    T: Primitive,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<T>>())
    }
}

impl<T> Extend<T> for CowList<T>
where
    T: Primitive,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let collected: Vec<T> = iter.into_iter().collect();
        self.extend_from_slice(&collected);
    }
}

impl<T> IntoIterator for &CowList<T>
where
    T: Primitive,
{
    type Item = T;
    type IntoIter = Iter<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A snapshot iterator over a [`CowList`].
///
/// [`Iter`] owns a handle to the snapshot captured at creation time, so it
/// never observes later mutation and requires no synchronization while
/// traversing. It is read-only by construction: the snapshot cannot be
/// spliced.
pub struct Iter<T>
where
    T: Primitive,
{
    snapshot: Option<Shared<Box<[T]>>>,
    front: usize,
    back: usize,
}

impl<T> Iter<T>
where
    T: Primitive,
{
    /// Returns the offset of the next element within the captured snapshot.
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.front
    }

    /// Returns the remaining elements as a slice of the captured snapshot.
    ///
    /// # Examples
    ///
    /// ```
    /// use primcoll::CowList;
    ///
    /// let list: CowList<u64> = CowList::from(vec![1, 2, 3]);
    ///
    /// let mut iter = list.iter();
    /// iter.next();
    /// assert_eq!(iter.as_slice(), &[2, 3]);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        self.snapshot
            .as_ref()
            .map_or(&[], |s| &s[self.front..self.back])
    }
}

impl<T> Iterator for Iter<T>
where
    T: Primitive,
{
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let item = self.snapshot.as_ref().map(|s| s[self.front])?;
        self.front += 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<T>
where
    T: Primitive,
{
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let item = self.snapshot.as_ref().map(|s| s[self.back - 1])?;
        self.back -= 1;
        Some(item)
    }
}

impl<T> ExactSizeIterator for Iter<T> where T: Primitive {}

impl<T> FusedIterator for Iter<T> where T: Primitive {}

/// A live window `[offset, offset + len)` over a parent [`CowList`].
///
/// Every operation locks the parent and first validates that the parent
/// still publishes the snapshot this view last observed; if the parent was
/// structurally changed via any other path, the view reports
/// [`Error::ConcurrentModification`] instead of silently operating on stale
/// offsets. Mutations through the view refresh its cached snapshot handle
/// and adjust its logical length.
///
/// The view owns a handle to the snapshot it last observed, so the identity
/// comparison can never be confused by a recycled allocation: a stale view
/// keeps failing until it is dropped.
///
/// # Examples
///
/// ```
/// use primcoll::{CowList, Error};
///
/// let list: CowList<u64> = CowList::from(vec![10, 20, 30, 40]);
///
/// let mut view = list.sub_list(1, 3)?;
/// assert_eq!(view.remove_at(0)?, 20);
/// assert_eq!(list.to_vec(), vec![10, 30, 40]);
/// assert_eq!(view.iter()?.collect::<Vec<u64>>(), vec![30, 40]);
///
/// // An out-of-band mutation of the parent invalidates the view.
/// list.push(50);
/// assert_eq!(view.get(0), Err(Error::ConcurrentModification));
/// # Ok::<(), primcoll::Error>(())
/// ```
pub struct SubList<'l, T>
where
    T: Primitive,
{
    list: &'l CowList<T>,
    offset: usize,
    len: usize,
    /// The parent snapshot this view last observed, held to pin its
    /// allocation for the identity comparison.
    expected: Option<Shared<Box<[T]>>>,
}

impl<T> SubList<'_, T>
where
    T: Primitive,
{
    /// Returns the number of elements in the view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentModification`] if the parent was changed
    /// via another path.
    pub fn len(&self) -> Result<usize, Error> {
        let _mutators = self.list.lock();
        let guard = Guard::new();
        self.validate(&guard)?;
        Ok(self.len)
    }

    /// Returns `true` if the view is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentModification`] if the parent was changed
    /// via another path.
    pub fn is_empty(&self) -> Result<bool, Error> {
        self.len().map(|len| len == 0)
    }

    /// Returns the element at the view-relative index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentModification`] if the parent was changed
    /// via another path, or [`Error::OutOfBounds`] if `index >= len`.
    pub fn get(&self, index: usize) -> Result<T, Error> {
        let _mutators = self.list.lock();
        let guard = Guard::new();
        self.validate(&guard)?;
        if index >= self.len {
            return Err(Error::OutOfBounds {
                index,
                len: self.len,
            });
        }
        let elements = self.list.load(&guard);
        Ok(elements[self.offset + index])
    }

    /// Replaces the element at the view-relative index, returning the
    /// previous element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentModification`] if the parent was changed
    /// via another path, or [`Error::OutOfBounds`] if `index >= len`.
    pub fn set(&mut self, index: usize, element: T) -> Result<T, Error> {
        let _mutators = self.list.lock();
        let guard = Guard::new();
        self.validate(&guard)?;
        if index >= self.len {
            return Err(Error::OutOfBounds {
                index,
                len: self.len,
            });
        }
        let old = self.list.set_unlocked(self.offset + index, element)?;
        self.expected = self.list.snapshot.get_shared(Acquire, &guard);
        Ok(old)
    }

    /// Appends the element to the end of the view, inserting it into the
    /// parent right after the window.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentModification`] if the parent was changed
    /// via another path.
    pub fn push(&mut self, element: T) -> Result<(), Error> {
        self.insert(self.len, element)
    }

    /// Inserts the element at the view-relative index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentModification`] if the parent was changed
    /// via another path, or [`Error::OutOfBounds`] if `index > len`.
    pub fn insert(&mut self, index: usize, element: T) -> Result<(), Error> {
        let _mutators = self.list.lock();
        let guard = Guard::new();
        self.validate(&guard)?;
        if index > self.len {
            return Err(Error::OutOfBounds {
                index,
                len: self.len,
            });
        }
        self.list.insert_unlocked(self.offset + index, element)?;
        self.expected = self.list.snapshot.get_shared(Acquire, &guard);
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the element at the view-relative index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentModification`] if the parent was changed
    /// via another path, or [`Error::OutOfBounds`] if `index >= len`.
    pub fn remove_at(&mut self, index: usize) -> Result<T, Error> {
        let _mutators = self.list.lock();
        let guard = Guard::new();
        self.validate(&guard)?;
        if index >= self.len {
            return Err(Error::OutOfBounds {
                index,
                len: self.len,
            });
        }
        let old = self.list.remove_at_unlocked(self.offset + index)?;
        self.expected = self.list.snapshot.get_shared(Acquire, &guard);
        self.len -= 1;
        Ok(old)
    }

    /// Removes every element of the window from the parent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentModification`] if the parent was changed
    /// via another path.
    pub fn clear(&mut self) -> Result<(), Error> {
        let _mutators = self.list.lock();
        let guard = Guard::new();
        self.validate(&guard)?;
        self.list
            .remove_range_unlocked(self.offset, self.offset + self.len)?;
        self.expected = self.list.snapshot.get_shared(Acquire, &guard);
        self.len = 0;
        Ok(())
    }

    /// Returns a snapshot iterator over the window.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentModification`] if the parent was changed
    /// via another path.
    pub fn iter(&self) -> Result<Iter<T>, Error> {
        let _mutators = self.list.lock();
        let guard = Guard::new();
        self.validate(&guard)?;
        let snapshot = self.list.snapshot.get_shared(Acquire, &guard);
        Ok(Iter {
            snapshot,
            front: self.offset,
            back: self.offset + self.len,
        })
    }

    /// Returns a nested view of `[start, end)` within this view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentModification`] if the parent was changed
    /// via another path, or [`Error::InvalidRange`] if `end < start` or
    /// `end > len`.
    pub fn sub_list(&self, start: usize, end: usize) -> Result<SubList<'_, T>, Error> {
        let _mutators = self.list.lock();
        let guard = Guard::new();
        self.validate(&guard)?;
        if end < start || end > self.len {
            return Err(Error::InvalidRange {
                start,
                end,
                len: self.len,
            });
        }
        Ok(SubList {
            list: self.list,
            offset: self.offset + start,
            len: end - start,
            expected: self.expected.clone(),
        })
    }

    fn validate(&self, guard: &Guard) -> Result<(), Error> {
        let current = self.list.snapshot.get_shared(Acquire, guard);
        if current.as_ref().map(Shared::as_ptr) == self.expected.as_ref().map(Shared::as_ptr) {
            Ok(())
        } else {
            Err(Error::ConcurrentModification)
        }
    }
}

impl<T> Debug for SubList<'_, T>
where
    T: Primitive,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubList")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}
