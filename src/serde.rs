use super::{CowList, HashMap};
use super::primitive::{Primitive, PrimitiveKey};

use serde::de::{Deserialize, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde::Deserializer;

use std::fmt;
use std::marker::PhantomData;

pub struct HashMapVisitor<K: PrimitiveKey, V: Primitive> {
    marker: PhantomData<fn() -> HashMap<K, V>>,
}

impl<K, V> HashMapVisitor<K, V>
where
    K: PrimitiveKey,
    V: Primitive,
{
    fn new() -> Self {
        HashMapVisitor {
            marker: PhantomData,
        }
    }
}

impl<'de, K, V> Visitor<'de> for HashMapVisitor<K, V>
where
    K: Deserialize<'de> + PrimitiveKey,
    V: Deserialize<'de> + Primitive,
{
    type Value = HashMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a HashMap")
    }

    fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut map = HashMap::for_entry_count(access.size_hint().unwrap_or(0));

        while let Some((key, value)) = access.next_entry()? {
            map.insert_for_create(key, value);
        }

        Ok(map)
    }
}

impl<'de, K, V> Deserialize<'de> for HashMap<K, V>
where
    K: Deserialize<'de> + PrimitiveKey,
    V: Deserialize<'de> + Primitive,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(HashMapVisitor::<K, V>::new())
    }
}

impl<K, V> Serialize for HashMap<K, V>
where
    K: Serialize + PrimitiveKey,
    V: Serialize + Primitive,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(&key, &value)?;
        }
        map.end()
    }
}

pub struct CowListVisitor<T: Primitive> {
    marker: PhantomData<fn() -> CowList<T>>,
}

impl<T> CowListVisitor<T>
where
    T: Primitive,
{
    fn new() -> Self {
        CowListVisitor {
            marker: PhantomData,
        }
    }
}

impl<'de, T> Visitor<'de> for CowListVisitor<T>
where
    T: Deserialize<'de> + Primitive,
{
    type Value = CowList<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a CowList")
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut elements = Vec::with_capacity(access.size_hint().unwrap_or(0));

        while let Some(element) = access.next_element()? {
            elements.push(element);
        }

        Ok(CowList::from(elements))
    }
}

impl<'de, T> Deserialize<'de> for CowList<T>
where
    T: Deserialize<'de> + Primitive,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(CowListVisitor::<T>::new())
    }
}

impl<T> Serialize for CowList<T>
where
    T: Serialize + Primitive,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for element in self.iter() {
            seq.serialize_element(&element)?;
        }
        seq.end()
    }
}
