//! Key/value stores (`hstore`).

use super::array::ArrayArg;
use gistsig_codec::crc32;
use std::collections::BTreeMap;
use std::fmt;

/// A set of text keys, each mapped to a text value or NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hstore {
    pairs: BTreeMap<String, Option<String>>,
}

impl Hstore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store; the first occurrence of a duplicated key wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (key, value) in pairs {
            map.entry(key.into()).or_insert_with(|| value.map(Into::into));
        }
        Self { pairs: map }
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Looks up a key. `Some(None)` means the key maps to NULL.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.pairs.get(key).map(Option::as_deref)
    }

    /// Iterates over the pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Tokens hashed into the signature: the CRC of every key and of every
    /// non-NULL value.
    pub fn tokens(&self) -> impl Iterator<Item = u32> + '_ {
        self.pairs.iter().flat_map(|(k, v)| {
            std::iter::once(crc32(k.as_bytes())).chain(v.as_ref().map(|v| crc32(v.as_bytes())))
        })
    }

    /// `self @> query`: every pair of `query` is present in `self`.
    ///
    /// A NULL value in the query only matches a NULL value.
    pub fn contains(&self, query: &Hstore) -> bool {
        query
            .pairs
            .iter()
            .all(|(k, v)| self.pairs.get(k).is_some_and(|mine| mine == v))
    }

    /// `self ? key`.
    pub fn exists(&self, key: &str) -> bool {
        self.pairs.contains_key(key)
    }

    /// `self ?| keys`: some non-NULL key is present.
    pub fn exists_any(&self, keys: &ArrayArg<String>) -> bool {
        keys.non_null().any(|k| self.exists(k))
    }

    /// `self ?& keys`: every non-NULL key is present.
    pub fn exists_all(&self, keys: &ArrayArg<String>) -> bool {
        keys.non_null().all(|k| self.exists(k))
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for Hstore
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

impl fmt::Display for Hstore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match v {
                Some(v) => write!(f, "{k:?}=>{v:?}")?,
                None => write!(f, "{k:?}=>NULL")?,
            }
        }
        Ok(())
    }
}
