//! Typed integer ids

use std::{
    cmp::Ordering,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    hash::{Hash, Hasher},
    marker::PhantomData,
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Database id tagged with the entity it identifies, so a booking id can't be
/// passed where a resource id is expected.
pub struct TypedId<T>(i64, PhantomData<fn() -> T>);

/// Users live in the auth service; only their id is known here.
#[derive(Debug)]
pub enum User {}

pub type UserId = TypedId<User>;

impl<T> TypedId<T> {
    pub const fn new(id: i64) -> Self {
        Self(id, PhantomData)
    }

    #[must_use]
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl<T> Clone for TypedId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedId<T> {}

impl<T> Debug for TypedId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Debug::fmt(&self.0, f)
    }
}

impl<T> Display for TypedId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl<T> PartialEq for TypedId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for TypedId<T> {}

impl<T> Hash for TypedId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> PartialOrd for TypedId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TypedId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> From<i64> for TypedId<T> {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl<T> From<TypedId<T>> for i64 {
    fn from(value: TypedId<T>) -> Self {
        value.into_inner()
    }
}

impl<T> FromStr for TypedId<T> {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(Self::new)
    }
}

impl<T> Serialize for TypedId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de, T> Deserialize<'de> for TypedId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct Marker;

    type MarkerId = TypedId<Marker>;

    #[test]
    fn displays_and_parses_the_inner_value() {
        let id = MarkerId::new(42);

        assert_eq!(id.to_string(), "42");
        assert_eq!("42".parse::<MarkerId>(), Ok(id));
        assert!("forty-two".parse::<MarkerId>().is_err());
    }

    #[test]
    fn orders_and_hashes_by_inner_value() {
        let mut ids = vec![MarkerId::new(3), MarkerId::new(1), MarkerId::new(2)];

        ids.sort();

        assert_eq!(ids.iter().map(|id| id.into_inner()).collect::<Vec<_>>(), [1, 2, 3]);

        let unique: HashSet<MarkerId> = [MarkerId::new(1), MarkerId::new(1)].into_iter().collect();

        assert_eq!(unique.len(), 1);
    }
}
