//! `serde` only implements its traits for arrays of concrete length, so indices serialize as fixed-length tuples by hand.

use super::IndexN;

use core::fmt;
use core::marker::PhantomData;
use serde::de::{Error, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

impl<const D: usize> Serialize for IndexN<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(D)?;
        for c in self.0.iter() {
            tuple.serialize_element(c)?;
        }
        tuple.end()
    }
}

struct IndexVisitor<const D: usize>(PhantomData<[i32; D]>);

impl<'de, const D: usize> Visitor<'de> for IndexVisitor<D> {
    type Value = IndexN<D>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a sequence of {} integers", D)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut out = IndexN::<D>::ZERO;
        for (i, c) in out.0.iter_mut().enumerate() {
            *c = seq
                .next_element()?
                .ok_or_else(|| A::Error::invalid_length(i, &self))?;
        }
        Ok(out)
    }
}

impl<'de, const D: usize> Deserialize<'de> for IndexN<D> {
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        deserializer.deserialize_tuple(D, IndexVisitor(PhantomData))
    }
}
