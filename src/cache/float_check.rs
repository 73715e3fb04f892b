//! Float Check Module
//!
//! JSON renders NaN and the infinities as `null`, so arguments holding them
//! would collide with `None` once canonicalized. This serializer walks a
//! value without producing output and fails on the first non-finite float.

use std::fmt;

use serde::ser::{self, Serialize, Serializer};

type Check = std::result::Result<(), NonFiniteFloat>;

// == Error ==
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct NonFiniteFloat(String);

impl ser::Error for NonFiniteFloat {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

/// Fails if `value` contains a NaN or infinite float anywhere inside it.
pub fn ensure_finite<T: Serialize + ?Sized>(value: &T) -> Check {
    value.serialize(FiniteFloats)
}

// == Serializer ==
#[derive(Debug, Clone, Copy)]
struct FiniteFloats;

macro_rules! accept {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(fn $method(self, _value: $ty) -> Check {
            Ok(())
        })*
    };
}

impl Serializer for FiniteFloats {
    type Ok = ();
    type Error = NonFiniteFloat;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    accept! {
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_i128(i128),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_u128(u128),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
        serialize_unit_struct(&'static str),
    }

    fn serialize_f32(self, value: f32) -> Check {
        self.serialize_f64(f64::from(value))
    }

    fn serialize_f64(self, value: f64) -> Check {
        if value.is_finite() {
            Ok(())
        } else {
            Err(NonFiniteFloat(format!("non-finite float {value}")))
        }
    }

    fn serialize_none(self) -> Check {
        Ok(())
    }

    fn serialize_some<T>(self, value: &T) -> Check
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Check {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> Check {
        Ok(())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Check
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Check
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> std::result::Result<Self, NonFiniteFloat> {
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> std::result::Result<Self, NonFiniteFloat> {
        Ok(self)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self, NonFiniteFloat> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self, NonFiniteFloat> {
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> std::result::Result<Self, NonFiniteFloat> {
        Ok(self)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self, NonFiniteFloat> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self, NonFiniteFloat> {
        Ok(self)
    }
}

// == Compound Values ==
macro_rules! check_elements {
    ($($trait:ident::$method:ident($($skip:ty),*)),* $(,)?) => {
        $(impl ser::$trait for FiniteFloats {
            type Ok = ();
            type Error = NonFiniteFloat;

            fn $method<T>(&mut self, $(_: $skip,)* value: &T) -> Check
            where
                T: ?Sized + Serialize,
            {
                value.serialize(*self)
            }

            fn end(self) -> Check {
                Ok(())
            }
        })*
    };
}

check_elements! {
    SerializeSeq::serialize_element(),
    SerializeTuple::serialize_element(),
    SerializeTupleStruct::serialize_field(),
    SerializeTupleVariant::serialize_field(),
    SerializeStruct::serialize_field(&'static str),
    SerializeStructVariant::serialize_field(&'static str),
}

impl ser::SerializeMap for FiniteFloats {
    type Ok = ();
    type Error = NonFiniteFloat;

    fn serialize_key<T>(&mut self, key: &T) -> Check
    where
        T: ?Sized + Serialize,
    {
        key.serialize(*self)
    }

    fn serialize_value<T>(&mut self, value: &T) -> Check
    where
        T: ?Sized + Serialize,
    {
        value.serialize(*self)
    }

    fn end(self) -> Check {
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Range {
        low: f64,
        high: Option<f32>,
    }

    #[derive(Serialize)]
    enum Filter {
        Above(f64),
        Between { low: f64, high: f64 },
    }

    #[test]
    fn test_finite_values_pass() {
        assert!(ensure_finite(&1.5f64).is_ok());
        assert!(ensure_finite(&None::<f64>).is_ok());
        assert!(ensure_finite("text").is_ok());
        assert!(ensure_finite(&Range { low: 0.0, high: Some(2.0) }).is_ok());
    }

    #[test]
    fn test_non_finite_scalars_fail() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(ensure_finite(&value).is_err());
        }
        assert!(ensure_finite(&f32::NAN).is_err());
    }

    #[test]
    fn test_nested_non_finite_fails() {
        assert!(ensure_finite(&vec![Some(1.0), Some(f64::NAN)]).is_err());
        assert!(ensure_finite(&(1u8, f64::INFINITY)).is_err());
        assert!(ensure_finite(&Range { low: 0.0, high: Some(f32::INFINITY) }).is_err());
        assert!(ensure_finite(&Filter::Above(f64::NEG_INFINITY)).is_err());
        assert!(ensure_finite(&Filter::Between { low: 0.0, high: f64::NAN }).is_err());

        let mut map = BTreeMap::new();
        map.insert("limit", f64::INFINITY);
        assert!(ensure_finite(&map).is_err());
    }
}
