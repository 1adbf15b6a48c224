use std::collections::{BTreeMap, HashMap};

use crate::Value;

macro_rules! impl_from {
    ($($ty:ty => |$v:ident| $body:expr),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $body
                }
            }
        )+
    };
}

impl_from! {
    () => |_unit| Value::None,
    bool => |b| Value::Bool(b),
    u8 => |i| Value::Integer(i64::from(i)),
    u16 => |i| Value::Integer(i64::from(i)),
    u32 => |i| Value::Integer(i64::from(i)),
    i8 => |i| Value::Integer(i64::from(i)),
    i16 => |i| Value::Integer(i64::from(i)),
    i32 => |i| Value::Integer(i64::from(i)),
    i64 => |i| Value::Integer(i),
    // Out of range integers become floats.
    u64 => |i| i64::try_from(i).map_or(Value::Float(i as f64), Value::Integer),
    usize => |i| i64::try_from(i).map_or(Value::Float(i as f64), Value::Integer),
    isize => |i| i64::try_from(i).map_or(Value::Float(i as f64), Value::Integer),
    f32 => |f| Value::Float(f64::from(f)),
    f64 => |f| Value::Float(f),
    char => |c| Value::String(c.to_string()),
    String => |s| Value::String(s),
    &str => |s| Value::String(s.to_owned()),
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(opt: Option<V>) -> Self {
        opt.map_or(Value::None, Into::into)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(list: Vec<V>) -> Self {
        list.into_iter().collect()
    }
}

impl<V: Into<Value>, const N: usize> From<[V; N]> for Value {
    fn from(list: [V; N]) -> Self {
        list.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(map: BTreeMap<K, V>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> From<HashMap<K, V>> for Value {
    fn from(map: HashMap<K, V>) -> Self {
        map.into_iter().collect()
    }
}

impl<V: Into<Value>> FromIterator<V> for Value {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Value::List(iter.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
