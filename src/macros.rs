/// Construct a render context [`Value`][crate::Value] map.
///
/// Keys are written as bare identifiers and should be the lower-cased names
/// of the template variables. Values can be nested maps `{ ... }`, lists
/// `[ ... ]`, `None`, or any expression that implements
/// `Into<`[`Value`][crate::Value]`>`.
///
/// # Examples
///
/// ```
/// let ctx = braces::value! {
///     title: "Hello",
///     count: 3,
///     items: ["a", "b"],
///     row: { id: 42 },
/// };
/// ```
#[macro_export]
macro_rules! value {
    ($($tt:tt)*) => {
        $crate::_value!({ $($tt)* })
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! _value {
    //////////////////////////////////////////////////////////////////////////
    // Lists, invoked as: _value!(@list [] $($tt)*)
    //////////////////////////////////////////////////////////////////////////

    (@list [$($elems:expr,)*]) => {
        ::std::vec![$($elems,)*]
    };

    (@list [$($elems:expr,)*] , $($rest:tt)*) => {
        $crate::_value!(@list [$($elems,)*] $($rest)*)
    };

    (@list [$($elems:expr,)*] None $($rest:tt)*) => {
        $crate::_value!(@list [$($elems,)* $crate::Value::None,] $($rest)*)
    };

    (@list [$($elems:expr,)*] [$($inner:tt)*] $($rest:tt)*) => {
        $crate::_value!(@list [$($elems,)* $crate::_value!([$($inner)*]),] $($rest)*)
    };

    (@list [$($elems:expr,)*] {$($inner:tt)*} $($rest:tt)*) => {
        $crate::_value!(@list [$($elems,)* $crate::_value!({$($inner)*}),] $($rest)*)
    };

    (@list [$($elems:expr,)*] $next:expr , $($rest:tt)*) => {
        $crate::_value!(@list [$($elems,)* $crate::_value!($next),] $($rest)*)
    };

    (@list [$($elems:expr,)*] $last:expr) => {
        $crate::_value!(@list [$($elems,)* $crate::_value!($last),])
    };

    //////////////////////////////////////////////////////////////////////////
    // Maps, invoked as: _value!(@map map $($tt)*)
    //////////////////////////////////////////////////////////////////////////

    (@map $map:ident) => {};

    (@map $map:ident , $($rest:tt)*) => {
        $crate::_value!(@map $map $($rest)*)
    };

    (@map $map:ident $key:ident : None $($rest:tt)*) => {
        let _ = $map.insert(::std::string::String::from(stringify!($key)), $crate::Value::None);
        $crate::_value!(@map $map $($rest)*)
    };

    (@map $map:ident $key:ident : [$($inner:tt)*] $($rest:tt)*) => {
        let _ = $map.insert(
            ::std::string::String::from(stringify!($key)),
            $crate::_value!([$($inner)*]),
        );
        $crate::_value!(@map $map $($rest)*)
    };

    (@map $map:ident $key:ident : {$($inner:tt)*} $($rest:tt)*) => {
        let _ = $map.insert(
            ::std::string::String::from(stringify!($key)),
            $crate::_value!({$($inner)*}),
        );
        $crate::_value!(@map $map $($rest)*)
    };

    (@map $map:ident $key:ident : $value:expr , $($rest:tt)*) => {
        let _ = $map.insert(
            ::std::string::String::from(stringify!($key)),
            $crate::_value!($value),
        );
        $crate::_value!(@map $map $($rest)*)
    };

    (@map $map:ident $key:ident : $value:expr) => {
        let _ = $map.insert(
            ::std::string::String::from(stringify!($key)),
            $crate::_value!($value),
        );
    };

    //////////////////////////////////////////////////////////////////////////
    // The main implementation.
    //////////////////////////////////////////////////////////////////////////

    (None) => {
        $crate::Value::None
    };

    ([ $($tt:tt)* ]) => {
        $crate::Value::List($crate::_value!(@list [] $($tt)*))
    };

    ({ $($tt:tt)* }) => {{
        #[allow(unused_mut)]
        let mut map = $crate::Map::new();
        $crate::_value!(@map map $($tt)*);
        $crate::Value::Map(map)
    }};

    ($other:expr) => {
        $crate::Value::from($other)
    };
}
