/// Construct a [`Document`](crate::Document) from `key => value` pairs.
///
/// Values go through [`Value::from`](crate::Value), so anything with a
/// `From` conversion works on the right-hand side.
///
/// ```
/// use bindoc::{doc, arr, Value};
///
/// let d = doc! {
///     "name" => "ada",
///     "scores" => arr![1i32, 2i32, 3i32],
/// };
/// assert_eq!(d["name"], Value::Str("ada".into()));
/// ```
#[macro_export]
macro_rules! doc {
    () => { $crate::Document::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut doc = $crate::Document::new();
        $( doc.insert($key, $crate::Value::from($value)); )+
        doc
    }};
}

/// Construct a `Vec<Value>` array body, element by element.
#[macro_export]
macro_rules! arr {
    () => { ::std::vec::Vec::<$crate::Value>::new() };
    ($($value:expr),+ $(,)?) => {
        <[_]>::into_vec(::std::boxed::Box::new([
            $( $crate::Value::from($value) ),+
        ]))
    };
}
