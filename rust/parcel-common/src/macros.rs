/// Unwraps a `Result` inside `Iterator::next`: yields the `Ok` value, or returns
/// `Some(Err(e))` from the enclosing function.
#[macro_export]
macro_rules! try_or_ret_some_err {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => return Some(Err(err)),
        }
    };
}
