pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Returns an `InvalidArgument` error from the enclosing function when `$expr` is false.
#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

/// Returns an `InvalidFormat` error from the enclosing function when `$expr` is false.
#[macro_export]
macro_rules! verify_data {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_data(result, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

#[inline]
pub fn verify_data(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_format(name, condition)
    }
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cold]
pub fn invalid_format(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidFormat {
        element: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use crate::{Result, error::ErrorKind};

    fn check_batch_size(batch_size: usize) -> Result<usize> {
        verify_arg!(batch_size, batch_size > 0);
        Ok(batch_size)
    }

    fn check_page_size(size: i32) -> Result<()> {
        verify_data!(compressed_page_size, size >= 0);
        Ok(())
    }

    #[test]
    fn test_verify_macros() {
        assert_eq!(check_batch_size(4).unwrap(), 4);
        let err = check_batch_size(0).unwrap_err();
        match err.kind() {
            ErrorKind::InvalidArgument { name, message } => {
                assert_eq!(name, "batch_size");
                assert_eq!(message, "batch_size > 0");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(matches!(
            check_page_size(-1).unwrap_err().kind(),
            ErrorKind::InvalidFormat { .. }
        ));
        check_page_size(10).unwrap();
    }
}
