pub mod sliced_file;

/// Returns an `InvalidInput` I/O error naming the failed condition when the
/// expression is false.
#[macro_export]
macro_rules! verify {
    ($expr:expr) => {{
        let holds = $expr;
        $crate::utils::check_condition(holds, stringify!($expr))?;
    }};
}

pub fn check_condition(holds: bool, condition: &str) -> std::io::Result<()> {
    if holds {
        return Ok(());
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("invalid read request: {condition}"),
    ))
}
