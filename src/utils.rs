use anyhow::{Result, bail};
use std::{fmt::Debug, ops::RangeBounds};

pub fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

pub fn check_finite(num: f64) -> Result<()> {
    if !num.is_finite() {
        bail!("number must be finite, but is {num:?}");
    }
    Ok(())
}

/// Capitalize the first character of an identifier to use it as a display label.
pub fn capitalize(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
