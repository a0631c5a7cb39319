use chrono::NaiveDateTime;
use numpy::PyReadonlyArray1;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

/// Timestamp layout used by the data-access layer.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Validate that a numpy array is C-contiguous and return its slice.
pub fn contiguous_slice<'py>(arr: &'py PyReadonlyArray1<'py, f64>) -> PyResult<&'py [f64]> {
    arr.as_slice()
        .map_err(|_| PyValueError::new_err("array must be C-contiguous"))
}

/// Validate length + contiguity of a numpy array.
pub fn checked_slice<'py>(
    arr: &'py PyReadonlyArray1<'py, f64>,
    expected_len: usize,
    name: &str,
) -> PyResult<&'py [f64]> {
    let slice = contiguous_slice(arr)?;
    if slice.len() != expected_len {
        return Err(PyValueError::new_err(format!(
            "{} must have {} elements, got {}",
            name,
            expected_len,
            slice.len()
        )));
    }
    Ok(slice)
}

/// Slice of an optional array, empty when absent.
pub fn optional_slice<'py>(arr: &'py Option<PyReadonlyArray1<'py, f64>>) -> PyResult<&'py [f64]> {
    match arr {
        Some(a) => contiguous_slice(a),
        None => Ok(&[]),
    }
}

pub fn parse_time(value: &str) -> PyResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|e| PyValueError::new_err(format!("invalid timestamp {value:?}: {e}")))
}

/// Pair timestamps with hourly values.
pub fn hourly_series(times: &[String], values: &[f64]) -> PyResult<Vec<(NaiveDateTime, f64)>> {
    if times.len() != values.len() {
        return Err(PyValueError::new_err(format!(
            "got {} timestamps for {} values",
            times.len(),
            values.len()
        )));
    }
    times
        .iter()
        .zip(values)
        .map(|(t, &v)| Ok((parse_time(t)?, v)))
        .collect()
}

/// Map any engine error onto `ValueError`.
pub fn value_error<E: std::fmt::Display>(err: E) -> PyErr {
    PyValueError::new_err(err.to_string())
}
