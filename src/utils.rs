use anyhow::{Context, Result, bail};
use rmp_serde::{decode, encode};
use serde::{Serialize, de::DeserializeOwned};
use std::{
    fmt::Debug,
    fs::File,
    io::{BufReader, BufWriter, Write},
    ops::RangeBounds,
    path::Path,
};

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

/// Check that a list is non-empty and that every element lies in `range`.
pub fn check_vec<T, R>(vec: &[T], range: R) -> Result<()>
where
    T: PartialOrd + Debug + Copy,
    R: RangeBounds<T> + Debug + Clone,
{
    if vec.is_empty() {
        bail!("list must not be empty");
    }
    for (idx, &ele) in vec.iter().enumerate() {
        check_num(ele, range.clone()).with_context(|| format!("invalid element {idx}"))?;
    }
    Ok(())
}

/// Write `value` to `file` as MessagePack, keeping field names.
pub fn write_msgpack<T: Serialize, P: AsRef<Path>>(file: P, value: &T) -> Result<()> {
    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file);
    encode::write_named(&mut writer, value).context("failed to serialize value")?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

pub fn read_msgpack<T: DeserializeOwned, P: AsRef<Path>>(file: P) -> Result<T> {
    let file = file.as_ref();
    let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    let reader = BufReader::new(file);
    let value = decode::from_read(reader).context("failed to deserialize value")?;
    Ok(value)
}
