//! How cached values are laid out on disk.
//!
//! Tabular results ([`Table`]) are written as CSV. Everything else goes
//! through `serde` and `bincode`. The storage format decides the file
//! extension, so a cache directory can be browsed with ordinary tools.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::cache::CodecError;

/// On-disk layout of a cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageFormat {
    /// Comma-separated values with a header row. Extension `csv`.
    Csv,
    /// `bincode` standard configuration. Extension `bin`.
    Binary,
}

impl StorageFormat {
    /// The file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            StorageFormat::Csv => "csv",
            StorageFormat::Binary => "bin",
        }
    }

    /// The format stored under `ext`, if any.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "csv" => Some(StorageFormat::Csv),
            "bin" => Some(StorageFormat::Binary),
            _ => None,
        }
    }
}

/// A value the result cache can store.
///
/// Implemented for [`Table`], for [`Binary`], for `Option<T>` and for common
/// serde types (primitives, `String`, `Vec`, maps and small tuples).
pub trait Cacheable: Sized {
    /// The layout used on disk.
    const FORMAT: StorageFormat;

    /// Whether this value is "no result". Absent values are returned to the
    /// caller but never stored.
    fn is_absent(&self) -> bool {
        false
    }

    /// Serialize the value.
    fn encode(&self) -> Result<Vec<u8>, CodecError>;

    /// Deserialize a value written by [`encode`](Self::encode).
    fn decode(bytes: &[u8]) -> Result<Self, CodecError>;
}

fn encode_binary<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serde::encode_to_vec(value, bincode::config::standard())?)
}

fn decode_binary<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(value)
}

/// Stores any serde value in binary form.
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use steadfast::cache::{Binary, Cacheable};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Sample { mean: f64, draws: Vec<f64> }
///
/// let value = Binary(Sample { mean: 1.0, draws: vec![0.5, 1.5] });
/// let bytes = value.encode().unwrap();
/// assert_eq!(Binary::<Sample>::decode(&bytes).unwrap(), value);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Binary<T>(pub T);

impl<T> Binary<T> {
    /// Unwrap the value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize + DeserializeOwned> Cacheable for Binary<T> {
    const FORMAT: StorageFormat = StorageFormat::Binary;

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        encode_binary(&self.0)
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        decode_binary(bytes).map(Binary)
    }
}

macro_rules! binary_cacheable {
    ($($t:ty),* $(,)?) => {
        $(
            impl Cacheable for $t {
                const FORMAT: StorageFormat = StorageFormat::Binary;

                fn encode(&self) -> Result<Vec<u8>, CodecError> {
                    encode_binary(self)
                }

                fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
                    decode_binary(bytes)
                }
            }
        )*
    };
}

binary_cacheable!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
);

impl<T: Serialize + DeserializeOwned> Cacheable for Vec<T> {
    const FORMAT: StorageFormat = StorageFormat::Binary;

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        encode_binary(self)
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        decode_binary(bytes)
    }
}

impl<K, V> Cacheable for HashMap<K, V>
where
    K: Serialize + DeserializeOwned + Eq + Hash,
    V: Serialize + DeserializeOwned,
{
    const FORMAT: StorageFormat = StorageFormat::Binary;

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        encode_binary(self)
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        decode_binary(bytes)
    }
}

impl<K, V> Cacheable for BTreeMap<K, V>
where
    K: Serialize + DeserializeOwned + Ord,
    V: Serialize + DeserializeOwned,
{
    const FORMAT: StorageFormat = StorageFormat::Binary;

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        encode_binary(self)
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        decode_binary(bytes)
    }
}

macro_rules! tuple_cacheable {
    ($($name:ident),+) => {
        impl<$($name: Serialize + DeserializeOwned),+> Cacheable for ($($name,)+) {
            const FORMAT: StorageFormat = StorageFormat::Binary;

            fn encode(&self) -> Result<Vec<u8>, CodecError> {
                encode_binary(self)
            }

            fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
                decode_binary(bytes)
            }
        }
    };
}

tuple_cacheable!(A, B);
tuple_cacheable!(A, B, C);
tuple_cacheable!(A, B, C, D);

/// `None` is the absent result: it is returned but never cached.
impl<T: Cacheable> Cacheable for Option<T> {
    const FORMAT: StorageFormat = T::FORMAT;

    fn is_absent(&self) -> bool {
        self.as_ref().is_none_or(Cacheable::is_absent)
    }

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        self.as_ref().ok_or(CodecError::Absent)?.encode()
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        T::decode(bytes).map(Some)
    }
}

/// A header row plus rows of string cells, stored as CSV.
///
/// ```rust
/// use steadfast::cache::{Cacheable, StorageFormat, Table};
///
/// let mut table = Table::new(["x", "y"]);
/// table.push_row(["1", "2"]);
/// table.push_row(["3", "4"]);
///
/// let bytes = table.encode().unwrap();
/// assert_eq!(bytes, b"x,y\n1,2\n3,4\n");
/// assert_eq!(Table::FORMAT, StorageFormat::Csv);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// An empty table with the given column names.
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Rows must have as many cells as the header has columns,
    /// otherwise encoding fails.
    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.rows.push(row.into_iter().map(|c| c.to_string()).collect());
    }

    /// Builder form of [`push_row`](Self::push_row).
    pub fn with_row<I, S>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.push_row(row);
        self
    }

    /// Column names.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows, excluding the header.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells of the named column, top to bottom.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &str>> {
        let idx = self.header.iter().position(|h| h == name)?;
        Some(self.rows.iter().filter_map(move |r| r.get(idx).map(String::as_str)))
    }
}

impl Cacheable for Table {
    const FORMAT: StorageFormat = StorageFormat::Csv;

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| CodecError::Csv(csv::Error::from(e.into_error())))
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = csv::Reader::from_reader(bytes);
        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect::<Vec<_>>()))
            .collect::<Result<Vec<_>, csv::Error>>()?;
        Ok(Table { header, rows })
    }
}
