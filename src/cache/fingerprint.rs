//! Call identity: canonical argument representations and their SHA-1 digest.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use sha1::{Digest, Sha1};

/// A stable, canonical text representation of an argument.
///
/// Two arguments with equal representations are treated as the same argument
/// by the cache, so implementations must not embed anything that varies
/// between runs (addresses, hash-map iteration order, timestamps).
///
/// ```rust
/// use steadfast::cache::ArgRepr;
///
/// assert_eq!(10_i32.repr(), "10");
/// assert_eq!(3.0_f64.repr(), "3.0");
/// assert_eq!("abc".repr(), "\"abc\"");
/// assert_eq!(vec![1, 2].repr(), "[1, 2]");
/// ```
pub trait ArgRepr {
    /// Append the representation to `out`.
    fn write_repr(&self, out: &mut String);

    /// The representation as an owned string.
    fn repr(&self) -> String {
        let mut out = String::new();
        self.write_repr(&mut out);
        out
    }
}

macro_rules! display_repr {
    ($($t:ty),*) => {
        $(
            impl ArgRepr for $t {
                fn write_repr(&self, out: &mut String) {
                    out.push_str(&self.to_string());
                }
            }
        )*
    };
}

macro_rules! debug_repr {
    ($($t:ty),*) => {
        $(
            impl ArgRepr for $t {
                fn write_repr(&self, out: &mut String) {
                    out.push_str(&format!("{:?}", self));
                }
            }
        )*
    };
}

display_repr!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, bool);
// Debug keeps the trailing `.0` on whole floats and escapes strings.
debug_repr!(f32, f64, char, str, String, Path, PathBuf);

impl ArgRepr for () {
    fn write_repr(&self, out: &mut String) {
        out.push_str("()");
    }
}

impl<T: ArgRepr + ?Sized> ArgRepr for &T {
    fn write_repr(&self, out: &mut String) {
        (**self).write_repr(out);
    }
}

impl<T: ArgRepr> ArgRepr for Option<T> {
    fn write_repr(&self, out: &mut String) {
        match self {
            Some(v) => {
                out.push_str("Some(");
                v.write_repr(out);
                out.push(')');
            }
            None => out.push_str("None"),
        }
    }
}

fn write_seq<'a, T: ArgRepr + 'a>(items: impl IntoIterator<Item = &'a T>, out: &mut String) {
    out.push('[');
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_repr(out);
    }
    out.push(']');
}

impl<T: ArgRepr> ArgRepr for [T] {
    fn write_repr(&self, out: &mut String) {
        write_seq(self, out);
    }
}

impl<T: ArgRepr, const N: usize> ArgRepr for [T; N] {
    fn write_repr(&self, out: &mut String) {
        write_seq(self, out);
    }
}

impl<T: ArgRepr> ArgRepr for Vec<T> {
    fn write_repr(&self, out: &mut String) {
        write_seq(self, out);
    }
}

impl<K: ArgRepr, V: ArgRepr> ArgRepr for BTreeMap<K, V> {
    fn write_repr(&self, out: &mut String) {
        out.push('{');
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            k.write_repr(out);
            out.push_str(": ");
            v.write_repr(out);
        }
        out.push('}');
    }
}

/// The positional and keyword arguments of one call, in canonical form.
///
/// Positional order and keyword insertion order are both significant.
///
/// ```rust
/// use steadfast::cache::CallArgs;
///
/// let args = CallArgs::new().arg(1).arg(2).kwarg("a", 3);
/// assert_eq!(args.signature("f"), "f(1, 2, a=3)");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallArgs {
    positional: Vec<String>,
    keyword: Vec<(String, String)>,
}

impl CallArgs {
    /// An empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl ArgRepr) -> Self {
        self.push_arg(value);
        self
    }

    /// Append a keyword argument. Re-using a key replaces its value in place.
    pub fn kwarg(mut self, key: impl Into<String>, value: impl ArgRepr) -> Self {
        self.push_kwarg(key, value);
        self
    }

    /// Append a positional argument in place.
    pub fn push_arg(&mut self, value: impl ArgRepr) {
        self.positional.push(value.repr());
    }

    /// Append a keyword argument in place.
    pub fn push_kwarg(&mut self, key: impl Into<String>, value: impl ArgRepr) {
        let key = key.into();
        let repr = value.repr();
        match self.keyword.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = repr,
            None => self.keyword.push((key, repr)),
        }
    }

    /// Positional argument representations, in order.
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// Keyword arguments and their representations, in insertion order.
    pub fn keyword(&self) -> &[(String, String)] {
        &self.keyword
    }

    /// The canonical call string `name(a, b, key=value)`.
    pub fn signature(&self, name: &str) -> String {
        let parts: Vec<String> = self
            .positional
            .iter()
            .cloned()
            .chain(self.keyword.iter().map(|(k, v)| format!("{}={}", k, v)))
            .collect();
        format!("{}({})", name, parts.join(", "))
    }
}

/// Conversion from an operation's argument type into [`CallArgs`].
///
/// Tuples map to positional arguments, one per element; use a 1-tuple for a
/// single argument. Sequences of `f64` map each element to a positional
/// argument so that [`JitterArgs`](crate::JitterArgs) operations can be
/// cached.
pub trait ToCallArgs {
    /// Build the canonical argument list.
    fn to_call_args(&self) -> CallArgs;
}

impl ToCallArgs for CallArgs {
    fn to_call_args(&self) -> CallArgs {
        self.clone()
    }
}

impl ToCallArgs for () {
    fn to_call_args(&self) -> CallArgs {
        CallArgs::new()
    }
}

impl ToCallArgs for Vec<f64> {
    fn to_call_args(&self) -> CallArgs {
        self.iter().fold(CallArgs::new(), |args, v| args.arg(*v))
    }
}

impl<const N: usize> ToCallArgs for [f64; N] {
    fn to_call_args(&self) -> CallArgs {
        self.iter().fold(CallArgs::new(), |args, v| args.arg(*v))
    }
}

macro_rules! tuple_call_args {
    ($($name:ident),+) => {
        impl<$($name: ArgRepr),+> ToCallArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn to_call_args(&self) -> CallArgs {
                let ($($name,)+) = self;
                CallArgs::new()$(.arg($name))+
            }
        }
    };
}

tuple_call_args!(A);
tuple_call_args!(A, B);
tuple_call_args!(A, B, C);
tuple_call_args!(A, B, C, D);
tuple_call_args!(A, B, C, D, E);
tuple_call_args!(A, B, C, D, E, F);
tuple_call_args!(A, B, C, D, E, F, G);
tuple_call_args!(A, B, C, D, E, F, G, H);

/// A 160-bit SHA-1 digest of a call signature.
///
/// Displays as 40 lowercase hex characters, the form used in cache file
/// names.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 20]);

impl Fingerprint {
    /// Digest an already-canonical signature string.
    pub fn of_signature(signature: &str) -> Self {
        let digest = Sha1::digest(signature.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest);
        Fingerprint(bytes)
    }

    /// The raw digest.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// The 40-character lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

/// A string that is not 40 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid fingerprint {0:?}: expected 40 lowercase hex characters")]
pub struct ParseFingerprintError(String);

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowercase = s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if s.len() != 40 || !lowercase {
            return Err(ParseFingerprintError(s.to_string()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| ParseFingerprintError(s.to_string()))?;
        Ok(Fingerprint(bytes))
    }
}

/// Fingerprint a call to `name` with `args`.
///
/// ```rust
/// use steadfast::cache::{fingerprint, CallArgs};
///
/// let a = fingerprint("f", &CallArgs::new().arg(1).arg(2).kwarg("a", 3));
/// let b = fingerprint("f", &CallArgs::new().arg(2).arg(1).kwarg("a", 3));
/// assert_ne!(a, b);
/// assert_eq!(a.to_string().len(), 40);
/// ```
pub fn fingerprint(name: &str, args: &CallArgs) -> Fingerprint {
    Fingerprint::of_signature(&args.signature(name))
}
