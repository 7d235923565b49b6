//! Code/value dictionary for quantized value storage.
//!
//! When a dataset has few distinct values (integer or half-star ratings),
//! storing a 2-byte code per nonzero instead of a 4-byte float halves the
//! value array. [`QuantDict`] is the bijection between the two.

use std::collections::HashMap;

/// Largest number of distinct values a dictionary can hold.
pub const MAX_CODES: usize = u16::MAX as usize + 1;

/// Bidirectional map between compact `u16` codes and `f32` values.
///
/// Codes are allocated densely in order of first observation and never
/// change afterwards, so `decode(encode(v)) == v` holds for the dictionary's
/// lifetime. Values are keyed by their bit pattern: `0.0` and `-0.0` get
/// distinct codes and every NaN payload round-trips bit-for-bit.
#[derive(Clone, Debug, Default)]
pub struct QuantDict {
    /// Value bits → code.
    code_of: HashMap<u32, u16>,
    /// Code → value.
    values: Vec<f32>,
}

impl QuantDict {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dictionary pre-seeded with a known discrete value set.
    ///
    /// Codes follow the iteration order; duplicates are ignored.
    pub fn with_values<I: IntoIterator<Item = f32>>(values: I) -> Self {
        let mut dict = Self::new();
        for v in values {
            dict.encode(v);
        }
        dict
    }

    /// Code for `value`, allocating a new one on first occurrence.
    ///
    /// # Panics
    ///
    /// Panics if the dictionary already holds [`MAX_CODES`] distinct values.
    #[inline]
    pub fn encode(&mut self, value: f32) -> u16 {
        let key = value.to_bits();
        if let Some(&code) = self.code_of.get(&key) {
            return code;
        }
        assert!(
            self.values.len() < MAX_CODES,
            "quantization dictionary overflow: more than {} distinct values",
            MAX_CODES
        );
        let code = self.values.len() as u16;
        self.values.push(value);
        self.code_of.insert(key, code);
        code
    }

    /// Code for `value` if it has been seen, without allocating.
    #[inline]
    pub fn code(&self, value: f32) -> Option<u16> {
        self.code_of.get(&value.to_bits()).copied()
    }

    /// Value for `code`.
    ///
    /// # Panics
    ///
    /// Panics if `code` was never produced by [`encode`](Self::encode).
    #[inline]
    pub fn decode(&self, code: u16) -> f32 {
        match self.values.get(code as usize) {
            Some(&v) => v,
            None => panic!(
                "unknown quantization code {} (dictionary holds {} values)",
                code,
                self.values.len()
            ),
        }
    }

    /// Number of distinct values.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no value has been encoded yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All values, indexed by code.
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_occurrence_allocates_dense_codes() {
        let mut dict = QuantDict::new();
        assert_eq!(dict.encode(3.0), 0);
        assert_eq!(dict.encode(4.5), 1);
        assert_eq!(dict.encode(3.0), 0);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.values(), &[3.0, 4.5]);
    }

    #[test]
    fn decode_inverts_encode() {
        let mut dict = QuantDict::new();
        for v in [0.5f32, 1.0, 1.5, 5.0, -2.0, 0.0, -0.0] {
            let code = dict.encode(v);
            assert_eq!(dict.decode(code).to_bits(), v.to_bits());
        }
        assert_eq!(dict.len(), 7);
    }

    #[test]
    fn nan_round_trips_bitwise() {
        let mut dict = QuantDict::new();
        let code = dict.encode(f32::NAN);
        assert!(dict.decode(code).is_nan());
        assert_eq!(dict.encode(f32::NAN), code);
    }

    #[test]
    fn seeded_dictionary_keeps_order() {
        let dict = QuantDict::with_values([1.0, 2.0, 3.0, 2.0]);
        assert_eq!(dict.len(), 3);
        assert_eq!(dict.code(2.0), Some(1));
        assert_eq!(dict.code(9.0), None);
    }

    #[test]
    #[should_panic(expected = "unknown quantization code")]
    fn decode_unknown_code_panics() {
        let dict = QuantDict::with_values([1.0]);
        dict.decode(1);
    }
}
