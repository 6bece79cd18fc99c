//! Base implementation of records.
use crate::error::SimcostError;
use chrono::prelude::{DateTime, Local};
use std::{
    collections::{
        hash_map::{IntoIter, Iter, Keys},
        HashMap,
    },
    convert::Into,
    iter::IntoIterator,
};

/// Represents possible types of values in a [`Record`].
#[derive(Debug, Clone)]
pub enum RecordValue {
    /// Scalar.
    Scalar(f64),

    /// Boolean flag, used for constraint-violation diagnostics.
    Bool(bool),

    /// DateTime.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array.
    Array1(Vec<f64>),

    /// String.
    String(String),
}

/// Represents a record as a string-keyed map of [`RecordValue`]s.
#[derive(Debug, Clone)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Constructs an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Constructs a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f64) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Constructs a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Returns an iterator over the keys of the record.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over key-value pairs of the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Returns an iterator which consumes the record.
    pub fn into_iter_in_record(self) -> IntoIter<String, RecordValue> {
        self.0.into_iter()
    }

    /// Gets the value corresponding to the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges records, the rhs overwriting on key collision.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Merges records in place, the given record overwriting on collision.
    pub fn merge_inplace(&mut self, record: Record) {
        for (k, v) in record.iter() {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Gets a scalar value.
    ///
    /// Returns an error when the key is missing or holds a different
    /// variant.
    pub fn get_scalar(&self, k: &str) -> Result<f64, SimcostError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::Scalar(v) => Ok(*v),
                _ => Err(SimcostError::RecordValueType(k.to_string())),
            }
        } else {
            Err(SimcostError::RecordKey(k.to_string()))
        }
    }

    /// Gets a boolean flag.
    pub fn get_bool(&self, k: &str) -> Result<bool, SimcostError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::Bool(v) => Ok(*v),
                _ => Err(SimcostError::RecordValueType(k.to_string())),
            }
        } else {
            Err(SimcostError::RecordKey(k.to_string()))
        }
    }

    /// Gets a 1-dimensional array value.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f64>, SimcostError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::Array1(v) => Ok(v.clone()),
                _ => Err(SimcostError::RecordValueType(k.to_string())),
            }
        } else {
            Err(SimcostError::RecordKey(k.to_string()))
        }
    }

    /// Gets a string value.
    pub fn get_string(&self, k: &str) -> Result<String, SimcostError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::String(s) => Ok(s.clone()),
                _ => Err(SimcostError::RecordValueType(k.to_string())),
            }
        } else {
            Err(SimcostError::RecordKey(k.to_string()))
        }
    }

    /// Returns `true` if the record contains no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Record, RecordValue};

    #[test]
    fn test_scalar_and_bool_access() {
        let mut record = Record::from_scalar("reference", 8.0);
        record.insert("violation_of_constraint", RecordValue::Bool(false));

        assert_eq!(record.get_scalar("reference").unwrap(), 8.0);
        assert!(!record.get_bool("violation_of_constraint").unwrap());
        assert!(record.get_scalar("violation_of_constraint").is_err());
        assert!(record.get_scalar("missing").is_err());
    }

    #[test]
    fn test_merge_overwrites() {
        let a = Record::from_scalar("cost", 1.0);
        let b = Record::from_scalar("cost", 2.0);
        let merged = a.merge(b);
        assert_eq!(merged.get_scalar("cost").unwrap(), 2.0);
    }
}
