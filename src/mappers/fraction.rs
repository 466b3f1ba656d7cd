//! The `fraction` mapper: decorates each record with `<field>_fraction`,
//! the ratio of that record's value to the sum of all values for the same
//! field (optionally computed per group-by key instead of globally).
//!
//! Grounded directly on `mapper_fraction.c`: a two-pass verb that retains
//! every record on pass one (accumulating running sums as it goes) and
//! emits the decorated records only at end-of-stream, meaning it produces
//! no output until the whole input has been read.

use crate::context::StreamContext;
use crate::error::{EngineError, Result};
use crate::field::Field;
use crate::pipeline::Mapper;
use crate::record::Record;
use std::collections::HashMap;

fn parse_numeric(field: &Field<'_>) -> std::result::Result<f64, ()> {
    field.as_str().trim().parse::<f64>().map_err(|_| ())
}

/// `-f a,b,c` / `-g d,e,f`: which fields get a fraction computed, and which
/// fields (if any) partition the running sums into separate groups.
pub struct FractionMapper<'src> {
    fraction_fields: Vec<String>,
    group_by_fields: Vec<String>,
    retained: Vec<Record<'src>>,
    sums: HashMap<Vec<String>, HashMap<String, f64>>,
}

impl<'src> FractionMapper<'src> {
    pub fn new(fraction_fields: Vec<String>, group_by_fields: Vec<String>) -> Self {
        FractionMapper {
            fraction_fields,
            group_by_fields,
            retained: Vec::new(),
            sums: HashMap::new(),
        }
    }

    /// The group-by key for a record, or `None` if the record is missing
    /// one of the configured group-by fields (such a record is retained
    /// and passed through untouched, but contributes to no sum).
    fn group_key(&self, record: &Record<'src>) -> Option<Vec<String>> {
        let mut key = Vec::with_capacity(self.group_by_fields.len());
        for name in &self.group_by_fields {
            key.push(record.get(name)?.as_str().to_string());
        }
        Some(key)
    }

    fn accumulate(&mut self, record: &Record<'src>) -> Result<()> {
        let Some(key) = self.group_key(record) else { return Ok(()) };
        let sums_for_group = self.sums.entry(key).or_default();
        for name in &self.fraction_fields {
            let Some(field) = record.get(name) else { continue };
            let value = parse_numeric(field).map_err(|_| EngineError::NonNumericValue {
                field: name.clone(),
                value: field.as_str().to_string(),
            })?;
            *sums_for_group.entry(name.clone()).or_insert(0.0) += value;
        }
        Ok(())
    }

    fn decorate(&self, mut record: Record<'src>) -> Result<Record<'src>> {
        let Some(key) = self.group_key(&record) else { return Ok(record) };
        let Some(sums_for_group) = self.sums.get(&key) else { return Ok(record) };
        for name in &self.fraction_fields {
            let Some(field) = record.get(name) else { continue };
            let value = parse_numeric(field).map_err(|_| EngineError::NonNumericValue {
                field: name.clone(),
                value: field.as_str().to_string(),
            })?;
            let output_name = format!("{name}_fraction");
            // Preserves mapper_fraction.c's exact quirk: the zero-check
            // guards the numerator, not the group sum. A record with a
            // numerator of exactly zero gets the error marker even when
            // the sum is a perfectly good nonzero denominator.
            let output_value = if value != 0.0 {
                let sum = sums_for_group.get(name).copied().unwrap_or(0.0);
                format!("{}", value / sum)
            } else {
                "(error)".to_string()
            };
            record.push_owned(output_name, Field::Owned(output_value));
        }
        Ok(record)
    }
}

impl<'src> Mapper<'src> for FractionMapper<'src> {
    fn process(&mut self, record: Option<Record<'src>>, _ctx: &StreamContext) -> Result<Vec<Record<'src>>> {
        match record {
            Some(record) => {
                self.accumulate(&record)?;
                self.retained.push(record);
                Ok(vec![])
            }
            None => {
                let retained = std::mem::take(&mut self.retained);
                let mut out = Vec::with_capacity(retained.len());
                for record in retained {
                    out.push(self.decorate(record)?);
                }
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StreamContext;
    use std::sync::Arc;

    fn rec(pairs: &[(&str, &'static str)]) -> Record<'static> {
        let keys: crate::record::Keys =
            Arc::from(pairs.iter().map(|(k, _)| Arc::from(*k)).collect::<Vec<Arc<str>>>().into_boxed_slice());
        let values = pairs.iter().map(|(_, v)| Field::Borrowed(*v)).collect();
        Record::new(keys, values)
    }

    #[test]
    fn no_output_until_end_of_stream() {
        let mut mapper = FractionMapper::new(vec!["x".to_string()], vec![]);
        let ctx = StreamContext::new();
        let out = mapper.process(Some(rec(&[("x", "1")])), &ctx).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn fractions_of_total_sum_to_one() {
        let mut mapper = FractionMapper::new(vec!["x".to_string()], vec![]);
        let ctx = StreamContext::new();
        mapper.process(Some(rec(&[("x", "1")])), &ctx).unwrap();
        mapper.process(Some(rec(&[("x", "2")])), &ctx).unwrap();
        mapper.process(Some(rec(&[("x", "3")])), &ctx).unwrap();
        mapper.process(Some(rec(&[("x", "4")])), &ctx).unwrap();
        let out = mapper.process(None, &ctx).unwrap();
        let fractions: Vec<String> =
            out.iter().map(|r| r.get("x_fraction").unwrap().as_str().to_string()).collect();
        assert_eq!(fractions, vec!["0.1", "0.2", "0.3", "0.4"]);
    }

    #[test]
    fn grouped_sums_are_independent() {
        let mut mapper = FractionMapper::new(vec!["x".to_string()], vec!["g".to_string()]);
        let ctx = StreamContext::new();
        mapper.process(Some(rec(&[("g", "a"), ("x", "1")])), &ctx).unwrap();
        mapper.process(Some(rec(&[("g", "a"), ("x", "1")])), &ctx).unwrap();
        mapper.process(Some(rec(&[("g", "b"), ("x", "5")])), &ctx).unwrap();
        let out = mapper.process(None, &ctx).unwrap();
        assert_eq!(out[0].get("x_fraction").unwrap().as_str(), "0.5");
        assert_eq!(out[2].get("x_fraction").unwrap().as_str(), "1");
    }

    #[test]
    fn zero_numerator_reports_error_even_with_nonzero_sum() {
        let mut mapper = FractionMapper::new(vec!["x".to_string()], vec![]);
        let ctx = StreamContext::new();
        mapper.process(Some(rec(&[("x", "0")])), &ctx).unwrap();
        mapper.process(Some(rec(&[("x", "5")])), &ctx).unwrap();
        let out = mapper.process(None, &ctx).unwrap();
        assert_eq!(out[0].get("x_fraction").unwrap().as_str(), "(error)");
        assert_eq!(out[1].get("x_fraction").unwrap().as_str(), "1");
    }

    #[test]
    fn non_numeric_value_is_fatal() {
        let mut mapper = FractionMapper::new(vec!["x".to_string()], vec![]);
        let ctx = StreamContext::new();
        let err = mapper.process(Some(rec(&[("x", "not-a-number")])), &ctx).unwrap_err();
        assert!(matches!(err, EngineError::NonNumericValue { .. }));
    }

    #[test]
    fn record_missing_group_by_field_passes_through_undecorated() {
        let mut mapper = FractionMapper::new(vec!["x".to_string()], vec!["g".to_string()]);
        let ctx = StreamContext::new();
        mapper.process(Some(rec(&[("x", "1")])), &ctx).unwrap();
        let out = mapper.process(None, &ctx).unwrap();
        assert!(out[0].get("x_fraction").is_none());
    }
}
