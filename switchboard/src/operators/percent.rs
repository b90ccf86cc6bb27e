//! Deterministic percentage bucketing.
//!
//! A value's bucket is `stable_hash(value) % 100`, so the same logical
//! identity (a user id, an email) always lands in the same bucket across
//! evaluations and process restarts. Adjacent [`PercentRange`]s partition
//! the bucket space into non-overlapping cohorts.
//!
//! Falsy values (`0`, `""`, `null`, `false`) never match: they usually mean
//! "no identity" and would otherwise all pile into one bucket.

use std::fmt;

use super::{require_number, ApplyResult, Operator, OperatorInfo, OperatorResult, Params};
use crate::variable::Variable;

/// Bucket in `0..100` for a value.
pub fn bucket(value: &Variable) -> u64 {
    value.stable_hash() % 100
}

/// Holds for `percentage`% of distinct truthy values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percent {
    pub percentage: f64,
}

impl Percent {
    pub const INFO: OperatorInfo = OperatorInfo {
        name: "percent",
        group: "misc",
        preposition: "in the",
        arguments: &["percentage"],
    };

    pub fn new(percentage: f64) -> Self {
        Self { percentage }
    }

    pub fn from_params(params: &Params) -> OperatorResult<Self> {
        Ok(Self::new(require_number(
            Self::INFO.name,
            params,
            "percentage",
        )?))
    }
}

impl Operator for Percent {
    fn name(&self) -> &'static str {
        Self::INFO.name
    }
    fn group(&self) -> &'static str {
        Self::INFO.group
    }
    fn preposition(&self) -> &'static str {
        Self::INFO.preposition
    }
    fn arguments(&self) -> &'static [&'static str] {
        Self::INFO.arguments
    }
    fn params(&self) -> Vec<Variable> {
        vec![Variable::Float(self.percentage)]
    }

    fn applies_to(&self, value: &Variable) -> ApplyResult<bool> {
        if !value.is_truthy() {
            return Ok(false);
        }
        Ok((bucket(value) as f64) < self.percentage)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "in {}%", self.percentage)
    }
}

/// Holds for values whose bucket falls in `lower_limit..upper_limit`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentRange {
    pub lower_limit: f64,
    pub upper_limit: f64,
}

impl PercentRange {
    pub const INFO: OperatorInfo = OperatorInfo {
        name: "percent_range",
        group: "misc",
        preposition: "in the percentage range of",
        arguments: &["lower_limit", "upper_limit"],
    };

    pub fn new(lower_limit: f64, upper_limit: f64) -> Self {
        Self {
            lower_limit,
            upper_limit,
        }
    }

    pub fn from_params(params: &Params) -> OperatorResult<Self> {
        Ok(Self::new(
            require_number(Self::INFO.name, params, "lower_limit")?,
            require_number(Self::INFO.name, params, "upper_limit")?,
        ))
    }
}

impl Operator for PercentRange {
    fn name(&self) -> &'static str {
        Self::INFO.name
    }
    fn group(&self) -> &'static str {
        Self::INFO.group
    }
    fn preposition(&self) -> &'static str {
        Self::INFO.preposition
    }
    fn arguments(&self) -> &'static [&'static str] {
        Self::INFO.arguments
    }
    fn params(&self) -> Vec<Variable> {
        vec![
            Variable::Float(self.lower_limit),
            Variable::Float(self.upper_limit),
        ]
    }

    fn applies_to(&self, value: &Variable) -> ApplyResult<bool> {
        if !value.is_truthy() {
            return Ok(false);
        }
        let bucket = bucket(value) as f64;
        Ok(self.lower_limit <= bucket && bucket < self.upper_limit)
    }
}

impl fmt::Display for PercentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "in {} - {}%", self.lower_limit, self.upper_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users(n: usize) -> Vec<Variable> {
        (0..n).map(|i| Variable::from(format!("user-{}", i))).collect()
    }

    #[test]
    fn test_percent_is_deterministic() {
        let op = Percent::new(50.0);
        let first: Vec<bool> = users(200).iter().map(|u| op.applies_to(u).unwrap()).collect();
        let second: Vec<bool> = users(200).iter().map(|u| op.applies_to(u).unwrap()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_percent_distribution() {
        let op = Percent::new(10.0);
        let hits = users(1000)
            .iter()
            .filter(|u| op.applies_to(u).unwrap())
            .count();
        assert!((50..=150).contains(&hits), "hits = {}", hits);
    }

    #[test]
    fn test_percent_bounds() {
        let everyone = Percent::new(100.0);
        let nobody = Percent::new(0.0);
        for user in users(100) {
            assert!(everyone.applies_to(&user).unwrap());
            assert!(!nobody.applies_to(&user).unwrap());
        }
    }

    #[test]
    fn test_percent_rejects_falsy() {
        let op = Percent::new(100.0);
        assert!(!op.applies_to(&Variable::Integer(0)).unwrap());
        assert!(!op.applies_to(&Variable::from("")).unwrap());
        assert!(!op.applies_to(&Variable::Boolean(false)).unwrap());
        assert!(!op.applies_to(&Variable::Value(serde_json::Value::Null)).unwrap());
    }

    #[test]
    fn test_percent_monotonic_over_population() {
        let population = users(1000);
        let count = |p: f64| {
            let op = Percent::new(p);
            population.iter().filter(|u| op.applies_to(u).unwrap()).count()
        };
        assert!(count(10.0) <= count(25.0));
        assert!(count(25.0) <= count(75.0));
    }

    #[test]
    fn test_adjacent_ranges_do_not_overlap() {
        let low = PercentRange::new(0.0, 30.0);
        let high = PercentRange::new(30.0, 100.0);
        for user in users(500) {
            let a = low.applies_to(&user).unwrap();
            let b = high.applies_to(&user).unwrap();
            assert!(a ^ b, "{} must land in exactly one cohort", user);
        }
    }

    #[test]
    fn test_range_matches_bucket() {
        let user = Variable::from("someone@example.com");
        let b = bucket(&user) as f64;
        assert!(PercentRange::new(b, b + 1.0).applies_to(&user).unwrap());
        assert!(!PercentRange::new(b + 1.0, 100.0).applies_to(&user).unwrap());
    }

    #[test]
    fn test_display() {
        assert_eq!(Percent::new(10.0).to_string(), "in 10%");
        assert_eq!(PercentRange::new(10.0, 20.0).to_string(), "in 10 - 20%");
    }
}
