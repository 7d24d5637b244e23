use std::collections::BTreeMap;
use std::ops::{Add, Mul, Neg, Sub};

use derive_more::Display;

use super::Var;

/// A linear expression over decision variables: a coefficient per variable
/// plus a constant. Terms are kept in a `BTreeMap` so that iteration order is
/// deterministic for identical builds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    terms: BTreeMap<Var, f64>,
    constant: f64,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// The coefficient of `var`, or `0.0` if the variable does not occur.
    pub fn coefficient(&self, var: Var) -> f64 {
        self.terms.get(&var).copied().unwrap_or(0.0)
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn terms(&self) -> impl Iterator<Item = (Var, f64)> + '_ {
        self.terms.iter().map(|(v, c)| (*v, *c))
    }

    pub fn vars(&self) -> impl Iterator<Item = Var> + '_ {
        self.terms.keys().copied()
    }

    pub fn add_term(&mut self, coefficient: f64, var: Var) {
        *self.terms.entry(var).or_insert(0.0) += coefficient;
    }

    pub fn add_constant(&mut self, constant: f64) {
        self.constant += constant;
    }

    /// Split the expression into its variable coefficients and its constant.
    pub fn into_parts(self) -> (BTreeMap<Var, f64>, f64) {
        (self.terms, self.constant)
    }
}

impl From<Var> for LinExpr {
    fn from(var: Var) -> Self {
        let mut expr = LinExpr::new();
        expr.add_term(1.0, var);
        expr
    }
}

impl From<&Var> for LinExpr {
    fn from(var: &Var) -> Self {
        LinExpr::from(*var)
    }
}

impl From<f64> for LinExpr {
    fn from(constant: f64) -> Self {
        let mut expr = LinExpr::new();
        expr.add_constant(constant);
        expr
    }
}

impl<T: Into<LinExpr>> Add<T> for LinExpr {
    type Output = LinExpr;

    fn add(mut self, rhs: T) -> LinExpr {
        let rhs = rhs.into();
        for (var, coefficient) in rhs.terms {
            *self.terms.entry(var).or_insert(0.0) += coefficient;
        }
        self.constant += rhs.constant;
        self
    }
}

impl<T: Into<LinExpr>> Sub<T> for LinExpr {
    type Output = LinExpr;

    fn sub(self, rhs: T) -> LinExpr {
        self + (-rhs.into())
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;

    fn neg(mut self) -> LinExpr {
        for coefficient in self.terms.values_mut() {
            *coefficient = -*coefficient;
        }
        self.constant = -self.constant;
        self
    }
}

impl Mul<f64> for LinExpr {
    type Output = LinExpr;

    fn mul(mut self, rhs: f64) -> LinExpr {
        for coefficient in self.terms.values_mut() {
            *coefficient *= rhs;
        }
        self.constant *= rhs;
        self
    }
}

impl Mul<LinExpr> for f64 {
    type Output = LinExpr;

    fn mul(self, rhs: LinExpr) -> LinExpr {
        rhs * self
    }
}

impl<T: Into<LinExpr>> Add<T> for Var {
    type Output = LinExpr;

    fn add(self, rhs: T) -> LinExpr {
        LinExpr::from(self) + rhs
    }
}

impl<T: Into<LinExpr>> Sub<T> for Var {
    type Output = LinExpr;

    fn sub(self, rhs: T) -> LinExpr {
        LinExpr::from(self) - rhs
    }
}

impl Mul<f64> for Var {
    type Output = LinExpr;

    fn mul(self, rhs: f64) -> LinExpr {
        LinExpr::from(self) * rhs
    }
}

impl Mul<Var> for f64 {
    type Output = LinExpr;

    fn mul(self, rhs: Var) -> LinExpr {
        LinExpr::from(rhs) * self
    }
}

impl Add<LinExpr> for f64 {
    type Output = LinExpr;

    fn add(self, rhs: LinExpr) -> LinExpr {
        rhs + self
    }
}

impl Sub<LinExpr> for f64 {
    type Output = LinExpr;

    fn sub(self, rhs: LinExpr) -> LinExpr {
        -rhs + self
    }
}

impl Add<Var> for f64 {
    type Output = LinExpr;

    fn add(self, rhs: Var) -> LinExpr {
        LinExpr::from(rhs) + self
    }
}

impl Sub<Var> for f64 {
    type Output = LinExpr;

    fn sub(self, rhs: Var) -> LinExpr {
        -LinExpr::from(rhs) + self
    }
}

/// Sum an iterator of linear terms into a single expression.
pub trait LinSum: Iterator {
    fn lin_sum(self) -> LinExpr
    where
        Self: Sized,
        Self::Item: Into<LinExpr>,
    {
        self.fold(LinExpr::new(), |acc, term| acc + term.into())
    }
}

impl<I: Iterator> LinSum for I {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ConstrSense {
    #[display(fmt = "<=")]
    Less,
    #[display(fmt = "==")]
    Equal,
    #[display(fmt = ">=")]
    Greater,
}

/// A relation between two linear expressions, ready to be added to a model.
#[derive(Debug, Clone)]
pub struct Ineq {
    pub(crate) lhs: LinExpr,
    pub(crate) sense: ConstrSense,
    pub(crate) rhs: LinExpr,
}

/// Comparison operators producing an [`Ineq`]. Implemented for anything that
/// converts to a [`LinExpr`], i.e. variables, constants and expressions.
pub trait Relation: Into<LinExpr> + Sized {
    fn leq(self, rhs: impl Into<LinExpr>) -> Ineq {
        Ineq {
            lhs: self.into(),
            sense: ConstrSense::Less,
            rhs: rhs.into(),
        }
    }

    fn geq(self, rhs: impl Into<LinExpr>) -> Ineq {
        Ineq {
            lhs: self.into(),
            sense: ConstrSense::Greater,
            rhs: rhs.into(),
        }
    }

    fn equals(self, rhs: impl Into<LinExpr>) -> Ineq {
        Ineq {
            lhs: self.into(),
            sense: ConstrSense::Equal,
            rhs: rhs.into(),
        }
    }
}

impl<T: Into<LinExpr>> Relation for T {}
