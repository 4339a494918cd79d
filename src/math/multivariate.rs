//! Sparse multivariate polynomials used to state AIR constraints symbolically.
//!
//! A term is keyed by its exponent vector, one entry per variable. Keys are
//! stored without trailing zero exponents, so operands built over different
//! numbers of variables combine as if both were zero-padded to the larger arity.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use crate::error::{Result, StarkError};
use crate::field::FieldElement;
use crate::math::polynomial::Polynomial;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultivariatePolynomial {
    terms: BTreeMap<Vec<usize>, FieldElement>,
}

fn canonical(mut exponents: Vec<usize>) -> Vec<usize> {
    while exponents.last() == Some(&0) {
        exponents.pop();
    }
    exponents
}

fn accumulate(terms: &mut BTreeMap<Vec<usize>, FieldElement>, key: Vec<usize>, coeff: FieldElement) {
    if coeff.is_zero() {
        return;
    }
    let entry = terms.entry(key).or_insert(FieldElement::ZERO);
    *entry += coeff;
}

fn prune(mut terms: BTreeMap<Vec<usize>, FieldElement>) -> BTreeMap<Vec<usize>, FieldElement> {
    terms.retain(|_, c| !c.is_zero());
    terms
}

impl MultivariatePolynomial {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn constant(value: FieldElement) -> Self {
        let mut terms = BTreeMap::new();
        accumulate(&mut terms, Vec::new(), value);
        Self { terms }
    }

    pub fn one() -> Self {
        Self::constant(FieldElement::ONE)
    }

    /// The coordinate projection `x_index`.
    pub fn variable(index: usize) -> Self {
        let mut exponents = vec![0; index + 1];
        exponents[index] = 1;
        let mut terms = BTreeMap::new();
        terms.insert(exponents, FieldElement::ONE);
        Self { terms }
    }

    /// The `n` projections `x_0, …, x_{n-1}`.
    pub fn identity(n: usize) -> Vec<Self> {
        (0..n).map(Self::variable).collect()
    }

    /// Embeds a univariate polynomial as a polynomial in variable `index` only.
    pub fn lift(polynomial: &Polynomial, index: usize) -> Self {
        let mut terms = BTreeMap::new();
        for (power, &coeff) in polynomial.coefficients().iter().enumerate() {
            let mut exponents = vec![0; index + 1];
            exponents[index] = power;
            accumulate(&mut terms, canonical(exponents), coeff);
        }
        Self { terms: prune(terms) }
    }

    pub fn is_zero(&self) -> bool {
        self.terms.values().all(|c| c.is_zero())
    }

    pub fn terms(&self) -> impl Iterator<Item = (&[usize], &FieldElement)> {
        self.terms.iter().map(|(k, v)| (k.as_slice(), v))
    }

    /// Number of variables actually referenced.
    pub fn arity(&self) -> usize {
        self.terms.keys().map(Vec::len).max().unwrap_or(0)
    }

    /// Largest exponent sum over all non-zero terms.
    pub fn total_degree(&self) -> usize {
        self.terms
            .iter()
            .filter(|(_, c)| !c.is_zero())
            .map(|(k, _)| k.iter().sum())
            .max()
            .unwrap_or(0)
    }

    pub fn mul_scalar(&self, scalar: FieldElement) -> Self {
        let terms = self
            .terms
            .iter()
            .map(|(k, &c)| (k.clone(), c * scalar))
            .collect();
        Self {
            terms: prune(terms),
        }
    }

    /// Square-and-multiply. The zero polynomial stays zero for every exponent, including 0.
    pub fn pow(&self, mut exp: u64) -> Self {
        if self.is_zero() {
            return Self::zero();
        }

        let mut result = Self::one();
        let mut base = self.clone();
        while exp > 0 {
            if exp & 1 == 1 {
                result = &result * &base;
            }
            exp >>= 1;
            if exp > 0 {
                base = &base * &base;
            }
        }
        result
    }

    /// Substitutes `point[i]` for variable `i`.
    pub fn evaluate(&self, point: &[FieldElement]) -> Result<FieldElement> {
        let mut acc = FieldElement::ZERO;
        for (exponents, &coeff) in &self.terms {
            if coeff.is_zero() {
                continue;
            }
            if exponents.len() > point.len() {
                return Err(StarkError::SizeMismatch {
                    expected: exponents.len(),
                    actual: point.len(),
                });
            }
            let mut term = coeff;
            for (&x, &e) in point.iter().zip(exponents) {
                if e > 0 {
                    term *= x.pow(e as u128);
                }
            }
            acc += term;
        }
        Ok(acc)
    }

    /// Substitutes the univariate polynomial `polys[i]` for variable `i`.
    pub fn evaluate_symbolic(&self, polys: &[Polynomial]) -> Result<Polynomial> {
        let mut cache = PowerCache::new(polys);
        let mut result: Vec<FieldElement> = Vec::new();

        for (exponents, &coeff) in &self.terms {
            if coeff.is_zero() {
                continue;
            }
            if exponents.len() > polys.len() {
                return Err(StarkError::SizeMismatch {
                    expected: exponents.len(),
                    actual: polys.len(),
                });
            }

            let mut term = Polynomial::constant(coeff);
            for (i, &e) in exponents.iter().enumerate() {
                if e == 0 {
                    continue;
                }
                term = &term * cache.power(i, e);
                if term.is_zero() {
                    break;
                }
            }

            if result.len() < term.coefficients().len() {
                result.resize(term.coefficients().len(), FieldElement::ZERO);
            }
            for (acc, &c) in result.iter_mut().zip(term.coefficients()) {
                *acc += c;
            }
        }

        Ok(Polynomial::new(result))
    }
}

/// Lazily computed powers `bases[i]^e`, shared across the terms of one substitution.
struct PowerCache<'a> {
    bases: &'a [Polynomial],
    powers: Vec<Vec<Polynomial>>,
}

impl<'a> PowerCache<'a> {
    fn new(bases: &'a [Polynomial]) -> Self {
        Self {
            bases,
            powers: vec![Vec::new(); bases.len()],
        }
    }

    fn power(&mut self, index: usize, exp: usize) -> &Polynomial {
        let base = &self.bases[index];
        let powers = &mut self.powers[index];
        while powers.len() < exp {
            let next = match powers.last() {
                Some(last) => last * base,
                None => base.clone(),
            };
            powers.push(next);
        }
        &powers[exp - 1]
    }
}

impl Add for &MultivariatePolynomial {
    type Output = MultivariatePolynomial;

    fn add(self, other: &MultivariatePolynomial) -> MultivariatePolynomial {
        let mut terms = self.terms.clone();
        for (k, &c) in &other.terms {
            accumulate(&mut terms, k.clone(), c);
        }
        MultivariatePolynomial {
            terms: prune(terms),
        }
    }
}

impl Add for MultivariatePolynomial {
    type Output = MultivariatePolynomial;

    fn add(self, other: MultivariatePolynomial) -> MultivariatePolynomial {
        &self + &other
    }
}

impl Neg for &MultivariatePolynomial {
    type Output = MultivariatePolynomial;

    fn neg(self) -> MultivariatePolynomial {
        MultivariatePolynomial {
            terms: self.terms.iter().map(|(k, &c)| (k.clone(), -c)).collect(),
        }
    }
}

impl Neg for MultivariatePolynomial {
    type Output = MultivariatePolynomial;

    fn neg(self) -> MultivariatePolynomial {
        -&self
    }
}

impl Sub for &MultivariatePolynomial {
    type Output = MultivariatePolynomial;

    fn sub(self, other: &MultivariatePolynomial) -> MultivariatePolynomial {
        self + &(-other)
    }
}

impl Sub for MultivariatePolynomial {
    type Output = MultivariatePolynomial;

    fn sub(self, other: MultivariatePolynomial) -> MultivariatePolynomial {
        &self - &other
    }
}

impl Mul for &MultivariatePolynomial {
    type Output = MultivariatePolynomial;

    fn mul(self, other: &MultivariatePolynomial) -> MultivariatePolynomial {
        let mut terms = BTreeMap::new();
        for (ka, &ca) in &self.terms {
            for (kb, &cb) in &other.terms {
                let arity = ka.len().max(kb.len());
                let exponents = (0..arity)
                    .map(|i| ka.get(i).copied().unwrap_or(0) + kb.get(i).copied().unwrap_or(0))
                    .collect();
                accumulate(&mut terms, canonical(exponents), ca * cb);
            }
        }
        MultivariatePolynomial {
            terms: prune(terms),
        }
    }
}

impl Mul for MultivariatePolynomial {
    type Output = MultivariatePolynomial;

    fn mul(self, other: MultivariatePolynomial) -> MultivariatePolynomial {
        &self * &other
    }
}

impl fmt::Display for MultivariatePolynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let terms: Vec<String> = self
            .terms
            .iter()
            .filter(|(_, c)| !c.is_zero())
            .map(|(exponents, c)| {
                let mut term = c.to_string();
                for (i, &e) in exponents.iter().enumerate() {
                    match e {
                        0 => {}
                        1 => term.push_str(&format!("*x{}", i)),
                        _ => term.push_str(&format!("*x{}^{}", i, e)),
                    }
                }
                term
            })
            .collect();
        write!(f, "{}", terms.join(" + "))
    }
}
