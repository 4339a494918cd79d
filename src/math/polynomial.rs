//! Dense univariate polynomials over the prime field.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use crate::error::{Result, StarkError};
use crate::field::FieldElement;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Polynomial with field coefficients.
///
/// The polynomial is stored as a vector of coefficients, where the index represents
/// the power of x. For example, [1, 2, 3] represents 3x² + 2x + 1.
///
/// # Invariants
///
/// * The coefficients vector has no trailing zeros, so the zero polynomial is
///   the empty vector and equality does not depend on padding.
pub struct Polynomial {
    /// Coefficients in ascending order of power.
    coefficients: Vec<FieldElement>,
}

impl Polynomial {
    /// Creates a new polynomial from coefficients, dropping trailing zeros.
    pub fn new(mut coefficients: Vec<FieldElement>) -> Self {
        while coefficients.last().is_some_and(|x| x.is_zero()) {
            coefficients.pop();
        }
        Self { coefficients }
    }

    pub fn zero() -> Self {
        Self {
            coefficients: Vec::new(),
        }
    }

    pub fn constant(value: FieldElement) -> Self {
        Self::new(vec![value])
    }

    /// The polynomial `x`.
    pub fn x() -> Self {
        Self::new(vec![FieldElement::ZERO, FieldElement::ONE])
    }

    pub fn is_zero(&self) -> bool {
        self.coefficients.iter().all(|c| c.is_zero())
    }

    /// Highest power with a non-zero coefficient, or -1 for the zero polynomial.
    pub fn degree(&self) -> isize {
        self.coefficients
            .iter()
            .rposition(|c| !c.is_zero())
            .map_or(-1, |i| i as isize)
    }

    /// Coefficient of the highest power term; `None` for the zero polynomial.
    pub fn leading_coefficient(&self) -> Option<FieldElement> {
        let degree = self.degree();
        if degree < 0 {
            None
        } else {
            Some(self.coefficients[degree as usize])
        }
    }

    pub fn coefficients(&self) -> &[FieldElement] {
        &self.coefficients
    }

    /// Divides this polynomial by another, returning `(quotient, remainder)`.
    ///
    /// Schoolbook long division; the remainder has degree lower than the divisor.
    /// Fails with [`StarkError::InvalidDivisor`] when the divisor is zero.
    pub fn divided_by(&self, divisor: &Polynomial) -> Result<(Polynomial, Polynomial)> {
        let divisor_degree = divisor.degree();
        let lead = divisor
            .leading_coefficient()
            .ok_or(StarkError::InvalidDivisor)?;
        let lead_inv = lead.inverse()?;

        let dividend_degree = self.degree();
        if dividend_degree < divisor_degree {
            return Ok((Polynomial::zero(), self.clone()));
        }

        let divisor_degree = divisor_degree as usize;
        let dividend_degree = dividend_degree as usize;
        let mut remainder = self.coefficients[..=dividend_degree].to_vec();
        let mut quotient = vec![FieldElement::ZERO; dividend_degree - divisor_degree + 1];

        for i in (0..=dividend_degree - divisor_degree).rev() {
            let leading = remainder[i + divisor_degree];
            if leading.is_zero() {
                continue;
            }

            let coeff = leading * lead_inv;
            quotient[i] = coeff;
            for (j, d) in divisor.coefficients[..=divisor_degree].iter().enumerate() {
                remainder[i + j] -= coeff * *d;
            }
        }

        Ok((Polynomial::new(quotient), Polynomial::new(remainder)))
    }

    /// Exact division: fails with [`StarkError::NonZeroRemainder`] if `divisor` does not divide `self`.
    pub fn exact_div(&self, divisor: &Polynomial) -> Result<Polynomial> {
        let (quotient, remainder) = self.divided_by(divisor)?;
        if !remainder.is_zero() {
            return Err(StarkError::NonZeroRemainder);
        }
        Ok(quotient)
    }

    /// Multiplies every coefficient by the same scalar.
    pub fn mul_scalar(&self, scalar: FieldElement) -> Polynomial {
        Polynomial::new(self.coefficients.iter().map(|&c| c * scalar).collect())
    }

    pub fn div_scalar(&self, scalar: FieldElement) -> Result<Polynomial> {
        Ok(self.mul_scalar(scalar.inverse()?))
    }

    /// Returns `p(s·x)`: coefficient `i` is multiplied by `s^i`.
    pub fn scale(&self, s: FieldElement) -> Polynomial {
        let mut power = FieldElement::ONE;
        let coefficients = self
            .coefficients
            .iter()
            .map(|&c| {
                let scaled = c * power;
                power *= s;
                scaled
            })
            .collect();
        Polynomial::new(coefficients)
    }

    /// Square-and-multiply; `p^0` is the constant 1.
    pub fn pow(&self, mut exp: u64) -> Polynomial {
        let mut result = Polynomial::constant(FieldElement::ONE);
        if self.is_zero() && exp > 0 {
            return Polynomial::zero();
        }

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

    /// Evaluates the polynomial at `x` with Horner's method.
    pub fn evaluate(&self, x: FieldElement) -> FieldElement {
        self.coefficients
            .iter()
            .rev()
            .fold(FieldElement::ZERO, |acc, &coeff| acc * x + coeff)
    }

    pub fn evaluate_domain(&self, domain: &[FieldElement]) -> Vec<FieldElement> {
        domain.iter().map(|&x| self.evaluate(x)).collect()
    }
}

/// Lagrange interpolation: the unique polynomial of degree < |domain| through the points.
pub fn interpolate_domain(domain: &[FieldElement], values: &[FieldElement]) -> Result<Polynomial> {
    if domain.len() != values.len() {
        return Err(StarkError::SizeMismatch {
            expected: domain.len(),
            actual: values.len(),
        });
    }

    // Each basis numerator is Z(x) / (x - d_i), obtained by synthetic division.
    let zerofier = zerofier_domain(domain);
    let mut result = vec![FieldElement::ZERO; domain.len()];

    for (i, (&d_i, &v_i)) in domain.iter().zip(values).enumerate() {
        let denominator: FieldElement = domain
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, &d_j)| d_i - d_j)
            .product();
        let weight = v_i.checked_div(denominator)?;
        if weight.is_zero() {
            continue;
        }

        let numerator = synthetic_division(&zerofier.coefficients, d_i);
        for (acc, &c) in result.iter_mut().zip(&numerator) {
            *acc += c * weight;
        }
    }

    Ok(Polynomial::new(result))
}

/// Divides by `(x - root)` assuming exactness; returns the quotient coefficients.
fn synthetic_division(coefficients: &[FieldElement], root: FieldElement) -> Vec<FieldElement> {
    let n = coefficients.len();
    if n < 2 {
        return Vec::new();
    }
    let mut quotient = vec![FieldElement::ZERO; n - 1];
    let mut carry = FieldElement::ZERO;
    for k in (1..n).rev() {
        carry = coefficients[k] + carry * root;
        quotient[k - 1] = carry;
    }
    quotient
}

/// `∏ (x - dᵢ)`; the empty domain yields the constant 1.
pub fn zerofier_domain(domain: &[FieldElement]) -> Polynomial {
    let mut coefficients = vec![FieldElement::ONE];
    for &d in domain {
        let mut next = vec![FieldElement::ZERO; coefficients.len() + 1];
        for (k, &c) in coefficients.iter().enumerate() {
            next[k + 1] += c;
            next[k] -= c * d;
        }
        coefficients = next;
    }
    Polynomial::new(coefficients)
}

/// True when the points lie on a single line; fewer than two points are trivially colinear.
pub fn test_colinearity(domain: &[FieldElement], values: &[FieldElement]) -> Result<bool> {
    if domain.len() != values.len() {
        return Err(StarkError::SizeMismatch {
            expected: domain.len(),
            actual: values.len(),
        });
    }
    if domain.len() < 2 {
        return Ok(true);
    }
    Ok(interpolate_domain(domain, values)?.degree() <= 1)
}

impl Add for &Polynomial {
    type Output = Polynomial;

    fn add(self, other: &Polynomial) -> Polynomial {
        let max_len = self.coefficients.len().max(other.coefficients.len());
        let mut result = vec![FieldElement::ZERO; max_len];

        for (acc, &c) in result.iter_mut().zip(&self.coefficients) {
            *acc += c;
        }
        for (acc, &c) in result.iter_mut().zip(&other.coefficients) {
            *acc += c;
        }

        Polynomial::new(result)
    }
}

impl Add for Polynomial {
    type Output = Polynomial;

    fn add(self, other: Polynomial) -> Polynomial {
        &self + &other
    }
}

impl Neg for &Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        Polynomial::new(self.coefficients.iter().map(|&c| -c).collect())
    }
}

impl Neg for Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        -&self
    }
}

impl Sub for &Polynomial {
    type Output = Polynomial;

    fn sub(self, other: &Polynomial) -> Polynomial {
        self + &(-other)
    }
}

impl Sub for Polynomial {
    type Output = Polynomial;

    fn sub(self, other: Polynomial) -> Polynomial {
        &self - &other
    }
}

impl Mul for &Polynomial {
    type Output = Polynomial;

    fn mul(self, other: &Polynomial) -> Polynomial {
        if self.is_zero() || other.is_zero() {
            return Polynomial::zero();
        }

        let mut result =
            vec![FieldElement::ZERO; self.coefficients.len() + other.coefficients.len() - 1];
        for (i, &a) in self.coefficients.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, &b) in other.coefficients.iter().enumerate() {
                result[i + j] += a * b;
            }
        }

        Polynomial::new(result)
    }
}

impl Mul for Polynomial {
    type Output = Polynomial;

    fn mul(self, other: Polynomial) -> Polynomial {
        &self * &other
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self
            .coefficients
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_zero())
            .map(|(i, c)| match i {
                0 => format!("{}", c),
                1 => format!("{}x", c),
                _ => format!("{}x^{}", c, i),
            })
            .collect();

        if terms.is_empty() {
            write!(f, "0")
        } else {
            write!(f, "{}", terms.join(" + "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(values: &[u64]) -> Polynomial {
        Polynomial::new(values.iter().map(|&v| FieldElement::from(v)).collect())
    }

    fn elements(values: &[u64]) -> Vec<FieldElement> {
        values.iter().map(|&v| FieldElement::from(v)).collect()
    }

    #[test]
    fn test_degree() {
        assert_eq!(Polynomial::zero().degree(), -1);
        assert_eq!(poly(&[0, 0, 0]).degree(), -1);
        assert_eq!(poly(&[5]).degree(), 0);
        assert_eq!(poly(&[1, 2, 3]).degree(), 2);
        assert_eq!(Polynomial::zero().leading_coefficient(), None);
        assert_eq!(poly(&[1, 2, 3]).leading_coefficient(), Some(FieldElement::from(3u64)));
    }

    #[test]
    fn test_padding_does_not_affect_equality() {
        let padded = Polynomial::new(elements(&[1, 2, 0, 0]));
        assert_eq!(padded, poly(&[1, 2]));
        assert_eq!(padded.coefficients.len(), 2);
        assert_eq!(padded.coefficients(), elements(&[1, 2]).as_slice());
    }

    #[test]
    fn test_division_with_remainder() {
        // (x^3 + 2x^2 + 3x + 4) / (x + 1) = x^2 + x + 2, remainder 2
        let (quotient, remainder) = poly(&[4, 3, 2, 1]).divided_by(&poly(&[1, 1])).unwrap();
        assert_eq!(quotient, poly(&[2, 1, 1]));
        assert_eq!(remainder, poly(&[2]));
    }

    #[test]
    fn test_division_by_zero_polynomial() {
        assert_eq!(
            poly(&[1, 2, 1]).divided_by(&Polynomial::zero()),
            Err(StarkError::InvalidDivisor)
        );
    }

    #[test]
    fn test_exact_division_contract() {
        let p = poly(&[1, 2]);
        let zerofier = zerofier_domain(&elements(&[1, 13, 16]));

        assert_eq!(p.exact_div(&zerofier), Err(StarkError::NonZeroRemainder));

        let divisible = &p * &zerofier;
        assert_eq!(divisible.exact_div(&zerofier).unwrap(), p);
    }

    #[test]
    fn test_multiplication() {
        let product = &poly(&[1, 2]) * &poly(&[3, 4]);
        assert_eq!(product, poly(&[3, 10, 8]));
        assert!((&poly(&[1, 2]) * &Polynomial::zero()).is_zero());
    }

    #[test]
    fn test_addition_and_subtraction() {
        assert_eq!(&poly(&[1, 2, 3]) + &poly(&[4, 5]), poly(&[5, 7, 3]));
        assert!((&poly(&[1, 2, 3]) - &poly(&[1, 2, 3])).is_zero());
        assert_eq!(&poly(&[4, 5]) - &poly(&[4, 5, 6]), -poly(&[0, 0, 6]));
    }

    #[test]
    fn test_evaluate() {
        let p = poly(&[1, 2, 3]);
        assert_eq!(p.evaluate(FieldElement::from(2u64)), FieldElement::from(17u64));
        assert_eq!(Polynomial::zero().evaluate(FieldElement::from(9u64)), FieldElement::ZERO);
        assert_eq!(
            p.evaluate_domain(&elements(&[0, 1])),
            elements(&[1, 6])
        );
    }

    #[test]
    fn test_scale_composes_argument() {
        let p = poly(&[1, 2, 3]);
        let s = FieldElement::from(5u64);
        let x = FieldElement::from(7u64);
        assert_eq!(p.scale(s).evaluate(x), p.evaluate(s * x));
        assert_eq!(p.mul_scalar(s).evaluate(x), s * p.evaluate(x));
    }

    #[test]
    fn test_pow() {
        let p = poly(&[1, 1]);
        assert_eq!(p.pow(0), poly(&[1]));
        assert_eq!(p.pow(3), poly(&[1, 3, 3, 1]));
        assert!(Polynomial::zero().pow(4).is_zero());
    }

    #[test]
    fn test_interpolation() {
        let domain = elements(&[1, 2, 3, 4]);
        let values = elements(&[7, 0, 11, 5]);
        let p = interpolate_domain(&domain, &values).unwrap();

        assert!(p.degree() <= 3);
        assert_eq!(p.evaluate_domain(&domain), values);
    }

    #[test]
    fn test_interpolation_size_mismatch() {
        assert_eq!(
            interpolate_domain(&elements(&[1, 2]), &elements(&[1])),
            Err(StarkError::SizeMismatch {
                expected: 2,
                actual: 1
            })
        );
        assert!(interpolate_domain(&[], &[]).unwrap().is_zero());
    }

    #[test]
    fn test_interpolation_duplicate_points() {
        assert_eq!(
            interpolate_domain(&elements(&[3, 3]), &elements(&[1, 2])),
            Err(StarkError::DivisionByZero)
        );
    }

    #[test]
    fn test_zerofier() {
        let domain = elements(&[2, 9, 31]);
        let z = zerofier_domain(&domain);
        assert_eq!(z.degree(), 3);
        for &d in &domain {
            assert!(z.evaluate(d).is_zero());
        }
        assert!(!z.evaluate(FieldElement::from(4u64)).is_zero());
        assert_eq!(zerofier_domain(&[]), poly(&[1]));
    }

    #[test]
    fn test_colinearity_cases() {
        // points on 3x + 1
        assert!(test_colinearity(&elements(&[0, 1, 2]), &elements(&[1, 4, 7])).unwrap());
        // points on x^2
        assert!(!test_colinearity(&elements(&[0, 1, 2]), &elements(&[0, 1, 4])).unwrap());
        assert!(test_colinearity(&elements(&[5]), &elements(&[9])).unwrap());
        assert!(test_colinearity(&[], &[]).unwrap());
        assert!(test_colinearity(&elements(&[1, 2]), &elements(&[1])).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(poly(&[1, 0, 3]).to_string(), "1 + 3x^2");
        assert_eq!(Polynomial::zero().to_string(), "0");
    }
}
