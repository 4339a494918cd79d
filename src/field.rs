// Prime field with p = 1 + 407 * 2^119 = 270497897142230380135924736767050121217
// Elements are canonical u128 values; products are widened through num-bigint.

use std::fmt;
use std::iter::{Product, Sum};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use std::sync::OnceLock;

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StarkError};

pub const MODULUS: u128 = 1 + 407 * (1u128 << 119);

/// 2-adic part of `MODULUS - 1`.
pub const TWO_ADICITY: u32 = 119;

const GENERATOR_VALUE: u128 = 85408008396924667383611388730472331217;

fn modulus_big() -> &'static BigUint {
    static MODULUS_BIG: OnceLock<BigUint> = OnceLock::new();
    MODULUS_BIG.get_or_init(|| BigUint::from(MODULUS))
}

fn reduce_big(value: &BigUint) -> u128 {
    let reduced = value % modulus_big();
    reduced
        .to_u64_digits()
        .iter()
        .rev()
        .fold(0u128, |acc, &digit| (acc << 64) | digit as u128)
}

/// Extended Euclidean algorithm: returns `(a, b, g)` with `a*x + b*y = g = gcd(x, y)`.
pub fn xgcd(x: &BigInt, y: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut old_r, mut r) = (x.clone(), y.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());

    while !r.is_zero() {
        let quotient = &old_r / &r;

        let next_r = &old_r - &quotient * &r;
        old_r = std::mem::replace(&mut r, next_r);

        let next_s = &old_s - &quotient * &s;
        old_s = std::mem::replace(&mut s, next_s);

        let next_t = &old_t - &quotient * &t;
        old_t = std::mem::replace(&mut t, next_t);
    }

    (old_s, old_t, old_r)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FieldElement {
    value: u128,
}

impl FieldElement {
    pub const ZERO: Self = Self { value: 0 };
    pub const ONE: Self = Self { value: 1 };
    /// Fixed element of multiplicative order 2^119, also used as the coset offset.
    pub const GENERATOR: Self = Self {
        value: GENERATOR_VALUE,
    };

    #[inline]
    pub fn new(value: u128) -> Self {
        Self {
            value: value % MODULUS,
        }
    }

    #[inline]
    pub fn zero() -> Self {
        Self::ZERO
    }

    #[inline]
    pub fn one() -> Self {
        Self::ONE
    }

    #[inline]
    pub fn generator() -> Self {
        Self::GENERATOR
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Canonical representative in `[0, MODULUS)`.
    #[inline]
    pub fn value(&self) -> u128 {
        self.value
    }

    pub fn from_biguint(value: &BigUint) -> Self {
        Self {
            value: reduce_big(value),
        }
    }

    /// Reduces a signed integer into the canonical range.
    pub fn from_bigint(value: &BigInt) -> Self {
        let modulus = BigInt::from(MODULUS);
        let reduced = ((value % &modulus) + &modulus) % &modulus;
        Self::from_biguint(reduced.magnitude())
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from(self.value)
    }

    #[inline]
    pub fn to_be_bytes(&self) -> [u8; 16] {
        self.value.to_be_bytes()
    }

    /// Deterministically maps arbitrary bytes (typically a hash digest) to an element.
    ///
    /// Bytes are accumulated big-endian, each one XOR-folded into the freshly
    /// shifted accumulator, and the result is reduced modulo p.
    pub fn sample(bytes: &[u8]) -> Self {
        let acc = bytes
            .iter()
            .fold(BigUint::zero(), |acc, &byte| (acc << 8u32) ^ BigUint::from(byte));
        Self::from_biguint(&acc)
    }

    pub fn pow(self, mut exp: u128) -> Self {
        let mut base = self;
        let mut result = Self::ONE;

        while exp > 0 {
            if exp & 1 == 1 {
                result *= base;
            }
            base = base * base;
            exp >>= 1;
        }

        result
    }

    /// Square-and-multiply over an arbitrarily large exponent; no reduction mod p-1 is applied.
    pub fn pow_big(self, exp: &BigUint) -> Self {
        let mut result = Self::ONE;
        for bit in (0..exp.bits()).rev() {
            result = result * result;
            if exp.bit(bit) {
                result *= self;
            }
        }
        result
    }

    /// Multiplicative inverse via the extended Euclidean algorithm against p.
    pub fn inverse(self) -> Result<Self> {
        if self.is_zero() {
            return Err(StarkError::DivisionByZero);
        }

        let (a, _, g) = xgcd(&BigInt::from(self.value), &BigInt::from(MODULUS));
        if !g.is_one() {
            return Err(StarkError::NonInvertibleElement(self.to_string()));
        }
        Ok(Self::from_bigint(&a))
    }

    pub fn checked_div(self, rhs: Self) -> Result<Self> {
        Ok(self * rhs.inverse()?)
    }

    /// Element of exact multiplicative order `n`, for `n` a power of two up to 2^119.
    pub fn primitive_nth_root(n: u128) -> Result<Self> {
        if n == 0 || !n.is_power_of_two() || n > (1u128 << TWO_ADICITY) {
            return Err(StarkError::InvalidRootOrder(n));
        }

        let mut root = Self::GENERATOR;
        let mut order = 1u128 << TWO_ADICITY;
        while order != n {
            root = root * root;
            order >>= 1;
        }
        Ok(root)
    }
}

impl From<u128> for FieldElement {
    fn from(value: u128) -> Self {
        Self::new(value)
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self::new(value as u128)
    }
}

impl From<u32> for FieldElement {
    fn from(value: u32) -> Self {
        Self::new(value as u128)
    }
}

impl From<usize> for FieldElement {
    fn from(value: usize) -> Self {
        Self::new(value as u128)
    }
}

impl FromStr for FieldElement {
    type Err = StarkError;

    /// Parses a non-negative decimal integer of any size, reducing it modulo p.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let value: BigUint = trimmed
            .parse()
            .map_err(|_| StarkError::InvalidFieldLiteral(trimmed.to_string()))?;
        Ok(Self::from_biguint(&value))
    }
}

impl Add for FieldElement {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        let (sum, overflow) = self.value.overflowing_add(rhs.value);
        let value = if overflow || sum >= MODULUS {
            sum.wrapping_sub(MODULUS)
        } else {
            sum
        };
        Self { value }
    }
}

impl AddAssign for FieldElement {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for FieldElement {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        let value = if self.value >= rhs.value {
            self.value - rhs.value
        } else {
            self.value + (MODULUS - rhs.value)
        };
        Self { value }
    }
}

impl SubAssign for FieldElement {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul for FieldElement {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        if self.value >> 64 == 0 && rhs.value >> 64 == 0 {
            return Self::new(self.value * rhs.value);
        }
        let product = BigUint::from(self.value) * BigUint::from(rhs.value);
        Self {
            value: reduce_big(&product),
        }
    }
}

impl MulAssign for FieldElement {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Neg for FieldElement {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        if self.value == 0 {
            self
        } else {
            Self {
                value: MODULUS - self.value,
            }
        }
    }
}

impl Sum for FieldElement {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl Product for FieldElement {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ONE, |acc, x| acc * x)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
