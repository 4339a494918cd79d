//! Evaluation domains: cosets `offset·ω^i` of power-of-two subgroups.

use crate::error::{Result, StarkError};
use crate::field::FieldElement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Domain {
    pub offset: FieldElement,
    pub generator: FieldElement,
    pub length: usize,
}

impl Domain {
    pub fn new(offset: FieldElement, generator: FieldElement, length: usize) -> Result<Self> {
        if length == 0 {
            return Err(StarkError::EmptyDomain);
        }
        Ok(Self {
            offset,
            generator,
            length,
        })
    }

    /// The subgroup of order `length` itself (offset 1).
    pub fn subgroup(length: usize) -> Result<Self> {
        let generator = FieldElement::primitive_nth_root(length as u128)?;
        Self::new(FieldElement::ONE, generator, length)
    }

    /// The subgroup of order `length` shifted by the field generator.
    pub fn coset(length: usize) -> Result<Self> {
        let generator = FieldElement::primitive_nth_root(length as u128)?;
        Self::new(FieldElement::GENERATOR, generator, length)
    }

    pub fn element(&self, index: usize) -> FieldElement {
        self.offset * self.generator.pow(index as u128)
    }

    pub fn elements(&self) -> Vec<FieldElement> {
        let mut points = Vec::with_capacity(self.length);
        let mut x = self.offset;
        for _ in 0..self.length {
            points.push(x);
            x *= self.generator;
        }
        points
    }

    /// The first `count` points, used for the trace domain of a shorter trace.
    pub fn take(&self, count: usize) -> Vec<FieldElement> {
        let mut points = self.elements();
        points.truncate(count);
        points
    }

    /// The domain obtained by squaring every point: half the length.
    pub fn fold(&self) -> Result<Self> {
        Self::new(
            self.offset * self.offset,
            self.generator * self.generator,
            self.length / 2,
        )
    }
}

/// Smallest power of two that holds `trace_length · degree` points.
pub fn omicron_domain_length(trace_length: usize, degree: usize) -> usize {
    (trace_length * degree).max(1).next_power_of_two()
}

pub fn fri_domain_length(omicron_length: usize, expansion_factor: usize) -> usize {
    omicron_length * expansion_factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_sizes() {
        assert_eq!(omicron_domain_length(7, 11), 128);
        assert_eq!(omicron_domain_length(8, 2), 16);
        assert_eq!(omicron_domain_length(0, 3), 1);
        assert_eq!(fri_domain_length(128, 4), 512);
    }

    #[test]
    fn test_extended_domain_contains_trace_domain() {
        let blowup_factor = 8;
        let domain = Domain::subgroup(4).unwrap();
        let extended = Domain::subgroup(4 * blowup_factor).unwrap();

        let original_points = domain.elements();
        let extended_points = extended.elements();
        assert_eq!(original_points.len(), 4);
        assert_eq!(extended_points.len(), 32);

        for (i, &point) in original_points.iter().enumerate() {
            assert_eq!(point, extended_points[i * blowup_factor]);
        }
    }

    #[test]
    fn test_coset_avoids_subgroup() {
        let subgroup = Domain::subgroup(16).unwrap().elements();
        let coset = Domain::coset(16).unwrap();
        for x in coset.elements() {
            assert!(!subgroup.contains(&x));
        }
        assert_eq!(coset.element(5), coset.elements()[5]);
    }

    #[test]
    fn test_fold_squares_points() {
        let domain = Domain::coset(16).unwrap();
        let folded = domain.fold().unwrap();
        assert_eq!(folded.length, 8);
        let points = domain.elements();
        for (j, y) in folded.elements().into_iter().enumerate() {
            assert_eq!(y, points[j] * points[j]);
            assert_eq!(y, points[j + 8] * points[j + 8]);
        }
    }

    #[test]
    fn test_empty_domain() {
        assert_eq!(
            Domain::new(FieldElement::ONE, FieldElement::ONE, 0),
            Err(StarkError::EmptyDomain)
        );
    }
}
