#[cfg(test)]
mod tests {
    use lc3_stark::field::{FieldElement, MODULUS};
    use lc3_stark::math::polynomial::{
        Polynomial, interpolate_domain, test_colinearity, zerofier_domain,
    };
    use proptest::prelude::*;

    fn element() -> impl Strategy<Value = FieldElement> {
        any::<u128>().prop_map(FieldElement::from)
    }

    fn nonzero_element() -> impl Strategy<Value = FieldElement> {
        (1..MODULUS).prop_map(FieldElement::new)
    }

    fn polynomial(max_len: usize) -> impl Strategy<Value = Polynomial> {
        prop::collection::vec(element(), 0..max_len).prop_map(Polynomial::new)
    }

    /// Distinct small points so domains never collide.
    fn distinct_domain(max_len: usize) -> impl Strategy<Value = Vec<FieldElement>> {
        prop::collection::btree_set(any::<u64>(), 0..max_len)
            .prop_map(|set| set.into_iter().map(FieldElement::from).collect())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn addition_is_associative(a in element(), b in element(), c in element()) {
            prop_assert_eq!((a + b) + c, a + (b + c));
        }

        #[test]
        fn multiplication_distributes(a in element(), b in element(), c in element()) {
            prop_assert_eq!(a * (b + c), a * b + a * c);
        }

        #[test]
        fn division_round_trips(a in element(), c in nonzero_element()) {
            prop_assert_eq!(a.checked_div(c).unwrap() * c, a);
        }

        #[test]
        fn inverse_properties(a in nonzero_element()) {
            let inv = a.inverse().unwrap();
            prop_assert_eq!(a * inv, FieldElement::ONE);
            prop_assert_eq!(inv.inverse().unwrap(), a);
        }

        #[test]
        fn values_stay_canonical(a in element(), b in element()) {
            for v in [a + b, a - b, a * b, -a] {
                prop_assert!(v.value() < MODULUS);
            }
        }

        #[test]
        fn division_with_remainder(p in polynomial(10), q in polynomial(6)) {
            prop_assume!(!q.is_zero());
            let (quotient, remainder) = p.divided_by(&q).unwrap();
            prop_assert_eq!(&(&quotient * &q) + &remainder, p);
            prop_assert!(remainder.degree() < q.degree());
        }

        #[test]
        fn zerofier_vanishes_on_domain(domain in distinct_domain(8)) {
            let zerofier = zerofier_domain(&domain);
            prop_assert_eq!(zerofier.degree(), domain.len() as isize);
            for &d in &domain {
                prop_assert!(zerofier.evaluate(d).is_zero());
            }
        }

        #[test]
        fn interpolation_passes_through_points(
            domain in distinct_domain(8),
            seed in prop::collection::vec(element(), 8),
        ) {
            let values = &seed[..domain.len()];
            let p = interpolate_domain(&domain, values).unwrap();
            prop_assert!(p.degree() < domain.len().max(1) as isize);
            for (&d, &v) in domain.iter().zip(values) {
                prop_assert_eq!(p.evaluate(d), v);
            }
        }

        #[test]
        fn lines_are_colinear(a in element(), b in element(), domain in distinct_domain(6)) {
            let line = Polynomial::new(vec![a, b]);
            let values = line.evaluate_domain(&domain);
            prop_assert!(test_colinearity(&domain, &values).unwrap());
        }
    }

    #[test]
    fn quadratic_is_not_colinear() {
        let domain: Vec<FieldElement> = [0u64, 1, 2].into_iter().map(FieldElement::from).collect();
        let values: Vec<FieldElement> = [0u64, 1, 4].into_iter().map(FieldElement::from).collect();
        assert!(!test_colinearity(&domain, &values).unwrap());
    }

    #[test]
    fn empty_zerofier_is_one() {
        assert_eq!(zerofier_domain(&[]), Polynomial::constant(FieldElement::ONE));
    }
}
