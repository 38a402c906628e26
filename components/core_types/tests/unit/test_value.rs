//! Unit tests for object handles, flags and type tags

use core_types::{Complex, Sexp, SexpType, SxpInfo, NA_INTEGER, NA_LOGICAL, NA_REAL};

#[cfg(test)]
mod sexp_handle_tests {
    use super::*;

    #[test]
    fn test_sentinels_are_distinct() {
        assert_ne!(Sexp::NIL, Sexp::UNBOUND);
        assert_ne!(Sexp::UNBOUND, Sexp::MISSING_ARG);
        assert_ne!(Sexp::NIL, Sexp::MISSING_ARG);
    }

    #[test]
    fn test_reserved_slots_precede_user_slots() {
        for sentinel in [Sexp::NIL, Sexp::UNBOUND, Sexp::MISSING_ARG] {
            assert!(sentinel.index() < Sexp::RESERVED);
        }
    }

    #[test]
    fn test_only_nil_is_nil() {
        assert!(Sexp::NIL.is_nil());
        assert!(!Sexp::UNBOUND.is_nil());
        assert!(!Sexp::from_index(100).is_nil());
    }

    #[test]
    fn test_handles_hash_by_slot() {
        use std::collections::HashSet;
        let set: HashSet<Sexp> = [Sexp::from_index(5), Sexp::from_index(5)].into_iter().collect();
        assert_eq!(set.len(), 1);
    }
}

#[cfg(test)]
mod sxpinfo_tests {
    use super::*;

    #[test]
    fn test_default_flags_are_clear() {
        let info = SxpInfo::default();
        assert!(!info.obj);
        assert!(!info.mark);
        assert!(!info.debug);
        assert!(!info.trace);
        assert_eq!(info.named, 0);
        assert_eq!(info.gp, 0);
    }

    #[test]
    fn test_named_progression() {
        let mut info = SxpInfo::default();
        info.set_named(info.named + 1);
        assert!(!info.is_shared());
        info.set_named(info.named + 1);
        assert!(info.is_shared());
        info.set_named(info.named + 1);
        assert_eq!(info.named, 2);
    }
}

#[cfg(test)]
mod type_tag_tests {
    use super::*;

    #[test]
    fn test_every_code_round_trips() {
        for t in SexpType::ALL {
            assert_eq!(SexpType::from_code(t.code()), Some(t));
            assert_eq!(SexpType::from_name(t.name()), Some(t));
        }
    }

    #[test]
    fn test_vector_tags() {
        let vectors: Vec<_> = SexpType::ALL.iter().filter(|t| t.is_vector()).collect();
        assert_eq!(vectors.len(), 8);
        assert!(!SexpType::Dots.is_vector());
        assert!(!SexpType::Any.is_vector());
    }
}

#[cfg(test)]
mod missing_value_tests {
    use super::*;

    #[test]
    fn test_na_constants() {
        assert_eq!(NA_INTEGER, i32::MIN);
        assert_eq!(NA_LOGICAL, NA_INTEGER);
        assert!(NA_REAL.is_nan());
    }

    #[test]
    fn test_complex_construction() {
        let z = Complex::new(1.5, -2.0);
        assert_eq!(z.r, 1.5);
        assert_eq!(z.i, -2.0);
        assert_eq!(Complex::default(), Complex::new(0.0, 0.0));
    }
}
