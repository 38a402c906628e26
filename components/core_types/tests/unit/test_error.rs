//! Unit tests for RError and HeapKind

use core_types::{HeapKind, RError, SexpType};

#[cfg(test)]
mod error_kind_tests {
    use super::*;

    #[test]
    fn test_type_mismatch_is_fatal() {
        let err = RError::TypeMismatch {
            expected: "symbol",
            found: SexpType::Integer,
        };
        assert!(err.is_fatal());
        assert_eq!(
            err.to_string(),
            "internal type mismatch: expected symbol, found integer"
        );
    }

    #[test]
    fn test_protection_overflow_is_fatal() {
        let err = RError::ProtectionStackOverflow(10000);
        assert!(err.is_fatal());
        assert!(err.to_string().contains("10000"));
    }

    #[test]
    fn test_recoverable_errors() {
        let errors = [
            RError::ArityMismatch {
                name: "f".into(),
                expected: 1,
                supplied: 0,
            },
            RError::UnboundVariable("x".into()),
            RError::RecursiveEvaluation,
            RError::HeapExhausted(HeapKind::Node),
            RError::Interrupted,
            RError::ArgumentMatch("unused argument".into()),
            RError::MissingArgument("y".into()),
            RError::NotAFunction("1".into()),
            RError::FunctionNotFound("g".into()),
            RError::EvalDepth(100),
            RError::invalid("bad"),
            RError::user("stop"),
        ];
        for err in errors {
            assert!(!err.is_fatal(), "{err} should be recoverable");
        }
    }

    #[test]
    fn test_error_clone_and_eq() {
        let err = RError::user("boom");
        assert_eq!(err.clone(), err);
        assert_eq!(err.to_string(), "boom");
    }
}

#[cfg(test)]
mod heap_kind_tests {
    use super::*;

    #[test]
    fn test_heap_kind_display() {
        assert_eq!(HeapKind::Node.to_string(), "cons memory");
        assert_eq!(HeapKind::Vector.to_string(), "vector memory");
        assert_eq!(
            RError::HeapExhausted(HeapKind::Vector).to_string(),
            "vector memory exhausted"
        );
    }

    #[test]
    fn test_missing_argument_message() {
        assert_eq!(
            RError::MissingArgument("y".into()).to_string(),
            "argument \"y\" is missing, with no default"
        );
    }
}
