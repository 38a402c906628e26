//! Arithmetic, comparison and logical negation.
//!
//! Binary operators recycle the shorter operand. Integer arithmetic yields
//! NA on overflow; division always produces reals.

use crate::builtins::{prec, Arity, EvalMode, FunEntry, PPInfo, PPKind};
use crate::coerce::is_atomic;
use crate::runtime::Interpreter;
use crate::transfer::EvalResult;
use core_types::{Complex, RError, Sexp, SexpType, NA_INTEGER, NA_LOGICAL};
use num_traits::{CheckedAdd, CheckedMul, CheckedSub};
use tracing::warn;

const PLUSOP: i32 = 1;
const MINUSOP: i32 = 2;
const TIMESOP: i32 = 3;
const DIVOP: i32 = 4;

const EQOP: i32 = 1;
const NEOP: i32 = 2;
const LTOP: i32 = 3;
const LEOP: i32 = 4;
const GEOP: i32 = 5;
const GTOP: i32 = 6;

pub(crate) fn entries() -> Vec<FunEntry> {
    let arith = |name, code, precedence| {
        FunEntry::new(name, do_arith, code, EvalMode::Builtin, Arity::Variadic)
            .with_gram(PPInfo::new(PPKind::Binary, precedence, false))
    };
    let relop = |name, code| {
        FunEntry::new(name, do_relop, code, EvalMode::Builtin, Arity::Fixed(2))
            .with_gram(PPInfo::new(PPKind::Binary, prec::COMPARE, false))
    };
    vec![
        arith("+", PLUSOP, prec::SUM),
        arith("-", MINUSOP, prec::SUM),
        arith("*", TIMESOP, prec::PROD),
        arith("/", DIVOP, prec::PROD),
        relop("==", EQOP),
        relop("!=", NEOP),
        relop("<", LTOP),
        relop("<=", LEOP),
        relop(">=", GEOP),
        relop(">", GTOP),
        FunEntry::new("!", do_not, 0, EvalMode::Builtin, Arity::Fixed(1))
            .with_gram(PPInfo::new(PPKind::Unary, prec::NOT, false)),
    ]
}

fn checked<T: CheckedAdd + CheckedSub + CheckedMul>(code: i32, a: &T, b: &T) -> Option<T> {
    match code {
        PLUSOP => a.checked_add(b),
        MINUSOP => a.checked_sub(b),
        TIMESOP => a.checked_mul(b),
        _ => None,
    }
}

fn real_op(code: i32, a: f64, b: f64) -> f64 {
    match code {
        PLUSOP => a + b,
        MINUSOP => a - b,
        TIMESOP => a * b,
        _ => a / b,
    }
}

fn complex_op(code: i32, a: Complex, b: Complex) -> Complex {
    match code {
        PLUSOP => Complex::new(a.r + b.r, a.i + b.i),
        MINUSOP => Complex::new(a.r - b.r, a.i - b.i),
        TIMESOP => Complex::new(a.r * b.r - a.i * b.i, a.r * b.i + a.i * b.r),
        _ => {
            let d = b.r * b.r + b.i * b.i;
            Complex::new((a.r * b.r + a.i * b.i) / d, (a.i * b.r - a.r * b.i) / d)
        }
    }
}

fn operand_type(interp: &Interpreter, x: Sexp) -> EvalResult<SexpType> {
    match interp.heap.type_of(x) {
        ty @ (SexpType::Nil | SexpType::Logical | SexpType::Integer | SexpType::Real | SexpType::Complex) => {
            Ok(ty)
        }
        _ => Err(RError::invalid("non-numeric argument to binary operator").into()),
    }
}

fn recycled_length(nx: usize, ny: usize) -> usize {
    if nx == 0 || ny == 0 {
        return 0;
    }
    let n = nx.max(ny);
    if n % nx.min(ny) != 0 {
        warn!(nx, ny, "longer object length is not a multiple of shorter object length");
    }
    n
}

fn do_arith(interp: &mut Interpreter, _call: Sexp, op: Sexp, args: Sexp, _rho: Sexp) -> EvalResult<Sexp> {
    let code = interp.entry(op)?.code;
    match interp.heap.length(args) {
        1 => {
            let x = interp.heap.car(args)?;
            unary_arith(interp, code, x)
        }
        2 => {
            let (x, y) = (interp.heap.car(args)?, interp.heap.cadr(args)?);
            binary_arith(interp, code, x, y)
        }
        _ => Err(RError::invalid("operator needs one or two arguments").into()),
    }
}

fn unary_arith(interp: &mut Interpreter, code: i32, x: Sexp) -> EvalResult<Sexp> {
    let ty = operand_type(interp, x)?;
    let negate = match code {
        PLUSOP => false,
        MINUSOP => true,
        _ => return Err(RError::invalid("invalid unary operator").into()),
    };
    let out = match ty {
        SexpType::Logical | SexpType::Integer => {
            let v: Vec<i32> = interp
                .integers_of(x)?
                .into_iter()
                .map(|v| if negate && v != NA_INTEGER { -v } else { v })
                .collect();
            let out = interp.heap.alloc_vector(SexpType::Integer, v.len())?;
            interp.heap.integer_mut(out)?.copy_from_slice(&v);
            out
        }
        SexpType::Real => {
            let v: Vec<f64> = interp.reals_of(x)?.into_iter().map(|v| if negate { -v } else { v }).collect();
            let out = interp.heap.alloc_vector(SexpType::Real, v.len())?;
            interp.heap.real_mut(out)?.copy_from_slice(&v);
            out
        }
        SexpType::Complex => {
            let v: Vec<Complex> = interp
                .complexes_of(x)?
                .into_iter()
                .map(|c| if negate { Complex::new(-c.r, -c.i) } else { c })
                .collect();
            let out = interp.heap.alloc_vector(SexpType::Complex, v.len())?;
            interp.heap.complex_mut(out)?.copy_from_slice(&v);
            out
        }
        _ => return Ok(x),
    };
    let _out = interp.heap.protect(out)?;
    interp.heap.copy_most_attrib(x, out)?;
    Ok(out)
}

fn binary_arith(interp: &mut Interpreter, code: i32, x: Sexp, y: Sexp) -> EvalResult<Sexp> {
    let (tx, ty) = (operand_type(interp, x)?, operand_type(interp, y)?);
    let (nx, ny) = (interp.heap.length(x), interp.heap.length(y));
    let n = recycled_length(nx, ny);

    let out = if tx == SexpType::Complex || ty == SexpType::Complex {
        let (a, b) = (interp.complexes_of(x)?, interp.complexes_of(y)?);
        let v: Vec<Complex> = (0..n).map(|i| complex_op(code, a[i % nx], b[i % ny])).collect();
        let out = interp.heap.alloc_vector(SexpType::Complex, n)?;
        interp.heap.complex_mut(out)?.copy_from_slice(&v);
        out
    } else if tx == SexpType::Real || ty == SexpType::Real || code == DIVOP {
        let (a, b) = (interp.reals_of(x)?, interp.reals_of(y)?);
        let v: Vec<f64> = (0..n).map(|i| real_op(code, a[i % nx], b[i % ny])).collect();
        let out = interp.heap.alloc_vector(SexpType::Real, n)?;
        interp.heap.real_mut(out)?.copy_from_slice(&v);
        out
    } else {
        let (a, b) = (interp.integers_of(x)?, interp.integers_of(y)?);
        let mut overflow = false;
        let v: Vec<i32> = (0..n)
            .map(|i| {
                let (p, q) = (a[i % nx], b[i % ny]);
                if p == NA_INTEGER || q == NA_INTEGER {
                    return NA_INTEGER;
                }
                match checked(code, &p, &q).filter(|&r| r != NA_INTEGER) {
                    Some(r) => r,
                    None => {
                        overflow = true;
                        NA_INTEGER
                    }
                }
            })
            .collect();
        if overflow {
            warn!("NAs produced by integer overflow");
        }
        let out = interp.heap.alloc_vector(SexpType::Integer, n)?;
        interp.heap.integer_mut(out)?.copy_from_slice(&v);
        out
    };

    let _out = interp.heap.protect(out)?;
    if ny == n && n > 0 {
        interp.heap.copy_most_attrib(y, out)?;
    }
    if nx == n && n > 0 {
        interp.heap.copy_most_attrib(x, out)?;
    }
    Ok(out)
}

fn do_relop(interp: &mut Interpreter, _call: Sexp, op: Sexp, args: Sexp, _rho: Sexp) -> EvalResult<Sexp> {
    let code = interp.entry(op)?.code;
    let (x, y) = (interp.heap.car(args)?, interp.heap.cadr(args)?);
    let (tx, ty) = (interp.heap.type_of(x), interp.heap.type_of(y));
    for t in [tx, ty] {
        if t != SexpType::Nil && !is_atomic(t) {
            return Err(RError::invalid(format!(
                "comparison is possible only for atomic types, not '{}'",
                t
            ))
            .into());
        }
    }
    let (nx, ny) = (interp.heap.length(x), interp.heap.length(y));
    let n = recycled_length(nx, ny);

    let v: Vec<i32> = if tx == SexpType::Str || ty == SexpType::Str {
        let (a, b) = (interp.strings_of(x)?, interp.strings_of(y)?);
        (0..n)
            .map(|i| match (&a[i % nx], &b[i % ny]) {
                (Some(p), Some(q)) => compare(code, p.cmp(q)),
                _ => NA_LOGICAL,
            })
            .collect()
    } else if tx == SexpType::Complex || ty == SexpType::Complex {
        if code != EQOP && code != NEOP {
            return Err(RError::invalid("invalid comparison with complex values").into());
        }
        let (a, b) = (interp.complexes_of(x)?, interp.complexes_of(y)?);
        (0..n)
            .map(|i| {
                let (p, q) = (a[i % nx], b[i % ny]);
                if p.r.is_nan() || p.i.is_nan() || q.r.is_nan() || q.i.is_nan() {
                    NA_LOGICAL
                } else {
                    i32::from((p.r == q.r && p.i == q.i) == (code == EQOP))
                }
            })
            .collect()
    } else {
        let (a, b) = (interp.reals_of(x)?, interp.reals_of(y)?);
        (0..n)
            .map(|i| {
                let (p, q) = (a[i % nx], b[i % ny]);
                match p.partial_cmp(&q) {
                    Some(ord) => compare(code, ord),
                    None => NA_LOGICAL,
                }
            })
            .collect()
    };
    let out = interp.heap.alloc_vector(SexpType::Logical, n)?;
    interp.heap.logical_mut(out)?.copy_from_slice(&v);
    Ok(out)
}

fn compare(code: i32, ord: std::cmp::Ordering) -> i32 {
    use std::cmp::Ordering::*;
    let result = match code {
        EQOP => ord == Equal,
        NEOP => ord != Equal,
        LTOP => ord == Less,
        LEOP => ord != Greater,
        GEOP => ord != Less,
        _ => ord == Greater,
    };
    i32::from(result)
}

fn do_not(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, _rho: Sexp) -> EvalResult<Sexp> {
    let x = interp.heap.car(args)?;
    match interp.heap.type_of(x) {
        SexpType::Nil | SexpType::Logical | SexpType::Integer | SexpType::Real => {}
        _ => return Err(RError::invalid("invalid argument type").into()),
    }
    let v: Vec<i32> = interp
        .logicals_of(x)?
        .into_iter()
        .map(|v| if v == NA_LOGICAL { v } else { 1 - v })
        .collect();
    let out = interp.heap.alloc_vector(SexpType::Logical, v.len())?;
    interp.heap.logical_mut(out)?.copy_from_slice(&v);
    let _out = interp.heap.protect(out)?;
    interp.heap.copy_most_attrib(x, out)?;
    Ok(out)
}
