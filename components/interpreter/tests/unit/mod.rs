//! Unit tests for interpreter components

#[path = "../common/mod.rs"]
mod common;

use common::R;
use core_types::{RError, SexpType, NA_INTEGER};
use interpreter::Interpreter;

// ============================================================================
// Arithmetic and comparison
// ============================================================================

#[test]
fn test_integer_arithmetic_stays_integer() {
    let mut r = R::new();
    let a = r.int(2);
    let b = r.int(3);
    let e = r.call("*", &[a, b]);
    let v = r.run(e).unwrap();
    assert_eq!(r.interp.heap().type_of(v), SexpType::Integer);
    assert_eq!(r.ints(v), vec![6]);
}

#[test]
fn test_integer_overflow_gives_na() {
    let mut r = R::new();
    let a = r.int(i32::MAX);
    let b = r.int(1);
    let e = r.call("+", &[a, b]);
    let v = r.run(e).unwrap();
    assert_eq!(r.ints(v), vec![NA_INTEGER]);
}

#[test]
fn test_division_is_real() {
    let mut r = R::new();
    let a = r.int(7);
    let b = r.int(2);
    let e = r.call("/", &[a, b]);
    let v = r.run(e).unwrap();
    assert_eq!(r.reals(v), vec![3.5]);
}

#[test]
fn test_unary_minus_and_recycling() {
    let mut r = R::new();
    let x = r.num(4.0);
    let e = r.call("-", &[x]);
    let v = r.run(e).unwrap();
    assert_eq!(r.reals(v), vec![-4.0]);

    let one = r.num(1.0);
    let two = r.num(2.0);
    let three = r.num(3.0);
    let v3 = r.call("c", &[one, two, three]);
    let ten = r.num(10.0);
    let e = r.call("*", &[v3, ten]);
    let v = r.run(e).unwrap();
    assert_eq!(r.reals(v), vec![10.0, 20.0, 30.0]);
}

#[test]
fn test_comparison_and_not() {
    let mut r = R::new();
    let a = r.num(1.0);
    let b = r.int(2);
    let e = r.call("<", &[a, b]);
    let lt = r.run(e).unwrap();
    assert_eq!(r.lgls(lt), vec![1]);
    let e = r.call("!", &[lt]);
    let v = r.run(e).unwrap();
    assert_eq!(r.lgls(v), vec![0]);

    let s1 = r.string("apple");
    let s2 = r.string("banana");
    let e = r.call(">=", &[s1, s2]);
    let v = r.run(e).unwrap();
    assert_eq!(r.lgls(v), vec![0]);
}

#[test]
fn test_non_numeric_argument() {
    let mut r = R::new();
    let s = r.string("a");
    let one = r.num(1.0);
    let e = r.call("+", &[s, one]);
    assert_eq!(
        r.run(e),
        Err(RError::InvalidArgument("non-numeric argument to binary operator".into()))
    );
}

// ============================================================================
// Vectors
// ============================================================================

#[test]
fn test_c_with_names() {
    let mut r = R::new();
    let one = r.num(1.0);
    let two = r.num(2.0);
    let e = r.call_named("c", &[(Some("a"), one), (None, two)]);
    let v = r.run(e).unwrap();
    assert_eq!(r.reals(v), vec![1.0, 2.0]);
    let names = r.sym("names");
    let nm = r.interp.heap().get_attrib(v, names).unwrap();
    assert_eq!(r.strs(nm), vec!["a".to_string(), String::new()]);
}

/// x <- c(1, 2, 3)
fn three_reals(r: &mut R) {
    let (a, b, c) = (r.num(1.0), r.num(2.0), r.num(3.0));
    let v = r.call("c", &[a, b, c]);
    let e = r.set("x", v);
    r.run(e).unwrap();
}

#[test]
fn test_short_names_attribute_is_padded() {
    let mut r = R::new();
    three_reals(&mut r);
    // attr(x, "names") <- "a"
    let x = r.sym("x");
    let which = r.string("names");
    let getter = r.call("attr", &[x, which]);
    let a = r.string("a");
    let e = r.call("<-", &[getter, a]);
    r.run(e).unwrap();

    let names = r.sym("names");
    let x = r.get("x");
    let nm = r.interp.heap().get_attrib(x, names).unwrap();
    assert_eq!(r.strs(nm), vec!["a", "NA", "NA"]);

    let xs = r.sym("x");
    let e = r.call("c", &[xs]);
    let v = r.run(e).unwrap();
    assert_eq!(r.reals(v), vec![1.0, 2.0, 3.0]);
    let nm = r.interp.heap().get_attrib(v, names).unwrap();
    assert_eq!(r.strs(nm), vec!["a", "", ""]);
}

#[test]
fn test_long_names_attribute_is_rejected() {
    let mut r = R::new();
    three_reals(&mut r);
    let x = r.sym("x");
    let which = r.string("names");
    let getter = r.call("attr", &[x, which]);
    let labels: Vec<_> = ["a", "b", "c", "d"].iter().map(|s| r.string(s)).collect();
    let value = r.call("c", &labels);
    let e = r.call("<-", &[getter, value]);
    assert_eq!(
        r.run(e),
        Err(RError::invalid("'names' attribute [4] must be the same length as the vector [3]"))
    );
    let names = r.sym("names");
    let x = r.get("x");
    assert!(r.interp.heap().get_attrib(x, names).unwrap().is_nil());
}

#[test]
fn test_mismatched_names_set_on_heap_are_tolerated() {
    let mut r = R::new();
    three_reals(&mut r);
    let names = r.sym("names");
    let x = r.get("x");
    let one = r.string("a");
    r.interp.heap_mut().set_attrib(x, names, one).unwrap();

    // c(x)
    let xs = r.sym("x");
    let e = r.call("c", &[xs]);
    let v = r.run(e).unwrap();
    let nm = r.interp.heap().get_attrib(v, names).unwrap();
    assert_eq!(r.strs(nm), vec!["a", "", ""]);

    // x[["a"]] and x[["b"]]
    let key = r.string("a");
    let e = r.call("[[", &[xs, key]);
    let v = r.run(e).unwrap();
    assert_eq!(r.reals(v), vec![1.0]);
    let key = r.string("b");
    let e = r.call("[[", &[xs, key]);
    assert_eq!(r.run(e), Err(RError::invalid("subscript out of bounds")));

    // x[[5]] <- 9
    let five = r.int(5);
    let slot = r.call("[[", &[xs, five]);
    let nine = r.num(9.0);
    let e = r.call("<-", &[slot, nine]);
    r.run(e).unwrap();
    let x = r.get("x");
    assert_eq!(r.interp.heap().length(x), 5);
    let nm = r.interp.heap().get_attrib(x, names).unwrap();
    assert_eq!(r.strs(nm), vec!["a", "", "", "", ""]);

    // x[["z"]] <- 7
    let key = r.string("z");
    let slot = r.call("[[", &[xs, key]);
    let seven = r.num(7.0);
    let e = r.call("<-", &[slot, seven]);
    r.run(e).unwrap();
    let x = r.get("x");
    let nm = r.interp.heap().get_attrib(x, names).unwrap();
    assert_eq!(r.strs(nm), vec!["a", "", "", "", "", "z"]);
}

#[test]
fn test_length_of_list_and_nil() {
    let mut r = R::new();
    let one = r.num(1.0);
    let s = r.string("x");
    let l = r.call("list", &[one, s]);
    let e = r.call("length", &[l]);
    let v = r.run(e).unwrap();
    assert_eq!(r.ints(v), vec![2]);

    let c = r.call("c", &[]);
    let e = r.call("length", &[c]);
    let v = r.run(e).unwrap();
    assert_eq!(r.ints(v), vec![0]);
}

#[test]
fn test_subset2_by_name() {
    let mut r = R::new();
    let one = r.num(1.0);
    let two = r.num(2.0);
    let l = r.call_named("list", &[(Some("first"), one), (Some("second"), two)]);
    let key = r.string("second");
    let e = r.call("[[", &[l, key]);
    let v = r.run(e).unwrap();
    assert_eq!(r.reals(v), vec![2.0]);

    let missing = r.string("third");
    let e = r.call("[[", &[l, missing]);
    assert_eq!(r.run(e), Err(RError::InvalidArgument("subscript out of bounds".into())));
}

#[test]
fn test_attributes_and_class() {
    let mut r = R::new();
    let one = r.num(1.0);
    let e = r.set("x", one);
    r.run(e).unwrap();

    let x = r.sym("x");
    let cls = r.string("thing");
    let attr_call = r.call("class", &[x]);
    let e = r.call("<-", &[attr_call, cls]);
    r.run(e).unwrap();

    let x = r.get("x");
    assert!(r.interp.heap().is_object(x));
    let xs = r.sym("x");
    let e = r.call("class", &[xs]);
    let v = r.run(e).unwrap();
    assert_eq!(r.strs(v), vec!["thing".to_string()]);

    let which = r.string("thing");
    let e = r.call("attr", &[xs, which]);
    assert_eq!(r.run(e), Ok(core_types::Sexp::NIL));
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_if_without_else_is_invisible_nil() {
    let mut r = R::new();
    let f = r.lgl(false);
    let one = r.num(1.0);
    let e = r.call("if", &[f, one]);
    assert_eq!(r.run(e), Ok(core_types::Sexp::NIL));
    assert!(!r.interp.visible());
}

#[test]
fn test_if_na_condition() {
    let mut r = R::new();
    let na = r.interp.heap_mut().scalar_logical(core_types::NA_LOGICAL).unwrap();
    let one = r.num(1.0);
    let e = r.call("if", &[na, one]);
    assert_eq!(
        r.run(e),
        Err(RError::InvalidArgument("missing value where TRUE/FALSE needed".into()))
    );
}

#[test]
fn test_while_with_break() {
    let mut r = R::new();
    let zero = r.num(0.0);
    let init = r.set("i", zero);
    r.run(init).unwrap();

    // while (TRUE) { i <- i + 1; if (i == 5) break }
    let i = r.sym("i");
    let one = r.num(1.0);
    let inc = r.call("+", &[i, one]);
    let step = r.set("i", inc);
    let five = r.num(5.0);
    let test = r.call("==", &[i, five]);
    let brk = r.call("break", &[]);
    let stop = r.call("if", &[test, brk]);
    let body = r.block(&[step, stop]);
    let t = r.lgl(true);
    let e = r.call("while", &[t, body]);
    assert_eq!(r.run(e), Ok(core_types::Sexp::NIL));
    assert!(!r.interp.visible());

    let v = r.get("i");
    assert_eq!(r.reals(v), vec![5.0]);
    assert_eq!(r.interp.context_depth(), 0);
}

#[test]
fn test_for_with_next() {
    let mut r = R::new();
    let zero = r.num(0.0);
    let init = r.set("s", zero);
    r.run(init).unwrap();

    // for (k in c(1, 2, 3, 4, 5)) { if (k == 2) next; s <- s + k }
    let items: Vec<_> = (1..=5).map(|k| r.num(f64::from(k))).collect();
    let seq = r.call("c", &items);
    let k = r.sym("k");
    let two = r.num(2.0);
    let test = r.call("==", &[k, two]);
    let nxt = r.call("next", &[]);
    let skip = r.call("if", &[test, nxt]);
    let s = r.sym("s");
    let sum = r.call("+", &[s, k]);
    let acc = r.set("s", sum);
    let body = r.block(&[skip, acc]);
    let e = r.call("for", &[k, seq, body]);
    r.run(e).unwrap();

    let v = r.get("s");
    assert_eq!(r.reals(v), vec![13.0]);
    let v = r.get("k");
    assert_eq!(r.reals(v), vec![5.0]);
}

#[test]
fn test_repeat_and_for_over_list() {
    let mut r = R::new();
    let zero = r.int(0);
    let init = r.set("n", zero);
    r.run(init).unwrap();

    // for (e in list(1L, "a", NULL)) n <- n + 1L
    let a = r.int(1);
    let b = r.string("a");
    let l = r.call("list", &[a, b, core_types::Sexp::NIL]);
    let n = r.sym("n");
    let one = r.int(1);
    let inc = r.call("+", &[n, one]);
    let body = r.set("n", inc);
    let el = r.sym("el");
    let e = r.call("for", &[el, l, body]);
    r.run(e).unwrap();
    let v = r.get("n");
    assert_eq!(r.ints(v), vec![3]);

    // repeat { n <- n + 1L; if (n > 5L) break }
    let five = r.int(5);
    let test = r.call(">", &[n, five]);
    let brk = r.call("break", &[]);
    let stop = r.call("if", &[test, brk]);
    let body = r.block(&[body, stop]);
    let e = r.call("repeat", &[body]);
    r.run(e).unwrap();
    let v = r.get("n");
    assert_eq!(r.ints(v), vec![6]);
}

#[test]
fn test_break_outside_loop() {
    let mut r = R::new();
    let brk = r.call("break", &[]);
    assert_eq!(
        r.run(brk),
        Err(RError::User("no loop for break/next, jumping to top level".into()))
    );
    let one = r.num(1.0);
    let ret = r.call("return", &[one]);
    assert_eq!(
        r.run(ret),
        Err(RError::User("no function to return from, jumping to top level".into()))
    );
    assert_eq!(r.interp.context_depth(), 0);
}

#[test]
fn test_return_from_inside_loop() {
    let mut r = R::new();
    // g <- function() { for (i in c(1, 2, 3)) if (i == 2) return(i * 10); 0 }
    let items: Vec<_> = (1..=3).map(|k| r.num(f64::from(k))).collect();
    let seq = r.call("c", &items);
    let i = r.sym("i");
    let two = r.num(2.0);
    let test = r.call("==", &[i, two]);
    let ten = r.num(10.0);
    let scaled = r.call("*", &[i, ten]);
    let ret = r.call("return", &[scaled]);
    let cond = r.call("if", &[test, ret]);
    let lp = r.call("for", &[i, seq, cond]);
    let zero = r.num(0.0);
    let body = r.block(&[lp, zero]);
    r.define("g", &[], body);

    let e = r.call("g", &[]);
    let v = r.run(e).unwrap();
    assert_eq!(r.reals(v), vec![20.0]);
}

// ============================================================================
// Arguments
// ============================================================================

#[test]
fn test_default_argument() {
    let mut r = R::new();
    let x = r.sym("x");
    let y = r.sym("y");
    let body = r.call("+", &[x, y]);
    let ten = r.num(10.0);
    r.define("f", &[("x", None), ("y", Some(ten))], body);

    let three = r.num(3.0);
    let e = r.call("f", &[three]);
    let v = r.run(e).unwrap();
    assert_eq!(r.reals(v), vec![13.0]);
}

#[test]
fn test_missing() {
    let mut r = R::new();
    let b = r.sym("b");
    let body = r.call("missing", &[b]);
    r.define("h", &[("a", None), ("b", None)], body);

    let one = r.num(1.0);
    let e = r.call("h", &[one]);
    let v = r.run(e).unwrap();
    assert_eq!(r.lgls(v), vec![1]);

    let two = r.num(2.0);
    let e = r.call("h", &[one, two]);
    let v = r.run(e).unwrap();
    assert_eq!(r.lgls(v), vec![0]);

    let e = r.call("missing", &[b]);
    assert!(r.run(e).is_err());
}

#[test]
fn test_missing_argument_without_default() {
    let mut r = R::new();
    let b = r.sym("b");
    r.define("h", &[("a", None), ("b", None)], b);
    let one = r.num(1.0);
    let e = r.call("h", &[one]);
    assert_eq!(r.run(e), Err(RError::MissingArgument("b".into())));
}

#[test]
fn test_partial_matching() {
    let mut r = R::new();
    let value = r.sym("value");
    r.define("f", &[("value", None), ("other", None)], value);
    let one = r.num(1.0);
    let two = r.num(2.0);
    let e = r.call_named("f", &[(Some("oth"), one), (Some("val"), two)]);
    let v = r.run(e).unwrap();
    assert_eq!(r.reals(v), vec![2.0]);
}

#[test]
fn test_dots_forwarding_and_ddn() {
    let mut r = R::new();
    let dd2 = r.sym("..2");
    r.define("second", &[("...", None)], dd2);
    let dots = r.sym("...");
    let l = r.call("list", &[dots]);
    let body = r.call("length", &[l]);
    r.define("count", &[("...", None)], body);

    let args: Vec<_> = (1..=3).map(|k| r.num(f64::from(k))).collect();
    let e = r.call("second", &args);
    let v = r.run(e).unwrap();
    assert_eq!(r.reals(v), vec![2.0]);

    let e = r.call("count", &args);
    let v = r.run(e).unwrap();
    assert_eq!(r.ints(v), vec![3]);

    let e = r.call("count", &[]);
    let v = r.run(e).unwrap();
    assert_eq!(r.ints(v), vec![0]);

    let e = r.call("second", &args[..1]);
    assert_eq!(
        r.run(e),
        Err(RError::User("the ... list does not contain 2 elements".into()))
    );
}

#[test]
fn test_unused_argument() {
    let mut r = R::new();
    let x = r.sym("x");
    r.define("f", &[("x", None)], x);
    let one = r.num(1.0);
    let e = r.call_named("f", &[(None, one), (Some("zz"), one)]);
    assert_eq!(
        r.run(e),
        Err(RError::ArgumentMatch("unused argument(s) (zz)".into()))
    );
}

#[test]
fn test_builtin_arity() {
    let mut r = R::new();
    let one = r.num(1.0);
    let e = r.call("length", &[one]);
    assert!(r.run(e).is_ok());

    let e = r.call("length", &[]);
    assert!(matches!(r.run(e), Err(RError::ArityMismatch { .. })));
    let e = r.call("length", &[one, one]);
    assert!(matches!(r.run(e), Err(RError::ArityMismatch { .. })));
}

// ============================================================================
// Assignment
// ============================================================================

#[test]
fn test_super_assignment_counter() {
    let mut r = R::new();
    // make <- function() { n <- 0; function() { n <<- n + 1; n } }
    let zero = r.num(0.0);
    let init = r.set("n", zero);
    let n = r.sym("n");
    let one = r.num(1.0);
    let inc = r.call("+", &[n, one]);
    let bump = r.set_super("n", inc);
    let inner_body = r.block(&[bump, n]);
    let inner = r.func(&[], inner_body);
    let body = r.block(&[init, inner]);
    r.define("make", &[], body);

    let mk = r.call("make", &[]);
    let e = r.set("counter", mk);
    r.run(e).unwrap();
    let tick = r.call("counter", &[]);
    r.run(tick).unwrap();
    let v = r.run(tick).unwrap();
    assert_eq!(r.reals(v), vec![2.0]);

    // the global n was never touched
    let global = r.interp.global_env();
    assert_eq!(
        r.interp.find_var_in_frame(global, n).unwrap(),
        core_types::Sexp::UNBOUND
    );
}

#[test]
fn test_nested_replacement() {
    let mut r = R::new();
    // x <- list(a = list(b = 1)); x[["a"]][["b"]] <- 9
    let one = r.num(1.0);
    let inner = r.call_named("list", &[(Some("b"), one)]);
    let outer = r.call_named("list", &[(Some("a"), inner)]);
    let e = r.set("x", outer);
    r.run(e).unwrap();

    let x = r.sym("x");
    let a = r.string("a");
    let b = r.string("b");
    let xa = r.call("[[", &[x, a]);
    let xab = r.call("[[", &[xa, b]);
    let nine = r.num(9.0);
    let e = r.call("<-", &[xab, nine]);
    let v = r.run(e).unwrap();
    assert_eq!(v, nine);

    let v = r.run(xab).unwrap();
    assert_eq!(r.reals(v), vec![9.0]);
    let tmp = r.sym("*tmp*");
    let global = r.interp.global_env();
    assert_eq!(
        r.interp.find_var_in_frame(global, tmp).unwrap(),
        core_types::Sexp::UNBOUND
    );
}

#[test]
fn test_attr_replacement() {
    let mut r = R::new();
    let one = r.num(1.0);
    let e = r.set("x", one);
    r.run(e).unwrap();
    let x = r.sym("x");
    let which = r.string("units");
    let lhs = r.call("attr", &[x, which]);
    let cm = r.string("cm");
    let e = r.call("<-", &[lhs, cm]);
    r.run(e).unwrap();
    let v = r.run(lhs).unwrap();
    assert_eq!(r.strs(v), vec!["cm".to_string()]);
}

#[test]
fn test_depth_limit() {
    let mut r = R::with(Interpreter::new().unwrap().with_max_depth(50));
    let n = r.sym("n");
    let body = r.call("f", &[n]);
    r.define("f", &[("n", None)], body);
    let one = r.num(1.0);
    let e = r.call("f", &[one]);
    assert_eq!(r.run(e), Err(RError::EvalDepth(50)));
    assert_eq!(r.interp.context_depth(), 0);
    assert_eq!(r.interp.heap().protection_stack().depth(), 0);
}
