//! Whole programs evaluated from the top level.

use integration_tests::components::core_types::{RError, Sexp, SexpType};
use integration_tests::Session;

#[test]
fn test_recursive_factorial() {
    let mut s = Session::new();
    // fact <- function(n) if (n <= 1L) 1L else n * fact(n - 1L)
    let n = s.sym("n");
    let one = s.int(1);
    let test = s.call("<=", &[n, one]);
    let dec = s.call("-", &[n, one]);
    let rec = s.call("fact", &[dec]);
    let prod = s.call("*", &[n, rec]);
    let body = s.call("if", &[test, one, prod]);
    s.define("fact", &[("n", None)], body);

    let ten = s.int(10);
    let e = s.call("fact", &[ten]);
    let v = s.run(e).unwrap();
    assert_eq!(s.interp.heap().type_of(v), SexpType::Integer);
    assert_eq!(s.ints(v), vec![3_628_800]);
    assert_eq!(s.interp.context_depth(), 0);
}

#[test]
fn test_building_a_list_in_a_loop() {
    let mut s = Session::new();
    // squares <- list(); i <- 1L
    // while (i <= 5L) { squares[[i]] <- i * i; i <- i + 1L }
    let empty = s.call("list", &[]);
    let init = s.set("squares", empty);
    s.run(init).unwrap();
    let one = s.int(1);
    let init = s.set("i", one);
    s.run(init).unwrap();

    let i = s.sym("i");
    let squares = s.sym("squares");
    let five = s.int(5);
    let test = s.call("<=", &[i, five]);
    let slot = s.call("[[", &[squares, i]);
    let sq = s.call("*", &[i, i]);
    let store = s.call("<-", &[slot, sq]);
    let inc = s.call("+", &[i, one]);
    let step = s.set("i", inc);
    let body = s.block(&[store, step]);
    let e = s.call("while", &[test, body]);
    s.run(e).unwrap();

    let len = s.call("length", &[squares]);
    let v = s.run(len).unwrap();
    assert_eq!(s.ints(v), vec![5]);
    for k in 1..=5 {
        let idx = s.int(k);
        let get = s.call("[[", &[squares, idx]);
        let v = s.run(get).unwrap();
        assert_eq!(s.ints(v), vec![k * k]);
    }
}

#[test]
fn test_error_recovery_with_try() {
    let mut s = Session::new();
    // safe_div <- function(a, b) { if (b == 0) stop("division by zero"); a / b }
    let a = s.sym("a");
    let b = s.sym("b");
    let zero = s.num(0.0);
    let test = s.call("==", &[b, zero]);
    let msg = s.string("division by zero");
    let fail = s.call("stop", &[msg]);
    let guard = s.call("if", &[test, fail]);
    let quotient = s.call("/", &[a, b]);
    let body = s.block(&[guard, quotient]);
    s.define("safe_div", &[("a", None), ("b", None)], body);

    let one = s.num(1.0);
    let bad = s.call("safe_div", &[one, zero]);
    let yes = s.lgl(true);
    let attempt = s.call_named("try", &[(None, bad), (Some("silent"), yes)]);
    let e = s.set("r1", attempt);
    s.run(e).unwrap();

    let r1 = s.sym("r1");
    let cls = s.call("class", &[r1]);
    let v = s.run(cls).unwrap();
    let class = s.interp.heap().string_elt(v, 0).unwrap();
    assert_eq!(s.interp.heap().char_str(class).unwrap(), "try-error");

    let six = s.num(6.0);
    let three = s.num(3.0);
    let good = s.call("safe_div", &[six, three]);
    let attempt = s.call("try", &[good]);
    let v = s.run(attempt).unwrap();
    assert_eq!(s.reals(v), vec![2.0]);
    assert_eq!(s.interp.context_depth(), 0);
}

#[test]
fn test_on_exit_runs_through_nested_failure() {
    let mut s = Session::new();
    let zero = s.num(0.0);
    let init = s.set("log", zero);
    s.run(init).unwrap();

    // inner <- function() { on.exit(log <<- log + 1); stop("x") }
    let log = s.sym("log");
    let one = s.num(1.0);
    let plus_one = s.call("+", &[log, one]);
    let bump_one = s.set_super("log", plus_one);
    let exit_inner = s.call("on.exit", &[bump_one]);
    let msg = s.string("x");
    let fail = s.call("stop", &[msg]);
    let body = s.block(&[exit_inner, fail]);
    s.define("inner", &[], body);

    // outer <- function() { on.exit(log <<- log + 10); inner(); log <<- 1000 }
    let ten = s.num(10.0);
    let plus_ten = s.call("+", &[log, ten]);
    let bump_ten = s.set_super("log", plus_ten);
    let exit_outer = s.call("on.exit", &[bump_ten]);
    let call_inner = s.call("inner", &[]);
    let thousand = s.num(1000.0);
    let unreachable = s.set_super("log", thousand);
    let body = s.block(&[exit_outer, call_inner, unreachable]);
    s.define("outer", &[], body);

    let call = s.call("outer", &[]);
    assert_eq!(s.run(call), Err(RError::User("x".into())));
    let v = s.get("log");
    assert_eq!(s.reals(v), vec![11.0]);
    assert_eq!(s.interp.context_depth(), 0);
    assert_eq!(s.interp.heap().protection_stack().depth(), 0);

    // the interpreter is still usable afterwards
    let v = s.run(plus_one).unwrap();
    assert_eq!(s.reals(v), vec![12.0]);
}

#[test]
fn test_closures_share_their_defining_environment() {
    let mut s = Session::new();
    // account <- function(balance) list(
    //     deposit = function(x) { balance <<- balance + x; balance },
    //     balance = function() balance)
    let balance = s.sym("balance");
    let x = s.sym("x");
    let sum = s.call("+", &[balance, x]);
    let update = s.set_super("balance", sum);
    let deposit_body = s.block(&[update, balance]);
    let deposit = s.func(&[("x", None)], deposit_body);
    let getter = s.func(&[], balance);
    let body = s.call_named("list", &[(Some("deposit"), deposit), (Some("balance"), getter)]);
    s.define("account", &[("balance", None)], body);

    let hundred = s.num(100.0);
    let open = s.call("account", &[hundred]);
    let e = s.set("acc", open);
    s.run(e).unwrap();
    let other = s.call("account", &[hundred]);
    let e = s.set("other", other);
    s.run(e).unwrap();

    // acc[["deposit"]](50); acc[["deposit"]](25)
    let acc = s.sym("acc");
    let key = s.string("deposit");
    let method = s.call("[[", &[acc, key]);
    for amount in [50.0, 25.0] {
        let arg = s.num(amount);
        let e = s.interp.lang_named(method, &[(None, arg)]).unwrap();
        s.run(e).unwrap();
    }

    let key = s.string("balance");
    let getter = s.call("[[", &[acc, key]);
    let e = s.interp.lang_named(getter, &[]).unwrap();
    let v = s.run(e).unwrap();
    assert_eq!(s.reals(v), vec![175.0]);

    let other = s.sym("other");
    let getter = s.call("[[", &[other, key]);
    let e = s.interp.lang_named(getter, &[]).unwrap();
    let v = s.run(e).unwrap();
    assert_eq!(s.reals(v), vec![100.0]);
}

#[test]
fn test_lazy_arguments_and_defaults() {
    let mut s = Session::new();
    // pick <- function(flag, yes, no = stop("no branch evaluated")) if (flag) yes else no
    let flag = s.sym("flag");
    let yes = s.sym("yes");
    let no = s.sym("no");
    let msg = s.string("no branch evaluated");
    let fail = s.call("stop", &[msg]);
    let body = s.call("if", &[flag, yes, no]);
    s.define("pick", &[("flag", None), ("yes", None), ("no", Some(fail))], body);

    let t = s.lgl(true);
    let seven = s.num(7.0);
    let e = s.call("pick", &[t, seven]);
    let v = s.run(e).unwrap();
    assert_eq!(s.reals(v), vec![7.0]);

    let f = s.lgl(false);
    let e = s.call("pick", &[f, seven]);
    assert_eq!(s.run(e), Err(RError::User("no branch evaluated".into())));
}

#[test]
fn test_quote_and_invisible_results() {
    let mut s = Session::new();
    let x = s.sym("x");
    let one = s.num(1.0);
    let expr = s.call("+", &[x, one]);
    let quoted = s.call("quote", &[expr]);
    let v = s.run(quoted).unwrap();
    assert_eq!(v, expr);
    assert!(s.interp.visible());

    let e = s.set("y", one);
    s.run(e).unwrap();
    assert!(!s.interp.visible());

    let y = s.sym("y");
    let paren = s.call("(", &[e]);
    let v = s.run(paren).unwrap();
    assert_eq!(v, one);
    assert!(s.interp.visible());

    let inv = s.call("invisible", &[y]);
    s.run(inv).unwrap();
    assert!(!s.interp.visible());
}

#[test]
fn test_next_and_break_in_nested_loops() {
    let mut s = Session::new();
    // count <- 0
    // for (i in c(1, 2, 3)) for (j in c(1, 2, 3)) { if (j > i) break; count <- count + 1 }
    let zero = s.num(0.0);
    let init = s.set("count", zero);
    s.run(init).unwrap();
    let items: Vec<_> = (1..=3).map(|k| s.num(f64::from(k))).collect();
    let seq = s.call("c", &items);
    let i = s.sym("i");
    let j = s.sym("j");
    let test = s.call(">", &[j, i]);
    let brk = s.call("break", &[]);
    let stop = s.call("if", &[test, brk]);
    let count = s.sym("count");
    let one = s.num(1.0);
    let inc = s.call("+", &[count, one]);
    let bump = s.set("count", inc);
    let body = s.block(&[stop, bump]);
    let inner = s.call("for", &[j, seq, body]);
    let outer = s.call("for", &[i, seq, inner]);
    s.run(outer).unwrap();

    let v = s.get("count");
    assert_eq!(s.reals(v), vec![6.0]);
    assert_eq!(s.interp.context_depth(), 0);
}

#[test]
fn test_environment_of_closure() {
    let mut s = Session::new();
    // make <- function() function() environment()
    let env_call = s.call("environment", &[]);
    let inner = s.func(&[], env_call);
    s.define("make", &[], inner);
    let mk = s.call("make", &[]);
    let e = s.set("g", mk);
    s.run(e).unwrap();

    let g = s.get("g");
    let defining = s.interp.heap().cloenv(g).unwrap();
    let global = s.interp.global_env();
    assert_ne!(defining, global);
    assert_eq!(s.interp.heap().enclos(defining).unwrap(), global);

    let call = s.call("g", &[]);
    let frame = s.run(call).unwrap();
    assert_eq!(s.interp.heap().type_of(frame), SexpType::Env);
    assert_eq!(s.interp.heap().enclos(frame).unwrap(), defining);
    assert_ne!(frame, Sexp::NIL);
}
