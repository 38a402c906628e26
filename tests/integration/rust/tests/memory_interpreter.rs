//! Heap and evaluator together: collection during evaluation, small heaps
//! and heap growth.

use integration_tests::components::core_types::{HeapKind, RError, Sexp, SexpType};
use integration_tests::components::memory_manager::MemoryConfig;
use integration_tests::Session;

fn small_heap() -> MemoryConfig {
    MemoryConfig::default()
        .with_node_count(3_000)
        .with_vector_bytes(1 << 16)
}

/// f <- function(a, b = 2) { l <- list(a, b); l[[1]] + l[[2]] }
fn define_pair_sum(s: &mut Session) {
    let a = s.sym("a");
    let b = s.sym("b");
    let l = s.call("list", &[a, b]);
    let bind = s.set("l", l);
    let lsym = s.sym("l");
    let one = s.int(1);
    let two = s.int(2);
    let first = s.call("[[", &[lsym, one]);
    let second = s.call("[[", &[lsym, two]);
    let sum = s.call("+", &[first, second]);
    let body = s.block(&[bind, sum]);
    let default = s.num(2.0);
    s.define("f", &[("a", None), ("b", Some(default))], body);
}

#[test]
fn test_closure_call_under_torture() {
    let mut s = Session::with_config(small_heap());
    define_pair_sum(&mut s);
    let one = s.num(1.0);
    let call = s.call("f", &[one]);
    let _call = s.interp.heap().protect(call).unwrap();

    s.interp.heap_mut().set_torture(true);
    let v = s.run(call).unwrap();
    let again = s.run(call).unwrap();
    s.interp.heap_mut().set_torture(false);

    assert_eq!(s.reals(v), vec![3.0]);
    assert_eq!(s.reals(again), vec![3.0]);
    assert_eq!(s.interp.heap().protection_stack().depth(), 1);
    assert!(s.interp.heap().gc_stats().collections > 10);
}

#[test]
fn test_loop_garbage_is_reclaimed() {
    let mut s = Session::with_config(small_heap());
    // total <- 0; for (i in c(...200 values)) total <- total + i * 2
    let items: Vec<_> = (1..=200).map(|k| s.num(f64::from(k))).collect();
    let seq = s.call("c", &items);
    let i = s.sym("i");
    let two = s.num(2.0);
    let doubled = s.call("*", &[i, two]);
    let total = s.sym("total");
    let sum = s.call("+", &[total, doubled]);
    let body = s.set("total", sum);
    let e = s.call("for", &[i, seq, body]);
    let _e = s.interp.heap().protect(e).unwrap();

    for _ in 0..20 {
        let zero = s.num(0.0);
        let init = s.set("total", zero);
        s.run(init).unwrap();
        s.run(e).unwrap();
    }
    let v = s.get("total");
    assert_eq!(s.reals(v), vec![40_200.0]);
    assert!(s.interp.heap().gc_stats().total_nodes_freed > 0);
}

#[test]
fn test_gc_keeps_global_bindings_and_frees_temporaries() {
    let mut s = Session::new();
    let items: Vec<_> = (1..=3).map(|k| s.num(f64::from(k))).collect();
    let v = s.call("c", &items);
    let e = s.set("keep", v);
    s.run(e).unwrap();
    let before = s.interp.gc();

    let temp: Vec<Sexp> = (0..100).map(|k| s.num(f64::from(k))).collect();
    let after = s.interp.gc();
    assert!(after.nodes_freed >= temp.len());
    assert!(after.collections > before.collections);
    for t in &temp {
        assert!(!s.interp.heap().is_allocated(*t));
    }

    let keep = s.get("keep");
    assert_eq!(s.reals(keep), vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_vector_compaction_preserves_contents() {
    let mut s = Session::with_config(small_heap());
    let global = s.interp.global_env();
    for k in 0..50 {
        // scratch vectors interleaved with kept ones
        s.interp.heap_mut().alloc_vector(SexpType::Real, 64).unwrap();
        if k % 5 == 0 {
            let kept = s.interp.heap_mut().alloc_vector(SexpType::Integer, 8).unwrap();
            let _g = s.interp.heap().protect(kept).unwrap();
            s.interp.heap_mut().integer_mut(kept).unwrap().fill(k);
            let name = s.sym(&format!("v{}", k));
            s.interp.define_var(name, kept, global).unwrap();
        }
    }
    s.interp.gc();
    for k in (0..50).step_by(5) {
        let v = s.get(&format!("v{}", k));
        assert_eq!(s.ints(v), vec![k; 8]);
    }
}

#[test]
fn test_heap_exhaustion_is_an_error() {
    let config = MemoryConfig::default()
        .with_node_count(20_000)
        .with_vector_bytes(1 << 16);
    let mut s = Session::with_config(config);
    // x <- c(); repeat x[[length(x) + 1L]] <- 1
    let empty = s.call("c", &[]);
    let init = s.set("x", empty);
    s.run(init).unwrap();
    let x = s.sym("x");
    let len = s.call("length", &[x]);
    let one_l = s.int(1);
    let next = s.call("+", &[len, one_l]);
    let slot = s.call("[[", &[x, next]);
    let one = s.num(1.0);
    let grow = s.call("<-", &[slot, one]);
    let e = s.call("repeat", &[grow]);

    let err = s.run(e).unwrap_err();
    assert!(matches!(err, RError::HeapExhausted(HeapKind::Vector)), "{:?}", err);
    assert_eq!(s.interp.context_depth(), 0);
    assert_eq!(s.interp.heap().protection_stack().depth(), 0);
}

#[test]
fn test_huge_subscript_assignment_is_an_error() {
    let mut s = Session::with_config(small_heap());
    let one = s.num(1.0);
    let init = s.call("c", &[one]);
    let bind = s.set("x", init);
    s.run(bind).unwrap();

    // x[[1e19]] <- 5 is beyond any representable index
    let x = s.sym("x");
    let far = s.num(1e19);
    let slot = s.call("[[", &[x, far]);
    let five = s.num(5.0);
    let e = s.call("<-", &[slot, five]);
    let err = s.run(e).unwrap_err();
    assert_eq!(err, RError::invalid("subscript out of bounds"));

    // x[[1e12]] <- 5 is an index the heap cannot hold
    let x = s.sym("x");
    let big = s.num(1e12);
    let slot = s.call("[[", &[x, big]);
    let five = s.num(5.0);
    let e = s.call("<-", &[slot, five]);
    let err = s.run(e).unwrap_err();
    assert_eq!(err, RError::HeapExhausted(HeapKind::Vector));

    assert_eq!(s.interp.context_depth(), 0);
    assert_eq!(s.interp.heap().protection_stack().depth(), 0);
    let x = s.get("x");
    assert_eq!(s.reals(x), vec![1.0]);
}

#[test]
fn test_overflowing_vector_size_is_exhaustion() {
    let mut s = Session::with_config(small_heap());
    for len in [usize::MAX / 2, usize::MAX / 8 + 1, usize::MAX] {
        let err = s.interp.heap_mut().alloc_vector(SexpType::Real, len).unwrap_err();
        assert_eq!(err, RError::HeapExhausted(HeapKind::Vector));
    }
    let err = s.interp.heap_mut().alloc_vector(SexpType::Generic, usize::MAX / 4).unwrap_err();
    assert_eq!(err, RError::HeapExhausted(HeapKind::Vector));

    // the heap is still usable afterwards
    let v = s.num(2.5);
    assert_eq!(s.reals(v), vec![2.5]);
}

#[test]
fn test_heap_grows_up_to_ceiling() {
    let config = MemoryConfig::default()
        .with_node_count(1_000)
        .with_max_node_count(8_000);
    let mut s = Session::with_config(config);
    let global = s.interp.global_env();
    let mut list = Sexp::NIL;
    for k in 0..2_000 {
        let _g = s.interp.heap().protect(list).unwrap();
        let v = s.int(k);
        let _v = s.interp.heap().protect(v).unwrap();
        list = s.interp.heap_mut().cons(v, list).unwrap();
    }
    let hold = s.sym("hold");
    s.interp.define_var(hold, list, global).unwrap();

    let stats = s.interp.gc();
    assert!(stats.node_capacity > 1_000);
    assert!(stats.node_capacity <= 8_000);
    assert_eq!(s.interp.heap().length(list), 2_000);
}
