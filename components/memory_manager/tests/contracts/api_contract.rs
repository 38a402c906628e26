//! Contract tests verifying the memory_manager API.
//! These tests exercise the heap through its public surface only.

use core_types::{HeapKind, RError, Sexp, SexpType};
use memory_manager::{Heap, MemoryConfig};

fn tiny(config: MemoryConfig) -> Heap {
    Heap::new(config).unwrap()
}

/// Test Heap contract: new(MemoryConfig) -> Result<Heap, RError>
#[test]
fn contract_heap_new() {
    let heap = Heap::new(MemoryConfig::default()).unwrap();
    assert_eq!(heap.gc_stats().node_capacity, 200_000);
    assert_eq!(heap.gc_stats().vector_capacity, 2_097_152);
    assert_eq!(heap.protection_stack().limit(), 10_000);
}

/// Test MemoryConfig contract: deserializes with per-field defaults
#[test]
fn contract_config_from_json() {
    let config: MemoryConfig =
        serde_json::from_str(r#"{ "node_count": 5000, "torture": true }"#).unwrap();
    assert_eq!(config.node_count, 5000);
    assert!(config.torture);
    assert_eq!(config.pp_stack_size, 10_000);
    assert_eq!(config.vector_bytes, 2_097_152);
    assert_eq!(config.max_node_count, None);
}

/// Test install contract: equal names give identical symbols
#[test]
fn contract_interning_identity() {
    let mut heap = Heap::new(MemoryConfig::default()).unwrap();
    for name in ["x", "foo", "..1", "a.long.name", "<-"] {
        let first = heap.install(name).unwrap();
        heap.collect();
        let second = heap.install(name).unwrap();
        assert_eq!(first, second, "{}", name);
    }
    let long = "n".repeat(300);
    assert!(matches!(
        heap.install(&long),
        Err(RError::InvalidArgument(_))
    ));
}

/// Test torture mode: an unrooted object is reclaimed by the next allocation
#[test]
fn contract_torture_reclaims_unrooted() {
    let mut heap = tiny(MemoryConfig::default().with_node_count(128).with_torture(true));
    let lost = heap.scalar_real(1.0).unwrap();
    let next = heap.scalar_real(2.0).unwrap();
    // the collection run by the second allocation freed the first slot
    assert_eq!(next, lost);
    assert_eq!(heap.real(next).unwrap(), &[2.0]);
}

/// Test torture mode: a protected object survives every allocation
#[test]
fn contract_torture_keeps_protected() {
    let mut heap = tiny(MemoryConfig::default().with_node_count(128).with_torture(true));
    let kept = heap.scalar_real(1.0).unwrap();
    let _guard = heap.protect(kept).unwrap();
    for i in 0..20 {
        let other = heap.scalar_real(f64::from(i)).unwrap();
        assert_ne!(other, kept);
    }
    assert_eq!(heap.real(kept).unwrap(), &[1.0]);
}

/// Test allocation contract: HeapExhausted(Node) once nothing can be freed
#[test]
fn contract_node_exhaustion() {
    let mut heap = tiny(MemoryConfig::default().with_node_count(64));
    let mut guard = heap.protect(Sexp::NIL).unwrap();
    let mut result = Ok(());
    for _ in 0..1000 {
        match heap.cons(Sexp::NIL, guard.get()) {
            Ok(cell) => guard.replace(cell),
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }
    assert_eq!(result, Err(RError::HeapExhausted(HeapKind::Node)));
    drop(guard);
    heap.collect();
    assert!(heap.cons(Sexp::NIL, Sexp::NIL).is_ok());
}

/// Test allocation contract: the node heap grows up to its ceiling
#[test]
fn contract_node_growth() {
    let mut heap = tiny(
        MemoryConfig::default()
            .with_node_count(64)
            .with_max_node_count(512),
    );
    let mut guard = heap.protect(Sexp::NIL).unwrap();
    for _ in 0..200 {
        let cell = heap.cons(Sexp::NIL, guard.get()).unwrap();
        guard.replace(cell);
    }
    assert_eq!(heap.length(guard.get()), 200);
    assert!(heap.gc_stats().node_capacity > 64);
    assert!(heap.gc_stats().node_capacity <= 512);
}

/// Test allocation contract: oversized vectors need a higher ceiling
#[test]
fn contract_vector_exhaustion_and_growth() {
    let mut fixed = tiny(MemoryConfig::default().with_vector_bytes(1024));
    assert_eq!(
        fixed.alloc_vector(SexpType::Real, 1000),
        Err(RError::HeapExhausted(HeapKind::Vector))
    );

    let mut growing = tiny(
        MemoryConfig::default()
            .with_vector_bytes(1024)
            .with_max_vector_bytes(64 * 1024),
    );
    let v = growing.alloc_vector(SexpType::Real, 1000).unwrap();
    assert_eq!(growing.length(v), 1000);
}

/// Test protection contract: overflow is reported, not a panic
#[test]
fn contract_protection_overflow() {
    let heap = tiny(MemoryConfig::default().with_pp_stack_size(3));
    let base = heap.protection_stack().depth();
    let mut guards = Vec::new();
    let mut overflow = None;
    for _ in 0..10 {
        match heap.protect(Sexp::NIL) {
            Ok(g) => guards.push(g),
            Err(e) => {
                overflow = Some(e);
                break;
            }
        }
    }
    assert_eq!(overflow, Some(RError::ProtectionStackOverflow(3)));
    assert!(overflow.as_ref().is_some_and(RError::is_fatal));
    drop(guards);
    assert_eq!(heap.protection_stack().depth(), base);
}

/// Test vector compaction: live payloads keep their contents across many
/// collections while garbage is interleaved
#[test]
fn contract_compaction_preserves_survivors() {
    let mut heap = tiny(MemoryConfig::default().with_vector_bytes(4096));
    let keep = heap.alloc_vector(SexpType::Generic, 10).unwrap();
    let _keep = heap.protect(keep).unwrap();
    for i in 0..10 {
        let _garbage = heap.alloc_vector(SexpType::Real, 16).unwrap();
        let s = heap.mk_string(&format!("item{}", i)).unwrap();
        heap.set_vector_elt(keep, i, s).unwrap();
    }
    for _ in 0..3 {
        heap.collect();
    }
    for i in 0..10 {
        let s = heap.vector_elt(keep, i).unwrap();
        let c = heap.string_elt(s, 0).unwrap();
        assert_eq!(heap.char_str(c).unwrap(), format!("item{}", i));
    }
}
