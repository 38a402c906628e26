//! Attributes and copying.
//!
//! Attributes live in a side map from object to a tagged pair list, so any
//! object can carry them. The collector traces the list of every marked
//! object and drops the entries of unmarked ones.

use crate::heap::Heap;
use core_types::{RError, Sexp, SexpType};

impl Heap {
    /// Attribute list of `x`, or nil.
    pub fn attributes(&self, x: Sexp) -> Sexp {
        self.attributes.get(&x).copied().unwrap_or(Sexp::NIL)
    }

    /// Value of attribute `name` on `x`, or nil.
    pub fn get_attrib(&self, x: Sexp, name: Sexp) -> Result<Sexp, RError> {
        let mut p = self.attributes(x);
        while !p.is_nil() {
            if self.tag(p)? == name {
                return self.car(p);
            }
            p = self.cdr(p)?;
        }
        Ok(Sexp::NIL)
    }

    /// Sets attribute `name` on `x`; a nil value removes it.
    ///
    /// Setting `class` also maintains the object flag.
    pub fn set_attrib(&mut self, x: Sexp, name: Sexp, value: Sexp) -> Result<(), RError> {
        if x.is_nil() {
            if value.is_nil() {
                return Ok(());
            }
            return Err(RError::invalid("attempt to set an attribute on NULL"));
        }
        self.cell(x)?;
        if value.is_nil() {
            self.remove_attrib(x, name)?;
        } else {
            let mut last = Sexp::NIL;
            let mut p = self.attributes(x);
            while !p.is_nil() {
                if self.tag(p)? == name {
                    self.set_car(p, value)?;
                    break;
                }
                last = p;
                p = self.cdr(p)?;
            }
            if p.is_nil() {
                let node = self.cons(value, Sexp::NIL)?;
                self.set_tag(node, name)?;
                if last.is_nil() {
                    self.attributes.insert(x, node);
                } else {
                    self.set_cdr(last, node)?;
                }
            }
        }
        if name == self.class_symbol {
            self.cell_mut(x)?.info.obj = !value.is_nil();
        }
        Ok(())
    }

    fn remove_attrib(&mut self, x: Sexp, name: Sexp) -> Result<(), RError> {
        let mut prev = Sexp::NIL;
        let mut p = self.attributes(x);
        while !p.is_nil() {
            let next = self.cdr(p)?;
            if self.tag(p)? == name {
                if prev.is_nil() {
                    if next.is_nil() {
                        self.attributes.remove(&x);
                    } else {
                        self.attributes.insert(x, next);
                    }
                } else {
                    self.set_cdr(prev, next)?;
                }
                return Ok(());
            }
            prev = p;
            p = next;
        }
        Ok(())
    }

    /// Replaces the whole attribute list of `x`.
    pub fn set_attributes(&mut self, x: Sexp, list: Sexp) -> Result<(), RError> {
        self.cell(x)?;
        if list.is_nil() {
            self.attributes.remove(&x);
        } else {
            self.attributes.insert(x, list);
        }
        let class = self.class_symbol;
        let has_class = !self.get_attrib(x, class)?.is_nil();
        self.cell_mut(x)?.info.obj = has_class;
        Ok(())
    }

    /// Copies every attribute except `names`, `dim` and `dimnames` from
    /// `from` to `to`.
    pub fn copy_most_attrib(&mut self, from: Sexp, to: Sexp) -> Result<(), RError> {
        if to.is_nil() {
            return Err(RError::invalid("attempt to set an attribute on NULL"));
        }
        let skip = [
            self.install("names")?,
            self.install("dim")?,
            self.install("dimnames")?,
        ];
        let mut pairs = Vec::new();
        let mut p = self.attributes(from);
        while !p.is_nil() {
            let tag = self.tag(p)?;
            if !skip.contains(&tag) {
                pairs.push((tag, self.car(p)?));
            }
            p = self.cdr(p)?;
        }
        for (tag, value) in pairs {
            self.set_attrib(to, tag, value)?;
        }
        let obj = self.is_object(from);
        self.cell_mut(to)?.info.obj = obj;
        Ok(())
    }

    /// Copies `x` so that mutating the copy cannot affect the original.
    ///
    /// Vectors and pair lists are copied element by element, recursively for
    /// list elements. Symbols, environments, closures, promises and
    /// primitives are returned as they are. Attributes are copied with the
    /// object and the copy starts unshared.
    pub fn duplicate(&mut self, x: Sexp) -> Result<Sexp, RError> {
        let ty = self.type_of(x);
        let _x = self.protect(x)?;
        let dup = match ty {
            SexpType::Nil
            | SexpType::Symbol
            | SexpType::Env
            | SexpType::Promise
            | SexpType::Closure
            | SexpType::Special
            | SexpType::Builtin
            | SexpType::Any => return Ok(x),
            SexpType::List | SexpType::Lang | SexpType::Dots => self.duplicate_list(x, ty)?,
            SexpType::Generic | SexpType::Expression => {
                let n = self.length(x);
                let v = self.alloc_vector(ty, n)?;
                let _v = self.protect(v)?;
                for i in 0..n {
                    let elt = self.vector_elt(x, i)?;
                    let copy = self.duplicate(elt)?;
                    self.set_vector_elt(v, i, copy)?;
                }
                v
            }
            _ => {
                let n = self.length(x);
                let v = self.alloc_vector(ty, n)?;
                let data = self.payload(x)?.1.prefix(n);
                *self.payload_mut(v)?.1 = data;
                v
            }
        };
        let _dup = self.protect(dup)?;
        self.duplicate_attrib(x, dup)?;
        Ok(dup)
    }

    fn duplicate_attrib(&mut self, from: Sexp, to: Sexp) -> Result<(), RError> {
        let attrs = self.attributes(from);
        if !attrs.is_nil() {
            let copy = self.duplicate(attrs)?;
            self.set_attributes(to, copy)?;
        }
        Ok(())
    }

    fn duplicate_list(&mut self, x: Sexp, ty: SexpType) -> Result<Sexp, RError> {
        let n = self.length(x);
        let head = self.alloc_list(n)?;
        let _head = self.protect(head)?;
        let mut src = x;
        let mut dst = head;
        while self.is_pairlist_node(src) && !dst.is_nil() {
            let car = self.car(src)?;
            let copy = self.duplicate(car)?;
            self.set_car(dst, copy)?;
            let tag = self.tag(src)?;
            self.set_tag(dst, tag)?;
            if src != x {
                self.duplicate_attrib(src, dst)?;
            }
            src = self.cdr(src)?;
            dst = self.cdr(dst)?;
        }
        if ty != SexpType::List && !head.is_nil() {
            self.set_type(head, ty)?;
        }
        Ok(head)
    }
}
