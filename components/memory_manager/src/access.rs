//! Typed accessors.
//!
//! Every accessor checks the tag of its argument and reports
//! [`RError::TypeMismatch`] on the wrong one. The pair-list readers treat nil
//! as a list whose car, cdr and tag are all nil.

use crate::heap::Heap;
use crate::object::{Cell, ListCell, SexpRec, VecHeader};
use crate::vector_heap::VectorData;
use core_types::{Complex, RError, Sexp, SexpType, SxpInfo};

fn mismatch(expected: &'static str, found: SexpType) -> RError {
    RError::TypeMismatch { expected, found }
}

fn stale(x: Sexp) -> RError {
    RError::invalid(format!("reference to a freed object {:?}", x))
}

fn out_of_bounds() -> RError {
    RError::invalid("subscript out of bounds")
}

macro_rules! typed_slice {
    ($get:ident, $get_mut:ident, $variant:ident, $elt:ty, $name:literal) => {
        #[doc = concat!("Elements of a ", $name, " vector.")]
        pub fn $get(&self, x: Sexp) -> Result<&[$elt], RError> {
            let ty = self.type_of(x);
            match self.payload(x)? {
                (n, VectorData::$variant(v)) => Ok(&v[..n.min(v.len())]),
                _ => Err(mismatch($name, ty)),
            }
        }

        #[doc = concat!("Mutable elements of a ", $name, " vector.")]
        pub fn $get_mut(&mut self, x: Sexp) -> Result<&mut [$elt], RError> {
            let ty = self.type_of(x);
            match self.payload_mut(x)? {
                (n, VectorData::$variant(v)) => {
                    let n = n.min(v.len());
                    Ok(&mut v[..n])
                }
                _ => Err(mismatch($name, ty)),
            }
        }
    };
}

impl Heap {
    pub(crate) fn cell(&self, x: Sexp) -> Result<&Cell, RError> {
        self.nodes.get(x).ok_or_else(|| stale(x))
    }

    pub(crate) fn cell_mut(&mut self, x: Sexp) -> Result<&mut Cell, RError> {
        self.nodes.get_mut(x).ok_or_else(|| stale(x))
    }

    /// Type tag of `x`. Freed handles report `Nil`.
    pub fn type_of(&self, x: Sexp) -> SexpType {
        self.nodes
            .get(x)
            .map_or(SexpType::Nil, |cell| cell.rec.sexp_type())
    }

    // ---- flags ----

    /// Flag record of `x`.
    pub fn info(&self, x: Sexp) -> Result<SxpInfo, RError> {
        Ok(self.cell(x)?.info)
    }

    /// Mutable flag record of `x`.
    pub fn info_mut(&mut self, x: Sexp) -> Result<&mut SxpInfo, RError> {
        Ok(&mut self.cell_mut(x)?.info)
    }

    /// Sharing indicator of `x`.
    pub fn named(&self, x: Sexp) -> u8 {
        self.nodes.get(x).map_or(0, |cell| cell.info.named)
    }

    /// Sets the sharing indicator, saturating at 2.
    pub fn set_named(&mut self, x: Sexp, named: u8) {
        if let Some(cell) = self.nodes.get_mut(x) {
            cell.info.set_named(named);
        }
    }

    /// General-purpose flag field of `x`.
    pub fn gp(&self, x: Sexp) -> u16 {
        self.nodes.get(x).map_or(0, |cell| cell.info.gp)
    }

    /// Sets the general-purpose flag field.
    pub fn set_gp(&mut self, x: Sexp, gp: u16) -> Result<(), RError> {
        self.cell_mut(x)?.info.gp = gp;
        Ok(())
    }

    /// True when `x` carries a class attribute.
    pub fn is_object(&self, x: Sexp) -> bool {
        self.nodes.get(x).map_or(false, |cell| cell.info.obj)
    }

    /// Sets the debug bit.
    pub fn set_debug(&mut self, x: Sexp, on: bool) -> Result<(), RError> {
        self.cell_mut(x)?.info.debug = on;
        Ok(())
    }

    /// Sets the trace bit.
    pub fn set_trace(&mut self, x: Sexp, on: bool) -> Result<(), RError> {
        self.cell_mut(x)?.info.trace = on;
        Ok(())
    }

    // ---- pair lists ----

    fn list_cell(&self, x: Sexp) -> Result<Option<ListCell>, RError> {
        if x.is_nil() {
            return Ok(None);
        }
        let rec = &self.cell(x)?.rec;
        rec.list_cell()
            .copied()
            .map(Some)
            .ok_or_else(|| mismatch("pairlist", rec.sexp_type()))
    }

    fn list_cell_mut(&mut self, x: Sexp) -> Result<&mut ListCell, RError> {
        if x.is_nil() {
            return Err(RError::invalid("bad value"));
        }
        let rec = &mut self.cell_mut(x)?.rec;
        let ty = rec.sexp_type();
        rec.list_cell_mut().ok_or_else(|| mismatch("pairlist", ty))
    }

    /// True for list, call and dots nodes.
    pub fn is_pairlist_node(&self, x: Sexp) -> bool {
        self.nodes
            .get(x)
            .map_or(false, |cell| cell.rec.list_cell().is_some())
    }

    /// Value of a list node.
    pub fn car(&self, x: Sexp) -> Result<Sexp, RError> {
        Ok(self.list_cell(x)?.map_or(Sexp::NIL, |c| c.car))
    }

    /// Next node of a list node.
    pub fn cdr(&self, x: Sexp) -> Result<Sexp, RError> {
        Ok(self.list_cell(x)?.map_or(Sexp::NIL, |c| c.cdr))
    }

    /// Name of a list node.
    pub fn tag(&self, x: Sexp) -> Result<Sexp, RError> {
        Ok(self.list_cell(x)?.map_or(Sexp::NIL, |c| c.tag))
    }

    /// `car(cdr(x))`
    pub fn cadr(&self, x: Sexp) -> Result<Sexp, RError> {
        self.car(self.cdr(x)?)
    }

    /// `cdr(cdr(x))`
    pub fn cddr(&self, x: Sexp) -> Result<Sexp, RError> {
        self.cdr(self.cdr(x)?)
    }

    /// `car(cdr(cdr(x)))`
    pub fn caddr(&self, x: Sexp) -> Result<Sexp, RError> {
        self.car(self.cddr(x)?)
    }

    /// `car(cdr(cdr(cdr(x))))`
    pub fn cadddr(&self, x: Sexp) -> Result<Sexp, RError> {
        self.car(self.cdr(self.cddr(x)?)?)
    }

    /// Sets the value of a list node.
    pub fn set_car(&mut self, x: Sexp, v: Sexp) -> Result<(), RError> {
        self.list_cell_mut(x)?.car = v;
        Ok(())
    }

    /// Sets the next node of a list node.
    pub fn set_cdr(&mut self, x: Sexp, v: Sexp) -> Result<(), RError> {
        self.list_cell_mut(x)?.cdr = v;
        Ok(())
    }

    /// Sets the name of a list node.
    pub fn set_tag(&mut self, x: Sexp, v: Sexp) -> Result<(), RError> {
        self.list_cell_mut(x)?.tag = v;
        Ok(())
    }

    /// The list after skipping `n` nodes.
    pub fn nthcdr(&self, mut x: Sexp, n: usize) -> Result<Sexp, RError> {
        for _ in 0..n {
            if x.is_nil() {
                return Err(RError::invalid("list too short"));
            }
            x = self.cdr(x)?;
        }
        Ok(x)
    }

    /// Values of a list, in order.
    pub fn list_to_vec(&self, mut x: Sexp) -> Result<Vec<Sexp>, RError> {
        let mut out = Vec::new();
        while let Some(cell) = self.list_cell(x)? {
            out.push(cell.car);
            x = cell.cdr;
        }
        Ok(out)
    }

    /// Switches a node among the list, call and dots tags.
    pub fn set_type(&mut self, x: Sexp, ty: SexpType) -> Result<(), RError> {
        let cell = self.cell_mut(x)?;
        let list = match cell.rec.list_cell() {
            Some(c) => *c,
            None => return Err(mismatch("pairlist", cell.rec.sexp_type())),
        };
        cell.rec = match ty {
            SexpType::List => SexpRec::List(list),
            SexpType::Lang => SexpRec::Lang(list),
            SexpType::Dots => SexpRec::Dots(list),
            other => return Err(mismatch("pairlist", other)),
        };
        Ok(())
    }

    /// Element count: list length, vector length, 1 for other objects.
    pub fn length(&self, x: Sexp) -> usize {
        let Some(cell) = self.nodes.get(x) else {
            return 0;
        };
        match &cell.rec {
            SexpRec::Nil => 0,
            SexpRec::List(_) | SexpRec::Lang(_) | SexpRec::Dots(_) => {
                let mut n = 0;
                let mut p = x;
                while let Some(c) = self.nodes.get(p).and_then(|c| c.rec.list_cell()) {
                    n += 1;
                    p = c.cdr;
                }
                n
            }
            SexpRec::Env(e) => self.length(e.frame),
            rec => rec.vec_header().map_or(1, |h| h.length),
        }
    }

    // ---- closures, environments, promises, symbols, primitives ----

    /// Formal parameters of a closure.
    pub fn formals(&self, x: Sexp) -> Result<Sexp, RError> {
        match &self.cell(x)?.rec {
            SexpRec::Closure(c) => Ok(c.formals),
            rec => Err(mismatch("closure", rec.sexp_type())),
        }
    }

    /// Body of a closure.
    pub fn body(&self, x: Sexp) -> Result<Sexp, RError> {
        match &self.cell(x)?.rec {
            SexpRec::Closure(c) => Ok(c.body),
            rec => Err(mismatch("closure", rec.sexp_type())),
        }
    }

    /// Defining environment of a closure.
    pub fn cloenv(&self, x: Sexp) -> Result<Sexp, RError> {
        match &self.cell(x)?.rec {
            SexpRec::Closure(c) => Ok(c.env),
            rec => Err(mismatch("closure", rec.sexp_type())),
        }
    }

    /// Replaces the defining environment of a closure.
    pub fn set_cloenv(&mut self, x: Sexp, env: Sexp) -> Result<(), RError> {
        match &mut self.cell_mut(x)?.rec {
            SexpRec::Closure(c) => {
                c.env = env;
                Ok(())
            }
            rec => Err(mismatch("closure", rec.sexp_type())),
        }
    }

    /// Bindings of an environment.
    pub fn frame(&self, x: Sexp) -> Result<Sexp, RError> {
        match &self.cell(x)?.rec {
            SexpRec::Env(e) => Ok(e.frame),
            rec => Err(mismatch("environment", rec.sexp_type())),
        }
    }

    /// Enclosing environment.
    pub fn enclos(&self, x: Sexp) -> Result<Sexp, RError> {
        match &self.cell(x)?.rec {
            SexpRec::Env(e) => Ok(e.enclos),
            rec => Err(mismatch("environment", rec.sexp_type())),
        }
    }

    /// Replaces the bindings of an environment.
    pub fn set_frame(&mut self, x: Sexp, frame: Sexp) -> Result<(), RError> {
        match &mut self.cell_mut(x)?.rec {
            SexpRec::Env(e) => {
                e.frame = frame;
                Ok(())
            }
            rec => Err(mismatch("environment", rec.sexp_type())),
        }
    }

    fn promise(&self, x: Sexp) -> Result<crate::object::PromiseCell, RError> {
        match &self.cell(x)?.rec {
            SexpRec::Promise(p) => Ok(*p),
            rec => Err(mismatch("promise", rec.sexp_type())),
        }
    }

    /// Cached value of a promise, `UNBOUND` while unforced.
    pub fn prvalue(&self, x: Sexp) -> Result<Sexp, RError> {
        Ok(self.promise(x)?.value)
    }

    /// Expression of a promise.
    pub fn prexpr(&self, x: Sexp) -> Result<Sexp, RError> {
        Ok(self.promise(x)?.expr)
    }

    /// Environment of a promise.
    pub fn prenv(&self, x: Sexp) -> Result<Sexp, RError> {
        Ok(self.promise(x)?.env)
    }

    /// Caches the forced value of a promise.
    pub fn set_prvalue(&mut self, x: Sexp, value: Sexp) -> Result<(), RError> {
        match &mut self.cell_mut(x)?.rec {
            SexpRec::Promise(p) => {
                p.value = value;
                Ok(())
            }
            rec => Err(mismatch("promise", rec.sexp_type())),
        }
    }

    /// True while a promise is being forced.
    pub fn prseen(&self, x: Sexp) -> bool {
        self.gp(x) != 0
    }

    /// Sets or clears the forcing marker of a promise.
    pub fn set_prseen(&mut self, x: Sexp, seen: bool) -> Result<(), RError> {
        self.set_gp(x, u16::from(seen))
    }

    fn symbol(&self, x: Sexp) -> Result<crate::object::SymbolCell, RError> {
        match &self.cell(x)?.rec {
            SexpRec::Symbol(s) => Ok(*s),
            rec => Err(mismatch("symbol", rec.sexp_type())),
        }
    }

    /// Print name of a symbol.
    pub fn printname(&self, x: Sexp) -> Result<Sexp, RError> {
        Ok(self.symbol(x)?.pname)
    }

    /// Global value slot of a symbol.
    pub fn symvalue(&self, x: Sexp) -> Result<Sexp, RError> {
        Ok(self.symbol(x)?.value)
    }

    /// Internal builtin of a symbol.
    pub fn internal(&self, x: Sexp) -> Result<Sexp, RError> {
        Ok(self.symbol(x)?.internal)
    }

    /// Sets the global value slot of a symbol.
    pub fn set_symvalue(&mut self, x: Sexp, value: Sexp) -> Result<(), RError> {
        match &mut self.cell_mut(x)?.rec {
            SexpRec::Symbol(s) => {
                s.value = value;
                Ok(())
            }
            rec => Err(mismatch("symbol", rec.sexp_type())),
        }
    }

    /// Sets the internal builtin of a symbol.
    pub fn set_internal(&mut self, x: Sexp, value: Sexp) -> Result<(), RError> {
        match &mut self.cell_mut(x)?.rec {
            SexpRec::Symbol(s) => {
                s.internal = value;
                Ok(())
            }
            rec => Err(mismatch("symbol", rec.sexp_type())),
        }
    }

    /// Name of a symbol as text.
    pub fn symbol_name(&self, x: Sexp) -> Result<&str, RError> {
        self.char_str(self.printname(x)?)
    }

    /// Function table offset of a special or builtin.
    pub fn prim_offset(&self, x: Sexp) -> Result<usize, RError> {
        match &self.cell(x)?.rec {
            SexpRec::Special(i) | SexpRec::Builtin(i) => Ok(*i),
            rec => Err(mismatch("primitive", rec.sexp_type())),
        }
    }

    // ---- vectors ----

    fn header(&self, x: Sexp) -> Result<VecHeader, RError> {
        let rec = &self.cell(x)?.rec;
        rec.vec_header()
            .copied()
            .ok_or_else(|| mismatch("vector", rec.sexp_type()))
    }

    pub(crate) fn payload(&self, x: Sexp) -> Result<(usize, &VectorData), RError> {
        let h = self.header(x)?;
        let data = self
            .vectors
            .get(h.block)
            .ok_or_else(|| RError::invalid("vector payload missing"))?;
        Ok((h.length, data))
    }

    pub(crate) fn payload_mut(&mut self, x: Sexp) -> Result<(usize, &mut VectorData), RError> {
        let h = self.header(x)?;
        let data = self
            .vectors
            .get_mut(h.block)
            .ok_or_else(|| RError::invalid("vector payload missing"))?;
        Ok((h.length, data))
    }

    typed_slice!(logical, logical_mut, Logical, i32, "logical");
    typed_slice!(integer, integer_mut, Integer, i32, "integer");
    typed_slice!(real, real_mut, Real, f64, "double");
    typed_slice!(complex, complex_mut, Complex, Complex, "complex");

    /// Allocated element count of a vector.
    pub fn truelength(&self, x: Sexp) -> Result<usize, RError> {
        Ok(self.header(x)?.truelength)
    }

    /// Bytes of a scalar string cell.
    pub fn char_bytes(&self, x: Sexp) -> Result<&[u8], RError> {
        match self.payload(x)? {
            (n, VectorData::Bytes(v)) => Ok(&v[..n.min(v.len())]),
            _ => Err(mismatch("CHARSXP", self.type_of(x))),
        }
    }

    pub(crate) fn char_bytes_mut(&mut self, x: Sexp) -> Result<&mut [u8], RError> {
        let ty = self.type_of(x);
        match self.payload_mut(x)? {
            (n, VectorData::Bytes(v)) => {
                let n = n.min(v.len());
                Ok(&mut v[..n])
            }
            _ => Err(mismatch("CHARSXP", ty)),
        }
    }

    /// Text of a scalar string cell.
    pub fn char_str(&self, x: Sexp) -> Result<&str, RError> {
        std::str::from_utf8(self.char_bytes(x)?)
            .map_err(|_| RError::invalid("string cell is not valid UTF-8"))
    }

    fn refs_of(&self, x: Sexp, ok: &[SexpType], expected: &'static str) -> Result<&[Sexp], RError> {
        let ty = self.type_of(x);
        if !ok.contains(&ty) {
            return Err(mismatch(expected, ty));
        }
        match self.payload(x)? {
            (n, VectorData::Refs(v)) => Ok(&v[..n.min(v.len())]),
            _ => Err(mismatch(expected, ty)),
        }
    }

    fn refs_of_mut(
        &mut self,
        x: Sexp,
        ok: &[SexpType],
        expected: &'static str,
    ) -> Result<&mut [Sexp], RError> {
        let ty = self.type_of(x);
        if !ok.contains(&ty) {
            return Err(mismatch(expected, ty));
        }
        match self.payload_mut(x)? {
            (n, VectorData::Refs(v)) => {
                let n = n.min(v.len());
                Ok(&mut v[..n])
            }
            _ => Err(mismatch(expected, ty)),
        }
    }

    /// Elements of a string, list or expression vector.
    pub fn refs(&self, x: Sexp) -> Result<&[Sexp], RError> {
        self.refs_of(
            x,
            &[SexpType::Str, SexpType::Generic, SexpType::Expression],
            "vector of references",
        )
    }

    /// Element `i` of a string vector.
    pub fn string_elt(&self, x: Sexp, i: usize) -> Result<Sexp, RError> {
        self.refs_of(x, &[SexpType::Str], "character")?
            .get(i)
            .copied()
            .ok_or_else(out_of_bounds)
    }

    /// Stores a string cell at element `i` of a string vector.
    pub fn set_string_elt(&mut self, x: Sexp, i: usize, v: Sexp) -> Result<(), RError> {
        let vt = self.type_of(v);
        if vt != SexpType::Char {
            return Err(mismatch("CHARSXP", vt));
        }
        let slot = self
            .refs_of_mut(x, &[SexpType::Str], "character")?
            .get_mut(i)
            .ok_or_else(out_of_bounds)?;
        *slot = v;
        Ok(())
    }

    /// Element `i` of a list or expression vector.
    pub fn vector_elt(&self, x: Sexp, i: usize) -> Result<Sexp, RError> {
        self.refs_of(x, &[SexpType::Generic, SexpType::Expression], "list")?
            .get(i)
            .copied()
            .ok_or_else(out_of_bounds)
    }

    /// Stores `v` at element `i` of a list or expression vector.
    pub fn set_vector_elt(&mut self, x: Sexp, i: usize, v: Sexp) -> Result<(), RError> {
        let slot = self
            .refs_of_mut(x, &[SexpType::Generic, SexpType::Expression], "list")?
            .get_mut(i)
            .ok_or_else(out_of_bounds)?;
        *slot = v;
        Ok(())
    }
}
