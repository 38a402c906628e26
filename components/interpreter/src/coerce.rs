//! Conversions between vector types.

use crate::runtime::Interpreter;
use core_types::{Complex, RError, Sexp, SexpType, NA_INTEGER, NA_LOGICAL, NA_REAL};

/// Position of an atomic or list type in the coercion order, or `None`.
pub(crate) fn type_rank(ty: SexpType) -> Option<u8> {
    match ty {
        SexpType::Nil => Some(0),
        SexpType::Logical => Some(1),
        SexpType::Integer => Some(2),
        SexpType::Real => Some(3),
        SexpType::Complex => Some(4),
        SexpType::Str => Some(5),
        SexpType::Generic | SexpType::List => Some(6),
        SexpType::Expression => Some(7),
        _ => None,
    }
}

/// True for the atomic vector types.
pub(crate) fn is_atomic(ty: SexpType) -> bool {
    matches!(
        ty,
        SexpType::Logical | SexpType::Integer | SexpType::Real | SexpType::Complex | SexpType::Str
    )
}

/// Formats a real the way it prints at toplevel.
pub(crate) fn format_real(v: f64) -> Option<String> {
    if v.is_nan() {
        None
    } else if v.is_infinite() {
        Some(if v > 0.0 { "Inf" } else { "-Inf" }.to_string())
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        Some(format!("{}", v as i64))
    } else {
        Some(format!("{}", v))
    }
}

fn real_to_int(v: f64) -> i32 {
    if v.is_nan() || v >= 2_147_483_648.0 || v <= -2_147_483_649.0 {
        NA_INTEGER
    } else {
        v.trunc() as i32
    }
}

fn parse_logical(s: &str) -> i32 {
    match s {
        "TRUE" | "true" | "T" | "True" => 1,
        "FALSE" | "false" | "F" | "False" => 0,
        _ => NA_LOGICAL,
    }
}

impl Interpreter {
    /// Elements of `x` as strings; `None` is NA.
    pub(crate) fn strings_of(&self, x: Sexp) -> Result<Vec<Option<String>>, RError> {
        let heap = &self.heap;
        Ok(match heap.type_of(x) {
            SexpType::Nil => Vec::new(),
            SexpType::Logical => heap
                .logical(x)?
                .iter()
                .map(|&v| match v {
                    NA_LOGICAL => None,
                    0 => Some("FALSE".to_string()),
                    _ => Some("TRUE".to_string()),
                })
                .collect(),
            SexpType::Integer => heap
                .integer(x)?
                .iter()
                .map(|&v| (v != NA_INTEGER).then(|| v.to_string()))
                .collect(),
            SexpType::Real => heap.real(x)?.iter().map(|&v| format_real(v)).collect(),
            SexpType::Complex => heap
                .complex(x)?
                .iter()
                .map(|c| {
                    let (r, i) = (format_real(c.r)?, format_real(c.i.abs())?);
                    Some(format!("{}{}{}i", r, if c.i < 0.0 { "-" } else { "+" }, i))
                })
                .collect(),
            SexpType::Str => {
                let na = heap.na_string();
                let mut out = Vec::new();
                for &c in heap.refs(x)? {
                    out.push(if c == na {
                        None
                    } else {
                        Some(heap.char_str(c)?.to_string())
                    });
                }
                out
            }
            SexpType::Symbol => vec![Some(heap.symbol_name(x)?.to_string())],
            ty => return Err(cannot_coerce(ty, SexpType::Str)),
        })
    }

    /// Elements of `x` as reals.
    pub(crate) fn reals_of(&self, x: Sexp) -> Result<Vec<f64>, RError> {
        let heap = &self.heap;
        let int = |v: i32| if v == NA_INTEGER { NA_REAL } else { f64::from(v) };
        Ok(match heap.type_of(x) {
            SexpType::Nil => Vec::new(),
            SexpType::Logical => heap.logical(x)?.iter().map(|&v| int(v)).collect(),
            SexpType::Integer => heap.integer(x)?.iter().map(|&v| int(v)).collect(),
            SexpType::Real => heap.real(x)?.to_vec(),
            SexpType::Complex => heap.complex(x)?.iter().map(|c| c.r).collect(),
            SexpType::Str => self
                .strings_of(x)?
                .into_iter()
                .map(|s| s.and_then(|s| s.trim().parse::<f64>().ok()).unwrap_or(NA_REAL))
                .collect(),
            ty => return Err(cannot_coerce(ty, SexpType::Real)),
        })
    }

    /// Elements of `x` as integers.
    pub(crate) fn integers_of(&self, x: Sexp) -> Result<Vec<i32>, RError> {
        let heap = &self.heap;
        Ok(match heap.type_of(x) {
            SexpType::Nil => Vec::new(),
            SexpType::Logical => heap.logical(x)?.to_vec(),
            SexpType::Integer => heap.integer(x)?.to_vec(),
            _ => self.reals_of(x)?.into_iter().map(real_to_int).collect(),
        })
    }

    /// Elements of `x` as logicals.
    pub(crate) fn logicals_of(&self, x: Sexp) -> Result<Vec<i32>, RError> {
        let heap = &self.heap;
        let int = |v: i32| if v == NA_INTEGER { NA_LOGICAL } else { i32::from(v != 0) };
        let real = |v: f64| if v.is_nan() { NA_LOGICAL } else { i32::from(v != 0.0) };
        Ok(match heap.type_of(x) {
            SexpType::Nil => Vec::new(),
            SexpType::Logical => heap.logical(x)?.to_vec(),
            SexpType::Integer => heap.integer(x)?.iter().map(|&v| int(v)).collect(),
            SexpType::Real => heap.real(x)?.iter().map(|&v| real(v)).collect(),
            SexpType::Complex => heap
                .complex(x)?
                .iter()
                .map(|c| {
                    if c.r.is_nan() || c.i.is_nan() {
                        NA_LOGICAL
                    } else {
                        i32::from(c.r != 0.0 || c.i != 0.0)
                    }
                })
                .collect(),
            SexpType::Str => self
                .strings_of(x)?
                .into_iter()
                .map(|s| s.map_or(NA_LOGICAL, |s| parse_logical(&s)))
                .collect(),
            ty => return Err(cannot_coerce(ty, SexpType::Logical)),
        })
    }

    /// Elements of `x` as complex numbers.
    pub(crate) fn complexes_of(&self, x: Sexp) -> Result<Vec<Complex>, RError> {
        if self.heap.type_of(x) == SexpType::Complex {
            return Ok(self.heap.complex(x)?.to_vec());
        }
        Ok(self
            .reals_of(x)?
            .into_iter()
            .map(|r| Complex::new(r, if r.is_nan() { NA_REAL } else { 0.0 }))
            .collect())
    }

    /// Truth value of the first element of `x`; `None` for NA.
    pub fn as_logical_scalar(&self, x: Sexp) -> Result<Option<bool>, RError> {
        let ty = self.heap.type_of(x);
        if ty == SexpType::Nil {
            return Err(RError::invalid("argument is of length zero"));
        }
        if !is_atomic(ty) {
            return Err(RError::invalid("argument is not interpretable as logical"));
        }
        match self.logicals_of(x)?.first() {
            None => Err(RError::invalid("argument is of length zero")),
            Some(&NA_LOGICAL) => Ok(None),
            Some(&v) => Ok(Some(v != 0)),
        }
    }

    /// Truth value of a condition; NA is an error.
    pub(crate) fn as_condition(&self, x: Sexp) -> Result<bool, RError> {
        self.as_logical_scalar(x)?
            .ok_or_else(|| RError::invalid("missing value where TRUE/FALSE needed"))
    }

    /// Builds a string vector from `items`.
    pub(crate) fn mk_strings(&mut self, items: &[Option<String>]) -> Result<Sexp, RError> {
        let out = self.heap.alloc_vector(SexpType::Str, items.len())?;
        let _out = self.heap.protect(out)?;
        for (i, item) in items.iter().enumerate() {
            let c = match item {
                Some(s) => self.heap.mk_char(s)?,
                None => self.heap.na_string(),
            };
            self.heap.set_string_elt(out, i, c)?;
        }
        Ok(out)
    }

    /// Fills elements `[from, len)` of vector `x` with NA (nil for lists).
    pub(crate) fn fill_na(&mut self, x: Sexp, from: usize) -> Result<(), RError> {
        match self.heap.type_of(x) {
            SexpType::Logical => self.heap.logical_mut(x)?[from..].fill(NA_LOGICAL),
            SexpType::Integer => self.heap.integer_mut(x)?[from..].fill(NA_INTEGER),
            SexpType::Real => self.heap.real_mut(x)?[from..].fill(NA_REAL),
            SexpType::Complex => self.heap.complex_mut(x)?[from..].fill(Complex::new(NA_REAL, NA_REAL)),
            SexpType::Str => {
                let na = self.heap.na_string();
                for i in from..self.heap.length(x) {
                    self.heap.set_string_elt(x, i, na)?;
                }
            }
            SexpType::Generic | SexpType::Expression => {
                for i in from..self.heap.length(x) {
                    self.heap.set_vector_elt(x, i, Sexp::NIL)?;
                }
            }
            ty => return Err(cannot_coerce(ty, ty)),
        }
        Ok(())
    }

    /// Copies the elements of `src` into `dst` starting at `at`. Both must
    /// have the same type.
    pub(crate) fn copy_elements(&mut self, dst: Sexp, at: usize, src: Sexp) -> Result<(), RError> {
        let n = self.heap.length(src);
        match self.heap.type_of(src) {
            SexpType::Logical => {
                let v = self.heap.logical(src)?.to_vec();
                self.heap.logical_mut(dst)?[at..at + n].copy_from_slice(&v);
            }
            SexpType::Integer => {
                let v = self.heap.integer(src)?.to_vec();
                self.heap.integer_mut(dst)?[at..at + n].copy_from_slice(&v);
            }
            SexpType::Real => {
                let v = self.heap.real(src)?.to_vec();
                self.heap.real_mut(dst)?[at..at + n].copy_from_slice(&v);
            }
            SexpType::Complex => {
                let v = self.heap.complex(src)?.to_vec();
                self.heap.complex_mut(dst)?[at..at + n].copy_from_slice(&v);
            }
            SexpType::Str => {
                let v = self.heap.refs(src)?.to_vec();
                for (k, c) in v.into_iter().enumerate() {
                    self.heap.set_string_elt(dst, at + k, c)?;
                }
            }
            SexpType::Generic | SexpType::Expression => {
                let v = self.heap.refs(src)?.to_vec();
                for (k, c) in v.into_iter().enumerate() {
                    self.heap.set_vector_elt(dst, at + k, c)?;
                }
            }
            SexpType::Nil => {}
            ty => return Err(cannot_coerce(ty, self.heap.type_of(dst))),
        }
        Ok(())
    }

    /// `x` converted to type `ty`; `x` itself when it already has that type.
    /// Attributes other than names, dim and dimnames are not carried over.
    pub fn coerce_vector(&mut self, x: Sexp, ty: SexpType) -> Result<Sexp, RError> {
        let from = self.heap.type_of(x);
        if from == ty {
            return Ok(x);
        }
        let out = match ty {
            SexpType::Logical => {
                let v = self.logicals_of(x)?;
                let out = self.heap.alloc_vector(ty, v.len())?;
                self.heap.logical_mut(out)?.copy_from_slice(&v);
                out
            }
            SexpType::Integer => {
                let v = self.integers_of(x)?;
                let out = self.heap.alloc_vector(ty, v.len())?;
                self.heap.integer_mut(out)?.copy_from_slice(&v);
                out
            }
            SexpType::Real => {
                let v = self.reals_of(x)?;
                let out = self.heap.alloc_vector(ty, v.len())?;
                self.heap.real_mut(out)?.copy_from_slice(&v);
                out
            }
            SexpType::Complex => {
                let v = self.complexes_of(x)?;
                let out = self.heap.alloc_vector(ty, v.len())?;
                self.heap.complex_mut(out)?.copy_from_slice(&v);
                out
            }
            SexpType::Str => {
                let v = self.strings_of(x)?;
                self.mk_strings(&v)?
            }
            SexpType::Generic | SexpType::Expression => self.as_list_vector(x, ty)?,
            _ => return Err(cannot_coerce(from, ty)),
        };
        if from != SexpType::Nil && !self.heap.attributes(x).is_nil() {
            let _out = self.heap.protect(out)?;
            let names = self.heap.get_attrib(x, self.syms.names)?;
            self.heap.set_attrib(out, self.syms.names, names)?;
        }
        Ok(out)
    }

    fn as_list_vector(&mut self, x: Sexp, ty: SexpType) -> Result<Sexp, RError> {
        let from = self.heap.type_of(x);
        let n = match from {
            SexpType::Nil => 0,
            t if is_atomic(t) || t.is_pairlist() || t == SexpType::Generic || t == SexpType::Expression => {
                self.heap.length(x)
            }
            _ => 1,
        };
        let out = self.heap.alloc_vector(ty, n)?;
        let _out = self.heap.protect(out)?;
        for i in 0..n {
            let elt = if is_atomic(from) || from.is_pairlist() || from == SexpType::Generic || from == SexpType::Expression {
                self.element(x, i)?
            } else {
                x
            };
            self.heap.set_vector_elt(out, i, elt)?;
        }
        Ok(out)
    }

    /// Element `i` of `x`: a length-one vector for atomic types, the element
    /// itself for lists and pair lists.
    pub(crate) fn element(&mut self, x: Sexp, i: usize) -> Result<Sexp, RError> {
        let heap = &mut self.heap;
        match heap.type_of(x) {
            SexpType::Logical => {
                let v = heap.logical(x)?[i];
                heap.scalar_logical(v)
            }
            SexpType::Integer => {
                let v = heap.integer(x)?[i];
                heap.scalar_integer(v)
            }
            SexpType::Real => {
                let v = heap.real(x)?[i];
                heap.scalar_real(v)
            }
            SexpType::Complex => {
                let v = heap.complex(x)?[i];
                heap.scalar_complex(v)
            }
            SexpType::Str => {
                let c = heap.string_elt(x, i)?;
                let s = heap.alloc_vector(SexpType::Str, 1)?;
                heap.set_string_elt(s, 0, c)?;
                Ok(s)
            }
            ty if ty.is_pairlist() => {
                let cell = heap.nthcdr(x, i)?;
                heap.car(cell)
            }
            _ => heap.vector_elt(x, i),
        }
    }
}

fn cannot_coerce(from: SexpType, to: SexpType) -> RError {
    RError::invalid(format!(
        "cannot coerce type '{}' to vector of type '{}'",
        from, to
    ))
}
