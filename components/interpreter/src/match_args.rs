//! Matching supplied arguments to formals.
//!
//! Three passes over the formals: exact tag matches, then partial tag
//! matches for formals before `...`, then positional filling of what is
//! left up to `...`. Arguments nothing claimed go to `...` when the closure
//! has it and are an error otherwise.

use crate::runtime::Interpreter;
use crate::transfer::EvalResult;
use core_types::{RError, Sexp, SexpType};

/// How an argument or formal got matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Used {
    No,
    Partial,
    Exact,
    Positional,
}

struct Formal {
    tag: Sexp,
    name: String,
    used: Used,
    value: Sexp,
}

struct Supplied {
    value: Sexp,
    tag: Sexp,
    name: Option<String>,
    used: Used,
}

/// Builds a pair list front to back while keeping it protected.
pub(crate) struct ListBuilder {
    head: memory_manager::Protected,
    tail: Sexp,
}

impl ListBuilder {
    pub(crate) fn new(interp: &Interpreter) -> Result<Self, RError> {
        Ok(ListBuilder {
            head: interp.heap.protect(Sexp::NIL)?,
            tail: Sexp::NIL,
        })
    }

    pub(crate) fn push(&mut self, interp: &mut Interpreter, value: Sexp, tag: Sexp) -> Result<(), RError> {
        let cell = interp.heap.cons(value, Sexp::NIL)?;
        interp.heap.set_tag(cell, tag)?;
        if self.tail.is_nil() {
            self.head.replace(cell);
        } else {
            interp.heap.set_cdr(self.tail, cell)?;
        }
        self.tail = cell;
        Ok(())
    }

    pub(crate) fn get(&self) -> Sexp {
        self.head.get()
    }
}

impl Interpreter {
    /// Matches `supplied` against `formals` and returns the actuals: one
    /// cell per formal, tagged with the formal's symbol, holding the
    /// matched value or the missing-argument marker.
    pub fn match_args(&mut self, formals: Sexp, supplied: Sexp) -> EvalResult<Sexp> {
        let dots_sym = self.syms.dots;
        let mut fs = Vec::new();
        for cell in self.cells(formals)? {
            let tag = self.heap.tag(cell)?;
            let name = if tag.is_nil() {
                String::new()
            } else {
                self.heap.symbol_name(tag)?.to_string()
            };
            fs.push(Formal {
                tag,
                name,
                used: Used::No,
                value: Sexp::MISSING_ARG,
            });
        }
        let mut args = Vec::new();
        for cell in self.cells(supplied)? {
            let tag = self.heap.tag(cell)?;
            let name = match self.heap.type_of(tag) {
                SexpType::Symbol => Some(self.heap.symbol_name(tag)?.to_string()),
                _ => None,
            };
            args.push(Supplied {
                value: self.heap.car(cell)?,
                tag,
                name: name.filter(|n| !n.is_empty()),
                used: Used::No,
            });
        }

        // exact
        for f in fs.iter_mut().filter(|f| f.tag != dots_sym) {
            for (j, a) in args.iter_mut().enumerate() {
                if a.name.as_deref() != Some(f.name.as_str()) {
                    continue;
                }
                if f.used == Used::Exact {
                    return Err(multiple_actuals(&f.name));
                }
                if a.used == Used::Exact {
                    return Err(multiple_formals(j + 1));
                }
                f.value = a.value;
                f.used = Used::Exact;
                a.used = Used::Exact;
            }
        }

        // partial, only for formals before `...`
        for f in fs.iter_mut() {
            if f.tag == dots_sym {
                break;
            }
            if f.used != Used::No {
                continue;
            }
            for (j, a) in args.iter_mut().enumerate() {
                let Some(name) = a.name.as_deref() else {
                    continue;
                };
                if a.used == Used::Exact || !f.name.starts_with(name) {
                    continue;
                }
                if f.used == Used::Partial {
                    return Err(multiple_actuals(&f.name));
                }
                if a.used == Used::Partial {
                    return Err(multiple_formals(j + 1));
                }
                f.value = a.value;
                f.used = Used::Partial;
                a.used = Used::Partial;
            }
        }

        // positional, up to `...`
        let mut next = 0;
        for f in fs.iter_mut() {
            if f.tag == dots_sym {
                break;
            }
            if f.used != Used::No {
                continue;
            }
            while next < args.len() && (args[next].name.is_some() || args[next].used != Used::No) {
                next += 1;
            }
            let Some(a) = args.get_mut(next) else {
                break;
            };
            f.value = a.value;
            f.used = Used::Positional;
            a.used = Used::Positional;
        }

        let leftovers: Vec<&Supplied> = args.iter().filter(|a| a.used == Used::No).collect();
        let mut dots = ListBuilder::new(self)?;
        if let Some(f) = fs.iter_mut().find(|f| f.tag == dots_sym) {
            for a in &leftovers {
                dots.push(self, a.value, a.tag)?;
            }
            if !dots.get().is_nil() {
                self.heap.set_type(dots.get(), SexpType::Dots)?;
                f.value = dots.get();
            }
        } else if !leftovers.is_empty() {
            let names: Vec<String> = args
                .iter()
                .enumerate()
                .filter(|(_, a)| a.used == Used::No)
                .map(|(j, a)| a.name.clone().unwrap_or_else(|| format!("argument {}", j + 1)))
                .collect();
            return Err(RError::ArgumentMatch(format!(
                "unused argument(s) ({})",
                names.join(", ")
            ))
            .into());
        }

        let mut actuals = ListBuilder::new(self)?;
        for f in &fs {
            actuals.push(self, f.value, f.tag)?;
        }
        Ok(actuals.get())
    }

    /// The cells of pair list `list`.
    pub(crate) fn cells(&self, mut list: Sexp) -> Result<Vec<Sexp>, RError> {
        let mut out = Vec::new();
        while !list.is_nil() {
            out.push(list);
            list = self.heap.cdr(list)?;
        }
        Ok(out)
    }
}

fn multiple_actuals(formal: &str) -> crate::Transfer {
    RError::ArgumentMatch(format!(
        "formal argument \"{}\" matched by multiple actual arguments",
        formal
    ))
    .into()
}

fn multiple_formals(position: usize) -> crate::Transfer {
    RError::ArgumentMatch(format!(
        "argument {} matches multiple formal arguments",
        position
    ))
    .into()
}
