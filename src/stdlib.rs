// SPDX: CC0-1.0

//! The closed set of names an expression may refer to. Nothing outside this
//! table is ever resolved, called, or evaluated.

use crate::{AngleMode, Number};
use core::f64::consts;
use std::{collections::HashMap, sync::OnceLock};

pub const X: &str = "x";

/// In degrees.
pub const TRIG_EPSILON: Number = 1e-10;

// 171! overflows
pub const FACTORIAL_MAX: Number = 170.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DomainResult {
    Ok(Number),
    Undefined,
    OutOfDomain,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Angle {
    pub degrees: Number,
    pub radians: Number,
}

impl Angle {
    pub fn new(value: Number, mode: AngleMode) -> Self {
        match mode {
            AngleMode::Degrees => Self {
                degrees: value,
                radians: value.to_radians(),
            },
            AngleMode::Radians => Self {
                degrees: value.to_degrees(),
                radians: value,
            },
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum FunKind {
    Plain(fn(&[Number]) -> DomainResult),
    Angle(fn(Angle) -> DomainResult),
}

#[derive(Clone, Copy, Debug)]
pub struct Fun {
    pub arity: usize,
    pub kind: FunKind,
}

impl Fun {
    pub const fn new(arity: usize, fun: fn(&[Number]) -> DomainResult) -> Self {
        Self {
            arity,
            kind: FunKind::Plain(fun),
        }
    }

    pub const fn angle(fun: fn(Angle) -> DomainResult) -> Self {
        Self {
            arity: 1,
            kind: FunKind::Angle(fun),
        }
    }

    pub fn call(&self, args: &[Number], mode: AngleMode) -> DomainResult {
        match self.kind {
            FunKind::Plain(fun) => fun(args),
            FunKind::Angle(fun) => match *args {
                [val] => fun(Angle::new(val, mode)),
                _ => DomainResult::OutOfDomain,
            },
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Ident {
    Const(Number),
    Fun(Fun),
}

impl Ident {
    /// Constants behave like zero-argument functions.
    pub const fn arity(&self) -> usize {
        match self {
            Self::Const(_) => 0,
            Self::Fun(fun) => fun.arity,
        }
    }

    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Const(_) => "constant",
            Self::Fun(_) => "function",
        }
    }
}

#[derive(Debug)]
pub struct Registry {
    idents: HashMap<&'static str, Ident>,
}

impl Registry {
    fn insert(&mut self, name: &'static str, ident: Ident) {
        let old = self.idents.insert(name, ident);
        assert!(old.is_none(), "'{name}' registered twice");
    }

    pub fn get(&self, name: &str) -> Option<(&'static str, &Ident)> {
        self.idents.get_key_value(name).map(|(k, v)| (*k, v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Ident)> + '_ {
        self.idents.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.idents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idents.is_empty()
    }
}

pub fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(standard_idents)
}

pub fn standard_idents() -> Registry {
    let mut ret = Registry {
        idents: HashMap::new(),
    };

    ret.insert("abs", Ident::Fun(Fun::new(1, abs)));
    ret.insert("log", Ident::Fun(Fun::new(1, log)));
    ret.insert("ln", Ident::Fun(Fun::new(1, ln)));
    ret.insert("exp", Ident::Fun(Fun::new(1, exp)));
    ret.insert("sqrt", Ident::Fun(Fun::new(1, sqrt)));
    ret.insert("factorial", Ident::Fun(Fun::new(1, factorial)));

    // trig
    ret.insert("sin", Ident::Fun(Fun::angle(sin)));
    ret.insert("cos", Ident::Fun(Fun::angle(cos)));
    ret.insert("tan", Ident::Fun(Fun::angle(tan)));
    ret.insert("cot", Ident::Fun(Fun::angle(cot)));

    ret.insert("pi", Ident::Const(consts::PI));
    ret.insert("e", Ident::Const(consts::E));
    ret
}

fn unary<F>(args: &[Number], fun: F) -> DomainResult
where
    F: FnOnce(Number) -> DomainResult,
{
    match *args {
        [x] => fun(x),
        _ => DomainResult::OutOfDomain,
    }
}

pub fn abs(args: &[Number]) -> DomainResult {
    unary(args, |x| DomainResult::Ok(x.abs()))
}

pub fn log(args: &[Number]) -> DomainResult {
    unary(args, |x| {
        if x > 0.0 {
            DomainResult::Ok(x.log10())
        } else {
            DomainResult::OutOfDomain
        }
    })
}

pub fn ln(args: &[Number]) -> DomainResult {
    unary(args, |x| {
        if x > 0.0 {
            DomainResult::Ok(x.ln())
        } else {
            DomainResult::OutOfDomain
        }
    })
}

pub fn exp(args: &[Number]) -> DomainResult {
    unary(args, |x| DomainResult::Ok(x.exp()))
}

pub fn sqrt(args: &[Number]) -> DomainResult {
    unary(args, |x| {
        if x >= 0.0 {
            DomainResult::Ok(x.sqrt())
        } else {
            DomainResult::OutOfDomain
        }
    })
}

pub fn factorial(args: &[Number]) -> DomainResult {
    unary(args, |x| {
        if !(0.0..=FACTORIAL_MAX).contains(&x) || x.fract() != 0.0 {
            return DomainResult::OutOfDomain;
        }
        let mut acc: Number = 1.0;
        let mut k: Number = 2.0;
        while k <= x {
            acc *= k;
            k += 1.0;
        }
        DomainResult::Ok(acc)
    })
}

fn near(val: Number, target: Number) -> bool {
    (val - target).abs() < TRIG_EPSILON
}

pub fn sin(a: Angle) -> DomainResult {
    DomainResult::Ok(a.radians.sin())
}

pub fn cos(a: Angle) -> DomainResult {
    DomainResult::Ok(a.radians.cos())
}

pub fn tan(a: Angle) -> DomainResult {
    if near(a.degrees.rem_euclid(180.0), 90.0) {
        DomainResult::Undefined
    } else {
        DomainResult::Ok(a.radians.tan())
    }
}

pub fn cot(a: Angle) -> DomainResult {
    let r = a.degrees.rem_euclid(180.0);
    if near(r, 0.0) || near(r, 180.0) {
        DomainResult::Undefined
    } else {
        DomainResult::Ok(1.0 / a.radians.tan())
    }
}
