//! Minimal polynomial expression trees.
//!
//! The algebra layer that derives the target polynomial lives outside this
//! pipeline; all we require of it is something we can flatten into
//! (monomial, coefficient) pairs. `Expr` is that adapter boundary: a small
//! owned tree with the operations a polynomial can contain, plus an opaque
//! function node so non-polynomial inputs are representable (and rejected
//! by the encoder).

use std::ops;

/// Expression tree over variables `x0..x{nvars-1}`.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Num(f64),
    /// Variable by index.
    Var(usize),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    /// Integer power of a subexpression.
    Pow(Box<Expr>, i64),
    /// Opaque non-polynomial function application (sin, exp, ...).
    Func(&'static str, Box<Expr>),
}

impl Expr {
    pub fn num(c: f64) -> Self {
        Expr::Num(c)
    }

    pub fn var(i: usize) -> Self {
        Expr::Var(i)
    }

    pub fn pow(self, e: i64) -> Self {
        Expr::Pow(Box::new(self), e)
    }

    pub fn func(name: &'static str, arg: Expr) -> Self {
        Expr::Func(name, Box::new(arg))
    }
}

impl ops::Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        Expr::Add(Box::new(self), Box::new(rhs))
    }
}

impl ops::Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        Expr::Sub(Box::new(self), Box::new(rhs))
    }
}

impl ops::Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        Expr::Mul(Box::new(self), Box::new(rhs))
    }
}

impl ops::Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        Expr::Div(Box::new(self), Box::new(rhs))
    }
}

impl ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}
