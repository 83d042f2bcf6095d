//! Valores resueltos: lo que un step recibe como argumento.
//!
//! Tras el pase de construcción cada argumento es un `Bound`: un crudo, una
//! referencia, o una expresión inline cuyas hojas son crudos y referencias.
//! Los agregados puramente crudos se normalizan a `Raw` para que el
//! direccionamiento por contenido sea estable.

use indexmap::IndexMap;

use crate::algebra::ops::{BinaryOp, UnaryOp};
use crate::model::raw::{Raw, RawValue};
use crate::model::reference::Reference;
use crate::model::types::ValueType;
use crate::model::workflow::Workflow;

#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Raw(Raw),
    Reference(Reference),
    List(Vec<Bound>),
    Map(IndexMap<String, Bound>),
    Binary { op: BinaryOp, left: Box<Bound>, right: Box<Bound> },
    Unary { op: UnaryOp, operand: Box<Bound> },
}

impl Bound {
    /// Normaliza agregados y pliega aritmética sobre crudos, de modo que
    /// dos formas de escribir el mismo valor compartan representación.
    pub(crate) fn normalized(self) -> Bound {
        match self {
            Bound::List(items) => {
                let items: Vec<Bound> = items.into_iter().map(Bound::normalized).collect();
                if items.iter().all(|b| matches!(b, Bound::Raw(_))) {
                    let raws: Vec<RawValue> = items
                        .into_iter()
                        .map(|b| match b {
                            Bound::Raw(raw) => raw.value().clone(),
                            _ => unreachable!("filtered above"),
                        })
                        .collect();
                    Bound::Raw(Raw::new(RawValue::List(raws)))
                } else {
                    Bound::List(items)
                }
            }
            Bound::Map(entries) => {
                let entries: IndexMap<String, Bound> =
                    entries.into_iter().map(|(k, v)| (k, v.normalized())).collect();
                if entries.values().all(|b| matches!(b, Bound::Raw(_))) {
                    let raws = entries
                        .into_iter()
                        .map(|(k, b)| match b {
                            Bound::Raw(raw) => (k, raw.value().clone()),
                            _ => unreachable!("filtered above"),
                        })
                        .collect();
                    Bound::Raw(Raw::new(RawValue::Map(raws)))
                } else {
                    Bound::Map(entries)
                }
            }
            Bound::Binary { op, left, right } => {
                let left = left.normalized();
                let right = right.normalized();
                if let (Bound::Raw(l), Bound::Raw(r)) = (&left, &right) {
                    if let Some(folded) = fold_arithmetic(op, l.value(), r.value()) {
                        return Bound::Raw(Raw::new(folded));
                    }
                }
                Bound::Binary { op, left: Box::new(left), right: Box::new(right) }
            }
            Bound::Unary { op, operand } => {
                let operand = operand.normalized();
                if let Bound::Raw(raw) = &operand {
                    match (op, raw.value()) {
                        (UnaryOp::Neg, RawValue::Int(i)) => {
                            return Bound::Raw(Raw::new(RawValue::Int(-i)));
                        }
                        (UnaryOp::Neg, RawValue::Float(f)) => {
                            return Bound::Raw(Raw::new(RawValue::Float(-f)));
                        }
                        _ => {}
                    }
                }
                Bound::Unary { op, operand: Box::new(operand) }
            }
            other => other,
        }
    }

    /// Representación estable para el hash de identidad del step.
    pub fn canonical_repr(&self) -> String {
        match self {
            Bound::Raw(raw) => raw.canonical_repr(),
            Bound::Reference(r) => r.canonical_repr(),
            Bound::List(items) => {
                let inner: Vec<String> = items.iter().map(Bound::canonical_repr).collect();
                format!("[{}]", inner.join(","))
            }
            Bound::Map(entries) => {
                let mut pairs: Vec<(String, String)> = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.canonical_repr()))
                    .collect();
                pairs.sort();
                let inner: Vec<String> =
                    pairs.into_iter().map(|(k, v)| format!("{k}:{v}")).collect();
                format!("{{{}}}", inner.join(","))
            }
            Bound::Binary { op, left, right } => format!(
                "({} {} {})",
                left.canonical_repr(),
                op.symbol(),
                right.canonical_repr()
            ),
            Bound::Unary { op, operand } => {
                format!("({}{})", op.symbol(), operand.canonical_repr())
            }
        }
    }

    /// Todas las referencias alcanzables desde este valor.
    pub fn references(&self) -> Vec<&Reference> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a Reference>) {
        match self {
            Bound::Raw(_) => {}
            Bound::Reference(r) => out.push(r),
            Bound::List(items) => items.iter().for_each(|b| b.collect_references(out)),
            Bound::Map(entries) => entries.values().for_each(|b| b.collect_references(out)),
            Bound::Binary { left, right, .. } => {
                left.collect_references(out);
                right.collect_references(out);
            }
            Bound::Unary { operand, .. } => operand.collect_references(out),
        }
    }

    pub fn has_references(&self) -> bool {
        !self.references().is_empty()
    }

    /// Tipo aproximado del valor (para el render boundary).
    pub fn value_type(&self) -> ValueType {
        match self {
            Bound::Raw(raw) => ValueType::of_raw(raw.value()),
            Bound::Reference(r) => r.typ().clone(),
            Bound::List(items) => {
                ValueType::Tuple(items.iter().map(Bound::value_type).collect())
            }
            Bound::Map(_) => ValueType::map(ValueType::Any),
            Bound::Binary { left, right, .. } => {
                let l = left.value_type();
                let r = right.value_type();
                if l == r {
                    l
                } else {
                    ValueType::union([l, r])
                }
            }
            Bound::Unary { operand, .. } => operand.value_type(),
        }
    }

    /// Forma legible dentro de `workflow` (ids simplificados si los hay).
    pub fn display(&self, workflow: &Workflow, separator: &str) -> String {
        match self {
            Bound::Raw(raw) => raw.value().to_json().to_string(),
            Bound::Reference(r) => r.display_name(workflow, separator),
            Bound::List(items) => {
                let inner: Vec<String> =
                    items.iter().map(|b| b.display(workflow, separator)).collect();
                format!("[{}]", inner.join(", "))
            }
            Bound::Map(entries) => {
                let inner: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.display(workflow, separator)))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            Bound::Binary { op, left, right } => format!(
                "({} {} {})",
                left.display(workflow, separator),
                op.symbol(),
                right.display(workflow, separator)
            ),
            Bound::Unary { op, operand } => {
                format!("({}{})", op.symbol(), operand.display(workflow, separator))
            }
        }
    }
}

fn fold_arithmetic(op: BinaryOp, left: &RawValue, right: &RawValue) -> Option<RawValue> {
    use RawValue::{Float, Int};
    match (left, right) {
        (Int(l), Int(r)) => match op {
            BinaryOp::Add => Some(Int(l.wrapping_add(*r))),
            BinaryOp::Sub => Some(Int(l.wrapping_sub(*r))),
            BinaryOp::Mul => Some(Int(l.wrapping_mul(*r))),
            // división entre enteros produce flotante, como en el origen de
            // los programas que describimos
            BinaryOp::Div => (*r != 0).then(|| Float(*l as f64 / *r as f64)),
            BinaryOp::Mod => (*r != 0).then(|| Int(l.rem_euclid(*r))),
        },
        (Int(l), Float(r)) => fold_floats(op, *l as f64, *r),
        (Float(l), Int(r)) => fold_floats(op, *l, *r as f64),
        (Float(l), Float(r)) => fold_floats(op, *l, *r),
        _ => None,
    }
}

fn fold_floats(op: BinaryOp, l: f64, r: f64) -> Option<RawValue> {
    let v = match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div => l / r,
        BinaryOp::Mod => l % r,
    };
    Some(RawValue::Float(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_only_lists_collapse() {
        let b = Bound::List(vec![
            Bound::Raw(Raw::new(1i64)),
            Bound::Raw(Raw::new(2i64)),
        ])
        .normalized();
        assert_eq!(
            b,
            Bound::Raw(Raw::new(RawValue::List(vec![RawValue::Int(1), RawValue::Int(2)])))
        );
    }

    #[test]
    fn raw_arithmetic_folds() {
        let b = Bound::Binary {
            op: BinaryOp::Add,
            left: Box::new(Bound::Raw(Raw::new(3i64))),
            right: Box::new(Bound::Raw(Raw::new(4i64))),
        }
        .normalized();
        assert_eq!(b, Bound::Raw(Raw::new(7i64)));
    }

    #[test]
    fn division_by_zero_stays_symbolic() {
        let b = Bound::Binary {
            op: BinaryOp::Div,
            left: Box::new(Bound::Raw(Raw::new(3i64))),
            right: Box::new(Bound::Raw(Raw::new(0i64))),
        }
        .normalized();
        assert!(matches!(b, Bound::Binary { .. }));
    }
}
