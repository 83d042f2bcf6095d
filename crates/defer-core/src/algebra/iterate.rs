//! Iteración perezosa sobre expresiones.

use super::expr::Expr;

/// Secuencia perezosa de accesos indexados sobre una expresión.
///
/// Sin longitud fija conocida la secuencia no tiene cota: el consumidor
/// decide cuántos elementos extrae (p. ej. `zip` contra una secuencia de
/// longitud fija). Cada elemento queda marcado como iterado para que los
/// renderers puedan distinguirlo de un acceso directo.
pub struct ExprIterator {
    parent: Expr,
    next: usize,
    fixed_len: Option<usize>,
}

impl ExprIterator {
    pub(crate) fn new(parent: Expr, fixed_len: Option<usize>) -> Self {
        Self { parent, next: 0, fixed_len }
    }

    /// Longitud fija de la secuencia, si el tipo declarado la da.
    pub fn fixed_len(&self) -> Option<usize> {
        self.fixed_len
    }
}

impl Iterator for ExprIterator {
    type Item = Expr;

    fn next(&mut self) -> Option<Expr> {
        if let Some(len) = self.fixed_len {
            if self.next >= len {
                return None;
            }
        }
        let index = self.next;
        self.next += 1;
        Some(Expr::Index {
            parent: Box::new(self.parent.clone()),
            index,
            iterated: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::param;
    use crate::model::types::ValueType;

    #[test]
    fn unbounded_iteration_is_driven_by_the_consumer() {
        let xs = param("xs", ValueType::list(ValueType::Int));
        let drawn: Vec<Expr> = xs.iterate().zip(0..3).map(|(e, _)| e).collect();
        assert_eq!(drawn.len(), 3);
        assert!(matches!(
            &drawn[2],
            Expr::Index { index: 2, iterated: true, .. }
        ));
    }

    #[test]
    fn tuple_types_bound_the_iteration() {
        let pair = param("pair", ValueType::tuple([ValueType::Int, ValueType::Float]));
        let drawn: Vec<Expr> = pair.iterate().collect();
        assert_eq!(drawn.len(), 2);
    }
}
