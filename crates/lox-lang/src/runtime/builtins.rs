//! Host-provided functions. Anything implementing `NativeFunction` can be
//! registered into the global scope with `Interpreter::define_native`.

use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::value::Value;

// ─── Native interface ─────────────────────────────────────────────────────────

/// What the interpreter needs from a builtin: a name to bind, a fixed arity,
/// and the call itself. Arity is checked by the interpreter before `call`.
pub trait NativeFunction {
    fn name(&self) -> &str;
    fn arity(&self) -> usize;
    fn call(&self, interp: &mut Interpreter<'_>, args: &[Value]) -> Result<Value, RuntimeError>;
}

/// The builtins every interpreter starts with.
pub fn standard() -> Vec<Rc<dyn NativeFunction>> {
    vec![Rc::new(Clock)]
}

// ─── clock() ──────────────────────────────────────────────────────────────────

/// `clock()` — seconds since the Unix epoch, with sub-second precision.
pub struct Clock;

impl NativeFunction for Clock {
    fn name(&self) -> &str { "clock" }

    fn arity(&self) -> usize { 0 }

    fn call(&self, interp: &mut Interpreter<'_>, _args: &[Value]) -> Result<Value, RuntimeError> {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| RuntimeError::new(RuntimeErrorKind::Native, interp.current_line(),
                format!("clock: {e}")))?
            .as_secs_f64();
        Ok(Value::Number(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_zero_arity_and_positive() {
        let mut out = Vec::new();
        let mut interp = Interpreter::new(&mut out);
        assert_eq!(Clock.arity(), 0);
        match Clock.call(&mut interp, &[]).unwrap() {
            Value::Number(n) => assert!(n > 0.0),
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn standard_set_names() {
        let names: Vec<_> = standard().iter().map(|n| n.name().to_string()).collect();
        assert_eq!(names, vec!["clock"]);
    }
}
