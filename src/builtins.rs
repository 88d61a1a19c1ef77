//! The built-in functions seeded into the global environment frame (§5):
//! `print`, `size`, `array`, `random`, and `floor`.

use rand::Rng;

use crate::env::Environment;
use crate::error::{Error, TypeError};
use crate::value::{Builtin, Value};

/// Bind every built-in into `env`'s current frame. Call once, before running
/// any user source, so the global frame is their home.
pub fn install(env: &mut Environment) {
    for b in all() {
        env.bind_local(b.name, Value::Builtin(b));
    }
}

fn all() -> Vec<Builtin> {
    vec![
        Builtin {
            name: "print",
            arity: Some(1),
            func: print,
        },
        Builtin {
            name: "size",
            arity: Some(1),
            func: size,
        },
        Builtin {
            name: "array",
            arity: Some(1),
            func: array,
        },
        Builtin {
            name: "random",
            arity: Some(0),
            func: random,
        },
        Builtin {
            name: "floor",
            arity: Some(1),
            func: floor,
        },
    ]
}

fn print(args: &[Value]) -> Result<Value, Error> {
    println!("{}", args[0]);
    Ok(Value::Number(0.0))
}

fn size(args: &[Value]) -> Result<Value, Error> {
    let n = match &args[0] {
        Value::Array(a) => a.borrow().len(),
        Value::String(s) => s.chars().count(),
        other => return Err(TypeError::new(format!("size() expects an array or string, got a {}", other.type_name())).into()),
    };
    Ok(Value::Number(n as f64))
}

/// `array(n)`: an array of `n` zeros.
fn array(args: &[Value]) -> Result<Value, Error> {
    let n = match &args[0] {
        Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 => *n as usize,
        other => return Err(TypeError::new(format!("array()'s size must be a non-negative whole number, got {}", other)).into()),
    };
    Ok(Value::array(vec![Value::Number(0.0); n]))
}

fn random(_args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Number(rand::thread_rng().gen::<f64>()))
}

fn floor(args: &[Value]) -> Result<Value, Error> {
    match &args[0] {
        Value::Number(n) => Ok(Value::Number(n.floor())),
        other => Err(TypeError::new(format!("floor() expects a number, got a {}", other.type_name())).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_reports_array_and_string_length() {
        assert_eq!(size(&[Value::array(vec![Value::Number(1.0), Value::Number(2.0)])]).unwrap(), Value::Number(2.0));
        assert_eq!(size(&[Value::String("abc".to_string())]).unwrap(), Value::Number(3.0));
    }

    #[test]
    fn array_builds_n_zeros() {
        let a = array(&[Value::Number(3.0)]).unwrap();
        assert_eq!(a, Value::array(vec![Value::Number(0.0); 3]));
    }

    #[test]
    fn random_is_within_unit_interval() {
        let r = random(&[]).unwrap();
        match r {
            Value::Number(n) => assert!((0.0..1.0).contains(&n)),
            _ => panic!("expected a number"),
        }
    }

    #[test]
    fn floor_truncates_toward_negative_infinity() {
        assert_eq!(floor(&[Value::Number(1.9)]).unwrap(), Value::Number(1.0));
        assert_eq!(floor(&[Value::Number(-1.1)]).unwrap(), Value::Number(-2.0));
    }

    #[test]
    fn install_seeds_the_global_frame() {
        let mut env = Environment::new();
        install(&mut env);
        assert!(matches!(env.get("print").unwrap(), Value::Builtin(_)));
    }
}
