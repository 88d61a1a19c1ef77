//! The environment frame stack (§4.5): a stack of name→value frames,
//! searched top-down on lookup. A new frame is pushed for each call, loop
//! iteration, `if`/`else` branch, and comprehension iteration; assignment
//! updates an existing binding wherever it is found, or creates one in the
//! current (topmost) frame otherwise.

use std::collections::HashMap;

use crate::error::NameError;
use crate::value::Value;

pub struct Environment {
    frames: Vec<HashMap<String, Value>>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
        debug_assert!(!self.frames.is_empty(), "the global frame is never popped");
    }

    pub fn get(&self, name: &str) -> Result<Value, NameError> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.get(name) {
                return Ok(value.clone());
            }
        }
        Err(NameError { name: name.to_string() })
    }

    /// Assign `value` to `name`: update the binding in the nearest enclosing
    /// frame that already has one, else create it in the current frame.
    pub fn set(&mut self, name: &str, value: Value) {
        for frame in self.frames.iter_mut().rev() {
            if frame.contains_key(name) {
                frame.insert(name.to_string(), value);
                return;
            }
        }
        self.frames
            .last_mut()
            .expect("at least one frame is always present")
            .insert(name.to_string(), value);
    }

    /// Bind `name` in the current (topmost) frame unconditionally, shadowing
    /// any outer binding. Used for function parameters.
    pub fn bind_local(&mut self, name: &str, value: Value) {
        self.frames
            .last_mut()
            .expect("at least one frame is always present")
            .insert(name.to_string(), value);
    }

    pub fn locals(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.frames.last().expect("at least one frame is always present").iter()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_frames_top_down() {
        let mut env = Environment::new();
        env.bind_local("x", Value::Number(1.0));
        env.push_frame();
        assert_eq!(env.get("x").unwrap(), Value::Number(1.0));
    }

    #[test]
    fn missing_name_is_a_name_error() {
        let env = Environment::new();
        assert!(env.get("nope").is_err());
    }

    #[test]
    fn set_updates_the_enclosing_binding_rather_than_shadowing() {
        let mut env = Environment::new();
        env.bind_local("x", Value::Number(1.0));
        env.push_frame();
        env.set("x", Value::Number(2.0));
        env.pop_frame();
        assert_eq!(env.get("x").unwrap(), Value::Number(2.0));
    }

    #[test]
    fn set_without_an_existing_binding_creates_one_locally() {
        let mut env = Environment::new();
        env.push_frame();
        env.set("y", Value::Number(3.0));
        assert_eq!(env.get("y").unwrap(), Value::Number(3.0));
        env.pop_frame();
        assert!(env.get("y").is_err());
    }
}
