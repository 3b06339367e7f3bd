//! Common test utilities

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

/// Exit codes observed through an injected terminator
#[derive(Clone, Default)]
pub struct ExitRecorder {
    codes: Rc<RefCell<Vec<i32>>>,
}

impl ExitRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminator to hand to `App::with_exit`
    pub fn terminator(&self) -> impl Fn(i32) + 'static {
        let codes = Rc::clone(&self.codes);
        move |code| codes.borrow_mut().push(code)
    }

    pub fn codes(&self) -> Vec<i32> {
        self.codes.borrow().clone()
    }

    /// The first recorded code, if the run terminated
    pub fn code(&self) -> Option<i32> {
        self.codes.borrow().first().copied()
    }
}

/// Counter shared with a closure
#[derive(Clone, Default)]
pub struct Counter(Rc<Cell<usize>>);

impl Counter {
    pub fn hit(&self) {
        self.0.set(self.0.get() + 1);
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }
}

/// Owned argument vector from string literals
pub fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Create a temporary directory holding a dotenv file
pub fn create_env_file(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let env_path = temp_dir.path().join(".env");
    fs::write(&env_path, content).unwrap();
    (temp_dir, env_path)
}
