//! The interactive REPL (§6): a read-evaluate-print loop with a small set of
//! dot-free commands (`exit`, `help`, `locals`, `reset`, `run`, `add`, `del`,
//! `clear`, `list`, `exec`) alongside ordinary source lines, grounded on the
//! host language's own command-driven REPL. Each evaluated line prints its
//! result as `Out [n]: <value>`; `n` only advances on evaluated lines, not
//! on commands.

use std::io::{self, BufRead, Write};

use crate::driver;
use crate::env::Environment;

const INTRO: &str = "Slang REPL\nEnter \"exit\", ctrl+C, or ctrl+D to quit.\nEnter \"help\" for more commands.";

const HELP: &str = "\
exit             quit the REPL
help             show this message
locals           print every binding in the current environment
reset            reset the environment to its initial built-ins
run <path>       run a script file, or re-run the last one with no path
add <path>       append a script to the exec list
del [<path>]     remove a script from the exec list (last added, if no path given)
clear            empty the exec list
list             show the exec list
exec             run every script in the exec list, in order";

pub struct Repl<R, W> {
    input: R,
    output: W,
    env: Environment,
    count: usize,
    last_run: Option<String>,
    exec_list: Vec<String>,
}

impl<R: BufRead, W: Write> Repl<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            env: driver::fresh_environment(),
            count: 0,
            last_run: None,
            exec_list: Vec::new(),
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "{}", INTRO)?;
        loop {
            write!(self.output, "In  [{}]: ", self.count)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(());
            }
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                continue;
            }

            match self.dispatch(line) {
                Dispatch::Exit => return Ok(()),
                Dispatch::Continue => {}
            }
        }
    }

    fn dispatch(&mut self, line: &str) -> Dispatch {
        let (command, rest) = match line.split_once(' ') {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match command {
            "exit" => return Dispatch::Exit,
            "help" => self.print(HELP),
            "locals" => self.print_locals(),
            "reset" => {
                self.env = driver::fresh_environment();
                self.print("Environment reset.");
            }
            "run" => self.do_run(rest),
            "add" => self.do_add(rest),
            "del" => self.do_del(rest),
            "clear" => {
                self.exec_list.clear();
                self.print("Exec list cleared.");
            }
            "list" => self.do_list(),
            "exec" => self.do_exec(),
            _ => self.eval_line(line),
        }
        Dispatch::Continue
    }

    fn eval_line(&mut self, source: &str) {
        match driver::eval(source, &mut self.env) {
            Ok(value) => self.print(&format!("Out [{}]: {}", self.count, value)),
            Err(err) => self.error(&err.to_string()),
        }
        self.count += 1;
    }

    fn do_run(&mut self, fpath: &str) {
        let fpath = if fpath.is_empty() {
            match self.last_run.clone() {
                Some(p) => p,
                None => {
                    self.error("no script to re-run.");
                    return;
                }
            }
        } else {
            fpath.to_string()
        };
        match std::fs::read_to_string(&fpath) {
            Ok(script) => {
                self.last_run = Some(fpath);
                self.eval_line(&script);
            }
            Err(err) => self.error(&format!("\"{}\": {}", fpath, err)),
        }
    }

    fn do_add(&mut self, fpath: &str) {
        if fpath.is_empty() {
            self.error("no script specified.");
            return;
        }
        self.exec_list.push(fpath.to_string());
        self.print(&format!("Script \"{}\" added to exec list.", fpath));
    }

    fn do_del(&mut self, fpath: &str) {
        if fpath.is_empty() {
            if let Some(removed) = self.exec_list.pop() {
                self.print(&format!("Script \"{}\" deleted from exec list.", removed));
            }
            return;
        }
        let before = self.exec_list.len();
        self.exec_list.retain(|p| p != fpath);
        if self.exec_list.len() != before {
            self.print(&format!("Script \"{}\" deleted from exec list.", fpath));
        }
    }

    fn do_list(&mut self) {
        self.print("Exec list:");
        for fpath in self.exec_list.clone() {
            self.print(&fpath);
        }
    }

    fn do_exec(&mut self) {
        for fpath in self.exec_list.clone() {
            self.do_run(&fpath);
        }
    }

    fn print_locals(&mut self) {
        self.print("Environment:");
        let mut bindings: Vec<(String, String)> =
            self.env.locals().map(|(k, v)| (k.clone(), v.to_string())).collect();
        bindings.sort();
        for (name, value) in bindings {
            self.print(&format!("{}\t=\t{}", name, value));
        }
    }

    fn print(&mut self, message: &str) {
        let _ = writeln!(self.output, "{}", message);
    }

    fn error(&mut self, message: &str) {
        let _ = writeln!(self.output, "Error: {}", message);
    }
}

enum Dispatch {
    Continue,
    Exit,
}

/// Launch the REPL against stdin/stdout.
pub fn launch() -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    Repl::new(stdin.lock(), stdout.lock()).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_lines(lines: &str) -> String {
        let input = io::Cursor::new(lines.as_bytes().to_vec());
        let mut output = Vec::new();
        Repl::new(input, &mut output).run().unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn evaluates_a_statement_and_prints_nothing_extra_on_success() {
        let out = run_lines("x = 1 + 1;\nexit\n");
        assert!(!out.contains("Error"));
    }

    #[test]
    fn reports_errors_without_crashing_the_loop() {
        let out = run_lines("x = ;\nexit\n");
        assert!(out.contains("Error"));
    }

    #[test]
    fn locals_lists_bindings_after_assignment() {
        let out = run_lines("x = 5;\nlocals\nexit\n");
        assert!(out.contains("x\t=\t5"));
    }

    #[test]
    fn reset_clears_user_bindings() {
        let out = run_lines("x = 5;\nreset\nlocals\nexit\n");
        assert!(!out.contains("x\t=\t5"));
    }
}
