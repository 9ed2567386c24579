//! The tree-visualization log.
//!
//! A line-oriented event stream of the enumeration tree: `N parent child
//! color` for a new node, `P id color` for a repaint, `L value` /
//! `U value` for the global lower/upper bound, and `I id "..."` for
//! per-node information. In `File` mode every line carries an elapsed
//! time prefix; in `Pipe` mode every line is prefixed with `$`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use crate::{E, I};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VbcMode {
    #[default]
    None,
    File,
    Pipe,
}

impl VbcMode {
    pub const NAMES: [&'static str; 3] = ["None", "File", "Pipe"];
}

pub struct TreeLog {
    mode: VbcMode,
    out: Option<Box<dyn Write>>,
    start: Instant,
}

impl TreeLog {
    /// A disabled log; every record is a no-op.
    pub fn disabled() -> Self {
        Self {
            mode: VbcMode::None,
            out: None,
            start: Instant::now(),
        }
    }

    /// Logs to a file, each line prefixed with the elapsed time.
    pub fn to_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            mode: VbcMode::File,
            out: Some(Box::new(BufWriter::new(file))),
            start: Instant::now(),
        })
    }

    /// Logs to an arbitrary stream in pipe style (`$` prefix).
    pub fn to_pipe(out: Box<dyn Write>) -> Self {
        Self {
            mode: VbcMode::Pipe,
            out: Some(out),
            start: Instant::now(),
        }
    }

    pub fn mode(&self) -> VbcMode {
        self.mode
    }

    fn write(&mut self, info: &str, with_time: bool) {
        if self.mode == VbcMode::None {
            return;
        }
        let prefix = match self.mode {
            VbcMode::Pipe => "$".to_string(),
            VbcMode::File if with_time => {
                format!("{:.2} ", self.start.elapsed().as_secs_f64())
            }
            _ => String::new(),
        };
        if let Some(out) = &mut self.out {
            let _ = writeln!(out, "{prefix}{info}");
        }
    }

    pub fn new_node(&mut self, parent: I, child: I, color: I) {
        self.write(&format!("N {parent} {child} {color}"), true);
    }

    pub fn paint_node(&mut self, id: I, color: I) {
        self.write(&format!("P {id} {color}"), true);
    }

    pub fn lower_bound(&mut self, value: E) {
        self.write(&format!("L {value}"), true);
    }

    pub fn upper_bound(&mut self, value: E) {
        self.write(&format!("U {value}"), true);
    }

    pub fn node_info(&mut self, id: I, info: &str) {
        self.write(&format!("I {id} \\i{info}\\i"), true);
    }

    pub fn finish(&mut self) {
        if self.mode == VbcMode::Pipe {
            self.write("#END_OF_OUTPUT", false);
        }
        if let Some(out) = &mut self.out {
            let _ = out.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn pipe_records_carry_the_dollar_prefix() {
        let buf = SharedBuf::default();
        let mut log = TreeLog::to_pipe(Box::new(buf.clone()));
        log.new_node(0, 1, 5);
        log.paint_node(1, 2);
        log.lower_bound(3.5);
        log.upper_bound(7.0);
        log.node_info(1, "dual 3.5");
        log.finish();
        let text = String::from_utf8(buf.0.borrow().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "$N 0 1 5");
        assert_eq!(lines[1], "$P 1 2");
        assert_eq!(lines[2], "$L 3.5");
        assert_eq!(lines[3], "$U 7");
        assert_eq!(lines[4], "$I 1 \\idual 3.5\\i");
        assert_eq!(lines[5], "$#END_OF_OUTPUT");
    }

    #[test]
    fn disabled_log_writes_nothing() {
        let mut log = TreeLog::disabled();
        log.new_node(0, 1, 5);
        log.finish();
    }
}
