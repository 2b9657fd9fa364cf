use crate::setaf::Sign;
use log::error;
use std::io::Write;

/// A writer for the DRAT-like enumeration proof.
///
/// Three kinds of lines are emitted: `i <literals> 0` for an implicit clause built for an
/// argument that must be Out without a stability witness, `<literals> 0` for a clause
/// learned by conflict resolution, and `d <literals> 0` for a learned clause being
/// forgotten. A literal is the display name of an argument, prefixed by `-` when the
/// expected sign is Out. A proof ending in an underivable situation is closed by a bare
/// `0`.
///
/// A write failure is reported once through the logger and disables further emission; an
/// incomplete proof must not abort the enumeration itself.
pub struct ProofWriter<'a> {
    out: &'a mut dyn Write,
    failed: bool,
}

impl<'a> ProofWriter<'a> {
    /// Builds a proof writer emitting to the given sink.
    pub fn new(out: &'a mut dyn Write) -> Self {
        ProofWriter { out, failed: false }
    }

    fn write_line(&mut self, prefix: Option<char>, literals: &[(&str, Sign)]) {
        if self.failed {
            return;
        }
        let result = (|| -> std::io::Result<()> {
            if let Some(p) = prefix {
                write!(self.out, "{} ", p)?;
            }
            for &(name, sign) in literals {
                if sign == Sign::Out {
                    write!(self.out, "-")?;
                }
                write!(self.out, "{} ", name)?;
            }
            writeln!(self.out, "0")
        })();
        if let Err(e) = result {
            error!("cannot write the proof file: {}", e);
            self.failed = true;
        }
    }

    /// Writes a clause learned by conflict resolution.
    pub fn write_learned_clause(&mut self, literals: &[(&str, Sign)]) {
        self.write_line(None, literals);
    }

    /// Writes an implicit clause.
    pub fn write_implicit_clause(&mut self, literals: &[(&str, Sign)]) {
        self.write_line(Some('i'), literals);
    }

    /// Writes the deletion line of a forgotten clause.
    pub fn write_deleted_clause(&mut self, literals: &[(&str, Sign)]) {
        self.write_line(Some('d'), literals);
    }

    /// Closes a proof in which no model was derived.
    pub fn write_unsatisfiable(&mut self) {
        if self.failed {
            return;
        }
        if let Err(e) = write!(self.out, "0") {
            error!("cannot write the proof file: {}", e);
            self.failed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_kinds() {
        let mut buffer = Vec::new();
        let mut writer = ProofWriter::new(&mut buffer);
        writer.write_implicit_clause(&[("1", Sign::In), ("2", Sign::Out)]);
        writer.write_learned_clause(&[("2", Sign::Out)]);
        writer.write_deleted_clause(&[("2", Sign::Out)]);
        writer.write_unsatisfiable();
        assert_eq!(
            "i 1 -2 0\n-2 0\nd -2 0\n0",
            String::from_utf8(buffer).unwrap()
        );
    }

    #[test]
    fn test_named_literals() {
        let mut buffer = Vec::new();
        let mut writer = ProofWriter::new(&mut buffer);
        writer.write_learned_clause(&[("hello world", Sign::Out), ("b", Sign::In)]);
        assert_eq!("-hello world b 0\n", String::from_utf8(buffer).unwrap());
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "sink error"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failure_disables_emission() {
        let mut sink = FailingSink;
        let mut writer = ProofWriter::new(&mut sink);
        writer.write_learned_clause(&[("1", Sign::In)]);
        assert!(writer.failed);
        // no panic and no further write attempts
        writer.write_deleted_clause(&[("1", Sign::In)]);
        writer.write_unsatisfiable();
    }
}
