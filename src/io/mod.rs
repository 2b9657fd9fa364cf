//! Objects used to read SETAF instances and to write enumeration proofs.

mod proof_writer;
pub use proof_writer::ProofWriter;

mod simple_format_reader;
pub use simple_format_reader::ArgumentNameIndex;
pub use simple_format_reader::SimpleFormatReader;
