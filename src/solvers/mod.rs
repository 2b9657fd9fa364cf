//! The solvers used to enumerate the extensions of SETAF instances.

mod specs;
pub use specs::ExtensionEnumerator;
pub use specs::ModelHandler;

mod stable_enumeration_solver;
pub use stable_enumeration_solver::StableEnumerationSolver;
