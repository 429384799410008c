//! Game client process bookkeeping: enumeration, the managed PID set and
//! spawning/termination.

pub mod directory;
pub mod managed;
pub mod spawner;

pub use directory::{ProcessDirectory, ProcessRecord, ProcessTable, SysinfoProcessTable};
pub use managed::ManagedPidSet;
pub use spawner::{OsProcessControl, ProcessControl};
