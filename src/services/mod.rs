mod mirror;
mod persister;

pub use mirror::RemoteMirror;
pub use persister::SummaryPersister;
