//! Council roster: the fixed set of deliberation members

pub mod member;
pub mod roster;

pub use member::Member;
pub use roster::CouncilRoster;
