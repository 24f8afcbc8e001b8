//! Members, their user profiles and lockers.

pub mod models;

pub use models::{
    Locker, Member, MemberId, MemberStatus, MemberUpdate, NewMember, User, latest_birth_date,
};
