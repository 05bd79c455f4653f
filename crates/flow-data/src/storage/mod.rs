//! 영속 저장소와 원격 캐시.

pub mod postgres;
pub mod redis;
