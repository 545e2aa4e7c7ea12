// Platform CPU adapters
pub mod x86_64;
