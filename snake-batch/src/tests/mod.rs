pub(super) use super::*;

mod pool;
mod support;
