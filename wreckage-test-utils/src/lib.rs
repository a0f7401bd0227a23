pub mod builder;
pub mod constant;
pub mod context;
pub mod error;
pub mod fixtures;
pub mod redis;

pub use builder::TestBuilder;
pub use context::TestContext;
pub use error::TestError;

pub mod prelude {
    pub use crate::{
        constant::TEST_USER_AGENT,
        fixtures::eve::{data, factory},
        fixtures::killmail,
        redis::RedisTest,
        TestBuilder, TestContext, TestError,
    };
}
