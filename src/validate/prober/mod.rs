//! Concrete prober implementations (C9/C10).

pub mod aws;
pub mod database;
pub mod declarative;

pub use aws::AwsStsProber;
pub use database::{MongoDbProber, MysqlProber, PostgresProber, RedisProber};
pub use declarative::{parse_validator_file, AuthDef, DeclarativeProber, HeaderDef, HttpDef, ValidatorDef};
