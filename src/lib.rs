mod errors;
mod extractors;
mod handlers;
mod models;
mod operations;

pub use errors::ApiError;
pub use handlers::v1::routes;
pub use models::{NewUser, StoredUser};

pub use operations::{Configurator, UserStorage};

pub mod services {
    pub mod configurators {
        pub use crate::operations::configurator::env::EnvConfigurator as Env;
    }

    pub mod storage {
        pub mod user {
            pub use crate::operations::user_storage::in_memory::InMemoryUserStorage as InMemory;
            pub use crate::operations::user_storage::mongo::MongoUserStorage as Mongo;
        }
    }
}
